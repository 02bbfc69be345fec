//! Translation-aware query rewriting.
//!
//! Predicates and ordering terms on translatable fields are rewritten into
//! joins of the per-locale translation rows. When the locale being queried
//! differs from the default locale, both rows are joined and a `CASE`
//! expression picks the current-locale row when it exists and the
//! default-locale row otherwise.
//!
//! Join aliases and parameter names are derived from the root alias, the
//! association and the locale, so every clause of one query shares the same
//! joins:
//!
//! | item                 | name                               |
//! |----------------------|------------------------------------|
//! | translation join     | `{alias}{association}{locale}`     |
//! | locale parameter     | `{join alias}loc`                  |
//! | value parameter      | `{alias}{field}val`                |
//! | collection join      | `{row alias}{field}join`           |
//! | hidden order column  | `{alias}{field}`                   |

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use tracing::debug;

use crate::config::TranslatableConfig;
use crate::error::{Error, Result};
use crate::mapping::{BaseClassMetadata, TranslatableDriver};
use crate::metadata::{MetadataFactory, TranslatableClassMetadata};
use crate::value::Value;

use super::builder::{DqlQueryBuilder, QueryBuilder};
use super::expr::{split_join_path, Expr, Join, JoinKind, OrderDirection, OrderTerm, SelectItem};

/// Options of a translation join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationJoin {
    path: String,
    join_type: String,
    locale: Option<String>,
    alias: Option<String>,
    locale_parameter: Option<String>,
}

impl TranslationJoin {
    /// Left join of `alias.association` in the current locale.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            join_type: JoinKind::Left.as_str().to_string(),
            locale: None,
            alias: None,
            locale_parameter: None,
        }
    }

    /// Join type by name (`INNER` or `LEFT`).
    pub fn join_type(mut self, join_type: impl Into<String>) -> Self {
        self.join_type = join_type.into();
        self
    }

    /// Join type.
    pub fn kind(self, kind: JoinKind) -> Self {
        self.join_type(kind.as_str())
    }

    /// Locale of the joined rows instead of the current locale.
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Alias of the joined rows instead of the generated one.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Name of the locale parameter instead of the generated one.
    pub fn locale_parameter(mut self, name: impl Into<String>) -> Self {
        self.locale_parameter = Some(name.into());
        self
    }
}

/// Target of a translation join already added to the query.
#[derive(Debug, Clone, PartialEq, Eq)]
struct JoinedTranslation {
    parent: String,
    association: String,
    locale: Option<String>,
}

/// Where a field of an aliased class lives.
enum FieldLocation {
    /// A column or association of the class itself.
    Own { is_collection: bool },
    /// A field of the translation rows reached through `association`.
    Translated {
        association: String,
        field: String,
        identifier: String,
        is_collection: bool,
    },
}

/// Query builder wrapper adding translatable joins, predicates and ordering.
///
/// Locale settings are captured when the wrapper is created. Every other
/// builder operation is reachable through `Deref`.
pub struct TranslatableQueryBuilder<'m, Q: QueryBuilder = DqlQueryBuilder> {
    inner: Q,
    metadata: &'m MetadataFactory<TranslatableDriver>,
    config: TranslatableConfig,
    translation_joins: HashMap<String, JoinedTranslation>,
    collection_joins: HashMap<(String, String), String>,
    hidden_selects: HashMap<(String, String, Option<String>), String>,
}

impl<Q: QueryBuilder + std::fmt::Debug> std::fmt::Debug for TranslatableQueryBuilder<'_, Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslatableQueryBuilder")
            .field("inner", &self.inner)
            .field("config", &self.config)
            .field("translation_joins", &self.translation_joins)
            .field("collection_joins", &self.collection_joins)
            .field("hidden_selects", &self.hidden_selects)
            .finish_non_exhaustive()
    }
}

impl<'m, Q: QueryBuilder> TranslatableQueryBuilder<'m, Q> {
    /// Wrap `inner`, reading translatable metadata from `metadata`.
    pub fn new(
        inner: Q,
        metadata: &'m MetadataFactory<TranslatableDriver>,
        config: TranslatableConfig,
    ) -> Self {
        Self {
            inner,
            metadata,
            config,
            translation_joins: HashMap::new(),
            collection_joins: HashMap::new(),
            hidden_selects: HashMap::new(),
        }
    }

    /// Locale settings used by this builder.
    pub fn config(&self) -> &TranslatableConfig {
        &self.config
    }

    /// Unwrap the host query builder.
    pub fn into_inner(self) -> Q {
        self.inner
    }

    /// Left join the translations of `path` (`alias.association`) in the
    /// current locale. Returns the join alias.
    pub fn join_translations(&mut self, path: &str) -> Result<String> {
        self.join_translations_with(TranslationJoin::new(path))
    }

    /// Join translation rows with explicit options. Returns the join alias.
    ///
    /// Joining the same rows again returns the existing alias without adding
    /// a join.
    pub fn join_translations_with(&mut self, options: TranslationJoin) -> Result<String> {
        let kind: JoinKind = options.join_type.parse()?;
        let (parent, association) = split_join_path(&options.path)?;
        self.validate_translation_association(parent, association)?;

        let locale = self
            .config
            .effective_locale(options.locale.as_deref())
            .map(str::to_string);
        let alias = options
            .alias
            .unwrap_or_else(|| format!("{parent}{association}{}", locale.as_deref().unwrap_or("")));

        let target = JoinedTranslation {
            parent: parent.to_string(),
            association: association.to_string(),
            locale: locale.clone(),
        };
        if let Some(existing) = self.translation_joins.get(&alias) {
            if *existing == target {
                return Ok(alias);
            }
            return Err(Error::InvalidArgument(format!(
                "alias \"{alias}\" already joins other translations"
            )));
        }
        if self.inner.has_alias(&alias) {
            return Err(Error::InvalidArgument(format!(
                "alias \"{alias}\" is already defined"
            )));
        }

        let mut join = Join::new(kind, parent, association, alias.clone());
        if let Some(locale) = &locale {
            let parameter = options
                .locale_parameter
                .unwrap_or_else(|| format!("{alias}loc"));
            let locale_property = self.translation_locale_property(parent, association)?;
            join = join.with_condition(
                Expr::path(&alias, &locale_property).equals(Expr::param(parameter.clone())),
            );
            self.inner
                .set_parameter(&parameter, Value::String(locale.clone()));
        }

        debug!(
            alias = %alias,
            association = %options.path,
            locale = ?locale,
            "joining translations"
        );
        self.inner.add_join(join);
        self.translation_joins.insert(alias.clone(), target);
        Ok(alias)
    }

    /// Filter by `alias.field` in the current locale, falling back to the
    /// default locale.
    ///
    /// Null matches empty collections or null fields, an entity matches by
    /// membership or identity, a collection of values matches any of them and
    /// any other value matches by equality.
    pub fn add_translatable_where(
        &mut self,
        alias: &str,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        self.translatable_where(alias, field, value.into(), None)
    }

    /// Like [`Self::add_translatable_where`], reading `locale` instead of the
    /// current locale.
    pub fn add_translatable_where_in_locale(
        &mut self,
        alias: &str,
        field: &str,
        value: impl Into<Value>,
        locale: &str,
    ) -> Result<&mut Self> {
        self.translatable_where(alias, field, value.into(), Some(locale))
    }

    /// Order by `alias.field` in the current locale, falling back to the
    /// default locale.
    pub fn add_translatable_order_by(
        &mut self,
        alias: &str,
        field: &str,
        direction: OrderDirection,
    ) -> Result<&mut Self> {
        self.translatable_order_by(alias, field, direction, None)
    }

    /// Like [`Self::add_translatable_order_by`], reading `locale` instead of
    /// the current locale.
    pub fn add_translatable_order_by_in_locale(
        &mut self,
        alias: &str,
        field: &str,
        direction: OrderDirection,
        locale: &str,
    ) -> Result<&mut Self> {
        self.translatable_order_by(alias, field, direction, Some(locale))
    }

    fn translatable_where(
        &mut self,
        alias: &str,
        field: &str,
        value: Value,
        locale: Option<&str>,
    ) -> Result<&mut Self> {
        let parameter = self.value_parameter(alias, field, &value);

        let predicate = match self.locate_field(alias, field)? {
            FieldLocation::Own { is_collection } => {
                self.condition(alias, field, &value, is_collection, &parameter)
            }
            FieldLocation::Translated {
                association,
                field: translation_field,
                identifier,
                is_collection,
            } => {
                let (current, fallback) = self.locale_pair(locale);
                let path = format!("{alias}.{association}");
                let current_alias =
                    self.join_translations_with(locale_join(&path, current.as_deref()))?;

                match fallback {
                    None => self.condition(
                        &current_alias,
                        &translation_field,
                        &value,
                        is_collection,
                        &parameter,
                    ),
                    Some(fallback) => {
                        let default_alias =
                            self.join_translations_with(locale_join(&path, Some(&fallback)))?;

                        if value.is_scalar() {
                            fallback_value(&current_alias, &default_alias, &identifier, &translation_field)
                                .equals(Expr::param(parameter.clone()))
                        } else {
                            let current_condition = self.condition(
                                &current_alias,
                                &translation_field,
                                &value,
                                is_collection,
                                &parameter,
                            );
                            let default_condition = self.condition(
                                &default_alias,
                                &translation_field,
                                &value,
                                is_collection,
                                &parameter,
                            );
                            Expr::Case {
                                whens: vec![
                                    (
                                        Expr::And(vec![
                                            Expr::path(&current_alias, &identifier).is_not_null(),
                                            current_condition,
                                        ]),
                                        Expr::Bool(true),
                                    ),
                                    (default_condition, Expr::Bool(true)),
                                ],
                                otherwise: Box::new(Expr::Bool(false)),
                            }
                            .equals(Expr::Bool(true))
                        }
                    }
                }
            }
        };

        if !value.is_null() {
            self.inner.set_parameter(&parameter, value);
        }
        self.inner.and_where(predicate);
        Ok(self)
    }

    fn translatable_order_by(
        &mut self,
        alias: &str,
        field: &str,
        direction: OrderDirection,
        locale: Option<&str>,
    ) -> Result<&mut Self> {
        let ordered = match self.locate_field(alias, field)? {
            FieldLocation::Own { .. } => Expr::path(alias, field),
            FieldLocation::Translated {
                association,
                field: translation_field,
                identifier,
                ..
            } => {
                let (current, fallback) = self.locale_pair(locale);
                let path = format!("{alias}.{association}");
                let current_alias =
                    self.join_translations_with(locale_join(&path, current.as_deref()))?;

                match fallback {
                    None => Expr::path(&current_alias, &translation_field),
                    Some(fallback) => {
                        let default_alias =
                            self.join_translations_with(locale_join(&path, Some(&fallback)))?;
                        let key = (alias.to_string(), field.to_string(), current.clone());
                        let hidden = match self.hidden_selects.get(&key).cloned() {
                            Some(hidden) => hidden,
                            None => {
                                let hidden = self.hidden_alias(alias, field, current.as_deref());
                                self.inner.add_select(SelectItem::hidden(
                                    fallback_value(
                                        &current_alias,
                                        &default_alias,
                                        &identifier,
                                        &translation_field,
                                    ),
                                    hidden.clone(),
                                ));
                                self.hidden_selects.insert(key, hidden.clone());
                                hidden
                            }
                        };
                        Expr::alias(hidden)
                    }
                }
            }
        };

        self.inner.add_order_by(OrderTerm::new(ordered, direction));
        Ok(self)
    }

    /// Name of the parameter bound to `value` for `alias.field`.
    ///
    /// `{alias}{field}val` unless it is already bound to a different value,
    /// then the first free `{alias}{field}val{n}`.
    fn value_parameter(&self, alias: &str, field: &str, value: &Value) -> String {
        let base = format!("{alias}{field}val");
        let usable = |name: &str| match self.inner.parameter(name) {
            None => true,
            Some(bound) => bound == value,
        };
        if value.is_null() || usable(&base) {
            return base;
        }

        let mut n = 2;
        loop {
            let name = format!("{base}{n}");
            if usable(&name) {
                return name;
            }
            n += 1;
        }
    }

    /// Name of the hidden column ordering `alias.field` in `locale`.
    ///
    /// `{alias}{field}` for the first locale ordered by, suffixed with the
    /// locale for the others.
    fn hidden_alias(&self, alias: &str, field: &str, locale: Option<&str>) -> String {
        let base = format!("{alias}{field}");
        let taken = |name: &str| {
            self.hidden_selects.values().any(|hidden| hidden == name) || self.inner.has_alias(name)
        };
        if !taken(&base) {
            return base;
        }

        let localized = format!("{base}{}", locale.unwrap_or(""));
        if !taken(&localized) {
            return localized;
        }
        let mut n = 2;
        loop {
            let name = format!("{localized}{n}");
            if !taken(&name) {
                return name;
            }
            n += 1;
        }
    }

    /// Locale to read and the locale to fall back to, if any.
    fn locale_pair(&self, explicit: Option<&str>) -> (Option<String>, Option<String>) {
        let current = self.config.effective_locale(explicit);
        let fallback = self.config.fallback_locale_for(current);
        (current.map(str::to_string), fallback.map(str::to_string))
    }

    /// Predicate matching `value` against `row.field`.
    fn condition(
        &mut self,
        row: &str,
        field: &str,
        value: &Value,
        is_collection: bool,
        parameter: &str,
    ) -> Expr {
        let path = Expr::path(row, field);
        match value {
            Value::Null if is_collection => path.size().equals(Expr::Int(0)),
            Value::Null => path.is_null(),
            Value::Entity(_) if is_collection => Expr::param(parameter).member_of(path),
            Value::Collection(_) if is_collection => {
                let element = self.collection_join(row, field);
                Expr::alias(element).in_(Expr::param(parameter))
            }
            Value::Collection(_) => path.in_(Expr::param(parameter)),
            _ => path.equals(Expr::param(parameter)),
        }
    }

    /// Alias of the elements of collection `row.field`, joining it once.
    fn collection_join(&mut self, row: &str, field: &str) -> String {
        let key = (row.to_string(), field.to_string());
        if let Some(alias) = self.collection_joins.get(&key) {
            return alias.clone();
        }

        let alias = format!("{row}{field}join");
        self.inner
            .add_join(Join::new(JoinKind::Left, row, field, alias.clone()));
        self.collection_joins.insert(key, alias.clone());
        alias
    }

    fn locate_field(&self, alias: &str, field: &str) -> Result<FieldLocation> {
        let class_name = self.class_of(alias)?;
        let translatable = self.metadata.get_class_metadata(&class_name)?;
        let base = self.metadata.base().metadata_for(&class_name)?;

        let Some(association) = translatable.association_for(field) else {
            return Ok(FieldLocation::Own {
                is_collection: base.is_collection_valued_association(field),
            });
        };

        let translation_field = translatable
            .translation_field(field)
            .unwrap_or(field)
            .to_string();
        let translation = self.translation_metadata(base.as_ref(), association)?;

        Ok(FieldLocation::Translated {
            association: association.to_string(),
            is_collection: translation.is_collection_valued_association(&translation_field),
            identifier: translation.identifier_field().to_string(),
            field: translation_field,
        })
    }

    /// Class of the rows behind a root or join alias.
    fn class_of(&self, alias: &str) -> Result<String> {
        if let Some(class_name) = self.inner.root_entity(alias) {
            return Ok(class_name.to_string());
        }

        let join = self
            .inner
            .find_join(alias)
            .ok_or_else(|| Error::InvalidArgument(format!("Unknown alias \"{alias}\"")))?;
        let parent = self.class_of(&join.parent)?;
        let base = self.metadata.base().metadata_for(&parent)?;
        base.association_target_class(&join.association)
            .map(str::to_string)
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "\"{}\" is not an association of class \"{}\"",
                    join.association, parent
                ))
            })
    }

    fn validate_translation_association(&self, parent: &str, association: &str) -> Result<()> {
        let class_name = self.class_of(parent)?;
        let translatable = self.metadata.get_class_metadata(&class_name)?;
        if translatable.translation_association(association).is_none() {
            return Err(Error::InvalidArgument(format!(
                "\"{association}\" is not a translation association of class \"{class_name}\""
            )));
        }
        Ok(())
    }

    fn translation_metadata(
        &self,
        base: &dyn BaseClassMetadata,
        association: &str,
    ) -> Result<Arc<dyn BaseClassMetadata>> {
        let target = base.association_target_class(association).ok_or_else(|| {
            Error::InvalidMetadata(format!(
                "translation association \"{}\" of class \"{}\" is not mapped",
                association,
                base.name()
            ))
        })?;
        self.metadata.base().metadata_for(target)
    }

    /// Locale field of the translation rows reached from `parent` through
    /// `association`.
    fn translation_locale_property(&self, parent: &str, association: &str) -> Result<String> {
        let class_name = self.class_of(parent)?;
        let base = self.metadata.base().metadata_for(&class_name)?;
        let translation = self.translation_metadata(base.as_ref(), association)?;
        let translation_meta: Arc<TranslatableClassMetadata> =
            self.metadata.get_class_metadata(translation.name())?;

        translation_meta
            .locale_property()
            .map(str::to_string)
            .ok_or_else(|| {
                Error::InvalidMetadata(format!(
                    "translation class \"{}\" has no locale property",
                    translation.name()
                ))
            })
    }
}

fn locale_join(path: &str, locale: Option<&str>) -> TranslationJoin {
    let join = TranslationJoin::new(path);
    match locale {
        Some(locale) => join.locale(locale),
        None => join,
    }
}

/// `CASE WHEN cur.id IS NOT NULL THEN cur.field ELSE def.field END`.
fn fallback_value(current: &str, default: &str, identifier: &str, field: &str) -> Expr {
    Expr::case_when(
        Expr::path(current, identifier).is_not_null(),
        Expr::path(current, field),
        Expr::path(default, field),
    )
}

impl<Q: QueryBuilder> Deref for TranslatableQueryBuilder<'_, Q> {
    type Target = Q;

    fn deref(&self) -> &Q {
        &self.inner
    }
}

impl<Q: QueryBuilder> DerefMut for TranslatableQueryBuilder<'_, Q> {
    fn deref_mut(&mut self) -> &mut Q {
        &mut self.inner
    }
}
