//! Host query builder abstraction and a DQL-rendering implementation.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::error::{Error, Result};
use crate::value::Value;

use super::expr::{Expr, Join, JoinKind, OrderDirection, OrderTerm, SelectItem};

/// Operations the translatable engine needs from the host query builder.
pub trait QueryBuilder {
    /// Class selected from under a root alias.
    fn root_entity(&self, alias: &str) -> Option<&str>;

    /// Join registered under `alias`.
    fn find_join(&self, alias: &str) -> Option<&Join>;

    /// Check if `alias` names a root or a join.
    fn has_alias(&self, alias: &str) -> bool {
        self.root_entity(alias).is_some() || self.find_join(alias).is_some()
    }

    /// Append an item to the select clause.
    fn add_select(&mut self, item: SelectItem) -> &mut Self;

    /// Append a join.
    fn add_join(&mut self, join: Join) -> &mut Self;

    /// Add a predicate, combined with the existing ones by AND.
    fn and_where(&mut self, predicate: Expr) -> &mut Self;

    /// Append an ORDER BY term.
    fn add_order_by(&mut self, term: OrderTerm) -> &mut Self;

    /// Bind a parameter value, replacing an earlier binding.
    fn set_parameter(&mut self, name: &str, value: Value) -> &mut Self;

    /// Value bound to a parameter.
    fn parameter(&self, name: &str) -> Option<&Value>;
}

/// Query builder rendering DQL text.
///
/// ```
/// use lingorm::query::{DqlQueryBuilder, Expr, QueryBuilder};
///
/// let mut qb = DqlQueryBuilder::new();
/// qb.select("a").from("Article", "a");
/// qb.and_where(Expr::path("a", "title").is_null());
/// assert_eq!(qb.dql(), "SELECT a FROM Article a WHERE a.title IS NULL");
/// ```
#[derive(Debug, Clone, Default)]
pub struct DqlQueryBuilder {
    select: Vec<SelectItem>,
    from: Vec<(String, String)>,
    joins: Vec<Join>,
    predicates: Vec<Expr>,
    order_by: Vec<OrderTerm>,
    parameters: BTreeMap<String, Value>,
}

impl DqlQueryBuilder {
    /// Create an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the select clause with a single alias or path.
    pub fn select(&mut self, alias: &str) -> &mut Self {
        self.select = vec![SelectItem::new(Expr::alias(alias))];
        self
    }

    /// Add a root class under `alias`.
    pub fn from(&mut self, class_name: &str, alias: &str) -> &mut Self {
        self.from.push((class_name.to_string(), alias.to_string()));
        self
    }

    /// Join a `parent.association` path.
    pub fn join(&mut self, kind: JoinKind, path: &str, alias: &str) -> Result<&mut Self> {
        if self.has_alias(alias) {
            return Err(Error::InvalidArgument(format!(
                "alias \"{alias}\" is already defined"
            )));
        }
        let join = Join::from_path(kind, path, alias)?;
        Ok(self.add_join(join))
    }

    /// Left join a `parent.association` path.
    pub fn left_join(&mut self, path: &str, alias: &str) -> Result<&mut Self> {
        self.join(JoinKind::Left, path, alias)
    }

    /// Inner join a `parent.association` path.
    pub fn inner_join(&mut self, path: &str, alias: &str) -> Result<&mut Self> {
        self.join(JoinKind::Inner, path, alias)
    }

    /// Order by `alias.field`.
    pub fn order_by(&mut self, alias: &str, field: &str, direction: OrderDirection) -> &mut Self {
        self.add_order_by(OrderTerm::new(Expr::path(alias, field), direction))
    }

    /// Joins, in insertion order.
    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    /// Predicates of the WHERE clause.
    pub fn predicates(&self) -> &[Expr] {
        &self.predicates
    }

    /// All parameter bindings.
    pub fn parameters(&self) -> &BTreeMap<String, Value> {
        &self.parameters
    }

    /// Render the query as single-line DQL.
    ///
    /// A single predicate is rendered as is; several are parenthesized and
    /// joined by AND.
    pub fn dql(&self) -> String {
        let mut dql = String::from("SELECT ");
        push_list(&mut dql, &self.select);

        dql.push_str(" FROM ");
        for (i, (class_name, alias)) in self.from.iter().enumerate() {
            if i > 0 {
                dql.push_str(", ");
            }
            let _ = write!(dql, "{class_name} {alias}");
        }

        for join in &self.joins {
            let _ = write!(dql, " {join}");
        }

        match self.predicates.as_slice() {
            [] => {}
            [single] => {
                let _ = write!(dql, " WHERE {single}");
            }
            many => {
                dql.push_str(" WHERE ");
                for (i, predicate) in many.iter().enumerate() {
                    if i > 0 {
                        dql.push_str(" AND ");
                    }
                    let _ = write!(dql, "({predicate})");
                }
            }
        }

        if !self.order_by.is_empty() {
            dql.push_str(" ORDER BY ");
            push_list(&mut dql, &self.order_by);
        }

        dql
    }
}

fn push_list<T: std::fmt::Display>(out: &mut String, items: &[T]) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{item}");
    }
}

impl QueryBuilder for DqlQueryBuilder {
    fn root_entity(&self, alias: &str) -> Option<&str> {
        self.from
            .iter()
            .find(|(_, a)| a == alias)
            .map(|(class_name, _)| class_name.as_str())
    }

    fn find_join(&self, alias: &str) -> Option<&Join> {
        self.joins.iter().find(|j| j.alias == alias)
    }

    fn add_select(&mut self, item: SelectItem) -> &mut Self {
        self.select.push(item);
        self
    }

    fn add_join(&mut self, join: Join) -> &mut Self {
        self.joins.push(join);
        self
    }

    fn and_where(&mut self, predicate: Expr) -> &mut Self {
        self.predicates.push(predicate);
        self
    }

    fn add_order_by(&mut self, term: OrderTerm) -> &mut Self {
        self.order_by.push(term);
        self
    }

    fn set_parameter(&mut self, name: &str, value: Value) -> &mut Self {
        self.parameters.insert(name.to_string(), value);
        self
    }

    fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }
}
