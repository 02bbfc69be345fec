//! In-memory entity mappings.

use super::base::BaseClassMetadata;
use super::property::PropertyDecl;

/// Cardinality of an association.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// One-to-one association.
    OneToOne,
    /// Many-to-one association (foreign key on this side).
    ManyToOne,
    /// One-to-many association (foreign key on the target side).
    OneToMany,
    /// Many-to-many association (join table).
    ManyToMany,
}

impl Cardinality {
    /// Check if the association holds a collection.
    pub fn is_collection(&self) -> bool {
        matches!(self, Cardinality::OneToMany | Cardinality::ManyToMany)
    }
}

/// A mapped column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    /// Field name.
    pub name: String,
    /// Class the field is inherited from.
    pub inherited: Option<String>,
}

/// A mapped association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationMapping {
    /// Association name.
    pub name: String,
    /// Target class.
    pub target: String,
    /// Association cardinality.
    pub cardinality: Cardinality,
    /// Class the association is inherited from.
    pub inherited: Option<String>,
}

/// Mapping of one class: fields, associations and declared properties.
///
/// Every mapped field and association is also a declared property; extra
/// declared properties (unmapped, like a locale holder) are added with
/// [`EntityMapping::with_property`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMapping {
    /// Class name (unique within a registry).
    pub name: String,
    /// Name of the identifier field.
    pub identifier: String,
    /// Whether the class is a mapped superclass.
    pub mapped_superclass: bool,
    /// Mapped columns.
    pub fields: Vec<FieldMapping>,
    /// Mapped associations.
    pub associations: Vec<AssociationMapping>,
    /// Declared properties, in declaration order.
    pub properties: Vec<PropertyDecl>,
}

impl EntityMapping {
    /// Create a mapping with its identifier field.
    pub fn new(name: impl Into<String>, identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        Self {
            name: name.into(),
            identifier: identifier.clone(),
            mapped_superclass: false,
            fields: Vec::new(),
            associations: Vec::new(),
            properties: Vec::new(),
        }
        .with_field(identifier)
    }

    /// Mark the class as a mapped superclass.
    pub fn with_mapped_superclass(mut self) -> Self {
        self.mapped_superclass = true;
        self
    }

    /// Add a column.
    pub fn with_field(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.declare(PropertyDecl::private(name.clone()));
        self.fields.push(FieldMapping {
            name,
            inherited: None,
        });
        self
    }

    /// Add a column inherited from `parent`.
    pub fn with_inherited_field(mut self, name: impl Into<String>, parent: impl Into<String>) -> Self {
        let name = name.into();
        self.declare(PropertyDecl::private(name.clone()));
        self.fields.push(FieldMapping {
            name,
            inherited: Some(parent.into()),
        });
        self
    }

    /// Add an association.
    pub fn with_association(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        let name = name.into();
        self.declare(PropertyDecl::private(name.clone()));
        self.associations.push(AssociationMapping {
            name,
            target: target.into(),
            cardinality,
            inherited: None,
        });
        self
    }

    /// Add an association inherited from `parent`.
    pub fn with_inherited_association(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        cardinality: Cardinality,
        parent: impl Into<String>,
    ) -> Self {
        let name = name.into();
        self.declare(PropertyDecl::private(name.clone()));
        self.associations.push(AssociationMapping {
            name,
            target: target.into(),
            cardinality,
            inherited: Some(parent.into()),
        });
        self
    }

    /// Declare a property, replacing an earlier declaration of the same name
    /// (so markers can be attached to mapped fields).
    pub fn with_property(mut self, property: PropertyDecl) -> Self {
        self.declare(property);
        self
    }

    fn declare(&mut self, property: PropertyDecl) {
        match self.properties.iter_mut().find(|p| p.name == property.name) {
            Some(existing) => *existing = property,
            None => self.properties.push(property),
        }
    }

    /// Get a column by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldMapping> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Get an association by name.
    pub fn get_association(&self, name: &str) -> Option<&AssociationMapping> {
        self.associations.iter().find(|a| a.name == name)
    }

    /// Get a declared property by name.
    pub fn get_property(&self, name: &str) -> Option<&PropertyDecl> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Check if `name` is a to-many association.
    pub fn is_collection_association(&self, name: &str) -> bool {
        self.get_association(name)
            .map(|a| a.cardinality.is_collection())
            .unwrap_or(false)
    }
}

impl BaseClassMetadata for EntityMapping {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_mapped_superclass(&self) -> bool {
        self.mapped_superclass
    }

    fn is_inherited_field(&self, field: &str) -> bool {
        self.get_field(field)
            .map(|f| f.inherited.is_some())
            .unwrap_or(false)
    }

    fn is_inherited_association(&self, association: &str) -> bool {
        self.get_association(association)
            .map(|a| a.inherited.is_some())
            .unwrap_or(false)
    }

    fn has_association(&self, name: &str) -> bool {
        self.get_association(name).is_some()
    }

    fn is_collection_valued_association(&self, name: &str) -> bool {
        self.is_collection_association(name)
    }

    fn association_target_class(&self, name: &str) -> Option<&str> {
        self.get_association(name).map(|a| a.target.as_str())
    }

    fn identifier_field(&self) -> &str {
        &self.identifier
    }

    fn declared_properties(&self) -> &[PropertyDecl] {
        &self.properties
    }
}
