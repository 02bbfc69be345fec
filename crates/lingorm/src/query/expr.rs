//! DQL expression tree.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    /// Inner join.
    Inner,
    /// Left outer join.
    #[default]
    Left,
}

impl JoinKind {
    /// DQL keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
        }
    }
}

impl FromStr for JoinKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "INNER" => Ok(JoinKind::Inner),
            "LEFT" => Ok(JoinKind::Left),
            _ => Err(Error::InvalidArgument(format!("Unknown join type \"{s}\""))),
        }
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl FromStr for OrderDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(OrderDirection::Asc),
            "DESC" => Ok(OrderDirection::Desc),
            _ => Err(Error::InvalidArgument(format!("Unknown order direction \"{s}\""))),
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDirection::Asc => f.write_str("ASC"),
            OrderDirection::Desc => f.write_str("DESC"),
        }
    }
}

/// A DQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Alias, path expression (`a.title`) or result variable.
    Path(String),
    /// Named parameter (rendered with a leading colon).
    Parameter(String),
    /// Boolean literal.
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// `left = right`.
    Eq(Box<Expr>, Box<Expr>),
    /// `expr IS NULL`.
    IsNull(Box<Expr>),
    /// `expr IS NOT NULL`.
    IsNotNull(Box<Expr>),
    /// `expr IN(list)`.
    In(Box<Expr>, Box<Expr>),
    /// `element MEMBER OF collection`.
    MemberOf(Box<Expr>, Box<Expr>),
    /// `SIZE(collection)`.
    Size(Box<Expr>),
    /// Conjunction, rendered without parentheses.
    And(Vec<Expr>),
    /// `CASE WHEN .. THEN .. ELSE .. END`.
    Case {
        /// Condition/result pairs, in order.
        whens: Vec<(Expr, Expr)>,
        /// Result when no condition holds.
        otherwise: Box<Expr>,
    },
}

impl Expr {
    /// `alias.field`.
    pub fn path(alias: &str, field: &str) -> Self {
        Expr::Path(format!("{alias}.{field}"))
    }

    /// A bare alias or result variable.
    pub fn alias(alias: impl Into<String>) -> Self {
        Expr::Path(alias.into())
    }

    /// `:name`.
    pub fn param(name: impl Into<String>) -> Self {
        Expr::Parameter(name.into())
    }

    /// `self = other`.
    pub fn equals(self, other: Expr) -> Self {
        Expr::Eq(Box::new(self), Box::new(other))
    }

    /// `self IS NULL`.
    pub fn is_null(self) -> Self {
        Expr::IsNull(Box::new(self))
    }

    /// `self IS NOT NULL`.
    pub fn is_not_null(self) -> Self {
        Expr::IsNotNull(Box::new(self))
    }

    /// `self IN(list)`.
    pub fn in_(self, list: Expr) -> Self {
        Expr::In(Box::new(self), Box::new(list))
    }

    /// `self MEMBER OF collection`.
    pub fn member_of(self, collection: Expr) -> Self {
        Expr::MemberOf(Box::new(self), Box::new(collection))
    }

    /// `SIZE(self)`.
    pub fn size(self) -> Self {
        Expr::Size(Box::new(self))
    }

    /// `CASE WHEN condition THEN then ELSE otherwise END`.
    pub fn case_when(condition: Expr, then: Expr, otherwise: Expr) -> Self {
        Expr::Case {
            whens: vec![(condition, then)],
            otherwise: Box::new(otherwise),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Path(path) => f.write_str(path),
            Expr::Parameter(name) => write!(f, ":{name}"),
            Expr::Bool(true) => f.write_str("TRUE"),
            Expr::Bool(false) => f.write_str("FALSE"),
            Expr::Int(i) => write!(f, "{i}"),
            Expr::Eq(left, right) => write!(f, "{left} = {right}"),
            Expr::IsNull(expr) => write!(f, "{expr} IS NULL"),
            Expr::IsNotNull(expr) => write!(f, "{expr} IS NOT NULL"),
            Expr::In(expr, list) => write!(f, "{expr} IN({list})"),
            Expr::MemberOf(element, collection) => write!(f, "{element} MEMBER OF {collection}"),
            Expr::Size(collection) => write!(f, "SIZE({collection})"),
            Expr::And(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" AND ")?;
                    }
                    write!(f, "{part}")?;
                }
                Ok(())
            }
            Expr::Case { whens, otherwise } => {
                f.write_str("CASE")?;
                for (condition, result) in whens {
                    write!(f, " WHEN {condition} THEN {result}")?;
                }
                write!(f, " ELSE {otherwise} END")
            }
        }
    }
}

/// A join of an association into the query.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// Join type.
    pub kind: JoinKind,
    /// Alias the association is navigated from.
    pub parent: String,
    /// Association name.
    pub association: String,
    /// Alias of the joined rows.
    pub alias: String,
    /// Extra `WITH` condition.
    pub condition: Option<Expr>,
}

impl Join {
    /// Join `parent.association` as `alias`.
    pub fn new(
        kind: JoinKind,
        parent: impl Into<String>,
        association: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            parent: parent.into(),
            association: association.into(),
            alias: alias.into(),
            condition: None,
        }
    }

    /// Join a `parent.association` path as `alias`.
    pub fn from_path(kind: JoinKind, path: &str, alias: impl Into<String>) -> Result<Self> {
        let (parent, association) = split_join_path(path)?;
        Ok(Self::new(kind, parent, association, alias))
    }

    /// Restrict the joined rows.
    pub fn with_condition(mut self, condition: Expr) -> Self {
        self.condition = Some(condition);
        self
    }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} JOIN {}.{} {}",
            self.kind, self.parent, self.association, self.alias
        )?;
        if let Some(condition) = &self.condition {
            write!(f, " WITH {condition}")?;
        }
        Ok(())
    }
}

/// An item of the select clause.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    /// Selected expression.
    pub expr: Expr,
    /// Result variable name.
    pub alias: Option<String>,
    /// Hidden items are usable in ORDER BY but not hydrated.
    pub hidden: bool,
}

impl SelectItem {
    /// Select an expression as is.
    pub fn new(expr: Expr) -> Self {
        Self {
            expr,
            alias: None,
            hidden: false,
        }
    }

    /// Select an expression as a hidden result variable.
    pub fn hidden(expr: Expr, alias: impl Into<String>) -> Self {
        Self {
            expr,
            alias: Some(alias.into()),
            hidden: true,
        }
    }
}

impl fmt::Display for SelectItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        match (&self.alias, self.hidden) {
            (Some(alias), true) => write!(f, " HIDDEN {alias}"),
            (Some(alias), false) => write!(f, " AS {alias}"),
            (None, _) => Ok(()),
        }
    }
}

/// An ORDER BY term.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTerm {
    /// Sorted expression.
    pub expr: Expr,
    /// Sort direction.
    pub direction: OrderDirection,
}

impl OrderTerm {
    /// Order by `expr` in `direction`.
    pub fn new(expr: Expr, direction: OrderDirection) -> Self {
        Self { expr, direction }
    }
}

impl fmt::Display for OrderTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.expr, self.direction)
    }
}

/// Split `parent.association`.
pub fn split_join_path(path: &str) -> Result<(&str, &str)> {
    match path.split_once('.') {
        Some((parent, association))
            if !parent.is_empty() && !association.is_empty() && !association.contains('.') =>
        {
            Ok((parent, association))
        }
        _ => Err(Error::InvalidArgument(format!(
            "join path \"{path}\" is not of the form \"alias.association\""
        ))),
    }
}
