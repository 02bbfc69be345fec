//! Query building: a DQL expression model, the host builder abstraction and
//! the translation-aware rewriting layered on it.

mod builder;
mod expr;
mod translatable;

pub use builder::{DqlQueryBuilder, QueryBuilder};
pub use expr::{split_join_path, Expr, Join, JoinKind, OrderDirection, OrderTerm, SelectItem};
pub use translatable::{TranslatableQueryBuilder, TranslationJoin};
