//! Translation lifecycle: copying values between translatable objects and
//! their per-locale translation rows.

mod context;
mod helper;
mod manager;
mod repository;

pub use context::TranslationContext;
pub use helper::{SyncOutcome, TranslationHelper};
pub use manager::TranslatableManager;
pub use repository::{InMemoryTranslationRepository, ObjectManager, TranslationRepository, UnitOfWork};
