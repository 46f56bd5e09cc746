//! Taxonomy loading and indexing
//!
//! ```text
//! TaxonomySource (HTTP / static) → TaxonomyLoader (fail-soft) → TaxonomyIndex
//!                                          ↑
//!                                   TaxonomyStore (load once, invalidate on leave)
//! ```

pub mod index;
pub mod loader;
pub mod source;

pub use index::{StructuralIssue, TaxonomyIndex};
pub use loader::{LoadOutcome, TaxonomyLoader, TaxonomyStore};
pub use source::{HttpTaxonomySource, StaticTaxonomySource, TaxonomySource};
