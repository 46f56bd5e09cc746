//! Incident Triage - classification and risk resolution for incident records
//!
//! Loads the incident taxonomy (two four-level category trees plus the
//! incident-level, severity and probability vocabularies) from a backend,
//! drives cascading category selection, scores severity × probability into a
//! risk band mapped onto the tenant's incident levels, and rebuilds all of
//! this state from previously persisted records.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌─────────────────┐     ┌───────────────┐
//! │ TaxonomySource   │────▶│ TaxonomyStore   │────▶│ TaxonomyIndex │
//! │ (HTTP / static)  │     │ (load + cache)  │     │ (read-only)   │
//! └──────────────────┘     └─────────────────┘     └───────┬───────┘
//!                                                          │ Arc
//!                 ┌────────────────────┬───────────────────┼───────────────────┐
//!                 ▼                    ▼                   ▼                   ▼
//!       CascadingSelector      RiskClassifier   PersistedSelectionResolver  IncidentEditSession
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use incident_triage::{IncidentEditSession, StaticTaxonomySource, TaxonomyStore};
//! use std::sync::Arc;
//!
//! # async fn run() -> incident_triage::Result<()> {
//! let source = StaticTaxonomySource::from_file("taxonomy.json")?;
//! let store = TaxonomyStore::from_source(Arc::new(source));
//! let session = IncidentEditSession::new(store.get().await);
//! assert!(session.incident_level_editable());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod hydration;
pub mod risk;
pub mod selector;
pub mod session;
pub mod taxonomy;

pub use config::{TaxonomyEndpointConfig, TriageConfig};
pub use error::{Result, TriageError};
pub use hydration::{FieldOutcome, Hydrated, HydrationReport, PersistedSelectionResolver};
pub use risk::{RiskAssessment, RiskBand, RiskChoice, RiskClassifier, RiskInputs};
pub use selector::{CascadingSelector, CategorySelection};
pub use session::{IncidentEditSession, LevelSource, SessionSnapshot};
pub use taxonomy::{
    HttpTaxonomySource, StaticTaxonomySource, TaxonomyIndex, TaxonomyLoader, TaxonomySource,
    TaxonomyStore,
};

pub use incident_types;
