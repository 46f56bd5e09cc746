//! Incident Types - shared wire types for incident triage
//!
//! Single source of truth for the shapes crossing the backend boundary:
//!
//! - [`Tag`] records from the taxonomy endpoint, with their opaque
//!   `tag_type` tokens modelled as [`TagKind`]
//! - [`CategorySlot`] addressing of the two four-level category trees
//! - [`IncidentRecord`] as read and [`IncidentUpdate`] as written back
//!
//! Data structures only; lookup, hydration and scoring live in
//! `incident-triage`.

pub mod record;
pub mod tag;

pub use record::{deserialize_opt_ref, IncidentRecord, IncidentUpdate, RawRef, TriState};
pub use tag::{CategorySlot, Depth, LookupOption, ParseTagKindError, Tag, TagId, TagKind, Tree};
