//! Shared data model for campdir.
//!
//! This crate is the leaf of the workspace: the region tree, identifier
//! generation, and form validation. It has **no internal campdir
//! dependencies**.
//!
//! # Entity Overview
//!
//! ```text
//! Region (RegionId) ← top-level administrative area
//!     ├── RegionKind::Unions  → Union
//!     │                           ├── union_responsible: [Person] (≤ 2, UI-enforced)
//!     │                           └── wards: [Ward] → persons: [Person]
//!     └── RegionKind::Wards   → Ward ("pouroshova" shape)
//!                                 └── persons: [Person]
//! ```
//!
//! Ownership is positional: a ward does not know whether its parent is a
//! region or a union. Lookups always walk down from the forest root.

pub mod form;
pub mod ids;
pub mod model;

pub use form::{FieldError, FormData, FormField, FormInput, FormKind, ValidationError, ValidationErrors};
pub use ids::{EntityKind, generate_id};
pub use model::{Person, Region, RegionKind, Tree, Union, Ward};

/// Current time as Unix milliseconds.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
