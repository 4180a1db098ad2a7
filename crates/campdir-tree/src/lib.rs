//! Entity Tree Model for campdir.
//!
//! Everything here is a pure function over [`Tree`](campdir_types::Tree):
//!
//! - [`filter`]: transient projections for display (`apply_filters`), plus
//!   the choices and totals a filter bar needs
//! - [`mutation`]: reducer-style edits, one [`Mutation`] per user intent
//! - [`export`]: flattening into tabular rows, CSV and a printable document
//!
//! The canonical tree is owned by the sync session; nothing in this crate
//! holds state.

pub mod export;
pub mod filter;
pub mod mutation;

#[cfg(test)]
pub(crate) mod fixtures;

pub use export::{DEFAULT_TITLE, ExportRow, ExportScope, HEADERS, Role, flatten, to_csv, to_printable_html};
pub use filter::{Choice, FilterOptions, FilterStats, Filters, WardChoice, apply_filters, filter_options, filter_stats};
pub use mutation::{Mutation, UNION_RESPONSIBLE_CAP, union_at_capacity};
