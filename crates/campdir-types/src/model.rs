//! The region tree.
//!
//! On the wire a region is `{ id, name, hasUnions, unions?, wards? }` with
//! exactly one of the two collections meaningful. In memory that flag becomes
//! [`RegionKind`], so every branch on it is an exhaustive match.

use serde::{Deserialize, Serialize};

use crate::ids;

/// The whole forest. One remote document holds exactly this.
pub type Tree = Vec<Region>;

/// A named contact attached to a ward or a union.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub name: String,
    /// Omitted on the wire when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Person {
    /// Create a person with a freshly generated id.
    pub fn new(name: impl Into<String>, phone: Option<String>) -> Self {
        Self {
            id: ids::person_id(),
            name: name.into(),
            phone,
        }
    }
}

/// Smallest subdivision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ward {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub persons: Vec<Person>,
}

impl Ward {
    /// Create an empty ward with a freshly generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ids::ward_id(),
            name: name.into(),
            persons: Vec::new(),
        }
    }
}

/// A union-council subdivision of a region.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Union {
    pub id: String,
    pub name: String,
    /// Up to two responsible persons. The cap lives in the presentation layer.
    #[serde(default)]
    pub union_responsible: Vec<Person>,
    #[serde(default)]
    pub wards: Vec<Ward>,
}

impl Union {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ids::union_id(),
            name: name.into(),
            union_responsible: Vec::new(),
            wards: Vec::new(),
        }
    }
}

/// Which child collection a region owns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegionKind {
    /// `hasUnions: true`: wards live inside unions.
    Unions(Vec<Union>),
    /// `hasUnions: false`: a pouroshova with wards directly under it.
    Wards(Vec<Ward>),
}

/// Top-level administrative area.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RegionRepr", into = "RegionRepr")]
pub struct Region {
    pub id: String,
    pub name: String,
    pub kind: RegionKind,
}

impl Region {
    /// A union-bearing region.
    pub fn with_unions(id: impl Into<String>, name: impl Into<String>, unions: Vec<Union>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: RegionKind::Unions(unions),
        }
    }

    /// A direct-ward (pouroshova) region.
    pub fn with_wards(id: impl Into<String>, name: impl Into<String>, wards: Vec<Ward>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: RegionKind::Wards(wards),
        }
    }

    pub fn has_unions(&self) -> bool {
        matches!(self.kind, RegionKind::Unions(_))
    }

    /// Unions of a union-bearing region; empty for a pouroshova.
    pub fn unions(&self) -> &[Union] {
        match &self.kind {
            RegionKind::Unions(unions) => unions,
            RegionKind::Wards(_) => &[],
        }
    }

    /// Direct wards of a pouroshova; empty for a union-bearing region.
    pub fn direct_wards(&self) -> &[Ward] {
        match &self.kind {
            RegionKind::Unions(_) => &[],
            RegionKind::Wards(wards) => wards,
        }
    }

    /// Every ward in the region regardless of shape, in display order.
    pub fn all_wards(&self) -> impl Iterator<Item = &Ward> {
        let (via_unions, direct) = match &self.kind {
            RegionKind::Unions(unions) => (Some(unions.iter().flat_map(|u| u.wards.iter())), None),
            RegionKind::Wards(wards) => (None, Some(wards.iter())),
        };
        via_unions.into_iter().flatten().chain(direct.into_iter().flatten())
    }
}

/// Wire shape of a region.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegionRepr {
    id: String,
    name: String,
    #[serde(default)]
    has_unions: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unions: Option<Vec<Union>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    wards: Option<Vec<Ward>>,
}

impl From<RegionRepr> for Region {
    fn from(repr: RegionRepr) -> Self {
        // A missing flag is inferred from which collection is present.
        let has_unions = repr.has_unions.unwrap_or(repr.unions.is_some());
        let kind = if has_unions {
            RegionKind::Unions(repr.unions.unwrap_or_default())
        } else {
            RegionKind::Wards(repr.wards.unwrap_or_default())
        };
        Self {
            id: repr.id,
            name: repr.name,
            kind,
        }
    }
}

impl From<Region> for RegionRepr {
    fn from(region: Region) -> Self {
        let (has_unions, unions, wards) = match region.kind {
            RegionKind::Unions(unions) => (true, Some(unions), None),
            RegionKind::Wards(wards) => (false, None, Some(wards)),
        };
        Self {
            id: region.id,
            name: region.name,
            has_unions: Some(has_unions),
            unions,
            wards,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
