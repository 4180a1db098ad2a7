//! Filtered projections of the region tree.
//!
//! [`apply_filters`] never touches the canonical tree: it builds a transient
//! copy containing only the surviving branches, in their original order.
//!
//! | filter  | pouroshova region      | union-bearing region                   |
//! |---------|------------------------|----------------------------------------|
//! | region  | keep if id matches     | keep if id matches                     |
//! | union   | no-op                  | keep matching union only               |
//! | ward    | keep matching ward     | narrow every surviving union's wards;  |
//! |         |                        | unions are never dropped by this       |
//!
//! `union` and `ward` apply across every region when `region` is empty.

use campdir_types::{Region, RegionKind, Tree, Union, Ward};
use serde::{Deserialize, Serialize};

/// The current region/union/ward selection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub union: Option<String>,
    #[serde(default)]
    pub ward: Option<String>,
}

impl Filters {
    /// Build from raw selector values; empty strings mean "any".
    pub fn new(region: &str, union: &str, ward: &str) -> Self {
        fn non_empty(s: &str) -> Option<String> {
            (!s.is_empty()).then(|| s.to_string())
        }
        Self {
            region: non_empty(region),
            union: non_empty(union),
            ward: non_empty(ward),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.region.is_none() && self.union.is_none() && self.ward.is_none()
    }

    /// Choosing a region resets the union and ward choices.
    pub fn select_region(&mut self, region: Option<String>) {
        self.region = region;
        self.union = None;
        self.ward = None;
    }

    /// Choosing a union resets the ward choice.
    pub fn select_union(&mut self, union: Option<String>) {
        self.union = union;
        self.ward = None;
    }

    pub fn select_ward(&mut self, ward: Option<String>) {
        self.ward = ward;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Project `tree` through `filters`.
pub fn apply_filters(tree: &Tree, filters: &Filters) -> Tree {
    if filters.is_empty() {
        return tree.clone();
    }

    tree.iter()
        .filter(|region| matches_id(&filters.region, &region.id))
        .map(|region| narrow_region(region, filters))
        .collect()
}

fn matches_id(filter: &Option<String>, id: &str) -> bool {
    filter.as_deref().is_none_or(|wanted| wanted == id)
}

fn narrow_region(region: &Region, filters: &Filters) -> Region {
    let kind = match &region.kind {
        RegionKind::Wards(wards) => match filters.ward {
            Some(_) => RegionKind::Wards(narrow_wards(wards, &filters.ward)),
            None => return region.clone(),
        },
        RegionKind::Unions(unions) => {
            if filters.union.is_none() && filters.ward.is_none() {
                return region.clone();
            }
            RegionKind::Unions(
                unions
                    .iter()
                    .filter(|union| matches_id(&filters.union, &union.id))
                    .map(|union| narrow_union(union, &filters.ward))
                    .collect(),
            )
        }
    };

    Region {
        id: region.id.clone(),
        name: region.name.clone(),
        kind,
    }
}

fn narrow_union(union: &Union, ward: &Option<String>) -> Union {
    if ward.is_none() {
        return union.clone();
    }
    Union {
        id: union.id.clone(),
        name: union.name.clone(),
        union_responsible: union.union_responsible.clone(),
        wards: narrow_wards(&union.wards, ward),
    }
}

fn narrow_wards(wards: &[Ward], ward: &Option<String>) -> Vec<Ward> {
    wards.iter().filter(|w| matches_id(ward, &w.id)).cloned().collect()
}

// ============================================================================
// Filter bar support
// ============================================================================

/// A selectable union or ward.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub id: String,
    pub name: String,
}

/// A selectable ward, labelled with its union when listed across unions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WardChoice {
    pub id: String,
    pub name: String,
    pub union_name: Option<String>,
}

/// What the union and ward selectors offer for the current selection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub unions: Vec<Choice>,
    pub wards: Vec<WardChoice>,
}

/// Selector contents. Nothing is offered until a region is chosen.
pub fn filter_options(tree: &Tree, filters: &Filters) -> FilterOptions {
    let Some(region) = selected_region(tree, filters) else {
        return FilterOptions::default();
    };

    match &region.kind {
        RegionKind::Wards(wards) => FilterOptions {
            unions: Vec::new(),
            wards: wards.iter().map(|w| ward_choice(w, None)).collect(),
        },
        RegionKind::Unions(unions) => {
            let union_choices = unions
                .iter()
                .map(|u| Choice {
                    id: u.id.clone(),
                    name: u.name.clone(),
                })
                .collect();

            let wards = match &filters.union {
                None => unions
                    .iter()
                    .flat_map(|u| u.wards.iter().map(move |w| ward_choice(w, Some(&u.name))))
                    .collect(),
                Some(union_id) => unions
                    .iter()
                    .find(|u| &u.id == union_id)
                    .map(|u| u.wards.iter().map(|w| ward_choice(w, None)).collect())
                    .unwrap_or_default(),
            };

            FilterOptions {
                unions: union_choices,
                wards,
            }
        }
    }
}

fn ward_choice(ward: &Ward, union_name: Option<&str>) -> WardChoice {
    WardChoice {
        id: ward.id.clone(),
        name: ward.name.clone(),
        union_name: union_name.map(String::from),
    }
}

/// Totals shown under the filter bar for the selected region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FilterStats {
    pub unions: usize,
    pub wards: usize,
    /// Ward persons plus union-responsible persons.
    pub persons: usize,
}

/// Totals for the selected region under the current filters; `None` until a
/// region is chosen.
pub fn filter_stats(tree: &Tree, filters: &Filters) -> Option<FilterStats> {
    let region = selected_region(tree, filters)?;
    let mut stats = FilterStats::default();

    let count_wards = |wards: &[Ward], stats: &mut FilterStats| {
        for ward in wards.iter().filter(|w| matches_id(&filters.ward, &w.id)) {
            stats.wards += 1;
            stats.persons += ward.persons.len();
        }
    };

    match &region.kind {
        RegionKind::Wards(wards) => count_wards(wards, &mut stats),
        RegionKind::Unions(unions) => {
            for union in unions.iter().filter(|u| matches_id(&filters.union, &u.id)) {
                stats.unions += 1;
                stats.persons += union.union_responsible.len();
                count_wards(&union.wards, &mut stats);
            }
        }
    }

    Some(stats)
}

fn selected_region<'a>(tree: &'a Tree, filters: &Filters) -> Option<&'a Region> {
    let id = filters.region.as_deref()?;
    tree.iter().find(|r| r.id == id)
}
