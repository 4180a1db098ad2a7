//! Tree mutations.
//!
//! Every user intent that changes the tree is a [`Mutation`]. Applying one is
//! a total function `Tree -> Tree`:
//!
//! - The target parent is located by id across the whole forest. Ids are
//!   unique, so at most one branch is touched.
//! - Only the matched branch is rewritten; every other region, union and ward
//!   is moved through untouched.
//! - An unknown id is a no-op, never an error.
//!
//! Ids for new entities are generated when the mutation is *constructed*, not
//! when it is applied, so applying the same value twice is deterministic.

use campdir_types::{Person, RegionKind, Tree, Union, Ward, ids};
use serde::{Deserialize, Serialize};

/// Maximum union-responsible persons shown by the presentation layer.
///
/// Reducers do not enforce this; see [`union_at_capacity`].
pub const UNION_RESPONSIBLE_CAP: usize = 2;

/// One reducer-level edit.
///
/// `parent_id` is a region id for a pouroshova's direct wards and a union id
/// for wards inside a union.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    EditUnionName {
        union_id: String,
        name: String,
    },
    AddWard {
        parent_id: String,
        ward_id: String,
        name: String,
    },
    EditWardName {
        parent_id: String,
        ward_id: String,
        name: String,
    },
    DeleteWard {
        parent_id: String,
        ward_id: String,
    },
    AddUnionPerson {
        union_id: String,
        person_id: String,
        name: String,
        phone: Option<String>,
    },
    EditUnionPerson {
        union_id: String,
        person_id: String,
        name: String,
        phone: Option<String>,
    },
    DeleteUnionPerson {
        union_id: String,
        person_id: String,
    },
    AddWardPerson {
        parent_id: String,
        ward_id: String,
        person_id: String,
        name: String,
        phone: Option<String>,
    },
    EditWardPerson {
        parent_id: String,
        ward_id: String,
        person_id: String,
        name: String,
        phone: Option<String>,
    },
    DeleteWardPerson {
        parent_id: String,
        ward_id: String,
        person_id: String,
    },
}

impl Mutation {
    /// New ward under a pouroshova region or a union, with a fresh id.
    pub fn add_ward(parent_id: impl Into<String>, name: impl Into<String>) -> Self {
        Mutation::AddWard {
            parent_id: parent_id.into(),
            ward_id: ids::ward_id(),
            name: name.into(),
        }
    }

    /// New union-responsible person, with a fresh id.
    pub fn add_union_person(
        union_id: impl Into<String>,
        name: impl Into<String>,
        phone: Option<String>,
    ) -> Self {
        Mutation::AddUnionPerson {
            union_id: union_id.into(),
            person_id: ids::person_id(),
            name: name.into(),
            phone,
        }
    }

    /// New ward-responsible person, with a fresh id.
    pub fn add_ward_person(
        parent_id: impl Into<String>,
        ward_id: impl Into<String>,
        name: impl Into<String>,
        phone: Option<String>,
    ) -> Self {
        Mutation::AddWardPerson {
            parent_id: parent_id.into(),
            ward_id: ward_id.into(),
            person_id: ids::person_id(),
            name: name.into(),
            phone,
        }
    }

    /// Id of the entity this mutation creates, if any.
    pub fn created_id(&self) -> Option<&str> {
        match self {
            Mutation::AddWard { ward_id, .. } => Some(ward_id),
            Mutation::AddUnionPerson { person_id, .. } | Mutation::AddWardPerson { person_id, .. } => {
                Some(person_id)
            }
            _ => None,
        }
    }

    /// Short operation name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::EditUnionName { .. } => "edit_union_name",
            Mutation::AddWard { .. } => "add_ward",
            Mutation::EditWardName { .. } => "edit_ward_name",
            Mutation::DeleteWard { .. } => "delete_ward",
            Mutation::AddUnionPerson { .. } => "add_union_person",
            Mutation::EditUnionPerson { .. } => "edit_union_person",
            Mutation::DeleteUnionPerson { .. } => "delete_union_person",
            Mutation::AddWardPerson { .. } => "add_ward_person",
            Mutation::EditWardPerson { .. } => "edit_ward_person",
            Mutation::DeleteWardPerson { .. } => "delete_ward_person",
        }
    }

    /// Apply to `tree`, returning the new tree.
    pub fn apply(self, mut tree: Tree) -> Tree {
        match self {
            Mutation::EditUnionName { union_id, name } => {
                if let Some(union) = union_mut(&mut tree, &union_id) {
                    union.name = name;
                }
            }
            Mutation::AddWard { parent_id, ward_id, name } => {
                if let Some(wards) = ward_list_mut(&mut tree, &parent_id) {
                    wards.push(Ward {
                        id: ward_id,
                        name,
                        persons: Vec::new(),
                    });
                }
            }
            Mutation::EditWardName { parent_id, ward_id, name } => {
                if let Some(ward) = ward_mut(&mut tree, &parent_id, &ward_id) {
                    ward.name = name;
                }
            }
            Mutation::DeleteWard { parent_id, ward_id } => {
                if let Some(wards) = ward_list_mut(&mut tree, &parent_id) {
                    wards.retain(|w| w.id != ward_id);
                }
            }
            Mutation::AddUnionPerson { union_id, person_id, name, phone } => {
                if let Some(union) = union_mut(&mut tree, &union_id) {
                    union.union_responsible.push(Person { id: person_id, name, phone });
                }
            }
            Mutation::EditUnionPerson { union_id, person_id, name, phone } => {
                if let Some(union) = union_mut(&mut tree, &union_id) {
                    edit_person(&mut union.union_responsible, &person_id, name, phone);
                }
            }
            Mutation::DeleteUnionPerson { union_id, person_id } => {
                if let Some(union) = union_mut(&mut tree, &union_id) {
                    union.union_responsible.retain(|p| p.id != person_id);
                }
            }
            Mutation::AddWardPerson { parent_id, ward_id, person_id, name, phone } => {
                if let Some(ward) = ward_mut(&mut tree, &parent_id, &ward_id) {
                    ward.persons.push(Person { id: person_id, name, phone });
                }
            }
            Mutation::EditWardPerson { parent_id, ward_id, person_id, name, phone } => {
                if let Some(ward) = ward_mut(&mut tree, &parent_id, &ward_id) {
                    edit_person(&mut ward.persons, &person_id, name, phone);
                }
            }
            Mutation::DeleteWardPerson { parent_id, ward_id, person_id } => {
                if let Some(ward) = ward_mut(&mut tree, &parent_id, &ward_id) {
                    ward.persons.retain(|p| p.id != person_id);
                }
            }
        }
        tree
    }
}

/// Whether the presentation layer should hide "add responsible person".
pub fn union_at_capacity(tree: &Tree, union_id: &str) -> bool {
    tree.iter()
        .flat_map(|r| r.unions())
        .find(|u| u.id == union_id)
        .is_some_and(|u| u.union_responsible.len() >= UNION_RESPONSIBLE_CAP)
}

fn union_mut<'a>(tree: &'a mut Tree, union_id: &str) -> Option<&'a mut Union> {
    tree.iter_mut().find_map(|region| match &mut region.kind {
        RegionKind::Unions(unions) => unions.iter_mut().find(|u| u.id == union_id),
        RegionKind::Wards(_) => None,
    })
}

/// The ward list owned by `parent_id`: a pouroshova's direct wards, or a
/// union's wards. A union-bearing region id never matches.
fn ward_list_mut<'a>(tree: &'a mut Tree, parent_id: &str) -> Option<&'a mut Vec<Ward>> {
    tree.iter_mut().find_map(|region| match &mut region.kind {
        RegionKind::Wards(wards) if region.id == parent_id => Some(wards),
        RegionKind::Wards(_) => None,
        RegionKind::Unions(unions) => unions
            .iter_mut()
            .find(|u| u.id == parent_id)
            .map(|u| &mut u.wards),
    })
}

fn ward_mut<'a>(tree: &'a mut Tree, parent_id: &str, ward_id: &str) -> Option<&'a mut Ward> {
    ward_list_mut(tree, parent_id)?.iter_mut().find(|w| w.id == ward_id)
}

fn edit_person(persons: &mut [Person], person_id: &str, name: String, phone: Option<String>) {
    if let Some(person) = persons.iter_mut().find(|p| p.id == person_id) {
        person.name = name;
        person.phone = phone;
    }
}
