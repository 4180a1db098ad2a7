//! Plain-text views for the terminal.

use campdir_client::SessionState;
use campdir_tree::{FilterOptions, FilterStats};
use campdir_types::{Person, RegionKind, Tree, ValidationErrors, Ward};

/// Indented outline of the tree, ids in brackets.
pub fn tree(tree: &Tree) -> String {
    let mut out = String::new();
    for region in tree {
        out.push_str(&format!("{} [{}]\n", region.name, region.id));
        match &region.kind {
            RegionKind::Unions(unions) => {
                for union in unions {
                    out.push_str(&format!("  {} [{}]\n", union.name, union.id));
                    for person in &union.union_responsible {
                        person_line(&mut out, 4, "*", person);
                    }
                    for ward in &union.wards {
                        ward_lines(&mut out, 4, ward);
                    }
                }
            }
            RegionKind::Wards(wards) => {
                for ward in wards {
                    ward_lines(&mut out, 2, ward);
                }
            }
        }
    }
    out
}

fn ward_lines(out: &mut String, indent: usize, ward: &Ward) {
    out.push_str(&format!("{:indent$}{} [{}]\n", "", ward.name, ward.id));
    for person in &ward.persons {
        person_line(out, indent + 2, "-", person);
    }
}

fn person_line(out: &mut String, indent: usize, bullet: &str, person: &Person) {
    let phone = person.phone.as_deref().unwrap_or("");
    out.push_str(&format!("{:indent$}{bullet} {} {phone} [{}]\n", "", person.name, person.id));
}

pub fn options(options: &FilterOptions) -> String {
    let mut out = String::new();
    for union in &options.unions {
        out.push_str(&format!("union {} [{}]\n", union.name, union.id));
    }
    for ward in &options.wards {
        match &ward.union_name {
            Some(union) => out.push_str(&format!("ward  {} ({union}) [{}]\n", ward.name, ward.id)),
            None => out.push_str(&format!("ward  {} [{}]\n", ward.name, ward.id)),
        }
    }
    out
}

pub fn stats(stats: &FilterStats) -> String {
    format!(
        "unions: {}  wards: {}  persons: {}",
        stats.unions, stats.wards, stats.persons
    )
}

/// One status line for `watch`.
pub fn status(state: &SessionState) -> String {
    format!(
        "v{} {} regions:{} connection:{}{}",
        state.version,
        state.phase,
        state.tree.len(),
        state.connection,
        if state.saving { " saving" } else { "" }
    )
}

/// Bangla field messages, one per line.
pub fn validation(errors: &ValidationErrors) -> String {
    errors
        .0
        .iter()
        .map(|e| format!("{}: {}", e.field, e.error.message_bn()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use campdir_types::{FormInput, FormKind, Region, Union};
    use pretty_assertions::assert_eq;

    fn person(id: &str, name: &str, phone: Option<&str>) -> Person {
        Person {
            id: id.into(),
            name: name.into(),
            phone: phone.map(String::from),
        }
    }

    #[test]
    fn test_tree_outline() {
        let tree = vec![
            Region::with_unions(
                "r1",
                "Satkania",
                vec![Union {
                    id: "u1".into(),
                    name: "Charati".into(),
                    union_responsible: vec![person("p1", "Rahim", Some("018"))],
                    wards: vec![Ward {
                        id: "w1".into(),
                        name: "Ward-1".into(),
                        persons: vec![person("p2", "Karim", None)],
                    }],
                }],
            ),
            Region::with_wards(
                "r2",
                "Pouroshova",
                vec![Ward {
                    id: "w2".into(),
                    name: "Ward-1".into(),
                    persons: vec![],
                }],
            ),
        ];

        assert_eq!(
            super::tree(&tree),
            "Satkania [r1]\n\
             \x20 Charati [u1]\n\
             \x20   * Rahim 018 [p1]\n\
             \x20   Ward-1 [w1]\n\
             \x20     - Karim  [p2]\n\
             Pouroshova [r2]\n\
             \x20 Ward-1 [w2]\n"
        );
    }

    #[test]
    fn test_validation_messages_are_bangla() {
        let errors = FormInput::new(" ", "abc").validate(FormKind::WardPerson).unwrap_err();
        assert_eq!(validation(&errors), "name: নাম আবশ্যক\nphone: ফোন নম্বর সঠিক নয়");
    }
}
