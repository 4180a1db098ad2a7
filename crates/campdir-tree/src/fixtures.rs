//! Small hand-built trees shared by the unit tests.

use campdir_types::{Person, Region, Tree, Union, Ward};

pub fn person(id: &str, name: &str, phone: Option<&str>) -> Person {
    Person {
        id: id.into(),
        name: name.into(),
        phone: phone.map(String::from),
    }
}

pub fn ward(id: &str, name: &str, persons: Vec<Person>) -> Ward {
    Ward {
        id: id.into(),
        name: name.into(),
        persons,
    }
}

pub fn union(id: &str, name: &str, responsible: Vec<Person>, wards: Vec<Ward>) -> Union {
    Union {
        id: id.into(),
        name: name.into(),
        union_responsible: responsible,
        wards,
    }
}

/// Two regions: a union-bearing one with two unions, and a pouroshova.
///
/// ```text
/// region-r (unions)
///   u1: [p-u1a] wards w1 [p-w1a], w2 []
///   u2: []      wards w3 []
/// region-satkania-pouroshova (wards)
///   pw1 "Ward-1" []
///   pw2 "Ward-2" [p-pw2a]
/// ```
pub fn sample_tree() -> Tree {
    vec![
        Region::with_unions(
            "region-r",
            "Region R",
            vec![
                union(
                    "u1",
                    "Union 1",
                    vec![person("p-u1a", "Rahim", Some("01711"))],
                    vec![
                        ward("w1", "Ward-1", vec![person("p-w1a", "Salma", Some("01822"))]),
                        ward("w2", "Ward-2", vec![]),
                    ],
                ),
                union("u2", "Union 2", vec![], vec![ward("w3", "Ward-3", vec![])]),
            ],
        ),
        Region::with_wards(
            "region-satkania-pouroshova",
            "Satkania Pouroshova",
            vec![
                ward("pw1", "Ward-1", vec![]),
                ward("pw2", "Ward-2", vec![person("p-pw2a", "Hasan", None)]),
            ],
        ),
    ]
}
