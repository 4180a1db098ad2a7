//! Tabular export of the directory.
//!
//! The tree is flattened into one row per person. Union-responsible persons
//! come first within their union, followed by the persons of each ward.
//! Empty wards and unions produce no rows.

use campdir_types::{Person, RegionKind, Tree};
use serde::Serialize;
use strum::{AsRefStr, Display, EnumString};

/// Column headers shared by CSV and HTML output.
pub const HEADERS: [&str; 6] = ["অঞ্চল", "ইউনিয়ন", "ওয়ার্ড", "নাম", "ফোন", "ভূমিকা"];

/// Default document title.
pub const DEFAULT_TITLE: &str = "ডাটা এক্সপোর্ট";

/// Which side of a union a person is responsible for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Role {
    UnionResponsible,
    WardResponsible,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::UnionResponsible => "ইউনিয়ন দায়িত্বশীল",
            Role::WardResponsible => "ওয়ার্ড দায়িত্বশীল",
        }
    }
}

/// One exported person. Missing parents and phones are empty strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub region: String,
    pub union: String,
    pub ward: String,
    pub person: String,
    pub phone: String,
    pub role: Role,
}

impl ExportRow {
    fn new(region: &str, union: &str, ward: &str, person: &Person, role: Role) -> Self {
        Self {
            region: region.to_string(),
            union: union.to_string(),
            ward: ward.to_string(),
            person: person.name.clone(),
            phone: person.phone.clone().unwrap_or_default(),
            role,
        }
    }

    fn cells(&self) -> [&str; 6] {
        [
            &self.region,
            &self.union,
            &self.ward,
            &self.person,
            &self.phone,
            self.role.label(),
        ]
    }
}

/// Whether to export everything or only the filtered view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ExportScope {
    All,
    #[default]
    Filtered,
}

impl ExportScope {
    /// Pick the source tree for this scope.
    pub fn select<'a>(self, all: &'a Tree, filtered: &'a Tree) -> &'a Tree {
        match self {
            ExportScope::All => all,
            ExportScope::Filtered => filtered,
        }
    }
}

pub fn flatten(tree: &Tree) -> Vec<ExportRow> {
    let mut rows = Vec::new();
    for region in tree {
        match &region.kind {
            RegionKind::Unions(unions) => {
                for union in unions {
                    for person in &union.union_responsible {
                        rows.push(ExportRow::new(&region.name, &union.name, "", person, Role::UnionResponsible));
                    }
                    for ward in &union.wards {
                        for person in &ward.persons {
                            rows.push(ExportRow::new(
                                &region.name,
                                &union.name,
                                &ward.name,
                                person,
                                Role::WardResponsible,
                            ));
                        }
                    }
                }
            }
            RegionKind::Wards(wards) => {
                for ward in wards {
                    for person in &ward.persons {
                        rows.push(ExportRow::new(&region.name, "", &ward.name, person, Role::WardResponsible));
                    }
                }
            }
        }
    }
    rows
}

/// CSV with a header row. Every data cell is quoted.
pub fn to_csv(rows: &[ExportRow]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(HEADERS.join(","));
    for row in rows {
        let cells: Vec<String> = row.cells().iter().map(|c| quote_csv(c)).collect();
        lines.push(cells.join(","));
    }
    lines.join("\n")
}

fn quote_csv(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// A self-contained printable HTML document, one table per page.
///
/// `rows_per_page` of zero puts everything on one page. An empty row set
/// still yields one page with only the header.
pub fn to_printable_html(rows: &[ExportRow], title: &str, rows_per_page: usize) -> String {
    let pages: Vec<&[ExportRow]> = if rows.is_empty() || rows_per_page == 0 {
        vec![rows]
    } else {
        rows.chunks(rows_per_page).collect()
    };
    let total = pages.len();

    let mut out = format!(
        "<!DOCTYPE html>\n<html lang=\"bn\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>\n{}\n</style>\n</head>\n<body>\n",
        escape_html(title),
        PRINT_STYLES
    );

    for (index, page) in pages.iter().enumerate() {
        out.push_str("<section class=\"page\">\n");
        out.push_str(&format!("<h2>{}</h2>\n", escape_html(title)));
        out.push_str("<table>\n<thead>\n<tr>");
        for header in HEADERS {
            out.push_str(&format!("<th>{header}</th>"));
        }
        out.push_str("</tr>\n</thead>\n<tbody>\n");
        for row in *page {
            out.push_str("<tr>");
            for cell in row.cells() {
                out.push_str(&format!("<td>{}</td>", escape_html(cell)));
            }
            out.push_str("</tr>\n");
        }
        out.push_str("</tbody>\n</table>\n");
        out.push_str(&format!("<footer>{} / {}</footer>\n", index + 1, total));
        out.push_str("</section>\n");
    }

    out.push_str("</body>\n</html>\n");
    out
}

const PRINT_STYLES: &str = "\
table { border-collapse: collapse; width: 100%; font-family: sans-serif; }
th, td { border: 1px solid #ddd; padding: 8px; }
th { background: #f3f4f6; }
h2 { font-size: 16px; }
footer { text-align: right; font-size: 12px; margin-top: 8px; }
.page { page-break-after: always; }
.page:last-child { page-break-after: auto; }";

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    out
}
