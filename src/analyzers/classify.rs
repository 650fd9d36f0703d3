//! Keyword-based artboard classification.

use crate::parser::Row;

/// Catch-all label for rows that match nothing.
pub const DEFAULT_LABEL: &str = "Others";

/// Source categories that map straight to a label, before any keyword is tried.
static DIRECT_CATEGORIES: &[(&str, &str)] = &[
    ("presentation-templates", "Presentation"),
    ("fonts", "Font"),
];

/// Source categories consulted after keyword matching fails.
static FALLBACK_CATEGORIES: &[(&str, &str)] = &[
    ("presentation-templates", "Presentation"),
    ("graphic-templates", "Graphic"),
    ("fonts", "Font"),
];

/// Keywords matched against item titles out of the box.
pub static DEFAULT_KEYWORDS: &[&str] = &[
    "Admin Dashboard",
    "Annual Report",
    "Bifold Brochure",
    "Trifold Brochure",
    "Brochure",
    "Business Card",
    "Company Profile",
    "Certificate",
    "CV Resume",
    "Dashboard",
    "Data Sheet",
    "Email Newsletter",
    "Flyer Set",
    "Flyer",
    "Gift Voucher",
    "Graphic",
    "Hero Header",
    "Illustration",
    "Instagram Post",
    "Instagram Story",
    "Invoice",
    "Landing Page",
    "Mobile Apps",
    "Mockup",
    "Presentation",
    "Social Media",
    "Text Effect",
    "background",
    "collection",
    "Font",
    "form",
    "texture",
    "Calendar",
];

#[derive(Debug, Clone)]
struct Keyword {
    label: String,
    lower: String,
}

/// Keywords ordered longest first, ready for matching.
///
/// Built once per pipeline run from the session's current list so the sort is
/// not repeated for every row.
#[derive(Debug, Clone, Default)]
pub struct KeywordSet {
    keywords: Vec<Keyword>,
}

impl KeywordSet {
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Self {
        let mut keywords: Vec<Keyword> = keywords
            .iter()
            .map(AsRef::as_ref)
            .filter(|k| !k.is_empty())
            .map(|k| Keyword {
                label: k.to_string(),
                lower: k.to_lowercase(),
            })
            .collect();

        // stable: equal lengths keep list order
        keywords.sort_by(|a, b| b.label.chars().count().cmp(&a.label.chars().count()));

        Self { keywords }
    }

    /// The first (longest) keyword contained in `title`, case-insensitively.
    pub fn find_in(&self, title: &str) -> Option<&str> {
        let title = title.to_lowercase();
        self.keywords
            .iter()
            .find(|k| title.contains(&k.lower))
            .map(|k| k.label.as_str())
    }
}

/// Assigns a label to `row`.
///
/// Order of precedence: direct source-category mapping, longest keyword found
/// in the title, fallback source-category mapping, then [`DEFAULT_LABEL`].
pub fn classify(
    row: &Row,
    title_column: Option<&str>,
    category_column: Option<&str>,
    keywords: &KeywordSet,
) -> String {
    let category = cell(row, category_column).to_lowercase();

    if let Some(label) = lookup(DIRECT_CATEGORIES, &category) {
        return label.to_string();
    }

    if let Some(keyword) = keywords.find_in(cell(row, title_column)) {
        return keyword.to_string();
    }

    lookup(FALLBACK_CATEGORIES, &category)
        .unwrap_or(DEFAULT_LABEL)
        .to_string()
}

/// Value of `column` in `row`, or `""` when either is absent.
pub(crate) fn cell<'a>(row: &'a Row, column: Option<&str>) -> &'a str {
    column
        .and_then(|c| row.get(c))
        .map(String::as_str)
        .unwrap_or("")
}

fn lookup(table: &[(&str, &'static str)], category: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(source, _)| *source == category)
        .map(|(_, label)| *label)
}
