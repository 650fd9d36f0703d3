//! Column role detection.
//!
//! Sales exports from different marketplaces name their columns differently,
//! so each semantic role is resolved by matching header names against a small
//! list of fragments.

use serde::Serialize;
use std::fmt;

/// Semantic role a column plays in the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Title,
    Value,
    Id,
    Url,
    Category,
}

impl ColumnRole {
    /// Lowercase header fragments that identify this role.
    pub fn fragments(self) -> &'static [&'static str] {
        match self {
            ColumnRole::Title => &["title", "name", "product"],
            ColumnRole::Value => &["earning", "sales", "revenue"],
            ColumnRole::Id => &["id", "item", "sku"],
            ColumnRole::Url => &["url", "link", "page"],
            ColumnRole::Category => &["category", "type"],
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnRole::Title => "Title/Name/Product",
            ColumnRole::Value => "Earning/Sales/Revenue",
            ColumnRole::Id => "ID/Item/SKU",
            ColumnRole::Url => "URL/Link/Page",
            ColumnRole::Category => "Category/Type",
        };
        f.write_str(label)
    }
}

/// Resolved header names for each role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnRoles {
    pub title: Option<String>,
    pub value: Option<String>,
    pub id: Option<String>,
    pub url: Option<String>,
    pub category: Option<String>,
}

impl ColumnRoles {
    /// Detects every role from `headers`, taking the first header that
    /// contains any of the role's fragments (case-insensitive).
    pub fn detect(headers: &[String]) -> Self {
        Self {
            title: find_header(headers, ColumnRole::Title),
            value: find_header(headers, ColumnRole::Value),
            id: find_header(headers, ColumnRole::Id),
            url: find_header(headers, ColumnRole::Url),
            category: find_header(headers, ColumnRole::Category),
        }
    }

    /// Replaces detected roles with any explicit overrides.
    pub fn with_overrides(mut self, overrides: &ColumnRoles) -> Self {
        for role in [
            ColumnRole::Title,
            ColumnRole::Value,
            ColumnRole::Id,
            ColumnRole::Url,
            ColumnRole::Category,
        ] {
            if let Some(name) = overrides.get(role) {
                *self.slot(role) = Some(name.to_string());
            }
        }
        self
    }

    pub fn get(&self, role: ColumnRole) -> Option<&str> {
        match role {
            ColumnRole::Title => self.title.as_deref(),
            ColumnRole::Value => self.value.as_deref(),
            ColumnRole::Id => self.id.as_deref(),
            ColumnRole::Url => self.url.as_deref(),
            ColumnRole::Category => self.category.as_deref(),
        }
    }

    fn slot(&mut self, role: ColumnRole) -> &mut Option<String> {
        match role {
            ColumnRole::Title => &mut self.title,
            ColumnRole::Value => &mut self.value,
            ColumnRole::Id => &mut self.id,
            ColumnRole::Url => &mut self.url,
            ColumnRole::Category => &mut self.category,
        }
    }

    /// Required roles (title, value, id) that could not be resolved.
    pub fn missing_required(&self) -> Vec<ColumnRole> {
        [ColumnRole::Title, ColumnRole::Value, ColumnRole::Id]
            .into_iter()
            .filter(|role| self.get(*role).is_none())
            .collect()
    }

    /// Human-readable warning naming the missing required roles, if any.
    pub fn warning(&self) -> Option<String> {
        let missing = self.missing_required();
        if missing.is_empty() {
            return None;
        }
        let names: Vec<String> = missing.iter().map(ToString::to_string).collect();
        Some(format!(
            "Required columns not found in the CSV file: {}. Analysis may be incomplete.",
            names.join(", ")
        ))
    }
}

fn find_header(headers: &[String], role: ColumnRole) -> Option<String> {
    headers
        .iter()
        .find(|h| {
            let lower = h.to_lowercase();
            role.fragments().iter().any(|f| lower.contains(f))
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_detect_typical_export() {
        let roles = ColumnRoles::detect(&headers(&[
            "Item ID",
            "Title",
            "Earnings",
            "Page URL",
            "Category",
        ]));

        assert_eq!(roles.id.as_deref(), Some("Item ID"));
        assert_eq!(roles.title.as_deref(), Some("Title"));
        assert_eq!(roles.value.as_deref(), Some("Earnings"));
        assert_eq!(roles.url.as_deref(), Some("Page URL"));
        assert_eq!(roles.category.as_deref(), Some("Category"));
        assert!(roles.warning().is_none());
    }

    #[test]
    fn test_first_matching_header_wins() {
        let roles = ColumnRoles::detect(&headers(&["Product Name", "Title"]));
        assert_eq!(roles.title.as_deref(), Some("Product Name"));
    }

    #[test]
    fn test_missing_required_roles() {
        let roles = ColumnRoles::detect(&headers(&["Title", "Link"]));
        assert_eq!(
            roles.missing_required(),
            vec![ColumnRole::Value, ColumnRole::Id]
        );

        let warning = roles.warning().unwrap();
        assert!(warning.contains("Earning/Sales/Revenue"));
        assert!(warning.contains("ID/Item/SKU"));
        assert!(!warning.contains("Title/Name/Product"));
    }

    #[test]
    fn test_overrides_replace_detection() {
        let overrides = ColumnRoles {
            value: Some("Net".to_string()),
            ..Default::default()
        };
        let roles = ColumnRoles::detect(&headers(&["Title", "Sales", "Net", "SKU"]))
            .with_overrides(&overrides);

        assert_eq!(roles.value.as_deref(), Some("Net"));
        assert_eq!(roles.title.as_deref(), Some("Title"));
        assert_eq!(roles.id.as_deref(), Some("SKU"));
    }
}
