//! Store categories.
//!
//! Category data reaches us in two shapes depending on which query produced
//! the row: a flat list of names (`["고기", "초밥"]`) from the radius RPC, or
//! nested join objects (`[{"category": {"name": "고기"}}]`) from relational
//! selects. [`RawCategories`] accepts either and is collapsed into a
//! [`CategorySet`] once, at the repository boundary.

use serde::{Deserialize, Serialize};

/// A category name as it appears inside a nested join object.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryName {
    pub name: String,
}

/// One element of the nested shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NestedCategory {
    /// `{"name": "..."}`. Tried first: a missing `category` key would
    /// otherwise deserialize as `Joined { category: None }`.
    Flat(CategoryName),
    /// `{"category": {"name": "..."}}`
    Joined { category: Option<CategoryName> },
}

/// Category payload in whichever shape the query returned.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawCategories {
    Names(Vec<String>),
    Nested(Vec<NestedCategory>),
    /// SQL `NULL` or a JSON `null` when the store has no categories.
    Missing(()),
}

impl RawCategories {
    /// Decode from a JSON value, treating anything unrecognised as empty.
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or(Self::Missing(()))
    }
}

/// Normalized, de-duplicated category names in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategorySet(Vec<String>);

impl CategorySet {
    /// Build from arbitrary names, trimming and dropping blanks and duplicates.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if !name.is_empty() && !out.iter().any(|n| n == name) {
                out.push(name.to_owned());
            }
        }
        Self(out)
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Case-insensitive membership test.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        let needle = name.trim().to_lowercase();
        self.0.iter().any(|n| n.to_lowercase() == needle)
    }

    /// Whether any of `wanted` is present. An empty `wanted` matches everything.
    #[must_use]
    pub fn contains_any(&self, wanted: &[String]) -> bool {
        wanted.is_empty() || wanted.iter().any(|w| self.contains(w))
    }
}

impl From<RawCategories> for CategorySet {
    fn from(raw: RawCategories) -> Self {
        match raw {
            RawCategories::Names(names) => Self::from_names(names),
            RawCategories::Nested(items) => Self::from_names(items.into_iter().filter_map(
                |item| match item {
                    NestedCategory::Flat(c) => Some(c.name),
                    NestedCategory::Joined { category } => category.map(|c| c.name),
                },
            )),
            RawCategories::Missing(()) => Self::default(),
        }
    }
}

/// Split a comma-separated query parameter into category names.
#[must_use]
pub fn parse_category_param(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_flat_names() {
        let set = CategorySet::from(RawCategories::from_json(json!(["고기", " 초밥 ", "고기"])));
        assert_eq!(set.names(), ["고기", "초밥"]);
    }

    #[test]
    fn test_nested_join_objects() {
        let set = CategorySet::from(RawCategories::from_json(json!([
            {"category": {"name": "뷔페"}},
            {"category": null},
            {"name": "해산물"}
        ])));
        assert_eq!(set.names(), ["뷔페", "해산물"]);
    }

    #[test]
    fn test_null_and_garbage_become_empty() {
        assert!(CategorySet::from(RawCategories::from_json(json!(null))).is_empty());
        assert!(CategorySet::from(RawCategories::from_json(json!({"x": 1}))).is_empty());
    }

    #[test]
    fn test_contains_any_is_case_insensitive() {
        let set = CategorySet::from_names(["BBQ", "샤브샤브"]);
        assert!(set.contains_any(&["bbq".to_owned()]));
        assert!(set.contains_any(&[]));
        assert!(!set.contains_any(&["초밥".to_owned()]));
    }

    #[test]
    fn test_parse_category_param() {
        assert_eq!(
            parse_category_param(Some("고기, 초밥,,")),
            vec!["고기".to_owned(), "초밥".to_owned()]
        );
        assert!(parse_category_param(None).is_empty());
    }
}
