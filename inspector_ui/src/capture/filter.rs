//! Capture-time category gating and the display filter

use super::types::{Category, LogRecord};
use super::CaptureError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Which categories a buffer accepts.
///
/// Gating happens at capture time: a record refused here is never stored,
/// so re-enabling a category later does not bring it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryFilter {
    /// Global switch, checked before the per-category flags
    pub enabled: bool,
    pub categories: BTreeMap<Category, bool>,
}

impl CategoryFilter {
    /// Every declared category enabled
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enabled: true,
            categories: categories
                .into_iter()
                .map(|name| (Category::new(name), true))
                .collect(),
        }
    }

    pub fn is_declared(&self, category: &str) -> bool {
        self.categories.contains_key(&Category::from(category))
    }

    fn slot(&mut self, category: &str) -> Result<&mut bool, CaptureError> {
        self.categories
            .get_mut(&Category::from(category))
            .ok_or_else(|| CaptureError::UnknownCategory(category.to_string()))
    }

    /// Whether a record of `category` would be stored right now
    pub fn accepts(&self, category: &str) -> Result<bool, CaptureError> {
        let flag = self
            .categories
            .get(&Category::from(category))
            .ok_or_else(|| CaptureError::UnknownCategory(category.to_string()))?;
        Ok(self.enabled && *flag)
    }

    pub fn is_category_enabled(&self, category: &Category) -> bool {
        self.categories.get(category).copied().unwrap_or(false)
    }

    pub fn set_category(&mut self, category: &str, enabled: bool) -> Result<(), CaptureError> {
        *self.slot(category)? = enabled;
        Ok(())
    }

    pub fn set_all_categories(&mut self, enabled: bool) {
        for flag in self.categories.values_mut() {
            *flag = enabled;
        }
    }
}

/// Type filter of the record list: everything, or a single category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DisplayFilter {
    #[default]
    All,
    Only(Category),
}

impl DisplayFilter {
    /// Visible when the type filter matches and the category is enabled
    pub fn should_include(&self, record: &LogRecord, categories: &CategoryFilter) -> bool {
        if !categories.is_category_enabled(&record.category) {
            return false;
        }
        match self {
            DisplayFilter::All => true,
            DisplayFilter::Only(category) => record.category == *category,
        }
    }
}

impl FromStr for DisplayFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(DisplayFilter::All)
        } else {
            Ok(DisplayFilter::Only(Category::new(s)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::Value;

    #[test]
    fn test_global_switch_wins() {
        let mut filter = CategoryFilter::new(["sent", "received"]);
        assert!(filter.accepts("sent").unwrap());
        filter.enabled = false;
        assert!(!filter.accepts("sent").unwrap());
    }

    #[test]
    fn test_unknown_category_is_an_error() {
        let mut filter = CategoryFilter::new(["sent"]);
        assert!(matches!(filter.accepts("bogus"), Err(CaptureError::UnknownCategory(c)) if c == "bogus"));
        assert!(filter.set_category("bogus", true).is_err());
    }

    #[test]
    fn test_display_filter_hides_disabled_category() {
        let mut categories = CategoryFilter::new(["sent", "received"]);
        let record = LogRecord::new(1, Category::new("sent"), None, vec![Value::Null]);

        assert!(DisplayFilter::All.should_include(&record, &categories));
        assert!(!"received".parse::<DisplayFilter>().unwrap().should_include(&record, &categories));

        categories.set_category("sent", false).unwrap();
        assert!(!DisplayFilter::All.should_include(&record, &categories));
    }
}
