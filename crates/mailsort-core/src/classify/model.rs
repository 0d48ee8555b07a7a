//! Classification data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::scoring::saturating_add;

/// A user-defined category and the keywords that identify it.
///
/// Keywords are trimmed and blank keywords are dropped on construction;
/// order and duplicates are preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    name: String,
    keywords: Vec<String>,
}

impl Category {
    /// Create a category from a name and raw keyword strings.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        Self {
            name: name.into().trim().to_string(),
            keywords,
        }
    }

    /// Category name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Keywords in definition order.
    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

/// An ordered snapshot of category definitions.
///
/// Iteration follows insertion order, which is also the tie-break order
/// during classification. Re-inserting an existing name replaces that
/// category's keywords without moving it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySet {
    categories: Vec<Category>,
}

impl CategorySet {
    /// Create an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            categories: Vec::new(),
        }
    }

    /// Insert or replace a category.
    pub fn insert(&mut self, category: Category) {
        if let Some(existing) = self
            .categories
            .iter_mut()
            .find(|c| c.name == category.name)
        {
            *existing = category;
        } else {
            self.categories.push(category);
        }
    }

    /// Remove a category by name.
    pub fn remove(&mut self, name: &str) -> Option<Category> {
        let index = self.categories.iter().position(|c| c.name == name)?;
        Some(self.categories.remove(index))
    }

    /// Look up a category by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Iterate categories in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Category> {
        self.categories.iter()
    }

    /// Number of categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl FromIterator<Category> for CategorySet {
    fn from_iter<T: IntoIterator<Item = Category>>(iter: T) -> Self {
        let mut set = Self::new();
        for category in iter {
            set.insert(category);
        }
        set
    }
}

impl<'a> IntoIterator for &'a CategorySet {
    type Item = &'a Category;
    type IntoIter = std::slice::Iter<'a, Category>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One message in a quoted reply/forward chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadSegment {
    /// Text of this segment, including its quoted header block.
    pub text: String,
    /// When the segment was sent, recovered from its header or inferred.
    pub timestamp: DateTime<Utc>,
    /// Whether `timestamp` was synthesised rather than read from a header.
    pub inferred: bool,
}

/// Per-category scores for one message, in category order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreResult {
    scores: Vec<(String, f64)>,
}

impl ScoreResult {
    /// Create an empty result.
    #[must_use]
    pub const fn new() -> Self {
        Self { scores: Vec::new() }
    }

    /// Add `amount` to a category's score, creating the entry if needed.
    ///
    /// Negative and NaN amounts are ignored so scores never decrease. Scores
    /// saturate at `f64::MAX`, so an infinite amount counts as the maximum.
    pub fn add(&mut self, category: &str, amount: f64) {
        let amount = if amount > 0.0 { amount.min(f64::MAX) } else { 0.0 };

        if let Some((_, score)) = self.scores.iter_mut().find(|(name, _)| name == category) {
            *score = saturating_add(*score, amount);
        } else {
            self.scores.push((category.to_string(), amount));
        }
    }

    /// Score of a category, zero if it was never scored.
    #[must_use]
    pub fn get(&self, category: &str) -> f64 {
        self.scores
            .iter()
            .find(|(name, _)| name == category)
            .map_or(0.0, |(_, score)| *score)
    }

    /// Iterate `(category, score)` pairs in category order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.scores.iter().map(|(name, score)| (name.as_str(), *score))
    }

    /// Number of scored categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Whether nothing has been scored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
