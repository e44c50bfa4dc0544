//! The result buffer behind an interactive search surface.

use getmeds_core::{AvailabilityClass, CanonicalResult};

/// Last query and its results. Replaced wholesale by each successful search.
#[derive(Debug, Clone, Default)]
pub struct SearchSession {
    query: Option<String>,
    results: Vec<CanonicalResult>,
}

/// Optional constraints applied by [`SearchSession::filter`]. An empty
/// filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultFilter {
    /// Keep only these classes; empty means any.
    pub classes: Vec<AvailabilityClass>,
    /// Case-insensitive exact city match.
    pub city: Option<String>,
    pub in_stock_only: bool,
    /// Case-insensitive substring of the medicine name.
    pub name_contains: Option<String>,
}

impl ResultFilter {
    #[must_use]
    pub fn matches(&self, result: &CanonicalResult) -> bool {
        if self.in_stock_only && !result.stock.in_stock() {
            return false;
        }
        if !self.classes.is_empty()
            && !self.classes.contains(&result.stock.availability_class())
        {
            return false;
        }
        if let Some(city) = &self.city {
            let wanted = city.trim().to_lowercase();
            let matches_city = result
                .pharmacy
                .city
                .as_deref()
                .is_some_and(|c| c.trim().to_lowercase() == wanted);
            if !matches_city {
                return false;
            }
        }
        if let Some(needle) = &self.name_contains {
            if !result
                .medicine
                .name
                .to_lowercase()
                .contains(&needle.trim().to_lowercase())
            {
                return false;
            }
        }
        true
    }
}

impl SearchSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Swaps in a new query and result list.
    pub fn replace(&mut self, query: impl Into<String>, results: Vec<CanonicalResult>) {
        self.query = Some(query.into());
        self.results = results;
    }

    pub fn reset(&mut self) {
        self.query = None;
        self.results.clear();
    }

    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    #[must_use]
    pub fn results(&self) -> &[CanonicalResult] {
        &self.results
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results matching `filter`, in buffer order.
    #[must_use]
    pub fn filter(&self, filter: &ResultFilter) -> Vec<&CanonicalResult> {
        self.results.iter().filter(|r| filter.matches(r)).collect()
    }

    /// At most `limit` results starting at `offset`. Out-of-range offsets
    /// yield an empty slice.
    #[must_use]
    pub fn page(&self, offset: usize, limit: usize) -> &[CanonicalResult] {
        let start = offset.min(self.results.len());
        let end = start.saturating_add(limit).min(self.results.len());
        &self.results[start..end]
    }
}
