//! Search requests and the optional fuzzy ranking step.
//!
//! Merging never matches fuzzily; ranking is applied afterwards to the
//! already merged views when a request asks for it.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;

use crate::catalog;
use crate::error::{Result, VendorError};
use crate::models::MergedVendorView;
use crate::normalize::normalize_company;
use crate::validation::InputValidator;

/// Default minimum similarity for fuzzy matches
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.85;

/// Filters for a vendor search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Vendor or company name fragment
    pub name: Option<String>,
    /// Division filter, matched as a substring
    pub division: Option<String>,
    /// Trade filter, matched as a substring
    pub trade: Option<String>,
    /// Only vendors with a DIR registration number
    pub has_dir: bool,
    /// Only vendors with a California contractor license
    pub has_ca_license: bool,
    /// Rank by name similarity instead of substring matching
    pub fuzzy: bool,
    /// Cap on returned views
    pub limit: Option<usize>,
}

impl SearchRequest {
    /// Request matching `name`
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Search term run through the company normalizer
    #[must_use]
    pub fn normalized_name(&self) -> String {
        self.name.as_deref().map(normalize_company).unwrap_or_default()
    }

    /// Name term for the SQL substring filter.
    ///
    /// Fuzzy requests skip it so near misses survive until ranking.
    #[must_use]
    pub fn name_filter(&self) -> Option<String> {
        if self.fuzzy {
            return None;
        }
        Some(self.normalized_name()).filter(|n| !n.is_empty())
    }

    /// Check the request against input limits and the division catalogue
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            InputValidator::validate_search_term(name)?;
        }

        let division = self.division.as_deref().filter(|d| !d.trim().is_empty());
        if let Some(division) = division {
            InputValidator::validate_search_term(division)?;
            if catalog::find_division(division).is_none() {
                return Err(VendorError::InvalidInput(format!("Unknown division: {division}")));
            }
        }

        if let Some(trade) = self.trade.as_deref().filter(|t| !t.trim().is_empty()) {
            InputValidator::validate_search_term(trade)?;
            if !catalog::is_known_trade(trade, division) {
                return Err(VendorError::InvalidInput(format!("Unknown trade: {trade}")));
            }
        }

        if self.limit == Some(0) {
            return Err(VendorError::InvalidInput("Result limit must be at least 1".to_string()));
        }

        Ok(())
    }
}

/// Similarity of a normalized term to a normalized key, 0.0 to 1.0.
///
/// A key that contains the term scores 1.0.
#[must_use]
pub fn similarity(term: &str, key: &str) -> f64 {
    if term.is_empty() || key.contains(term) {
        return 1.0;
    }
    jaro_winkler(term, key)
}

/// Keep views scoring at least `threshold` against `term`, best first.
///
/// Ties keep their merge order.
#[must_use]
pub fn rank_fuzzy(views: Vec<MergedVendorView>, term: &str, threshold: f64) -> Vec<MergedVendorView> {
    let term = normalize_company(term);
    if term.is_empty() {
        return views;
    }

    let mut scored: Vec<(f64, MergedVendorView)> = views
        .into_iter()
        .map(|view| (similarity(&term, &view.key), view))
        .filter(|(score, _)| *score >= threshold)
        .collect();

    scored.sort_by(|(a, _), (b, _)| b.partial_cmp(a).unwrap_or(Ordering::Equal));
    scored.into_iter().map(|(_, view)| view).collect()
}
