//! Row classification for headerless vendor sheets.
//!
//! A vendor sheet has no schema: a row is a type marker, a vendor row, or a
//! certificate line depending on what its cells contain. Classification order
//! is type marker, then vendor row, then certificate.

use regex::Regex;

use crate::error::{Result, VendorError};
use crate::models::{RawRow, VendorTypeCode, NO_PROJECT};

/// Certificate names recognised in the first cell of a row (case-insensitive).
pub const CERTIFICATE_KEYWORDS: [&str; 7] = [
    "WORKERS COMP INSURANCE",
    "GENERAL LIABILITY INSURANCE",
    "AUTO LIABILITY INSURANCE",
    "UMBRELLA LIABILITY",
    "CONTRACTORS LICENSE",
    "DIR REGISTRATION",
    "EQUIPMENT FLOATER",
];

/// What a single sheet row declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    /// Sets the vendor type for following rows
    TypeMarker(VendorTypeCode),
    /// Starts a new vendor
    VendorName {
        /// Vendor name (second cell)
        name: String,
        /// Contact (third cell)
        contact: Option<String>,
        /// Phone (fourth cell)
        phone: Option<String>,
    },
    /// A certificate belonging to the current vendor
    Certificate {
        /// Certificate name (first cell)
        certificate: String,
        /// Blanket/project reference (second cell, `"0"` if absent)
        project_ref: String,
        /// Raw expiration text (third cell)
        expires_raw: Option<String>,
    },
    /// Matches nothing; contributes nothing
    Unrecognized,
}

/// Classifies sheet rows into [`RowKind`]s.
#[derive(Debug, Clone)]
pub struct RowClassifier {
    id_prefix: Regex,
    certificate_keywords: Vec<String>,
}

impl RowClassifier {
    /// Create a classifier with the standard certificate keywords
    pub fn new() -> Result<Self> {
        Self::with_keywords(CERTIFICATE_KEYWORDS.iter().copied())
    }

    /// Create a classifier recognising a custom set of certificate names
    pub fn with_keywords<I, S>(keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let id_prefix = Regex::new(r"^\d+")
            .map_err(|e| VendorError::InvalidConfig(format!("Failed to compile id regex: {e}")))?;
        let certificate_keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        if certificate_keywords.is_empty() {
            return Err(VendorError::InvalidConfig(
                "at least one certificate keyword is required".to_string(),
            ));
        }

        Ok(Self {
            id_prefix,
            certificate_keywords,
        })
    }

    /// Classify one row
    #[must_use]
    pub fn classify(&self, row: &RawRow) -> RowKind {
        let Some(first) = row.get(0) else {
            return RowKind::Unrecognized;
        };

        if let Some(code) = Self::vendor_type(&row.joined()) {
            return RowKind::TypeMarker(code);
        }

        if self.id_prefix.is_match(first) && row.len() > 1 {
            return RowKind::VendorName {
                name: row.get(1).unwrap_or_default().to_string(),
                contact: row.get(2).map(ToString::to_string),
                phone: row.get(3).map(ToString::to_string),
            };
        }

        if self.is_certificate(first) {
            return RowKind::Certificate {
                certificate: first.to_string(),
                project_ref: row.get(1).unwrap_or(NO_PROJECT).to_string(),
                expires_raw: row.get(2).map(ToString::to_string),
            };
        }

        RowKind::Unrecognized
    }

    /// Vendor type whose marker appears anywhere in `text`
    #[must_use]
    pub fn vendor_type(text: &str) -> Option<VendorTypeCode> {
        VendorTypeCode::MARKERS
            .iter()
            .find(|(marker, _)| text.contains(marker))
            .map(|(_, code)| *code)
    }

    /// True if `value` names a recognised certificate
    #[must_use]
    pub fn is_certificate(&self, value: &str) -> bool {
        let lowered = value.to_lowercase();
        self.certificate_keywords
            .iter()
            .any(|keyword| lowered.contains(keyword.as_str()))
    }
}
