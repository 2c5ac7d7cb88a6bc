//! Vendor context tracking over a classified vendor sheet.
//!
//! A certificate row belongs to the most recent vendor row above it, so the
//! walk is a left fold carrying a [`VendorContext`]. [`advance`] is the pure
//! per-row step; [`ContextTracker::track`] folds it over a whole sheet.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classifier::{RowClassifier, RowKind};
use crate::models::{CertificateTuple, RawRow, VendorContext};

/// Which certificate rows survive the blanket/project reference filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectFilter {
    /// Keep only rows tied to a real blanket/project reference
    #[default]
    RequireReference,
    /// Keep only rows without a reference (`"0"` or missing)
    BlanketOnly,
    /// Keep every row
    KeepAll,
}

impl ProjectFilter {
    /// True if `tuple` passes this filter
    #[must_use]
    pub fn keeps(self, tuple: &CertificateTuple) -> bool {
        match self {
            Self::RequireReference => tuple.has_project(),
            Self::BlanketOnly => !tuple.has_project(),
            Self::KeepAll => true,
        }
    }
}

/// Per-category row counts from one tracking pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    /// Non-empty rows seen
    pub rows: usize,
    /// Type marker rows
    pub type_markers: usize,
    /// Vendor rows
    pub vendors: usize,
    /// Certificate rows
    pub certificates: usize,
    /// Rows matching nothing
    pub unclassified: usize,
}

/// Result of folding a sheet
#[derive(Debug, Clone, Default)]
pub struct TrackOutcome {
    /// Emitted tuples, in sheet order
    pub tuples: Vec<CertificateTuple>,
    /// Row classification counts
    pub counts: RowCounts,
    /// Context after the last row
    pub context: VendorContext,
}

/// Apply one classified row to the context.
///
/// Returns the updated context and, for certificate rows, the tuple built
/// from the context as it stood at that row.
#[must_use]
pub fn advance(mut context: VendorContext, kind: RowKind) -> (VendorContext, Option<CertificateTuple>) {
    match kind {
        RowKind::TypeMarker(code) => {
            context.current_type = Some(code);
            (context, None)
        }
        RowKind::VendorName { name, contact, phone } => {
            context.current_vendor_name = Some(name);
            context.current_contact = contact;
            context.current_phone = phone;
            (context, None)
        }
        RowKind::Certificate {
            certificate,
            project_ref,
            expires_raw,
        } => {
            let tuple = CertificateTuple {
                vendor_type: context.current_type,
                vendor_name: context.current_vendor_name.clone(),
                certificate_name: certificate,
                project_ref: Some(project_ref),
                expires_raw,
                contact: context.current_contact.clone(),
                phone: context.current_phone.clone(),
            };
            (context, Some(tuple))
        }
        RowKind::Unrecognized => (context, None),
    }
}

/// Walks vendor sheets, attributing certificates to vendors.
#[derive(Debug, Clone)]
pub struct ContextTracker {
    classifier: RowClassifier,
}

impl ContextTracker {
    /// Create a tracker using `classifier`
    #[must_use]
    pub const fn new(classifier: RowClassifier) -> Self {
        Self { classifier }
    }

    /// Classify `row` and apply it to `context`
    #[must_use]
    pub fn step(&self, context: VendorContext, row: &RawRow) -> (VendorContext, Option<CertificateTuple>) {
        advance(context, self.classifier.classify(row))
    }

    /// Fold every row of a sheet, in order
    pub fn track<'a, I>(&self, rows: I) -> TrackOutcome
    where
        I: IntoIterator<Item = &'a RawRow>,
    {
        rows.into_iter()
            .filter(|row| !row.is_empty())
            .enumerate()
            .fold(TrackOutcome::default(), |mut outcome, (index, row)| {
                let kind = self.classifier.classify(row);
                outcome.counts.rows += 1;
                match &kind {
                    RowKind::TypeMarker(_) => outcome.counts.type_markers += 1,
                    RowKind::VendorName { .. } => outcome.counts.vendors += 1,
                    RowKind::Certificate { .. } => outcome.counts.certificates += 1,
                    RowKind::Unrecognized => {
                        outcome.counts.unclassified += 1;
                        debug!(row = index, cells = %row.joined(), "Unclassified row ignored");
                    }
                }

                let (context, tuple) = advance(std::mem::take(&mut outcome.context), kind);
                outcome.context = context;
                outcome.tuples.extend(tuple);
                outcome
            })
    }
}

/// Remove tuples that appeared before any vendor row.
///
/// Returns the kept tuples and the number dropped.
#[must_use]
pub fn drop_without_vendor(tuples: Vec<CertificateTuple>) -> (Vec<CertificateTuple>, usize) {
    let before = tuples.len();
    let kept: Vec<CertificateTuple> = tuples
        .into_iter()
        .filter(|t| t.vendor_name.as_deref().is_some_and(|n| !n.trim().is_empty()))
        .collect();
    let dropped = before - kept.len();
    if dropped > 0 {
        warn!(dropped, "Certificate rows found before any vendor row were dropped");
    }
    (kept, dropped)
}

/// Apply the project reference filter.
///
/// Returns the kept tuples and the number dropped.
#[must_use]
pub fn filter_projects(tuples: Vec<CertificateTuple>, filter: ProjectFilter) -> (Vec<CertificateTuple>, usize) {
    let before = tuples.len();
    let kept: Vec<CertificateTuple> = tuples.into_iter().filter(|t| filter.keeps(t)).collect();
    let dropped = before - kept.len();
    if dropped > 0 {
        debug!(dropped, ?filter, "Certificate rows removed by project filter");
    }
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{VendorTypeCode, NO_PROJECT};

    fn tracker() -> ContextTracker {
        ContextTracker::new(RowClassifier::new().unwrap())
    }

    fn rows(lines: &[&[&str]]) -> Vec<RawRow> {
        lines.iter().map(|cells| RawRow::new(cells.iter())).collect()
    }

    #[test]
    fn test_certificate_uses_most_recent_vendor() {
        let sheet = rows(&[
            &["SUBCONTRACTOR"],
            &["1", "Acme Corp", "J. Doe", "555-1111"],
            &["WORKERS COMP INSURANCE", "100", "01/01/30"],
            &["Some note"],
            &["Page 2"],
            &["GENERAL LIABILITY INSURANCE", "100", "01/01/20"],
            &["2", "Beta LLC"],
            &["AUTO LIABILITY INSURANCE", "200", "01/01/30"],
        ]);
        let outcome = tracker().track(&sheet);

        assert_eq!(outcome.tuples.len(), 3);
        assert_eq!(outcome.tuples[0].vendor_name.as_deref(), Some("Acme Corp"));
        assert_eq!(outcome.tuples[1].vendor_name.as_deref(), Some("Acme Corp"));
        assert_eq!(outcome.tuples[1].contact.as_deref(), Some("J. Doe"));
        assert_eq!(outcome.tuples[2].vendor_name.as_deref(), Some("Beta LLC"));
        assert_eq!(outcome.tuples[2].contact, None);
        assert_eq!(outcome.tuples[2].vendor_type, Some(VendorTypeCode::Subcontractor));

        assert_eq!(
            outcome.counts,
            RowCounts {
                rows: 8,
                type_markers: 1,
                vendors: 2,
                certificates: 3,
                unclassified: 2,
            }
        );
    }

    #[test]
    fn test_step_is_pure() {
        let tracker = tracker();
        let start = VendorContext::default();
        let (ctx, tuple) = tracker.step(start.clone(), &RawRow::new(["7", "Gamma Inc"]));
        assert!(tuple.is_none());
        assert_eq!(ctx.current_vendor_name.as_deref(), Some("Gamma Inc"));
        assert_eq!(start, VendorContext::default());

        let (_, tuple) = tracker.step(ctx, &RawRow::new(["DIR REGISTRATION"]));
        let tuple = tuple.unwrap();
        assert_eq!(tuple.vendor_name.as_deref(), Some("Gamma Inc"));
        assert_eq!(tuple.project_ref.as_deref(), Some(NO_PROJECT));
    }

    #[test]
    fn test_certificate_before_vendor_is_dropped() {
        let sheet = rows(&[
            &["WORKERS COMP INSURANCE", "100", "01/01/30"],
            &["1", "Acme Corp"],
            &["WORKERS COMP INSURANCE", "100", "01/01/30"],
        ]);
        let outcome = tracker().track(&sheet);
        assert_eq!(outcome.tuples.len(), 2);
        assert!(outcome.tuples[0].vendor_name.is_none());

        let (kept, dropped) = drop_without_vendor(outcome.tuples);
        assert_eq!(dropped, 1);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_project_filters() {
        let sheet = rows(&[
            &["1", "Acme Corp"],
            &["WORKERS COMP INSURANCE", "100", "01/01/30"],
            &["GENERAL LIABILITY INSURANCE", "0", "01/01/30"],
            &["UMBRELLA LIABILITY"],
        ]);
        let tuples = tracker().track(&sheet).tuples;

        let (kept, dropped) = filter_projects(tuples.clone(), ProjectFilter::RequireReference);
        assert_eq!((kept.len(), dropped), (1, 2));
        assert_eq!(kept[0].certificate_name, "WORKERS COMP INSURANCE");

        let (kept, dropped) = filter_projects(tuples.clone(), ProjectFilter::BlanketOnly);
        assert_eq!((kept.len(), dropped), (2, 1));

        let (kept, dropped) = filter_projects(tuples, ProjectFilter::KeepAll);
        assert_eq!((kept.len(), dropped), (3, 0));
    }
}
