use std::time::Duration;

use metrics::{counter, gauge, histogram};

use crate::error::Stage;
use crate::models::{DetailsSummary, IngestSummary, StoreCounts};

pub const ROWS_READ_TOTAL: &str = "vendor_compliance_rows_read_total";
pub const ROWS_UNCLASSIFIED_TOTAL: &str = "vendor_compliance_rows_unclassified_total";
pub const TUPLES_DROPPED_TOTAL: &str = "vendor_compliance_tuples_dropped_total";
pub const VENDORS_WRITTEN_TOTAL: &str = "vendor_compliance_vendors_written_total";
pub const VENDORS_APPROVED: &str = "vendor_compliance_vendors_approved";
pub const DETAILS_UPSERTED_TOTAL: &str = "vendor_compliance_details_upserted_total";
pub const PERSISTENCE_FAILURES_TOTAL: &str = "vendor_compliance_persistence_failures_total";
pub const STAGE_DURATION: &str = "vendor_compliance_stage_duration_seconds";
pub const SEARCH_RESULTS: &str = "vendor_compliance_search_results";
pub const STORED_ROWS: &str = "vendor_compliance_stored_rows";

/// Running counters for ingestion work.
///
/// Every update is also forwarded to the `metrics` facade, which is a no-op
/// unless the embedding application installs a recorder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestMetrics {
    /// Non-empty sheet rows read
    pub rows_read: u64,
    /// Rows that matched no category
    pub unclassified_rows: u64,
    /// Certificate tuples dropped before collation
    pub tuples_dropped: u64,
    /// Vendor records written
    pub vendors_written: u64,
    /// Approved vendors in the latest vendor run
    pub vendors_approved: u64,
    /// Details records upserted
    pub details_upserted: u64,
    /// Failed writes to the store
    pub persistence_failures: u64,
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed vendor-sheet run
    pub fn record_vendor_run(&mut self, summary: &IngestSummary) {
        let dropped = summary.dropped_without_vendor + summary.dropped_by_project_filter;

        self.rows_read += summary.rows_read as u64;
        self.unclassified_rows += summary.unclassified_rows as u64;
        self.tuples_dropped += dropped as u64;
        self.vendors_written += summary.vendors_written as u64;
        self.vendors_approved = summary.vendors_approved as u64;

        counter!(ROWS_READ_TOTAL, "sheet" => "vendors").increment(summary.rows_read as u64);
        counter!(ROWS_UNCLASSIFIED_TOTAL).increment(summary.unclassified_rows as u64);
        counter!(TUPLES_DROPPED_TOTAL, "reason" => "no_vendor").increment(summary.dropped_without_vendor as u64);
        counter!(TUPLES_DROPPED_TOTAL, "reason" => "project_filter")
            .increment(summary.dropped_by_project_filter as u64);
        counter!(VENDORS_WRITTEN_TOTAL).increment(summary.vendors_written as u64);
        gauge!(VENDORS_APPROVED).set(summary.vendors_approved as f64);
    }

    /// Record a completed details-sheet run
    pub fn record_details_run(&mut self, summary: &DetailsSummary) {
        self.rows_read += summary.rows_read as u64;
        self.details_upserted += summary.upserted as u64;

        counter!(ROWS_READ_TOTAL, "sheet" => "details").increment(summary.rows_read as u64);
        counter!(DETAILS_UPSERTED_TOTAL).increment(summary.upserted as u64);
    }

    /// Record a failed write
    pub fn record_persistence_failure(&mut self, operation: &'static str) {
        self.persistence_failures += 1;
        counter!(PERSISTENCE_FAILURES_TOTAL, "operation" => operation).increment(1);
    }

    /// Record how long a pipeline stage took
    pub fn record_stage_duration(&self, stage: Stage, duration: Duration) {
        histogram!(STAGE_DURATION, "stage" => stage.to_string()).record(duration.as_secs_f64());
    }

    /// Record the size of a search result
    pub fn record_search(&self, results: usize) {
        histogram!(SEARCH_RESULTS).record(results as f64);
    }

    /// Publish current table sizes
    pub fn record_store_counts(&self, counts: StoreCounts) {
        gauge!(STORED_ROWS, "table" => "vendors").set(counts.vendors as f64);
        gauge!(STORED_ROWS, "table" => "vendor_details").set(counts.vendor_details as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_run_accumulates() {
        let mut metrics = IngestMetrics::new();
        let summary = IngestSummary {
            rows_read: 10,
            unclassified_rows: 2,
            dropped_without_vendor: 1,
            dropped_by_project_filter: 3,
            vendors_written: 4,
            vendors_approved: 1,
            ..IngestSummary::default()
        };
        metrics.record_vendor_run(&summary);
        metrics.record_vendor_run(&summary);

        assert_eq!(metrics.rows_read, 20);
        assert_eq!(metrics.unclassified_rows, 4);
        assert_eq!(metrics.tuples_dropped, 8);
        assert_eq!(metrics.vendors_written, 8);
        assert_eq!(metrics.vendors_approved, 1);
    }

    #[test]
    fn test_persistence_failures_counted() {
        let mut metrics = IngestMetrics::new();
        metrics.record_persistence_failure("replace_vendors");
        assert_eq!(metrics.persistence_failures, 1);
    }
}
