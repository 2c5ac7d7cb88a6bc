use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::classifier::RowClassifier;
use crate::collator::Collator;
use crate::config::AppConfig;
use crate::error::{Result, Stage, StageContext};
use crate::logging::OperationTimer;
use crate::merger::{merge_sources, MergeSource};
use crate::metrics::IngestMetrics;
use crate::models::{DetailsSummary, IngestSummary, MergedVendorView, RawRow, StoreCounts, VendorDetailsRecord, VendorRecord};
use crate::reader::{read_details_sheet_path, read_vendor_sheet_path};
use crate::repository::VendorStore;
use crate::search::{rank_fuzzy, SearchRequest, DEFAULT_FUZZY_THRESHOLD};
use crate::tracker::{drop_without_vendor, filter_projects, ContextTracker, ProjectFilter};
use crate::validation::InputValidator;

/// Tunables for ingestion and search
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    pub soon_to_expire_days: i64,
    pub project_filter: ProjectFilter,
    pub details_skip_rows: usize,
    pub max_upload_mb: u64,
    pub fuzzy_threshold: f64,
    pub max_results: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ServiceSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            soon_to_expire_days: config.ingest.soon_to_expire_days,
            project_filter: config.ingest.project_filter,
            details_skip_rows: config.ingest.details_skip_rows,
            max_upload_mb: config.ingest.max_upload_mb,
            fuzzy_threshold: if (0.0..=1.0).contains(&config.search.fuzzy_threshold) {
                config.search.fuzzy_threshold
            } else {
                DEFAULT_FUZZY_THRESHOLD
            },
            max_results: config.search.max_results,
        }
    }
}

/// Runs ingestion and search against a [`VendorStore`]
pub struct VendorService {
    store: Box<dyn VendorStore>,
    tracker: ContextTracker,
    collator: Collator,
    settings: ServiceSettings,
    metrics: IngestMetrics,
}

impl VendorService {
    pub fn new(store: Box<dyn VendorStore>, settings: ServiceSettings) -> Result<Self> {
        Ok(Self {
            store,
            tracker: ContextTracker::new(RowClassifier::new()?),
            collator: Collator::new(settings.soon_to_expire_days),
            settings,
            metrics: IngestMetrics::new(),
        })
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Counters accumulated by this service
    pub fn metrics(&self) -> &IngestMetrics {
        &self.metrics
    }

    /// Classify, collate and store a vendor sheet, replacing the stored set.
    ///
    /// Nothing is written unless every step succeeds; a failed write leaves
    /// the previous vendor set in place.
    pub fn ingest_vendor_sheet(&mut self, rows: &[RawRow], now: NaiveDateTime) -> Result<IngestSummary> {
        let timer = OperationTimer::new("classify");
        let outcome = self.tracker.track(rows);
        let (tuples, dropped_without_vendor) = drop_without_vendor(outcome.tuples);
        let (tuples, dropped_by_project_filter) = filter_projects(tuples, self.settings.project_filter);
        self.metrics.record_stage_duration(Stage::Classify, timer.finish());

        if outcome.counts.unclassified > 0 {
            warn!(
                unclassified = outcome.counts.unclassified,
                "Vendor sheet rows matched no category and were ignored"
            );
        }

        let timer = OperationTimer::new("collate");
        let records = self.collator.collate(&tuples, now);
        self.metrics.record_stage_duration(Stage::Collate, timer.finish());

        let timer = OperationTimer::new("persist_vendors");
        let written = match self.store.replace_vendors(&records).stage(Stage::Persist) {
            Ok(written) => written,
            Err(e) => {
                self.metrics.record_persistence_failure("replace_vendors");
                return Err(e);
            }
        };
        self.metrics.record_stage_duration(Stage::Persist, timer.finish());

        let summary = IngestSummary {
            rows_read: outcome.counts.rows,
            type_marker_rows: outcome.counts.type_markers,
            vendor_rows: outcome.counts.vendors,
            certificate_rows: outcome.counts.certificates,
            unclassified_rows: outcome.counts.unclassified,
            dropped_without_vendor,
            dropped_by_project_filter,
            vendors_written: written,
            vendors_approved: records.iter().filter(|r| r.approved).count(),
        };
        self.metrics.record_vendor_run(&summary);

        info!(
            rows = summary.rows_read,
            vendors = summary.vendors_written,
            approved = summary.vendors_approved,
            unclassified = summary.unclassified_rows,
            "Vendor sheet ingested"
        );
        Ok(summary)
    }

    /// Deduplicate details by normalized name (first wins) and upsert them
    pub fn ingest_details_sheet(&mut self, records: Vec<VendorDetailsRecord>) -> Result<DetailsSummary> {
        let rows_read = records.len();
        let mut seen: HashSet<String> = HashSet::new();
        let mut skipped_empty = 0;
        let mut duplicates = 0;
        let mut unique = Vec::with_capacity(records.len());

        for record in records {
            let key = record.key();
            if key.is_empty() {
                skipped_empty += 1;
            } else if !seen.insert(key) {
                duplicates += 1;
            } else {
                unique.push(record);
            }
        }

        if duplicates > 0 {
            warn!(duplicates, "Duplicate companies in details sheet; keeping first occurrence");
        }

        let timer = OperationTimer::new("persist_details");
        let upserted = match self.store.upsert_vendor_details(&unique).stage(Stage::Persist) {
            Ok(upserted) => upserted,
            Err(e) => {
                self.metrics.record_persistence_failure("upsert_vendor_details");
                return Err(e);
            }
        };
        self.metrics.record_stage_duration(Stage::Persist, timer.finish());

        let summary = DetailsSummary {
            rows_read,
            skipped_empty,
            duplicates,
            upserted,
        };
        self.metrics.record_details_run(&summary);

        info!(rows = rows_read, upserted, skipped_empty, duplicates, "Details sheet ingested");
        Ok(summary)
    }

    /// Validate, read and ingest a vendor sheet file
    pub fn ingest_vendor_file(&mut self, path: &Path, now: NaiveDateTime) -> Result<IngestSummary> {
        InputValidator::validate_upload_path(path, self.settings.max_upload_mb).stage(Stage::Read)?;
        let rows = read_vendor_sheet_path(path).stage(Stage::Read)?;
        self.ingest_vendor_sheet(&rows, now)
    }

    /// Validate, read and ingest a details sheet file
    pub fn ingest_details_file(&mut self, path: &Path, skip_rows: Option<usize>) -> Result<DetailsSummary> {
        let skip_rows = skip_rows.unwrap_or(self.settings.details_skip_rows);
        InputValidator::validate_skip_rows(skip_rows).stage(Stage::Read)?;
        InputValidator::validate_upload_path(path, self.settings.max_upload_mb).stage(Stage::Read)?;
        let records = read_details_sheet_path(path, skip_rows).stage(Stage::Read)?;
        self.ingest_details_sheet(records)
    }

    /// Search stored vendors and merge matches into one view per vendor.
    ///
    /// The expiry warning window is evaluated against `now`.
    pub fn search(&self, request: &SearchRequest, now: NaiveDateTime) -> Result<Vec<MergedVendorView>> {
        let timer = OperationTimer::new("search");
        request.validate().stage(Stage::Search)?;

        let rows = self.store.search(request).stage(Stage::Search)?;
        let sources = rows.iter().flat_map(|row| {
            row.vendor
                .iter()
                .map(MergeSource::Certificates)
                .chain(row.details.iter().map(MergeSource::Details))
        });

        let mut views = merge_sources(sources);
        for view in &mut views {
            view.soon_to_expire_days = self.collator.soon_to_expire(view.soonest_expiration, now);
        }

        if request.fuzzy {
            if let Some(name) = request.name.as_deref() {
                views = rank_fuzzy(views, name, self.settings.fuzzy_threshold);
            }
        }

        views.truncate(request.limit.unwrap_or(self.settings.max_results));
        self.metrics.record_search(views.len());
        self.metrics.record_stage_duration(Stage::Search, timer.finish());
        Ok(views)
    }

    /// Every stored vendor record
    pub fn list_vendors(&self) -> Result<Vec<VendorRecord>> {
        self.store.all_vendors().stage(Stage::Search)
    }

    /// Every stored details record
    pub fn list_vendor_details(&self) -> Result<Vec<VendorDetailsRecord>> {
        self.store.all_vendor_details().stage(Stage::Search)
    }

    /// Row counts of both collections
    pub fn counts(&self) -> Result<StoreCounts> {
        let counts = self.store.counts().stage(Stage::Search)?;
        self.metrics.record_store_counts(counts);
        Ok(counts)
    }
}
