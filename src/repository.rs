use crate::db::Database;
use crate::error::Result;
use crate::models::{JoinedRow, StoreCounts, VendorDetailsRecord, VendorRecord};
use crate::search::SearchRequest;

/// Storage seam between the ingestion pipeline and persistence
#[cfg_attr(test, mockall::automock)]
pub trait VendorStore: Send + Sync {
    /// Atomically replace the whole vendor set; returns records written
    fn replace_vendors(&self, records: &[VendorRecord]) -> Result<usize>;

    /// Insert or update details keyed by normalized company name
    fn upsert_vendor_details(&self, records: &[VendorDetailsRecord]) -> Result<usize>;

    /// Outer join of vendors and details filtered by `request`
    fn search(&self, request: &SearchRequest) -> Result<Vec<JoinedRow>>;

    /// Every stored vendor record
    fn all_vendors(&self) -> Result<Vec<VendorRecord>>;

    /// Every stored details record
    fn all_vendor_details(&self) -> Result<Vec<VendorDetailsRecord>>;

    /// Row counts of both collections
    fn counts(&self) -> Result<StoreCounts>;
}

impl VendorStore for Database {
    fn replace_vendors(&self, records: &[VendorRecord]) -> Result<usize> {
        Database::replace_vendors(self, records)
    }

    fn upsert_vendor_details(&self, records: &[VendorDetailsRecord]) -> Result<usize> {
        Database::upsert_vendor_details(self, records)
    }

    fn search(&self, request: &SearchRequest) -> Result<Vec<JoinedRow>> {
        Database::search(self, request)
    }

    fn all_vendors(&self) -> Result<Vec<VendorRecord>> {
        Database::all_vendors(self)
    }

    fn all_vendor_details(&self) -> Result<Vec<VendorDetailsRecord>> {
        Database::all_vendor_details(self)
    }

    fn counts(&self) -> Result<StoreCounts> {
        Database::counts(self)
    }
}
