//! Data models for vendor certificate tracking
//!
//! This module contains the data structures that flow through the ingestion
//! pipeline, the persisted record shapes, and the merged search view.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::validation::InputValidator;

/// Sentinel project reference meaning "no project".
pub const NO_PROJECT: &str = "0";

/// One spreadsheet line with empty cells removed.
///
/// Meaning is positional and content-sniffed; there is no header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRow {
    cells: Vec<String>,
}

impl RawRow {
    /// Build a row from raw cell text, dropping empty cells.
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cells = values
            .into_iter()
            .map(|v| InputValidator::sanitize_text(v.as_ref()))
            .filter(|v| !v.is_empty())
            .collect();
        Self { cells }
    }

    /// Non-empty cell values in sheet order
    #[must_use]
    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    /// Cell at `index`, if present
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }

    /// Number of non-empty cells
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True if the row had no non-empty cells
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All cell values joined with single spaces
    #[must_use]
    pub fn joined(&self) -> String {
        self.cells.join(" ")
    }
}

/// Vendor category declared by a marker row in the vendor sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum VendorTypeCode {
    /// No type marker seen yet
    #[default]
    Unknown,
    /// Regular vendor
    RegVendor,
    /// Subcontractor
    Subcontractor,
    /// Architect
    Architect,
    /// Material supplier
    Supplier,
    /// Accounting, legal or consulting
    AcctgLegalConsulting,
    /// Equipment rental
    EquipmentRent,
}

impl VendorTypeCode {
    /// Marker text searched for in a row, with the code it maps to.
    ///
    /// Matching is case-sensitive and the first match in this order wins.
    pub const MARKERS: [(&'static str, Self); 6] = [
        ("REG VENDOR", Self::RegVendor),
        ("SUBCONTRACTOR", Self::Subcontractor),
        ("ARCHITECT", Self::Architect),
        ("Supplier", Self::Supplier),
        ("ACCTG/LEGAL/CONSULTING", Self::AcctgLegalConsulting),
        ("EQUIPMENT RENT", Self::EquipmentRent),
    ];

    /// Integer code stored in the `vendor_type` column
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Unknown => 0,
            Self::RegVendor => 1,
            Self::Subcontractor => 2,
            Self::Architect => 3,
            Self::Supplier => 5,
            Self::AcctgLegalConsulting => 6,
            Self::EquipmentRent => 7,
        }
    }

    /// Inverse of [`Self::code`]; unrecognised codes map to `Unknown`
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            1 => Self::RegVendor,
            2 => Self::Subcontractor,
            3 => Self::Architect,
            5 => Self::Supplier,
            6 => Self::AcctgLegalConsulting,
            7 => Self::EquipmentRent,
            _ => Self::Unknown,
        }
    }

    /// Human-readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::RegVendor => "Regular Vendor",
            Self::Subcontractor => "Subcontractor",
            Self::Architect => "Architect",
            Self::Supplier => "Supplier",
            Self::AcctgLegalConsulting => "Accounting/Legal/Consulting",
            Self::EquipmentRent => "Equipment Rental",
        }
    }
}

/// "Current vendor" state carried through one pass over a vendor sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorContext {
    /// Most recently seen vendor name
    pub current_vendor_name: Option<String>,
    /// Most recently seen type marker
    pub current_type: Option<VendorTypeCode>,
    /// Contact from the most recent vendor row
    pub current_contact: Option<String>,
    /// Phone from the most recent vendor row
    pub current_phone: Option<String>,
}

/// One certificate line attributed to the vendor context it appeared under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateTuple {
    /// Vendor type at the time of the row
    pub vendor_type: Option<VendorTypeCode>,
    /// Vendor the certificate belongs to; `None` before any vendor row
    pub vendor_name: Option<String>,
    /// Certificate name as written in the sheet
    pub certificate_name: String,
    /// Blanket/project reference, `"0"` when the row had none
    pub project_ref: Option<String>,
    /// Raw expiration text
    pub expires_raw: Option<String>,
    /// Contact from the vendor row
    pub contact: Option<String>,
    /// Phone from the vendor row
    pub phone: Option<String>,
}

impl CertificateTuple {
    /// True if the tuple carries a real project reference
    #[must_use]
    pub fn has_project(&self) -> bool {
        self.project_ref
            .as_deref()
            .is_some_and(|p| !p.trim().is_empty() && p.trim() != NO_PROJECT)
    }
}

/// Collated certificate status for one vendor; one row in `vendors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorRecord {
    /// Vendor name exactly as written in the sheet
    pub vendor_name: String,
    /// Certificates whose expiration is still in the future
    pub valid_certificates: Vec<String>,
    /// Certificates that are expired or have an unreadable date
    pub expired_certificates: Vec<String>,
    /// Expiration dates, parallel to `valid_certificates`
    pub expiration_dates: Vec<NaiveDate>,
    /// Earliest date in `expiration_dates`
    pub soonest_expiration: Option<NaiveDate>,
    /// All required certificates are valid
    pub approved: bool,
    /// Days until `soonest_expiration`, only within the warning window
    pub soon_to_expire_days: Option<i64>,
    /// Vendor category
    pub vendor_type: VendorTypeCode,
    /// Primary contact
    pub contact: Option<String>,
    /// Primary phone
    pub phone: Option<String>,
}

/// Vendor contact/trade details from the separately uploaded details sheet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VendorDetailsRecord {
    /// Company or DBA name
    pub company_name: String,
    /// CSI division
    pub division: Option<String>,
    /// Trade within the division
    pub trade: Option<String>,
    /// Contact person
    pub contact_name: Option<String>,
    /// Mobile number
    pub cell_number: Option<String>,
    /// Office number
    pub office_number: Option<String>,
    /// Email address
    pub email: Option<String>,
    /// Street address
    pub address: Option<String>,
    /// California contractor license number
    pub ca_license: Option<String>,
    /// DIR registration number
    pub dir_number: Option<String>,
    /// Disabled Veteran Business Enterprise status
    pub dvbe: Option<String>,
}

impl VendorDetailsRecord {
    /// Normalized matching key for this record
    #[must_use]
    pub fn key(&self) -> String {
        crate::normalize::normalize_company(&self.company_name)
    }
}

/// Query-time union of certificate status and vendor details.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MergedVendorView {
    /// Normalized matching key
    pub key: String,
    /// Name from the certificate sheet, if any
    pub vendor_name: Option<String>,
    /// Name from the details sheet, if any
    pub company_name: Option<String>,
    /// Valid certificates
    pub certificates: Vec<String>,
    /// Expiration dates, parallel to `certificates`
    pub expiration_dates: Vec<NaiveDate>,
    /// Expired certificates
    pub expired_certificates: Vec<String>,
    /// Earliest valid expiration
    pub soonest_expiration: Option<NaiveDate>,
    /// Approved by any contributing record
    pub approved: bool,
    /// Days until the soonest expiration, inside the warning window
    pub soon_to_expire_days: Option<i64>,
    /// Vendor category
    pub vendor_type: Option<VendorTypeCode>,
    /// Contact from the certificate sheet
    pub contact: Option<String>,
    /// Phone from the certificate sheet
    pub phone: Option<String>,
    /// CSI division
    pub division: Option<String>,
    /// Trade
    pub trade: Option<String>,
    /// Contact from the details sheet
    pub contact_name: Option<String>,
    /// Mobile number
    pub cell_number: Option<String>,
    /// Office number
    pub office_number: Option<String>,
    /// Email address
    pub email: Option<String>,
    /// Street address
    pub address: Option<String>,
    /// California contractor license number
    pub ca_license: Option<String>,
    /// DIR registration number
    pub dir_number: Option<String>,
    /// DVBE status
    pub dvbe: Option<String>,
}

impl MergedVendorView {
    /// Name to show for this vendor, preferring the certificate sheet's
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.vendor_name
            .as_deref()
            .or(self.company_name.as_deref())
            .unwrap_or(&self.key)
    }

    /// Valid certificates paired with their expiration, soonest first
    #[must_use]
    pub fn certificates_by_expiration(&self) -> Vec<(&str, NaiveDate)> {
        let mut pairs: Vec<(&str, NaiveDate)> = self
            .certificates
            .iter()
            .map(String::as_str)
            .zip(self.expiration_dates.iter().copied())
            .collect();
        pairs.sort_by_key(|(_, date)| *date);
        pairs
    }

    /// Days from `today` until the soonest valid expiration
    #[must_use]
    pub fn days_until_soonest(&self, today: NaiveDate) -> Option<i64> {
        self.certificates_by_expiration()
            .first()
            .map(|(_, date)| (*date - today).num_days())
    }
}

/// One row of the vendors/details outer join; either side may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JoinedRow {
    /// Certificate side
    pub vendor: Option<VendorRecord>,
    /// Details side
    pub details: Option<VendorDetailsRecord>,
}

/// Outcome of one vendor-sheet ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    /// Non-empty rows read
    pub rows_read: usize,
    /// Rows that set the vendor type
    pub type_marker_rows: usize,
    /// Rows that started a new vendor
    pub vendor_rows: usize,
    /// Certificate rows
    pub certificate_rows: usize,
    /// Rows matching no category
    pub unclassified_rows: usize,
    /// Certificate rows seen before any vendor row
    pub dropped_without_vendor: usize,
    /// Certificate rows removed by the project filter
    pub dropped_by_project_filter: usize,
    /// Vendor records written
    pub vendors_written: usize,
    /// Of those, approved
    pub vendors_approved: usize,
}

/// Outcome of one details-sheet ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetailsSummary {
    /// Data rows read
    pub rows_read: usize,
    /// Rows without a usable company name
    pub skipped_empty: usize,
    /// Later rows whose key repeated an earlier row in the batch
    pub duplicates: usize,
    /// Records upserted
    pub upserted: usize,
}

/// Row counts of both collections
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    /// Rows in `vendors`
    pub vendors: usize,
    /// Rows in `vendor_details`
    pub vendor_details: usize,
}

/// Output format for exported vendor data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Comma-separated values format
    Csv,
    /// Plain text format
    Txt,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Get the file extension for this format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Txt => "txt",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = crate::error::VendorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "txt" => Ok(Self::Txt),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(crate::error::VendorError::InvalidInput(format!(
                "unknown output format: {other}"
            ))),
        }
    }
}
