//! Database schema definitions
//!
//! Constants for table and column names used with rusqlite. The DDL itself
//! lives in `migrations/`.

/// Collated vendor records, replaced wholesale on every vendor-sheet upload
pub mod vendors {
    /// Table name
    pub const TABLE: &str = "vendors";
    /// Vendor name as it appeared on the sheet
    pub const VENDOR_NAME: &str = "vendor_name";
    /// JSON array of valid certificate names
    pub const CERTIFICATE: &str = "certificate";
    /// Soonest valid expiration, ISO date; NULL when nothing is valid
    pub const EXPIRES: &str = "expires";
    /// Numeric vendor type code
    pub const VENDOR_TYPE: &str = "vendor_type";
    /// Contact name column
    pub const CONTACT: &str = "contact";
    /// Phone column
    pub const PHONE: &str = "phone";
    /// JSON array of expired or unreadable certificate names
    pub const CERTS_EXPIRED: &str = "certs_expired";
    /// Approval flag
    pub const APPROVED: &str = "approved";
    /// Days until the soonest expiration, when inside the warning window
    pub const SOON_TO_EXPIRE: &str = "soon_to_expire";
    /// JSON array of ISO dates, parallel to `certificate`
    pub const EXPIRATIONS_ALL: &str = "expirations_all";
}

/// Vendor details, upserted by normalized company name
pub mod vendor_details {
    /// Table name
    pub const TABLE: &str = "vendor_details";
    /// Normalized company name, primary key
    pub const COMPANY_KEY: &str = "company_key";
    /// Company name as uploaded
    pub const COMPANY_DBA: &str = "company_dba";
    /// CSI division column
    pub const DIVISION: &str = "division";
    /// Trade column
    pub const TRADE: &str = "trade";
    /// Contact name column
    pub const CONTACT_NAME: &str = "contact_name";
    /// Cell number column
    pub const CELL_NUMBER: &str = "cell_number";
    /// Office number column
    pub const OFFICE_NUMBER: &str = "office_number";
    /// Email column
    pub const EMAIL: &str = "email";
    /// Address column
    pub const ADDRESS: &str = "address";
    /// California contractor license number
    pub const CA_LICENSE: &str = "ca_license";
    /// DIR registration number
    pub const DIR_NUMBER: &str = "dir_number";
    /// DVBE status column
    pub const DVBE: &str = "dvbe";
}

/// Name of the SQL function that exposes the company normalizer
pub const NORMALIZE_FN: &str = "normalize_company";
