//! CSV readers for uploaded sheets.
//!
//! Vendor sheets are headerless and ragged. Details sheets carry a header row
//! after a few rows of preamble.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder};
use tracing::debug;

use crate::error::{Result, VendorError};
use crate::models::{RawRow, VendorDetailsRecord};
use crate::validation::InputValidator;

/// Details-sheet fields a header cell can map to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetailsField {
    Company,
    Division,
    Trade,
    ContactName,
    Cell,
    Office,
    Email,
    Address,
    CaLicense,
    DirNumber,
    Dvbe,
}

impl DetailsField {
    fn from_header(header: &str) -> Option<Self> {
        let key: String = header
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_ascii_lowercase();

        let field = match key.as_str() {
            "companydba" | "company" | "companyname" | "dba" | "vendorname" | "name" => Self::Company,
            "division" => Self::Division,
            "trade" => Self::Trade,
            "contactname" | "contact" => Self::ContactName,
            "cellnumber" | "cell" | "cellphone" | "mobile" => Self::Cell,
            "officenumber" | "office" | "officephone" | "phone" => Self::Office,
            "email" | "emailaddress" => Self::Email,
            "address" => Self::Address,
            "calicense" | "calicensenumber" | "license" | "cslb" => Self::CaLicense,
            "dirnumber" | "dir" | "dirregistration" => Self::DirNumber,
            "dvbe" => Self::Dvbe,
            _ => return None,
        };
        Some(field)
    }
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader)
}

fn cells(record: &ByteRecord) -> Vec<String> {
    record
        .iter()
        .map(|field| InputValidator::sanitize_text(&String::from_utf8_lossy(field)))
        .collect()
}

/// Read a headerless vendor sheet into non-empty rows
pub fn read_vendor_sheet<R: Read>(reader: R) -> Result<Vec<RawRow>> {
    let mut rows = Vec::new();
    for record in csv_reader(reader).byte_records() {
        let row = RawRow::new(cells(&record?));
        if !row.is_empty() {
            rows.push(row);
        }
    }
    debug!(rows = rows.len(), "Read vendor sheet");
    Ok(rows)
}

/// Read a vendor sheet from disk
pub fn read_vendor_sheet_path(path: &Path) -> Result<Vec<RawRow>> {
    read_vendor_sheet(File::open(path)?)
}

/// Read a details sheet whose header sits after `skip_rows` records.
///
/// Unknown columns are ignored. A sheet without a company column is rejected.
pub fn read_details_sheet<R: Read>(reader: R, skip_rows: usize) -> Result<Vec<VendorDetailsRecord>> {
    let mut records = csv_reader(reader).into_byte_records().skip(skip_rows);

    let header = match records.next() {
        Some(record) => cells(&record?),
        None => {
            return Err(VendorError::Parse(format!(
                "details sheet has no header row after skipping {skip_rows} rows"
            )))
        }
    };
    let columns: Vec<Option<DetailsField>> = header.iter().map(|h| DetailsField::from_header(h)).collect();

    if !columns.contains(&Some(DetailsField::Company)) {
        return Err(VendorError::Parse(format!(
            "details sheet header has no company column: {}",
            header.join(", ")
        )));
    }

    let mut out = Vec::new();
    for record in records {
        let values = cells(&record?);
        if values.iter().all(String::is_empty) {
            continue;
        }

        let mut details = VendorDetailsRecord::default();
        for (field, value) in columns.iter().zip(values) {
            let Some(field) = field else { continue };
            if value.is_empty() {
                continue;
            }
            match field {
                DetailsField::Company => {
                    if details.company_name.is_empty() {
                        details.company_name = value;
                    }
                }
                DetailsField::Division => details.division = Some(value),
                DetailsField::Trade => details.trade = Some(value),
                DetailsField::ContactName => details.contact_name = Some(value),
                DetailsField::Cell => details.cell_number = Some(value),
                DetailsField::Office => details.office_number = Some(value),
                DetailsField::Email => details.email = Some(value),
                DetailsField::Address => details.address = Some(value),
                DetailsField::CaLicense => details.ca_license = Some(value),
                DetailsField::DirNumber => details.dir_number = Some(value),
                DetailsField::Dvbe => details.dvbe = Some(value),
            }
        }
        out.push(details);
    }

    debug!(records = out.len(), "Read details sheet");
    Ok(out)
}

/// Read a details sheet from disk
pub fn read_details_sheet_path(path: &Path, skip_rows: usize) -> Result<Vec<VendorDetailsRecord>> {
    read_details_sheet(File::open(path)?, skip_rows)
}
