//! Export of vendor data.
//!
//! Writes stored vendor records or merged search views as TXT, CSV or JSON,
//! either to any writer (stdout for the CLI) or to a file.

use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::NaiveDate;
use csv::Writer;
use serde::Serialize;

use crate::error::Result;
use crate::models::{MergedVendorView, OutputFormat, VendorRecord};

/// Separator for list values in flat formats
const LIST_SEPARATOR: &str = "; ";

/// A record that can be flattened into labelled columns
pub trait Exportable: Serialize {
    /// Column labels, in output order
    fn headers() -> &'static [&'static str];

    /// Cell values, parallel to [`Exportable::headers`]
    fn values(&self) -> Vec<String>;
}

fn join_dates(dates: &[NaiveDate]) -> String {
    dates
        .iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

fn opt<T: ToString>(value: Option<&T>) -> String {
    value.map(ToString::to_string).unwrap_or_default()
}

impl Exportable for VendorRecord {
    fn headers() -> &'static [&'static str] {
        &[
            "Vendor",
            "Type",
            "Approved",
            "Valid Certificates",
            "Expires",
            "Expired Certificates",
            "Soonest Expiration",
            "Days To Expiry",
            "Contact",
            "Phone",
        ]
    }

    fn values(&self) -> Vec<String> {
        vec![
            self.vendor_name.clone(),
            self.vendor_type.label().to_string(),
            self.approved.to_string(),
            self.valid_certificates.join(LIST_SEPARATOR),
            join_dates(&self.expiration_dates),
            self.expired_certificates.join(LIST_SEPARATOR),
            opt(self.soonest_expiration.as_ref()),
            opt(self.soon_to_expire_days.as_ref()),
            opt(self.contact.as_ref()),
            opt(self.phone.as_ref()),
        ]
    }
}

impl Exportable for MergedVendorView {
    fn headers() -> &'static [&'static str] {
        &[
            "Vendor",
            "Company DBA",
            "Approved",
            "Valid Certificates",
            "Expires",
            "Expired Certificates",
            "Soonest Expiration",
            "Days To Expiry",
            "Type",
            "Contact",
            "Phone",
            "Division",
            "Trade",
            "Contact Name",
            "Cell",
            "Office",
            "Email",
            "Address",
            "CA License",
            "DIR Number",
            "DVBE",
        ]
    }

    fn values(&self) -> Vec<String> {
        vec![
            self.display_name().to_string(),
            opt(self.company_name.as_ref()),
            self.approved.to_string(),
            self.certificates.join(LIST_SEPARATOR),
            join_dates(&self.expiration_dates),
            self.expired_certificates.join(LIST_SEPARATOR),
            opt(self.soonest_expiration.as_ref()),
            opt(self.soon_to_expire_days.as_ref()),
            self.vendor_type.map(|t| t.label().to_string()).unwrap_or_default(),
            opt(self.contact.as_ref()),
            opt(self.phone.as_ref()),
            opt(self.division.as_ref()),
            opt(self.trade.as_ref()),
            opt(self.contact_name.as_ref()),
            opt(self.cell_number.as_ref()),
            opt(self.office_number.as_ref()),
            opt(self.email.as_ref()),
            opt(self.address.as_ref()),
            opt(self.ca_license.as_ref()),
            opt(self.dir_number.as_ref()),
            opt(self.dvbe.as_ref()),
        ]
    }
}

/// Write `items` to `writer` in the given format
pub fn write_items<T: Exportable, W: Write>(items: &[T], format: OutputFormat, writer: W) -> Result<()> {
    match format {
        OutputFormat::Txt => write_txt(items, writer),
        OutputFormat::Csv => write_csv(items, writer),
        OutputFormat::Json => write_json(items, writer),
    }
}

/// Write `items` to `file_path`, creating parent directories
pub fn write_items_to_file<T: Exportable>(items: &[T], format: OutputFormat, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)?;
    }
    let file = File::create(file_path)?;
    write_items(items, format, BufWriter::new(file))
}

/// One `Label: value` line per non-empty field, blank line between items
fn write_txt<T: Exportable, W: Write>(items: &[T], writer: W) -> Result<()> {
    let mut writer = writer;
    for item in items {
        for (header, value) in T::headers().iter().zip(item.values()) {
            if !value.is_empty() {
                writeln!(writer, "{header}: {value}")?;
            }
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_csv<T: Exportable, W: Write>(items: &[T], writer: W) -> Result<()> {
    let mut writer = Writer::from_writer(writer);
    writer.write_record(T::headers())?;
    for item in items {
        writer.write_record(item.values())?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json<T: Exportable, W: Write>(items: &[T], writer: W) -> Result<()> {
    let mut writer = writer;
    serde_json::to_writer_pretty(&mut writer, items)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VendorTypeCode;

    fn record() -> VendorRecord {
        VendorRecord {
            vendor_name: "Acme Corp".to_string(),
            valid_certificates: vec!["WORKERS COMP INSURANCE".to_string(), "DIR REGISTRATION".to_string()],
            expired_certificates: vec![],
            expiration_dates: vec![
                NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2031, 2, 3).unwrap(),
            ],
            soonest_expiration: NaiveDate::from_ymd_opt(2030, 1, 1),
            approved: false,
            soon_to_expire_days: None,
            vendor_type: VendorTypeCode::Subcontractor,
            contact: Some("J. Doe".to_string()),
            phone: None,
        }
    }

    #[test]
    fn test_headers_match_values() {
        assert_eq!(VendorRecord::headers().len(), record().values().len());
        let view = MergedVendorView::default();
        assert_eq!(MergedVendorView::headers().len(), view.values().len());
    }

    #[test]
    fn test_csv_lists_joined() {
        let mut out = Vec::new();
        write_items(&[record()], OutputFormat::Csv, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("Vendor,Type,Approved"));
        let row = lines.next().unwrap();
        assert!(row.contains("WORKERS COMP INSURANCE; DIR REGISTRATION"));
        assert!(row.contains("2030-01-01; 2031-02-03"));
    }

    #[test]
    fn test_txt_skips_empty_fields() {
        let mut out = Vec::new();
        write_items(&[record()], OutputFormat::Txt, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Vendor: Acme Corp\n"));
        assert!(text.contains("Type: Subcontractor\n"));
        assert!(!text.contains("Phone:"));
    }

    #[test]
    fn test_json_round_trip() {
        let mut out = Vec::new();
        write_items(&[record()], OutputFormat::Json, &mut out).unwrap();
        let parsed: Vec<VendorRecord> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, vec![record()]);
    }
}
