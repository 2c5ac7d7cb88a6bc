//! Certificate collation and vendor approval.
//!
//! Groups certificate tuples by vendor name, resolves every expiration, and
//! derives one [`VendorRecord`] per vendor with its approval verdict.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime};

use crate::dates::{resolve, Resolution};
use crate::models::{CertificateTuple, VendorRecord, VendorTypeCode};

/// Certificates that must all be valid for a vendor to be approved.
pub const REQUIRED_CERTIFICATES: [&str; 4] = [
    "WORKERS COMP INSURANCE",
    "GENERAL LIABILITY INSURANCE",
    "AUTO LIABILITY INSURANCE",
    "UMBRELLA LIABILITY",
];

/// Default "soon to expire" window in days.
pub const DEFAULT_SOON_WINDOW_DAYS: i64 = 30;

/// Canonical form used when comparing certificate names
#[must_use]
pub fn certificate_key(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Builds vendor records from certificate tuples.
#[derive(Debug, Clone)]
pub struct Collator {
    required: HashSet<String>,
    soon_window_days: i64,
}

impl Default for Collator {
    fn default() -> Self {
        Self::new(DEFAULT_SOON_WINDOW_DAYS)
    }
}

impl Collator {
    /// Collator with the standard required set and the given warning window
    #[must_use]
    pub fn new(soon_window_days: i64) -> Self {
        Self {
            required: REQUIRED_CERTIFICATES.iter().map(|c| certificate_key(c)).collect(),
            soon_window_days,
        }
    }

    /// True if `valid_names` covers every required certificate
    #[must_use]
    pub fn is_approved<'a, I>(&self, valid_names: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let held: HashSet<String> = valid_names.into_iter().map(certificate_key).collect();
        held.is_superset(&self.required)
    }

    /// Days until `soonest` if it falls inside the warning window
    #[must_use]
    pub fn soon_to_expire(&self, soonest: Option<NaiveDate>, now: NaiveDateTime) -> Option<i64> {
        let days = (soonest? - now.date()).num_days();
        (0..=self.soon_window_days).contains(&days).then_some(days)
    }

    /// Collate tuples into one record per vendor, in first-seen order.
    ///
    /// Tuples without a vendor name are ignored.
    #[must_use]
    pub fn collate(&self, tuples: &[CertificateTuple], now: NaiveDateTime) -> Vec<VendorRecord> {
        let mut order: Vec<&str> = Vec::new();
        let mut groups: HashMap<&str, Vec<&CertificateTuple>> = HashMap::new();

        for tuple in tuples {
            let Some(name) = tuple.vendor_name.as_deref() else {
                continue;
            };
            groups
                .entry(name)
                .or_insert_with(|| {
                    order.push(name);
                    Vec::new()
                })
                .push(tuple);
        }

        order
            .into_iter()
            .filter_map(|name| groups.get(name).map(|group| self.collate_group(name, group, now)))
            .collect()
    }

    fn collate_group(&self, name: &str, group: &[&CertificateTuple], now: NaiveDateTime) -> VendorRecord {
        let mut valid_certificates = Vec::new();
        let mut expiration_dates = Vec::new();
        let mut expired_certificates = Vec::new();

        for tuple in group {
            match resolve(tuple.expires_raw.as_deref(), now) {
                Resolution::Valid(date) => {
                    valid_certificates.push(tuple.certificate_name.clone());
                    expiration_dates.push(date);
                }
                Resolution::Expired(_) | Resolution::Unreadable => {
                    expired_certificates.push(tuple.certificate_name.clone());
                }
            }
        }

        let soonest_expiration = expiration_dates.iter().min().copied();
        let approved = self.is_approved(valid_certificates.iter().map(String::as_str));
        let first = group.first();

        VendorRecord {
            vendor_name: name.to_string(),
            soon_to_expire_days: self.soon_to_expire(soonest_expiration, now),
            valid_certificates,
            expired_certificates,
            expiration_dates,
            soonest_expiration,
            approved,
            vendor_type: first.and_then(|t| t.vendor_type).unwrap_or(VendorTypeCode::Unknown),
            contact: first.and_then(|t| t.contact.clone()),
            phone: first.and_then(|t| t.phone.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap().and_hms_opt(9, 30, 0).unwrap()
    }

    fn tuple(vendor: &str, cert: &str, expires: &str) -> CertificateTuple {
        CertificateTuple {
            vendor_type: Some(VendorTypeCode::Subcontractor),
            vendor_name: Some(vendor.to_string()),
            certificate_name: cert.to_string(),
            project_ref: Some("100".to_string()),
            expires_raw: Some(expires.to_string()),
            contact: Some(format!("{vendor} contact")),
            phone: None,
        }
    }

    fn mdy(date: NaiveDate) -> String {
        date.format("%m/%d/%Y").to_string()
    }

    #[test]
    fn test_missing_valid_auto_liability_not_approved() {
        let tuples = vec![
            tuple("X", "WORKERS COMP INSURANCE", "01/01/2030"),
            tuple("X", "GENERAL LIABILITY INSURANCE", "01/01/2030"),
            tuple("X", "AUTO LIABILITY INSURANCE", "01/01/2020"),
        ];
        let records = Collator::default().collate(&tuples, now());
        assert_eq!(records.len(), 1);
        assert!(!records[0].approved);
        assert_eq!(records[0].expired_certificates, vec!["AUTO LIABILITY INSURANCE"]);
        assert_eq!(records[0].valid_certificates.len(), 2);
    }

    #[test]
    fn test_all_required_valid_is_approved() {
        let tuples = vec![
            tuple("X", "WORKERS COMP INSURANCE", "03/01/2030"),
            tuple("X", "general liability insurance ", "02/01/2030"),
            tuple("X", "AUTO LIABILITY INSURANCE", "04/01/2030"),
            tuple("X", "UMBRELLA LIABILITY", "05/01/2030"),
            tuple("X", "EQUIPMENT FLOATER", "01/01/2020"),
        ];
        let record = &Collator::default().collate(&tuples, now())[0];
        assert!(record.approved);
        assert_eq!(record.soonest_expiration, NaiveDate::from_ymd_opt(2030, 2, 1));
        assert_eq!(record.expiration_dates.len(), record.valid_certificates.len());
        assert_eq!(record.soon_to_expire_days, None);
    }

    #[test]
    fn test_soon_to_expire_window_edges() {
        let collator = Collator::default();
        let thirty = now().date() + Duration::days(30);
        let thirty_one = now().date() + Duration::days(31);

        let record = &collator.collate(&[tuple("X", "DIR REGISTRATION", &mdy(thirty))], now())[0];
        assert_eq!(record.soon_to_expire_days, Some(30));

        let record = &collator.collate(&[tuple("X", "DIR REGISTRATION", &mdy(thirty_one))], now())[0];
        assert_eq!(record.soon_to_expire_days, None);

        assert_eq!(collator.soon_to_expire(None, now()), None);
    }

    #[test]
    fn test_groups_by_exact_name_in_first_seen_order() {
        let tuples = vec![
            tuple("Zeta", "DIR REGISTRATION", "01/01/2030"),
            tuple("Acme", "DIR REGISTRATION", "01/01/2030"),
            tuple("ACME", "DIR REGISTRATION", "01/01/2030"),
            tuple("Zeta", "UMBRELLA LIABILITY", "not a date"),
        ];
        let records = Collator::default().collate(&tuples, now());
        let names: Vec<&str> = records.iter().map(|r| r.vendor_name.as_str()).collect();
        assert_eq!(names, ["Zeta", "Acme", "ACME"]);
        assert_eq!(records[0].expired_certificates, vec!["UMBRELLA LIABILITY"]);
        assert_eq!(records[0].contact.as_deref(), Some("Zeta contact"));
    }

    #[test]
    fn test_vendor_with_only_expired_certificates() {
        let records = Collator::default().collate(&[tuple("X", "DIR REGISTRATION", "01/01/2020")], now());
        assert!(records[0].valid_certificates.is_empty());
        assert_eq!(records[0].soonest_expiration, None);
        assert!(!records[0].approved);
    }
}
