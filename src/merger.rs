//! Query-time merge of certificate records with vendor details.
//!
//! Records are joined on [`normalize_company`], which is looser than the
//! collator's exact-name grouping so legal names and DBA names can meet.
//! Records whose keys still differ stay separate; no fuzzy matching happens
//! here.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::collator::certificate_key;
use crate::models::{MergedVendorView, VendorDetailsRecord, VendorRecord};
use crate::normalize::normalize_company;

/// One record contributing to a merged view.
#[derive(Debug, Clone, Copy)]
pub enum MergeSource<'a> {
    /// Collated certificate status
    Certificates(&'a VendorRecord),
    /// Vendor details
    Details(&'a VendorDetailsRecord),
}

impl MergeSource<'_> {
    fn name(&self) -> &str {
        match self {
            Self::Certificates(record) => &record.vendor_name,
            Self::Details(details) => &details.company_name,
        }
    }
}

/// Merge certificate records and details, certificate records first.
#[must_use]
pub fn merge_records(vendors: &[VendorRecord], details: &[VendorDetailsRecord]) -> Vec<MergedVendorView> {
    merge_sources(
        vendors
            .iter()
            .map(MergeSource::Certificates)
            .chain(details.iter().map(MergeSource::Details)),
    )
}

/// Merge records in the given order, one view per normalized key.
///
/// Views come out in the order their key was first seen. Records whose name
/// normalizes to an empty key are skipped.
pub fn merge_sources<'a, I>(sources: I) -> Vec<MergedVendorView>
where
    I: IntoIterator<Item = MergeSource<'a>>,
{
    let mut views: Vec<MergedVendorView> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for source in sources {
        let key = normalize_company(source.name());
        if key.is_empty() {
            continue;
        }

        let slot = *index.entry(key.clone()).or_insert_with(|| {
            views.push(MergedVendorView {
                key,
                ..MergedVendorView::default()
            });
            views.len() - 1
        });

        match source {
            MergeSource::Certificates(record) => absorb_certificates(&mut views[slot], record),
            MergeSource::Details(details) => absorb_details(&mut views[slot], details),
        }
    }

    views
}

fn absorb_certificates(view: &mut MergedVendorView, record: &VendorRecord) {
    fill(&mut view.vendor_name, Some(&record.vendor_name));

    for (name, date) in record.valid_certificates.iter().zip(&record.expiration_dates) {
        union_certificate(view, name, *date);
    }
    for name in &record.expired_certificates {
        if !view
            .expired_certificates
            .iter()
            .any(|existing| certificate_key(existing) == certificate_key(name))
        {
            view.expired_certificates.push(name.clone());
        }
    }

    view.soonest_expiration = view.expiration_dates.iter().min().copied();
    view.soon_to_expire_days = match (view.soon_to_expire_days, record.soon_to_expire_days) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };
    view.approved |= record.approved;
    if view.vendor_type.is_none() {
        view.vendor_type = Some(record.vendor_type);
    }
    fill(&mut view.contact, record.contact.as_ref());
    fill(&mut view.phone, record.phone.as_ref());
}

/// Add a valid certificate, keeping the earlier date when it repeats.
fn union_certificate(view: &mut MergedVendorView, name: &str, date: NaiveDate) {
    let key = certificate_key(name);
    match view.certificates.iter().position(|existing| certificate_key(existing) == key) {
        Some(i) => view.expiration_dates[i] = view.expiration_dates[i].min(date),
        None => {
            view.certificates.push(name.to_string());
            view.expiration_dates.push(date);
        }
    }
}

fn absorb_details(view: &mut MergedVendorView, details: &VendorDetailsRecord) {
    fill(&mut view.company_name, Some(&details.company_name));
    fill(&mut view.division, details.division.as_ref());
    fill(&mut view.trade, details.trade.as_ref());
    fill(&mut view.contact_name, details.contact_name.as_ref());
    fill(&mut view.cell_number, details.cell_number.as_ref());
    fill(&mut view.office_number, details.office_number.as_ref());
    fill(&mut view.email, details.email.as_ref());
    fill(&mut view.address, details.address.as_ref());
    fill(&mut view.ca_license, details.ca_license.as_ref());
    fill(&mut view.dir_number, details.dir_number.as_ref());
    fill(&mut view.dvbe, details.dvbe.as_ref());
}

/// First non-empty value wins.
fn fill(slot: &mut Option<String>, value: Option<&String>) {
    let has_value = slot.as_deref().is_some_and(|s| !s.trim().is_empty());
    if has_value {
        return;
    }
    if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
        *slot = Some(v.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VendorTypeCode;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(name: &str, certs: &[(&str, NaiveDate)], approved: bool) -> VendorRecord {
        VendorRecord {
            vendor_name: name.to_string(),
            valid_certificates: certs.iter().map(|(c, _)| (*c).to_string()).collect(),
            expired_certificates: Vec::new(),
            expiration_dates: certs.iter().map(|(_, d)| *d).collect(),
            soonest_expiration: certs.iter().map(|(_, d)| *d).min(),
            approved,
            soon_to_expire_days: None,
            vendor_type: VendorTypeCode::Subcontractor,
            contact: None,
            phone: Some("555-0000".to_string()),
        }
    }

    fn details(name: &str) -> VendorDetailsRecord {
        VendorDetailsRecord {
            company_name: name.to_string(),
            division: Some("22 - Plumbing".to_string()),
            trade: Some("Plumbing".to_string()),
            email: Some("office@acme.test".to_string()),
            ..VendorDetailsRecord::default()
        }
    }

    #[test]
    fn test_disjoint_certificates_are_unioned() {
        let a = record("Acme, Inc.", &[("WORKERS COMP INSURANCE", date(2030, 1, 1))], true);
        let b = record(
            "ACME INC",
            &[
                ("GENERAL LIABILITY INSURANCE", date(2030, 2, 1)),
                ("AUTO LIABILITY INSURANCE", date(2029, 3, 1)),
            ],
            false,
        );
        let merged = merge_records(&[a, b], &[]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].certificates.len(), 3);
        assert_eq!(merged[0].expiration_dates.len(), 3);
        assert!(merged[0].approved);
        assert_eq!(merged[0].soonest_expiration, Some(date(2029, 3, 1)));
    }

    #[test]
    fn test_union_does_not_depend_on_order() {
        let a = record("Acme", &[("DIR REGISTRATION", date(2030, 1, 1)), ("EQUIPMENT FLOATER", date(2031, 1, 1))], false);
        let b = record("ACME", &[("equipment floater", date(2030, 6, 1))], false);

        let forward = merge_records(&[a.clone(), b.clone()], &[]);
        let backward = merge_records(&[b, a], &[]);

        let mut f = forward[0].certificates_by_expiration()
            .into_iter()
            .map(|(c, d)| (certificate_key(c), d))
            .collect::<Vec<_>>();
        let mut r = backward[0].certificates_by_expiration()
            .into_iter()
            .map(|(c, d)| (certificate_key(c), d))
            .collect::<Vec<_>>();
        f.sort();
        r.sort();
        assert_eq!(f, r);
        assert_eq!(f.len(), 2);
        assert!(f.contains(&("EQUIPMENT FLOATER".to_string(), date(2030, 6, 1))));
    }

    #[test]
    fn test_details_join_on_normalized_name() {
        let merged = merge_records(
            &[record("Acme Plumbing, LLC", &[("DIR REGISTRATION", date(2030, 1, 1))], false)],
            &[details("ACME PLUMBING")],
        );
        assert_eq!(merged.len(), 1);
        let view = &merged[0];
        assert_eq!(view.vendor_name.as_deref(), Some("Acme Plumbing, LLC"));
        assert_eq!(view.company_name.as_deref(), Some("ACME PLUMBING"));
        assert_eq!(view.division.as_deref(), Some("22 - Plumbing"));
        assert_eq!(view.phone.as_deref(), Some("555-0000"));
        assert_eq!(view.display_name(), "Acme Plumbing, LLC");
    }

    #[test]
    fn test_details_only_vendor() {
        let merged = merge_records(&[], &[details("Solo Drywall")]);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].certificates.is_empty());
        assert!(merged[0].expired_certificates.is_empty());
        assert!(!merged[0].approved);
        assert_eq!(merged[0].display_name(), "Solo Drywall");
    }

    #[test]
    fn test_first_non_empty_scalar_wins() {
        let mut first = details("Acme");
        first.email = Some("  ".to_string());
        first.trade = None;
        let mut second = details("Acme Inc");
        second.email = Some("second@acme.test".to_string());
        second.trade = Some("Painting".to_string());
        second.division = Some("09 - Finishes".to_string());

        let merged = merge_records(&[], &[first, second]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].email.as_deref(), Some("second@acme.test"));
        assert_eq!(merged[0].trade.as_deref(), Some("Painting"));
        assert_eq!(merged[0].division.as_deref(), Some("22 - Plumbing"));
    }

    #[test]
    fn test_typo_names_stay_separate() {
        let merged = merge_records(&[record("Acme Corp", &[], false)], &[details("Acmee Corp")]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_empty_key_skipped() {
        let merged = merge_records(&[record(" , ", &[], true)], &[]);
        assert!(merged.is_empty());
    }
}
