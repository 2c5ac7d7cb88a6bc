//! Company name normalization.
//!
//! Produces the matching key used to join certificate records with vendor
//! details. The same function is registered with SQLite as
//! `normalize_company`, so database joins and in-memory merges always agree.

/// Legal-entity suffixes stripped from the end of a normalized name.
pub const LEGAL_SUFFIXES: [&str; 9] = [
    " INC",
    " LLC",
    " LIMITED",
    " CORP",
    " CORPORATION",
    " COMPANY",
    " LP",
    " PARTNERS",
    " PLC",
];

/// Canonicalize a company name into its matching key.
///
/// Uppercases, removes `,` `.` `-`, trims, and strips trailing legal-entity
/// suffixes. Suffix stripping repeats until none remains, which keeps the
/// function idempotent for names like `"ACME INC INC"`.
#[must_use]
pub fn normalize_company(name: &str) -> String {
    let mut norm: String = name
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| !matches!(c, ',' | '.' | '-'))
        .collect();

    loop {
        let trimmed = norm.trim();
        match LEGAL_SUFFIXES.iter().find(|suffix| trimmed.ends_with(*suffix)) {
            Some(suffix) => norm = trimmed[..trimmed.len() - suffix.len()].to_string(),
            None => break,
        }
    }

    norm.trim().to_string()
}

/// Normalize an optional name; `None` yields an empty key.
#[must_use]
pub fn normalize_optional(name: Option<&str>) -> String {
    name.map(normalize_company).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_punctuation_and_suffix() {
        assert_eq!(normalize_company("ACME, Inc."), "ACME");
        assert_eq!(normalize_company("ACME, Inc."), normalize_company("ACME INC"));
    }

    #[test]
    fn test_empty_and_none() {
        assert_eq!(normalize_company(""), "");
        assert_eq!(normalize_company("   "), "");
        assert_eq!(normalize_optional(None), "");
    }

    #[test]
    fn test_suffix_needs_word_boundary() {
        // "ZINC" ends with "INC" but not " INC"
        assert_eq!(normalize_company("Zinc"), "ZINC");
        assert_eq!(normalize_company("Bay Area Plumbing LP"), "BAY AREA PLUMBING");
    }

    #[test]
    fn test_hyphen_removed_inside_name() {
        assert_eq!(normalize_company("Tri-Valley Electric Co."), "TRIVALLEY ELECTRIC CO");
    }

    #[test]
    fn test_trailing_separator_before_suffix() {
        assert_eq!(normalize_company("Acme Inc ."), "ACME");
        assert_eq!(normalize_company(" acme corporation "), "ACME");
    }

    #[test]
    fn test_repeated_suffix_is_stable() {
        let once = normalize_company("Acme Corp Inc");
        assert_eq!(once, "ACME");
        assert_eq!(normalize_company(&once), once);
    }
}
