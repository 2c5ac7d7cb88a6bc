//! CSI division and trade catalogue for search filters.

/// One CSI division and the trades filed under it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Division {
    /// Display name, `"NN - Title"`
    pub name: &'static str,
    /// Trades in display order
    pub trades: &'static [&'static str],
}

impl Division {
    /// Leading division number, e.g. `"22"`
    #[must_use]
    pub fn code(&self) -> &'static str {
        self.name.split(" - ").next().unwrap_or(self.name)
    }
}

/// Divisions offered as search filters, in CSI order
pub const DIVISIONS: &[Division] = &[
    Division {
        name: "01 - General Conditions",
        trades: &[
            "Surveying/Staking",
            "Energy Design",
            "Temporary Site Services",
            "SWPPP",
            "Pest Control",
            "Cleaning",
            "Scaffolding",
        ],
    },
    Division {
        name: "02 - Existing Conditions",
        trades: &["Demolition", "Abatement", "Sawcutting & Drilling"],
    },
    Division {
        name: "03 - Concrete",
        trades: &["Concrete", "Gypcrete"],
    },
    Division {
        name: "04 - Masonry",
        trades: &["Masonry"],
    },
    Division {
        name: "05 - Metals",
        trades: &["Structural Steel/Fab", "Metal Decking"],
    },
    Division {
        name: "06 - Wood, Plastics, Composites",
        trades: &["Rough Framing", "Finish Carpentry/Casework"],
    },
    Division {
        name: "07 - Thermal & Moisture Protection",
        trades: &[
            "Insulation",
            "Insulation/Gutters",
            "Waterproofing",
            "Gutters",
            "Sheet Metal/Panels",
            "Roofing",
        ],
    },
    Division {
        name: "08 - Openings",
        trades: &[
            "Windows/Storefront",
            "Automatic Entrance Doors",
            "Doors, Frames, Hardware",
            "Overhead/Specialty Doors",
            "Doors, Cabinets, Millwork",
        ],
    },
    Division {
        name: "09 - Finishes",
        trades: &[
            "Stucco/Plastering",
            "Drywall/Metal Stud Framing",
            "Tiling",
            "Carpet/LVP/Wood Flooring",
            "Epoxy/Sealed Flooring",
            "Acoustical Ceilings",
            "Wall Coverings",
            "Painting",
        ],
    },
    Division {
        name: "10 - Specialties",
        trades: &["Signage", "Toilet Partitions/Accessories", "Fireplaces"],
    },
    Division {
        name: "11 - Equipment",
        trades: &[
            "Food Service Equipment",
            "Walk In Coolers/Freezers",
            "Park Recreation Equipment",
        ],
    },
    Division {
        name: "12 - Furnishings",
        trades: &["Window Coverings", "Solid Surface Countertops"],
    },
    Division {
        name: "13 - Special Construction",
        trades: &["Pool Construction"],
    },
    Division {
        name: "14 - Conveying Equipment",
        trades: &["Elevators"],
    },
    Division {
        name: "21 - Fire Suppression",
        trades: &["Fire Sprinklers"],
    },
    Division {
        name: "22 - Plumbing",
        trades: &["Plumbing"],
    },
    Division {
        name: "23 - HVAC",
        trades: &["HVAC"],
    },
    Division {
        name: "26 - Electrical",
        trades: &["Electrical"],
    },
    Division {
        name: "27 - Communications / 28 - Electronic Safety & Security",
        trades: &["Low Voltage/Security/Fire Alarm"],
    },
    Division {
        name: "31 - Earthwork",
        trades: &["Grading/Paving"],
    },
    Division {
        name: "32 - Exterior Improvements",
        trades: &[
            "Striping",
            "Fencing",
            "Landscaping",
            "Playground Surfacing",
            "Court Surfacing",
        ],
    },
    Division {
        name: "33 - Utilities",
        trades: &["Underground Utilities"],
    },
];

/// Look a division up by full name, number, or part of its title.
///
/// Matching ignores case. An exact name or number wins over a partial match.
#[must_use]
pub fn find_division(query: &str) -> Option<&'static Division> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }

    DIVISIONS
        .iter()
        .find(|d| d.name.to_lowercase() == query || d.code() == query)
        .or_else(|| DIVISIONS.iter().find(|d| d.name.to_lowercase().contains(&query)))
}

/// Trades offered once `division` is selected; `None` for an unknown division
#[must_use]
pub fn trades_for_division(division: &str) -> Option<&'static [&'static str]> {
    find_division(division).map(|d| d.trades)
}

/// Every trade across all divisions, first occurrence order
#[must_use]
pub fn all_trades() -> Vec<&'static str> {
    let mut trades: Vec<&'static str> = Vec::new();
    for trade in DIVISIONS.iter().flat_map(|d| d.trades.iter().copied()) {
        if !trades.contains(&trade) {
            trades.push(trade);
        }
    }
    trades
}

/// True if `trade` names, or is part of, a catalogued trade
#[must_use]
pub fn is_known_trade(trade: &str, division: Option<&str>) -> bool {
    let needle = trade.trim().to_lowercase();
    if needle.is_empty() {
        return false;
    }

    let candidates: Vec<&str> = match division.and_then(trades_for_division) {
        Some(trades) => trades.to_vec(),
        None => all_trades(),
    };
    candidates.iter().any(|t| t.to_lowercase().contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_division_by_code_and_title() {
        assert_eq!(find_division("22").map(|d| d.name), Some("22 - Plumbing"));
        assert_eq!(find_division("hvac").map(|d| d.name), Some("23 - HVAC"));
        assert_eq!(find_division("26 - ELECTRICAL").map(|d| d.name), Some("26 - Electrical"));
        assert!(find_division("99").is_none());
        assert!(find_division("  ").is_none());
    }

    #[test]
    fn test_trades_narrow_to_division() {
        let trades = trades_for_division("09 - Finishes").unwrap();
        assert!(trades.contains(&"Painting"));
        assert!(!trades.contains(&"Plumbing"));
        assert!(is_known_trade("painting", Some("09")));
        assert!(!is_known_trade("Plumbing", Some("09")));
        assert!(is_known_trade("Plumbing", None));
    }

    #[test]
    fn test_all_trades_unique() {
        let trades = all_trades();
        let mut sorted = trades.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), trades.len());
        assert!(trades.contains(&"Underground Utilities"));
    }
}
