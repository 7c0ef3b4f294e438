use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentinel accepted wherever a dwelling selection is parsed.
pub const ALL_DWELLINGS: &str = "all";

/// Display colour used for residents that cannot be resolved.
pub const NEUTRAL_COLOR: &str = "#ccc";

/// Palette cycled by index when assigning colours to discovered meters.
pub const COLOR_PALETTE: [&str; 20] = [
    "#10b981", "#34d399", "#f59e0b", "#fbbf24", "#ef4444", "#3b82f6", "#6366f1", "#8b5cf6",
    "#a78bfa", "#ec4899", "#f472b6", "#14b8a6", "#06b6d4", "#22d3ee", "#f97316", "#84cc16",
    "#64748b", "#94a3b8", "#cbd5e1", "#475569",
];

/// Kind of physical unit a dwelling is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DwellingType {
    #[serde(rename = "Tiny Home")]
    TinyHome,
    Yurt,
    Cabin,
    #[serde(rename = "Main House")]
    MainHouse,
    Earthship,
}

impl DwellingType {
    /// Human-readable label, identical to the serialized form.
    pub fn label(self) -> &'static str {
        match self {
            Self::TinyHome => "Tiny Home",
            Self::Yurt => "Yurt",
            Self::Cabin => "Cabin",
            Self::MainHouse => "Main House",
            Self::Earthship => "Earthship",
        }
    }
}

impl fmt::Display for DwellingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A physical residential unit in the community.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dwelling {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DwellingType,
}

/// A monitored entity (person, group or shared space) with one meter.
///
/// `dwelling_id` is expected to reference a loaded [`Dwelling`], but a
/// dangling reference is tolerated and simply resolves to nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resident {
    pub id: String,
    pub name: String,
    pub dwelling_id: String,
    /// Display hint, a CSS hex colour.
    pub color: String,
}

/// One resident's consumption for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub resident_id: String,
    /// ISO calendar date, `YYYY-MM-DD`.
    pub date: String,
    pub kwh: f64,
}

impl UsageRecord {
    pub fn new(resident_id: impl Into<String>, date: impl Into<String>, kwh: f64) -> Self {
        Self {
            resident_id: resident_id.into(),
            date: date.into(),
            kwh,
        }
    }
}

/// Everything a data source produces for one session.
///
/// The three collections are always loaded and discarded together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommunityData {
    pub residents: Vec<Resident>,
    pub dwellings: Vec<Dwelling>,
    pub usage: Vec<UsageRecord>,
}

/// Which residents a view is restricted to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DwellingFilter {
    #[default]
    All,
    Only(String),
}

impl FromStr for DwellingFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == ALL_DWELLINGS {
            Ok(Self::All)
        } else {
            Ok(Self::Only(s.to_string()))
        }
    }
}

impl fmt::Display for DwellingFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL_DWELLINGS),
            Self::Only(id) => f.write_str(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dwelling_type_serializes_with_display_names() {
        let json = serde_json::to_string(&DwellingType::MainHouse).unwrap();
        assert_eq!(json, "\"Main House\"");
        let parsed: DwellingType = serde_json::from_str("\"Tiny Home\"").unwrap();
        assert_eq!(parsed, DwellingType::TinyHome);
    }

    #[test]
    fn test_dwelling_type_display_matches_label() {
        assert_eq!(DwellingType::Earthship.to_string(), "Earthship");
        assert_eq!(DwellingType::TinyHome.to_string(), "Tiny Home");
    }

    #[test]
    fn test_dwelling_serializes_kind_as_type() {
        let dwelling = Dwelling {
            id: "d1".to_string(),
            name: "Sunrise Yurt".to_string(),
            kind: DwellingType::Yurt,
        };
        let value = serde_json::to_value(&dwelling).unwrap();
        assert_eq!(value["type"], "Yurt");
    }

    #[test]
    fn test_resident_uses_camel_case_keys() {
        let resident = Resident {
            id: "r1".to_string(),
            name: "Kyle".to_string(),
            dwelling_id: "d1".to_string(),
            color: "#10b981".to_string(),
        };
        let value = serde_json::to_value(&resident).unwrap();
        assert_eq!(value["dwellingId"], "d1");
    }

    #[test]
    fn test_dwelling_filter_parses_sentinel() {
        assert_eq!("all".parse::<DwellingFilter>().unwrap(), DwellingFilter::All);
        assert_eq!(
            "d3".parse::<DwellingFilter>().unwrap(),
            DwellingFilter::Only("d3".to_string())
        );
        assert_eq!(DwellingFilter::All.to_string(), "all");
    }

    #[test]
    fn test_palette_has_twenty_entries() {
        assert_eq!(COLOR_PALETTE.len(), 20);
        assert!(COLOR_PALETTE.iter().all(|c| c.starts_with('#')));
    }
}
