//! Condensed per-resident statistics sent to the insights service in place
//! of the raw records.

use std::collections::HashMap;

use serde::Serialize;

use ecomonitor_core::formatting::round_to;
use ecomonitor_core::models::{Resident, UsageRecord};

/// One resident's line in the digest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidentDigest {
    pub name: String,
    /// Rounded to one decimal.
    pub total_kwh: f64,
    /// Average per day with a record, rounded to one decimal; 0 with no records.
    pub daily_avg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Digest {
    /// Sum of the rounded resident totals.
    pub community_total_kwh: f64,
    pub residents: Vec<ResidentDigest>,
}

impl Digest {
    /// Pretty JSON of the resident breakdown, as embedded in prompts.
    pub fn residents_json(&self) -> String {
        serde_json::to_string_pretty(&self.residents).unwrap_or_else(|_| "[]".to_string())
    }
}

/// Build the digest with one entry per resident, in resident order.
pub fn build_digest(records: &[UsageRecord], residents: &[Resident]) -> Digest {
    let mut sums: HashMap<&str, (f64, usize)> = HashMap::new();
    for record in records {
        let entry = sums.entry(record.resident_id.as_str()).or_insert((0.0, 0));
        entry.0 += record.kwh;
        entry.1 += 1;
    }

    let residents: Vec<ResidentDigest> = residents
        .iter()
        .map(|resident| {
            let (total, days) = sums.get(resident.id.as_str()).copied().unwrap_or((0.0, 0));
            let avg = if days > 0 { total / days as f64 } else { 0.0 };
            ResidentDigest {
                name: resident.name.clone(),
                total_kwh: round_to(total, 1),
                daily_avg: round_to(avg, 1),
            }
        })
        .collect();

    Digest {
        community_total_kwh: residents.iter().map(|r| r.total_kwh).sum(),
        residents,
    }
}
