//! Usage aggregation by dwelling, resident and calendar period.
//!
//! Everything here is a pure function over borrowed slices; the record store
//! is never mutated.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use ecomonitor_core::formatting::round_to;
use ecomonitor_core::models::{
    Dwelling, DwellingFilter, DwellingType, Resident, UsageRecord, NEUTRAL_COLOR,
};

/// Daily average above which a resident is rated [`Efficiency::High`].
pub const HIGH_USAGE_KWH_PER_DAY: f64 = 10.0;

/// Daily average above which a resident is rated [`Efficiency::Moderate`].
pub const MODERATE_USAGE_KWH_PER_DAY: f64 = 6.0;

// ── Output rows ───────────────────────────────────────────────────────────────

/// One chart row: a date and the kWh of every resident that reported on it.
///
/// Residents without a record on `date` have no key in `usage`; consumers
/// must render that as a gap, not as zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRow {
    pub date: String,
    pub usage: BTreeMap<String, f64>,
}

/// Per-resident kWh summed over one calendar month (`YYYY-MM`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRow {
    pub month: String,
    pub usage: BTreeMap<String, f64>,
}

/// A resident's consumption over the whole record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResidentTotal {
    pub id: String,
    pub name: String,
    /// Rounded to one decimal.
    pub total: f64,
    pub color: String,
}

/// Headline figures shown above the charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardOverview {
    pub total_kwh: f64,
    pub active_meters: usize,
    pub highest_user: Option<String>,
}

/// Coarse rating of a resident's daily average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Efficiency {
    Efficient,
    Moderate,
    High,
}

impl Efficiency {
    /// Rate a daily average given in kWh.
    pub fn from_daily_average(kwh_per_day: f64) -> Self {
        if kwh_per_day > HIGH_USAGE_KWH_PER_DAY {
            Self::High
        } else if kwh_per_day > MODERATE_USAGE_KWH_PER_DAY {
            Self::Moderate
        } else {
            Self::Efficient
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Efficient => "Efficient",
            Self::Moderate => "Moderate",
            Self::High => "High",
        }
    }
}

/// One row of the community breakdown table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownRow {
    pub resident_id: String,
    pub name: String,
    pub color: String,
    pub dwelling_name: Option<String>,
    pub dwelling_type: Option<DwellingType>,
    pub total: f64,
    /// Rounded to one decimal.
    pub daily_avg: f64,
    pub efficiency: Efficiency,
}

// ── UsageAggregator ───────────────────────────────────────────────────────────

/// Stateless helper that filters and groups usage records.
pub struct UsageAggregator;

impl UsageAggregator {
    /// Residents living in the selected dwelling, or all of them.
    pub fn filter_by_dwelling(residents: &[Resident], filter: &DwellingFilter) -> Vec<Resident> {
        match filter {
            DwellingFilter::All => residents.to_vec(),
            DwellingFilter::Only(id) => residents
                .iter()
                .filter(|r| &r.dwelling_id == id)
                .cloned()
                .collect(),
        }
    }

    /// Records belonging to any of `resident_ids`, in input order.
    pub fn filter_records_by_residents<S: AsRef<str>>(
        records: &[UsageRecord],
        resident_ids: &[S],
    ) -> Vec<UsageRecord> {
        let wanted: HashSet<&str> = resident_ids.iter().map(|id| id.as_ref()).collect();
        records
            .iter()
            .filter(|r| wanted.contains(r.resident_id.as_str()))
            .cloned()
            .collect()
    }

    /// Convenience: the residents and records visible under `filter`.
    pub fn select(
        residents: &[Resident],
        records: &[UsageRecord],
        filter: &DwellingFilter,
    ) -> (Vec<Resident>, Vec<UsageRecord>) {
        let visible = Self::filter_by_dwelling(residents, filter);
        let ids: Vec<&str> = visible.iter().map(|r| r.id.as_str()).collect();
        let records = Self::filter_records_by_residents(records, &ids[..]);
        (visible, records)
    }

    /// One row per distinct date, ascending.
    ///
    /// ISO dates are fixed width, so string order is chronological. A
    /// repeated `(resident, date)` pair keeps the later record's value.
    pub fn to_daily_series(records: &[UsageRecord]) -> Vec<DailyRow> {
        let mut by_date: BTreeMap<&str, BTreeMap<String, f64>> = BTreeMap::new();
        for record in records {
            by_date
                .entry(record.date.as_str())
                .or_default()
                .insert(record.resident_id.clone(), record.kwh);
        }
        by_date
            .into_iter()
            .map(|(date, usage)| DailyRow {
                date: date.to_string(),
                usage,
            })
            .collect()
    }

    /// One row per calendar month, ascending, with kWh summed per resident.
    pub fn to_monthly_series(records: &[UsageRecord]) -> Vec<MonthlyRow> {
        let mut by_month: BTreeMap<&str, BTreeMap<String, f64>> = BTreeMap::new();
        for record in records {
            let month = record.date.get(..7).unwrap_or(record.date.as_str());
            *by_month
                .entry(month)
                .or_default()
                .entry(record.resident_id.clone())
                .or_insert(0.0) += record.kwh;
        }
        by_month
            .into_iter()
            .map(|(month, usage)| MonthlyRow {
                month: month.to_string(),
                usage,
            })
            .collect()
    }

    /// Total kWh per resident, largest first.
    ///
    /// Sums are taken at full precision and rounded to one decimal. Unknown
    /// resident ids fall back to the raw id and [`NEUTRAL_COLOR`]. Equal
    /// totals keep the order in which the residents first appear in
    /// `records`.
    pub fn to_resident_totals(
        records: &[UsageRecord],
        residents: &[Resident],
    ) -> Vec<ResidentTotal> {
        let mut order: Vec<&str> = Vec::new();
        let mut sums: HashMap<&str, f64> = HashMap::new();
        for record in records {
            let id = record.resident_id.as_str();
            match sums.get_mut(id) {
                Some(sum) => *sum += record.kwh,
                None => {
                    order.push(id);
                    sums.insert(id, record.kwh);
                }
            }
        }

        let lookup: HashMap<&str, &Resident> =
            residents.iter().map(|r| (r.id.as_str(), r)).collect();

        let mut totals: Vec<ResidentTotal> = order
            .into_iter()
            .map(|id| {
                let resident = lookup.get(id);
                ResidentTotal {
                    id: id.to_string(),
                    name: resident.map_or_else(|| id.to_string(), |r| r.name.clone()),
                    total: round_to(sums[id], 1),
                    color: resident
                        .map_or_else(|| NEUTRAL_COLOR.to_string(), |r| r.color.clone()),
                }
            })
            .collect();

        // `sort_by` is stable, which preserves encounter order on ties.
        totals.sort_by(|a, b| b.total.total_cmp(&a.total));
        totals
    }

    /// Headline figures for the visible residents.
    pub fn overview(totals: &[ResidentTotal], visible_residents: &[Resident]) -> DashboardOverview {
        DashboardOverview {
            total_kwh: totals.iter().map(|t| t.total).sum(),
            active_meters: visible_residents.len(),
            highest_user: totals.first().map(|t| t.name.clone()),
        }
    }

    /// Table rows joining each total to its dwelling, with a daily average
    /// over `period_days` and an efficiency rating.
    pub fn community_breakdown(
        totals: &[ResidentTotal],
        residents: &[Resident],
        dwellings: &[Dwelling],
        period_days: u32,
    ) -> Vec<BreakdownRow> {
        totals
            .iter()
            .map(|total| {
                let dwelling = residents
                    .iter()
                    .find(|r| r.id == total.id)
                    .and_then(|r| dwellings.iter().find(|d| d.id == r.dwelling_id));
                let daily_avg = if period_days == 0 {
                    0.0
                } else {
                    round_to(total.total / f64::from(period_days), 1)
                };
                BreakdownRow {
                    resident_id: total.id.clone(),
                    name: total.name.clone(),
                    color: total.color.clone(),
                    dwelling_name: dwelling.map(|d| d.name.clone()),
                    dwelling_type: dwelling.map(|d| d.kind),
                    total: total.total,
                    daily_avg,
                    efficiency: Efficiency::from_daily_average(daily_avg),
                }
            })
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn resident(id: &str, name: &str, dwelling: &str) -> Resident {
        Resident {
            id: id.to_string(),
            name: name.to_string(),
            dwelling_id: dwelling.to_string(),
            color: format!("#{id}"),
        }
    }

    fn dwelling(id: &str, name: &str, kind: DwellingType) -> Dwelling {
        Dwelling {
            id: id.to_string(),
            name: name.to_string(),
            kind,
        }
    }

    fn example_records() -> Vec<UsageRecord> {
        vec![
            UsageRecord::new("r1", "2024-01-01", 5.0),
            UsageRecord::new("r1", "2024-01-02", 3.0),
            UsageRecord::new("r2", "2024-01-01", 2.0),
        ]
    }

    fn example_residents() -> Vec<Resident> {
        vec![
            resident("r1", "Kyle", "d1"),
            resident("r2", "Sarah", "d1"),
            resident("r3", "Marcus", "d2"),
        ]
    }

    // ── filter_by_dwelling ────────────────────────────────────────────────────

    #[test]
    fn test_filter_by_dwelling_all_returns_everyone() {
        let residents = example_residents();
        let filtered = UsageAggregator::filter_by_dwelling(&residents, &DwellingFilter::All);
        assert_eq!(filtered, residents);
    }

    #[test]
    fn test_filter_by_dwelling_exact_match() {
        let filtered = UsageAggregator::filter_by_dwelling(
            &example_residents(),
            &DwellingFilter::Only("d2".to_string()),
        );
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "r3");
    }

    #[test]
    fn test_filter_by_unknown_dwelling_yields_empty_views() {
        let (visible, records) = UsageAggregator::select(
            &example_residents(),
            &example_records(),
            &DwellingFilter::Only("d99".to_string()),
        );
        assert!(visible.is_empty());
        assert!(records.is_empty());
        assert!(UsageAggregator::to_daily_series(&records).is_empty());
        assert!(UsageAggregator::to_resident_totals(&records, &visible).is_empty());
    }

    // ── filter_records_by_residents ───────────────────────────────────────────

    #[test]
    fn test_filter_records_keeps_input_order() {
        let records = UsageAggregator::filter_records_by_residents(&example_records(), &["r1"][..]);
        let dates: Vec<&str> = records.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-01-01", "2024-01-02"]);
    }

    // ── to_daily_series ───────────────────────────────────────────────────────

    #[test]
    fn test_daily_series_example() {
        let series = UsageAggregator::to_daily_series(&example_records());

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, "2024-01-01");
        assert_eq!(series[0].usage.get("r1"), Some(&5.0));
        assert_eq!(series[0].usage.get("r2"), Some(&2.0));
        assert_eq!(series[1].date, "2024-01-02");
        assert_eq!(series[1].usage.get("r1"), Some(&3.0));
        // Missing resident is a gap, not a zero.
        assert!(!series[1].usage.contains_key("r2"));
    }

    #[test]
    fn test_daily_series_sorted_and_one_row_per_date() {
        let records = vec![
            UsageRecord::new("r1", "2024-02-10", 1.0),
            UsageRecord::new("r2", "2024-01-31", 1.0),
            UsageRecord::new("r1", "2024-02-01", 1.0),
            UsageRecord::new("r2", "2024-02-10", 1.0),
        ];
        let series = UsageAggregator::to_daily_series(&records);
        let dates: Vec<&str> = series.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-01-31", "2024-02-01", "2024-02-10"]);
    }

    #[test]
    fn test_daily_series_duplicate_pair_keeps_later_value() {
        let records = vec![
            UsageRecord::new("r1", "2024-01-01", 5.0),
            UsageRecord::new("r1", "2024-01-01", 7.5),
        ];
        let series = UsageAggregator::to_daily_series(&records);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].usage.get("r1"), Some(&7.5));
    }

    #[test]
    fn test_daily_series_empty() {
        assert!(UsageAggregator::to_daily_series(&[]).is_empty());
    }

    // ── to_monthly_series ─────────────────────────────────────────────────────

    #[test]
    fn test_monthly_series_sums_per_resident() {
        let records = vec![
            UsageRecord::new("r1", "2024-01-30", 2.0),
            UsageRecord::new("r1", "2024-01-31", 3.0),
            UsageRecord::new("r1", "2024-02-01", 4.0),
            UsageRecord::new("r2", "2024-02-01", 1.5),
        ];
        let months = UsageAggregator::to_monthly_series(&records);

        assert_eq!(months.len(), 2);
        assert_eq!(months[0].month, "2024-01");
        assert_eq!(months[0].usage.get("r1"), Some(&5.0));
        assert!(!months[0].usage.contains_key("r2"));
        assert_eq!(months[1].month, "2024-02");
        assert_eq!(months[1].usage.get("r2"), Some(&1.5));
    }

    // ── to_resident_totals ────────────────────────────────────────────────────

    #[test]
    fn test_resident_totals_example() {
        let totals = UsageAggregator::to_resident_totals(&example_records(), &example_residents());

        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].id, "r1");
        assert_eq!(totals[0].name, "Kyle");
        assert_eq!(totals[0].total, 8.0);
        assert_eq!(totals[1].id, "r2");
        assert_eq!(totals[1].total, 2.0);
    }

    #[test]
    fn test_resident_totals_unknown_resident_falls_back() {
        let records = vec![UsageRecord::new("ghost", "2024-01-01", 1.0)];
        let totals = UsageAggregator::to_resident_totals(&records, &example_residents());
        assert_eq!(totals[0].name, "ghost");
        assert_eq!(totals[0].color, NEUTRAL_COLOR);
    }

    #[test]
    fn test_resident_totals_round_after_summing() {
        let records = vec![
            UsageRecord::new("r1", "2024-01-01", 0.04),
            UsageRecord::new("r1", "2024-01-02", 0.04),
        ];
        let totals = UsageAggregator::to_resident_totals(&records, &example_residents());
        // 0.08 rounds to 0.1; rounding each value first would give 0.0.
        assert_eq!(totals[0].total, 0.1);
    }

    #[test]
    fn test_resident_totals_ties_keep_encounter_order() {
        let records = vec![
            UsageRecord::new("r3", "2024-01-01", 4.0),
            UsageRecord::new("r1", "2024-01-01", 4.0),
            UsageRecord::new("r2", "2024-01-01", 9.0),
        ];
        let totals = UsageAggregator::to_resident_totals(&records, &example_residents());
        let ids: Vec<&str> = totals.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["r2", "r3", "r1"]);
    }

    #[test]
    fn test_resident_totals_match_record_sum() {
        let records: Vec<UsageRecord> = (0..30)
            .flat_map(|day| {
                let date = format!("2024-03-{:02}", day + 1);
                vec![
                    UsageRecord::new("r1", date.clone(), 3.17 + day as f64 * 0.01),
                    UsageRecord::new("r2", date.clone(), 7.33),
                    UsageRecord::new("r3", date, 0.51),
                ]
            })
            .collect();
        let totals = UsageAggregator::to_resident_totals(&records, &example_residents());

        let from_totals: f64 = totals.iter().map(|t| t.total).sum();
        let from_records: f64 = records.iter().map(|r| r.kwh).sum();
        assert!((from_totals - from_records).abs() <= 0.1 * totals.len() as f64);
    }

    #[test]
    fn test_resident_totals_empty() {
        assert!(UsageAggregator::to_resident_totals(&[], &example_residents()).is_empty());
    }

    // ── overview ──────────────────────────────────────────────────────────────

    #[test]
    fn test_overview() {
        let residents = example_residents();
        let totals = UsageAggregator::to_resident_totals(&example_records(), &residents);
        let overview = UsageAggregator::overview(&totals, &residents);

        assert_eq!(overview.total_kwh, 10.0);
        assert_eq!(overview.active_meters, 3);
        assert_eq!(overview.highest_user.as_deref(), Some("Kyle"));
    }

    #[test]
    fn test_overview_empty() {
        let overview = UsageAggregator::overview(&[], &[]);
        assert_eq!(overview.total_kwh, 0.0);
        assert_eq!(overview.active_meters, 0);
        assert!(overview.highest_user.is_none());
    }

    // ── community_breakdown ───────────────────────────────────────────────────

    #[test]
    fn test_efficiency_thresholds() {
        assert_eq!(Efficiency::from_daily_average(10.1), Efficiency::High);
        assert_eq!(Efficiency::from_daily_average(10.0), Efficiency::Moderate);
        assert_eq!(Efficiency::from_daily_average(6.1), Efficiency::Moderate);
        assert_eq!(Efficiency::from_daily_average(6.0), Efficiency::Efficient);
        assert_eq!(Efficiency::from_daily_average(0.0), Efficiency::Efficient);
    }

    #[test]
    fn test_community_breakdown_joins_dwelling() {
        let residents = example_residents();
        let dwellings = vec![dwelling("d1", "Sunrise Yurt", DwellingType::Yurt)];
        let totals = vec![
            ResidentTotal {
                id: "r1".to_string(),
                name: "Kyle".to_string(),
                total: 330.0,
                color: "#r1".to_string(),
            },
            ResidentTotal {
                id: "r3".to_string(),
                name: "Marcus".to_string(),
                total: 90.0,
                color: "#r3".to_string(),
            },
        ];

        let rows = UsageAggregator::community_breakdown(&totals, &residents, &dwellings, 30);

        assert_eq!(rows[0].dwelling_name.as_deref(), Some("Sunrise Yurt"));
        assert_eq!(rows[0].dwelling_type, Some(DwellingType::Yurt));
        assert_eq!(rows[0].daily_avg, 11.0);
        assert_eq!(rows[0].efficiency, Efficiency::High);
        // r3 lives in d2, which is not loaded.
        assert!(rows[1].dwelling_name.is_none());
        assert_eq!(rows[1].daily_avg, 3.0);
        assert_eq!(rows[1].efficiency, Efficiency::Efficient);
    }

    #[test]
    fn test_community_breakdown_zero_days() {
        let totals = vec![ResidentTotal {
            id: "r1".to_string(),
            name: "Kyle".to_string(),
            total: 12.0,
            color: "#r1".to_string(),
        }];
        let rows = UsageAggregator::community_breakdown(&totals, &[], &[], 0);
        assert_eq!(rows[0].daily_avg, 0.0);
    }
}
