//! Plain-text tables for each dashboard view.
//!
//! Every renderer returns the finished text so it can be printed or
//! compared in tests. Missing daily values are shown as `-`, never as zero.

use ecomonitor_core::formatting::{format_kwh, format_number, percentage};
use ecomonitor_core::models::Resident;
use ecomonitor_data::aggregator::{BreakdownRow, DailyRow, DashboardOverview, MonthlyRow, ResidentTotal};

const GAP: &str = "-";

/// Headline cards followed by the community breakdown table.
pub fn render_overview(
    source_label: &str,
    days_covered: usize,
    overview: &DashboardOverview,
    breakdown: &[BreakdownRow],
) -> String {
    let mut lines = vec![
        format!("Eco-Village Energy Dashboard ({source_label})"),
        String::new(),
        format!("Total Consumption : {}", format_kwh(overview.total_kwh)),
        format!("Active Meters     : {}", overview.active_meters),
        format!("Days Covered      : {days_covered}"),
        format!(
            "Highest User      : {}",
            overview.highest_user.as_deref().unwrap_or(GAP)
        ),
        String::new(),
    ];

    if breakdown.is_empty() {
        lines.push(no_data());
        return lines.join("\n");
    }

    lines.push(format!(
        "{:<20} {:<18} {:<11} {:>14} {:>10} {:>7}  {}",
        "Resident", "Dwelling", "Type", "Total", "Daily Avg", "Share", "Efficiency"
    ));
    for row in breakdown {
        lines.push(format!(
            "{:<20} {:<18} {:<11} {:>14} {:>10} {:>6}%  {}",
            row.name,
            row.dwelling_name.as_deref().unwrap_or(GAP),
            row.dwelling_type.map_or(GAP, |t| t.label()),
            format_kwh(row.total),
            format_number(row.daily_avg, 1),
            format_number(percentage(row.total, overview.total_kwh, 1), 1),
            row.efficiency.label(),
        ));
    }
    lines.join("\n")
}

/// Date-by-resident table of daily kWh.
pub fn render_daily(rows: &[DailyRow], residents: &[Resident]) -> String {
    let periods: Vec<_> = rows.iter().map(|r| (r.date.as_str(), &r.usage)).collect();
    render_series("Date", &periods, residents)
}

/// Month-by-resident table of summed kWh.
pub fn render_monthly(rows: &[MonthlyRow], residents: &[Resident]) -> String {
    let periods: Vec<_> = rows.iter().map(|r| (r.month.as_str(), &r.usage)).collect();
    render_series("Month", &periods, residents)
}

/// Residents ranked by total consumption.
pub fn render_totals(totals: &[ResidentTotal]) -> String {
    if totals.is_empty() {
        return no_data();
    }
    let mut lines = vec![format!("{:>3}  {:<20} {:>14}", "#", "Resident", "Total")];
    for (rank, total) in totals.iter().enumerate() {
        lines.push(format!(
            "{:>3}  {:<20} {:>14}",
            rank + 1,
            total.name,
            format_kwh(total.total)
        ));
    }
    lines.join("\n")
}

pub fn no_data() -> String {
    "No usage data found.".to_string()
}

fn render_series(
    period_header: &str,
    periods: &[(&str, &std::collections::BTreeMap<String, f64>)],
    residents: &[Resident],
) -> String {
    if periods.is_empty() {
        return no_data();
    }

    let mut header = format!("{period_header:<10}");
    for resident in residents {
        header.push_str(&format!(" {:>12}", truncate(&resident.name, 12)));
    }

    let mut lines = vec![header];
    for (label, usage) in periods {
        let mut line = format!("{label:<10}");
        for resident in residents {
            let cell = usage
                .get(&resident.id)
                .map_or_else(|| GAP.to_string(), |kwh| format_number(*kwh, 2));
            line.push_str(&format!(" {cell:>12}"));
        }
        lines.push(line);
    }
    lines.join("\n")
}

fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        name.to_string()
    } else {
        let mut short: String = name.chars().take(width - 1).collect();
        short.push('…');
        short
    }
}
