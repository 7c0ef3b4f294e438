mod bootstrap;
mod report;

use anyhow::{anyhow, Result};
use ecomonitor_core::models::DwellingFilter;
use ecomonitor_core::settings::Settings;
use ecomonitor_data::aggregator::UsageAggregator;
use ecomonitor_data::digest::build_digest;
use ecomonitor_data::export::export_csv;
use ecomonitor_data::source::{Credentials, DataSource, EmporiaClient, LiveSource, SyntheticSource};
use ecomonitor_runtime::session::Session;
use ecomonitor_runtime::summary::{GeminiClient, SummaryRequester};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("Eco-Village Monitor v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "View: {}, Dwelling: {}, Days: {}, Demo: {}",
        settings.view,
        settings.dwelling,
        settings.days,
        settings.demo
    );

    if settings.demo {
        let source = SyntheticSource::new(settings.days, settings.seed);
        let email = settings.email.clone().unwrap_or_default();
        run(Session::new(source), &settings, Credentials::new(email, "")).await
    } else {
        let email = settings
            .email
            .clone()
            .ok_or_else(|| anyhow!("--email is required (or run with --demo)"))?;
        let password = settings
            .password
            .clone()
            .ok_or_else(|| anyhow!("--password or EMPORIA_PASSWORD is required"))?;
        let source =
            LiveSource::new(EmporiaClient::new()).with_history_days(i64::from(settings.days));
        run(Session::new(source), &settings, Credentials::new(email, password)).await
    }
}

async fn run<S: DataSource>(
    mut session: Session<S>,
    settings: &Settings,
    credentials: Credentials,
) -> Result<()> {
    session.login(&credentials).await?;
    let store = session
        .store()
        .ok_or_else(|| anyhow!("session has no data after login"))?;

    if store.is_empty() {
        tracing::warn!("no usage records were loaded");
    }

    let filter = settings.dwelling_filter();
    if let DwellingFilter::Only(id) = &filter {
        if store.dwelling(id).is_none() {
            tracing::warn!(dwelling = %id, "unknown dwelling; nothing will match");
        }
    }
    let (visible, records) = UsageAggregator::select(store.residents(), store.records(), &filter);

    match settings.view.as_str() {
        "overview" => {
            let totals = UsageAggregator::to_resident_totals(&records, &visible);
            let overview = UsageAggregator::overview(&totals, &visible);
            let breakdown = UsageAggregator::community_breakdown(
                &totals,
                &visible,
                store.dwellings(),
                settings.days,
            );
            println!(
                "{}",
                report::render_overview(
                    session.label(),
                    store.days_covered(),
                    &overview,
                    &breakdown
                )
            );
        }

        "daily" => {
            let rows = UsageAggregator::to_daily_series(&records);
            println!("{}", report::render_daily(&rows, &visible));
        }

        "monthly" => {
            let rows = UsageAggregator::to_monthly_series(&records);
            println!("{}", report::render_monthly(&rows, &visible));
        }

        "totals" => {
            let totals = UsageAggregator::to_resident_totals(&records, &visible);
            println!("{}", report::render_totals(&totals));
        }

        "export" => {
            let rows = export_csv(&settings.output, &records, store.residents(), store.dwellings())?;
            println!("Exported {} rows to {}", rows, settings.output.display());
        }

        "insights" => {
            // Insights always cover the whole community.
            let digest = build_digest(store.records(), store.residents());
            let client = GeminiClient::new(
                settings.gemini_api_key.clone(),
                Some(settings.gemini_model.clone()),
            );
            let summary = SummaryRequester::new(client).request_summary(&digest).await;
            println!("{summary}");
        }

        unknown => {
            eprintln!("Unknown view mode: {}", unknown);
        }
    }

    session.logout();
    Ok(())
}
