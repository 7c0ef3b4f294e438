//! Live data source: reshapes the vendor's device hierarchy into residents,
//! dwellings and daily usage records.
//!
//! Every top-level device becomes one dwelling plus one resident. Usage for
//! all residents is fetched concurrently; a failed fetch is logged and
//! leaves that resident without records instead of aborting the batch.

use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use tracing::{debug, info, warn};

use ecomonitor_core::models::{
    CommunityData, Dwelling, DwellingType, Resident, UsageRecord, COLOR_PALETTE,
};
use ecomonitor_core::{MonitorError, Result};

use super::{ChartUsage, Credentials, DataSource, EnergyUnit, Scale, VendorApi, VendorDevice};

/// Days of history requested per resident.
pub const DEFAULT_HISTORY_DAYS: i64 = 30;

/// [`DataSource`] backed by a [`VendorApi`].
pub struct LiveSource<A> {
    api: A,
    history_days: i64,
}

impl<A: VendorApi> LiveSource<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            history_days: DEFAULT_HISTORY_DAYS,
        }
    }

    pub fn with_history_days(mut self, days: i64) -> Self {
        self.history_days = days;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Enumerate devices and fetch the last `history_days` of usage.
    pub async fn fetch_community(&self) -> Result<CommunityData> {
        self.fetch_community_at(Utc::now()).await
    }

    /// Same as [`fetch_community`](Self::fetch_community) with an explicit
    /// end of the history window.
    pub async fn fetch_community_at(&self, now: DateTime<Utc>) -> Result<CommunityData> {
        let devices = self.api.devices().await?;
        let (dwellings, residents) = map_devices(&devices);
        let start = now - Duration::days(self.history_days);

        info!(devices = devices.len(), "fetching usage for all meters");

        // Wait for every fetch; failures were already absorbed per resident.
        let per_resident = join_all(
            residents
                .iter()
                .map(|resident| self.resident_usage(resident, &devices, start, now)),
        )
        .await;

        let usage: Vec<UsageRecord> = per_resident.into_iter().flatten().collect();
        debug!(records = usage.len(), "usage batch complete");

        Ok(CommunityData {
            residents,
            dwellings,
            usage,
        })
    }

    async fn resident_usage(
        &self,
        resident: &Resident,
        devices: &[VendorDevice],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<UsageRecord> {
        match self.try_resident_usage(resident, devices, start, end).await {
            Ok(records) => records,
            Err(e) => {
                warn!(resident = %resident.name, error = %e, "usage fetch failed");
                Vec::new()
            }
        }
    }

    async fn try_resident_usage(
        &self,
        resident: &Resident,
        devices: &[VendorDevice],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<UsageRecord>> {
        let channel = devices
            .iter()
            .find(|d| d.device_gid.to_string() == resident.id)
            .and_then(|d| d.channels.first());
        let Some(channel) = channel else {
            debug!(resident = %resident.name, "device has no channels");
            return Ok(Vec::new());
        };

        let usage = self
            .api
            .chart_usage(channel, start, end, Scale::Day, EnergyUnit::KilowattHours)
            .await
            .map_err(|e| MonitorError::ResidentFetch {
                resident: resident.name.clone(),
                reason: e.to_string(),
            })?;

        Ok(usage_to_records(&resident.id, &usage))
    }
}

impl<A: VendorApi> DataSource for LiveSource<A> {
    fn label(&self) -> &'static str {
        "Live Emporia API"
    }

    async fn connect(&mut self, credentials: &Credentials) -> Result<CommunityData> {
        self.api
            .login(&credentials.email, credentials.password())
            .await?;
        match self.fetch_community().await {
            Ok(data) => Ok(data),
            Err(e) => {
                self.api.clear_credentials();
                Err(e)
            }
        }
    }

    fn disconnect(&mut self) {
        self.api.clear_credentials();
    }
}

/// One dwelling and one resident per device, colours cycled by index.
pub fn map_devices(devices: &[VendorDevice]) -> (Vec<Dwelling>, Vec<Resident>) {
    devices
        .iter()
        .enumerate()
        .map(|(index, device)| {
            let id = device.device_gid.to_string();
            let dwelling_id = format!("d-{id}");
            let name = device
                .name()
                .map_or_else(|| format!("Meter {id}"), str::to_string);
            let dwelling = Dwelling {
                id: dwelling_id.clone(),
                name: device.location_name().map_or_else(|| name.clone(), str::to_string),
                kind: DwellingType::TinyHome,
            };
            let resident = Resident {
                id,
                name,
                dwelling_id,
                color: COLOR_PALETTE[index % COLOR_PALETTE.len()].to_string(),
            };
            (dwelling, resident)
        })
        .unzip()
}

/// Value `i` belongs to the UTC calendar day `first_instant + i days`;
/// missing values count as zero.
pub fn usage_to_records(resident_id: &str, usage: &ChartUsage) -> Vec<UsageRecord> {
    usage
        .values
        .iter()
        .enumerate()
        .map(|(offset, kwh)| {
            let day = usage.first_instant + Duration::days(offset as i64);
            UsageRecord::new(
                resident_id,
                day.date_naive().format("%Y-%m-%d").to_string(),
                kwh.unwrap_or(0.0),
            )
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
