//! Data sources that fill the record store.
//!
//! A [`DataSource`] turns a login into a complete [`CommunityData`] batch.
//! Two implementations exist: [`LiveSource`] reshapes the Emporia device
//! hierarchy reached through a [`VendorApi`], and [`SyntheticSource`]
//! generates a reproducible demo community. Consumers are generic over the
//! trait and never learn which one is active.

pub mod emporia;
pub mod live;
pub mod synthetic;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use ecomonitor_core::models::CommunityData;
use ecomonitor_core::Result;

pub use emporia::EmporiaClient;
pub use live::LiveSource;
pub use synthetic::SyntheticSource;

// ── Credentials ───────────────────────────────────────────────────────────────

/// Login details for one session. The password never appears in `Debug`.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ── DataSource ────────────────────────────────────────────────────────────────

/// Something that can produce a community batch for a logged-in user.
#[allow(async_fn_in_trait)]
pub trait DataSource {
    /// Short human-readable name shown in the report header.
    fn label(&self) -> &'static str;

    /// Authenticate and load residents, dwellings and usage in one go.
    ///
    /// Either the whole batch is returned or an error; never a partial
    /// collection set.
    async fn connect(&mut self, credentials: &Credentials) -> Result<CommunityData>;

    /// Forget any cached credential or token.
    fn disconnect(&mut self);
}

// ── Vendor capability ─────────────────────────────────────────────────────────

/// Sampling interval of a chart-usage query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Second,
    Minute,
    Minutes15,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl Scale {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Second => "1S",
            Self::Minute => "1MIN",
            Self::Minutes15 => "15MIN",
            Self::Hour => "1H",
            Self::Day => "1D",
            Self::Week => "1W",
            Self::Month => "1MON",
            Self::Year => "1Y",
        }
    }
}

/// Unit of a chart-usage query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyUnit {
    KilowattHours,
    Dollars,
    AmpHours,
    Voltage,
}

impl EnergyUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KilowattHours => "KilowattHours",
            Self::Dollars => "Dollars",
            Self::AmpHours => "AmpHours",
            Self::Voltage => "Voltage",
        }
    }
}

/// Free-form location metadata attached to a device.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationProperties {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub device_name: Option<String>,
}

/// One measurement channel of a device. Channel `"1,2,3"` is the mains.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorChannel {
    pub device_gid: u64,
    pub channel_num: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A top-level metering device as enumerated by the vendor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorDevice {
    pub device_gid: u64,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub location_properties: Option<LocationProperties>,
    #[serde(default)]
    pub channels: Vec<VendorChannel>,
}

impl VendorDevice {
    /// The device's own name, from the device record or its location.
    pub fn name(&self) -> Option<&str> {
        self.device_name
            .as_deref()
            .or_else(|| {
                self.location_properties
                    .as_ref()
                    .and_then(|l| l.device_name.as_deref())
            })
            .filter(|n| !n.is_empty())
    }

    /// The location's display name, if set.
    pub fn location_name(&self) -> Option<&str> {
        self.location_properties
            .as_ref()
            .and_then(|l| l.display_name.as_deref())
            .filter(|n| !n.is_empty())
    }
}

/// Result of a chart-usage query: one value per interval starting at
/// `first_instant`. Missing intervals are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartUsage {
    pub values: Vec<Option<f64>>,
    pub first_instant: DateTime<Utc>,
}

/// Opaque access to the smart-meter vendor.
#[allow(async_fn_in_trait)]
pub trait VendorApi {
    async fn login(&mut self, email: &str, password: &str) -> Result<()>;

    async fn devices(&self) -> Result<Vec<VendorDevice>>;

    async fn chart_usage(
        &self,
        channel: &VendorChannel,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        scale: Scale,
        unit: EnergyUnit,
    ) -> Result<ChartUsage>;

    fn clear_credentials(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("kyle@example.com", "hunter2");
        let debug = format!("{creds:?}");
        assert!(debug.contains("kyle@example.com"));
        assert!(!debug.contains("hunter2"));
        assert_eq!(creds.password(), "hunter2");
    }

    #[test]
    fn test_scale_and_unit_wire_names() {
        assert_eq!(Scale::Day.as_str(), "1D");
        assert_eq!(Scale::Minutes15.as_str(), "15MIN");
        assert_eq!(EnergyUnit::KilowattHours.as_str(), "KilowattHours");
    }

    #[test]
    fn test_vendor_device_deserializes_and_resolves_names() {
        let json = r#"{
            "deviceGid": 4821,
            "locationProperties": { "displayName": "Oak Treehouse", "deviceName": "Vue 2" },
            "channels": [ { "deviceGid": 4821, "channelNum": "1,2,3", "name": null } ]
        }"#;
        let device: VendorDevice = serde_json::from_str(json).unwrap();

        assert_eq!(device.device_gid, 4821);
        assert_eq!(device.name(), Some("Vue 2"));
        assert_eq!(device.location_name(), Some("Oak Treehouse"));
        assert_eq!(device.channels[0].channel_num, "1,2,3");
    }

    #[test]
    fn test_vendor_device_without_optional_fields() {
        let device: VendorDevice = serde_json::from_str(r#"{ "deviceGid": 7 }"#).unwrap();
        assert!(device.name().is_none());
        assert!(device.location_name().is_none());
        assert!(device.channels.is_empty());
    }
}
