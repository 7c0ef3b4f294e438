//! HTTP client for the Emporia Energy cloud API.
//!
//! Login goes through the vendor's Cognito user pool and yields an id token
//! that is sent as the `authtoken` header on every API call.

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use ecomonitor_core::{MonitorError, Result};

use super::{ChartUsage, EnergyUnit, Scale, VendorApi, VendorChannel, VendorDevice};

pub const DEFAULT_API_ROOT: &str = "https://api.emporiaenergy.com";
pub const DEFAULT_AUTH_ENDPOINT: &str = "https://cognito-idp.us-east-2.amazonaws.com/";
const COGNITO_CLIENT_ID: &str = "4qte47jbstod8apnfic0bunmrq";

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct InitiateAuthResponse {
    #[serde(rename = "AuthenticationResult")]
    authentication_result: Option<AuthenticationResult>,
}

#[derive(Debug, Deserialize)]
struct AuthenticationResult {
    #[serde(rename = "IdToken")]
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct CognitoError {
    #[serde(default)]
    message: Option<String>,
    #[serde(rename = "__type", default)]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DevicesResponse {
    #[serde(default)]
    devices: Vec<VendorDevice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartUsageResponse {
    #[serde(default)]
    usage_list: Vec<Option<f64>>,
    first_usage_instant: DateTime<Utc>,
}

// ── EmporiaClient ─────────────────────────────────────────────────────────────

/// [`VendorApi`] implementation backed by the Emporia REST API.
pub struct EmporiaClient {
    http: Client,
    api_root: String,
    auth_endpoint: String,
    id_token: Option<String>,
}

impl Default for EmporiaClient {
    fn default() -> Self {
        Self::new()
    }
}

impl EmporiaClient {
    pub fn new() -> Self {
        Self::with_endpoints(DEFAULT_API_ROOT, DEFAULT_AUTH_ENDPOINT)
    }

    /// Point the client at alternative hosts (staging, local proxies).
    pub fn with_endpoints(api_root: impl Into<String>, auth_endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_root: api_root.into().trim_end_matches('/').to_string(),
            auth_endpoint: auth_endpoint.into(),
            id_token: None,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.id_token.is_some()
    }

    fn token(&self) -> Result<&str> {
        self.id_token.as_deref().ok_or(MonitorError::NotAuthenticated)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.api_root, path);
        debug!(%url, "emporia request");
        let response = self
            .http
            .get(&url)
            .header("authtoken", self.token()?)
            .query(query)
            .send()
            .await
            .map_err(|e| transport_error(&self.api_root, &e))?;
        let body = success_body(path, response).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl VendorApi for EmporiaClient {
    async fn login(&mut self, email: &str, password: &str) -> Result<()> {
        let body = json!({
            "AuthFlow": "USER_PASSWORD_AUTH",
            "ClientId": COGNITO_CLIENT_ID,
            "AuthParameters": { "USERNAME": email, "PASSWORD": password },
        });

        debug!(email, "emporia login");
        let response = self
            .http
            .post(&self.auth_endpoint)
            .header("X-Amz-Target", "AWSCognitoIdentityProviderService.InitiateAuth")
            .header("Content-Type", "application/x-amz-json-1.1")
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| login_error(&self.auth_endpoint, &e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| login_error(&self.auth_endpoint, &e))?;
        if !status.is_success() {
            let reason = serde_json::from_str::<CognitoError>(&text)
                .ok()
                .and_then(|e| e.message.or(e.kind))
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(MonitorError::Auth(reason));
        }

        let parsed: InitiateAuthResponse = serde_json::from_str(&text)
            .map_err(|e| MonitorError::Auth(format!("unexpected login response: {e}")))?;
        let result = parsed
            .authentication_result
            .ok_or_else(|| MonitorError::Auth("additional verification required".to_string()))?;
        self.id_token = Some(result.id_token);
        Ok(())
    }

    async fn devices(&self) -> Result<Vec<VendorDevice>> {
        let response: DevicesResponse = self.get_json("customers/devices", &[]).await?;
        Ok(response.devices)
    }

    async fn chart_usage(
        &self,
        channel: &VendorChannel,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        scale: Scale,
        unit: EnergyUnit,
    ) -> Result<ChartUsage> {
        let query = [
            ("apiMethod", "getChartUsage".to_string()),
            ("deviceGid", channel.device_gid.to_string()),
            ("channel", channel.channel_num.clone()),
            ("start", start.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ("end", end.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ("scale", scale.as_str().to_string()),
            ("energyUnit", unit.as_str().to_string()),
        ];
        let response: ChartUsageResponse = self.get_json("AppAPI", &query).await?;
        Ok(ChartUsage {
            values: response.usage_list,
            first_instant: response.first_usage_instant,
        })
    }

    fn clear_credentials(&mut self) {
        self.id_token = None;
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Classify a failed send: refused/unresolvable hosts are [`MonitorError::Unreachable`].
fn transport_error(endpoint: &str, err: &reqwest::Error) -> MonitorError {
    if err.is_connect() {
        MonitorError::Unreachable {
            endpoint: endpoint.to_string(),
            reason: err.to_string(),
        }
    } else {
        MonitorError::Transport {
            endpoint: endpoint.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Any failure during the login exchange is an auth error unless the host
/// was unreachable.
fn login_error(endpoint: &str, err: &reqwest::Error) -> MonitorError {
    match transport_error(endpoint, err) {
        e @ MonitorError::Unreachable { .. } => e,
        other => MonitorError::Auth(other.to_string()),
    }
}

async fn success_body(endpoint: &str, response: Response) -> Result<String> {
    let status = response.status();
    let text = response.text().await.map_err(|e| MonitorError::Transport {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })?;
    if status.is_success() {
        Ok(text)
    } else {
        Err(MonitorError::Http {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body: text,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
