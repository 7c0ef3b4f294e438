//! Natural-language insights over the community's usage.
//!
//! The records are condensed into a [`Digest`], embedded in a fixed prompt
//! and handed to a [`TextGenerator`]. [`SummaryRequester::request_summary`]
//! never fails: an empty reply or any service error turns into a fixed
//! user-facing message.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use ecomonitor_core::settings::DEFAULT_GEMINI_MODEL;
use ecomonitor_core::{MonitorError, Result};
use ecomonitor_data::digest::Digest;

/// Returned when the service answers with no text.
pub const EMPTY_RESPONSE_MESSAGE: &str = "Unable to generate insights at this time.";

/// Returned when the service cannot be used at all.
pub const FAILURE_MESSAGE: &str =
    "Sorry, I couldn't analyze the data right now. Please ensure the API key is valid.";

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

// ── TextGenerator ─────────────────────────────────────────────────────────────

/// A hosted language model that answers a single prompt.
#[allow(async_fn_in_trait)]
pub trait TextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

// ── Prompt ────────────────────────────────────────────────────────────────────

/// Render the analysis prompt for a digest.
pub fn build_prompt(digest: &Digest) -> String {
    format!(
        "You are an energy efficiency expert for an eco-conscious community.
Here is the energy usage summary for the last month (in kWh):

Community Total: {total:.1} kWh

Resident Breakdown:
{breakdown}

Please provide a concise analysis in 3 short paragraphs:
1. Identify the top 3 highest consumers and potential reasons (e.g., heating, old appliances) based on general knowledge of domestic energy.
2. Suggest 3 specific, actionable community-wide tips to reduce overall consumption.
3. Give a positive encouragement about their eco-efforts.

Keep the tone friendly, encouraging, but data-driven.
",
        total = digest.community_total_kwh,
        breakdown = digest.residents_json(),
    )
}

// ── SummaryRequester ──────────────────────────────────────────────────────────

pub struct SummaryRequester<G> {
    generator: G,
}

impl<G: TextGenerator> SummaryRequester<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// Ask for insights on `digest`. Always yields displayable text.
    pub async fn request_summary(&self, digest: &Digest) -> String {
        let prompt = build_prompt(digest);
        tracing::debug!(chars = prompt.len(), "requesting insights");

        match self.generator.generate(&prompt).await {
            Ok(text) if text.trim().is_empty() => EMPTY_RESPONSE_MESSAGE.to_string(),
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "insights request failed");
                FAILURE_MESSAGE.to_string()
            }
        }
    }
}

// ── GeminiClient ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Text parts of the first candidate, concatenated.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
            .unwrap_or_default()
    }
}

/// [`TextGenerator`] backed by the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, model: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            model: model.unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| MonitorError::Service("no Gemini API key configured".to_string()))?;

        let request = GenerateRequest {
            contents: [Content {
                parts: [RequestPart { text: prompt }],
            }],
        };
        let endpoint = self.endpoint();
        tracing::debug!(model = %self.model, "gemini request");

        let response = self
            .http
            .post(&endpoint)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| MonitorError::Service(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MonitorError::Service(e.to_string()))?;
        if !status.is_success() {
            return Err(MonitorError::Http {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)?;
        Ok(parsed.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecomonitor_data::digest::ResidentDigest;

    enum Reply {
        Text(&'static str),
        Fail,
    }

    struct FakeGenerator(Reply);

    impl TextGenerator for FakeGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            assert!(prompt.contains("Community Total"));
            match self.0 {
                Reply::Text(text) => Ok(text.to_string()),
                Reply::Fail => Err(MonitorError::Service("quota exceeded".to_string())),
            }
        }
    }

    fn digest() -> Digest {
        Digest {
            community_total_kwh: 10.0,
            residents: vec![
                ResidentDigest {
                    name: "Kyle".to_string(),
                    total_kwh: 8.0,
                    daily_avg: 4.0,
                },
                ResidentDigest {
                    name: "Sarah".to_string(),
                    total_kwh: 2.0,
                    daily_avg: 2.0,
                },
            ],
        }
    }

    #[test]
    fn test_prompt_embeds_total_and_breakdown() {
        let prompt = build_prompt(&digest());
        assert!(prompt.contains("Community Total: 10.0 kWh"));
        assert!(prompt.contains("\"name\": \"Kyle\""));
        assert!(prompt.contains("\"totalKwh\": 8.0"));
        assert!(prompt.contains("top 3 highest consumers"));
        assert!(prompt.contains("actionable community-wide tips"));
        assert!(prompt.contains("positive encouragement"));
    }

    #[tokio::test]
    async fn test_summary_passes_text_through() {
        let requester = SummaryRequester::new(FakeGenerator(Reply::Text("All good.")));
        assert_eq!(requester.request_summary(&digest()).await, "All good.");
    }

    #[tokio::test]
    async fn test_empty_reply_uses_placeholder() {
        let requester = SummaryRequester::new(FakeGenerator(Reply::Text("")));
        assert_eq!(
            requester.request_summary(&digest()).await,
            EMPTY_RESPONSE_MESSAGE
        );
    }

    #[tokio::test]
    async fn test_failure_never_raises() {
        let requester = SummaryRequester::new(FakeGenerator(Reply::Fail));
        assert_eq!(requester.request_summary(&digest()).await, FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn test_gemini_without_key_falls_back() {
        let client = GeminiClient::new(Some("   ".to_string()), None);
        let err = client.generate("hi").await.unwrap_err();
        assert!(matches!(err, MonitorError::Service(_)));

        let requester = SummaryRequester::new(client);
        assert_eq!(requester.request_summary(&digest()).await, FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn test_gemini_unreachable_falls_back() {
        let client = GeminiClient::new(Some("key".to_string()), None)
            .with_base_url("http://127.0.0.1:1");
        let requester = SummaryRequester::new(client);
        assert_eq!(requester.request_summary(&digest()).await, FAILURE_MESSAGE);
    }

    #[test]
    fn test_endpoint_uses_model() {
        let client = GeminiClient::new(None, Some("gemini-pro".to_string()))
            .with_base_url("http://localhost/");
        assert_eq!(
            client.endpoint(),
            "http://localhost/v1beta/models/gemini-pro:generateContent"
        );
    }

    #[test]
    fn test_response_text_concatenates_first_candidate() {
        let json = r#"{
            "candidates": [
                { "content": { "parts": [ { "text": "Hello " }, { "text": "village." } ] } },
                { "content": { "parts": [ { "text": "ignored" } ] } }
            ]
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.text(), "Hello village.");
    }

    #[test]
    fn test_response_without_candidates_is_empty() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.text(), "");
    }
}
