use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::DwellingFilter;

/// Default file name for CSV exports.
pub const DEFAULT_EXPORT_FILE: &str = "eco_village_usage.csv";

/// Default Gemini model used for the insights view.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Community electricity usage dashboard for the eco-village
#[derive(Parser, Debug, Clone)]
#[command(
    name = "ecomonitor",
    about = "Community electricity usage dashboard for the eco-village",
    version
)]
pub struct Settings {
    /// What to show
    #[arg(long, default_value = "overview", value_parser = ["overview", "daily", "monthly", "totals", "export", "insights"])]
    pub view: String,

    /// Use simulated data instead of the Emporia API
    #[arg(long)]
    pub demo: bool,

    /// Emporia account email
    #[arg(long)]
    pub email: Option<String>,

    /// Emporia account password
    #[arg(long, env = "EMPORIA_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Dwelling id to restrict the view to, or "all"
    #[arg(long, default_value = "all")]
    pub dwelling: String,

    /// Days of history covered by the report (1-365)
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u32).range(1..=365))]
    pub days: u32,

    /// Seed for the simulated data generator
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Destination of the CSV export
    #[arg(long, default_value = DEFAULT_EXPORT_FILE)]
    pub output: PathBuf,

    /// Gemini API key used by the insights view
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini model used by the insights view
    #[arg(long, default_value = DEFAULT_GEMINI_MODEL)]
    pub gemini_model: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.ecomonitor/last_used.json`.
///
/// Secrets (password, API key) are never written here.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dwelling: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".ecomonitor").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation – accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!(error = %e, "could not remove saved configuration");
            }
            return settings.apply_debug_flag();
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins.
        if !is_arg_explicitly_set(&matches, "view") {
            if let Some(v) = last.view {
                settings.view = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "email") && settings.email.is_none() {
            settings.email = last.email;
        }
        if !is_arg_explicitly_set(&matches, "dwelling") {
            if let Some(v) = last.dwelling {
                settings.dwelling = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "days") {
            if let Some(v) = last.days {
                settings.days = v;
            }
        }

        settings = settings.apply_debug_flag();

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::debug!(error = %e, "could not persist last-used settings");
        }

        settings
    }

    /// The dwelling selection as a typed filter.
    pub fn dwelling_filter(&self) -> DwellingFilter {
        match self.dwelling.parse() {
            Ok(filter) => filter,
            Err(never) => match never {},
        }
    }

    /// `--debug` overrides the log level.
    fn apply_debug_flag(mut self) -> Self {
        if self.debug {
            self.log_level = "DEBUG".to_string();
        }
        self
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            view: Some(s.view.clone()),
            email: s.email.clone(),
            dwelling: Some(s.dwelling.clone()),
            days: Some(s.days),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
