//! Reproducible demo community.
//!
//! Twelve dwellings and twenty residents with daily usage shaped by
//! dwelling type, a slow seasonal wave, per-day noise and occasional
//! spikes. Noise and spikes come from a SHA-256 of `(seed, resident, date)`
//! so the same seed always yields the same batch.

use chrono::{Duration, Local, NaiveDate};
use sha2::{Digest, Sha256};
use tracing::info;

use ecomonitor_core::formatting::round_to;
use ecomonitor_core::models::{CommunityData, Dwelling, DwellingType, Resident, UsageRecord};
use ecomonitor_core::Result;

use super::{Credentials, DataSource};

pub const DEFAULT_DAYS: u32 = 30;
pub const DEFAULT_SEED: u64 = 42;

const MIN_DAILY_KWH: f64 = 0.5;
const SPIKE_KWH: f64 = 3.0;
const SPIKE_THRESHOLD: f64 = 0.85;

const DWELLINGS: [(&str, &str, DwellingType); 12] = [
    ("d1", "Sunrise Yurt", DwellingType::Yurt),
    ("d2", "Creekside Cabin", DwellingType::Cabin),
    ("d3", "The Barn", DwellingType::MainHouse),
    ("d4", "Oak Treehouse", DwellingType::TinyHome),
    ("d5", "Garden Studio", DwellingType::TinyHome),
    ("d6", "North Earthship", DwellingType::Earthship),
    ("d7", "South Earthship", DwellingType::Earthship),
    ("d8", "Hilltop Dome", DwellingType::Yurt),
    ("d9", "Meadow Cottage", DwellingType::Cabin),
    ("d10", "Forest A-Frame", DwellingType::Cabin),
    ("d11", "Solar Shed", DwellingType::TinyHome),
    ("d12", "Community Hub", DwellingType::MainHouse),
];

// (id, name, dwelling, colour)
const RESIDENTS: [(&str, &str, &str, &str); 20] = [
    ("r1", "Kyle (You)", "d1", "#10b981"),
    ("r2", "Sarah", "d1", "#34d399"),
    ("r3", "Marcus", "d2", "#f59e0b"),
    ("r4", "Elena", "d2", "#fbbf24"),
    ("r5", "The Communes", "d3", "#ef4444"),
    ("r6", "Liam", "d4", "#3b82f6"),
    ("r7", "Noah", "d5", "#6366f1"),
    ("r8", "Emma", "d6", "#8b5cf6"),
    ("r9", "Oliver", "d6", "#a78bfa"),
    ("r10", "James", "d7", "#ec4899"),
    ("r11", "Sophia", "d7", "#f472b6"),
    ("r12", "William", "d8", "#14b8a6"),
    ("r13", "Lucas", "d9", "#06b6d4"),
    ("r14", "Mia", "d9", "#22d3ee"),
    ("r15", "Benjamin", "d10", "#f97316"),
    ("r16", "Elijah", "d11", "#84cc16"),
    ("r17", "Community Kitchen", "d12", "#64748b"),
    ("r18", "Guest Room 1", "d12", "#94a3b8"),
    ("r19", "Guest Room 2", "d12", "#cbd5e1"),
    ("r20", "Workshop", "d12", "#475569"),
];

/// Typical daily kWh for a dwelling type.
pub fn base_usage(kind: DwellingType) -> f64 {
    match kind {
        DwellingType::MainHouse => 15.0,
        DwellingType::Cabin => 8.0,
        DwellingType::Earthship => 4.0,
        DwellingType::Yurt => 5.0,
        DwellingType::TinyHome => 3.0,
    }
}

pub fn demo_dwellings() -> Vec<Dwelling> {
    DWELLINGS
        .iter()
        .map(|&(id, name, kind)| Dwelling {
            id: id.to_string(),
            name: name.to_string(),
            kind,
        })
        .collect()
}

pub fn demo_residents() -> Vec<Resident> {
    RESIDENTS
        .iter()
        .map(|&(id, name, dwelling_id, color)| Resident {
            id: id.to_string(),
            name: name.to_string(),
            dwelling_id: dwelling_id.to_string(),
            color: color.to_string(),
        })
        .collect()
}

/// [`DataSource`] that ignores credentials and generates the demo batch.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    days: u32,
    seed: u64,
    today: Option<NaiveDate>,
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new(DEFAULT_DAYS, DEFAULT_SEED)
    }
}

impl SyntheticSource {
    pub fn new(days: u32, seed: u64) -> Self {
        Self {
            days,
            seed,
            today: None,
        }
    }

    /// Pin the last generated day instead of using the local date.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Generate the full community batch.
    pub fn generate(&self) -> CommunityData {
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        let dwellings = demo_dwellings();
        let residents = demo_residents();

        let mut usage = Vec::with_capacity((self.days as usize + 1) * residents.len());
        for i in (0..=self.days).rev() {
            let date = (today - Duration::days(i64::from(i)))
                .format("%Y-%m-%d")
                .to_string();
            let seasonal = 1.0 + (f64::from(i) / 10.0).sin() * 0.2;

            for resident in &residents {
                let kind = dwellings
                    .iter()
                    .find(|d| d.id == resident.dwelling_id)
                    .map_or(DwellingType::TinyHome, |d| d.kind);
                let (noise, spike) = self.jitter(&resident.id, &date);

                let mut kwh = (base_usage(kind) + noise) * seasonal;
                if spike > SPIKE_THRESHOLD {
                    kwh += SPIKE_KWH;
                }
                usage.push(UsageRecord::new(
                    resident.id.as_str(),
                    date.as_str(),
                    round_to(kwh, 2).max(MIN_DAILY_KWH),
                ));
            }
        }

        Self::log_generated(&usage);
        CommunityData {
            residents,
            dwellings,
            usage,
        }
    }

    /// Noise in `[-1, 1)` and a spike draw in `[0, 1)` for one resident-day.
    fn jitter(&self, resident_id: &str, date: &str) -> (f64, f64) {
        let mut hasher = Sha256::new();
        hasher.update(self.seed.to_le_bytes());
        hasher.update(resident_id.as_bytes());
        hasher.update(b"|");
        hasher.update(date.as_bytes());
        let hash = hasher.finalize();

        let noise = unit_interval(&hash[0..8]) * 2.0 - 1.0;
        let spike = unit_interval(&hash[8..16]);
        (noise, spike)
    }

    fn log_generated(usage: &[UsageRecord]) {
        info!(records = usage.len(), "generated demo usage");
    }
}

/// Map eight hash bytes onto `[0, 1)` using the top 53 bits.
fn unit_interval(bytes: &[u8]) -> f64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    (u64::from_le_bytes(buf) >> 11) as f64 / (1u64 << 53) as f64
}

impl DataSource for SyntheticSource {
    fn label(&self) -> &'static str {
        "Simulation"
    }

    async fn connect(&mut self, _credentials: &Credentials) -> Result<CommunityData> {
        Ok(self.generate())
    }

    fn disconnect(&mut self) {}
}
