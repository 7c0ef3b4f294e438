//! In-memory record store for one dashboard session.
//!
//! The store is filled once per login from a [`CommunityData`] batch and
//! dropped on logout. There is no partial update: a new login builds a new
//! store.

use ecomonitor_core::models::{CommunityData, Dwelling, Resident, UsageRecord};

/// Read-only snapshot of residents, dwellings and usage for a session.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    data: CommunityData,
}

impl RecordStore {
    pub fn new(data: CommunityData) -> Self {
        Self { data }
    }

    pub fn residents(&self) -> &[Resident] {
        &self.data.residents
    }

    pub fn dwellings(&self) -> &[Dwelling] {
        &self.data.dwellings
    }

    pub fn records(&self) -> &[UsageRecord] {
        &self.data.usage
    }

    pub fn is_empty(&self) -> bool {
        self.data.usage.is_empty()
    }

    /// Look up a dwelling by id.
    pub fn dwelling(&self, id: &str) -> Option<&Dwelling> {
        self.data.dwellings.iter().find(|d| d.id == id)
    }

    /// Number of distinct dates covered by the stored records.
    pub fn days_covered(&self) -> usize {
        let mut dates: Vec<&str> = self.data.usage.iter().map(|r| r.date.as_str()).collect();
        dates.sort_unstable();
        dates.dedup();
        dates.len()
    }
}
