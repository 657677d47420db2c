//! Analytics report types and pure rollup helpers.
//!
//! All aggregation queries run in the store; these types carry the
//! results onto the wire, and `conversion_rate` is the one shared
//! computation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::lead::LeadStatus;

/// Per-status lead counts. All five buckets are always present,
/// defaulting to zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct StatusCounts {
    pub new: u64,
    pub contacted: u64,
    pub qualified: u64,
    pub lost: u64,
    pub won: u64,
}

impl StatusCounts {
    pub fn set(&mut self, status: LeadStatus, count: u64) {
        match status {
            LeadStatus::New => self.new = count,
            LeadStatus::Contacted => self.contacted = count,
            LeadStatus::Qualified => self.qualified = count,
            LeadStatus::Lost => self.lost = count,
            LeadStatus::Won => self.won = count,
        }
    }

    pub fn get(&self, status: LeadStatus) -> u64 {
        match status {
            LeadStatus::New => self.new,
            LeadStatus::Contacted => self.contacted,
            LeadStatus::Qualified => self.qualified,
            LeadStatus::Lost => self.lost,
            LeadStatus::Won => self.won,
        }
    }

    pub fn total(&self) -> u64 {
        self.new + self.contacted + self.qualified + self.lost + self.won
    }
}

/// Won / Total × 100, rounded to two decimals. Exactly 0 for an empty
/// total — never NaN.
pub fn conversion_rate(won: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (won as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRef {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPerformance {
    pub agent: AgentRef,
    pub total_leads: u64,
    pub status_counts: StatusCounts,
    pub conversion_rate: f64,
}

/// One day of the creation-count series (`YYYY-MM-DD`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateCount {
    pub date: String,
    pub count: u64,
}

/// One month of the creation trend (`YYYY-MM`), with Won counts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonthCount {
    pub month: String,
    pub count: u64,
    pub won: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceCount {
    pub source: String,
    pub count: u64,
}

/// Admin-only user statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    pub by_role: BTreeMap<String, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_rate_of_empty_total_is_zero() {
        let rate = conversion_rate(0, 0);
        assert_eq!(rate, 0.0);
        assert!(!rate.is_nan());
    }

    #[test]
    fn conversion_rate_one_of_four_is_25() {
        assert_eq!(conversion_rate(1, 4), 25.0);
    }

    #[test]
    fn conversion_rate_rounds_to_two_decimals() {
        // 1/3 = 33.333... -> 33.33
        assert_eq!(conversion_rate(1, 3), 33.33);
        // 2/3 = 66.666... -> 66.67
        assert_eq!(conversion_rate(2, 3), 66.67);
    }

    #[test]
    fn status_counts_buckets_always_serialize() {
        let json = serde_json::to_value(StatusCounts::default()).unwrap();
        for key in ["New", "Contacted", "Qualified", "Lost", "Won"] {
            assert_eq!(json[key], 0, "missing bucket {key}");
        }
    }

    #[test]
    fn status_counts_set_get_total() {
        let mut counts = StatusCounts::default();
        counts.set(LeadStatus::Won, 3);
        counts.set(LeadStatus::New, 2);
        assert_eq!(counts.get(LeadStatus::Won), 3);
        assert_eq!(counts.total(), 5);
    }
}
