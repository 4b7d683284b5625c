use crate::domain::complaint::Complaint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Derived SLA view of a complaint. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaStatus {
    pub breached: bool,
    pub remaining_minutes: i64,
    pub deadline: DateTime<Utc>,
    pub total_duration_minutes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlaClassification {
    Breached,
    Warning,
    Met,
    OnTrack,
    /// Not enough data to evaluate. Must not be shown as on track.
    Unknown,
}

impl SlaClassification {
    pub fn label(&self) -> &'static str {
        match self {
            SlaClassification::Breached => "SLA BREACHED",
            SlaClassification::Warning => "SLA WARNING",
            SlaClassification::Met => "SLA MET",
            SlaClassification::OnTrack => "ON TRACK",
            SlaClassification::Unknown => "N/A",
        }
    }
}

/// A department whose catalog SLA hours disagree with the duration the
/// evaluator actually applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaPolicyMismatch {
    pub department_id: i64,
    pub department_name: &'static str,
    pub department_sla_hours: i64,
    pub applied_hours: i64,
}

/// Complaint paired with everything a badge needs to render its SLA.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintSla {
    pub complaint: Complaint,
    pub sla: Option<SlaStatus>,
    pub classification: SlaClassification,
    pub remaining_label: String,
    pub policy_mismatch: Option<SlaPolicyMismatch>,
}
