use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplaintStatus {
    #[serde(alias = "PENDING")]
    Submitted,
    Assigned,
    InProgress,
    Resolved,
    Approved,
    Rejected,
    Closed,
    Reopened,
}

impl ComplaintStatus {
    pub const ALL: [ComplaintStatus; 8] = [
        ComplaintStatus::Submitted,
        ComplaintStatus::Assigned,
        ComplaintStatus::InProgress,
        ComplaintStatus::Resolved,
        ComplaintStatus::Approved,
        ComplaintStatus::Rejected,
        ComplaintStatus::Closed,
        ComplaintStatus::Reopened,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Submitted => "SUBMITTED",
            ComplaintStatus::Assigned => "ASSIGNED",
            ComplaintStatus::InProgress => "IN_PROGRESS",
            ComplaintStatus::Resolved => "RESOLVED",
            ComplaintStatus::Approved => "APPROVED",
            ComplaintStatus::Rejected => "REJECTED",
            ComplaintStatus::Closed => "CLOSED",
            ComplaintStatus::Reopened => "REOPENED",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ComplaintStatus::Submitted => "Submitted",
            ComplaintStatus::Assigned => "Assigned",
            ComplaintStatus::InProgress => "In Progress",
            ComplaintStatus::Resolved => "Resolved",
            ComplaintStatus::Approved => "Approved",
            ComplaintStatus::Rejected => "Rejected",
            ComplaintStatus::Closed => "Closed",
            ComplaintStatus::Reopened => "Reopened",
        }
    }

    /// Statuses at which the SLA clock stops (pinned to `updated_at`).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ComplaintStatus::Resolved | ComplaintStatus::Closed | ComplaintStatus::Rejected
        )
    }

    /// Statuses that count as the SLA being met when not breached.
    pub fn counts_as_met(&self) -> bool {
        matches!(
            self,
            ComplaintStatus::Resolved | ComplaintStatus::Approved | ComplaintStatus::Closed
        )
    }

    /// Next status in the normal lifecycle, if any.
    pub fn next(&self) -> Option<ComplaintStatus> {
        match self {
            ComplaintStatus::Submitted => Some(ComplaintStatus::Assigned),
            ComplaintStatus::Assigned => Some(ComplaintStatus::InProgress),
            ComplaintStatus::InProgress => Some(ComplaintStatus::Resolved),
            ComplaintStatus::Resolved => Some(ComplaintStatus::Approved),
            ComplaintStatus::Approved => Some(ComplaintStatus::Closed),
            ComplaintStatus::Reopened => Some(ComplaintStatus::Assigned),
            ComplaintStatus::Closed | ComplaintStatus::Rejected => None,
        }
    }

    pub fn can_reopen(&self) -> bool {
        matches!(self, ComplaintStatus::Closed)
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplaintStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUBMITTED" | "PENDING" => Ok(ComplaintStatus::Submitted),
            "ASSIGNED" => Ok(ComplaintStatus::Assigned),
            "IN_PROGRESS" => Ok(ComplaintStatus::InProgress),
            "RESOLVED" => Ok(ComplaintStatus::Resolved),
            "APPROVED" => Ok(ComplaintStatus::Approved),
            "REJECTED" => Ok(ComplaintStatus::Rejected),
            "CLOSED" => Ok(ComplaintStatus::Closed),
            "REOPENED" => Ok(ComplaintStatus::Reopened),
            other => Err(format!("Unknown complaint status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Critical => "CRITICAL",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Critical => "Critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Priority::Low),
            "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            "CRITICAL" => Ok(Priority::Critical),
            other => Err(format!("Unknown priority: {}", other)),
        }
    }
}

/// Complaint snapshot as returned by the portal backend.
///
/// Only the fields the client core reads are modelled. Unrecognised or
/// malformed values decode to `None` instead of failing the whole payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    #[serde(default, alias = "complaintId", deserialize_with = "lenient_id")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub department_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub ward_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_parse")]
    pub status: Option<ComplaintStatus>,
    #[serde(default, deserialize_with = "lenient_parse")]
    pub priority: Option<Priority>,
}

impl Complaint {
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            created_at: Some(created_at),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: ComplaintStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    pub fn with_department(mut self, department_id: i64) -> Self {
        self.department_id = Some(department_id);
        self
    }
}

/// Accepts RFC 3339 timestamps and zone-less `yyyy-mm-ddThh:mm:ss[.fff]`
/// values (read as UTC). Anything else becomes `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => parse_timestamp(&s),
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    })
}

/// Numeric ids, also when sent as numeric strings.
fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}

fn lenient_parse<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => s.parse().ok(),
        _ => None,
    })
}
