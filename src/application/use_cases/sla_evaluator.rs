//! SLA deadline evaluation for complaint snapshots.
//!
//! The evaluator is pure: given a complaint and an evaluation instant it
//! always yields the same result. `evaluate` reads the wall clock, while
//! `evaluate_at` takes the instant explicitly.

use crate::domain::catalog::find_department;
use crate::domain::complaint::{Complaint, Priority};
use crate::domain::sla::{ComplaintSla, SlaClassification, SlaPolicyMismatch, SlaStatus};
use chrono::{DateTime, Duration, Utc};
use tracing::warn;

pub const HIGH_PRIORITY_SLA_HOURS: i64 = 24;
pub const DEFAULT_SLA_HOURS: i64 = 48;
pub const DEFAULT_WARNING_MINUTES: i64 = 120;

/// Deadline window for a priority. Only HIGH gets the short window.
pub fn duration_hours(priority: Option<Priority>) -> i64 {
    match priority {
        Some(Priority::High) => HIGH_PRIORITY_SLA_HOURS,
        _ => DEFAULT_SLA_HOURS,
    }
}

/// Human readable remaining time, e.g. `2d 3h remaining`.
pub fn format_remaining(status: &SlaStatus) -> String {
    if status.breached {
        return "Overdue".to_string();
    }
    let hours = status.remaining_minutes / 60;
    let minutes = status.remaining_minutes % 60;
    if hours > 24 {
        format!("{}d {}h remaining", hours / 24, hours % 24)
    } else {
        format!("{}h {}m remaining", hours, minutes)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SlaEvaluator {
    warning_minutes: i64,
}

impl Default for SlaEvaluator {
    fn default() -> Self {
        Self {
            warning_minutes: DEFAULT_WARNING_MINUTES,
        }
    }
}

impl SlaEvaluator {
    pub fn new(warning_minutes: i64) -> Self {
        Self {
            warning_minutes: warning_minutes.max(0),
        }
    }

    pub fn warning_minutes(&self) -> i64 {
        self.warning_minutes
    }

    pub fn evaluate(&self, complaint: &Complaint) -> Option<SlaStatus> {
        self.evaluate_at(complaint, Utc::now())
    }

    /// Evaluates against `now`, unless the complaint is terminal and has an
    /// `updated_at`, in which case the clock is pinned there.
    ///
    /// Returns `None` when `created_at` is missing or the deadline falls
    /// outside the representable date range.
    pub fn evaluate_at(&self, complaint: &Complaint, now: DateTime<Utc>) -> Option<SlaStatus> {
        let created_at = complaint.created_at?;
        let hours = duration_hours(complaint.priority);
        let deadline = created_at.checked_add_signed(Duration::hours(hours))?;

        let reference = match (complaint.status, complaint.updated_at) {
            (Some(status), Some(updated_at)) if status.is_terminal() => updated_at,
            _ => now,
        };

        let diff_ms = (deadline - reference).num_milliseconds();
        Some(SlaStatus {
            breached: diff_ms < 0,
            remaining_minutes: diff_ms.div_euclid(60_000).max(0),
            deadline,
            total_duration_minutes: hours * 60,
        })
    }

    pub fn classify(&self, complaint: &Complaint) -> SlaClassification {
        self.classify_status(complaint, self.evaluate(complaint).as_ref())
    }

    pub fn classify_at(&self, complaint: &Complaint, now: DateTime<Utc>) -> SlaClassification {
        self.classify_status(complaint, self.evaluate_at(complaint, now).as_ref())
    }

    /// Maps an already computed status to a badge classification.
    pub fn classify_status(
        &self,
        complaint: &Complaint,
        status: Option<&SlaStatus>,
    ) -> SlaClassification {
        let Some(status) = status else {
            return SlaClassification::Unknown;
        };
        if status.breached {
            return SlaClassification::Breached;
        }
        if complaint.status.map(|s| s.counts_as_met()).unwrap_or(false) {
            return SlaClassification::Met;
        }
        if status.remaining_minutes < self.warning_minutes {
            return SlaClassification::Warning;
        }
        SlaClassification::OnTrack
    }

    pub fn describe(&self, complaint: Complaint) -> ComplaintSla {
        self.describe_at(complaint, Utc::now())
    }

    /// Bundles status, classification and label for rendering.
    pub fn describe_at(&self, complaint: Complaint, now: DateTime<Utc>) -> ComplaintSla {
        let sla = self.evaluate_at(&complaint, now);
        let classification = self.classify_status(&complaint, sla.as_ref());
        let remaining_label = sla
            .as_ref()
            .map(format_remaining)
            .unwrap_or_else(|| "N/A".to_string());
        let policy_mismatch = self.policy_mismatch(&complaint);
        ComplaintSla {
            complaint,
            sla,
            classification,
            remaining_label,
            policy_mismatch,
        }
    }

    /// Reports when the department catalog promises a different window than
    /// the priority-based one applied by `evaluate`. The evaluation itself is
    /// left unchanged.
    pub fn policy_mismatch(&self, complaint: &Complaint) -> Option<SlaPolicyMismatch> {
        let department = find_department(complaint.department_id?)?;
        let applied_hours = duration_hours(complaint.priority);
        if department.sla_hours == applied_hours {
            return None;
        }

        warn!(
            complaint_id = ?complaint.id,
            department = department.name,
            department_sla_hours = department.sla_hours,
            applied_hours,
            "Department SLA hours differ from applied priority window"
        );

        Some(SlaPolicyMismatch {
            department_id: department.id,
            department_name: department.name,
            department_sla_hours: department.sla_hours,
            applied_hours,
        })
    }
}
