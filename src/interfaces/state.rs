use std::sync::Arc;

use tracing::debug;

use crate::application::{MobileOtpWorkflow, OtpWorkflowConfig, SlaEvaluator};
use crate::domain::error::Result;
use crate::domain::sla::ComplaintSla;
use crate::infrastructure::api_client::{ComplaintSource, OtpService};
use crate::infrastructure::config::PortalConfig;

/// Everything a UI shell needs, assembled once at startup.
pub struct PortalState {
    config: PortalConfig,
    otp_service: Arc<dyn OtpService>,
    complaints: Arc<dyn ComplaintSource>,
    sla_evaluator: SlaEvaluator,
}

impl PortalState {
    pub fn new(
        config: PortalConfig,
        otp_service: Arc<dyn OtpService>,
        complaints: Arc<dyn ComplaintSource>,
    ) -> Self {
        let sla_evaluator = SlaEvaluator::new(config.sla_warning_minutes);
        Self {
            config,
            otp_service,
            complaints,
            sla_evaluator,
        }
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub fn sla_evaluator(&self) -> &SlaEvaluator {
        &self.sla_evaluator
    }

    /// Opens a fresh change-mobile flow. Dropping it tears the flow down.
    pub fn mobile_change_workflow(&self, current_mobile: Option<String>) -> MobileOtpWorkflow {
        MobileOtpWorkflow::new(
            self.otp_service.clone(),
            current_mobile,
            OtpWorkflowConfig::from(&self.config),
        )
    }

    pub async fn complaint_sla(&self, id: i64) -> Result<ComplaintSla> {
        let complaint = self.complaints.get_complaint(id).await?;
        Ok(self.sla_evaluator.describe(complaint))
    }

    pub async fn complaint_slas(&self) -> Result<Vec<ComplaintSla>> {
        let complaints = self.complaints.list_complaints().await?;
        debug!(count = complaints.len(), "Evaluating SLA for complaints");
        Ok(complaints
            .into_iter()
            .map(|c| self.sla_evaluator.describe(c))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::complaint::{Complaint, ComplaintStatus, Priority};
    use crate::domain::error::AppError;
    use crate::domain::otp::{OtpRequestResponse, OtpStep, OtpVerifyResponse};
    use crate::domain::sla::SlaClassification;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};

    struct StubBackend {
        complaints: Vec<Complaint>,
    }

    #[async_trait]
    impl OtpService for StubBackend {
        async fn request_mobile_otp(&self, _new_mobile: &str) -> Result<OtpRequestResponse> {
            Ok(OtpRequestResponse {
                success: true,
                message: None,
                mock_otp: Some("111111".to_string()),
            })
        }

        async fn verify_mobile_otp(&self, _otp: &str, _new_mobile: &str) -> Result<OtpVerifyResponse> {
            Ok(OtpVerifyResponse {
                success: true,
                message: None,
            })
        }
    }

    #[async_trait]
    impl ComplaintSource for StubBackend {
        async fn get_complaint(&self, id: i64) -> Result<Complaint> {
            self.complaints
                .iter()
                .find(|c| c.id == Some(id))
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("Complaint {} not found", id)))
        }

        async fn list_complaints(&self) -> Result<Vec<Complaint>> {
            Ok(self.complaints.clone())
        }
    }

    fn state() -> PortalState {
        let now = Utc::now();
        let backend = Arc::new(StubBackend {
            complaints: vec![
                Complaint {
                    id: Some(1),
                    ..Complaint::new(now - Duration::hours(30)).with_priority(Priority::High)
                },
                Complaint {
                    id: Some(2),
                    ..Complaint::new(now - Duration::hours(1))
                },
                Complaint {
                    id: Some(3),
                    ..Complaint::new(now - Duration::hours(10))
                        .with_status(ComplaintStatus::Closed)
                        .with_updated_at(now - Duration::hours(5))
                },
                Complaint {
                    id: Some(4),
                    ..Complaint::default()
                },
            ],
        });
        PortalState::new(PortalConfig::default(), backend.clone(), backend)
    }

    #[tokio::test]
    async fn test_complaint_slas_classifies_each() {
        let slas = state().complaint_slas().await.unwrap();
        let classes: Vec<_> = slas.iter().map(|s| s.classification).collect();
        assert_eq!(
            classes,
            vec![
                SlaClassification::Breached,
                SlaClassification::OnTrack,
                SlaClassification::Met,
                SlaClassification::Unknown,
            ]
        );
    }

    #[tokio::test]
    async fn test_complaint_sla_not_found() {
        let err = state().complaint_sla(99).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_workflow_uses_configured_cooldown() {
        let backend = Arc::new(StubBackend { complaints: vec![] });
        let config = PortalConfig {
            otp_cooldown_seconds: 15,
            ..PortalConfig::default()
        };
        let state = PortalState::new(config, backend.clone(), backend);

        let flow = state.mobile_change_workflow(Some("9000000000".to_string()));
        let snapshot = flow.submit_mobile("8123456789").await;
        assert_eq!(snapshot.step, OtpStep::AwaitingCode);
        assert_eq!(snapshot.cooldown_seconds, 15);
        assert_eq!(snapshot.dev_code.as_deref(), Some("111111"));
    }
}
