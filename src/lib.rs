pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;

pub use crate::application::{MobileOtpWorkflow, OtpWorkflowConfig, SlaEvaluator};
pub use crate::domain::complaint::{Complaint, ComplaintStatus, Priority};
pub use crate::domain::error::{AppError, Result};
pub use crate::domain::otp::{OtpSnapshot, OtpStep};
pub use crate::domain::sla::{ComplaintSla, SlaClassification, SlaStatus};
pub use crate::infrastructure::api_client::{ComplaintSource, OtpService, PortalApiClient};
pub use crate::infrastructure::bootstrap::{init_tracing, setup, setup_with_config};
pub use crate::infrastructure::config::PortalConfig;
pub use crate::infrastructure::session::SessionContext;
pub use crate::interfaces::state::PortalState;
