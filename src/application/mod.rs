pub mod use_cases;

pub use use_cases::mobile_otp::{MobileOtpWorkflow, OtpWorkflowConfig};
pub use use_cases::sla_evaluator::SlaEvaluator;
