pub mod mobile_otp;
pub mod sla_evaluator;
