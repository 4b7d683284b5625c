pub mod catalog;
pub mod complaint;
pub mod error;
pub mod otp;
pub mod sla;
