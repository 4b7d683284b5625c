use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static MOBILE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[6-9][0-9]{9}$").unwrap());

static OTP_CODE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{6}$").unwrap());

pub const MOBILE_LENGTH: usize = 10;
pub const OTP_CODE_LENGTH: usize = 6;

pub const INVALID_MOBILE_MESSAGE: &str = "Please enter a valid 10-digit mobile number";
pub const SAME_MOBILE_MESSAGE: &str = "New mobile number is same as current";
pub const INVALID_CODE_MESSAGE: &str = "Please enter a valid 6-digit OTP";
pub const REQUEST_FAILED_MESSAGE: &str = "Failed to send OTP. Please try again.";
pub const VERIFY_FAILED_MESSAGE: &str = "Invalid OTP. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OtpStep {
    AwaitingMobile,
    AwaitingCode,
    Verified,
    Closed,
}

/// Mutable state of one mobile-change flow. Owned by a single workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpSession {
    pub step: OtpStep,
    pub mobile_input: String,
    pub target_mobile: Option<String>,
    pub code: String,
    pub cooldown_seconds: u32,
    pub error: Option<String>,
    pub dev_code: Option<String>,
    pub loading: bool,
    /// Bumped whenever the session is reset so late responses and timer
    /// ticks from an older flow can be recognised and dropped.
    pub generation: u64,
}

impl Default for OtpSession {
    fn default() -> Self {
        Self {
            step: OtpStep::AwaitingMobile,
            mobile_input: String::new(),
            target_mobile: None,
            code: String::new(),
            cooldown_seconds: 0,
            error: None,
            dev_code: None,
            loading: false,
            generation: 0,
        }
    }
}

impl OtpSession {
    /// Clears all user-entered and timed state, keeping only the generation
    /// counter (which is advanced).
    pub fn reset(&mut self, step: OtpStep) {
        let generation = self.generation.wrapping_add(1);
        *self = OtpSession {
            step,
            generation,
            ..OtpSession::default()
        };
    }

    pub fn snapshot(&self) -> OtpSnapshot {
        OtpSnapshot {
            step: self.step,
            mobile_input: self.mobile_input.clone(),
            target_mobile: self.target_mobile.clone(),
            code: self.code.clone(),
            cooldown_seconds: self.cooldown_seconds,
            error: self.error.clone(),
            dev_code: self.dev_code.clone(),
            loading: self.loading,
            can_resend: self.step == OtpStep::AwaitingCode
                && self.cooldown_seconds == 0
                && !self.loading,
        }
    }
}

/// Read-only view handed to renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpSnapshot {
    pub step: OtpStep,
    pub mobile_input: String,
    pub target_mobile: Option<String>,
    pub code: String,
    pub cooldown_seconds: u32,
    pub error: Option<String>,
    pub dev_code: Option<String>,
    pub loading: bool,
    pub can_resend: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpRequestResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    /// Generated code echoed back by non-production backends.
    #[serde(default)]
    pub mock_otp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpVerifyResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_success() -> bool {
    true
}

pub fn is_valid_mobile(mobile: &str) -> bool {
    MOBILE_PATTERN.is_match(mobile)
}

pub fn is_valid_otp_code(code: &str) -> bool {
    OTP_CODE_PATTERN.is_match(code)
}

/// Keeps digits only and truncates to `max_len`, like the input fields do.
pub fn sanitize_digits(raw: &str, max_len: usize) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .take(max_len)
        .collect()
}

/// Masks all but the last four digits for logging.
pub fn mask_mobile(mobile: &str) -> String {
    let len = mobile.chars().count();
    mobile
        .chars()
        .enumerate()
        .map(|(i, c)| if i + 4 < len { '*' } else { c })
        .collect()
}
