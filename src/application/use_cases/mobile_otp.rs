//! Two-step mobile number change: request an OTP for a new number, then
//! verify it.
//!
//! All failures end up in the session's `error` field; no method returns an
//! error. The only background activity is the one-second resend cooldown,
//! which is owned by the workflow and aborted on teardown.

use crate::domain::error::AppError;
use crate::domain::otp::{
    is_valid_mobile, is_valid_otp_code, mask_mobile, sanitize_digits, OtpSession, OtpSnapshot,
    OtpStep, INVALID_CODE_MESSAGE, INVALID_MOBILE_MESSAGE, MOBILE_LENGTH, OTP_CODE_LENGTH,
    REQUEST_FAILED_MESSAGE, SAME_MOBILE_MESSAGE, VERIFY_FAILED_MESSAGE,
};
use crate::infrastructure::api_client::OtpService;
use crate::infrastructure::config::PortalConfig;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub type VerifiedCallback = Arc<dyn Fn(String) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpWorkflowConfig {
    pub cooldown_seconds: u32,
    pub close_delay: Duration,
}

impl Default for OtpWorkflowConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: 60,
            close_delay: Duration::from_millis(2_000),
        }
    }
}

impl From<&PortalConfig> for OtpWorkflowConfig {
    fn from(config: &PortalConfig) -> Self {
        Self {
            cooldown_seconds: config.otp_cooldown_seconds,
            close_delay: config.otp_close_delay(),
        }
    }
}

/// State shared with the timer tasks.
struct Shared {
    session: Mutex<OtpSession>,
    updates: watch::Sender<OtpSnapshot>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, OtpSession> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn snapshot(&self) -> OtpSnapshot {
        self.lock().snapshot()
    }

    /// Applies `f` and publishes the resulting snapshot.
    fn update<R>(&self, f: impl FnOnce(&mut OtpSession) -> R) -> (R, OtpSnapshot) {
        let (result, snapshot) = {
            let mut session = self.lock();
            let result = f(&mut session);
            (result, session.snapshot())
        };
        self.updates.send_replace(snapshot.clone());
        (result, snapshot)
    }

    /// Like `update`, but only while the session is still on `generation`.
    fn update_if<R>(
        &self,
        generation: u64,
        f: impl FnOnce(&mut OtpSession) -> R,
    ) -> Option<(R, OtpSnapshot)> {
        let (result, snapshot) = {
            let mut session = self.lock();
            if session.generation != generation {
                return None;
            }
            let result = f(&mut session);
            (result, session.snapshot())
        };
        self.updates.send_replace(snapshot.clone());
        Some((result, snapshot))
    }
}

pub struct MobileOtpWorkflow {
    service: Arc<dyn OtpService>,
    current_mobile: Option<String>,
    config: OtpWorkflowConfig,
    shared: Arc<Shared>,
    cooldown_task: Mutex<Option<JoinHandle<()>>>,
    close_task: Mutex<Option<JoinHandle<()>>>,
    on_verified: Option<VerifiedCallback>,
}

impl MobileOtpWorkflow {
    pub fn new(
        service: Arc<dyn OtpService>,
        current_mobile: Option<String>,
        config: OtpWorkflowConfig,
    ) -> Self {
        let session = OtpSession::default();
        let (updates, _) = watch::channel(session.snapshot());
        Self {
            service,
            current_mobile: current_mobile.filter(|m| !m.trim().is_empty()),
            config,
            shared: Arc::new(Shared {
                session: Mutex::new(session),
                updates,
            }),
            cooldown_task: Mutex::new(None),
            close_task: Mutex::new(None),
            on_verified: None,
        }
    }

    /// Called once with the confirmed number after a successful verification.
    pub fn on_verified(mut self, callback: impl Fn(String) + Send + Sync + 'static) -> Self {
        self.on_verified = Some(Arc::new(callback));
        self
    }

    pub fn current_mobile(&self) -> Option<&str> {
        self.current_mobile.as_deref()
    }

    pub fn snapshot(&self) -> OtpSnapshot {
        self.shared.snapshot()
    }

    /// Receives a snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<OtpSnapshot> {
        self.shared.updates.subscribe()
    }

    pub fn can_resend(&self) -> bool {
        self.snapshot().can_resend
    }

    /// Stores the mobile field as typed, reduced to at most ten digits.
    pub fn set_mobile_input(&self, raw: &str) -> OtpSnapshot {
        let value = sanitize_digits(raw, MOBILE_LENGTH);
        self.shared
            .update(|s| {
                if s.step == OtpStep::AwaitingMobile && !s.loading {
                    s.mobile_input = value;
                }
            })
            .1
    }

    /// Stores the code field as typed, reduced to at most six digits.
    pub fn set_code_input(&self, raw: &str) -> OtpSnapshot {
        let value = sanitize_digits(raw, OTP_CODE_LENGTH);
        self.shared
            .update(|s| {
                if s.step == OtpStep::AwaitingCode && !s.loading {
                    s.code = value;
                }
            })
            .1
    }

    /// Submits whatever is currently in the mobile field.
    pub async fn submit(&self) -> OtpSnapshot {
        let mobile = self.shared.lock().mobile_input.clone();
        self.submit_mobile(&mobile).await
    }

    pub async fn submit_mobile(&self, mobile: &str) -> OtpSnapshot {
        let (pending, snapshot) = self.shared.update(|s| {
            if s.step != OtpStep::AwaitingMobile || s.loading {
                return None;
            }
            s.mobile_input = mobile.to_string();
            s.error = None;
            if !is_valid_mobile(mobile) {
                s.error = Some(INVALID_MOBILE_MESSAGE.to_string());
                return None;
            }
            if self.current_mobile.as_deref() == Some(mobile) {
                s.error = Some(SAME_MOBILE_MESSAGE.to_string());
                return None;
            }
            s.loading = true;
            Some(s.generation)
        });

        match pending {
            Some(generation) => self.request_code(mobile.to_string(), generation).await,
            None => snapshot,
        }
    }

    /// Requests a fresh code for the same number. Ignored while the
    /// cooldown is running.
    pub async fn resend(&self) -> OtpSnapshot {
        let (pending, snapshot) = self.shared.update(|s| {
            if s.step != OtpStep::AwaitingCode || s.loading || s.cooldown_seconds > 0 {
                return None;
            }
            let target = s.target_mobile.clone()?;
            s.code.clear();
            s.error = None;
            s.loading = true;
            Some((target, s.generation))
        });

        match pending {
            Some((mobile, generation)) => self.request_code(mobile, generation).await,
            None => {
                debug!(cooldown = snapshot.cooldown_seconds, "Resend ignored");
                snapshot
            }
        }
    }

    /// Verifies the currently entered code.
    pub async fn verify_current(&self) -> OtpSnapshot {
        let code = self.shared.lock().code.clone();
        self.verify(&code).await
    }

    pub async fn verify(&self, code: &str) -> OtpSnapshot {
        let (pending, snapshot) = self.shared.update(|s| {
            if s.step != OtpStep::AwaitingCode || s.loading {
                return None;
            }
            s.code = code.to_string();
            s.error = None;
            if !is_valid_otp_code(code) {
                s.error = Some(INVALID_CODE_MESSAGE.to_string());
                return None;
            }
            let target = s.target_mobile.clone()?;
            s.loading = true;
            Some((target, s.generation))
        });

        let Some((target, generation)) = pending else {
            return snapshot;
        };

        let result = self.service.verify_mobile_otp(code, &target).await;

        let (verified, message) = match &result {
            Ok(response) => (response.success, response.message.clone()),
            Err(err) => (false, service_message(err)),
        };

        let applied = self.shared.update_if(generation, |s| {
            s.loading = false;
            if verified {
                s.step = OtpStep::Verified;
                s.cooldown_seconds = 0;
                s.error = None;
            } else {
                s.error = Some(failure_message(&message, VERIFY_FAILED_MESSAGE));
            }
        });

        let Some((_, snapshot)) = applied else {
            debug!("Dropping OTP verification response for a closed flow");
            return self.snapshot();
        };

        if !verified {
            warn!(
                mobile = %mask_mobile(&target),
                error = snapshot.error.as_deref().unwrap_or_default(),
                "OTP verification failed"
            );
            return snapshot;
        }

        info!(mobile = %mask_mobile(&target), "Mobile number verified");
        self.stop_cooldown();
        if let Some(callback) = &self.on_verified {
            callback(target);
        }
        self.schedule_close(generation);
        snapshot
    }

    /// Returns to the mobile entry step, dropping code and cooldown.
    pub fn back(&self) -> OtpSnapshot {
        self.stop_cooldown();
        self.shared
            .update(|s| {
                if s.step != OtpStep::AwaitingCode {
                    return;
                }
                let mobile_input = s.target_mobile.take().unwrap_or_default();
                s.reset(OtpStep::AwaitingMobile);
                s.mobile_input = mobile_input;
            })
            .1
    }

    /// Tears the flow down. Later responses and ticks are ignored.
    pub fn cancel(&self) -> OtpSnapshot {
        self.stop_cooldown();
        self.stop_close();
        self.shared.update(|s| s.reset(OtpStep::Closed)).1
    }

    pub fn close(&self) -> OtpSnapshot {
        self.cancel()
    }

    /// Runs the request for a session already marked `loading` on
    /// `generation`.
    async fn request_code(&self, mobile: String, generation: u64) -> OtpSnapshot {
        let result = self.service.request_mobile_otp(&mobile).await;

        let (sent, message, dev_code) = match result {
            Ok(response) => (response.success, response.message, response.mock_otp),
            Err(err) => (false, service_message(&err), None),
        };
        let cooldown = self.config.cooldown_seconds;

        let applied = self.shared.update_if(generation, |s| {
            s.loading = false;
            if sent {
                s.step = OtpStep::AwaitingCode;
                s.target_mobile = Some(mobile.clone());
                s.code.clear();
                s.cooldown_seconds = cooldown;
                s.dev_code = dev_code;
                s.error = None;
            } else {
                s.error = Some(failure_message(&message, REQUEST_FAILED_MESSAGE));
            }
        });

        let Some((_, snapshot)) = applied else {
            debug!("Dropping OTP request response for a closed flow");
            return self.snapshot();
        };

        if sent {
            info!(mobile = %mask_mobile(&mobile), cooldown, "OTP sent");
            self.start_cooldown(generation);
        } else {
            warn!(
                mobile = %mask_mobile(&mobile),
                error = snapshot.error.as_deref().unwrap_or_default(),
                "OTP request failed"
            );
        }
        snapshot
    }

    fn start_cooldown(&self, generation: u64) {
        self.stop_cooldown();
        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            // First tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let remaining = shared.update_if(generation, |s| {
                    s.cooldown_seconds = s.cooldown_seconds.saturating_sub(1);
                    s.cooldown_seconds
                });
                match remaining {
                    Some((0, _)) | None => break,
                    Some(_) => {}
                }
            }
        });
        *lock_task(&self.cooldown_task) = Some(handle);
    }

    fn stop_cooldown(&self) {
        if let Some(handle) = lock_task(&self.cooldown_task).take() {
            handle.abort();
        }
    }

    fn schedule_close(&self, generation: u64) {
        self.stop_close();
        let shared = Arc::clone(&self.shared);
        let delay = self.config.close_delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if shared.update_if(generation, |s| s.reset(OtpStep::Closed)).is_some() {
                debug!("Mobile change flow closed after verification");
            }
        });
        *lock_task(&self.close_task) = Some(handle);
    }

    fn stop_close(&self) {
        if let Some(handle) = lock_task(&self.close_task).take() {
            handle.abort();
        }
    }
}

impl Drop for MobileOtpWorkflow {
    fn drop(&mut self) {
        self.stop_cooldown();
        self.stop_close();
    }
}

fn lock_task(slot: &Mutex<Option<JoinHandle<()>>>) -> MutexGuard<'_, Option<JoinHandle<()>>> {
    slot.lock().unwrap_or_else(|e| e.into_inner())
}

/// Only errors the backend reported itself carry a message worth showing.
fn service_message(err: &AppError) -> Option<String> {
    match err {
        AppError::ServiceError(msg) | AppError::NotFound(msg) => Some(msg.clone()),
        _ => None,
    }
}

fn failure_message(message: &Option<String>, fallback: &str) -> String {
    message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(fallback)
        .to_string()
}
