use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::domain::error::Result;
use crate::infrastructure::api_client::PortalApiClient;
use crate::infrastructure::config::PortalConfig;
use crate::infrastructure::session::SessionContext;
use crate::interfaces::state::PortalState;

const FALLBACK_LOG_LEVEL: &str = "info";

/// Installs the fmt subscriber once. `RUST_LOG` wins over `default_level`.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_LOG_LEVEL));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Loads configuration from the environment and wires the portal state.
///
/// Tracing is installed before anything is logged: with the configured level
/// when the config loads, with the fallback level when it does not.
pub fn setup(session: SessionContext) -> Result<PortalState> {
    let config = match PortalConfig::load() {
        Ok(config) => config,
        Err(err) => {
            init_tracing(FALLBACK_LOG_LEVEL);
            error!(error = %err, "Failed to load portal config");
            return Err(err);
        }
    };
    setup_with_config(config, session)
}

pub fn setup_with_config(config: PortalConfig, session: SessionContext) -> Result<PortalState> {
    init_tracing(&config.log_level);
    config.validate()?;

    let client = Arc::new(PortalApiClient::new(&config, session).map_err(|err| {
        error!(error = %err, "Failed to build portal API client");
        err
    })?);

    info!(
        api_base_url = %config.api_base_url,
        timeout_ms = config.api_timeout_ms,
        "Portal client ready"
    );

    Ok(PortalState::new(config, client.clone(), client))
}
