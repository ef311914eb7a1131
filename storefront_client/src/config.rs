use std::time::Duration;

use log::*;
use sf_common::helpers::parse_boolean_flag;
use storefront_engine::EngineConfig;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5233";
pub const DEFAULT_HUB_URL: &str = "http://localhost:5233/order";
pub const DEFAULT_USER_AGENT: &str = concat!("storefront-client/", env!("CARGO_PKG_VERSION"));
const DEFAULT_SIMULATION_DELAY_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    /// The order service root, without a trailing slash.
    pub api_base_url: String,
    pub hub_url: String,
    pub user_agent: String,
    pub simulate_status: bool,
    pub simulation_delay: Duration,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            hub_url: DEFAULT_HUB_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            simulate_status: true,
            simulation_delay: Duration::from_millis(DEFAULT_SIMULATION_DELAY_MS),
        }
    }
}

impl StorefrontConfig {
    pub fn from_env_or_default() -> Self {
        let api_base_url = std::env::var("SF_API_BASE_URL")
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                warn!("SF_API_BASE_URL not set, using {DEFAULT_API_BASE_URL} as default");
                DEFAULT_API_BASE_URL.to_string()
            });
        let hub_url = std::env::var("SF_HUB_URL")
            .map(|s| s.trim().to_string())
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                warn!("SF_HUB_URL not set, using {DEFAULT_HUB_URL} as default");
                DEFAULT_HUB_URL.to_string()
            });
        let user_agent = std::env::var("SF_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());
        let simulate_status = parse_boolean_flag(std::env::var("SF_SIMULATE_STATUS").ok(), true);
        let simulation_delay = parse_delay_ms(std::env::var("SF_STATUS_SIMULATION_DELAY_MS").ok());
        Self { api_base_url, hub_url, user_agent, simulate_status, simulation_delay }
    }

    /// The settings the order lifecycle engine cares about.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig { simulate_status: self.simulate_status, simulation_delay: self.simulation_delay }
    }
}

fn parse_delay_ms(value: Option<String>) -> Duration {
    let Some(value) = value else {
        return Duration::from_millis(DEFAULT_SIMULATION_DELAY_MS);
    };
    match value.trim().parse::<u64>() {
        Ok(ms) => Duration::from_millis(ms),
        Err(e) => {
            warn!(
                "SF_STATUS_SIMULATION_DELAY_MS is not a valid number of milliseconds ({e}). Using \
                 {DEFAULT_SIMULATION_DELAY_MS}ms as default"
            );
            Duration::from_millis(DEFAULT_SIMULATION_DELAY_MS)
        },
    }
}
