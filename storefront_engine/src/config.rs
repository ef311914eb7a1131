use std::time::Duration;

/// The default pause between a successful order submission and the simulated move to `preparing`.
pub const DEFAULT_SIMULATION_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// When set, every newly placed order is moved to `preparing` by the client after `simulation_delay`, and the new
    /// status is sent to the server. This stands in for a kitchen that does not report its progress.
    pub simulate_status: bool,
    pub simulation_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { simulate_status: true, simulation_delay: DEFAULT_SIMULATION_DELAY }
    }
}
