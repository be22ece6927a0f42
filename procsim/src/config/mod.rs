//! Simulation configuration loading and validation.
//!
//! Every field is optional in the file; missing values fall back to the
//! defaults below.  The expected YAML structure is:
//! ```yaml
//! processors: 6
//! policies: [fifo, spn, src, "rr:2", "rr:4", "rr:8"]
//! clock_period_ms: 50
//! batch_size: 5
//! workload_per_processor:
//!   min: 20
//!   max: 40
//! seed: 42
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dispatch::PolicySpec;
use crate::system::SimulationError;

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Pacing delay per cycle, in milliseconds.
pub const DEFAULT_CLOCK_PERIOD_MS: u64 = 50;

/// Processes handed to a processor per seed / top-up.
pub const DEFAULT_BATCH_SIZE: u64 = 5;

pub const DEFAULT_WORKLOAD_MIN: u64 = 20;
pub const DEFAULT_WORKLOAD_MAX: u64 = 40;

// ── Private YAML deserialization types ────────────────────────────────────────

/// Maps directly onto the YAML file layout.
///
/// Policies stay as strings here so the file accepts the same `rr:4` form as
/// the command line.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SimulationConfigFile {
    processors: Option<usize>,
    policies: Option<Vec<String>>,
    clock_period_ms: Option<u64>,
    batch_size: Option<u64>,
    workload_per_processor: Option<WorkloadRange>,
    seed: Option<u64>,
}

// ── Public data structures ────────────────────────────────────────────────────

/// Inclusive range the per-processor workload budget is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct WorkloadRange {
    pub min: u64,
    pub max: u64,
}

impl Default for WorkloadRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_WORKLOAD_MIN,
            max: DEFAULT_WORKLOAD_MAX,
        }
    }
}

/// Everything needed to build a [`ProcessingSystem`](crate::system::ProcessingSystem).
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub processors: usize,

    /// Processor `i` is bound to `policies[i % policies.len()]`.
    pub policies: Vec<PolicySpec>,

    /// Pacing delay applied once per cycle per worker and once per supervisor
    /// poll.  Zero disables pacing.
    pub clock_period: Duration,

    pub batch_size: u64,

    /// Total budget = uniform draw from `min * processors ..= max * processors`.
    pub workload_per_processor: WorkloadRange,

    /// `None` seeds the producer from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let policies = PolicySpec::default_set();
        Self {
            processors: policies.len(),
            policies,
            clock_period: Duration::from_millis(DEFAULT_CLOCK_PERIOD_MS),
            batch_size: DEFAULT_BATCH_SIZE,
            workload_per_processor: WorkloadRange::default(),
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Parses `path`; absent fields keep their defaults.
    ///
    /// Only the file format is checked here; semantic checks happen in
    /// [`validate`](Self::validate) so CLI overrides can be applied first.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, the YAML is structurally
    /// invalid, or a policy string does not parse.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading simulation configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to load configuration file: {}", path.display()))
    }

    /// Parses a YAML document; absent fields keep their defaults.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to an empty map
        let file: SimulationConfigFile = if content.trim().is_empty() {
            SimulationConfigFile::default()
        } else {
            serde_yaml::from_str(content).context("Failed to parse YAML")?
        };

        let mut config = Self::default();

        if let Some(policies) = file.policies {
            config.policies = policies
                .iter()
                .map(|s| s.parse::<PolicySpec>())
                .collect::<Result<_, _>>()
                .context("Invalid entry in `policies`")?;
            // Processor count follows the policy list unless given explicitly
            config.processors = config.policies.len();
        }
        if let Some(n) = file.processors {
            config.processors = n;
        }
        if let Some(ms) = file.clock_period_ms {
            config.clock_period = Duration::from_millis(ms);
        }
        if let Some(batch) = file.batch_size {
            config.batch_size = batch;
        }
        if let Some(range) = file.workload_per_processor {
            config.workload_per_processor = range;
        }
        config.seed = file.seed.or(config.seed);

        debug!(?config, "Parsed simulation configuration");
        Ok(config)
    }

    /// Check the configuration before any processor is built.
    ///
    /// # Errors
    /// The first [`SimulationError`] configuration variant that applies.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.processors == 0 {
            return Err(SimulationError::NoProcessors);
        }
        if self.policies.is_empty() {
            return Err(SimulationError::NoPolicies);
        }
        if self.policies.len() > self.processors {
            return Err(SimulationError::TooManyPolicies {
                policies: self.policies.len(),
                processors: self.processors,
            });
        }
        if let Some(index) = self
            .policies
            .iter()
            .position(|p| matches!(p, PolicySpec::RoundRobin { quantum: 0 }))
        {
            return Err(SimulationError::ZeroQuantum { index });
        }
        if self.batch_size == 0 {
            return Err(SimulationError::ZeroBatchSize);
        }
        let WorkloadRange { min, max } = self.workload_per_processor;
        if min > max {
            return Err(SimulationError::InvalidWorkloadRange { min, max });
        }
        Ok(())
    }

    /// The policy bound to processor `index` under the cyclic reuse rule.
    pub fn policy_for(&self, index: usize) -> Option<PolicySpec> {
        if self.policies.is_empty() {
            None
        } else {
            Some(self.policies[index % self.policies.len()])
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
