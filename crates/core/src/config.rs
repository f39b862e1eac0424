//! Scheduling configuration
//!
//! Loaded from TOML. Every key is optional; missing keys use the defaults
//! below. Generation limits may be lowered but never raised past the
//! defaults; larger values are clamped.
//!
//! ```toml
//! [generation]
//! open_ended_horizon_days = 365
//! max_occurrences = 104
//! max_day_steps = 1000
//!
//! [propagation]
//! orphan_policy = "leave_untouched"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

/// Upper bound for `open_ended_horizon_days`
pub const MAX_HORIZON_DAYS: u32 = 365;
/// Upper bound for `max_occurrences`
pub const MAX_OCCURRENCES: usize = 104;
/// Upper bound for `max_day_steps`
pub const MAX_DAY_STEPS: usize = 1000;

/// Top-level scheduling configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    pub generation: GenerationLimits,
    pub propagation: PropagationConfig,
}

/// Bounds on calendar expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationLimits {
    /// Horizon used when a template has no end date
    pub open_ended_horizon_days: u32,
    /// Most dates a single expansion may return
    pub max_occurrences: usize,
    /// Most calendar days a single expansion may walk
    pub max_day_steps: usize,
}

impl Default for GenerationLimits {
    fn default() -> Self {
        Self {
            open_ended_horizon_days: MAX_HORIZON_DAYS,
            max_occurrences: MAX_OCCURRENCES,
            max_day_steps: MAX_DAY_STEPS,
        }
    }
}

impl GenerationLimits {
    /// These limits with every value capped at its hard maximum
    pub fn clamped(self) -> Self {
        Self {
            open_ended_horizon_days: self.open_ended_horizon_days.min(MAX_HORIZON_DAYS),
            max_occurrences: self.max_occurrences.min(MAX_OCCURRENCES),
            max_day_steps: self.max_day_steps.min(MAX_DAY_STEPS),
        }
    }
}

/// What to do with a future occurrence whose weekday the template dropped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Keep the occurrence exactly as it is
    #[default]
    LeaveUntouched,
    /// Keep the row but mark it inactive
    Deactivate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationConfig {
    pub orphan_policy: OrphanPolicy,
}

impl SchedulingConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content)?;
        let clamped = config.generation.clamped();
        if clamped != config.generation {
            warn!(
                requested = ?config.generation,
                applied = ?clamped,
                "Generation limits above the hard maximum; clamping"
            );
            config.generation = clamped;
        }
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load from `path` if it exists, otherwise use defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
