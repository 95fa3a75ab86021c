//! Effort budgets for loading calls.
//!
//! A [`LoadingController`](crate::loading::LoadingController) only sees a
//! number. This module derives that number the two ways the simulation
//! needs it:
//! - a worker doing the loading: rate scaled by strength, skill and fatigue
//! - ambient background labor at the depot: a flat rate
//!
//! Both scale linearly with elapsed simulated time and never go negative.
//!
//! ```
//! use stowage_logic::effort::{background_effort, worker_effort, EffortConfig, WorkerAttributes};
//!
//! let config = EffortConfig::default();
//! let strong = WorkerAttributes { strength: 90.0, skill: 3, fatigue: 0.0 };
//! let tired = WorkerAttributes { strength: 50.0, skill: 0, fatigue: 1.0 };
//! assert!(worker_effort(&strong, 1.0, &config) > worker_effort(&tired, 1.0, &config));
//! assert!(background_effort(1.0, &config) > 0.0);
//! ```

use serde::{Deserialize, Serialize};

/// Rates and weights for turning time into effort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffortConfig {
    /// kg per time unit for an average, rested, unskilled worker.
    pub base_rate: f64,
    /// How much strength swings the rate. At 0.5 a strength of 100 gives
    /// 1.5× and a strength of 0 gives 0.5×.
    pub strength_weight: f64,
    /// Extra fraction of the rate per skill level.
    pub skill_bonus_per_level: f64,
    /// Fraction of the rate lost at full fatigue.
    pub fatigue_penalty: f64,
    /// kg per time unit of unattended background loading.
    pub background_rate: f64,
}

impl Default for EffortConfig {
    fn default() -> Self {
        Self {
            base_rate: 10.0,
            strength_weight: 0.5,
            skill_bonus_per_level: 0.1,
            fatigue_penalty: 0.6,
            background_rate: 2.0,
        }
    }
}

/// Worker attributes that matter for hauling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkerAttributes {
    /// 0–100, 50 is average.
    pub strength: f64,
    /// Skill level, 0 = untrained.
    pub skill: u8,
    /// 0.0 = rested, 1.0 = exhausted.
    pub fatigue: f64,
}

impl Default for WorkerAttributes {
    fn default() -> Self {
        Self {
            strength: 50.0,
            skill: 0,
            fatigue: 0.0,
        }
    }
}

/// Effort a worker puts in over `elapsed` time units.
pub fn worker_effort(worker: &WorkerAttributes, elapsed: f64, config: &EffortConfig) -> f64 {
    let strength = finite_or(worker.strength, 50.0).clamp(0.0, 100.0);
    let strength_factor = 1.0 + config.strength_weight * (strength - 50.0) / 50.0;
    let skill_factor = 1.0 + config.skill_bonus_per_level * worker.skill as f64;
    let fatigue = finite_or(worker.fatigue, 0.0).clamp(0.0, 1.0);
    let fatigue_factor = 1.0 - config.fatigue_penalty * fatigue;
    budget(config.base_rate * strength_factor * skill_factor * fatigue_factor * elapsed)
}

/// Effort from ambient labor over `elapsed` time units.
pub fn background_effort(elapsed: f64, config: &EffortConfig) -> f64 {
    budget(config.background_rate * elapsed)
}

/// Sum the effort of a crew working together.
pub fn crew_effort(crew: &[WorkerAttributes], elapsed: f64, config: &EffortConfig) -> f64 {
    crew.iter().map(|w| worker_effort(w, elapsed, config)).sum()
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

fn budget(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
