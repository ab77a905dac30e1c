//! Layout settings forwarded to a worker's `/calculate` endpoint.

use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_STEP_DISPLACEMENT: f64 = 1.0;
pub const DEFAULT_OPTIMAL_DISTANCE: f64 = 200.0;
pub const DEFAULT_ITERATIONS: u32 = 100;

/// Keys reserved for the per-job file paths.
const RESERVED_KEYS: [&str; 2] = ["source", "target"];

/// Tuning options for one layout run.
///
/// A missing or `null` option takes its default, and so does `0` for the
/// numeric ones. Unrecognised keys are kept in [`extra`](Self::extra) and
/// sent to the worker unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSettings {
    #[serde(default, deserialize_with = "flag")]
    pub allow_auto_mode: bool,
    #[serde(
        default = "default_step_displacement",
        deserialize_with = "step_displacement"
    )]
    pub step_displacement: f64,
    #[serde(
        default = "default_optimal_distance",
        deserialize_with = "optimal_distance"
    )]
    pub optimal_distance: f64,
    #[serde(default = "default_iterations", deserialize_with = "iterations")]
    pub iterations: u32,
    #[serde(default, deserialize_with = "flag")]
    pub save_svg: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The body of one `/calculate` call: settings plus the job's file paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Pajek input file the worker reads.
    pub source: PathBuf,
    /// JSON position file the worker writes.
    pub target: PathBuf,
    #[serde(flatten)]
    pub settings: LayoutSettings,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            allow_auto_mode: false,
            step_displacement: DEFAULT_STEP_DISPLACEMENT,
            optimal_distance: DEFAULT_OPTIMAL_DISTANCE,
            iterations: DEFAULT_ITERATIONS,
            save_svg: false,
            extra: Map::new(),
        }
    }
}

impl LayoutSettings {
    /// Bind these settings to a job's input and output files.
    ///
    /// Any caller-supplied `source`/`target` pass-through keys are dropped;
    /// the job's own paths always win.
    pub fn into_request(mut self, source: PathBuf, target: PathBuf) -> JobRequest {
        for key in RESERVED_KEYS {
            self.extra.remove(key);
        }
        JobRequest {
            source,
            target,
            settings: self,
        }
    }
}

fn default_step_displacement() -> f64 {
    DEFAULT_STEP_DISPLACEMENT
}

fn default_optimal_distance() -> f64 {
    DEFAULT_OPTIMAL_DISTANCE
}

fn default_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

fn step_displacement<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    nonzero_or(deserializer, DEFAULT_STEP_DISPLACEMENT)
}

fn optimal_distance<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    nonzero_or(deserializer, DEFAULT_OPTIMAL_DISTANCE)
}

fn iterations<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(Option::<u32>::deserialize(deserializer)?
        .filter(|&n| n != 0)
        .unwrap_or(DEFAULT_ITERATIONS))
}

fn nonzero_or<'de, D: Deserializer<'de>>(deserializer: D, default: f64) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?
        .filter(|&v| v != 0.0)
        .unwrap_or(default))
}
