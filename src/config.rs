// src/config.rs
//
// Run configuration. Loaded from JSON (every section optional) and written
// next to the results as config.json for provenance.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

use crate::params::{EvalOptions, FieldKind};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub engine: EngineConfig,
    pub analytic: AnalyticConfig,
    pub output: OutputConfig,
}

/// Engine-side knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum number of rows a rayon task handles when building local
    /// observer rows and back-rotating results.
    pub min_rows_per_task: usize,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_rows_per_task == 0 {
            return Err(ConfigError::Invalid(
                "engine.min_rows_per_task must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_rows_per_task: 1024,
        }
    }
}

/// Reference evaluator knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticConfig {
    /// Azimuthal trapezoid nodes for the transverse cylinder field.
    pub cylinder_nodes: usize,
    /// Minimum number of formula rows per rayon task.
    pub min_rows_per_task: usize,
}

impl AnalyticConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cylinder_nodes < 4 {
            return Err(ConfigError::Invalid(format!(
                "analytic.cylinder_nodes must be >= 4, got {}",
                self.cylinder_nodes
            )));
        }
        if self.min_rows_per_task == 0 {
            return Err(ConfigError::Invalid(
                "analytic.min_rows_per_task must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for AnalyticConfig {
    fn default() -> Self {
        Self {
            cylinder_nodes: 256,
            min_rows_per_task: 256,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub field: FieldKind,
    pub options: EvalOptions,
    /// Root directory for run outputs.
    pub out_root: String,
    pub run_id: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            field: FieldKind::B,
            options: EvalOptions::default(),
            out_root: "runs".to_string(),
            run_id: None,
        }
    }
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let cfg: RunConfig = serde_json::from_reader(BufReader::new(file))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        self.analytic.validate()
    }

    pub fn write_to_dir(&self, out_dir: &Path) -> Result<(), ConfigError> {
        let path = out_dir.join("config.json");
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
