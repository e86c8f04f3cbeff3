//! Surrogate model persistence
//!
//! Surrogate regressors are fitted offline and shipped as JSON files. The
//! caller loads one before evaluation; the evaluator only ever reads it.

use crate::core::{GkmError, Result, SurrogateRegressor};
use crate::evaluation::SurrogateModel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// A surrogate model together with its provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurrogateFile {
    pub model: SurrogateModel,
    pub metadata: SurrogateMetadata,
}

/// Provenance of a stored surrogate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurrogateMetadata {
    /// Library version used to create the file
    pub library_version: String,
    pub created_at: DateTime<Utc>,
    /// Free text, e.g. which kernel settings the surrogate was fitted for
    #[serde(default)]
    pub description: String,
}

impl SurrogateFile {
    /// Wrap a model with fresh metadata
    pub fn new(model: SurrogateModel, description: impl Into<String>) -> Self {
        Self {
            model,
            metadata: SurrogateMetadata {
                library_version: env!("CARGO_PKG_VERSION").to_string(),
                created_at: Utc::now(),
                description: description.into(),
            },
        }
    }

    /// Save to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.model.validate()?;
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| GkmError::SerializationError(e.to_string()))?;
        Ok(())
    }

    /// Load from a JSON file and check the model is well formed
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let surrogate: Self = serde_json::from_reader(reader)
            .map_err(|e| GkmError::SerializationError(e.to_string()))?;
        surrogate.model.validate()?;
        Ok(surrogate)
    }

    /// The model as a regressor
    pub fn regressor(&self) -> &dyn SurrogateRegressor {
        &self.model
    }

    /// Print a short summary
    pub fn print_summary(&self) {
        println!("=== Surrogate Model Summary ===");
        println!("Kind: {}", self.model.kind());
        match &self.model {
            SurrogateModel::Linear { slope, intercept } => {
                println!("AUC = {slope:.6} * nu + {intercept:.6}");
            }
            SurrogateModel::Piecewise { points } => {
                println!("Knots: {}", points.len());
                if let (Some(first), Some(last)) = (points.first(), points.last()) {
                    println!("nu range: [{:.4}, {:.4}]", first.nu, last.nu);
                }
            }
            SurrogateModel::StepEnsemble {
                init,
                learning_rate,
                trees,
            } => {
                println!("Trees: {}", trees.len());
                println!("Initial value: {init:.6}");
                println!("Learning rate: {learning_rate}");
            }
        }
        println!("Library Version: {}", self.metadata.library_version);
        println!("Created: {}", self.metadata.created_at.to_rfc3339());
        if !self.metadata.description.is_empty() {
            println!("Description: {}", self.metadata.description);
        }
    }
}
