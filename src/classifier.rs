use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{DemoError, Result};
use crate::models::{BookingRecord, FeatureRow, FeatureValue};

/// A trained binary classifier scoring one feature row at a time.
pub trait Classifier {
    /// Probability of the positive ("will cancel") class.
    fn predict_probability(&self, row: &FeatureRow) -> Result<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCategory {
    /// Encode an unseen value as all zeros.
    #[default]
    Ignore,
    Error,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NumericFeature {
    pub name: String,
    pub mean: f64,
    pub scale: f64,
    pub coef: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategoryWeight {
    pub value: String,
    pub coef: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategoricalFeature {
    pub name: String,
    #[serde(default)]
    pub handle_unknown: UnknownCategory,
    pub categories: Vec<CategoryWeight>,
}

/// Standard-scaled numeric columns and one-hot categorical columns feeding a
/// logistic regression. Columns absent from the pipeline are dropped.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogisticPipeline {
    pub numeric: Vec<NumericFeature>,
    pub categorical: Vec<CategoricalFeature>,
    pub intercept: f64,
}

impl LogisticPipeline {
    pub fn load(path: &Path) -> Result<Self> {
        let artifact_error = |reason: String| DemoError::ArtifactLoad {
            path: path.to_path_buf(),
            reason,
        };

        let raw = std::fs::read_to_string(path).map_err(|err| artifact_error(err.to_string()))?;
        let pipeline: LogisticPipeline =
            serde_json::from_str(&raw).map_err(|err| artifact_error(err.to_string()))?;
        pipeline.validate().map_err(artifact_error)?;

        info!(
            path = %path.display(),
            numeric = pipeline.numeric.len(),
            categorical = pipeline.categorical.len(),
            "loaded classifier artifact"
        );
        Ok(pipeline)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.numeric.is_empty() && self.categorical.is_empty() {
            return Err("pipeline has no features".to_string());
        }
        if !self.intercept.is_finite() {
            return Err("intercept is not finite".to_string());
        }

        let mut seen = HashSet::new();
        for name in self.feature_names() {
            if !seen.insert(name) {
                return Err(format!("feature {name} is declared twice"));
            }
        }

        for feature in &self.numeric {
            if !(feature.scale.is_finite() && feature.scale > 0.0) {
                return Err(format!("feature {} has invalid scale {}", feature.name, feature.scale));
            }
            if !(feature.mean.is_finite() && feature.coef.is_finite()) {
                return Err(format!("feature {} has non-finite weights", feature.name));
            }
        }

        for feature in &self.categorical {
            if feature.categories.is_empty() {
                return Err(format!("feature {} has no categories", feature.name));
            }
            if feature.categories.iter().any(|c| !c.coef.is_finite()) {
                return Err(format!("feature {} has non-finite weights", feature.name));
            }
        }

        Ok(())
    }

    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.numeric
            .iter()
            .map(|f| f.name.as_str())
            .chain(self.categorical.iter().map(|f| f.name.as_str()))
    }

    fn decision_function(&self, row: &FeatureRow) -> Result<f64> {
        let mut z = self.intercept;

        for feature in &self.numeric {
            match row.get(&feature.name) {
                Some(FeatureValue::Number(x)) if x.is_finite() => {
                    z += feature.coef * (x - feature.mean) / feature.scale;
                }
                Some(FeatureValue::Number(x)) => {
                    return Err(DemoError::SchemaMismatch(format!(
                        "feature {} is not finite: {x}",
                        feature.name
                    )));
                }
                Some(other) => {
                    return Err(DemoError::SchemaMismatch(format!(
                        "feature {} expected number, found {}",
                        feature.name,
                        other.kind()
                    )));
                }
                None => {
                    return Err(DemoError::SchemaMismatch(format!(
                        "missing feature {}",
                        feature.name
                    )));
                }
            }
        }

        for feature in &self.categorical {
            let value = match row.get(&feature.name) {
                Some(FeatureValue::Category(value)) => value,
                Some(other) => {
                    return Err(DemoError::SchemaMismatch(format!(
                        "feature {} expected category, found {}",
                        feature.name,
                        other.kind()
                    )));
                }
                None => {
                    return Err(DemoError::SchemaMismatch(format!(
                        "missing feature {}",
                        feature.name
                    )));
                }
            };

            match feature.categories.iter().find(|c| &c.value == value) {
                Some(category) => z += category.coef,
                None if feature.handle_unknown == UnknownCategory::Ignore => {
                    debug!(feature = %feature.name, value = %value, "unknown category ignored");
                }
                None => {
                    return Err(DemoError::SchemaMismatch(format!(
                        "feature {} has unknown category {value}",
                        feature.name
                    )));
                }
            }
        }

        Ok(z)
    }
}

impl Classifier for LogisticPipeline {
    fn predict_probability(&self, row: &FeatureRow) -> Result<f64> {
        let z = self.decision_function(row)?;
        Ok(sigmoid(z))
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Presents bookings to a classifier and checks what comes back.
pub struct ClassifierAdapter<C> {
    model: C,
}

impl<C: Classifier> ClassifierAdapter<C> {
    pub fn new(model: C) -> Self {
        Self { model }
    }

    pub fn score(&self, record: &BookingRecord) -> Result<f64> {
        self.score_row(&record.to_features())
    }

    pub fn score_row(&self, row: &FeatureRow) -> Result<f64> {
        let probability = self.model.predict_probability(row)?;
        if !(0.0..=1.0).contains(&probability) {
            return Err(DemoError::InvalidProbability(probability));
        }
        Ok(probability)
    }
}
