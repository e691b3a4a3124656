use crate::domain::model::{FeatureMatrix, TargetTransform};
use crate::domain::ports::RegressionModel;
use crate::utils::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Linear regression exported as JSON:
/// `{"features": [..], "coefficients": [..], "intercept": 0.0, "target": "log"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub features: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub target: TargetTransform,
}

impl LinearModel {
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        let model: LinearModel = serde_json::from_slice(bytes)?;
        model.check()?;
        Ok(model)
    }

    fn check(&self) -> Result<()> {
        if self.features.is_empty() {
            return Err(AppError::ModelError {
                message: "model declares no features".to_string(),
            });
        }
        if self.features.len() != self.coefficients.len() {
            return Err(AppError::ModelError {
                message: format!(
                    "{} features but {} coefficients",
                    self.features.len(),
                    self.coefficients.len()
                ),
            });
        }
        Ok(())
    }
}

impl RegressionModel for LinearModel {
    fn feature_names(&self) -> &[String] {
        &self.features
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        if features.columns != self.features {
            return Err(AppError::FeatureMismatch {
                expected: self.features.clone(),
                actual: features.columns.clone(),
            });
        }

        features
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                if row.len() != self.coefficients.len() {
                    return Err(AppError::ShapeMismatch {
                        message: format!(
                            "feature row {} has {} values, model expects {}",
                            i,
                            row.len(),
                            self.coefficients.len()
                        ),
                    });
                }
                let dot: f64 = row
                    .iter()
                    .zip(&self.coefficients)
                    .map(|(x, w)| x * w)
                    .sum();
                Ok(self.intercept + dot)
            })
            .collect()
    }

    fn target_transform(&self) -> TargetTransform {
        self.target
    }
}
