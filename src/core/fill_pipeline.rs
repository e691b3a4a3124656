use crate::adapters::LinearModel;
use crate::config::FillerConfig;
use crate::core::table::{self, DataTable};
use crate::core::{Pipeline, RegressionModel, Storage};
use crate::domain::model::FillSummary;
use crate::utils::error::{AppError, Result};

pub struct FillInput {
    pub candidates: DataTable,
    pub master: DataTable,
}

pub struct FillOutput {
    pub master: DataTable,
    pub summary: FillSummary,
}

/// Imputes the target column of flagged master rows from model predictions
/// over the matching candidate rows.
pub struct SqftFillPipeline<S: Storage, M: RegressionModel> {
    storage: S,
    config: FillerConfig,
    model: M,
}

impl<S: Storage, M: RegressionModel> SqftFillPipeline<S, M> {
    pub fn new(storage: S, config: FillerConfig, model: M) -> Self {
        Self {
            storage,
            config,
            model,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    fn check_expected_features(&self) -> Result<()> {
        if let Some(expected) = &self.config.expected_features {
            if expected.as_slice() != self.model.feature_names() {
                return Err(AppError::FeatureMismatch {
                    expected: expected.clone(),
                    actual: self.model.feature_names().to_vec(),
                });
            }
        }
        Ok(())
    }

    async fn read_table(&self, path: &str) -> Result<DataTable> {
        let bytes = self.storage.read_file(path).await?;
        let table = DataTable::from_csv_bytes(path, &bytes)?;
        tracing::debug!(
            "{}: {} rows, {} columns",
            path,
            table.len(),
            table.headers().len()
        );
        Ok(table)
    }
}

impl<S: Storage> SqftFillPipeline<S, LinearModel> {
    /// Loads the model artifact named by `config.model_path` from `storage`.
    pub async fn from_storage(storage: S, config: FillerConfig) -> Result<Self> {
        let bytes = storage.read_file(&config.model_path).await?;
        let model = LinearModel::from_json_bytes(&bytes)?;
        tracing::info!(
            "Loaded model {} ({} features, {:?} target)",
            config.model_path,
            model.features.len(),
            model.target
        );
        Ok(Self::new(storage, config, model))
    }
}

#[async_trait::async_trait]
impl<S: Storage, M: RegressionModel> Pipeline for SqftFillPipeline<S, M> {
    type Extracted = FillInput;
    type Transformed = FillOutput;

    fn name(&self) -> &str {
        "sqft fill"
    }

    async fn extract(&self) -> Result<FillInput> {
        self.check_expected_features()?;

        let candidates = self.read_table(&self.config.candidates_path).await?;
        let master = self.read_table(&self.config.master_path).await?;
        Ok(FillInput { candidates, master })
    }

    async fn transform(&self, input: FillInput) -> Result<FillOutput> {
        let FillInput {
            candidates,
            mut master,
        } = input;
        let config = &self.config;

        if candidates.len() != master.len() {
            return Err(AppError::ShapeMismatch {
                message: format!(
                    "{} has {} rows but {} has {}",
                    candidates.name(),
                    candidates.len(),
                    master.name(),
                    master.len()
                ),
            });
        }

        let flag_index = master.require_column(&config.flag_column)?;
        let mask = master
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| table::parse_flag(&row[flag_index], i + 1, &config.flag_column))
            .collect::<Result<Vec<bool>>>()?;

        let encoded = table::one_hot_encode(&candidates, &config.categorical_columns)?;
        let zero_fill: &[String] = if config.absent_indicators_as_zero {
            &config.categorical_columns
        } else {
            &[]
        };
        let features =
            table::select_features(&encoded, self.model.feature_names(), &mask, zero_fill)?;

        let summary = FillSummary {
            total_rows: master.len(),
            filled_rows: features.len(),
        };
        if features.is_empty() {
            tracing::info!("No rows flagged in '{}', nothing to fill", config.flag_column);
            return Ok(FillOutput { master, summary });
        }

        let raw = self.model.predict(&features)?;
        if raw.len() != features.len() {
            return Err(AppError::ShapeMismatch {
                message: format!(
                    "model returned {} predictions for {} rows",
                    raw.len(),
                    features.len()
                ),
            });
        }

        let transform = config
            .target_transform
            .unwrap_or_else(|| self.model.target_transform());
        let target_index = master.ensure_column(&config.target_column);
        let flagged = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &flag)| flag.then_some(i));

        for (row, prediction) in flagged.zip(raw) {
            let value = transform.apply(prediction);
            if !value.is_finite() {
                return Err(AppError::ModelError {
                    message: format!("prediction for row {} is not finite ({})", row + 1, value),
                });
            }
            tracing::debug!("row {}: {} = {}", row + 1, config.target_column, value);
            master.set(row, target_index, value.to_string());
        }

        Ok(FillOutput { master, summary })
    }

    async fn load(&self, output: FillOutput) -> Result<String> {
        let bytes = output.master.to_csv_bytes()?;
        let path = &self.config.output_path;
        self.storage.write_file(path, &bytes).await?;

        tracing::info!(
            "Filled {} of {} rows",
            output.summary.filled_rows,
            output.summary.total_rows
        );
        Ok(self.storage.location(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{FeatureMatrix, TargetTransform};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn with(files: &[(&str, &str)]) -> Self {
            let storage = Self::default();
            {
                let mut map = storage.files.lock().unwrap();
                for (path, body) in files {
                    map.insert(path.to_string(), body.as_bytes().to_vec());
                }
            }
            storage
        }

        fn text(&self, path: &str) -> String {
            let files = self.files.lock().unwrap();
            String::from_utf8(files[path].clone()).unwrap()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().unwrap();
            files.get(path).cloned().ok_or_else(|| {
                AppError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files
                .lock()
                .unwrap()
                .insert(path.to_string(), data.to_vec());
            Ok(())
        }

        fn location(&self, path: &str) -> String {
            format!("mock://{}", path)
        }
    }

    /// Predicts the sum of its features.
    struct SumModel {
        features: Vec<String>,
        target: TargetTransform,
    }

    impl RegressionModel for SumModel {
        fn feature_names(&self) -> &[String] {
            &self.features
        }

        fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
            Ok(features.rows.iter().map(|r| r.iter().sum()).collect())
        }

        fn target_transform(&self) -> TargetTransform {
            self.target
        }
    }

    const CANDIDATES: &str = "beds,baths,zip\n2,1,98103\n3,2,98101\n1,1,98103\n";
    const MASTER: &str = "id,sqft,sqft.regressed\n1,,True\n2,900,False\n3,,True\n";

    fn config() -> FillerConfig {
        FillerConfig {
            categorical_columns: vec!["zip".to_string()],
            ..FillerConfig::default()
        }
    }

    fn pipeline(features: &[&str], target: TargetTransform) -> SqftFillPipeline<MockStorage, SumModel> {
        let storage = MockStorage::with(&[("fill_sqft.csv", CANDIDATES), ("full.csv", MASTER)]);
        let model = SumModel {
            features: features.iter().map(|f| f.to_string()).collect(),
            target,
        };
        SqftFillPipeline::new(storage, config(), model)
    }

    async fn run(pipeline: &SqftFillPipeline<MockStorage, SumModel>) -> Result<String> {
        let input = pipeline.extract().await?;
        let output = pipeline.transform(input).await?;
        pipeline.load(output).await
    }

    #[tokio::test]
    async fn test_fills_only_flagged_rows() {
        let pipeline = pipeline(&["beds", "baths", "zip_98103"], TargetTransform::Identity);

        let location = run(&pipeline).await.unwrap();

        assert_eq!(location, "mock://full_sqft.csv");
        assert_eq!(
            pipeline.storage.text("full_sqft.csv"),
            "id,sqft,sqft.regressed\n1,4,True\n2,900,False\n3,3,True\n"
        );
    }

    #[tokio::test]
    async fn test_log_target_is_exponentiated() {
        let pipeline = pipeline(&["baths"], TargetTransform::Log);

        let input = pipeline.extract().await.unwrap();
        let output = pipeline.transform(input).await.unwrap();

        let sqft = output.master.column_index("sqft").unwrap();
        let expected = 1.0_f64.exp().to_string();
        assert_eq!(output.master.cell(0, sqft), Some(expected.as_str()));
        assert_eq!(output.master.cell(1, sqft), Some("900"));
        assert_eq!(output.summary, FillSummary { total_rows: 3, filled_rows: 2 });
    }

    #[tokio::test]
    async fn test_config_override_beats_model_transform() {
        let mut pipeline = pipeline(&["beds"], TargetTransform::Log);
        pipeline.config.target_transform = Some(TargetTransform::Identity);

        let input = pipeline.extract().await.unwrap();
        let output = pipeline.transform(input).await.unwrap();

        let sqft = output.master.column_index("sqft").unwrap();
        assert_eq!(output.master.cell(2, sqft), Some("1"));
    }

    #[tokio::test]
    async fn test_absent_category_fails_fast() {
        let pipeline = pipeline(&["beds", "zip_98105"], TargetTransform::Identity);

        let err = run(&pipeline).await.unwrap_err();

        assert!(matches!(err, AppError::MissingFeature { ref feature } if feature == "zip_98105"));
        assert!(pipeline.storage.read_file("full_sqft.csv").await.is_err());
    }

    #[tokio::test]
    async fn test_expected_features_checked_before_reading_data() {
        let mut pipeline = pipeline(&["beds"], TargetTransform::Identity);
        pipeline.config.expected_features = Some(vec!["beds".to_string(), "baths".to_string()]);
        pipeline.config.candidates_path = "missing.csv".to_string();

        let err = pipeline.extract().await.err().unwrap();
        assert!(matches!(err, AppError::FeatureMismatch { .. }));
    }

    #[tokio::test]
    async fn test_row_count_mismatch() {
        let storage = MockStorage::with(&[
            ("fill_sqft.csv", "beds,baths,zip\n2,1,98103\n"),
            ("full.csv", MASTER),
        ]);
        let model = SumModel {
            features: vec!["beds".to_string()],
            target: TargetTransform::Identity,
        };
        let pipeline = SqftFillPipeline::new(storage, config(), model);

        let input = pipeline.extract().await.unwrap();
        let err = pipeline.transform(input).await.err().unwrap();
        assert!(matches!(err, AppError::ShapeMismatch { .. }));
    }

    #[tokio::test]
    async fn test_from_storage_loads_linear_model() {
        let storage = MockStorage::with(&[(
            "final_sqft_mod.json",
            r#"{"features": ["beds"], "coefficients": [100.0], "intercept": 250.0}"#,
        )]);

        let pipeline = SqftFillPipeline::from_storage(storage, config()).await.unwrap();
        assert_eq!(pipeline.model().features, vec!["beds".to_string()]);
    }
}
