use crate::domain::model::{FeatureMatrix, TargetTransform};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Where `path` ends up, for reporting.
    fn location(&self, path: &str) -> String;
}

/// Loads the HTML of a page. Non-success responses are errors.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl std::future::Future<Output = Result<String>> + Send;
}

pub trait RegressionModel: Send + Sync {
    /// Feature columns, in the order `predict` expects them.
    fn feature_names(&self) -> &[String];
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>>;
    /// What the model was trained on; `Log` means predictions need `exp`.
    fn target_transform(&self) -> TargetTransform {
        TargetTransform::Identity
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    type Extracted: Send;
    type Transformed: Send;

    fn name(&self) -> &str;
    async fn extract(&self) -> Result<Self::Extracted>;
    async fn transform(&self, data: Self::Extracted) -> Result<Self::Transformed>;
    async fn load(&self, result: Self::Transformed) -> Result<String>;
}
