use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Runs a pipeline's extract, transform and load phases in order.
pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<String> {
        let name = self.pipeline.name();
        tracing::info!("🚀 Starting {}", name);
        self.monitor.log_stats("Start");

        tracing::info!("📥 Extracting...");
        let extracted = self.pipeline.extract().await?;
        self.monitor.log_stats("Extract");

        tracing::info!("🔄 Transforming...");
        let transformed = self.pipeline.transform(extracted).await?;
        self.monitor.log_stats("Transform");

        tracing::info!("💾 Loading...");
        let output_path = self.pipeline.load(transformed).await?;
        self.monitor.log_stats("Load");

        tracing::info!("✅ {} finished, output at {}", name, output_path);
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::AppError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingPipeline {
        phases: Mutex<Vec<&'static str>>,
        fail_transform: bool,
    }

    impl RecordingPipeline {
        fn new(fail_transform: bool) -> Self {
            Self {
                phases: Mutex::new(Vec::new()),
                fail_transform,
            }
        }

        fn phases(&self) -> Vec<&'static str> {
            self.phases.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Pipeline for RecordingPipeline {
        type Extracted = Vec<u32>;
        type Transformed = u32;

        fn name(&self) -> &str {
            "recording"
        }

        async fn extract(&self) -> Result<Vec<u32>> {
            self.phases.lock().unwrap().push("extract");
            Ok(vec![1, 2, 3])
        }

        async fn transform(&self, data: Vec<u32>) -> Result<u32> {
            self.phases.lock().unwrap().push("transform");
            if self.fail_transform {
                return Err(AppError::ShapeMismatch {
                    message: "boom".to_string(),
                });
            }
            Ok(data.iter().sum())
        }

        async fn load(&self, result: u32) -> Result<String> {
            self.phases.lock().unwrap().push("load");
            Ok(format!("sum-{}", result))
        }
    }

    #[tokio::test]
    async fn test_runs_phases_in_order() {
        let engine = EtlEngine::new(RecordingPipeline::new(false));

        let output = engine.run().await.unwrap();

        assert_eq!(output, "sum-6");
        assert_eq!(engine.pipeline().phases(), vec!["extract", "transform", "load"]);
    }

    #[tokio::test]
    async fn test_failure_stops_before_load() {
        let engine = EtlEngine::new_with_monitoring(RecordingPipeline::new(true), true);

        let err = engine.run().await.unwrap_err();

        assert!(matches!(err, AppError::ShapeMismatch { .. }));
        assert_eq!(engine.pipeline().phases(), vec!["extract", "transform"]);
    }
}
