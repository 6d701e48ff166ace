use crate::artifact::types::{Artifact, BuildArtifact};
use crate::error_handling::types::{AppError, ProcessError};
use crate::processor::post_processor::PostProcessor;
use crate::store::kv_store::KvStore;
use crate::ui::Ui;
use log::{info, warn};

/// Plays the host's role: hands every artifact to the post-processor, one at
/// a time, and keeps score.
pub struct Controller<S: KvStore> {
    processor: PostProcessor<S>,
    ui: Box<dyn Ui>,
}

#[derive(Debug)]
pub struct ArtifactFailure {
    pub artifact: String,
    /// Whether the host may still keep the artifact.
    pub returned: bool,
    pub error: ProcessError,
}

#[derive(Debug, Default)]
pub struct RunReport {
    /// Ids of the artifacts whose snapshot was recorded.
    pub stored: Vec<String>,
    pub failures: Vec<ArtifactFailure>,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.stored.len() + self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_result(self) -> Result<RunReport, AppError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(AppError::Incomplete {
                failed: self.failures.len(),
                total: self.total(),
            })
        }
    }
}

impl<S: KvStore> Controller<S> {
    pub fn new(processor: PostProcessor<S>, ui: Box<dyn Ui>) -> Self {
        info!("Creating controller");
        Self { processor, ui }
    }

    pub fn processor(&self) -> &PostProcessor<S> {
        &self.processor
    }

    /// Post-processes `artifacts` sequentially; a failure never stops the run.
    pub async fn run(&self, artifacts: &[BuildArtifact]) -> RunReport {
        let mut report = RunReport::default();
        if artifacts.is_empty() {
            warn!("No artifacts to process");
            return report;
        }

        self.ui.say(&format!(
            "Recording {} artifact(s) under {}",
            artifacts.len(),
            self.processor.config().store_key()
        ));

        for artifact in artifacts {
            match self.processor.post_process(self.ui.as_ref(), artifact).await {
                Ok(kept) => report.stored.push(kept.id().to_string()),
                Err(failure) => {
                    self.ui
                        .error(&format!("{}: {}", artifact.describe(), failure.error));
                    report.failures.push(ArtifactFailure {
                        artifact: artifact.describe(),
                        returned: failure.artifact.is_some(),
                        error: failure.error,
                    });
                }
            }
        }

        info!(
            "Run finished: {} stored, {} failed",
            report.stored.len(),
            report.failures.len()
        );
        report
    }
}
