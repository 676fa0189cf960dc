use std::fmt;

use crate::{
    config::{ErrorPolicy, PipelineConfig},
    event::{notification::Notification, validate::validate},
    foundation::core::{InvocationResult, PipelineRequest, TransformedAsset},
    foundation::error::{ImgnormError, ImgnormResult},
    storage::{StorageGateway, StoredObject},
    transform::ImageTransformer,
};

/// Message returned for every non-validation outcome under [`ErrorPolicy::Swallow`].
pub const OPAQUE_MESSAGE: &str = "message";

/// Pipeline states, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validating,
    Fetching,
    Transforming,
    Storing,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validating => "validating",
            Self::Fetching => "fetching",
            Self::Transforming => "transforming",
            Self::Storing => "storing",
            Self::Done => "done",
        };
        f.write_str(s)
    }
}

/// Error raised by a stage, tagged with the stage that produced it.
#[derive(Debug)]
pub struct StageFailure {
    pub stage: Stage,
    pub error: ImgnormError,
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.error)
    }
}

impl std::error::Error for StageFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Summary of a completed fetch/transform/store run.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct StoreReport {
    pub request: PipelineRequest,
    pub source_bytes: usize,
    pub output_bytes: usize,
    pub content_type: String,
}

/// Runs one notification through validate, fetch, transform, and store.
///
/// Holds only immutable configuration and a shared gateway, so one instance can serve
/// concurrent invocations.
pub struct Pipeline<'a> {
    config: PipelineConfig,
    transformer: ImageTransformer,
    storage: &'a dyn StorageGateway,
}

impl<'a> Pipeline<'a> {
    /// Build a pipeline after validating `config`.
    pub fn new(config: PipelineConfig, storage: &'a dyn StorageGateway) -> ImgnormResult<Self> {
        config.validate()?;
        let transformer = ImageTransformer::new(config.scaling, config.output);
        Ok(Self {
            config,
            transformer,
            storage,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Handle one notification to completion and report the outcome.
    ///
    /// Validation failures always produce `success == false` with the validator's reason.
    /// Later failures are logged with both object identifiers and reported according to
    /// the configured [`ErrorPolicy`].
    #[tracing::instrument(skip_all)]
    pub fn handle(&self, notification: &Notification) -> InvocationResult {
        tracing::debug!(stage = %Stage::Validating, "start");
        let request = match validate(notification, &self.config) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(reason = %err, "rejected notification");
                return InvocationResult::failed(err.to_string(), None);
            }
        };

        let (src, dst) = (&request.source, &request.destination);
        match self.execute(&request) {
            Ok(report) => {
                tracing::info!(
                    source = %src,
                    destination = %dst,
                    output_bytes = report.output_bytes,
                    "Successfully resized {src} and uploaded to {dst}"
                );
                match self.config.error_policy {
                    ErrorPolicy::Surface => InvocationResult::succeeded(format!(
                        "Successfully resized {src} and uploaded to {dst}"
                    )),
                    ErrorPolicy::Swallow => InvocationResult::succeeded(OPAQUE_MESSAGE),
                }
            }
            Err(failure) => {
                tracing::error!(
                    source = %src,
                    destination = %dst,
                    stage = %failure.stage,
                    "Unable to resize {src} and upload to {dst} due to an error: {}",
                    failure.error
                );
                match self.config.error_policy {
                    ErrorPolicy::Surface => InvocationResult::failed(
                        format!("Unable to resize {src} and upload to {dst}"),
                        Some(failure.to_string()),
                    ),
                    ErrorPolicy::Swallow => InvocationResult::succeeded(OPAQUE_MESSAGE),
                }
            }
        }
    }

    /// Fetch, transform, and store an already validated request.
    ///
    /// Stages run strictly in order and the first failure stops the run; nothing written
    /// earlier is rolled back.
    pub fn execute(&self, request: &PipelineRequest) -> Result<StoreReport, StageFailure> {
        let fetched = self.fetch(request)?;
        let source_bytes = fetched.bytes.len();
        let asset = self.transform(fetched)?;
        let content_type = asset.content_type.clone();
        let output_bytes = self.store(request, asset)?;
        tracing::debug!(stage = %Stage::Done, "pipeline complete");

        Ok(StoreReport {
            request: request.clone(),
            source_bytes,
            output_bytes,
            content_type,
        })
    }

    fn fetch(&self, request: &PipelineRequest) -> Result<StoredObject, StageFailure> {
        tracing::debug!(stage = %Stage::Fetching, source = %request.source);
        self.storage
            .fetch(&request.source)
            .map_err(|e| fail(Stage::Fetching, e))
    }

    fn transform(&self, fetched: StoredObject) -> Result<TransformedAsset, StageFailure> {
        tracing::debug!(stage = %Stage::Transforming, content_type = %fetched.content_type);
        self.transformer
            .transform(&fetched.bytes, &fetched.content_type)
            .map_err(|e| fail(Stage::Transforming, e))
    }

    fn store(
        &self,
        request: &PipelineRequest,
        asset: TransformedAsset,
    ) -> Result<usize, StageFailure> {
        tracing::debug!(stage = %Stage::Storing, destination = %request.destination);
        let len = asset.bytes.len();
        self.storage
            .store(&request.destination, asset.bytes, &asset.content_type)
            .map_err(|e| fail(Stage::Storing, e))?;
        Ok(len)
    }
}

fn fail(stage: Stage, err: impl Into<ImgnormError>) -> StageFailure {
    StageFailure {
        stage,
        error: err.into(),
    }
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
