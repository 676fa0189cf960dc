use std::fmt;

use crate::foundation::error::{ImgnormError, ImgnormResult};

/// Bucket + key pair identifying a stored object.
///
/// Keys held here are already percent-decoded.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ObjectRef {
    bucket: String,
    key: String,
}

impl ObjectRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub fn new(width: u32, height: u32) -> ImgnormResult<Self> {
        if width == 0 || height == 0 {
            return Err(ImgnormError::Other(anyhow::anyhow!(
                "image dimensions must be > 0 (got {width}x{height})"
            )));
        }
        Ok(Self { width, height })
    }

    pub fn aspect_ratio(self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

/// Target size for a resize, derived from one uniform scaling factor.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScalingPlan {
    pub target_width: u32,
    pub target_height: u32,
    /// Factor applied to both axes before rounding.
    pub factor: f64,
}

/// Encoded output ready for upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransformedAsset {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Validated source and destination of one invocation.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct PipelineRequest {
    pub source: ObjectRef,
    pub destination: ObjectRef,
}

/// Terminal value handed back to the invoking runtime.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InvocationResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl InvocationResult {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error_detail: None,
        }
    }

    pub fn failed(message: impl Into<String>, error_detail: Option<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error_detail,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
