use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{ImgnormError, ImgnormResult};

/// Image extensions accepted from the source bucket (lower-case, without dot).
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Deployment parameters for one pipeline instance.
///
/// Bucket names are required; everything else defaults to the observed production policy
/// (500x500 bounding box, 0.8 default scale, quality 90, `.png` output).
pub struct PipelineConfig {
    /// Bucket whose notifications are accepted.
    pub source_bucket: String,
    /// Bucket receiving normalized images.
    pub destination_bucket: String,
    /// Bounding box and encoder policy.
    #[serde(default)]
    pub scaling: ScalingPolicy,
    /// Output container, also used as the destination key extension.
    #[serde(default)]
    pub output: OutputFormat,
    /// How failures after validation are reported.
    #[serde(default)]
    pub error_policy: ErrorPolicy,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Bounding box, default reduction, and encoder quality.
pub struct ScalingPolicy {
    /// Maximum output width in pixels.
    #[serde(default = "default_max_width")]
    pub max_width: u32,
    /// Maximum output height in pixels.
    #[serde(default = "default_max_height")]
    pub max_height: u32,
    /// Factor applied to images that already fit the bounding box. Must be in `(0, 1)`.
    #[serde(default = "default_scale")]
    pub default_scale: f64,
    /// Encoder quality dial in `1..=100`.
    #[serde(default = "default_quality")]
    pub quality: u8,
}

impl Default for ScalingPolicy {
    fn default() -> Self {
        Self {
            max_width: default_max_width(),
            max_height: default_max_height(),
            default_scale: default_scale(),
            quality: default_quality(),
        }
    }
}

fn default_max_width() -> u32 {
    500
}

fn default_max_height() -> u32 {
    500
}

fn default_scale() -> f64 {
    0.8
}

fn default_quality() -> u8 {
    90
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
/// Container written to the destination bucket.
pub enum OutputFormat {
    /// PNG, written with a `.png` key extension.
    #[default]
    Png,
    /// JPEG, written with a `.jpg` key extension.
    Jpeg,
}

impl OutputFormat {
    /// Parse a configured extension (`png`, `jpg`, `jpeg`, optionally dot-prefixed).
    pub fn from_extension(ext: &str) -> ImgnormResult<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            other => Err(ImgnormError::config(format!(
                "unsupported output extension '{other}'"
            ))),
        }
    }

    /// Extension appended to destination keys, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
/// Reporting policy for fetch/decode/encode/store failures.
///
/// Validation failures are always reported as failures regardless of this setting.
pub enum ErrorPolicy {
    /// Report downstream failures as failed invocations with detail.
    #[default]
    Surface,
    /// Log downstream failures and report a generic success.
    Swallow,
}

impl PipelineConfig {
    /// Build a config with default policy for the given buckets.
    pub fn new(source_bucket: impl Into<String>, destination_bucket: impl Into<String>) -> Self {
        Self {
            source_bucket: source_bucket.into(),
            destination_bucket: destination_bucket.into(),
            scaling: ScalingPolicy::default(),
            output: OutputFormat::default(),
            error_policy: ErrorPolicy::default(),
        }
    }

    /// Read and validate a JSON config file.
    pub fn from_path(path: &Path) -> ImgnormResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Parse and validate a JSON config document.
    pub fn from_json_str(text: &str) -> ImgnormResult<Self> {
        let cfg: Self = serde_json::from_str(text)
            .map_err(|e| ImgnormError::config(format!("parse config json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check invariants that the planner and validator rely on.
    ///
    /// Equal source and destination buckets pass here; the event validator reports them
    /// per invocation.
    pub fn validate(&self) -> ImgnormResult<()> {
        if self.source_bucket.trim().is_empty() {
            return Err(ImgnormError::config("source_bucket must be non-empty"));
        }
        if self.destination_bucket.trim().is_empty() {
            return Err(ImgnormError::config("destination_bucket must be non-empty"));
        }
        let s = &self.scaling;
        if s.max_width == 0 || s.max_height == 0 {
            return Err(ImgnormError::config("max_width/max_height must be > 0"));
        }
        if !s.default_scale.is_finite() || s.default_scale <= 0.0 || s.default_scale >= 1.0 {
            return Err(ImgnormError::config(
                "default_scale must be finite and in (0, 1)",
            ));
        }
        if !(1..=100).contains(&s.quality) {
            return Err(ImgnormError::config("quality must be in 1..=100"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
