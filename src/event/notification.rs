use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{ImgnormError, ImgnormResult};

/// Storage-change notification in the S3 event shape.
///
/// Only the fields the pipeline reads are modelled; everything else in the payload is ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Notification {
    #[serde(rename = "Records", default)]
    pub records: Vec<NotificationRecord>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NotificationRecord {
    #[serde(rename = "eventName", default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(default)]
    pub s3: S3Entity,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct S3Entity {
    #[serde(default)]
    pub bucket: S3Bucket,
    #[serde(default)]
    pub object: S3Object,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct S3Bucket {
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct S3Object {
    /// Percent-encoded key, with `+` standing for a space.
    #[serde(default)]
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl Notification {
    /// Build a single-record notification; keys are expected in encoded form.
    pub fn single(bucket: impl Into<String>, encoded_key: impl Into<String>) -> Self {
        Self {
            records: vec![NotificationRecord {
                event_name: Some("ObjectCreated:Put".to_string()),
                s3: S3Entity {
                    bucket: S3Bucket { name: bucket.into() },
                    object: S3Object {
                        key: encoded_key.into(),
                        size: None,
                    },
                },
            }],
        }
    }

    pub fn from_json_str(text: &str) -> ImgnormResult<Self> {
        serde_json::from_str(text)
            .context("parse notification json")
            .map_err(ImgnormError::from)
    }

    pub fn from_path(path: &Path) -> ImgnormResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read notification '{}'", path.display()))?;
        Self::from_json_str(&text)
    }
}
