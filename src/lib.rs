//! imgnorm normalizes images uploaded to an object store.
//!
//! When a storage-change notification arrives for a source bucket, the pipeline downloads the
//! object, scales it down to fit a bounding box without distorting it, re-encodes it into a
//! single output format, and writes it to a destination bucket under the same key with the
//! output extension.
//!
//! # Pipeline overview
//!
//! 1. **Validate**: `Notification -> PipelineRequest` (pure; rejects before any IO)
//! 2. **Fetch**: `ObjectRef -> StoredObject` through a [`StorageGateway`]
//! 3. **Transform**: decode, [`plan`] a uniform scale, resize, encode
//! 4. **Store**: write the [`TransformedAsset`] to the destination
//!
//! [`Pipeline::handle`] runs all four and always returns an [`InvocationResult`].
#![forbid(unsafe_code)]

mod config;
mod event;
mod foundation;
mod pipeline;
mod scaling;
mod storage;
mod transform;

pub use config::{ErrorPolicy, OutputFormat, PipelineConfig, SUPPORTED_EXTENSIONS, ScalingPolicy};
pub use event::notification::{
    Notification, NotificationRecord, S3Bucket, S3Entity, S3Object,
};
pub use event::validate::{decode_object_key, destination_key, image_extension, validate};
pub use foundation::core::{
    ImageDimensions, InvocationResult, ObjectRef, PipelineRequest, ScalingPlan, TransformedAsset,
};
pub use foundation::error::{
    ImgnormError, ImgnormResult, StorageError, TransformError, ValidationError,
};
pub use pipeline::{OPAQUE_MESSAGE, Pipeline, Stage, StageFailure, StoreReport};
pub use scaling::{plan, plan_with_policy};
pub use storage::fs::{FsStorage, normalize_key};
pub use storage::memory::MemoryStorage;
pub use storage::{StorageGateway, StoredObject, guess_content_type};
pub use transform::{ImageTransformer, encode};
