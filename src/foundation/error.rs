/// Convenience result type used across imgnorm.
pub type ImgnormResult<T> = Result<T, ImgnormError>;

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum ImgnormError {
    /// The inbound notification was rejected before any storage access.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Decoding or re-encoding the image failed.
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// The storage backend failed to read or write an object.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Invalid pipeline configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImgnormError {
    /// Build a [`ImgnormError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Reasons a notification is refused by the event validator.
///
/// The `Display` strings are the reason messages reported to the invoking runtime and
/// must stay stable.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The notification carries no usable record, bucket name or object key.
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    /// The record names a bucket other than the configured source bucket.
    #[error("Source bucket is not correct.")]
    WrongSourceBucket,

    /// The object key has no `.`-delimited extension.
    #[error("Could not determine the image type.")]
    UnknownImageType,

    /// The extension is outside the supported set (already lower-cased).
    #[error("Unsupported image type: {0}")]
    UnsupportedImageType(String),

    /// Source and destination resolve to the same bucket.
    #[error("Source and destination buckets are the same.")]
    SameBucket,
}

/// Failures while turning source bytes into the normalized output.
#[derive(thiserror::Error, Debug)]
pub enum TransformError {
    /// The source bytes could not be decoded as an image.
    #[error("decode error: {0}")]
    Decode(String),

    /// The resized image could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),
}

impl TransformError {
    /// Build a [`TransformError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`TransformError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

/// Failures reported by a [`crate::StorageGateway`].
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    /// Reading `bucket/key` failed.
    #[error("fetch error for {bucket}/{key}: {source}")]
    Fetch {
        /// Bucket that was read.
        bucket: String,
        /// Key that was read.
        key: String,
        /// Underlying cause.
        #[source]
        source: anyhow::Error,
    },

    /// Writing `bucket/key` failed.
    #[error("store error for {bucket}/{key}: {source}")]
    Store {
        /// Bucket that was written.
        bucket: String,
        /// Key that was written.
        key: String,
        /// Underlying cause.
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
