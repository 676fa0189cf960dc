use crate::{
    config::{PipelineConfig, SUPPORTED_EXTENSIONS},
    event::notification::Notification,
    foundation::core::{ObjectRef, PipelineRequest},
    foundation::error::ValidationError,
};

/// Turn a notification into a source/destination pair, or refuse it.
///
/// Pure parsing and policy: no storage access happens here. Only the first record is
/// considered. Checks run in this order: record shape, source bucket, key extension present,
/// distinct buckets, supported extension.
pub fn validate(
    notification: &Notification,
    config: &PipelineConfig,
) -> Result<PipelineRequest, ValidationError> {
    let record = notification
        .records
        .first()
        .ok_or_else(|| ValidationError::MalformedEvent("notification has no records".into()))?;

    let src_bucket = record.s3.bucket.name.as_str();
    if src_bucket.is_empty() {
        return Err(ValidationError::MalformedEvent(
            "record has no bucket name".into(),
        ));
    }
    if record.s3.object.key.is_empty() {
        return Err(ValidationError::MalformedEvent(
            "record has no object key".into(),
        ));
    }

    if src_bucket != config.source_bucket {
        return Err(ValidationError::WrongSourceBucket);
    }

    let src_key = decode_object_key(&record.s3.object.key)?;
    let ext = image_extension(&src_key).ok_or(ValidationError::UnknownImageType)?;

    let dst_bucket = config.destination_bucket.as_str();
    let dst_key = destination_key(&src_key, config.output.extension());

    if src_bucket == dst_bucket {
        return Err(ValidationError::SameBucket);
    }

    let image_type = ext.to_lowercase();
    if !SUPPORTED_EXTENSIONS.contains(&image_type.as_str()) {
        return Err(ValidationError::UnsupportedImageType(image_type));
    }

    Ok(PipelineRequest {
        source: ObjectRef::new(src_bucket, src_key),
        destination: ObjectRef::new(dst_bucket, dst_key),
    })
}

/// Decode a notification key: `+` becomes a space, then `%XX` sequences are decoded.
///
/// A `%` not followed by two hex digits, or escapes that decode to invalid UTF-8, are
/// reported as a malformed event.
pub fn decode_object_key(encoded: &str) -> Result<String, ValidationError> {
    if let Some(pos) = malformed_escape(encoded) {
        return Err(ValidationError::MalformedEvent(format!(
            "object key has a malformed percent escape at byte {pos}"
        )));
    }
    let spaced = encoded.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|k| k.into_owned())
        .map_err(|e| ValidationError::MalformedEvent(format!("object key is not valid UTF-8: {e}")))
}

fn malformed_escape(key: &str) -> Option<usize> {
    let bytes = key.as_bytes();
    bytes.iter().enumerate().find_map(|(i, &b)| {
        let ok = b != b'%'
            || (bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit));
        (!ok).then_some(i)
    })
}

/// Text after the last `.` of `key`, or `None` when the key has no dot.
///
/// A trailing dot yields `Some("")`, which later fails the supported-type check.
pub fn image_extension(key: &str) -> Option<&str> {
    key.rfind('.').map(|idx| &key[idx + 1..])
}

/// Replace the extension of `key` with `ext`; keys without a dot get `ext` appended.
pub fn destination_key(key: &str, ext: &str) -> String {
    let stem = key.rfind('.').map_or(key, |idx| &key[..idx]);
    format!("{stem}.{ext}")
}

#[cfg(test)]
#[path = "../../tests/unit/event/validate.rs"]
mod tests;
