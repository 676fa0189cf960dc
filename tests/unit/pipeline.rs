use std::io::Cursor;

use super::*;
use crate::{
    foundation::core::ObjectRef,
    foundation::error::StorageError,
    storage::{fetch_error, memory::MemoryStorage, store_error},
};

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 10, 10, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn config() -> PipelineConfig {
    PipelineConfig::new("correct-bucket", "resized-bucket")
}

struct ReadOnlyStorage(MemoryStorage);

impl StorageGateway for ReadOnlyStorage {
    fn fetch(&self, obj: &ObjectRef) -> Result<StoredObject, StorageError> {
        self.0.fetch(obj)
    }

    fn store(&self, obj: &ObjectRef, _: Vec<u8>, _: &str) -> Result<(), StorageError> {
        Err(store_error(obj, anyhow::anyhow!("bucket is read-only")))
    }
}

struct OfflineStorage;

impl StorageGateway for OfflineStorage {
    fn fetch(&self, obj: &ObjectRef) -> Result<StoredObject, StorageError> {
        Err(fetch_error(obj, anyhow::anyhow!("connection refused")))
    }

    fn store(&self, obj: &ObjectRef, _: Vec<u8>, _: &str) -> Result<(), StorageError> {
        Err(store_error(obj, anyhow::anyhow!("connection refused")))
    }
}

#[test]
fn happy_path_stores_resized_png() {
    let storage = MemoryStorage::new();
    storage.insert(
        ObjectRef::new("correct-bucket", "a/b/pic.png"),
        png(1000, 2000),
        "image/png",
    );
    let pipeline = Pipeline::new(config(), &storage).unwrap();

    let res = pipeline.handle(&Notification::single("correct-bucket", "a/b/pic.png"));
    assert!(res.success, "{res:?}");
    assert_eq!(storage.fetch_count(), 1);
    assert_eq!(storage.store_count(), 1);

    let out = storage
        .get(&ObjectRef::new("resized-bucket", "a/b/pic.png"))
        .unwrap();
    assert_eq!(out.content_type, "image/png");
    let decoded = image::load_from_memory(&out.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (250, 500));
}

#[test]
fn validation_failures_never_touch_storage() {
    let cases = [
        (config(), "wrong-bucket", "photo.jpg", "Source bucket is not correct."),
        (config(), "correct-bucket", "photo", "Could not determine the image type."),
        (config(), "correct-bucket", "photo.gif", "Unsupported image type: gif"),
        (
            PipelineConfig::new("correct-bucket", "correct-bucket"),
            "correct-bucket",
            "photo.jpg",
            "Source and destination buckets are the same.",
        ),
    ];

    for (cfg, bucket, key, reason) in cases {
        let storage = MemoryStorage::new();
        let pipeline = Pipeline::new(cfg, &storage).unwrap();
        let res = pipeline.handle(&Notification::single(bucket, key));
        assert_eq!(res, InvocationResult::failed(reason, None));
        assert_eq!(storage.fetch_count(), 0);
        assert_eq!(storage.store_count(), 0);
    }
}

#[test]
fn validation_failures_ignore_swallow_policy() {
    let mut cfg = config();
    cfg.error_policy = ErrorPolicy::Swallow;
    let storage = MemoryStorage::new();
    let pipeline = Pipeline::new(cfg, &storage).unwrap();
    let res = pipeline.handle(&Notification::single("wrong-bucket", "photo.jpg"));
    assert!(!res.success);
}

#[test]
fn fetch_failure_stops_before_store() {
    let storage = MemoryStorage::new();
    let pipeline = Pipeline::new(config(), &storage).unwrap();

    let res = pipeline.handle(&Notification::single("correct-bucket", "missing.png"));
    assert!(!res.success);
    assert!(res.error_detail.unwrap().starts_with("fetching failed"));
    assert_eq!(storage.fetch_count(), 1);
    assert_eq!(storage.store_count(), 0);
}

#[test]
fn decode_failure_is_reported_at_transform_stage() {
    let storage = MemoryStorage::new();
    let src = ObjectRef::new("correct-bucket", "broken.jpg");
    storage.insert(src.clone(), b"not a jpeg".to_vec(), "image/jpeg");
    let pipeline = Pipeline::new(config(), &storage).unwrap();

    let request = PipelineRequest {
        source: src,
        destination: ObjectRef::new("resized-bucket", "broken.png"),
    };
    let failure = pipeline.execute(&request).unwrap_err();
    assert_eq!(failure.stage, Stage::Transforming);
    assert!(matches!(
        failure.error,
        ImgnormError::Transform(crate::foundation::error::TransformError::Decode(_))
    ));
    assert_eq!(storage.store_count(), 0);
}

#[test]
fn store_failure_is_surfaced_by_default() {
    let inner = MemoryStorage::new();
    inner.insert(
        ObjectRef::new("correct-bucket", "pic.png"),
        png(10, 10),
        "image/png",
    );
    let storage = ReadOnlyStorage(inner);
    let pipeline = Pipeline::new(config(), &storage).unwrap();

    let res = pipeline.handle(&Notification::single("correct-bucket", "pic.png"));
    assert!(!res.success);
    assert_eq!(
        res.message,
        "Unable to resize correct-bucket/pic.png and upload to resized-bucket/pic.png"
    );
    let detail = res.error_detail.unwrap();
    assert!(detail.starts_with("storing failed"));
    assert!(detail.contains("read-only"));
}

#[test]
fn swallow_policy_reports_opaque_success() {
    let mut cfg = config();
    cfg.error_policy = ErrorPolicy::Swallow;
    let pipeline = Pipeline::new(cfg, &OfflineStorage).unwrap();

    let res = pipeline.handle(&Notification::single("correct-bucket", "pic.png"));
    assert_eq!(res, InvocationResult::succeeded(OPAQUE_MESSAGE));
}

#[test]
fn swallow_policy_success_is_also_opaque() {
    let storage = MemoryStorage::new();
    storage.insert(
        ObjectRef::new("correct-bucket", "pic.jpeg"),
        png(10, 10),
        "image/jpeg",
    );
    let mut cfg = config();
    cfg.error_policy = ErrorPolicy::Swallow;
    let pipeline = Pipeline::new(cfg, &storage).unwrap();

    let res = pipeline.handle(&Notification::single("correct-bucket", "pic.jpeg"));
    assert_eq!(res, InvocationResult::succeeded(OPAQUE_MESSAGE));
    let out = storage
        .get(&ObjectRef::new("resized-bucket", "pic.png"))
        .unwrap();
    assert_eq!(out.content_type, "image/png");
}

#[test]
fn execute_reports_sizes() {
    let storage = MemoryStorage::new();
    let src_bytes = png(100, 100);
    let src = ObjectRef::new("correct-bucket", "pic.png");
    storage.insert(src.clone(), src_bytes.clone(), "image/png");
    let pipeline = Pipeline::new(config(), &storage).unwrap();

    let request = PipelineRequest {
        source: src,
        destination: ObjectRef::new("resized-bucket", "pic.png"),
    };
    let report = pipeline.execute(&request).unwrap();
    assert_eq!(report.source_bytes, src_bytes.len());
    assert_eq!(report.content_type, "image/png");
    assert!(report.output_bytes > 0);
}

#[test]
fn invalid_config_is_rejected_at_construction() {
    let mut cfg = config();
    cfg.scaling.default_scale = 2.0;
    assert!(Pipeline::new(cfg, &OfflineStorage).is_err());
}

#[test]
fn stage_display_names() {
    assert_eq!(Stage::Fetching.to_string(), "fetching");
    assert_eq!(Stage::Done.to_string(), "done");
}
