use super::*;

fn config() -> PipelineConfig {
    PipelineConfig::new("correct-bucket", "resized-bucket")
}

#[test]
fn accepts_supported_key_and_derives_destination() {
    let n = Notification::single("correct-bucket", "a/b/pic.JPG");
    let req = validate(&n, &config()).unwrap();
    assert_eq!(req.source, ObjectRef::new("correct-bucket", "a/b/pic.JPG"));
    assert_eq!(req.destination, ObjectRef::new("resized-bucket", "a/b/pic.png"));
}

#[test]
fn key_is_plus_and_percent_decoded() {
    let n = Notification::single("correct-bucket", "my+holiday/caf%C3%A9+%2B1.png");
    let req = validate(&n, &config()).unwrap();
    assert_eq!(req.source.key(), "my holiday/café +1.png");
    assert_eq!(req.destination.key(), "my holiday/café +1.png");
}

#[test]
fn wrong_bucket_is_rejected() {
    let n = Notification::single("wrong-bucket", "photo.jpg");
    let err = validate(&n, &config()).unwrap_err();
    assert_eq!(err, ValidationError::WrongSourceBucket);
    assert_eq!(err.to_string(), "Source bucket is not correct.");
}

#[test]
fn key_without_extension_is_rejected() {
    let n = Notification::single("correct-bucket", "photo");
    let err = validate(&n, &config()).unwrap_err();
    assert_eq!(err.to_string(), "Could not determine the image type.");
}

#[test]
fn unsupported_extension_is_rejected_lowercased() {
    let n = Notification::single("correct-bucket", "photo.gif");
    let err = validate(&n, &config()).unwrap_err();
    assert_eq!(err.to_string(), "Unsupported image type: gif");

    let n = Notification::single("correct-bucket", "photo.TIFF");
    let err = validate(&n, &config()).unwrap_err();
    assert_eq!(err, ValidationError::UnsupportedImageType("tiff".into()));
}

#[test]
fn same_bucket_is_rejected() {
    let cfg = PipelineConfig::new("correct-bucket", "correct-bucket");
    let n = Notification::single("correct-bucket", "photo.jpg");
    let err = validate(&n, &cfg).unwrap_err();
    assert_eq!(err.to_string(), "Source and destination buckets are the same.");
}

#[test]
fn same_bucket_is_checked_before_image_type() {
    let cfg = PipelineConfig::new("correct-bucket", "correct-bucket");
    let n = Notification::single("correct-bucket", "photo.gif");
    assert_eq!(validate(&n, &cfg).unwrap_err(), ValidationError::SameBucket);
}

#[test]
fn empty_or_partial_events_are_malformed() {
    let empty = Notification::default();
    assert!(matches!(
        validate(&empty, &config()),
        Err(ValidationError::MalformedEvent(_))
    ));

    let no_key = Notification::single("correct-bucket", "");
    assert!(matches!(
        validate(&no_key, &config()),
        Err(ValidationError::MalformedEvent(_))
    ));

    let no_bucket = Notification::from_json_str(r#"{"Records":[{"s3":{"object":{"key":"a.png"}}}]}"#)
        .unwrap();
    assert!(matches!(
        validate(&no_bucket, &config()),
        Err(ValidationError::MalformedEvent(_))
    ));
}

#[test]
fn only_first_record_is_used() {
    let mut n = Notification::single("correct-bucket", "first.png");
    n.records
        .extend(Notification::single("wrong-bucket", "second.gif").records);
    let req = validate(&n, &config()).unwrap();
    assert_eq!(req.source.key(), "first.png");
}

#[test]
fn parses_s3_event_json() {
    let json = r#"{
        "Records": [{
            "eventVersion": "2.1",
            "eventSource": "aws:s3",
            "eventName": "ObjectCreated:Put",
            "s3": {
                "bucket": { "name": "correct-bucket", "arn": "arn:aws:s3:::correct-bucket" },
                "object": { "key": "uploads/Big+Photo.jpeg", "size": 1024, "eTag": "abc" }
            }
        }]
    }"#;
    let n = Notification::from_json_str(json).unwrap();
    let req = validate(&n, &config()).unwrap();
    assert_eq!(req.source.key(), "uploads/Big Photo.jpeg");
    assert_eq!(req.destination.key(), "uploads/Big Photo.png");
}

#[test]
fn invalid_utf8_escape_is_malformed() {
    assert!(matches!(
        decode_object_key("bad%FF.png"),
        Err(ValidationError::MalformedEvent(_))
    ));
}

#[test]
fn broken_percent_escapes_are_malformed() {
    for key in ["bad%zz.png", "bad%.png", "bad%4.png", "trailing.png%"] {
        let n = Notification::single("correct-bucket", key);
        assert!(
            matches!(validate(&n, &config()), Err(ValidationError::MalformedEvent(_))),
            "{key}"
        );
    }
    assert_eq!(decode_object_key("100%25+off.png").unwrap(), "100% off.png");
}

#[test]
fn naming_is_deterministic() {
    for key in ["pic.jpg", "pic.jpeg", "pic.PNG", "dir.v2/pic.jpg", "x.y.z.png"] {
        let a = destination_key(key, "png");
        let b = destination_key(key, "png");
        assert_eq!(a, b);
        assert!(a.ends_with(".png"));
        assert_eq!(a.matches('.').count(), key.matches('.').count());
    }
    assert_eq!(destination_key("x.y.z.png", "png"), "x.y.z.png");
    assert_eq!(destination_key("a/b/pic.jpeg", "jpg"), "a/b/pic.jpg");
}

#[test]
fn extension_is_text_after_last_dot() {
    assert_eq!(image_extension("a/b/pic.JPG"), Some("JPG"));
    assert_eq!(image_extension("photo"), None);
    assert_eq!(image_extension("photo."), Some(""));
}
