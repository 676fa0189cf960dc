use std::io::Cursor;

use image::{
    DynamicImage,
    codecs::{
        jpeg::JpegEncoder,
        png::{CompressionType, FilterType as PngFilter, PngEncoder},
    },
    imageops::FilterType,
};

use crate::{
    config::{OutputFormat, ScalingPolicy},
    foundation::core::{ImageDimensions, ScalingPlan, TransformedAsset},
    foundation::error::TransformError,
    scaling,
};

/// Decodes source bytes, applies the scaling plan, and re-encodes into the output format.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageTransformer {
    policy: ScalingPolicy,
    output: OutputFormat,
}

impl ImageTransformer {
    pub fn new(policy: ScalingPolicy, output: OutputFormat) -> Self {
        Self { policy, output }
    }

    pub fn policy(&self) -> &ScalingPolicy {
        &self.policy
    }

    pub fn output(&self) -> OutputFormat {
        self.output
    }

    /// Resize `bytes` into the bounding box and encode them.
    ///
    /// The returned content type is always the output format's MIME type; a different
    /// declared `content_type` is only logged, since the bytes no longer match it.
    #[tracing::instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub fn transform(
        &self,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<TransformedAsset, TransformError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| TransformError::decode(format!("decode image from memory: {e}")))?;
        let source = ImageDimensions::new(img.width(), img.height())
            .map_err(|e| TransformError::decode(e.to_string()))?;

        let plan = scaling::plan_with_policy(source, &self.policy);
        tracing::debug!(
            src_width = source.width,
            src_height = source.height,
            target_width = plan.target_width,
            target_height = plan.target_height,
            factor = plan.factor,
            "scaling plan"
        );

        let resized = resize(&img, plan);
        let bytes = encode(&resized, self.output, self.policy.quality)?;

        let out_type = self.output.mime_type();
        if !content_type.eq_ignore_ascii_case(out_type) {
            tracing::debug!(
                declared = content_type,
                written = out_type,
                "overriding declared content type"
            );
        }

        Ok(TransformedAsset {
            bytes,
            content_type: out_type.to_string(),
        })
    }
}

fn resize(img: &DynamicImage, plan: ScalingPlan) -> DynamicImage {
    img.resize_exact(plan.target_width, plan.target_height, FilterType::Lanczos3)
}

/// Encode `img` as `format`, interpreting `quality` the way the format understands it.
///
/// JPEG takes the quality directly. PNG is lossless, so the dial follows the ImageMagick
/// convention: the tens digit picks the zlib effort and the ones digit the row filter.
pub fn encode(
    img: &DynamicImage,
    format: OutputFormat,
    quality: u8,
) -> Result<Vec<u8>, TransformError> {
    let mut buf = Cursor::new(Vec::new());
    let res = match format {
        OutputFormat::Png => {
            let (compression, filter) = png_settings(quality);
            let encoder = PngEncoder::new_with_quality(&mut buf, compression, filter);
            img.write_with_encoder(encoder)
        }
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
            rgb.write_with_encoder(encoder)
        }
    };
    res.map_err(|e| TransformError::encode(format!("encode {format:?}: {e}")))?;
    Ok(buf.into_inner())
}

fn png_settings(quality: u8) -> (CompressionType, PngFilter) {
    let compression = match quality / 10 {
        0..=3 => CompressionType::Fast,
        4..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    };
    let filter = match quality % 10 {
        0 => PngFilter::NoFilter,
        1 => PngFilter::Sub,
        2 => PngFilter::Up,
        3 => PngFilter::Avg,
        4 => PngFilter::Paeth,
        _ => PngFilter::Adaptive,
    };
    (compression, filter)
}

#[cfg(test)]
#[path = "../tests/unit/transform.rs"]
mod tests;
