use crate::{
    config::ScalingPolicy,
    foundation::core::{ImageDimensions, ScalingPlan},
};

/// Compute a non-distorting resize that fits `source` into `max_width x max_height`.
///
/// The factor is `min(max_width / w, max_height / h)`. When that factor is `>= 1` the image
/// already fits, and it is reduced by `min(default_scale, factor)` instead of being passed
/// through or upscaled. The same factor is applied to both axes; each axis is then rounded
/// half-up and clamped to at least one pixel.
pub fn plan(
    source: ImageDimensions,
    max_width: u32,
    max_height: u32,
    default_scale: f64,
) -> ScalingPlan {
    let w = f64::from(source.width);
    let h = f64::from(source.height);

    let mut factor = (f64::from(max_width) / w).min(f64::from(max_height) / h);
    if factor >= 1.0 {
        factor = default_scale.min(factor);
    }

    ScalingPlan {
        target_width: scale_axis(w, factor),
        target_height: scale_axis(h, factor),
        factor,
    }
}

/// [`plan`] with the bounding box and default scale taken from `policy`.
pub fn plan_with_policy(source: ImageDimensions, policy: &ScalingPolicy) -> ScalingPlan {
    plan(
        source,
        policy.max_width,
        policy.max_height,
        policy.default_scale,
    )
}

fn scale_axis(len: f64, factor: f64) -> u32 {
    // Inputs are positive, so `round` is half-up here.
    (len * factor).round().clamp(1.0, f64::from(u32::MAX)) as u32
}

#[cfg(test)]
#[path = "../tests/unit/scaling.rs"]
mod tests;
