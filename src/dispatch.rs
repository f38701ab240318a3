//! Dispatches quantization requests to the selected method.

use crate::{igs, uniform, ImageBuf, ImageSlice, LevelCount, QuantizeError, QuantizeMethod};
use tracing::{debug, warn};

/// Quantizes `image` to `levels` levels per channel using the given method
/// and returns the quantized image.
///
/// The output has the same width, height and channel count as `image`.
///
/// # Examples
/// ```
/// # use greylevels::{quantize, ImageSlice, LevelCount, QuantizeError, QuantizeMethod};
/// # fn main() -> Result<(), QuantizeError> {
/// let image = ImageSlice::new(&[100, 150, 200], 1, 1, 3)?;
/// let output = quantize(image, LevelCount::try_from(4u8)?, QuantizeMethod::Uniform);
/// assert_eq!(output.samples(), &[1, 2, 3]);
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn quantize(image: ImageSlice<'_>, levels: LevelCount, method: QuantizeMethod) -> ImageBuf {
    debug!(%method, %levels, shape = %image.shape(), "quantizing image");
    match method {
        QuantizeMethod::Uniform => uniform::quantize(image, levels),
        QuantizeMethod::Igs => igs::quantize(image, levels),
    }
}

/// Quantizes `image` to `levels` levels per channel using the given method,
/// writing the result to `output`.
///
/// # Errors
/// Returns [`QuantizeError::ShapeMismatch`] if `output` does not have the same shape as `image`.
/// In this case, `output` is left untouched.
pub fn quantize_into(
    image: ImageSlice<'_>,
    levels: LevelCount,
    method: QuantizeMethod,
    output: &mut ImageBuf,
) -> Result<(), QuantizeError> {
    debug!(%method, %levels, shape = %image.shape(), "quantizing image into buffer");
    let result = match method {
        QuantizeMethod::Uniform => uniform::quantize_into(image, levels, output),
        QuantizeMethod::Igs => igs::quantize_into(image, levels, output),
    };

    result.inspect_err(|err| warn!(%err, "quantization rejected"))
}

/// Validates an untyped level count and method name.
fn parse_request(levels: i64, method: &str) -> Result<(LevelCount, QuantizeMethod), QuantizeError> {
    let levels = LevelCount::try_from(levels)?;
    let method = method.parse::<QuantizeMethod>()?;
    Ok((levels, method))
}

/// Quantizes `image` given an untyped level count and method name
/// (e.g., taken straight from user input).
///
/// The level count and method are validated before any output is allocated.
///
/// # Errors
/// Returns [`QuantizeError::InvalidLevelCount`] if `levels` is not in `1..=256`, or
/// [`QuantizeError::UnsupportedMethod`] if `method` does not name a [`QuantizeMethod`].
///
/// # Examples
/// ```
/// # use greylevels::{try_quantize, ImageSlice, QuantizeError};
/// # fn main() -> Result<(), QuantizeError> {
/// let image = ImageSlice::new(&[10, 250, 5], 3, 1, 1)?;
/// assert_eq!(try_quantize(image, 5, "igs")?.samples(), &[0, 5, 0]);
/// assert!(try_quantize(image, 5, "median-cut").is_err());
/// assert!(try_quantize(image, 0, "igs").is_err());
/// # Ok(())
/// # }
/// ```
pub fn try_quantize(
    image: ImageSlice<'_>,
    levels: i64,
    method: &str,
) -> Result<ImageBuf, QuantizeError> {
    let (levels, method) =
        parse_request(levels, method).inspect_err(|err| warn!(%err, "quantization rejected"))?;

    Ok(quantize(image, levels, method))
}

/// Quantizes `image` in parallel to `levels` levels per channel using the given method
/// and returns the quantized image.
///
/// The output is identical to that of [`quantize`].
#[must_use]
#[cfg(feature = "threads")]
pub fn quantize_par(image: ImageSlice<'_>, levels: LevelCount, method: QuantizeMethod) -> ImageBuf {
    debug!(%method, %levels, shape = %image.shape(), "quantizing image in parallel");
    match method {
        QuantizeMethod::Uniform => uniform::quantize_par(image, levels),
        QuantizeMethod::Igs => igs::quantize_par(image, levels),
    }
}

/// Quantizes `image` in parallel to `levels` levels per channel using the given method,
/// writing the result to `output`.
///
/// # Errors
/// Returns [`QuantizeError::ShapeMismatch`] if `output` does not have the same shape as `image`.
/// In this case, `output` is left untouched.
#[cfg(feature = "threads")]
pub fn quantize_into_par(
    image: ImageSlice<'_>,
    levels: LevelCount,
    method: QuantizeMethod,
    output: &mut ImageBuf,
) -> Result<(), QuantizeError> {
    debug!(%method, %levels, shape = %image.shape(), "quantizing image into buffer in parallel");
    let result = match method {
        QuantizeMethod::Uniform => uniform::quantize_into_par(image, levels, output),
        QuantizeMethod::Igs => igs::quantize_into_par(image, levels, output),
    };

    result.inspect_err(|err| warn!(%err, "quantization rejected"))
}

/// Quantizes `image` in parallel given an untyped level count and method name.
///
/// # Errors
/// See [`try_quantize`].
#[cfg(feature = "threads")]
pub fn try_quantize_par(
    image: ImageSlice<'_>,
    levels: i64,
    method: &str,
) -> Result<ImageBuf, QuantizeError> {
    let (levels, method) =
        parse_request(levels, method).inspect_err(|err| warn!(%err, "quantization rejected"))?;

    Ok(quantize_par(image, levels, method))
}
