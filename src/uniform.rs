//! Uniform grey-level quantization.
//!
//! The `0..=255` sample range is split into `levels` buckets of width `256 / levels`,
//! and every sample is replaced by the index of the bucket it falls into.
//! The bucket width is computed in floating point and the quotient is truncated,
//! so level counts that do not divide `256` give slightly uneven buckets.
//!
//! The output samples are bucket indices in the range `0..levels`,
//! they are not rescaled back to the `0..=255` range.
//!
//! Each output sample depends only on the matching input sample,
//! so the parallel versions may split the image at any sample boundary.

use crate::{ImageBuf, ImageSlice, LevelCount, QuantizeError};
#[cfg(feature = "threads")]
use rayon::prelude::*;
use std::array;

/// The number of samples handed to each rayon task.
#[cfg(feature = "threads")]
const CHUNK_SIZE: usize = 4096;

/// Returns the (fractional) bucket width for the given number of levels.
#[must_use]
pub fn divisor(levels: LevelCount) -> f64 {
    256.0 / f64::from(levels.into_inner())
}

/// Quantizes a single sample.
///
/// This is `floor(value / divisor(levels))`.
#[must_use]
pub fn quantize_sample(value: u8, levels: LevelCount) -> u8 {
    quantize_with_divisor(value, divisor(levels))
}

/// Quantizes a single sample given a precomputed divisor.
#[inline]
fn quantize_with_divisor(value: u8, divisor: f64) -> u8 {
    // value / divisor < levels <= 256, and the cast truncates toward zero
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        (f64::from(value) / divisor) as u8
    }
}

/// Returns a table mapping every possible sample value to its quantized value.
///
/// `lookup_table(levels)[usize::from(v)] == quantize_sample(v, levels)` for all `v`.
#[must_use]
pub fn lookup_table(levels: LevelCount) -> [u8; 256] {
    let divisor = divisor(levels);
    #[allow(clippy::cast_possible_truncation)]
    array::from_fn(|i| quantize_with_divisor(i as u8, divisor))
}

/// Writes the quantized version of `samples` to `output`.
fn fill(samples: &[u8], levels: LevelCount, output: &mut [u8]) {
    let table = lookup_table(levels);
    for (dst, &src) in output.iter_mut().zip(samples) {
        *dst = table[usize::from(src)];
    }
}

/// Writes the quantized version of `samples` to `output` in parallel.
#[cfg(feature = "threads")]
fn fill_par(samples: &[u8], levels: LevelCount, output: &mut [u8]) {
    let table = lookup_table(levels);
    output
        .par_chunks_mut(CHUNK_SIZE)
        .zip(samples.par_chunks(CHUNK_SIZE))
        .for_each(|(output, samples)| {
            for (dst, &src) in output.iter_mut().zip(samples) {
                *dst = table[usize::from(src)];
            }
        });
}

/// Runs uniform quantization on `image` and returns the quantized image.
#[must_use]
pub fn quantize(image: ImageSlice<'_>, levels: LevelCount) -> ImageBuf {
    let mut output = ImageBuf::zeroed(image.shape());
    fill(image.samples(), levels, output.samples_mut());
    output
}

/// Runs uniform quantization on `image`, writing the result to `output`.
///
/// # Errors
/// Returns [`QuantizeError::ShapeMismatch`] if `output` does not have the same shape as `image`.
/// In this case, `output` is left untouched.
pub fn quantize_into(
    image: ImageSlice<'_>,
    levels: LevelCount,
    output: &mut ImageBuf,
) -> Result<(), QuantizeError> {
    fill(image.samples(), levels, output.samples_mut_checked(image.shape())?);
    Ok(())
}

/// Runs uniform quantization on `image` in parallel and returns the quantized image.
#[must_use]
#[cfg(feature = "threads")]
pub fn quantize_par(image: ImageSlice<'_>, levels: LevelCount) -> ImageBuf {
    let mut output = ImageBuf::zeroed(image.shape());
    fill_par(image.samples(), levels, output.samples_mut());
    output
}

/// Runs uniform quantization on `image` in parallel, writing the result to `output`.
///
/// # Errors
/// Returns [`QuantizeError::ShapeMismatch`] if `output` does not have the same shape as `image`.
/// In this case, `output` is left untouched.
#[cfg(feature = "threads")]
pub fn quantize_into_par(
    image: ImageSlice<'_>,
    levels: LevelCount,
    output: &mut ImageBuf,
) -> Result<(), QuantizeError> {
    fill_par(image.samples(), levels, output.samples_mut_checked(image.shape())?);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;

    #[test]
    fn single_pixel() {
        let image = ImageSlice::new(&[100, 150, 200], 1, 1, 3).unwrap();
        let output = quantize(image, levels(4));
        assert_eq!(output.samples(), &[1, 2, 3]);
        assert_eq!(output.shape(), image.shape());
    }

    #[test]
    fn one_level_is_all_zero() {
        assert!(lookup_table(LevelCount::MIN).iter().all(|&q| q == 0));
    }

    #[test]
    fn max_levels_is_identity() {
        let table = lookup_table(LevelCount::MAX);
        for (i, &q) in table.iter().enumerate() {
            assert_eq!(usize::from(q), i);
        }
    }

    #[test]
    fn output_in_range_and_monotonic() {
        for n in 1..=256 {
            let levels = levels(n);
            let table = lookup_table(levels);
            assert!(table.iter().all(|&q| u16::from(q) < n));
            for i in 1..table.len() {
                assert!(table[i - 1] <= table[i]);
            }
        }
    }

    #[test]
    fn uneven_buckets_are_truncated() {
        // divisor = 85.333...
        let levels = levels(3);
        assert_eq!(quantize_sample(85, levels), 0);
        assert_eq!(quantize_sample(86, levels), 1);
        assert_eq!(quantize_sample(170, levels), 1);
        assert_eq!(quantize_sample(171, levels), 2);
        assert_eq!(quantize_sample(255, levels), 2);
    }

    #[test]
    fn table_matches_sample() {
        for n in [1, 2, 3, 5, 7, 64, 100, 255, 256] {
            let levels = levels(n);
            let table = lookup_table(levels);
            for v in 0..=u8::MAX {
                assert_eq!(table[usize::from(v)], quantize_sample(v, levels));
            }
        }
    }

    #[test]
    fn quantize_into_checks_shape() {
        let samples = test_samples(16, 8, 3);
        let image = ImageSlice::new(&samples, 16, 8, 3).unwrap();

        let mut output = ImageBuf::from_vec(vec![42; 16 * 8], 16, 8, 1).unwrap();
        assert!(matches!(
            quantize_into(image, levels(8), &mut output),
            Err(QuantizeError::ShapeMismatch { .. })
        ));
        assert!(output.samples().iter().all(|&s| s == 42));

        let mut output = ImageBuf::zeroed(image.shape());
        quantize_into(image, levels(8), &mut output).unwrap();
        assert_eq!(output, quantize(image, levels(8)));
    }

    #[test]
    fn empty_image() {
        let image = ImageSlice::new(&[], 0, 0, 3).unwrap();
        assert!(quantize(image, levels(4)).samples().is_empty());
        #[cfg(feature = "threads")]
        assert!(quantize_par(image, levels(4)).samples().is_empty());
    }

    #[test]
    #[cfg(feature = "threads")]
    fn parallel_matches_single() {
        let (width, height) = (123, 77);
        let samples = test_samples(width, height, 3);
        let image = ImageSlice::new(&samples, width, height, 3).unwrap();

        for n in [1, 2, 5, 16, 100, 256] {
            let expected = quantize(image, levels(n));
            assert_eq!(quantize_par(image, levels(n)), expected);

            let mut output = ImageBuf::zeroed(image.shape());
            quantize_into_par(image, levels(n), &mut output).unwrap();
            assert_eq!(output, expected);
        }
    }
}
