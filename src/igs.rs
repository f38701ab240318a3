//! Improved Grey Scale (IGS) quantization.
//!
//! IGS quantization is a cheap dither which reduces the banding (false contours)
//! caused by uniform quantization. Each channel is scanned in row-major order,
//! and the part of a sample that was lost to quantization (the remainder)
//! is added to the next sample of the same channel before it is quantized.
//!
//! The bucket width is the integer `256 / levels`, and a sample plus the incoming remainder
//! is clamped to `255` before quantization. The outgoing remainder is computed from the
//! clamped value, so any excess above `255` is discarded rather than carried forward.
//!
//! The output samples are bucket indices in the range `0..=255 / divisor`,
//! they are not rescaled back to the `0..=255` range.
//! Note that this range can include `levels` itself when `levels` does not divide `256`.
//!
//! Channels are independent of each other, but within a channel every output sample
//! depends on all of the preceding samples. So, the parallel versions only process
//! the channels in parallel.

use crate::{ImageBuf, ImageSlice, LevelCount, QuantizeError};
#[cfg(feature = "threads")]
use rayon::prelude::*;
use std::{fmt::Display, iter::StepBy, num::NonZeroU16, slice};

/// The integer bucket width used by IGS quantization.
///
/// This is always in the range `1..=256`, since it can only be created from a [`LevelCount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Divisor(NonZeroU16);

impl Divisor {
    /// Computes the divisor for the given number of levels, `256 / levels`.
    #[must_use]
    pub const fn new(levels: LevelCount) -> Self {
        match NonZeroU16::new(256 / levels.into_inner()) {
            Some(divisor) => Self(divisor),
            // levels <= 256
            None => Self(NonZeroU16::MIN),
        }
    }

    /// Gets the inner value.
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0.get()
    }

    /// Returns the largest value that IGS quantization can output for this divisor.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn max_code(self) -> u8 {
        (u8::MAX as u16 / self.get()) as u8
    }
}

impl From<LevelCount> for Divisor {
    fn from(levels: LevelCount) -> Self {
        Self::new(levels)
    }
}

impl Display for Divisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// The running remainder carried from one sample to the next within a channel.
///
/// Each channel scan starts at [`Remainder::ZERO`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Remainder(u8);

impl Remainder {
    /// The remainder at the start of each channel.
    pub const ZERO: Self = Self(0);

    /// Creates a new [`Remainder`] with the given value.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Gets the inner value.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Quantizes the next sample in the scan.
    ///
    /// Returns the quantized value and the remainder to carry into the next sample.
    #[must_use]
    #[inline]
    pub fn step(self, value: u8, divisor: Divisor) -> (u8, Self) {
        let adjusted = (u16::from(value) + u16::from(self.0)).min(u8::MAX.into());
        let divisor = divisor.get();

        // adjusted <= 255, so the quotient and remainder fit in a u8
        #[allow(clippy::cast_possible_truncation)]
        {
            ((adjusted / divisor) as u8, Self((adjusted % divisor) as u8))
        }
    }
}

/// Quantizes one channel, given its samples in scan order.
///
/// The remainder is threaded through the scan, starting from [`Remainder::ZERO`].
pub fn quantize_channel(
    samples: impl IntoIterator<Item = u8>,
    divisor: Divisor,
) -> impl Iterator<Item = u8> {
    samples
        .into_iter()
        .scan(Remainder::ZERO, move |remainder, value| {
            let (quantized, next) = remainder.step(value, divisor);
            *remainder = next;
            Some(quantized)
        })
}

/// Returns the samples of a single channel from interleaved samples.
fn channel(samples: &[u8], channels: usize, index: usize) -> StepBy<slice::Iter<'_, u8>> {
    samples.get(index..).unwrap_or_default().iter().step_by(channels)
}

/// Writes the quantized version of `samples` to `output`, one channel at a time.
fn fill(samples: &[u8], channels: u8, levels: LevelCount, output: &mut [u8]) {
    let divisor = Divisor::new(levels);
    let channels = usize::from(channels);
    for c in 0..channels {
        let quantized = quantize_channel(channel(samples, channels, c).copied(), divisor);
        let dst = output.get_mut(c..).unwrap_or_default().iter_mut().step_by(channels);
        for (dst, q) in dst.zip(quantized) {
            *dst = q;
        }
    }
}

/// Writes the quantized version of `samples` to `output`, with the channels processed in parallel.
#[cfg(feature = "threads")]
fn fill_par(samples: &[u8], channels: u8, levels: LevelCount, output: &mut [u8]) {
    let divisor = Divisor::new(levels);
    let channels = usize::from(channels);

    let planes = (0..channels)
        .into_par_iter()
        .map(|c| {
            quantize_channel(channel(samples, channels, c).copied(), divisor).collect::<Vec<u8>>()
        })
        .collect::<Vec<_>>();

    for (c, plane) in planes.into_iter().enumerate() {
        let dst = output.get_mut(c..).unwrap_or_default().iter_mut().step_by(channels);
        for (dst, q) in dst.zip(plane) {
            *dst = q;
        }
    }
}

/// Runs IGS quantization on `image` and returns the quantized image.
#[must_use]
pub fn quantize(image: ImageSlice<'_>, levels: LevelCount) -> ImageBuf {
    let mut output = ImageBuf::zeroed(image.shape());
    fill(image.samples(), image.shape().channels(), levels, output.samples_mut());
    output
}

/// Runs IGS quantization on `image`, writing the result to `output`.
///
/// # Errors
/// Returns [`QuantizeError::ShapeMismatch`] if `output` does not have the same shape as `image`.
/// In this case, `output` is left untouched.
pub fn quantize_into(
    image: ImageSlice<'_>,
    levels: LevelCount,
    output: &mut ImageBuf,
) -> Result<(), QuantizeError> {
    let shape = image.shape();
    fill(image.samples(), shape.channels(), levels, output.samples_mut_checked(shape)?);
    Ok(())
}

/// Runs IGS quantization on `image` with the channels processed in parallel
/// and returns the quantized image.
#[must_use]
#[cfg(feature = "threads")]
pub fn quantize_par(image: ImageSlice<'_>, levels: LevelCount) -> ImageBuf {
    let mut output = ImageBuf::zeroed(image.shape());
    fill_par(image.samples(), image.shape().channels(), levels, output.samples_mut());
    output
}

/// Runs IGS quantization on `image` with the channels processed in parallel,
/// writing the result to `output`.
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
    let shape = image.shape();
    fill_par(image.samples(), shape.channels(), levels, output.samples_mut_checked(shape)?);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;

    #[test]
    fn divisor_values() {
        assert_eq!(Divisor::new(LevelCount::MIN).get(), 256);
        assert_eq!(Divisor::new(LevelCount::MAX).get(), 1);
        assert_eq!(Divisor::new(levels(5)).get(), 51);
        assert_eq!(Divisor::new(levels(3)).get(), 85);
        assert_eq!(Divisor::new(levels(200)).get(), 1);
    }

    #[test]
    fn clamp_discards_excess() {
        let divisor = Divisor::new(levels(5));
        let (quantized, remainder) = Remainder::new(10).step(255, divisor);
        assert_eq!(quantized, 5);
        assert_eq!(remainder, Remainder::ZERO);
    }

    #[test]
    fn remainder_is_carried() {
        let divisor = Divisor::new(levels(4));
        let (quantized, remainder) = Remainder::ZERO.step(100, divisor);
        assert_eq!((quantized, remainder.get()), (1, 36));
        let (quantized, remainder) = remainder.step(30, divisor);
        assert_eq!((quantized, remainder.get()), (1, 2));
    }

    #[test]
    fn single_channel_row() {
        let image = ImageSlice::new(&[10, 250, 5], 3, 1, 1).unwrap();
        let output = quantize(image, levels(5));
        assert_eq!(output.samples(), &[0, 5, 0]);
    }

    #[test]
    fn channels_are_independent() {
        // the same row as above in the first channel, constants in the others
        let samples = [10, 7, 200, 250, 7, 200, 5, 7, 200];
        let image = ImageSlice::new(&samples, 3, 1, 3).unwrap();
        let output = quantize(image, levels(5));
        assert_eq!(output.samples(), &[0, 0, 3, 5, 0, 4, 0, 0, 4]);
    }

    #[test]
    fn scan_is_row_major() {
        // 2x2, the remainder from the end of row 0 flows into the start of row 1
        let image = ImageSlice::new(&[0, 50, 50, 0], 2, 2, 1).unwrap();
        let output = quantize(image, levels(4));
        // divisor 64: 0 -> (0, 0), 50 -> (0, 50), 50 + 50 -> (1, 36), 0 + 36 -> (0, 36)
        assert_eq!(output.samples(), &[0, 0, 1, 0]);
    }

    #[test]
    fn one_level_is_all_zero() {
        let samples = test_samples(32, 32, 3);
        let image = ImageSlice::new(&samples, 32, 32, 3).unwrap();
        let output = quantize(image, LevelCount::MIN);
        assert!(output.samples().iter().all(|&q| q == 0));
    }

    #[test]
    fn max_levels_is_identity() {
        let samples = test_samples(32, 32, 3);
        let image = ImageSlice::new(&samples, 32, 32, 3).unwrap();
        assert_eq!(quantize(image, LevelCount::MAX).samples(), samples.as_slice());
    }

    #[test]
    fn output_in_range() {
        let samples = test_samples(64, 16, 3);
        let image = ImageSlice::new(&samples, 64, 16, 3).unwrap();
        for n in [2, 3, 5, 7, 16, 100, 129] {
            let max = Divisor::new(levels(n)).max_code();
            assert!(quantize(image, levels(n)).samples().iter().all(|&q| q <= max));
        }
    }

    #[test]
    fn early_change_propagates_within_channel() {
        let mut samples = vec![20; 8 * 3];
        let image = ImageSlice::new(&samples, 8, 1, 3).unwrap();
        let before = quantize(image, levels(4));

        // change the first sample of channel 0 only
        samples[0] = 60;
        let image = ImageSlice::new(&samples, 8, 1, 3).unwrap();
        let after = quantize(image, levels(4));

        let channel_of = |image: &ImageBuf, c: usize| {
            image.samples().iter().skip(c).step_by(3).copied().collect::<Vec<_>>()
        };

        assert_ne!(channel_of(&before, 0)[1..], channel_of(&after, 0)[1..]);
        assert_eq!(channel_of(&before, 1), channel_of(&after, 1));
        assert_eq!(channel_of(&before, 2), channel_of(&after, 2));
    }

    #[test]
    fn quantize_into_checks_shape() {
        let samples = test_samples(4, 4, 3);
        let image = ImageSlice::new(&samples, 4, 4, 3).unwrap();

        let mut output = ImageBuf::from_vec(vec![9; 4 * 5 * 3], 4, 5, 3).unwrap();
        assert!(matches!(
            quantize_into(image, levels(5), &mut output),
            Err(QuantizeError::ShapeMismatch { .. })
        ));
        assert!(output.samples().iter().all(|&s| s == 9));
    }

    #[test]
    #[cfg(feature = "threads")]
    fn parallel_matches_single() {
        let (width, height) = (97, 41);
        for channels in [1, 3, 4] {
            let samples = test_samples(width, height, channels);
            let image = ImageSlice::new(&samples, width, height, channels).unwrap();

            for n in [1, 2, 5, 16, 100, 256] {
                let expected = quantize(image, levels(n));
                assert_eq!(quantize_par(image, levels(n)), expected);

                let mut output = ImageBuf::zeroed(image.shape());
                quantize_into_par(image, levels(n), &mut output).unwrap();
                assert_eq!(output, expected);
            }
        }
    }
}
