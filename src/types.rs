//! Contains various types needed across the crate.

use crate::{MAX_LEVELS, MAX_PIXELS};
use palette::{cast, Srgb};
use std::{
    error::Error,
    fmt::{Debug, Display},
};
#[cfg(feature = "image")]
use image::{ImageBuffer, Pixel};

/// An error type for when the length of an input (e.g., `Vec` or slice)
/// is above the maximum supported value.
///
/// The inner value is the maximum supported value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AboveMaxLen<T>(pub T);

impl<T: Display> Display for AboveMaxLen<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "above the maximum length of {}", self.0)
    }
}

impl<T: Debug + Display> Error for AboveMaxLen<T> {}

/// The error type returned by the fallible functions in this crate.
///
/// All validation happens before any output is written,
/// so a returned error never leaves a partially quantized buffer behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantizeError {
    /// The requested quantization method (by name or discriminant) is not supported.
    UnsupportedMethod(String),
    /// The requested number of levels is not in the range `1..=256`.
    InvalidLevelCount(i64),
    /// The destination buffer does not have the same shape as the source image.
    ShapeMismatch {
        /// The shape of the source image.
        expected: Shape,
        /// The shape of the destination buffer.
        found: Shape,
    },
    /// The length of a sample buffer does not equal `width * height * channels`.
    BufferLength {
        /// The length implied by the dimensions and channel count.
        expected: u64,
        /// The actual length of the buffer.
        found: usize,
    },
    /// An image was described as having zero channels.
    ZeroChannels,
    /// The image has more than [`MAX_PIXELS`] pixels.
    AboveMaxLen(AboveMaxLen<u32>),
}

impl Display for QuantizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuantizeError::UnsupportedMethod(method) => {
                write!(f, "unsupported quantization method: {method}")
            }
            QuantizeError::InvalidLevelCount(levels) => write!(
                f,
                "the number of quantization levels must be between 1 and {MAX_LEVELS}, got {levels}"
            ),
            QuantizeError::ShapeMismatch { expected, found } => write!(
                f,
                "destination shape {found} does not match source shape {expected}"
            ),
            QuantizeError::BufferLength { expected, found } => write!(
                f,
                "buffer length {found} does not match the expected length of {expected}"
            ),
            QuantizeError::ZeroChannels => write!(f, "images must have at least one channel"),
            QuantizeError::AboveMaxLen(err) => write!(f, "too many pixels: {err}"),
        }
    }
}

impl Error for QuantizeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            QuantizeError::AboveMaxLen(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AboveMaxLen<u32>> for QuantizeError {
    fn from(err: AboveMaxLen<u32>) -> Self {
        QuantizeError::AboveMaxLen(err)
    }
}

/// The dimensions and channel count of an image.
///
/// A [`Shape`] always has at least one channel and at most [`MAX_PIXELS`] pixels.
/// Zero widths or heights are allowed and describe an empty image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    /// The number of columns.
    width: u32,
    /// The number of rows.
    height: u32,
    /// The number of interleaved samples per pixel.
    channels: u8,
}

impl Shape {
    /// Creates a new [`Shape`].
    ///
    /// # Errors
    /// Returns [`QuantizeError::ZeroChannels`] if `channels` is `0`, or
    /// [`QuantizeError::AboveMaxLen`] if `width * height` is above [`MAX_PIXELS`]
    /// or the number of samples does not fit in a `usize`.
    pub fn new(width: u32, height: u32, channels: u8) -> Result<Self, QuantizeError> {
        if channels == 0 {
            return Err(QuantizeError::ZeroChannels);
        }

        let pixels = u64::from(width) * u64::from(height);
        if pixels > u64::from(MAX_PIXELS) {
            return Err(AboveMaxLen(MAX_PIXELS).into());
        }

        usize::try_from(pixels * u64::from(channels)).map_err(|_| AboveMaxLen(MAX_PIXELS))?;

        Ok(Self { width, height, channels })
    }

    /// Returns the width of the image in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the image in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Returns the number of channels (samples per pixel).
    #[must_use]
    pub const fn channels(&self) -> u8 {
        self.channels
    }

    /// Returns the number of pixels, `width * height`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn num_pixels(&self) -> u32 {
        // checked against MAX_PIXELS on construction
        (self.width as u64 * self.height as u64) as u32
    }

    /// Returns the total number of samples, `width * height * channels`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn num_samples(&self) -> usize {
        // checked to fit in a usize on construction
        (self.width as u64 * self.height as u64 * self.channels as u64) as usize
    }

    /// Ensures that a buffer of length `len` holds exactly one image of this shape.
    fn check_len(self, len: usize) -> Result<(), QuantizeError> {
        if len == self.num_samples() {
            Ok(())
        } else {
            Err(QuantizeError::BufferLength {
                expected: self.num_samples() as u64,
                found: len,
            })
        }
    }
}

impl Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.channels)
    }
}

/// A borrowed, read-only image: a row-major slice of channel-interleaved `u8` samples
/// alongside its [`Shape`].
///
/// # Examples
/// From a raw sample slice:
/// ```
/// # use greylevels::{ImageSlice, QuantizeError};
/// # fn main() -> Result<(), QuantizeError> {
/// let samples = [100, 150, 200, 0, 0, 0];
/// let image = ImageSlice::new(&samples, 2, 1, 3)?;
/// assert_eq!(image.shape().num_pixels(), 2);
/// # Ok(())
/// # }
/// ```
///
/// From an image (needs the `image` feature to be enabled):
/// ```no_run
/// # use greylevels::ImageSlice;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = image::open("some image")?.into_rgb8();
/// let image = ImageSlice::try_from(&img)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSlice<'a> {
    /// The samples of the image.
    samples: &'a [u8],
    /// The dimensions and channel count of `samples`.
    shape: Shape,
}

impl<'a> ImageSlice<'a> {
    /// Creates a new [`ImageSlice`] from interleaved samples.
    ///
    /// # Errors
    /// Returns an error if the shape is invalid (see [`Shape::new`]) or if the length of `samples`
    /// is not equal to `width * height * channels`.
    pub fn new(
        samples: &'a [u8],
        width: u32,
        height: u32,
        channels: u8,
    ) -> Result<Self, QuantizeError> {
        Self::with_shape(samples, Shape::new(width, height, channels)?)
    }

    /// Creates a new [`ImageSlice`] with the given [`Shape`].
    ///
    /// # Errors
    /// Returns [`QuantizeError::BufferLength`] if the length of `samples` does not match `shape`.
    pub fn with_shape(samples: &'a [u8], shape: Shape) -> Result<Self, QuantizeError> {
        shape.check_len(samples.len())?;
        Ok(Self { samples, shape })
    }

    /// Creates a new three channel [`ImageSlice`] from a slice of [`Srgb<u8>`] pixels.
    ///
    /// # Errors
    /// Returns an error if `colors.len()` is not equal to `width * height`.
    pub fn from_srgb(colors: &'a [Srgb<u8>], width: u32, height: u32) -> Result<Self, QuantizeError> {
        let samples: &[u8] = cast::into_component_slice(colors);
        Self::new(samples, width, height, 3)
    }

    /// Returns the [`Shape`] of the image.
    #[must_use]
    pub const fn shape(&self) -> Shape {
        self.shape
    }

    /// Returns the underlying samples.
    #[must_use]
    pub const fn samples(&self) -> &'a [u8] {
        self.samples
    }
}

#[cfg(feature = "image")]
impl<'a, P> TryFrom<&'a ImageBuffer<P, Vec<u8>>> for ImageSlice<'a>
where
    P: Pixel<Subpixel = u8>,
{
    type Error = QuantizeError;

    fn try_from(image: &'a ImageBuffer<P, Vec<u8>>) -> Result<Self, Self::Error> {
        let shape = Shape::new(image.width(), image.height(), P::CHANNEL_COUNT)?;
        let samples = image.as_raw();
        let samples = samples
            .get(..shape.num_samples())
            .ok_or(QuantizeError::BufferLength {
                expected: shape.num_samples() as u64,
                found: samples.len(),
            })?;

        Ok(Self { samples, shape })
    }
}

/// An owned image: a row-major `Vec` of channel-interleaved `u8` samples alongside its [`Shape`].
///
/// This is the output type of the quantizers.
/// The samples are quantization codes, i.e., they are not rescaled back to the `0..=255` range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageBuf {
    /// The samples of the image.
    samples: Vec<u8>,
    /// The dimensions and channel count of `samples`.
    shape: Shape,
}

impl ImageBuf {
    /// Creates a new [`ImageBuf`] filled with zeros.
    ///
    /// # Errors
    /// Returns an error if the shape is invalid (see [`Shape::new`]).
    pub fn new(width: u32, height: u32, channels: u8) -> Result<Self, QuantizeError> {
        Ok(Self::zeroed(Shape::new(width, height, channels)?))
    }

    /// Creates a new [`ImageBuf`] of the given [`Shape`] filled with zeros.
    #[must_use]
    pub fn zeroed(shape: Shape) -> Self {
        Self { samples: vec![0; shape.num_samples()], shape }
    }

    /// Creates a new [`ImageBuf`] from interleaved samples.
    ///
    /// # Errors
    /// Returns an error if the shape is invalid (see [`Shape::new`]) or if the length of `samples`
    /// is not equal to `width * height * channels`.
    pub fn from_vec(
        samples: Vec<u8>,
        width: u32,
        height: u32,
        channels: u8,
    ) -> Result<Self, QuantizeError> {
        let shape = Shape::new(width, height, channels)?;
        shape.check_len(samples.len())?;
        Ok(Self { samples, shape })
    }

    /// Returns the [`Shape`] of the image.
    #[must_use]
    pub const fn shape(&self) -> Shape {
        self.shape
    }

    /// Returns the underlying samples.
    #[must_use]
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    /// Returns the samples of the pixel at column `x` and row `y`,
    /// or `None` if the coordinates are out of bounds.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        let Shape { width, height, channels } = self.shape;
        if x < width && y < height {
            let channels = usize::from(channels);
            let start = (y as usize * width as usize + x as usize) * channels;
            self.samples.get(start..(start + channels))
        } else {
            None
        }
    }

    /// Borrows this buffer as an [`ImageSlice`], e.g., to quantize it again.
    #[must_use]
    pub fn as_image_slice(&self) -> ImageSlice<'_> {
        ImageSlice { samples: &self.samples, shape: self.shape }
    }

    /// Consumes the buffer and returns the underlying samples.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.samples
    }

    /// Returns a mutable reference to the samples.
    pub(crate) fn samples_mut(&mut self) -> &mut [u8] {
        &mut self.samples
    }

    /// Returns a mutable reference to the samples after checking that
    /// this buffer has the `expected` shape.
    pub(crate) fn samples_mut_checked(&mut self, expected: Shape) -> Result<&mut [u8], QuantizeError> {
        if self.shape == expected {
            Ok(&mut self.samples)
        } else {
            Err(QuantizeError::ShapeMismatch { expected, found: self.shape })
        }
    }

    /// Converts this buffer into an [`ImageBuffer`] with pixel type `P`.
    ///
    /// # Errors
    /// Returns [`QuantizeError::ShapeMismatch`] if the channel count of this buffer
    /// is not equal to the channel count of `P`.
    #[cfg(feature = "image")]
    pub fn into_image<P>(self) -> Result<ImageBuffer<P, Vec<u8>>, QuantizeError>
    where
        P: Pixel<Subpixel = u8>,
    {
        let Shape { width, height, channels } = self.shape;
        if channels != P::CHANNEL_COUNT {
            return Err(QuantizeError::ShapeMismatch {
                expected: Shape { width, height, channels: P::CHANNEL_COUNT },
                found: self.shape,
            });
        }

        let len = self.samples.len();
        ImageBuffer::from_raw(width, height, self.samples).ok_or(QuantizeError::BufferLength {
            expected: self.shape.num_samples() as u64,
            found: len,
        })
    }
}

impl AsRef<[u8]> for ImageBuf {
    fn as_ref(&self) -> &[u8] {
        &self.samples
    }
}

impl<'a> From<&'a ImageBuf> for ImageSlice<'a> {
    fn from(image: &'a ImageBuf) -> Self {
        image.as_image_slice()
    }
}

/// This type is used to specify the number of output levels per channel.
///
/// This is a simple new type wrapper around `u16` with the invariant that it must be
/// in the range `1..=`[`MAX_LEVELS`].
///
/// # Examples
/// Use `try_into` or [`LevelCount::from_clamped`] to create [`LevelCount`]s.
/// You can also use the [`LevelCount::MIN`] and [`LevelCount::MAX`] constants.
/// ```
/// # use greylevels::{LevelCount, QuantizeError};
/// # fn main() -> Result<(), QuantizeError> {
/// let levels = LevelCount::try_from(16u16)?;
/// let levels: LevelCount = 4u8.try_into()?;
/// let levels = LevelCount::from_clamped(1024);
/// assert_eq!(levels, LevelCount::MAX);
/// assert!(LevelCount::try_from(0i64).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct LevelCount(u16);

impl LevelCount {
    /// The smallest level count, which maps every sample to `0`.
    pub const MIN: Self = Self(1);

    /// The largest level count (given by [`MAX_LEVELS`]).
    pub const MAX: Self = Self(MAX_LEVELS);

    /// Gets the inner `u16` value.
    #[must_use]
    pub const fn into_inner(self) -> u16 {
        self.0
    }

    /// Creates a [`LevelCount`] by clamping the given `u16` to the range `1..=`[`MAX_LEVELS`].
    #[must_use]
    pub const fn from_clamped(value: u16) -> Self {
        if value == 0 {
            Self::MIN
        } else if value > MAX_LEVELS {
            Self::MAX
        } else {
            Self(value)
        }
    }

    /// Creates a [`LevelCount`] from any integer, rejecting values outside of `1..=`[`MAX_LEVELS`].
    fn from_i64(value: i64) -> Result<Self, QuantizeError> {
        match u16::try_from(value) {
            Ok(levels) if (1..=MAX_LEVELS).contains(&levels) => Ok(Self(levels)),
            _ => Err(QuantizeError::InvalidLevelCount(value)),
        }
    }
}

impl Default for LevelCount {
    fn default() -> Self {
        Self::MAX
    }
}

impl From<LevelCount> for u16 {
    fn from(val: LevelCount) -> Self {
        val.into_inner()
    }
}

impl TryFrom<u8> for LevelCount {
    type Error = QuantizeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_i64(value.into())
    }
}

impl TryFrom<u16> for LevelCount {
    type Error = QuantizeError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::from_i64(value.into())
    }
}

impl TryFrom<u32> for LevelCount {
    type Error = QuantizeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_i64(value.into())
    }
}

impl TryFrom<i32> for LevelCount {
    type Error = QuantizeError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::from_i64(value.into())
    }
}

impl TryFrom<i64> for LevelCount {
    type Error = QuantizeError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_i64(value)
    }
}

impl Display for LevelCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.into_inner())
    }
}
