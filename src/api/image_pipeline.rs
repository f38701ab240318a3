//! Contains the [`ImagePipeline`] builder struct for the high level API.

use crate::{ImageBuf, ImageSlice, LevelCount, QuantizeError, QuantizeMethod};
#[cfg(feature = "image")]
use image::{ImageBuffer, Pixel, RgbImage};

/// A builder struct to specify options to create a quantized image.
///
/// # Examples
/// To start, create a [`ImagePipeline`] from an [`RgbImage`] (note that the `image` feature is needed):
/// ```no_run
/// # use greylevels::ImagePipeline;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = image::open("some image")?.into_rgb8();
/// let mut pipeline = ImagePipeline::try_from(&img)?;
/// # Ok(())
/// # }
/// ```
///
/// Any [`ImageSlice`] works as well, e.g. for grayscale or four channel images.
/// Then, you can change the number of levels and the quantization method:
/// ```
/// # use greylevels::{ImagePipeline, ImageSlice, LevelCount, QuantizeError, QuantizeMethod};
/// # fn main() -> Result<(), QuantizeError> {
/// # let samples = [0, 64, 128, 255];
/// let image = ImageSlice::new(&samples, 2, 2, 1)?;
/// let output = ImagePipeline::new(image)
///     .levels(LevelCount::try_from(8u8)?)
///     .method(QuantizeMethod::Igs)
///     .quantized();
/// # Ok(())
/// # }
/// ```
///
/// Or, run the pipeline in parallel across multiple threads (needs the `threads` feature):
/// ```no_run
/// # use greylevels::ImagePipeline;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let img = image::open("some image")?.into_rgb8();
/// let quantized = ImagePipeline::try_from(&img)?.quantized_rgbimage_par()?;
/// # Ok(())
/// # }
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct ImagePipeline<'a> {
    /// The input image.
    pub(crate) image: ImageSlice<'a>,
    /// The number of levels per channel.
    pub(crate) levels: LevelCount,
    /// The quantization method to use.
    pub(crate) method: QuantizeMethod,
}

impl<'a> ImagePipeline<'a> {
    /// Creates a new [`ImagePipeline`] with default options.
    pub fn new(image: ImageSlice<'a>) -> Self {
        Self {
            image,
            levels: LevelCount::default(),
            method: QuantizeMethod::default(),
        }
    }

    /// Sets the number of levels each channel is quantized to.
    ///
    /// The default level count is [`LevelCount::MAX`], which leaves the image unchanged.
    pub fn levels(&mut self, levels: LevelCount) -> &mut Self {
        self.levels = levels;
        self
    }

    /// Sets the quantization method to use.
    ///
    /// See [`QuantizeMethod`] for more details.
    ///
    /// The default quantization method is [`QuantizeMethod::Uniform`].
    pub fn method(&mut self, method: QuantizeMethod) -> &mut Self {
        self.method = method;
        self
    }

    /// Returns the largest sample value the pipeline can output with the current options.
    #[must_use]
    pub fn max_code(&self) -> u8 {
        self.method.max_code(self.levels)
    }
}

#[cfg(feature = "image")]
impl<'a, P> TryFrom<&'a ImageBuffer<P, Vec<u8>>> for ImagePipeline<'a>
where
    P: Pixel<Subpixel = u8>,
{
    type Error = QuantizeError;

    fn try_from(image: &'a ImageBuffer<P, Vec<u8>>) -> Result<Self, Self::Error> {
        Ok(Self::new(image.try_into()?))
    }
}

impl<'a> ImagePipeline<'a> {
    /// Runs the pipeline and returns the quantized image.
    #[must_use]
    pub fn quantized(&self) -> ImageBuf {
        crate::quantize(self.image, self.levels, self.method)
    }

    /// Runs the pipeline, writing the quantized image to `output`.
    ///
    /// # Errors
    /// Returns [`QuantizeError::ShapeMismatch`] if `output` does not have the same shape
    /// as the input image.
    pub fn quantized_into(&self, output: &mut ImageBuf) -> Result<(), QuantizeError> {
        crate::quantize_into(self.image, self.levels, self.method, output)
    }
}

#[cfg(feature = "image")]
impl<'a> ImagePipeline<'a> {
    /// Runs the pipeline and returns the quantized image as an [`ImageBuffer`].
    ///
    /// # Errors
    /// Returns [`QuantizeError::ShapeMismatch`] if the input image does not have
    /// the same number of channels as `P`.
    pub fn quantized_image<P>(&self) -> Result<ImageBuffer<P, Vec<u8>>, QuantizeError>
    where
        P: Pixel<Subpixel = u8>,
    {
        self.quantized().into_image()
    }

    /// Runs the pipeline and returns the quantized image as an [`RgbImage`].
    ///
    /// # Errors
    /// Returns [`QuantizeError::ShapeMismatch`] if the input image does not have three channels.
    pub fn quantized_rgbimage(&self) -> Result<RgbImage, QuantizeError> {
        self.quantized_image()
    }
}

#[cfg(feature = "threads")]
impl<'a> ImagePipeline<'a> {
    /// Runs the pipeline in parallel and returns the quantized image.
    #[must_use]
    pub fn quantized_par(&self) -> ImageBuf {
        crate::quantize_par(self.image, self.levels, self.method)
    }

    /// Runs the pipeline in parallel, writing the quantized image to `output`.
    ///
    /// # Errors
    /// Returns [`QuantizeError::ShapeMismatch`] if `output` does not have the same shape
    /// as the input image.
    pub fn quantized_into_par(&self, output: &mut ImageBuf) -> Result<(), QuantizeError> {
        crate::quantize_into_par(self.image, self.levels, self.method, output)
    }
}

#[cfg(all(feature = "threads", feature = "image"))]
impl<'a> ImagePipeline<'a> {
    /// Runs the pipeline in parallel and returns the quantized image as an [`ImageBuffer`].
    ///
    /// # Errors
    /// Returns [`QuantizeError::ShapeMismatch`] if the input image does not have
    /// the same number of channels as `P`.
    pub fn quantized_image_par<P>(&self) -> Result<ImageBuffer<P, Vec<u8>>, QuantizeError>
    where
        P: Pixel<Subpixel = u8>,
    {
        self.quantized_par().into_image()
    }

    /// Runs the pipeline in parallel and returns the quantized image as an [`RgbImage`].
    ///
    /// # Errors
    /// Returns [`QuantizeError::ShapeMismatch`] if the input image does not have three channels.
    pub fn quantized_rgbimage_par(&self) -> Result<RgbImage, QuantizeError> {
        self.quantized_image_par()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;

    #[test]
    fn defaults_are_identity() {
        let samples = test_samples(10, 10, 3);
        let image = ImageSlice::new(&samples, 10, 10, 3).unwrap();
        let pipeline = ImagePipeline::new(image);
        assert_eq!(pipeline.quantized().samples(), samples.as_slice());
        assert_eq!(pipeline.max_code(), 255);
    }

    #[test]
    fn matches_dispatcher() {
        let samples = test_samples(31, 17, 4);
        let image = ImageSlice::new(&samples, 31, 17, 4).unwrap();
        for method in QuantizeMethod::ALL {
            let mut pipeline = ImagePipeline::new(image);
            pipeline.levels(levels(12)).method(method);

            let expected = crate::quantize(image, levels(12), method);
            assert_eq!(pipeline.quantized(), expected);

            let mut output = ImageBuf::zeroed(image.shape());
            pipeline.quantized_into(&mut output).unwrap();
            assert_eq!(output, expected);

            #[cfg(feature = "threads")]
            {
                assert_eq!(pipeline.quantized_par(), expected);

                let mut output = ImageBuf::zeroed(image.shape());
                pipeline.quantized_into_par(&mut output).unwrap();
                assert_eq!(output, expected);
            }
        }
    }

    #[test]
    #[cfg(feature = "image")]
    fn image_output() {
        let img = RgbImage::from_fn(8, 4, |x, y| image::Rgb([(x * 30) as u8, (y * 60) as u8, 200]));
        let mut pipeline = ImagePipeline::try_from(&img).unwrap();
        pipeline.levels(levels(4));

        let quantized = pipeline.quantized_rgbimage().unwrap();
        assert_eq!(quantized.dimensions(), img.dimensions());
        assert!(quantized.pixels().all(|p| p.0.iter().all(|&q| q <= 3)));
        assert!(pipeline.quantized_image::<image::Rgba<u8>>().is_err());

        #[cfg(feature = "threads")]
        assert_eq!(pipeline.quantized_rgbimage_par().unwrap(), quantized);
    }
}
