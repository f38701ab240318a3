//! A library for per-channel grey-level quantization of 8-bit images.
//!
//! `greylevels` reduces the number of distinct values each channel of an image may take,
//! using one of two methods (see [`QuantizeMethod`]):
//! - [`uniform`] quantization, which maps every sample to one of `levels` equal-width buckets.
//! - Improved Grey Scale ([`igs`]) quantization, which carries the quantization error
//!   of each sample into the next sample of the same channel to reduce banding.
//!
//! Both methods output bucket indices (i.e., small integer codes),
//! not samples rescaled back to the `0..=255` range.
//! Each channel is quantized independently and identically; the channel order is irrelevant.
//!
//! # Features
//! To reduce dependencies and compile times, `greylevels` has several `cargo` features
//! that can be turned off or on:
//! - `pipelines`: exposes a builder struct that serves as the high-level API (more details below).
//! - `threads`: exposes parallel versions of the quantizers via [`rayon`].
//! - `image`: enables integration with the [`image`] crate.
//!
//! # Examples
//! The simplest entry point is [`quantize`]:
//! ```
//! # use greylevels::{quantize, ImageSlice, LevelCount, QuantizeMethod, QuantizeError};
//! # fn main() -> Result<(), QuantizeError> {
//! let samples = [10, 250, 5];
//! let image = ImageSlice::new(&samples, 3, 1, 1)?;
//! let output = quantize(image, LevelCount::try_from(5u8)?, QuantizeMethod::Igs);
//! assert_eq!(output.samples(), &[0, 5, 0]);
//! # Ok(())
//! # }
//! ```
//!
//! # High-Level API
//! With the `pipelines` and `image` features, see [`ImagePipeline`]:
//! ```no_run
//! # use greylevels::{ImagePipeline, LevelCount, QuantizeMethod};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("some image")?.into_rgb8();
//!
//! let quantized = ImagePipeline::try_from(&img)?
//!     .levels(LevelCount::try_from(8u8)?)
//!     .method(QuantizeMethod::Igs)
//!     .quantized_rgbimage_par()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Logging
//! Diagnostics are emitted as [`tracing`] events: a `debug` event per dispatch
//! and a `warn` event whenever a request is rejected.
//! The returned [`QuantizeError`] is the actual error channel; the events are advisory.

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::missing_panics_doc,
    clippy::unreadable_literal,
    clippy::wildcard_imports
)]

mod dispatch;
mod quantize_method;
mod types;

#[cfg(feature = "pipelines")]
mod api;

pub mod igs;
pub mod uniform;

pub use dispatch::*;
pub use quantize_method::QuantizeMethod;
pub use types::*;

#[cfg(feature = "pipelines")]
pub use api::*;

/// The maximum supported image size in number of pixels is `u32::MAX`.
pub const MAX_PIXELS: u32 = u32::MAX;

/// The maximum supported number of levels per channel is `256`.
pub const MAX_LEVELS: u16 = u8::MAX as u16 + 1;
