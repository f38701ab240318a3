#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice
)]

use std::{error::Error, fmt::Display, path::PathBuf};

use clap::{Parser, ValueEnum};
use greylevels::{ImageBuf, ImagePipeline, LevelCount, QuantizeMethod};
use image::RgbImage;
use rayon::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, ValueEnum)]
enum CliMethod {
    Uniform,
    Igs,
}

impl From<CliMethod> for QuantizeMethod {
    fn from(value: CliMethod) -> Self {
        match value {
            CliMethod::Uniform => QuantizeMethod::Uniform,
            CliMethod::Igs => QuantizeMethod::Igs,
        }
    }
}

impl Display for CliMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", QuantizeMethod::from(*self))
    }
}

#[derive(Parser)]
pub struct Options {
    #[arg(short, long, default_value_t = LevelCount::default(), value_parser = parse_levels)]
    levels: LevelCount,

    #[arg(short, long, default_value_t = CliMethod::Uniform)]
    method: CliMethod,

    /// Rescale the quantization codes to the full 0..=255 range for viewing
    #[arg(long)]
    stretch: bool,

    #[arg(short, long, default_value_t = 0)]
    threads: u8,

    #[arg(long)]
    verbose: bool,

    input: PathBuf,

    output: PathBuf,
}

fn parse_levels(s: &str) -> Result<LevelCount, String> {
    let value: i64 = s.parse().map_err(|e| format!("{e}"))?;
    value.try_into().map_err(|e| format!("{e}"))
}

fn main() -> Result<(), Box<dyn Error>> {
    let Options { levels, method, stretch, threads, verbose, input, output } = Options::parse();

    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    macro_rules! timed {
        ($name: literal, $val: expr) => {{
            let time = std::time::Instant::now();
            let value = $val;
            info!("{} took {}ms", $name, time.elapsed().as_millis());
            value
        }};
    }

    let image = timed!("read image", image::open(input)?.into_rgb8());

    let mut pipeline = ImagePipeline::try_from(&image)?;
    pipeline.levels(levels).method(method.into());

    let quantized = timed!(
        "quantization",
        match threads {
            0 => pipeline.quantized_par(),
            1 => pipeline.quantized(),
            t => rayon::ThreadPoolBuilder::new()
                .num_threads(t.into())
                .build()?
                .install(|| pipeline.quantized_par()),
        }
    );

    let quantized = if stretch {
        stretched(quantized, pipeline.max_code())?
    } else {
        quantized.into_image()?
    };

    timed!("write image", quantized.save(output)?);

    Ok(())
}

/// Spreads the codes `0..=max_code` evenly over `0..=255`.
fn stretched(image: ImageBuf, max_code: u8) -> Result<RgbImage, Box<dyn Error>> {
    let shape = image.shape();
    let mut samples = image.into_vec();

    if max_code > 0 {
        let max_code = u16::from(max_code);
        samples.par_iter_mut().for_each(|s| {
            #[allow(clippy::cast_possible_truncation)]
            {
                *s = (u16::from(*s).min(max_code) * 255 / max_code) as u8;
            }
        });
    }

    let image = ImageBuf::from_vec(samples, shape.width(), shape.height(), shape.channels())?;
    Ok(image.into_image()?)
}
