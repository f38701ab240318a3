//! Contains the set of supported quantization methods.

use crate::{igs::Divisor, LevelCount, QuantizeError};
use std::{fmt::Display, str::FromStr};

/// The set of supported grey-level quantization methods.
///
/// Every channel of every pixel is quantized independently of the other channels
/// with either method. See the descriptions on each enum variant for more information.
///
/// # Examples
/// Methods can be parsed from their names or converted from their discriminants:
/// ```
/// # use greylevels::{QuantizeMethod, QuantizeError};
/// # fn main() -> Result<(), QuantizeError> {
/// let method: QuantizeMethod = "igs".parse()?;
/// assert_eq!(method, QuantizeMethod::Igs);
/// assert_eq!(QuantizeMethod::try_from(0u8)?, QuantizeMethod::Uniform);
/// assert!("median-cut".parse::<QuantizeMethod>().is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum QuantizeMethod {
    /// Uniform quantization.
    ///
    /// Each sample is mapped to one of `levels` equal-width buckets on its own.
    /// This is fast and trivially parallel, but causes banding in smooth gradients.
    ///
    /// See the [`uniform`](crate::uniform) module for more details.
    #[default]
    Uniform,
    /// Improved Grey Scale (IGS) quantization.
    ///
    /// The quantization error of each sample is carried into the next sample of the same channel,
    /// which breaks up banding at the cost of a sequential scan.
    ///
    /// See the [`igs`](crate::igs) module for more details.
    Igs,
}

impl QuantizeMethod {
    /// All of the supported methods, ordered by discriminant.
    pub const ALL: [Self; 2] = [Self::Uniform, Self::Igs];

    /// Returns the name of this method as accepted by [`QuantizeMethod::from_str`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            QuantizeMethod::Uniform => "uniform",
            QuantizeMethod::Igs => "igs",
        }
    }

    /// Returns the largest sample value this method can output for the given number of levels.
    ///
    /// For [`QuantizeMethod::Uniform`], this is `levels - 1`.
    /// For [`QuantizeMethod::Igs`], this is `255 / (256 / levels)` using integer division.
    #[must_use]
    pub fn max_code(self, levels: LevelCount) -> u8 {
        match self {
            QuantizeMethod::Uniform => {
                #[allow(clippy::cast_possible_truncation)]
                {
                    // levels <= 256
                    (levels.into_inner() - 1) as u8
                }
            }
            QuantizeMethod::Igs => Divisor::new(levels).max_code(),
        }
    }
}

impl Display for QuantizeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for QuantizeMethod {
    type Err = QuantizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| QuantizeError::UnsupportedMethod(s.to_owned()))
    }
}

impl From<QuantizeMethod> for u8 {
    fn from(method: QuantizeMethod) -> Self {
        match method {
            QuantizeMethod::Uniform => 0,
            QuantizeMethod::Igs => 1,
        }
    }
}

impl TryFrom<u8> for QuantizeMethod {
    type Error = QuantizeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(value))
            .copied()
            .ok_or_else(|| QuantizeError::UnsupportedMethod(value.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;

    #[test]
    fn parse_names() {
        assert_eq!("uniform".parse::<QuantizeMethod>(), Ok(QuantizeMethod::Uniform));
        assert_eq!(" IGS ".parse::<QuantizeMethod>(), Ok(QuantizeMethod::Igs));
        assert_eq!(
            "floyd".parse::<QuantizeMethod>(),
            Err(QuantizeError::UnsupportedMethod("floyd".to_owned()))
        );
        assert!("".parse::<QuantizeMethod>().is_err());
    }

    #[test]
    fn discriminants_round_trip() {
        for method in QuantizeMethod::ALL {
            assert_eq!(QuantizeMethod::try_from(u8::from(method)), Ok(method));
            assert_eq!(method.to_string().parse::<QuantizeMethod>(), Ok(method));
        }
        assert_eq!(
            QuantizeMethod::try_from(2u8),
            Err(QuantizeError::UnsupportedMethod("2".to_owned()))
        );
    }

    #[test]
    fn max_codes() {
        assert_eq!(QuantizeMethod::Uniform.max_code(levels(4)), 3);
        assert_eq!(QuantizeMethod::Uniform.max_code(LevelCount::MAX), 255);
        assert_eq!(QuantizeMethod::Uniform.max_code(LevelCount::MIN), 0);
        assert_eq!(QuantizeMethod::Igs.max_code(levels(4)), 3);
        assert_eq!(QuantizeMethod::Igs.max_code(levels(5)), 5);
        assert_eq!(QuantizeMethod::Igs.max_code(LevelCount::MIN), 0);
        assert_eq!(QuantizeMethod::Igs.max_code(LevelCount::MAX), 255);
    }
}
