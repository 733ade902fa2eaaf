//! # Flow estimation parameters

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Farneback dense optical flow parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FlowParams {
    /// Image scale between pyramid layers, `(0, 1)`.
    pub pyr_scale: f64,
    /// Number of pyramid layers, including the initial image.
    pub levels: u32,
    /// Averaging window size.
    pub win_size: u32,
    /// Iterations at each pyramid level.
    pub iterations: u32,
    /// Pixel neighborhood used for the polynomial expansion.
    pub poly_n: u32,
    /// Standard deviation of the gaussian smoothing the polynomial expansion.
    pub poly_sigma: f64,
}

impl Default for FlowParams {
    fn default() -> Self {
        Self {
            pyr_scale: 0.5,
            levels: 3,
            win_size: 15,
            iterations: 3,
            poly_n: 5,
            poly_sigma: 1.2,
        }
    }
}

impl FlowParams {
    /// Check that the parameters are accepted by the estimator.
    pub fn validate(&self) -> Result<()> {
        if !(self.pyr_scale > 0.0 && self.pyr_scale < 1.0) {
            return Err(Error::Config(format!(
                "pyr_scale must be in (0, 1), got {}",
                self.pyr_scale
            )));
        }

        for (name, val) in [
            ("levels", self.levels),
            ("win_size", self.win_size),
            ("iterations", self.iterations),
        ] {
            if val == 0 {
                return Err(Error::Config(format!("{name} must be positive")));
            }
        }

        if self.poly_n != 5 && self.poly_n != 7 {
            return Err(Error::Config(format!(
                "poly_n must be 5 or 7, got {}",
                self.poly_n
            )));
        }

        if self.poly_sigma <= 0.0 {
            return Err(Error::Config(format!(
                "poly_sigma must be positive, got {}",
                self.poly_sigma
            )));
        }

        Ok(())
    }
}

/// Four-character code selecting the output codec.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct FourCc([u8; 4]);

impl FourCc {
    /// MPEG-4 part 2, the default output codec.
    pub const MP4V: Self = Self(*b"mp4v");

    pub fn chars(&self) -> [char; 4] {
        self.0.map(char::from)
    }
}

impl Default for FourCc {
    fn default() -> Self {
        Self::MP4V
    }
}

impl FromStr for FourCc {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| Error::Config(format!("FourCC must be 4 characters, got {s:?}")))?;

        if !bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            return Err(Error::Config(format!("FourCC must be ASCII, got {s:?}")));
        }

        Ok(Self(bytes))
    }
}

impl TryFrom<String> for FourCc {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<FourCc> for String {
    fn from(fourcc: FourCc) -> Self {
        fourcc.to_string()
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.chars().iter().try_for_each(|c| write!(f, "{c}"))
    }
}
