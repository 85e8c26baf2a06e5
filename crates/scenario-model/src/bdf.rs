//! PCI bus/device/function addresses

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Fixed-width lexical form: two hex digits, colon, two hex digits, dot, one hex digit
static BDF_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9A-Fa-f]{2}):([0-9A-Fa-f]{2})\.([0-9A-Fa-f])$")
        .expect("BDF pattern is a valid regex")
});

/// PCI `bus:device.function` address
///
/// Parsing enforces the lexical grammar only; equality is by numeric value,
/// so `0A:01.0` and `0a:01.0` are the same address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Bdf {
    bus: u8,
    device: u8,
    function: u8,
}

impl Bdf {
    /// Create from components
    #[inline]
    #[must_use]
    pub fn new(bus: u8, device: u8, function: u8) -> Self {
        Self {
            bus,
            device,
            function,
        }
    }

    /// Check text against the grammar without building a value
    #[inline]
    #[must_use]
    pub fn is_well_formed(text: &str) -> bool {
        BDF_PATTERN.is_match(text)
    }

    /// Bus number
    #[inline]
    #[must_use]
    pub fn bus(&self) -> u8 {
        self.bus
    }

    /// Device number
    #[inline]
    #[must_use]
    pub fn device(&self) -> u8 {
        self.device
    }

    /// Function number
    #[inline]
    #[must_use]
    pub fn function(&self) -> u8 {
        self.function
    }
}

impl FromStr for Bdf {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidBdf(s.to_string());
        let caps = BDF_PATTERN.captures(s).ok_or_else(invalid)?;
        let field = |i: usize| {
            caps.get(i)
                .and_then(|m| u8::from_str_radix(m.as_str(), 16).ok())
                .ok_or_else(invalid)
        };
        Ok(Self::new(field(1)?, field(2)?, field(3)?))
    }
}

impl Display for Bdf {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}:{:02x}.{:x}", self.bus, self.device, self.function)
    }
}

impl TryFrom<String> for Bdf {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Bdf> for String {
    fn from(bdf: Bdf) -> Self {
        bdf.to_string()
    }
}
