//! Error definitions for the AD770x driver.

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Eq, PartialEq)]
pub enum Error<SpiError> {
    /// Underlying SPI transaction failed.
    Spi(SpiError),
    /// Reset or data-ready pin could not be driven or sampled.
    Pin,
    /// Provided value does not fit the target register.
    OutOfRange,
}

impl<SpiError: core::fmt::Debug> core::fmt::Display for Error<SpiError> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Spi(e) => write!(f, "SPI error: {:?}", e),
            Error::Pin => write!(f, "GPIO pin error"),
            Error::OutOfRange => write!(f, "value out of register range"),
        }
    }
}

impl<SpiError: core::fmt::Debug> core::error::Error for Error<SpiError> {}
