//! Software SPI bus for boards where the ADC is not wired to a hardware SPI peripheral.
//!
//! [`SoftSpi`] only drives SCLK, DIN and DOUT. Chip-select framing comes from
//! wrapping it in an exclusive `SpiDevice` (for example
//! `embedded_hal_bus::spi::ExclusiveDevice`), which the driver then takes
//! like any hardware device.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::{self, ErrorKind, ErrorType, Mode, Phase, Polarity, SpiBus};

/// SPI mode expected by the part: clock idles high, data sampled on the rising edge.
pub const MODE: Mode = Mode {
    polarity: Polarity::IdleHigh,
    phase: Phase::CaptureOnSecondTransition,
};

/// Half of the default SCLK period. Gives roughly 1 MHz, under the part's 2 MHz limit
/// at either supply voltage.
pub const DEFAULT_HALF_PERIOD_NS: u32 = 500;

/// Pin failure while shifting a byte.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BitBangError {
    /// SCLK could not be driven.
    Clock,
    /// DIN (controller out) could not be driven.
    DataOut,
    /// DOUT (controller in) could not be sampled.
    DataIn,
}

impl spi::Error for BitBangError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Bit-banged SPI bus in mode 3, MSB first.
pub struct SoftSpi<SCK, MOSI, MISO, D> {
    sck: SCK,
    mosi: MOSI,
    miso: MISO,
    delay: D,
    half_period_ns: u32,
}

impl<SCK, MOSI, MISO, D> SoftSpi<SCK, MOSI, MISO, D>
where
    SCK: OutputPin,
    MOSI: OutputPin,
    MISO: InputPin,
    D: DelayNs,
{
    /// Take the pins and park SCLK at its idle (high) level.
    pub fn new(mut sck: SCK, mosi: MOSI, miso: MISO, delay: D, half_period_ns: u32) -> Result<Self, BitBangError> {
        sck.set_high().map_err(|_| BitBangError::Clock)?;
        Ok(Self {
            sck,
            mosi,
            miso,
            delay,
            half_period_ns,
        })
    }

    /// Release the pins and delay.
    pub fn free(self) -> (SCK, MOSI, MISO, D) {
        (self.sck, self.mosi, self.miso, self.delay)
    }

    fn transfer_byte(&mut self, out: u8) -> Result<u8, BitBangError> {
        let mut input = 0u8;
        for bit in (0..8).rev() {
            self.sck.set_low().map_err(|_| BitBangError::Clock)?;
            let driven = if out & (1 << bit) != 0 {
                self.mosi.set_high()
            } else {
                self.mosi.set_low()
            };
            driven.map_err(|_| BitBangError::DataOut)?;
            self.delay.delay_ns(self.half_period_ns);

            self.sck.set_high().map_err(|_| BitBangError::Clock)?;
            if self.miso.is_high().map_err(|_| BitBangError::DataIn)? {
                input |= 1 << bit;
            }
            self.delay.delay_ns(self.half_period_ns);
        }
        Ok(input)
    }
}

impl<SCK, MOSI, MISO, D> ErrorType for SoftSpi<SCK, MOSI, MISO, D> {
    type Error = BitBangError;
}

impl<SCK, MOSI, MISO, D> SpiBus<u8> for SoftSpi<SCK, MOSI, MISO, D>
where
    SCK: OutputPin,
    MOSI: OutputPin,
    MISO: InputPin,
    D: DelayNs,
{
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        for word in words.iter_mut() {
            *word = self.transfer_byte(0x00)?;
        }
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        for &word in words {
            self.transfer_byte(word)?;
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        // Shorter side is padded: extra writes are 0x00, extra reads are dropped.
        for i in 0..read.len().max(write.len()) {
            let word = self.transfer_byte(write.get(i).copied().unwrap_or(0x00))?;
            if let Some(slot) = read.get_mut(i) {
                *slot = word;
            }
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        for word in words.iter_mut() {
            *word = self.transfer_byte(*word)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
