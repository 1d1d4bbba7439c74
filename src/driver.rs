//! Driver for AD7705/AD7706.
//! Provides blocking SPI helpers; the async version mirrors this API behind the `async` feature.
//!
//! Every framed transfer is a single `SpiDevice` transaction, so chip-select
//! is held low for exactly one command or data exchange.

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::data_types::{
    Access, Calibration, Channel, ChannelSetup, ClockDivider, Conversion, Gain, OperatingMode, Polarity,
    PollTimeouts, Register, SetupStatus, UpdateRate,
};
use crate::error::Error;
use crate::registers::{
    addr, calibration_from_bytes, calibration_to_bytes, clock_byte, code_to_raw, command_byte, decode_setup_gain,
    decode_setup_mode, is_ready_status, raw_to_volts, setup_byte, CommBits, SetupBits, POLL_INTERVAL_MS,
    RESET_PULSE_MS, SOFT_RESET_LEN, TEST_REGISTER_INIT,
};

/// Placeholder for a reset or data-ready line that is not wired.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl InputPin for NoPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }
}

/// AD7705/AD7706 driver.
///
/// `RST` and `DRDY` are the optional reset and data-ready pins. Without a
/// reset pin, [`reset`](Self::reset) falls back to the serial resync
/// sequence; without a data-ready pin, readiness is read from the
/// communication register.
pub struct Ad770x<SPI, D, RST = NoPin, DRDY = NoPin> {
    spi: SPI,
    delay: D,
    reset: Option<RST>,
    drdy: Option<DRDY>,
    vref: f32,
    timeouts: PollTimeouts,
}

impl<SPI, D> Ad770x<SPI, D> {
    /// Create a driver with no reset or data-ready pin. `vref` is the reference voltage in volts.
    pub fn new(spi: SPI, delay: D, vref: f32) -> Self {
        Self {
            spi,
            delay,
            reset: None,
            drdy: None,
            vref,
            timeouts: PollTimeouts::default(),
        }
    }
}

impl<SPI, D, RST, DRDY> Ad770x<SPI, D, RST, DRDY> {
    /// Attach a hardware reset pin (active low).
    pub fn with_reset_pin<P>(self, pin: P) -> Ad770x<SPI, D, P, DRDY> {
        Ad770x {
            spi: self.spi,
            delay: self.delay,
            reset: Some(pin),
            drdy: self.drdy,
            vref: self.vref,
            timeouts: self.timeouts,
        }
    }

    /// Attach the DRDY output of the part (active low).
    pub fn with_data_ready_pin<P>(self, pin: P) -> Ad770x<SPI, D, RST, P> {
        Ad770x {
            spi: self.spi,
            delay: self.delay,
            reset: self.reset,
            drdy: Some(pin),
            vref: self.vref,
            timeouts: self.timeouts,
        }
    }

    /// Replace the readiness poll bounds.
    pub fn with_timeouts(mut self, timeouts: PollTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Reference voltage used for scaling, in volts.
    pub fn vref(&self) -> f32 {
        self.vref
    }

    /// Change the reference voltage used for scaling.
    pub fn set_vref(&mut self, vref: f32) {
        self.vref = vref;
    }

    /// Current readiness poll bounds.
    pub fn timeouts(&self) -> PollTimeouts {
        self.timeouts
    }

    /// Replace the readiness poll bounds in place.
    pub fn set_timeouts(&mut self, timeouts: PollTimeouts) {
        self.timeouts = timeouts;
    }

    /// Release the bus, delay and pins.
    pub fn free(self) -> (SPI, D, Option<RST>, Option<DRDY>) {
        (self.spi, self.delay, self.reset, self.drdy)
    }
}

impl<SPI, D, RST, DRDY> Ad770x<SPI, D, RST, DRDY>
where
    SPI: embedded_hal::spi::SpiDevice,
    D: embedded_hal::delay::DelayNs,
    RST: OutputPin,
    DRDY: InputPin,
{
    /// Point the communication register at `register` for the next transfer.
    pub fn select_register(
        &mut self,
        register: Register,
        channel: Channel,
        access: Access,
    ) -> Result<(), Error<SPI::Error>> {
        let cmd = command_byte(register.id(), access == Access::Read, channel as u8);
        self.write_byte(cmd)
    }

    /// Write the clock register. Must follow a select of [`Register::Clock`].
    pub fn write_clock_register(
        &mut self,
        clock_disable: bool,
        divider: ClockDivider,
        update_rate: UpdateRate,
    ) -> Result<(), Error<SPI::Error>> {
        let divide = matches!(divider, ClockDivider::DivideBy2);
        self.write_byte(clock_byte(clock_disable, divide, update_rate as u8))
    }

    /// Write the setup register. Must follow a select of [`Register::Setup`].
    pub fn write_setup_register(
        &mut self,
        mode: OperatingMode,
        gain: Gain,
        polarity: Polarity,
        buffered: bool,
        filter_sync: bool,
    ) -> Result<(), Error<SPI::Error>> {
        let unipolar = matches!(polarity, Polarity::Unipolar);
        self.write_byte(setup_byte(mode as u8, gain as u8, unipolar, buffered, filter_sync))
    }

    /// Read the 16-bit data register as a signed code, without checking readiness.
    /// The data register must already be selected for reading.
    pub fn read_raw_unchecked(&mut self) -> Result<i16, Error<SPI::Error>> {
        let mut buf = [0u8; 2];
        self.spi.transfer_in_place(&mut buf).map_err(Error::Spi)?;
        Ok(code_to_raw(u16::from_be_bytes(buf)))
    }

    /// Wait for a conversion on `channel`, then read it as a signed code.
    pub fn read_raw(&mut self, channel: Channel) -> Result<Conversion<i16>, Error<SPI::Error>> {
        if self.wait_ready(channel, self.timeouts.read_ms)?.is_timed_out() {
            return Ok(Conversion::TimedOut);
        }
        self.select_register(Register::Data, channel, Access::Read)?;
        self.read_raw_unchecked().map(Conversion::Ready)
    }

    /// Wait for a conversion on `channel` and scale it to volts, minus `offset`.
    pub fn read_voltage(&mut self, channel: Channel, offset: f32) -> Result<Conversion<f32>, Error<SPI::Error>> {
        let vref = self.vref;
        Ok(self.read_raw(channel)?.map(|raw| raw_to_volts(raw, vref, offset)))
    }

    /// Check whether a fresh result is waiting on `channel`.
    pub fn is_data_ready(&mut self, channel: Channel) -> Result<bool, Error<SPI::Error>> {
        if let Some(pin) = self.drdy.as_mut() {
            return pin.is_low().map_err(|_| Error::Pin);
        }
        self.select_register(Register::Communication, channel, Access::Read)?;
        let status = self.read_byte()?;
        Ok(is_ready_status(status))
    }

    /// Reset the part: pulse the reset pin if wired, else clock out the resync sequence.
    pub fn reset(&mut self) -> Result<(), Error<SPI::Error>> {
        if let Some(pin) = self.reset.as_mut() {
            #[cfg(feature = "defmt")]
            defmt::debug!("ad770x: hardware reset");
            pin.set_low().map_err(|_| Error::Pin)?;
            self.delay.delay_ms(RESET_PULSE_MS);
            return pin.set_high().map_err(|_| Error::Pin);
        }
        #[cfg(feature = "defmt")]
        defmt::debug!("ad770x: serial resync reset");
        self.spi.write(&[0xFF; SOFT_RESET_LEN]).map_err(Error::Spi)
    }

    /// Program clock and setup for `channel`, start self-calibration, then wait for the first result.
    pub fn init(&mut self, channel: Channel, setup: ChannelSetup) -> Result<Conversion<()>, Error<SPI::Error>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("ad770x: init {:?} with {:?}", channel, setup);
        self.select_register(Register::Clock, channel, Access::Write)?;
        self.write_clock_register(false, setup.divider, setup.update_rate)?;

        self.select_register(Register::Setup, channel, Access::Write)?;
        self.write_setup_register(
            OperatingMode::SelfCalibration,
            setup.gain,
            setup.polarity,
            setup.buffered,
            false,
        )?;

        self.select_register(Register::Test, channel, Access::Write)?;
        self.write_byte(TEST_REGISTER_INIT)?;

        self.wait_ready(channel, self.timeouts.settle_ms)
    }

    /// [`init`](Self::init) with divide-by-2 clock, bipolar, gain 1, 25 Hz.
    pub fn init_default(&mut self, channel: Channel) -> Result<Conversion<()>, Error<SPI::Error>> {
        self.init(channel, ChannelSetup::default())
    }

    /// Read back a single-byte register (communication, setup, clock, test).
    pub fn read_register(&mut self, register: Register, channel: Channel) -> Result<u8, Error<SPI::Error>> {
        self.select_register(register, channel, Access::Read)?;
        self.read_byte()
    }

    /// Read and decode the setup register for `channel`.
    pub fn read_setup(&mut self, channel: Channel) -> Result<SetupStatus, Error<SPI::Error>> {
        let bits = SetupBits::from_bits_retain(self.read_register(Register::Setup, channel)?);
        Ok(decode_setup(&bits))
    }

    /// Read the offset and gain calibration coefficients of `channel`.
    pub fn read_calibration(&mut self, channel: Channel) -> Result<Calibration, Error<SPI::Error>> {
        let offset = self.read_u24(Register::Offset, channel)?;
        let gain = self.read_u24(Register::Gain, channel)?;
        Ok(Calibration { offset, gain })
    }

    /// Restore previously saved calibration coefficients on `channel`.
    pub fn write_calibration(&mut self, channel: Channel, calibration: Calibration) -> Result<(), Error<SPI::Error>> {
        let offset = calibration_to_bytes(calibration.offset).ok_or(Error::OutOfRange)?;
        let gain = calibration_to_bytes(calibration.gain).ok_or(Error::OutOfRange)?;
        self.select_register(Register::Offset, channel, Access::Write)?;
        self.spi.write(&offset).map_err(Error::Spi)?;
        self.select_register(Register::Gain, channel, Access::Write)?;
        self.spi.write(&gain).map_err(Error::Spi)
    }

    /// Run a calibration cycle on `channel`, keeping its gain, polarity and buffer
    /// settings, then wait for the part to return to ready.
    pub fn calibrate(&mut self, channel: Channel, mode: OperatingMode) -> Result<Conversion<()>, Error<SPI::Error>> {
        let current = self.read_setup(channel)?;
        self.select_register(Register::Setup, channel, Access::Write)?;
        self.write_setup_register(mode, current.gain, current.polarity, current.buffered, false)?;
        self.wait_ready(channel, self.timeouts.read_ms)
    }

    /// Enter or leave standby. Calibration coefficients are kept across standby.
    pub fn set_standby(&mut self, channel: Channel, standby: bool) -> Result<(), Error<SPI::Error>> {
        let mut bits = CommBits::from_bits_retain(command_byte(addr::COMM, false, channel as u8));
        bits.set(CommBits::STBY, standby);
        self.write_byte(bits.bits())
    }

    fn wait_ready(&mut self, channel: Channel, timeout_ms: u32) -> Result<Conversion<()>, Error<SPI::Error>> {
        for _ in 0..PollTimeouts::attempts(timeout_ms) {
            if self.is_data_ready(channel)? {
                return Ok(Conversion::Ready(()));
            }
            self.delay.delay_ms(POLL_INTERVAL_MS);
        }
        #[cfg(feature = "defmt")]
        defmt::warn!("ad770x: {:?} not ready after {=u32} ms", channel, timeout_ms);
        Ok(Conversion::TimedOut)
    }

    fn write_byte(&mut self, value: u8) -> Result<(), Error<SPI::Error>> {
        self.spi.write(&[value]).map_err(Error::Spi)
    }

    fn read_byte(&mut self) -> Result<u8, Error<SPI::Error>> {
        let mut buf = [0u8; 1];
        self.spi.transfer_in_place(&mut buf).map_err(Error::Spi)?;
        Ok(buf[0])
    }

    fn read_u24(&mut self, register: Register, channel: Channel) -> Result<u32, Error<SPI::Error>> {
        self.select_register(register, channel, Access::Read)?;
        let mut buf = [0u8; 3];
        self.spi.transfer_in_place(&mut buf).map_err(Error::Spi)?;
        Ok(calibration_from_bytes(buf))
    }
}

fn decode_setup(bits: &SetupBits) -> SetupStatus {
    SetupStatus {
        mode: OperatingMode::from_bits(decode_setup_mode(bits)),
        gain: Gain::from_bits(decode_setup_gain(bits)),
        polarity: if bits.contains(SetupBits::BU) {
            Polarity::Unipolar
        } else {
            Polarity::Bipolar
        },
        buffered: bits.contains(SetupBits::BUF),
        filter_sync: bits.contains(SetupBits::FSYNC),
    }
}

#[cfg(feature = "async")]
impl<SPI, D, RST, DRDY> Ad770x<SPI, D, RST, DRDY>
where
    SPI: embedded_hal_async::spi::SpiDevice,
    D: embedded_hal_async::delay::DelayNs,
    RST: OutputPin,
    DRDY: InputPin,
{
    /// Async version of [`select_register`](Self::select_register).
    pub async fn select_register_async(
        &mut self,
        register: Register,
        channel: Channel,
        access: Access,
    ) -> Result<(), Error<SPI::Error>> {
        let cmd = command_byte(register.id(), access == Access::Read, channel as u8);
        self.write_byte_async(cmd).await
    }

    /// Async version of [`write_clock_register`](Self::write_clock_register).
    pub async fn write_clock_register_async(
        &mut self,
        clock_disable: bool,
        divider: ClockDivider,
        update_rate: UpdateRate,
    ) -> Result<(), Error<SPI::Error>> {
        let divide = matches!(divider, ClockDivider::DivideBy2);
        self.write_byte_async(clock_byte(clock_disable, divide, update_rate as u8))
            .await
    }

    /// Async version of [`write_setup_register`](Self::write_setup_register).
    pub async fn write_setup_register_async(
        &mut self,
        mode: OperatingMode,
        gain: Gain,
        polarity: Polarity,
        buffered: bool,
        filter_sync: bool,
    ) -> Result<(), Error<SPI::Error>> {
        let unipolar = matches!(polarity, Polarity::Unipolar);
        self.write_byte_async(setup_byte(mode as u8, gain as u8, unipolar, buffered, filter_sync))
            .await
    }

    /// Async version of [`read_raw_unchecked`](Self::read_raw_unchecked).
    pub async fn read_raw_unchecked_async(&mut self) -> Result<i16, Error<SPI::Error>> {
        let mut buf = [0u8; 2];
        self.spi
            .transfer_in_place(&mut buf)
            .await
            .map_err(Error::Spi)?;
        Ok(code_to_raw(u16::from_be_bytes(buf)))
    }

    /// Async version of [`read_raw`](Self::read_raw).
    pub async fn read_raw_async(&mut self, channel: Channel) -> Result<Conversion<i16>, Error<SPI::Error>> {
        if self
            .wait_ready_async(channel, self.timeouts.read_ms)
            .await?
            .is_timed_out()
        {
            return Ok(Conversion::TimedOut);
        }
        self.select_register_async(Register::Data, channel, Access::Read)
            .await?;
        self.read_raw_unchecked_async().await.map(Conversion::Ready)
    }

    /// Async version of [`read_voltage`](Self::read_voltage).
    pub async fn read_voltage_async(
        &mut self,
        channel: Channel,
        offset: f32,
    ) -> Result<Conversion<f32>, Error<SPI::Error>> {
        let vref = self.vref;
        Ok(self
            .read_raw_async(channel)
            .await?
            .map(|raw| raw_to_volts(raw, vref, offset)))
    }

    /// Async version of [`is_data_ready`](Self::is_data_ready).
    pub async fn is_data_ready_async(&mut self, channel: Channel) -> Result<bool, Error<SPI::Error>> {
        if let Some(pin) = self.drdy.as_mut() {
            return pin.is_low().map_err(|_| Error::Pin);
        }
        self.select_register_async(Register::Communication, channel, Access::Read)
            .await?;
        let status = self.read_byte_async().await?;
        Ok(is_ready_status(status))
    }

    /// Async version of [`reset`](Self::reset).
    pub async fn reset_async(&mut self) -> Result<(), Error<SPI::Error>> {
        if let Some(pin) = self.reset.as_mut() {
            #[cfg(feature = "defmt")]
            defmt::debug!("ad770x: hardware reset");
            pin.set_low().map_err(|_| Error::Pin)?;
            self.delay.delay_ms(RESET_PULSE_MS).await;
            return pin.set_high().map_err(|_| Error::Pin);
        }
        #[cfg(feature = "defmt")]
        defmt::debug!("ad770x: serial resync reset");
        self.spi
            .write(&[0xFF; SOFT_RESET_LEN])
            .await
            .map_err(Error::Spi)
    }

    /// Async version of [`init`](Self::init).
    pub async fn init_async(
        &mut self,
        channel: Channel,
        setup: ChannelSetup,
    ) -> Result<Conversion<()>, Error<SPI::Error>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("ad770x: init {:?} with {:?}", channel, setup);
        self.select_register_async(Register::Clock, channel, Access::Write)
            .await?;
        self.write_clock_register_async(false, setup.divider, setup.update_rate)
            .await?;
        self.select_register_async(Register::Setup, channel, Access::Write)
            .await?;
        self.write_setup_register_async(
            OperatingMode::SelfCalibration,
            setup.gain,
            setup.polarity,
            setup.buffered,
            false,
        )
        .await?;
        self.select_register_async(Register::Test, channel, Access::Write)
            .await?;
        self.write_byte_async(TEST_REGISTER_INIT).await?;
        self.wait_ready_async(channel, self.timeouts.settle_ms).await
    }

    /// Async version of [`init_default`](Self::init_default).
    pub async fn init_default_async(&mut self, channel: Channel) -> Result<Conversion<()>, Error<SPI::Error>> {
        self.init_async(channel, ChannelSetup::default()).await
    }

    /// Async version of [`read_register`](Self::read_register).
    pub async fn read_register_async(
        &mut self,
        register: Register,
        channel: Channel,
    ) -> Result<u8, Error<SPI::Error>> {
        self.select_register_async(register, channel, Access::Read)
            .await?;
        self.read_byte_async().await
    }

    /// Async version of [`read_setup`](Self::read_setup).
    pub async fn read_setup_async(&mut self, channel: Channel) -> Result<SetupStatus, Error<SPI::Error>> {
        let bits = SetupBits::from_bits_retain(self.read_register_async(Register::Setup, channel).await?);
        Ok(decode_setup(&bits))
    }

    /// Async version of [`read_calibration`](Self::read_calibration).
    pub async fn read_calibration_async(&mut self, channel: Channel) -> Result<Calibration, Error<SPI::Error>> {
        let offset = self.read_u24_async(Register::Offset, channel).await?;
        let gain = self.read_u24_async(Register::Gain, channel).await?;
        Ok(Calibration { offset, gain })
    }

    /// Async version of [`write_calibration`](Self::write_calibration).
    pub async fn write_calibration_async(
        &mut self,
        channel: Channel,
        calibration: Calibration,
    ) -> Result<(), Error<SPI::Error>> {
        let offset = calibration_to_bytes(calibration.offset).ok_or(Error::OutOfRange)?;
        let gain = calibration_to_bytes(calibration.gain).ok_or(Error::OutOfRange)?;
        self.select_register_async(Register::Offset, channel, Access::Write)
            .await?;
        self.spi.write(&offset).await.map_err(Error::Spi)?;
        self.select_register_async(Register::Gain, channel, Access::Write)
            .await?;
        self.spi.write(&gain).await.map_err(Error::Spi)
    }

    /// Async version of [`calibrate`](Self::calibrate).
    pub async fn calibrate_async(
        &mut self,
        channel: Channel,
        mode: OperatingMode,
    ) -> Result<Conversion<()>, Error<SPI::Error>> {
        let current = self.read_setup_async(channel).await?;
        self.select_register_async(Register::Setup, channel, Access::Write)
            .await?;
        self.write_setup_register_async(mode, current.gain, current.polarity, current.buffered, false)
            .await?;
        self.wait_ready_async(channel, self.timeouts.read_ms).await
    }

    /// Async version of [`set_standby`](Self::set_standby).
    pub async fn set_standby_async(&mut self, channel: Channel, standby: bool) -> Result<(), Error<SPI::Error>> {
        let mut bits = CommBits::from_bits_retain(command_byte(addr::COMM, false, channel as u8));
        bits.set(CommBits::STBY, standby);
        self.write_byte_async(bits.bits()).await
    }

    async fn wait_ready_async(
        &mut self,
        channel: Channel,
        timeout_ms: u32,
    ) -> Result<Conversion<()>, Error<SPI::Error>> {
        for _ in 0..PollTimeouts::attempts(timeout_ms) {
            if self.is_data_ready_async(channel).await? {
                return Ok(Conversion::Ready(()));
            }
            self.delay.delay_ms(POLL_INTERVAL_MS).await;
        }
        #[cfg(feature = "defmt")]
        defmt::warn!("ad770x: {:?} not ready after {=u32} ms", channel, timeout_ms);
        Ok(Conversion::TimedOut)
    }

    async fn write_byte_async(&mut self, value: u8) -> Result<(), Error<SPI::Error>> {
        self.spi.write(&[value]).await.map_err(Error::Spi)
    }

    async fn read_byte_async(&mut self) -> Result<u8, Error<SPI::Error>> {
        let mut buf = [0u8; 1];
        self.spi
            .transfer_in_place(&mut buf)
            .await
            .map_err(Error::Spi)?;
        Ok(buf[0])
    }

    async fn read_u24_async(&mut self, register: Register, channel: Channel) -> Result<u32, Error<SPI::Error>> {
        self.select_register_async(register, channel, Access::Read)
            .await?;
        let mut buf = [0u8; 3];
        self.spi
            .transfer_in_place(&mut buf)
            .await
            .map_err(Error::Spi)?;
        Ok(calibration_from_bytes(buf))
    }
}
