//! Data types for the AD7705/AD7706 driver (register fields, init settings, poll results).

use crate::registers::{
    addr, DEFAULT_READ_TIMEOUT_MS, DEFAULT_SETTLE_TIMEOUT_MS, POLL_INTERVAL_MS,
};

/// Register targeted by the next transfer.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Register {
    Communication,
    Setup,
    Clock,
    Data,
    Test,
    NoOp,
    Offset,
    Gain,
}

impl Register {
    /// RS2..RS0 selector value.
    pub fn id(self) -> u8 {
        match self {
            Register::Communication => addr::COMM,
            Register::Setup => addr::SETUP,
            Register::Clock => addr::CLOCK,
            Register::Data => addr::DATA,
            Register::Test => addr::TEST,
            Register::NoOp => addr::NOOP,
            Register::Offset => addr::OFFSET,
            Register::Gain => addr::GAIN,
        }
    }
}

/// Direction of the transfer that follows a register select.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Access {
    Write,
    Read,
}

/// Input channel pair (CH1..CH0). Pair names are for the AD7705; the AD7706
/// maps the same codes onto AIN1/AIN2/AIN3 against COMMON.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Channel {
    /// AIN1(+) / AIN1(-).
    Ain1 = 0,
    /// AIN2(+) / AIN2(-).
    Ain2 = 1,
    /// AIN1(-) / AIN1(-), internal zero check.
    Common = 2,
    /// AIN1(-) / AIN2(-).
    Ain3 = 3,
}

/// Operating mode (MD1..MD0).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OperatingMode {
    Normal = 0,
    /// Internal zero-scale and full-scale calibration.
    SelfCalibration = 1,
    /// Zero-scale calibration against the voltage present on the input.
    ZeroScaleCalibration = 2,
    /// Full-scale calibration against the voltage present on the input.
    FullScaleCalibration = 3,
}

impl OperatingMode {
    pub(crate) fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => OperatingMode::Normal,
            1 => OperatingMode::SelfCalibration,
            2 => OperatingMode::ZeroScaleCalibration,
            _ => OperatingMode::FullScaleCalibration,
        }
    }
}

/// Programmable gain (G2..G0).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Gain {
    #[default]
    G1 = 0,
    G2 = 1,
    G4 = 2,
    G8 = 3,
    G16 = 4,
    G32 = 5,
    G64 = 6,
    G128 = 7,
}

impl Gain {
    pub(crate) fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0 => Gain::G1,
            1 => Gain::G2,
            2 => Gain::G4,
            3 => Gain::G8,
            4 => Gain::G16,
            5 => Gain::G32,
            6 => Gain::G64,
            _ => Gain::G128,
        }
    }

    /// Numeric gain factor.
    pub fn factor(self) -> u8 {
        1 << (self as u8)
    }
}

/// Input range polarity (B/U).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Polarity {
    /// -Vref/gain .. +Vref/gain.
    #[default]
    Bipolar,
    /// 0 .. +Vref/gain.
    Unipolar,
}

/// Master clock divider (CLKDIV).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ClockDivider {
    /// Master clock used as-is.
    Undivided,
    /// Master clock halved internally (4.9152 MHz / 2 MHz crystals).
    #[default]
    DivideBy2,
}

/// Output update rate code (CLK, FS1, FS0).
///
/// The driver always writes CLK = 0, so the four CLK = 1 codes land on the
/// rate that shares their FS bits: 50 Hz behaves as 20 Hz, 60 Hz as 25 Hz,
/// 250 Hz as 100 Hz and 500 Hz as 200 Hz.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum UpdateRate {
    Hz20 = 0b000,
    #[default]
    Hz25 = 0b001,
    Hz100 = 0b010,
    Hz200 = 0b011,
    Hz50 = 0b100,
    Hz60 = 0b101,
    Hz250 = 0b110,
    Hz500 = 0b111,
}

/// Per-channel parameters applied by `init`.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ChannelSetup {
    pub divider: ClockDivider,
    pub polarity: Polarity,
    pub gain: Gain,
    pub update_rate: UpdateRate,
    /// Enable the analog input buffer.
    pub buffered: bool,
}

/// Setup register contents decoded from a readback.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SetupStatus {
    pub mode: OperatingMode,
    pub gain: Gain,
    pub polarity: Polarity,
    pub buffered: bool,
    pub filter_sync: bool,
}

/// Offset and gain calibration coefficients (24-bit each).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Calibration {
    pub offset: u32,
    pub gain: u32,
}

/// Bounds on readiness polling, in milliseconds. One poll is made per
/// millisecond, so a bound of N gives exactly N polls (at least one).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PollTimeouts {
    /// Wait before each data read.
    pub read_ms: u32,
    /// Wait for the first result after init or calibration.
    pub settle_ms: u32,
}

impl Default for PollTimeouts {
    fn default() -> Self {
        Self {
            read_ms: DEFAULT_READ_TIMEOUT_MS,
            settle_ms: DEFAULT_SETTLE_TIMEOUT_MS,
        }
    }
}

impl PollTimeouts {
    pub(crate) fn attempts(timeout_ms: u32) -> u32 {
        (timeout_ms / POLL_INTERVAL_MS).max(1)
    }
}

/// Outcome of an operation gated on the data-ready signal.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[must_use]
pub enum Conversion<T> {
    /// The device signalled ready and the value was read.
    Ready(T),
    /// The device never signalled ready within the poll bound; nothing was read.
    TimedOut,
}

impl<T> Conversion<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Conversion::Ready(_))
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, Conversion::TimedOut)
    }

    /// Value if ready.
    pub fn ready(self) -> Option<T> {
        match self {
            Conversion::Ready(v) => Some(v),
            Conversion::TimedOut => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Conversion<U> {
        match self {
            Conversion::Ready(v) => Conversion::Ready(f(v)),
            Conversion::TimedOut => Conversion::TimedOut,
        }
    }
}
