//! Register map and constants for AD7705/AD7706.
//! Bit layouts follow the datasheet register tables; packing helpers are pure and bus-free.

/// Register selector ids (RS2..RS0 in the communication register).
pub mod addr {
    /// Communication register. Every transaction starts by writing it.
    pub const COMM: u8 = 0x0;
    /// Setup register (mode, gain, polarity, buffer, filter sync).
    pub const SETUP: u8 = 0x1;
    /// Clock register (master clock control and output update rate).
    pub const CLOCK: u8 = 0x2;
    /// 16-bit conversion result (read only).
    pub const DATA: u8 = 0x3;
    /// Factory test register. Writing 0x01 after reset is part of the init sequence.
    pub const TEST: u8 = 0x4;
    /// No operation.
    pub const NOOP: u8 = 0x5;
    /// 24-bit offset calibration register (per channel).
    pub const OFFSET: u8 = 0x6;
    /// 24-bit gain calibration register (per channel).
    pub const GAIN: u8 = 0x7;
}

/// Raw transfer value corresponding to 0 V in bipolar mode.
pub const MID_SCALE: u16 = 0x8000;
/// Number of codes across the full input span.
pub const FULL_SCALE_CODES: f32 = 65_536.0;
/// Largest value the 24-bit calibration registers hold.
pub const CALIBRATION_MAX: u32 = 0x00FF_FFFF;

/// Byte written to the test register during init.
pub const TEST_REGISTER_INIT: u8 = 0x01;

/// Width of the low pulse on the hardware reset pin.
pub const RESET_PULSE_MS: u32 = 200;
/// Length of the all-ones sequence that resynchronises the serial interface.
pub const SOFT_RESET_LEN: usize = 100;

/// Spacing between readiness polls.
pub const POLL_INTERVAL_MS: u32 = 1;
/// Default bound on waiting for a conversion before a data read.
pub const DEFAULT_READ_TIMEOUT_MS: u32 = 500;
/// Default bound on waiting for the first result after init.
pub const DEFAULT_SETTLE_TIMEOUT_MS: u32 = 20;

const RS_SHIFT: u8 = 4;
const RS_MASK: u8 = 0b111;
const CH_MASK: u8 = 0b11;
const FS_MASK: u8 = 0b111;
const MD_SHIFT: u8 = 6;
const MD_MASK: u8 = 0b11;
const G_SHIFT: u8 = 3;
const G_MASK: u8 = 0b111;

bitflags::bitflags! {
    /// Communication register bits.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct CommBits: u8 {
        /// Bit 7: inverted data-ready. Reads 0 when a fresh result is waiting.
        const DRDY = 1 << 7;
        /// Bits 6-4: register select.
        const RS2  = 1 << 6;
        const RS1  = 1 << 5;
        const RS0  = 1 << 4;
        /// Bit 3: next operation is a read (1) or a write (0).
        const RW   = 1 << 3;
        /// Bit 2: standby (power down, retaining calibration).
        const STBY = 1 << 2;
        /// Bits 1-0: channel select.
        const CH1  = 1 << 1;
        const CH0  = 1 << 0;
    }

    /// Clock register bits. Bits 7-5 must be written as zero.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct ClockBits: u8 {
        /// Bit 4: master clock disable.
        const CLKDIS = 1 << 4;
        /// Bit 3: divide master clock by two.
        const CLKDIV = 1 << 3;
        /// Bit 2: clock-source selection, paired with FS1..FS0 to pick the update rate.
        const CLK    = 1 << 2;
        const FS1    = 1 << 1;
        const FS0    = 1 << 0;
    }

    /// Setup register bits.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct SetupBits: u8 {
        /// Bits 7-6: operating mode.
        const MD1   = 1 << 7;
        const MD0   = 1 << 6;
        /// Bits 5-3: PGA gain.
        const G2    = 1 << 5;
        const G1    = 1 << 4;
        const G0    = 1 << 3;
        /// Bit 2: unipolar (1) or bipolar (0) input range.
        const BU    = 1 << 2;
        /// Bit 1: input buffer enable.
        const BUF   = 1 << 1;
        /// Bit 0: hold the digital filter in reset.
        const FSYNC = 1 << 0;
    }
}

/// Pack a communication-register byte: `reg << 4 | rw << 3 | channel`.
pub fn command_byte(reg: u8, read: bool, channel: u8) -> u8 {
    let mut bits = CommBits::from_bits_retain((reg & RS_MASK) << RS_SHIFT | (channel & CH_MASK));
    bits.set(CommBits::RW, read);
    bits.bits()
}

/// Pack a clock-register byte. CLK is always written as zero, whatever `update_rate` carries.
pub fn clock_byte(clock_disable: bool, divide: bool, update_rate: u8) -> u8 {
    let mut bits = ClockBits::from_bits_truncate(update_rate & FS_MASK);
    bits.set(ClockBits::CLKDIS, clock_disable);
    bits.set(ClockBits::CLKDIV, divide);
    bits.remove(ClockBits::CLK);
    bits.bits()
}

/// Pack a setup-register byte: `mode << 6 | gain << 3 | unipolar << 2 | buffered << 1 | fsync`.
pub fn setup_byte(mode: u8, gain: u8, unipolar: bool, buffered: bool, fsync: bool) -> u8 {
    let mut bits =
        SetupBits::from_bits_retain((mode & MD_MASK) << MD_SHIFT | (gain & G_MASK) << G_SHIFT);
    bits.set(SetupBits::BU, unipolar);
    bits.set(SetupBits::BUF, buffered);
    bits.set(SetupBits::FSYNC, fsync);
    bits.bits()
}

/// Extract the operating mode field from a setup byte.
pub fn decode_setup_mode(bits: &SetupBits) -> u8 {
    (bits.bits() >> MD_SHIFT) & MD_MASK
}

/// Extract the gain field from a setup byte.
pub fn decode_setup_gain(bits: &SetupBits) -> u8 {
    (bits.bits() >> G_SHIFT) & G_MASK
}

/// A status byte signals a waiting result when DRDY reads low.
pub fn is_ready_status(status: u8) -> bool {
    !CommBits::from_bits_retain(status).contains(CommBits::DRDY)
}

/// Convert the big-endian transfer value to a signed code centred on mid-scale.
pub fn code_to_raw(code: u16) -> i16 {
    code.wrapping_sub(MID_SCALE) as i16
}

/// Scale a signed code to volts against `vref`, then subtract `offset`.
pub fn raw_to_volts(raw: i16, vref: f32, offset: f32) -> f32 {
    raw as f32 / FULL_SCALE_CODES * vref - offset
}

/// Decode a 24-bit big-endian calibration register.
pub fn calibration_from_bytes(bytes: [u8; 3]) -> u32 {
    u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]])
}

/// Encode a calibration value as 24-bit big-endian. Returns `None` above 24 bits.
pub fn calibration_to_bytes(value: u32) -> Option<[u8; 3]> {
    if value > CALIBRATION_MAX {
        return None;
    }
    let [_, hi, mid, lo] = value.to_be_bytes();
    Some([hi, mid, lo])
}
