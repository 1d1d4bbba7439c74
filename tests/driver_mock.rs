use ad770x_rs::data_types::{
    Access, Calibration, Channel, ChannelSetup, Conversion, Gain, OperatingMode, Polarity, PollTimeouts, Register,
    UpdateRate,
};
use ad770x_rs::{Ad770x, Error};
use embedded_hal::delay::DelayNs;
use embedded_hal_mock::eh1::delay::NoopDelay;
use embedded_hal_mock::eh1::digital::{Mock as PinMock, State as PinState, Transaction as PinTrans};
use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTrans};

/// Accumulates requested delay so tests can check wait lengths.
#[derive(Default)]
struct RecordingDelay {
    total_ns: u64,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }
}

fn write(bytes: &[u8]) -> [SpiTrans<u8>; 3] {
    [
        SpiTrans::transaction_start(),
        SpiTrans::write_vec(bytes.to_vec()),
        SpiTrans::transaction_end(),
    ]
}

fn read(response: &[u8]) -> [SpiTrans<u8>; 3] {
    [
        SpiTrans::transaction_start(),
        SpiTrans::transfer_in_place(vec![0x00; response.len()], response.to_vec()),
        SpiTrans::transaction_end(),
    ]
}

#[test]
fn select_register_writes_packed_command() {
    let expectations = write(&[0b0011_1001]);
    let mut driver = Ad770x::new(SpiMock::new(&expectations), NoopDelay::new(), 2.5);
    driver
        .select_register(Register::Data, Channel::Ain2, Access::Read)
        .unwrap();
    driver.free().0.done();
}

#[test]
fn read_raw_unchecked_is_big_endian_minus_mid_scale() {
    let expectations = read(&[0x80, 0x10]);
    let mut driver = Ad770x::new(SpiMock::new(&expectations), NoopDelay::new(), 2.5);
    assert_eq!(driver.read_raw_unchecked().unwrap(), 0x10);
    driver.free().0.done();
}

#[test]
fn read_raw_with_ready_pin() {
    let drdy = PinMock::new(&[PinTrans::get(PinState::Low)]);
    let expectations = [write(&[0x39]), read(&[0x00, 0x00])].concat();
    let mut driver = Ad770x::new(SpiMock::new(&expectations), NoopDelay::new(), 2.5).with_data_ready_pin(drdy);

    assert_eq!(driver.read_raw(Channel::Ain2).unwrap(), Conversion::Ready(i16::MIN));

    let (mut spi, _, _, drdy) = driver.free();
    spi.done();
    drdy.unwrap().done();
}

#[test]
fn read_raw_polls_status_register_without_ready_pin() {
    // First status read has DRDY set (busy), second is clear.
    let expectations = [
        write(&[0x08]),
        read(&[0x88]),
        write(&[0x08]),
        read(&[0x08]),
        write(&[0x38]),
        read(&[0x90, 0x00]),
    ]
    .concat();
    let mut driver = Ad770x::new(SpiMock::new(&expectations), RecordingDelay::default(), 2.5);

    assert_eq!(driver.read_raw(Channel::Ain1).unwrap(), Conversion::Ready(0x1000));

    let (mut spi, delay, _, _) = driver.free();
    spi.done();
    assert_eq!(delay.total_ns, 1_000_000);
}

#[test]
fn read_raw_times_out_after_exactly_500_polls() {
    let never_ready = vec![PinTrans::get(PinState::High); 500];
    let drdy = PinMock::new(&never_ready);
    let expectations: [SpiTrans<u8>; 0] = [];
    let mut driver =
        Ad770x::new(SpiMock::new(&expectations), RecordingDelay::default(), 2.5).with_data_ready_pin(drdy);

    assert_eq!(driver.read_raw(Channel::Ain1).unwrap(), Conversion::TimedOut);

    let (mut spi, delay, _, drdy) = driver.free();
    spi.done();
    drdy.unwrap().done();
    assert_eq!(delay.total_ns, 500_000_000);
}

#[test]
fn read_raw_honours_custom_timeout() {
    let drdy = PinMock::new(&vec![PinTrans::get(PinState::High); 3]);
    let expectations: [SpiTrans<u8>; 0] = [];
    let mut driver = Ad770x::new(SpiMock::new(&expectations), NoopDelay::new(), 2.5)
        .with_data_ready_pin(drdy)
        .with_timeouts(PollTimeouts {
            read_ms: 3,
            settle_ms: 1,
        });

    assert!(driver.read_raw(Channel::Ain1).unwrap().is_timed_out());

    let (mut spi, _, _, drdy) = driver.free();
    spi.done();
    drdy.unwrap().done();
}

#[test]
fn read_voltage_scales_with_vref() {
    let drdy = PinMock::new(&[PinTrans::get(PinState::Low)]);
    let expectations = [write(&[0x38]), read(&[0xFF, 0xFF])].concat();
    let mut driver = Ad770x::new(SpiMock::new(&expectations), NoopDelay::new(), 2.5).with_data_ready_pin(drdy);

    let volts = driver.read_voltage(Channel::Ain1, 0.0).unwrap().ready().unwrap();
    assert!((volts - 1.249_98).abs() < 1e-4);

    let (mut spi, _, _, drdy) = driver.free();
    spi.done();
    drdy.unwrap().done();
}

#[test]
fn ready_pin_is_active_low() {
    let drdy = PinMock::new(&[PinTrans::get(PinState::Low), PinTrans::get(PinState::High)]);
    let expectations: [SpiTrans<u8>; 0] = [];
    let mut driver = Ad770x::new(SpiMock::new(&expectations), NoopDelay::new(), 2.5).with_data_ready_pin(drdy);

    assert!(driver.is_data_ready(Channel::Ain1).unwrap());
    assert!(!driver.is_data_ready(Channel::Ain1).unwrap());

    let (mut spi, _, _, drdy) = driver.free();
    spi.done();
    drdy.unwrap().done();
}

#[test]
fn software_reset_clocks_ones_in_one_frame() {
    let expectations = write(&[0xFF; 100]);
    let mut driver = Ad770x::new(SpiMock::new(&expectations), NoopDelay::new(), 2.5);
    driver.reset().unwrap();
    driver.free().0.done();
}

#[test]
fn hardware_reset_pulses_pin_for_200ms() {
    let rst = PinMock::new(&[PinTrans::set(PinState::Low), PinTrans::set(PinState::High)]);
    let expectations: [SpiTrans<u8>; 0] = [];
    let mut driver =
        Ad770x::new(SpiMock::new(&expectations), RecordingDelay::default(), 2.5).with_reset_pin(rst);

    driver.reset().unwrap();

    let (mut spi, delay, rst, _) = driver.free();
    spi.done();
    rst.unwrap().done();
    assert_eq!(delay.total_ns, 200_000_000);
}

#[test]
fn init_default_programs_clock_setup_and_test_registers() {
    let drdy = PinMock::new(&[PinTrans::get(PinState::High), PinTrans::get(PinState::Low)]);
    let expectations = [
        write(&[0x20]),
        write(&[0x09]),
        write(&[0x10]),
        write(&[0x40]),
        write(&[0x40]),
        write(&[0x01]),
    ]
    .concat();
    let mut driver = Ad770x::new(SpiMock::new(&expectations), NoopDelay::new(), 2.5).with_data_ready_pin(drdy);

    assert_eq!(driver.init_default(Channel::Ain1).unwrap(), Conversion::Ready(()));

    let (mut spi, _, _, drdy) = driver.free();
    spi.done();
    drdy.unwrap().done();
}

#[test]
fn init_reports_settle_timeout() {
    let drdy = PinMock::new(&vec![PinTrans::get(PinState::High); 20]);
    let setup = ChannelSetup {
        polarity: Polarity::Unipolar,
        gain: Gain::G8,
        update_rate: UpdateRate::Hz100,
        buffered: true,
        ..ChannelSetup::default()
    };
    let expectations = [
        write(&[0x21]),
        write(&[0x0A]),
        write(&[0x11]),
        write(&[0x5E]),
        write(&[0x41]),
        write(&[0x01]),
    ]
    .concat();
    let mut driver = Ad770x::new(SpiMock::new(&expectations), NoopDelay::new(), 2.5).with_data_ready_pin(drdy);

    assert_eq!(driver.init(Channel::Ain2, setup).unwrap(), Conversion::TimedOut);

    let (mut spi, _, _, drdy) = driver.free();
    spi.done();
    drdy.unwrap().done();
}

#[test]
fn read_setup_decodes_fields() {
    let expectations = [write(&[0x18]), read(&[0x56])].concat();
    let mut driver = Ad770x::new(SpiMock::new(&expectations), NoopDelay::new(), 2.5);

    let setup = driver.read_setup(Channel::Ain1).unwrap();
    assert_eq!(setup.mode, OperatingMode::SelfCalibration);
    assert_eq!(setup.gain, Gain::G4);
    assert_eq!(setup.polarity, Polarity::Unipolar);
    assert!(setup.buffered);
    assert!(!setup.filter_sync);

    driver.free().0.done();
}

#[test]
fn calibrate_keeps_gain_and_polarity() {
    let drdy = PinMock::new(&[PinTrans::get(PinState::Low)]);
    let expectations = [write(&[0x19]), read(&[0x16]), write(&[0x11]), write(&[0x96])].concat();
    let mut driver = Ad770x::new(SpiMock::new(&expectations), NoopDelay::new(), 2.5).with_data_ready_pin(drdy);

    assert!(
        driver
            .calibrate(Channel::Ain2, OperatingMode::ZeroScaleCalibration)
            .unwrap()
            .is_ready()
    );

    let (mut spi, _, _, drdy) = driver.free();
    spi.done();
    drdy.unwrap().done();
}

#[test]
fn read_calibration_reads_offset_then_gain() {
    let expectations = [
        write(&[0x68]),
        read(&[0x1F, 0x40, 0x00]),
        write(&[0x78]),
        read(&[0x57, 0x61, 0xAB]),
    ]
    .concat();
    let mut driver = Ad770x::new(SpiMock::new(&expectations), NoopDelay::new(), 2.5);

    let cal = driver.read_calibration(Channel::Ain1).unwrap();
    assert_eq!(
        cal,
        Calibration {
            offset: 0x1F_4000,
            gain: 0x57_61AB,
        }
    );

    driver.free().0.done();
}

#[test]
fn write_calibration_restores_coefficients() {
    let expectations = [
        write(&[0x61]),
        write(&[0x1F, 0x40, 0x00]),
        write(&[0x71]),
        write(&[0x57, 0x61, 0xAB]),
    ]
    .concat();
    let mut driver = Ad770x::new(SpiMock::new(&expectations), NoopDelay::new(), 2.5);

    driver
        .write_calibration(
            Channel::Ain2,
            Calibration {
                offset: 0x1F_4000,
                gain: 0x57_61AB,
            },
        )
        .unwrap();

    driver.free().0.done();
}

#[test]
fn write_calibration_rejects_values_over_24_bits() {
    let expectations: [SpiTrans<u8>; 0] = [];
    let mut driver = Ad770x::new(SpiMock::new(&expectations), NoopDelay::new(), 2.5);

    let result = driver.write_calibration(
        Channel::Ain1,
        Calibration {
            offset: 0x0100_0000,
            gain: 0,
        },
    );
    assert!(matches!(result, Err(Error::OutOfRange)));

    driver.free().0.done();
}

#[test]
fn standby_sets_stby_bit() {
    let expectations = [write(&[0x04]), write(&[0x00])].concat();
    let mut driver = Ad770x::new(SpiMock::new(&expectations), NoopDelay::new(), 2.5);

    driver.set_standby(Channel::Ain1, true).unwrap();
    driver.set_standby(Channel::Ain1, false).unwrap();

    driver.free().0.done();
}

#[test]
fn vref_is_adjustable() {
    let expectations: [SpiTrans<u8>; 0] = [];
    let mut driver = Ad770x::new(SpiMock::new(&expectations), NoopDelay::new(), 2.5);
    assert_eq!(driver.vref(), 2.5);
    driver.set_vref(1.225);
    assert_eq!(driver.vref(), 1.225);
    driver.free().0.done();
}
