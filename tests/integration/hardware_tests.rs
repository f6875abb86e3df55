//! Hardware router tests: which chip a record reaches and what is written.

use camled::adapters::hardware::{HardwareRouter, PanelChip};
use camled::app::ports::LedHardware;
use camled::drivers::aw210xx::OFF_COMMAND;
use camled::drivers::lp5562::program::compile;
use camled::error::ApplyError;
use camled::{ActionDescriptor, ChannelConfig, LedControl, LedEndpoint, LedRecord, ResultKind};

use crate::mock_hw::{MockI2c, RecordingWriter, scratch_dir, scratch_paths, scratch_store};

fn blink_record() -> LedRecord {
    LedRecord {
        enabled: true,
        channels: [
            ChannelConfig::new(63, 255),
            ChannelConfig::new(63, 153),
            ChannelConfig::new(0, 0),
        ],
        ir_brightness: 0,
        action: ActionDescriptor::Blink {
            on_time_ms: 500,
            off_time_ms: 1000,
        },
    }
}

#[test]
fn lp5562_gets_currents_then_engine_programs() {
    let dir = scratch_dir("lp");
    let paths = scratch_paths(&dir);
    let i2c = MockI2c::default();
    let attrs = RecordingWriter::new();
    let mut router = HardwareRouter::new(&paths, i2c.clone(), attrs.clone());
    assert_eq!(router.panel_chip(), PanelChip::Lp5562);

    let rec = blink_record();
    router.apply(LedEndpoint::CameraFrontPanel, &rec).unwrap();

    assert_eq!(
        i2c.transfers(),
        vec![
            (0x30, vec![0x07, 63]),
            (0x30, vec![0x06, 63]),
            (0x30, vec![0x05, 0]),
        ]
    );

    let writes = attrs.take();
    assert_eq!(writes.len(), 17);
    assert_eq!(writes[0], (paths.lp5562_sysfs_dir.join("run_engine"), "0".to_owned()));
    assert_eq!(writes[16], (paths.lp5562_sysfs_dir.join("run_engine"), "1".to_owned()));

    let data = paths.lp5562_sysfs_dir.join("firmware/lp5562/data");
    let programs: Vec<String> = writes
        .iter()
        .filter(|(p, _)| *p == data)
        .map(|(_, v)| v.clone())
        .collect();
    let expected: Vec<String> = rec
        .channels
        .iter()
        .map(|c| compile(&rec.action, *c).unwrap().to_hex().unwrap().to_string())
        .collect();
    assert_eq!(programs, expected);
    assert_eq!(programs[0], "40FF600040007F004100A000D000");
}

#[test]
fn aw210xx_marker_switches_panel_driver() {
    let dir = scratch_dir("aw");
    let paths = scratch_paths(&dir);
    std::fs::write(&paths.aw210xx_marker, b"").unwrap();
    let i2c = MockI2c::default();
    let attrs = RecordingWriter::new();
    let mut router = HardwareRouter::new(&paths, i2c.clone(), attrs.clone());
    assert_eq!(router.panel_chip(), PanelChip::Aw210xx);

    let mut rec = blink_record();
    rec.action = ActionDescriptor::On;
    router.apply(LedEndpoint::CameraFrontPanel, &rec).unwrap();
    rec.action = ActionDescriptor::Off;
    router.apply(LedEndpoint::CameraFrontPanel, &rec).unwrap();

    assert_eq!(
        attrs.values_for(&paths.aw210xx_rgbcolor),
        ["0x00 0x3f3f00 0xff9900", OFF_COMMAND]
    );
    assert_eq!(i2c.opens(), 0);
}

#[test]
fn xw_panel_reaches_chip_only_when_local() {
    let dir = scratch_dir("xw");
    let mut paths = scratch_paths(&dir);
    let i2c = MockI2c::default();
    let attrs = RecordingWriter::new();
    let mut remote = HardwareRouter::new(&paths, i2c.clone(), attrs.clone());
    remote.apply(LedEndpoint::XwFrontPanel, &blink_record()).unwrap();
    assert_eq!(i2c.opens(), 0);
    assert!(attrs.take().is_empty());

    paths.xw_panel_local = true;
    let mut local = HardwareRouter::new(&paths, i2c.clone(), attrs.clone());
    local.apply(LedEndpoint::XwFrontPanel, &blink_record()).unwrap();
    assert_eq!(i2c.opens(), 1);
    assert_eq!(attrs.take().len(), 17);
}

#[test]
fn ir_endpoint_always_uses_backlight() {
    let dir = scratch_dir("ir");
    let paths = scratch_paths(&dir);
    std::fs::write(&paths.aw210xx_marker, b"").unwrap();
    let attrs = RecordingWriter::new();
    let mut router = HardwareRouter::new(&paths, MockI2c::default(), attrs.clone());

    let mut rec = LedRecord::defaults_for(LedEndpoint::CameraIr);
    router.apply(LedEndpoint::CameraIr, &rec).unwrap();
    rec.action = ActionDescriptor::Off;
    router.apply(LedEndpoint::CameraIr, &rec).unwrap();

    assert_eq!(attrs.values_for(&paths.ir_brightness), ["80", "0"]);
    assert!(attrs.values_for(&paths.aw210xx_rgbcolor).is_empty());
}

#[test]
fn bus_failure_surfaces_as_unknown() {
    let dir = scratch_dir("busfail");
    let paths = scratch_paths(&dir);
    let i2c = MockI2c {
        fail_open: true,
        ..MockI2c::default()
    };
    let attrs = RecordingWriter::new();
    let router = HardwareRouter::new(&paths, i2c, attrs.clone());
    let mut ctl = LedControl::new(scratch_store(&dir), router);
    ctl.init(LedEndpoint::CameraFrontPanel).unwrap();

    let r = ctl.apply(LedEndpoint::CameraFrontPanel);
    assert_eq!(ResultKind::of(&r), ResultKind::Unknown);
    assert!(matches!(
        r,
        Err(camled::LedError::Apply(ApplyError::Open { .. }))
    ));
    assert!(attrs.take().is_empty(), "no engine writes after a bus failure");
}
