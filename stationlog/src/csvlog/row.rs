//! Data row formatting.
//!
//! Every row has [`COLUMN_COUNT`] columns in the order of [`COLUMN_HEADER`].
//! Optional values that are disabled or unavailable are written as `-1`, so
//! the column count never varies.

use std::fmt::Write;

use crate::driver::{
    StationConfig, StationHardwareInfo, StationSample, MAX_AUX_INPUTS, MAX_BUTTONS,
};

/// Header line preceding the data rows.
pub const COLUMN_HEADER: &str = "TrackerNum,StationNum,X,Y,Z,Yaw,Pitch,Roll,Time,DoubleTime,\
DoubleOSTime,TQ,CI,MQ,GXBF,GYBF,GZBF,GXNF,GYNF,GZNF,GXRAW,GYRAW,GZRAW,AXBF,AYBF,AZBF,\
AXNF,AYNF,AZNF,MagX,MagY,MagZ,CompassYaw,JoystickAxis1,JoystickAxis2,Buttons,AuxIn0,\
AuxIn1,AuxIn2,AuxIn3,StillTime,Vbatt,Temperature";

/// Number of columns in every data row.
pub const COLUMN_COUNT: usize = 43;

/// Sentinel for disabled or unavailable values.
const MISSING: &str = "-1";

/// Tracking quality as a percentage of the raw 0..=255 value.
///
/// Equal to `floor(raw / 2.55)`, computed in integers.
pub fn tracking_quality(raw: u8) -> u8 {
    (u16::from(raw) * 100 / 255) as u8
}

/// Pack button states into a byte, bit `i` set when button `i` is pressed.
pub fn pack_buttons(buttons: &[bool]) -> u8 {
    buttons
        .iter()
        .take(MAX_BUTTONS)
        .enumerate()
        .fold(0u8, |acc, (i, pressed)| acc | (u8::from(*pressed) << i))
}

/// Everything needed to format one data row.
#[derive(Debug, Clone, Copy)]
pub struct RowInput<'a> {
    /// 1-based tracker number.
    pub tracker_num: u32,
    /// 1-based station number.
    pub station: u8,
    pub sample: &'a StationSample,
    /// Configuration of the station being logged.
    pub config: &'a StationConfig,
    pub hardware: Option<&'a StationHardwareInfo>,
    /// OS clock minus device clock, from the stream's first row.
    pub os_offset: f64,
}

/// Format one data row, without the trailing newline.
pub fn format_row(input: &RowInput<'_>) -> String {
    let s = input.sample;
    let mut row = String::with_capacity(512);

    // Writing into a String cannot fail.
    let _ = write!(row, "{},{},", input.tracker_num, input.station);
    push_vec(&mut row, &s.position, 5);
    push_vec(&mut row, &s.euler, 3);
    let _ = write!(
        row,
        "{:.4},{:.4},{:.4},",
        s.timestamp,
        s.device_time(),
        s.os_time() - input.os_offset
    );
    let _ = write!(
        row,
        "{},{},{},",
        tracking_quality(s.tracking_status),
        s.comm_integrity,
        s.meas_quality
    );
    push_vec(&mut row, &s.angular_vel_body, 5);
    push_vec(&mut row, &s.angular_vel_nav, 5);
    push_vec(&mut row, &s.angular_vel_raw, 5);
    push_vec(&mut row, &s.accel_body, 5);
    push_vec(&mut row, &s.accel_nav, 5);
    push_vec(&mut row, &s.mag_body, 5);
    let _ = write!(row, "{:.3},", s.compass_yaw);

    if input.config.digital_inputs {
        let _ = write!(row, "{},{},", s.analog[0], s.analog[1]);
        let _ = write!(row, "{},", pack_buttons(&s.buttons));
    } else {
        let _ = write!(row, "{MISSING},{MISSING},{MISSING},");
    }

    let aux_available = input.hardware.map(|h| usize::from(h.aux_inputs)).unwrap_or(0);
    for i in 0..MAX_AUX_INPUTS {
        if input.config.aux_inputs && i < aux_available {
            let _ = write!(row, "{},", s.aux_inputs[i]);
        } else {
            let _ = write!(row, "{MISSING},");
        }
    }

    let _ = write!(
        row,
        "{:.4},{:.3},{:.3}",
        s.still_time, s.battery_level, s.temperature
    );
    row
}

fn push_vec(row: &mut String, values: &[f32], precision: usize) {
    for value in values {
        let _ = write!(row, "{:.*},", precision, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input<'a>(
        sample: &'a StationSample,
        config: &'a StationConfig,
        hardware: Option<&'a StationHardwareInfo>,
    ) -> RowInput<'a> {
        RowInput {
            tracker_num: 1,
            station: 2,
            sample,
            config,
            hardware,
            os_offset: 0.0,
        }
    }

    fn columns(row: &str) -> Vec<&str> {
        row.split(',').collect()
    }

    #[test]
    fn test_header_column_count() {
        assert_eq!(COLUMN_HEADER.split(',').count(), COLUMN_COUNT);
        assert!(!COLUMN_HEADER.contains(' '));
    }

    #[test]
    fn test_tracking_quality_scaling() {
        assert_eq!(tracking_quality(0), 0);
        assert_eq!(tracking_quality(128), 50);
        assert_eq!(tracking_quality(255), 100);
    }

    #[test]
    fn test_pack_buttons() {
        assert_eq!(pack_buttons(&[true, false, true]), 0b101);
        assert_eq!(pack_buttons(&[false; 8]), 0);
        assert_eq!(pack_buttons(&[true; 8]), 0xFF);
    }

    #[test]
    fn test_disabled_inputs_use_sentinels() {
        let sample = StationSample::default();
        let config = StationConfig::default();
        let row = format_row(&input(&sample, &config, None));
        let cols = columns(&row);

        assert_eq!(cols.len(), COLUMN_COUNT);
        assert_eq!(&cols[33..40], &["-1"; 7]);
    }

    #[test]
    fn test_enabled_inputs_are_written() {
        let mut sample = StationSample::default();
        sample.analog[0] = 12;
        sample.analog[1] = 200;
        sample.buttons[0] = true;
        sample.buttons[2] = true;
        sample.aux_inputs = [0xA, 0xB, 0xC, 0xD];
        let config = StationConfig {
            digital_inputs: true,
            aux_inputs: true,
            ..Default::default()
        };
        let hardware = StationHardwareInfo {
            aux_inputs: 2,
            ..Default::default()
        };

        let row = format_row(&input(&sample, &config, Some(&hardware)));
        let cols = columns(&row);

        assert_eq!(cols.len(), COLUMN_COUNT);
        assert_eq!(&cols[33..40], &["12", "200", "5", "10", "11", "-1", "-1"]);
    }

    #[test]
    fn test_identity_and_precision() {
        let sample = StationSample {
            position: [0.123456, -1.0, 2.5],
            euler: [90.0, -45.5, 0.0],
            timestamp: 1.25,
            tracking_status: 128,
            comm_integrity: 99,
            meas_quality: 77,
            ..Default::default()
        };
        let config = StationConfig::default();
        let row = format_row(&input(&sample, &config, None));
        let cols = columns(&row);

        assert_eq!(&cols[0..2], &["1", "2"]);
        assert_eq!(&cols[2..5], &["0.12346", "-1.00000", "2.50000"]);
        assert_eq!(&cols[5..8], &["90.000", "-45.500", "0.000"]);
        assert_eq!(cols[8], "1.2500");
        assert_eq!(&cols[11..14], &["50", "99", "77"]);
    }

    #[test]
    fn test_os_time_is_offset() {
        let sample = StationSample {
            os_timestamp_seconds: 1000,
            os_timestamp_micros: 500_000,
            ..Default::default()
        };
        let config = StationConfig::default();
        let mut row_input = input(&sample, &config, None);
        row_input.os_offset = 990.0;

        let row = format_row(&row_input);
        assert_eq!(columns(&row)[10], "10.5000");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_column_count_is_constant(
                digital in any::<bool>(),
                aux in any::<bool>(),
                aux_count in 0u8..=4,
                hardware_known in any::<bool>(),
                raw in any::<u8>(),
                yaw in -180.0f32..180.0,
            ) {
                let sample = StationSample {
                    tracking_status: raw,
                    euler: [yaw, 0.0, 0.0],
                    ..Default::default()
                };
                let config = StationConfig {
                    digital_inputs: digital,
                    aux_inputs: aux,
                    ..Default::default()
                };
                let hardware = StationHardwareInfo {
                    aux_inputs: aux_count,
                    ..Default::default()
                };
                let hw = hardware_known.then_some(&hardware);

                let row = format_row(&input(&sample, &config, hw));
                prop_assert_eq!(row.split(',').count(), COLUMN_COUNT);
            }

            #[test]
            fn test_quality_matches_float_division(raw in any::<u8>()) {
                let expected = (f64::from(raw) / 2.55 + 1e-9).floor() as u8;
                prop_assert_eq!(tracking_quality(raw), expected);
            }
        }
    }
}
