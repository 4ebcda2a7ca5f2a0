//! # Field Codecs
//!
//! Stateless readers that interpret a fixed-width little-endian window of a
//! frame body and convert it into a physical unit.
//!
//! Callers check the body against the frame's layout width first, so every
//! read here stays in bounds.

use chrono::{DateTime, NaiveDate, Utc};

/// Standard sea-level pressure in hPa
const SEA_LEVEL_PRESSURE_HPA: f64 = 1013.25;

/// Altitude constant of the barometric formula, in meters
const BAROMETRIC_ALTITUDE_M: f64 = 44307.69396;

/// Exponent of the barometric formula
const BAROMETRIC_EXPONENT: f64 = 5.2553;

/// Raw stick value at center position
const STICK_CENTER: f64 = 1024.0;

/// Offset between Kelvin and Celsius
const KELVIN_OFFSET: f64 = 273.15;

/// Year encoded as zero in packed dates
const PACKED_DATE_EPOCH_YEAR: i32 = 1980;

fn array<const N: usize>(body: &[u8], at: usize) -> [u8; N] {
    let mut buf = [0u8; N];
    buf.copy_from_slice(&body[at..at + N]);
    buf
}

pub fn read_u8(body: &[u8], at: usize) -> u8 {
    body[at]
}

pub fn read_u16(body: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([body[at], body[at + 1]])
}

pub fn read_i16(body: &[u8], at: usize) -> i16 {
    i16::from_le_bytes([body[at], body[at + 1]])
}

pub fn read_u32(body: &[u8], at: usize) -> u32 {
    u32::from_le_bytes(array(body, at))
}

pub fn read_u64(body: &[u8], at: usize) -> u64 {
    u64::from_le_bytes(array(body, at))
}

pub fn read_f32(body: &[u8], at: usize) -> f32 {
    f32::from_le_bytes(array(body, at))
}

pub fn read_f64(body: &[u8], at: usize) -> f64 {
    f64::from_le_bytes(array(body, at))
}

/// Value stored in tenths of its unit
pub fn tenths(raw: i32) -> f64 {
    raw as f64 / 10.0
}

/// Value stored in thousandths of its unit (mV → V, mA → A)
pub fn thousandths(raw: i32) -> f64 {
    raw as f64 / 1000.0
}

/// Stick position: 1024 is center, result is in [-1, 1] for raw 0..=2048
pub fn stick(raw: u16) -> f64 {
    raw as f64 / STICK_CENTER - 1.0
}

/// Heading stored in tenths of a degree, normalized into [0, 360)
pub fn heading(raw: i16) -> f64 {
    tenths(raw as i32).rem_euclid(360.0)
}

/// GPS coordinate stored in radians
pub fn coordinate(radians: f64) -> f64 {
    radians.to_degrees()
}

/// Temperature stored in tenths of a Kelvin
pub fn celsius_from_decikelvin(raw: u16) -> f64 {
    tenths(raw as i32) - KELVIN_OFFSET
}

/// Barometric pressure in hPa for a pressure altitude in meters
pub fn pressure_from_altitude(altitude_m: f64) -> f64 {
    SEA_LEVEL_PRESSURE_HPA * (1.0 - altitude_m / BAROMETRIC_ALTITUDE_M).powf(BAROMETRIC_EXPONENT)
}

/// Milliseconds since the Unix epoch as a UTC timestamp
pub fn timestamp_millis(raw: u64) -> Option<DateTime<Utc>> {
    let millis = i64::try_from(raw).ok()?;
    DateTime::from_timestamp_millis(millis)
}

/// Seconds since the Unix epoch as a UTC timestamp
pub fn timestamp_secs(raw: u64) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(raw).ok()?;
    DateTime::from_timestamp(secs, 0)
}

/// Date packed into 16 bits: year since 1980 (7 bits), month (4 bits), day (5 bits)
///
/// On the two little-endian bytes `lo`, `hi` this is:
/// year = `(hi >> 1) + 1980`, month = `((hi & 1) << 3) | (lo >> 5)`, day = `lo & 0x1F`.
pub fn packed_date(raw: u16) -> Option<NaiveDate> {
    let year = (raw >> 9) as i32 + PACKED_DATE_EPOCH_YEAR;
    let month = ((raw >> 5) & 0x0F) as u32;
    let day = (raw & 0x1F) as u32;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Fixed-width text field, NUL padding trimmed
pub fn fixed_str(body: &[u8], at: usize, len: usize) -> String {
    text(&body[at..at + len])
}

/// Free text, NUL padding trimmed and invalid UTF-8 replaced
pub fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches('\0')
        .replace('\0', "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};
    use proptest::prelude::*;

    #[test]
    fn test_little_endian_reads() {
        let body = [0x34, 0x12, 0xFF, 0xFF, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(read_u8(&body, 0), 0x34);
        assert_eq!(read_u16(&body, 0), 0x1234);
        assert_eq!(read_i16(&body, 2), -1);
        assert_eq!(read_u32(&body, 4), 1);
        assert_eq!(read_u64(&body, 2), 0x0000_0001_FFFF);
    }

    #[test]
    fn test_float_reads() {
        let mut body = Vec::new();
        body.extend_from_slice(&1.5f32.to_le_bytes());
        body.extend_from_slice(&(-2.25f64).to_le_bytes());
        assert_eq!(read_f32(&body, 0), 1.5);
        assert_eq!(read_f64(&body, 4), -2.25);
    }

    #[test]
    fn test_scales_are_divisions() {
        assert_eq!(tenths(123), 12.3);
        assert_eq!(tenths(-5), -0.5);
        assert_eq!(thousandths(3850), 3.85);
        assert_eq!(thousandths(-1500), -1.5);
    }

    #[test]
    fn test_stick_center_and_extremes() {
        assert_eq!(stick(1024), 0.0);
        assert_eq!(stick(0), -1.0);
        assert_eq!(stick(2048), 1.0);
        assert_eq!(stick(1536), 0.5);
    }

    #[test]
    fn test_heading_wraps_negative_values() {
        assert_eq!(heading(0), 0.0);
        assert_eq!(heading(900), 90.0);
        assert_eq!(heading(3600), 0.0);
        assert!((heading(-900) - 270.0).abs() < 1e-9);
        assert!((heading(-1) - 359.9).abs() < 1e-9);
    }

    #[test]
    fn test_coordinate_converts_radians() {
        assert!((coordinate(std::f64::consts::PI) - 180.0).abs() < 1e-12);
        assert!((coordinate(0.904_080_9) - 51.800_06).abs() < 1e-3);
    }

    #[test]
    fn test_temperature_conversion() {
        assert!((celsius_from_decikelvin(2982) - 25.05).abs() < 1e-9);
    }

    #[test]
    fn test_pressure_at_sea_level() {
        assert_eq!(pressure_from_altitude(0.0), 1013.25);
        let at_1000 = pressure_from_altitude(1000.0);
        assert!((at_1000 - 898.75).abs() < 0.1, "got {}", at_1000);
    }

    #[test]
    fn test_timestamp_millis() {
        let ts = timestamp_millis(1_500_000_000_000).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2017, 7, 14, 2, 40, 0).unwrap());
        assert_eq!(ts.to_rfc3339(), "2017-07-14T02:40:00+00:00");
        assert!(timestamp_millis(u64::MAX).is_none());
    }

    #[test]
    fn test_timestamp_secs() {
        let ts = timestamp_secs(1_466_860_222).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2016, 6, 25, 13, 10, 22).unwrap());
        assert!(timestamp_secs(u64::MAX).is_none());
    }

    #[test]
    fn test_packed_date_from_bytes() {
        // lo = 0x43, hi = 0x2A
        let date = packed_date(u16::from_le_bytes([0x43, 0x2A])).unwrap();
        assert_eq!(date.year(), (0x2A >> 1) + 1980);
        assert_eq!(date.month(), ((0x2A & 0x1) << 3) | (0x43 >> 5));
        assert_eq!(date.day(), 0x43 & 0x1F);
        assert_eq!(date, NaiveDate::from_ymd_opt(2001, 2, 3).unwrap());
    }

    #[test]
    fn test_packed_date_invalid() {
        // month 0
        assert!(packed_date(0x0001).is_none());
        // day 0
        assert!(packed_date(0x0020).is_none());
    }

    #[test]
    fn test_fixed_str_trims_padding() {
        let body = b"xxAB12\0\0\0\0yy";
        assert_eq!(fixed_str(body, 2, 8), "AB12");
        assert_eq!(text(b"\0\0"), "");
        assert_eq!(text(b"Motor\0stop"), "Motorstop");
    }

    proptest! {
        #[test]
        fn prop_heading_in_range(raw in any::<i16>()) {
            let h = heading(raw);
            prop_assert!((0.0..360.0).contains(&h), "heading({}) = {}", raw, h);
        }

        #[test]
        fn prop_stick_in_unit_range(raw in 0u16..=2048) {
            let s = stick(raw);
            prop_assert!((-1.0..=1.0).contains(&s));
        }
    }
}
