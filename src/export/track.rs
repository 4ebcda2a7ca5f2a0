//! # Flight Track Export
//!
//! Builds one row per Time frame from the latest record of every other kind
//! seen so far, and writes the rows as CSV.
//!
//! A record kind not seen yet leaves its columns empty.

use std::fmt::Write as _;
use std::io;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::ElevationSource;
use crate::error::Result;
use crate::record::protocol::*;
use crate::record::FrameSequence;

/// CSV column names, in output order
pub const TRACK_COLUMNS: [&str; 31] = [
    "latitude",
    "longitude",
    "altitude(metres)",
    "ascent(metres)",
    "speed(m/s)",
    "distance(metres)",
    "time(millisecond)",
    "datetime(utc)",
    "satellites",
    "voltage(v)",
    "max_altitude(metres)",
    "max_ascent(metres)",
    "max_speed(m/s)",
    "max_distance(metres)",
    "compass_heading(degrees)",
    "rc_elevator",
    "rc_aileron",
    "rc_throttle",
    "rc_rudder",
    "gimbal_heading(degrees)",
    "gimbal_pitch(degrees)",
    "battery_percent",
    "voltageCell1",
    "voltageCell2",
    "voltageCell3",
    "voltageCell4",
    "voltageCell5",
    "voltageCell6",
    "message",
    "aircraft_name",
    "aircraft_serial",
];

/// One sample of the flight track
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRow {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Baseline elevation plus ascent
    pub altitude: Option<f64>,
    pub ascent: Option<f64>,
    pub speed: f32,
    pub distance: f32,
    /// Milliseconds since the first Time frame
    pub time_ms: u64,
    pub datetime: Option<DateTime<Utc>>,
    pub satellites: Option<u8>,
    pub voltage: Option<f64>,
    pub max_altitude: Option<f64>,
    pub max_ascent: Option<f64>,
    pub max_speed: f32,
    pub max_distance: f32,
    pub compass_heading: Option<f64>,
    pub rc_elevator: Option<f64>,
    pub rc_aileron: Option<f64>,
    pub rc_throttle: Option<f64>,
    pub rc_rudder: Option<f64>,
    pub gimbal_heading: Option<f64>,
    pub gimbal_pitch: Option<f64>,
    pub battery_percent: Option<u8>,
    pub cell_voltages: Option<[f64; BATTERY_CELL_COUNT]>,
    pub message: Option<String>,
    pub aircraft_name: Option<String>,
    pub aircraft_serial: Option<String>,
}

/// Latest record of each kind plus running maxima
#[derive(Debug, Default)]
struct TrackState<'a> {
    position: Option<&'a PositionRecord>,
    smart_battery: Option<&'a SmartBatteryRecord>,
    battery: Option<&'a BatteryRecord>,
    controller: Option<&'a ControllerRecord>,
    gimbal: Option<&'a GimbalRecord>,
    message: Option<&'a MessageRecord>,
    aircraft: Option<&'a AircraftRecord>,
    baseline: Option<Option<f64>>,
    start_ms: Option<u64>,
    max_altitude: Option<f64>,
    max_ascent: Option<f64>,
    max_speed: f32,
    max_distance: f32,
}

fn max_opt(current: Option<f64>, value: f64) -> Option<f64> {
    Some(current.map_or(value, |c| c.max(value)))
}

impl<'a> TrackState<'a> {
    fn observe(&mut self, frame: &'a Frame, elevation: &dyn ElevationSource) {
        match frame {
            Frame::Position(p) => {
                if self.baseline.is_none() {
                    let baseline = elevation.elevation(p.latitude, p.longitude);
                    debug!("Baseline elevation at first position: {:?}", baseline);
                    self.baseline = Some(baseline);
                }
                self.max_ascent = max_opt(self.max_ascent, p.ascent);
                if let Some(Some(base)) = self.baseline {
                    self.max_altitude = max_opt(self.max_altitude, base + p.ascent);
                }
                self.position = Some(p);
            }
            Frame::SmartBattery(s) => self.smart_battery = Some(s),
            Frame::Battery(b) => self.battery = Some(b),
            Frame::Controller(c) => self.controller = Some(c),
            Frame::Gimbal(g) => self.gimbal = Some(g),
            Frame::Message(m) => self.message = Some(m),
            Frame::Aircraft(a) => self.aircraft = Some(a),
            _ => {}
        }
    }

    fn row(&mut self, t: &TimeRecord) -> TrackRow {
        let start = *self.start_ms.get_or_insert(t.timestamp_ms);
        self.max_speed = self.max_speed.max(t.speed);
        self.max_distance = self.max_distance.max(t.distance);

        let position = self.position;
        let baseline = self.baseline.flatten();

        TrackRow {
            latitude: position.map(|p| p.latitude),
            longitude: position.map(|p| p.longitude),
            altitude: position.and_then(|p| baseline.map(|b| b + p.ascent)),
            ascent: position.map(|p| p.ascent),
            speed: t.speed,
            distance: t.distance,
            time_ms: t.timestamp_ms.saturating_sub(start),
            datetime: t.timestamp,
            satellites: position.map(|p| p.satellites),
            voltage: self.smart_battery.map(|s| s.voltage),
            max_altitude: self.max_altitude,
            max_ascent: self.max_ascent,
            max_speed: self.max_speed,
            max_distance: self.max_distance,
            compass_heading: position.map(|p| p.yaw),
            rc_elevator: self.controller.map(|c| c.elevator),
            rc_aileron: self.controller.map(|c| c.aileron),
            rc_throttle: self.controller.map(|c| c.throttle),
            rc_rudder: self.controller.map(|c| c.rudder),
            gimbal_heading: self.gimbal.map(|g| g.yaw),
            gimbal_pitch: self.gimbal.map(|g| g.pitch),
            battery_percent: self.battery.map(|b| b.percent),
            cell_voltages: self.battery.map(|b| b.cell_voltages),
            message: self.message.map(|m| m.text.clone()),
            aircraft_name: self.aircraft.map(|a| a.aircraft_name.clone()),
            aircraft_serial: self.aircraft.map(|a| a.aircraft_serial.clone()),
        }
    }
}

/// Build the flight track: one row per Time frame, in file order
///
/// `elevation` is queried once, at the first Position frame.
pub fn track_rows(frames: &FrameSequence, elevation: &dyn ElevationSource) -> Vec<TrackRow> {
    let mut state = TrackState::default();
    let mut rows = Vec::new();

    for frame in frames {
        match frame {
            Frame::Time(t) => rows.push(state.row(t)),
            other => state.observe(other, elevation),
        }
    }

    rows
}

fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn format_timestamp(ts: &DateTime<Utc>, format: &str) -> String {
    let mut out = String::new();
    match write!(out, "{}", ts.format(format)) {
        Ok(()) => out,
        Err(_) => ts.to_rfc3339(),
    }
}

impl TrackRow {
    /// Render the row as CSV fields in [`TRACK_COLUMNS`] order
    pub fn to_record(&self, timestamp_format: &str) -> Vec<String> {
        let cells = self.cell_voltages;
        let mut record = vec![
            cell(self.latitude),
            cell(self.longitude),
            cell(self.altitude),
            cell(self.ascent),
            self.speed.to_string(),
            self.distance.to_string(),
            self.time_ms.to_string(),
            self.datetime
                .as_ref()
                .map(|ts| format_timestamp(ts, timestamp_format))
                .unwrap_or_default(),
            cell(self.satellites),
            cell(self.voltage),
            cell(self.max_altitude),
            cell(self.max_ascent),
            self.max_speed.to_string(),
            self.max_distance.to_string(),
            cell(self.compass_heading),
            cell(self.rc_elevator),
            cell(self.rc_aileron),
            cell(self.rc_throttle),
            cell(self.rc_rudder),
            cell(self.gimbal_heading),
            cell(self.gimbal_pitch),
            cell(self.battery_percent),
        ];
        for i in 0..BATTERY_CELL_COUNT {
            record.push(cell(cells.map(|c| c[i])));
        }
        record.push(self.message.clone().unwrap_or_default());
        record.push(self.aircraft_name.clone().unwrap_or_default());
        record.push(self.aircraft_serial.clone().unwrap_or_default());
        record
    }
}

/// Write the flight track as CSV, header row first
///
/// # Returns
///
/// * `Result<usize>` - Number of data rows written
pub fn write_csv<W: io::Write>(
    frames: &FrameSequence,
    elevation: &dyn ElevationSource,
    timestamp_format: &str,
    writer: W,
) -> Result<usize> {
    let rows = track_rows(frames, elevation);
    let mut csv = csv::Writer::from_writer(writer);

    csv.write_record(TRACK_COLUMNS)?;
    for row in &rows {
        csv.write_record(row.to_record(timestamp_format))?;
    }
    csv.flush()?;

    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{FixedElevation, NoElevation};
    use crate::record::decode;

    fn frame(frame_type: u8, body: &[u8]) -> Vec<u8> {
        let mut f = vec![frame_type, body.len() as u8];
        f.extend_from_slice(body);
        f.push(FRAME_TRAILER);
        f
    }

    fn position(ascent_dm: i16, yaw_dm: i16) -> Vec<u8> {
        let mut b = vec![0u8; POSITION_LAYOUT_WIDTH];
        b[0..8].copy_from_slice(&0.01f64.to_le_bytes());
        b[8..16].copy_from_slice(&0.9f64.to_le_bytes());
        b[16..18].copy_from_slice(&ascent_dm.to_le_bytes());
        b[28..30].copy_from_slice(&yaw_dm.to_le_bytes());
        b[36] = 9;
        frame(FRAME_TYPE_POSITION, &b)
    }

    fn time(speed: f32, distance: f32, ms: u64) -> Vec<u8> {
        let mut b = vec![0u8; 2];
        b.extend_from_slice(&speed.to_le_bytes());
        b.extend_from_slice(&distance.to_le_bytes());
        b.extend_from_slice(&ms.to_le_bytes());
        frame(FRAME_TYPE_TIME, &b)
    }

    fn sample_log() -> FrameSequence {
        let mut buf = Vec::new();
        buf.extend(time(1.0, 0.0, 1_500_000_000_000));
        buf.extend(position(105, -900));
        buf.extend(frame(FRAME_TYPE_MESSAGE, b"Takeoff"));
        buf.extend(time(4.0, 12.5, 1_500_000_000_100));
        buf.extend(position(50, 10));
        buf.extend(time(2.0, 20.0, 1_500_000_000_250));
        decode(&buf, 0).unwrap()
    }

    #[test]
    fn test_rows_before_first_position_leave_columns_empty() {
        let rows = track_rows(&sample_log(), &NoElevation);
        assert_eq!(rows.len(), 3);

        let first = &rows[0];
        assert_eq!(first.latitude, None);
        assert_eq!(first.satellites, None);
        assert_eq!(first.message, None);
        assert_eq!(first.time_ms, 0);
        assert_eq!(first.speed, 1.0);
    }

    #[test]
    fn test_rows_carry_latest_records_and_maxima() {
        let rows = track_rows(&sample_log(), &NoElevation);

        let second = &rows[1];
        assert_eq!(second.ascent, Some(10.5));
        assert_eq!(second.compass_heading, Some(270.0));
        assert_eq!(second.satellites, Some(9));
        assert_eq!(second.message.as_deref(), Some("Takeoff"));
        assert_eq!(second.time_ms, 100);
        assert_eq!(second.altitude, None);

        let third = &rows[2];
        assert_eq!(third.ascent, Some(5.0));
        assert_eq!(third.max_ascent, Some(10.5));
        assert_eq!(third.max_speed, 4.0);
        assert_eq!(third.max_distance, 20.0);
        assert_eq!(third.time_ms, 250);
    }

    #[test]
    fn test_baseline_elevation_adds_to_ascent() {
        let rows = track_rows(&sample_log(), &FixedElevation(20.0));
        assert_eq!(rows[1].altitude, Some(30.5));
        assert_eq!(rows[2].altitude, Some(25.0));
        assert_eq!(rows[2].max_altitude, Some(30.5));
    }

    #[test]
    fn test_write_csv() {
        let mut out = Vec::new();
        let written = write_csv(&sample_log(), &NoElevation, "%d-%m-%Y %H:%M:%S", &mut out).unwrap();
        assert_eq!(written, 3);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("latitude,longitude,altitude(metres)"));
        assert_eq!(lines[0].split(',').count(), TRACK_COLUMNS.len());
        assert!(lines[1].contains("14-07-2017 02:40:00"));
        assert!(lines[2].contains("Takeoff"));
    }

    #[test]
    fn test_record_width_matches_columns() {
        let rows = track_rows(&sample_log(), &FixedElevation(1.0));
        for row in rows {
            assert_eq!(row.to_record("%Y").len(), TRACK_COLUMNS.len());
        }
    }
}
