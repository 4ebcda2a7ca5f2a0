//! # Flight Record Protocol Constants and Types
//!
//! Core definitions for the flight-controller log format: frame type codes,
//! fixed layout widths and the decoded record types.
//!
//! Each frame on the wire is `[type: u8][size: u8][body: size bytes][0xFF]`.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Serialize, Serializer};

/// Trailer byte expected after every frame body
pub const FRAME_TRAILER: u8 = 0xFF;

/// Bytes of framing around a body: type(1) + size(1) + trailer(1)
pub const FRAME_OVERHEAD: usize = 3;

/// Header length used by the current log format revision
pub const DEFAULT_HEADER_SIZE: usize = 100;

pub const FRAME_TYPE_POSITION: u8 = 1;
pub const FRAME_TYPE_HOME: u8 = 2;
pub const FRAME_TYPE_GIMBAL: u8 = 3;
pub const FRAME_TYPE_CONTROLLER: u8 = 4;
pub const FRAME_TYPE_TIME: u8 = 5;
pub const FRAME_TYPE_MARKER_6: u8 = 6;
pub const FRAME_TYPE_BATTERY: u8 = 7;
pub const FRAME_TYPE_SMART_BATTERY: u8 = 8;
pub const FRAME_TYPE_MESSAGE: u8 = 9;
pub const FRAME_TYPE_MARKER_11: u8 = 11;
pub const FRAME_TYPE_AIRCRAFT: u8 = 13;
pub const FRAME_TYPE_MARKER_15: u8 = 15;

/// Position layout width (lon, lat, ascent, speeds, attitude, satellites, fly time)
pub const POSITION_LAYOUT_WIDTH: usize = 46;

/// Home point layout width
pub const HOME_LAYOUT_WIDTH: usize = 32;

/// Gimbal layout width
pub const GIMBAL_LAYOUT_WIDTH: usize = 16;

/// Controller layout width (4 sticks + unresearched switches)
pub const CONTROLLER_LAYOUT_WIDTH: usize = 14;

/// Time layout width
pub const TIME_LAYOUT_WIDTH: usize = 18;

/// Battery layout width
pub const BATTERY_LAYOUT_WIDTH: usize = 34;

/// Smart battery layout width
pub const SMART_BATTERY_LAYOUT_WIDTH: usize = 28;

/// Aircraft layout width
pub const AIRCRAFT_LAYOUT_WIDTH: usize = 85;

/// Number of cells reported by a battery frame
pub const BATTERY_CELL_COUNT: usize = 6;

/// One framing step: a type code and its body, before variant decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Frame type code
    pub frame_type: u8,

    /// Absolute offset of the type byte in the input buffer
    pub offset: usize,

    /// Body bytes (exactly `size` bytes)
    pub body: Bytes,
}

impl RawFrame {
    /// Total bytes this frame occupies on the wire
    pub fn wire_len(&self) -> usize {
        self.body.len() + FRAME_OVERHEAD
    }
}

fn serialize_hex<S: Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}

/// GPS position and attitude
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionRecord {
    /// Longitude in degrees
    pub longitude: f64,

    /// Latitude in degrees
    pub latitude: f64,

    /// Height above the take-off point in meters
    pub ascent: f64,

    /// Speeds in m/s
    pub x_speed: f64,
    pub y_speed: f64,
    pub z_speed: f64,

    /// Attitude in degrees
    pub pitch: f64,
    pub roll: f64,

    /// Heading in degrees, within [0, 360)
    pub yaw: f64,

    /// Number of GPS satellites in use
    pub satellites: u8,

    /// Cumulative flight time in seconds
    pub fly_time: f64,

    #[serde(serialize_with = "serialize_hex")]
    pub raw: Bytes,
}

/// Home point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeRecord {
    /// Latitude in degrees
    pub latitude: f64,

    /// Longitude in degrees
    pub longitude: f64,

    /// Pressure altitude in meters
    pub pressure_altitude: f64,

    /// Barometric pressure derived from the pressure altitude, in hPa
    pub pressure: f64,

    /// Configured go-home height
    pub go_home_height: u16,

    #[serde(serialize_with = "serialize_hex")]
    pub raw: Bytes,
}

/// Gimbal orientation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GimbalRecord {
    /// Pitch in degrees
    pub pitch: f64,

    /// Roll in degrees
    pub roll: f64,

    /// Heading in degrees, within [0, 360)
    pub yaw: f64,

    /// Gimbal mode byte
    pub mode: u8,

    /// Non-zero while auto calibration runs
    pub auto_calibration: u8,

    /// Result byte of the last auto calibration
    pub auto_calibration_result: u8,

    /// Monotonic counter
    pub counter: u32,

    #[serde(serialize_with = "serialize_hex")]
    pub raw: Bytes,
}

/// Remote controller stick positions, each in [-1, 1] with 0 at center
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerRecord {
    pub aileron: f64,
    pub elevator: f64,
    pub throttle: f64,
    pub rudder: f64,

    #[serde(serialize_with = "serialize_hex")]
    pub raw: Bytes,
}

/// Ground speed, distance and wall-clock time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeRecord {
    /// Ground speed in m/s
    pub speed: f32,

    /// Cumulative distance in meters
    pub distance: f32,

    /// Milliseconds since the Unix epoch, as recorded
    pub timestamp_ms: u64,

    /// `timestamp_ms` as a UTC timestamp, `None` when out of range
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(serialize_with = "serialize_hex")]
    pub raw: Bytes,
}

/// Battery pack state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatteryRecord {
    /// Charge in percent
    pub percent: u8,

    /// Pack voltage in volts
    pub voltage: f64,

    /// Capacities in mAh
    pub current_capacity: u16,
    pub total_capacity: u16,

    /// Battery life in percent
    pub life: u8,

    /// Charge cycle count
    pub cycle_count: u32,

    pub error_type: u16,

    /// Current in amperes (negative while discharging)
    pub current: f64,

    /// Per-cell voltages in volts
    pub cell_voltages: [f64; BATTERY_CELL_COUNT],

    pub serial_number: u16,

    /// `None` when the packed date does not name a real day
    pub manufacture_date: Option<NaiveDate>,

    /// Temperature in °C
    pub temperature: f64,

    #[serde(serialize_with = "serialize_hex")]
    pub raw: Bytes,
}

/// Flight-controller battery estimates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmartBatteryRecord {
    /// Estimated remaining flight time in seconds
    pub remaining_flight_time: u16,
    pub go_home_time: u16,
    pub land_time: u16,

    /// Battery thresholds for go-home and landing, in percent
    pub go_home_battery: u16,
    pub land_battery: u16,

    /// Pack voltage in volts
    pub voltage: f64,

    pub percent: u8,

    /// Low-battery warning flag as recorded
    pub low_warning: u8,

    #[serde(serialize_with = "serialize_hex")]
    pub raw: Bytes,
}

/// Free-text diagnostic message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageRecord {
    pub text: String,

    #[serde(serialize_with = "serialize_hex")]
    pub raw: Bytes,
}

/// Aircraft identity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AircraftRecord {
    pub drone_type: u8,
    pub app_type: u8,
    pub app_version: [u8; 3],
    pub aircraft_serial: String,
    pub aircraft_name: String,

    /// Activation time in seconds since the Unix epoch, as recorded
    pub activation_time_s: u64,

    /// `activation_time_s` as a UTC timestamp, `None` when out of range
    pub activated_at: Option<DateTime<Utc>>,

    pub camera_serial: String,
    pub controller_serial: String,
    pub battery_serial: String,

    #[serde(serialize_with = "serialize_hex")]
    pub raw: Bytes,
}

/// Frame kinds that are present in logs but whose content is unresearched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarkerKind {
    /// Usually one byte, 0x20 or 0xA0
    Frame6,
    /// Always zero-filled
    Frame11,
    /// Rare, identical content
    Frame15,
}

impl MarkerKind {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            FRAME_TYPE_MARKER_6 => Some(MarkerKind::Frame6),
            FRAME_TYPE_MARKER_11 => Some(MarkerKind::Frame11),
            FRAME_TYPE_MARKER_15 => Some(MarkerKind::Frame15),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            MarkerKind::Frame6 => FRAME_TYPE_MARKER_6,
            MarkerKind::Frame11 => FRAME_TYPE_MARKER_11,
            MarkerKind::Frame15 => FRAME_TYPE_MARKER_15,
        }
    }
}

/// Marker frame: raw bytes only
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerRecord {
    pub kind: MarkerKind,

    #[serde(serialize_with = "serialize_hex")]
    pub raw: Bytes,
}

/// Frame with an unrecognized type code
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnknownRecord {
    pub frame_type: u8,

    #[serde(serialize_with = "serialize_hex")]
    pub raw: Bytes,
}

/// One decoded telemetry record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "frame")]
pub enum Frame {
    Position(PositionRecord),
    Home(HomeRecord),
    Gimbal(GimbalRecord),
    Controller(ControllerRecord),
    Time(TimeRecord),
    Battery(BatteryRecord),
    SmartBattery(SmartBatteryRecord),
    Message(MessageRecord),
    Aircraft(AircraftRecord),
    Marker(MarkerRecord),
    Unknown(UnknownRecord),
}

impl Frame {
    /// Type code this frame was read with
    pub fn type_code(&self) -> u8 {
        match self {
            Frame::Position(_) => FRAME_TYPE_POSITION,
            Frame::Home(_) => FRAME_TYPE_HOME,
            Frame::Gimbal(_) => FRAME_TYPE_GIMBAL,
            Frame::Controller(_) => FRAME_TYPE_CONTROLLER,
            Frame::Time(_) => FRAME_TYPE_TIME,
            Frame::Battery(_) => FRAME_TYPE_BATTERY,
            Frame::SmartBattery(_) => FRAME_TYPE_SMART_BATTERY,
            Frame::Message(_) => FRAME_TYPE_MESSAGE,
            Frame::Aircraft(_) => FRAME_TYPE_AIRCRAFT,
            Frame::Marker(m) => m.kind.code(),
            Frame::Unknown(u) => u.frame_type,
        }
    }

    /// Full raw body, as read from the log
    pub fn body(&self) -> &Bytes {
        match self {
            Frame::Position(r) => &r.raw,
            Frame::Home(r) => &r.raw,
            Frame::Gimbal(r) => &r.raw,
            Frame::Controller(r) => &r.raw,
            Frame::Time(r) => &r.raw,
            Frame::Battery(r) => &r.raw,
            Frame::SmartBattery(r) => &r.raw,
            Frame::Message(r) => &r.raw,
            Frame::Aircraft(r) => &r.raw,
            Frame::Marker(r) => &r.raw,
            Frame::Unknown(r) => &r.raw,
        }
    }

    /// Width of the decoded layout; bytes past it are reserved
    pub fn layout_width(&self) -> usize {
        match self {
            Frame::Position(_) => POSITION_LAYOUT_WIDTH,
            Frame::Home(_) => HOME_LAYOUT_WIDTH,
            Frame::Gimbal(_) => GIMBAL_LAYOUT_WIDTH,
            Frame::Controller(_) => CONTROLLER_LAYOUT_WIDTH,
            Frame::Time(_) => TIME_LAYOUT_WIDTH,
            Frame::Battery(_) => BATTERY_LAYOUT_WIDTH,
            Frame::SmartBattery(_) => SMART_BATTERY_LAYOUT_WIDTH,
            Frame::Aircraft(_) => AIRCRAFT_LAYOUT_WIDTH,
            // The whole body is the message text
            Frame::Message(r) => r.raw.len(),
            Frame::Marker(_) | Frame::Unknown(_) => 0,
        }
    }

    /// Trailing body bytes that no decoder interprets
    pub fn reserved(&self) -> &[u8] {
        self.body().get(self.layout_width()..).unwrap_or(&[])
    }

    /// Short name of the frame kind
    pub fn kind_name(&self) -> &'static str {
        match self {
            Frame::Position(_) => "Position",
            Frame::Home(_) => "Home",
            Frame::Gimbal(_) => "Gimbal",
            Frame::Controller(_) => "Controller",
            Frame::Time(_) => "Time",
            Frame::Battery(_) => "Battery",
            Frame::SmartBattery(_) => "SmartBattery",
            Frame::Message(_) => "Message",
            Frame::Aircraft(_) => "Aircraft",
            Frame::Marker(m) => match m.kind {
                MarkerKind::Frame6 => "Frame6",
                MarkerKind::Frame11 => "Frame11",
                MarkerKind::Frame15 => "Frame15",
            },
            Frame::Unknown(_) => "Unknown",
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Position(p) => write!(
                f,
                "Position: ({:.5}, {:.5}), {:.1} m, speed ({}, {}, {}) m/s, attitude ({}, {}, {})°, {} sats, {} s",
                p.latitude, p.longitude, p.ascent, p.x_speed, p.y_speed, p.z_speed,
                p.pitch, p.roll, p.yaw, p.satellites, p.fly_time
            ),
            Frame::Home(h) => write!(
                f,
                "Home: ({:.5}, {:.5}), {:.1} m, {:.2} hPa",
                h.latitude, h.longitude, h.pressure_altitude, h.pressure
            ),
            Frame::Gimbal(g) => write!(
                f,
                "Gimbal: pitch {}°, roll {}°, yaw {}°, counter {}",
                g.pitch, g.roll, g.yaw, g.counter
            ),
            Frame::Controller(c) => write!(
                f,
                "Controller: throttle {:.2}, rudder {:.2}, elevator {:.2}, aileron {:.2}",
                c.throttle, c.rudder, c.elevator, c.aileron
            ),
            Frame::Time(t) => match t.timestamp {
                Some(ts) => write!(f, "Time: {:.2} m/s, {:.1} m, {}", t.speed, t.distance, ts),
                None => write!(f, "Time: {:.2} m/s, {:.1} m, {} ms", t.speed, t.distance, t.timestamp_ms),
            },
            Frame::Battery(b) => write!(
                f,
                "Battery: {}%, {:.3} V, {:.3} A, cells {:?} V, {:.1} °C",
                b.percent, b.voltage, b.current, b.cell_voltages, b.temperature
            ),
            Frame::SmartBattery(s) => write!(
                f,
                "SmartBattery: {}%, {:.3} V, {} s remaining, low warning {}",
                s.percent, s.voltage, s.remaining_flight_time, s.low_warning
            ),
            Frame::Message(m) => write!(f, "Message: '{}'", m.text),
            Frame::Aircraft(a) => write!(
                f,
                "Aircraft: '{}' serial {} app {}.{}.{}",
                a.aircraft_name, a.aircraft_serial, a.app_version[0], a.app_version[1], a.app_version[2]
            ),
            Frame::Marker(_) | Frame::Unknown(_) => write!(
                f,
                "{} ({}): {}",
                self.kind_name(),
                self.type_code(),
                hex::encode(self.body())
            ),
        }
    }
}
