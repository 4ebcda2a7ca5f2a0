//! # Frame Decoder
//!
//! Decodes frame bodies into typed records (Position, Home, Gimbal, Controller,
//! Time, Battery, SmartBattery, Message, Aircraft) and dispatches raw frames by
//! type code.

use bytes::Bytes;
use thiserror::Error;
use tracing::trace;

use super::codec::*;
use super::protocol::*;

/// A body is shorter than the fixed layout of its frame kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("body is {actual} bytes, layout needs {expected}")]
pub struct BodyTooShort {
    pub expected: usize,
    pub actual: usize,
}

fn require(body: &[u8], expected: usize) -> Result<(), BodyTooShort> {
    if body.len() < expected {
        return Err(BodyTooShort {
            expected,
            actual: body.len(),
        });
    }
    Ok(())
}

/// Decode one frame body according to its type code
///
/// Every type code has an outcome: a typed record, or [`Frame::Unknown`]
/// carrying the raw body.
///
/// # Errors
///
/// Returns [`BodyTooShort`] if a known frame kind has a body shorter than
/// its layout.
pub fn decode_one(frame_type: u8, body: Bytes) -> Result<Frame, BodyTooShort> {
    let frame = match frame_type {
        FRAME_TYPE_POSITION => Frame::Position(decode_position(&body)?),
        FRAME_TYPE_HOME => Frame::Home(decode_home(&body)?),
        FRAME_TYPE_GIMBAL => Frame::Gimbal(decode_gimbal(&body)?),
        FRAME_TYPE_CONTROLLER => Frame::Controller(decode_controller(&body)?),
        FRAME_TYPE_TIME => Frame::Time(decode_time(&body)?),
        FRAME_TYPE_BATTERY => Frame::Battery(decode_battery(&body)?),
        FRAME_TYPE_SMART_BATTERY => Frame::SmartBattery(decode_smart_battery(&body)?),
        FRAME_TYPE_MESSAGE => Frame::Message(decode_message(&body)),
        FRAME_TYPE_AIRCRAFT => Frame::Aircraft(decode_aircraft(&body)?),
        FRAME_TYPE_MARKER_6 => decode_marker(MarkerKind::Frame6, &body),
        FRAME_TYPE_MARKER_11 => decode_marker(MarkerKind::Frame11, &body),
        FRAME_TYPE_MARKER_15 => decode_marker(MarkerKind::Frame15, &body),
        _ => {
            trace!("Unknown frame type {} ({} bytes)", frame_type, body.len());
            Frame::Unknown(UnknownRecord {
                frame_type,
                raw: body,
            })
        }
    };
    Ok(frame)
}

/// Decode a Position frame (type 1)
pub fn decode_position(body: &Bytes) -> Result<PositionRecord, BodyTooShort> {
    require(body, POSITION_LAYOUT_WIDTH)?;

    Ok(PositionRecord {
        longitude: coordinate(read_f64(body, 0)),
        latitude: coordinate(read_f64(body, 8)),
        ascent: tenths(read_i16(body, 16) as i32),
        x_speed: tenths(read_i16(body, 18) as i32),
        y_speed: tenths(read_i16(body, 20) as i32),
        z_speed: tenths(read_i16(body, 22) as i32),
        pitch: tenths(read_i16(body, 24) as i32),
        roll: tenths(read_i16(body, 26) as i32),
        yaw: heading(read_i16(body, 28)),
        // 30..36: flight controller state words, unresearched
        satellites: read_u8(body, 36),
        // 37..42: flight action and failure causes, unresearched
        fly_time: tenths(read_u16(body, 42) as i32),
        raw: body.clone(),
    })
}

/// Decode a Home frame (type 2)
pub fn decode_home(body: &Bytes) -> Result<HomeRecord, BodyTooShort> {
    require(body, HOME_LAYOUT_WIDTH)?;

    let pressure_altitude = read_f32(body, 16) as f64 / 10.0;

    Ok(HomeRecord {
        latitude: coordinate(read_f64(body, 0)),
        longitude: coordinate(read_f64(body, 8)),
        pressure_altitude,
        pressure: pressure_from_altitude(pressure_altitude),
        go_home_height: read_u16(body, 30),
        raw: body.clone(),
    })
}

/// Decode a Gimbal frame (type 3)
pub fn decode_gimbal(body: &Bytes) -> Result<GimbalRecord, BodyTooShort> {
    require(body, GIMBAL_LAYOUT_WIDTH)?;

    Ok(GimbalRecord {
        pitch: tenths(read_i16(body, 0) as i32),
        roll: tenths(read_i16(body, 2) as i32),
        yaw: heading(read_i16(body, 4)),
        mode: read_u8(body, 6),
        auto_calibration: read_u8(body, 9),
        auto_calibration_result: read_u8(body, 10),
        counter: read_u32(body, 12),
        raw: body.clone(),
    })
}

/// Decode a Controller frame (type 4)
pub fn decode_controller(body: &Bytes) -> Result<ControllerRecord, BodyTooShort> {
    require(body, CONTROLLER_LAYOUT_WIDTH)?;

    Ok(ControllerRecord {
        aileron: stick(read_u16(body, 0)),
        elevator: stick(read_u16(body, 2)),
        throttle: stick(read_u16(body, 4)),
        rudder: stick(read_u16(body, 6)),
        raw: body.clone(),
    })
}

/// Decode a Time frame (type 5)
pub fn decode_time(body: &Bytes) -> Result<TimeRecord, BodyTooShort> {
    require(body, TIME_LAYOUT_WIDTH)?;

    // 0..2 unresearched
    let timestamp_ms = read_u64(body, 10);

    Ok(TimeRecord {
        speed: read_f32(body, 2),
        distance: read_f32(body, 6),
        timestamp_ms,
        timestamp: timestamp_millis(timestamp_ms),
        raw: body.clone(),
    })
}

/// Decode a Battery frame (type 7)
pub fn decode_battery(body: &Bytes) -> Result<BatteryRecord, BodyTooShort> {
    require(body, BATTERY_LAYOUT_WIDTH)?;

    let mut cell_voltages = [0.0; BATTERY_CELL_COUNT];
    for (i, cell) in cell_voltages.iter_mut().enumerate() {
        *cell = thousandths(read_u16(body, 16 + 2 * i) as i32);
    }

    Ok(BatteryRecord {
        percent: read_u8(body, 0),
        voltage: thousandths(read_u16(body, 1) as i32),
        current_capacity: read_u16(body, 3),
        total_capacity: read_u16(body, 5),
        life: read_u8(body, 7),
        cycle_count: read_u32(body, 8),
        error_type: read_u16(body, 12),
        current: thousandths(read_i16(body, 14) as i32),
        cell_voltages,
        serial_number: read_u16(body, 28),
        manufacture_date: packed_date(read_u16(body, 30)),
        temperature: celsius_from_decikelvin(read_u16(body, 32)),
        raw: body.clone(),
    })
}

/// Decode a SmartBattery frame (type 8)
pub fn decode_smart_battery(body: &Bytes) -> Result<SmartBatteryRecord, BodyTooShort> {
    require(body, SMART_BATTERY_LAYOUT_WIDTH)?;

    Ok(SmartBatteryRecord {
        remaining_flight_time: read_u16(body, 0),
        go_home_time: read_u16(body, 2),
        land_time: read_u16(body, 4),
        go_home_battery: read_u16(body, 6),
        land_battery: read_u16(body, 8),
        // 10..24: safe fly radius, consumption, go-home status, unresearched
        voltage: thousandths(read_u16(body, 24) as i32),
        percent: read_u8(body, 26),
        low_warning: read_u8(body, 27),
        raw: body.clone(),
    })
}

/// Decode a Message frame (type 9); the whole body is the text
pub fn decode_message(body: &Bytes) -> MessageRecord {
    MessageRecord {
        text: text(body),
        raw: body.clone(),
    }
}

/// Decode an Aircraft frame (type 13)
pub fn decode_aircraft(body: &Bytes) -> Result<AircraftRecord, BodyTooShort> {
    require(body, AIRCRAFT_LAYOUT_WIDTH)?;

    let activation_time_s = read_u64(body, 47);

    Ok(AircraftRecord {
        drone_type: read_u8(body, 0),
        app_type: read_u8(body, 1),
        app_version: [read_u8(body, 2), read_u8(body, 3), read_u8(body, 4)],
        aircraft_serial: fixed_str(body, 5, 10),
        aircraft_name: fixed_str(body, 15, 32),
        activation_time_s,
        activated_at: timestamp_secs(activation_time_s),
        camera_serial: fixed_str(body, 55, 10),
        controller_serial: fixed_str(body, 65, 10),
        battery_serial: fixed_str(body, 75, 10),
        raw: body.clone(),
    })
}

/// Wrap a marker frame (types 6, 11, 15); never fails
pub fn decode_marker(kind: MarkerKind, body: &Bytes) -> Frame {
    Frame::Marker(MarkerRecord {
        kind,
        raw: body.clone(),
    })
}
