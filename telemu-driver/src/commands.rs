//! Control channel grammar: one command per line, routed by regex.
use std::sync::OnceLock;

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::Deserialize;
use telemu_engine::{GeoPoint, VehicleEmulator, constants::TEST_RECTANGLE_HALF_SIZE_M};

/// A parsed control command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Stop,
    TireBreak,
    /// `0` re-enables drift, anything in (0, 1] pins the madness.
    Madness(f64),
    Rectangle {
        corner0: GeoPoint,
        corner1: GeoPoint,
    },
    DeleteRectangle,
    RectangleIn,
    RectangleOut,
    TestRectangle,
    Stats,
    Attributes(Attributes),
}

/// Bulk update sent as `/attributes <json>`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Attributes {
    pub rectangle_long0: Option<f64>,
    pub rectangle_lat0: Option<f64>,
    pub rectangle_long1: Option<f64>,
    pub rectangle_lat1: Option<f64>,
    pub to_rectangle: Option<bool>,
    pub stop: Option<bool>,
    pub tire_break: Option<bool>,
}

impl Attributes {
    fn rectangle(&self) -> Option<(GeoPoint, GeoPoint)> {
        Some((
            GeoPoint::new(self.rectangle_long0?, self.rectangle_lat0?),
            GeoPoint::new(self.rectangle_long1?, self.rectangle_lat1?),
        ))
    }
}

/// What the caller should do after a command ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Refused,
    EmitStats,
}

const NUMBER: &str = r"(-?\d+(?:\.\d+)?)";

fn madness_route() -> &'static Regex {
    static ROUTE: OnceLock<Regex> = OnceLock::new();
    ROUTE.get_or_init(|| {
        Regex::new(&format!(r"^/madness/{NUMBER}$")).expect("madness route pattern is valid")
    })
}

fn rectangle_route() -> &'static Regex {
    static ROUTE: OnceLock<Regex> = OnceLock::new();
    ROUTE.get_or_init(|| {
        Regex::new(&format!(r"^/rectangle/{NUMBER}/{NUMBER}/{NUMBER}/{NUMBER}$"))
            .expect("rectangle route pattern is valid")
    })
}

fn capture_f64(caps: &regex::Captures<'_>, group: usize) -> Result<f64> {
    let text = caps.get(group).map_or("", |m| m.as_str());
    text.parse::<f64>()
        .with_context(|| format!("'{text}' is not a number"))
}

/// Parse one line of the control channel.
///
/// # Errors
///
/// Returns an error for unknown routes and malformed arguments.
pub fn parse(line: &str) -> Result<Command> {
    let line = line.trim();
    if let Some(body) = line.strip_prefix("/attributes") {
        let attributes: Attributes =
            serde_json::from_str(body.trim()).context("attributes must be a JSON object")?;
        return Ok(Command::Attributes(attributes));
    }

    let command = match line {
        "/start" => Command::Start,
        "/stop" => Command::Stop,
        "/tire_break" => Command::TireBreak,
        "/del-rectangle" => Command::DeleteRectangle,
        "/rectangle-in" => Command::RectangleIn,
        "/rectangle-out" => Command::RectangleOut,
        "/test-rectangle" => Command::TestRectangle,
        "/stats" => Command::Stats,
        _ => {
            if let Some(caps) = madness_route().captures(line) {
                Command::Madness(capture_f64(&caps, 1)?)
            } else if let Some(caps) = rectangle_route().captures(line) {
                Command::Rectangle {
                    corner0: GeoPoint::new(capture_f64(&caps, 1)?, capture_f64(&caps, 2)?),
                    corner1: GeoPoint::new(capture_f64(&caps, 3)?, capture_f64(&caps, 4)?),
                }
            } else {
                bail!("unknown command '{line}'");
            }
        }
    };
    Ok(command)
}

/// Run `command` against the emulator.
///
/// # Errors
///
/// Returns an error when the engine rejects the command's arguments.
pub fn apply(emu: &mut VehicleEmulator, command: &Command) -> Result<Outcome> {
    let accepted = match command {
        Command::Start => emu.start(),
        Command::Stop => emu.stop(),
        Command::TireBreak => emu.break_tire(),
        Command::Madness(value) if *value == 0.0 => {
            emu.set_madness_drift(true);
            true
        }
        Command::Madness(value) => {
            emu.set_madness(*value)?;
            emu.set_madness_drift(false);
            true
        }
        Command::Rectangle { corner0, corner1 } => {
            emu.set_geofence(*corner0, *corner1)?;
            true
        }
        Command::DeleteRectangle => {
            emu.clear_geofence();
            true
        }
        Command::RectangleIn => {
            emu.set_geofence_direction(true);
            true
        }
        Command::RectangleOut => {
            emu.set_geofence_direction(false);
            true
        }
        Command::TestRectangle => {
            emu.test_rectangle(TEST_RECTANGLE_HALF_SIZE_M)?;
            true
        }
        Command::Stats => return Ok(Outcome::EmitStats),
        Command::Attributes(attributes) => apply_attributes(emu, attributes)?,
    };
    Ok(if accepted {
        Outcome::Done
    } else {
        Outcome::Refused
    })
}

fn apply_attributes(emu: &mut VehicleEmulator, attributes: &Attributes) -> Result<bool> {
    match attributes.rectangle() {
        Some((corner0, corner1)) => emu.set_geofence(corner0, corner1)?,
        None => emu.clear_geofence(),
    }
    if let Some(into) = attributes.to_rectangle {
        emu.set_geofence_direction(into);
    }
    let mut accepted = true;
    match attributes.stop {
        Some(true) => accepted &= emu.stop(),
        Some(false) => accepted &= emu.start(),
        None => {}
    }
    if attributes.tire_break == Some(true) {
        accepted &= emu.break_tire();
    }
    Ok(accepted)
}
