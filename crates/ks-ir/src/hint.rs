//! Human-readable parameter values.
//!
//! Turns raw 0..128 parameter values into engineering units (dB, seconds,
//! Hz, semitones) for display next to the raw number.

use alloc::format;
use alloc::string::{String, ToString};

use crate::song::SAMPLE_RATE;
use crate::unit_type::UnitType;

const CHANNEL_NAMES: [&str; 8] = [
    "left",
    "right",
    "aux1 left",
    "aux1 right",
    "aux2 left",
    "aux2 right",
    "aux3 left",
    "aux3 right",
];

const NOTE_TRACKING_NAMES: [&str; 3] = ["fixed", "pitch", "BPM"];

const OSCILLATOR_TYPE_NAMES: [&str; 5] = ["sine", "trisaw", "pulse", "gate", "sample"];

/// Format a parameter value of a unit type for display.
///
/// Parameters without a dedicated formatting fall back to the plain integer.
pub fn format_param(unit_type: UnitType, name: &str, value: i32) -> String {
    let v = value as f64;
    match (unit_type, name) {
        (_, "stereo") | (_, "lfo") | (_, "sendpop") | (_, "lowpass") => {
            if value != 0 { "on" } else { "off" }.to_string()
        }
        (UnitType::Envelope, "attack" | "decay" | "release") => {
            engineering_time(libm::pow(2.0, 24.0 * v / 128.0) / SAMPLE_RATE as f64)
        }
        (UnitType::Compressor, "attack" | "release") => {
            let alpha = libm::pow(2.0, -24.0 * v / 128.0);
            engineering_time(-1.0 / (SAMPLE_RATE as f64 * libm::log(1.0 - alpha)))
        }
        (UnitType::Compressor, "ratio") => float(1.0 - v / 128.0),
        (UnitType::Invgain | UnitType::Compressor, "invgain") => {
            format!("{} dB", significant(to_decibel(128.0 / v)))
        }
        (UnitType::Filter, "resonance") => format!("{} Q dB", significant(to_decibel(128.0 / v))),
        (UnitType::Filter, "frequency") => {
            let p = (v / 128.0) * (v / 128.0);
            let hz = libm::asin(p / 2.0) / core::f64::consts::PI * SAMPLE_RATE as f64;
            format!("{:.0} Hz", hz)
        }
        (_, "gain" | "sustain" | "threshold" | "outgain" | "auxgain") => {
            format!("{} dB", significant(to_decibel(v / 128.0)))
        }
        (UnitType::Crush, "resolution") => format!("{} bits", float(24.0 * v / 128.0)),
        (UnitType::Oscillator, "transpose") => {
            let relative = value - 64;
            if relative % 12 == 0 {
                format!("{} oct", relative / 12)
            } else {
                format!("{} st", relative)
            }
        }
        (UnitType::Oscillator, "detune") => format!("{} st", float((v - 64.0) / 64.0)),
        (UnitType::Oscillator, "phase") => format!("{:.1} °", v / 128.0 * 360.0),
        (UnitType::Oscillator, "type") => lookup(&OSCILLATOR_TYPE_NAMES, value),
        (UnitType::Send, "amount") | (UnitType::Loadval, "value") => float(v / 64.0 - 1.0),
        (UnitType::Send, "voice") => {
            if value == 0 {
                "default".to_string()
            } else {
                value.to_string()
            }
        }
        (UnitType::Aux | UnitType::In, "channel") => lookup(&CHANNEL_NAMES, value),
        (UnitType::Delay, "notetracking") => lookup(&NOTE_TRACKING_NAMES, value),
        _ => value.to_string(),
    }
}

fn lookup(names: &[&str], value: i32) -> String {
    usize::try_from(value)
        .ok()
        .and_then(|i| names.get(i))
        .map_or_else(|| "???".to_string(), |s| s.to_string())
}

fn to_decibel(amplitude: f64) -> f64 {
    if amplitude <= 0.0 {
        return f64::NEG_INFINITY;
    }
    20.0 * libm::log10(amplitude)
}

fn engineering_time(seconds: f64) -> String {
    if seconds < 1e-3 {
        format!("{:.2} us", seconds * 1e6)
    } else if seconds < 1.0 {
        format!("{:.2} ms", seconds * 1e3)
    } else {
        format!("{:.2} s", seconds)
    }
}

/// Shortest decimal representation.
fn float(value: f64) -> String {
    format!("{}", value)
}

/// Three significant digits, trailing zeros trimmed.
fn significant(value: f64) -> String {
    if !value.is_finite() {
        return if value < 0.0 { "-inf" } else { "+inf" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = libm::floor(libm::log10(libm::fabs(value))) as i32;
    let decimals = (2 - magnitude).max(0) as usize;
    let s = format!("{:.*}", decimals, value);
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}
