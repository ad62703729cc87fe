//! Line encoding for the event log.
//!
//! Every line is `NAME\ttime\t<timestamp>` followed by `\tfield\tvalue` pairs.
//! Tabs separate everything because values (positions, display names)
//! routinely contain spaces. Values are assumed never to contain a tab.

use super::event::{FieldValue, TelemetryEvent};

const FIELD_SEPARATOR: char = '\t';
const TIME_FIELD: &str = "time";
const SMALLEST_ENCODED_MAGNITUDE: f64 = 0.0001;

pub fn encode_event(event: &TelemetryEvent) -> String {
    let mut line = String::with_capacity(64 + event.fields().len() * 16);
    line.push_str(event.name());
    line.push(FIELD_SEPARATOR);
    line.push_str(TIME_FIELD);
    line.push(FIELD_SEPARATOR);
    line.push_str(&format_float(event.timestamp()));

    for (field_name, value) in event.fields() {
        line.push(FIELD_SEPARATOR);
        line.push_str(field_name);
        line.push(FIELD_SEPARATOR);
        line.push_str(&format_value(value));
    }

    line
}

pub fn format_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Null => "null".to_string(),
        FieldValue::Bool(true) => "true".to_string(),
        FieldValue::Bool(false) => "false".to_string(),
        FieldValue::Int(value) => value.to_string(),
        FieldValue::Float32(value) => format_float32(*value),
        FieldValue::Float(value) => format_float(*value),
        FieldValue::Text(value) => value.clone(),
    }
}

/// Rust's float `Display` never switches to exponent form, so only the
/// sub-0.0001 clamp is needed to keep downstream float parsers happy.
pub fn format_float(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.abs() < SMALLEST_ENCODED_MAGNITUDE {
        return SMALLEST_ENCODED_MAGNITUDE.copysign(value).to_string();
    }

    value.to_string()
}

pub fn format_float32(value: f32) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if f64::from(value.abs()) < SMALLEST_ENCODED_MAGNITUDE {
        return SMALLEST_ENCODED_MAGNITUDE.copysign(f64::from(value)).to_string();
    }

    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::{encode_event, format_float, format_float32, format_value};
    use crate::telemetry::event::{FieldValue, TelemetryEvent};

    #[test]
    fn encodes_name_time_and_fields_tab_separated() {
        let event = TelemetryEvent::new("LEVEL_UP", 93.25)
            .field("sender", "\"Some Summoner\"")
            .field("network_id", 1_073_741_833_u32)
            .field("level", "7");

        assert_eq!(
            encode_event(&event),
            "LEVEL_UP\ttime\t93.25\tsender\t\"Some Summoner\"\tnetwork_id\t1073741833\tlevel\t7"
        );
    }

    #[test]
    fn booleans_are_always_lowercase() {
        assert_eq!(format_value(&FieldValue::Bool(true)), "true");
        assert_eq!(format_value(&FieldValue::Bool(false)), "false");
    }

    #[test]
    fn null_is_literal_text() {
        assert_eq!(format_value(&FieldValue::Null), "null");
    }

    #[test]
    fn tiny_positive_floats_clamp_to_smallest_magnitude() {
        for value in [0.00009_f64, 1e-7, 1e-30, f64::MIN_POSITIVE] {
            assert_eq!(format_float(value), format_float(0.0001), "value {value}");
        }
        for value in [0.00009_f32, 1e-7, 1e-30] {
            assert_eq!(format_float32(value), "0.0001", "value {value}");
        }
    }

    #[test]
    fn tiny_negative_floats_keep_their_sign() {
        assert_eq!(format_float(-0.00001), "-0.0001");
    }

    #[test]
    fn zero_and_regular_floats_keep_natural_form() {
        assert_eq!(format_float(0.0), "0");
        assert_eq!(format_float(0.0001), "0.0001");
        assert_eq!(format_float(1234.5), "1234.5");
        assert_eq!(format_float32(0.25), "0.25");

        let large = format_float(1.0e21);
        assert!(
            !large.contains('e') && !large.contains('E'),
            "Large floats must not use scientific notation: {large}"
        );
    }

    #[test]
    fn negative_zero_renders_like_zero() {
        assert_eq!(format_float(-0.0), "0");
        assert_eq!(format_float32(-0.0), "0");
        assert_eq!(
            encode_event(&TelemetryEvent::new("X", -0.0)),
            "X\ttime\t0"
        );
    }

    #[test]
    fn does_not_escape_spaces_inside_values() {
        let event = TelemetryEvent::new("ON_CREATE", 0.0).field("position", "X:1 Y:2 Z:3");
        assert_eq!(encode_event(&event), "ON_CREATE\ttime\t0\tposition\tX:1 Y:2 Z:3");
    }
}
