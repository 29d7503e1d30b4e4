use crate::errors::{Error, Result};
use crate::model::Reading;

/// Parses one raw frame from the sensor.
///
/// Frames are single text lines of the form:
/// `Humidity (%): 49.0, Temperature (C): 23.5, Checksum: 77, Valid checksum: 1`
///
/// The checksum value is not recomputed here; the device reports whether its
/// own verification passed, and only a trailing `1` admits the frame.
pub fn parse(raw: &[u8]) -> Result<Reading> {
    let text = std::str::from_utf8(raw)?.trim_end_matches(['\r', '\n']);

    let fields: Vec<&str> = text.split(", ").collect();
    if fields.len() != 4 {
        return Err(Error::Format(text.to_string()));
    }

    let mut values = Vec::with_capacity(4);
    for field in &fields {
        match field.split_once(": ") {
            Some((_, value)) => values.push(value),
            None => return Err(Error::Format(text.to_string())),
        }
    }

    let humidity_percent = parse_float(values[0])?;
    let temperature_celsius = parse_float(values[1])?;

    // Shape-validated only; the device already verified it.
    values[2]
        .parse::<i64>()
        .map_err(|_| Error::Numeric(values[2].to_string()))?;

    if values[3] != "1" {
        return Err(Error::Checksum(text.to_string()));
    }

    Ok(Reading {
        humidity_percent,
        temperature_celsius,
    })
}

fn parse_float(value: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .map_err(|_| Error::Numeric(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_frame() {
        let raw = b"Humidity (%): 49.0, Temperature (C): 23.5, Checksum: 77, Valid checksum: 1";
        let reading = parse(raw).unwrap();

        assert_eq!(reading.humidity_percent, 49.0);
        assert_eq!(reading.temperature_celsius, 23.5);
    }

    #[test]
    fn test_trailing_newline_is_stripped() {
        let raw =
            b"Humidity (%): 60.0, Temperature (C): 21.0, Checksum: 81, Valid checksum: 1\r\n";
        let reading = parse(raw).unwrap();

        assert_eq!(reading.humidity_percent, 60.0);
        assert_eq!(reading.temperature_celsius, 21.0);
    }

    #[test]
    fn test_invalid_checksum_flag() {
        let raw = b"Humidity (%): 49.0, Temperature (C): 23.5, Checksum: 77, Valid checksum: 0";

        assert!(matches!(parse(raw), Err(Error::Checksum(_))));
    }

    #[test]
    fn test_checksum_flag_must_be_literal_one() {
        let raw =
            b"Humidity (%): 49.0, Temperature (C): 23.5, Checksum: 77, Valid checksum: yes";

        assert!(matches!(parse(raw), Err(Error::Checksum(_))));
    }

    #[test]
    fn test_wrong_field_count() {
        let raw = b"Humidity (%): 49.0, Temperature (C): 23.5, Checksum: 77";

        assert!(matches!(parse(raw), Err(Error::Format(_))));
    }

    #[test]
    fn test_field_without_separator() {
        let raw = b"Humidity 49.0, Temperature (C): 23.5, Checksum: 77, Valid checksum: 1";

        assert!(matches!(parse(raw), Err(Error::Format(_))));
    }

    #[test]
    fn test_non_numeric_humidity() {
        let raw = b"Humidity (%): nan%, Temperature (C): 23.5, Checksum: 77, Valid checksum: 1";

        assert!(matches!(parse(raw), Err(Error::Numeric(_))));
    }

    #[test]
    fn test_non_numeric_checksum() {
        let raw = b"Humidity (%): 49.0, Temperature (C): 23.5, Checksum: xx, Valid checksum: 1";

        assert!(matches!(parse(raw), Err(Error::Numeric(_))));
    }

    #[test]
    fn test_invalid_utf8() {
        let raw: &[u8] = &[0xff, 0xfe, 0x48];

        assert!(matches!(parse(raw), Err(Error::Decode(_))));
    }

    #[test]
    fn test_empty_frame() {
        assert!(matches!(parse(b""), Err(Error::Format(_))));
    }
}
