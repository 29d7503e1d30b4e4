use crate::errors::{Error, Result};
use crate::model::Reading;

/// Reduces one cycle's readings to a single representative reading: the
/// statistical median of each dimension, taken independently. The result is
/// synthetic and need not equal any input sample.
pub fn reduce(readings: &[Reading]) -> Result<Reading> {
    if readings.is_empty() {
        return Err(Error::EmptyInput);
    }

    let humidities: Vec<f64> = readings.iter().map(|r| r.humidity_percent).collect();
    let temperatures: Vec<f64> = readings.iter().map(|r| r.temperature_celsius).collect();

    Ok(Reading {
        humidity_percent: median(humidities),
        temperature_celsius: median(temperatures),
    })
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);

    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(humidity: f64, temperature: f64) -> Reading {
        Reading {
            humidity_percent: humidity,
            temperature_celsius: temperature,
        }
    }

    #[test]
    fn test_odd_count_takes_middle() {
        let readings = vec![reading(40.0, 20.0), reading(50.0, 22.0), reading(60.0, 24.0)];
        let result = reduce(&readings).unwrap();

        assert_eq!(result.humidity_percent, 50.0);
        assert_eq!(result.temperature_celsius, 22.0);
    }

    #[test]
    fn test_even_count_averages_middle_pair() {
        let readings = vec![reading(40.0, 20.0), reading(60.0, 24.0)];
        let result = reduce(&readings).unwrap();

        assert_eq!(result.humidity_percent, 50.0);
        assert_eq!(result.temperature_celsius, 22.0);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let readings = vec![
            reading(62.0, 24.5),
            reading(44.0, 19.0),
            reading(51.0, 21.0),
            reading(48.0, 26.0),
            reading(55.0, 20.5),
        ];
        let result = reduce(&readings).unwrap();

        assert_eq!(result.humidity_percent, 51.0);
        assert_eq!(result.temperature_celsius, 21.0);
    }

    #[test]
    fn test_dimensions_are_reduced_independently() {
        // The median humidity and median temperature come from different
        // samples, so the result is not any of the inputs.
        let readings = vec![reading(40.0, 24.0), reading(50.0, 20.0), reading(60.0, 22.0)];
        let result = reduce(&readings).unwrap();

        assert_eq!(result.humidity_percent, 50.0);
        assert_eq!(result.temperature_celsius, 22.0);
    }

    #[test]
    fn test_single_reading_is_its_own_median() {
        let readings = vec![reading(47.5, 23.0)];
        let result = reduce(&readings).unwrap();

        assert_eq!(result.humidity_percent, 47.5);
        assert_eq!(result.temperature_celsius, 23.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(reduce(&[]), Err(Error::EmptyInput)));
    }
}
