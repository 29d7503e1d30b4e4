use rand::Rng;

/// Drifting humidity/temperature state emitted as Arduino-format frames:
/// `Humidity (%): 49.0, Temperature (C): 23.5, Checksum: 77, Valid checksum: 1`
pub struct SensorState {
    humidity: f64,
    temperature: f64,
}

impl SensorState {
    pub fn new() -> Self {
        Self {
            humidity: 50.0,
            temperature: 22.0,
        }
    }

    /// Random-walks both dimensions within plausible indoor bounds.
    pub fn step(&mut self, rng: &mut impl Rng) {
        self.humidity = (self.humidity + rng.gen_range(-1.5..1.5)).clamp(20.0, 90.0);
        self.temperature = (self.temperature + rng.gen_range(-0.5..0.5)).clamp(10.0, 35.0);
    }

    pub fn frame(&self, valid: bool) -> String {
        format!(
            "Humidity (%): {:.1}, Temperature (C): {:.1}, Checksum: {}, Valid checksum: {}",
            self.humidity,
            self.temperature,
            checksum(self.humidity, self.temperature),
            u8::from(valid)
        )
    }
}

/// DHT-style additive checksum over the scaled sensor bytes.
fn checksum(humidity: f64, temperature: f64) -> u8 {
    let h = (humidity * 10.0).round() as u16;
    let t = (temperature * 10.0).round() as u16;
    let sum = (h >> 8) + (h & 0xff) + (t >> 8) + (t & 0xff);
    (sum & 0xff) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn test_frame_has_four_labelled_fields() {
        let state = SensorState::new();
        let frame = state.frame(true);

        let fields: Vec<&str> = frame.split(", ").collect();
        assert_eq!(fields.len(), 4);
        assert!(fields[0].starts_with("Humidity (%): "));
        assert!(fields[1].starts_with("Temperature (C): "));
        assert!(fields[2].starts_with("Checksum: "));
        assert_eq!(fields[3], "Valid checksum: 1");
    }

    #[test]
    fn test_corrupted_frame_reports_failed_checksum() {
        let state = SensorState::new();
        let frame = state.frame(false);

        assert!(frame.ends_with("Valid checksum: 0"));
    }

    #[test]
    fn test_values_are_formatted_with_one_decimal() {
        let state = SensorState::new();

        assert!(state.frame(true).starts_with("Humidity (%): 50.0, Temperature (C): 22.0, "));
    }

    #[test]
    fn test_step_stays_within_bounds() {
        let mut state = SensorState::new();
        let mut rng = StepRng::new(0, 1);

        for _ in 0..1000 {
            state.step(&mut rng);
            assert!((20.0..=90.0).contains(&state.humidity));
            assert!((10.0..=35.0).contains(&state.temperature));
        }
    }
}
