use std::str::FromStr;
use crate::error::EarError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaveformType {
    Sine,
    Square,
    Triangle,
    Sawtooth,
    Noise,
}

impl WaveformType {
    pub fn generate_sample(&self, phase: f32) -> f32 { // phase in [0.0, 1.0)
        match self {
            WaveformType::Sine => (phase * std::f32::consts::TAU).sin(),
            WaveformType::Square => if phase < 0.5 { 1.0 } else { -1.0 },
            WaveformType::Sawtooth => phase * 2.0 - 1.0,
            WaveformType::Noise => fastrand::f32() * 2.0 - 1.0,
            WaveformType::Triangle => {
                if phase < 0.5 { phase * 4.0 - 1.0 } else { 3.0 - phase * 4.0 }
            }
        }
    }
}

impl FromStr for WaveformType {
    type Err = EarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sine" => Ok(WaveformType::Sine),
            "square" => Ok(WaveformType::Square),
            "triangle" => Ok(WaveformType::Triangle),
            "sawtooth" | "saw" => Ok(WaveformType::Sawtooth),
            "noise" => Ok(WaveformType::Noise),
            other => Err(EarError::ParseError(format!("Unknown Waveform: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_output() {
        for wave in [WaveformType::Sine, WaveformType::Square, WaveformType::Triangle, WaveformType::Sawtooth] {
            for i in 0..100 {
                let s = wave.generate_sample(i as f32 / 100.0);
                assert!((-1.0..=1.0).contains(&s), "{:?} out of range: {}", wave, s);
            }
        }
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("Sine".parse::<WaveformType>().unwrap(), WaveformType::Sine);
        assert_eq!(" saw ".parse::<WaveformType>().unwrap(), WaveformType::Sawtooth);
        assert!("organ".parse::<WaveformType>().is_err());
    }
}
