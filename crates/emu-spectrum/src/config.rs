//! Machine configuration.

/// Frame rate of a PAL 48K Spectrum.
pub const DEFAULT_FPS: f32 = 50.08;

/// Configuration for creating a [`crate::Spectrum48k`].
#[derive(Debug, Clone)]
pub struct SpectrumConfig {
    /// ROM image. Must be exactly 16,384 bytes.
    pub rom: Vec<u8>,
    /// The tape collaborator loads faster than real time. Also silences
    /// tape noise on the beeper.
    pub accelerated_load: bool,
    /// Capture shadow cells for screen bytes overwritten after the ULA
    /// fetched them.
    pub accurate_ula: bool,
    pub fps: f32,
    /// Fold the tape EAR input into the beeper level.
    pub tape_noise: bool,
}

impl SpectrumConfig {
    #[must_use]
    pub fn new(rom: Vec<u8>) -> Self {
        Self {
            rom,
            accelerated_load: false,
            accurate_ula: true,
            fps: DEFAULT_FPS,
            tape_noise: true,
        }
    }
}

/// Frame rates at or below 1 fall back to the default.
#[must_use]
pub fn effective_fps(fps: f32) -> f32 {
    if fps <= 1.0 { DEFAULT_FPS } else { fps }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SpectrumConfig::new(vec![0; 0x4000]);
        assert!(!config.accelerated_load);
        assert!(config.accurate_ula);
        assert!(config.tape_noise);
        assert!((config.fps - DEFAULT_FPS).abs() < f32::EPSILON);
    }

    #[test]
    fn low_fps_falls_back() {
        assert!((effective_fps(0.5) - DEFAULT_FPS).abs() < f32::EPSILON);
        assert!((effective_fps(1.0) - DEFAULT_FPS).abs() < f32::EPSILON);
        assert!((effective_fps(25.0) - 25.0).abs() < f32::EPSILON);
    }
}
