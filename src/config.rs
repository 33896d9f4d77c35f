use alloc::{borrow::ToOwned, string::String};

/// Switches and constants that shape one engine run.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// multiplied into every foot tempo
    pub global_tempo: f64,
    /// semitone offset added to the pitch channel of every output tick
    pub pitch_mean: f64,
    /// keep the rule driven pitch movements; when unset channel 0 starts from zero every tick
    pub micro_intonation: bool,
    /// add the tone group contour to the pitch channel
    pub macro_intonation: bool,
    /// integrate the contour as cubic segments instead of straight lines
    pub smooth_intonation: bool,
    pub drift: bool,
    /// peak deviation of the drift noise in semitones
    pub drift_deviation: f64,
    /// low-pass cutoff of the drift noise in Hz
    pub drift_cutoff: f64,
    /// pick tone group tables and jitter intonation points with the engine's random source
    pub random_intonation: bool,
    /// category marking the postures that anchor intonation points
    pub vocoid_category: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            global_tempo: 1.0,
            pitch_mean: 0.0,
            micro_intonation: true,
            macro_intonation: true,
            smooth_intonation: true,
            drift: true,
            drift_deviation: 1.0,
            drift_cutoff: 0.5,
            random_intonation: false,
            vocoid_category: "vocoid".to_owned(),
        }
    }
}
