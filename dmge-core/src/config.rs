use serde::{Deserialize, Serialize};
use std::fmt::Formatter;

/// Host-controlled emulation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmulationConfig {
    /// Whether the APU generates samples for the host to consume.
    pub audio_enabled: bool,
    /// Render with the classic DMG green palette instead of grayscale.
    pub classic_green: bool,
}

impl Default for EmulationConfig {
    fn default() -> Self {
        Self { audio_enabled: true, classic_green: false }
    }
}

impl std::fmt::Display for EmulationConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "audio_enabled: {}", self.audio_enabled)?;
        writeln!(f, "classic_green: {}", self.classic_green)?;

        Ok(())
    }
}
