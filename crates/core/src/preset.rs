//! Voice presets accepted by the speech-synthesis and avatar backends.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A narration voice (and matching avatar) offered by the backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoicePreset {
    Belinda,
    BroomSalesman,
    Chadwick,
    EnMan,
    EnWoman,
    Mabel,
    Vex,
    ZhManSichuan,
}

impl VoicePreset {
    /// Every supported preset, in display order.
    pub const ALL: [VoicePreset; 8] = [
        VoicePreset::Belinda,
        VoicePreset::BroomSalesman,
        VoicePreset::Chadwick,
        VoicePreset::EnMan,
        VoicePreset::EnWoman,
        VoicePreset::Mabel,
        VoicePreset::Vex,
        VoicePreset::ZhManSichuan,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VoicePreset::Belinda => "belinda",
            VoicePreset::BroomSalesman => "broom_salesman",
            VoicePreset::Chadwick => "chadwick",
            VoicePreset::EnMan => "en_man",
            VoicePreset::EnWoman => "en_woman",
            VoicePreset::Mabel => "mabel",
            VoicePreset::Vex => "vex",
            VoicePreset::ZhManSichuan => "zh_man_sichuan",
        }
    }
}

impl fmt::Display for VoicePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoicePreset {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_preset(s)
    }
}

/// Parse a preset name case-insensitively.
pub fn validate_preset(name: &str) -> Result<VoicePreset, CoreError> {
    let normalized = name.trim().to_ascii_lowercase();
    VoicePreset::ALL
        .into_iter()
        .find(|p| p.as_str() == normalized)
        .ok_or_else(|| {
            let names: Vec<&str> = VoicePreset::ALL.iter().map(|p| p.as_str()).collect();
            CoreError::Validation(format!(
                "Unsupported voice preset '{name}'. Choose one of: {}",
                names.join(", ")
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_round_trips_through_its_name() {
        for preset in VoicePreset::ALL {
            assert_eq!(validate_preset(preset.as_str()).unwrap(), preset);
        }
    }

    #[test]
    fn parsing_ignores_case_and_whitespace() {
        assert_eq!(validate_preset(" Belinda ").unwrap(), VoicePreset::Belinda);
    }

    #[test]
    fn unknown_preset_lists_the_valid_ones() {
        let err = validate_preset("robot").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("robot"));
        assert!(msg.contains("zh_man_sichuan"));
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&VoicePreset::BroomSalesman).unwrap();
        assert_eq!(json, "\"broom_salesman\"");
    }
}
