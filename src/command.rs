// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Command model and wire encoder
//!
//! Maps semantic playback commands to the framed byte sequence the manikin
//! firmware consumes. Encoding is total and pure: missing or unmapped fields
//! degrade to placeholder codes (`U`, `UNK`, default volume) instead of
//! failing, so a malformed upstream request can never wedge the hardware
//! bridge. Callers wanting strict validation must validate before encoding;
//! the formatting boundary in [`crate::format`] is where that happens.

use crate::framing::{ETX, STX};
use serde::{Deserialize, Serialize};

/// Volume applied when the caller supplies none
pub const DEFAULT_VOLUME: i64 = 5;

/// Body system a sound belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundSystem {
    Lung,
    Heart,
    Bowel,
    Unknown,
}

impl SoundSystem {
    /// Lenient parse; anything unrecognized is `Unknown`
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "lung" => Self::Lung,
            "heart" => Self::Heart,
            "bowel" => Self::Bowel,
            _ => Self::Unknown,
        }
    }

    /// Single-letter wire code
    pub fn code(self) -> char {
        match self {
            Self::Lung => 'L',
            Self::Heart => 'H',
            Self::Bowel => 'B',
            Self::Unknown => 'U',
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Lung => "lung",
            Self::Heart => "heart",
            Self::Bowel => "bowel",
            Self::Unknown => "unknown",
        }
    }
}

/// A semantic playback command, created per invocation and consumed
/// immediately
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play {
        system: SoundSystem,
        sound_code: Option<String>,
        location: Option<String>,
        volume: Option<i64>,
    },
    Stop,
    SetVolume {
        level: Option<i64>,
    },
    QueryStatus,
}

/// A command fully rendered for the wire
///
/// Immutable and entirely derived from the input [`Command`]. `description`
/// is for logs and toasts only, never transmitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedCommand {
    pub raw: String,
    pub bytes: Vec<u8>,
    pub checksum: u8,
    pub description: String,
}

/// Clamp a caller-supplied volume into the firmware's 0..=10 range
pub fn clamp_volume(volume: i64) -> i64 {
    volume.clamp(0, 10)
}

/// Sum of the UTF-16 code units of `raw`, mod 256
///
/// Folded with wrapping arithmetic so arbitrarily long caller input can
/// never overflow; each step stays congruent mod 256.
pub fn checksum(raw: &str) -> u8 {
    raw.encode_utf16()
        .fold(0u8, |acc, unit| acc.wrapping_add(unit as u8))
}

/// Fixed 3-letter anatomical code for a canonical location key
///
/// Unmapped keys fall back to `"UNK"` rather than erroring.
pub fn location_code(key: &str) -> &'static str {
    match key {
        // Lung fields, anterior
        "right-upper-anterior" => "RUA",
        "left-upper-anterior" => "LUA",
        "right-middle-anterior" => "RMA",
        "left-middle-anterior" => "LMA",
        "right-lower-anterior" => "RLA",
        "left-lower-anterior" => "LLA",
        // Lung fields, posterior
        "right-upper-posterior" => "RUP",
        "left-upper-posterior" => "LUP",
        "right-lower-posterior" => "RLP",
        "left-lower-posterior" => "LLP",
        // Cardiac sites
        "aortic" => "AOR",
        "pulmonic" => "PUL",
        "tricuspid" => "TRI",
        "mitral" => "MIT",
        "erbs-point" => "ERB",
        // Abdominal quadrants
        "right-upper-quadrant" => "RUQ",
        "left-upper-quadrant" => "LUQ",
        "right-lower-quadrant" => "RLQ",
        "left-lower-quadrant" => "LLQ",
        _ => "UNK",
    }
}

/// Encode a command into its framed wire form
///
/// Deterministic: the same command always produces the same bytes.
pub fn encode(command: &Command) -> FormattedCommand {
    match command {
        Command::Play {
            system,
            sound_code,
            location,
            volume,
        } => {
            let sound = sound_code
                .as_deref()
                .map(|s| s.to_uppercase())
                .unwrap_or_else(|| "UNK".to_string());
            let loc = location.as_deref().map(location_code).unwrap_or("UNK");
            let vol = clamp_volume(volume.unwrap_or(DEFAULT_VOLUME));
            let raw = format!("P:{}:{}:{}:{}", system.code(), sound, loc, vol);
            let description = format!(
                "Play {} sound {} at {} (volume {})",
                system.label(),
                sound,
                location.as_deref().unwrap_or("unknown site"),
                vol
            );
            frame(raw, description)
        }
        Command::Stop => frame("S".to_string(), "Stop all sounds".to_string()),
        Command::SetVolume { level } => {
            let vol = clamp_volume(level.unwrap_or(DEFAULT_VOLUME));
            frame(
                format!("V:{vol}"),
                format!("Set master volume to {vol}"),
            )
        }
        Command::QueryStatus => frame("Q".to_string(), "Query device status".to_string()),
    }
}

/// The defined safe no-op frame for unrecognized actions
pub fn encode_unrecognized() -> FormattedCommand {
    frame("N".to_string(), "No-op (unrecognized command)".to_string())
}

fn frame(raw: String, description: String) -> FormattedCommand {
    let checksum = checksum(&raw);
    let mut bytes = Vec::with_capacity(raw.len() + 3);
    bytes.push(STX);
    bytes.extend_from_slice(raw.as_bytes());
    bytes.push(ETX);
    bytes.push(checksum);

    FormattedCommand {
        raw,
        bytes,
        checksum,
        description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(system: &str, sound: &str, location: &str, volume: i64) -> Command {
        Command::Play {
            system: SoundSystem::parse(system),
            sound_code: Some(sound.to_string()),
            location: Some(location.to_string()),
            volume: Some(volume),
        }
    }

    #[test]
    fn stop_checksum_is_ascii_s() {
        let formatted = encode(&Command::Stop);
        assert_eq!(formatted.raw, "S");
        assert_eq!(formatted.checksum, 83);
        assert_eq!(formatted.bytes, vec![0x02, b'S', 0x03, 83]);
    }

    #[test]
    fn worked_play_example() {
        let formatted = encode(&play("lung", "lung_normal", "right-upper-anterior", 12));
        assert_eq!(formatted.raw, "P:L:LUNG_NORMAL:RUA:10");
        assert_eq!(formatted.bytes.len(), 25);

        let expected: u32 = "P:L:LUNG_NORMAL:RUA:10".chars().map(|c| c as u32).sum();
        assert_eq!(formatted.checksum, (expected % 256) as u8);
    }

    #[test]
    fn frame_structure_round_trips() {
        let commands = [
            play("heart", "s1s2", "mitral", 7),
            Command::Stop,
            Command::SetVolume { level: Some(3) },
            Command::QueryStatus,
        ];

        for command in &commands {
            let formatted = encode(command);
            let bytes = &formatted.bytes;
            assert_eq!(bytes[0], STX);
            assert_eq!(bytes[bytes.len() - 2], ETX);
            assert_eq!(bytes[bytes.len() - 1], checksum(&formatted.raw));
            assert_eq!(&bytes[1..bytes.len() - 2], formatted.raw.as_bytes());
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let command = play("bowel", "borborygmi", "left-lower-quadrant", 4);
        assert_eq!(encode(&command), encode(&command));
    }

    #[test]
    fn volume_clamp_is_total() {
        assert_eq!(clamp_volume(-5), 0);
        assert_eq!(clamp_volume(15), 10);
        assert_eq!(clamp_volume(5), 5);
    }

    #[test]
    fn unknown_location_falls_back_to_unk() {
        assert_eq!(location_code("left-elbow"), "UNK");
        let formatted = encode(&play("lung", "wheeze", "left-elbow", 5));
        assert_eq!(formatted.raw, "P:L:WHEEZE:UNK:5");
    }

    #[test]
    fn missing_fields_degrade_to_placeholders() {
        let formatted = encode(&Command::Play {
            system: SoundSystem::parse("synthetic"),
            sound_code: None,
            location: None,
            volume: None,
        });
        assert_eq!(formatted.raw, "P:U:UNK:UNK:5");
    }

    #[test]
    fn set_volume_defaults_and_clamps() {
        assert_eq!(encode(&Command::SetVolume { level: None }).raw, "V:5");
        assert_eq!(encode(&Command::SetVolume { level: Some(99) }).raw, "V:10");
        assert_eq!(encode(&Command::QueryStatus).raw, "Q");
    }

    #[test]
    fn unrecognized_action_is_a_noop_frame() {
        let formatted = encode_unrecognized();
        assert_eq!(formatted.raw, "N");
        assert_eq!(formatted.bytes, vec![0x02, b'N', 0x03, checksum("N")]);
    }

    #[test]
    fn checksum_handles_unbounded_payloads() {
        // sound_code is unbounded caller input; encoding must stay total.
        let formatted = encode(&Command::Play {
            system: SoundSystem::Lung,
            sound_code: Some("\u{FFFF}".repeat(70_000)),
            location: None,
            volume: None,
        });

        let expected =
            (formatted.raw.encode_utf16().map(u64::from).sum::<u64>() % 256) as u8;
        assert_eq!(formatted.checksum, expected);
    }

    #[test]
    fn system_codes() {
        assert_eq!(SoundSystem::parse("LUNG").code(), 'L');
        assert_eq!(SoundSystem::parse("heart").code(), 'H');
        assert_eq!(SoundSystem::parse("bowel").code(), 'B');
        assert_eq!(SoundSystem::parse("cardiac").code(), 'U');
    }
}
