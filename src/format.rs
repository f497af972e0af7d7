// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Command-formatting boundary
//!
//! The request/response surface an embedding application mounts (locally or
//! behind an HTTP route) to turn loosely-typed action requests into wire
//! frames. Unlike the encoder itself, this boundary is strict about `play`
//! requests: the three descriptive fields must be present, because a play
//! request with none of them is almost certainly a caller bug rather than a
//! degraded-but-intentional command.

use crate::command::{self, Command, FormattedCommand, SoundSystem};
use crate::common::{epoch_ms, hex_dump};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Loosely-typed command request as received from the embedding application
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRequest {
    pub action: Option<String>,
    pub system: Option<String>,
    pub sound_code: Option<String>,
    pub location: Option<String>,
    pub volume: Option<i64>,
}

/// Successful formatting result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    pub success: bool,
    pub command: FormattedCommand,
    /// Unix epoch milliseconds at formatting time
    pub timestamp: u64,
    /// Lowercase space-separated hex rendering of the frame bytes
    pub hex: String,
}

/// Errors produced by the formatting boundary
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatServiceError {
    #[error("Missing required field: action")]
    MissingAction,

    #[error("Play action requires system, soundCode, and location")]
    IncompletePlay,

    #[error("Failed to process command")]
    Internal { details: String },
}

impl FormatServiceError {
    /// HTTP-style status class for embedding servers
    pub fn status(&self) -> u16 {
        match self {
            Self::MissingAction | Self::IncompletePlay => 400,
            Self::Internal { .. } => 500,
        }
    }

    /// JSON error body in the shape the embedding API exposes
    pub fn to_body(&self) -> serde_json::Value {
        match self {
            Self::Internal { details } => json!({
                "error": self.to_string(),
                "details": details,
            }),
            _ => json!({ "error": self.to_string() }),
        }
    }
}

/// Format a loosely-typed request into a framed command
///
/// Unrecognized (but present) action values yield the `"N"` no-op frame
/// rather than an error, per the wire grammar.
pub fn format_command(request: &CommandRequest) -> Result<CommandResponse, FormatServiceError> {
    let action = request
        .action
        .as_deref()
        .ok_or(FormatServiceError::MissingAction)?;

    let formatted = match action {
        "play" => {
            if request.system.is_none()
                || request.sound_code.is_none()
                || request.location.is_none()
            {
                return Err(FormatServiceError::IncompletePlay);
            }
            command::encode(&Command::Play {
                system: SoundSystem::parse(request.system.as_deref().unwrap_or_default()),
                sound_code: request.sound_code.clone(),
                location: request.location.clone(),
                volume: request.volume,
            })
        }
        "stop" => command::encode(&Command::Stop),
        "volume" => command::encode(&Command::SetVolume {
            level: request.volume,
        }),
        "status" => command::encode(&Command::QueryStatus),
        _ => command::encode_unrecognized(),
    };

    let hex = hex_dump(&formatted.bytes);
    Ok(CommandResponse {
        success: true,
        command: formatted,
        timestamp: epoch_ms(),
        hex,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(action: &str) -> CommandRequest {
        CommandRequest {
            action: Some(action.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn missing_action_is_a_400() {
        let err = format_command(&CommandRequest::default()).unwrap_err();
        assert_eq!(err, FormatServiceError::MissingAction);
        assert_eq!(err.status(), 400);
        assert_eq!(
            err.to_body(),
            serde_json::json!({ "error": "Missing required field: action" })
        );
    }

    #[test]
    fn incomplete_play_is_rejected() {
        let mut req = request("play");
        req.system = Some("lung".to_string());
        req.sound_code = Some("wheeze".to_string());
        // location still missing

        let err = format_command(&req).unwrap_err();
        assert_eq!(err, FormatServiceError::IncompletePlay);
        assert_eq!(
            err.to_string(),
            "Play action requires system, soundCode, and location"
        );
    }

    #[test]
    fn complete_play_formats() {
        let req = CommandRequest {
            action: Some("play".to_string()),
            system: Some("lung".to_string()),
            sound_code: Some("lung_normal".to_string()),
            location: Some("right-upper-anterior".to_string()),
            volume: Some(12),
        };

        let response = format_command(&req).unwrap();
        assert!(response.success);
        assert_eq!(response.command.raw, "P:L:LUNG_NORMAL:RUA:10");
        assert!(response.hex.starts_with("02 "));
        assert!(response.timestamp > 0);
    }

    #[test]
    fn hex_matches_frame_bytes() {
        let response = format_command(&request("stop")).unwrap();
        assert_eq!(response.hex, "02 53 03 53");
    }

    #[test]
    fn volume_and_status_actions() {
        let mut req = request("volume");
        req.volume = Some(-3);
        assert_eq!(format_command(&req).unwrap().command.raw, "V:0");
        assert_eq!(
            format_command(&request("status")).unwrap().command.raw,
            "Q"
        );
    }

    #[test]
    fn unrecognized_action_formats_a_noop() {
        let response = format_command(&request("reboot")).unwrap();
        assert!(response.success);
        assert_eq!(response.command.raw, "N");
    }

    #[test]
    fn request_deserializes_camel_case() {
        let req: CommandRequest = serde_json::from_str(
            r#"{"action":"play","system":"heart","soundCode":"s1s2","location":"mitral","volume":7}"#,
        )
        .unwrap();
        assert_eq!(req.sound_code.as_deref(), Some("s1s2"));

        let response = format_command(&req).unwrap();
        assert_eq!(response.command.raw, "P:H:S1S2:MIT:7");
    }

    #[test]
    fn internal_error_body_carries_details() {
        let err = FormatServiceError::Internal {
            details: "boom".to_string(),
        };
        assert_eq!(err.status(), 500);
        assert_eq!(
            err.to_body(),
            serde_json::json!({ "error": "Failed to process command", "details": "boom" })
        );
    }
}
