//! Commands sent by the supervisor on `door/command`.
//!
//! The structured form is a JSON object tagged by `command`:
//!
//! ```text
//! {"command":"unlock"}
//! {"command":"clear_all_fingers"}
//! {"command":"change_password","password":"0099"}
//! ```
//!
//! Older supervisors send bare text instead (`unlock`, `clear_all_fingers`,
//! `change_password 0099`). Those are accepted too, but only when the
//! command word matches exactly.
//!
//! A `change_password` candidate is never rejected here. Whatever follows
//! the command word (or whatever the `password` field holds) is handed to
//! the controller, which answers with a length or format error event.

use doorlock_core::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

const CHANGE_PASSWORD: &str = "change_password";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum InboundCommand {
    /// Open the admin menu as if the password had been entered.
    Unlock,

    /// Erase every enrolled fingerprint.
    #[serde(rename = "clear_all_fingers")]
    ClearAllFingerprints,

    /// Replace the stored password.
    ///
    /// The candidate is carried as received; the controller validates it so
    /// it can report length and format problems separately.
    ChangePassword {
        #[serde(default, deserialize_with = "candidate_text")]
        password: String,
    },
}

/// Missing or null passwords become empty, other non-strings their JSON text.
fn candidate_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

impl InboundCommand {
    /// Parse a raw `door/command` payload.
    ///
    /// # Errors
    /// Returns `Error::InvalidMessage` for malformed JSON, unknown commands,
    /// or legacy text with unexpected tokens.
    pub fn parse(payload: &str) -> Result<Self> {
        let trimmed = payload.trim();
        if trimmed.starts_with('{') {
            return serde_json::from_str(trimmed)
                .map_err(|e| Error::invalid_message(format!("Malformed command: {e}")));
        }

        if let Some(rest) = trimmed.strip_prefix(CHANGE_PASSWORD)
            && (rest.is_empty() || rest.starts_with(char::is_whitespace))
        {
            return Ok(InboundCommand::ChangePassword {
                password: rest.trim().to_string(),
            });
        }

        let mut tokens = trimmed.split_whitespace();
        match (tokens.next(), tokens.next()) {
            (Some("unlock"), None) => Ok(InboundCommand::Unlock),
            (Some("clear_all_fingers"), None) => Ok(InboundCommand::ClearAllFingerprints),
            _ => Err(Error::invalid_message(format!(
                "Unknown command: {}",
                trimmed.chars().take(32).collect::<String>()
            ))),
        }
    }

    /// Name used in logs. Never includes the password.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            InboundCommand::Unlock => "unlock",
            InboundCommand::ClearAllFingerprints => "clear_all_fingers",
            InboundCommand::ChangePassword { .. } => CHANGE_PASSWORD,
        }
    }

    /// Serialize to the structured JSON form.
    #[must_use]
    pub fn to_payload(&self) -> String {
        // A fieldless or single-string enum cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}
