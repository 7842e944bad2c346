use doorlock_core::{
    Error, Result,
    constants::{TOPIC_COMMAND, TOPIC_FINGERPRINT, TOPIC_STATUS},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supervisor topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// Lock state and credential events (`door/status`)
    Status,
    /// Commands from the supervisor (`door/command`)
    Command,
    /// Enrollment and match events (`door/fingerprint`)
    Fingerprint,
}

impl Topic {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Topic::Status => TOPIC_STATUS,
            Topic::Command => TOPIC_COMMAND,
            Topic::Fingerprint => TOPIC_FINGERPRINT,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Topic {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            TOPIC_STATUS => Ok(Topic::Status),
            TOPIC_COMMAND => Ok(Topic::Command),
            TOPIC_FINGERPRINT => Ok(Topic::Fingerprint),
            other => Err(Error::invalid_message(format!("Unknown topic: {other}"))),
        }
    }
}
