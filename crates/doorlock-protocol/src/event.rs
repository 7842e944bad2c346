use crate::{Envelope, Topic};
use doorlock_core::{Error, FingerprintId, Result};
use std::fmt;

/// Why a fingerprint search did not authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintFailure {
    /// The sensor read a finger but found no matching template.
    NoMatch,
    /// The sensor did not answer or reported an error.
    SensorError,
}

/// Event published to the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundEvent {
    Connected,
    DoorUnlocked,
    DoorLocked,
    PasswordChanged,
    WrongPassword { attempts: u32 },
    PasswordErrorLength,
    PasswordErrorFormat,
    EnrollSucceeded(FingerprintId),
    EnrollFailed,
    MatchSucceeded(FingerprintId),
    MatchFailed(FingerprintFailure),
    ClearAllSucceeded,
    ClearAllFailed,
}

impl OutboundEvent {
    #[must_use]
    pub fn topic(&self) -> Topic {
        match self {
            OutboundEvent::Connected
            | OutboundEvent::DoorUnlocked
            | OutboundEvent::DoorLocked
            | OutboundEvent::PasswordChanged
            | OutboundEvent::WrongPassword { .. }
            | OutboundEvent::PasswordErrorLength
            | OutboundEvent::PasswordErrorFormat => Topic::Status,
            OutboundEvent::EnrollSucceeded(_)
            | OutboundEvent::EnrollFailed
            | OutboundEvent::MatchSucceeded(_)
            | OutboundEvent::MatchFailed(_)
            | OutboundEvent::ClearAllSucceeded
            | OutboundEvent::ClearAllFailed => Topic::Fingerprint,
        }
    }

    #[must_use]
    pub fn payload(&self) -> String {
        match self {
            OutboundEvent::Connected => "connected".to_string(),
            OutboundEvent::DoorUnlocked => "door_unlocked".to_string(),
            OutboundEvent::DoorLocked => "door_locked".to_string(),
            OutboundEvent::PasswordChanged => "password_changed".to_string(),
            OutboundEvent::WrongPassword { attempts } => format!("wrong_pass:{attempts}"),
            OutboundEvent::PasswordErrorLength => "password_error_length".to_string(),
            OutboundEvent::PasswordErrorFormat => "password_error_format".to_string(),
            OutboundEvent::EnrollSucceeded(id) => format!("add_success:{id}"),
            OutboundEvent::EnrollFailed => "add_fail".to_string(),
            OutboundEvent::MatchSucceeded(id) => format!("check_success:{id}"),
            OutboundEvent::MatchFailed(FingerprintFailure::NoMatch) => "check_fail".to_string(),
            OutboundEvent::MatchFailed(FingerprintFailure::SensorError) => {
                "check_fail:error".to_string()
            }
            OutboundEvent::ClearAllSucceeded => "clear_all_fingers_success".to_string(),
            OutboundEvent::ClearAllFailed => "clear_all_fingers_fail".to_string(),
        }
    }

    #[must_use]
    pub fn to_envelope(&self) -> Envelope {
        Envelope::new(self.topic(), self.payload())
    }

    /// Rebuild an event from a received envelope.
    ///
    /// # Errors
    /// Returns `Error::InvalidMessage` when the topic or payload is unknown.
    pub fn from_envelope(envelope: &Envelope) -> Result<Self> {
        let topic: Topic = envelope.topic.parse()?;
        let payload = envelope.payload.as_str();
        let unknown = || Error::invalid_message(format!("Unknown {topic} payload: {payload}"));

        let event = match (topic, payload.split_once(':')) {
            (Topic::Status, None) => match payload {
                "connected" => OutboundEvent::Connected,
                "door_unlocked" => OutboundEvent::DoorUnlocked,
                "door_locked" => OutboundEvent::DoorLocked,
                "password_changed" => OutboundEvent::PasswordChanged,
                "password_error_length" => OutboundEvent::PasswordErrorLength,
                "password_error_format" => OutboundEvent::PasswordErrorFormat,
                _ => return Err(unknown()),
            },
            (Topic::Status, Some(("wrong_pass", n))) => OutboundEvent::WrongPassword {
                attempts: n.parse().map_err(|_| unknown())?,
            },
            (Topic::Fingerprint, None) => match payload {
                "add_fail" => OutboundEvent::EnrollFailed,
                "check_fail" => OutboundEvent::MatchFailed(FingerprintFailure::NoMatch),
                "clear_all_fingers_success" => OutboundEvent::ClearAllSucceeded,
                "clear_all_fingers_fail" => OutboundEvent::ClearAllFailed,
                _ => return Err(unknown()),
            },
            (Topic::Fingerprint, Some(("add_success", id))) => {
                OutboundEvent::EnrollSucceeded(id.parse()?)
            }
            (Topic::Fingerprint, Some(("check_success", id))) => {
                OutboundEvent::MatchSucceeded(id.parse()?)
            }
            (Topic::Fingerprint, Some(("check_fail", "error"))) => {
                OutboundEvent::MatchFailed(FingerprintFailure::SensorError)
            }
            _ => return Err(unknown()),
        };
        Ok(event)
    }
}

impl fmt::Display for OutboundEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.topic(), self.payload())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn id(n: u16) -> FingerprintId {
        FingerprintId::new(n).unwrap()
    }

    #[rstest]
    #[case(OutboundEvent::Connected, Topic::Status, "connected")]
    #[case(OutboundEvent::DoorUnlocked, Topic::Status, "door_unlocked")]
    #[case(OutboundEvent::DoorLocked, Topic::Status, "door_locked")]
    #[case(OutboundEvent::PasswordChanged, Topic::Status, "password_changed")]
    #[case(OutboundEvent::WrongPassword { attempts: 3 }, Topic::Status, "wrong_pass:3")]
    #[case(OutboundEvent::PasswordErrorLength, Topic::Status, "password_error_length")]
    #[case(OutboundEvent::PasswordErrorFormat, Topic::Status, "password_error_format")]
    #[case(OutboundEvent::EnrollSucceeded(id(3)), Topic::Fingerprint, "add_success:3")]
    #[case(OutboundEvent::EnrollFailed, Topic::Fingerprint, "add_fail")]
    #[case(OutboundEvent::MatchSucceeded(id(12)), Topic::Fingerprint, "check_success:12")]
    #[case(
        OutboundEvent::MatchFailed(FingerprintFailure::NoMatch),
        Topic::Fingerprint,
        "check_fail"
    )]
    #[case(
        OutboundEvent::MatchFailed(FingerprintFailure::SensorError),
        Topic::Fingerprint,
        "check_fail:error"
    )]
    #[case(OutboundEvent::ClearAllSucceeded, Topic::Fingerprint, "clear_all_fingers_success")]
    #[case(OutboundEvent::ClearAllFailed, Topic::Fingerprint, "clear_all_fingers_fail")]
    fn test_event_wire_form(
        #[case] event: OutboundEvent,
        #[case] topic: Topic,
        #[case] payload: &str,
    ) {
        assert_eq!(event.topic(), topic);
        assert_eq!(event.payload(), payload);
        assert_eq!(OutboundEvent::from_envelope(&event.to_envelope()).unwrap(), event);
    }

    #[rstest]
    #[case("door/status", "door_open")]
    #[case("door/status", "wrong_pass:x")]
    #[case("door/status", "add_fail")]
    #[case("door/fingerprint", "add_success:0")]
    #[case("door/fingerprint", "check_fail:timeout")]
    #[case("door/command", "unlock")]
    fn test_unknown_event_rejected(#[case] topic: &str, #[case] payload: &str) {
        let envelope = Envelope {
            topic: topic.to_string(),
            payload: payload.to_string(),
        };
        assert!(OutboundEvent::from_envelope(&envelope).is_err());
    }
}
