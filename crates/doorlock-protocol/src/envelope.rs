use crate::Topic;
use doorlock_core::Result;
use serde::{Deserialize, Serialize};

/// One message on the supervisor link.
///
/// Topics are kept as raw strings so a peer can send topics this
/// controller does not know about without breaking the stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub topic: String,
    pub payload: String,
}

impl Envelope {
    pub fn new(topic: Topic, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.as_str().to_string(),
            payload: payload.into(),
        }
    }

    /// Resolve the topic name.
    ///
    /// # Errors
    /// Returns `Error::InvalidMessage` for unknown topics.
    pub fn topic(&self) -> Result<Topic> {
        self.topic.parse()
    }
}
