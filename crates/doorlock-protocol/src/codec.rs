//! Tokio codec for the supervisor link.
//!
//! Each [`Envelope`] is encoded as one line of JSON terminated by `\n`:
//!
//! ```text
//! {"topic":"door/command","payload":"unlock"}\n
//! ```
//!
//! # Usage with Tokio Framed
//!
//! ```rust,no_run
//! use doorlock_protocol::{Envelope, SupervisorCodec, Topic};
//! use futures::{SinkExt, StreamExt};
//! use tokio::net::TcpStream;
//! use tokio_util::codec::Framed;
//!
//! # async fn example() -> doorlock_core::Result<()> {
//! let stream = TcpStream::connect("127.0.0.1:1883").await?;
//! let mut framed = Framed::new(stream, SupervisorCodec::new());
//!
//! framed.send(Envelope::new(Topic::Status, "connected")).await?;
//!
//! if let Some(Ok(envelope)) = framed.next().await {
//!     println!("Received: {:?}", envelope);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! A line that is not a valid envelope is logged and skipped, so one bad
//! message does not tear the connection down. A line longer than the
//! configured maximum is an error because the stream can no longer be
//! resynchronized cheaply.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::Envelope;
use doorlock_core::{Error, Result};

/// Default maximum line size in bytes (4 KB).
const DEFAULT_MAX_FRAME_SIZE: usize = 4 * 1024;

/// Newline-delimited JSON codec for [`Envelope`]s.
#[derive(Debug)]
pub struct SupervisorCodec {
    /// Maximum allowed line length in bytes, excluding the terminator.
    max_frame_size: usize,

    /// Bytes already scanned for a terminator.
    next_index: usize,
}

impl SupervisorCodec {
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            max_frame_size,
            next_index: 0,
        }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl Default for SupervisorCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for SupervisorCodec {
    type Item = Envelope;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        loop {
            let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') else {
                if src.len() > self.max_frame_size {
                    return Err(Error::invalid_message(format!(
                        "Frame exceeds {} bytes",
                        self.max_frame_size
                    )));
                }
                self.next_index = src.len();
                return Ok(None);
            };

            let line_end = self.next_index + offset;
            self.next_index = 0;
            let line = src.split_to(line_end + 1);
            let line = line[..line_end].trim_ascii();

            if line.is_empty() {
                continue;
            }
            if line.len() > self.max_frame_size {
                return Err(Error::invalid_message(format!(
                    "Frame exceeds {} bytes",
                    self.max_frame_size
                )));
            }

            match serde_json::from_slice::<Envelope>(line) {
                Ok(envelope) => return Ok(Some(envelope)),
                Err(e) => warn!("Skipping malformed envelope: {}", e),
            }
        }
    }
}

impl Encoder<Envelope> for SupervisorCodec {
    type Error = Error;

    fn encode(&mut self, item: Envelope, dst: &mut BytesMut) -> Result<()> {
        let json = serde_json::to_vec(&item)
            .map_err(|e| Error::invalid_message(format!("Failed to encode envelope: {e}")))?;

        if json.len() > self.max_frame_size {
            return Err(Error::invalid_message(format!(
                "Frame exceeds {} bytes",
                self.max_frame_size
            )));
        }

        dst.reserve(json.len() + 1);
        dst.extend_from_slice(&json);
        dst.extend_from_slice(b"\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Topic;

    #[test]
    fn test_codec_default() {
        let codec = SupervisorCodec::default();
        assert_eq!(codec.max_frame_size(), DEFAULT_MAX_FRAME_SIZE);
    }

    #[test]
    fn test_decode_complete_line() {
        let mut codec = SupervisorCodec::new();
        let mut buffer = BytesMut::from(&b"{\"topic\":\"door/command\",\"payload\":\"unlock\"}\n"[..]);

        let envelope = codec.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(envelope.topic, "door/command");
        assert_eq!(envelope.payload, "unlock");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_decode_partial_line() {
        let mut codec = SupervisorCodec::new();
        let mut buffer = BytesMut::from(&b"{\"topic\":\"door/command\","[..]);
        assert!(codec.decode(&mut buffer).unwrap().is_none());

        buffer.extend_from_slice(b"\"payload\":\"unlock\"}\r\n");
        let envelope = codec.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(envelope.payload, "unlock");
    }

    #[test]
    fn test_decode_multiple_lines() {
        let mut codec = SupervisorCodec::new();
        let mut buffer = BytesMut::from(
            &b"{\"topic\":\"a\",\"payload\":\"1\"}\n\n{\"topic\":\"b\",\"payload\":\"2\"}\n"[..],
        );

        assert_eq!(codec.decode(&mut buffer).unwrap().unwrap().topic, "a");
        assert_eq!(codec.decode(&mut buffer).unwrap().unwrap().topic, "b");
        assert!(codec.decode(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn test_decode_skips_malformed_line() {
        let mut codec = SupervisorCodec::new();
        let mut buffer =
            BytesMut::from(&b"not json\n{\"topic\":\"door/command\",\"payload\":\"unlock\"}\n"[..]);

        let envelope = codec.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(envelope.payload, "unlock");
    }

    #[test]
    fn test_decode_frame_too_large() {
        let mut codec = SupervisorCodec::with_max_frame_size(16);
        let mut buffer = BytesMut::from(&[b'x'; 32][..]);
        assert!(codec.decode(&mut buffer).is_err());
    }

    #[test]
    fn test_encode_appends_newline() {
        let mut codec = SupervisorCodec::new();
        let mut buffer = BytesMut::new();

        codec
            .encode(Envelope::new(Topic::Status, "door_locked"), &mut buffer)
            .unwrap();
        assert_eq!(
            &buffer[..],
            b"{\"topic\":\"door/status\",\"payload\":\"door_locked\"}\n"
        );
    }

    #[test]
    fn test_encode_frame_too_large() {
        let mut codec = SupervisorCodec::with_max_frame_size(8);
        let mut buffer = BytesMut::new();
        assert!(
            codec
                .encode(Envelope::new(Topic::Status, "door_locked"), &mut buffer)
                .is_err()
        );
        assert!(buffer.is_empty());
    }
}
