//! Mock keypad driven through a channel.

use crate::{HardwareError, Key, KeypadDevice, Result};
use tokio::sync::mpsc;

/// Mock keypad for testing and development.
///
/// Keys sent through the [`MockKeypadHandle`] are returned one per poll.
///
/// # Examples
///
/// ```
/// use doorlock_hardware::{Key, KeypadDevice, mock::MockKeypad};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> doorlock_hardware::Result<()> {
///     let (mut keypad, handle) = MockKeypad::new();
///
///     handle.type_keys("12#")?;
///
///     assert_eq!(keypad.poll().await?, Some(Key::Digit(1)));
///     assert_eq!(keypad.poll().await?, Some(Key::Digit(2)));
///     assert_eq!(keypad.poll().await?, Some(Key::Hash));
///     assert_eq!(keypad.poll().await?, None);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockKeypad {
    input_rx: mpsc::UnboundedReceiver<Key>,
}

impl MockKeypad {
    pub fn new() -> (Self, MockKeypadHandle) {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        (Self { input_rx }, MockKeypadHandle { input_tx })
    }
}

impl KeypadDevice for MockKeypad {
    async fn poll(&mut self) -> Result<Option<Key>> {
        match self.input_rx.try_recv() {
            Ok(key) => Ok(Some(key)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => {
                Err(HardwareError::disconnected("Keypad input channel closed"))
            }
        }
    }
}

/// Handle for pressing keys on a [`MockKeypad`].
#[derive(Debug, Clone)]
pub struct MockKeypadHandle {
    input_tx: mpsc::UnboundedSender<Key>,
}

impl MockKeypadHandle {
    /// Queue one key press.
    ///
    /// # Errors
    ///
    /// Returns an error if the keypad has been dropped.
    pub fn press(&self, key: Key) -> Result<()> {
        self.input_tx
            .send(key)
            .map_err(|_| HardwareError::disconnected("Keypad input channel closed"))
    }

    /// Queue one press per character.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::InvalidData` for characters that are not on
    /// the keypad, or an error if the keypad has been dropped.
    pub fn type_keys(&self, keys: &str) -> Result<()> {
        for c in keys.chars() {
            let key = Key::from_char(c)
                .ok_or_else(|| HardwareError::invalid_data(format!("No key for '{c}'")))?;
            self.press(key)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_poll_empty() {
        let (mut keypad, _handle) = MockKeypad::new();
        assert_eq!(keypad.poll().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_type_keys_rejects_unknown() {
        let (_keypad, handle) = MockKeypad::new();
        assert!(handle.type_keys("12x").is_err());
    }

    #[tokio::test]
    async fn test_poll_after_handle_dropped() {
        let (mut keypad, handle) = MockKeypad::new();
        handle.press(Key::Star).unwrap();
        drop(handle);

        assert_eq!(keypad.poll().await.unwrap(), Some(Key::Star));
        assert!(keypad.poll().await.is_err());
    }
}
