//! Scripted console input driving a full controller session.

use doorlock_cli::{
    ConsoleActuator, ConsoleKeypad, SimulatedSensor,
    console::{SensorCommand, pump_lines},
};
use doorlock_controller::{
    AccessController, ControllerConfig, Peripherals, SessionState, VirtualDisplay,
};
use doorlock_core::FingerprintId;
use doorlock_hardware::Key;
use doorlock_protocol::{FingerprintFailure, MockRemoteChannel, OutboundEvent};
use doorlock_storage::MemoryCredentialStore;
use std::time::Duration;
use tokio::{
    io::{AsyncWriteExt, BufReader, duplex},
    sync::mpsc,
    time::sleep,
};

/// Pause between two typed lines, long enough for a capture to start.
const LINE_GAP: Duration = Duration::from_millis(20);

fn fast_config() -> ControllerConfig {
    ControllerConfig {
        poll_interval: Duration::from_millis(1),
        result_pause: Duration::from_millis(1),
        remote_change_pause: Duration::from_millis(1),
        timeout_pause: Duration::from_millis(1),
        clear_all_pause: Duration::from_millis(1),
        ..ControllerConfig::default()
    }
}

/// Type `lines` into the console one at a time.
fn console_from(
    lines: &'static [&'static str],
) -> (ConsoleKeypad, mpsc::UnboundedReceiver<SensorCommand>) {
    let (key_tx, key_rx) = mpsc::unbounded_channel::<Key>();
    let (sensor_tx, sensor_rx) = mpsc::unbounded_channel();
    let (mut writer, reader) = duplex(256);

    tokio::spawn(async move {
        for line in lines {
            sleep(LINE_GAP).await;
            writer.write_all(format!("{line}\n").as_bytes()).await.unwrap();
        }
    });
    tokio::spawn(pump_lines(BufReader::new(reader), key_tx, sensor_tx));

    (ConsoleKeypad::new(key_rx), sensor_rx)
}

#[tokio::test]
async fn test_scripted_session() {
    // Unknown finger, then password unlock, enroll, exit.
    let (keypad, sensor_commands) = console_from(&["#", "!finger 1", "1234", "3", "!finger 7", "4"]);
    let (remote, mut remote_handle) = MockRemoteChannel::new();
    let store = MemoryCredentialStore::new();

    let mut controller = AccessController::new(
        Peripherals {
            keypad,
            sensor: SimulatedSensor::new(sensor_commands, Duration::from_secs(1)),
            display: VirtualDisplay::default(),
            actuator: ConsoleActuator::new(Duration::from_millis(1)),
        },
        store,
        remote,
        fast_config(),
    );

    controller.run(sleep(Duration::from_millis(300))).await;

    assert_eq!(controller.state(), SessionState::Locked);
    assert_eq!(controller.failures(), 0);
    assert_eq!(
        remote_handle.published(),
        vec![
            OutboundEvent::MatchFailed(FingerprintFailure::NoMatch),
            OutboundEvent::WrongPassword { attempts: 1 },
            OutboundEvent::DoorUnlocked,
            OutboundEvent::EnrollSucceeded(FingerprintId::new(1).unwrap()),
            OutboundEvent::DoorLocked,
        ]
    );
}

#[tokio::test]
async fn test_sensor_error_from_console() {
    let (keypad, sensor_commands) = console_from(&["#", "!sensor-error"]);
    let (remote, mut remote_handle) = MockRemoteChannel::new();

    let mut controller = AccessController::new(
        Peripherals {
            keypad,
            sensor: SimulatedSensor::new(sensor_commands, Duration::from_secs(1)),
            display: VirtualDisplay::default(),
            actuator: ConsoleActuator::new(Duration::from_millis(1)),
        },
        MemoryCredentialStore::new(),
        remote,
        fast_config(),
    );

    controller.run(sleep(Duration::from_millis(200))).await;

    assert_eq!(controller.state(), SessionState::Locked);
    assert_eq!(
        remote_handle.published(),
        vec![
            OutboundEvent::MatchFailed(FingerprintFailure::SensorError),
            OutboundEvent::WrongPassword { attempts: 1 },
        ]
    );
}
