//! Integration tests for the event bridge driving real power cycles

use common::{Error, VidPid};
use hubpower::PowerController;
use hubpower::events::{LineEventSource, NotificationNames, run_bridge};
use hubpower::usb::mock::{MockBus, Toggle};
use record::SaveFile;

fn controller(dir: &tempfile::TempDir) -> PowerController<MockBus> {
    let bus = MockBus::new()
        .with_device(0x2109, 0x0813, &[2, 1])
        .with_device(0x04d9, 0x0355, &[2, 1, 3]);
    PowerController::new(
        bus,
        SaveFile::new(dir.path().join("saved.json")),
        vec![VidPid::new(0x04d9, 0x0355)],
    )
}

#[tokio::test]
async fn test_lock_unlock_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = controller(&dir);
    let input: &[u8] = b"com.apple.screenIsLocked\ncom.apple.screenIsUnlocked\n";
    let mut source = LineEventSource::new(input, NotificationNames::default());

    let result = run_bridge(&mut source, &mut controller).await;

    assert!(matches!(result, Err(Error::EventSource(_))));
    assert_eq!(
        controller.bus().toggles(),
        vec![
            Toggle::new(0x2109, 0x0813, &[2, 1], 3, false),
            Toggle::new(0x2109, 0x0813, &[2, 1], 3, true),
        ]
    );
    assert!(!controller.save_file().exists());
}

#[tokio::test]
async fn test_lock_leaves_restore_pending() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = controller(&dir);
    let input: &[u8] = b"locked\n";
    let mut source = LineEventSource::new(input, NotificationNames::default());

    let _ = run_bridge(&mut source, &mut controller).await;

    assert!(controller.save_file().exists());
}

#[tokio::test]
async fn test_handler_failure_ends_bridge() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = controller(&dir);
    std::fs::write(controller.save_file().path(), "not json").unwrap();
    let input: &[u8] = b"unlocked\nlocked\n";
    let mut source = LineEventSource::new(input, NotificationNames::default());

    let result = run_bridge(&mut source, &mut controller).await;

    assert!(matches!(result, Err(Error::State(_))));
    assert!(controller.bus().toggles().is_empty());
}

#[tokio::test]
async fn test_custom_notification_names() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = controller(&dir);
    let names = NotificationNames {
        locked: vec!["LockedHint=true".to_string()],
        unlocked: vec!["LockedHint=false".to_string()],
    };
    let input: &[u8] = b"session LockedHint=true\nlocked\n";
    let mut source = LineEventSource::new(input, names);

    let _ = run_bridge(&mut source, &mut controller).await;

    assert_eq!(
        controller.bus().toggles(),
        vec![Toggle::new(0x2109, 0x0813, &[2, 1], 3, false)]
    );
}
