extern crate ble_peripheral as ble;

mod support;

use ble::att::{
    ClientConfiguration, ValueNotifier, WriteOutcome, WriteRequest, AttributeHandle,
    CLIENT_CONFIGURATION_HANDLE, COUNTER_VALUE_HANDLE,
};
use support::{FakeAttServer, Sent};

fn subscribed(configuration: u8) -> ValueNotifier {
    let mut notifier = ValueNotifier::new(COUNTER_VALUE_HANDLE);
    let outcome = notifier.handle_write(WriteRequest {
        handle: CLIENT_CONFIGURATION_HANDLE,
        value: &[configuration, 0x00],
    });
    assert_eq!(outcome, WriteOutcome::Accepted);
    notifier
}

#[test]
fn no_subscription_no_updates() {
    let mut notifier = ValueNotifier::new(COUNTER_VALUE_HANDLE);
    let mut att = FakeAttServer::new();

    notifier.tick();
    notifier.tick();
    assert!(!notifier.update_pending());
    assert!(!notifier.flush(&mut att));
    assert!(att.sent.is_empty());
    assert_eq!(notifier.counter(), 2);
}

#[test]
fn notify_carries_the_counter_value() {
    let mut notifier = subscribed(0x01);
    let mut att = FakeAttServer::new();

    notifier.tick();
    assert!(notifier.flush(&mut att));
    assert_eq!(
        att.sent,
        [Sent::Notification(COUNTER_VALUE_HANDLE, vec![1])]
    );
    assert!(!notifier.update_pending());
}

#[test]
fn indicate_subscription_uses_indications() {
    let mut notifier = subscribed(0x02);
    let mut att = FakeAttServer::new();

    notifier.tick();
    assert!(notifier.flush(&mut att));
    assert_eq!(
        att.sent,
        [Sent::Indication(COUNTER_VALUE_HANDLE, vec![1])]
    );
}

#[test]
fn update_waits_for_capacity() {
    let mut notifier = subscribed(0x01);
    let mut att = FakeAttServer::new();
    att.can_send = false;

    notifier.tick();
    assert!(!notifier.flush(&mut att));
    assert!(notifier.update_pending());
    assert!(att.sent.is_empty());

    att.can_send = true;
    assert!(notifier.flush(&mut att));
    assert_eq!(att.sent.len(), 1);
}

#[test]
fn missed_ticks_collapse_to_latest_value() {
    let mut notifier = subscribed(0x01);
    let mut att = FakeAttServer::new();
    att.can_send = false;

    notifier.tick();
    notifier.tick();
    notifier.tick();
    att.can_send = true;
    assert!(notifier.flush(&mut att));

    // One delivery, carrying the latest counter value.
    assert_eq!(
        att.sent,
        [Sent::Notification(COUNTER_VALUE_HANDLE, vec![3])]
    );
}

#[test]
fn failed_send_is_retried_on_the_next_flush() {
    let mut notifier = subscribed(0x01);
    let mut att = FakeAttServer::new();
    att.fail_with = Some(0x11);

    notifier.tick();
    assert!(!notifier.flush(&mut att));
    assert!(notifier.update_pending());

    att.fail_with = None;
    assert!(notifier.flush(&mut att));
    assert_eq!(
        att.sent,
        [Sent::Notification(COUNTER_VALUE_HANDLE, vec![1])]
    );
    assert!(!notifier.update_pending());
}

#[test]
fn unsubscribe_clears_pending_update() {
    let mut notifier = subscribed(0x01);
    let mut att = FakeAttServer::new();
    att.can_send = false;

    notifier.tick();
    assert!(notifier.update_pending());

    let outcome = notifier.handle_write(WriteRequest {
        handle: CLIENT_CONFIGURATION_HANDLE,
        value: &[0x00, 0x00],
    });
    assert_eq!(outcome, WriteOutcome::Accepted);
    assert_eq!(notifier.configuration(), ClientConfiguration::Off);
    assert!(!notifier.update_pending());

    att.can_send = true;
    assert!(!notifier.flush(&mut att));
    assert!(att.sent.is_empty());
}

#[test]
fn single_byte_configuration_write_is_accepted() {
    let mut notifier = ValueNotifier::new(COUNTER_VALUE_HANDLE);
    let outcome = notifier.handle_write(WriteRequest {
        handle: CLIENT_CONFIGURATION_HANDLE,
        value: &[0x01],
    });
    assert_eq!(outcome, WriteOutcome::Accepted);
    assert_eq!(notifier.configuration(), ClientConfiguration::Notify);
}

#[test]
fn write_to_other_handle_is_ignored() {
    let mut notifier = ValueNotifier::new(COUNTER_VALUE_HANDLE);
    let outcome = notifier.handle_write(WriteRequest {
        handle: AttributeHandle(0x0042),
        value: &[0x01, 0x00],
    });
    assert_eq!(outcome, WriteOutcome::Accepted);
    assert_eq!(notifier.configuration(), ClientConfiguration::Off);
}

#[test]
fn malformed_configuration_write_is_rejected() {
    let mut notifier = subscribed(0x01);

    for value in [&[][..], &[0x03][..], &[0x01, 0x01][..], &[0x01, 0x00, 0x00][..]] {
        let outcome = notifier.handle_write(WriteRequest {
            handle: CLIENT_CONFIGURATION_HANDLE,
            value,
        });
        assert_eq!(outcome, WriteOutcome::Rejected, "value {:?}", value);
    }
    // The subscription survives rejected writes.
    assert_eq!(notifier.configuration(), ClientConfiguration::Notify);
}
