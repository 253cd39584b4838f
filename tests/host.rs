extern crate ble_peripheral as ble;

mod support;

use ble::host::*;
use ble::types::*;
use core::time::Duration;
use support::RecordingSink;

#[test]
fn disconnect() {
    let mut sink = RecordingSink::new();
    sink.disconnect(ble::ConnectionHandle(0x0201), ble::Status::AuthFailure)
        .unwrap();
    assert_eq!(sink.written_data, [1, 0x06, 0x04, 3, 0x01, 0x02, 0x05]);
}

#[test]
fn disconnect_bad_reason() {
    let mut sink = RecordingSink::new();
    let err = sink
        .disconnect(ble::ConnectionHandle(0x0201), ble::Status::UnknownCommand)
        .err()
        .unwrap();
    assert_eq!(
        err,
        nb::Error::Other(Error::BadDisconnectionReason(ble::Status::UnknownCommand))
    );
    assert_eq!(sink.written_data, []);
}

macro_rules! no_params {
    {
        $($(#[$inner:ident $($args:tt)*])*
        $fn:ident($oc0:expr, $oc1:expr);)*
    } => {
        $(
            $(#[$inner $($args)*])*
            #[test]
            fn $fn() {
                let mut sink = RecordingSink::new();
                sink.$fn().unwrap();
                assert_eq!(sink.written_data, [1, $oc0, $oc1, 0]);
            }
        )*
    }
}

no_params! {
    reset(0x03, 0x0C);
    read_bd_addr(0x09, 0x10);
}

#[test]
fn set_event_mask() {
    let mut sink = RecordingSink::new();
    sink.set_event_mask(EventMask(0x8000_0000_0000_1F90))
        .unwrap();
    assert_eq!(
        sink.written_data,
        [1, 0x01, 0x0C, 8, 0x90, 0x1F, 0x00, 0x00, 0x00, 0x00, 0x00, 0x80]
    );
}

#[test]
fn set_event_mask_default() {
    let mut sink = RecordingSink::new();
    sink.set_event_mask(EventMask::DEFAULT).unwrap();
    assert_eq!(
        sink.written_data,
        [1, 0x01, 0x0C, 8, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x1F, 0x00, 0x00]
    );
}

#[test]
fn le_set_advertising_parameters() {
    let mut sink = RecordingSink::new();
    sink.le_set_advertising_parameters(&AdvertisingParameters {
        interval: AdvertisingInterval::with_range(
            Duration::from_millis(1280),
            Duration::from_millis(1280),
        )
        .unwrap(),
        advertising_type: AdvertisingType::ConnectableUndirected,
        own_address_type: OwnAddressType::Public,
        peer_address_type: PeerAddressType::Public,
        peer_address: ble::BdAddr::NULL,
        channels: AdvertisingChannels::ALL,
        filter_policy: AdvertisingFilterPolicy::AllDevices,
    })
    .unwrap();
    assert_eq!(
        sink.written_data,
        [
            1, 0x06, 0x20, 15, // interval min/max: 1.28 s = 0x0800 units
            0x00, 0x08, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x07,
            0x00
        ]
    );
}

#[test]
fn le_set_advertising_parameters_non_connectable() {
    let mut sink = RecordingSink::new();
    sink.le_set_advertising_parameters(&AdvertisingParameters {
        interval: AdvertisingInterval::default(),
        advertising_type: AdvertisingType::NonConnectableUndirected,
        own_address_type: OwnAddressType::Public,
        peer_address_type: PeerAddressType::Public,
        peer_address: ble::BdAddr::NULL,
        channels: AdvertisingChannels::ALL,
        filter_policy: AdvertisingFilterPolicy::AllDevices,
    })
    .unwrap();
    assert_eq!(sink.written_data[4 + 4], 0x03);
}

#[test]
fn le_set_advertising_data_pads_to_fixed_length() {
    let mut sink = RecordingSink::new();
    let mut data = AdvertisingData::empty();
    data.push(AdStructure::Flags(0x06)).unwrap();
    sink.le_set_advertising_data(&data).unwrap();

    let mut expected = vec![1, 0x08, 0x20, 32, 3, 2, 0x01, 0x06];
    expected.resize(4 + 32, 0);
    assert_eq!(sink.written_data, expected);
}

#[test]
fn le_set_scan_response_data_empty() {
    let mut sink = RecordingSink::new();
    sink.le_set_scan_response_data(&AdvertisingData::empty())
        .unwrap();

    let mut expected = vec![1, 0x09, 0x20, 32];
    expected.resize(4 + 32, 0);
    assert_eq!(sink.written_data, expected);
}

#[test]
fn le_set_advertise_enable() {
    let mut sink = RecordingSink::new();
    sink.le_set_advertise_enable(true).unwrap();
    assert_eq!(sink.written_data, [1, 0x0A, 0x20, 1, 0x01]);
}

#[test]
fn le_set_advertise_disable() {
    let mut sink = RecordingSink::new();
    sink.le_set_advertise_enable(false).unwrap();
    assert_eq!(sink.written_data, [1, 0x0A, 0x20, 1, 0x00]);
}

#[test]
fn read_consumes_exactly_one_event_packet() {
    let mut sink = RecordingSink::new();
    sink.inject(&[0x04, 0x10, 0x01, 0x42]); // hardware error
    sink.inject(&[0x04, 0x10, 0x01, 0x43]);
    match sink.read() {
        Ok(Packet::Event(ble::Event::HardwareError(code))) => assert_eq!(code, 0x42),
        other => panic!("Did not get hardware error: {:?}", other),
    }
    match sink.read() {
        Ok(Packet::Event(ble::Event::HardwareError(code))) => assert_eq!(code, 0x43),
        other => panic!("Did not get hardware error: {:?}", other),
    }
    assert_eq!(sink.read(), Err(nb::Error::WouldBlock));
}

#[test]
fn read_partial_packet_would_block() {
    let mut sink = RecordingSink::new();
    sink.inject(&[0x04, 0x10]); // param length byte not arrived yet
    assert_eq!(sink.read(), Err(nb::Error::WouldBlock));
    sink.inject(&[0x01]);
    assert_eq!(sink.read(), Err(nb::Error::WouldBlock));
    sink.inject(&[0x42]);
    match sink.read() {
        Ok(Packet::Event(ble::Event::HardwareError(code))) => assert_eq!(code, 0x42),
        other => panic!("Did not get hardware error: {:?}", other),
    }
}

#[test]
fn read_foreign_packet_type_left_unconsumed() {
    let mut sink = RecordingSink::new();
    sink.inject(&[0x02, 0x01, 0x02, 0x00, 0x00]); // ACL data header
    match sink.read() {
        Err(nb::Error::Other(Error::BadPacketType(t))) => assert_eq!(t, 0x02),
        other => panic!("Did not get bad packet type: {:?}", other),
    }
    // Nothing consumed: the same error repeats.
    match sink.read() {
        Err(nb::Error::Other(Error::BadPacketType(t))) => assert_eq!(t, 0x02),
        other => panic!("Did not get bad packet type: {:?}", other),
    }
}
