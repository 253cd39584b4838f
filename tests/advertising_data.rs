extern crate ble_peripheral as ble;

use ble::types::{AdStructure, AdvertisingData, AdvertisingDataError};

#[test]
fn flags_and_uuid_list() {
    let mut data = AdvertisingData::empty();
    data.push(AdStructure::Flags(0x06)).unwrap();
    data.push(AdStructure::IncompleteListOf16BitUuids(&[0x180F, 0x1809]))
        .unwrap();

    assert_eq!(
        data.as_bytes(),
        [2, 0x01, 0x06, 5, 0x02, 0x0F, 0x18, 0x09, 0x18]
    );
}

#[test]
fn complete_local_name() {
    let mut data = AdvertisingData::empty();
    data.push(AdStructure::CompleteLocalName("counter")).unwrap();

    assert_eq!(
        data.as_bytes(),
        [8, 0x09, b'c', b'o', b'u', b'n', b't', b'e', b'r']
    );
}

#[test]
fn service_data() {
    let mut data = AdvertisingData::empty();
    data.push(AdStructure::ServiceData16BitUuid(0x1809, &[0x24, 0x01]))
        .unwrap();

    assert_eq!(data.as_bytes(), [5, 0x16, 0x09, 0x18, 0x24, 0x01]);
}

#[test]
fn manufacturer_specific_data() {
    let mut data = AdvertisingData::empty();
    data.push(AdStructure::ManufacturerSpecificData(0x004C, &[0xAA]))
        .unwrap();

    assert_eq!(data.as_bytes(), [4, 0xFF, 0x4C, 0x00, 0xAA]);
}

#[test]
fn payload_overflow_is_rejected() {
    let mut data = AdvertisingData::empty();
    data.push(AdStructure::CompleteLocalName("a-rather-long-device-name"))
        .unwrap();

    let err = data
        .push(AdStructure::ManufacturerSpecificData(0x004C, &[0; 8]))
        .err()
        .unwrap();
    assert_eq!(err, AdvertisingDataError::TooLong(39));

    // A failed push leaves the payload untouched.
    assert_eq!(data.len(), 27);
}

#[test]
fn exactly_full_payload_is_accepted() {
    let mut data = AdvertisingData::empty();
    data.push(AdStructure::Flags(0x06)).unwrap();
    data.push(AdStructure::ManufacturerSpecificData(0x004C, &[0; 24]))
        .unwrap();
    assert_eq!(data.len(), 31);
}

#[test]
fn from_bytes_checks_length() {
    assert!(AdvertisingData::from_bytes(&[0; 31]).is_ok());
    assert_eq!(
        AdvertisingData::from_bytes(&[0; 32]).err().unwrap(),
        AdvertisingDataError::TooLong(32)
    );
}
