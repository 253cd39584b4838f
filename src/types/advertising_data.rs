//! Advertising and scan response payloads.

use byteorder::{ByteOrder, LittleEndian};
use heapless::Vec;

/// Maximum payload of a legacy advertising or scan response packet.
pub const MAX_PAYLOAD_LENGTH: usize = 31;

/// A single AD structure, as defined in the Core Specification Supplement,
/// Part A.
///
/// Serialized as `length (1) | type (1) | data`, where `length` covers the
/// type byte and the data.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdStructure<'a> {
    /// Advertising flags (LE General Discoverable, BR/EDR Not Supported, ...).
    Flags(u8),
    /// Incomplete list of 16-bit service UUIDs.
    IncompleteListOf16BitUuids(&'a [u16]),
    /// Complete local name of the device.
    CompleteLocalName(&'a str),
    /// Service data keyed by a 16-bit UUID.
    ServiceData16BitUuid(u16, &'a [u8]),
    /// Manufacturer-specific data, keyed by the company identifier.
    ManufacturerSpecificData(u16, &'a [u8]),
}

mod data_type {
    pub const FLAGS: u8 = 0x01;
    pub const INCOMPLETE_LIST_OF_16_BIT_UUIDS: u8 = 0x02;
    pub const COMPLETE_LOCAL_NAME: u8 = 0x09;
    pub const SERVICE_DATA_16_BIT_UUID: u8 = 0x16;
    pub const MANUFACTURER_SPECIFIC_DATA: u8 = 0xFF;
}

impl AdStructure<'_> {
    /// Serialized length, including the length byte.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        use AdStructure::*;
        2 + match self {
            Flags(_) => 1,
            IncompleteListOf16BitUuids(u) => 2 * u.len(),
            CompleteLocalName(n) => n.len(),
            ServiceData16BitUuid(_, b) | ManufacturerSpecificData(_, b) => 2 + b.len(),
        }
    }

    fn data_type(&self) -> u8 {
        use AdStructure::*;
        match self {
            Flags(_) => data_type::FLAGS,
            IncompleteListOf16BitUuids(_) => data_type::INCOMPLETE_LIST_OF_16_BIT_UUIDS,
            CompleteLocalName(_) => data_type::COMPLETE_LOCAL_NAME,
            ServiceData16BitUuid(_, _) => data_type::SERVICE_DATA_16_BIT_UUID,
            ManufacturerSpecificData(_, _) => data_type::MANUFACTURER_SPECIFIC_DATA,
        }
    }

    /// Serializes the structure into `bytes` and returns the number of bytes
    /// written.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than [`AdStructure::len`].
    pub fn copy_into_slice(&self, bytes: &mut [u8]) -> usize {
        use AdStructure::*;
        let len = self.len();
        // The length byte does not count itself.
        bytes[0] = (len - 1) as u8;
        bytes[1] = self.data_type();
        match self {
            Flags(f) => bytes[2] = *f,
            IncompleteListOf16BitUuids(uuids) => {
                for (i, uuid) in uuids.iter().enumerate() {
                    LittleEndian::write_u16(&mut bytes[2 + 2 * i..], *uuid);
                }
            }
            CompleteLocalName(n) => bytes[2..2 + n.len()].copy_from_slice(n.as_bytes()),
            ServiceData16BitUuid(u, b) | ManufacturerSpecificData(u, b) => {
                LittleEndian::write_u16(&mut bytes[2..], *u);
                bytes[4..4 + b.len()].copy_from_slice(b);
            }
        }
        len
    }
}

/// Errors building an [`AdvertisingData`] payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvertisingDataError {
    /// The payload would exceed [`MAX_PAYLOAD_LENGTH`] bytes. Contains the
    /// length the payload would have had.
    TooLong(usize),
}

/// Payload for the LE Set Advertising Data and LE Set Scan Response Data
/// commands.
///
/// Holds up to [`MAX_PAYLOAD_LENGTH`] bytes of AD structures. The command
/// encoder pads the payload with zeroes to the fixed parameter size the
/// controller expects.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvertisingData {
    payload: Vec<u8, MAX_PAYLOAD_LENGTH>,
}

impl AdvertisingData {
    /// An empty payload. Valid for scan responses that carry no data.
    pub fn empty() -> AdvertisingData {
        AdvertisingData::default()
    }

    /// Builds a payload from raw, already-structured bytes.
    ///
    /// # Errors
    ///
    /// - [`TooLong`](AdvertisingDataError::TooLong) if `bytes` exceeds
    ///   [`MAX_PAYLOAD_LENGTH`].
    pub fn from_bytes(bytes: &[u8]) -> Result<AdvertisingData, AdvertisingDataError> {
        let payload =
            Vec::from_slice(bytes).map_err(|_| AdvertisingDataError::TooLong(bytes.len()))?;
        Ok(AdvertisingData { payload })
    }

    /// Appends one AD structure to the payload.
    ///
    /// # Errors
    ///
    /// - [`TooLong`](AdvertisingDataError::TooLong) if the structure does not
    ///   fit in the remaining space.
    pub fn push(&mut self, ad: AdStructure) -> Result<(), AdvertisingDataError> {
        let new_len = self.payload.len() + ad.len();
        if new_len > MAX_PAYLOAD_LENGTH {
            return Err(AdvertisingDataError::TooLong(new_len));
        }
        let mut buf = [0; MAX_PAYLOAD_LENGTH];
        let written = ad.copy_into_slice(&mut buf);
        self.payload
            .extend_from_slice(&buf[..written])
            .expect("length checked above");
        Ok(())
    }

    /// The serialized payload, without padding.
    pub fn as_bytes(&self) -> &[u8] {
        &self.payload
    }

    /// Significant length of the payload.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.payload.len()
    }
}

