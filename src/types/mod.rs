//! Strongly typed parameter values for advertising commands.
//!
//! Each type validates its invariants at construction and knows how to
//! serialize itself into the parameter section of a command packet, so a
//! malformed command can never be produced at the encoding stage.

mod advertising_data;
mod advertising_interval;
mod advertising_params;

pub use advertising_data::{AdStructure, AdvertisingData, AdvertisingDataError, MAX_PAYLOAD_LENGTH};
pub use advertising_interval::{AdvertisingInterval, AdvertisingIntervalError};
pub use advertising_params::{
    AdvertisingChannels, AdvertisingFilterPolicy, AdvertisingParameters, AdvertisingType,
    OwnAddressType, PeerAddressType,
};
