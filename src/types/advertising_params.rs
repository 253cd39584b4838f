//! Parameters for the LE Set Advertising Parameters command.

use super::AdvertisingInterval;
use crate::BdAddr;

/// Advertising packet type (Vol 2, Part E, Section 7.8.5).
///
/// Directed advertising types are not produced by this crate: the peripheral
/// only advertises undirected, picking the connectable variant from the GAP
/// configuration.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvertisingType {
    /// Connectable undirected advertising (ADV_IND).
    ConnectableUndirected = 0x00,
    /// Connectable high duty cycle directed advertising (ADV_DIRECT_IND).
    ConnectableDirectedHighDutyCycle = 0x01,
    /// Scannable undirected advertising (ADV_SCAN_IND).
    ScannableUndirected = 0x02,
    /// Non-connectable undirected advertising (ADV_NONCONN_IND).
    NonConnectableUndirected = 0x03,
}

/// Address type the controller advertises with.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OwnAddressType {
    /// The controller's public device address.
    Public = 0x00,
    /// The random address set by LE Set Random Address.
    Random = 0x01,
}

/// Address type of the peer, for directed advertising.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PeerAddressType {
    /// Public device address.
    Public = 0x00,
    /// Random device address.
    Random = 0x01,
}

/// Bitmap of advertising channels (37, 38, 39).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvertisingChannels(pub u8);

impl AdvertisingChannels {
    /// Channel 37.
    pub const CH_37: AdvertisingChannels = AdvertisingChannels(0x01);
    /// Channel 38.
    pub const CH_38: AdvertisingChannels = AdvertisingChannels(0x02);
    /// Channel 39.
    pub const CH_39: AdvertisingChannels = AdvertisingChannels(0x04);
    /// All three advertising channels.
    pub const ALL: AdvertisingChannels = AdvertisingChannels(0x07);
}

/// Processing of scan and connection requests from devices not on the white
/// list.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvertisingFilterPolicy {
    /// Process requests from all devices.
    AllDevices = 0x00,
    /// White list scan requests, allow all connection requests.
    WhiteListScan = 0x01,
    /// Allow all scan requests, white list connection requests.
    WhiteListConnect = 0x02,
    /// White list both scan and connection requests.
    WhiteListAll = 0x03,
}

/// Full parameter block for the LE Set Advertising Parameters command.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AdvertisingParameters {
    /// Requested advertising interval range.
    pub interval: AdvertisingInterval,
    /// Advertising packet type.
    pub advertising_type: AdvertisingType,
    /// Address type the controller advertises with.
    pub own_address_type: OwnAddressType,
    /// Peer address type; only meaningful for directed advertising.
    pub peer_address_type: PeerAddressType,
    /// Peer address; [`BdAddr::NULL`] for undirected advertising.
    pub peer_address: BdAddr,
    /// Channels to advertise on.
    pub channels: AdvertisingChannels,
    /// White list filtering for scan and connection requests.
    pub filter_policy: AdvertisingFilterPolicy,
}

impl AdvertisingParameters {
    /// Serialized parameter length.
    pub const LENGTH: usize = AdvertisingInterval::LENGTH + 11;

    /// Serializes the parameters into the first
    /// [`LENGTH`](Self::LENGTH) bytes of `bytes`, in command packet order.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than [`LENGTH`](Self::LENGTH).
    pub fn copy_into_slice(&self, bytes: &mut [u8]) {
        self.interval.copy_into_slice(&mut bytes[0..4]);
        bytes[4] = self.advertising_type as u8;
        bytes[5] = self.own_address_type as u8;
        bytes[6] = self.peer_address_type as u8;
        bytes[7..13].copy_from_slice(&self.peer_address.0);
        bytes[13] = self.channels.0;
        bytes[14] = self.filter_policy as u8;
    }
}
