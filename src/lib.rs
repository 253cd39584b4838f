//! Command/event control plane for a Bluetooth Low Energy peripheral.
//!
//! This crate implements the host side of the Host-Controller Interface (HCI)
//! needed to bring a BLE peripheral into an advertising state and keep it
//! there: typed command encoding, event packet demultiplexing, the ordered
//! advertising bring-up sequence (advertising data, scan response data,
//! advertising parameters, advertise enable), and a single-threaded run loop
//! with periodic timers and readiness-polled input sources.
//!
//! # Design
//!
//! Like other core embedded crates (e.g., [`embedded-hal`]), this crate uses
//! traits to stay agnostic about the specific Bluetooth controller and the
//! surrounding stack. The [`Controller`] trait is the byte-pipe seam to the
//! transport driver; the [`att::AttServer`] trait is the seam to the attribute
//! server. Non-blocking operation is expressed with the [`nb`] crate: nothing
//! in this crate blocks except the run loop's own wait primitive, which the
//! embedder supplies through [`runloop::Clock`].
//!
//! Commands are written through the [`host::HostHci`] trait, which has one
//! strongly typed method per command, so argument arity and type errors are
//! impossible to express. Replies and controller-originated events are parsed
//! into the closed [`Event`] enum and routed by [`Peripheral`], which drives
//! the [`gap::Advertiser`] state machine strictly one outstanding command at a
//! time.
//!
//! # Concurrency model
//!
//! Everything runs on one logical thread. Handlers execute to completion in
//! packet-arrival order, and all shared state is mutated only from within that
//! thread, so no locking exists anywhere in the crate. There is no reply
//! timeout layer: a controller that never answers a command stalls the
//! advertising state machine.
//!
//! [`embedded-hal`]: https://crates.io/crates/embedded-hal
//! [`nb`]: https://crates.io/crates/nb

#![no_std]
#![warn(missing_docs)]

#[macro_use]
mod fmt;

pub mod att;
pub mod event;
pub mod gap;
pub mod host;
pub mod opcode;
pub mod peripheral;
pub mod runloop;
pub mod types;

pub use event::Event;
pub use peripheral::Peripheral;

use num_enum::TryFromPrimitive;

/// Interface to the Bluetooth controller from the host's perspective.
///
/// Transport drivers (USB, UART, SPI, ...) implement this trait. All of the
/// command functions of [`host::HostHci`] and the packet reader of
/// [`host::HciRead`] are provided for any implementor.
pub trait Controller {
    /// Communication error produced by the underlying transport.
    type Error;

    /// Writes a complete packet to the controller, in a single transaction if
    /// possible. All of `header` shall be written, followed by all of
    /// `payload`. Returns `nb::Error::WouldBlock` if the controller cannot
    /// accept the packet right now.
    fn write(&mut self, header: &[u8], payload: &[u8]) -> nb::Result<(), Self::Error>;

    /// Reads exactly `buffer.len()` bytes from the controller. Bytes shall be
    /// returned in the order they were received. Returns
    /// `nb::Error::WouldBlock` if that many bytes are not yet available.
    fn read_into(&mut self, buffer: &mut [u8]) -> nb::Result<(), Self::Error>;

    /// Looks ahead at byte `n` of the pending inbound data without consuming
    /// anything. Implementors shall support values of `n` up to 4, enough to
    /// cover the packet type byte and any packet header.
    fn peek(&mut self, n: usize) -> nb::Result<u8, Self::Error>;
}

/// 48-bit device address, in the byte order it appears on the wire.
///
/// The address is copied byte-for-byte into command packets, never swapped.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BdAddr(pub [u8; 6]);

impl BdAddr {
    /// The all-zero address, used as the peer address for undirected
    /// advertising.
    pub const NULL: BdAddr = BdAddr([0; 6]);
}

/// Handle identifying an ACL connection, assigned by the controller.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionHandle(pub u16);

/// HCI error codes, Bluetooth Spec v4.1, Vol 2, Part D, Section 2.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    /// Success
    Success = 0x00,
    /// Unknown HCI Command
    UnknownCommand = 0x01,
    /// Unknown Connection Identifier
    UnknownConnectionId = 0x02,
    /// Hardware Failure
    HardwareFailure = 0x03,
    /// Page Timeout
    PageTimeout = 0x04,
    /// Authentication Failure
    AuthFailure = 0x05,
    /// PIN or Key Missing
    PinOrKeyMissing = 0x06,
    /// Memory Capacity Exceeded
    OutOfMemory = 0x07,
    /// Connection Timeout
    ConnectionTimeout = 0x08,
    /// Connection Limit Exceeded
    ConnectionLimitExceeded = 0x09,
    /// Synchronous Connection Limit To A Device Exceeded
    SyncConnectionLimitExceeded = 0x0A,
    /// Connection Already Exists
    ConnectionAlreadyExists = 0x0B,
    /// Command Disallowed
    CommandDisallowed = 0x0C,
    /// Connection Rejected due to Limited Resources
    LimitedResources = 0x0D,
    /// Connection Rejected Due To Security Reasons
    ConnectionRejectedSecurity = 0x0E,
    /// Connection Rejected due to Unacceptable BD_ADDR
    UnacceptableBdAddr = 0x0F,
    /// Connection Accept Timeout Exceeded
    AcceptTimeoutExceeded = 0x10,
    /// Unsupported Feature or Parameter Value
    UnsupportedFeature = 0x11,
    /// Invalid HCI Command Parameters
    InvalidParameters = 0x12,
    /// Remote User Terminated Connection
    RemoteTerminationByUser = 0x13,
    /// Remote Device Terminated Connection due to Low Resources
    RemoteTerminationLowResources = 0x14,
    /// Remote Device Terminated Connection due to Power Off
    RemoteTerminationPowerOff = 0x15,
    /// Connection Terminated By Local Host
    ConnectionTerminatedByHost = 0x16,
    /// Repeated Attempts
    RepeatedAttempts = 0x17,
    /// Pairing Not Allowed
    PairingNotAllowed = 0x18,
    /// Unknown LMP PDU
    UnknownLmpPdu = 0x19,
    /// Unsupported Remote Feature / Unsupported LMP Feature
    UnsupportedRemoteFeature = 0x1A,
    /// SCO Offset Rejected
    ScoOffsetRejected = 0x1B,
    /// SCO Interval Rejected
    ScoIntervalRejected = 0x1C,
    /// SCO Air Mode Rejected
    ScoAirModeRejected = 0x1D,
    /// Invalid LMP Parameters / Invalid LL Parameters
    InvalidLmpParameters = 0x1E,
    /// Unspecified Error
    UnspecifiedError = 0x1F,
    /// Unsupported LMP Parameter Value / Unsupported LL Parameter Value
    UnsupportedLmpParameterValue = 0x20,
    /// Role Change Not Allowed
    RoleChangeNotAllowed = 0x21,
    /// LMP Response Timeout / LL Response Timeout
    LmpResponseTimeout = 0x22,
    /// LMP Error Transaction Collision / LL Procedure Collision
    LmpTransactionCollision = 0x23,
    /// LMP PDU Not Allowed
    LmpPduNotAllowed = 0x24,
    /// Encryption Mode Not Acceptable
    EncryptionModeNotAcceptable = 0x25,
    /// Link Key cannot be Changed
    LinkKeyCannotBeChanged = 0x26,
    /// Requested QoS Not Supported
    RequestedQosNotSupported = 0x27,
    /// Instant Passed
    InstantPassed = 0x28,
    /// Pairing With Unit Key Not Supported
    PairingWithUnitKeyNotSupported = 0x29,
    /// Different Transaction Collision
    DifferentTransactionCollision = 0x2A,
    /// QoS Unacceptable Parameter
    QosUnacceptableParameter = 0x2C,
    /// QoS Rejected
    QosRejected = 0x2D,
    /// Channel Classification Not Supported
    ChannelClassificationNotSupported = 0x2E,
    /// Insufficient Security
    InsufficientSecurity = 0x2F,
    /// Parameter Out Of Mandatory Range
    ParameterOutOfMandatoryRange = 0x30,
    /// Role Switch Pending
    RoleSwitchPending = 0x32,
    /// Reserved Slot Violation
    ReservedSlotViolation = 0x34,
    /// Role Switch Failed
    RoleSwitchFailed = 0x35,
    /// Extended Inquiry Response Too Large
    ExtendedInquiryResponseTooLarge = 0x36,
    /// Secure Simple Pairing Not Supported By Host
    SecureSimplePairingNotSupportedByHost = 0x37,
    /// Host Busy - Pairing
    HostBusyPairing = 0x38,
    /// Connection Rejected due to No Suitable Channel Found
    ConnectionRejectedNoSuitableChannel = 0x39,
    /// Controller Busy
    ControllerBusy = 0x3A,
    /// Unacceptable Connection Parameters
    UnacceptableConnectionParameters = 0x3B,
    /// Advertising Timeout
    AdvertisingTimeout = 0x3C,
    /// Connection Terminated due to MIC Failure
    ConnectionTerminatedMicFailure = 0x3D,
    /// Connection Failed to be Established
    ConnectionFailedToEstablish = 0x3E,
    /// MAC Connection Failed
    MacConnectionFailed = 0x3F,
    /// Coarse Clock Adjustment Rejected
    CoarseClockAdjustmentRejected = 0x40,
}
