//! Parsing of HCI event packets into a closed set of event variants.
//!
//! The dispatcher never indexes into raw buffers outside this module: every
//! event the control plane reacts to is parsed here into a typed variant, and
//! everything else surfaces as [`Error::UnknownEvent`], which callers treat as
//! ignorable noise.

pub mod command;

use crate::opcode::Opcode;
use crate::{ConnectionHandle, Status};
use byteorder::{ByteOrder, LittleEndian};
use num_enum::TryFromPrimitive;

/// A buffer containing one event packet: event code, parameter length, and
/// parameters, without the leading packet type byte.
pub struct Packet<'a>(pub &'a [u8]);

/// Length of the event code and parameter length fields.
pub const PACKET_HEADER_LENGTH: usize = 2;

mod code {
    pub const DISCONNECTION_COMPLETE: u8 = 0x05;
    pub const COMMAND_COMPLETE: u8 = 0x0E;
    pub const COMMAND_STATUS: u8 = 0x0F;
    pub const HARDWARE_ERROR: u8 = 0x10;
    pub const LE_META: u8 = 0x3E;

    // Local state-change notification, delivered in-band by the stack rather
    // than by the controller.
    pub const STACK_STATE: u8 = 0x60;

    pub const LE_SUBEVENT_CONNECTION_COMPLETE: u8 = 0x01;
}

macro_rules! require_len {
    ($left:expr, $right:expr) => {
        if $left.len() != $right {
            return Err(Error::BadLength($left.len(), $right));
        }
    };
}

macro_rules! require_len_at_least {
    ($left:expr, $right:expr) => {
        if $left.len() < $right {
            return Err(Error::BadLength($left.len(), $right));
        }
    };
}

pub(crate) use {require_len, require_len_at_least};

/// Errors deserializing an event packet.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The event code is not recognized. Unknown events are dropped by the
    /// dispatcher, not treated as failures.
    UnknownEvent(u8),
    /// The LE Meta event carried an unrecognized subevent code.
    UnknownLeSubevent(u8),
    /// The buffer length (first value) did not match the expectation (second
    /// value).
    BadLength(usize, usize),
    /// A status byte does not map to a [`Status`].
    BadStatus(u8),
    /// A Command Complete event carried an opcode this crate does not track.
    UnknownOpcode(Opcode),
    /// The connection role byte was not a valid role.
    BadConnectionRole(u8),
    /// The peer address type byte was not a valid address type.
    BadPeerAddressType(u8),
    /// The stack state notification carried an invalid state value.
    BadStackState(u8),
}

/// Lifecycle of the surrounding stack, as carried by the local state-change
/// notification.
///
/// The advertising bring-up sequence only starts once [`Working`](Self::Working)
/// has been observed.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StackState {
    /// Powered off.
    Off = 0x00,
    /// Power-on and controller initialization in progress.
    Initializing = 0x01,
    /// Initialization finished; commands may be issued.
    Working = 0x02,
    /// Shutdown in progress.
    Halting = 0x03,
}

/// The Command Status event (Vol 2, Part E, Section 7.7.15), sent for
/// commands that complete asynchronously (e.g. Disconnect).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandStatus {
    /// Status of the command in flight.
    pub status: Status,
    /// Number of command packets the host may send to the controller.
    pub num_hci_command_packets: u8,
    /// Opcode of the command the status refers to.
    pub opcode: Opcode,
}

impl CommandStatus {
    const LENGTH: usize = 4;

    fn new(buffer: &[u8]) -> Result<CommandStatus, Error> {
        require_len!(buffer, Self::LENGTH);
        Ok(CommandStatus {
            status: to_status(buffer[0])?,
            num_hci_command_packets: buffer[1],
            opcode: Opcode(LittleEndian::read_u16(&buffer[2..])),
        })
    }
}

/// The Disconnection Complete event (Section 7.7.5).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisconnectionComplete {
    /// Whether the disconnection succeeded.
    pub status: Status,
    /// Handle of the connection that was closed.
    pub conn_handle: ConnectionHandle,
    /// Reason the connection ended, as an error code.
    pub reason: Status,
}

impl DisconnectionComplete {
    const LENGTH: usize = 4;

    fn new(buffer: &[u8]) -> Result<DisconnectionComplete, Error> {
        require_len!(buffer, Self::LENGTH);
        Ok(DisconnectionComplete {
            status: to_status(buffer[0])?,
            conn_handle: ConnectionHandle(LittleEndian::read_u16(&buffer[1..])),
            reason: to_status(buffer[3])?,
        })
    }
}

/// Role of the local device in a new connection.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionRole {
    /// The local device initiated the connection.
    Central = 0x00,
    /// The local device was advertising and accepted the connection.
    Peripheral = 0x01,
}

/// Address type of the peer in a new connection.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PeerAddressType {
    /// Public device address.
    Public = 0x00,
    /// Random device address.
    Random = 0x01,
}

/// The LE Connection Complete event (Section 7.7.65.1), delivered as LE Meta
/// subevent 0x01.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LeConnectionComplete {
    /// Whether the connection was established.
    pub status: Status,
    /// Handle assigned to the new connection.
    pub conn_handle: ConnectionHandle,
    /// Role of the local device.
    pub role: ConnectionRole,
    /// Address type of the peer.
    pub peer_address_type: PeerAddressType,
    /// Address of the peer.
    pub peer_address: crate::BdAddr,
    /// Connection interval, in units of 1.25 ms.
    pub conn_interval: u16,
    /// Peripheral latency, in connection events.
    pub conn_latency: u16,
    /// Supervision timeout, in units of 10 ms.
    pub supervision_timeout: u16,
    /// Central clock accuracy code.
    pub central_clock_accuracy: u8,
}

impl LeConnectionComplete {
    const LENGTH: usize = 18;

    fn new(buffer: &[u8]) -> Result<LeConnectionComplete, Error> {
        require_len!(buffer, Self::LENGTH);
        let mut peer_address = [0; 6];
        peer_address.copy_from_slice(&buffer[5..11]);
        Ok(LeConnectionComplete {
            status: to_status(buffer[0])?,
            conn_handle: ConnectionHandle(LittleEndian::read_u16(&buffer[1..])),
            role: ConnectionRole::try_from(buffer[3])
                .map_err(|e| Error::BadConnectionRole(e.number))?,
            peer_address_type: PeerAddressType::try_from(buffer[4])
                .map_err(|e| Error::BadPeerAddressType(e.number))?,
            peer_address: crate::BdAddr(peer_address),
            conn_interval: LittleEndian::read_u16(&buffer[11..]),
            conn_latency: LittleEndian::read_u16(&buffer[13..]),
            supervision_timeout: LittleEndian::read_u16(&buffer[15..]),
            central_clock_accuracy: buffer[17],
        })
    }
}

/// Events the control plane reacts to.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// A previously issued command finished.
    CommandComplete(command::CommandComplete),
    /// A previously issued command was accepted and will complete through a
    /// dedicated event.
    CommandStatus(CommandStatus),
    /// An ACL connection closed.
    DisconnectionComplete(DisconnectionComplete),
    /// A central connected to us while advertising.
    LeConnectionComplete(LeConnectionComplete),
    /// The controller reported an unrecoverable hardware fault. Carries the
    /// vendor-defined hardware code.
    HardwareError(u8),
    /// The surrounding stack changed its lifecycle state.
    StackState(StackState),
}

impl Event {
    /// Deserializes an event packet.
    ///
    /// # Errors
    ///
    /// - [`Error::BadLength`] if the buffer is shorter than its own header
    ///   claims.
    /// - [`Error::UnknownEvent`] / [`Error::UnknownLeSubevent`] for codes this
    ///   crate does not track.
    /// - Field-level errors from the individual event parsers.
    pub fn new(packet: Packet) -> Result<Event, Error> {
        require_len_at_least!(packet.0, PACKET_HEADER_LENGTH);
        let param_len = packet.0[1] as usize;
        require_len!(packet.0, PACKET_HEADER_LENGTH + param_len);

        let params = &packet.0[PACKET_HEADER_LENGTH..];
        match packet.0[0] {
            code::DISCONNECTION_COMPLETE => Ok(Event::DisconnectionComplete(
                DisconnectionComplete::new(params)?,
            )),
            code::COMMAND_COMPLETE => Ok(Event::CommandComplete(command::CommandComplete::new(
                params,
            )?)),
            code::COMMAND_STATUS => Ok(Event::CommandStatus(CommandStatus::new(params)?)),
            code::HARDWARE_ERROR => {
                require_len!(params, 1);
                Ok(Event::HardwareError(params[0]))
            }
            code::LE_META => {
                require_len_at_least!(params, 1);
                match params[0] {
                    code::LE_SUBEVENT_CONNECTION_COMPLETE => Ok(Event::LeConnectionComplete(
                        LeConnectionComplete::new(&params[1..])?,
                    )),
                    subevent => Err(Error::UnknownLeSubevent(subevent)),
                }
            }
            code::STACK_STATE => {
                require_len!(params, 1);
                StackState::try_from(params[0])
                    .map(Event::StackState)
                    .map_err(|e| Error::BadStackState(e.number))
            }
            other => Err(Error::UnknownEvent(other)),
        }
    }
}

pub(crate) fn to_status(byte: u8) -> Result<Status, Error> {
    Status::try_from(byte).map_err(|e| Error::BadStatus(e.number))
}
