//! Host-side interface to the controller: command encoding and packet
//! reading.
//!
//! Every command is a typed method on [`HostHci`], blanket-implemented for any
//! [`Controller`](crate::Controller). The method signature is the command's
//! parameter schema, so a call with the wrong argument count or types does not
//! compile; there is no runtime format description to misread. Serialization
//! writes the packet type byte, the opcode (2 bytes little-endian), the
//! parameter length byte, and the parameters.
//!
//! [`HciRead::read`] performs the inverse classification for inbound traffic,
//! demultiplexing on the leading packet type byte.

use crate::event;
use crate::opcode::{self, Opcode};
use crate::types::{AdvertisingData, AdvertisingParameters};
use crate::{ConnectionHandle, Controller, Status};
use byteorder::{ByteOrder, LittleEndian};

/// Packet type bytes used when commands and events share one transport
/// (Vol 4, Part A, Section 2).
pub mod packet_type {
    /// HCI command, host to controller.
    pub const COMMAND: u8 = 0x01;
    /// ACL data, either direction.
    pub const ACL_DATA: u8 = 0x02;
    /// Synchronous data, either direction.
    pub const SYNC_DATA: u8 = 0x03;
    /// HCI event, controller to host.
    pub const EVENT: u8 = 0x04;
    /// Local stack notification, consumed by out-of-core collaborators.
    pub const STACK_EVENT: u8 = 0x05;
    /// Higher-layer channel data, consumed by out-of-core collaborators.
    pub const CHANNEL_DATA: u8 = 0x06;
}

const COMMAND_HEADER_LENGTH: usize = 4;

/// Event mask for the Set Event Mask command (Vol 2, Part E, Section 7.3.1).
///
/// Bit assignments follow the specification; the value is serialized as 8
/// little-endian bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventMask(pub u64);

impl EventMask {
    /// The controller's reset default (all pre-4.0 events enabled).
    pub const DEFAULT: EventMask = EventMask(0x0000_1FFF_FFFF_FFFF);
}

/// Errors that may occur when exchanging packets with the controller.
/// Specialized on the transport's communication error type.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// For the Disconnect command: the provided reason is not a valid
    /// disconnection reason. Includes the rejected reason.
    BadDisconnectionReason(Status),

    /// The next inbound byte is not a packet type this crate consumes.
    /// Contains the value of the byte.
    BadPacketType(u8),

    /// An inbound event failed to deserialize. Contains the underlying error.
    Event(event::Error),

    /// Underlying communication error.
    Comm(E),
}

/// Packets that may be read from the controller.
///
/// ACL and synchronous data belong to the L2CAP collaborator and are reported
/// as [`Error::BadPacketType`] rather than consumed here.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Packet {
    /// An HCI event, already parsed.
    Event(crate::Event),
}

fn rewrap_as_comm<E>(err: nb::Error<E>) -> nb::Error<Error<E>> {
    match err {
        nb::Error::WouldBlock => nb::Error::WouldBlock,
        nb::Error::Other(e) => nb::Error::Other(Error::Comm(e)),
    }
}

fn write_command<T, E>(
    controller: &mut T,
    opcode: Opcode,
    params: &[u8],
) -> nb::Result<(), Error<E>>
where
    T: Controller<Error = E>,
{
    let mut header = [0; COMMAND_HEADER_LENGTH];
    header[0] = packet_type::COMMAND;
    LittleEndian::write_u16(&mut header[1..3], opcode.0);
    header[3] = params.len() as u8;
    controller.write(&header, params).map_err(rewrap_as_comm)
}

/// Serializes an [`AdvertisingData`] payload into the fixed-size parameter
/// block shared by LE Set Advertising Data and LE Set Scan Response Data:
/// significant length (1 byte) followed by 31 data bytes, zero padded.
fn advertising_data_params(data: &AdvertisingData) -> [u8; 32] {
    let mut params = [0; 32];
    params[0] = data.len() as u8;
    params[1..1 + data.len()].copy_from_slice(data.as_bytes());
    params
}

/// Trait defining the commands the host sends to the controller.
///
/// Implemented for every [`Controller`](crate::Controller). Methods return
/// `nb::Error::WouldBlock` when the controller cannot accept a command packet
/// right now.
pub trait HostHci<E> {
    /// Terminates an existing connection (Section 7.1.6).
    ///
    /// Completion is signaled by a Command Status event immediately and a
    /// Disconnection Complete event when the link is down.
    ///
    /// # Errors
    ///
    /// - [`Error::BadDisconnectionReason`] if `reason` is not one of the
    ///   reasons the spec allows the host to give.
    /// - Underlying communication errors.
    fn disconnect(
        &mut self,
        conn_handle: ConnectionHandle,
        reason: Status,
    ) -> nb::Result<(), Error<E>>;

    /// Controls which events the controller generates (Section 7.3.1).
    fn set_event_mask(&mut self, mask: EventMask) -> nb::Result<(), Error<E>>;

    /// Resets the controller's link manager and link layer (Section 7.3.2).
    fn reset(&mut self) -> nb::Result<(), Error<E>>;

    /// Reads the controller's public device address (Section 7.4.6).
    fn read_bd_addr(&mut self) -> nb::Result<(), Error<E>>;

    /// Sets the advertising parameters (Section 7.8.5).
    ///
    /// Shall not be issued while advertising is enabled; the advertising
    /// state machine guarantees this ordering.
    fn le_set_advertising_parameters(
        &mut self,
        params: &AdvertisingParameters,
    ) -> nb::Result<(), Error<E>>;

    /// Sets the data carried in advertising packets (Section 7.8.7).
    fn le_set_advertising_data(&mut self, data: &AdvertisingData) -> nb::Result<(), Error<E>>;

    /// Sets the data returned in scan response packets (Section 7.8.8).
    fn le_set_scan_response_data(&mut self, data: &AdvertisingData) -> nb::Result<(), Error<E>>;

    /// Starts or stops advertising (Section 7.8.9).
    fn le_set_advertise_enable(&mut self, enable: bool) -> nb::Result<(), Error<E>>;
}

impl<E, T> HostHci<E> for T
where
    T: Controller<Error = E>,
{
    fn disconnect(
        &mut self,
        conn_handle: ConnectionHandle,
        reason: Status,
    ) -> nb::Result<(), Error<E>> {
        match reason {
            Status::AuthFailure
            | Status::RemoteTerminationByUser
            | Status::RemoteTerminationLowResources
            | Status::RemoteTerminationPowerOff
            | Status::UnsupportedRemoteFeature
            | Status::PairingWithUnitKeyNotSupported
            | Status::UnacceptableConnectionParameters => (),
            _ => return Err(nb::Error::Other(Error::BadDisconnectionReason(reason))),
        }

        let mut params = [0; 3];
        LittleEndian::write_u16(&mut params[0..], conn_handle.0);
        params[2] = reason as u8;
        write_command(self, opcode::DISCONNECT, &params)
    }

    fn set_event_mask(&mut self, mask: EventMask) -> nb::Result<(), Error<E>> {
        let mut params = [0; 8];
        LittleEndian::write_u64(&mut params, mask.0);
        write_command(self, opcode::SET_EVENT_MASK, &params)
    }

    fn reset(&mut self) -> nb::Result<(), Error<E>> {
        write_command(self, opcode::RESET, &[])
    }

    fn read_bd_addr(&mut self) -> nb::Result<(), Error<E>> {
        write_command(self, opcode::READ_BD_ADDR, &[])
    }

    fn le_set_advertising_parameters(
        &mut self,
        params: &AdvertisingParameters,
    ) -> nb::Result<(), Error<E>> {
        let mut bytes = [0; AdvertisingParameters::LENGTH];
        params.copy_into_slice(&mut bytes);
        write_command(self, opcode::LE_SET_ADVERTISING_PARAMETERS, &bytes)
    }

    fn le_set_advertising_data(&mut self, data: &AdvertisingData) -> nb::Result<(), Error<E>> {
        write_command(
            self,
            opcode::LE_SET_ADVERTISING_DATA,
            &advertising_data_params(data),
        )
    }

    fn le_set_scan_response_data(&mut self, data: &AdvertisingData) -> nb::Result<(), Error<E>> {
        write_command(
            self,
            opcode::LE_SET_SCAN_RESPONSE_DATA,
            &advertising_data_params(data),
        )
    }

    fn le_set_advertise_enable(&mut self, enable: bool) -> nb::Result<(), Error<E>> {
        write_command(self, opcode::LE_SET_ADVERTISE_ENABLE, &[enable as u8])
    }
}

/// Trait for reading packets back from the controller.
///
/// Implemented for every [`Controller`](crate::Controller).
pub trait HciRead<E> {
    /// Reads and returns one packet, consuming exactly the bytes of that
    /// packet, header included.
    ///
    /// # Errors
    ///
    /// - `nb::Error::WouldBlock` if a full packet is not available yet.
    /// - [`Error::BadPacketType`] if the next byte does not announce a packet
    ///   this crate consumes. No bytes are consumed in that case.
    /// - [`Error::Event`] if the event payload fails to deserialize; the
    ///   packet's bytes are consumed.
    /// - [`Error::Comm`] for transport errors.
    fn read(&mut self) -> nb::Result<Packet, Error<E>>;
}

fn read_event<T, E>(controller: &mut T) -> nb::Result<crate::Event, Error<E>>
where
    T: Controller<Error = E>,
{
    const MAX_EVENT_LENGTH: usize = 255;
    const PACKET_TYPE_LENGTH: usize = 1;
    const EVENT_PACKET_HEADER_LENGTH: usize = 3;
    const PARAM_LEN_BYTE: usize = 2;

    let param_len = controller.peek(PARAM_LEN_BYTE).map_err(rewrap_as_comm)? as usize;

    let mut buf = [0; MAX_EVENT_LENGTH + EVENT_PACKET_HEADER_LENGTH];
    controller
        .read_into(&mut buf[..EVENT_PACKET_HEADER_LENGTH + param_len])
        .map_err(rewrap_as_comm)?;

    event::Event::new(event::Packet(
        &buf[PACKET_TYPE_LENGTH..EVENT_PACKET_HEADER_LENGTH + param_len],
    ))
    .map_err(|e| nb::Error::Other(Error::Event(e)))
}

impl<E, T> HciRead<E> for T
where
    T: Controller<Error = E>,
{
    fn read(&mut self) -> nb::Result<Packet, Error<E>> {
        match self.peek(0).map_err(rewrap_as_comm)? {
            packet_type::EVENT => Ok(Packet::Event(read_event(self)?)),
            x => Err(nb::Error::Other(Error::BadPacketType(x))),
        }
    }
}
