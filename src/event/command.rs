//! The Command Complete event and per-command return parameters.
//!
//! Correlation with the command that caused the event is by opcode value:
//! [`ReturnParameters::opcode`] exposes the embedded opcode so the state
//! machine can compare it against its own pending-command marker.

use super::{require_len, require_len_at_least, to_status, Error};
use crate::opcode::{self, Opcode};
use crate::{BdAddr, Status};
use byteorder::{ByteOrder, LittleEndian};

/// The Command Complete event (Vol 2, Part E, Section 7.7.14), carrying the
/// return status of a previously issued command.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandComplete {
    /// Number of HCI command packets the host may send. Zero means the
    /// controller wants the host to pause.
    pub num_hci_command_packets: u8,

    /// Return parameters of the completed command, tagged with the command
    /// that produced them.
    pub return_params: ReturnParameters,
}

impl CommandComplete {
    /// Deserializes the event from its parameter bytes.
    ///
    /// # Errors
    ///
    /// - [`Error::BadLength`] if the buffer cannot hold the packet count and
    ///   opcode, or a specific command's parameters are the wrong size.
    /// - [`Error::UnknownOpcode`] for opcodes outside the command table.
    /// - [`Error::BadStatus`] for unrecognized status bytes.
    pub fn new(bytes: &[u8]) -> Result<CommandComplete, Error> {
        require_len_at_least!(bytes, 3);

        let params = &bytes[3..];
        let return_params = match Opcode(LittleEndian::read_u16(&bytes[1..])) {
            Opcode(0x0000) => ReturnParameters::Spontaneous,
            opcode::SET_EVENT_MASK => ReturnParameters::SetEventMask(one_status(params)?),
            opcode::RESET => ReturnParameters::Reset(one_status(params)?),
            opcode::READ_BD_ADDR => ReturnParameters::ReadBdAddr(to_read_bd_addr(params)?),
            opcode::LE_SET_ADVERTISING_PARAMETERS => {
                ReturnParameters::LeSetAdvertisingParameters(one_status(params)?)
            }
            opcode::LE_SET_ADVERTISING_DATA => {
                ReturnParameters::LeSetAdvertisingData(one_status(params)?)
            }
            opcode::LE_SET_SCAN_RESPONSE_DATA => {
                ReturnParameters::LeSetScanResponseData(one_status(params)?)
            }
            opcode::LE_SET_ADVERTISE_ENABLE => {
                ReturnParameters::LeSetAdvertiseEnable(one_status(params)?)
            }
            other => return Err(Error::UnknownOpcode(other)),
        };
        Ok(CommandComplete {
            num_hci_command_packets: bytes[0],
            return_params,
        })
    }
}

/// Return parameters of the commands that generate Command Complete.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReturnParameters {
    /// Unsolicited event the controller sends to change the number of
    /// outstanding command packets the host may have.
    Spontaneous,

    /// Status of the Set Event Mask command.
    SetEventMask(Status),

    /// Status of the Reset command.
    Reset(Status),

    /// Status and address returned by the Read BD_ADDR command.
    ReadBdAddr(ReadBdAddr),

    /// Status of the LE Set Advertising Parameters command.
    LeSetAdvertisingParameters(Status),

    /// Status of the LE Set Advertising Data command.
    LeSetAdvertisingData(Status),

    /// Status of the LE Set Scan Response Data command.
    LeSetScanResponseData(Status),

    /// Status of the LE Set Advertise Enable command.
    LeSetAdvertiseEnable(Status),
}

impl ReturnParameters {
    /// The opcode of the command these parameters belong to, or `None` for a
    /// spontaneous event.
    pub fn opcode(&self) -> Option<Opcode> {
        match self {
            ReturnParameters::Spontaneous => None,
            ReturnParameters::SetEventMask(_) => Some(opcode::SET_EVENT_MASK),
            ReturnParameters::Reset(_) => Some(opcode::RESET),
            ReturnParameters::ReadBdAddr(_) => Some(opcode::READ_BD_ADDR),
            ReturnParameters::LeSetAdvertisingParameters(_) => {
                Some(opcode::LE_SET_ADVERTISING_PARAMETERS)
            }
            ReturnParameters::LeSetAdvertisingData(_) => Some(opcode::LE_SET_ADVERTISING_DATA),
            ReturnParameters::LeSetScanResponseData(_) => Some(opcode::LE_SET_SCAN_RESPONSE_DATA),
            ReturnParameters::LeSetAdvertiseEnable(_) => Some(opcode::LE_SET_ADVERTISE_ENABLE),
        }
    }

    /// The return status, or `None` for a spontaneous event.
    pub fn status(&self) -> Option<Status> {
        match self {
            ReturnParameters::Spontaneous => None,
            ReturnParameters::SetEventMask(status)
            | ReturnParameters::Reset(status)
            | ReturnParameters::LeSetAdvertisingParameters(status)
            | ReturnParameters::LeSetAdvertisingData(status)
            | ReturnParameters::LeSetScanResponseData(status)
            | ReturnParameters::LeSetAdvertiseEnable(status) => Some(*status),
            ReturnParameters::ReadBdAddr(params) => Some(params.status),
        }
    }
}

fn one_status(bytes: &[u8]) -> Result<Status, Error> {
    require_len!(bytes, 1);
    to_status(bytes[0])
}

/// Return parameters of the Read BD_ADDR command (Section 7.4.6).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReadBdAddr {
    /// Whether the command succeeded.
    pub status: Status,
    /// The controller's public device address.
    pub bd_addr: BdAddr,
}

fn to_read_bd_addr(bytes: &[u8]) -> Result<ReadBdAddr, Error> {
    require_len!(bytes, 7);
    let mut addr = [0; 6];
    addr.copy_from_slice(&bytes[1..]);
    Ok(ReadBdAddr {
        status: to_status(bytes[0])?,
        bd_addr: BdAddr(addr),
    })
}
