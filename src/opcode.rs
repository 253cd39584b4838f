//! HCI command opcodes.
//!
//! An opcode packs a 6-bit Opcode Group Field and a 10-bit Opcode Command
//! Field into one 16-bit value, serialized little-endian on the wire. The
//! consts in this module are the command table of the control plane: the
//! advertising bring-up commands the state machine branches on, plus the
//! general commands the surrounding stack issues during initialization and
//! connection management.

mod ogf {
    pub const LINK_CONTROL: u16 = 0x0001;
    pub const CONTROLLER_BASEBAND: u16 = 0x0003;
    pub const INFO_PARAM: u16 = 0x0004;
    pub const LE_CONTROLLER: u16 = 0x0008;
}

mod ocf {
    pub const DISCONNECT: u16 = 0x0006;

    pub const SET_EVENT_MASK: u16 = 0x0001;
    pub const RESET: u16 = 0x0003;

    pub const READ_BD_ADDR: u16 = 0x0009;

    pub const LE_SET_ADVERTISING_PARAMETERS: u16 = 0x0006;
    pub const LE_SET_ADVERTISING_DATA: u16 = 0x0008;
    pub const LE_SET_SCAN_RESPONSE_DATA: u16 = 0x0009;
    pub const LE_SET_ADVERTISE_ENABLE: u16 = 0x000A;
}

/// Packed HCI opcode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Opcode(pub u16);

impl Opcode {
    /// Packs an OGF and an OCF into an opcode.
    pub const fn new(ogf: u16, ocf: u16) -> Opcode {
        Opcode((ogf << 10) | (ocf & 0x03FF))
    }

    /// Opcode group field.
    pub fn ogf(&self) -> u16 {
        self.0 >> 10
    }

    /// Opcode command field.
    pub fn ocf(&self) -> u16 {
        self.0 & 0x03FF
    }
}

/// Terminate an existing connection (Vol 2, Part E, Section 7.1.6).
pub const DISCONNECT: Opcode = Opcode::new(ogf::LINK_CONTROL, ocf::DISCONNECT);

/// Control which events the controller generates (Section 7.3.1).
pub const SET_EVENT_MASK: Opcode = Opcode::new(ogf::CONTROLLER_BASEBAND, ocf::SET_EVENT_MASK);

/// Reset the controller's link layer state (Section 7.3.2).
pub const RESET: Opcode = Opcode::new(ogf::CONTROLLER_BASEBAND, ocf::RESET);

/// Read the controller's public device address (Section 7.4.6).
pub const READ_BD_ADDR: Opcode = Opcode::new(ogf::INFO_PARAM, ocf::READ_BD_ADDR);

/// Set the parameters used while advertising (Section 7.8.5).
pub const LE_SET_ADVERTISING_PARAMETERS: Opcode =
    Opcode::new(ogf::LE_CONTROLLER, ocf::LE_SET_ADVERTISING_PARAMETERS);

/// Set the data broadcast in advertising packets (Section 7.8.7).
pub const LE_SET_ADVERTISING_DATA: Opcode =
    Opcode::new(ogf::LE_CONTROLLER, ocf::LE_SET_ADVERTISING_DATA);

/// Set the data returned in scan response packets (Section 7.8.8).
pub const LE_SET_SCAN_RESPONSE_DATA: Opcode =
    Opcode::new(ogf::LE_CONTROLLER, ocf::LE_SET_SCAN_RESPONSE_DATA);

/// Start or stop advertising (Section 7.8.9).
pub const LE_SET_ADVERTISE_ENABLE: Opcode =
    Opcode::new(ogf::LE_CONTROLLER, ocf::LE_SET_ADVERTISE_ENABLE);
