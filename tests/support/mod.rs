#![allow(dead_code)]

use ble_peripheral::att::{AttServer, AttributeHandle, SendError};
use ble_peripheral::Controller;
use std::collections::VecDeque;

/// Test double for the controller transport: records every written packet and
/// serves inbound bytes injected by the test.
pub struct RecordingSink {
    /// All written bytes, in write order.
    pub written_data: Vec<u8>,
    /// One entry per write call, header and payload concatenated.
    pub packets: Vec<Vec<u8>>,
    inbound: VecDeque<u8>,
}

impl RecordingSink {
    pub fn new() -> RecordingSink {
        RecordingSink {
            written_data: Vec::new(),
            packets: Vec::new(),
            inbound: VecDeque::new(),
        }
    }

    /// Queues bytes for the next reads.
    pub fn inject(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes.iter().copied());
    }

    /// The little-endian opcodes of the command packets written so far.
    pub fn written_opcodes(&self) -> Vec<u16> {
        self.packets
            .iter()
            .map(|p| u16::from_le_bytes([p[1], p[2]]))
            .collect()
    }
}

impl Controller for RecordingSink {
    type Error = ();

    fn write(&mut self, header: &[u8], payload: &[u8]) -> nb::Result<(), ()> {
        let mut packet = Vec::with_capacity(header.len() + payload.len());
        packet.extend_from_slice(header);
        packet.extend_from_slice(payload);
        self.written_data.extend_from_slice(&packet);
        self.packets.push(packet);
        Ok(())
    }

    fn read_into(&mut self, buffer: &mut [u8]) -> nb::Result<(), ()> {
        if self.inbound.len() < buffer.len() {
            return Err(nb::Error::WouldBlock);
        }
        for byte in buffer.iter_mut() {
            *byte = self.inbound.pop_front().unwrap();
        }
        Ok(())
    }

    fn peek(&mut self, n: usize) -> nb::Result<u8, ()> {
        self.inbound.get(n).copied().ok_or(nb::Error::WouldBlock)
    }
}

/// A value update handed to the ATT server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sent {
    Notification(AttributeHandle, Vec<u8>),
    Indication(AttributeHandle, Vec<u8>),
}

/// Test double for the external ATT server.
pub struct FakeAttServer {
    /// Reported send capacity.
    pub can_send: bool,
    /// When set, sends fail with this code instead of being recorded.
    pub fail_with: Option<u8>,
    /// Updates recorded so far.
    pub sent: Vec<Sent>,
}

impl FakeAttServer {
    pub fn new() -> FakeAttServer {
        FakeAttServer {
            can_send: true,
            fail_with: None,
            sent: Vec::new(),
        }
    }
}

impl AttServer for FakeAttServer {
    fn can_send(&self) -> bool {
        self.can_send
    }

    fn notify(&mut self, handle: AttributeHandle, value: &[u8]) -> Result<(), SendError> {
        if let Some(code) = self.fail_with {
            return Err(SendError(code));
        }
        self.sent.push(Sent::Notification(handle, value.to_vec()));
        Ok(())
    }

    fn indicate(&mut self, handle: AttributeHandle, value: &[u8]) -> Result<(), SendError> {
        if let Some(code) = self.fail_with {
            return Err(SendError(code));
        }
        self.sent.push(Sent::Indication(handle, value.to_vec()));
        Ok(())
    }
}
