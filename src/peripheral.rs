//! Event routing glue tying the transport, the advertiser and the notifier
//! together.
//!
//! [`Peripheral`] owns the controller handle, the advertising state machine
//! and the value notifier, and translates inbound packets into calls on them.
//! It is the piece the run loop drives: register [`Peripheral::pump`] behind a
//! data source and [`Peripheral::heartbeat`] behind a periodic timer and the
//! peripheral takes care of itself.

use crate::att::{AttServer, ValueNotifier, WriteOutcome, WriteRequest, COUNTER_VALUE_HANDLE};
use crate::event::{self, StackState};
use crate::gap::{Advertiser, GapConfig};
use crate::host::{self, HciRead};
use crate::types::{AdvertisingData, AdvertisingInterval};
use crate::{Controller, Event};

pub use crate::gap::Error as AdvertisingError;

/// Errors that abort the peripheral.
///
/// Malformed or unknown inbound events are not represented here; they are
/// logged and skipped inside [`Peripheral::pump`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The controller reported an unrecoverable fault. Carries the
    /// vendor-defined hardware code; the only remedy is a controller reset.
    HardwareFault(u8),
    /// The advertising state machine could not issue a command.
    Advertising(crate::gap::Error<E>),
    /// The transport failed.
    Transport(E),
    /// An inbound packet of a type this crate does not consume is at the head
    /// of the stream. Carries the packet type byte. The packet is left
    /// unconsumed for the collaborator that owns it; if none exists, the
    /// stream cannot make progress.
    BadPacketType(u8),
}

/// The assembled peripheral control plane.
///
/// `T` is the controller transport, `A` the external ATT server.
pub struct Peripheral<T, A> {
    controller: T,
    att: A,
    advertiser: Advertiser,
    notifier: ValueNotifier,
}

impl<T, A, E> Peripheral<T, A>
where
    T: Controller<Error = E>,
    A: AttServer,
{
    /// Assembles a peripheral over `controller` and `att`.
    ///
    /// Nothing is sent until the stack reports its working state through a
    /// pumped event.
    pub fn new(
        controller: T,
        att: A,
        config: GapConfig,
        adv_data: AdvertisingData,
        scan_response: AdvertisingData,
        interval: AdvertisingInterval,
    ) -> Peripheral<T, A> {
        Peripheral {
            controller,
            att,
            advertiser: Advertiser::new(config, adv_data, scan_response, interval),
            notifier: ValueNotifier::new(COUNTER_VALUE_HANDLE),
        }
    }

    /// The advertising state machine, for inspection.
    pub fn advertiser(&self) -> &Advertiser {
        &self.advertiser
    }

    /// The value notifier, for inspection.
    pub fn notifier(&self) -> &ValueNotifier {
        &self.notifier
    }

    /// The underlying transport.
    pub fn controller_mut(&mut self) -> &mut T {
        &mut self.controller
    }

    /// The attribute server handle.
    pub fn att_mut(&mut self) -> &mut A {
        &mut self.att
    }

    /// Whether a full inbound packet is waiting.
    ///
    /// Suitable as a run loop source readiness callback; packets of foreign
    /// types also report ready so [`pump`](Self::pump) can surface them.
    pub fn has_input(&mut self) -> bool {
        !matches!(self.controller.peek(0), Err(nb::Error::WouldBlock))
    }

    /// Reads and dispatches at most one inbound packet.
    ///
    /// Returns `Ok(true)` if a packet was consumed, `Ok(false)` if no packet
    /// was available. Unknown and malformed events are logged and counted as
    /// consumed. Errors are fatal to the control plane.
    pub fn pump(&mut self) -> Result<bool, Error<E>> {
        let event = match self.controller.read() {
            Ok(host::Packet::Event(event)) => event,
            Err(nb::Error::WouldBlock) => return Ok(false),
            Err(nb::Error::Other(host::Error::Event(e))) => {
                match e {
                    event::Error::UnknownEvent(code) => {
                        debug!("peripheral: ignoring unknown event {:x}", code)
                    }
                    event::Error::UnknownLeSubevent(code) => {
                        debug!("peripheral: ignoring unknown LE subevent {:x}", code)
                    }
                    _ => warn!("peripheral: dropping malformed event: {:?}", e),
                }
                return Ok(true);
            }
            Err(nb::Error::Other(host::Error::BadPacketType(t))) => {
                return Err(Error::BadPacketType(t))
            }
            Err(nb::Error::Other(host::Error::Comm(e))) => return Err(Error::Transport(e)),
            // Only the Disconnect encoder produces this variant.
            Err(nb::Error::Other(host::Error::BadDisconnectionReason(_))) => unreachable!(),
        };
        self.handle_event(event)?;
        // A completed command or closed connection may have freed send
        // capacity.
        self.notifier.flush(&mut self.att);
        Ok(true)
    }

    fn handle_event(&mut self, event: Event) -> Result<(), Error<E>> {
        match event {
            Event::CommandComplete(ref complete) => self
                .advertiser
                .handle_command_complete(&mut self.controller, complete)
                .map_err(Error::Advertising),
            Event::CommandStatus(status) => {
                debug!(
                    "peripheral: command status {:?} for {:?}",
                    status.status, status.opcode
                );
                Ok(())
            }
            Event::DisconnectionComplete(disconnection) => {
                info!(
                    "peripheral: connection {:?} closed, reason {:?}",
                    disconnection.conn_handle, disconnection.reason
                );
                self.advertiser
                    .handle_disconnection_complete(&mut self.controller)
                    .map_err(Error::Advertising)
            }
            Event::LeConnectionComplete(connection) => {
                if connection.status == crate::Status::Success {
                    info!(
                        "peripheral: connected to {:?} as {:?}",
                        connection.peer_address, connection.role
                    );
                    self.advertiser.handle_connection_complete();
                } else {
                    warn!(
                        "peripheral: connection failed with {:?}",
                        connection.status
                    );
                }
                Ok(())
            }
            Event::HardwareError(code) => {
                error!("peripheral: hardware error {:x}", code);
                Err(Error::HardwareFault(code))
            }
            Event::StackState(state) => {
                info!("peripheral: stack state {:?}", state);
                if state == StackState::Working {
                    self.advertiser
                        .start(&mut self.controller)
                        .map_err(Error::Advertising)
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Periodic tick: advances the counter and attempts delivery.
    ///
    /// Suitable as a run loop periodic timer callback.
    pub fn heartbeat(&mut self) {
        self.notifier.tick();
        self.notifier.flush(&mut self.att);
    }

    /// Applies an attribute write reported by the ATT server.
    pub fn attribute_written(&mut self, request: WriteRequest) -> WriteOutcome {
        let outcome = self.notifier.handle_write(request);
        // A fresh subscription may already have a latched update to deliver.
        self.notifier.flush(&mut self.att);
        outcome
    }

    /// Changes the discoverable flag and reconciles the advertising state.
    pub fn set_discoverable(&mut self, on: bool) -> Result<(), Error<E>> {
        self.advertiser
            .set_discoverable(&mut self.controller, on)
            .map_err(Error::Advertising)
    }

    /// Changes the connectable flag and reconciles the advertising state.
    pub fn set_connectable(&mut self, on: bool) -> Result<(), Error<E>> {
        self.advertiser
            .set_connectable(&mut self.controller, on)
            .map_err(Error::Advertising)
    }

    /// Changes the bondable flag.
    pub fn set_bondable(&mut self, on: bool) {
        self.advertiser.set_bondable(on);
    }
}
