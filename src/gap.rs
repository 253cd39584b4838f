//! GAP configuration and the advertising bring-up state machine.
//!
//! Bringing a BLE peripheral into an advertising state is a fixed command
//! sequence: advertising data, scan response data, advertising parameters,
//! advertise enable. Each step may only be issued once the previous step's
//! Command Complete event has been observed, and parameters must never change
//! while advertising is enabled. [`Advertiser`] owns that sequencing: it keeps
//! exactly one configuration command in flight, correlates completions against
//! the pending opcode by value, and defers external reconfiguration requests
//! until it reaches a terminal state.

use crate::event::command::CommandComplete;
use crate::host::{self, HostHci};
use crate::opcode::{self, Opcode};
use crate::types::{
    AdvertisingChannels, AdvertisingData, AdvertisingFilterPolicy, AdvertisingInterval,
    AdvertisingParameters, AdvertisingType, OwnAddressType, PeerAddressType,
};
use crate::{BdAddr, Controller};

/// Discoverability, connectability and bonding flags.
///
/// The flags form a dependency chain: `bondable` requires `connectable`,
/// which requires `discoverable`. Clearing a flag clears everything that
/// depends on it; setting a flag whose prerequisite is clear is clamped back
/// off, never auto-raising the prerequisite.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GapConfig {
    discoverable: bool,
    connectable: bool,
    bondable: bool,
}

impl GapConfig {
    /// A discoverable, connectable, bondable peripheral.
    pub fn new() -> GapConfig {
        GapConfig {
            discoverable: true,
            connectable: true,
            bondable: true,
        }
    }

    /// Whether the device wants to advertise.
    pub fn discoverable(&self) -> bool {
        self.discoverable
    }

    /// Whether advertising accepts connection requests.
    pub fn connectable(&self) -> bool {
        self.connectable
    }

    /// Whether connections may bond.
    pub fn bondable(&self) -> bool {
        self.bondable
    }

    /// Sets the discoverable flag. Clearing it also clears `connectable` and
    /// `bondable`.
    pub fn set_discoverable(&mut self, on: bool) {
        self.discoverable = on;
        self.clamp();
    }

    /// Sets the connectable flag. Clearing it also clears `bondable`; setting
    /// it while not discoverable is clamped back off.
    pub fn set_connectable(&mut self, on: bool) {
        self.connectable = on;
        self.clamp();
    }

    /// Sets the bondable flag. Setting it while not connectable is clamped
    /// back off.
    pub fn set_bondable(&mut self, on: bool) {
        self.bondable = on;
        self.clamp();
    }

    // connectable ⇒ discoverable and bondable ⇒ connectable, restored after
    // every mutation.
    fn clamp(&mut self) {
        if !self.discoverable {
            self.connectable = false;
        }
        if !self.connectable {
            self.bondable = false;
        }
    }

    /// The advertising packet type this configuration calls for.
    pub fn advertising_type(&self) -> AdvertisingType {
        if self.connectable {
            AdvertisingType::ConnectableUndirected
        } else {
            AdvertisingType::NonConnectableUndirected
        }
    }
}

impl Default for GapConfig {
    fn default() -> GapConfig {
        GapConfig::new()
    }
}

/// Position of the advertising bring-up sequence.
///
/// `Enabled` and `Disabled` are the terminal states; every other state has a
/// configuration command outstanding.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvertisingState {
    /// Waiting for the stack to reach its working state.
    Idle,
    /// LE Set Advertising Data sent, completion outstanding.
    AdvDataSent,
    /// LE Set Scan Response Data sent, completion outstanding.
    ScanResponseSent,
    /// LE Set Advertising Parameters sent, completion outstanding.
    ParamsSent,
    /// Bring-up finished with advertising on.
    Enabled,
    /// Bring-up finished with advertising off.
    Disabled,
}

/// Errors from driving the state machine.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The controller could not accept a command packet. The model assumes
    /// command credit is available whenever at most one command is in flight,
    /// so this indicates a transport-level problem.
    WouldBlock,
    /// Encoding or communication error from the command layer.
    Command(host::Error<E>),
}

fn run<E>(result: nb::Result<(), host::Error<E>>) -> Result<(), Error<E>> {
    result.map_err(|e| match e {
        nb::Error::WouldBlock => Error::WouldBlock,
        nb::Error::Other(other) => Error::Command(other),
    })
}

/// The advertising configuration state machine.
///
/// Driven exclusively by [`handle_command_complete`](Self::handle_command_complete)
/// and the connection lifecycle handlers; external configuration changes go
/// through the setter methods, which defer their effect while a command is in
/// flight. There is no reply timeout: a controller that never completes a
/// command leaves the machine parked in its current state.
pub struct Advertiser {
    state: AdvertisingState,
    config: GapConfig,
    advertising_enabled: bool,
    pending: Option<Opcode>,
    // One-shot: resend parameters once the enable(false) we sent for a
    // reconfiguration completes.
    readvertise: bool,
    // An external request arrived while a command was in flight; replay it
    // when a terminal state is reached.
    deferred_update: bool,
    // The advertising parameters on the controller are stale relative to the
    // configuration. Cleared when parameters go out.
    params_dirty: bool,
    adv_data: AdvertisingData,
    scan_response: AdvertisingData,
    interval: AdvertisingInterval,
}

impl Advertiser {
    /// Creates the machine in [`AdvertisingState::Idle`] with the payloads it
    /// will advertise.
    pub fn new(
        config: GapConfig,
        adv_data: AdvertisingData,
        scan_response: AdvertisingData,
        interval: AdvertisingInterval,
    ) -> Advertiser {
        Advertiser {
            state: AdvertisingState::Idle,
            config,
            advertising_enabled: false,
            pending: None,
            readvertise: false,
            deferred_update: false,
            params_dirty: false,
            adv_data,
            scan_response,
            interval,
        }
    }

    /// Current position in the bring-up sequence.
    pub fn state(&self) -> AdvertisingState {
        self.state
    }

    /// Current configuration flags.
    pub fn config(&self) -> GapConfig {
        self.config
    }

    /// Whether advertising is currently on, as far as commands issued so far
    /// go.
    pub fn advertising_enabled(&self) -> bool {
        self.advertising_enabled
    }

    /// Opcode of the configuration command awaiting completion, if any.
    pub fn pending_command(&self) -> Option<Opcode> {
        self.pending
    }

    fn advertising_parameters(&self) -> AdvertisingParameters {
        AdvertisingParameters {
            interval: self.interval,
            advertising_type: self.config.advertising_type(),
            own_address_type: OwnAddressType::Public,
            peer_address_type: PeerAddressType::Public,
            peer_address: BdAddr::NULL,
            channels: AdvertisingChannels::ALL,
            filter_policy: AdvertisingFilterPolicy::AllDevices,
        }
    }

    /// Begins the bring-up sequence. Called once the stack reports its
    /// working state; a no-op in any state but [`AdvertisingState::Idle`].
    pub fn start<T, E>(&mut self, controller: &mut T) -> Result<(), Error<E>>
    where
        T: Controller<Error = E>,
    {
        if self.state != AdvertisingState::Idle {
            return Ok(());
        }
        debug!("advertiser: starting bring-up");
        run(controller.le_set_advertising_data(&self.adv_data))?;
        self.pending = Some(opcode::LE_SET_ADVERTISING_DATA);
        self.state = AdvertisingState::AdvDataSent;
        Ok(())
    }

    /// Advances the machine on a Command Complete event.
    ///
    /// Completions whose opcode does not match the pending command are logged
    /// and ignored; they belong to other layers or are protocol noise.
    pub fn handle_command_complete<T, E>(
        &mut self,
        controller: &mut T,
        event: &CommandComplete,
    ) -> Result<(), Error<E>>
    where
        T: Controller<Error = E>,
    {
        let Some(completed) = event.return_params.opcode() else {
            return Ok(());
        };
        if self.pending != Some(completed) {
            debug!("advertiser: ignoring completion for {:?}", completed);
            return Ok(());
        }
        self.pending = None;

        if let Some(status) = event.return_params.status() {
            if status != crate::Status::Success {
                warn!("advertiser: {:?} completed with {:?}", completed, status);
            }
        }

        match completed {
            opcode::LE_SET_ADVERTISING_DATA => {
                run(controller.le_set_scan_response_data(&self.scan_response))?;
                self.pending = Some(opcode::LE_SET_SCAN_RESPONSE_DATA);
                self.state = AdvertisingState::ScanResponseSent;
            }
            opcode::LE_SET_SCAN_RESPONSE_DATA => {
                self.send_parameters(controller)?;
            }
            opcode::LE_SET_ADVERTISING_PARAMETERS => {
                self.evaluate_enable(controller)?;
            }
            opcode::LE_SET_ADVERTISE_ENABLE => {
                if self.readvertise {
                    // Parameters change while advertising was on: the disable
                    // just completed, now the parameters can go out.
                    self.readvertise = false;
                    self.send_parameters(controller)?;
                } else {
                    self.settle(controller)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Records that a central connected. The controller stops advertising on
    /// its own when a connection is established; no command is issued.
    pub fn handle_connection_complete(&mut self) {
        self.advertising_enabled = false;
        if self.state == AdvertisingState::Enabled {
            self.state = AdvertisingState::Disabled;
        }
    }

    /// Restarts advertising after a disconnect, if the configuration wants
    /// it.
    ///
    /// If a configuration command is still in flight (for example the
    /// disconnect raced a reconfiguration), the restart is deferred to the
    /// terminal-state processing instead of issuing a second enable.
    pub fn handle_disconnection_complete<T, E>(
        &mut self,
        controller: &mut T,
    ) -> Result<(), Error<E>>
    where
        T: Controller<Error = E>,
    {
        if self.advertising_enabled || !self.config.discoverable {
            return Ok(());
        }
        if self.pending.is_some() {
            self.deferred_update = true;
            return Ok(());
        }
        debug!("advertiser: re-enabling advertising after disconnect");
        self.send_enable(controller, true)
    }

    /// Sets the discoverable flag and reconciles the controller state.
    pub fn set_discoverable<T, E>(&mut self, controller: &mut T, on: bool) -> Result<(), Error<E>>
    where
        T: Controller<Error = E>,
    {
        let before = self.config;
        self.config.set_discoverable(on);
        if self.config == before {
            return Ok(());
        }
        self.params_dirty = true;
        self.update(controller)
    }

    /// Sets the connectable flag and reconciles the controller state.
    pub fn set_connectable<T, E>(&mut self, controller: &mut T, on: bool) -> Result<(), Error<E>>
    where
        T: Controller<Error = E>,
    {
        let before = self.config;
        self.config.set_connectable(on);
        if self.config == before {
            return Ok(());
        }
        self.params_dirty = true;
        self.update(controller)
    }

    /// Sets the bondable flag.
    ///
    /// Bonding does not shape advertising packets, so no command traffic
    /// results; the flag is read by the security collaborator.
    pub fn set_bondable(&mut self, on: bool) {
        self.config.set_bondable(on);
    }

    /// Reconciles the advertising state with the configuration flags.
    ///
    /// While a transition is pending the request is recorded and replayed at
    /// the next terminal state, so external requests are never dropped. Stale
    /// parameters are only ever rewritten while advertising is off: if
    /// advertising is enabled, it is disabled first and re-enabled after the
    /// new parameters have been accepted.
    pub fn update<T, E>(&mut self, controller: &mut T) -> Result<(), Error<E>>
    where
        T: Controller<Error = E>,
    {
        match self.state {
            AdvertisingState::Idle => Ok(()),
            AdvertisingState::Enabled | AdvertisingState::Disabled if self.pending.is_none() => {
                if self.params_dirty {
                    if self.advertising_enabled {
                        self.readvertise = true;
                        self.send_enable(controller, false)
                    } else {
                        self.send_parameters(controller)
                    }
                } else if self.config.discoverable != self.advertising_enabled {
                    self.send_enable(controller, self.config.discoverable)
                } else {
                    Ok(())
                }
            }
            _ => {
                self.deferred_update = true;
                Ok(())
            }
        }
    }

    fn send_parameters<T, E>(&mut self, controller: &mut T) -> Result<(), Error<E>>
    where
        T: Controller<Error = E>,
    {
        let params = self.advertising_parameters();
        run(controller.le_set_advertising_parameters(&params))?;
        self.pending = Some(opcode::LE_SET_ADVERTISING_PARAMETERS);
        self.state = AdvertisingState::ParamsSent;
        self.params_dirty = false;
        Ok(())
    }

    fn send_enable<T, E>(&mut self, controller: &mut T, enable: bool) -> Result<(), Error<E>>
    where
        T: Controller<Error = E>,
    {
        debug!("advertiser: advertise enable {}", enable as u8);
        run(controller.le_set_advertise_enable(enable))?;
        self.pending = Some(opcode::LE_SET_ADVERTISE_ENABLE);
        self.advertising_enabled = enable;
        self.state = if enable {
            AdvertisingState::Enabled
        } else {
            AdvertisingState::Disabled
        };
        Ok(())
    }

    // Post-parameters evaluation: enable or disable advertising if the
    // desired and actual states differ, otherwise the sequence is done.
    fn evaluate_enable<T, E>(&mut self, controller: &mut T) -> Result<(), Error<E>>
    where
        T: Controller<Error = E>,
    {
        if self.config.discoverable != self.advertising_enabled {
            self.send_enable(controller, self.config.discoverable)
        } else {
            self.settle(controller)
        }
    }

    // Terminal state reached with no command in flight; replay a deferred
    // external request if one arrived mid-transition.
    fn settle<T, E>(&mut self, controller: &mut T) -> Result<(), Error<E>>
    where
        T: Controller<Error = E>,
    {
        self.state = if self.advertising_enabled {
            AdvertisingState::Enabled
        } else {
            AdvertisingState::Disabled
        };
        if self.deferred_update {
            self.deferred_update = false;
            self.update(controller)?;
        }
        Ok(())
    }
}
