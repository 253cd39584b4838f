//! Attribute-layer collaboration: client configuration tracking and the
//! flow-controlled value notifier.
//!
//! The ATT server itself lives outside this crate; the [`AttServer`] trait is
//! the seam through which the control plane asks it to push value updates. The
//! server's send path has finite capacity, so [`ValueNotifier`] never assumes a
//! send will go through: updates are latched as pending and retried on every
//! flush until capacity admits them.

use num_enum::TryFromPrimitive;

/// A 16-bit attribute handle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AttributeHandle(pub u16);

/// Handle of the counter characteristic's Client Characteristic Configuration
/// descriptor.
pub const CLIENT_CONFIGURATION_HANDLE: AttributeHandle = AttributeHandle(0x0010);

/// Handle of the counter characteristic value.
pub const COUNTER_VALUE_HANDLE: AttributeHandle = AttributeHandle(0x000F);

/// Client Characteristic Configuration values the peer may write.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClientConfiguration {
    /// The client has not subscribed to value updates.
    Off = 0x00,
    /// The client subscribed to notifications.
    Notify = 0x01,
    /// The client subscribed to indications.
    Indicate = 0x02,
}

/// Error pushing a value update through the ATT server. Carries the server's
/// error code.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SendError(pub u8);

/// The outbound interface of the external ATT server.
///
/// [`can_send`](Self::can_send) reports whether the server currently has
/// capacity for one value update; the send methods must only be called when it
/// returns `true`.
pub trait AttServer {
    /// Whether one notification or indication can be queued right now.
    fn can_send(&self) -> bool;

    /// Queues a notification for `handle` carrying `value`.
    fn notify(&mut self, handle: AttributeHandle, value: &[u8]) -> Result<(), SendError>;

    /// Queues an indication for `handle` carrying `value`.
    fn indicate(&mut self, handle: AttributeHandle, value: &[u8]) -> Result<(), SendError>;
}

/// A write to a local attribute, as reported by the ATT server.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WriteRequest<'a> {
    /// Handle the peer wrote to.
    pub handle: AttributeHandle,
    /// Bytes the peer wrote.
    pub value: &'a [u8],
}

/// Disposition of a [`WriteRequest`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteOutcome {
    /// The write was applied, or targeted an attribute this crate does not
    /// interpret.
    Accepted,
    /// The write carried a malformed client configuration value.
    Rejected,
}

/// A wrapping one-byte counter pushed to a subscribed client.
///
/// Each heartbeat tick increments the counter and marks an update pending;
/// [`flush`](Self::flush) delivers the current value when the client is
/// subscribed and the server has capacity. Missed deliveries are not queued
/// individually: the client always receives the latest value, never a backlog.
pub struct ValueNotifier {
    handle: AttributeHandle,
    configuration: ClientConfiguration,
    counter: u8,
    update_pending: bool,
}

impl ValueNotifier {
    /// Creates a notifier for `handle` with the counter at zero and no
    /// subscription.
    pub fn new(handle: AttributeHandle) -> ValueNotifier {
        ValueNotifier {
            handle,
            configuration: ClientConfiguration::Off,
            counter: 0,
            update_pending: false,
        }
    }

    /// Current counter value.
    pub fn counter(&self) -> u8 {
        self.counter
    }

    /// The client's current subscription.
    pub fn configuration(&self) -> ClientConfiguration {
        self.configuration
    }

    /// Whether an update is latched awaiting delivery.
    pub fn update_pending(&self) -> bool {
        self.update_pending
    }

    /// Advances the counter and latches an update if a client is subscribed.
    pub fn tick(&mut self) {
        self.counter = self.counter.wrapping_add(1);
        if self.configuration != ClientConfiguration::Off {
            self.update_pending = true;
        }
    }

    /// Delivers the latched update if the server has capacity.
    ///
    /// Returns `true` if a value update was handed to the server. A full
    /// server or a failed send leaves the update pending, to be retried on
    /// the next flush that finds capacity.
    pub fn flush<A: AttServer>(&mut self, att: &mut A) -> bool {
        if !self.update_pending || !att.can_send() {
            return false;
        }
        let value = [self.counter];
        let result = match self.configuration {
            ClientConfiguration::Off => {
                self.update_pending = false;
                return false;
            }
            ClientConfiguration::Notify => att.notify(self.handle, &value),
            ClientConfiguration::Indicate => att.indicate(self.handle, &value),
        };
        match result {
            Ok(()) => {
                self.update_pending = false;
                true
            }
            Err(SendError(code)) => {
                warn!("notifier: send failed with code {}", code);
                false
            }
        }
    }

    /// Applies a write reported by the ATT server.
    ///
    /// Only the client configuration descriptor is interpreted; writes to
    /// other handles are acknowledged and ignored. A write clearing the
    /// subscription also clears any pending update.
    pub fn handle_write(&mut self, request: WriteRequest) -> WriteOutcome {
        if request.handle != CLIENT_CONFIGURATION_HANDLE {
            debug!("notifier: ignoring write to handle {:x}", request.handle.0);
            return WriteOutcome::Accepted;
        }
        // CCC descriptor values are 16 bits little-endian on the wire.
        let raw = match request.value {
            [lo] => *lo,
            [lo, 0x00] => *lo,
            _ => return WriteOutcome::Rejected,
        };
        let Ok(configuration) = ClientConfiguration::try_from(raw) else {
            return WriteOutcome::Rejected;
        };
        debug!("notifier: client configuration set to {}", raw);
        self.configuration = configuration;
        if configuration == ClientConfiguration::Off {
            self.update_pending = false;
        }
        WriteOutcome::Accepted
    }
}
