//! Single-threaded run loop with timers and polled data sources.
//!
//! All crate state is driven from one thread of control: handlers run to
//! completion, and the only blocking point is [`Clock::idle_until`], which the
//! embedding implements with whatever wait primitive the platform has. Timers
//! and sources are registered with plain function pointers over a caller-owned
//! context, so the loop itself stays free of allocation and trait objects.
//!
//! Callbacks receive the context only, not the loop: periodic work is
//! expressed with first-class periodic timers rather than by re-arming from
//! inside a handler.

use core::time::Duration;
use heapless::Vec;

/// A point in loop time, in milliseconds since an arbitrary epoch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Instant(pub u64);

impl Instant {
    /// This instant advanced by `d`, saturating at the end of time.
    pub fn saturating_add(self, d: Duration) -> Instant {
        Instant(self.0.saturating_add(d.as_millis() as u64))
    }
}

/// The platform's time source and idle primitive.
pub trait Clock {
    /// The current time.
    fn now(&mut self) -> Instant;

    /// Blocks until `deadline` or until new input may be available, whichever
    /// comes first. `None` means no timer is armed; block until input.
    ///
    /// Spurious wakeups are fine; the loop re-evaluates readiness every
    /// iteration.
    fn idle_until(&mut self, deadline: Option<Instant>);
}

/// Identifies a registered timer for cancellation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerId(u32);

/// Identifies a registered data source for removal.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SourceId(u32);

/// A registration was attempted with all slots in use.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CapacityError;

struct Timer<C, E> {
    id: TimerId,
    deadline: Instant,
    period: Option<Duration>,
    callback: fn(&mut C) -> Result<(), E>,
}

struct Source<C, E> {
    id: SourceId,
    ready: fn(&mut C) -> bool,
    process: fn(&mut C) -> Result<(), E>,
}

/// The run loop: timer and source registries plus the dispatch logic.
///
/// `C` is the caller's context, handed to every callback; `E` is the
/// callbacks' error type. Any callback error aborts the loop and propagates to
/// the caller, leaving registrations intact.
pub struct RunLoop<C, E, const TIMERS: usize, const SOURCES: usize> {
    timers: Vec<Timer<C, E>, TIMERS>,
    sources: Vec<Source<C, E>, SOURCES>,
    next_id: u32,
}

impl<C, E, const TIMERS: usize, const SOURCES: usize> RunLoop<C, E, TIMERS, SOURCES> {
    /// An empty loop.
    pub fn new() -> RunLoop<C, E, TIMERS, SOURCES> {
        RunLoop {
            timers: Vec::new(),
            sources: Vec::new(),
            next_id: 0,
        }
    }

    fn take_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Arms a one-shot timer to fire at or after `deadline`.
    pub fn set_timer(
        &mut self,
        deadline: Instant,
        callback: fn(&mut C) -> Result<(), E>,
    ) -> Result<TimerId, CapacityError> {
        let id = TimerId(self.take_id());
        self.timers
            .push(Timer {
                id,
                deadline,
                period: None,
                callback,
            })
            .map_err(|_| CapacityError)?;
        Ok(id)
    }

    /// Arms a periodic timer first firing at `deadline`, then every `period`.
    ///
    /// Re-arming is relative to the time the timer fired, not to the previous
    /// deadline, so a late tick does not cause a burst of catch-up ticks.
    pub fn set_periodic_timer(
        &mut self,
        deadline: Instant,
        period: Duration,
        callback: fn(&mut C) -> Result<(), E>,
    ) -> Result<TimerId, CapacityError> {
        let id = TimerId(self.take_id());
        self.timers
            .push(Timer {
                id,
                deadline,
                period: Some(period),
                callback,
            })
            .map_err(|_| CapacityError)?;
        Ok(id)
    }

    /// Disarms a timer. Returns `false` if it already fired or was never
    /// registered.
    pub fn cancel_timer(&mut self, id: TimerId) -> bool {
        match self.timers.iter().position(|t| t.id == id) {
            Some(index) => {
                self.timers.swap_remove(index);
                true
            }
            None => false,
        }
    }

    /// Registers a polled data source.
    ///
    /// Each loop iteration calls `ready`; when it reports `true`, `process` is
    /// called to consume exactly one unit of input. Leftover input keeps the
    /// source ready and the loop busy, so one source cannot starve the others
    /// by processing a backlog in a single call.
    pub fn add_source(
        &mut self,
        ready: fn(&mut C) -> bool,
        process: fn(&mut C) -> Result<(), E>,
    ) -> Result<SourceId, CapacityError> {
        let id = SourceId(self.take_id());
        self.sources
            .push(Source { id, ready, process })
            .map_err(|_| CapacityError)?;
        Ok(id)
    }

    /// Removes a data source. Returns `false` if it was never registered.
    pub fn remove_source(&mut self, id: SourceId) -> bool {
        match self.sources.iter().position(|s| s.id == id) {
            Some(index) => {
                self.sources.swap_remove(index);
                true
            }
            None => false,
        }
    }

    /// The earliest armed deadline, if any timer is armed.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.iter().map(|t| t.deadline).min()
    }

    /// Runs one iteration at time `now`: fires every due timer in deadline
    /// order, then gives each ready source one processing call.
    ///
    /// Returns whether any callback ran. Timers that become due while earlier
    /// callbacks execute are picked up on the next iteration.
    pub fn run_once(&mut self, context: &mut C, now: Instant) -> Result<bool, E> {
        let mut ran = false;

        loop {
            // Earliest due timer first; ties fire in registration order.
            let due = self
                .timers
                .iter()
                .enumerate()
                .filter(|(_, t)| t.deadline <= now)
                .min_by_key(|(index, t)| (t.deadline, t.id.0, *index))
                .map(|(index, _)| index);
            let Some(index) = due else { break };

            let callback = self.timers[index].callback;
            match self.timers[index].period {
                Some(period) => {
                    // A sub-millisecond period must still move the deadline
                    // forward, or this loop would never terminate.
                    let next = now.saturating_add(period);
                    self.timers[index].deadline =
                        if next > now { next } else { Instant(now.0 + 1) };
                }
                None => {
                    self.timers.swap_remove(index);
                }
            }
            ran = true;
            callback(context)?;
        }

        for i in 0..self.sources.len() {
            let (ready, process) = (self.sources[i].ready, self.sources[i].process);
            if ready(context) {
                ran = true;
                process(context)?;
            }
        }

        Ok(ran)
    }

    /// Drives the loop until a callback fails.
    ///
    /// Idles through [`Clock::idle_until`] whenever an iteration did no work,
    /// with the earliest timer deadline as the wakeup bound.
    pub fn run(&mut self, context: &mut C, clock: &mut impl Clock) -> Result<(), E> {
        loop {
            let now = clock.now();
            if !self.run_once(context, now)? {
                clock.idle_until(self.next_deadline());
            }
        }
    }
}

impl<C, E, const TIMERS: usize, const SOURCES: usize> Default
    for RunLoop<C, E, TIMERS, SOURCES>
{
    fn default() -> RunLoop<C, E, TIMERS, SOURCES> {
        RunLoop::new()
    }
}
