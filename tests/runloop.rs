extern crate ble_peripheral as ble;

use ble::runloop::{Clock, Instant, RunLoop};
use core::time::Duration;

#[derive(Default)]
struct Context {
    fired: Vec<&'static str>,
    input: u32,
    processed: u32,
}

type TestLoop = RunLoop<Context, (), 4, 2>;

fn push_a(ctx: &mut Context) -> Result<(), ()> {
    ctx.fired.push("a");
    Ok(())
}

fn push_b(ctx: &mut Context) -> Result<(), ()> {
    ctx.fired.push("b");
    Ok(())
}

fn push_tick(ctx: &mut Context) -> Result<(), ()> {
    ctx.fired.push("tick");
    Ok(())
}

fn fail(_ctx: &mut Context) -> Result<(), ()> {
    Err(())
}

fn has_input(ctx: &mut Context) -> bool {
    ctx.input > 0
}

fn process_one(ctx: &mut Context) -> Result<(), ()> {
    ctx.input -= 1;
    ctx.processed += 1;
    Ok(())
}

#[test]
fn timers_fire_in_deadline_order() {
    let mut rl = TestLoop::new();
    let mut ctx = Context::default();
    rl.set_timer(Instant(30), push_b).unwrap();
    rl.set_timer(Instant(10), push_a).unwrap();

    assert!(rl.run_once(&mut ctx, Instant(100)).unwrap());
    assert_eq!(ctx.fired, ["a", "b"]);
    assert_eq!(rl.next_deadline(), None);
}

#[test]
fn timer_not_due_does_not_fire() {
    let mut rl = TestLoop::new();
    let mut ctx = Context::default();
    rl.set_timer(Instant(50), push_a).unwrap();

    assert!(!rl.run_once(&mut ctx, Instant(49)).unwrap());
    assert!(ctx.fired.is_empty());
    assert_eq!(rl.next_deadline(), Some(Instant(50)));

    assert!(rl.run_once(&mut ctx, Instant(50)).unwrap());
    assert_eq!(ctx.fired, ["a"]);
}

#[test]
fn one_shot_timer_fires_once() {
    let mut rl = TestLoop::new();
    let mut ctx = Context::default();
    rl.set_timer(Instant(10), push_a).unwrap();

    rl.run_once(&mut ctx, Instant(10)).unwrap();
    rl.run_once(&mut ctx, Instant(20)).unwrap();
    assert_eq!(ctx.fired, ["a"]);
}

#[test]
fn periodic_timer_rearms_from_fire_time() {
    let mut rl = TestLoop::new();
    let mut ctx = Context::default();
    rl.set_periodic_timer(Instant(10), Duration::from_millis(100), push_tick)
        .unwrap();

    rl.run_once(&mut ctx, Instant(10)).unwrap();
    assert_eq!(rl.next_deadline(), Some(Instant(110)));

    // Fired late: the next deadline is relative to the late fire, so there is
    // no catch-up burst.
    rl.run_once(&mut ctx, Instant(500)).unwrap();
    assert_eq!(ctx.fired, ["tick", "tick"]);
    assert_eq!(rl.next_deadline(), Some(Instant(600)));
}

#[test]
fn cancelled_timer_does_not_fire() {
    let mut rl = TestLoop::new();
    let mut ctx = Context::default();
    let id = rl.set_timer(Instant(10), push_a).unwrap();
    rl.set_timer(Instant(20), push_b).unwrap();

    assert!(rl.cancel_timer(id));
    assert!(!rl.cancel_timer(id));

    rl.run_once(&mut ctx, Instant(100)).unwrap();
    assert_eq!(ctx.fired, ["b"]);
}

#[test]
fn cancelled_periodic_timer_stays_cancelled() {
    let mut rl = TestLoop::new();
    let mut ctx = Context::default();
    let id = rl
        .set_periodic_timer(Instant(10), Duration::from_millis(10), push_tick)
        .unwrap();

    rl.run_once(&mut ctx, Instant(10)).unwrap();
    assert!(rl.cancel_timer(id));
    rl.run_once(&mut ctx, Instant(100)).unwrap();
    assert_eq!(ctx.fired, ["tick"]);
    assert_eq!(rl.next_deadline(), None);
}

#[test]
fn timer_capacity_is_bounded() {
    let mut rl: RunLoop<Context, (), 2, 2> = RunLoop::new();
    rl.set_timer(Instant(1), push_a).unwrap();
    rl.set_timer(Instant(2), push_a).unwrap();
    assert!(rl.set_timer(Instant(3), push_a).is_err());
}

#[test]
fn source_processes_one_unit_per_iteration() {
    let mut rl = TestLoop::new();
    let mut ctx = Context {
        input: 3,
        ..Context::default()
    };
    rl.add_source(has_input, process_one).unwrap();

    assert!(rl.run_once(&mut ctx, Instant(0)).unwrap());
    assert_eq!(ctx.processed, 1);

    assert!(rl.run_once(&mut ctx, Instant(0)).unwrap());
    assert!(rl.run_once(&mut ctx, Instant(0)).unwrap());
    assert_eq!(ctx.processed, 3);

    // Input drained: the loop reports idle.
    assert!(!rl.run_once(&mut ctx, Instant(0)).unwrap());
}

#[test]
fn removed_source_is_not_polled() {
    let mut rl = TestLoop::new();
    let mut ctx = Context {
        input: 1,
        ..Context::default()
    };
    let id = rl.add_source(has_input, process_one).unwrap();
    assert!(rl.remove_source(id));
    assert!(!rl.remove_source(id));

    assert!(!rl.run_once(&mut ctx, Instant(0)).unwrap());
    assert_eq!(ctx.processed, 0);
}

#[test]
fn callback_error_propagates() {
    let mut rl = TestLoop::new();
    let mut ctx = Context::default();
    rl.set_timer(Instant(0), fail).unwrap();
    assert_eq!(rl.run_once(&mut ctx, Instant(0)), Err(()));
}

struct SteppingClock {
    now: u64,
    idled_at: Vec<Option<Instant>>,
}

impl Clock for SteppingClock {
    fn now(&mut self) -> Instant {
        Instant(self.now)
    }

    fn idle_until(&mut self, deadline: Option<Instant>) {
        self.idled_at.push(deadline);
        // Jump straight to the deadline, like a perfectly accurate sleep.
        if let Some(Instant(t)) = deadline {
            self.now = t;
        }
    }
}

#[test]
fn run_idles_with_the_earliest_deadline() {
    let mut rl = TestLoop::new();
    let mut ctx = Context::default();
    let mut clock = SteppingClock {
        now: 0,
        idled_at: Vec::new(),
    };
    rl.set_timer(Instant(40), push_a).unwrap();
    rl.set_timer(Instant(90), fail).unwrap();

    // The loop exits through the failing timer.
    assert_eq!(rl.run(&mut ctx, &mut clock), Err(()));
    assert_eq!(ctx.fired, ["a"]);
    assert_eq!(
        clock.idled_at,
        [Some(Instant(40)), Some(Instant(90))]
    );
}
