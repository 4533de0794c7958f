//! Randomised workloads: many units running scripts of selects over a few shared channels.

use std::{
    cell::RefCell,
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
};

use alt::{runtimes::local_spawn::Spawn, select, Chan, Direction, Op, Unit};
use futures::executor::LocalPool;

const CHANNELS: usize = 3;
const UNITS: usize = 6;

struct YieldNow(bool);

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            return Poll::Ready(());
        }
        self.0 = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

enum Fired {
    Sent(u64),
    Received(u64),
}

type Step = (usize, Vec<(usize, Direction)>);

fn script(rng: &mut fastrand::Rng) -> Vec<Step> {
    (0..rng.usize(1..6))
        .map(|_| {
            let mut ops: Vec<(usize, Direction)> = Vec::new();
            for _ in 0..rng.usize(1..=3) {
                let chan = rng.usize(0..CHANNELS);
                let direction = match ops.iter().find(|(c, _)| *c == chan) {
                    Some(&(_, direction)) => direction,
                    None if rng.bool() => Direction::Send,
                    None => Direction::Receive,
                };
                ops.push((chan, direction));
            }
            (rng.usize(0..3), ops)
        })
        .collect()
}

#[derive(Default)]
struct Log {
    sent: Vec<u64>,
    received: Vec<u64>,
}

fn run(seed: u64) {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();
    let chans: Vec<Chan<u64>> = (0..CHANNELS).map(|_| Chan::new()).collect();
    let log = Rc::new(RefCell::new(Log::default()));
    let mut units = Vec::new();

    for u in 0..UNITS {
        let steps = script(&mut rng);
        let unit = Unit::with_seed(rng.u32(..));
        units.push(unit.clone());
        let (chans, log) = (chans.clone(), log.clone());
        spawner.spawn_unit_as(unit, async move {
            for (s, (yields, ops)) in steps.into_iter().enumerate() {
                for _ in 0..yields {
                    YieldNow(false).await;
                }
                let candidates: Vec<Op<Fired>> = ops
                    .iter()
                    .enumerate()
                    .map(|(k, &(c, direction))| match direction {
                        Direction::Send => {
                            let value = (u * 1000 + s * 10 + k) as u64;
                            chans[c].make_send_with(value, move |_| Fired::Sent(value))
                        }
                        Direction::Receive => {
                            chans[c].make_receive_with(|_, value| Fired::Received(value))
                        }
                    })
                    .collect();
                match select(candidates).await {
                    Fired::Sent(value) => log.borrow_mut().sent.push(value),
                    Fired::Received(value) => log.borrow_mut().received.push(value),
                }
            }
        });
    }
    pool.run_until_stalled();

    for chan in &chans {
        assert_eq!(
            chan.balance().unsigned_abs() as usize,
            chan.len(),
            "seed {seed}: balance out of step with the queue"
        );
    }
    let queued: usize = chans.iter().map(|c| c.len()).sum();
    let pending: usize = units.iter().map(|u| u.pending()).sum();
    assert_eq!(queued, pending, "seed {seed}: stray queued operations");
    for unit in &units {
        assert_eq!(unit.is_blocked(), unit.pending() > 0, "seed {seed}");
    }

    let log = log.borrow();
    let mut sent = log.sent.clone();
    let mut received = log.received.clone();
    sent.sort_unstable();
    received.sort_unstable();
    assert_eq!(sent, received, "seed {seed}: values lost or duplicated");
}

#[test]
fn random_workloads_keep_invariants() {
    for seed in 0..200 {
        run(seed);
    }
}
