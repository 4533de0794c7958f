use std::{cell::RefCell, rc::Rc};

use alt::{runtimes::local_spawn::Spawn, Chan, Direction, Unit};
use futures::executor::LocalPool;

#[test]
fn receive_then_send() {
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();
    let chan = Chan::new();

    let rx = chan.clone();
    let receiver = Unit::new();
    let got = Rc::new(RefCell::new(None));
    let got2 = got.clone();
    spawner.spawn_unit_as(receiver.clone(), async move {
        *got2.borrow_mut() = Some(rx.receive().await);
    });
    pool.run_until_stalled();

    assert!(receiver.is_blocked());
    assert_eq!(receiver.pending(), 1);
    assert_eq!(chan.balance(), -1);
    assert_eq!(chan.waiting(), [receiver.id()]);

    let sender = Unit::new();
    let tx = chan.clone();
    spawner.spawn_unit_as(sender.clone(), async move { tx.send(42).await });
    pool.run_until_stalled();

    assert_eq!(*got.borrow(), Some(42));
    assert_eq!(chan.balance(), 0);
    assert!(chan.is_empty());
    assert!(!receiver.is_blocked());
    assert_eq!(receiver.pending(), 0);
    assert_eq!(sender.waits(), 0);
    assert_eq!(chan.stats().matched, 1);
}

#[test]
fn send_then_receive() {
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();
    let chan = Chan::new();

    let tx = chan.clone();
    let sender = Unit::new();
    spawner.spawn_unit_as(sender.clone(), async move { tx.send("hello").await });
    pool.run_until_stalled();
    assert_eq!(chan.balance(), 1);
    assert!(sender.is_blocked());

    let rx = chan.clone();
    let got = spawner.spawn_unit_with_handle(async move { rx.receive().await });
    assert_eq!(pool.run_until(got), "hello");
    pool.run_until_stalled();
    assert!(!sender.is_blocked());
    assert_eq!(chan.balance(), 0);
}

#[test]
fn senders_are_served_in_arrival_order() {
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();
    let chan = Chan::new();

    for i in 0..4 {
        let tx = chan.clone();
        spawner.spawn_unit(async move { tx.send(i).await });
        pool.run_until_stalled();
    }
    assert_eq!(chan.balance(), 4);

    let rx = chan.clone();
    let got = spawner.spawn_unit_with_handle(async move {
        let mut got = Vec::new();
        for _ in 0..4 {
            got.push(rx.receive().await);
        }
        got
    });
    assert_eq!(pool.run_until(got), [0, 1, 2, 3]);
    assert_eq!(chan.balance(), 0);
}

#[test]
fn send_matches_oldest_receiver() {
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();
    let chan = Chan::<u32>::new();
    let (r1, r2) = (Unit::new(), Unit::new());

    for unit in [&r1, &r2] {
        let rx = chan.clone();
        spawner.spawn_unit_as(unit.clone(), async move {
            rx.receive().await;
        });
        pool.run_until_stalled();
    }
    assert_eq!(chan.waiting(), [r1.id(), r2.id()]);

    let tx = chan.clone();
    spawner.spawn_unit(async move { tx.send(1).await });
    pool.run_until_stalled();

    assert!(!r1.is_blocked());
    assert!(r2.is_blocked());
    assert_eq!(chan.waiting(), [r2.id()]);
    assert_eq!(chan.balance(), -1);
}

#[test]
fn values_survive_the_hand_off() {
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();

    let numbers = Chan::<i64>::new();
    let payloads = Chan::<Vec<u8>>::new();
    let words = Chan::<String>::new();

    let (n, p, w) = (numbers.clone(), payloads.clone(), words.clone());
    let got = spawner.spawn_unit_with_handle(async move {
        let mut ns = Vec::new();
        for _ in 0..4 {
            ns.push(n.receive().await);
        }
        (ns, p.receive().await, w.receive().await, w.receive().await)
    });

    spawner.spawn_unit(async move {
        for x in [0, 0, i64::MIN, i64::MAX] {
            numbers.send(x).await;
        }
        payloads.send(Vec::new()).await;
        words.send(String::new()).await;
        words.send("same".repeat(1000)).await;
    });

    let (ns, payload, empty, long) = pool.run_until(got);
    assert_eq!(ns, [0, 0, i64::MIN, i64::MAX]);
    assert!(payload.is_empty());
    assert_eq!(empty, "");
    assert_eq!(long.len(), 4000);
}

#[test]
fn preference_flips_with_each_rendezvous() {
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();
    let chan = Chan::new();
    assert_eq!(chan.preference(), Direction::Receive);

    // A queued receive matched by a sender.
    let rx = chan.clone();
    spawner.spawn_unit(async move {
        rx.receive().await;
    });
    pool.run_until_stalled();
    let tx = chan.clone();
    spawner.spawn_unit(async move { tx.send(()).await });
    pool.run_until_stalled();
    assert_eq!(chan.preference(), Direction::Receive);

    // A queued send matched by a receiver.
    let tx = chan.clone();
    spawner.spawn_unit(async move { tx.send(()).await });
    pool.run_until_stalled();
    let rx = chan.clone();
    spawner.spawn_unit(async move { rx.receive().await });
    pool.run_until_stalled();
    assert_eq!(chan.preference(), Direction::Send);
    assert_eq!(chan.stats().matched, 2);
}

#[test]
fn ping_pong_many_rounds() {
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();
    let (ping, pong) = (Chan::new(), Chan::new());

    let (ping2, pong2) = (ping.clone(), pong.clone());
    spawner.spawn_unit(async move {
        loop {
            let n: u64 = ping2.receive().await;
            pong2.send(n + 1).await;
        }
    });

    let total = spawner.spawn_unit_with_handle(async move {
        let mut n = 0;
        for _ in 0..1000 {
            ping.send(n).await;
            n = pong.receive().await;
        }
        n
    });
    assert_eq!(pool.run_until(total), 1000);
}
