//! Waiting with a deadline, built from a timer unit sending into one of the select's
//! channels.

use alt::{runtimes::tokio::spawn, select, Chan};
use std::time::Duration;
use tokio::task::LocalSet;

enum Answer {
    Result(u64),
    TimedOut,
}

fn slow_square(n: u64) -> Chan<u64> {
    let result = Chan::new();
    let out = result.clone();
    drop(spawn(async move {
        tokio::time::sleep(Duration::from_millis(fastrand::u64(0..200))).await;
        out.send(n * n).await;
    }));
    result
}

fn after(delay: Duration) -> Chan<()> {
    let timer = Chan::new();
    let out = timer.clone();
    drop(spawn(async move {
        tokio::time::sleep(delay).await;
        out.send(()).await;
    }));
    timer
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    LocalSet::new()
        .run_until(async {
            for n in 1..=10 {
                let result = slow_square(n);
                let deadline = after(Duration::from_millis(100));
                let answer = spawn(async move {
                    select([
                        result.make_receive_with(|_, x| Answer::Result(x)),
                        deadline.make_receive_with(|_, ()| Answer::TimedOut),
                    ])
                    .await
                })
                .await
                .unwrap();
                match answer {
                    Answer::Result(x) => println!("{}^2 = {}", n, x),
                    Answer::TimedOut => println!("{}^2 took too long", n),
                }
            }
        })
        .await;
}
