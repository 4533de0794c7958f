//! A consumer multiplexing producers of different kinds with one select.

use alt::{runtimes::tokio::spawn, select, Chan};
use std::time::Duration;
use tokio::task::LocalSet;

enum Event {
    Reading(f64),
    Log(String),
    Stop,
}

async fn pause() {
    tokio::time::sleep(Duration::from_millis(fastrand::u64(10..100))).await;
}

async fn sensor(readings: Chan<f64>) {
    loop {
        pause().await;
        readings.send(fastrand::f64() * 100.0).await;
    }
}

async fn logger(lines: Chan<String>) {
    for i in 1.. {
        pause().await;
        lines.send(format!("log line {}", i)).await;
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    LocalSet::new()
        .run_until(async {
            let readings = Chan::new();
            let lines = Chan::new();
            let stop = Chan::new();

            drop(spawn(sensor(readings.clone())));
            drop(spawn(sensor(readings.clone())));
            drop(spawn(logger(lines.clone())));

            let stopper = stop.clone();
            drop(spawn(async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                stopper.send(()).await;
            }));

            let consumer = spawn(async move {
                let (mut count, mut sum) = (0, 0.0);
                loop {
                    let event = select([
                        readings.make_receive_with(|_, x| Event::Reading(x)),
                        lines.make_receive_with(|_, line| Event::Log(line)),
                        stop.make_receive_with(|_, ()| Event::Stop),
                    ])
                    .await;
                    match event {
                        Event::Reading(x) => {
                            count += 1;
                            sum += x;
                        }
                        Event::Log(line) => println!("{}", line),
                        Event::Stop => break (count, sum),
                    }
                }
            });

            let (count, sum) = consumer.await.unwrap();
            println!("{} readings, average {:.2}", count, sum / count.max(1) as f64);
        })
        .await;
}
