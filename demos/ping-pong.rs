use alt::{runtimes::tokio::spawn, Chan};
use std::time::Duration;
use tokio::task::LocalSet;

#[derive(Debug)]
struct Ball {
    hits: u32,
}

async fn player(name: &'static str, receive: Chan<Ball>, serve: Chan<Ball>) {
    loop {
        let mut ball = receive.receive().await;
        ball.hits += 1;
        println!("{} hits the ball ({} hits so far)", name, ball.hits);
        tokio::time::sleep(Duration::from_millis(fastrand::u64(50..250))).await;
        serve.send(ball).await;
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    LocalSet::new()
        .run_until(async {
            let (to_ping, to_pong) = (Chan::new(), Chan::new());
            drop(spawn(player("ping", to_ping.clone(), to_pong.clone())));
            drop(spawn(player("pong", to_pong.clone(), to_ping.clone())));

            let table = to_ping.clone();
            spawn(async move { table.send(Ball { hits: 0 }).await })
                .await
                .unwrap();

            tokio::time::sleep(Duration::from_secs(2)).await;
            println!("game over");
        })
        .await;
}
