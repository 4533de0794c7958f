//! The concurrent prime sieve: a chain of filtering units, one per prime found so far.

use alt::{runtimes::local_spawn::Spawn, Chan};
use futures::{executor::LocalPool, task::LocalSpawn};

fn generate(spawner: &impl LocalSpawn) -> Chan<u64> {
    let numbers = Chan::new();
    let out = numbers.clone();
    spawner.spawn_unit(async move {
        for n in 2.. {
            out.send(n).await;
        }
    });
    numbers
}

fn filter(spawner: &impl LocalSpawn, input: Chan<u64>, prime: u64) -> Chan<u64> {
    let filtered = Chan::new();
    let out = filtered.clone();
    spawner.spawn_unit(async move {
        loop {
            let n = input.receive().await;
            if n % prime != 0 {
                out.send(n).await;
            }
        }
    });
    filtered
}

fn main() {
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();

    let primes = {
        let spawner = spawner.clone();
        spawner.clone().spawn_unit_with_handle(async move {
            let mut numbers = generate(&spawner);
            let mut primes = Vec::new();
            for _ in 0..25 {
                let prime = numbers.receive().await;
                primes.push(prime);
                numbers = filter(&spawner, numbers, prime);
            }
            primes
        })
    };

    for prime in pool.run_until(primes) {
        println!("{}", prime);
    }
}
