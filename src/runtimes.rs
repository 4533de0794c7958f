//! Spawning futures as execution units on single-threaded executors.
//!
//! Units share channels through `Rc`, so they are not `Send` and have to run on an
//! executor that keeps them on one thread: tokio's [`LocalSet`](::tokio::task::LocalSet),
//! or anything implementing [`futures::task::LocalSpawn`], such as
//! [`LocalPool`](futures::executor::LocalPool)'s spawner.

#[cfg(feature = "runtime-tokio")]
pub mod tokio {
    use futures::Future;

    use crate::unit::{self, Unit};

    /// Spawns `f` as a new unit onto the current `LocalSet`.
    ///
    /// # Panics
    ///
    /// If called outside of a `LocalSet`, like [`tokio::task::spawn_local`](::tokio::task::spawn_local).
    pub fn spawn<F>(f: F) -> ::tokio::task::JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        ::tokio::task::spawn_local(unit::scope(f))
    }

    /// Spawns `f` running as `unit`.
    pub fn spawn_as<F>(unit: Unit, f: F) -> ::tokio::task::JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        ::tokio::task::spawn_local(unit::scope_as(unit, f))
    }
}

pub mod local_spawn {
    use futures::{
        future::RemoteHandle,
        task::{LocalSpawn, LocalSpawnExt},
        Future,
    };

    use crate::unit::{self, Unit};

    pub trait Spawn {
        /// Spawns `f` as a new unit, discarding its result.
        fn spawn_unit<F>(&self, f: F)
        where
            F: Future<Output = ()> + 'static;

        /// Spawns `f` running as `unit`, so the caller can keep a handle for inspection.
        fn spawn_unit_as<F>(&self, unit: Unit, f: F)
        where
            F: Future<Output = ()> + 'static;

        /// Spawns `f` as a new unit, returning a handle to its result.
        fn spawn_unit_with_handle<F>(&self, f: F) -> RemoteHandle<F::Output>
        where
            F: Future + 'static,
            F::Output: 'static;
    }

    impl<S: LocalSpawn> Spawn for S {
        fn spawn_unit<F>(&self, f: F)
        where
            F: Future<Output = ()> + 'static,
        {
            self.spawn_unit_as(Unit::new(), f)
        }

        fn spawn_unit_as<F>(&self, unit: Unit, f: F)
        where
            F: Future<Output = ()> + 'static,
        {
            self.spawn_local(unit::scope_as(unit, f))
                .ok()
                .expect("spawn failed")
        }

        fn spawn_unit_with_handle<F>(&self, f: F) -> RemoteHandle<F::Output>
        where
            F: Future + 'static,
            F::Output: 'static,
        {
            self.spawn_local_with_handle(unit::scope(f))
                .ok()
                .expect("spawn failed")
        }
    }
}
