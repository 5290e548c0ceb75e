//! Drivers for asynchronous sources.
//!
//! Streams and futures converted into observables are pulled by a task
//! spawned on a [`LocalSpawn`] implementation carried by the
//! [`Context`](crate::context::Context). `futures::executor::LocalSpawner`
//! works out of the box; [`TokioScheduler`] hands tasks to the current tokio
//! `LocalSet` when the `tokio-scheduler` feature is enabled.

use futures::{
  future::LocalBoxFuture,
  task::{LocalSpawn, LocalSpawnExt},
};

use crate::error::Error;

pub(crate) fn spawn(
  scheduler: &dyn LocalSpawn, task: LocalBoxFuture<'static, ()>,
) -> Result<(), Error> {
  scheduler
    .spawn_local(task)
    .map_err(|e| Error::Spawn(e.to_string()))
}

#[cfg(feature = "tokio-scheduler")]
pub use tokio_scheduler::TokioScheduler;

#[cfg(feature = "tokio-scheduler")]
mod tokio_scheduler {
  use futures::task::{LocalFutureObj, LocalSpawn, SpawnError};

  /// Spawns onto the tokio `LocalSet` the caller is running inside.
  ///
  /// Spawning outside a `LocalSet` panics, as `tokio::task::spawn_local`
  /// does.
  #[derive(Debug, Clone, Copy, Default)]
  pub struct TokioScheduler;

  impl LocalSpawn for TokioScheduler {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
      tokio::task::spawn_local(future);
      Ok(())
    }
  }
}
