//! Running gallery background work on the host's executor
//!
//! Gallery types are single-threaded (`Rc`/`RefCell`), so their tasks are
//! `!Send` and must run on a local executor: a `tokio::task::LocalSet` for
//! headless use and tests, or the UI framework's own task queue.

use std::future::Future;
use std::pin::Pin;

pub type LocalTask = Pin<Box<dyn Future<Output = ()> + 'static>>;

pub trait Spawner {
    fn spawn_local(&self, task: LocalTask);
}

/// Spawns onto the current `tokio::task::LocalSet`
///
/// Must be used from within a `LocalSet` context.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioLocalSpawner;

impl Spawner for TokioLocalSpawner {
    fn spawn_local(&self, task: LocalTask) {
        tokio::task::spawn_local(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[tokio::test]
    async fn test_tokio_local_spawner_runs_task() {
        let local = tokio::task::LocalSet::new();
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();

        local
            .run_until(async move {
                TokioLocalSpawner.spawn_local(Box::pin(async move {
                    flag.set(true);
                }));
            })
            .await;
        local.await;

        assert!(ran.get());
    }
}
