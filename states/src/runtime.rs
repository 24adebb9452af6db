use std::future::Future;

use log::error;
use tokio::task::{JoinError, JoinSet};

use crate::{Error, Mailbox, Updater};

/// Owner-side runtime: a mailbox for updates plus the set of tasks producing them.
///
/// Spawning requires a Tokio runtime context.
#[derive(Debug)]
pub struct StateRuntime<U> {
    mailbox: Mailbox<U>,
    tasks: JoinSet<()>,
}

impl<U: Send + 'static> Default for StateRuntime<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: Send + 'static> StateRuntime<U> {
    pub fn new() -> Self {
        Self {
            mailbox: Mailbox::new(),
            tasks: JoinSet::new(),
        }
    }

    /// Sending half for a task that reports back to this runtime.
    pub fn updater(&self) -> Updater<U> {
        self.mailbox.updater()
    }

    /// Spawn `task` onto the ambient Tokio runtime and track it until joined.
    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(task);
    }

    /// Number of tasks that have not been joined yet.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Take every update queued so far.
    pub fn drain(&self) -> Vec<U> {
        self.mailbox.drain()
    }

    /// Wait for the next task to finish.
    ///
    /// Returns `None` when no tasks are left. Aborted tasks count as finished.
    pub async fn join_next(&mut self) -> Option<Result<(), Error>> {
        let joined = self.tasks.join_next().await?;
        Some(Self::joined(joined))
    }

    /// Remove every task that has already finished, without waiting.
    ///
    /// Owners that only poll (a UI frame loop) call this so the set does not keep
    /// completed work. Returns the errors of tasks that panicked.
    pub fn reap(&mut self) -> Vec<Error> {
        let mut failed = Vec::new();
        while let Some(joined) = self.tasks.try_join_next() {
            if let Err(err) = Self::joined(joined) {
                failed.push(err);
            }
        }
        failed
    }

    fn joined(result: Result<(), JoinError>) -> Result<(), Error> {
        match result {
            Ok(()) => Ok(()),
            Err(err) if err.is_cancelled() => Ok(()),
            Err(err) => {
                error!("StateRuntime: task failed: {err}");
                Err(Error::task_panicked(err.to_string()))
            }
        }
    }

    /// Abort every task and wait for them to wind down.
    pub async fn shutdown(&mut self) {
        self.tasks.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spawned_tasks_report_through_mailbox() {
        let mut runtime = StateRuntime::<u32>::new();
        for i in 0..3 {
            let updater = runtime.updater();
            runtime.spawn(async move { updater.set(i) });
        }
        assert_eq!(runtime.task_count(), 3);

        while let Some(result) = runtime.join_next().await {
            assert!(result.is_ok());
        }

        let mut updates = runtime.drain();
        updates.sort_unstable();
        assert_eq!(updates, vec![0, 1, 2]);
        assert_eq!(runtime.task_count(), 0);
    }

    #[tokio::test]
    async fn panicking_task_surfaces_as_error() {
        let mut runtime = StateRuntime::<()>::new();
        runtime.spawn(async { panic!("boom") });

        let result = runtime.join_next().await.expect("one task was spawned");
        assert!(matches!(result, Err(Error::TaskPanicked { .. })));
        assert!(runtime.join_next().await.is_none());
    }

    #[tokio::test]
    async fn reap_drops_finished_tasks_without_waiting() {
        let mut runtime = StateRuntime::<u32>::new();
        let updater = runtime.updater();
        runtime.spawn(async move { updater.set(1) });
        runtime.spawn(async { panic!("boom") });
        runtime.spawn(std::future::pending());

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        let failed = runtime.reap();

        assert_eq!(failed.len(), 1);
        assert!(matches!(failed[0], Error::TaskPanicked { .. }));
        assert_eq!(runtime.task_count(), 1, "only the pending task is left");
        assert_eq!(runtime.drain(), vec![1]);
        assert!(runtime.reap().is_empty());
        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_aborts_pending_tasks() {
        let mut runtime = StateRuntime::<()>::new();
        runtime.spawn(std::future::pending());
        runtime.shutdown().await;
        assert_eq!(runtime.task_count(), 0);
    }
}
