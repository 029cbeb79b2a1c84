use tokio::task::JoinHandle;

/// Owns the background refresh task so login and logout can replace or
/// cancel it without racing each other.
#[derive(Default)]
pub struct RefreshScheduler {
    handle: Option<JoinHandle<()>>,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a refresh task is currently running.
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Install a new refresh task, cancelling any previous one first.
    pub fn arm(&mut self, handle: JoinHandle<()>) {
        self.cancel();
        self.handle = Some(handle);
    }

    /// Stop the refresh task if one is running.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_arm_and_cancel() {
        let mut scheduler = RefreshScheduler::new();
        assert!(!scheduler.is_active());

        scheduler.arm(tokio::spawn(async {
            std::future::pending::<()>().await;
        }));
        assert!(scheduler.is_active());

        scheduler.cancel();
        assert!(!scheduler.is_active());
    }

    #[tokio::test]
    async fn test_rearm_replaces_previous_task() {
        let mut scheduler = RefreshScheduler::new();
        let first = tokio::spawn(async {
            std::future::pending::<()>().await;
        });
        let first_abort = first.abort_handle();
        scheduler.arm(first);

        scheduler.arm(tokio::spawn(async {
            std::future::pending::<()>().await;
        }));

        tokio::task::yield_now().await;
        assert!(first_abort.is_finished());
        assert!(scheduler.is_active());
    }
}
