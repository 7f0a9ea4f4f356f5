use super::*;
use parking_lot::Mutex;
use std::sync::atomic::AtomicBool;

struct TestHook {
    name: String,
    started: AtomicBool,
    stopped: AtomicBool,
    priority: i32,
    fail_start: bool,
    log: Arc<Mutex<Vec<String>>>,
}

impl TestHook {
    fn new(name: &str, priority: i32, log: &Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name: name.to_string(),
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            priority,
            fail_start: false,
            log: log.clone(),
        }
    }

    fn failing(mut self) -> Self {
        self.fail_start = true;
        self
    }
}

#[async_trait::async_trait]
impl LifecycleHook for TestHook {
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_start(&self) -> Result<(), KernelError> {
        if self.fail_start {
            return Err(KernelError::HookFailed(self.name.clone()));
        }
        self.started.store(true, Ordering::SeqCst);
        self.log.lock().push(format!("start {}", self.name));
        Ok(())
    }

    async fn on_stop(&self) -> Result<(), KernelError> {
        self.stopped.store(true, Ordering::SeqCst);
        self.log.lock().push(format!("stop {}", self.name));
        Ok(())
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

struct SlowHook;

#[async_trait::async_trait]
impl LifecycleHook for SlowHook {
    fn name(&self) -> &str {
        "slow"
    }

    async fn on_start(&self) -> Result<(), KernelError> {
        Ok(())
    }

    async fn on_stop(&self) -> Result<(), KernelError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(())
    }
}

fn log() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

#[test]
fn test_kernel_state_conversion() {
    assert_eq!(KernelState::from(0), KernelState::Created);
    assert_eq!(KernelState::from(2), KernelState::Running);
    assert_eq!(KernelState::from(4), KernelState::Stopped);
    assert_eq!(KernelState::from(99), KernelState::Created);
}

#[test]
fn test_kernel_state_display() {
    assert_eq!(KernelState::ShuttingDown.to_string(), "shutting-down");
    assert_eq!(KernelState::Running.to_string(), "running");
}

#[test]
fn test_shutdown_signal() {
    let signal = ShutdownSignal::new();
    let mut rx = signal.subscribe();
    signal.trigger();
    assert!(rx.try_recv().is_ok());
}

#[tokio::test]
async fn test_lifecycle_start_stop() {
    let log = log();
    let manager = LifecycleManager::default();
    let hook = Arc::new(TestHook::new("settings", 0, &log));
    manager.register_hook(hook.clone()).await;
    assert_eq!(manager.state(), KernelState::Created);

    manager.start().await.unwrap();
    assert!(manager.is_running());
    assert!(hook.started.load(Ordering::SeqCst));

    manager.stop().await.unwrap();
    assert_eq!(manager.state(), KernelState::Stopped);
    assert!(hook.stopped.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_cannot_start_twice() {
    let manager = LifecycleManager::default();
    manager.start().await.unwrap();
    assert!(matches!(manager.start().await, Err(KernelError::InvalidState(_))));
}

#[tokio::test]
async fn test_cannot_stop_before_start() {
    let manager = LifecycleManager::default();
    assert!(manager.stop().await.is_err());
    assert_eq!(manager.state(), KernelState::Created);
}

#[tokio::test]
async fn test_hooks_start_by_priority_and_stop_in_reverse() {
    let log = log();
    let manager = LifecycleManager::default();
    manager.register_hook(Arc::new(TestHook::new("low", 5, &log))).await;
    manager.register_hook(Arc::new(TestHook::new("high", 10, &log))).await;
    assert_eq!(manager.hook_names().await, ["high", "low"]);

    manager.start().await.unwrap();
    manager.stop().await.unwrap();
    assert_eq!(*log.lock(), ["start high", "start low", "stop low", "stop high"]);
}

#[tokio::test]
async fn test_failed_start_rolls_back() {
    let log = log();
    let manager = LifecycleManager::default();
    let first = Arc::new(TestHook::new("first", 10, &log));
    manager.register_hook(first.clone()).await;
    manager
        .register_hook(Arc::new(TestHook::new("broken", 5, &log).failing()))
        .await;

    let result = manager.start().await;
    assert!(matches!(result, Err(KernelError::HookFailed(name)) if name == "broken"));
    assert!(first.stopped.load(Ordering::SeqCst));
    assert_eq!(manager.state(), KernelState::Stopped);
}

#[tokio::test]
async fn test_stop_timeout_is_reported() {
    let manager = LifecycleManager::new(Duration::from_millis(20));
    manager.register_hook(Arc::new(SlowHook)).await;
    manager.start().await.unwrap();

    let result = manager.stop().await;
    assert!(matches!(result, Err(KernelError::HookFailed(_))));
    assert_eq!(manager.state(), KernelState::Stopped);
}

#[tokio::test]
async fn test_stop_triggers_shutdown_signal() {
    let manager = LifecycleManager::default();
    let mut rx = manager.shutdown_signal().subscribe();
    manager.start().await.unwrap();
    manager.stop().await.unwrap();
    assert!(rx.try_recv().is_ok());
}
