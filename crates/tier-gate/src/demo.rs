use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Demonstration-mode switch shared with the gate.
///
/// The gate reads it on every call, so flipping it takes effect for the next
/// call without rebuilding anything. While enabled, every operation runs as if
/// the caller were entitled. Development use only.
#[derive(Debug, Clone, Default)]
pub struct DemoMode(Arc<AtomicBool>);

impl DemoMode {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let demo = DemoMode::new(false);
        let shared = demo.clone();

        shared.set(true);
        assert!(demo.is_enabled());

        demo.set(false);
        assert!(!shared.is_enabled());
    }

    #[test]
    fn test_default_is_disabled() {
        assert!(!DemoMode::default().is_enabled());
    }
}
