//! Component lifecycle scope: deep watchers and teardown hooks.
//!
//! A [`Scope`] stands in for the host component instance a bridge is mounted in.
//! Watchers registered with [`Scope::watch_deep`] compare a deep, ref-unwrapped
//! snapshot of their source on every [`Scope::flush`] and fire when it differs
//! structurally. [`Scope::unmount`] stops every watcher and runs the teardown hooks,
//! once.
//!
//! Locks are never held while a source, callback or hook runs, so those may register
//! further watchers or hooks.

use crate::models::Value;
use crate::utils::clone_deep_unref;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

type SourceFn = dyn Fn() -> Value + Send + Sync;
type WatchCallback = dyn FnMut(&Value, &Value) + Send;
type TeardownHook = Box<dyn FnOnce() + Send>;

struct Watcher {
    source: Box<SourceFn>,
    callback: Mutex<Box<WatchCallback>>,
    last: Mutex<Value>,
    active: AtomicBool,
}

impl Watcher {
    /// Re-evaluate the source; fire the callback on a structural change
    fn check(&self) -> bool {
        if !self.active.load(Ordering::Acquire) {
            return false;
        }

        let current = clone_deep_unref(&(self.source)());
        let previous = {
            let mut last = self.last.lock();
            if *last == current {
                return false;
            }
            std::mem::replace(&mut *last, current.clone())
        };

        // Stopped while the source ran
        if !self.active.load(Ordering::Acquire) {
            return false;
        }

        let mut callback = self.callback.lock();
        (*callback)(&current, &previous);
        true
    }
}

/// Handle returned by [`Scope::watch_deep`]
#[derive(Clone)]
pub struct WatchHandle {
    watcher: Arc<Watcher>,
}

impl WatchHandle {
    /// Stop the watcher. Safe to call multiple times.
    pub fn stop(&self) {
        self.watcher.active.store(false, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.watcher.active.load(Ordering::Acquire)
    }
}

#[derive(Default)]
struct ScopeInner {
    watchers: Vec<Arc<Watcher>>,
    teardown: Vec<TeardownHook>,
    unmounted: bool,
}

/// Lifecycle owner for watchers and teardown hooks
///
/// Cloning a `Scope` yields another handle to the same instance.
#[derive(Clone, Default)]
pub struct Scope {
    inner: Arc<Mutex<ScopeInner>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook to run at unmount.
    ///
    /// Registering on an already-unmounted scope runs the hook immediately.
    pub fn on_unmounted(&self, hook: impl FnOnce() + Send + 'static) {
        let hook: TeardownHook = Box::new(hook);
        {
            let mut inner = self.inner.lock();
            if !inner.unmounted {
                inner.teardown.push(hook);
                return;
            }
        }
        tracing::debug!("Scope already unmounted, running teardown hook immediately");
        hook();
    }

    /// Watch `source` for deep structural changes.
    ///
    /// The source is evaluated once now to take the baseline snapshot; the callback
    /// receives `(current, previous)` snapshots on every later [`flush`](Self::flush)
    /// that observes a difference. Watchers on an unmounted scope start stopped.
    pub fn watch_deep<S, C>(&self, source: S, callback: C) -> WatchHandle
    where
        S: Fn() -> Value + Send + Sync + 'static,
        C: FnMut(&Value, &Value) + Send + 'static,
    {
        let baseline = clone_deep_unref(&source());
        let watcher = Arc::new(Watcher {
            source: Box::new(source),
            callback: Mutex::new(Box::new(callback)),
            last: Mutex::new(baseline),
            active: AtomicBool::new(true),
        });

        let mut inner = self.inner.lock();
        if inner.unmounted {
            watcher.active.store(false, Ordering::Release);
        } else {
            inner.watchers.push(Arc::clone(&watcher));
        }

        WatchHandle { watcher }
    }

    /// Evaluate every active watcher in registration order.
    ///
    /// Returns the number of callbacks that fired.
    pub fn flush(&self) -> usize {
        let watchers: Vec<Arc<Watcher>> = {
            let mut inner = self.inner.lock();
            inner.watchers.retain(|watcher| watcher.active.load(Ordering::Acquire));
            inner.watchers.clone()
        };

        watchers.iter().filter(|watcher| watcher.check()).count()
    }

    /// Stop all watchers and run teardown hooks in registration order.
    ///
    /// Only the first call has an effect.
    pub fn unmount(&self) {
        let (watchers, hooks) = {
            let mut inner = self.inner.lock();
            if inner.unmounted {
                return;
            }
            inner.unmounted = true;
            (
                std::mem::take(&mut inner.watchers),
                std::mem::take(&mut inner.teardown),
            )
        };

        for watcher in &watchers {
            watcher.active.store(false, Ordering::Release);
        }

        tracing::debug!(
            "Unmounting scope: {} watchers stopped, {} teardown hooks",
            watchers.len(),
            hooks.len()
        );

        for hook in hooks {
            hook();
        }
    }

    pub fn is_unmounted(&self) -> bool {
        self.inner.lock().unmounted
    }
}
