//! Platform abstraction layer
//!
//! Frame scheduling is the one host service the session loop needs:
//! `requestAnimationFrame` on web, a manually pumped flag everywhere else.

use std::cell::Cell;
use std::rc::Rc;

/// Requests a single future frame callback
pub trait FrameScheduler {
    /// Ask for one more frame. Requesting while one is pending is a no-op.
    fn request_frame(&mut self);
    /// Drop the pending frame, if any
    fn cancel(&mut self);
    fn is_pending(&self) -> bool;
}

#[derive(Debug, Default)]
struct ManualState {
    pending: Cell<bool>,
    requests: Cell<u64>,
    cancels: Cell<u64>,
}

/// Scheduler pumped by the host: it only records that a frame is wanted.
///
/// Clones share state, so a host loop can keep one handle while the session
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    state: Rc<ManualState>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the pending request; true if the host should run a frame
    pub fn take(&self) -> bool {
        self.state.pending.replace(false)
    }

    /// Total `request_frame` calls that actually scheduled a frame
    pub fn requests(&self) -> u64 {
        self.state.requests.get()
    }

    pub fn cancels(&self) -> u64 {
        self.state.cancels.get()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) {
        if !self.state.pending.replace(true) {
            self.state.requests.set(self.state.requests.get() + 1);
        }
    }

    fn cancel(&mut self) {
        if self.state.pending.replace(false) {
            self.state.cancels.set(self.state.cancels.get() + 1);
        }
    }

    fn is_pending(&self) -> bool {
        self.state.pending.get()
    }
}

#[cfg(target_arch = "wasm32")]
pub use raf::RafScheduler;

#[cfg(target_arch = "wasm32")]
mod raf {
    use std::cell::Cell;
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;

    use super::FrameScheduler;

    /// `requestAnimationFrame` scheduler (WASM only)
    pub struct RafScheduler {
        callback: Closure<dyn FnMut(f64)>,
        handle: Rc<Cell<Option<i32>>>,
    }

    impl RafScheduler {
        /// `on_frame` receives the rAF timestamp in milliseconds
        pub fn new(mut on_frame: impl FnMut(f64) + 'static) -> Self {
            let handle = Rc::new(Cell::new(None));
            let fired = handle.clone();
            let callback = Closure::wrap(Box::new(move |ts: f64| {
                fired.set(None);
                on_frame(ts);
            }) as Box<dyn FnMut(f64)>);
            Self { callback, handle }
        }
    }

    impl FrameScheduler for RafScheduler {
        fn request_frame(&mut self) {
            if self.handle.get().is_some() {
                return;
            }
            let Some(window) = web_sys::window() else {
                log::warn!("No window - cannot schedule frames");
                return;
            };
            match window.request_animation_frame(self.callback.as_ref().unchecked_ref()) {
                Ok(id) => self.handle.set(Some(id)),
                Err(e) => log::warn!("requestAnimationFrame failed: {:?}", e),
            }
        }

        fn cancel(&mut self) {
            if let Some(id) = self.handle.take()
                && let Some(window) = web_sys::window()
            {
                let _ = window.cancel_animation_frame(id);
            }
        }

        fn is_pending(&self) -> bool {
            self.handle.get().is_some()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_scheduler_coalesces_requests() {
        let host = ManualScheduler::new();
        let mut owned = host.clone();
        owned.request_frame();
        owned.request_frame();
        assert!(host.is_pending());
        assert_eq!(host.requests(), 1);
        assert!(host.take());
        assert!(!host.take());
    }

    #[test]
    fn cancel_clears_pending() {
        let host = ManualScheduler::new();
        let mut owned = host.clone();
        owned.request_frame();
        owned.cancel();
        owned.cancel();
        assert!(!host.take());
        assert_eq!(host.cancels(), 1);
    }
}
