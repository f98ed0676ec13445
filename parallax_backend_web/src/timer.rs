// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One-shot `setTimeout` wake-ups and the window resize listener.

use alloc::boxed::Box;
use core::cell::Cell;

use kurbo::Size;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use parallax_core::time::{HostTime, Timebase};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(callback: &JsValue, delay_ms: i32) -> i32;

    #[wasm_bindgen(js_name = "clearTimeout")]
    fn clear_timeout(id: i32);
}

/// Milliseconds to wait from `now` until `deadline`, rounded up so the
/// callback never fires before the deadline.
pub(crate) fn delay_ms(now: HostTime, deadline: HostTime, timebase: Timebase) -> i32 {
    let nanos = timebase.ticks_to_nanos(deadline.saturating_duration_since(now).ticks());
    let ms = nanos.div_ceil(1_000_000);
    i32::try_from(ms).unwrap_or(i32::MAX)
}

/// A re-armable `setTimeout` with a persistent callback.
///
/// At most one timeout is pending; arming again replaces it.
pub(crate) struct Timer {
    closure: Closure<dyn FnMut()>,
    pending: Cell<Option<i32>>,
}

impl Timer {
    pub(crate) fn new(callback: impl FnMut() + 'static) -> Self {
        Self {
            closure: Closure::wrap(Box::new(callback) as Box<dyn FnMut()>),
            pending: Cell::new(None),
        }
    }

    /// Schedules the callback `delay_ms` from now, cancelling any earlier one.
    pub(crate) fn arm(&self, delay_ms: i32) {
        self.cancel();
        let id = set_timeout(self.closure.as_ref().unchecked_ref(), delay_ms);
        self.pending.set(Some(id));
    }

    /// Cancels the pending timeout, if any.
    pub(crate) fn cancel(&self) {
        if let Some(id) = self.pending.take() {
            clear_timeout(id);
        }
    }

    /// Marks the pending timeout as fired.
    pub(crate) fn fired(&self) {
        self.pending.set(None);
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl core::fmt::Debug for Timer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Timer")
            .field("pending", &self.pending.get())
            .finish_non_exhaustive()
    }
}

/// Current window inner size, or `None` outside a browsing context.
pub(crate) fn window_size() -> Option<Size> {
    let window = web_sys::window()?;
    let width = window.inner_width().ok()?.as_f64()?;
    let height = window.inner_height().ok()?.as_f64()?;
    Some(Size::new(width, height))
}

/// A `resize` listener on `window`, removed on drop.
pub(crate) struct ResizeListener {
    closure: Closure<dyn FnMut()>,
}

impl ResizeListener {
    /// Registers `callback` for window resizes.
    ///
    /// Returns `None` (after logging) when there is no window.
    pub(crate) fn new(callback: impl FnMut() + 'static) -> Option<Self> {
        let closure = Closure::wrap(Box::new(callback) as Box<dyn FnMut()>);
        let Some(window) = web_sys::window() else {
            log::warn!("no window; resize events will not be observed");
            return None;
        };
        if let Err(err) =
            window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())
        {
            log::warn!("failed to add resize listener: {err:?}");
            return None;
        }
        Some(Self { closure })
    }
}

impl Drop for ResizeListener {
    fn drop(&mut self) {
        if let Some(window) = web_sys::window() {
            let _ = window
                .remove_event_listener_with_callback("resize", self.closure.as_ref().unchecked_ref());
        }
    }
}

impl core::fmt::Debug for ResizeListener {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResizeListener").finish_non_exhaustive()
    }
}
