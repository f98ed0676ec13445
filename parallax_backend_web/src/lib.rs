// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for parallax.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`RafLoop`]: `requestAnimationFrame` tick source
//! - [`DomPresenter`]: DOM element management
//! - [`WebParallax`]: a mounted background wiring the engine to the frame
//!   loop, a `setTimeout` wake-up for its timers and the window `resize`
//!   event. Dropping it unmounts.

#![no_std]

extern crate alloc;

mod presenter;
mod raf;
mod timer;

pub use parallax_core::backend::Presenter;
pub use presenter::DomPresenter;
pub use raf::RafLoop;

use alloc::rc::{Rc, Weak};
use core::cell::RefCell;

use parallax_core::background::BackgroundDefinition;
use parallax_core::config::ParallaxConfig;
use parallax_core::engine::ParallaxEngine;
use parallax_core::error::ConfigError;
use parallax_core::time::{HostTime, Timebase};
use parallax_core::timing::FrameTick;
use web_sys::HtmlElement;

use timer::{ResizeListener, Timer};

/// Returns the current host time from `performance.now()`.
///
/// The returned [`HostTime`] is in microsecond ticks. Use [`timebase`] to
/// convert to nanoseconds.
#[must_use]
pub fn now() -> HostTime {
    raf::ms_to_host_time(raf::performance_now())
}

/// Returns the web [`Timebase`]: 1 tick = 1 µs = 1000 ns.
#[must_use]
pub fn timebase() -> Timebase {
    Timebase::MICROS
}

/// Engine, presenter and wake-up timer shared by the browser callbacks.
struct Session {
    engine: ParallaxEngine,
    presenter: DomPresenter,
    timer: Timer,
}

impl Session {
    /// Re-arms the wake-up for the engine's next deadline.
    fn rearm(&self, now: HostTime) {
        match self.engine.next_deadline() {
            Some(at) => self.timer.arm(timer::delay_ms(now, at, timebase())),
            None => self.timer.cancel(),
        }
    }

    fn on_frame(&mut self, tick: &FrameTick) {
        self.engine.advance(tick.now);
        let changes = self.engine.frame(tick);
        self.presenter.apply(self.engine.scene(), &changes);
        self.rearm(tick.now);
    }

    fn on_timer(&mut self) {
        self.timer.fired();
        let now = now();
        self.engine.advance(now);
        self.rearm(now);
    }

    fn on_resize(&mut self) {
        let Some(size) = timer::window_size() else {
            return;
        };
        let now = now();
        self.engine.on_resize(size, now);
        self.rearm(now);
    }
}

fn with_session(weak: &Weak<RefCell<Session>>, f: impl FnOnce(&mut Session)) {
    let Some(session) = weak.upgrade() else {
        return;
    };
    match session.try_borrow_mut() {
        Ok(mut session) => f(&mut session),
        Err(_) => log::warn!("re-entrant parallax callback ignored"),
    }
}

/// A parallax background mounted into a DOM container.
///
/// Created by [`WebParallax::mount`]; dropping it (or calling
/// [`unmount`](Self::unmount)) cancels the frame loop, the pending timer and
/// the resize listener, and removes every element it created.
pub struct WebParallax {
    session: Rc<RefCell<Session>>,
    raf: RafLoop,
    resize: Option<ResizeListener>,
}

impl core::fmt::Debug for WebParallax {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebParallax")
            .field("raf", &self.raf)
            .field("resize", &self.resize.is_some())
            .finish_non_exhaustive()
    }
}

impl WebParallax {
    /// Mounts `background` into `container` and starts animating.
    ///
    /// # Errors
    ///
    /// Returns the engine's configuration error.
    pub fn mount(
        container: HtmlElement,
        background: BackgroundDefinition,
        config: ParallaxConfig,
    ) -> Result<Self, ConfigError> {
        let engine = ParallaxEngine::new(background, config, timebase())?;
        let session = Rc::new_cyclic(|weak: &Weak<RefCell<Session>>| {
            let weak = weak.clone();
            RefCell::new(Session {
                engine,
                presenter: DomPresenter::new(container),
                timer: Timer::new(move || with_session(&weak, Session::on_timer)),
            })
        });

        {
            let mut s = session.borrow_mut();
            let start = now();
            let changes = s.engine.mount(start, timer::window_size());
            let Session {
                engine, presenter, ..
            } = &mut *s;
            presenter.apply(engine.scene(), &changes);
            s.rearm(start);
        }

        let weak = Rc::downgrade(&session);
        let raf = RafLoop::new(move |tick| with_session(&weak, |s| s.on_frame(&tick)));
        raf.start();

        let weak = Rc::downgrade(&session);
        let resize = ResizeListener::new(move || with_session(&weak, Session::on_resize));

        Ok(Self {
            session,
            raf,
            resize,
        })
    }

    /// The element hosting foreground content.
    #[must_use]
    pub fn foreground(&self) -> Option<HtmlElement> {
        self.session.borrow().presenter.foreground_element().cloned()
    }

    /// Whether the layers are currently animating.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.session.borrow().engine.is_animating()
    }

    /// Tears the background down.
    pub fn unmount(self) {
        drop(self);
    }
}

impl Drop for WebParallax {
    fn drop(&mut self) {
        self.raf.stop();
        self.resize = None;
        let Ok(mut s) = self.session.try_borrow_mut() else {
            log::warn!("parallax dropped from inside its own callback");
            return;
        };
        s.timer.cancel();
        let changes = s.engine.unmount();
        let Session {
            engine, presenter, ..
        } = &mut *s;
        presenter.apply(engine.scene(), &changes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timebase_is_microsecond() {
        let tb = timebase();
        assert_eq!(tb.ticks_to_nanos(1), 1000);
        assert_eq!(tb.ticks_to_nanos(1_000_000), 1_000_000_000);
    }
}
