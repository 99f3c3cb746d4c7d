//! Shell - Terminal event pump.
//!
//! Wires the crate to a real terminal: detects the initial size through
//! crossterm, then polls events and pumps the timer queue and mutation
//! deliveries every tick. Resize events land in [`viewport::set_size`],
//! which is what clamp controllers subscribe to.
//!
//! # Example
//!
//! ```ignore
//! use crossterm::event::Event;
//! use lineclamp::shell;
//!
//! shell::detect_size()?;
//! shell::run(|event| matches!(event, Some(Event::Key(_))))?;
//! ```

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event};
use crossterm::terminal;

use crate::{dom, timers, viewport};

/// Poll timeout per tick (roughly sixty ticks per second).
const TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Read the terminal size from crossterm into the viewport.
pub fn detect_size() -> io::Result<()> {
    let (width, height) = terminal::size()?;
    viewport::set_size(width, height);
    Ok(())
}

/// Run one pump iteration: poll the terminal briefly, route resize
/// events into the viewport, fire due timers, and deliver queued
/// mutation records.
///
/// Returns the event read, if any, so callers can layer their own input
/// handling on top.
pub fn tick() -> io::Result<Option<Event>> {
    let polled = if event::poll(TICK_INTERVAL)? {
        Some(event::read()?)
    } else {
        None
    };

    if let Some(Event::Resize(width, height)) = &polled {
        viewport::set_size(*width, *height);
    }

    timers::run_due(Instant::now());
    dom::deliver_mutations();

    Ok(polled)
}

/// Pump until `should_stop` returns true. The callback sees every event
/// that arrives, and `None` on idle ticks.
pub fn run(mut should_stop: impl FnMut(Option<&Event>) -> bool) -> io::Result<()> {
    loop {
        let event = tick()?;
        if should_stop(event.as_ref()) {
            return Ok(());
        }
    }
}
