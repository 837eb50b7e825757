//! Application hooks
//!
//! Each hook is a single-method trait, invoked synchronously from the poll
//! cycle. Closures implement them directly:
//!
//! ```
//! use blaeck_tcp::hooks::CommandHook;
//! use blaeck_tcp::protocol::CommandFrame;
//!
//! let mut seen = Vec::new();
//! let mut hook = |frame: &CommandFrame| seen.push(frame.verb.clone());
//! hook.on_command(&CommandFrame::parse(b"LED,1"));
//! assert_eq!(seen, vec!["LED".to_string()]);
//! ```

use crate::protocol::CommandFrame;

/// Receives parsed command frames
pub trait CommandHook {
    fn on_command(&mut self, frame: &CommandFrame);
}

impl<F: FnMut(&CommandFrame)> CommandHook for F {
    fn on_command(&mut self, frame: &CommandFrame) {
        self(frame)
    }
}

/// Runs right before a data message is assembled
///
/// The usual place to refresh signal values that are expensive to sample.
pub trait BeforeWriteHook {
    fn before_write(&mut self);
}

impl<F: FnMut()> BeforeWriteHook for F {
    fn before_write(&mut self) {
        self()
    }
}

/// Supplies timestamps for [`TimestampMode::Rtc`](crate::config::TimestampMode::Rtc)
pub trait TimestampSource {
    fn timestamp(&mut self) -> u32;
}

impl<F: FnMut() -> u32> TimestampSource for F {
    fn timestamp(&mut self) -> u32 {
        self()
    }
}
