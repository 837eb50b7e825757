//! Signal Module
//!
//! Named, typed process variables exposed over the wire by index.
//!
//! ## Responsibilities
//! - Shared typed storage owned by the application (`Variable<T>`)
//! - Registration order as stable wire identifier
//! - Type-gated value writes and per-signal dirty flags
//! - Fixed-width little-endian value codec

mod kind;
mod registry;
mod variable;

pub use kind::{SignalKind, WireBytes, WireValue, MAX_VALUE_WIDTH, NATIVE_DOUBLE_KIND, NATIVE_INT_KIND};
pub use registry::{Signal, SignalRegistry, MAX_SIGNALS};
pub use variable::{Binding, Scalar, Variable};
