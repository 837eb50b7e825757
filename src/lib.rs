//! # blaeck-tcp
//!
//! A device-side telemetry engine speaking the BlaeckTCP protocol:
//! - Registry of named, typed signals bound to application variables
//! - Text command frames in, CRC-protected binary messages out
//! - Multi-client broadcast with per-slot data enable mask
//! - Drift-free periodic data transmission
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       TCP Listener                           │
//! │                 (Fixed Client Slots 0..N)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ <VERB,p0,...,p9>
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │           Frame Parser  →  Command Dispatcher                │
//! │              (one frame per client per cycle)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Scheduler  │          │   Signal    │
//!   │ (Interval)  │─────────▶│  Registry   │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │   Message   │
//!                           │   Encoder   │──▶ <BLAECK:...>
//!                           └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use blaeck_tcp::{Config, Engine, TcpServer, Variable};
//!
//! # fn main() -> blaeck_tcp::Result<()> {
//! let config = Config::builder().max_clients(2).device_name("Bench PSU").build()?;
//! let server = TcpServer::bind("0.0.0.0:23")?;
//! let mut engine = Engine::new(config, server);
//!
//! let voltage = Variable::new(0.0f32);
//! engine.add_signal("voltage", &voltage)?;
//!
//! loop {
//!     voltage.set(12.1);
//!     engine.tick();
//! }
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod signal;
pub mod protocol;
pub mod network;
pub mod scheduler;
pub mod clock;
pub mod hooks;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{BlaeckError, Result};
pub use config::{CommandHookPolicy, Config, ProtocolVersion, TimestampMode};
pub use engine::{Engine, ENGINE_NAME};
pub use network::{TcpConnection, TcpServer};
pub use signal::{SignalKind, Variable, WireValue};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of blaeck-tcp
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
