//! Configuration for blaeck-tcp
//!
//! Centralized configuration with sensible defaults.

use crate::error::{BlaeckError, Result};
use crate::signal::MAX_SIGNALS;

/// Message ID used for scheduler-triggered data messages unless overridden
pub const DEFAULT_TIMED_MESSAGE_ID: u32 = 185_273_099;

/// Upper bound on client slots (one bit per slot in the broadcast mask)
pub const MAX_CLIENT_SLOTS: usize = 32;

/// Main configuration for an engine instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Signal Configuration
    // -------------------------------------------------------------------------
    /// Fixed registry capacity
    pub max_signals: usize,

    // -------------------------------------------------------------------------
    // Client Configuration
    // -------------------------------------------------------------------------
    /// Number of client slots
    pub max_clients: usize,

    /// Bit N set: slot N receives data messages (periodic and triggered)
    pub data_client_mask: u32,

    /// Send a plain-text greeting to newly accepted clients
    pub send_greeting: bool,

    // -------------------------------------------------------------------------
    // Protocol Configuration
    // -------------------------------------------------------------------------
    /// Wire format generation (message keys and optional fields)
    pub protocol_version: ProtocolVersion,

    /// Timestamp attached to data messages
    pub timestamp_mode: TimestampMode,

    /// Message ID for scheduler-triggered sends
    pub timed_message_id: u32,

    /// Message ID for host calls that do not supply one
    pub default_message_id: u32,

    /// Capacity of the per-connection command buffer (C-1 bytes are kept)
    pub frame_capacity: usize,

    /// Max bytes pulled from a connection per read call
    pub read_chunk_size: usize,

    /// When the command hook fires
    pub command_hook_policy: CommandHookPolicy,

    // -------------------------------------------------------------------------
    // Device Identity
    // -------------------------------------------------------------------------
    /// Reported as "Unknown" when empty
    pub device_name: String,

    /// Reported as "n/a" when empty
    pub hw_version: String,

    /// Reported as "n/a" when empty
    pub fw_version: String,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address (used by the server binary)
    pub listen_addr: String,
}

/// Wire format generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVersion {
    /// Device info `0xB4`, data `0xB1` without restart flag or timestamp
    V4,

    /// Device info `0xB5` with restart flag, data `0xD1` with restart flag and timestamp
    V5,
}

/// Timestamp carried by data messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TimestampMode {
    /// No timestamp field
    None = 0,

    /// Monotonic microseconds from the engine clock (truncated to 32 bits)
    Micros = 1,

    /// Externally supplied by a [`TimestampSource`](crate::hooks::TimestampSource)
    Rtc = 2,
}

impl TimestampMode {
    /// Mode byte as written on the wire
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Parse a wire mode byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(TimestampMode::None),
            1 => Some(TimestampMode::Micros),
            2 => Some(TimestampMode::Rtc),
            _ => None,
        }
    }
}

/// Which parsed commands are handed to the command hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandHookPolicy {
    /// Every parsed frame, after the built-in action (if any) ran
    AllCommands,

    /// Only frames whose verb is not a built-in command
    UnrecognizedOnly,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_signals: 64,
            max_clients: 1,
            data_client_mask: 0b1,
            send_greeting: true,
            protocol_version: ProtocolVersion::V5,
            timestamp_mode: TimestampMode::None,
            timed_message_id: DEFAULT_TIMED_MESSAGE_ID,
            default_message_id: 1,
            frame_capacity: 64,
            read_chunk_size: 64,
            command_hook_policy: CommandHookPolicy::AllCommands,
            device_name: String::new(),
            hw_version: String::new(),
            fw_version: String::new(),
            listen_addr: "0.0.0.0:23".to_string(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Whether client slot `slot` receives data messages
    pub fn data_enabled(&self, slot: usize) -> bool {
        slot < MAX_CLIENT_SLOTS && (self.data_client_mask >> slot) & 1 == 1
    }

    /// Mask with one bit set per configured slot
    pub fn all_clients_mask(max_clients: usize) -> u32 {
        if max_clients >= MAX_CLIENT_SLOTS {
            u32::MAX
        } else {
            (1u32 << max_clients) - 1
        }
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
    mask_set: bool,
}

impl ConfigBuilder {
    /// Set the registry capacity
    pub fn max_signals(mut self, count: usize) -> Self {
        self.config.max_signals = count;
        self
    }

    /// Set the number of client slots
    ///
    /// Unless [`data_client_mask`](Self::data_client_mask) is called, every
    /// slot receives data messages.
    pub fn max_clients(mut self, count: usize) -> Self {
        self.config.max_clients = count;
        self
    }

    /// Set the broadcast-enable bitmask
    pub fn data_client_mask(mut self, mask: u32) -> Self {
        self.config.data_client_mask = mask;
        self.mask_set = true;
        self
    }

    /// Enable or disable the greeting sent on accept
    pub fn send_greeting(mut self, enabled: bool) -> Self {
        self.config.send_greeting = enabled;
        self
    }

    /// Set the wire format generation
    pub fn protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.config.protocol_version = version;
        self
    }

    /// Set the timestamp mode for data messages
    pub fn timestamp_mode(mut self, mode: TimestampMode) -> Self {
        self.config.timestamp_mode = mode;
        self
    }

    /// Set the message ID for scheduler-triggered sends
    pub fn timed_message_id(mut self, id: u32) -> Self {
        self.config.timed_message_id = id;
        self
    }

    /// Set the message ID used when the host supplies none
    pub fn default_message_id(mut self, id: u32) -> Self {
        self.config.default_message_id = id;
        self
    }

    /// Set the command buffer capacity
    pub fn frame_capacity(mut self, capacity: usize) -> Self {
        self.config.frame_capacity = capacity;
        self
    }

    /// Set the per-call read chunk size
    pub fn read_chunk_size(mut self, size: usize) -> Self {
        self.config.read_chunk_size = size;
        self
    }

    /// Set when the command hook fires
    pub fn command_hook_policy(mut self, policy: CommandHookPolicy) -> Self {
        self.config.command_hook_policy = policy;
        self
    }

    /// Set the device name reported in device-info messages
    pub fn device_name(mut self, name: impl Into<String>) -> Self {
        self.config.device_name = name.into();
        self
    }

    /// Set the hardware version reported in device-info messages
    pub fn hw_version(mut self, version: impl Into<String>) -> Self {
        self.config.hw_version = version.into();
        self
    }

    /// Set the firmware version reported in device-info messages
    pub fn fw_version(mut self, version: impl Into<String>) -> Self {
        self.config.fw_version = version.into();
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Validate and build the config
    pub fn build(mut self) -> Result<Config> {
        let config = &mut self.config;

        if config.max_clients == 0 || config.max_clients > MAX_CLIENT_SLOTS {
            return Err(BlaeckError::Config(format!(
                "max_clients must be in 1..={}, got {}",
                MAX_CLIENT_SLOTS, config.max_clients
            )));
        }
        if config.max_signals == 0 || config.max_signals > MAX_SIGNALS {
            return Err(BlaeckError::Config(format!(
                "max_signals must be in 1..={}, got {}",
                MAX_SIGNALS, config.max_signals
            )));
        }
        if config.frame_capacity < 2 {
            return Err(BlaeckError::Config(format!(
                "frame_capacity must be >= 2, got {}",
                config.frame_capacity
            )));
        }
        if config.read_chunk_size == 0 {
            return Err(BlaeckError::Config("read_chunk_size must be > 0".to_string()));
        }

        if !self.mask_set {
            config.data_client_mask = Config::all_clients_mask(config.max_clients);
        }

        Ok(self.config)
    }
}
