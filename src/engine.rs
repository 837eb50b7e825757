//! Engine Module
//!
//! The protocol engine that coordinates all components.
//!
//! ## Responsibilities
//! - Own the signal registry and the client slots
//! - Run the poll cycle: accept, read, parse, dispatch, disconnect cleanup
//! - Encode messages and fan them out to clients
//! - Gate periodic data transmission
//!
//! ## Concurrency Model: single-threaded polling
//!
//! Nothing in the engine blocks or spawns threads. The host calls
//! [`Engine::read`] (or [`Engine::tick`]) from its main loop; each call
//! performs one cycle and returns. Signal storage is shared with the host
//! through [`Variable`] handles.

use bytes::{Bytes, BytesMut};

use crate::clock::{Clock, SystemClock};
use crate::config::{CommandHookPolicy, Config, ProtocolVersion, TimestampMode};
use crate::error::Result;
use crate::hooks::{BeforeWriteHook, CommandHook, TimestampSource};
use crate::network::{Connection, Listener};
use crate::protocol::{Command, CommandFrame, DataHeader, DeviceInfo, FrameParser, MessageEncoder, RawFrame, Selection};
use crate::scheduler::Scheduler;
use crate::signal::{Scalar, SignalRegistry, Variable};

/// Engine name reported in device-info messages
pub const ENGINE_NAME: &str = "BlaeckTCP";

/// One client slot
struct ClientSlot<C> {
    id: usize,
    conn: Option<C>,
    data_enabled: bool,
    parser: FrameParser,
    pending: BytesMut,
}

impl<C: Connection> ClientSlot<C> {
    fn is_connected(&self) -> bool {
        self.conn.as_ref().map_or(false, |c| c.connected())
    }

    /// Write to the client; a failed write closes the connection
    fn send(&mut self, bytes: &[u8]) -> bool {
        let Some(conn) = self.conn.as_mut() else {
            return false;
        };
        match conn.write(bytes) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Write to client #{} failed: {}", self.id, e);
                conn.close();
                false
            }
        }
    }

    fn release(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            conn.close();
        }
        self.parser.reset();
        self.pending.clear();
    }
}

/// The protocol engine
pub struct Engine<L: Listener, K: Clock = SystemClock> {
    /// Engine configuration
    config: Config,

    /// Source of new client connections
    listener: L,

    /// Time source for the scheduler and microsecond timestamps
    clock: K,

    /// Registered signals
    registry: SignalRegistry,

    /// Outbound message encoder
    encoder: MessageEncoder,

    /// Client slots, index = slot number
    clients: Vec<ClientSlot<L::Conn>>,

    /// Periodic transmission gate
    scheduler: Scheduler,

    /// Set until the first device-info message went out
    server_restarted: bool,

    /// Set until the first data message went out
    send_restart_flag: bool,

    timestamp_mode: TimestampMode,

    command_hook: Option<Box<dyn CommandHook>>,
    before_write_hook: Option<Box<dyn BeforeWriteHook>>,
    timestamp_source: Option<Box<dyn TimestampSource>>,

    /// Scratch buffer for connection reads
    read_buf: Vec<u8>,
}

impl<L: Listener> Engine<L, SystemClock> {
    /// Create an engine on the system clock
    pub fn new(config: Config, listener: L) -> Self {
        Self::with_clock(config, listener, SystemClock::new())
    }
}

impl<L: Listener, K: Clock> Engine<L, K> {
    /// Create an engine with an explicit clock
    pub fn with_clock(config: Config, listener: L, clock: K) -> Self {
        let clients = (0..config.max_clients)
            .map(|id| ClientSlot {
                id,
                conn: None,
                data_enabled: config.data_enabled(id),
                parser: FrameParser::new(config.frame_capacity),
                pending: BytesMut::new(),
            })
            .collect::<Vec<_>>();

        let enabled: Vec<String> = clients
            .iter()
            .filter(|c| c.data_enabled)
            .map(|c| format!("#{}", c.id))
            .collect();
        tracing::info!("{} v{}", ENGINE_NAME, crate::VERSION);
        tracing::info!("Max clients allowed: {}", config.max_clients);
        tracing::info!(
            "Clients receiving data messages: {}",
            if enabled.is_empty() { "none".to_string() } else { enabled.join(", ") }
        );

        Self {
            registry: SignalRegistry::new(config.max_signals),
            encoder: MessageEncoder::new(config.protocol_version),
            timestamp_mode: config.timestamp_mode,
            read_buf: vec![0u8; config.read_chunk_size],
            scheduler: Scheduler::new(),
            server_restarted: true,
            send_restart_flag: true,
            command_hook: None,
            before_write_hook: None,
            timestamp_source: None,
            clients,
            config,
            listener,
            clock,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &SignalRegistry {
        &self.registry
    }

    pub fn clock(&self) -> &K {
        &self.clock
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    // =========================================================================
    // Signals
    // =========================================================================

    /// Register a signal bound to `variable`; returns its index
    pub fn add_signal<T: Scalar>(&mut self, name: impl Into<String>, variable: &Variable<T>) -> Result<usize> {
        self.registry.register(name, variable)
    }

    /// Remove all signals
    pub fn delete_signals(&mut self) {
        self.registry.clear();
    }

    pub fn signal_count(&self) -> usize {
        self.registry.len()
    }

    /// Set a signal's value and mark it updated; ignored on kind mismatch
    pub fn update<T: Scalar>(&mut self, index: usize, value: T) -> bool {
        self.registry.update(index, value.into_wire())
    }

    pub fn update_by_name<T: Scalar>(&mut self, name: &str, value: T) -> bool {
        match self.registry.find(name) {
            Some(index) => self.update(index, value),
            None => false,
        }
    }

    /// Set a signal's value and broadcast it immediately
    pub fn write<T: Scalar>(&mut self, index: usize, value: T) -> bool {
        let message_id = self.config.default_message_id;
        self.write_with(index, value, message_id)
    }

    /// [`write`](Self::write) with an explicit message ID
    pub fn write_with<T: Scalar>(&mut self, index: usize, value: T, message_id: u32) -> bool {
        if !self.registry.set(index, value) {
            return false;
        }
        let timestamp = self.current_timestamp();
        self.send_data(message_id, Selection::Range(index..=index), timestamp);
        true
    }

    pub fn write_by_name<T: Scalar>(&mut self, name: &str, value: T) -> bool {
        match self.registry.find(name) {
            Some(index) => self.write(index, value),
            None => false,
        }
    }

    pub fn mark_signal_updated(&mut self, index: usize) -> bool {
        self.registry.mark_dirty(index)
    }

    pub fn mark_signal_updated_by_name(&mut self, name: &str) -> bool {
        self.registry.mark_dirty_by_name(name)
    }

    pub fn mark_all_signals_updated(&mut self) {
        self.registry.mark_all_dirty();
    }

    pub fn clear_all_update_flags(&mut self) {
        self.registry.clear_dirty();
    }

    pub fn has_updated_signals(&self) -> bool {
        self.registry.any_dirty()
    }

    // =========================================================================
    // Hooks & Timestamps
    // =========================================================================

    pub fn set_command_hook(&mut self, hook: impl CommandHook + 'static) {
        self.command_hook = Some(Box::new(hook));
    }

    pub fn set_before_write_hook(&mut self, hook: impl BeforeWriteHook + 'static) {
        self.before_write_hook = Some(Box::new(hook));
    }

    pub fn set_timestamp_source(&mut self, source: impl TimestampSource + 'static) {
        self.timestamp_source = Some(Box::new(source));
    }

    pub fn set_timestamp_mode(&mut self, mode: TimestampMode) {
        self.timestamp_mode = mode;
    }

    pub fn timestamp_mode(&self) -> TimestampMode {
        self.timestamp_mode
    }

    /// Timestamp for the next data message; `None` when no timestamp is sent
    ///
    /// RTC mode without a source degrades to no timestamp.
    fn current_timestamp(&mut self) -> Option<u32> {
        match self.timestamp_mode {
            TimestampMode::None => None,
            TimestampMode::Micros => Some(self.clock.micros() as u32),
            TimestampMode::Rtc => self.timestamp_source.as_mut().map(|s| s.timestamp()),
        }
    }

    // =========================================================================
    // Clients
    // =========================================================================

    /// Slots that currently hold a live connection
    pub fn connected_clients(&self) -> Vec<usize> {
        self.clients.iter().filter(|c| c.is_connected()).map(|c| c.id).collect()
    }

    fn accept_client(&mut self) {
        let conn = match self.listener.accept() {
            Ok(Some(conn)) => conn,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!("Accept failed: {}", e);
                return;
            }
        };

        let Some(slot) = self.clients.iter_mut().find(|c| c.conn.is_none()) else {
            tracing::warn!("No free client slot, rejecting {}", conn.peer_addr());
            let mut conn = conn;
            conn.close();
            return;
        };

        tracing::info!("New client #{} from {}", slot.id, conn.peer_addr());
        slot.conn = Some(conn);

        if self.config.send_greeting {
            let greeting = format!(
                "Hello, client number: {}\r\n{}\r\n",
                slot.id,
                if slot.data_enabled {
                    "You are enabled to receive data messages."
                } else {
                    "Receiving data messages was disabled for you."
                }
            );
            slot.send(greeting.as_bytes());
        }
    }

    fn release_disconnected(&mut self) {
        for slot in self.clients.iter_mut() {
            if slot.conn.is_some() && !slot.is_connected() {
                slot.release();
                tracing::info!("Client #{} disconnected", slot.id);
            }
        }
    }

    // =========================================================================
    // Poll Cycle
    // =========================================================================

    /// One poll cycle
    ///
    /// Accepts at most one connection, reads every client and dispatches at
    /// most one command frame per client, then frees disconnected slots.
    pub fn read(&mut self) {
        self.accept_client();

        for slot_id in 0..self.clients.len() {
            if let Some(frame) = self.read_client(slot_id) {
                self.dispatch(slot_id, &frame);
            }
        }

        self.release_disconnected();
    }

    /// Pull bytes from a client until one frame completes
    ///
    /// Reading stops at the first completed frame; bytes the parser has not
    /// seen stay in the transport, so a fast sender is throttled by TCP
    /// instead of growing engine buffers. `pending` never holds more than
    /// one read chunk.
    fn read_client(&mut self, slot_id: usize) -> Option<RawFrame> {
        let slot = &mut self.clients[slot_id];
        slot.conn.as_ref()?;

        let mut frame = slot.parser.feed(&mut slot.pending);

        while frame.is_none() {
            let Some(conn) = slot.conn.as_mut().filter(|c| c.connected()) else {
                break;
            };
            let available = conn.available();
            if available == 0 {
                break;
            }
            let want = available.min(self.read_buf.len());
            let n = conn.read(&mut self.read_buf[..want]);
            if n == 0 {
                break;
            }
            slot.pending.extend_from_slice(&self.read_buf[..n]);
            frame = slot.parser.feed(&mut slot.pending);
        }

        let frame = frame?;
        if frame.was_truncated() {
            tracing::debug!(
                "Command from client #{} truncated to {} bytes",
                slot_id,
                frame.as_bytes().len()
            );
        }
        Some(frame)
    }

    /// Execute one command frame received from `slot_id`
    fn dispatch(&mut self, slot_id: usize, raw: &RawFrame) {
        let frame = CommandFrame::parse(raw.as_bytes());
        tracing::debug!("Client #{}: <{}>", slot_id, raw.to_string_lossy());

        let command = Command::from_frame(&frame);
        match command {
            Some(Command::WriteSymbols { message_id }) => self.send_symbols_to(slot_id, message_id),
            Some(Command::WriteData { message_id }) => {
                let timestamp = self.current_timestamp();
                self.send_data(message_id, Selection::All, timestamp);
            }
            Some(Command::GetDevices { message_id }) => self.send_devices_to(slot_id, message_id),
            Some(Command::Activate { interval_ms }) => self.set_timed_data(true, interval_ms as u64),
            Some(Command::Deactivate) => {
                let interval = self.scheduler.interval_ms();
                self.set_timed_data(false, interval);
            }
            None => tracing::trace!("Unrecognized command '{}' from client #{}", frame.verb, slot_id),
        }

        let invoke = match self.config.command_hook_policy {
            CommandHookPolicy::AllCommands => true,
            CommandHookPolicy::UnrecognizedOnly => command.is_none(),
        };
        if invoke {
            if let Some(hook) = self.command_hook.as_mut() {
                hook.on_command(&frame);
            }
        }
    }

    // =========================================================================
    // Device Info & Symbols
    // =========================================================================

    /// Send device info to every connected client
    pub fn write_devices(&mut self, message_id: u32) {
        for slot_id in 0..self.clients.len() {
            if self.clients[slot_id].is_connected() {
                self.send_devices_to(slot_id, message_id);
            }
        }
    }

    fn send_devices_to(&mut self, slot_id: usize, message_id: u32) {
        let slot = &mut self.clients[slot_id];
        let info = DeviceInfo {
            device_name: &self.config.device_name,
            hw_version: &self.config.hw_version,
            fw_version: &self.config.fw_version,
            engine_version: crate::VERSION,
            engine_name: ENGINE_NAME,
            client_slot: slot.id,
            data_enabled: slot.data_enabled,
            server_restarted: self.server_restarted,
        };
        let message = self.encoder.device_info(message_id, &info);

        if slot.send(&message) && self.encoder.version() == ProtocolVersion::V5 {
            self.server_restarted = false;
        }
    }

    /// Send the full symbol table to every connected client
    pub fn write_symbols(&mut self, message_id: u32) {
        let message = self.encoder.symbol_table(message_id, &self.registry, &Selection::All);
        for slot in self.clients.iter_mut().filter(|c| c.is_connected()) {
            slot.send(&message);
        }
    }

    fn send_symbols_to(&mut self, slot_id: usize, message_id: u32) {
        let message = self.encoder.symbol_table(message_id, &self.registry, &Selection::All);
        self.clients[slot_id].send(&message);
    }

    // =========================================================================
    // Data
    // =========================================================================

    /// Broadcast every signal to data-enabled clients
    pub fn write_all_data(&mut self, message_id: u32) -> bool {
        let timestamp = self.current_timestamp();
        self.send_data(message_id, Selection::All, timestamp)
    }

    /// [`write_all_data`](Self::write_all_data) with a caller-supplied timestamp
    pub fn write_all_data_at(&mut self, message_id: u32, timestamp: u32) -> bool {
        self.send_data(message_id, Selection::All, Some(timestamp))
    }

    /// Broadcast signals marked updated, then clear their flags
    pub fn write_updated_data(&mut self, message_id: u32) -> bool {
        let timestamp = self.current_timestamp();
        self.send_data(message_id, Selection::Updated, timestamp)
    }

    /// [`write_updated_data`](Self::write_updated_data) with a caller-supplied timestamp
    pub fn write_updated_data_at(&mut self, message_id: u32, timestamp: u32) -> bool {
        self.send_data(message_id, Selection::Updated, Some(timestamp))
    }

    /// Broadcast signals `start..=end`; the end is clamped to the registry
    pub fn write_data_range(&mut self, start: usize, end: usize, message_id: u32) -> bool {
        self.write_data(message_id, Selection::Range(start..=end))
    }

    /// Broadcast an arbitrary selection of signals
    pub fn write_data(&mut self, message_id: u32, selection: Selection) -> bool {
        let timestamp = self.current_timestamp();
        self.send_data(message_id, selection, timestamp)
    }

    /// Encode once and send to every connected, data-enabled client
    ///
    /// Returns whether at least one client received the message. Nothing is
    /// sent (and no state changes) when the selection is empty or no client
    /// qualifies.
    fn send_data(&mut self, message_id: u32, selection: Selection, timestamp: Option<u32>) -> bool {
        let targets: Vec<usize> = self
            .clients
            .iter()
            .filter(|c| c.data_enabled && c.is_connected())
            .map(|c| c.id)
            .collect();
        if targets.is_empty() {
            return false;
        }

        let indices = selection.resolve(&self.registry);
        if indices.is_empty() {
            return false;
        }

        if let Some(hook) = self.before_write_hook.as_mut() {
            hook.before_write();
        }

        let header = DataHeader {
            restart: self.send_restart_flag,
            timestamp: timestamp
                .filter(|_| self.timestamp_mode != TimestampMode::None)
                .map(|ts| (self.timestamp_mode, ts)),
        };
        let Some(message) = self.encoder.data(message_id, &self.registry, &indices, header) else {
            return false;
        };

        let delivered = self.broadcast(&targets, &message);
        if delivered {
            self.send_restart_flag = false;
            if selection == Selection::Updated {
                for &index in &indices {
                    self.registry.clear_dirty_range(index, index);
                }
            }
        }
        delivered
    }

    fn broadcast(&mut self, targets: &[usize], message: &Bytes) -> bool {
        tracing::trace!("Sending {} byte data message to {} client(s)", message.len(), targets.len());
        let mut delivered = false;
        for &slot_id in targets {
            delivered |= self.clients[slot_id].send(message);
        }
        delivered
    }

    // =========================================================================
    // Timed Data
    // =========================================================================

    /// Enable periodic data at `interval_ms`, or disable keeping the interval
    pub fn set_timed_data(&mut self, enabled: bool, interval_ms: u64) {
        self.scheduler.configure(enabled, interval_ms);
        if enabled {
            tracing::info!("Timed data activated, interval {} ms", interval_ms);
        } else {
            tracing::info!("Timed data deactivated");
        }
    }

    pub fn timed_data_enabled(&self) -> bool {
        self.scheduler.is_enabled()
    }

    pub fn timed_interval_ms(&self) -> u64 {
        self.scheduler.interval_ms()
    }

    /// Broadcast all signals if the periodic gate is due
    pub fn timed_write_all_data(&mut self) -> bool {
        let message_id = self.config.timed_message_id;
        self.timed_write(message_id, Selection::All)
    }

    /// Broadcast updated signals if the periodic gate is due
    pub fn timed_write_updated_data(&mut self) -> bool {
        let message_id = self.config.timed_message_id;
        self.timed_write(message_id, Selection::Updated)
    }

    fn timed_write(&mut self, message_id: u32, selection: Selection) -> bool {
        if !self.scheduler.poll(self.clock.millis()) {
            return false;
        }
        let timestamp = self.current_timestamp();
        self.send_data(message_id, selection, timestamp)
    }

    /// Poll cycle followed by a timed write of all signals
    pub fn tick(&mut self) -> bool {
        self.read();
        self.timed_write_all_data()
    }

    /// Poll cycle followed by a timed write of updated signals
    pub fn tick_updated(&mut self) -> bool {
        self.read();
        self.timed_write_updated_data()
    }
}
