//! blaeck-tcp CLI Client
//!
//! Command-line interface for talking to a BlaeckTCP device.

use std::net::TcpStream;
use std::time::Duration;

use blaeck_tcp::protocol::{
    decode_data, decode_device_info, decode_symbol_table, read_message, write_command, Command, DataMessage,
    RawMessage, SymbolEntry, KEY_DATA_V4, KEY_DATA_V5, KEY_DEVICES_V4, KEY_DEVICES_V5, KEY_SYMBOLS,
};
use blaeck_tcp::{BlaeckError, Result};
use bytes::BytesMut;
use clap::{Parser, Subcommand};

/// blaeck-tcp CLI
#[derive(Parser, Debug)]
#[command(name = "blaeck-cli")]
#[command(about = "CLI for BlaeckTCP telemetry devices")]
#[command(version)]
struct Args {
    /// Device address
    #[arg(short, long, default_value = "127.0.0.1:23")]
    server: String,

    /// Message ID to tag requests with
    #[arg(short, long, default_value = "1")]
    id: u32,

    /// Read timeout in seconds
    #[arg(short, long, default_value = "5")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print device information
    Devices,

    /// Print the symbol table
    Symbols,

    /// Print one snapshot of all signal values
    Data,

    /// Start periodic data and print incoming messages
    Activate {
        /// Interval in milliseconds
        interval: u32,

        /// Stop after this many data messages
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,
    },

    /// Stop periodic data
    Deactivate,
}

/// Connection to a device with its receive buffer
struct Client {
    stream: TcpStream,
    buf: BytesMut,
}

impl Client {
    fn connect(addr: &str, timeout: Duration) -> Result<Self> {
        let stream = TcpStream::connect(addr).map_err(|e| BlaeckError::Network(format!("Connect to {} failed: {}", addr, e)))?;
        stream.set_read_timeout(Some(timeout))?;
        Ok(Self {
            stream,
            buf: BytesMut::new(),
        })
    }

    fn send(&mut self, command: Command) -> Result<()> {
        write_command(&mut self.stream, &command)
    }

    /// Next message with one of `keys`, skipping any other
    fn expect(&mut self, keys: &[u8]) -> Result<RawMessage> {
        loop {
            let message = read_message(&mut self.stream, &mut self.buf)?;
            if keys.contains(&message.key) {
                return Ok(message);
            }
        }
    }

    fn symbols(&mut self, message_id: u32) -> Result<Vec<SymbolEntry>> {
        self.send(Command::WriteSymbols { message_id })?;
        let raw = self.expect(&[KEY_SYMBOLS])?;
        Ok(decode_symbol_table(&raw)?.symbols)
    }
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let mut client = Client::connect(&args.server, Duration::from_secs(args.timeout))?;

    match args.command {
        Commands::Devices => {
            client.send(Command::GetDevices { message_id: args.id })?;
            let raw = client.expect(&[KEY_DEVICES_V4, KEY_DEVICES_V5])?;
            let info = decode_device_info(&raw)?;
            println!("Device:          {}", info.device_name);
            println!("Hardware:        {}", info.hw_version);
            println!("Firmware:        {}", info.fw_version);
            println!("Engine:          {} {}", info.engine_name, info.engine_version);
            println!("Client slot:     {}", info.client_slot);
            println!("Data enabled:    {}", info.data_enabled);
            if let Some(restarted) = info.server_restarted {
                println!("Server restarted: {}", restarted);
            }
        }
        Commands::Symbols => {
            for (index, symbol) in client.symbols(args.id)?.iter().enumerate() {
                println!("{:>3}  {:<24} {:?}", index, symbol.name, symbol.kind);
            }
        }
        Commands::Data => {
            let symbols = client.symbols(args.id)?;
            client.send(Command::WriteData { message_id: args.id })?;
            let raw = client.expect(&[KEY_DATA_V4, KEY_DATA_V5])?;
            print_data(&decode_data(&raw, &symbols)?, &symbols);
        }
        Commands::Activate { interval, count } => {
            let symbols = client.symbols(args.id)?;
            client.send(Command::Activate { interval_ms: interval })?;
            for _ in 0..count {
                let raw = client.expect(&[KEY_DATA_V4, KEY_DATA_V5])?;
                print_data(&decode_data(&raw, &symbols)?, &symbols);
            }
            client.send(Command::Deactivate)?;
        }
        Commands::Deactivate => {
            client.send(Command::Deactivate)?;
            println!("Deactivated");
        }
    }

    Ok(())
}

fn print_data(message: &DataMessage, symbols: &[SymbolEntry]) {
    let mut header = format!("[id {}]", message.message_id);
    if let Some(ts) = message.timestamp {
        header.push_str(&format!(" ts={} ({:?})", ts, message.timestamp_mode));
    }
    if message.restarted == Some(true) {
        header.push_str(" restarted");
    }
    println!("{}", header);

    for (index, value) in &message.entries {
        let name = symbols.get(*index as usize).map_or("?", |s| s.name.as_str());
        println!("  {:>3} {:<24} {}", index, name, value);
    }
}
