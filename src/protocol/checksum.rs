//! CRC-32 accumulator
//!
//! Parameterised in the Rocksoft model (poly / init / reflect / xorout).
//! The standard CRC-32 configuration used by data messages runs on
//! `crc32fast`; any other configuration falls back to a bitwise engine.

/// CRC-32 parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrcConfig {
    /// Generator polynomial, normal (MSB-first) representation
    pub poly: u32,
    /// Register value before the first byte
    pub init: u32,
    /// XOR applied to the final register
    pub xor_out: u32,
    /// Reflect each input byte
    pub reflect_in: bool,
    /// Reflect the final register
    pub reflect_out: bool,
}

/// Standard CRC-32 (ISO-HDLC), the configuration used on the wire
pub const CRC_32: CrcConfig = CrcConfig {
    poly: 0x04C1_1DB7,
    init: 0xFFFF_FFFF,
    xor_out: 0xFFFF_FFFF,
    reflect_in: true,
    reflect_out: true,
};

enum State {
    Fast(crc32fast::Hasher),
    Bitwise(u32),
}

/// Running checksum over a byte stream
pub struct Checksum {
    config: CrcConfig,
    state: State,
}

impl Checksum {
    /// Accumulator for `config`
    pub fn new(config: CrcConfig) -> Self {
        Self {
            config,
            state: Self::initial_state(&config),
        }
    }

    /// Accumulator for the standard CRC-32
    pub fn standard() -> Self {
        Self::new(CRC_32)
    }

    fn initial_state(config: &CrcConfig) -> State {
        if *config == CRC_32 {
            State::Fast(crc32fast::Hasher::new())
        } else {
            State::Bitwise(config.init)
        }
    }

    pub fn config(&self) -> &CrcConfig {
        &self.config
    }

    /// Discard everything fed so far
    pub fn reset(&mut self) {
        self.state = Self::initial_state(&self.config);
    }

    /// Feed `bytes` in order
    pub fn update(&mut self, bytes: &[u8]) {
        match &mut self.state {
            State::Fast(hasher) => hasher.update(bytes),
            State::Bitwise(reg) => {
                for &byte in bytes {
                    let byte = if self.config.reflect_in { byte.reverse_bits() } else { byte };
                    *reg ^= (byte as u32) << 24;
                    for _ in 0..8 {
                        *reg = if *reg & 0x8000_0000 != 0 {
                            (*reg << 1) ^ self.config.poly
                        } else {
                            *reg << 1
                        };
                    }
                }
            }
        }
    }

    /// Checksum of everything fed since the last reset
    pub fn value(&self) -> u32 {
        match &self.state {
            State::Fast(hasher) => hasher.clone().finalize(),
            State::Bitwise(reg) => {
                let reg = if self.config.reflect_out { reg.reverse_bits() } else { *reg };
                reg ^ self.config.xor_out
            }
        }
    }
}

impl Default for Checksum {
    fn default() -> Self {
        Self::standard()
    }
}

/// One-shot standard CRC-32 of `bytes`
pub fn crc32(bytes: &[u8]) -> u32 {
    crc32fast::hash(bytes)
}
