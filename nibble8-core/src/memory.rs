use tracing::debug;

use crate::{LoadError, MemoryError};

pub const MEMORY_SIZE: usize = 0x1000;
pub const PROGRAM_START: u16 = 0x200;
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;
pub const FONT_ADDRESS: u16 = 0x050;
pub const GLYPH_SIZE: u16 = 5;

pub const FONT: [u8; 16 * 5] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// A program image known to fit in the program area.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rom {
    bytes: Vec<u8>,
}

impl Rom {
    pub fn new(bytes: Vec<u8>) -> Result<Self, LoadError> {
        if bytes.len() > MAX_ROM_SIZE {
            return Err(LoadError::RomTooLarge {
                size: bytes.len(),
                max: MAX_ROM_SIZE,
            });
        }
        Ok(Self { bytes })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Flat 4K address space. The glyph set lives at `FONT_ADDRESS`, programs
/// are loaded at `PROGRAM_START`. Write protection of the low area is the
/// interpreter's business, not ours.
#[derive(Clone)]
pub struct AddressSpace {
    ram: Box<[u8; MEMORY_SIZE]>,
}

impl Default for AddressSpace {
    fn default() -> Self {
        let mut memory = Self {
            ram: Box::new([0; MEMORY_SIZE]),
        };
        memory.reset();
        memory
    }
}

impl AddressSpace {
    pub fn reset(&mut self) {
        self.ram.fill(0);
        let font_start = FONT_ADDRESS as usize;
        self.ram[font_start..font_start + FONT.len()].copy_from_slice(&FONT);
    }

    pub fn load(&mut self, program: &[u8]) -> Result<(), LoadError> {
        if program.len() > MAX_ROM_SIZE {
            return Err(LoadError::RomTooLarge {
                size: program.len(),
                max: MAX_ROM_SIZE,
            });
        }
        self.copy_program(program);
        Ok(())
    }

    pub fn place(&mut self, rom: &Rom) {
        self.copy_program(rom.bytes());
    }

    fn copy_program(&mut self, program: &[u8]) {
        let start = PROGRAM_START as usize;
        self.ram[start..start + program.len()].copy_from_slice(program);
        debug!(size = program.len(), "loaded program at {PROGRAM_START:#05X}");
    }

    pub fn read(&self, address: u16) -> Result<u8, MemoryError> {
        self.ram
            .get(address as usize)
            .copied()
            .ok_or(MemoryError::OutOfRange(address))
    }

    pub fn write(&mut self, address: u16, value: u8) -> Result<(), MemoryError> {
        let byte = self
            .ram
            .get_mut(address as usize)
            .ok_or(MemoryError::OutOfRange(address))?;
        *byte = value;
        Ok(())
    }

    /// Big-endian instruction word at `address`.
    pub fn word(&self, address: u16) -> Result<u16, MemoryError> {
        let high = self.read(address)?;
        let low = self.read(address.wrapping_add(1))?;
        Ok(u16::from_be_bytes([high, low]))
    }

    /// `len` bytes starting at `address`, or the first address that falls
    /// outside of memory.
    pub fn slice(&self, address: u16, len: usize) -> Result<&[u8], MemoryError> {
        let start = address as usize;
        self.ram.get(start..start + len).ok_or_else(|| {
            MemoryError::OutOfRange(MEMORY_SIZE.max(start).min(u16::MAX as usize) as u16)
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.ram[..]
    }
}
