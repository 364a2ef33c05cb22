use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

pub const ROM_EXTENSION: &str = "ch8";

/// Draws the sixteen hex glyphs in two rows, waits for a key, starts over.
#[rustfmt::skip]
const HEX_DIGITS: [u8; 32] = [
    0x00, 0xE0, // 200 CLS
    0x60, 0x00, // 202 LD V0, 0      digit
    0x61, 0x00, // 204 LD V1, 0      x
    0x62, 0x00, // 206 LD V2, 0      y
    0xF0, 0x29, // 208 LD F, V0
    0xD1, 0x25, // 20A DRW V1, V2, 5
    0x70, 0x01, // 20C ADD V0, 1
    0x71, 0x08, // 20E ADD V1, 8
    0x31, 0x40, // 210 SE V1, 64
    0x12, 0x08, // 212 JP 208
    0x61, 0x00, // 214 LD V1, 0
    0x72, 0x06, // 216 ADD V2, 6
    0x30, 0x10, // 218 SE V0, 16
    0x12, 0x08, // 21A JP 208
    0xF0, 0x0A, // 21C LD V0, K
    0x12, 0x00, // 21E JP 200
];

/// Shows the glyph of the last key pressed and beeps.
#[rustfmt::skip]
const KEYPAD_ECHO: [u8; 20] = [
    0x00, 0xE0, // 200 CLS
    0xF0, 0x0A, // 202 LD V0, K
    0x00, 0xE0, // 204 CLS
    0xF0, 0x29, // 206 LD F, V0
    0x61, 0x1C, // 208 LD V1, 28
    0x62, 0x0D, // 20A LD V2, 13
    0xD1, 0x25, // 20C DRW V1, V2, 5
    0x63, 0x08, // 20E LD V3, 8
    0xF3, 0x18, // 210 LD ST, V3
    0x12, 0x02, // 212 JP 202
];

pub const EMBEDDED: [(&str, &[u8]); 2] = [
    ("Hex digits", &HEX_DIGITS),
    ("Keypad echo", &KEYPAD_ECHO),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RomSource {
    Embedded(&'static [u8]),
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomEntry {
    pub name: String,
    pub source: RomSource,
}

impl RomEntry {
    pub fn from_path(path: PathBuf) -> Self {
        Self {
            name: display_name(&path),
            source: RomSource::File(path),
        }
    }

    pub fn read(&self) -> io::Result<Vec<u8>> {
        match &self.source {
            RomSource::Embedded(bytes) => Ok(bytes.to_vec()),
            RomSource::File(path) => fs::read(path),
        }
    }
}

/// File name without its extension.
pub fn display_name(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Everything the menu can offer: the built-in ROMs first, then the ROM
/// files found in a directory, sorted by name.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    entries: Vec<RomEntry>,
}

impl Catalogue {
    pub fn embedded() -> Self {
        let entries = EMBEDDED
            .iter()
            .map(|&(name, bytes)| RomEntry {
                name: name.to_owned(),
                source: RomSource::Embedded(bytes),
            })
            .collect();
        Self { entries }
    }

    /// A missing directory is not an error, there just won't be any files.
    pub fn discover(dir: &Path) -> io::Result<Self> {
        let mut catalogue = Self::embedded();

        let listing = match fs::read_dir(dir) {
            Ok(listing) => listing,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!(dir = %dir.display(), "ROM directory not found");
                return Ok(catalogue);
            }
            Err(err) => return Err(err),
        };

        let mut files = Vec::new();
        for entry in listing {
            let path = entry?.path();
            let is_rom = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(ROM_EXTENSION));
            if is_rom && path.is_file() {
                files.push(RomEntry::from_path(path));
            }
        }
        files.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        debug!(dir = %dir.display(), count = files.len(), "discovered ROM files");

        catalogue.entries.extend(files);
        Ok(catalogue)
    }

    pub fn entries(&self) -> &[RomEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&RomEntry> {
        self.entries.get(index)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries().iter().map(|entry| entry.name.clone()).collect()
    }
}
