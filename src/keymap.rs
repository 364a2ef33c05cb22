use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use nibble8_core::KEY_COUNT;

/// Left-hand side of a QWERTY keyboard, laid out like the COSMAC keypad:
///
/// ```text
/// 1 2 3 4      1 2 3 C
/// Q W E R  ->  4 5 6 D
/// A S D F      7 8 9 E
/// Z X C V      A 0 B F
/// ```
const CONVENTIONAL_KEYMAP: [(char, u8); KEY_COUNT] = [
    ('x', 0x0),
    ('1', 0x1),
    ('2', 0x2),
    ('3', 0x3),
    ('q', 0x4),
    ('w', 0x5),
    ('e', 0x6),
    ('a', 0x7),
    ('s', 0x8),
    ('d', 0x9),
    ('z', 0xA),
    ('c', 0xB),
    ('4', 0xC),
    ('r', 0xD),
    ('f', 0xE),
    ('v', 0xF),
];

pub fn map_key(code: KeyCode) -> Option<u8> {
    let KeyCode::Char(c) = code else {
        return None;
    };
    let c = c.to_ascii_lowercase();
    CONVENTIONAL_KEYMAP
        .iter()
        .find(|&&(key, _)| key == c)
        .map(|&(_, index)| index)
}

/// Terminals usually only report presses (and auto-repeats), never
/// releases. A key is treated as held until `hold` has passed without
/// hearing from it again.
#[derive(Debug, Clone)]
pub struct HeldKeys {
    hold: Duration,
    last_seen: [Option<Instant>; KEY_COUNT],
}

impl HeldKeys {
    pub fn new(hold: Duration) -> Self {
        Self {
            hold,
            last_seen: [None; KEY_COUNT],
        }
    }

    /// Returns true if the key was not already held.
    pub fn press(&mut self, key: u8, now: Instant) -> bool {
        match self.last_seen.get_mut(key as usize) {
            Some(seen) => seen.replace(now).is_none(),
            None => false,
        }
    }

    pub fn release(&mut self, key: u8) {
        if let Some(seen) = self.last_seen.get_mut(key as usize) {
            *seen = None;
        }
    }

    /// Forget keys not seen within the hold window and return them.
    pub fn expire(&mut self, now: Instant) -> Vec<u8> {
        let hold = self.hold;
        let mut released = Vec::new();
        for (key, seen) in self.last_seen.iter_mut().enumerate() {
            if seen.is_some_and(|at| now.saturating_duration_since(at) >= hold) {
                *seen = None;
                released.push(key as u8);
            }
        }
        released
    }

    pub fn clear(&mut self) {
        self.last_seen = [None; KEY_COUNT];
    }
}
