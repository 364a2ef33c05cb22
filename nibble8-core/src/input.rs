use tracing::warn;

pub const KEY_COUNT: usize = 16;

/// Key states as last reported by the input collaborator, plus the register
/// a pending key-wait instruction wants filled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputLatch {
    keys: [bool; KEY_COUNT],
    awaiting: Option<u8>,
}

impl InputLatch {
    pub fn set_key(&mut self, index: u8, pressed: bool) {
        match self.keys.get_mut(index as usize) {
            Some(key) => *key = pressed,
            None => warn!(index, "ignoring report for non-existent key"),
        }
    }

    /// Keys outside of the keypad are never pressed.
    pub fn is_pressed(&self, index: u8) -> bool {
        self.keys.get(index as usize).copied().unwrap_or(false)
    }

    pub fn keys(&self) -> &[bool; KEY_COUNT] {
        &self.keys
    }

    pub fn first_pressed(&self) -> Option<u8> {
        self.keys.iter().position(|&down| down).map(|k| k as u8)
    }

    pub fn begin_wait(&mut self, register: u8) {
        self.awaiting = Some(register);
    }

    pub fn awaiting(&self) -> Option<u8> {
        self.awaiting
    }

    /// Complete a pending key-wait. Returns the destination register and the
    /// value to store in it, or `None` when nothing was waiting.
    pub fn resolve_wait(&mut self, value: u8) -> Option<(u8, u8)> {
        self.awaiting.take().map(|register| (register, value))
    }
}
