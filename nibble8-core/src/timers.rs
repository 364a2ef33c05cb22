/// Delay and sound counters, both decremented once per 60 Hz tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timers {
    pub delay: u8,
    pub sound: u8,
}

impl Timers {
    pub fn tick(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }

    /// The audio collaborator should be making noise while this is true.
    pub fn sound_active(&self) -> bool {
        self.sound > 0
    }
}
