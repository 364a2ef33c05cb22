use std::io::{self, Write};

/// Audio collaborator: told every timer tick whether the sound timer is
/// running.
pub trait Beeper {
    fn play(&mut self) -> io::Result<()>;
    fn pause(&mut self) -> io::Result<()>;
}

/// Rings the terminal bell once each time the sound timer starts.
pub struct TerminalBell<W: Write> {
    out: W,
    ringing: bool,
}

impl TerminalBell<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalBell<W> {
    pub fn new(out: W) -> Self {
        Self { out, ringing: false }
    }
}

impl<W: Write> Beeper for TerminalBell<W> {
    fn play(&mut self) -> io::Result<()> {
        if !self.ringing {
            self.out.write_all(b"\x07")?;
            self.out.flush()?;
            self.ringing = true;
        }
        Ok(())
    }

    fn pause(&mut self) -> io::Result<()> {
        self.ringing = false;
        Ok(())
    }
}

pub struct Mute;

impl Beeper for Mute {
    fn play(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn pause(&mut self) -> io::Result<()> {
        Ok(())
    }
}
