use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use nibble8_core::{Interpreter, Status};
use tracing::{info, warn};

use crate::{beeper::Beeper, keymap, keymap::HeldKeys, screen::Screen, settings::Settings};

/// Fires once per `interval`, catching up if a caller falls behind.
struct Timer {
    interval: Duration,
    last_tick: Instant,
}

impl Timer {
    fn new(interval: Duration) -> Self {
        Self::starting_at(interval, Instant::now())
    }

    fn starting_at(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            last_tick: start,
        }
    }

    fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last_tick) >= self.interval {
            self.last_tick += self.interval;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Back to ROM selection.
    Menu,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Press(u8),
    Release(u8),
    Restart,
    End(SessionEnd),
}

fn command(event: KeyEvent) -> Option<Command> {
    let released = event.kind == KeyEventKind::Release;
    let command = match event.code {
        KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
            Command::End(SessionEnd::Quit)
        }
        _ if released => Command::Release(keymap::map_key(event.code)?),
        KeyCode::Esc => Command::End(SessionEnd::Menu),
        KeyCode::F(5) => Command::Restart,
        code => Command::Press(keymap::map_key(code)?),
    };
    Some(command)
}

/// One play session: the external scheduler around the interpreter. Runs
/// `cycle()` at the CPU rate and `tick_timers()` at the timer rate on this
/// thread, forwarding keys in between.
pub struct Session<'a, S: Screen, B: Beeper + ?Sized> {
    settings: &'a Settings,
    screen: &'a mut S,
    beeper: &'a mut B,
    interpreter: Interpreter,
    held: HeldKeys,
}

impl<'a, S: Screen, B: Beeper + ?Sized> Session<'a, S, B> {
    pub fn new(
        settings: &'a Settings,
        screen: &'a mut S,
        beeper: &'a mut B,
        interpreter: Interpreter,
    ) -> Self {
        Self {
            settings,
            screen,
            beeper,
            interpreter,
            held: HeldKeys::new(settings.key_hold),
        }
    }

    pub fn run(mut self) -> Result<SessionEnd> {
        self.screen.clear()?;

        let cpu_interval = self.settings.cpu_interval();
        let mut next_cpu_frame = Instant::now() + cpu_interval;
        let mut timer = Timer::new(self.settings.timer_interval());

        loop {
            self.interpreter.poll_key_wait();
            if !matches!(self.interpreter.status(), Status::Halted(_)) {
                if let Err(err) = self.interpreter.cycle() {
                    warn!(%err, "session halted, press Esc to return to the menu");
                }
            }

            if timer.tick() {
                self.interpreter.tick_timers();
                if self.interpreter.sound_active() {
                    self.beeper.play()?;
                } else {
                    self.beeper.pause()?;
                }
                for key in self.held.expire(Instant::now()) {
                    self.interpreter.set_key(key, false);
                }
                self.screen.draw_machine(&self.interpreter)?;
            }

            let time_left = next_cpu_frame.saturating_duration_since(Instant::now());
            next_cpu_frame += cpu_interval;

            if let Some(end) = self.handle_input(time_left)? {
                self.beeper.pause()?;
                info!(?end, "session ended");
                return Ok(end);
            }
        }
    }

    /// Wait out `timeout`, handling any key events that arrive meanwhile.
    fn handle_input(&mut self, timeout: Duration) -> Result<Option<SessionEnd>> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if !event::poll(remaining)? {
                return Ok(None);
            }
            let Event::Key(key_event) = event::read()? else {
                continue;
            };
            match command(key_event) {
                Some(Command::Press(key)) => {
                    self.held.press(key, Instant::now());
                    self.interpreter.set_key(key, true);
                }
                Some(Command::Release(key)) => {
                    self.held.release(key);
                    self.interpreter.set_key(key, false);
                }
                Some(Command::Restart) => {
                    info!("restarting ROM");
                    self.held.clear();
                    self.interpreter.reset();
                }
                Some(Command::End(end)) => return Ok(Some(end)),
                None => {}
            }
        }
    }
}
