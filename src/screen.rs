use std::io::{self, Write};

use crossterm::{
    cursor, execute, queue,
    style::{self, Stylize},
    terminal,
};
use nibble8_core::{Interpreter, Status, DISPLAY_HEIGHT, DISPLAY_WIDTH};

use crate::menu::{Menu, Mode};

const PANEL_COLUMN: u16 = (DISPLAY_WIDTH * 2 + 2) as u16;
const PANEL_WIDTH: usize = 30;
const MENU_HEADER_ROWS: u16 = 4;
const MENU_FOOTER_ROWS: u16 = 5;

pub trait Screen {
    fn clear(&mut self) -> io::Result<()>;
    fn draw_machine(&mut self, interpreter: &Interpreter) -> io::Result<()>;
    fn draw_menu(&mut self, menu: &Menu) -> io::Result<()>;
    /// How many menu entries fit on screen.
    fn menu_page_size(&self) -> usize;
}

/// Full-screen terminal output. Owns raw mode and the alternate screen for
/// as long as it lives.
pub struct TerminalScreen {
    stdout: io::Stdout,
}

impl TerminalScreen {
    pub fn new() -> io::Result<Self> {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(
            stdout,
            terminal::EnterAlternateScreen,
            terminal::Clear(terminal::ClearType::All),
            cursor::Hide
        )?;
        Ok(Self { stdout })
    }
}

impl Drop for TerminalScreen {
    fn drop(&mut self) {
        let _ = execute!(self.stdout, cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

impl Screen for TerminalScreen {
    fn clear(&mut self) -> io::Result<()> {
        execute!(self.stdout, terminal::Clear(terminal::ClearType::All))
    }

    fn draw_machine(&mut self, interpreter: &Interpreter) -> io::Result<()> {
        for (y, row) in interpreter.display().rows().enumerate() {
            let line: String = row.iter().map(|&on| if on { "██" } else { "  " }).collect();
            queue!(
                self.stdout,
                cursor::MoveTo(0, y as u16),
                style::PrintStyledContent(line.yellow().on_black())
            )?;
        }

        for (row, text) in debug_lines(interpreter).into_iter().enumerate() {
            queue!(
                self.stdout,
                cursor::MoveTo(PANEL_COLUMN, row as u16),
                style::Print(format!("{text:<PANEL_WIDTH$}"))
            )?;
        }

        self.stdout.flush()
    }

    fn draw_menu(&mut self, menu: &Menu) -> io::Result<()> {
        queue!(
            self.stdout,
            terminal::Clear(terminal::ClearType::All),
            cursor::MoveTo(2, 0),
            style::PrintStyledContent("CHIP-8 ROM SELECT".bold().yellow()),
            cursor::MoveTo(2, 2),
            style::Print("Up/Down: Select  Enter: Load  L: Load from path  Esc: Quit"),
        )?;

        let mut row = MENU_HEADER_ROWS;
        if menu.is_empty() {
            queue!(self.stdout, cursor::MoveTo(4, row), style::Print("No ROMs found."))?;
            row += 1;
        }
        for (index, name) in menu.visible() {
            queue!(self.stdout, cursor::MoveTo(4, row))?;
            if menu.mode() == Mode::Browse && index == menu.selected() {
                queue!(self.stdout, style::PrintStyledContent(name.reverse()))?;
            } else {
                queue!(self.stdout, style::Print(name))?;
            }
            row += 1;
        }

        row += 1;
        let path = match (menu.mode(), menu.path()) {
            (Mode::PathInput, path) => format!("{path}_"),
            (Mode::Browse, "") => "(press L)".to_owned(),
            (Mode::Browse, path) => path.to_owned(),
        };
        queue!(
            self.stdout,
            cursor::MoveTo(2, row),
            style::Print("Load from path:"),
            cursor::MoveTo(4, row + 1),
            style::Print(path),
        )?;
        if let Some(message) = menu.message() {
            queue!(
                self.stdout,
                cursor::MoveTo(2, row + 3),
                style::PrintStyledContent(message.red())
            )?;
        }

        self.stdout.flush()
    }

    fn menu_page_size(&self) -> usize {
        let rows = terminal::size().map(|(_, rows)| rows).unwrap_or(DISPLAY_HEIGHT as u16);
        rows.saturating_sub(MENU_HEADER_ROWS + MENU_FOOTER_ROWS).max(1) as usize
    }
}

/// Text for the debugger panel beside the screen.
pub fn debug_lines(interpreter: &Interpreter) -> Vec<String> {
    let mut lines = vec![
        format!(
            "PC {:#05X}   I {:#05X}",
            interpreter.program_counter(),
            interpreter.index_register()
        ),
        String::new(),
    ];

    for (row, values) in interpreter.registers().chunks(4).enumerate() {
        let line = values
            .iter()
            .enumerate()
            .map(|(i, value)| format!("V{:X} {value:02X}", row * 4 + i))
            .collect::<Vec<_>>()
            .join("  ");
        lines.push(line);
    }

    let timers = interpreter.timers();
    lines.push(format!("DT {:02X}  ST {:02X}", timers.delay, timers.sound));
    lines.push(String::new());

    let next = match interpreter.current_instruction() {
        Ok(instruction) => instruction.to_string(),
        Err(err) => err.to_string(),
    };
    lines.push(format!("> {next}"));

    lines.push(match interpreter.status() {
        Status::Running => "RUNNING".to_owned(),
        Status::AwaitingKey(register) => format!("WAITING FOR KEY -> V{register:X}"),
        Status::Halted(err) => format!("HALTED: {err}"),
    });

    let keys: String = interpreter
        .keyboard()
        .keys()
        .iter()
        .enumerate()
        .map(|(key, &down)| if down { format!("{key:X}") } else { ".".to_owned() })
        .collect();
    lines.push(format!("KEYS {keys}"));
    lines.push(String::new());

    lines.push(format!("STACK ({})", interpreter.stack_depth()));
    for address in interpreter.stack().iter().rev() {
        lines.push(format!("  {address:#05X}"));
    }
    // wipe whatever a deeper stack left behind last frame
    lines.resize(DISPLAY_HEIGHT.max(lines.len()), String::new());
    lines.push("F5 restart  Esc menu".to_owned());

    lines
}
