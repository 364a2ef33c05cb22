//! Terminal front end: ROM selection menu, keyboard mapping, screen and
//! bell, and the scheduler loop that drives the interpreter core.

use std::{fs, fs::File, sync::Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event};
use nibble8_core::Interpreter;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::{
    beeper::{Beeper, Mute, TerminalBell},
    menu::{Menu, MenuKey, Selection},
    roms::Catalogue,
    screen::{Screen, TerminalScreen},
    session::{Session, SessionEnd},
    settings::{Args, Settings},
};

mod beeper;
mod keymap;
mod menu;
mod roms;
mod screen;
mod session;
mod settings;

fn init_logging(settings: &Settings) -> Result<()> {
    let file = File::create(&settings.log_file)
        .with_context(|| format!("could not create log file {}", settings.log_file.display()))?;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .with_context(|| format!("invalid log level {:?}", settings.log_level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Show the menu until the user picks something.
fn select_rom<S: Screen>(screen: &mut S, menu: &mut Menu) -> Result<Selection> {
    screen.clear()?;
    loop {
        menu.set_page_size(screen.menu_page_size());
        screen.draw_menu(menu)?;

        match event::read()? {
            Event::Key(key_event) => {
                if let Some(selection) = MenuKey::from_event(key_event).and_then(|key| menu.handle(key)) {
                    menu.clear_message();
                    return Ok(selection);
                }
            }
            Event::Resize(_, _) => screen.clear()?,
            _ => {}
        }
    }
}

fn play<S: Screen, B: Beeper + ?Sized>(
    settings: &Settings,
    screen: &mut S,
    beeper: &mut B,
    rom: &[u8],
) -> Result<SessionEnd> {
    let mut interpreter = Interpreter::new();
    interpreter.load_rom(rom)?;
    Session::new(settings, screen, beeper, interpreter).run()
}

fn main() -> Result<()> {
    let settings = Settings::from(Args::parse());
    init_logging(&settings)?;
    info!(?settings, "starting");

    let catalogue = Catalogue::discover(&settings.rom_dir)
        .with_context(|| format!("could not list ROMs in {}", settings.rom_dir.display()))?;

    let mut bell;
    let mut mute = Mute;
    let beeper: &mut dyn Beeper = if settings.mute {
        &mut mute
    } else {
        bell = TerminalBell::stdout();
        &mut bell
    };

    let direct_rom = settings
        .rom
        .as_ref()
        .map(|path| fs::read(path).with_context(|| format!("could not read ROM {}", path.display())))
        .transpose()?;

    let mut screen = TerminalScreen::new()?;
    if let Some(rom) = direct_rom {
        if play(&settings, &mut screen, beeper, &rom)? == SessionEnd::Quit {
            return Ok(());
        }
    }
    run_menu(&settings, &mut screen, beeper, &catalogue)
}

fn run_menu<S: Screen, B: Beeper + ?Sized>(
    settings: &Settings,
    screen: &mut S,
    beeper: &mut B,
    catalogue: &Catalogue,
) -> Result<()> {
    let mut menu = Menu::new(catalogue.names(), screen.menu_page_size());

    loop {
        let (name, rom) = match select_rom(screen, &mut menu)? {
            Selection::Exit => return Ok(()),
            Selection::Listed(index) => {
                let Some(entry) = catalogue.get(index) else {
                    continue;
                };
                (entry.name.clone(), entry.read())
            }
            Selection::Path(path) => (path.clone(), fs::read(&path)),
        };

        let rom = match rom {
            Ok(rom) => rom,
            Err(err) => {
                error!(rom = %name, %err, "failed to read ROM");
                menu.set_message(format!("Failed to read {name}: {err}"));
                continue;
            }
        };

        info!(rom = %name, size = rom.len(), "loading ROM");
        match play(settings, screen, beeper, &rom) {
            Ok(SessionEnd::Menu) => {}
            Ok(SessionEnd::Quit) => return Ok(()),
            Err(err) => {
                // a bad ROM sends us back to selection, the process carries on
                error!(rom = %name, "{err:#}");
                menu.set_message(format!("Failed to run {name}: {err}"));
            }
        }
    }
}
