use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

pub const PATH_MAX: usize = 511;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuKey {
    Up,
    Down,
    Enter,
    Backspace,
    Escape,
    Char(char),
    Quit,
}

impl MenuKey {
    pub fn from_event(event: KeyEvent) -> Option<Self> {
        if event.kind == KeyEventKind::Release {
            return None;
        }
        let key = match event.code {
            KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => Self::Quit,
            KeyCode::Up => Self::Up,
            KeyCode::Down => Self::Down,
            KeyCode::Enter => Self::Enter,
            KeyCode::Backspace => Self::Backspace,
            KeyCode::Esc => Self::Escape,
            KeyCode::Char(c) => Self::Char(c),
            _ => return None,
        };
        Some(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Index into the ROM catalogue.
    Listed(usize),
    Path(String),
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    PathInput,
}

/// ROM picker. Browse the list with Up/Down, Enter to pick, `L` to type a
/// path instead, Esc to leave.
#[derive(Debug, Clone)]
pub struct Menu {
    names: Vec<String>,
    selected: usize,
    top: usize,
    page_size: usize,
    path: String,
    mode: Mode,
    message: Option<String>,
}

impl Menu {
    pub fn new(names: Vec<String>, page_size: usize) -> Self {
        Self {
            names,
            selected: 0,
            top: 0,
            page_size: page_size.max(1),
            path: String::new(),
            mode: Mode::Browse,
            message: None,
        }
    }

    pub fn handle(&mut self, key: MenuKey) -> Option<Selection> {
        if key == MenuKey::Quit {
            return Some(Selection::Exit);
        }
        match self.mode {
            Mode::Browse => self.handle_browse(key),
            Mode::PathInput => self.handle_path_input(key),
        }
    }

    fn handle_browse(&mut self, key: MenuKey) -> Option<Selection> {
        let count = self.names.len();
        match key {
            MenuKey::Up if count > 0 => {
                self.selected = self.selected.checked_sub(1).unwrap_or(count - 1);
            }
            MenuKey::Down if count > 0 => self.selected = (self.selected + 1) % count,
            MenuKey::Enter if count > 0 => return Some(Selection::Listed(self.selected)),
            MenuKey::Char('l' | 'L') => self.mode = Mode::PathInput,
            MenuKey::Escape => return Some(Selection::Exit),
            _ => {}
        }
        self.scroll_to_selection();
        None
    }

    fn handle_path_input(&mut self, key: MenuKey) -> Option<Selection> {
        match key {
            MenuKey::Char(c) if !c.is_control() => {
                if self.path.len() + c.len_utf8() <= PATH_MAX {
                    self.path.push(c);
                }
            }
            MenuKey::Backspace => {
                self.path.pop();
            }
            MenuKey::Enter if !self.path.is_empty() => {
                self.mode = Mode::Browse;
                return Some(Selection::Path(self.path.clone()));
            }
            MenuKey::Escape => self.mode = Mode::Browse,
            _ => {}
        }
        None
    }

    fn scroll_to_selection(&mut self) {
        if self.selected < self.top {
            self.top = self.selected;
        } else if self.selected >= self.top + self.page_size {
            self.top = self.selected + 1 - self.page_size;
        }
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.scroll_to_selection();
    }

    /// Shown under the list until the next selection, e.g. a load failure.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn clear_message(&mut self) {
        self.message = None;
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The page of entries currently on screen, with their catalogue index.
    pub fn visible(&self) -> impl Iterator<Item = (usize, &str)> {
        self.names
            .iter()
            .enumerate()
            .skip(self.top)
            .take(self.page_size)
            .map(|(i, name)| (i, name.as_str()))
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
