//! Keyboard navigation: key types, crossterm conversion, and the chord
//! table binding keys to view operations.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::column::Row;
use crate::events::{EventResult, Modifiers};
use crate::table::TableView;

/// A key combination (key + modifiers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    /// The key code
    pub key: Key,
    /// Modifier keys
    pub modifiers: Modifiers,
}

impl KeyCombo {
    /// Create a new key combo
    pub const fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// Create a key combo without modifiers
    pub const fn key(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    /// Add ctrl modifier
    pub const fn ctrl(mut self) -> Self {
        self.modifiers.ctrl = true;
        self
    }

    /// Add meta modifier
    pub const fn meta(mut self) -> Self {
        self.modifiers.meta = true;
        self
    }
}

/// Key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Character key
    Char(char),
    /// Enter/Return
    Enter,
    /// Escape
    Escape,
    /// Arrow up
    Up,
    /// Arrow down
    Down,
    /// Arrow left
    Left,
    /// Arrow right
    Right,
    /// Home
    Home,
    /// End
    End,
}

/// Convert a crossterm key event into a [`KeyCombo`].
///
/// Returns `None` for key releases/repeats and keys the controller has no
/// use for.
pub fn convert_key_event(event: &KeyEvent) -> Option<KeyCombo> {
    if event.kind != KeyEventKind::Press {
        return None;
    }
    let key = match event.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Escape,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        _ => return None,
    };
    let modifiers = Modifiers {
        ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
        shift: event.modifiers.contains(KeyModifiers::SHIFT),
        alt: event.modifiers.contains(KeyModifiers::ALT),
        meta: event.modifiers.contains(KeyModifiers::SUPER)
            || event.modifiers.contains(KeyModifiers::META),
    };
    Some(KeyCombo { key, modifiers })
}

/// Callback invoked when the selected row is activated.
pub type ActivateFn<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Callback invoked by the focus-search chord.
pub type FocusSearchFn = Arc<dyn Fn() + Send + Sync>;

/// Stateless adapter translating key chords into [`TableView`] calls.
///
/// Bindings:
/// - `/` — invoke the focus-search callback
/// - Right — next page; on the last page, jump the selection to its last row
/// - Left — previous page; on the first page, jump to the first row
/// - Up / Down — move the selection one row through the whole sorted view
/// - Home / End — jump to the first / last row of the sorted view
/// - Enter — invoke the activation callback with the selected row
///
/// No chord mutates filters or sort; those stay pointer-driven.
pub struct KeyboardController<T: Row> {
    table: TableView<T>,
    on_activate: Option<ActivateFn<T>>,
    on_focus_search: Option<FocusSearchFn>,
}

impl<T: Row> KeyboardController<T> {
    /// Create a controller driving the given view.
    pub fn new(table: TableView<T>) -> Self {
        Self {
            table,
            on_activate: None,
            on_focus_search: None,
        }
    }

    /// Set the row-activation callback (Enter).
    pub fn on_activate(mut self, f: impl Fn(T) + Send + Sync + 'static) -> Self {
        self.on_activate = Some(Arc::new(f));
        self
    }

    /// Set the focus-search callback (`/`).
    pub fn on_focus_search(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_focus_search = Some(Arc::new(f));
        self
    }

    /// Handle a raw crossterm key event.
    pub fn handle_event(&self, event: &KeyEvent) -> EventResult {
        match convert_key_event(event) {
            Some(combo) => self.handle_key(&combo),
            None => EventResult::Ignored,
        }
    }

    /// Handle a key chord.
    pub fn handle_key(&self, key: &KeyCombo) -> EventResult {
        if key.modifiers.ctrl || key.modifiers.alt {
            return EventResult::Ignored;
        }
        match key.key {
            Key::Char('/') => {
                if let Some(f) = &self.on_focus_search {
                    f();
                    EventResult::Consumed
                } else {
                    EventResult::Ignored
                }
            }
            Key::Right => {
                self.table.next_page();
                EventResult::Consumed
            }
            Key::Left => {
                self.table.prev_page();
                EventResult::Consumed
            }
            Key::Up => {
                let global = self.table.global_index();
                self.table.navigate_to_global_index(global.saturating_sub(1));
                EventResult::Consumed
            }
            Key::Down => {
                self.table.navigate_to_global_index(self.table.global_index() + 1);
                EventResult::Consumed
            }
            Key::Home => {
                self.table.navigate_to_global_index(0);
                EventResult::Consumed
            }
            Key::End => {
                let len = self.table.sorted_len();
                if len > 0 {
                    self.table.navigate_to_global_index(len - 1);
                }
                EventResult::Consumed
            }
            Key::Enter => {
                if let Some(f) = &self.on_activate
                    && let Some(row) = self.table.selected_row()
                {
                    f(row);
                    return EventResult::Consumed;
                }
                EventResult::Ignored
            }
            _ => EventResult::Ignored,
        }
    }
}
