//! Keyboard command palette: quick actions and navigation entries behind
//! a Ctrl/Cmd+K toggle.

use std::fmt;

pub const TOGGLE_KEY: char = 'k';
pub const EMPTY_MESSAGE: &str = "No se encontraron resultados.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    QuickActions,
    Navigation,
}

impl Group {
    pub fn heading(&self) -> &'static str {
        match self {
            Group::QuickActions => "Acciones Rápidas",
            Group::Navigation => "Navegación",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    AddExpense,
    CreateRule,
}

impl QuickAction {
    pub fn label(&self) -> &'static str {
        match self {
            QuickAction::AddExpense => "Agregar Gasto",
            QuickAction::CreateRule => "Crear Regla",
        }
    }
}

impl fmt::Display for QuickAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quick(QuickAction),
    Navigate(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteEntry {
    pub id: &'static str,
    pub label: &'static str,
    pub group: Group,
    pub action: Action,
}

/// A key press with its modifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyPress {
    pub key: char,
    pub ctrl: bool,
    pub meta: bool,
}

impl KeyPress {
    pub fn plain(key: char) -> Self {
        KeyPress {
            key,
            ..KeyPress::default()
        }
    }

    pub fn ctrl(key: char) -> Self {
        KeyPress {
            key,
            ctrl: true,
            meta: false,
        }
    }

    pub fn meta(key: char) -> Self {
        KeyPress {
            key,
            ctrl: false,
            meta: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandPalette {
    entries: Vec<PaletteEntry>,
    open: bool,
}

impl CommandPalette {
    pub fn new() -> Self {
        let quick = |id, action: QuickAction| PaletteEntry {
            id,
            label: action.label(),
            group: Group::QuickActions,
            action: Action::Quick(action),
        };
        let navigate = |id, label, path| PaletteEntry {
            id,
            label,
            group: Group::Navigation,
            action: Action::Navigate(path),
        };

        let entries = vec![
            quick("add-expense", QuickAction::AddExpense),
            quick("create-rule", QuickAction::CreateRule),
            navigate("dashboard", "Dashboard", "/dashboard"),
            navigate("transactions", "Transacciones", "/transactions"),
            navigate("budgets", "Presupuestos", "/budgets"),
            navigate("categories-rules", "Categorías y Reglas", "/categories-rules"),
            navigate("accounts", "Cuentas", "/accounts"),
            navigate("settings", "Configuración", "/settings"),
        ];

        CommandPalette {
            entries,
            open: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Toggles on Ctrl+K or Cmd+K. Returns whether the key was consumed,
    /// so callers can suppress the default handling.
    pub fn handle_key(&mut self, key: KeyPress) -> bool {
        if key.key.eq_ignore_ascii_case(&TOGGLE_KEY) && (key.ctrl || key.meta) {
            self.open = !self.open;
            return true;
        }
        false
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    /// Entries whose label contains `query`, ignoring case. An empty
    /// query keeps every entry.
    pub fn search(&self, query: &str) -> Vec<&PaletteEntry> {
        let query = query.trim().to_lowercase();
        self.entries
            .iter()
            .filter(|entry| {
                query.is_empty() || entry.label.to_lowercase().contains(&query)
            })
            .collect()
    }

    /// Closes the palette and hands back the action of entry `id`.
    pub fn run(&mut self, id: &str) -> Option<Action> {
        self.close();
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.action)
    }
}

impl Default for CommandPalette {
    fn default() -> Self {
        CommandPalette::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_with_ctrl_or_meta() {
        let mut palette = CommandPalette::new();

        assert!(palette.handle_key(KeyPress::ctrl('k')));
        assert!(palette.is_open());
        assert!(palette.handle_key(KeyPress::meta('K')));
        assert!(!palette.is_open());
    }

    #[test]
    fn test_other_keys_pass_through() {
        let mut palette = CommandPalette::new();

        assert!(!palette.handle_key(KeyPress::plain('k')));
        assert!(!palette.handle_key(KeyPress::ctrl('j')));
        assert!(!palette.is_open());
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let palette = CommandPalette::new();

        let labels: Vec<&str> = palette
            .search("CUENTAS")
            .into_iter()
            .map(|entry| entry.label)
            .collect();
        assert_eq!(labels, vec!["Cuentas"]);

        let labels: Vec<&str> = palette
            .search("regla")
            .into_iter()
            .map(|entry| entry.label)
            .collect();
        assert_eq!(labels, vec!["Crear Regla", "Categorías y Reglas"]);

        assert_eq!(palette.search("").len(), palette.entries().len());
        assert!(palette.search("zzz").is_empty());
    }

    #[test]
    fn test_run_closes_and_returns_action() {
        let mut palette = CommandPalette::new();
        palette.open();

        assert_eq!(
            palette.run("categories-rules"),
            Some(Action::Navigate("/categories-rules"))
        );
        assert!(!palette.is_open());

        palette.open();
        assert_eq!(
            palette.run("add-expense"),
            Some(Action::Quick(QuickAction::AddExpense))
        );
        assert_eq!(palette.run("missing"), None);
    }

    #[test]
    fn test_groups() {
        let palette = CommandPalette::new();
        let quick = palette
            .entries()
            .iter()
            .filter(|entry| entry.group == Group::QuickActions)
            .count();
        assert_eq!(quick, 2);
        assert_eq!(Group::Navigation.heading(), "Navegación");
        assert_eq!(QuickAction::CreateRule.to_string(), "Crear Regla");
    }
}
