use crate::internal::overlay::OverlayMode;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// User commands that can be bound to keys in `config.ron`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    Quit,
    ToggleHelp,
    SelectHidden,
    SelectLayered,
    SelectCompare,
    NextMode,
    PrevMode,
    OpacityUp,
    OpacityDown,
    NudgeLeft,
    NudgeRight,
}

/// Which set of bindings applies; mirrors the overlay mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyBindingContext {
    Global,
    Layered,
    Compare,
}

impl From<OverlayMode> for KeyBindingContext {
    fn from(mode: OverlayMode) -> Self {
        match mode {
            OverlayMode::Hidden => Self::Global,
            OverlayMode::Layered => Self::Layered,
            OverlayMode::Compare => Self::Compare,
        }
    }
}

type KeyChord = (KeyCode, KeyModifiers);

/// Maps key presses to commands
#[derive(Debug, Clone, Default)]
pub struct KeyBindingMap {
    global: HashMap<KeyChord, Command>,
    layered: HashMap<KeyChord, Command>,
    compare: HashMap<KeyChord, Command>,
}

impl KeyBindingMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn context_map(&self, context: KeyBindingContext) -> &HashMap<KeyChord, Command> {
        match context {
            KeyBindingContext::Global => &self.global,
            KeyBindingContext::Layered => &self.layered,
            KeyBindingContext::Compare => &self.compare,
        }
    }

    /// Look up a key press, context-specific bindings first, then global.
    pub fn get_command(&self, key: &KeyEvent, context: KeyBindingContext) -> Option<Command> {
        let chord = normalize(key.code, key.modifiers);
        self.context_map(context)
            .get(&chord)
            .or_else(|| self.global.get(&chord))
            .copied()
    }

    pub fn add_binding(&mut self, context: KeyBindingContext, key: KeyEvent, command: Command) {
        let map = match context {
            KeyBindingContext::Global => &mut self.global,
            KeyBindingContext::Layered => &mut self.layered,
            KeyBindingContext::Compare => &mut self.compare,
        };
        map.insert(normalize(key.code, key.modifiers), command);
    }

    /// Merge custom keybindings from configuration
    pub fn merge_config(&mut self, config: &crate::config::KeyBindingConfig) {
        let mut merge = |ctx: KeyBindingContext, bindings: &HashMap<String, Command>| {
            for (key_str, command) in bindings {
                match parse_key_str(key_str) {
                    Some(key_event) => self.add_binding(ctx, key_event, *command),
                    None => tracing::warn!("Invalid key string in config: {}", key_str),
                }
            }
        };

        merge(KeyBindingContext::Global, &config.global);
        merge(KeyBindingContext::Layered, &config.layered);
        merge(KeyBindingContext::Compare, &config.compare);
    }
}

// Terminals disagree on whether shifted characters carry SHIFT; the character
// already encodes it. Control and Alt chords arrive with the lowercase letter.
fn normalize(code: KeyCode, modifiers: KeyModifiers) -> KeyChord {
    let modifiers = match code {
        KeyCode::Char(_) | KeyCode::BackTab => modifiers.difference(KeyModifiers::SHIFT),
        _ => modifiers,
    };
    match code {
        KeyCode::Char(c) if modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            (KeyCode::Char(c.to_ascii_lowercase()), modifiers)
        }
        _ => (code, modifiers),
    }
}

/// Parse a key string into a KeyEvent
/// Supported formats:
/// - Single char: "j", "[", "1"
/// - Special keys: "Enter", "Tab", "BackTab", "Esc", "Up", "Down", "Left", "Right"
/// - With modifiers: "Ctrl+C", "Shift+Tab"
pub fn parse_key_str(key_str: &str) -> Option<KeyEvent> {
    let parts: Vec<&str> = key_str.split('+').collect();

    let mut modifiers = KeyModifiers::empty();
    let key_part = match parts.split_last() {
        Some((last, mods)) => {
            for modifier in mods {
                match modifier.to_lowercase().as_str() {
                    "ctrl" => modifiers |= KeyModifiers::CONTROL,
                    "shift" => modifiers |= KeyModifiers::SHIFT,
                    "alt" => modifiers |= KeyModifiers::ALT,
                    _ => return None,
                }
            }
            *last
        }
        None => return None,
    };

    let code = match key_part {
        "Enter" => KeyCode::Enter,
        "Tab" if modifiers.contains(KeyModifiers::SHIFT) => KeyCode::BackTab,
        "Tab" => KeyCode::Tab,
        "BackTab" => KeyCode::BackTab,
        "Esc" => KeyCode::Esc,
        "Up" => KeyCode::Up,
        "Down" => KeyCode::Down,
        "Left" => KeyCode::Left,
        "Right" => KeyCode::Right,
        "Home" => KeyCode::Home,
        "End" => KeyCode::End,
        s => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => return None,
            }
        }
    };

    Some(KeyEvent::new(code, modifiers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_char() {
        let key = parse_key_str("j").unwrap();
        assert_eq!(key.code, KeyCode::Char('j'));
        assert_eq!(key.modifiers, KeyModifiers::empty());
    }

    #[test]
    fn test_configured_ctrl_chord_matches_terminal_event() {
        let mut config = crate::config::KeyBindingConfig::default();
        config.global.insert("Ctrl+C".into(), Command::ToggleHelp);
        config.global.insert("Alt+X".into(), Command::Quit);

        let mut map = KeyBindingMap::new();
        map.merge_config(&config);

        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(
            map.get_command(&ctrl_c, KeyBindingContext::Global),
            Some(Command::ToggleHelp)
        );
        let alt_x = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::ALT);
        assert_eq!(
            map.get_command(&alt_x, KeyBindingContext::Layered),
            Some(Command::Quit)
        );
    }

    #[test]
    fn test_plain_chars_keep_case() {
        let mut map = KeyBindingMap::new();
        map.add_binding(
            KeyBindingContext::Global,
            KeyEvent::new(KeyCode::Char('N'), KeyModifiers::empty()),
            Command::NextMode,
        );
        let lower = KeyEvent::new(KeyCode::Char('n'), KeyModifiers::empty());
        assert_eq!(map.get_command(&lower, KeyBindingContext::Global), None);
    }

    #[test]
    fn test_parse_shift_tab() {
        let key = parse_key_str("Shift+Tab").unwrap();
        assert_eq!(key.code, KeyCode::BackTab);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(parse_key_str("Hyper+x").is_none());
        assert!(parse_key_str("NotAKey").is_none());
        assert!(parse_key_str("").is_none());
    }

    #[test]
    fn test_global_fallback() {
        let mut map = KeyBindingMap::new();
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::empty());
        map.add_binding(KeyBindingContext::Global, key, Command::Quit);

        assert_eq!(
            map.get_command(&key, KeyBindingContext::Compare),
            Some(Command::Quit)
        );
    }

    #[test]
    fn test_context_override() {
        let mut map = KeyBindingMap::new();
        let key = KeyEvent::new(KeyCode::Left, KeyModifiers::empty());
        map.add_binding(KeyBindingContext::Layered, key, Command::OpacityDown);
        map.add_binding(KeyBindingContext::Compare, key, Command::NudgeLeft);

        assert_eq!(
            map.get_command(&key, KeyBindingContext::Layered),
            Some(Command::OpacityDown)
        );
        assert_eq!(
            map.get_command(&key, KeyBindingContext::Compare),
            Some(Command::NudgeLeft)
        );
        assert_eq!(map.get_command(&key, KeyBindingContext::Global), None);
    }

    #[test]
    fn test_shifted_char_matches() {
        let mut map = KeyBindingMap::new();
        map.add_binding(
            KeyBindingContext::Global,
            KeyEvent::new(KeyCode::Char('?'), KeyModifiers::empty()),
            Command::ToggleHelp,
        );
        let pressed = KeyEvent::new(KeyCode::Char('?'), KeyModifiers::SHIFT);
        assert_eq!(
            map.get_command(&pressed, KeyBindingContext::Global),
            Some(Command::ToggleHelp)
        );
    }
}
