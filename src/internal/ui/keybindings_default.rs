use crate::internal::ui::keybindings::{Command, KeyBindingContext, KeyBindingMap};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Create default keybindings for the application
pub fn create_default_keybindings() -> KeyBindingMap {
    let mut map = KeyBindingMap::new();

    add_global_bindings(&mut map);
    add_layered_bindings(&mut map);
    add_compare_bindings(&mut map);

    map
}

fn add_global_bindings(map: &mut KeyBindingMap) {
    let ctx = KeyBindingContext::Global;

    map.add_binding(ctx, key('?'), Command::ToggleHelp);

    map.add_binding(ctx, key('q'), Command::Quit);
    map.add_binding(ctx, key_code(KeyCode::Esc), Command::Quit);
    map.add_binding(
        ctx,
        KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        Command::Quit,
    );

    // Picker
    map.add_binding(ctx, key('1'), Command::SelectHidden);
    map.add_binding(ctx, key('2'), Command::SelectLayered);
    map.add_binding(ctx, key('3'), Command::SelectCompare);
    map.add_binding(ctx, key_code(KeyCode::Tab), Command::NextMode);
    map.add_binding(ctx, key_code(KeyCode::BackTab), Command::PrevMode);
}

fn add_layered_bindings(map: &mut KeyBindingMap) {
    let ctx = KeyBindingContext::Layered;

    // Opacity slider
    map.add_binding(ctx, key_code(KeyCode::Right), Command::OpacityUp);
    map.add_binding(ctx, key_code(KeyCode::Left), Command::OpacityDown);
    map.add_binding(ctx, key('+'), Command::OpacityUp);
    map.add_binding(ctx, key('-'), Command::OpacityDown);
}

fn add_compare_bindings(map: &mut KeyBindingMap) {
    let ctx = KeyBindingContext::Compare;

    map.add_binding(ctx, key('['), Command::NudgeLeft);
    map.add_binding(ctx, key(']'), Command::NudgeRight);
    map.add_binding(ctx, key_code(KeyCode::Left), Command::NudgeLeft);
    map.add_binding(ctx, key_code(KeyCode::Right), Command::NudgeRight);
}

fn key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::empty())
}

fn key_code(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrows_depend_on_mode() {
        let map = create_default_keybindings();
        let right = key_code(KeyCode::Right);

        assert_eq!(map.get_command(&right, KeyBindingContext::Global), None);
        assert_eq!(
            map.get_command(&right, KeyBindingContext::Layered),
            Some(Command::OpacityUp)
        );
        assert_eq!(
            map.get_command(&right, KeyBindingContext::Compare),
            Some(Command::NudgeRight)
        );
    }

    #[test]
    fn test_picker_keys_everywhere() {
        let map = create_default_keybindings();
        for ctx in [
            KeyBindingContext::Global,
            KeyBindingContext::Layered,
            KeyBindingContext::Compare,
        ] {
            assert_eq!(map.get_command(&key('3'), ctx), Some(Command::SelectCompare));
            assert_eq!(
                map.get_command(&key_code(KeyCode::Tab), ctx),
                Some(Command::NextMode)
            );
        }
    }
}
