use crate::config::KeyBindingConfig;
use crate::internal::ui::keybindings::Command;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ConflictReport {
    pub description: String,
    pub keys: String,
    pub context: String,
}

/// Report mode-specific overrides that shadow a global key with a different command.
pub fn detect_conflicts(config: &KeyBindingConfig) -> Vec<ConflictReport> {
    let mut conflicts = Vec::new();

    let global_keys: HashMap<&String, &Command> = config.global.iter().collect();

    let mut check_context = |context_name: &str, bindings: &HashMap<String, Command>| {
        for (key, command) in bindings {
            if let Some(global_command) = global_keys.get(key)
                && *global_command != command
            {
                conflicts.push(ConflictReport {
                    description: format!(
                        "{} key '{}' shadows Global key (Global: {:?}, {}: {:?})",
                        context_name, key, global_command, context_name, command
                    ),
                    keys: key.clone(),
                    context: context_name.to_string(),
                });
            }
        }
    };

    check_context("Layered", &config.layered);
    check_context("Compare", &config.compare);

    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadowing_reported() {
        let mut config = KeyBindingConfig::default();
        config.global.insert("h".into(), Command::ToggleHelp);
        config.compare.insert("h".into(), Command::NudgeLeft);
        config.layered.insert("h".into(), Command::ToggleHelp);

        let conflicts = detect_conflicts(&config);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].context, "Compare");
        assert_eq!(conflicts[0].keys, "h");
    }
}
