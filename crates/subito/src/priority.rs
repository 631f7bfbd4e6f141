//! Making sure a configured layout priority names a usable layout.

use crate::prompt::Prompter;
use crate::registry::Registry;
use crate::repair;
use crate::Result;
use tracing::info;

const MENU: &str =
    "Would you like to [S]et it now, view available [L]ayouts, view available [P]arts, or [C]lear the priority? ";

/// Resolve the layout priority against the registry.
///
/// An unset priority is returned untouched. A set priority that does not
/// name a layout with at least one part opens a menu that loops until the
/// layout is defined, or the operator clears the priority (answering `C`
/// or closing input), in which case `None` is returned.
pub fn resolve_layout_priority(
    priority: Option<String>,
    registry: &mut Registry,
    prompter: &mut dyn Prompter,
) -> Result<Option<String>> {
    let Some(mut name) = priority else {
        return Ok(None);
    };

    while !registry.has_usable_layout(&name) {
        prompter.say(&format!(
            "'{}' is set as the layout priority, but is not defined.",
            name
        ));

        let Some(choice) = prompter.ask(MENU)? else {
            prompter.say("Layout priority cleared.");
            return Ok(None);
        };

        match choice.trim().to_uppercase().chars().next() {
            Some('S') => {
                // A name that needed repair is stored under the corrected form
                name = repair::define_layout(registry, prompter, &name)?;
            }
            Some('L') => {
                for (layout_name, layout) in registry.layouts() {
                    prompter.say(&format!("{} : {}", layout_name, layout));
                }
            }
            Some('P') => {
                for (part_name, part) in registry.parts() {
                    prompter.say(&format!(
                        "{} : {} {}",
                        part_name, part.source_patch, part.target_patch
                    ));
                }
            }
            Some('C') => {
                prompter.say("Layout priority cleared.");
                return Ok(None);
            }
            _ => {}
        }
    }

    info!(layout = %name, "layout priority resolved");
    Ok(Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompter;
    use crate::registry::{Layout, LayoutEntry, Part};

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.upsert_part("flute", Part::new(73, 73));
        registry.upsert_part("oboe", Part::new(68, 68));
        registry.upsert_layout(
            "duo",
            Layout::new(vec![LayoutEntry::new("flute"), LayoutEntry::new("oboe")]),
        );
        registry
    }

    #[test]
    fn test_unset_priority_is_left_alone() {
        let mut registry = registry();
        let mut prompter = ScriptedPrompter::silent();
        let resolved = resolve_layout_priority(None, &mut registry, &mut prompter).unwrap();
        assert_eq!(resolved, None);
        assert!(prompter.transcript().is_empty());
    }

    #[test]
    fn test_defined_priority_needs_no_prompt() {
        let mut registry = registry();
        let mut prompter = ScriptedPrompter::silent();
        let resolved =
            resolve_layout_priority(Some("duo".to_string()), &mut registry, &mut prompter).unwrap();
        assert_eq!(resolved.as_deref(), Some("duo"));
        assert!(prompter.transcript().is_empty());
    }

    #[test]
    fn test_list_then_set() {
        let mut registry = registry();
        let mut prompter = ScriptedPrompter::new(["l", "P", "?", "set", "oboe, flute"]);
        let resolved =
            resolve_layout_priority(Some("reversed".to_string()), &mut registry, &mut prompter)
                .unwrap();

        assert_eq!(resolved.as_deref(), Some("reversed"));
        assert!(prompter.saw("duo : flute, oboe"));
        assert!(prompter.saw("oboe : 68 68"));
        assert_eq!(
            registry.layout("reversed").map(|l| l.to_string()),
            Some("oboe, flute".to_string())
        );
    }

    #[test]
    fn test_empty_definition_keeps_asking() {
        let mut registry = registry();
        let mut prompter = ScriptedPrompter::new(["S", "", "S", "flute"]);
        let resolved =
            resolve_layout_priority(Some("solo".to_string()), &mut registry, &mut prompter)
                .unwrap();
        assert_eq!(resolved.as_deref(), Some("solo"));
        assert!(registry.has_usable_layout("solo"));
    }

    #[test]
    fn test_repaired_name_becomes_the_priority() {
        let mut registry = registry();
        let mut prompter = ScriptedPrompter::new(["S", "flute", "my_layout"]);
        let resolved =
            resolve_layout_priority(Some("my layout".to_string()), &mut registry, &mut prompter)
                .unwrap();

        assert_eq!(resolved.as_deref(), Some("my_layout"));
        assert!(registry.has_usable_layout("my_layout"));
        let menus = prompter.transcript().iter().filter(|l| l.as_str() == MENU).count();
        assert_eq!(menus, 1);
        assert_eq!(prompter.remaining(), 0);
    }

    #[test]
    fn test_clear_and_closed_input_unset_priority() {
        let mut registry = registry();

        let mut prompter = ScriptedPrompter::new(["c"]);
        let resolved =
            resolve_layout_priority(Some("nope".to_string()), &mut registry, &mut prompter)
                .unwrap();
        assert_eq!(resolved, None);

        let mut prompter = ScriptedPrompter::silent();
        let resolved =
            resolve_layout_priority(Some("nope".to_string()), &mut registry, &mut prompter)
                .unwrap();
        assert_eq!(resolved, None);
        assert!(prompter.saw("Layout priority cleared."));
    }
}
