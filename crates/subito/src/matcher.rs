//! Finding the layout that describes a scanned score.

use crate::prompt::Prompter;
use crate::registry::{Layout, Registry};
use crate::repair;
use crate::scan::PatchMap;
use crate::Result;
use tracing::{debug, info};

/// How the chosen layout was arrived at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// The only candidate.
    Single,
    /// Several candidates; the layout priority was one of them.
    Priority,
    /// Several candidates; the operator picked one.
    Chosen,
    /// Several candidates; no usable answer, so the first was taken.
    Default,
    /// The operator defined a new layout.
    Defined,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutChoice {
    pub name: String,
    pub selection: Selection,
}

/// True if `layout` has one entry per scanned track and each entry's
/// source patch equals the patch on the matching track (position `i` is
/// track `i + 1`).
pub fn is_candidate(layout: &Layout, patches: &PatchMap, registry: &Registry) -> bool {
    if layout.is_empty() || layout.len() != patches.len() {
        return false;
    }

    layout.iter().enumerate().all(|(i, entry)| {
        let track = (i + 1) as u32;
        match (registry.part(&entry.part), patches.get(&track)) {
            (Some(part), Some(patch)) => part.source_patch == *patch,
            _ => false,
        }
    })
}

/// Names of every registered layout matching `patches`, in registry order.
pub fn candidates(patches: &PatchMap, registry: &Registry) -> Vec<String> {
    registry
        .layouts()
        .filter(|(_, layout)| is_candidate(layout, patches, registry))
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Pick the layout for a score, asking the operator when needed.
///
/// With no candidates the operator must define a new layout. With one it
/// is used directly. With several, the layout priority wins if it is
/// among them; otherwise the operator chooses by number, asks for a
/// `N`ew layout, or gets the first candidate for any other answer.
///
/// A newly defined layout becomes the layout priority for the rest of
/// the run.
pub fn choose_layout(
    score: &str,
    patches: &PatchMap,
    registry: &mut Registry,
    priority: &mut Option<String>,
    prompter: &mut dyn Prompter,
) -> Result<LayoutChoice> {
    let found = candidates(patches, registry);
    debug!(score, candidates = ?found, "candidate layouts");

    match found.as_slice() {
        [] => {
            prompter.say(&format!("Error: no candidate layouts for {}.", score));
            let name = repair::define_new_layout(registry, prompter, "Enter a new Layout Name: ")?;
            *priority = Some(name.clone());
            Ok(LayoutChoice {
                name,
                selection: Selection::Defined,
            })
        }
        [only] => Ok(LayoutChoice {
            name: only.clone(),
            selection: Selection::Single,
        }),
        several => {
            if let Some(preferred) = priority.as_ref().filter(|p| several.contains(*p)) {
                return Ok(LayoutChoice {
                    name: preferred.clone(),
                    selection: Selection::Priority,
                });
            }

            prompter.say(&format!(
                "Please select a layout for {} or else describe a new one.",
                score
            ));
            let options = several
                .iter()
                .enumerate()
                .map(|(i, name)| format!("[{}]: {},", i + 1, name))
                .collect::<Vec<_>>()
                .join(" ");
            let answer = prompter
                .ask(&format!("{} [N]ew layout: ", options))?
                .unwrap_or_default();
            let answer = answer.trim().to_uppercase();

            if answer.starts_with('N') {
                let name = repair::define_new_layout(registry, prompter, "Enter Layout Name: ")?;
                *priority = Some(name.clone());
                return Ok(LayoutChoice {
                    name,
                    selection: Selection::Defined,
                });
            }

            let picked = answer
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| several.get(i));

            match picked {
                Some(name) => Ok(LayoutChoice {
                    name: name.clone(),
                    selection: Selection::Chosen,
                }),
                None => {
                    prompter.say("Selecting option [1]");
                    info!(score, layout = %several[0], "defaulting to first candidate");
                    Ok(LayoutChoice {
                        name: several[0].clone(),
                        selection: Selection::Default,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompter;
    use crate::registry::{LayoutEntry, Part};

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.upsert_part("flute", Part::new(0, 10));
        registry.upsert_part("clarinet", Part::new(1, 11));
        registry.upsert_part("piccolo", Part::new(0, 72));
        registry.upsert_layout(
            "duo",
            Layout::new(vec![LayoutEntry::new("flute"), LayoutEntry::new("clarinet")]),
        );
        registry.upsert_layout(
            "piccolo_duo",
            Layout::new(vec![LayoutEntry::new("piccolo"), LayoutEntry::new("clarinet")]),
        );
        registry.upsert_layout("nothing", Layout::default());
        registry
    }

    #[test]
    fn test_candidates_need_matching_count_and_order() {
        let registry = registry();
        assert_eq!(
            candidates(&PatchMap::from([(1, 0), (2, 1)]), &registry),
            vec!["duo", "piccolo_duo"]
        );
        assert!(candidates(&PatchMap::from([(1, 1), (2, 0)]), &registry).is_empty());
        assert!(candidates(&PatchMap::from([(1, 0)]), &registry).is_empty());
        assert!(candidates(&PatchMap::from([(1, 0), (2, 1), (3, 5)]), &registry).is_empty());
    }

    #[test]
    fn test_tracks_must_start_at_one() {
        let registry = registry();
        assert!(candidates(&PatchMap::from([(2, 0), (3, 1)]), &registry).is_empty());
    }

    #[test]
    fn test_empty_layout_never_matches() {
        let registry = registry();
        assert!(!is_candidate(
            registry.layout("nothing").unwrap(),
            &PatchMap::new(),
            &registry
        ));
    }

    #[test]
    fn test_priority_breaks_tie_silently() {
        let mut registry = registry();
        let mut priority = Some("piccolo_duo".to_string());
        let mut prompter = ScriptedPrompter::silent();

        let choice = choose_layout(
            "score",
            &PatchMap::from([(1, 0), (2, 1)]),
            &mut registry,
            &mut priority,
            &mut prompter,
        )
        .unwrap();

        assert_eq!(choice.name, "piccolo_duo");
        assert_eq!(choice.selection, Selection::Priority);
        assert!(prompter.transcript().is_empty());
    }

    #[test]
    fn test_numeric_choice_is_one_based() {
        let mut registry = registry();
        let mut priority = None;
        let mut prompter = ScriptedPrompter::new(["2"]);

        let choice = choose_layout(
            "score",
            &PatchMap::from([(1, 0), (2, 1)]),
            &mut registry,
            &mut priority,
            &mut prompter,
        )
        .unwrap();

        assert_eq!(choice.name, "piccolo_duo");
        assert_eq!(choice.selection, Selection::Chosen);
        assert!(prompter.saw("[1]: duo, [2]: piccolo_duo, [N]ew layout: "));
    }

    #[test]
    fn test_unusable_answers_default_to_first() {
        for answer in ["", "banana", "0", "7"] {
            let mut registry = registry();
            let mut priority = None;
            let mut prompter = ScriptedPrompter::new([answer]);

            let choice = choose_layout(
                "score",
                &PatchMap::from([(1, 0), (2, 1)]),
                &mut registry,
                &mut priority,
                &mut prompter,
            )
            .unwrap();

            assert_eq!(choice.name, "duo", "answer {:?}", answer);
            assert_eq!(choice.selection, Selection::Default);
            assert!(prompter.saw("Selecting option [1]"));
        }
    }

    #[test]
    fn test_new_layout_from_disambiguation() {
        let mut registry = registry();
        let mut priority = Some("unrelated".to_string());
        let mut prompter = ScriptedPrompter::new(["n", "flutes", "flute 1, flute 2"]);

        let choice = choose_layout(
            "score",
            &PatchMap::from([(1, 0), (2, 1)]),
            &mut registry,
            &mut priority,
            &mut prompter,
        )
        .unwrap();

        assert_eq!(choice.name, "flutes");
        assert_eq!(choice.selection, Selection::Defined);
        assert_eq!(priority.as_deref(), Some("flutes"));
        assert!(registry.has_usable_layout("flutes"));
    }

    #[test]
    fn test_no_candidates_prompts_for_new_layout() {
        let mut registry = registry();
        let mut priority = None;
        let mut prompter = ScriptedPrompter::new(["reversed", "clarinet, flute"]);

        let choice = choose_layout(
            "swapped",
            &PatchMap::from([(1, 1), (2, 0)]),
            &mut registry,
            &mut priority,
            &mut prompter,
        )
        .unwrap();

        assert_eq!(choice.name, "reversed");
        assert!(prompter.saw("no candidate layouts for swapped"));
        assert_eq!(priority.as_deref(), Some("reversed"));
    }
}
