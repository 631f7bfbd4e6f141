//! Interactive repair of part and layout definitions.
//!
//! Each driver loops until [`crate::grammar`] accepts the value, showing
//! the operator what was wrong and asking for a replacement. There is no
//! retry limit; the only way out without a valid value is closing input,
//! which surfaces as [`Error::Aborted`](crate::Error::Aborted).

use crate::grammar::{self, GrammarError};
use crate::prompt::{ask_required, Prompter};
use crate::registry::{Layout, Part, Registry};
use crate::Result;
use tracing::{debug, info};

/// Ask until `key` is a valid name.
pub fn repair_name(prompter: &mut dyn Prompter, kind: &str, key: &str) -> Result<String> {
    let mut key = key.to_string();
    loop {
        match grammar::parse_name(&key) {
            Ok(name) => return Ok(name),
            Err(e) => {
                prompter.say(&format!("Problem with name `{}` of potential {}", key, kind));
                prompter.say(&format!("({})", e));
                key = ask_required(prompter, &format!("Please enter a valid {} name: ", kind))?;
            }
        }
    }
}

/// Ask until `definition` is a valid part definition.
pub fn repair_part_definition(
    prompter: &mut dyn Prompter,
    name: &str,
    definition: &str,
) -> Result<Part> {
    let mut definition = definition.to_string();
    loop {
        match grammar::parse_part_definition(&definition) {
            Ok(part) => return Ok(part),
            Err(e) => {
                prompter.say(&format!(
                    "Problem with definition `{}` of potential Part `{}`",
                    definition, name
                ));
                prompter.say(&format!("({})", e));
                definition = ask_required(
                    prompter,
                    &format!("Please enter a valid Part definition for {}: ", name),
                )?;
            }
        }
    }
}

/// Repair a whole part entry and register it.
pub fn repair_part(
    registry: &mut Registry,
    prompter: &mut dyn Prompter,
    key: &str,
    definition: &str,
) -> Result<String> {
    let name = repair_name(prompter, "Part", key)?;
    let part = repair_part_definition(prompter, &name, definition)?;
    info!(part = %name, definition = %part, "registered part");
    registry.upsert_part(name.clone(), part);
    Ok(name)
}

/// Ask until `definition` is a valid layout definition.
///
/// A reference to an undefined part does not discard the definition:
/// the operator is asked to define that part, it is registered, and the
/// same definition is validated again from the start. This repeats until
/// every reference resolves.
pub fn repair_layout_definition(
    registry: &mut Registry,
    prompter: &mut dyn Prompter,
    name: &str,
    definition: &str,
) -> Result<Layout> {
    let mut definition = definition.to_lowercase();
    loop {
        match grammar::parse_layout_definition(&definition, registry) {
            Ok(layout) => return Ok(layout),
            Err(GrammarError::UnknownPart(part)) => {
                prompter.say(&format!(
                    "Part `{}` not found when processing layout `{}`",
                    part, name
                ));
                repair_part(registry, prompter, &part, "")?;
            }
            Err(e) => {
                prompter.say(&format!(
                    "Problem with definition `{}` of potential Layout `{}`",
                    definition, name
                ));
                prompter.say(&format!("({})", e));
                definition = ask_required(
                    prompter,
                    &format!("Please enter a valid Layout definition for {}: ", name),
                )?
                .to_lowercase();
            }
        }
    }
}

/// Repair a whole layout entry and register it.
pub fn repair_layout(
    registry: &mut Registry,
    prompter: &mut dyn Prompter,
    key: &str,
    definition: &str,
) -> Result<String> {
    let name = repair_name(prompter, "Layout", key)?;
    let layout = repair_layout_definition(registry, prompter, &name, definition)?;
    debug!(layout = %name, definition = %layout, "registered layout");
    registry.upsert_layout(name.clone(), layout);
    Ok(name)
}

/// Ask for the definition of layout `name`, validate it, and register it.
pub fn define_layout(
    registry: &mut Registry,
    prompter: &mut dyn Prompter,
    name: &str,
) -> Result<String> {
    let definition = ask_required(prompter, &format!("Enter Layout Definition for {}: ", name))?;
    repair_layout(registry, prompter, name, &definition)
}

/// Ask for a brand-new layout name and definition, and register it.
pub fn define_new_layout(
    registry: &mut Registry,
    prompter: &mut dyn Prompter,
    question: &str,
) -> Result<String> {
    let key = ask_required(prompter, question)?;
    let name = repair_name(prompter, "Layout", &key)?;
    define_layout(registry, prompter, &name)
}
