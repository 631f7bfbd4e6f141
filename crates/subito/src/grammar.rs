//! Validation of part and layout definitions.
//!
//! Every function here is pure: it either returns the parsed value or a
//! [`GrammarError`] saying what was wrong. Asking the operator for a
//! correction is the job of [`crate::repair`].
//!
//! Grammar:
//!
//! ```text
//! part name       = word                       ; letters, digits, underscore
//! part definition = patch "," patch            ; both 0..=127
//! layout name     = word
//! layout def      = [ group { "," group } ]    ; empty means no parts
//! group           = part-name [ suffix ]       ; whitespace separated
//! ```
//!
//! Names are trimmed and lower-cased so that configuration and prompts
//! agree regardless of how they were typed.

use crate::registry::{Layout, LayoutEntry, Part, Registry};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use thiserror::Error;

/// Highest patch number accepted in a part definition.
pub const MAX_PATCH: i64 = 127;

/// Why a definition was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("expected 2 parameters, got {0}")]
    WrongArity(usize),

    #[error("`{0}` is not a number")]
    NotANumber(String),

    #[error("parameter {0} is outside the range 0-127")]
    OutOfRange(i64),

    #[error("`{0}` cannot be a valid name")]
    BadName(String),

    #[error("part `{0}` is not defined")]
    UnknownPart(String),

    #[error("unexpected `{0}` after the suffix")]
    TrailingTokens(String),

    #[error("`{0}` appears more than once in this layout")]
    DuplicateLabel(String),
}

fn word() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    WORD.get_or_init(|| Regex::new(r"^\w+$").expect("static regex"))
}

/// Validate a part or layout name, returning its normalised form.
pub fn parse_name(key: &str) -> Result<String, GrammarError> {
    let name = key.trim().to_lowercase();
    if word().is_match(&name) {
        Ok(name)
    } else {
        Err(GrammarError::BadName(key.trim().to_string()))
    }
}

/// Parse `"source, target"` into a [`Part`].
pub fn parse_part_definition(definition: &str) -> Result<Part, GrammarError> {
    let values = definition
        .split(',')
        .map(|token| {
            let token = token.trim();
            token
                .parse::<i64>()
                .map_err(|_| GrammarError::NotANumber(token.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if values.len() != 2 {
        return Err(GrammarError::WrongArity(values.len()));
    }

    let patch = |v: i64| {
        u8::try_from(v)
            .ok()
            .filter(|p| i64::from(*p) <= MAX_PATCH)
            .ok_or(GrammarError::OutOfRange(v))
    };

    Ok(Part::new(patch(values[0])?, patch(values[1])?))
}

/// Validate a complete `name = definition` part entry.
pub fn parse_part(key: &str, definition: &str) -> Result<(String, Part), GrammarError> {
    let name = parse_name(key)?;
    let part = parse_part_definition(definition)?;
    Ok((name, part))
}

/// Parse a layout definition against the parts currently in `registry`.
///
/// The first problem found is reported, scanning groups left to right, so
/// a definition naming several undefined parts reports them one at a time.
pub fn parse_layout_definition(
    definition: &str,
    registry: &Registry,
) -> Result<Layout, GrammarError> {
    let definition = definition.trim().to_lowercase();
    if definition.is_empty() {
        return Ok(Layout::default());
    }

    let mut entries = Vec::new();
    let mut labels = HashSet::new();

    for group in definition.split(',') {
        let mut tokens = group.split_whitespace();

        let Some(first) = tokens.next() else {
            return Err(GrammarError::BadName(group.trim().to_string()));
        };
        let part = parse_name(first)?;
        if !registry.has_part(&part) {
            return Err(GrammarError::UnknownPart(part));
        }

        let mut entry = LayoutEntry::new(part);
        if let Some(suffix) = tokens.next() {
            entry = entry.with_suffix(suffix);
        }
        let rest: Vec<_> = tokens.collect();
        if !rest.is_empty() {
            return Err(GrammarError::TrailingTokens(rest.join(" ")));
        }

        if !labels.insert(entry.label()) {
            return Err(GrammarError::DuplicateLabel(entry.to_string()));
        }
        entries.push(entry);
    }

    Ok(Layout::new(entries))
}

/// Validate a complete `name = definition` layout entry.
pub fn parse_layout(
    key: &str,
    definition: &str,
    registry: &Registry,
) -> Result<(String, Layout), GrammarError> {
    let name = parse_name(key)?;
    let layout = parse_layout_definition(definition, registry)?;
    Ok((name, layout))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.upsert_part("flute", Part::new(73, 73));
        registry.upsert_part("violin", Part::new(40, 40));
        registry
    }

    #[test]
    fn test_parse_name() {
        assert_eq!(parse_name("  Flute_2 "), Ok("flute_2".to_string()));
        assert_eq!(
            parse_name("first violin"),
            Err(GrammarError::BadName("first violin".to_string()))
        );
        assert_eq!(parse_name(""), Err(GrammarError::BadName(String::new())));
        assert_eq!(
            parse_name("oboe!"),
            Err(GrammarError::BadName("oboe!".to_string()))
        );
    }

    #[test]
    fn test_part_definition_valid() {
        assert_eq!(parse_part_definition("0, 10"), Ok(Part::new(0, 10)));
        assert_eq!(parse_part_definition(" 127 ,0"), Ok(Part::new(127, 0)));
    }

    #[test]
    fn test_part_definition_failures_are_distinguishable() {
        assert_eq!(
            parse_part_definition("1, 2, 3"),
            Err(GrammarError::WrongArity(3))
        );
        assert_eq!(parse_part_definition("5"), Err(GrammarError::WrongArity(1)));
        assert_eq!(
            parse_part_definition("1, two"),
            Err(GrammarError::NotANumber("two".to_string()))
        );
        assert_eq!(
            parse_part_definition(""),
            Err(GrammarError::NotANumber(String::new()))
        );
        assert_eq!(
            parse_part_definition("1, 128"),
            Err(GrammarError::OutOfRange(128))
        );
        assert_eq!(
            parse_part_definition("-1, 5"),
            Err(GrammarError::OutOfRange(-1))
        );
    }

    #[test]
    fn test_layout_definition_with_suffixes() {
        let layout = parse_layout_definition("Violin 1, violin 2 , flute", &registry()).unwrap();
        assert_eq!(
            layout.entries,
            vec![
                LayoutEntry::new("violin").with_suffix("1"),
                LayoutEntry::new("violin").with_suffix("2"),
                LayoutEntry::new("flute"),
            ]
        );
    }

    #[test]
    fn test_empty_layout_is_valid() {
        let layout = parse_layout_definition("   ", &registry()).unwrap();
        assert!(layout.is_empty());
    }

    #[test]
    fn test_layout_unknown_part() {
        assert_eq!(
            parse_layout_definition("flute, oboe, horn", &registry()),
            Err(GrammarError::UnknownPart("oboe".to_string()))
        );
    }

    #[test]
    fn test_layout_rejects_empty_group_and_bad_names() {
        assert_eq!(
            parse_layout_definition("flute,,violin", &registry()),
            Err(GrammarError::BadName(String::new()))
        );
        assert_eq!(
            parse_layout_definition("flute, vi-olin", &registry()),
            Err(GrammarError::BadName("vi-olin".to_string()))
        );
        assert_eq!(
            parse_layout_definition("violin 1 extra", &registry()),
            Err(GrammarError::TrailingTokens("extra".to_string()))
        );
    }

    #[test]
    fn test_layout_rejects_duplicate_labels() {
        assert_eq!(
            parse_layout_definition("violin, violin", &registry()),
            Err(GrammarError::DuplicateLabel("violin".to_string()))
        );
        assert_eq!(
            parse_layout_definition("violin 1, flute, violin 1", &registry()),
            Err(GrammarError::DuplicateLabel("violin 1".to_string()))
        );
    }

    #[test]
    fn test_parse_layout_checks_name_first() {
        assert_eq!(
            parse_layout("my layout", "flute", &registry()),
            Err(GrammarError::BadName("my layout".to_string()))
        );
        let (name, layout) = parse_layout("Solo", "flute", &registry()).unwrap();
        assert_eq!(name, "solo");
        assert_eq!(layout.len(), 1);
    }
}
