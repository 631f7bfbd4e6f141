//! Parts, layouts, and the registry that owns them for a whole run.

use crate::grammar::{self, GrammarError};
use crate::prompt::Prompter;
use crate::repair;
use crate::Result;
use std::collections::BTreeMap;
use std::fmt;
use subito_conf::RawEntry;
use tracing::{debug, warn};

/// A named instrument role: the patch it is notated with, and the patch
/// its solo render should use instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Part {
    pub source_patch: u8,
    pub target_patch: u8,
}

impl Part {
    pub fn new(source_patch: u8, target_patch: u8) -> Self {
        Part {
            source_patch,
            target_patch,
        }
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.source_patch, self.target_patch)
    }
}

/// One position in a layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutEntry {
    pub part: String,
    /// Distinguishes repeated uses of one part, e.g. `violin 1`, `violin 2`.
    pub suffix: Option<String>,
}

impl LayoutEntry {
    pub fn new(part: impl Into<String>) -> Self {
        LayoutEntry {
            part: part.into(),
            suffix: None,
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// Name used for the output file: part name followed by the suffix.
    pub fn label(&self) -> String {
        match &self.suffix {
            Some(suffix) => format!("{}{}", self.part, suffix),
            None => self.part.clone(),
        }
    }
}

impl fmt::Display for LayoutEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.suffix {
            Some(suffix) => write!(f, "{} {}", self.part, suffix),
            None => write!(f, "{}", self.part),
        }
    }
}

/// Ordered instrumentation. Position `i` corresponds to track `i + 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    pub entries: Vec<LayoutEntry>,
}

impl Layout {
    pub fn new(entries: Vec<LayoutEntry>) -> Self {
        Layout { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayoutEntry> {
        self.entries.iter()
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}

/// All known parts and layouts.
///
/// The registry only grows or replaces entries: `upsert_*` inserts a new
/// name at the end, or replaces the value of an existing name in place so
/// that layout iteration order stays stable for the rest of the run.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    parts: BTreeMap<String, Part>,
    layouts: Vec<(String, Layout)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from raw config entries without prompting.
    ///
    /// Invalid entries are dropped with a warning. Parts are loaded first so
    /// layouts can reference any part in the file regardless of order.
    pub fn from_entries(parts: &[RawEntry], layouts: &[RawEntry]) -> Self {
        let mut registry = Registry::with_parts(parts);

        for entry in layouts {
            match grammar::parse_layout(&entry.name, &entry.definition, &registry) {
                Ok((name, layout)) => registry.add_loaded_layout(name, layout),
                Err(e) => drop_layout(entry, &e),
            }
        }

        registry
    }

    /// Build a registry from raw config entries, asking the operator to
    /// define any part a layout references but the config does not.
    ///
    /// Layouts with other problems are still dropped with a warning.
    pub fn from_entries_with(
        parts: &[RawEntry],
        layouts: &[RawEntry],
        prompter: &mut dyn Prompter,
    ) -> Result<Self> {
        let mut registry = Registry::with_parts(parts);

        for entry in layouts {
            match grammar::parse_layout(&entry.name, &entry.definition, &registry) {
                Ok((name, layout)) => registry.add_loaded_layout(name, layout),
                Err(GrammarError::UnknownPart(part)) => {
                    debug!(layout = %entry.name, part = %part, "repairing layout");
                    repair::repair_layout(
                        &mut registry,
                        prompter,
                        &entry.name,
                        &entry.definition,
                    )?;
                }
                Err(e) => drop_layout(entry, &e),
            }
        }

        Ok(registry)
    }

    fn with_parts(parts: &[RawEntry]) -> Self {
        let mut registry = Registry::new();

        for entry in parts {
            match grammar::parse_part(&entry.name, &entry.definition) {
                Ok((name, part)) => {
                    debug!(part = %name, definition = %part, "loaded part");
                    registry.upsert_part(name, part);
                }
                Err(e) => warn!(
                    "dropping part `{}` = `{}`: {}",
                    entry.name, entry.definition, e
                ),
            }
        }

        registry
    }

    fn add_loaded_layout(&mut self, name: String, layout: Layout) {
        if layout.is_empty() {
            debug!(layout = %name, "layout contains no parts");
        }
        self.upsert_layout(name, layout);
    }

    pub fn part(&self, name: &str) -> Option<&Part> {
        self.parts.get(name)
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    /// Insert or replace a part. Returns the previous definition, if any.
    pub fn upsert_part(&mut self, name: impl Into<String>, part: Part) -> Option<Part> {
        self.parts.insert(name.into(), part)
    }

    pub fn parts(&self) -> impl Iterator<Item = (&str, &Part)> {
        self.parts.iter().map(|(name, part)| (name.as_str(), part))
    }

    pub fn layout(&self, name: &str) -> Option<&Layout> {
        self.layouts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, layout)| layout)
    }

    /// True if `name` is defined and has at least one part.
    pub fn has_usable_layout(&self, name: &str) -> bool {
        self.layout(name).is_some_and(|layout| !layout.is_empty())
    }

    /// Insert or replace a layout. Returns the previous definition, if any.
    pub fn upsert_layout(&mut self, name: impl Into<String>, layout: Layout) -> Option<Layout> {
        let name = name.into();
        match self.layouts.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, layout)),
            None => {
                self.layouts.push((name, layout));
                None
            }
        }
    }

    /// Layouts in registration order.
    pub fn layouts(&self) -> impl Iterator<Item = (&str, &Layout)> {
        self.layouts.iter().map(|(name, layout)| (name.as_str(), layout))
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn layout_count(&self) -> usize {
        self.layouts.len()
    }
}

fn drop_layout(entry: &RawEntry, e: &GrammarError) {
    warn!(
        "dropping layout `{}` = `{}`: {}",
        entry.name, entry.definition, e
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompter;
    use crate::Error;

    #[test]
    fn test_label_and_display() {
        let plain = LayoutEntry::new("flute");
        let doubled = LayoutEntry::new("violin").with_suffix("2");

        assert_eq!(plain.label(), "flute");
        assert_eq!(doubled.label(), "violin2");
        assert_eq!(doubled.to_string(), "violin 2");

        let layout = Layout::new(vec![plain, doubled]);
        assert_eq!(layout.to_string(), "flute, violin 2");
    }

    #[test]
    fn test_from_entries_drops_invalid() {
        let parts = vec![
            RawEntry::new("flute", "0, 10"),
            RawEntry::new("broken", "0, 200"),
            RawEntry::new("clarinet", "1, 11"),
        ];
        let layouts = vec![
            RawEntry::new("duo", "flute, clarinet"),
            RawEntry::new("trio", "flute, clarinet, oboe"),
            RawEntry::new("silence", ""),
        ];

        let registry = Registry::from_entries(&parts, &layouts);

        assert_eq!(registry.part_count(), 2);
        assert!(!registry.has_part("broken"));
        assert!(registry.has_usable_layout("duo"));
        assert!(registry.layout("trio").is_none());
        assert!(registry.layout("silence").is_some());
        assert!(!registry.has_usable_layout("silence"));
    }

    #[test]
    fn test_layout_may_reference_later_part() {
        let parts = vec![RawEntry::new("oboe", "68, 68")];
        let layouts = vec![RawEntry::new("solo", "oboe")];
        let registry = Registry::from_entries(&parts, &layouts);
        assert!(registry.has_usable_layout("solo"));
    }

    #[test]
    fn test_upsert_layout_keeps_position() {
        let mut registry = Registry::new();
        registry.upsert_part("flute", Part::new(0, 10));
        registry.upsert_layout("a", Layout::default());
        registry.upsert_layout("b", Layout::default());

        let previous = registry.upsert_layout("a", Layout::new(vec![LayoutEntry::new("flute")]));
        assert_eq!(previous, Some(Layout::default()));

        let names: Vec<_> = registry.layouts().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(registry.has_usable_layout("a"));
    }

    #[test]
    fn test_from_entries_with_defines_missing_parts() {
        let parts = vec![
            RawEntry::new("flute", "0, 10"),
            RawEntry::new("clarinet", "1, 11"),
        ];
        let layouts = vec![
            RawEntry::new("trio", "flute, clarinet, oboe"),
            RawEntry::new("oboe_duo", "oboe, flute"),
            RawEntry::new("bad name", "flute"),
        ];
        let mut prompter = ScriptedPrompter::new(["2, 68"]);

        let registry = Registry::from_entries_with(&parts, &layouts, &mut prompter).unwrap();

        assert_eq!(registry.part("oboe"), Some(&Part::new(2, 68)));
        assert!(registry.has_usable_layout("trio"));
        // Parts defined while repairing are visible to later layouts
        assert!(registry.has_usable_layout("oboe_duo"));
        assert!(registry.layout("bad name").is_none());
        assert!(prompter.saw("Part `oboe` not found when processing layout `trio`"));
        assert_eq!(prompter.remaining(), 0);

        let names: Vec<_> = registry.layouts().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["trio", "oboe_duo"]);
    }

    #[test]
    fn test_from_entries_with_closed_input_aborts() {
        let parts = vec![RawEntry::new("flute", "0, 10")];
        let layouts = vec![RawEntry::new("duo", "flute, oboe")];
        let mut prompter = ScriptedPrompter::silent();

        let err = Registry::from_entries_with(&parts, &layouts, &mut prompter).unwrap_err();
        assert!(matches!(err, Error::Aborted(_)));
    }
}
