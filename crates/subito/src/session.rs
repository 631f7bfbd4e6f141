//! One run of the engine: a registry, the settings, and an operator.

use crate::events::EventSequence;
use crate::matcher::{self, LayoutChoice};
use crate::priority;
use crate::prompt::Prompter;
use crate::registry::Registry;
use crate::scan::{self, ScanOutcome};
use crate::transform::{self, PartFile, TransformParams};
use crate::{Error, Result};
use subito_conf::Settings;
use tracing::info;

/// Result of processing one score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The score is one of our own outputs; nothing to do.
    AlreadyProcessed,
    Rendered {
        layout: LayoutChoice,
        parts: Vec<PartFile>,
    },
}

/// Engine state shared by every score in a run.
///
/// The registry only grows during a run: layouts and parts the operator
/// defines while one score is processed are available to the next.
pub struct Session<P> {
    registry: Registry,
    settings: Settings,
    prompter: P,
}

impl<P: Prompter> Session<P> {
    pub fn new(registry: Registry, settings: Settings, prompter: P) -> Self {
        Session {
            registry,
            settings,
            prompter,
        }
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    /// Make sure the layout priority, if set, names a usable layout.
    pub fn resolve_priority(&mut self) -> Result<Option<&str>> {
        let priority = self.settings.layout_priority.take();
        self.settings.layout_priority =
            priority::resolve_layout_priority(priority, &mut self.registry, &mut self.prompter)?;
        Ok(self.settings.layout_priority.as_deref())
    }

    /// Scan, match, and transform one score given as converter text.
    pub fn process(&mut self, score: &str, text: &str) -> Result<Outcome> {
        let events = EventSequence::parse(text);

        let scan = match scan::scan(
            events,
            self.settings.background_volume,
            &self.settings.marker_text,
        ) {
            ScanOutcome::AlreadyProcessed => {
                info!(score, "already processed, skipping");
                return Ok(Outcome::AlreadyProcessed);
            }
            ScanOutcome::Scanned(scan) => scan,
        };

        let choice = matcher::choose_layout(
            score,
            &scan.patches,
            &mut self.registry,
            &mut self.settings.layout_priority,
            &mut self.prompter,
        )?;
        info!(score, layout = %choice.name, selection = ?choice.selection, "layout chosen");

        let layout = self
            .registry
            .layout(&choice.name)
            .ok_or_else(|| Error::UnknownLayout(choice.name.clone()))?;

        let parts = transform::transform_parts(
            &scan.events,
            layout,
            &self.registry,
            TransformParams {
                foreground_volume: self.settings.foreground_volume,
                marker_text: &self.settings.marker_text,
            },
        )?;

        Ok(Outcome::Rendered {
            layout: choice,
            parts,
        })
    }
}
