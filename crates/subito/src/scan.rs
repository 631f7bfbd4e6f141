//! Single pass over a score: patch assignments, volume baseline, marker check.

use crate::events::{Event, EventSequence, VOLUME_CONTROLLER};
use std::collections::BTreeMap;
use tracing::debug;

/// Track number (1-based) to the patch last assigned on it.
pub type PatchMap = BTreeMap<u32, u8>;

/// A scanned score, with every volume event already set to the background level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan {
    pub patches: PatchMap,
    pub events: EventSequence,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Scanned(Scan),
    /// The score carries our marker: it is one of our own outputs.
    AlreadyProcessed,
}

/// Scan `events` in one forward pass.
///
/// Program changes fill the patch map (last one per track wins). Every
/// channel volume event is rewritten to `background_volume`. A text event
/// equal to `marker_text` stops the scan immediately.
pub fn scan(mut events: EventSequence, background_volume: u8, marker_text: &str) -> ScanOutcome {
    let mut patches = PatchMap::new();

    for event in events.iter_mut() {
        if event
            .text_payload()
            .is_some_and(|text| text == marker_text)
        {
            debug!("marker found, score was already processed");
            return ScanOutcome::AlreadyProcessed;
        }

        match event {
            Event::ProgramChange { track, patch, .. } => {
                debug!(track = *track, patch = *patch, "program change");
                patches.insert(*track, *patch);
            }
            Event::ControlChange {
                controller, value, ..
            } if *controller == VOLUME_CONTROLLER => {
                *value = background_volume;
            }
            _ => {}
        }
    }

    debug!(?patches, "scan complete");
    ScanOutcome::Scanned(Scan { patches, events })
}
