//! Rewriting a scanned score into one rehearsal sequence per part.

use crate::events::{Event, EventSequence, VOLUME_CONTROLLER};
use crate::registry::{Layout, Part, Registry};
use crate::{Error, Result};
use tracing::debug;

/// Rehearsal sequence for one entry of the chosen layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartFile {
    /// Part name plus suffix, used to name the output.
    pub label: String,
    pub part: String,
    /// Track soloed in this file.
    pub track: u32,
    pub events: EventSequence,
}

/// Loudness and marker applied to every part.
#[derive(Debug, Clone, Copy)]
pub struct TransformParams<'a> {
    pub foreground_volume: u8,
    pub marker_text: &'a str,
}

/// Produce one [`PartFile`] per entry in `layout`.
///
/// `events` must already have been through [`crate::scan::scan`], so every
/// track starts at the background volume.
pub fn transform_parts(
    events: &EventSequence,
    layout: &Layout,
    registry: &Registry,
    params: TransformParams<'_>,
) -> Result<Vec<PartFile>> {
    layout
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let part = registry
                .part(&entry.part)
                .ok_or_else(|| Error::UnknownPart(entry.part.clone()))?;
            let track = (i + 1) as u32;
            debug!(part = %entry.part, track, "rendering part");

            Ok(PartFile {
                label: entry.label(),
                part: entry.part.clone(),
                track,
                events: transform_part(events, track, part, params),
            })
        })
        .collect()
}

/// Solo `track`: mark the copy, raise the track's volume events to the
/// foreground level, and swap its program changes from the part's source
/// patch to its target patch. Other tracks are untouched.
pub fn transform_part(
    events: &EventSequence,
    track: u32,
    part: &Part,
    params: TransformParams<'_>,
) -> EventSequence {
    let mut out = events.clone();

    for event in out.iter_mut() {
        match event {
            Event::ControlChange {
                track: t,
                controller,
                value,
                ..
            } if *t == track && *controller == VOLUME_CONTROLLER => {
                *value = params.foreground_volume;
            }
            Event::ProgramChange {
                track: t, patch, ..
            } if *t == track && *patch == part.source_patch => {
                *patch = part.target_patch;
            }
            _ => {}
        }
    }

    insert_marker(&mut out, params.marker_text);
    out
}

/// Add the marker text event at time 0.
///
/// The converter wants the header and the first `Start_track` record before
/// any event, so when those are present the marker goes right after the
/// first `Start_track`, on that track. Bare sequences get it at the front.
pub fn insert_marker(events: &mut EventSequence, marker_text: &str) {
    let opening = events
        .iter()
        .enumerate()
        .find_map(|(i, event)| event.starts_track().map(|track| (i, track)));

    match opening {
        Some((i, track)) => events.insert(i + 1, Event::text(track, "0", marker_text)),
        None => events.insert(0, Event::text(0, "0", marker_text)),
    }
}

/// `<score>_<label>.mid`
pub fn output_file_name(score: &str, label: &str) -> String {
    format!("{}_{}.mid", score, label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::LayoutEntry;
    use pretty_assertions::assert_eq;

    const PARAMS: TransformParams<'static> = TransformParams {
        foreground_volume: 127,
        marker_text: "Generated By Subito",
    };

    #[test]
    fn test_solo_track_only() {
        let events = EventSequence::parse(
            "1, 0, Program_c, 0, 0\n\
             1, 0, Control_c, 0, 7, 80\n\
             2, 0, Program_c, 1, 0\n\
             2, 0, Control_c, 1, 7, 80\n",
        );

        let out = transform_part(&events, 1, &Part::new(0, 10), PARAMS);

        assert_eq!(
            out.render(),
            "0, 0, Text_t, \"Generated By Subito\"\n\
             1, 0, Program_c, 0, 10\n\
             1, 0, Control_c, 0, 7, 127\n\
             2, 0, Program_c, 1, 0\n\
             2, 0, Control_c, 1, 7, 80\n"
        );
    }

    #[test]
    fn test_only_source_patch_is_swapped() {
        let events = EventSequence::parse("1, 0, Program_c, 0, 0\n1, 960, Program_c, 0, 5\n");
        let out = transform_part(&events, 1, &Part::new(0, 10), PARAMS);
        let patches: Vec<_> = out
            .iter()
            .filter_map(|e| match e {
                Event::ProgramChange { patch, .. } => Some(*patch),
                _ => None,
            })
            .collect();
        assert_eq!(patches, vec![10, 5]);
    }

    #[test]
    fn test_marker_follows_first_start_track() {
        let events = EventSequence::parse(
            "0, 0, Header, 1, 2, 480\n\
             1, 0, Start_track\n\
             1, 0, End_track\n\
             2, 0, Start_track\n\
             2, 0, End_track\n\
             0, 0, End_of_file\n",
        );
        let out = transform_part(&events, 2, &Part::new(0, 0), PARAMS);
        assert_eq!(
            out.events()[2],
            Event::text(1, "0", "Generated By Subito")
        );
        assert_eq!(out.len(), events.len() + 1);
    }

    #[test]
    fn test_doubled_parts_use_their_own_tracks() {
        let mut registry = Registry::new();
        registry.upsert_part("violin", Part::new(40, 41));
        let layout = Layout::new(vec![
            LayoutEntry::new("violin").with_suffix("1"),
            LayoutEntry::new("violin").with_suffix("2"),
        ]);
        let events = EventSequence::parse("1, 0, Program_c, 0, 40\n2, 0, Program_c, 1, 40\n");

        let files = transform_parts(&events, &layout, &registry, PARAMS).unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].label, "violin1");
        assert_eq!(files[0].track, 1);
        assert_eq!(files[1].label, "violin2");
        assert_eq!(files[1].track, 2);
        assert_eq!(
            files[1].events.render(),
            "0, 0, Text_t, \"Generated By Subito\"\n\
             1, 0, Program_c, 0, 40\n\
             2, 0, Program_c, 1, 41\n"
        );
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("Ave Verum", "alto"), "Ave Verum_alto.mid");
    }
}
