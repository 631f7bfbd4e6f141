//! Text event sequences, as produced and consumed by `midicsv`/`csvmidi`.
//!
//! Each line is one record: `track, time, type, ...parameters`. Only three
//! record types matter here and are parsed into fields:
//!
//! ```text
//! 2, 0, Program_c, 1, 40          track, time, tag, channel, patch
//! 2, 0, Control_c, 1, 7, 100      track, time, tag, channel, controller, value
//! 1, 0, Text_t, "some text"       track, time, tag, text
//! ```
//!
//! Everything else is kept as the original line, untouched. The three
//! parsed shapes are written back with canonical `", "` separators, so
//! `2,0,Program_c,1,40` renders as `2, 0, Program_c, 1, 40`. The
//! converter reads both forms the same way.

use std::fmt;
use std::str::FromStr;

/// Controller number of the channel volume controller.
pub const VOLUME_CONTROLLER: u8 = 7;

const PROGRAM_CHANGE: &str = "Program_c";
const CONTROL_CHANGE: &str = "Control_c";
const TEXT: &str = "Text_t";
const START_TRACK: &str = "Start_track";

/// One record of an event sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ProgramChange {
        track: u32,
        time: String,
        channel: String,
        patch: u8,
    },
    ControlChange {
        track: u32,
        time: String,
        channel: String,
        controller: u8,
        value: u8,
    },
    Text {
        track: u32,
        time: String,
        /// Raw text field, including the converter's quotes.
        text: String,
    },
    /// Any other record, kept verbatim.
    Other(String),
}

impl Event {
    /// A text event carrying `text`, quoted the way the converter writes it.
    pub fn text(track: u32, time: impl Into<String>, text: &str) -> Self {
        Event::Text {
            track,
            time: time.into(),
            text: quote(text),
        }
    }

    pub fn track(&self) -> Option<u32> {
        match self {
            Event::ProgramChange { track, .. }
            | Event::ControlChange { track, .. }
            | Event::Text { track, .. } => Some(*track),
            Event::Other(line) => line.split(',').next()?.trim().parse().ok(),
        }
    }

    /// True for a channel volume controller event.
    pub fn is_volume(&self) -> bool {
        matches!(
            self,
            Event::ControlChange { controller, .. } if *controller == VOLUME_CONTROLLER
        )
    }

    /// The text of a text event with the converter's quoting removed.
    pub fn text_payload(&self) -> Option<String> {
        match self {
            Event::Text { text, .. } => Some(unquote(text)),
            _ => None,
        }
    }

    /// Track number if this record opens a track.
    pub fn starts_track(&self) -> Option<u32> {
        match self {
            Event::Other(line) => {
                let fields: Vec<_> = line.split(',').map(str::trim).collect();
                if fields.len() == 3 && fields[2] == START_TRACK {
                    fields[0].parse().ok()
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn parse_line(line: &str) -> Event {
        let other = || Event::Other(line.to_string());

        let mut head = line.splitn(4, ',');
        let (Some(track), Some(time), Some(tag)) = (head.next(), head.next(), head.next()) else {
            return other();
        };
        let Ok(track) = track.trim().parse::<u32>() else {
            return other();
        };
        let time = time.trim().to_string();
        let rest = head.next().unwrap_or("");

        match tag.trim() {
            PROGRAM_CHANGE => {
                let params: Vec<_> = rest.split(',').map(str::trim).collect();
                match params.as_slice() {
                    [channel, patch] => match patch.parse() {
                        Ok(patch) => Event::ProgramChange {
                            track,
                            time,
                            channel: channel.to_string(),
                            patch,
                        },
                        Err(_) => other(),
                    },
                    _ => other(),
                }
            }
            CONTROL_CHANGE => {
                let params: Vec<_> = rest.split(',').map(str::trim).collect();
                match params.as_slice() {
                    [channel, controller, value] => {
                        match (controller.parse(), value.parse()) {
                            (Ok(controller), Ok(value)) => Event::ControlChange {
                                track,
                                time,
                                channel: channel.to_string(),
                                controller,
                                value,
                            },
                            _ => other(),
                        }
                    }
                    _ => other(),
                }
            }
            TEXT => Event::Text {
                track,
                time,
                text: rest.trim_start().to_string(),
            },
            _ => other(),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::ProgramChange {
                track,
                time,
                channel,
                patch,
            } => write!(f, "{}, {}, {}, {}, {}", track, time, PROGRAM_CHANGE, channel, patch),
            Event::ControlChange {
                track,
                time,
                channel,
                controller,
                value,
            } => write!(
                f,
                "{}, {}, {}, {}, {}, {}",
                track, time, CONTROL_CHANGE, channel, controller, value
            ),
            Event::Text { track, time, text } => {
                write!(f, "{}, {}, {}, {}", track, time, TEXT, text)
            }
            Event::Other(line) => f.write_str(line),
        }
    }
}

/// A whole score as an ordered list of records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSequence {
    events: Vec<Event>,
}

impl EventSequence {
    pub fn new(events: Vec<Event>) -> Self {
        EventSequence { events }
    }

    pub fn parse(text: &str) -> Self {
        EventSequence {
            events: text.lines().map(Event::parse_line).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Event> {
        self.events.iter_mut()
    }

    pub fn insert(&mut self, index: usize, event: Event) {
        self.events.insert(index, event);
    }

    /// Render back to converter text, one record per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for event in &self.events {
            out.push_str(&event.to_string());
            out.push('\n');
        }
        out
    }
}

impl FromStr for EventSequence {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(EventSequence::parse(s))
    }
}

impl fmt::Display for EventSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Quote text for the converter; embedded quotes are doubled.
fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

fn unquote(text: &str) -> String {
    let text = text.trim();
    match text.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
        Some(inner) => inner.replace("\"\"", "\""),
        None => text.to_string(),
    }
}
