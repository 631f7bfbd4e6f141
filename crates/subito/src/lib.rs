//! Rehearsal file generation: layout matching and per-part event rewriting.
//!
//! A score arrives as a text event sequence (the `midicsv` format). The
//! engine scans it for the patch on each track, finds the configured
//! layout whose parts use exactly those patches in that track order, and
//! writes one copy of the score per part with that part's track brought to
//! the foreground and its patch swapped for the rehearsal sound.
//!
//! # Example
//!
//! ```
//! use subito::{Outcome, Registry, ScriptedPrompter, Session};
//! use subito_conf::{RawEntry, Settings};
//!
//! let registry = Registry::from_entries(
//!     &[RawEntry::new("flute", "0, 10"), RawEntry::new("clarinet", "1, 11")],
//!     &[RawEntry::new("duo", "flute, clarinet")],
//! );
//! let mut session = Session::new(registry, Settings::default(), ScriptedPrompter::silent());
//!
//! let score = "1, 0, Program_c, 0, 0\n2, 0, Program_c, 1, 1\n";
//! match session.process("duo_score", score).unwrap() {
//!     Outcome::Rendered { layout, parts } => {
//!         assert_eq!(layout.name, "duo");
//!         assert_eq!(parts.len(), 2);
//!     }
//!     Outcome::AlreadyProcessed => unreachable!(),
//! }
//! ```

pub mod events;
pub mod grammar;
pub mod matcher;
pub mod priority;
pub mod prompt;
pub mod registry;
pub mod repair;
pub mod scan;
pub mod session;
pub mod transform;

pub use events::{Event, EventSequence};
pub use grammar::GrammarError;
pub use matcher::{LayoutChoice, Selection};
pub use prompt::{Prompter, ScriptedPrompter};
pub use registry::{Layout, LayoutEntry, Part, Registry};
pub use scan::{PatchMap, Scan, ScanOutcome};
pub use session::{Outcome, Session};
pub use transform::{output_file_name, PartFile};

use thiserror::Error;

/// Errors from the engine.
///
/// Bad definitions are not errors: they are [`GrammarError`] values that
/// the repair drivers handle. These are the ways a run can fail to go on.
#[derive(Debug, Error)]
pub enum Error {
    #[error("input closed while waiting for an answer to: {0}")]
    Aborted(String),

    #[error("prompt failed: {0}")]
    Prompt(#[from] std::io::Error),

    #[error("layout `{0}` is not defined")]
    UnknownLayout(String),

    #[error("part `{0}` is not defined")]
    UnknownPart(String),
}

pub type Result<T> = std::result::Result<T, Error>;
