//! Run settings and external tool names.

/// Values from the `[settings]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Channel volume applied to the soloed part's track.
    /// Default: 127
    pub foreground_volume: u8,

    /// Channel volume applied to every other track.
    /// Default: 80
    pub background_volume: u8,

    /// Preferred layout when several match a score. Lower-cased.
    /// Default: unset
    pub layout_priority: Option<String>,

    /// Text of the marker event written into every generated file.
    /// Default: "Generated By Subito"
    pub marker_text: String,

    /// Log filter (trace, debug, info, warn, error, or an EnvFilter directive).
    /// Default: info
    pub log_level: String,
}

impl Settings {
    fn default_foreground_volume() -> u8 {
        127
    }

    fn default_background_volume() -> u8 {
        80
    }

    fn default_marker_text() -> String {
        "Generated By Subito".to_string()
    }

    fn default_log_level() -> String {
        "info".to_string()
    }

    /// Set the layout priority, normalising case. Empty names unset it.
    pub fn set_layout_priority(&mut self, name: &str) {
        let name = name.trim().to_lowercase();
        self.layout_priority = if name.is_empty() { None } else { Some(name) };
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            foreground_volume: Self::default_foreground_volume(),
            background_volume: Self::default_background_volume(),
            layout_priority: None,
            marker_text: Self::default_marker_text(),
            log_level: Self::default_log_level(),
        }
    }
}

/// Executables for the external collaborators, from the `[tools]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolsConfig {
    /// Notation program used to render scores to MIDI and parts to MP3.
    /// Default: mscore
    pub mscore: String,

    /// MIDI to text converter.
    /// Default: midicsv
    pub midicsv: String,

    /// Text to MIDI converter.
    /// Default: csvmidi
    pub csvmidi: String,
}

impl ToolsConfig {
    fn default_mscore() -> String {
        "mscore".to_string()
    }

    fn default_midicsv() -> String {
        "midicsv".to_string()
    }

    fn default_csvmidi() -> String {
        "csvmidi".to_string()
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            mscore: Self::default_mscore(),
            midicsv: Self::default_midicsv(),
            csvmidi: Self::default_csvmidi(),
        }
    }
}
