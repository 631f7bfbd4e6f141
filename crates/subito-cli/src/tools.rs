//! External converters: score rendering, MIDI <-> text, audio rendering.
//!
//! Every call blocks until the child exits. A non-zero exit is an error
//! carrying the tool's stderr so the operator can see what went wrong.

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use subito_conf::ToolsConfig;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Toolchain {
    tools: ToolsConfig,
}

impl Toolchain {
    pub fn new(tools: ToolsConfig) -> Self {
        Toolchain { tools }
    }

    /// Render a notation file to MIDI.
    pub fn render_score(&self, score: &Path, midi: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.tools.mscore);
        cmd.arg("-o").arg(midi).arg(score);
        run(&mut cmd, &self.tools.mscore, None)?;
        Ok(())
    }

    /// Convert a MIDI file to its text event sequence.
    pub fn midi_to_text(&self, midi: &Path) -> Result<String> {
        let mut cmd = Command::new(&self.tools.midicsv);
        cmd.arg(midi);
        let output = run(&mut cmd, &self.tools.midicsv, None)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Write a text event sequence out as a MIDI file.
    pub fn text_to_midi(&self, text: &str, midi: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.tools.csvmidi);
        cmd.arg("-").arg(midi);
        run(&mut cmd, &self.tools.csvmidi, Some(text.as_bytes()))?;
        Ok(())
    }

    /// Render a MIDI file to compressed audio; the format follows `audio`'s extension.
    pub fn render_audio(&self, midi: &Path, audio: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.tools.mscore);
        cmd.arg("-o").arg(audio).arg(midi);
        run(&mut cmd, &self.tools.mscore, None)?;
        Ok(())
    }
}

fn run(cmd: &mut Command, tool: &str, input: Option<&[u8]>) -> Result<Output> {
    debug!(?cmd, "running");

    cmd.stdin(if input.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped());

    let mut child = cmd
        .spawn()
        .with_context(|| format!("Failed to start `{}`", tool))?;

    if let Some(bytes) = input {
        let mut stdin = child
            .stdin
            .take()
            .context("child stdin was not captured")?;
        stdin
            .write_all(bytes)
            .with_context(|| format!("Failed to write to `{}`", tool))?;
        // stdin closes here so the tool sees end of input
    }

    let output = child
        .wait_with_output()
        .with_context(|| format!("Failed waiting for `{}`", tool))?;

    if !output.status.success() {
        bail!(
            "`{}` exited with {}: {}",
            tool,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(output)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn toolchain(midicsv: &str, csvmidi: &str) -> Toolchain {
        Toolchain::new(ToolsConfig {
            mscore: "false".to_string(),
            midicsv: midicsv.to_string(),
            csvmidi: csvmidi.to_string(),
        })
    }

    #[test]
    fn test_midi_to_text_captures_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("score.mid");
        std::fs::write(&path, "1, 0, Program_c, 0, 5\n").unwrap();

        let text = toolchain("cat", "cat").midi_to_text(&path).unwrap();
        assert_eq!(text, "1, 0, Program_c, 0, 5\n");
    }

    #[test]
    fn test_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = toolchain("cat", "cat")
            .render_score(&dir.path().join("a.mscz"), &dir.path().join("a.mid"))
            .unwrap_err();
        assert!(err.to_string().contains("`false` exited"));
    }

    #[test]
    fn test_missing_tool() {
        let dir = tempfile::tempdir().unwrap();
        let err = toolchain("/no/such/midicsv", "cat")
            .midi_to_text(&dir.path().join("a.mid"))
            .unwrap_err();
        assert!(err.to_string().contains("Failed to start `/no/such/midicsv`"));
    }
}
