//! Terminal prompter: dialoguer on a TTY, plain line reads otherwise.

use dialoguer::{theme::ColorfulTheme, Input};
use std::io::{self, BufRead, IsTerminal, Write};
use subito::Prompter;

pub struct TerminalPrompter {
    interactive: bool,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        TerminalPrompter {
            interactive: io::stdin().is_terminal(),
        }
    }

    /// True when answers come from a terminal rather than a pipe.
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn ask_tty(&self, question: &str) -> io::Result<Option<String>> {
        // dialoguer appends its own separator
        let prompt = question.trim_end().trim_end_matches(':').to_string();

        let result = Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text();

        match result {
            Ok(answer) => Ok(Some(answer)),
            Err(dialoguer::Error::IO(e))
                if matches!(
                    e.kind(),
                    io::ErrorKind::UnexpectedEof | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(None)
            }
            Err(dialoguer::Error::IO(e)) => Err(e),
        }
    }

    fn ask_piped(&self, question: &str) -> io::Result<Option<String>> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", question)?;
        stdout.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            writeln!(stdout)?;
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn say(&mut self, line: &str) {
        println!("{}", line);
    }

    fn ask(&mut self, question: &str) -> subito::Result<Option<String>> {
        let answer = if self.interactive {
            self.ask_tty(question)?
        } else {
            self.ask_piped(question)?
        };
        Ok(answer)
    }
}
