//! Line input for the interactive loops
//!
//! With the `interactive` feature lines come from rustyline, with history
//! kept under the user's data directory. Without it they are read from
//! stdin.

use std::path::PathBuf;

/// Per-user data directory, e.g. `~/.local/share/termquest`.
pub fn data_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.data_dir().join("termquest"))
}

/// History file for one of the programs.
pub fn history_path(program: &str) -> Option<PathBuf> {
    data_dir().map(|d| d.join(format!("{program}_history.txt")))
}

#[cfg(feature = "interactive")]
pub use self::editor::LineReader;

#[cfg(not(feature = "interactive"))]
pub use self::plain::LineReader;

#[cfg(feature = "interactive")]
mod editor {
    use std::path::PathBuf;

    use anyhow::{Context, Result};
    use rustyline::DefaultEditor;
    use rustyline::error::ReadlineError;

    pub struct LineReader {
        editor: DefaultEditor,
        history: Option<PathBuf>,
    }

    impl LineReader {
        pub fn new(history: Option<PathBuf>) -> Result<Self> {
            let mut editor = DefaultEditor::new().context("Failed to create editor")?;
            if let Some(path) = &history
                && let Err(e) = editor.load_history(path)
            {
                // Missing history is expected on first run
                let not_found = matches!(&e, ReadlineError::Io(io) if io.kind() == std::io::ErrorKind::NotFound);
                if !not_found {
                    tracing::warn!("Failed to load history: {}", e);
                }
            }
            Ok(Self { editor, history })
        }

        /// Next line, or `None` at end of input. Lines read with `record`
        /// unset (passwords) stay out of the history.
        pub fn read(&mut self, prompt: &str, record: bool) -> Result<Option<String>> {
            match self.editor.readline(prompt) {
                Ok(line) => {
                    if record
                        && !line.trim().is_empty()
                        && let Err(e) = self.editor.add_history_entry(line.as_str())
                    {
                        tracing::warn!("Failed to add history entry: {}", e);
                    }
                    Ok(Some(line))
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    Ok(Some(String::new()))
                }
                Err(ReadlineError::Eof) => Ok(None),
                Err(e) => Err(e).context("Failed to read line"),
            }
        }

        pub fn save(&mut self) {
            let Some(path) = &self.history else {
                return;
            };
            if let Some(parent) = path.parent()
                && let Err(e) = std::fs::create_dir_all(parent)
            {
                tracing::warn!("Failed to create history directory: {}", e);
            }
            if let Err(e) = self.editor.save_history(path) {
                tracing::warn!("Failed to save history: {}", e);
            }
        }
    }
}

#[cfg(not(feature = "interactive"))]
mod plain {
    use std::io::{BufRead, Write};
    use std::path::PathBuf;

    use anyhow::{Context, Result};

    pub struct LineReader;

    impl LineReader {
        pub fn new(_history: Option<PathBuf>) -> Result<Self> {
            Ok(Self)
        }

        pub fn read(&mut self, prompt: &str, _record: bool) -> Result<Option<String>> {
            print!("{prompt}");
            std::io::stdout().flush().context("Failed to flush stdout")?;

            let mut line = String::new();
            let read = std::io::stdin()
                .lock()
                .read_line(&mut line)
                .context("Failed to read line")?;
            if read == 0 {
                return Ok(None);
            }
            Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
        }

        pub fn save(&mut self) {}
    }
}
