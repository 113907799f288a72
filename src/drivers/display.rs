//! Status display capability
//!
//! A character LCD used for one-line status and fault text. Not part of the
//! navigation contract: failures here are logged and otherwise ignored.

use crate::error::Result;

/// Character display
pub trait StatusDisplay: Send {
    /// Blank the display
    fn clear(&mut self) -> Result<()>;

    /// Write one line of text, truncated to the display width
    fn write_line(&mut self, text: &str) -> Result<()>;

    /// Clear and write in one go
    fn show(&mut self, text: &str) -> Result<()> {
        self.clear()?;
        self.write_line(text)
    }
}

impl<D: StatusDisplay + ?Sized> StatusDisplay for Box<D> {
    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }

    fn write_line(&mut self, text: &str) -> Result<()> {
        (**self).write_line(text)
    }
}

/// Truncate `text` to at most `columns` characters
pub fn fit_line(text: &str, columns: usize) -> &str {
    match text.char_indices().nth(columns) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Display that renders to the log
pub struct LogDisplay {
    columns: usize,
    lines: Vec<String>,
}

impl LogDisplay {
    pub fn new(columns: usize) -> Self {
        Self {
            columns,
            lines: Vec::new(),
        }
    }

    /// Lines written since the last clear
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl StatusDisplay for LogDisplay {
    fn clear(&mut self) -> Result<()> {
        self.lines.clear();
        Ok(())
    }

    fn write_line(&mut self, text: &str) -> Result<()> {
        let line = fit_line(text, self.columns);
        if line.len() < text.len() {
            log::debug!("Display: truncated {:?} to {} columns", text, self.columns);
        }
        log::info!("LCD | {}", line);
        self.lines.push(line.to_string());
        Ok(())
    }
}
