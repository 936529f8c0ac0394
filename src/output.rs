use std::io::{self, Write};

/// The single channel every user-visible message goes through.
pub trait Printer: Send {
    /// Write text without a trailing newline (progress dots, prompts).
    fn write(&mut self, text: &str);

    fn print(&mut self, text: &str) {
        self.write(text);
        self.write("\n");
    }

    fn error(&mut self, text: &str) {
        self.print(&format!("**{}**", text));
    }
}

pub struct StdoutPrinter;

impl Printer for StdoutPrinter {
    fn write(&mut self, text: &str) {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }
}

/// Collects output in memory; used by tests and scripted sessions.
#[derive(Debug, Default)]
pub struct BufferPrinter {
    buffer: String,
}

impl BufferPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> &str {
        &self.buffer
    }

    pub fn lines(&self) -> Vec<&str> {
        self.buffer.lines().collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.buffer.contains(needle)
    }

    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }
}

impl Printer for BufferPrinter {
    fn write(&mut self, text: &str) {
        self.buffer.push_str(text);
    }
}
