//! Destination for text written by `print` and `println`.

use std::io::Write;

#[derive(Debug)]
pub enum PrintHandler {
    /// Writes straight to the process's standard output.
    Stdout,
    /// Captures output, for tests and embedding.
    Buffer(String),
}

impl PrintHandler {
    pub fn stdout() -> Self {
        PrintHandler::Stdout
    }

    pub fn buffer() -> Self {
        PrintHandler::Buffer(String::new())
    }

    pub fn print(&mut self, msg: &str) -> std::io::Result<()> {
        match self {
            PrintHandler::Stdout => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(msg.as_bytes())?;
                stdout.flush()
            }
            PrintHandler::Buffer(buffer) => {
                buffer.push_str(msg);
                Ok(())
            }
        }
    }

    /// Captured output; always empty for `Stdout`.
    pub fn get_output(&self) -> &str {
        match self {
            PrintHandler::Stdout => "",
            PrintHandler::Buffer(buffer) => buffer,
        }
    }
}

impl Default for PrintHandler {
    fn default() -> Self {
        Self::stdout()
    }
}
