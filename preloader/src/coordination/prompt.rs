//! Line-based yes/no prompt for headless sessions.

use std::io::{BufRead, Write};

use super::error::{ProtocolError, ProtocolResult};

/// Asks yes/no questions over a pair of streams.
pub struct TerminalPrompt {
    input: Box<dyn BufRead + Send>,
    output: Box<dyn Write + Send>,
}

impl TerminalPrompt {
    pub fn new(input: Box<dyn BufRead + Send>, output: Box<dyn Write + Send>) -> Self {
        Self { input, output }
    }

    /// Prompt on stdin/stderr.
    pub fn stdio() -> Self {
        Self::new(
            Box::new(std::io::BufReader::new(std::io::stdin())),
            Box::new(std::io::stderr()),
        )
    }

    /// Ask until the answer is yes, no, blank or end of input.
    ///
    /// Blank input and end of input yield `default`.
    pub fn ask_yes_no(&mut self, question: &str, default: bool) -> ProtocolResult<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };

        loop {
            write!(self.output, "{} {}: ", question, hint).map_err(ProtocolError::Prompt)?;
            self.output.flush().map_err(ProtocolError::Prompt)?;

            let mut line = String::new();
            let read = self
                .input
                .read_line(&mut line)
                .map_err(ProtocolError::Prompt)?;
            if read == 0 {
                writeln!(self.output).map_err(ProtocolError::Prompt)?;
                return Ok(default);
            }

            match line.trim().to_ascii_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => {
                    writeln!(self.output, "Please answer 'y' or 'n'.")
                        .map_err(ProtocolError::Prompt)?;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedOutput(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedOutput {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn prompt(input: &str) -> (TerminalPrompt, SharedOutput) {
        let output = SharedOutput::default();
        let prompt = TerminalPrompt::new(
            Box::new(Cursor::new(input.as_bytes().to_vec())),
            Box::new(output.clone()),
        );
        (prompt, output)
    }

    #[test]
    fn test_yes_and_no() {
        let (mut p, _) = prompt("yes\n");
        assert!(p.ask_yes_no("Download?", false).unwrap());

        let (mut p, _) = prompt("N\n");
        assert!(!p.ask_yes_no("Download?", true).unwrap());
    }

    #[test]
    fn test_blank_uses_default() {
        let (mut p, out) = prompt("\n");
        assert!(p.ask_yes_no("Download?", true).unwrap());
        let text = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("Download? [Y/n]: "));
    }

    #[test]
    fn test_eof_uses_default() {
        let (mut p, _) = prompt("");
        assert!(!p.ask_yes_no("Continue?", false).unwrap());
    }

    #[test]
    fn test_reasks_on_garbage() {
        let (mut p, out) = prompt("maybe\ny\n");
        assert!(p.ask_yes_no("Continue?", false).unwrap());
        let text = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("Please answer"));
    }
}
