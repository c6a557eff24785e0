//! Print and read capabilities.
//!
//! Output goes to stdout by default; tests and embedders swap in a buffer or
//! a silent sink. Input comes from stdin or a scripted list of lines. Both use
//! enum dispatch and are shared through `Rc` so the caller keeps a handle to
//! inspect or feed them.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

// ─── Print ───────────────────────────────────────────────────────────────────

/// Captures printed lines in memory.
#[derive(Debug, Default)]
pub struct BufferPrintHandler {
    buffer: RefCell<String>,
}

impl BufferPrintHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn println(&self, msg: &str) {
        let mut buf = self.buffer.borrow_mut();
        buf.push_str(msg);
        buf.push('\n');
    }

    pub fn get_output(&self) -> String {
        self.buffer.borrow().clone()
    }

    pub fn clear(&self) {
        self.buffer.borrow_mut().clear();
    }
}

#[derive(Debug)]
pub enum PrintHandler {
    Stdout,
    Buffer(BufferPrintHandler),
    /// Discards all output.
    Silent,
}

impl PrintHandler {
    /// Write one line followed by a newline.
    pub fn println(&self, msg: &str) -> io::Result<()> {
        match self {
            Self::Stdout => {
                let mut out = io::stdout().lock();
                writeln!(out, "{msg}")?;
                out.flush()
            }
            Self::Buffer(h) => {
                h.println(msg);
                Ok(())
            }
            Self::Silent => Ok(()),
        }
    }

    /// Captured output; empty for handlers that don't capture.
    pub fn get_output(&self) -> String {
        match self {
            Self::Buffer(h) => h.get_output(),
            Self::Stdout | Self::Silent => String::new(),
        }
    }

    pub fn clear(&self) {
        if let Self::Buffer(h) = self {
            h.clear();
        }
    }
}

pub type SharedPrintHandler = Rc<PrintHandler>;

pub fn stdout_handler() -> SharedPrintHandler {
    Rc::new(PrintHandler::Stdout)
}

pub fn buffer_handler() -> SharedPrintHandler {
    Rc::new(PrintHandler::Buffer(BufferPrintHandler::new()))
}

pub fn silent_handler() -> SharedPrintHandler {
    Rc::new(PrintHandler::Silent)
}

// ─── Read ────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ReadHandler {
    Stdin,
    /// Pre-supplied input, consumed front to back.
    Lines(RefCell<VecDeque<String>>),
}

impl ReadHandler {
    /// Next input line without its line terminator. `None` at end of input.
    pub fn read_line(&self) -> io::Result<Option<String>> {
        match self {
            Self::Stdin => {
                let mut line = String::new();
                if io::stdin().lock().read_line(&mut line)? == 0 {
                    return Ok(None);
                }
                Ok(Some(strip_newline(line)))
            }
            Self::Lines(lines) => Ok(lines.borrow_mut().pop_front()),
        }
    }

    /// Queue more scripted input. No effect on stdin.
    pub fn push_line(&self, line: impl Into<String>) {
        if let Self::Lines(lines) = self {
            lines.borrow_mut().push_back(line.into());
        }
    }
}

fn strip_newline(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}

pub type SharedReadHandler = Rc<ReadHandler>;

pub fn stdin_handler() -> SharedReadHandler {
    Rc::new(ReadHandler::Stdin)
}

pub fn scripted_input<I, S>(lines: I) -> SharedReadHandler
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Rc::new(ReadHandler::Lines(RefCell::new(lines.into_iter().map(Into::into).collect())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn buffer_handler_captures_lines() {
        let out = buffer_handler();
        out.println("a").unwrap();
        out.println("b\tc").unwrap();
        assert_eq!(out.get_output(), "a\nb\tc\n");
        out.clear();
        assert_eq!(out.get_output(), "");
    }

    #[test]
    fn silent_handler_discards_output() {
        let out = silent_handler();
        out.println("ignored").unwrap();
        assert_eq!(out.get_output(), "");
    }

    #[test]
    fn scripted_input_is_consumed_in_order() {
        let input = scripted_input(["first", "second"]);
        assert_eq!(input.read_line().unwrap().as_deref(), Some("first"));
        input.push_line("third");
        assert_eq!(input.read_line().unwrap().as_deref(), Some("second"));
        assert_eq!(input.read_line().unwrap().as_deref(), Some("third"));
        assert_eq!(input.read_line().unwrap(), None);
    }

    #[test]
    fn newline_is_stripped() {
        assert_eq!(strip_newline("x\n".to_string()), "x");
        assert_eq!(strip_newline("x\r\n".to_string()), "x");
        assert_eq!(strip_newline("x".to_string()), "x");
    }
}
