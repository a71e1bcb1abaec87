/// Line buffer with mark/rewind. Validators and header skippers probe
/// ahead through it and return the read position unchanged; the prefix
/// they need is small, so lines are pre-buffered rather than streamed.
pub struct LineCursor {
    lines: Vec<String>,
    pos: usize,
    mark: usize,
}

impl LineCursor {
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            lines,
            pos: 0,
            mark: 0,
        }
    }

    pub fn from_text(text: &str) -> Self {
        Self::new(text.lines().map(|l| l.trim_end().to_string()).collect())
    }

    /// Remember the current position for a later `rewind`.
    pub fn mark(&mut self) {
        self.mark = self.pos;
    }

    /// Return to the last marked position.
    pub fn rewind(&mut self) {
        self.pos = self.mark;
    }

    pub fn next_line(&mut self) -> Option<&str> {
        let line = self.lines.get(self.pos)?;
        self.pos += 1;
        Some(line)
    }

    pub fn peek(&self) -> Option<&str> {
        self.lines.get(self.pos).map(|s| s.as_str())
    }

    /// Un-consume the most recent line (used when a skipper over-reads).
    pub fn step_back(&mut self) {
        if self.pos > 0 {
            self.pos -= 1;
        }
    }

    pub fn remaining(&self) -> usize {
        self.lines.len() - self.pos
    }
}
