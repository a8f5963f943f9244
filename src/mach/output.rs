/// Column where a line is broken with a backslash.
pub const LINE_LENGTH: usize = 70;

/// ## Line wrapping output buffer

#[derive(Debug, Default)]
pub struct Output {
    buffer: String,
    column: usize,
}

impl Output {
    pub fn new() -> Output {
        Output::default()
    }

    pub fn push(&mut self, ch: char) {
        if ch == '\n' {
            self.column = 0;
            self.buffer.push(ch);
            return;
        }
        self.column += 1;
        if self.column == LINE_LENGTH {
            self.buffer.push_str("\\\n");
            self.column = 1;
        }
        self.buffer.push(ch);
    }

    pub fn push_str(&mut self, s: &str) {
        for ch in s.chars() {
            self.push(ch);
        }
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_after_69_characters() {
        let mut out = Output::new();
        let digits: String = std::iter::repeat('7').take(75).collect();
        out.push_str(&digits);
        out.push('\n');
        let text = out.take();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), 70);
        assert!(lines[0].ends_with('\\'));
        assert_eq!(lines[1].len(), 6);
        assert_eq!(out.column(), 0);
    }

    #[test]
    fn test_newline_resets_column() {
        let mut out = Output::new();
        out.push_str(&"x".repeat(60));
        out.push('\n');
        out.push_str(&"y".repeat(60));
        assert!(!out.take().contains('\\'));
        assert_eq!(out.column(), 60);
    }

    #[test]
    fn test_wrapped_line_resumes_at_column_one() {
        let mut out = Output::new();
        out.push_str(&"z".repeat(69 + 69));
        assert_eq!(out.column(), 69);
        out.push('z');
        assert_eq!(out.take().matches("\\\n").count(), 2);
        assert_eq!(out.column(), 1);
    }
}
