//! Indentation-aware text buffer for generated source.

/// Output buffer with a tab indentation level.
#[derive(Clone, Debug, Default)]
pub struct SourceBuffer {
    indent: usize,
    output: String,
}

impl SourceBuffer {
    pub fn new() -> Self {
        SourceBuffer {
            indent: 0,
            output: String::with_capacity(4096),
        }
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn dedent(&mut self) {
        debug_assert!(self.indent > 0, "dedent called with zero indent");
        self.indent = self.indent.saturating_sub(1);
    }

    /// Write a string without indentation or newline.
    pub fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    /// Write an indented line.
    pub fn writeln(&mut self, s: &str) {
        for _ in 0..self.indent {
            self.output.push('\t');
        }
        self.output.push_str(s);
        self.output.push('\n');
    }

    pub fn newline(&mut self) {
        self.output.push('\n');
    }

    /// Write `// <text>` for every line of `text`.
    pub fn comment(&mut self, text: &str) {
        for line in text.lines() {
            if line.is_empty() {
                self.writeln("//");
            } else {
                self.writeln(&format!("// {line}"));
            }
        }
    }

    /// Open a `{` block: write `head {` and indent.
    pub fn open(&mut self, head: &str) {
        self.writeln(&format!("{head} {{"));
        self.indent();
    }

    /// Close a block opened with [`SourceBuffer::open`].
    pub fn close(&mut self) {
        self.dedent();
        self.writeln("}");
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.output
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn indent_dedent() {
        let mut buf = SourceBuffer::new();
        buf.writeln("line1");
        buf.indent();
        buf.writeln("line2");
        buf.indent();
        buf.writeln("line3");
        buf.dedent();
        buf.writeln("line4");
        buf.dedent();
        buf.writeln("line5");
        assert_eq!(buf.take_output(), "line1\n\tline2\n\t\tline3\n\tline4\nline5\n");
        assert!(buf.is_empty());
    }

    #[test]
    fn blocks_and_comments() {
        let mut buf = SourceBuffer::new();
        buf.comment("Point is a point.\n\nSecond paragraph.");
        buf.open("type Point struct");
        buf.writeln("X int32");
        buf.close();
        assert_eq!(
            buf.as_str(),
            "// Point is a point.\n//\n// Second paragraph.\ntype Point struct {\n\tX int32\n}\n"
        );
    }
}
