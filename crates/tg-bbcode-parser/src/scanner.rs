/// Scanner on a string.
///
/// Holds a byte cursor into the source and provides convenient APIs for the lexer to match
/// against what is left.
pub(crate) struct Scanner<'a> {
    /// Full source text.
    source: &'a str,

    /// Current byte position.
    position: usize,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self {
            source,
            position: 0,
        }
    }

    /// Check the scanner process reached the end or not.
    pub(crate) fn done(&self) -> bool {
        self.position >= self.source.len()
    }

    /// Get character at the current position.
    pub(crate) fn curr(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// The source text from current position to the end.
    pub(crate) fn remaining(&self) -> &'a str {
        self.source.get(self.position..).unwrap_or_default()
    }

    /// Move the position forward by `len` bytes.
    ///
    /// The caller shall ensure `len` is the length of a match taken from [`Scanner::remaining`],
    /// so the new position stays on a char boundary.
    pub(crate) fn advance(&mut self, len: usize) {
        self.position = (self.position + len).min(self.source.len());
    }

    pub(crate) fn position(&self) -> usize {
        self.position
    }

    /// Get the whole line containing byte `offset` and the column (in chars) of `offset` in it.
    pub(crate) fn line_at(&self, offset: usize) -> (&'a str, usize) {
        let offset = offset.min(self.source.len());
        let start = self.source[..offset].rfind('\n').map_or(0, |x| x + 1);
        let end = self.source[offset..]
            .find('\n')
            .map_or(self.source.len(), |x| offset + x);
        let column = self.source[start..offset].chars().count();
        (&self.source[start..end], column)
    }

    /// Render the line containing `offset` with a caret under the column.
    ///
    /// ```console
    /// hello ] world
    ///       ^
    /// ```
    pub(crate) fn pointer(&self, offset: usize) -> String {
        let (line, column) = self.line_at(offset);
        format!("{line}\n{}^", " ".repeat(column))
    }
}
