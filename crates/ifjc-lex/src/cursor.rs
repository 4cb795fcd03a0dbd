/// Byte-at-a-time view over the source text with single-byte unread.
///
/// The grow-on-append buffer of the original design is modeled here as
/// `lexeme`: a `String` the lexer appends confirmed bytes to while building
/// up one token's attribute, then drains via [`Cursor::take_lexeme`].
pub struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    lexeme: String,
}

impl<'a> Cursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Cursor {
            bytes,
            pos: 0,
            line: 1,
            lexeme: String::new(),
        }
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    /// Look at the next byte without consuming it.
    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// Look one byte past `peek` without consuming anything.
    pub fn peek2(&self) -> Option<u8> {
        self.bytes.get(self.pos + 1).copied()
    }

    /// Consume and return the next byte, tracking line number on `\n`.
    pub fn bump(&mut self) -> Option<u8> {
        let b = *self.bytes.get(self.pos)?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
        }
        Some(b)
    }

    /// Push back the single most recently consumed byte. The design only
    /// ever needs one byte of unread capacity.
    pub fn unread(&mut self) {
        debug_assert!(self.pos > 0, "unread with nothing consumed");
        self.pos -= 1;
        if self.bytes.get(self.pos) == Some(&b'\n') {
            self.line -= 1;
        }
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Append a confirmed byte to the in-progress lexeme buffer.
    pub fn push_lexeme(&mut self, b: u8) {
        self.lexeme.push(b as char);
    }

    /// Drain and return the accumulated lexeme text.
    pub fn take_lexeme(&mut self) -> String {
        std::mem::take(&mut self.lexeme)
    }
}
