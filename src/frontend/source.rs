//! Character sources for the lexer
//!
//! The lexer only needs absolute random-access reads plus a cursor that
//! moves forward. Offsets are in characters, not bytes.

/// Random-access character input with a forward-moving cursor
pub trait CharSource {
    /// Character at an absolute offset, `None` past the end
    fn at(&self, offset: usize) -> Option<char>;

    /// Move the cursor forward by `delta` characters
    fn advance(&mut self, delta: usize);

    /// Current cursor offset
    fn position(&self) -> usize;

    /// Character under the cursor
    fn peek(&self) -> Option<char> {
        self.at(self.position())
    }

    /// Check if the cursor has run off the end of the input
    fn is_eof(&self) -> bool {
        self.peek().is_none()
    }
}

/// In-memory source over the characters of a string
#[derive(Debug, Clone)]
pub struct StrSource {
    chars: Vec<char>,
    pos: usize,
}

impl StrSource {
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    /// Total number of characters
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

impl CharSource for StrSource {
    fn at(&self, offset: usize) -> Option<char> {
        self.chars.get(offset).copied()
    }

    fn advance(&mut self, delta: usize) {
        self.pos += delta;
    }

    fn position(&self) -> usize {
        self.pos
    }
}
