//! Position-tracked code-point reader with bounded pushback.

use std::iter::{Fuse, Peekable};

use crate::token::Position;

/// Depth of the pushback ring buffer.
pub const LOOKAHEAD: usize = 4;

/// Reads code points from any `char` source, normalizing line endings and
/// tracking the position of every code point it hands out.
///
/// Form feeds, lone carriage returns and CRLF pairs all come out as a single
/// `'\n'`. The last [`LOOKAHEAD`] code points are kept in a ring buffer so
/// they can be pushed back and read again; end of input is stored there too,
/// as `None`.
pub struct Reader<I: Iterator<Item = char>> {
    input: Peekable<Fuse<I>>,
    buf: [Option<char>; LOOKAHEAD],
    positions: [Position; LOOKAHEAD],
    /// Slot of the most recently returned code point.
    head: usize,
    /// Code points pushed back and not yet re-read.
    pending: usize,
    /// Slots holding real history, capped at `LOOKAHEAD`.
    filled: usize,
}

impl<I: Iterator<Item = char>> Reader<I> {
    pub fn new<S>(source: S) -> Self
    where
        S: IntoIterator<IntoIter = I>,
    {
        Self {
            input: source.into_iter().fuse().peekable(),
            buf: [None; LOOKAHEAD],
            positions: [Position::default(); LOOKAHEAD],
            head: 0,
            pending: 0,
            filled: 0,
        }
    }

    /// Consume the next code point, or `None` at end of input.
    pub fn read(&mut self) -> Option<char> {
        if self.pending > 0 {
            self.head = (self.head + 1) % LOOKAHEAD;
            self.pending -= 1;
            return self.buf[self.head];
        }

        let ch = match self.input.next() {
            Some(ch) => Some(self.normalize(ch)),
            None => None,
        };

        let mut position = self.positions[self.head];
        match ch {
            Some('\n') => {
                position.line += 1;
                position.column = 0;
            }
            Some(_) => position.column += 1,
            None => {}
        }

        self.head = (self.head + 1) % LOOKAHEAD;
        self.buf[self.head] = ch;
        self.positions[self.head] = position;
        self.filled = (self.filled + 1).min(LOOKAHEAD);
        ch
    }

    /// Push the last `n` consumed code points back so they are read again.
    ///
    /// # Panics
    ///
    /// Panics if more than [`LOOKAHEAD`] code points would be pending, or if
    /// fewer than `n` code points have been consumed.
    pub fn pushback(&mut self, n: usize) {
        assert!(
            self.pending + n <= self.filled,
            "pushback({n}) exceeds lookahead: {} pending, {} buffered, depth {LOOKAHEAD}",
            self.pending,
            self.filled,
        );
        self.head = (self.head + LOOKAHEAD - n) % LOOKAHEAD;
        self.pending += n;
    }

    /// Position of the most recently consumed code point.
    pub fn position(&self) -> Position {
        self.positions[self.head]
    }

    fn normalize(&mut self, ch: char) -> char {
        match ch {
            '\u{000C}' => '\n',
            '\r' => {
                let _ = self.input.next_if_eq(&'\n');
                '\n'
            }
            ch => ch,
        }
    }
}
