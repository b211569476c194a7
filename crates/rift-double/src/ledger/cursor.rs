//! Sequence cursor for configured return values.

/// Cursor into a sequence of configured values.
///
/// Each read hands back the current position and moves forward. Once the
/// final element is reached the cursor stays there, so a `returns(5, 6)`
/// sequence reads as `5, 6, 6, ...`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceCursor {
    next: usize,
}

impl SequenceCursor {
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Current index without moving, clamped to the last element.
    #[must_use]
    pub fn peek(&self, len: usize) -> usize {
        self.next.min(len.saturating_sub(1))
    }

    /// Current index, then move forward unless the sequence is exhausted.
    pub fn advance(&mut self, len: usize) -> usize {
        let index = self.peek(len);
        if self.next < len {
            self.next += 1;
        }
        index
    }

    /// Read the next element of `values`, `None` only when `values` is empty.
    pub fn next_in<'a, T>(&mut self, values: &'a [T]) -> Option<&'a T> {
        if values.is_empty() {
            return None;
        }
        let index = self.advance(values.len());
        values.get(index)
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }
}
