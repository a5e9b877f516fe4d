//! Grid placement cursor for the generated view bodies.
//!
//! Frames stack vertically on the view; controls stack vertically inside
//! each frame. The cursor is the only coordinate state during emission, so
//! resetting it between frames keeps every method self-contained.

/// Tracks the current frame slot and the row inside the open frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cursor {
    frame: usize,
    row: usize,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the next frame: returns its grid row on the view and resets the
    /// inner row.
    pub fn next_frame(&mut self) -> usize {
        let slot = self.frame;
        self.frame += 1;
        self.row = 0;
        slot
    }

    /// Claim the current inner row and advance.
    pub fn place(&mut self) -> usize {
        let row = self.row;
        self.row += 1;
        row
    }

    /// Reserve extra rows under a tall control.
    pub fn skip(&mut self, rows: usize) {
        self.row += rows;
    }

    /// Rows claimed so far inside the open frame.
    pub fn rows_used(&self) -> usize {
        self.row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_advance_and_reset_rows() {
        let mut c = Cursor::new();
        assert_eq!(c.next_frame(), 0);
        assert_eq!(c.place(), 0);
        assert_eq!(c.place(), 1);
        c.skip(2);
        assert_eq!(c.place(), 4);
        assert_eq!(c.rows_used(), 5);

        assert_eq!(c.next_frame(), 1);
        assert_eq!(c.place(), 0, "inner rows reset per frame");
    }
}
