//! Circular instruction memory and the address cursor that walks it.
//!
//! A [`Cursor`] is a plain index paired with the modulus of the core it was
//! created from. It carries no borrow, so process queues can hold cursors
//! while the core is mutated. Mixing cursors between cores of different
//! sizes is a caller error and is only checked in debug builds.

use std::ops::{Add, AddAssign, Index, IndexMut};

use thiserror::Error;

use crate::instruction::Instruction;

/// Failure to construct a [`Core`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum CoreError {
    /// The requested core holds no cells.
    #[error("core size must be greater than zero")]
    InvalidSize,
}

/// Reduces `value` into `[0, size)` with floor semantics.
///
/// `size` must be non-zero.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub const fn normalize(value: i64, size: u32) -> u32 {
    value.rem_euclid(size as i64) as u32
}

/// Shared, fixed-size, wraparound instruction arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Core {
    cells: Box<[Instruction]>,
}

impl Core {
    /// Allocates `size` default cells.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSize`] when `size` is zero.
    pub fn new(size: u32) -> Result<Self, CoreError> {
        if size == 0 {
            return Err(CoreError::InvalidSize);
        }
        Ok(Self {
            cells: vec![Instruction::default(); size as usize].into_boxed_slice(),
        })
    }

    /// Number of cells.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn size(&self) -> u32 {
        self.cells.len() as u32
    }

    /// Cursor at logical position 0.
    #[must_use]
    pub fn begin(&self) -> Cursor {
        Cursor {
            position: 0,
            size: self.size(),
        }
    }

    /// Cursor at `position`, reduced modulo the core size.
    #[must_use]
    pub fn cursor_at(&self, position: i64) -> Cursor {
        let size = self.size();
        Cursor {
            position: normalize(position, size),
            size,
        }
    }

    /// Resets every cell to the default instruction.
    pub fn clear(&mut self) {
        self.cells.fill(Instruction::default());
    }

    /// Read-only view of all cells in address order.
    #[must_use]
    pub fn cells(&self) -> &[Instruction] {
        &self.cells
    }
}

impl Index<Cursor> for Core {
    type Output = Instruction;

    fn index(&self, cursor: Cursor) -> &Self::Output {
        debug_assert_eq!(cursor.size, self.size(), "cursor bound to another core");
        &self.cells[cursor.position as usize]
    }
}

impl IndexMut<Cursor> for Core {
    fn index_mut(&mut self, cursor: Cursor) -> &mut Self::Output {
        debug_assert_eq!(cursor.size, self.size(), "cursor bound to another core");
        &mut self.cells[cursor.position as usize]
    }
}

/// Position inside a [`Core`] with modulo arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor {
    position: u32,
    size: u32,
}

impl Cursor {
    /// Logical position in `[0, size)`.
    #[must_use]
    pub const fn position(self) -> u32 {
        self.position
    }

    /// Size of the core this cursor belongs to.
    #[must_use]
    pub const fn core_size(self) -> u32 {
        self.size
    }

    /// Cursor one cell further, wrapping at the end.
    #[must_use]
    pub const fn successor(self) -> Self {
        let next = if self.position + 1 == self.size {
            0
        } else {
            self.position + 1
        };
        Self {
            position: next,
            size: self.size,
        }
    }

    /// Pre-increment: advances in place and returns the new cursor.
    pub const fn increment(&mut self) -> Self {
        *self = self.successor();
        *self
    }

    /// Post-increment: advances in place and returns the previous cursor.
    pub const fn post_increment(&mut self) -> Self {
        let previous = *self;
        *self = self.successor();
        previous
    }
}

impl Add<i64> for Cursor {
    type Output = Self;

    #[allow(clippy::cast_possible_truncation)]
    fn add(self, offset: i64) -> Self::Output {
        let step = u64::from(normalize(offset, self.size));
        Self {
            position: ((u64::from(self.position) + step) % u64::from(self.size)) as u32,
            size: self.size,
        }
    }
}

impl Add<u32> for Cursor {
    type Output = Self;

    fn add(self, offset: u32) -> Self::Output {
        self + i64::from(offset)
    }
}

impl AddAssign<i64> for Cursor {
    fn add_assign(&mut self, offset: i64) {
        *self = *self + offset;
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize, Core, CoreError};
    use crate::instruction::{Instruction, OpCode};

    #[test]
    fn zero_sized_core_is_rejected() {
        assert_eq!(Core::new(0), Err(CoreError::InvalidSize));
    }

    #[test]
    fn new_core_is_all_default_cells() {
        let core = Core::new(16).expect("non-zero size");
        assert_eq!(core.size(), 16);
        assert!(core.cells().iter().all(|c| *c == Instruction::default()));
        assert_eq!(core.begin().position(), 0);
    }

    #[test]
    fn negative_offsets_wrap_to_the_tail() {
        let core = Core::new(10).expect("non-zero size");
        let mut cursor = core.begin();
        cursor += -1;
        assert_eq!(cursor.position(), 9);
        cursor += -25;
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn offsets_larger_than_a_lap_wrap() {
        let core = Core::new(10).expect("non-zero size");
        assert_eq!((core.begin() + 37_i64).position(), 7);
        assert_eq!((core.begin() + 10_u32).position(), 0);
    }

    #[test]
    fn extreme_offsets_do_not_overflow() {
        let core = Core::new(10).expect("non-zero size");
        let mut cursor = core.cursor_at(3);
        cursor += i64::MAX;
        assert_eq!(cursor.position(), 0);
        cursor += i64::MIN;
        assert_eq!(cursor.position(), 2);

        let odd = Core::new(7).expect("non-zero size");
        assert_eq!((odd.cursor_at(6) + i64::MAX).position(), 6);
    }

    #[test]
    fn increments_wrap_at_the_boundary() {
        let core = Core::new(3).expect("non-zero size");
        let mut cursor = core.cursor_at(2);
        assert_eq!(cursor.post_increment().position(), 2);
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.increment().position(), 1);
    }

    #[test]
    fn indexing_reads_and_writes_through_the_cursor() {
        let mut core = Core::new(5).expect("non-zero size");
        let cursor = core.cursor_at(-1);
        core[cursor].op = OpCode::Nop;
        assert_eq!(core.cells()[4].op, OpCode::Nop);
        core.clear();
        assert_eq!(core[cursor].op, OpCode::Kil);
    }

    #[test]
    fn normalize_uses_floor_semantics() {
        assert_eq!(normalize(-1, 8000), 7999);
        assert_eq!(normalize(-8000, 8000), 0);
        assert_eq!(normalize(16_001, 8000), 1);
    }
}
