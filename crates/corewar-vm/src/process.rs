//! Players and their FIFO process queues.

use std::collections::VecDeque;
use std::fmt;

use crate::core::Cursor;

/// One of the two competing programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Player {
    /// Steps first in every cycle.
    One,
    /// Steps second in every cycle.
    Two,
}

impl Player {
    /// Both players in scheduling order.
    pub const ALL: [Self; 2] = [Self::One, Self::Two];

    /// Array slot for per-player state.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }

    /// The other player.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => write!(f, "player 1"),
            Self::Two => write!(f, "player 2"),
        }
    }
}

/// Live processes of one player in execution order.
///
/// The front process runs next; continuations and forks join at the back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessQueue {
    processes: VecDeque<Cursor>,
}

impl ProcessQueue {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            processes: VecDeque::new(),
        }
    }

    /// Appends a process at the back.
    pub fn push(&mut self, process: Cursor) {
        self.processes.push_back(process);
    }

    /// Removes the next process to run.
    pub fn pop(&mut self) -> Option<Cursor> {
        self.processes.pop_front()
    }

    /// Next process to run without removing it.
    #[must_use]
    pub fn front(&self) -> Option<Cursor> {
        self.processes.front().copied()
    }

    /// Number of live processes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    /// Returns `true` when the player has no live process.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Drops every process.
    pub fn clear(&mut self) {
        self.processes.clear();
    }

    /// Iterates processes in execution order.
    pub fn iter(&self) -> impl Iterator<Item = Cursor> + '_ {
        self.processes.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::{Player, ProcessQueue};
    use crate::core::Core;

    #[test]
    fn queue_is_first_in_first_out() {
        let core = Core::new(10).expect("non-zero size");
        let mut queue = ProcessQueue::new();
        queue.push(core.cursor_at(3));
        queue.push(core.cursor_at(7));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.front().map(|c| c.position()), Some(3));
        assert_eq!(queue.pop().map(|c| c.position()), Some(3));
        assert_eq!(queue.pop().map(|c| c.position()), Some(7));
        assert!(queue.pop().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn players_index_and_oppose_each_other() {
        assert_eq!(Player::One.index(), 0);
        assert_eq!(Player::Two.index(), 1);
        assert_eq!(Player::One.opponent(), Player::Two);
        assert_eq!(Player::Two.to_string(), "player 2");
    }
}
