//! Per-step observation surface for front-ends and round outcome.

use std::collections::BTreeSet;
use std::fmt;

use crate::instruction::Instruction;

/// Outcome of a round after a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RoundState {
    /// Both players may still act.
    #[default]
    Ongoing,
    /// The cycle limit was reached with both players alive.
    Draw,
    /// Player 2 ran out of processes.
    P1Won,
    /// Player 1 ran out of processes.
    P2Won,
}

impl RoundState {
    /// Returns `true` for every state that ends the round.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Ongoing)
    }
}

impl fmt::Display for RoundState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ongoing => write!(f, "ONGOING"),
            Self::Draw => write!(f, "DRAW"),
            Self::P1Won => write!(f, "PLAYER 1 WINS"),
            Self::P2Won => write!(f, "PLAYER 2 WINS"),
        }
    }
}

/// Why a process stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum KillCause {
    /// Executed `KIL`.
    Kil,
    /// `DIV` or `MOD` with a zero divisor field.
    DivisionByZero,
}

/// Scheduling side effect of a step, when it had one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ProcessEvent {
    /// `FRK` queued a new process at `address`.
    Forked {
        /// Start address of the child.
        address: u32,
    },
    /// `FRK` hit the process cap; only the continuation was queued.
    ForkDropped,
    /// The executing process was not re-queued.
    Killed(KillCause),
}

/// What one player's step did during the last cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct StepReport {
    /// Live processes after the step.
    pub process_count: usize,
    /// Address of the executed instruction.
    pub executed_address: Option<u32>,
    /// Executed instruction as read before execution.
    pub executed_instruction: Option<Instruction>,
    /// Every cell read while resolving operands.
    pub read_addresses: BTreeSet<u32>,
    /// Cell modified by the step.
    pub write_address: Option<u32>,
    /// Fork or kill outcome.
    pub event: Option<ProcessEvent>,
}

impl StepReport {
    /// Returns `true` when no step was recorded since the last clear.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.executed_address.is_none()
    }

    /// Forgets the recorded step while keeping the process count.
    pub fn clear(&mut self) {
        *self = Self {
            process_count: self.process_count,
            ..Self::default()
        };
    }
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (Some(address), Some(instruction)) = (self.executed_address, self.executed_instruction)
        else {
            return write!(f, "idle");
        };
        write!(f, "[{address:04}] {instruction}")?;
        match self.event {
            Some(ProcessEvent::Forked { address }) => write!(f, " ; forked -> {address:04}"),
            Some(ProcessEvent::ForkDropped) => write!(f, " ; fork dropped"),
            Some(ProcessEvent::Killed(KillCause::Kil)) => write!(f, " ; process killed (KIL)"),
            Some(ProcessEvent::Killed(KillCause::DivisionByZero)) => {
                write!(f, " ; process killed (division by zero)")
            }
            None => Ok(()),
        }
    }
}
