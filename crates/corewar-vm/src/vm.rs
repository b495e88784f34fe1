//! Two-player virtual machine: program loading, cycle scheduling, and round
//! outcome.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use thiserror::Error;

use crate::codec::{read_program, RECORD_BYTES};
use crate::config::VmConfig;
use crate::core::{normalize, Core, CoreError};
use crate::execute::step_process;
use crate::instruction::Instruction;
use crate::process::{Player, ProcessQueue};
use crate::report::{RoundState, StepReport};

/// Failure to place a program in the core.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The program does not fit in the core.
    #[error("program has {len} instructions but the core holds only {core_size}")]
    TooManyInstructions {
        /// Number of instructions supplied.
        len: usize,
        /// Core capacity.
        core_size: u32,
    },
    /// The player slot already holds a program.
    #[error("{0} already has a program loaded")]
    AlreadyLoaded(Player),
    /// The program binary could not be read.
    #[error("failed to read program binary: {0}")]
    Io(#[from] io::Error),
}

/// Deterministic single-threaded Core War machine.
#[derive(Debug, Clone)]
pub struct VirtualMachine {
    config: VmConfig,
    core: Core,
    queues: [ProcessQueue; 2],
    loaded: [bool; 2],
    current_cycle: u32,
    state: RoundState,
    reports: [StepReport; 2],
}

impl VirtualMachine {
    /// Creates a machine with an all-default core.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSize`] when `config.core_size` is zero.
    pub fn new(config: VmConfig) -> Result<Self, CoreError> {
        Ok(Self {
            config,
            core: Core::new(config.core_size)?,
            queues: [ProcessQueue::new(), ProcessQueue::new()],
            loaded: [false; 2],
            current_cycle: 0,
            state: RoundState::Ongoing,
            reports: [StepReport::default(), StepReport::default()],
        })
    }

    /// Copies `instructions` into the core at `offset` and starts one process
    /// there for `player`.
    ///
    /// `offset` is reduced modulo the core size and the copy wraps at the end
    /// of the core. Field values are re-normalized into the core size.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::AlreadyLoaded`] when the slot is taken and
    /// [`LoadError::TooManyInstructions`] when the program exceeds the core.
    pub fn load_program(
        &mut self,
        instructions: &[Instruction],
        offset: u32,
        player: Player,
    ) -> Result<(), LoadError> {
        if self.loaded[player.index()] {
            return Err(LoadError::AlreadyLoaded(player));
        }
        let core_size = self.core.size();
        if instructions.len() > core_size as usize {
            return Err(LoadError::TooManyInstructions {
                len: instructions.len(),
                core_size,
            });
        }

        let start = self.core.cursor_at(i64::from(offset));
        let mut cursor = start;
        for instruction in instructions {
            let mut cell = *instruction;
            cell.a_val = normalize(i64::from(cell.a_val), core_size);
            cell.b_val = normalize(i64::from(cell.b_val), core_size);
            self.core[cursor.post_increment()] = cell;
        }

        let queue = &mut self.queues[player.index()];
        queue.clear();
        queue.push(start);
        self.loaded[player.index()] = true;
        self.reports[player.index()].process_count = queue.len();

        tracing::debug!(
            %player,
            offset = start.position(),
            len = instructions.len(),
            "program loaded"
        );
        Ok(())
    }

    /// Reads a binary program from `path` and loads it like
    /// [`load_program`](Self::load_program).
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] when the file cannot be read, otherwise the
    /// same errors as [`load_program`](Self::load_program).
    pub fn load_program_file(
        &mut self,
        path: impl AsRef<Path>,
        offset: u32,
        player: Player,
    ) -> Result<(), LoadError> {
        if self.loaded[player.index()] {
            return Err(LoadError::AlreadyLoaded(player));
        }
        // one record past capacity is enough to detect an oversized binary
        let limit = (u64::from(self.core.size()) + 1) * RECORD_BYTES as u64;
        let mut reader = BufReader::new(File::open(path.as_ref())?).take(limit);
        let instructions = read_program(&mut reader)?;
        self.load_program(&instructions, offset, player)
    }

    /// Runs one scheduling step for each player, player 1 first.
    ///
    /// Does nothing once the round is over. Reaching the cycle limit with
    /// both players alive is a draw, even when the limit is zero. A player
    /// whose queue empties during its own turn loses immediately and the
    /// opponent does not act in that cycle. A player with no process at the
    /// start of its turn is skipped.
    pub fn execute_cycle(&mut self) -> RoundState {
        if self.state.is_terminal() {
            return self.state;
        }
        if self.current_cycle >= self.config.max_cycles {
            self.declare_draw();
            return self.state;
        }
        self.clear_reports();
        self.current_cycle += 1;

        for player in Player::ALL {
            let slot = player.index();
            if self.queues[slot].is_empty() {
                continue;
            }
            step_process(
                &mut self.core,
                &mut self.queues[slot],
                self.config.max_processes,
                &mut self.reports[slot],
            );
            if self.queues[slot].is_empty() {
                self.state = match player.opponent() {
                    Player::One => RoundState::P1Won,
                    Player::Two => RoundState::P2Won,
                };
                tracing::info!(cycle = self.current_cycle, outcome = %self.state, "round over");
                return self.state;
            }
        }

        if self.current_cycle >= self.config.max_cycles {
            self.declare_draw();
        }
        self.state
    }

    /// Executes cycles until the round ends.
    pub fn run(&mut self) -> RoundState {
        while !self.state.is_terminal() {
            self.execute_cycle();
        }
        self.state
    }

    fn declare_draw(&mut self) {
        self.state = RoundState::Draw;
        tracing::info!(cycle = self.current_cycle, outcome = %self.state, "round over");
    }

    /// Restores the freshly constructed state.
    pub fn reset(&mut self) {
        self.core.clear();
        for queue in &mut self.queues {
            queue.clear();
        }
        self.loaded = [false; 2];
        self.current_cycle = 0;
        self.state = RoundState::Ongoing;
        self.reports = [StepReport::default(), StepReport::default()];
        tracing::debug!("virtual machine reset");
    }

    /// Forgets both players' step reports.
    pub fn clear_reports(&mut self) {
        for report in &mut self.reports {
            report.clear();
        }
    }

    /// Report of `player`'s step in the last cycle.
    #[must_use]
    pub const fn report(&self, player: Player) -> &StepReport {
        &self.reports[player.index()]
    }

    /// Current round outcome.
    #[must_use]
    pub const fn round_state(&self) -> RoundState {
        self.state
    }

    /// Number of cycles executed since construction or reset.
    #[must_use]
    pub const fn current_cycle(&self) -> u32 {
        self.current_cycle
    }

    /// Returns `true` when `player` has a program loaded.
    #[must_use]
    pub const fn is_loaded(&self, player: Player) -> bool {
        self.loaded[player.index()]
    }

    /// Live processes of `player`.
    #[must_use]
    pub fn process_count(&self, player: Player) -> usize {
        self.queues[player.index()].len()
    }

    /// Process queue of `player` in execution order.
    #[must_use]
    pub const fn queue(&self, player: Player) -> &ProcessQueue {
        &self.queues[player.index()]
    }

    /// Shared core memory.
    #[must_use]
    pub const fn core(&self) -> &Core {
        &self.core
    }

    /// Number of core cells.
    #[must_use]
    pub fn core_size(&self) -> u32 {
        self.core.size()
    }

    /// Configuration this machine was built with.
    #[must_use]
    pub const fn config(&self) -> &VmConfig {
        &self.config
    }
}
