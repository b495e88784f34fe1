//! Round configuration and named rulesets.

/// Default number of core cells.
pub const DEFAULT_CORE_SIZE: u32 = 8000;

/// Default cycle limit before a round is declared a draw.
pub const DEFAULT_MAX_CYCLES: u32 = 80_000;

/// Default per-player live process cap.
pub const DEFAULT_MAX_PROCESSES: usize = 64;

/// Named parameter presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Ruleset {
    /// 8000 cells, 80 000 cycles, 64 processes.
    #[default]
    Standard,
    /// 800 cells, 20 000 cycles, 64 processes.
    Small,
}

/// Immutable parameters of a virtual machine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct VmConfig {
    /// Number of cells in the core.
    pub core_size: u32,
    /// Cycles after which a round with two survivors is a draw.
    pub max_cycles: u32,
    /// Upper bound on each player's live processes.
    pub max_processes: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self::for_ruleset(Ruleset::Standard)
    }
}

impl VmConfig {
    /// Builds the preset for `ruleset`.
    #[must_use]
    pub const fn for_ruleset(ruleset: Ruleset) -> Self {
        match ruleset {
            Ruleset::Standard => Self {
                core_size: DEFAULT_CORE_SIZE,
                max_cycles: DEFAULT_MAX_CYCLES,
                max_processes: DEFAULT_MAX_PROCESSES,
            },
            Ruleset::Small => Self {
                core_size: 800,
                max_cycles: 20_000,
                max_processes: DEFAULT_MAX_PROCESSES,
            },
        }
    }
}
