use serde::Serialize;
use std::fmt;

/// Number of arms in the static arm table.
pub const MAX_ARMS: usize = 26;

/// A planner strategy that an arm can switch on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    NestedLoop,
    HashJoin,
    MergeJoin,
    SeqScan,
    IndexScan,
    IndexOnlyScan,
}

impl Strategy {
    /// All strategies, in the order hints are emitted.
    pub const ALL: [Self; 6] = [
        Self::NestedLoop,
        Self::HashJoin,
        Self::MergeJoin,
        Self::SeqScan,
        Self::IndexScan,
        Self::IndexOnlyScan,
    ];

    /// Name of the host configuration variable controlling this strategy.
    pub const fn setting_name(self) -> &'static str {
        match self {
            Self::NestedLoop => "enable_nestloop",
            Self::HashJoin => "enable_hashjoin",
            Self::MergeJoin => "enable_mergejoin",
            Self::SeqScan => "enable_seqscan",
            Self::IndexScan => "enable_indexscan",
            Self::IndexOnlyScan => "enable_indexonlyscan",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.setting_name())
    }
}

/// The six strategy flags handed to the planner for one planning call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct StrategyConfig {
    pub hash_join: bool,
    pub merge_join: bool,
    pub nested_loop: bool,
    pub index_scan: bool,
    pub seq_scan: bool,
    pub index_only_scan: bool,
}

impl StrategyConfig {
    /// Every strategy enabled; the host's default.
    pub const ALL_ENABLED: Self = Self {
        hash_join: true,
        merge_join: true,
        nested_loop: true,
        index_scan: true,
        seq_scan: true,
        index_only_scan: true,
    };

    pub const NONE_ENABLED: Self = Self {
        hash_join: false,
        merge_join: false,
        nested_loop: false,
        index_scan: false,
        seq_scan: false,
        index_only_scan: false,
    };

    pub const fn is_enabled(&self, strategy: Strategy) -> bool {
        match strategy {
            Strategy::NestedLoop => self.nested_loop,
            Strategy::HashJoin => self.hash_join,
            Strategy::MergeJoin => self.merge_join,
            Strategy::SeqScan => self.seq_scan,
            Strategy::IndexScan => self.index_scan,
            Strategy::IndexOnlyScan => self.index_only_scan,
        }
    }

    #[must_use]
    pub const fn with(mut self, strategy: Strategy, enabled: bool) -> Self {
        match strategy {
            Strategy::NestedLoop => self.nested_loop = enabled,
            Strategy::HashJoin => self.hash_join = enabled,
            Strategy::MergeJoin => self.merge_join = enabled,
            Strategy::SeqScan => self.seq_scan = enabled,
            Strategy::IndexScan => self.index_scan = enabled,
            Strategy::IndexOnlyScan => self.index_only_scan = enabled,
        }
        self
    }

    /// Strategies this configuration leaves switched off, in hint order.
    pub fn disabled(&self) -> impl Iterator<Item = Strategy> + '_ {
        Strategy::ALL
            .into_iter()
            .filter(move |strategy| !self.is_enabled(*strategy))
    }

    pub fn is_subset_of(&self, other: &Self) -> bool {
        Strategy::ALL
            .into_iter()
            .all(|strategy| !self.is_enabled(strategy) || other.is_enabled(strategy))
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self::ALL_ENABLED
    }
}

const fn arm(enabled: &[Strategy]) -> StrategyConfig {
    let mut config = StrategyConfig::NONE_ENABLED;
    let mut i = 0;
    while i < enabled.len() {
        config = config.with(enabled[i], true);
        i += 1;
    }
    config
}

const HJ: Strategy = Strategy::HashJoin;
const MJ: Strategy = Strategy::MergeJoin;
const NL: Strategy = Strategy::NestedLoop;
const IS: Strategy = Strategy::IndexScan;
const SS: Strategy = Strategy::SeqScan;
const IO: Strategy = Strategy::IndexOnlyScan;

/// The arm table. Arm 0 enables everything and serves as the baseline.
static ARM_TABLE: [StrategyConfig; MAX_ARMS] = [
    arm(&[HJ, IS, MJ, NL, SS, IO]),
    arm(&[HJ, IO, IS, MJ, SS]),
    arm(&[HJ, IO, NL, SS]),
    arm(&[HJ, IO, SS]),
    arm(&[HJ, IO, IS, NL, SS]),
    arm(&[HJ, IO, MJ, NL]),
    arm(&[HJ, IS, MJ, NL]),
    arm(&[IO, MJ, NL]),
    arm(&[HJ, IO]),
    arm(&[HJ, IO, IS, NL]),
    arm(&[HJ, IO, IS, SS]),
    arm(&[HJ, IO, MJ, NL, SS]),
    arm(&[HJ, IO, MJ, SS]),
    arm(&[HJ, IS, NL]),
    arm(&[IS, NL]),
    arm(&[IS, MJ, NL, SS]),
    arm(&[IO, IS, NL]),
    arm(&[HJ, IO, IS, MJ, NL]),
    arm(&[IS, MJ, NL]),
    arm(&[IO, MJ, NL, SS]),
    arm(&[IO, IS, NL, SS]),
    arm(&[HJ, IO, IS, MJ]),
    arm(&[HJ, IO, MJ]),
    arm(&[HJ, IS, NL, SS]),
    arm(&[HJ, IS]),
    arm(&[HJ, IO, NL]),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArmError {
    /// Arm index outside the arm table
    OutOfRange { index: u64, limit: usize },
}

impl fmt::Display for ArmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { index, limit } => {
                write!(f, "Arm index {index} is outside the arm table (size {limit})")
            }
        }
    }
}

impl std::error::Error for ArmError {}

/// An index into the arm table. Construction checks the range, so every
/// `Arm` value maps to a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Arm(u8);

impl Arm {
    pub const BASELINE: Self = Self(0);

    pub fn new(index: usize) -> Result<Self, ArmError> {
        if index < MAX_ARMS {
            // MAX_ARMS fits in a u8
            Ok(Self(index as u8))
        } else {
            Err(ArmError::OutOfRange {
                index: index as u64,
                limit: MAX_ARMS,
            })
        }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The first `count` arms in ascending order, capped at the table size.
    pub fn first(count: usize) -> impl Iterator<Item = Self> {
        (0..count.min(MAX_ARMS)).map(|i| Self(i as u8))
    }

    pub fn all() -> impl Iterator<Item = Self> {
        Self::first(MAX_ARMS)
    }

    pub fn configuration(self) -> StrategyConfig {
        configuration_for(self)
    }
}

impl TryFrom<u32> for Arm {
    type Error = ArmError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .map_err(|_| ArmError::OutOfRange {
                index: u64::from(value),
                limit: MAX_ARMS,
            })
            .and_then(Self::new)
    }
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Which strategy configuration a candidate is planned under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArmSelector {
    /// A fixed arm from the table.
    Arm(Arm),
    /// The caller's own, unrestricted configuration.
    Unconstrained,
}

impl ArmSelector {
    pub const fn arm(self) -> Option<Arm> {
        match self {
            Self::Arm(arm) => Some(arm),
            Self::Unconstrained => None,
        }
    }
}

impl From<Arm> for ArmSelector {
    fn from(arm: Arm) -> Self {
        Self::Arm(arm)
    }
}

impl fmt::Display for ArmSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arm(arm) => write!(f, "arm {arm}"),
            Self::Unconstrained => write!(f, "unconstrained"),
        }
    }
}

pub fn configuration_for(arm: Arm) -> StrategyConfig {
    ARM_TABLE[arm.index()]
}
