// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// A registered candidate.
///
/// The position of a candidate in the registration list is its stable index
/// for the whole tabulation.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Candidate {
    pub name: String,
}

/// One voter's ballot: the candidate names in order of preference, most
/// preferred first.
///
/// A valid ballot names every registered candidate exactly once. Incomplete
/// or weighted ballots are not accepted by this system.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Ballot {
    pub choices: Vec<String>,
}

// ******** Output data structures *********

/// The directed outcome of one unordered pair of candidates.
///
/// `support` is the number of voters preferring `winner` over `loser`,
/// `opposition` the number preferring `loser` over `winner`. A tally is only
/// produced when `support > opposition` strictly; exactly tied pairs produce
/// none.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PairTally {
    pub winner: String,
    pub loser: String,
    pub support: u64,
    pub opposition: u64,
    /// Whether the pair was kept in the locked graph. A pair is discarded
    /// only when locking it would have closed a cycle.
    pub locked: bool,
}

/// The outcome of a ranked-pairs tabulation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectionResult {
    /// The candidate beaten by nobody in the locked graph.
    pub winner: String,
    /// All pair tallies, in the order they were offered to the locker
    /// (decreasing strength of victory).
    pub pair_tallies: Vec<PairTally>,
}

/// The ways a single ballot can fail validation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum BallotFault {
    /// A choice does not match any registered candidate.
    UnknownCandidate { name: String },
    /// A candidate appears more than once on the ballot.
    DuplicateCandidate { name: String },
    /// The ballot does not rank every candidate.
    WrongLength { expected: usize, actual: usize },
}

/// Errors that prevent the tabulation from completing successfully.
///
/// These are all terminal for the current election: nothing is retried and
/// no partial ballot is ever tallied.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ElectionErrors {
    /// No candidate was registered.
    EmptyElection,
    /// More candidates than the configured maximum. Raised before any tally
    /// storage is allocated.
    CandidateOverflow { count: usize, max: usize },
    /// A ballot is not a permutation of the registered candidates.
    InvalidBallot(BallotFault),
    /// No candidate is free of incoming locked edges. The locked graph is
    /// acyclic by construction, so this indicates an internal inconsistency
    /// rather than a property of the votes.
    NoSourceFound,
}

impl Error for ElectionErrors {}

impl Display for ElectionErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElectionErrors::EmptyElection => write!(f, "no candidates in the election"),
            ElectionErrors::CandidateOverflow { count, max } => {
                write!(f, "{} candidates exceed the maximum of {}", count, max)
            }
            ElectionErrors::InvalidBallot(BallotFault::UnknownCandidate { name }) => {
                write!(f, "invalid ballot: unknown candidate {:?}", name)
            }
            ElectionErrors::InvalidBallot(BallotFault::DuplicateCandidate { name }) => {
                write!(f, "invalid ballot: candidate {:?} ranked twice", name)
            }
            ElectionErrors::InvalidBallot(BallotFault::WrongLength { expected, actual }) => {
                write!(
                    f,
                    "invalid ballot: {} choices instead of {}",
                    actual, expected
                )
            }
            ElectionErrors::NoSourceFound => {
                write!(f, "no candidate without incoming locked pairs")
            }
        }
    }
}

// ********* Configuration **********

/// The configuration options of a tabulation.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct ElectionRules {
    /// Hard cap on the number of candidates. The tally and the locked graph
    /// are quadratic in the candidate count and the cycle probe is quadratic
    /// in the number of pairs, so the cap is kept small.
    pub max_candidates: usize,
}

impl ElectionRules {
    pub const DEFAULT_RULES: ElectionRules = ElectionRules { max_candidates: 9 };
}
