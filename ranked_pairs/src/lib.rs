mod config;
pub mod builder;
pub mod manual;

use log::{debug, info};

use std::collections::{HashMap, HashSet};

pub use crate::config::*;

// **** Private structures ****

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct CandidateId(usize);

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash)]
struct VoteCount(u64);

impl VoteCount {
    const EMPTY: VoteCount = VoteCount(0);
}

impl std::ops::AddAssign for VoteCount {
    fn add_assign(&mut self, rhs: VoteCount) {
        self.0 += rhs.0;
    }
}

// The directed outcome of one unordered pair of candidates. A Pair exists
// only when the winner side has strictly more supporting voters.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
struct Pair {
    winner: CandidateId,
    loser: CandidateId,
}

// Dense matrix of pairwise preference counts.
//
// counts[i * n + j] is the number of voters preferring candidate i over
// candidate j strictly. The diagonal is never read or written.
struct PreferenceMatrix {
    n: usize,
    counts: Vec<VoteCount>,
}

impl PreferenceMatrix {
    fn new(n: usize) -> PreferenceMatrix {
        PreferenceMatrix {
            n,
            counts: vec![VoteCount::EMPTY; n * n],
        }
    }

    /// Records one validated ballot, given as a permutation of the candidate
    /// ids in preference order. Every candidate earns one preference over
    /// every candidate ranked below it.
    fn record(&mut self, ranks: &[CandidateId]) {
        for p in 0..ranks.len() {
            for q in (p + 1)..ranks.len() {
                self.counts[ranks[p].0 * self.n + ranks[q].0] += VoteCount(1);
            }
        }
    }

    fn support(&self, over: CandidateId, under: CandidateId) -> VoteCount {
        self.counts[over.0 * self.n + under.0]
    }
}

// Directed graph of locked pairs over the candidate indices.
//
// Edges are only ever added; the locker never unsets a pair once kept.
struct LockedGraph {
    n: usize,
    edges: Vec<bool>,
}

impl LockedGraph {
    fn new(n: usize) -> LockedGraph {
        LockedGraph {
            n,
            edges: vec![false; n * n],
        }
    }

    fn lock(&mut self, pair: Pair) {
        self.edges[pair.winner.0 * self.n + pair.loser.0] = true;
    }

    fn is_locked(&self, winner: CandidateId, loser: CandidateId) -> bool {
        self.edges[winner.0 * self.n + loser.0]
    }

    /// Whether a path of locked edges leads from `from` to `to`.
    ///
    /// Explicit worklist traversal; every candidate is visited at most once,
    /// so the probe is bounded by the number of locked edges.
    fn reaches(&self, from: CandidateId, to: CandidateId) -> bool {
        if from == to {
            return true;
        }
        let mut visited = vec![false; self.n];
        let mut worklist = vec![from];
        while let Some(cur) = worklist.pop() {
            if visited[cur.0] {
                continue;
            }
            visited[cur.0] = true;
            for next in 0..self.n {
                if self.is_locked(cur, CandidateId(next)) {
                    if next == to.0 {
                        return true;
                    }
                    if !visited[next] {
                        worklist.push(CandidateId(next));
                    }
                }
            }
        }
        false
    }

    /// Whether any locked pair points into `candidate`.
    fn has_incoming(&self, candidate: CandidateId) -> bool {
        (0..self.n).any(|i| self.is_locked(CandidateId(i), candidate))
    }
}

// Validates the registration and resolves every ballot into a permutation of
// candidate ids, indexed in registration order.
//
// The candidate cap is checked here, before any quadratic storage exists.
fn checks(
    ballots: &[Ballot],
    candidates: &[Candidate],
    rules: &ElectionRules,
) -> Result<Vec<Vec<CandidateId>>, ElectionErrors> {
    if candidates.is_empty() {
        return Err(ElectionErrors::EmptyElection);
    }
    if candidates.len() > rules.max_candidates {
        return Err(ElectionErrors::CandidateOverflow {
            count: candidates.len(),
            max: rules.max_candidates,
        });
    }

    let ids: HashMap<&str, CandidateId> = candidates
        .iter()
        .enumerate()
        .map(|(idx, c)| (c.name.as_str(), CandidateId(idx)))
        .collect();

    let mut ranked: Vec<Vec<CandidateId>> = Vec::with_capacity(ballots.len());
    for ballot in ballots.iter() {
        if ballot.choices.len() != candidates.len() {
            return Err(ElectionErrors::InvalidBallot(BallotFault::WrongLength {
                expected: candidates.len(),
                actual: ballot.choices.len(),
            }));
        }
        let mut seen: HashSet<CandidateId> = HashSet::new();
        let mut ranks: Vec<CandidateId> = Vec::with_capacity(ballot.choices.len());
        for name in ballot.choices.iter() {
            let cid = match ids.get(name.as_str()) {
                Some(cid) => *cid,
                None => {
                    return Err(ElectionErrors::InvalidBallot(
                        BallotFault::UnknownCandidate { name: name.clone() },
                    ));
                }
            };
            if !seen.insert(cid) {
                return Err(ElectionErrors::InvalidBallot(
                    BallotFault::DuplicateCandidate { name: name.clone() },
                ));
            }
            ranks.push(cid);
        }
        ranked.push(ranks);
    }
    debug!(
        "checks: {:?} ballots resolved for {:?} candidates",
        ranked.len(),
        candidates.len()
    );
    Ok(ranked)
}

// Derives the directed outcome of every unordered pair. Exactly tied pairs
// produce nothing: neither direction may ever be locked.
fn extract_pairs(prefs: &PreferenceMatrix) -> Vec<Pair> {
    let mut pairs: Vec<Pair> = Vec::new();
    for i in 0..prefs.n {
        for j in (i + 1)..prefs.n {
            let ci = CandidateId(i);
            let cj = CandidateId(j);
            if prefs.support(ci, cj) > prefs.support(cj, ci) {
                pairs.push(Pair {
                    winner: ci,
                    loser: cj,
                });
            } else if prefs.support(cj, ci) > prefs.support(ci, cj) {
                pairs.push(Pair {
                    winner: cj,
                    loser: ci,
                });
            }
        }
    }
    pairs
}

// Sorts pairs by decreasing strength of victory (the winner's supporting
// count). The sort is stable, so equal-strength pairs keep their extraction
// order and the whole tabulation stays deterministic.
fn sort_pairs(pairs: &mut [Pair], prefs: &PreferenceMatrix) {
    pairs.sort_by_key(|p| std::cmp::Reverse(prefs.support(p.winner, p.loser)));
}

// Offers every pair to the graph in sorted order. A pair is kept unless a
// path of previously locked edges already leads from its loser back to its
// winner, in which case the new edge would close a cycle.
//
// Returns, for each pair, whether it was kept.
fn lock_pairs(pairs: &[Pair], graph: &mut LockedGraph) -> Vec<bool> {
    let mut kept: Vec<bool> = Vec::with_capacity(pairs.len());
    for pair in pairs.iter() {
        let cycles = graph.reaches(pair.loser, pair.winner);
        if cycles {
            debug!(
                "lock_pairs: rejecting {:?} -> {:?}, would close a cycle",
                pair.winner, pair.loser
            );
        } else {
            graph.lock(*pair);
        }
        kept.push(!cycles);
    }
    kept
}

// The winner is the first candidate, in registration order, with no incoming
// locked pair.
fn find_winner(graph: &LockedGraph) -> Option<CandidateId> {
    (0..graph.n).map(CandidateId).find(|c| !graph.has_incoming(*c))
}

/// Runs a ranked-pairs (Tideman) tabulation on the given ballots.
///
/// Arguments:
/// * `ballots` the ballots to process, one per voter
/// * `rules` the rules that govern this election
/// * `candidates` the registered candidates, in registration order
///
/// Every ballot must rank every registered candidate exactly once; anything
/// else aborts the tabulation with [ElectionErrors::InvalidBallot].
pub fn run_ranked_pairs(
    ballots: &[Ballot],
    rules: &ElectionRules,
    candidates: &[Candidate],
) -> Result<ElectionResult, ElectionErrors> {
    info!(
        "Processing {:?} ballots, candidates: {:?}, rules: {:?}",
        ballots.len(),
        candidates,
        rules
    );

    let ranked = checks(ballots, candidates, rules)?;
    for (idx, c) in candidates.iter().enumerate() {
        info!("Candidate: {}: {}", idx, c.name);
    }

    let mut prefs = PreferenceMatrix::new(candidates.len());
    for ranks in ranked.iter() {
        prefs.record(ranks);
    }

    let mut pairs = extract_pairs(&prefs);
    sort_pairs(&mut pairs, &prefs);
    debug!("run_ranked_pairs: {:?} pairs after extraction", pairs.len());

    let mut graph = LockedGraph::new(candidates.len());
    let kept = lock_pairs(&pairs, &mut graph);

    let winner = find_winner(&graph).ok_or(ElectionErrors::NoSourceFound)?;
    info!("run_ranked_pairs: winner: {}", candidates[winner.0].name);

    let pair_tallies: Vec<PairTally> = pairs
        .iter()
        .zip(kept.iter())
        .map(|(p, locked)| PairTally {
            winner: candidates[p.winner.0].name.clone(),
            loser: candidates[p.loser.0].name.clone(),
            support: prefs.support(p.winner, p.loser).0,
            opposition: prefs.support(p.loser, p.winner).0,
            locked: *locked,
        })
        .collect();

    Ok(ElectionResult {
        winner: candidates[winner.0].name.clone(),
        pair_tallies,
    })
}
