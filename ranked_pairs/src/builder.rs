pub use crate::config::*;

use crate::run_ranked_pairs;

/// A builder for assembling an election.
///
/// ```
/// pub use ranked_pairs::builder::Builder;
/// pub use ranked_pairs::ElectionRules;
/// # use ranked_pairs::ElectionErrors;
///
/// let mut builder = Builder::new(&ElectionRules::DEFAULT_RULES)?
///     .candidates(&["Anna".to_string(), "Bob".to_string()])?;
///
/// builder.add_ballot_simple(&["Anna".to_string(), "Bob".to_string()])?;
/// builder.add_ballot_simple(&["Bob".to_string(), "Anna".to_string()])?;
/// builder.add_ballot_simple(&["Anna".to_string(), "Bob".to_string()])?;
///
/// let result = builder.tabulate()?;
/// assert_eq!(result.winner, "Anna".to_string());
/// # Ok::<(), ElectionErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: ElectionRules,
    pub(crate) _candidates: Option<Vec<Candidate>>,
    pub(crate) _ballots: Vec<Ballot>,
}

impl Builder {
    pub fn new(rules: &ElectionRules) -> Result<Builder, ElectionErrors> {
        Ok(Builder {
            _rules: *rules,
            _candidates: None,
            _ballots: Vec::new(),
        })
    }

    /// Registers the candidates. Registration order is also the order in
    /// which unbeaten candidates are scanned for the winner.
    pub fn candidates(self, names: &[String]) -> Result<Builder, ElectionErrors> {
        Ok(Builder {
            _rules: self._rules,
            _candidates: Some(
                names
                    .iter()
                    .map(|name| Candidate { name: name.clone() })
                    .collect(),
            ),
            _ballots: Vec::new(),
        })
    }

    /// Adds one voter's ballot as an ordered list of candidate names, most
    /// preferred first.
    ///
    /// Validation happens at tabulation time, not here.
    pub fn add_ballot_simple(&mut self, choices: &[String]) -> Result<(), ElectionErrors> {
        self.add_ballot(&Ballot {
            choices: choices.to_vec(),
        })
    }

    pub fn add_ballot(&mut self, ballot: &Ballot) -> Result<(), ElectionErrors> {
        self._ballots.push(ballot.clone());
        Ok(())
    }

    /// Runs the ranked-pairs tabulation over everything added so far.
    pub fn tabulate(&self) -> Result<ElectionResult, ElectionErrors> {
        let candidates = match &self._candidates {
            Some(cands) => cands,
            None => return Err(ElectionErrors::EmptyElection),
        };
        run_ranked_pairs(&self._ballots, &self._rules, candidates)
    }
}
