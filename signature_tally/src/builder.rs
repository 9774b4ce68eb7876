pub use crate::config::*;

use std::collections::HashMap;

/// A builder for collecting signatures one at a time.
///
/// The race configurations are assigned lazily from the policy when the tally
/// runs, so races only need to appear in the signatures themselves.
///
/// ```
/// pub use signature_tally::builder::Builder;
/// pub use signature_tally::RacePolicy;
/// # use signature_tally::TallyErrors;
///
/// let mut builder = Builder::new(&RacePolicy::default_policy());
///
/// builder.add_signature("v001", "Governor", "Anna");
/// builder.add_signature("v002", "Governor", "Anna");
///
/// let result = builder.tally()?;
/// assert_eq!(result.race("Governor").unwrap().legitimate_total, 2);
///
/// # Ok::<(), TallyErrors>(())
/// ```
pub struct Builder {
    pub(crate) _policy: RacePolicy,
    pub(crate) _records: Vec<SignatureRecord>,
}

impl Builder {
    pub fn new(policy: &RacePolicy) -> Builder {
        Builder {
            _policy: policy.clone(),
            _records: Vec::new(),
        }
    }

    /// Adds a signature from a voter for a candidate in a race.
    ///
    /// The voter id is taken verbatim; apply any case normalization before
    /// calling this.
    pub fn add_signature(&mut self, voter_id: &str, race: &str, candidate: &str) {
        self.add_record(&SignatureRecord::new(voter_id, race, candidate));
    }

    pub fn add_record(&mut self, record: &SignatureRecord) {
        self._records.push(record.clone());
    }

    /// Runs the tabulation over all the signatures added so far.
    pub fn tally(&self) -> Result<TallyResult, TallyErrors> {
        let races: Vec<String> = {
            let mut rs: Vec<String> = self._records.iter().map(|r| r.race.clone()).collect();
            rs.sort();
            rs.dedup();
            rs
        };
        let configs: HashMap<String, RaceConfig> = self._policy.assign(races.iter());
        crate::run_signature_stats(&self._records, &configs)
    }
}
