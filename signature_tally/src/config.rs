// ********* Input data structures ***********

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

/// A single signature event: one voter endorsing one candidate for one race.
///
/// The order of the records in the input sequence is significant: when a voter
/// goes over the signature cap for a race, the first records seen are the ones
/// that get accepted.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct SignatureRecord {
    /// The identifier of the signing voter. Expected to be case-normalized
    /// by the caller so that the same voter does not fragment into several keys.
    pub voter_id: String,
    /// The race (position) the signature is addressed to.
    pub race: String,
    /// The endorsed candidate.
    pub candidate: String,
}

impl SignatureRecord {
    pub fn new(voter_id: &str, race: &str, candidate: &str) -> SignatureRecord {
        SignatureRecord {
            voter_id: voter_id.to_string(),
            race: race.to_string(),
            candidate: candidate.to_string(),
        }
    }
}

// ********* Configuration **********

/// The numeric rules for one race, fixed for the duration of a tally run.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct RaceConfig {
    /// How many signatures a single voter may cast in this race.
    /// Further signatures from the same voter are counted as illegitimate.
    pub max_signatures_per_voter: u32,
    /// The number of incoming signatures a candidate needs to qualify.
    pub qualification_threshold: u64,
}

/// A single race-name matching rule: any race whose name contains `marker`
/// (case-sensitive) gets `config`.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RaceRule {
    pub marker: String,
    pub config: RaceConfig,
}

/// The race classification policy: an ordered list of substring rules plus a
/// default for everything else. The first matching rule wins.
///
/// This is business policy supplied by the operator, not derived data. The
/// historical convention rules ship as [RacePolicy::default_policy].
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RacePolicy {
    pub rules: Vec<RaceRule>,
    pub default: RaceConfig,
}

impl RacePolicy {
    /// The rules used by the state party conventions: judicial races
    /// (names containing "Court") allow 7 signatures per voter, everything
    /// else a single one. 30 signatures qualify a candidate in both cases.
    pub fn default_policy() -> RacePolicy {
        RacePolicy {
            rules: vec![RaceRule {
                marker: "Court".to_string(),
                config: RaceConfig {
                    max_signatures_per_voter: 7,
                    qualification_threshold: 30,
                },
            }],
            default: RaceConfig {
                max_signatures_per_voter: 1,
                qualification_threshold: 30,
            },
        }
    }

    /// The configuration assigned to one race name.
    pub fn config_for(&self, race: &str) -> RaceConfig {
        for rule in self.rules.iter() {
            if race.contains(rule.marker.as_str()) {
                return rule.config;
            }
        }
        self.default
    }

    /// Builds the full race -> config mapping for a set of race names.
    pub fn assign<'a>(
        &self,
        races: impl IntoIterator<Item = &'a String>,
    ) -> HashMap<String, RaceConfig> {
        races
            .into_iter()
            .map(|race| (race.clone(), self.config_for(race)))
            .collect()
    }
}

// ******** Output data structures *********

/// The counters accumulated for one race over one tally run.
///
/// Invariants, maintained by the tabulator:
/// - the sums of `outgoing_count` and of `incoming_count` both equal
///   `legitimate_total`;
/// - no entry of `outgoing_count` exceeds the race's signature cap.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RaceState {
    /// Signatures accepted from each voter so far.
    pub outgoing_count: HashMap<String, u32>,
    /// Signatures accepted for each candidate.
    pub incoming_count: HashMap<String, u64>,
    pub legitimate_total: u64,
    pub illegitimate_total: u64,
}

impl RaceState {
    pub fn total_records(&self) -> u64 {
        self.legitimate_total + self.illegitimate_total
    }
}

/// The outcome of classifying one race's candidates against its threshold.
/// Both lists are sorted by count descending, ties broken by candidate name
/// ascending. Candidates without any accepted signature appear in neither.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Classified {
    pub qualified: Vec<(String, u64)>,
    pub partial: Vec<(String, u64)>,
}

/// The published results for one race.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RaceResult {
    pub race: String,
    pub legitimate_total: u64,
    pub illegitimate_total: u64,
    pub qualified: Vec<(String, u64)>,
    pub partial: Vec<(String, u64)>,
}

/// The results of a full tally run, one entry per race, sorted by race name.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TallyResult {
    pub races: Vec<RaceResult>,
}

impl TallyResult {
    pub fn race(&self, name: &str) -> Option<&RaceResult> {
        self.races.iter().find(|r| r.race == name)
    }
}

/// Errors that prevent a tally run from completing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TallyErrors {
    /// A record referenced a race with no configuration. The operator must
    /// supply a complete configuration; this is never silently defaulted.
    UnknownRace { race: String },
    /// A race was configured with a zero cap or a zero threshold.
    InvalidRaceConfig { race: String },
}

impl Error for TallyErrors {}

impl Display for TallyErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TallyErrors::UnknownRace { race } => {
                write!(f, "no configuration supplied for race {:?}", race)
            }
            TallyErrors::InvalidRaceConfig { race } => {
                write!(
                    f,
                    "configuration for race {:?} has a zero cap or threshold",
                    race
                )
            }
        }
    }
}
