mod config;
pub mod builder;
pub mod manual;

use log::{debug, info};

use std::collections::HashMap;

pub use crate::config::*;

/// Runs the signature tabulation for all the configured races.
///
/// Arguments:
/// * `records` the full ordered sequence of signature records. The order is
///   significant: it decides which signatures of an over-cap voter get accepted.
/// * `configs` the configuration for every race that may appear in the records.
///
/// A record addressed to a race absent from `configs` fails the whole run with
/// [TallyErrors::UnknownRace]. An empty record sequence is not an error and
/// produces all-zero counters for every configured race.
pub fn run_signature_stats(
    records: &[SignatureRecord],
    configs: &HashMap<String, RaceConfig>,
) -> Result<TallyResult, TallyErrors> {
    info!(
        "run_signature_stats: processing {:?} records over {:?} races",
        records.len(),
        configs.len()
    );
    let states = tabulate(records, configs)?;

    let mut races: Vec<RaceResult> = Vec::new();
    for (race, state) in states.iter() {
        let cfg = configs
            .get(race)
            .ok_or_else(|| TallyErrors::UnknownRace { race: race.clone() })?;
        let classified = classify(state, cfg.qualification_threshold);
        info!(
            "run_signature_stats: race {:?}: {} legitimate, {} illegitimate, {} qualified",
            race,
            state.legitimate_total,
            state.illegitimate_total,
            classified.qualified.len()
        );
        races.push(RaceResult {
            race: race.clone(),
            legitimate_total: state.legitimate_total,
            illegitimate_total: state.illegitimate_total,
            qualified: classified.qualified,
            partial: classified.partial,
        });
    }
    // The iteration order of the state map is arbitrary. Sort for a stable output.
    races.sort_by(|r1, r2| r1.race.cmp(&r2.race));
    Ok(TallyResult { races })
}

/// Consumes the record sequence in input order and produces the per-race
/// counters, enforcing the per-voter signature cap of each race.
///
/// This is a pure function of its inputs: same records and configuration,
/// same states.
pub fn tabulate(
    records: &[SignatureRecord],
    configs: &HashMap<String, RaceConfig>,
) -> Result<HashMap<String, RaceState>, TallyErrors> {
    for (race, cfg) in configs.iter() {
        if cfg.max_signatures_per_voter == 0 || cfg.qualification_threshold == 0 {
            return Err(TallyErrors::InvalidRaceConfig { race: race.clone() });
        }
    }

    let mut states: HashMap<String, RaceState> = configs
        .keys()
        .map(|race| (race.clone(), RaceState::default()))
        .collect();

    for record in records.iter() {
        let cfg = configs
            .get(&record.race)
            .ok_or_else(|| TallyErrors::UnknownRace {
                race: record.race.clone(),
            })?;
        // The race key is present: states was seeded from the same map.
        let state = states.get_mut(&record.race).unwrap();

        let current = state
            .outgoing_count
            .get(&record.voter_id)
            .cloned()
            .unwrap_or(0);
        if current < cfg.max_signatures_per_voter {
            *state.outgoing_count.entry(record.voter_id.clone()).or_insert(0) += 1;
            *state
                .incoming_count
                .entry(record.candidate.clone())
                .or_insert(0) += 1;
            state.legitimate_total += 1;
        } else {
            debug!(
                "tabulate: race {:?}: voter {:?} is at the cap ({}), rejecting signature for {:?}",
                record.race, record.voter_id, cfg.max_signatures_per_voter, record.candidate
            );
            state.illegitimate_total += 1;
        }
    }
    Ok(states)
}

/// Partitions the candidates of one race by their accepted signature count.
///
/// Candidates at or above the threshold are qualified, candidates with at
/// least one signature below it are partial, candidates without any recorded
/// signature are omitted.
pub fn classify(state: &RaceState, threshold: u64) -> Classified {
    let mut qualified: Vec<(String, u64)> = Vec::new();
    let mut partial: Vec<(String, u64)> = Vec::new();
    for (candidate, &count) in state.incoming_count.iter() {
        if count >= threshold {
            qualified.push((candidate.clone(), count));
        } else if count > 0 {
            partial.push((candidate.clone(), count));
        }
    }
    sort_tally(&mut qualified);
    sort_tally(&mut partial);
    Classified { qualified, partial }
}

// Count descending, then name ascending for determinism.
fn sort_tally(tally: &mut [(String, u64)]) {
    tally.sort_by(|(n1, c1), (n2, c2)| c2.cmp(c1).then_with(|| n1.cmp(n2)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(recs: &[(&str, &str, &str)]) -> Vec<SignatureRecord> {
        recs.iter()
            .map(|(v, r, c)| SignatureRecord::new(v, r, c))
            .collect()
    }

    fn single_race_configs(race: &str, cap: u32, threshold: u64) -> HashMap<String, RaceConfig> {
        let mut configs = HashMap::new();
        configs.insert(
            race.to_string(),
            RaceConfig {
                max_signatures_per_voter: cap,
                qualification_threshold: threshold,
            },
        );
        configs
    }

    #[test]
    fn governor_scenario() {
        // V1's second signature hits the cap of 1 and is rejected.
        let recs = records(&[
            ("V1", "Governor", "A"),
            ("V1", "Governor", "B"),
            ("V2", "Governor", "A"),
        ]);
        let configs = single_race_configs("Governor", 1, 2);
        let res = run_signature_stats(&recs, &configs).unwrap();
        let race = res.race("Governor").unwrap();
        assert_eq!(race.legitimate_total, 2);
        assert_eq!(race.illegitimate_total, 1);
        assert_eq!(race.qualified, vec![("A".to_string(), 2)]);
        assert!(race.partial.is_empty());
    }

    #[test]
    fn court_race_cap_of_seven() {
        // 8 signatures from the same voter: the 8th is rejected regardless of
        // the candidate it endorses.
        let mut recs: Vec<SignatureRecord> = Vec::new();
        for i in 0..7 {
            recs.push(SignatureRecord::new(
                "V1",
                "Supreme Court",
                format!("C{}", i).as_str(),
            ));
        }
        recs.push(SignatureRecord::new("V1", "Supreme Court", "C9"));
        let configs = single_race_configs("Supreme Court", 7, 30);
        let states = tabulate(&recs, &configs).unwrap();
        let state = &states["Supreme Court"];
        assert_eq!(state.legitimate_total, 7);
        assert_eq!(state.illegitimate_total, 1);
        assert_eq!(state.outgoing_count["V1"], 7);
        assert!(!state.incoming_count.contains_key("C9"));
    }

    #[test]
    fn cap_enforcement_and_conservation() {
        let recs = records(&[
            ("V1", "Governor", "A"),
            ("V2", "Governor", "A"),
            ("V1", "Governor", "A"),
            ("V1", "Governor", "B"),
            ("V3", "Governor", "B"),
            ("V2", "Governor", "B"),
        ]);
        let configs = single_race_configs("Governor", 1, 30);
        let states = tabulate(&recs, &configs).unwrap();
        let state = &states["Governor"];
        for (_, &count) in state.outgoing_count.iter() {
            assert!(count <= 1);
        }
        assert_eq!(state.total_records(), recs.len() as u64);
        let incoming_sum: u64 = state.incoming_count.values().sum();
        let outgoing_sum: u64 = state.outgoing_count.values().map(|&c| c as u64).sum();
        assert_eq!(incoming_sum, state.legitimate_total);
        assert_eq!(outgoing_sum, state.legitimate_total);
    }

    #[test]
    fn duplicate_candidate_signatures_count_toward_cap() {
        // The same (voter, candidate) pair twice: no deduplication, the second
        // one is only rejected because the cap is reached.
        let recs = records(&[("V1", "Governor", "A"), ("V1", "Governor", "A")]);
        let configs = single_race_configs("Governor", 2, 30);
        let states = tabulate(&recs, &configs).unwrap();
        let state = &states["Governor"];
        assert_eq!(state.legitimate_total, 2);
        assert_eq!(state.illegitimate_total, 0);
        assert_eq!(state.incoming_count["A"], 2);
    }

    #[test]
    fn order_changes_acceptance_but_not_totals() {
        let forward = records(&[
            ("V1", "Governor", "A"),
            ("V1", "Governor", "B"),
            ("V2", "Governor", "B"),
        ]);
        let mut reversed = forward.clone();
        reversed.reverse();
        let configs = single_race_configs("Governor", 1, 30);

        let fwd = &tabulate(&forward, &configs).unwrap()["Governor"];
        let rev = &tabulate(&reversed, &configs).unwrap()["Governor"];

        // Which of V1's signatures survives differs with the order.
        assert_eq!(fwd.incoming_count.get("A"), Some(&1));
        assert_eq!(rev.incoming_count.get("A"), None);
        // The totals do not.
        assert_eq!(fwd.legitimate_total, rev.legitimate_total);
        assert_eq!(fwd.illegitimate_total, rev.illegitimate_total);
    }

    #[test]
    fn determinism() {
        let recs = records(&[
            ("V1", "Governor", "A"),
            ("V2", "Governor", "B"),
            ("V3", "Governor", "A"),
            ("V1", "Governor", "B"),
        ]);
        let configs = single_race_configs("Governor", 1, 2);
        let r1 = run_signature_stats(&recs, &configs).unwrap();
        let r2 = run_signature_stats(&recs, &configs).unwrap();
        assert_eq!(r1, r2);
    }

    #[test]
    fn threshold_boundary() {
        let mut state = RaceState::default();
        state.incoming_count.insert("at".to_string(), 30);
        state.incoming_count.insert("below".to_string(), 29);
        state.incoming_count.insert("zero".to_string(), 0);
        state.legitimate_total = 59;

        let classified = classify(&state, 30);
        assert_eq!(classified.qualified, vec![("at".to_string(), 30)]);
        assert_eq!(classified.partial, vec![("below".to_string(), 29)]);
    }

    #[test]
    fn classification_sort_order() {
        let mut state = RaceState::default();
        state.incoming_count.insert("zeta".to_string(), 5);
        state.incoming_count.insert("alpha".to_string(), 5);
        state.incoming_count.insert("mid".to_string(), 8);
        let classified = classify(&state, 100);
        assert_eq!(
            classified.partial,
            vec![
                ("mid".to_string(), 8),
                ("alpha".to_string(), 5),
                ("zeta".to_string(), 5),
            ]
        );
    }

    #[test]
    fn unknown_race_is_fatal() {
        let recs = records(&[("V1", "Governor", "A"), ("V1", "Senate", "B")]);
        let configs = single_race_configs("Governor", 1, 30);
        let res = run_signature_stats(&recs, &configs);
        assert_eq!(
            res,
            Err(TallyErrors::UnknownRace {
                race: "Senate".to_string()
            })
        );
    }

    #[test]
    fn zero_cap_is_rejected() {
        let configs = single_race_configs("Governor", 0, 30);
        let res = tabulate(&[], &configs);
        assert_eq!(
            res,
            Err(TallyErrors::InvalidRaceConfig {
                race: "Governor".to_string()
            })
        );
    }

    #[test]
    fn empty_input_produces_zero_totals() {
        let configs = single_race_configs("Governor", 1, 30);
        let res = run_signature_stats(&[], &configs).unwrap();
        let race = res.race("Governor").unwrap();
        assert_eq!(race.legitimate_total, 0);
        assert_eq!(race.illegitimate_total, 0);
        assert!(race.qualified.is_empty());
        assert!(race.partial.is_empty());
    }

    #[test]
    fn races_sorted_in_result() {
        let mut configs = single_race_configs("Governor", 1, 30);
        configs.insert(
            "Attorney General".to_string(),
            RaceConfig {
                max_signatures_per_voter: 1,
                qualification_threshold: 30,
            },
        );
        let res = run_signature_stats(&[], &configs).unwrap();
        let names: Vec<&str> = res.races.iter().map(|r| r.race.as_str()).collect();
        assert_eq!(names, vec!["Attorney General", "Governor"]);
    }

    #[test]
    fn policy_matching() {
        let policy = RacePolicy::default_policy();
        assert_eq!(policy.config_for("Supreme Court").max_signatures_per_voter, 7);
        assert_eq!(policy.config_for("District Court 3").max_signatures_per_voter, 7);
        // The marker match is case-sensitive.
        assert_eq!(policy.config_for("supreme court").max_signatures_per_voter, 1);
        assert_eq!(policy.config_for("Governor").max_signatures_per_voter, 1);
        assert_eq!(policy.config_for("Governor").qualification_threshold, 30);

        let races = vec!["Governor".to_string(), "Supreme Court".to_string()];
        let configs = policy.assign(races.iter());
        assert_eq!(configs.len(), 2);
        assert_eq!(configs["Supreme Court"].max_signatures_per_voter, 7);
    }
}
