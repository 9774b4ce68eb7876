use log::{debug, info, warn};

use signature_tally::*;
use snafu::{prelude::*, Snafu};

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

pub mod config_reader;
pub mod io_common;
pub mod io_csv;

pub use crate::sig::config_reader::*;

#[derive(Debug, Snafu)]
pub enum SigError {
    #[snafu(display("Error opening JSON file"))]
    OpeningJson { source: std::io::Error },
    #[snafu(display("Error parsing JSON content"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a JSON number or a string holding a number"))]
    ParsingJsonNumber {},
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing CSV line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary { source: std::io::Error, path: String },
    #[snafu(display("No input was provided: pass --input or list signatureFileSources in the configuration"))]
    MissingInput {},
    #[snafu(display("Tabulation failed: {source}"))]
    Tabulation { source: TallyErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SigResult<T> = Result<T, SigError>;

/// A signature row as parsed by the readers, before normalization.
/// The fields are kept verbatim (possibly empty).
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedSignature {
    pub lineno: usize,
    pub voter_id: String,
    pub race: String,
    pub candidate: String,
}

/// A row rejected during normalization. These are collected and reported with
/// the results; they never abort the run.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RecordIssue {
    pub source: String,
    pub lineno: usize,
    pub missing_field: String,
}

/// Turns parsed rows into tabulation records: trims the cells, upper-cases the
/// voter id so the same voter does not split into several keys, and sets aside
/// rows with a missing voter, race or candidate.
pub fn normalize_signatures(
    parsed: &[ParsedSignature],
    source_name: &str,
) -> (Vec<SignatureRecord>, Vec<RecordIssue>) {
    let mut records: Vec<SignatureRecord> = Vec::new();
    let mut issues: Vec<RecordIssue> = Vec::new();

    for ps in parsed.iter() {
        let missing = [
            ("voter", ps.voter_id.is_empty()),
            ("race", ps.race.is_empty()),
            ("candidate", ps.candidate.is_empty()),
        ]
        .iter()
        .find_map(|(field, empty)| if *empty { Some(*field) } else { None });

        if let Some(field) = missing {
            warn!(
                "normalize_signatures: {}: line {}: missing {} field, skipping row",
                source_name, ps.lineno, field
            );
            issues.push(RecordIssue {
                source: source_name.to_string(),
                lineno: ps.lineno,
                missing_field: field.to_string(),
            });
            continue;
        }

        records.push(SignatureRecord {
            voter_id: ps.voter_id.to_uppercase(),
            race: ps.race.clone(),
            candidate: ps.candidate.clone(),
        });
    }
    (records, issues)
}

fn tally_to_json(tally: &[(String, u64)]) -> Vec<JSValue> {
    tally
        .iter()
        .map(|(name, count)| json!({"name": name, "count": count}))
        .collect()
}

fn result_stats_to_json(result: &TallyResult) -> Vec<JSValue> {
    result
        .races
        .iter()
        .map(|race| {
            json!({
                "race": race.race,
                "totalRecords": race.legitimate_total + race.illegitimate_total,
                "legitimateTotal": race.legitimate_total,
                "illegitimateTotal": race.illegitimate_total,
                "qualified": tally_to_json(&race.qualified),
                "partial": tally_to_json(&race.partial),
            })
        })
        .collect()
}

fn issues_to_json(issues: &[RecordIssue]) -> Vec<JSValue> {
    issues
        .iter()
        .map(|issue| {
            json!({
                "source": issue.source,
                "line": issue.lineno,
                "missingField": issue.missing_field,
            })
        })
        .collect()
}

fn build_summary_js(
    config: &SigConfig,
    result: &TallyResult,
    issues: &[RecordIssue],
) -> JSValue {
    let c = OutputConfig {
        contest: config.output_settings.contest_name.clone(),
        date: config.output_settings.contest_date.clone(),
        jurisdiction: config.output_settings.contest_jurisdiction.clone(),
    };
    json!({
        "config": c,
        "results": result_stats_to_json(result),
        "issues": issues_to_json(issues),
    })
}

fn read_signature_data(
    root_path: &str,
    cfs: &FileSource,
) -> SigResult<(Vec<SignatureRecord>, Vec<RecordIssue>)> {
    let p: PathBuf = [root_path, cfs.file_path.as_str()].iter().collect();
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read signature file {:?}", p2);
    let parsed = match cfs.provider.as_str() {
        "csv" => io_csv::read_csv_signatures(&p2, cfs),
        x => whatever!("Provider not implemented {:?}", x),
    }?;
    let source_name = io_common::simplify_file_name(&p2);
    Ok(normalize_signatures(&parsed, &source_name))
}

fn distinct_races(records: &[SignatureRecord]) -> Vec<String> {
    let mut races: Vec<String> = records.iter().map(|r| r.race.clone()).collect();
    races.sort();
    races.dedup();
    races
}

pub fn run_tally(
    config_path: Option<String>,
    input: Option<String>,
    out: Option<String>,
    reference: Option<String>,
) -> SigResult<()> {
    let (config, root_path) = match &config_path {
        Some(path) => {
            let config = read_config(path)?;
            let root = Path::new(path)
                .parent()
                .map(|p| p.as_os_str().to_str().unwrap_or(".").to_string())
                .unwrap_or_else(|| ".".to_string());
            (config, root)
        }
        None => (SigConfig::default(), ".".to_string()),
    };
    info!("config: {:?}", config);

    // The --input flag takes precedence over the configured file sources.
    let sources: Vec<FileSource> = match &input {
        Some(path) => vec![FileSource::csv_defaults(path)],
        None => config.signature_file_sources.clone(),
    };
    if sources.is_empty() {
        return Err(SigError::MissingInput {});
    }

    let mut records: Vec<SignatureRecord> = Vec::new();
    let mut issues: Vec<RecordIssue> = Vec::new();
    for cfs in sources.iter() {
        let (mut file_records, mut file_issues) = read_signature_data(&root_path, cfs)?;
        records.append(&mut file_records);
        issues.append(&mut file_issues);
    }
    info!(
        "run_tally: {} records after normalization, {} rejected rows",
        records.len(),
        issues.len()
    );

    let policy = config.policy();
    let configs: HashMap<String, RaceConfig> = match &config.races {
        // An explicit race list pins the configuration: a record naming any
        // other race aborts the run.
        Some(races) => policy.assign(races.iter()),
        None => policy.assign(distinct_races(&records).iter()),
    };
    debug!("run_tally: race configs: {:?}", configs);

    let result = run_signature_stats(&records, &configs).context(TabulationSnafu {})?;

    let summary_js = build_summary_js(&config, &result, &issues);
    let pretty_js_summary =
        serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;

    let out_path = out.or_else(|| config.output_settings.output_path.clone());
    match out_path {
        Some(path) if path != "stdout" => {
            fs::write(&path, &pretty_js_summary).context(WritingSummarySnafu { path })?;
        }
        _ => {
            println!("{}", pretty_js_summary);
        }
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = reference {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_summary {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_summary.as_str(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(())
}
