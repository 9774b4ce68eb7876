use crate::sig::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

use signature_tally::{RaceConfig, RacePolicy, RaceRule};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: Option<String>,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    #[serde(rename = "contestJurisdiction")]
    pub contest_jurisdiction: Option<String>,
}

/// The echo of the configuration in the output summary.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: Option<String>,
    pub date: Option<String>,
    pub jurisdiction: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    // The column indices start at 1 to respect most conventions in the
    // spreadsheet world. The defaults follow the layout of the convention
    // form export: time, email, position, candidate, file, election id,
    // signature, city.
    #[serde(rename = "firstRowIndex")]
    _first_row_index: Option<JSValue>,
    #[serde(rename = "raceColumnIndex")]
    _race_column_index: Option<JSValue>,
    #[serde(rename = "candidateColumnIndex")]
    _candidate_column_index: Option<JSValue>,
    #[serde(rename = "voterColumnIndex")]
    _voter_column_index: Option<JSValue>,
}

impl FileSource {
    pub fn csv_defaults(file_path: &str) -> FileSource {
        FileSource {
            provider: "csv".to_string(),
            file_path: file_path.to_string(),
            _first_row_index: None,
            _race_column_index: None,
            _candidate_column_index: None,
            _voter_column_index: None,
        }
    }

    /// The first row carrying a signature (1-based). Everything above is headers.
    pub fn first_row_index(&self) -> SigResult<usize> {
        read_js_int_default(&self._first_row_index, 2)
    }

    pub fn race_column_index(&self) -> SigResult<usize> {
        read_js_int_default(&self._race_column_index, 3)
    }

    pub fn candidate_column_index(&self) -> SigResult<usize> {
        read_js_int_default(&self._candidate_column_index, 4)
    }

    pub fn voter_column_index(&self) -> SigResult<usize> {
        read_js_int_default(&self._voter_column_index, 6)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRule {
    /// Case-sensitive substring matched against the race name.
    pub contains: String,
    #[serde(rename = "maxSignaturesPerVoter")]
    pub max_signatures_per_voter: u32,
    #[serde(rename = "qualificationThreshold")]
    pub qualification_threshold: u64,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DefaultPolicy {
    #[serde(rename = "maxSignaturesPerVoter")]
    pub max_signatures_per_voter: u32,
    #[serde(rename = "qualificationThreshold")]
    pub qualification_threshold: u64,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct SigConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "signatureFileSources", default)]
    pub signature_file_sources: Vec<FileSource>,
    #[serde(rename = "racePolicies")]
    pub race_policies: Option<Vec<PolicyRule>>,
    #[serde(rename = "defaultPolicy")]
    pub default_policy: Option<DefaultPolicy>,
    /// If present, the exhaustive list of races expected in the input. A
    /// record naming any other race fails the run.
    pub races: Option<Vec<String>>,
}

impl SigConfig {
    /// The race policy described by this configuration. Sections that are
    /// absent fall back to the historical convention rules.
    pub fn policy(&self) -> RacePolicy {
        let fallback = RacePolicy::default_policy();
        let rules = match &self.race_policies {
            Some(prs) => prs
                .iter()
                .map(|pr| RaceRule {
                    marker: pr.contains.clone(),
                    config: RaceConfig {
                        max_signatures_per_voter: pr.max_signatures_per_voter,
                        qualification_threshold: pr.qualification_threshold,
                    },
                })
                .collect(),
            None => fallback.rules,
        };
        let default = match &self.default_policy {
            Some(dp) => RaceConfig {
                max_signatures_per_voter: dp.max_signatures_per_voter,
                qualification_threshold: dp.qualification_threshold,
            },
            None => fallback.default,
        };
        RacePolicy { rules, default }
    }
}

pub fn read_config(path: &str) -> SigResult<SigConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu {})?;
    let config: SigConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: String) -> SigResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu {})?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

fn read_js_int_default(x: &Option<JSValue>, default: usize) -> SigResult<usize> {
    match x {
        None => Ok(default),
        Some(JSValue::Number(n)) => n
            .as_u64()
            .map(|x| x as usize)
            .context(ParsingJsonNumberSnafu {}),
        Some(JSValue::String(s)) => s.parse::<usize>().ok().context(ParsingJsonNumberSnafu {}),
        _ => None.context(ParsingJsonNumberSnafu {}),
    }
}
