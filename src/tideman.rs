use log::{debug, info, warn};

use ranked_pairs::*;
use snafu::{prelude::*, Snafu};

use std::collections::HashSet;
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::tideman::config_reader::*;

pub mod io_common;
pub mod io_csv;
pub mod io_json;
pub mod io_xlsx;

#[derive(Debug, Snafu)]
pub enum TidemanError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Empty or missing worksheet"))]
    EmptyExcel {},
    #[snafu(display("Cell type not understood at line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },
    #[snafu(display("Error opening file"))]
    OpeningJson { source: std::io::Error },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a JSON integer"))]
    ParsingJsonNumber {},
    #[snafu(display("Error opening CSV file"))]
    CsvOpen { source: csv::Error },
    #[snafu(display("Error parsing CSV line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("CSV line {lineno} is too short"))]
    CsvLineTooShort { lineno: usize },
    #[snafu(display("Error reading the terminal"))]
    TerminalIo { source: std::io::Error },
    #[snafu(display("Number of voters must be a non-negative integer, got {text:?}"))]
    InvalidVoterCount { text: String },
    #[snafu(display("Invalid vote."))]
    InvalidVote { name: String },
    #[snafu(display("Maximum number of candidates is {max}"))]
    TooManyCandidates { count: usize, max: usize },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("{source}"))]
    Tabulation { source: ElectionErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type TidemanResult<T> = Result<T, TidemanError>;

/// A ballot, as parsed by the readers.
///
/// This is before validation: choices may be blank and the ranking may be
/// incomplete. Blank cells are dropped by [validate_ballots]; everything else
/// is checked by the tabulation itself.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedBallot {
    pub id: Option<String>,
    pub choices: Vec<String>,
}

pub mod config_reader {
    use snafu::prelude::*;

    use crate::tideman::*;

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct OutputSettings {
        #[serde(rename = "contestName")]
        pub contest_name: String,
        #[serde(rename = "outputDirectory")]
        pub output_directory: Option<String>,
        #[serde(rename = "contestDate")]
        pub contest_date: Option<String>,
        #[serde(rename = "contestJurisdiction")]
        pub contest_jurisdiction: Option<String>,
        #[serde(rename = "contestOffice")]
        pub contest_office: Option<String>,
    }

    // The election header repeated in the JSON summary.
    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct OutputConfig {
        pub contest: String,
        pub date: Option<String>,
        pub jurisdiction: Option<String>,
        pub office: Option<String>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct FileSource {
        pub provider: String,
        #[serde(rename = "filePath")]
        pub file_path: String,
        #[serde(rename = "firstVoteColumnIndex")]
        _first_vote_column_index: Option<JSValue>,
        #[serde(rename = "firstVoteRowIndex")]
        _first_vote_row_index: Option<JSValue>,
        #[serde(rename = "idColumnIndex")]
        _id_column_index: Option<JSValue>,
    }

    impl FileSource {
        /// A source for a file given directly on the command line, outside
        /// any configuration.
        pub fn direct(provider: &str, path: &str) -> FileSource {
            FileSource {
                provider: provider.to_string(),
                file_path: path.to_string(),
                _first_vote_column_index: None,
                _first_vote_row_index: None,
                _id_column_index: None,
            }
        }

        /// First column holding a choice, zero-based. The configuration is
        /// one-based to respect most conventions in the spreadsheet world.
        pub fn first_vote_column_index(&self) -> TidemanResult<usize> {
            match &self._first_vote_column_index {
                None => Ok(0),
                Some(x) => {
                    let v = read_js_int(x)?;
                    if v < 1 {
                        whatever!("firstVoteColumnIndex starts at 1, got {}", v);
                    }
                    Ok(v - 1)
                }
            }
        }

        /// First row holding a ballot, one-based.
        pub fn first_vote_row_index(&self) -> TidemanResult<usize> {
            match &self._first_vote_row_index {
                None => Ok(1),
                Some(x) => read_js_int(x),
            }
        }

        pub fn id_column_index_int(&self) -> TidemanResult<Option<usize>> {
            match &self._id_column_index {
                None => Ok(None),
                Some(x) => read_js_int(x).map(Some),
            }
        }
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct ConfigCandidate {
        pub name: String,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct ConfigRules {
        #[serde(rename = "maxCandidates")]
        pub max_candidates: Option<JSValue>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct TidemanConfig {
        #[serde(rename = "outputSettings")]
        pub output_settings: OutputSettings,
        #[serde(rename = "ballotFileSources")]
        pub ballot_file_sources: Vec<FileSource>,
        pub candidates: Vec<ConfigCandidate>,
        pub rules: Option<ConfigRules>,
    }

    pub fn read_summary(path: String) -> TidemanResult<JSValue> {
        let contents = fs::read_to_string(path).context(OpeningJsonSnafu {})?;
        let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
        Ok(js)
    }

    pub(crate) fn read_js_int(x: &JSValue) -> TidemanResult<usize> {
        match x {
            JSValue::Number(n) => n
                .as_u64()
                .map(|x| x as usize)
                .context(ParsingJsonNumberSnafu {}),
            JSValue::String(s) => s.parse::<usize>().ok().context(ParsingJsonNumberSnafu {}),
            _ => None.context(ParsingJsonNumberSnafu {}),
        }
    }
}

fn validate_rules(rules: &Option<ConfigRules>) -> TidemanResult<ElectionRules> {
    let max_candidates = match rules.as_ref().and_then(|r| r.max_candidates.as_ref()) {
        None => ElectionRules::DEFAULT_RULES.max_candidates,
        Some(x) => read_js_int(x)?,
    };
    if max_candidates == 0 {
        whatever!("maxCandidates must be at least 1");
    }
    Ok(ElectionRules { max_candidates })
}

// Turns parsed ballots into the library's input form. Blank cells are
// dropped; rows without any choice are skipped entirely. Partially filled
// rows are kept as-is, the tabulation rejects them as invalid.
fn validate_ballots(parsed: &[ParsedBallot]) -> Vec<Ballot> {
    let mut res: Vec<Ballot> = Vec::new();
    for pb in parsed.iter() {
        let choices: Vec<String> = pb
            .choices
            .iter()
            .filter(|s| !s.is_empty())
            .cloned()
            .collect();
        if choices.is_empty() {
            warn!("validate_ballots: ballot {:?} has no choices, skipping", pb.id);
            continue;
        }
        res.push(Ballot { choices });
    }
    res
}

// Candidate list in order of first appearance across the ballots, for runs
// where no candidate registration was provided.
fn infer_candidates(ballots: &[Ballot]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names: Vec<String> = Vec::new();
    for ballot in ballots.iter() {
        for choice in ballot.choices.iter() {
            if seen.insert(choice.clone()) {
                names.push(choice.clone());
            }
        }
    }
    names
}

fn read_ballot_data(root_path: String, cfs: &FileSource) -> TidemanResult<Vec<ParsedBallot>> {
    let p: PathBuf = [root_path, cfs.file_path.clone()].iter().collect();
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read ballot file {:?}", p2);
    match cfs.provider.as_str() {
        "csv" => io_csv::read_csv_ranking(p2, cfs),
        "msforms" => io_xlsx::read_msforms_ranking(p2, cfs),
        "json" => io_json::read_json_ballots(p2),
        x => whatever!("Provider not implemented {:?}", x),
    }
}

fn result_stats_to_json(rs: &ElectionResult) -> JSValue {
    let mut pairs: Vec<JSValue> = Vec::new();
    for pt in rs.pair_tallies.iter() {
        pairs.push(json!({
            "winner": pt.winner,
            "loser": pt.loser,
            "support": pt.support.to_string(),
            "opposition": pt.opposition.to_string(),
            "locked": pt.locked,
        }));
    }
    json!({"winner": rs.winner, "pairs": pairs})
}

fn build_summary_js(config: Option<&TidemanConfig>, rv: &ElectionResult) -> JSValue {
    let c = config.map(|cfg| OutputConfig {
        contest: cfg.output_settings.contest_name.clone(),
        date: cfg.output_settings.contest_date.clone(),
        jurisdiction: cfg.output_settings.contest_jurisdiction.clone(),
        office: cfg.output_settings.contest_office.clone(),
    });
    json!({
        "config": c,
         "results": result_stats_to_json(rv) })
}

fn emit_summary(out: &Option<String>, summary: &JSValue) -> TidemanResult<()> {
    let pretty = serde_json::to_string_pretty(summary).context(ParsingJsonSnafu {})?;
    match out.as_deref() {
        None => {}
        Some("stdout") => println!("{}", pretty),
        Some(path) => fs::write(path, pretty).context(OpeningJsonSnafu {})?,
    }
    Ok(())
}

// The reference summary, if provided for comparison.
fn check_reference(reference: &Option<String>, summary: &JSValue) -> TidemanResult<()> {
    if let Some(ref_path) = reference {
        let summary_ref = read_summary(ref_path.clone())?;
        let pretty_ref = serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        let pretty = serde_json::to_string_pretty(summary).context(ParsingJsonSnafu {})?;
        if pretty_ref != pretty {
            warn!("Found differences with the reference summary");
            print_diff(pretty_ref.as_str(), pretty.as_str(), "\n");
            whatever!("Difference detected between calculated summary and reference summary");
        }
    }
    Ok(())
}

/// Runs an election fully described by a configuration file.
pub fn run_election(
    config_path: String,
    out: Option<String>,
    check_summary_path: Option<String>,
) -> TidemanResult<()> {
    let config_p = Path::new(config_path.as_str());
    let config_str = fs::read_to_string(config_path.clone()).context(OpeningJsonSnafu {})?;
    let config: TidemanConfig = serde_json::from_str(&config_str).context(ParsingJsonSnafu {})?;
    info!("config: {:?}", config);

    let rules = validate_rules(&config.rules)?;

    if config.ballot_file_sources.is_empty() {
        whatever!("no ballot sources in the configuration");
    }

    let root_p = config_p.parent().context(MissingParentDirSnafu {})?;
    let mut parsed: Vec<ParsedBallot> = Vec::new();
    for cfs in config.ballot_file_sources.iter() {
        let mut file_data = read_ballot_data(root_p.display().to_string(), cfs)?;
        parsed.append(&mut file_data);
    }

    let ballots = validate_ballots(&parsed);
    let candidates: Vec<Candidate> = config
        .candidates
        .iter()
        .map(|c| Candidate {
            name: c.name.clone(),
        })
        .collect();

    let result =
        run_ranked_pairs(&ballots, &rules, &candidates).context(TabulationSnafu {})?;
    println!("{}", result.winner);

    let summary = build_summary_js(Some(&config), &result);
    emit_summary(&out, &summary)?;
    check_reference(&check_summary_path, &summary)?;
    Ok(())
}

/// Runs an election over a single ballot file given on the command line.
pub fn run_input(args: &Args) -> TidemanResult<()> {
    let path = match &args.input {
        Some(p) => p.clone(),
        None => whatever!("run_input called without an input file"),
    };
    let input_type = args.input_type.clone().unwrap_or_else(|| "csv".to_string());
    let cfs = FileSource::direct(&input_type, &path);

    let parsed = read_ballot_data(String::new(), &cfs)?;
    let ballots = validate_ballots(&parsed);

    let candidate_names = if args.candidates.is_empty() {
        let inferred = infer_candidates(&ballots);
        info!("Candidates inferred from the ballots: {:?}", inferred);
        inferred
    } else {
        args.candidates.clone()
    };
    let candidates: Vec<Candidate> = candidate_names
        .iter()
        .map(|name| Candidate { name: name.clone() })
        .collect();

    let result = run_ranked_pairs(&ballots, &ElectionRules::DEFAULT_RULES, &candidates)
        .context(TabulationSnafu {})?;
    println!("{}", result.winner);

    let summary = build_summary_js(None, &result);
    emit_summary(&args.out, &summary)?;
    check_reference(&args.reference, &summary)?;
    Ok(())
}

fn read_prompted_line<R: BufRead, W: Write>(
    prompt: &str,
    input: &mut R,
    output: &mut W,
) -> TidemanResult<String> {
    write!(output, "{}", prompt).context(TerminalIoSnafu {})?;
    output.flush().context(TerminalIoSnafu {})?;
    let mut line = String::new();
    let n = input.read_line(&mut line).context(TerminalIoSnafu {})?;
    if n == 0 {
        whatever!("Unexpected end of input");
    }
    Ok(line.trim().to_string())
}

// Collects every ballot on the terminal, one rank at a time, and tabulates.
fn interactive_session<R: BufRead, W: Write>(
    candidate_names: &[String],
    rules: &ElectionRules,
    input: &mut R,
    output: &mut W,
) -> TidemanResult<ElectionResult> {
    ensure!(
        candidate_names.len() <= rules.max_candidates,
        TooManyCandidatesSnafu {
            count: candidate_names.len(),
            max: rules.max_candidates,
        }
    );

    let count_text = read_prompted_line("Number of voters: ", input, output)?;
    let voter_count: usize = count_text
        .parse::<usize>()
        .ok()
        .context(InvalidVoterCountSnafu { text: count_text })?;

    let mut ballots: Vec<Ballot> = Vec::with_capacity(voter_count);
    for _ in 0..voter_count {
        let mut choices: Vec<String> = Vec::with_capacity(candidate_names.len());
        for rank in 0..candidate_names.len() {
            let prompt = format!("Rank {}: ", rank + 1);
            let name = read_prompted_line(&prompt, input, output)?;
            ensure!(
                candidate_names.iter().any(|c| *c == name),
                InvalidVoteSnafu { name }
            );
            choices.push(name);
        }
        ballots.push(Ballot { choices });
        writeln!(output).context(TerminalIoSnafu {})?;
    }

    let candidates: Vec<Candidate> = candidate_names
        .iter()
        .map(|name| Candidate { name: name.clone() })
        .collect();
    run_ranked_pairs(&ballots, rules, &candidates).context(TabulationSnafu {})
}

/// Runs an interactive election with the candidates named on the command
/// line, prompting for every ballot.
pub fn run_interactive(args: &Args) -> TidemanResult<()> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let result = {
        let mut input = stdin.lock();
        let mut output = stdout.lock();
        interactive_session(
            &args.candidates,
            &ElectionRules::DEFAULT_RULES,
            &mut input,
            &mut output,
        )?
    };
    println!("{}", result.winner);

    let summary = build_summary_js(None, &result);
    emit_summary(&args.out, &summary)?;
    check_reference(&args.reference, &summary)?;
    Ok(())
}

pub fn run_app(args: &Args) -> TidemanResult<()> {
    debug!("run_app: args: {:?}", args);
    if let Some(config_path) = args.config.clone() {
        run_election(config_path, args.out.clone(), args.reference.clone())
    } else if args.input.is_some() {
        run_input(args)
    } else if !args.candidates.is_empty() {
        run_interactive(args)
    } else {
        whatever!("Usage: tideman [candidate ...], or tideman --input FILE, or tideman --config FILE")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parsed(choices: &[&str]) -> ParsedBallot {
        ParsedBallot {
            id: None,
            choices: choices.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn rules_default_when_absent() {
        let rules = validate_rules(&None).unwrap();
        assert_eq!(rules.max_candidates, 9);
    }

    #[test]
    fn rules_accept_number_and_string() {
        let r: ConfigRules = serde_json::from_str(r#"{"maxCandidates": 5}"#).unwrap();
        assert_eq!(validate_rules(&Some(r)).unwrap().max_candidates, 5);
        let r: ConfigRules = serde_json::from_str(r#"{"maxCandidates": "7"}"#).unwrap();
        assert_eq!(validate_rules(&Some(r)).unwrap().max_candidates, 7);
    }

    #[test]
    fn ballots_skip_blank_cells_and_empty_rows() {
        let ballots = validate_ballots(&[
            parsed(&["Alice", "", "Bob"]),
            parsed(&[]),
            parsed(&["", ""]),
            parsed(&["Bob", "Alice"]),
        ]);
        assert_eq!(
            ballots,
            vec![
                Ballot {
                    choices: vec!["Alice".to_string(), "Bob".to_string()]
                },
                Ballot {
                    choices: vec!["Bob".to_string(), "Alice".to_string()]
                },
            ]
        );
    }

    #[test]
    fn candidates_inferred_in_first_appearance_order() {
        let ballots = validate_ballots(&[
            parsed(&["Bob", "Alice"]),
            parsed(&["Alice", "Charlie", "Bob"]),
        ]);
        assert_eq!(
            infer_candidates(&ballots),
            vec![
                "Bob".to_string(),
                "Alice".to_string(),
                "Charlie".to_string()
            ]
        );
    }

    #[test]
    fn config_parses_camel_case_fields() {
        let config: TidemanConfig = serde_json::from_str(
            r#"{
                "outputSettings": { "contestName": "Club president" },
                "ballotFileSources": [
                    { "provider": "csv", "filePath": "ballots.csv", "firstVoteRowIndex": "2" }
                ],
                "candidates": [ { "name": "Alice" }, { "name": "Bob" } ],
                "rules": { "maxCandidates": 9 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.output_settings.contest_name, "Club president");
        assert_eq!(config.ballot_file_sources[0].provider, "csv");
        assert_eq!(
            config.ballot_file_sources[0].first_vote_row_index().unwrap(),
            2
        );
        assert_eq!(
            config.ballot_file_sources[0]
                .first_vote_column_index()
                .unwrap(),
            0
        );
        assert_eq!(config.candidates.len(), 2);
    }

    #[test]
    fn summary_reports_pairs_in_lock_order() {
        let candidates = vec![
            Candidate {
                name: "Alice".to_string(),
            },
            Candidate {
                name: "Bob".to_string(),
            },
        ];
        let ballots = vec![
            Ballot {
                choices: vec!["Alice".to_string(), "Bob".to_string()],
            },
            Ballot {
                choices: vec!["Alice".to_string(), "Bob".to_string()],
            },
        ];
        let result =
            run_ranked_pairs(&ballots, &ElectionRules::DEFAULT_RULES, &candidates).unwrap();
        let js = result_stats_to_json(&result);
        assert_eq!(js["winner"], json!("Alice"));
        assert_eq!(js["pairs"][0]["support"], json!("2"));
        assert_eq!(js["pairs"][0]["opposition"], json!("0"));
        assert_eq!(js["pairs"][0]["locked"], json!(true));
    }

    #[test]
    fn interactive_session_collects_ballots() {
        let names = vec!["Alice".to_string(), "Bob".to_string()];
        let mut input = Cursor::new("2\nAlice\nBob\nBob\nAlice\n");
        let mut output: Vec<u8> = Vec::new();
        let res = interactive_session(
            &names,
            &ElectionRules::DEFAULT_RULES,
            &mut input,
            &mut output,
        )
        .unwrap();
        // A tied two-candidate election: no pair, first candidate reported.
        assert_eq!(res.winner, "Alice");
        let transcript = String::from_utf8(output).unwrap();
        assert!(transcript.contains("Number of voters: "));
        assert!(transcript.contains("Rank 1: "));
        assert!(transcript.contains("Rank 2: "));
    }

    #[test]
    fn interactive_session_rejects_unknown_names() {
        let names = vec!["Alice".to_string(), "Bob".to_string()];
        let mut input = Cursor::new("1\nAlice\nMallory\n");
        let mut output: Vec<u8> = Vec::new();
        let res = interactive_session(
            &names,
            &ElectionRules::DEFAULT_RULES,
            &mut input,
            &mut output,
        );
        assert!(matches!(res, Err(TidemanError::InvalidVote { .. })));
    }

    #[test]
    fn interactive_session_enforces_the_candidate_cap() {
        let names: Vec<String> = (0..10).map(|i| format!("c{}", i)).collect();
        let mut input = Cursor::new("");
        let mut output: Vec<u8> = Vec::new();
        let res = interactive_session(
            &names,
            &ElectionRules::DEFAULT_RULES,
            &mut input,
            &mut output,
        );
        assert!(matches!(
            res,
            Err(TidemanError::TooManyCandidates { count: 10, max: 9 })
        ));
    }

    #[test]
    fn reference_differences_are_detected() {
        let summary = json!({"results": {"winner": "Alice"}});
        assert!(check_reference(&None, &summary).is_ok());

        let ref_path = std::env::temp_dir().join("tideman_test_reference.json");
        fs::write(&ref_path, r#"{"results": {"winner": "Bob"}}"#).unwrap();
        let res = check_reference(&Some(ref_path.display().to_string()), &summary);
        assert!(matches!(res, Err(TidemanError::Whatever { .. })));
    }

    #[test]
    fn csv_election_end_to_end() {
        let path = std::env::temp_dir().join("tideman_test_ballots.csv");
        fs::write(&path, "Alice,Bob,Charlie\nAlice,Charlie,Bob\nCharlie,Alice,Bob\n").unwrap();
        let args = Args {
            candidates: vec![],
            config: None,
            reference: None,
            out: None,
            input: Some(path.display().to_string()),
            input_type: None,
            verbose: false,
        };
        // Candidates are inferred from the first ballot; Alice beats both
        // Bob and Charlie pairwise.
        run_input(&args).unwrap();
    }
}
