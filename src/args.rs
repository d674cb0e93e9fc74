use clap::Parser;

/// This is a ranked-pairs (Tideman) election tabulation program.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Candidate names for an interactive election. When given, the program
    /// prompts for the number of voters and then collects every ballot on the
    /// terminal one rank at a time.
    #[clap(value_parser)]
    pub candidates: Vec<String>,

    /// (file path, optional) The file containing the election description in
    /// JSON format: candidates, rules and ballot sources. For more information
    /// about the file format, read the documentation.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference file containing the expected summary of the
    /// election in JSON format. If provided, tideman will check that the
    /// tabulated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the
    /// election will be written in JSON format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) Ballots to tabulate, one full ranking per record. The
    /// candidates are taken from the positional arguments or from --config,
    /// or inferred from the ballots when neither is given.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the input: csv, msforms or json. See the
    /// documentation for the details of each format.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard
    /// output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
