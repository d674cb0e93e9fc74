use clap::Parser;
use snafu::ErrorCompat;

mod args;
mod tideman;

use crate::tideman::TidemanError;

fn main() {
    let args = args::Args::parse();

    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::init();
    }

    if let Err(e) = tideman::run_app(&args) {
        eprintln!("{}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        // Exit codes follow the historical command-line contract.
        let code = match e {
            TidemanError::TooManyCandidates { .. } => 2,
            TidemanError::InvalidVote { .. } => 3,
            _ => 1,
        };
        std::process::exit(code);
    }
}
