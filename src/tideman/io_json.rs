// Reader for ballots in this program's native JSON interchange form: an
// array of ballots, each an array of candidate names in preference order.

use std::fs;

use log::debug;
use snafu::prelude::*;

use crate::tideman::{io_common::make_default_id, *};

pub fn read_json_ballots(path: String) -> TidemanResult<Vec<ParsedBallot>> {
    let default_id = make_default_id(&path);

    let contents = fs::read_to_string(&path).context(OpeningJsonSnafu {})?;
    let rankings: Vec<Vec<String>> =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_json_ballots: {:?} ballots in {:?}", rankings.len(), path);

    Ok(rankings
        .into_iter()
        .enumerate()
        .map(|(idx, choices)| ParsedBallot {
            id: Some(default_id(idx + 1)),
            choices,
        })
        .collect())
}
