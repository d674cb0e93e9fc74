// Reader for ranking-widget exports in Excel (.xlsx) format, as produced by
// Microsoft Forms and Google Forms.

use calamine::{open_workbook, Reader, Xlsx};
use log::debug;
use snafu::prelude::*;

use crate::tideman::{io_common::make_default_id, *};

/// Reads one ballot per row. The ranking widget stores the whole ranking in
/// a single cell, as `;`-separated candidate names in preference order. The
/// first row is the header.
pub fn read_msforms_ranking(path: String, cfs: &FileSource) -> TidemanResult<Vec<ParsedBallot>> {
    let default_id = make_default_id(&path);

    let wrange = get_range(&path)?;
    let header = wrange.rows().next().context(EmptyExcelSnafu {})?;
    debug!("read_msforms_ranking: header: {:?}", header);
    let start_range = cfs.first_vote_column_index()?;

    let mut iter = wrange.rows();
    iter.next();
    let mut res: Vec<ParsedBallot> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let cell = row.get(start_range).context(EmptyExcelSnafu {})?;
        let choices: Vec<String> = match cell {
            calamine::DataType::String(s) => {
                s.split(';').map(|c| c.trim().to_string()).collect()
            }
            calamine::DataType::Empty => Vec::new(),
            _ => {
                return Err(TidemanError::ExcelWrongCellType {
                    lineno: idx as u64,
                    content: format!("{:?}", row),
                });
            }
        };
        debug!("read_msforms_ranking: idx: {:?} choices: {:?}", idx, &choices);

        res.push(ParsedBallot {
            // Rows are numbered from 2: the header is row 1.
            id: Some(default_id(idx + 2)),
            choices,
        });
    }
    Ok(res)
}

fn get_range(path: &str) -> TidemanResult<calamine::Range<calamine::DataType>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu {
        path: path.to_string(),
    })?;
    workbook
        .worksheet_range_at(0)
        .context(EmptyExcelSnafu {})?
        .context(OpeningExcelSnafu {
            path: path.to_string(),
        })
}
