// Primitives for reading the CSV exports of the signature forms.

use crate::sig::{io_common::clean_cell, *};

pub fn read_csv_signatures(path: &str, cfs: &FileSource) -> SigResult<Vec<ParsedSignature>> {
    let race_idx = cfs.race_column_index()?;
    let candidate_idx = cfs.candidate_column_index()?;
    let voter_idx = cfs.voter_column_index()?;

    let mut res: Vec<ParsedSignature> = Vec::new();
    let (records, row_offset) = get_records(path, cfs)?;

    for (idx, line_r) in records.enumerate() {
        let lineno = idx + row_offset;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        debug!("read_csv_signatures: lineno: {:?} row: {:?}", lineno, line);

        // A missing cell is kept as an empty field here; the normalizer
        // decides whether the row is usable.
        let get = |col_idx: usize| -> String {
            line.get(col_idx - 1).map(clean_cell).unwrap_or_default()
        };
        res.push(ParsedSignature {
            lineno,
            voter_id: get(voter_idx),
            race: get(race_idx),
            candidate: get(candidate_idx),
        });
    }
    Ok(res)
}

fn get_records(
    path: &str,
    cfs: &FileSource,
) -> SigResult<(csv::StringRecordsIntoIter<std::fs::File>, usize)> {
    let first_row = cfs.first_row_index()?;
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu {
            path: path.to_string(),
        })?;
    let mut records = rdr.into_records();
    // The index starts at 1 to respect most conventions in the spreadsheet world.
    for _ in 1..first_row {
        _ = records.next();
    }
    Ok((records, first_row))
}
