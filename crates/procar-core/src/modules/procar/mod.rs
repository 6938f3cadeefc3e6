//! Positional reader for VASP `PROCAR` files.
//!
//! Layout: line 1 is the title, line 2 carries the k-point, band and ion
//! counts at tokens 3, 7 and 11, and line 8 lists the orbital columns between
//! `ion` and `tot`. The rest of the file repeats one block per k-point, each
//! holding one block per band with a row per ion and a closing `tot` row.

mod parser;

#[cfg(test)]
pub(crate) mod fixtures;

use crate::domain::{
    BandFileHeader, BandRecord, IonRecord, KPointRecord, ParsedBandFile, ParserResult, ProcarError,
};
use parser::{LineCursor, SourceLine};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

const TITLE_LINE: usize = 0;
const COUNTS_LINE: usize = 1;
const ORBITAL_LINE: usize = 7;
const FIRST_BLOCK_LINE: usize = 2;

const KPOINT_COUNT_TOKEN: usize = 3;
const BAND_COUNT_TOKEN: usize = 7;
const ION_COUNT_TOKEN: usize = 11;

const KPOINT_INDEX_TOKEN: usize = 1;
const KPOINT_COORDINATE_TOKENS: [usize; 3] = [3, 4, 5];
const KPOINT_WEIGHT_TOKEN: usize = 8;

const BAND_INDEX_TOKEN: usize = 1;
const BAND_ENERGY_TOKEN: usize = 4;
const BAND_OCCUPANCY_TOKEN: usize = 7;

pub fn parse_procar(path: impl AsRef<Path>) -> ParserResult<ParsedBandFile> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| {
        ProcarError::io_system(
            "IO.PROCAR_READ",
            format!("failed to read PROCAR '{}': {}", path.display(), source),
        )
    })?;

    let parsed = parse_procar_source(&path.display().to_string(), &source)?;
    info!(
        path = %path.display(),
        kpoints = parsed.kpoint_count(),
        bands = parsed.band_count(),
        ions = parsed.ion_count(),
        orbitals = parsed.orbitals().len(),
        "parsed PROCAR"
    );
    Ok(parsed)
}

/// Parses PROCAR text already in memory. `source_label` names the origin in
/// error messages.
pub fn parse_procar_source(source_label: &str, source: &str) -> ParserResult<ParsedBandFile> {
    let mut cursor = LineCursor::new(source_label, source);
    let header = parse_header(&cursor)?;

    cursor.seek(FIRST_BLOCK_LINE);
    let required = required_data_lines(&header);
    let available = cursor.remaining_data_lines();
    if available < required {
        return Err(cursor.file_error(format!(
            "truncated: header declares {} k-points x {} bands x {} ions which needs at least {} data lines, but only {} remain",
            header.kpoint_count, header.band_count, header.ion_count, required, available
        )));
    }

    let kpoints = (1..=header.kpoint_count)
        .map(|k_index| parse_kpoint(&mut cursor, &header, k_index))
        .collect::<ParserResult<Vec<_>>>()?;

    let trailing = cursor.remaining_data_lines();
    if trailing > 0 {
        warn!(
            source = source_label,
            trailing_lines = trailing,
            "ignoring content after the last declared k-point block; only the first spin channel is read"
        );
    }

    Ok(ParsedBandFile { header, kpoints })
}

/// Non-blank lines the declared counts need: one k-point header per k-point
/// and, per band, a band header, a column header, the ion rows and `tot`.
fn required_data_lines(header: &BandFileHeader) -> usize {
    let per_band = header.ion_count.saturating_add(3);
    let per_kpoint = header
        .band_count
        .saturating_mul(per_band)
        .saturating_add(1);
    header.kpoint_count.saturating_mul(per_kpoint)
}

fn parse_header(cursor: &LineCursor<'_>) -> ParserResult<BandFileHeader> {
    let title = cursor.line_at(TITLE_LINE, "title")?.tokens.join(" ");

    let counts = cursor.line_at(COUNTS_LINE, "k-point/band/ion counts")?;
    let kpoint_count = cursor.positive_count(&counts, KPOINT_COUNT_TOKEN, "k-point count")?;
    let band_count = cursor.positive_count(&counts, BAND_COUNT_TOKEN, "band count")?;
    let ion_count = cursor.positive_count(&counts, ION_COUNT_TOKEN, "ion count")?;

    let orbital_line = cursor.line_at(ORBITAL_LINE, "orbital column header")?;
    let orbitals = orbital_labels(cursor, &orbital_line)?;

    Ok(BandFileHeader {
        title,
        kpoint_count,
        band_count,
        ion_count,
        orbitals,
    })
}

fn orbital_labels(cursor: &LineCursor<'_>, line: &SourceLine<'_>) -> ParserResult<Vec<String>> {
    cursor.expect_keyword(line, "ion", "orbital column header")?;
    if line.tokens.len() < 3 || line.tokens.last() != Some(&"tot") {
        return Err(cursor.error(
            line.number,
            "orbital column header must list at least one orbital between 'ion' and 'tot'",
        ));
    }

    let labels = &line.tokens[1..line.tokens.len() - 1];
    let mut seen = BTreeSet::new();
    for label in labels {
        if !seen.insert(*label) {
            return Err(cursor.error(
                line.number,
                format!("duplicate orbital label '{label}'"),
            ));
        }
    }

    Ok(labels.iter().map(|label| label.to_string()).collect())
}

fn parse_kpoint(
    cursor: &mut LineCursor<'_>,
    header: &BandFileHeader,
    expected_index: usize,
) -> ParserResult<KPointRecord> {
    let line = cursor.next_block("k-point header")?;
    cursor.expect_keyword(&line, "k-point", "k-point header")?;
    let index = cursor.usize_token(&line, KPOINT_INDEX_TOKEN, "k-point index")?;
    cursor.expect_index(&line, index, expected_index, "k-point")?;

    let mut coordinates = [0.0; 3];
    for (coordinate, offset) in coordinates.iter_mut().zip(KPOINT_COORDINATE_TOKENS) {
        *coordinate = cursor.f64_token(&line, offset, "k-point coordinate")?;
    }
    let weight = cursor.f64_token(&line, KPOINT_WEIGHT_TOKEN, "k-point weight")?;

    let bands = (1..=header.band_count)
        .map(|b_index| parse_band(cursor, header, b_index))
        .collect::<ParserResult<Vec<_>>>()?;

    debug!(kpoint = index, "parsed k-point block");
    Ok(KPointRecord {
        index,
        coordinates,
        weight,
        bands,
    })
}

fn parse_band(
    cursor: &mut LineCursor<'_>,
    header: &BandFileHeader,
    expected_index: usize,
) -> ParserResult<BandRecord> {
    let line = cursor.next_block("band header")?;
    cursor.expect_keyword(&line, "band", "band header")?;
    let index = cursor.usize_token(&line, BAND_INDEX_TOKEN, "band index")?;
    cursor.expect_index(&line, index, expected_index, "band")?;
    let energy = cursor.f64_token(&line, BAND_ENERGY_TOKEN, "band energy")?;
    let occupancy = cursor.f64_token(&line, BAND_OCCUPANCY_TOKEN, "band occupancy")?;

    let column_header = cursor.next_block("orbital column header")?;
    let labels = orbital_labels(cursor, &column_header)?;
    if labels != header.orbitals {
        return Err(cursor.error(
            column_header.number,
            format!(
                "orbital columns [{}] differ from the file header [{}]",
                labels.join(" "),
                header.orbitals.join(" ")
            ),
        ));
    }

    let orbital_count = header.orbital_count();
    let mut ions = Vec::with_capacity(header.ion_count);
    for i_index in 1..=header.ion_count {
        let row = cursor.next_row("ion weight row")?;
        let ion_index = cursor.usize_token(&row, 0, "ion index")?;
        cursor.expect_index(&row, ion_index, i_index, "ion")?;
        ions.push(IonRecord {
            index: ion_index,
            weights: cursor.weight_row(&row, orbital_count)?,
        });
    }

    let total_row = cursor.next_row("band total row")?;
    cursor.expect_keyword(&total_row, "tot", "band total row")?;
    let total = cursor.weight_row(&total_row, orbital_count)?;

    Ok(BandRecord {
        index,
        energy,
        occupancy,
        ions,
        total,
    })
}
