use crate::domain::{OrbitalWeights, ParserResult, ProcarError};

pub(super) const PROCAR_PARSE_PLACEHOLDER: &str = "RUN.PROCAR_PARSE";

/// A tokenized source line together with its 1-based line number.
#[derive(Debug, Clone)]
pub(super) struct SourceLine<'a> {
    pub(super) number: usize,
    pub(super) tokens: Vec<&'a str>,
}

impl SourceLine<'_> {
    fn keyword(&self) -> Option<&str> {
        self.tokens.first().copied()
    }
}

/// Sequential reader over a PROCAR text. Positional header reads use
/// [`LineCursor::line_at`]; block reads advance the cursor.
pub(super) struct LineCursor<'a> {
    source_label: &'a str,
    lines: Vec<&'a str>,
    position: usize,
}

impl<'a> LineCursor<'a> {
    pub(super) fn new(source_label: &'a str, source: &'a str) -> Self {
        Self {
            source_label,
            lines: source.lines().collect(),
            position: 0,
        }
    }

    pub(super) fn line_at(&self, index: usize, expected: &str) -> ParserResult<SourceLine<'a>> {
        self.lines
            .get(index)
            .map(|line| SourceLine {
                number: index + 1,
                tokens: line.split_whitespace().collect(),
            })
            .ok_or_else(|| self.end_of_file_error(expected))
    }

    pub(super) fn seek(&mut self, index: usize) {
        self.position = index.min(self.lines.len());
    }

    pub(super) fn remaining_data_lines(&self) -> usize {
        self.lines[self.position..]
            .iter()
            .filter(|line| !line.trim().is_empty())
            .count()
    }

    /// Next non-blank line; blank separators between blocks are skipped.
    pub(super) fn next_block(&mut self, expected: &str) -> ParserResult<SourceLine<'a>> {
        while let Some(line) = self.lines.get(self.position) {
            if !line.trim().is_empty() {
                break;
            }
            self.position += 1;
        }
        self.next_row(expected)
    }

    /// The very next line, which must carry data.
    pub(super) fn next_row(&mut self, expected: &str) -> ParserResult<SourceLine<'a>> {
        let line = self.line_at(self.position, expected)?;
        self.position += 1;
        if line.tokens.is_empty() {
            return Err(self.error(line.number, format!("expected {expected} but found a blank line")));
        }
        Ok(line)
    }

    pub(super) fn expect_keyword(
        &self,
        line: &SourceLine<'_>,
        keyword: &str,
        expected: &str,
    ) -> ParserResult<()> {
        match line.keyword() {
            Some(found) if found == keyword => Ok(()),
            found => Err(self.error(
                line.number,
                format!(
                    "expected {expected} starting with '{keyword}' but found '{}'",
                    found.unwrap_or_default()
                ),
            )),
        }
    }

    pub(super) fn expect_index(
        &self,
        line: &SourceLine<'_>,
        found: usize,
        expected: usize,
        what: &str,
    ) -> ParserResult<()> {
        if found == expected {
            Ok(())
        } else {
            Err(self.error(
                line.number,
                format!("{what} index {found} out of sequence; expected {expected}"),
            ))
        }
    }

    pub(super) fn usize_token(
        &self,
        line: &SourceLine<'_>,
        offset: usize,
        what: &str,
    ) -> ParserResult<usize> {
        let token = self.token(line, offset, what)?;
        token.parse::<usize>().map_err(|_| {
            self.error(
                line.number,
                format!("{what} token {offset} ('{token}') is not a non-negative integer"),
            )
        })
    }

    pub(super) fn positive_count(
        &self,
        line: &SourceLine<'_>,
        offset: usize,
        what: &str,
    ) -> ParserResult<usize> {
        let value = self.usize_token(line, offset, what)?;
        if value == 0 {
            return Err(self.error(line.number, format!("{what} must be positive, got 0")));
        }
        Ok(value)
    }

    pub(super) fn f64_token(
        &self,
        line: &SourceLine<'_>,
        offset: usize,
        what: &str,
    ) -> ParserResult<f64> {
        let token = self.token(line, offset, what)?;
        parse_f64(token).ok_or_else(|| {
            self.error(
                line.number,
                format!("{what} token {offset} ('{token}') is not a number"),
            )
        })
    }

    /// `label v_1 .. v_norb total`, as printed for ion rows and the `tot` row.
    pub(super) fn weight_row(
        &self,
        line: &SourceLine<'_>,
        orbital_count: usize,
    ) -> ParserResult<OrbitalWeights> {
        let expected_columns = orbital_count + 2;
        if line.tokens.len() != expected_columns {
            return Err(self.error(
                line.number,
                format!(
                    "expected {expected_columns} columns (label, {orbital_count} orbitals, tot) but found {}",
                    line.tokens.len()
                ),
            ));
        }

        let values = (1..=orbital_count)
            .map(|offset| self.f64_token(line, offset, "orbital weight"))
            .collect::<ParserResult<Vec<_>>>()?;
        let total = self.f64_token(line, orbital_count + 1, "aggregate weight")?;
        Ok(OrbitalWeights::new(values, total))
    }

    pub(super) fn error(&self, line_number: usize, message: impl Into<String>) -> ProcarError {
        ProcarError::parse(
            PROCAR_PARSE_PLACEHOLDER,
            format!(
                "PROCAR '{}' line {}: {}",
                self.source_label,
                line_number,
                message.into()
            ),
        )
    }

    pub(super) fn file_error(&self, message: impl Into<String>) -> ProcarError {
        ProcarError::parse(
            PROCAR_PARSE_PLACEHOLDER,
            format!("PROCAR '{}': {}", self.source_label, message.into()),
        )
    }

    fn end_of_file_error(&self, expected: &str) -> ProcarError {
        self.file_error(format!(
            "unexpected end of file after line {} while reading {expected}",
            self.lines.len()
        ))
    }

    fn token<'t>(
        &self,
        line: &SourceLine<'t>,
        offset: usize,
        what: &str,
    ) -> ParserResult<&'t str> {
        line.tokens.get(offset).copied().ok_or_else(|| {
            self.error(
                line.number,
                format!(
                    "missing {what} at token {offset}; line has {} tokens",
                    line.tokens.len()
                ),
            )
        })
    }
}

fn parse_f64(token: &str) -> Option<f64> {
    token
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::LineCursor;

    #[test]
    fn block_reads_skip_blank_separators_but_row_reads_do_not() {
        let source = "first\n\n   \nband 1\n\nion\n";
        let mut cursor = LineCursor::new("mem", source);

        let first = cursor.next_block("title").expect("first line should read");
        assert_eq!(first.number, 1);

        let band = cursor.next_block("band").expect("blank lines should be skipped");
        assert_eq!(band.number, 4);
        assert_eq!(band.tokens, vec!["band", "1"]);

        let error = cursor
            .next_row("ion row")
            .expect_err("blank row should be rejected");
        assert!(error.message().contains("line 5"));
    }

    #[test]
    fn weight_row_requires_exact_column_count() {
        let source = "    1  0.100  0.200  0.300\n";
        let cursor = LineCursor::new("mem", source);
        let line = cursor.line_at(0, "ion row").expect("line should exist");

        let error = cursor
            .weight_row(&line, 3)
            .expect_err("missing tot column should fail");
        assert!(error.message().contains("expected 5 columns"));

        let weights = cursor.weight_row(&line, 2).expect("two orbitals plus tot");
        assert_eq!(weights.values(), &[0.1, 0.2]);
        assert_eq!(weights.total(), 0.3);
    }

    #[test]
    fn numeric_tokens_reject_fortran_overflow_markers() {
        let source = "band 1 # energy ******** # occ. 1.0\n";
        let cursor = LineCursor::new("mem", source);
        let line = cursor.line_at(0, "band").expect("line should exist");

        let error = cursor
            .f64_token(&line, 4, "band energy")
            .expect_err("overflow marker should fail");
        assert!(error.message().contains("'********'"));
    }
}
