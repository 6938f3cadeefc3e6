use crate::domain::{ProcarError, ProcarResult, Selection};
use crate::modules::band::BandModel;
use globset::Glob;
use std::collections::BTreeSet;
use tracing::debug;

const SELECTION_ION_PLACEHOLDER: &str = "INPUT.SELECTION_ION";
const SELECTION_ORBITAL_PLACEHOLDER: &str = "INPUT.SELECTION_ORBITAL";

impl Selection {
    /// Every ion and orbital of `model`.
    pub fn everything(model: &BandModel) -> Self {
        Self::new(1..=model.ion_count(), model.orbitals().iter().cloned())
    }
}

/// Parses `"1-4,7"` style ion lists into 1-based ion numbers within
/// `1..=ion_count`. `"all"` selects every ion.
pub fn parse_ion_list(text: &str, ion_count: usize) -> ProcarResult<BTreeSet<usize>> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("all") {
        return Ok((1..=ion_count).collect());
    }

    let mut ions = BTreeSet::new();
    for item in trimmed.split(',').map(str::trim) {
        if item.is_empty() {
            return Err(ion_error(format!("empty entry in ion list '{text}'")));
        }
        let (first, last) = match item.split_once('-') {
            Some((start, end)) => (parse_ion(start, text)?, parse_ion(end, text)?),
            None => {
                let ion = parse_ion(item, text)?;
                (ion, ion)
            }
        };
        if first > last {
            return Err(ion_error(format!("descending ion range '{item}' in '{text}'")));
        }
        if first == 0 || last > ion_count {
            return Err(ion_error(format!(
                "ion range '{item}' is outside 1..={ion_count}"
            )));
        }
        ions.extend(first..=last);
    }
    Ok(ions)
}

fn parse_ion(token: &str, text: &str) -> ProcarResult<usize> {
    token
        .trim()
        .parse::<usize>()
        .map_err(|_| {
            ion_error(format!(
                "'{}' in ion list '{text}' is not an ion number",
                token.trim()
            ))
        })
}

fn ion_error(message: String) -> ProcarError {
    ProcarError::input_validation(SELECTION_ION_PLACEHOLDER, message)
}

/// Expands orbital labels or glob patterns (`d*`, `p?`) against `labels`.
/// Every pattern has to match at least one label.
pub fn expand_orbital_patterns<S: AsRef<str>>(
    patterns: &[S],
    labels: &[String],
) -> ProcarResult<BTreeSet<String>> {
    let mut orbitals = BTreeSet::new();
    for pattern in patterns {
        let pattern = pattern.as_ref().trim();
        let matcher = Glob::new(pattern)
            .map_err(|source| {
                ProcarError::input_validation(
                    SELECTION_ORBITAL_PLACEHOLDER,
                    format!("invalid orbital pattern '{pattern}': {source}"),
                )
            })?
            .compile_matcher();

        let before = orbitals.len();
        let mut matched = false;
        for label in labels.iter().filter(|label| matcher.is_match(label.as_str())) {
            matched = true;
            orbitals.insert(label.clone());
        }
        if !matched {
            return Err(ProcarError::input_validation(
                SELECTION_ORBITAL_PLACEHOLDER,
                format!(
                    "orbital pattern '{pattern}' matches none of [{}]",
                    labels.join(", ")
                ),
            ));
        }
        debug!(pattern, added = orbitals.len() - before, "expanded orbital pattern");
    }
    Ok(orbitals)
}

/// Builds a selection from CLI-style text. `None` on either side selects
/// everything on that axis.
pub fn build_selection<S: AsRef<str>>(
    model: &BandModel,
    ions: Option<&str>,
    orbital_patterns: Option<&[S]>,
) -> ProcarResult<Selection> {
    let ions = match ions {
        Some(text) => parse_ion_list(text, model.ion_count())?,
        None => (1..=model.ion_count()).collect(),
    };
    let orbitals = match orbital_patterns {
        Some(patterns) => expand_orbital_patterns(patterns, model.orbitals())?,
        None => model.orbitals().iter().cloned().collect(),
    };
    Ok(Selection { ions, orbitals })
}

#[cfg(test)]
mod tests {
    use super::{build_selection, expand_orbital_patterns, parse_ion_list};
    use crate::domain::{FermiLevel, ProcarErrorCategory, Selection};
    use crate::modules::band::BandModel;
    use crate::modules::procar::fixtures::overlapping_file;

    fn labels() -> Vec<String> {
        ["s", "py", "pz", "px", "dxy", "dyz", "dz2", "dxz", "x2-y2"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn ion_lists_accept_ranges_and_singles() {
        let ions = parse_ion_list("1-3, 7,2", 8).expect("ion list should parse");
        assert_eq!(ions.into_iter().collect::<Vec<_>>(), vec![1, 2, 3, 7]);
        assert_eq!(parse_ion_list("all", 3).expect("all should parse").len(), 3);
    }

    #[test]
    fn ion_lists_reject_out_of_range_and_garbage() {
        for text in ["0", "1-9", "3-1", "a", "1,,2"] {
            let error = parse_ion_list(text, 8).expect_err("ion list should be rejected");
            assert_eq!(error.category(), ProcarErrorCategory::InputValidationError);
            assert_eq!(error.placeholder(), "INPUT.SELECTION_ION");
        }
    }

    #[test]
    fn orbital_globs_expand_against_labels() {
        let orbitals =
            expand_orbital_patterns(&["d*", "s"], &labels()).expect("patterns should expand");
        assert_eq!(
            orbitals.into_iter().collect::<Vec<_>>(),
            vec!["dxy", "dxz", "dyz", "dz2", "s"]
        );

        let p_orbitals =
            expand_orbital_patterns(&["p?"], &labels()).expect("pattern should expand");
        assert_eq!(p_orbitals.len(), 3);
    }

    #[test]
    fn orbital_pattern_matching_nothing_is_rejected() {
        let error = expand_orbital_patterns(&["f*"], &labels())
            .expect_err("unmatched pattern should fail");
        assert_eq!(error.placeholder(), "INPUT.SELECTION_ORBITAL");
        assert!(error.message().contains("'f*'"));
    }

    #[test]
    fn missing_axes_default_to_everything() {
        let model = BandModel::from_parsed(overlapping_file(), FermiLevel::default())
            .expect("overlapping fixture should build a model");

        let selection = build_selection::<&str>(&model, None, None)
            .expect("default selection should build");
        assert_eq!(selection, Selection::everything(&model));
        assert_eq!(selection.ions.len(), 2);
        assert_eq!(selection.orbitals.len(), 3);

        let narrowed = build_selection(&model, Some("2"), Some(&["p"][..]))
            .expect("narrowed selection should build");
        assert_eq!(narrowed, Selection::new([2], ["p"]));
    }
}
