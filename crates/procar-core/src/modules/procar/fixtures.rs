use super::parse_procar_source;
use crate::domain::ParsedBandFile;
use std::fmt::Write;

pub(crate) struct BandFixture {
    pub(crate) energy: f64,
    pub(crate) occupancy: f64,
    /// One row per ion, one value per orbital column.
    pub(crate) ions: Vec<Vec<f64>>,
}

pub(crate) struct KpointFixture {
    pub(crate) coordinates: [f64; 3],
    pub(crate) weight: f64,
    pub(crate) bands: Vec<BandFixture>,
}

/// Renders fixtures in the VASP `PROCAR lm decomposed` layout.
pub(crate) fn render_procar(orbitals: &[&str], kpoints: &[KpointFixture]) -> String {
    let band_count = kpoints.first().map_or(0, |kpoint| kpoint.bands.len());
    let ion_count = kpoints
        .first()
        .and_then(|kpoint| kpoint.bands.first())
        .map_or(0, |band| band.ions.len());

    let mut text = String::new();
    text.push_str("PROCAR lm decomposed\n");
    let _ = writeln!(
        text,
        "# of k-points:  {:>3}         # of bands:  {:>3}         # of ions:  {:>3}",
        kpoints.len(),
        band_count,
        ion_count
    );

    let column_header = format!("ion {} tot", orbitals.join(" "));
    for (k_index, kpoint) in kpoints.iter().enumerate() {
        text.push('\n');
        let _ = writeln!(
            text,
            " k-point {:>5} :    {:.8} {:.8} {:.8}     weight = {:.8}",
            k_index + 1,
            kpoint.coordinates[0],
            kpoint.coordinates[1],
            kpoint.coordinates[2],
            kpoint.weight
        );

        for (b_index, band) in kpoint.bands.iter().enumerate() {
            text.push('\n');
            let _ = writeln!(
                text,
                "band {:>5} # energy {:>14.8} # occ.  {:.8}",
                b_index + 1,
                band.energy,
                band.occupancy
            );
            text.push('\n');
            text.push_str(&column_header);
            text.push('\n');

            let mut column_totals = vec![0.0; orbitals.len()];
            for (i_index, ion) in band.ions.iter().enumerate() {
                let _ = write!(text, "{:>5}", i_index + 1);
                for (column, value) in ion.iter().enumerate() {
                    let _ = write!(text, " {value:>6.3}");
                    column_totals[column] += value;
                }
                let _ = writeln!(text, " {:>6.3}", ion.iter().sum::<f64>());
            }
            text.push_str("tot  ");
            for value in &column_totals {
                let _ = write!(text, " {value:>6.3}");
            }
            let _ = writeln!(text, " {:>6.3}", column_totals.iter().sum::<f64>());
        }
        text.push('\n');
    }

    text
}

fn constant_weight_band(energies: &[f64], ions: &[Vec<f64>]) -> Vec<BandFixture> {
    energies
        .iter()
        .map(|energy| BandFixture {
            energy: *energy,
            occupancy: 1.0,
            ions: ions.to_vec(),
        })
        .collect()
}

fn kpoints_from_bands(per_band: Vec<Vec<BandFixture>>, kpoint_count: usize) -> Vec<KpointFixture> {
    let mut per_band = per_band
        .into_iter()
        .map(|bands| bands.into_iter())
        .collect::<Vec<_>>();
    (0..kpoint_count)
        .map(|k_index| KpointFixture {
            coordinates: [0.5 * k_index as f64, 0.0, -0.25 * k_index as f64],
            weight: 1.0 / kpoint_count as f64,
            bands: per_band
                .iter_mut()
                .filter_map(|band| band.next())
                .collect(),
        })
        .collect()
}

/// Two k-points, two bands, one ion, orbitals `s` and `p`. Band 1 sits at
/// -1.0/-0.8 eV with pure `s` weight, band 2 at 0.5/0.6 eV with pure `p`.
pub(crate) fn two_band_source() -> String {
    let bands = vec![
        constant_weight_band(&[-1.0, -0.8], &[vec![1.0, 0.0]]),
        constant_weight_band(&[0.5, 0.6], &[vec![0.0, 1.0]]),
    ];
    render_procar(&["s", "p"], &kpoints_from_bands(bands, 2))
}

/// Three k-points, four bands, two ions, orbitals `s`, `p`, `d`. Bands 2 and 3
/// overlap in energy; band 3 carries a k-dependent `p` weight on ion 2.
pub(crate) fn overlapping_source() -> String {
    let band_three = [0.7, 0.6, 0.5]
        .iter()
        .zip([-0.2, 0.3, 0.8])
        .map(|(p_weight, energy)| BandFixture {
            energy,
            occupancy: 0.0,
            ions: vec![vec![0.0, 0.0, 0.1], vec![0.0, *p_weight, 0.0]],
        })
        .collect();

    let bands = vec![
        constant_weight_band(&[-5.0, -4.5, -4.0], &[vec![0.6, 0.0, 0.0], vec![0.2, 0.0, 0.0]]),
        constant_weight_band(&[-1.0, -0.5, 0.0], &[vec![0.0, 0.5, 0.0], vec![0.0, 0.0, 0.3]]),
        band_three,
        constant_weight_band(&[2.0, 2.5, 3.0], &[vec![0.25, 0.0, 0.0], vec![0.25, 0.0, 0.0]]),
    ];
    render_procar(&["s", "p", "d"], &kpoints_from_bands(bands, 3))
}

pub(crate) fn two_band_file() -> ParsedBandFile {
    parse_procar_source("fixtures/two-band/PROCAR", &two_band_source())
        .expect("two-band fixture should parse")
}

pub(crate) fn overlapping_file() -> ParsedBandFile {
    parse_procar_source("fixtures/overlapping/PROCAR", &overlapping_source())
        .expect("overlapping fixture should parse")
}
