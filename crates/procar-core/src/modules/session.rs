use super::band::BandModel;
use super::fatband::{
    Fatband, FatbandBandSummary, FatbandPartition, fatband_containing, fatband_info,
    identify_fatbands,
};
use super::fermi::parse_fermi;
use super::procar::parse_procar;
use super::traits::InputStager;
use super::view::{ViewRequest, ViewState, compute_view_state};
use super::window::{WindowOptions, WindowStatistics, window_statistics};
use crate::common::AnalysisConfig;
use crate::common::constants::{FERMI_FILE_NAME, PROCAR_FILE_NAME};
use crate::domain::{EnergyRange, EnergyWindow, FermiLevel, ProcarResult, Selection};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One opened PROCAR/FERMI pair with its derived model and fatbands.
#[derive(Debug)]
pub struct AnalysisSession {
    procar_path: PathBuf,
    model: BandModel,
    partition: FatbandPartition,
    config: AnalysisConfig,
}

impl AnalysisSession {
    /// Stages and parses `procar_name`; a FERMI file that cannot be staged or
    /// read leaves energies relative to an assumed 0.0 eV.
    pub fn open(
        stager: &dyn InputStager,
        procar_name: &str,
        fermi_name: &str,
    ) -> ProcarResult<Self> {
        let procar_path = stager.stage(procar_name)?;
        let parsed = parse_procar(&procar_path)?;
        let fermi = match stager.stage(fermi_name) {
            Ok(path) => parse_fermi(path),
            Err(error) => {
                warn!(%error, "FERMI energy not found; energies are relative to an assumed 0.0 eV");
                FermiLevel::assumed_zero()
            }
        };

        let model = BandModel::from_parsed(parsed, fermi)?;
        let partition = identify_fatbands(model.energies());
        info!(
            path = %procar_path.display(),
            fatbands = partition.fatbands.len(),
            fermi = fermi.energy,
            verified = fermi.is_verified(),
            "analysis session opened"
        );

        Ok(Self {
            procar_path,
            model,
            partition,
            config: AnalysisConfig::default(),
        })
    }

    pub fn open_default(stager: &dyn InputStager) -> ProcarResult<Self> {
        Self::open(stager, PROCAR_FILE_NAME, FERMI_FILE_NAME)
    }

    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    pub fn procar_path(&self) -> &Path {
        &self.procar_path
    }

    pub fn model(&self) -> &BandModel {
        &self.model
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn fermi(&self) -> FermiLevel {
        self.model.fermi()
    }

    pub fn fatbands(&self) -> &[Fatband] {
        &self.partition.fatbands
    }

    pub fn band_ranges(&self) -> &[EnergyRange] {
        &self.partition.band_ranges
    }

    /// Position of the fatband holding the Fermi energy, if any.
    pub fn fermi_fatband(&self) -> Option<usize> {
        fatband_containing(self.fatbands(), self.fermi().energy)
    }

    pub fn fatband_summaries(&self, position: usize) -> Option<Vec<FatbandBandSummary>> {
        self.fatbands().get(position).map(|fatband| {
            fatband_info(&self.model, fatband, self.band_ranges(), self.config.top_n)
        })
    }

    /// Fermi-relative window of the configured half width around E_F.
    pub fn default_window(&self) -> EnergyWindow {
        EnergyWindow::around(0.0, self.config.default_window_half_width)
    }

    pub fn window_statistics(
        &self,
        selection: &Selection,
        relative_window: &EnergyWindow,
    ) -> WindowStatistics {
        window_statistics(
            &self.model,
            selection,
            &relative_window.to_absolute(&self.fermi()),
            &WindowOptions::from(&self.config),
        )
    }

    pub fn view_state(&self, selection: Selection, relative_window: EnergyWindow) -> ViewState {
        let request = ViewRequest::from_config(selection, relative_window, &self.config);
        compute_view_state(&self.model, &request)
    }
}
