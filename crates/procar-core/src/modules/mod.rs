pub mod band;
pub mod fatband;
pub mod fermi;
pub mod procar;
pub mod report;
pub mod selection;
pub mod serialization;
pub mod session;
pub mod view;
pub mod window;

mod traits;

pub use band::{BandModel, PerKpointWeights, ResolvedSelection};
pub use fatband::{
    BandContribution, Fatband, FatbandBandSummary, FatbandPartition, band_energy_ranges,
    fatband_containing, fatband_info, find_band_summary, identify_fatbands,
};
pub use fermi::{FermiUnavailable, parse_fermi, read_fermi};
pub use procar::{parse_procar, parse_procar_source};
pub use selection::{build_selection, expand_orbital_patterns, parse_ion_list};
pub use session::AnalysisSession;
pub use traits::{InputStager, LocalDirectory};
pub use view::{BandStyle, SegmentStyle, ViewRequest, ViewState, compute_view_state};
pub use window::{
    WindowOptions, WindowStatistics, WindowWeights, approximate_window_weights, bands_in_window,
    exact_window_weights, other_contributors, overlap_fraction, wannier_function_count,
    window_statistics, window_weights,
};
