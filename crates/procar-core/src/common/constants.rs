//! Shared numeric thresholds and analysis defaults.
//!
//! Kept in one place so the parser, model and window engine agree on the
//! tolerances they compare against.

/// Bands whose energy span is below this are treated as flat.
pub const DEGENERATE_BAND_TOLERANCE: f64 = 1.0e-9;
/// Added to normalisation denominators so constant data maps to zero.
pub const NORMALIZATION_EPSILON: f64 = 1.0e-12;
/// Floor for per-band totals when forming selected fractions.
pub const FRACTION_FLOOR: f64 = 1.0e-12;
/// PROCAR prints weights with three decimals; reported totals may differ from
/// recomputed sums by roughly one unit in the last place per column.
pub const PROCAR_PRINT_RESOLUTION: f64 = 1.0e-3;

pub const DEFAULT_TOP_N: usize = 3;
pub const DEFAULT_HIGHLIGHT_THRESHOLD: f64 = 0.1;
pub const DEFAULT_OTHER_CONTRIBUTOR_LIMIT: usize = 5;
pub const DEFAULT_WINDOW_HALF_WIDTH: f64 = 1.0;
pub const DEFAULT_LINEWIDTH_SCALE: f64 = 2.0;

/// Line widths and alphas are mapped onto `BASE + SPAN * normalized`.
pub const LINE_STYLE_BASE: f64 = 0.2;
pub const LINE_STYLE_SPAN: f64 = 0.8;

/// Spin-orbit coupling doubles the Wannier-function estimate.
pub const SPIN_ORBIT_MULTIPLIER: usize = 2;

pub const PROCAR_FILE_NAME: &str = "PROCAR";
pub const FERMI_FILE_NAME: &str = "FERMI";
