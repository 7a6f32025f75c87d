/// Speed of light in m/s, used to turn the reference frequency into a wavelength
pub const SPEED_OF_LIGHT_SI: f64 = 299_792_458.0;

/// Temperature given to species that do not set one (normalised units)
pub const DEFAULT_TEMPERATURE: f64 = 1e-10;

// Timesteps between two progress lines of the engine
pub const DEFAULT_PRINT_EVERY: u32 = 10;

/// Default precision of the scalar diagnostic output
pub const DEFAULT_SCALAR_PRECISION: u32 = 10;

/// Grid fields a field diagnostic may dump.
///
/// `Jx`, `Jy`, `Jz` and `Rho` also exist per species as `Jx_<species>`.
pub const FIELD_NAMES: &[&str] = &[
    "Ex", "Ey", "Ez", "Bx", "By", "Bz", "Bx_m", "By_m", "Bz_m", "Jx", "Jy", "Jz", "Rho",
];

/// Fields that have a per-species counterpart.
pub const SPECIES_FIELD_NAMES: &[&str] = &["Jx", "Jy", "Jz", "Rho"];

/// Fields a probe samples, in output order
pub const PROBE_FIELDS: &[&str] = &["Ex", "Ey", "Ez", "Bx", "By", "Bz", "Jx", "Jy", "Jz", "Rho"];

/// Geometries the engine can run.
pub const SUPPORTED_GEOMETRIES: &[&str] = &["1d3v", "2d3v"];

/// Interpolation orders the projector supports.
pub const INTERPOLATION_ORDERS: &[u32] = &[2, 4];
