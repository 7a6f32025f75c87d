use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

use crate::{
    builder::build,
    constants::*,
    error::DeckError,
    eval::evaluate,
    lexer::lex,
    parser::parse,
    profiles::Profile,
    tags::*,
};

/// A validated input deck.
///
/// Built once by [`load_str`], [`read_deck`] or [`read_toml`] and never
/// mutated afterwards. Every density profile is resolved against the box.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Deck {
    pub main: Main,
    #[serde(default)]
    pub species: Vec<Species>,
    #[serde(default)]
    pub collisions: Vec<Collisions>,
    #[serde(default)]
    pub diag_fields: Vec<DiagFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diag_scalar: Option<DiagScalar>,
    #[serde(default)]
    pub diag_particles: Vec<DiagParticles>,
    #[serde(default)]
    pub diag_probes: Vec<DiagProbe>,
}

/// Global simulation settings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Main {
    pub geometry: Geometry,
    /// Patches per spatial dimension (powers of two)
    pub number_of_patches: Vec<u32>,
    pub interpolation_order: u32,
    pub timestep: f64,
    pub sim_time: f64,
    /// Time before which the fields are not updated
    pub time_fields_frozen: f64,
    pub cell_length: Vec<f64>,
    pub sim_length: Vec<f64>,
    /// One tag for both sides or one per side
    pub bc_em_type_x: Vec<EmBoundary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bc_em_type_y: Vec<EmBoundary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u64>,
    /// Reference angular frequency in rad/s; 0 when the deck stays in normalised units
    #[serde(rename = "referenceAngularFrequency_SI")]
    pub reference_angular_frequency_si: f64,
    pub print_every: u32,
}

/// `<n>d<m>v`: `n` field dimensions, `m` velocity dimensions.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub struct Geometry {
    pub field_dims: usize,
    pub velocity_dims: usize,
}

/// A population of macro-particles.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Species {
    pub species_type: String,
    #[serde(rename = "initPosition_type")]
    pub init_position: PositionInit,
    #[serde(rename = "initMomentum_type")]
    pub init_momentum: MomentumInit,
    pub ionization_model: IonizationModel,
    pub dynamics_type: Dynamics,
    pub n_part_per_cell: u32,
    pub mass: f64,
    pub charge: f64,
    pub density: Density,
    /// In units of c
    pub mean_velocity: [f64; 3],
    pub temperature: [f64; 3],
    pub time_frozen: f64,
    /// 0 for electrons
    pub atomic_number: u32,
    /// Particle tracking interval in timesteps; 0 leaves the species untracked.
    #[serde(default)]
    pub track_every: u32,
    pub bc_part_type_west: ParticleBoundary,
    pub bc_part_type_east: ParticleBoundary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bc_part_type_south: Option<ParticleBoundary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bc_part_type_north: Option<ParticleBoundary>,
}

/// Which density the deck gave (`charge_density` or `nb_density`) and its profile.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Density {
    pub kind: DensityKind,
    pub profile: Profile,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DensityKind {
    Charge,
    Number,
}

impl DensityKind {
    /// Deck key carrying this density.
    pub fn key(&self) -> &'static str {
        match self {
            DensityKind::Charge => "charge_density",
            DensityKind::Number => "nb_density",
        }
    }
}

/// Binary collisions between every species of `species1` and every species of `species2`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Collisions {
    pub species1: Vec<String>,
    pub species2: Vec<String>,
    /// `<= 0` lets the engine compute it
    pub coulomb_log: f64,
    pub debug_every: u32,
    pub ionizing: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DiagFields {
    pub every: u32,
    pub time_average: u32,
    /// Empty means every field
    #[serde(default)]
    pub fields: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DiagScalar {
    pub every: u32,
    pub precision: u32,
    /// Empty means every scalar
    #[serde(default)]
    pub vars: Vec<String>,
}

/// Particle histogram.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DiagParticles {
    pub output: ParticleOutput,
    pub every: u32,
    pub time_average: u32,
    pub species: Vec<String>,
    pub axes: Vec<HistogramAxis>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HistogramAxis {
    pub variable: AxisVariable,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub bin_count: u32,
    #[serde(default)]
    pub logscale: bool,
    /// Particles outside the bounds go to the edge bins instead of being dropped
    #[serde(default)]
    pub edge_inclusive: bool,
}

/// Field probe: a point, a line or a mesh of sampling points.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DiagProbe {
    pub every: u32,
    pub pos: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos_first: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos_second: Option<Vec<f64>>,
    /// Points along each extra position vector
    #[serde(default)]
    pub number: Vec<u32>,
    /// Empty means every probe field
    #[serde(default)]
    pub fields: Vec<String>,
}

impl Geometry {
    /// Parse a geometry tag such as `"2d3v"`.
    ///
    /// NOTE: compiles the regex on every call; a deck has a single geometry.
    pub fn parse(tag: &str) -> Result<Self, String> {
        let pattern = Regex::new(r"^([1-3])d([1-3])v$").map_err(|e| e.to_string())?;
        let Some(caps) = pattern.captures(tag) else {
            return Err(format!("\"{tag}\" is not of the form <n>d<m>v"));
        };
        if !SUPPORTED_GEOMETRIES.contains(&tag) {
            return Err(format!(
                "\"{tag}\" is not supported (expected one of {})",
                SUPPORTED_GEOMETRIES.join(", ")
            ));
        }
        // both groups are a single digit
        let digit = |i: usize| caps[i].parse::<usize>().map_err(|e| e.to_string());
        Ok(Geometry {
            field_dims: digit(1)?,
            velocity_dims: digit(2)?,
        })
    }
}

impl Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}v", self.field_dims, self.velocity_dims)
    }
}

impl TryFrom<String> for Geometry {
    type Error = String;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        Geometry::parse(&tag)
    }
}

impl From<Geometry> for String {
    fn from(geometry: Geometry) -> Self {
        geometry.to_string()
    }
}

impl Main {
    /// Number of spatial dimensions.
    pub fn n_space(&self) -> usize {
        self.geometry.field_dims
    }

    /// Cells per dimension, `sim_length / cell_length` rounded to the nearest integer.
    pub fn cells(&self) -> Vec<u64> {
        self.sim_length
            .iter()
            .zip(&self.cell_length)
            .map(|(l, dx)| (l / dx).round() as u64)
            .collect()
    }

    /// Number of timesteps the run takes.
    pub fn n_time(&self) -> u64 {
        (self.sim_time / self.timestep).round() as u64
    }

    /// Wavelength matching the reference frequency, in metres.
    pub fn reference_wavelength_si(&self) -> Option<f64> {
        (self.reference_angular_frequency_si > 0.0)
            .then(|| 2.0 * std::f64::consts::PI * SPEED_OF_LIGHT_SI / self.reference_angular_frequency_si)
    }
}

impl Species {
    /// Whether a track diagnostic follows this species.
    pub fn is_tracked(&self) -> bool {
        self.track_every > 0
    }

    /// Density at `position` in normalised units.
    pub fn density_at(&self, position: &[f64]) -> f64 {
        self.density.profile.evaluate(position)
    }
}

impl Collisions {
    /// Both groups hold the same species.
    pub fn is_intra(&self) -> bool {
        self.species1.len() == self.species2.len()
            && self.species1.iter().all(|s| self.species2.contains(s))
            && self.species2.iter().all(|s| self.species1.contains(s))
    }

    /// The engine computes the Coulomb logarithm itself.
    pub fn auto_coulomb_log(&self) -> bool {
        self.coulomb_log <= 0.0
    }
}

impl DiagProbe {
    /// 0 for a point, 1 for a line, 2 for a mesh.
    pub fn dimension(&self) -> usize {
        usize::from(self.pos_first.is_some()) + usize::from(self.pos_second.is_some())
    }
}

impl Deck {
    /// Position of the species called `name` in declaration order.
    pub fn species_index(&self, name: &str) -> Option<usize> {
        self.species.iter().position(|s| s.species_type == name)
    }

    pub fn n_space(&self) -> usize {
        self.main.n_space()
    }

    /// Fill unset profile extents from the box size.
    pub(crate) fn resolve_profiles(&mut self) {
        for species in self.species.iter_mut() {
            species.density.profile = species.density.profile.resolve(&self.main.sim_length);
        }
    }

    /// Load a deck from its TOML rendition.
    pub fn from_toml_str(toml_contents: &str) -> Result<Deck, DeckError> {
        let mut deck: Deck = toml::from_str(toml_contents).map_err(|e| DeckError::TomlParseError {
            msg: format!("{e}"),
        })?;
        deck.resolve_profiles();
        deck.validate()?;
        Ok(deck)
    }

    pub fn to_toml(&self) -> Result<String, DeckError> {
        toml::to_string(self).map_err(|e| DeckError::TomlWriteError {
            msg: format!("{e}"),
        })
    }

    pub fn write_script(&self, path: &str) -> Result<(), DeckError> {
        std::fs::write(path, self.to_script()).map_err(|_| DeckError::WriteError {
            path: path.to_string(),
        })
    }

    pub fn write_toml(&self, path: &str) -> Result<(), DeckError> {
        std::fs::write(path, self.to_toml()?).map_err(|_| DeckError::WriteError {
            path: path.to_string(),
        })
    }
}

/// Load and validate a deck script.
pub fn load_str(source: &str) -> Result<Deck, DeckError> {
    let tokens = lex(source)?;
    let program = parse(&tokens)?;
    let records = evaluate(&program)?;
    Ok(build(records)?)
}

/// This function reads deck scripts
pub fn read_deck(path: &str) -> Result<Deck, DeckError> {
    let source = std::fs::read_to_string(path).map_err(|_| DeckError::ReadError {
        path: path.to_string(),
    })?;
    log::info!("loading deck {path}");
    load_str(&source)
}

/// This function reads toml files
pub fn read_toml(path: &str) -> Result<Deck, DeckError> {
    // Read toml config file
    let toml_contents: &str = &std::fs::read_to_string(path).map_err(|_| DeckError::ReadError {
        path: path.to_string(),
    })?;

    Deck::from_toml_str(toml_contents)
}

impl Display for Deck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let main = &self.main;
        writeln!(f, "{}", "-".repeat(40))?;
        writeln!(f, "geometry       = {}", main.geometry)?;
        writeln!(f, "cells          = {:?}", main.cells())?;
        writeln!(f, "patches        = {:?}", main.number_of_patches)?;
        writeln!(f, "timestep       = {}", main.timestep)?;
        writeln!(f, "sim_time       = {}", main.sim_time)?;
        writeln!(f, "n_time         = {}", main.n_time())?;
        if let Some(wavelength) = main.reference_wavelength_si() {
            writeln!(f, "wavelength_SI  = {wavelength:e} m")?;
        }
        for s in &self.species {
            writeln!(
                f,
                "species        = {} (mass {}, charge {}, {} per cell, {} density)",
                s.species_type,
                s.mass,
                s.charge,
                s.n_part_per_cell,
                s.density.profile.name()
            )?;
            if s.is_tracked() {
                writeln!(f, "  tracked every {} steps", s.track_every)?;
            }
        }
        for c in &self.collisions {
            let kind = if c.is_intra() { "intra" } else { "inter" };
            writeln!(
                f,
                "collisions     = {:?} x {:?} ({kind})",
                c.species1, c.species2
            )?;
        }
        writeln!(
            f,
            "diagnostics    = {} fields, {} scalar, {} particles, {} probes",
            self.diag_fields.len(),
            usize::from(self.diag_scalar.is_some()),
            self.diag_particles.len(),
            self.diag_probes.len()
        )?;
        writeln!(f, "{}", "-".repeat(40))?;
        Ok(())
    }
}

#[test]
fn test_geometry_tags() {
    assert_eq!(
        Geometry::parse("2d3v"),
        Ok(Geometry {
            field_dims: 2,
            velocity_dims: 3
        })
    );
    assert!(Geometry::parse("3d3v").unwrap_err().contains("not supported"));
    assert!(Geometry::parse("1d").unwrap_err().contains("<n>d<m>v"));
    assert_eq!(Geometry::parse("1d3v").unwrap().to_string(), "1d3v");
}

#[test]
fn test_intra_collisions_ignore_order() {
    let collisions = Collisions {
        species1: vec!["a".to_string(), "b".to_string()],
        species2: vec!["b".to_string(), "a".to_string()],
        coulomb_log: 0.0,
        debug_every: 0,
        ionizing: false,
    };
    assert!(collisions.is_intra());
    assert!(collisions.auto_coulomb_log());
}
