//! Numeric ranges and cross-record rules of a [`Deck`].

use log::warn;

use crate::{
    constants::*,
    error::ValidationError,
    parameters::*,
    tags::*,
    value::RecordKind,
};

impl Deck {
    /// Check every range and cross reference.
    ///
    /// Species references are checked against the whole deck here; the
    /// script loader has already checked they were declared in order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let n_space = self.main.n_space();
        self.main.validate()?;

        let mut seen: Vec<&str> = Vec::with_capacity(self.species.len());
        for species in &self.species {
            if seen.contains(&species.species_type.as_str()) {
                return Err(ValidationError::DuplicateSpecies {
                    name: species.species_type.clone(),
                });
            }
            seen.push(&species.species_type);
            species.validate(n_space)?;
        }

        for (i, collisions) in self.collisions.iter().enumerate() {
            self.validate_collisions(&RecordKind::Collisions.label(i), collisions)?;
        }

        for (i, diag) in self.diag_fields.iter().enumerate() {
            let label = RecordKind::DiagFields.label(i);
            positive(&label, "every", diag.every)?;
            positive(&label, "time_average", diag.time_average)?;
            for field in &diag.fields {
                if !self.is_field_name(field) {
                    return Err(ValidationError::InvalidTag {
                        record: label,
                        field: "fields".to_string(),
                        value: field.clone(),
                        allowed: format!("{} (or Jx, Jy, Jz, Rho with a species suffix)", FIELD_NAMES.join(", ")),
                    });
                }
            }
        }

        if let Some(diag) = &self.diag_scalar {
            let label = RecordKind::DiagScalar.label(0);
            positive(&label, "every", diag.every)?;
            positive(&label, "precision", diag.precision)?;
        }

        for (i, diag) in self.diag_particles.iter().enumerate() {
            self.validate_diag_particles(&RecordKind::DiagParticles.label(i), diag)?;
        }

        for (i, probe) in self.diag_probes.iter().enumerate() {
            probe.validate(&RecordKind::DiagProbe.label(i), n_space)?;
        }

        Ok(())
    }

    /// `Ex`, ..., or a per-species current/density such as `Rho_electron1`.
    fn is_field_name(&self, name: &str) -> bool {
        FIELD_NAMES.contains(&name)
            || SPECIES_FIELD_NAMES.iter().any(|base| {
                name.strip_prefix(base)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .is_some_and(|species| self.species_index(species).is_some())
            })
    }

    fn check_species(&self, label: &str, names: &[String]) -> Result<(), ValidationError> {
        match names.iter().find(|n| self.species_index(n).is_none()) {
            Some(unknown) => Err(ValidationError::UnknownSpecies {
                record: label.to_string(),
                name: unknown.clone(),
            }),
            None => Ok(()),
        }
    }

    fn validate_collisions(&self, label: &str, c: &Collisions) -> Result<(), ValidationError> {
        self.check_species(label, &c.species1)?;
        self.check_species(label, &c.species2)?;

        let collision = |reason: &str| ValidationError::Collision {
            record: label.to_string(),
            reason: reason.to_string(),
        };

        if c.species1.is_empty() || c.species2.is_empty() {
            return Err(collision("`species1` and `species2` must both name at least one species"));
        }
        let intra = c.is_intra();
        if !intra && c.species1.iter().any(|s| c.species2.contains(s)) {
            return Err(collision(
                "`species1` and `species2` must be either identical or disjoint",
            ));
        }
        if self.main.reference_angular_frequency_si <= 0.0 {
            return Err(collision(
                "collisions need `referenceAngularFrequency_SI` > 0 in Main",
            ));
        }
        finite(label, "coulomb_log", c.coulomb_log)?;

        if c.ionizing {
            if intra {
                return Err(collision("ionizing collisions need two distinct groups"));
            }
            let mut electron_groups = 0;
            for group in [&c.species1, &c.species2] {
                let species: Vec<&Species> = group
                    .iter()
                    .filter_map(|name| self.species_index(name).map(|i| &self.species[i]))
                    .collect();
                let first = species[0];
                if species.iter().any(|s| s.mass != first.mass) {
                    return Err(collision("every species of an ionizing group must have the same mass"));
                }
                if species.iter().any(|s| s.atomic_number != first.atomic_number) {
                    return Err(collision(
                        "every species of an ionizing group must have the same atomic number",
                    ));
                }
                if first.atomic_number == 0 {
                    electron_groups += 1;
                }
            }
            if electron_groups != 1 {
                return Err(collision(
                    "ionizing collisions need one group of electrons (atomic_number 0) and one of ions",
                ));
            }
        }

        if c.debug_every > 0 {
            log::debug!("{label}: collision debug output every {} steps", c.debug_every);
        }
        Ok(())
    }

    fn validate_diag_particles(&self, label: &str, diag: &DiagParticles) -> Result<(), ValidationError> {
        positive(label, "every", diag.every)?;
        positive(label, "time_average", diag.time_average)?;
        if diag.time_average > diag.every {
            return Err(ValidationError::range(
                label,
                "time_average",
                format!("{} exceeds `every` ({})", diag.time_average, diag.every),
            ));
        }
        if diag.species.is_empty() {
            return Err(ValidationError::length(label, "species", "at least 1", 0));
        }
        self.check_species(label, &diag.species)?;
        if diag.axes.is_empty() {
            return Err(ValidationError::length(label, "axes", "at least 1", 0));
        }
        for axis in &diag.axes {
            axis.validate(label, self.main.n_space())?;
        }
        Ok(())
    }
}

impl Main {
    fn validate(&self) -> Result<(), ValidationError> {
        let label = RecordKind::Main.label(0);
        let label = label.as_str();
        let n_space = self.n_space();

        exact_length(label, "number_of_patches", n_space, self.number_of_patches.len())?;
        exact_length(label, "cell_length", n_space, self.cell_length.len())?;
        exact_length(label, "sim_length", n_space, self.sim_length.len())?;

        if !INTERPOLATION_ORDERS.contains(&self.interpolation_order) {
            return Err(ValidationError::range(
                label,
                "interpolation_order",
                format!("{} is not 2 or 4", self.interpolation_order),
            ));
        }
        strictly_positive(label, "timestep", self.timestep)?;
        strictly_positive(label, "sim_time", self.sim_time)?;
        non_negative(label, "time_fields_frozen", self.time_fields_frozen)?;
        non_negative(label, "referenceAngularFrequency_SI", self.reference_angular_frequency_si)?;
        positive(label, "print_every", self.print_every)?;
        for dx in &self.cell_length {
            strictly_positive(label, "cell_length", *dx)?;
        }
        for length in &self.sim_length {
            strictly_positive(label, "sim_length", *length)?;
        }
        for (cells, dx) in self.cells().iter().zip(&self.cell_length) {
            if *cells == 0 {
                return Err(ValidationError::range(
                    label,
                    "cell_length",
                    format!("{dx} leaves no cells in the box"),
                ));
            }
        }

        for (patches, cells) in self.number_of_patches.iter().zip(self.cells()) {
            if !patches.is_power_of_two() {
                return Err(ValidationError::range(
                    label,
                    "number_of_patches",
                    format!("{patches} is not a power of 2"),
                ));
            }
            if cells % u64::from(*patches) != 0 {
                return Err(ValidationError::range(
                    label,
                    "number_of_patches",
                    format!("{cells} cells cannot be split into {patches} patches"),
                ));
            }
        }
        for (length, dx) in self.sim_length.iter().zip(&self.cell_length) {
            let ratio = length / dx;
            if (ratio - ratio.round()).abs() > 1e-6 * ratio {
                warn!("Main: sim_length {length} is not a multiple of cell_length {dx}; using {} cells", ratio.round());
            }
        }

        em_boundaries(label, "bc_em_type_x", &self.bc_em_type_x)?;
        match (n_space, self.bc_em_type_y.is_empty()) {
            (1, false) => warn!("Main: `bc_em_type_y` is ignored in 1d"),
            (2, true) => {
                return Err(ValidationError::MissingField {
                    record: label.to_string(),
                    field: "bc_em_type_y".to_string(),
                })
            }
            (2, false) => em_boundaries(label, "bc_em_type_y", &self.bc_em_type_y)?,
            _ => {}
        }

        if self.sim_time < self.timestep {
            warn!("Main: sim_time {} is shorter than one timestep", self.sim_time);
        }
        Ok(())
    }
}

impl Species {
    fn validate(&self, n_space: usize) -> Result<(), ValidationError> {
        let label = format!("Species `{}`", self.species_type);
        let label = label.as_str();

        if self.species_type.is_empty() {
            return Err(ValidationError::range(label, "species_type", "must not be empty"));
        }
        positive(label, "n_part_per_cell", self.n_part_per_cell)?;
        strictly_positive(label, "mass", self.mass)?;
        finite(label, "charge", self.charge)?;
        non_negative(label, "time_frozen", self.time_frozen)?;
        for v in self.mean_velocity {
            finite(label, "mean_velocity", v)?;
            if v.abs() >= 1.0 {
                return Err(ValidationError::range(
                    label,
                    "mean_velocity",
                    format!("|{v}| is not below the speed of light"),
                ));
            }
        }
        for t in self.temperature {
            non_negative(label, "temperature", t)?;
        }

        self.density
            .profile
            .check()
            .map_err(|reason| ValidationError::InvalidProfile {
                record: label.to_string(),
                field: self.density.kind.key().to_string(),
                reason,
            })?;

        if self.ionization_model == IonizationModel::Tunnel && self.atomic_number == 0 {
            return Err(ValidationError::range(
                label,
                "atomic_number",
                "tunnel ionization needs atomic_number > 0",
            ));
        }

        if n_space == 2 {
            for (field, boundary) in [
                ("bc_part_type_south", self.bc_part_type_south),
                ("bc_part_type_north", self.bc_part_type_north),
            ] {
                if boundary.is_none() {
                    return Err(ValidationError::MissingField {
                        record: label.to_string(),
                        field: field.to_string(),
                    });
                }
            }
        } else if self.bc_part_type_south.is_some() || self.bc_part_type_north.is_some() {
            warn!("{label}: y boundaries are ignored in 1d");
        }
        Ok(())
    }
}

impl HistogramAxis {
    fn validate(&self, label: &str, n_space: usize) -> Result<(), ValidationError> {
        finite(label, "axes", self.lower_bound)?;
        finite(label, "axes", self.upper_bound)?;
        if self.lower_bound >= self.upper_bound {
            return Err(ValidationError::range(
                label,
                "axes",
                format!(
                    "`{}` axis lower bound {} is not below upper bound {}",
                    self.variable, self.lower_bound, self.upper_bound
                ),
            ));
        }
        if self.bin_count == 0 {
            return Err(ValidationError::range(
                label,
                "axes",
                format!("`{}` axis needs a positive bin count", self.variable),
            ));
        }
        if self.logscale && self.lower_bound <= 0.0 {
            return Err(ValidationError::range(
                label,
                "axes",
                format!("`{}` axis is logscale but its lower bound is not positive", self.variable),
            ));
        }
        if self.variable.spatial_index().is_some_and(|i| i >= n_space) {
            return Err(ValidationError::range(
                label,
                "axes",
                format!("`{}` axis does not exist in {n_space}d", self.variable),
            ));
        }
        Ok(())
    }
}

impl DiagProbe {
    fn validate(&self, label: &str, n_space: usize) -> Result<(), ValidationError> {
        positive(label, "every", self.every)?;
        exact_length(label, "pos", n_space, self.pos.len())?;
        if self.pos_second.is_some() && self.pos_first.is_none() {
            return Err(ValidationError::MissingField {
                record: label.to_string(),
                field: "pos_first".to_string(),
            });
        }
        for (field, position) in [
            ("pos", Some(&self.pos)),
            ("pos_first", self.pos_first.as_ref()),
            ("pos_second", self.pos_second.as_ref()),
        ] {
            let Some(position) = position else { continue };
            exact_length(label, field, n_space, position.len())?;
            for x in position {
                finite(label, field, *x)?;
            }
        }
        exact_length(label, "number", self.dimension(), self.number.len())?;
        for n in &self.number {
            positive(label, "number", *n)?;
        }
        if let Some(unknown) = self.fields.iter().find(|f| !PROBE_FIELDS.contains(&f.as_str())) {
            return Err(ValidationError::InvalidTag {
                record: label.to_string(),
                field: "fields".to_string(),
                value: unknown.clone(),
                allowed: PROBE_FIELDS.join(", "),
            });
        }
        Ok(())
    }
}

fn em_boundaries(label: &str, field: &str, tags: &[EmBoundary]) -> Result<(), ValidationError> {
    if !(1..=2).contains(&tags.len()) {
        return Err(ValidationError::length(label, field, "1 or 2", tags.len()));
    }
    let periodic = tags.iter().filter(|t| **t == EmBoundary::Periodic).count();
    if periodic > 0 && periodic < tags.len() {
        return Err(ValidationError::range(
            label,
            field,
            "periodic must apply to both sides",
        ));
    }
    Ok(())
}

fn exact_length(label: &str, field: &str, expected: usize, found: usize) -> Result<(), ValidationError> {
    if expected != found {
        return Err(ValidationError::length(label, field, expected, found));
    }
    Ok(())
}

fn positive(label: &str, field: &str, value: u32) -> Result<(), ValidationError> {
    if value == 0 {
        return Err(ValidationError::range(label, field, "must be positive"));
    }
    Ok(())
}

fn finite(label: &str, field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::range(label, field, format!("{value} is not finite")));
    }
    Ok(())
}

fn non_negative(label: &str, field: &str, value: f64) -> Result<(), ValidationError> {
    finite(label, field, value)?;
    if value < 0.0 {
        return Err(ValidationError::range(label, field, format!("{value} is negative")));
    }
    Ok(())
}

fn strictly_positive(label: &str, field: &str, value: f64) -> Result<(), ValidationError> {
    finite(label, field, value)?;
    if value <= 0.0 {
        return Err(ValidationError::range(label, field, format!("{value} is not positive")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::Profile;

    fn main_1d() -> Main {
        Main {
            geometry: Geometry::parse("1d3v").unwrap(),
            number_of_patches: vec![4],
            interpolation_order: 2,
            timestep: 0.5,
            sim_time: 10.0,
            time_fields_frozen: 0.0,
            cell_length: vec![1.0],
            sim_length: vec![64.0],
            bc_em_type_x: vec![EmBoundary::Periodic],
            bc_em_type_y: vec![],
            random_seed: None,
            reference_angular_frequency_si: 1.0,
            print_every: 10,
        }
    }

    fn species(name: &str, mass: f64, atomic_number: u32) -> Species {
        Species {
            species_type: name.to_string(),
            init_position: PositionInit::Regular,
            init_momentum: MomentumInit::Cold,
            ionization_model: IonizationModel::Disabled,
            dynamics_type: Dynamics::Norm,
            n_part_per_cell: 8,
            mass,
            charge: -1.0,
            density: Density {
                kind: DensityKind::Charge,
                profile: Profile::Constant {
                    value: 1.0,
                    xvacuum: None,
                    yvacuum: None,
                },
            },
            mean_velocity: [0.0; 3],
            temperature: [DEFAULT_TEMPERATURE; 3],
            time_frozen: 0.0,
            atomic_number,
            track_every: 0,
            bc_part_type_west: ParticleBoundary::Free,
            bc_part_type_east: ParticleBoundary::Free,
            bc_part_type_south: None,
            bc_part_type_north: None,
        }
    }

    fn deck() -> Deck {
        Deck {
            main: main_1d(),
            species: vec![species("electron", 1.0, 0), species("ion", 1836.0, 1)],
            collisions: vec![],
            diag_fields: vec![],
            diag_scalar: None,
            diag_particles: vec![],
            diag_probes: vec![],
        }
    }

    fn collide(a: &[&str], b: &[&str], ionizing: bool) -> Collisions {
        Collisions {
            species1: a.iter().map(|s| s.to_string()).collect(),
            species2: b.iter().map(|s| s.to_string()).collect(),
            coulomb_log: 0.0,
            debug_every: 0,
            ionizing,
        }
    }

    #[test]
    fn test_valid_deck() {
        let mut deck = deck();
        deck.collisions.push(collide(&["electron"], &["ion"], true));
        assert_eq!(deck.validate(), Ok(()));
    }

    #[test]
    fn test_patches_must_divide_cells() {
        let mut deck = deck();
        deck.main.number_of_patches = vec![3];
        assert!(deck.validate().unwrap_err().to_string().contains("power of 2"));

        deck.main.number_of_patches = vec![128];
        assert!(deck.validate().unwrap_err().to_string().contains("64 cells"));
    }

    #[test]
    fn test_box_needs_cells() {
        let mut deck = deck();
        deck.main.cell_length = vec![200.0];
        let err = deck.validate().unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidRange { ref field, .. } if field == "cell_length"
        ));
        assert!(err.to_string().contains("no cells"), "{err}");
    }

    #[test]
    fn test_short_run_is_accepted() {
        let mut deck = deck();
        deck.main.sim_time = 0.1;
        assert_eq!(deck.validate(), Ok(()));
    }

    #[test]
    fn test_two_dimensions_need_y_boundaries() {
        let mut deck = deck();
        deck.main.geometry = Geometry::parse("2d3v").unwrap();
        deck.main.number_of_patches = vec![4, 2];
        deck.main.cell_length = vec![1.0, 1.0];
        deck.main.sim_length = vec![64.0, 32.0];
        assert!(matches!(
            deck.validate().unwrap_err(),
            ValidationError::MissingField { field, .. } if field == "bc_em_type_y"
        ));

        deck.main.bc_em_type_y = vec![EmBoundary::SilverMuller, EmBoundary::Reflective];
        assert!(matches!(
            deck.validate().unwrap_err(),
            ValidationError::MissingField { field, .. } if field == "bc_part_type_south"
        ));
    }

    #[test]
    fn test_half_periodic_is_rejected() {
        let mut deck = deck();
        deck.main.bc_em_type_x = vec![EmBoundary::Periodic, EmBoundary::SilverMuller];
        assert!(deck.validate().is_err());
    }

    #[test]
    fn test_collision_groups() {
        let mut deck = deck();
        deck.collisions.push(collide(&["electron", "ion"], &["ion"], false));
        assert!(deck.validate().unwrap_err().to_string().contains("identical or disjoint"));

        deck.collisions[0] = collide(&[], &["ion"], false);
        assert!(deck.validate().unwrap_err().to_string().contains("at least one"));

        deck.collisions[0] = collide(&["ion", "electron"], &["electron", "ion"], false);
        assert_eq!(deck.validate(), Ok(()));

        deck.main.reference_angular_frequency_si = 0.0;
        assert!(deck
            .validate()
            .unwrap_err()
            .to_string()
            .contains("referenceAngularFrequency_SI"));
    }

    #[test]
    fn test_unknown_species_in_collisions() {
        let mut deck = deck();
        deck.collisions.push(collide(&["electron"], &["electron3"], false));
        assert_eq!(
            deck.validate(),
            Err(ValidationError::UnknownSpecies {
                record: "Collisions #0".to_string(),
                name: "electron3".to_string()
            })
        );
    }

    #[test]
    fn test_ionizing_groups() {
        let mut deck = deck();
        deck.collisions.push(collide(&["electron"], &["electron"], true));
        assert!(deck.validate().unwrap_err().to_string().contains("distinct"));

        deck.species.push(species("positron", 1.0, 0));
        deck.collisions[0] = collide(&["electron"], &["positron"], true);
        assert!(deck.validate().unwrap_err().to_string().contains("one group of electrons"));

        deck.species.push(species("heavy", 3672.0, 1));
        deck.collisions[0] = collide(&["electron"], &["ion", "heavy"], true);
        assert!(deck.validate().unwrap_err().to_string().contains("same mass"));
    }

    #[test]
    fn test_duplicate_species() {
        let mut deck = deck();
        deck.species.push(species("ion", 1.0, 1));
        assert_eq!(
            deck.validate(),
            Err(ValidationError::DuplicateSpecies {
                name: "ion".to_string()
            })
        );
    }

    #[test]
    fn test_species_ranges() {
        let mut deck = deck();
        deck.species[0].mean_velocity = [0.0, 1.2, 0.0];
        assert!(deck.validate().unwrap_err().to_string().contains("mean_velocity"));

        let mut deck = self::deck();
        deck.species[0].ionization_model = IonizationModel::Tunnel;
        assert!(deck.validate().unwrap_err().to_string().contains("atomic_number"));

        let mut deck = self::deck();
        deck.species[1].mass = 0.0;
        assert!(deck.validate().unwrap_err().to_string().contains("mass"));
    }

    #[test]
    fn test_histogram_axes() {
        let axis = |variable, lower_bound, upper_bound, bin_count, logscale| HistogramAxis {
            variable,
            lower_bound,
            upper_bound,
            bin_count,
            logscale,
            edge_inclusive: false,
        };
        assert!(axis(AxisVariable::X, 0.0, 1.0, 10, false).validate("d", 1).is_ok());
        assert!(axis(AxisVariable::X, 1.0, 1.0, 10, false).validate("d", 1).is_err());
        assert!(axis(AxisVariable::X, 0.0, 1.0, 0, false).validate("d", 1).is_err());
        assert!(axis(AxisVariable::Ekin, 0.0, 1.0, 10, true).validate("d", 1).is_err());
        assert!(axis(AxisVariable::Y, 0.0, 1.0, 10, false).validate("d", 1).is_err());
        assert!(axis(AxisVariable::Y, 0.0, 1.0, 10, false).validate("d", 2).is_ok());
        assert!(axis(AxisVariable::Z, 0.0, 1.0, 10, false).validate("d", 2).is_err());
    }

    #[test]
    fn test_diag_particles_time_average() {
        let mut deck = deck();
        deck.diag_particles.push(DiagParticles {
            output: ParticleOutput::Density,
            every: 2,
            time_average: 3,
            species: vec!["ion".to_string()],
            axes: vec![HistogramAxis {
                variable: AxisVariable::Px,
                lower_bound: -1.0,
                upper_bound: 1.0,
                bin_count: 100,
                logscale: false,
                edge_inclusive: true,
            }],
        });
        assert!(deck.validate().unwrap_err().to_string().contains("exceeds"));

        deck.diag_particles[0].time_average = 2;
        assert_eq!(deck.validate(), Ok(()));

        deck.diag_particles[0].species.clear();
        assert!(deck.validate().is_err());
    }

    #[test]
    fn test_field_names() {
        let mut deck = deck();
        deck.diag_fields.push(DiagFields {
            every: 10,
            time_average: 1,
            fields: vec!["Ex".to_string(), "Rho_electron".to_string()],
        });
        assert_eq!(deck.validate(), Ok(()));

        deck.diag_fields[0].fields.push("Rho_muon".to_string());
        assert!(matches!(
            deck.validate().unwrap_err(),
            ValidationError::InvalidTag { value, .. } if value == "Rho_muon"
        ));
    }

    #[test]
    fn test_probes() {
        let mut deck = deck();
        deck.diag_probes.push(DiagProbe {
            every: 5,
            pos: vec![0.0],
            pos_first: Some(vec![64.0]),
            pos_second: None,
            number: vec![100],
            fields: vec![],
        });
        assert_eq!(deck.validate(), Ok(()));
        assert_eq!(deck.diag_probes[0].dimension(), 1);

        deck.diag_probes[0].number = vec![];
        assert!(matches!(
            deck.validate().unwrap_err(),
            ValidationError::LengthMismatch { field, .. } if field == "number"
        ));

        deck.diag_probes[0].number = vec![100];
        deck.diag_probes[0].fields = vec!["Bx_m".to_string()];
        assert!(deck.validate().is_err());
    }
}
