//! Turns evaluated record blocks into typed records.
//!
//! Field types, tags and required fields are checked here, one block at a
//! time and in declaration order, so a species reference can only point at
//! a species declared above it. Numeric ranges and the rules spanning
//! several blocks are left to [`Deck::validate`].

use log::{debug, warn};
use std::collections::HashSet;

use crate::{
    constants::*,
    error::ValidationError,
    parameters::*,
    profiles::Profile,
    tags::Tag,
    value::{RawRecord, RecordKind, Value},
};

/// Build and validate a deck from its blocks.
pub(crate) fn build(records: Vec<RawRecord>) -> Result<Deck, ValidationError> {
    let mut main = None;
    let mut species: Vec<Species> = Vec::new();
    let mut collisions = Vec::new();
    let mut diag_fields = Vec::new();
    let mut diag_scalar = None;
    let mut diag_particles = Vec::new();
    let mut diag_probes = Vec::new();

    for record in &records {
        if record.kind.is_singleton() {
            let seen = match record.kind {
                RecordKind::Main => main.is_some(),
                _ => diag_scalar.is_some(),
            };
            if seen {
                return Err(ValidationError::DuplicateRecord {
                    kind: record.kind,
                    line: record.line,
                });
            }
        }

        let declared: Vec<&str> = species.iter().map(|s| s.species_type.as_str()).collect();
        match record.kind {
            RecordKind::Main => main = Some(FieldReader::new(record, 0).main()?),
            RecordKind::Species => {
                let reader = FieldReader::new(record, species.len());
                species.push(reader.species()?);
            }
            RecordKind::Collisions => {
                let reader = FieldReader::new(record, collisions.len());
                collisions.push(reader.collisions(&declared)?);
            }
            RecordKind::DiagFields => {
                let reader = FieldReader::new(record, diag_fields.len());
                diag_fields.push(reader.diag_fields()?);
            }
            RecordKind::DiagScalar => diag_scalar = Some(FieldReader::new(record, 0).diag_scalar()?),
            RecordKind::DiagParticles => {
                let reader = FieldReader::new(record, diag_particles.len());
                diag_particles.push(reader.diag_particles(&declared)?);
            }
            RecordKind::DiagProbe => {
                let reader = FieldReader::new(record, diag_probes.len());
                diag_probes.push(reader.diag_probe()?);
            }
        }
    }

    let main = main.ok_or(ValidationError::MissingRecord {
        kind: RecordKind::Main,
    })?;
    let mut deck = Deck {
        main,
        species,
        collisions,
        diag_fields,
        diag_scalar,
        diag_particles,
        diag_probes,
    };
    deck.resolve_profiles();
    deck.validate()?;
    debug!(
        "deck built: {} species, {} collision block(s)",
        deck.species.len(),
        deck.collisions.len()
    );
    Ok(deck)
}

/// Typed access to the fields of one block.
///
/// Every getter marks its field as consumed; [`FieldReader::finish`] warns
/// about the fields nobody asked for.
struct FieldReader<'a> {
    record: &'a RawRecord,
    label: String,
    consumed: HashSet<&'static str>,
}

impl<'a> FieldReader<'a> {
    fn new(record: &'a RawRecord, index: usize) -> Self {
        FieldReader {
            record,
            label: record.kind.label(index),
            consumed: HashSet::new(),
        }
    }

    fn main(mut self) -> Result<Main, ValidationError> {
        let geometry = match self.take("geometry") {
            None => return Err(self.missing("geometry")),
            Some(Value::Str(tag)) => Geometry::parse(tag).map_err(|reason| {
                ValidationError::range(&self.label, "geometry", reason)
            })?,
            Some(other) => return Err(self.wrong_type("geometry", "a string", other)),
        };
        let main = Main {
            geometry,
            number_of_patches: self.required_counts("number_of_patches")?,
            interpolation_order: self.count("interpolation_order")?.unwrap_or(2),
            timestep: self.required_float("timestep")?,
            sim_time: self.required_float("sim_time")?,
            time_fields_frozen: self.float("time_fields_frozen")?.unwrap_or(0.0),
            cell_length: self.required_floats("cell_length")?,
            sim_length: self.required_floats("sim_length")?,
            bc_em_type_x: self.required_tags("bc_em_type_x")?,
            bc_em_type_y: self.tags("bc_em_type_y")?.unwrap_or_default(),
            random_seed: self.count("random_seed")?,
            reference_angular_frequency_si: self
                .float("referenceAngularFrequency_SI")?
                .unwrap_or(0.0),
            print_every: self.count("print_every")?.unwrap_or(DEFAULT_PRINT_EVERY),
        };
        self.finish();
        Ok(main)
    }

    fn species(mut self) -> Result<Species, ValidationError> {
        let species_type = self.required_string("species_type")?;
        // errors name the species rather than its position
        self.label = format!("Species `{species_type}`");

        let density = match (self.profile("charge_density")?, self.profile("nb_density")?) {
            (Some(profile), None) => Density {
                kind: DensityKind::Charge,
                profile,
            },
            (None, Some(profile)) => Density {
                kind: DensityKind::Number,
                profile,
            },
            (Some(_), Some(_)) => {
                return Err(ValidationError::range(
                    &self.label,
                    "nb_density",
                    "give either `charge_density` or `nb_density`, not both",
                ))
            }
            (None, None) => return Err(self.missing("charge_density")),
        };

        let mean_velocity = match self.floats("mean_velocity")? {
            None => [0.0; 3],
            Some(v) => <[f64; 3]>::try_from(v.as_slice())
                .map_err(|_| ValidationError::length(&self.label, "mean_velocity", 3, v.len()))?,
        };
        let temperature = match self.floats("temperature")?.as_deref() {
            None => [DEFAULT_TEMPERATURE; 3],
            Some(&[t]) => [t; 3],
            Some(&[tx, ty, tz]) => [tx, ty, tz],
            Some(other) => {
                return Err(ValidationError::length(
                    &self.label,
                    "temperature",
                    "1 or 3",
                    other.len(),
                ))
            }
        };

        let species = Species {
            species_type,
            init_position: self.required_tag("initPosition_type")?,
            init_momentum: self.required_tag("initMomentum_type")?,
            ionization_model: self
                .tag("ionization_model")?
                .unwrap_or(crate::tags::IonizationModel::Disabled),
            dynamics_type: self
                .tag("dynamics_type")?
                .unwrap_or(crate::tags::Dynamics::Norm),
            n_part_per_cell: self.required_count("n_part_per_cell")?,
            mass: self.required_float("mass")?,
            charge: self.required_float("charge")?,
            density,
            mean_velocity,
            temperature,
            time_frozen: self.float("time_frozen")?.unwrap_or(0.0),
            atomic_number: self.count("atomic_number")?.unwrap_or(0),
            track_every: self.count("track_every")?.unwrap_or(0),
            bc_part_type_west: self.required_tag("bc_part_type_west")?,
            bc_part_type_east: self.required_tag("bc_part_type_east")?,
            bc_part_type_south: self.tag("bc_part_type_south")?,
            bc_part_type_north: self.tag("bc_part_type_north")?,
        };
        self.finish();
        Ok(species)
    }

    fn collisions(mut self, declared: &[&str]) -> Result<Collisions, ValidationError> {
        let collisions = Collisions {
            species1: self.species_names("species1", declared)?,
            species2: self.species_names("species2", declared)?,
            coulomb_log: self.float("coulomb_log")?.unwrap_or(0.0),
            debug_every: self.count("debug_every")?.unwrap_or(0),
            ionizing: self.boolean("ionizing")?.unwrap_or(false),
        };
        self.finish();
        Ok(collisions)
    }

    fn diag_fields(mut self) -> Result<DiagFields, ValidationError> {
        let diag = DiagFields {
            every: self.required_count("every")?,
            time_average: self.count("time_average")?.unwrap_or(1),
            fields: self.strings("fields")?.unwrap_or_default(),
        };
        self.finish();
        Ok(diag)
    }

    fn diag_scalar(mut self) -> Result<DiagScalar, ValidationError> {
        let diag = DiagScalar {
            every: self.required_count("every")?,
            precision: self.count("precision")?.unwrap_or(DEFAULT_SCALAR_PRECISION),
            vars: self.strings("vars")?.unwrap_or_default(),
        };
        self.finish();
        Ok(diag)
    }

    fn diag_particles(mut self, declared: &[&str]) -> Result<DiagParticles, ValidationError> {
        let axes = match self.take("axes") {
            None => return Err(self.missing("axes")),
            Some(Value::List(items)) => items
                .iter()
                .map(|item| self.axis(item))
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => return Err(self.wrong_type("axes", "a list of axes", other)),
        };
        let diag = DiagParticles {
            output: self.required_tag("output")?,
            every: self.required_count("every")?,
            time_average: self.count("time_average")?.unwrap_or(1),
            species: self.species_names("species", declared)?,
            axes,
        };
        self.finish();
        Ok(diag)
    }

    fn diag_probe(mut self) -> Result<DiagProbe, ValidationError> {
        let diag = DiagProbe {
            every: self.required_count("every")?,
            pos: self.required_floats("pos")?,
            pos_first: self.floats("pos_first")?,
            pos_second: self.floats("pos_second")?,
            number: self.counts("number")?.unwrap_or_default(),
            fields: self.strings("fields")?.unwrap_or_default(),
        };
        self.finish();
        Ok(diag)
    }

    /// `[variable, lower_bound, upper_bound, bin_count, flags...]`
    fn axis(&self, item: &Value) -> Result<HistogramAxis, ValidationError> {
        let Value::List(parts) = item else {
            return Err(self.wrong_type("axes", "a list per axis", item));
        };
        if parts.len() < 4 {
            return Err(ValidationError::length(&self.label, "axes", "at least 4", parts.len()));
        }
        let variable = match &parts[0] {
            Value::Str(name) => self.parse_tag("axes", name)?,
            other => return Err(self.wrong_type("axes", "a variable name", other)),
        };
        let bound = |value: &Value| {
            value
                .as_f64()
                .ok_or_else(|| self.wrong_type("axes", "a number", value))
        };
        let bin_count = match &parts[3] {
            Value::Int(n) => u32::try_from(*n).map_err(|_| {
                ValidationError::range(&self.label, "axes", format!("bin count must be positive (got {n})"))
            })?,
            other => return Err(self.wrong_type("axes", "an integer bin count", other)),
        };
        let mut axis = HistogramAxis {
            variable,
            lower_bound: bound(&parts[1])?,
            upper_bound: bound(&parts[2])?,
            bin_count,
            logscale: false,
            edge_inclusive: false,
        };
        for flag in &parts[4..] {
            match flag {
                Value::Str(s) if s == "logscale" => axis.logscale = true,
                Value::Str(s) if s == "edge_inclusive" => axis.edge_inclusive = true,
                Value::Str(s) => {
                    return Err(ValidationError::InvalidTag {
                        record: self.label.clone(),
                        field: "axes".to_string(),
                        value: s.clone(),
                        allowed: "\"logscale\", \"edge_inclusive\"".to_string(),
                    })
                }
                other => return Err(self.wrong_type("axes", "a flag string", other)),
            }
        }
        Ok(axis)
    }

    /// Species names that must already be declared.
    fn species_names(
        &mut self,
        field: &'static str,
        declared: &[&str],
    ) -> Result<Vec<String>, ValidationError> {
        let names = self.required_strings(field)?;
        if let Some(unknown) = names.iter().find(|n| !declared.contains(&n.as_str())) {
            return Err(ValidationError::UnknownSpecies {
                record: self.label.clone(),
                name: unknown.clone(),
            });
        }
        Ok(names)
    }

    /// The field's value, `None` if absent or set to `None`.
    fn take(&mut self, field: &'static str) -> Option<&'a Value> {
        self.consumed.insert(field);
        self.record
            .fields
            .get(field)
            .filter(|value| !matches!(value, Value::None))
    }

    fn finish(self) {
        for key in self.record.fields.keys() {
            if !self.consumed.contains(key.as_str()) {
                warn!(
                    "line {}: {}: ignoring unknown field `{key}`",
                    self.record.line, self.label
                );
            }
        }
    }

    fn missing(&self, field: &str) -> ValidationError {
        ValidationError::MissingField {
            record: self.label.clone(),
            field: field.to_string(),
        }
    }

    fn wrong_type(&self, field: &str, expected: &'static str, found: &Value) -> ValidationError {
        ValidationError::WrongType {
            record: self.label.clone(),
            field: field.to_string(),
            expected,
            found: found.type_name(),
        }
    }

    fn parse_tag<T: Tag>(&self, field: &str, value: &str) -> Result<T, ValidationError> {
        T::from_tag(value).ok_or_else(|| ValidationError::InvalidTag {
            record: self.label.clone(),
            field: field.to_string(),
            value: value.to_string(),
            allowed: T::allowed(),
        })
    }

    fn float(&mut self, field: &'static str) -> Result<Option<f64>, ValidationError> {
        match self.take(field) {
            None => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.wrong_type(field, "a number", value)),
        }
    }

    fn required_float(&mut self, field: &'static str) -> Result<f64, ValidationError> {
        self.float(field)?.ok_or_else(|| self.missing(field))
    }

    /// Non-negative integer that fits `T`.
    fn count<T: TryFrom<i64>>(&mut self, field: &'static str) -> Result<Option<T>, ValidationError> {
        match self.take(field) {
            None => Ok(None),
            Some(value) => self.to_count(field, value).map(Some),
        }
    }

    fn required_count<T: TryFrom<i64>>(&mut self, field: &'static str) -> Result<T, ValidationError> {
        self.count(field)?.ok_or_else(|| self.missing(field))
    }

    fn to_count<T: TryFrom<i64>>(&self, field: &str, value: &Value) -> Result<T, ValidationError> {
        match value {
            Value::Int(i) => T::try_from(*i).map_err(|_| {
                ValidationError::range(
                    &self.label,
                    field,
                    format!("expected a non-negative integer, found {i}"),
                )
            }),
            other => Err(self.wrong_type(field, "an integer", other)),
        }
    }

    fn boolean(&mut self, field: &'static str) -> Result<Option<bool>, ValidationError> {
        match self.take(field) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(self.wrong_type(field, "True or False", other)),
        }
    }

    fn required_string(&mut self, field: &'static str) -> Result<String, ValidationError> {
        match self.take(field) {
            None => Err(self.missing(field)),
            Some(Value::Str(s)) => Ok(s.clone()),
            Some(other) => Err(self.wrong_type(field, "a string", other)),
        }
    }

    fn tag<T: Tag>(&mut self, field: &'static str) -> Result<Option<T>, ValidationError> {
        match self.take(field) {
            None => Ok(None),
            Some(Value::Str(s)) => self.parse_tag(field, s).map(Some),
            Some(other) => Err(self.wrong_type(field, "a string", other)),
        }
    }

    fn required_tag<T: Tag>(&mut self, field: &'static str) -> Result<T, ValidationError> {
        self.tag(field)?.ok_or_else(|| self.missing(field))
    }

    /// Elements of a list field, each converted with `convert`.
    fn list<T>(
        &mut self,
        field: &'static str,
        convert: impl Fn(&Self, &Value) -> Result<T, ValidationError>,
    ) -> Result<Option<Vec<T>>, ValidationError> {
        match self.take(field) {
            None => Ok(None),
            Some(Value::List(items)) => items
                .iter()
                .map(|item| convert(self, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(other) => Err(self.wrong_type(field, "a list", other)),
        }
    }

    fn floats(&mut self, field: &'static str) -> Result<Option<Vec<f64>>, ValidationError> {
        self.list(field, |reader, item| {
            item.as_f64()
                .ok_or_else(|| reader.wrong_type(field, "a list of numbers", item))
        })
    }

    fn required_floats(&mut self, field: &'static str) -> Result<Vec<f64>, ValidationError> {
        self.floats(field)?.ok_or_else(|| self.missing(field))
    }

    fn counts<T: TryFrom<i64>>(&mut self, field: &'static str) -> Result<Option<Vec<T>>, ValidationError> {
        self.list(field, |reader, item| reader.to_count(field, item))
    }

    fn required_counts<T: TryFrom<i64>>(&mut self, field: &'static str) -> Result<Vec<T>, ValidationError> {
        self.counts(field)?.ok_or_else(|| self.missing(field))
    }

    fn strings(&mut self, field: &'static str) -> Result<Option<Vec<String>>, ValidationError> {
        self.list(field, |reader, item| match item {
            Value::Str(s) => Ok(s.clone()),
            other => Err(reader.wrong_type(field, "a list of strings", other)),
        })
    }

    fn required_strings(&mut self, field: &'static str) -> Result<Vec<String>, ValidationError> {
        self.strings(field)?.ok_or_else(|| self.missing(field))
    }

    fn tags<T: Tag>(&mut self, field: &'static str) -> Result<Option<Vec<T>>, ValidationError> {
        self.list(field, |reader, item| match item {
            Value::Str(s) => reader.parse_tag(field, s),
            other => Err(reader.wrong_type(field, "a list of strings", other)),
        })
    }

    fn required_tags<T: Tag>(&mut self, field: &'static str) -> Result<Vec<T>, ValidationError> {
        self.tags(field)?.ok_or_else(|| self.missing(field))
    }

    /// A number becomes a constant profile.
    fn profile(&mut self, field: &'static str) -> Result<Option<Profile>, ValidationError> {
        match self.take(field) {
            None => Ok(None),
            Some(Value::Profile(profile)) => Ok(Some(profile.clone())),
            Some(value) => match value.as_f64() {
                Some(density) => Ok(Some(Profile::Constant {
                    value: density,
                    xvacuum: None,
                    yvacuum: None,
                })),
                None => Err(self.wrong_type(field, "a number or a profile", value)),
            },
        }
    }
}
