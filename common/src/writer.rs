//! Renders a [`Deck`] back into a deck script.

use std::fmt::Write;

use crate::{
    parameters::*,
    profiles::Profile,
    tags::Tag,
    value::{RecordKind, Value},
};

/// One block being written, fields in insertion order.
struct Block {
    kind: RecordKind,
    fields: Vec<(&'static str, Value)>,
}

impl Block {
    fn new(kind: RecordKind) -> Self {
        Block {
            kind,
            fields: Vec::new(),
        }
    }

    fn set(&mut self, key: &'static str, value: Value) -> &mut Self {
        self.fields.push((key, value));
        self
    }

    fn set_opt(&mut self, key: &'static str, value: Option<Value>) -> &mut Self {
        if let Some(value) = value {
            self.fields.push((key, value));
        }
        self
    }

    fn render(&self, out: &mut String) {
        out.push_str(self.kind.name());
        out.push_str("(\n");
        for (key, value) in &self.fields {
            out.push_str("    ");
            out.push_str(key);
            out.push_str(" = ");
            render_value(value, out);
            out.push_str(",\n");
        }
        out.push_str(")\n\n");
    }
}

fn render_value(value: &Value, out: &mut String) {
    match value {
        Value::None => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Int(i) => {
            let _ = write!(out, "{i}");
        }
        // `{:?}` is the shortest form that reads back to the same bits
        Value::Float(x) => {
            let _ = write!(out, "{x:?}");
        }
        Value::Str(s) => {
            out.push('"');
            for c in s.chars() {
                match c {
                    '"' => out.push_str("\\\""),
                    '\\' => out.push_str("\\\\"),
                    '\n' => out.push_str("\\n"),
                    '\t' => out.push_str("\\t"),
                    c => out.push(c),
                }
            }
            out.push('"');
        }
        Value::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                render_value(item, out);
            }
            out.push(']');
        }
        Value::Profile(profile) => {
            let (first, kwargs) = profile.to_call();
            out.push_str(profile.name());
            out.push('(');
            render_value(&first, out);
            for (key, value) in &kwargs {
                out.push_str(", ");
                out.push_str(key);
                out.push('=');
                render_value(value, out);
            }
            out.push(')');
        }
    }
}

fn float(x: f64) -> Value {
    Value::Float(x)
}

fn int(i: impl Into<i64>) -> Value {
    Value::Int(i.into())
}

fn floats(xs: &[f64]) -> Value {
    Value::List(xs.iter().copied().map(Value::Float).collect())
}

fn ints(xs: &[u32]) -> Value {
    Value::List(xs.iter().map(|&x| int(x)).collect())
}

fn string(s: &str) -> Value {
    Value::Str(s.to_string())
}

fn strings(xs: &[String]) -> Value {
    Value::List(xs.iter().map(|s| string(s)).collect())
}

fn tag(t: impl Tag) -> Value {
    string(t.tag())
}

fn tags<T: Tag>(ts: &[T]) -> Value {
    Value::List(ts.iter().map(|t| tag(*t)).collect())
}

/// Lists that default to "everything" are only written when set.
fn non_empty(xs: &[String]) -> Option<Value> {
    (!xs.is_empty()).then(|| strings(xs))
}

/// A density without vacuum is written as the bare number.
fn density(profile: &Profile) -> Value {
    match profile {
        Profile::Constant {
            value,
            xvacuum: None,
            yvacuum: None,
        } => float(*value),
        other => Value::Profile(other.clone()),
    }
}

impl Deck {
    /// Canonical deck script: every field explicit, blocks grouped by kind.
    ///
    /// Loading the result gives back an identical deck.
    pub fn to_script(&self) -> String {
        let mut out = String::from("# Generated by picdeck\n\n");
        let main = &self.main;

        let mut block = Block::new(RecordKind::Main);
        block
            .set("geometry", string(&main.geometry.to_string()))
            .set("number_of_patches", ints(&main.number_of_patches))
            .set("interpolation_order", int(main.interpolation_order))
            .set("timestep", float(main.timestep))
            .set("sim_time", float(main.sim_time))
            .set("time_fields_frozen", float(main.time_fields_frozen))
            .set("cell_length", floats(&main.cell_length))
            .set("sim_length", floats(&main.sim_length))
            .set("bc_em_type_x", tags(&main.bc_em_type_x))
            .set_opt(
                "bc_em_type_y",
                (!main.bc_em_type_y.is_empty()).then(|| tags(&main.bc_em_type_y)),
            )
            .set_opt(
                "random_seed",
                // seeds above i64::MAX cannot come from a script
                main.random_seed.and_then(|s| i64::try_from(s).ok()).map(int),
            )
            .set(
                "referenceAngularFrequency_SI",
                float(main.reference_angular_frequency_si),
            )
            .set("print_every", int(main.print_every));
        block.render(&mut out);

        for s in &self.species {
            let mut block = Block::new(RecordKind::Species);
            block
                .set("species_type", string(&s.species_type))
                .set("initPosition_type", tag(s.init_position))
                .set("initMomentum_type", tag(s.init_momentum))
                .set("ionization_model", tag(s.ionization_model))
                .set("dynamics_type", tag(s.dynamics_type))
                .set("n_part_per_cell", int(s.n_part_per_cell))
                .set("mass", float(s.mass))
                .set("charge", float(s.charge))
                .set(s.density.kind.key(), density(&s.density.profile))
                .set("mean_velocity", floats(&s.mean_velocity))
                .set("temperature", floats(&s.temperature))
                .set("time_frozen", float(s.time_frozen))
                .set("atomic_number", int(s.atomic_number))
                .set("track_every", int(s.track_every))
                .set("bc_part_type_west", tag(s.bc_part_type_west))
                .set("bc_part_type_east", tag(s.bc_part_type_east))
                .set_opt("bc_part_type_south", s.bc_part_type_south.map(tag))
                .set_opt("bc_part_type_north", s.bc_part_type_north.map(tag));
            block.render(&mut out);
        }

        for c in &self.collisions {
            let mut block = Block::new(RecordKind::Collisions);
            block
                .set("species1", strings(&c.species1))
                .set("species2", strings(&c.species2))
                .set("coulomb_log", float(c.coulomb_log))
                .set("debug_every", int(c.debug_every))
                .set("ionizing", Value::Bool(c.ionizing));
            block.render(&mut out);
        }

        for d in &self.diag_fields {
            let mut block = Block::new(RecordKind::DiagFields);
            block
                .set("every", int(d.every))
                .set("time_average", int(d.time_average))
                .set_opt("fields", non_empty(&d.fields));
            block.render(&mut out);
        }

        if let Some(d) = &self.diag_scalar {
            let mut block = Block::new(RecordKind::DiagScalar);
            block
                .set("every", int(d.every))
                .set("precision", int(d.precision))
                .set_opt("vars", non_empty(&d.vars));
            block.render(&mut out);
        }

        for d in &self.diag_particles {
            let axes = d
                .axes
                .iter()
                .map(|axis| {
                    let mut parts = vec![
                        tag(axis.variable),
                        float(axis.lower_bound),
                        float(axis.upper_bound),
                        int(axis.bin_count),
                    ];
                    if axis.logscale {
                        parts.push(string("logscale"));
                    }
                    if axis.edge_inclusive {
                        parts.push(string("edge_inclusive"));
                    }
                    Value::List(parts)
                })
                .collect();
            let mut block = Block::new(RecordKind::DiagParticles);
            block
                .set("output", tag(d.output))
                .set("every", int(d.every))
                .set("time_average", int(d.time_average))
                .set("species", strings(&d.species))
                .set("axes", Value::List(axes));
            block.render(&mut out);
        }

        for p in &self.diag_probes {
            let mut block = Block::new(RecordKind::DiagProbe);
            block
                .set("every", int(p.every))
                .set("pos", floats(&p.pos))
                .set_opt("pos_first", p.pos_first.as_deref().map(floats))
                .set_opt("pos_second", p.pos_second.as_deref().map(floats))
                .set_opt("number", (!p.number.is_empty()).then(|| ints(&p.number)))
                .set_opt("fields", non_empty(&p.fields));
            block.render(&mut out);
        }

        out
    }
}

#[test]
fn test_render_values() {
    let mut out = String::new();
    render_value(
        &Value::List(vec![
            Value::Float(1e-5),
            Value::Float(100.0),
            Value::Int(-3),
            Value::Str("a\"b".to_string()),
            Value::Bool(true),
        ]),
        &mut out,
    );
    assert_eq!(out, r#"[1e-5, 100.0, -3, "a\"b", True]"#);
}

#[test]
fn test_render_profile_call() {
    let mut out = String::new();
    let profile = Profile::Constant {
        value: 2.0,
        xvacuum: Some(1.5),
        yvacuum: None,
    };
    render_value(&Value::Profile(profile.clone()), &mut out);
    assert_eq!(out, "constant(2.0, xvacuum=1.5)");
    assert_eq!(density(&profile), Value::Profile(profile));
}
