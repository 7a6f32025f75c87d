use indexmap::IndexMap;
use std::fmt;

use crate::profiles::Profile;

/// Result of evaluating a deck expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Profile(Profile),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Profile(_) => "profile",
        }
    }

    /// Numeric view of ints and floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }
}

/// The block kinds a deck may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Main,
    Species,
    Collisions,
    DiagFields,
    DiagScalar,
    DiagParticles,
    DiagProbe,
}

impl RecordKind {
    pub const ALL: [RecordKind; 7] = [
        RecordKind::Main,
        RecordKind::Species,
        RecordKind::Collisions,
        RecordKind::DiagFields,
        RecordKind::DiagScalar,
        RecordKind::DiagParticles,
        RecordKind::DiagProbe,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RecordKind::Main => "Main",
            RecordKind::Species => "Species",
            RecordKind::Collisions => "Collisions",
            RecordKind::DiagFields => "DiagFields",
            RecordKind::DiagScalar => "DiagScalar",
            RecordKind::DiagParticles => "DiagParticles",
            RecordKind::DiagProbe => "DiagProbe",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Blocks a deck declares at most once.
    pub fn is_singleton(&self) -> bool {
        matches!(self, RecordKind::Main | RecordKind::DiagScalar)
    }

    /// How errors refer to the `index`-th block of this kind.
    pub fn label(&self, index: usize) -> String {
        if self.is_singleton() {
            self.name().to_string()
        } else {
            format!("{} #{index}", self.name())
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A block as written in the deck, before any typing or validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub kind: RecordKind,
    /// Line of the block's opening name
    pub line: usize,
    /// Keyword arguments in the order they were written
    pub fields: IndexMap<String, Value>,
}
