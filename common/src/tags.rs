//! String-tagged settings (`"periodic"`, `"maxwell-juettner"`, ...).

use serde::{Deserialize, Serialize};

/// An enum written in decks as one of a fixed set of strings.
pub trait Tag: Sized + Copy + 'static {
    /// Every accepted spelling, in declaration order.
    const TAGS: &'static [&'static str];

    fn from_tag(tag: &str) -> Option<Self>;

    fn tag(&self) -> &'static str;

    /// The accepted spellings, quoted, for error messages.
    fn allowed() -> String {
        Self::TAGS
            .iter()
            .map(|t| format!("\"{t}\""))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

macro_rules! tag_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $tag:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
        #[serde(try_from = "String", into = "&'static str")]
        pub enum $name {
            $($variant,)+
        }

        impl Tag for $name {
            const TAGS: &'static [&'static str] = &[$($tag),+];

            fn from_tag(tag: &str) -> Option<Self> {
                match tag {
                    $($tag => Some($name::$variant),)+
                    _ => None,
                }
            }

            fn tag(&self) -> &'static str {
                match self {
                    $($name::$variant => $tag,)+
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(tag: String) -> Result<Self, Self::Error> {
                <$name as Tag>::from_tag(&tag)
                    .ok_or_else(|| format!("\"{tag}\" is not one of {}", <$name as Tag>::allowed()))
            }
        }

        impl From<$name> for &'static str {
            fn from(value: $name) -> Self {
                value.tag()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.tag())
            }
        }
    };
}

tag_enum! {
    /// Electromagnetic boundary condition along one axis
    EmBoundary {
        Periodic => "periodic",
        SilverMuller => "silver-muller",
        Reflective => "reflective",
    }
}

tag_enum! {
    /// Initial particle placement inside a cell
    PositionInit {
        Regular => "regular",
        Random => "random",
    }
}

tag_enum! {
    MomentumInit {
        Cold => "cold",
        MaxwellJuettner => "maxwell-juettner",
        Rectangular => "rectangular",
    }
}

tag_enum! {
    IonizationModel {
        Disabled => "none",
        Tunnel => "tunnel",
    }
}

tag_enum! {
    /// Pusher: plain Boris (`norm`) or Boris with classical radiation reaction (`rrll`)
    Dynamics {
        Norm => "norm",
        RadiationReaction => "rrll",
    }
}

tag_enum! {
    /// What happens to a particle crossing a domain edge
    ParticleBoundary {
        Free => "none",
        Reflect => "refl",
        Suppress => "supp",
        Stop => "stop",
        Thermalize => "thermalize",
    }
}

tag_enum! {
    /// Quantity deposited into a particle histogram
    ParticleOutput {
        Density => "density",
        ChargeDensity => "charge_density",
        CurrentDensityX => "current_density_x",
        CurrentDensityY => "current_density_y",
        CurrentDensityZ => "current_density_z",
        PDensity => "p_density",
        PxDensity => "px_density",
        PyDensity => "py_density",
        PzDensity => "pz_density",
    }
}

tag_enum! {
    /// Particle quantity a histogram axis bins over
    AxisVariable {
        X => "x",
        Y => "y",
        Z => "z",
        Px => "px",
        Py => "py",
        Pz => "pz",
        P => "p",
        Gamma => "gamma",
        Ekin => "ekin",
        Vx => "vx",
        Vy => "vy",
        Vz => "vz",
        V => "v",
        Charge => "charge",
    }
}

impl AxisVariable {
    /// Index of the spatial coordinate this axis bins over, if any.
    pub fn spatial_index(&self) -> Option<usize> {
        match self {
            AxisVariable::X => Some(0),
            AxisVariable::Y => Some(1),
            AxisVariable::Z => Some(2),
            _ => None,
        }
    }
}

#[test]
fn test_tag_lookup() {
    assert_eq!(
        MomentumInit::from_tag("maxwell-juettner"),
        Some(MomentumInit::MaxwellJuettner)
    );
    assert_eq!(ParticleBoundary::from_tag("none"), Some(ParticleBoundary::Free));
    assert_eq!(EmBoundary::from_tag("Periodic"), None);
    assert_eq!(Dynamics::RadiationReaction.to_string(), "rrll");
}

#[test]
fn test_tag_error_lists_alternatives() {
    let err = PositionInit::try_from("grid".to_string()).unwrap_err();
    assert_eq!(err, "\"grid\" is not one of \"regular\", \"random\"");
}
