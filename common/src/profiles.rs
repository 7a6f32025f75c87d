use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Spatial profile of a species density.
///
/// Decks build these by calling profile functions (`trapezoidal(...)`,
/// `gaussian(...)`, ...); a bare number becomes [`Profile::Constant`].
/// Extents left unset in the deck are filled in by [`Profile::resolve`]
/// once the box size is known.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum Profile {
    /// `value` everywhere beyond the optional vacuum extents
    Constant {
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        xvacuum: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        yvacuum: Option<f64>,
    },

    /// Vacuum, linear ramp, plateau, linear ramp, vacuum; per axis
    Trapezoidal { max: f64, x: Trapezoid, y: Trapezoid },

    /// Gaussian bump of order `order` inside `[vacuum, vacuum + length]`
    Gaussian {
        max: f64,
        x: GaussianAxis,
        y: GaussianAxis,
    },

    /// Piecewise linear along x through (`xpoints`, `xvalues`), zero outside
    Polygonal { xpoints: Vec<f64>, xvalues: Vec<f64> },

    /// `base + amplitude * cos(phi + 2 pi xnumber (x - xvacuum) / xlength)`
    Cosine {
        base: f64,
        amplitude: f64,
        xvacuum: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        xlength: Option<f64>,
        phi: f64,
        xnumber: f64,
    },
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Trapezoid {
    pub vacuum: f64,
    /// `None` until resolved: the plateau runs to the end of the box
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plateau: Option<f64>,
    pub slope1: f64,
    pub slope2: f64,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct GaussianAxis {
    pub vacuum: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fwhm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<f64>,
    pub order: u32,
}

const CONSTANT_PARAMS: &[&str] = &["value", "xvacuum", "yvacuum"];
const TRAPEZOIDAL_PARAMS: &[&str] = &[
    "max", "xvacuum", "xplateau", "xslope1", "xslope2", "yvacuum", "yplateau", "yslope1",
    "yslope2",
];
const GAUSSIAN_PARAMS: &[&str] = &[
    "max", "xvacuum", "xlength", "xfwhm", "xcenter", "xorder", "yvacuum", "ylength", "yfwhm",
    "ycenter", "yorder",
];
const POLYGONAL_PARAMS: &[&str] = &["xpoints", "xvalues"];
const COSINE_PARAMS: &[&str] = &["base", "amplitude", "xvacuum", "xlength", "phi", "xnumber"];

impl Profile {
    /// Function names a deck may call to build a profile.
    pub const NAMES: [&'static str; 5] =
        ["constant", "trapezoidal", "gaussian", "polygonal", "cosine"];

    pub fn is_profile_name(name: &str) -> bool {
        Self::NAMES.contains(&name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Profile::Constant { .. } => "constant",
            Profile::Trapezoidal { .. } => "trapezoidal",
            Profile::Gaussian { .. } => "gaussian",
            Profile::Polygonal { .. } => "polygonal",
            Profile::Cosine { .. } => "cosine",
        }
    }

    /// Build a profile from a deck call such as `trapezoidal(1., xplateau=10.)`.
    ///
    /// The error is a human readable reason; the caller knows the line.
    pub fn from_call(name: &str, args: Vec<Value>, kwargs: Vec<(String, Value)>) -> Result<Self, String> {
        let profile = match name {
            "constant" => {
                let a = Arguments::bind(CONSTANT_PARAMS, args, kwargs)?;
                Profile::Constant {
                    value: a.required(0)?,
                    xvacuum: a.float(1)?,
                    yvacuum: a.float(2)?,
                }
            }
            "trapezoidal" => {
                let a = Arguments::bind(TRAPEZOIDAL_PARAMS, args, kwargs)?;
                Profile::Trapezoidal {
                    max: a.required(0)?,
                    x: a.trapezoid(1)?,
                    y: a.trapezoid(5)?,
                }
            }
            "gaussian" => {
                let a = Arguments::bind(GAUSSIAN_PARAMS, args, kwargs)?;
                Profile::Gaussian {
                    max: a.required(0)?,
                    x: a.gaussian_axis(1)?,
                    y: a.gaussian_axis(6)?,
                }
            }
            "polygonal" => {
                let a = Arguments::bind(POLYGONAL_PARAMS, args, kwargs)?;
                Profile::Polygonal {
                    xpoints: a.required_list(0)?,
                    xvalues: a.required_list(1)?,
                }
            }
            "cosine" => {
                let a = Arguments::bind(COSINE_PARAMS, args, kwargs)?;
                Profile::Cosine {
                    base: a.required(0)?,
                    amplitude: a.float(1)?.unwrap_or(1.0),
                    xvacuum: a.float(2)?.unwrap_or(0.0),
                    xlength: a.float(3)?,
                    phi: a.float(4)?.unwrap_or(0.0),
                    xnumber: a.float(5)?.unwrap_or(1.0),
                }
            }
            _ => return Err(format!("`{name}` is not a profile")),
        };
        Ok(profile)
    }

    /// Inverse of [`Profile::from_call`]: the first parameter positionally,
    /// every other set parameter by keyword.
    pub fn to_call(&self) -> (Value, Vec<(&'static str, Value)>) {
        let mut kwargs = Vec::new();
        let first = match self {
            Profile::Constant {
                value,
                xvacuum,
                yvacuum,
            } => {
                push(&mut kwargs, "xvacuum", *xvacuum);
                push(&mut kwargs, "yvacuum", *yvacuum);
                Value::Float(*value)
            }
            Profile::Trapezoidal { max, x, y } => {
                for (axis, t) in [("x", x), ("y", y)] {
                    push(&mut kwargs, trapezoid_key(axis, "vacuum"), Some(t.vacuum));
                    push(&mut kwargs, trapezoid_key(axis, "plateau"), t.plateau);
                    push(&mut kwargs, trapezoid_key(axis, "slope1"), Some(t.slope1));
                    push(&mut kwargs, trapezoid_key(axis, "slope2"), Some(t.slope2));
                }
                Value::Float(*max)
            }
            Profile::Gaussian { max, x, y } => {
                for (i, g) in [x, y].into_iter().enumerate() {
                    let keys = &GAUSSIAN_PARAMS[1 + 5 * i..6 + 5 * i];
                    push(&mut kwargs, keys[0], Some(g.vacuum));
                    push(&mut kwargs, keys[1], g.length);
                    push(&mut kwargs, keys[2], g.fwhm);
                    push(&mut kwargs, keys[3], g.center);
                    kwargs.push((keys[4], Value::Int(i64::from(g.order))));
                }
                Value::Float(*max)
            }
            Profile::Polygonal { xpoints, xvalues } => {
                kwargs.push(("xvalues", float_list(xvalues)));
                float_list(xpoints)
            }
            Profile::Cosine {
                base,
                amplitude,
                xvacuum,
                xlength,
                phi,
                xnumber,
            } => {
                push(&mut kwargs, "amplitude", Some(*amplitude));
                push(&mut kwargs, "xvacuum", Some(*xvacuum));
                push(&mut kwargs, "xlength", *xlength);
                push(&mut kwargs, "phi", Some(*phi));
                push(&mut kwargs, "xnumber", Some(*xnumber));
                Value::Float(*base)
            }
        };
        (first, kwargs)
    }

    /// Fill every unset extent from the box lengths.
    ///
    /// Axes beyond `sim_length.len()` are left untouched.
    pub fn resolve(&self, sim_length: &[f64]) -> Profile {
        let mut resolved = self.clone();
        match &mut resolved {
            Profile::Trapezoidal { x, y, .. } => {
                for (t, length) in [x, y].into_iter().zip(sim_length) {
                    t.plateau.get_or_insert(length - t.vacuum);
                }
            }
            Profile::Gaussian { x, y, .. } => {
                for (g, box_length) in [x, y].into_iter().zip(sim_length) {
                    let length = *g.length.get_or_insert(box_length - g.vacuum);
                    g.fwhm.get_or_insert(length / 3.0);
                    g.center.get_or_insert(g.vacuum + length / 2.0);
                }
            }
            Profile::Cosine {
                xvacuum, xlength, ..
            } => {
                if let Some(length) = sim_length.first() {
                    xlength.get_or_insert(length - *xvacuum);
                }
            }
            Profile::Constant { .. } | Profile::Polygonal { .. } => {}
        }
        resolved
    }

    /// Reject extents and parameters the profile cannot be evaluated with.
    pub fn check(&self) -> Result<(), String> {
        match self {
            Profile::Constant {
                value,
                xvacuum,
                yvacuum,
            } => {
                finite("value", *value)?;
                finite_opt("xvacuum", *xvacuum)?;
                finite_opt("yvacuum", *yvacuum)?;
            }
            Profile::Trapezoidal { max, x, y } => {
                finite("max", *max)?;
                for (axis, t) in [("x", x), ("y", y)] {
                    non_negative(trapezoid_key(axis, "vacuum"), t.vacuum)?;
                    if let Some(plateau) = t.plateau {
                        non_negative(trapezoid_key(axis, "plateau"), plateau)?;
                    }
                    non_negative(trapezoid_key(axis, "slope1"), t.slope1)?;
                    non_negative(trapezoid_key(axis, "slope2"), t.slope2)?;
                }
            }
            Profile::Gaussian { max, x, y } => {
                finite("max", *max)?;
                for (axis, g) in [("x", x), ("y", y)] {
                    non_negative(&format!("{axis}vacuum"), g.vacuum)?;
                    positive_opt(&format!("{axis}length"), g.length)?;
                    positive_opt(&format!("{axis}fwhm"), g.fwhm)?;
                    finite_opt(&format!("{axis}center"), g.center)?;
                    if g.order == 0 {
                        return Err(format!("`{axis}order` must be at least 1"));
                    }
                }
            }
            Profile::Polygonal { xpoints, xvalues } => {
                if xpoints.len() != xvalues.len() {
                    return Err(format!(
                        "`xpoints` has {} entries but `xvalues` has {}",
                        xpoints.len(),
                        xvalues.len()
                    ));
                }
                if xpoints.len() < 2 {
                    return Err("needs at least two points".to_string());
                }
                for (p, v) in xpoints.iter().zip(xvalues) {
                    finite("xpoints", *p)?;
                    finite("xvalues", *v)?;
                }
                if xpoints.windows(2).any(|w| w[0] >= w[1]) {
                    return Err("`xpoints` must be strictly increasing".to_string());
                }
            }
            Profile::Cosine {
                base,
                amplitude,
                xvacuum,
                xlength,
                phi,
                xnumber,
            } => {
                finite("base", *base)?;
                finite("amplitude", *amplitude)?;
                non_negative("xvacuum", *xvacuum)?;
                positive_opt("xlength", *xlength)?;
                finite("phi", *phi)?;
                finite("xnumber", *xnumber)?;
            }
        }
        Ok(())
    }

    /// Value of the profile at `position` (`[x]` or `[x, y]`).
    ///
    /// Unresolved extents behave as if they reached infinitely far.
    pub fn evaluate(&self, position: &[f64]) -> f64 {
        let x = position.first().copied().unwrap_or(0.0);
        let y = position.get(1).copied();
        match self {
            Profile::Constant {
                value,
                xvacuum,
                yvacuum,
            } => {
                let inside_x = xvacuum.map_or(true, |v| x >= v);
                let inside_y = match (y, yvacuum) {
                    (Some(y), Some(v)) => y >= *v,
                    _ => true,
                };
                if inside_x && inside_y {
                    *value
                } else {
                    0.0
                }
            }
            Profile::Trapezoidal { max, x: tx, y: ty } => {
                max * tx.factor(x) * y.map_or(1.0, |y| ty.factor(y))
            }
            Profile::Gaussian { max, x: gx, y: gy } => {
                max * gx.factor(x) * y.map_or(1.0, |y| gy.factor(y))
            }
            Profile::Polygonal { xpoints, xvalues } => {
                if xpoints.is_empty() || x < xpoints[0] {
                    return 0.0;
                }
                for i in 1..xpoints.len() {
                    if x < xpoints[i] {
                        let slope = (xvalues[i] - xvalues[i - 1]) / (xpoints[i] - xpoints[i - 1]);
                        return xvalues[i - 1] + slope * (x - xpoints[i - 1]);
                    }
                }
                0.0
            }
            Profile::Cosine {
                base,
                amplitude,
                xvacuum,
                xlength,
                phi,
                xnumber,
            } => {
                let length = xlength.unwrap_or(f64::INFINITY);
                if x < *xvacuum || x > xvacuum + length {
                    return 0.0;
                }
                base + amplitude
                    * (phi + 2.0 * std::f64::consts::PI * xnumber * (x - xvacuum) / length).cos()
            }
        }
    }
}

impl Trapezoid {
    /// Normalised height in `[0, 1]` at `pos`.
    fn factor(&self, pos: f64) -> f64 {
        let plateau = self.plateau.unwrap_or(f64::INFINITY);
        let ramp_end = self.vacuum + self.slope1;
        let plateau_end = ramp_end + plateau;
        if pos < self.vacuum {
            0.0
        } else if pos < ramp_end {
            (pos - self.vacuum) / self.slope1
        } else if pos < plateau_end {
            1.0
        } else if pos < plateau_end + self.slope2 {
            1.0 - (pos - plateau_end) / self.slope2
        } else {
            0.0
        }
    }
}

impl GaussianAxis {
    fn factor(&self, pos: f64) -> f64 {
        let length = self.length.unwrap_or(f64::INFINITY);
        if pos < self.vacuum || pos > self.vacuum + length {
            return 0.0;
        }
        let (Some(fwhm), Some(center)) = (self.fwhm, self.center) else {
            // unbounded axis: flat
            return 1.0;
        };
        let sigma = (0.5 * fwhm).powi(self.order as i32) / std::f64::consts::LN_2;
        (-(pos - center).powi(self.order as i32) / sigma).exp()
    }
}

fn trapezoid_key(axis: &str, field: &str) -> &'static str {
    let index = match field {
        "vacuum" => 1,
        "plateau" => 2,
        "slope1" => 3,
        _ => 4,
    };
    let offset = if axis == "x" { 0 } else { 4 };
    TRAPEZOIDAL_PARAMS[index + offset]
}

fn push(kwargs: &mut Vec<(&'static str, Value)>, key: &'static str, value: Option<f64>) {
    if let Some(v) = value {
        kwargs.push((key, Value::Float(v)));
    }
}

fn float_list(values: &[f64]) -> Value {
    Value::List(values.iter().copied().map(Value::Float).collect())
}

fn finite(name: &str, value: f64) -> Result<(), String> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(format!("`{name}` must be finite"))
    }
}

fn finite_opt(name: &str, value: Option<f64>) -> Result<(), String> {
    value.map_or(Ok(()), |v| finite(name, v))
}

fn non_negative(name: &str, value: f64) -> Result<(), String> {
    finite(name, value)?;
    if value < 0.0 {
        return Err(format!("`{name}` must not be negative (got {value})"));
    }
    Ok(())
}

fn positive_opt(name: &str, value: Option<f64>) -> Result<(), String> {
    match value {
        Some(v) if !(v.is_finite() && v > 0.0) => Err(format!("`{name}` must be positive (got {v})")),
        _ => Ok(()),
    }
}

/// Call arguments matched against a parameter list, Python style.
struct Arguments {
    params: &'static [&'static str],
    slots: Vec<Option<Value>>,
}

impl Arguments {
    fn bind(
        params: &'static [&'static str],
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> Result<Self, String> {
        if args.len() > params.len() {
            return Err(format!(
                "takes at most {} positional arguments ({} given)",
                params.len(),
                args.len()
            ));
        }
        let mut slots: Vec<Option<Value>> = vec![None; params.len()];
        for (slot, value) in slots.iter_mut().zip(args) {
            *slot = Some(value);
        }
        for (key, value) in kwargs {
            let Some(index) = params.iter().position(|p| *p == key) else {
                return Err(format!("unexpected keyword argument `{key}`"));
            };
            if slots[index].is_some() {
                return Err(format!("got multiple values for `{key}`"));
            }
            slots[index] = Some(value);
        }
        // an explicit `None` means "use the default"
        for slot in slots.iter_mut() {
            if matches!(slot, Some(Value::None)) {
                *slot = None;
            }
        }
        Ok(Arguments { params, slots })
    }

    fn float(&self, index: usize) -> Result<Option<f64>, String> {
        match &self.slots[index] {
            None => Ok(None),
            Some(value) => value.as_f64().map(Some).ok_or_else(|| {
                format!(
                    "`{}` must be a number, not {}",
                    self.params[index],
                    value.type_name()
                )
            }),
        }
    }

    fn required(&self, index: usize) -> Result<f64, String> {
        self.float(index)?
            .ok_or_else(|| format!("missing required argument `{}`", self.params[index]))
    }

    fn required_list(&self, index: usize) -> Result<Vec<f64>, String> {
        let name = self.params[index];
        match &self.slots[index] {
            None => Err(format!("missing required argument `{name}`")),
            Some(Value::List(items)) => items
                .iter()
                .map(|v| {
                    v.as_f64()
                        .ok_or_else(|| format!("`{name}` must only contain numbers"))
                })
                .collect(),
            Some(other) => Err(format!("`{name}` must be a list, not {}", other.type_name())),
        }
    }

    fn order(&self, index: usize) -> Result<u32, String> {
        match &self.slots[index] {
            None => Ok(2),
            Some(Value::Int(i)) => u32::try_from(*i)
                .map_err(|_| format!("`{}` must be a positive integer", self.params[index])),
            Some(other) => Err(format!(
                "`{}` must be an integer, not {}",
                self.params[index],
                other.type_name()
            )),
        }
    }

    /// Four trapezoid extents starting at `start`.
    fn trapezoid(&self, start: usize) -> Result<Trapezoid, String> {
        Ok(Trapezoid {
            vacuum: self.float(start)?.unwrap_or(0.0),
            plateau: self.float(start + 1)?,
            slope1: self.float(start + 2)?.unwrap_or(0.0),
            slope2: self.float(start + 3)?.unwrap_or(0.0),
        })
    }

    fn gaussian_axis(&self, start: usize) -> Result<GaussianAxis, String> {
        Ok(GaussianAxis {
            vacuum: self.float(start)?.unwrap_or(0.0),
            length: self.float(start + 1)?,
            fwhm: self.float(start + 2)?,
            center: self.float(start + 3)?,
            order: self.order(start + 4)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn kw(key: &str, value: f64) -> (String, Value) {
        (key.to_string(), Value::Float(value))
    }

    #[test]
    fn test_trapezoidal_shape() {
        let profile = Profile::from_call(
            "trapezoidal",
            vec![Value::Float(2.0)],
            vec![
                kw("xvacuum", 1.0),
                kw("xslope1", 2.0),
                kw("xplateau", 3.0),
                kw("xslope2", 4.0),
            ],
        )
        .unwrap();
        assert_eq!(profile.evaluate(&[0.5]), 0.0);
        assert_abs_diff_eq!(profile.evaluate(&[2.0]), 1.0);
        assert_abs_diff_eq!(profile.evaluate(&[4.0]), 2.0);
        assert_abs_diff_eq!(profile.evaluate(&[8.0]), 1.0);
        assert_eq!(profile.evaluate(&[10.0]), 0.0);
    }

    #[test]
    fn test_trapezoidal_plateau_resolves_to_box_end() {
        let profile = Profile::from_call(
            "trapezoidal",
            vec![Value::Float(1e-5)],
            vec![kw("xvacuum", 20.0)],
        )
        .unwrap();
        let Profile::Trapezoidal { x, y, .. } = profile.resolve(&[40.0]) else {
            panic!("expected a trapezoid");
        };
        assert_eq!(x.plateau, Some(20.0));
        assert_eq!(y.plateau, None);
    }

    #[test]
    fn test_gaussian_peak_and_half_maximum() {
        let profile = Profile::from_call("gaussian", vec![Value::Float(3.0)], vec![])
            .unwrap()
            .resolve(&[30.0]);
        // length 30, fwhm 10, centre 15
        assert_abs_diff_eq!(profile.evaluate(&[15.0]), 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(profile.evaluate(&[20.0]), 1.5, epsilon = 1e-12);
        assert_eq!(profile.evaluate(&[31.0]), 0.0);
    }

    #[test]
    fn test_polygonal_interpolates() {
        let profile = Profile::from_call(
            "polygonal",
            vec![],
            vec![
                ("xpoints".to_string(), Value::List(vec![Value::Int(0), Value::Int(2), Value::Int(4)])),
                ("xvalues".to_string(), Value::List(vec![Value::Int(0), Value::Int(1), Value::Float(0.5)])),
            ],
        )
        .unwrap();
        assert!(profile.check().is_ok());
        assert_abs_diff_eq!(profile.evaluate(&[1.0]), 0.5);
        assert_abs_diff_eq!(profile.evaluate(&[3.0]), 0.75);
        assert_eq!(profile.evaluate(&[4.0]), 0.0);
        assert_eq!(profile.evaluate(&[-1.0]), 0.0);
    }

    #[test]
    fn test_polygonal_rejects_unsorted_points() {
        let profile = Profile::Polygonal {
            xpoints: vec![0.0, 2.0, 1.0],
            xvalues: vec![1.0, 1.0, 1.0],
        };
        assert!(profile.check().unwrap_err().contains("strictly increasing"));
    }

    #[test]
    fn test_cosine_period() {
        let profile = Profile::from_call(
            "cosine",
            vec![Value::Float(1.0)],
            vec![kw("amplitude", 0.5), kw("xnumber", 2.0)],
        )
        .unwrap()
        .resolve(&[8.0]);
        assert_abs_diff_eq!(profile.evaluate(&[0.0]), 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(profile.evaluate(&[2.0]), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(profile.evaluate(&[4.0]), 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_with_vacuum_in_2d() {
        let profile = Profile::from_call(
            "constant",
            vec![Value::Int(4)],
            vec![kw("yvacuum", 1.0)],
        )
        .unwrap();
        assert_eq!(profile.evaluate(&[0.0, 2.0]), 4.0);
        assert_eq!(profile.evaluate(&[0.0, 0.5]), 0.0);
        assert_eq!(profile.evaluate(&[0.0]), 4.0);
    }

    #[test]
    fn test_bad_arguments() {
        let err = Profile::from_call("trapezoidal", vec![], vec![kw("xplateau", 1.0)]).unwrap_err();
        assert_eq!(err, "missing required argument `max`");

        let err = Profile::from_call("constant", vec![Value::Int(1)], vec![kw("zvacuum", 1.0)])
            .unwrap_err();
        assert_eq!(err, "unexpected keyword argument `zvacuum`");

        let err = Profile::from_call("constant", vec![Value::Int(1)], vec![kw("value", 1.0)])
            .unwrap_err();
        assert_eq!(err, "got multiple values for `value`");
    }

    #[test]
    fn test_negative_extent_rejected() {
        let profile =
            Profile::from_call("trapezoidal", vec![Value::Int(1)], vec![kw("xslope1", -1.0)])
                .unwrap();
        assert!(profile.check().unwrap_err().contains("xslope1"));
    }

    #[test]
    fn test_call_round_trip() {
        let profile = Profile::from_call(
            "gaussian",
            vec![Value::Float(2.0)],
            vec![kw("xfwhm", 3.0), ("yorder".to_string(), Value::Int(4))],
        )
        .unwrap();
        let (first, kwargs) = profile.to_call();
        let kwargs = kwargs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        assert_eq!(Profile::from_call("gaussian", vec![first], kwargs).unwrap(), profile);
    }
}
