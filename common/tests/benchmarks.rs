use approx::{assert_abs_diff_eq, assert_relative_eq};
use picdeck_common::*;
use std::f64::consts::PI;

const STOPPING_POWER: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/decks/stopping_power.py");
const THERMALISATION: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/decks/thermalisation.py");
const LASER_PLASMA_2D: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/decks/laser_plasma_2d.py");
const UNKNOWN_SPECIES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/decks/unknown_species.py");

const L0: f64 = 2.0 * PI;

fn source(path: &str) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn test_stopping_power_deck() {
    let deck = read_deck(STOPPING_POWER).unwrap();

    assert_eq!(deck.main.geometry.to_string(), "1d3v");
    assert_eq!(deck.main.cells(), vec![20]);
    assert_eq!(deck.main.n_time(), 25);
    assert_relative_eq!(
        deck.main.reference_wavelength_si().unwrap(),
        1e-6 * SPEED_OF_LIGHT_SI / 3e8,
        max_relative = 1e-12
    );

    let names: Vec<_> = deck.species.iter().map(|s| s.species_type.as_str()).collect();
    assert_eq!(names, ["backgroundelectron", "electron1", "electron2"]);
    assert_eq!(deck.species[0].temperature, [0.01; 3]);
    assert_eq!(deck.species[1].ionization_model, IonizationModel::Disabled);

    // electron1 fills the first half of the box, electron2 the second
    let (electron1, electron2) = (&deck.species[1], &deck.species[2]);
    assert_abs_diff_eq!(electron1.density_at(&[10000. * L0]), 1e-5);
    assert_eq!(electron1.density_at(&[30000. * L0]), 0.0);
    assert_eq!(electron2.density_at(&[10000. * L0]), 0.0);
    assert_abs_diff_eq!(electron2.density_at(&[30000. * L0]), 1e-5);

    let collisions = &deck.collisions[0];
    assert_eq!(collisions.species2, ["electron1", "electron2"]);
    assert!(!collisions.is_intra());
    assert_eq!(collisions.coulomb_log, 3.0);

    let diag = &deck.diag_particles[0];
    assert_eq!(diag.axes[1].variable, AxisVariable::Ekin);
    assert!(diag.axes[1].logscale);
    assert_eq!(deck.diag_scalar.as_ref().map(|d| d.precision), Some(DEFAULT_SCALAR_PRECISION));
}

#[test]
fn test_thermalisation_deck() {
    let deck = read_deck(THERMALISATION).unwrap();

    assert_eq!(deck.main.cells(), vec![100]);
    assert_eq!(deck.species_index("electron1"), Some(1));
    assert_eq!(deck.species[0].temperature, [0.00015; 3]);

    let intra: Vec<bool> = deck.collisions.iter().map(Collisions::is_intra).collect();
    assert_eq!(intra, [false, true, true]);
    assert!(deck.collisions.iter().all(|c| !c.auto_coulomb_log()));
    assert_eq!(deck.diag_particles.len(), 2);
    assert_eq!(deck.diag_particles[0].time_average, 1);
}

#[test]
fn test_two_dimensional_deck() {
    let deck = read_deck(LASER_PLASMA_2D).unwrap();

    assert_eq!(deck.n_space(), 2);
    assert_eq!(deck.main.cells(), vec![512, 256]);
    assert_eq!(deck.main.random_seed, Some(1234));
    assert_eq!(deck.main.print_every, DEFAULT_PRINT_EVERY);

    let eon = &deck.species[0];
    assert_eq!(eon.density.kind, DensityKind::Number);
    assert_abs_diff_eq!(eon.density_at(&[18. * L0, 8. * L0]), 0.5, epsilon = 1e-12);
    assert_eq!(eon.density_at(&[2. * L0, 8. * L0]), 0.0);

    let ion = &deck.species[1];
    assert_eq!(ion.ionization_model, IonizationModel::Tunnel);
    assert_eq!(ion.track_every, 8);
    assert!(!eon.is_tracked());
    assert_abs_diff_eq!(ion.density_at(&[6. * L0, 0.0]), 0.25, epsilon = 1e-12);

    assert!(deck.collisions[0].ionizing);
    assert_eq!(deck.diag_fields[0].fields.len(), 4);
    assert_eq!(deck.diag_probes[0].dimension(), 1);
    assert!(deck.diag_scalar.is_none());
}

#[test]
fn test_unknown_species_is_named() {
    let err = read_deck(UNKNOWN_SPECIES).unwrap_err();
    assert!(matches!(
        &err,
        DeckError::Validation(ValidationError::UnknownSpecies { name, .. }) if name == "electron3"
    ));
    assert!(err.to_string().contains("electron3"));
}

#[test]
fn test_diagnostic_names_undeclared_species() {
    let deck = source(STOPPING_POWER).replace(
        "species = [\"electron1\", \"electron2\"]",
        "species = [\"electron1\", \"ghost\"]",
    );
    let err = load_str(&deck).unwrap_err();
    assert!(matches!(
        &err,
        DeckError::Validation(ValidationError::UnknownSpecies { record, name })
            if record == "DiagParticles #0" && name == "ghost"
    ));
    assert!(err.to_string().contains("ghost"));
}

#[test]
fn test_sampling_intervals_must_be_positive() {
    let deck = source(STOPPING_POWER);
    let cases = [
        ("DiagFields(\n\tevery = 1", "DiagFields(\n\tevery = 0", "DiagFields #0"),
        ("DiagScalar(\n\tevery = 1", "DiagScalar(\n\tevery = 0", "DiagScalar"),
        ("every = 2,", "every = 0,", "DiagParticles #0"),
    ];
    for (from, to, label) in cases {
        assert!(deck.contains(from), "{from}");
        let err = load_str(&deck.replace(from, to)).unwrap_err();
        assert!(
            matches!(
                &err,
                DeckError::Validation(ValidationError::InvalidRange { record, field, .. })
                    if record == label && field == "every"
            ),
            "{label}: {err}"
        );
    }

    let probe = source(LASER_PLASMA_2D).replace("every = 4,", "every = 0,");
    assert!(matches!(
        load_str(&probe),
        Err(DeckError::Validation(ValidationError::InvalidRange { ref field, .. })) if field == "every"
    ));
}

#[test]
fn test_run_shorter_than_a_timestep_is_accepted() {
    let fixed = source(UNKNOWN_SPECIES).replace(", \"electron3\"", "");
    let deck = load_str(&fixed).unwrap();
    assert!(deck.main.sim_time < deck.main.timestep);
}

#[test]
fn test_script_round_trip() {
    for path in [STOPPING_POWER, THERMALISATION, LASER_PLASMA_2D] {
        let deck = read_deck(path).unwrap();
        let script = deck.to_script();
        assert_eq!(load_str(&script).unwrap(), deck, "{path}:\n{script}");
    }
}

#[test]
fn test_toml_round_trip() {
    for path in [STOPPING_POWER, THERMALISATION, LASER_PLASMA_2D] {
        let deck = read_deck(path).unwrap();
        let toml = deck.to_toml().unwrap();
        assert_eq!(Deck::from_toml_str(&toml).unwrap(), deck, "{path}:\n{toml}");
    }
}

#[test]
fn test_toml_is_validated() {
    let mut deck = read_deck(STOPPING_POWER).unwrap();
    deck.collisions[0].species1 = vec!["electron3".to_string()];
    let toml = deck.to_toml().unwrap();
    assert!(matches!(
        Deck::from_toml_str(&toml),
        Err(DeckError::Validation(ValidationError::UnknownSpecies { .. }))
    ));
    assert!(matches!(
        Deck::from_toml_str("main = 1"),
        Err(DeckError::TomlParseError { .. })
    ));
}

#[test]
fn test_axis_bounds_must_be_ordered() {
    let deck = source(STOPPING_POWER).replace("0.1,  1,", "1.5,  1,");
    let err = load_str(&deck).unwrap_err();
    assert!(matches!(
        err,
        DeckError::Validation(ValidationError::InvalidRange { ref field, .. }) if field == "axes"
    ));
    assert!(err.to_string().contains("lower bound 1.5"));
}

#[test]
fn test_axis_needs_bins() {
    let deck = source(STOPPING_POWER).replace("40000.*L0,   2]", "40000.*L0,   0]");
    let err = load_str(&deck).unwrap_err();
    assert!(err.to_string().contains("positive bin count"));
}

#[test]
fn test_unknown_profile() {
    let deck = source(STOPPING_POWER).replace("trapezoidal(0.00001, xplateau", "parabolic(0.00001, xplateau");
    assert!(matches!(
        load_str(&deck),
        Err(DeckError::Eval(EvalError::UnknownProfile { ref name, .. })) if name == "parabolic"
    ));
}

#[test]
fn test_syntax_errors_carry_positions() {
    assert!(matches!(
        load_str("Main(geometry = \"1d3v\" $)"),
        Err(DeckError::Lex(LexError { line: 1, .. }))
    ));
    assert!(matches!(
        load_str("\nMain(geometry = \"1d3v\""),
        Err(DeckError::Parse(ParseError { line: 2, .. }))
    ));
}

#[test]
fn test_missing_file() {
    assert!(matches!(
        read_deck("no/such/deck.py"),
        Err(DeckError::ReadError { .. })
    ));
}
