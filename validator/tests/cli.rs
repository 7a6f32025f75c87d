use std::path::PathBuf;
use std::process::{Command, Output};

const DECKS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../common/tests/decks");

fn picdeck(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_picdeck"))
        .args(args)
        .output()
        .unwrap()
}

fn deck(name: &str) -> String {
    format!("{DECKS}/{name}")
}

fn scratch(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("picdeck-{}-{name}", std::process::id()))
}

#[test]
fn test_valid_deck() {
    let output = picdeck(&["--input", &deck("thermalisation.py")]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ok (2 species, 3 collision blocks)"));
}

#[test]
fn test_verbose_summary() {
    let output = picdeck(&["--input", &deck("stopping_power.py"), "--verbose"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("geometry       = 1d3v"));
    assert!(stdout.contains("species        = electron2"));
}

#[test]
fn test_invalid_deck_fails() {
    let output = picdeck(&["--input", &deck("unknown_species.py")]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown species `electron3`"));
}

#[test]
fn test_emitted_files_reload() {
    let script = scratch("deck.py");
    let toml = scratch("deck.toml");
    let output = picdeck(&[
        "--input",
        &deck("laser_plasma_2d.py"),
        "--emit-script",
        script.to_str().unwrap(),
        "--emit-toml",
        toml.to_str().unwrap(),
    ]);
    assert!(output.status.success());

    for path in [&script, &toml] {
        let output = picdeck(&["--input", path.to_str().unwrap()]);
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        std::fs::remove_file(path).unwrap();
    }
}

#[test]
fn test_bad_log_level() {
    let output = picdeck(&["--input", &deck("thermalisation.py"), "--log-level", "loud"]);
    assert!(!output.status.success());
}
