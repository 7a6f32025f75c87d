use clap::Parser;
use log::{info, LevelFilter};
use picdeck_common::{read_deck, read_toml, Deck, DeckError};
use std::{error::Error, str::FromStr};

#[derive(Parser, Debug)]
#[command(author, version, about = "Load and validate a PIC input deck", long_about = None)]
struct Args {
    /// path to the deck (a script, or a `.toml` written by --emit-toml)
    #[arg(short, long)]
    input: String,

    /// print a summary of the validated deck
    #[arg(short, long)]
    verbose: bool,

    /// write the validated deck back as a canonical script
    #[arg(long)]
    emit_script: Option<String>,

    /// write the validated deck as toml
    #[arg(long)]
    emit_toml: Option<String>,

    /// off, error, warn, info, debug or trace
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn load(path: &str) -> Result<Deck, DeckError> {
    if path.ends_with(".toml") {
        read_toml(path)
    } else {
        read_deck(path)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    env_logger::builder()
        .format_timestamp_secs()
        .filter_level(LevelFilter::from_str(&args.log_level)?)
        .init();

    let deck = match load(&args.input) {
        Ok(deck) => deck,
        Err(e) => {
            eprintln!("{}: {e}", args.input);
            std::process::exit(1);
        }
    };

    if args.verbose {
        println!("Deck {}\n{deck}", args.input);
    } else {
        println!(
            "{}: ok ({} species, {} collision blocks)",
            args.input,
            deck.species.len(),
            deck.collisions.len()
        );
    }

    if let Some(path) = &args.emit_script {
        deck.write_script(path)?;
        info!("wrote {path}");
    }
    if let Some(path) = &args.emit_toml {
        deck.write_toml(path)?;
        info!("wrote {path}");
    }

    Ok(())
}
