use clap::{Parser, Subcommand};
use molsift::codec::{scan, BinaryMolecule, DecodeOptions, FormatError, Header};
use molsift::config::{ConfigError, SearchConfig, SearchMode, SimilarityConfig};
use molsift::fingerprint::{self, FingerprintOptions};
use molsift::molecule::Molecule;
use molsift::search::{self, Score, SearchError, SubstructureQuery};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use thiserror::Error;
use tracing::*;
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Error)]
enum CliError {
    #[error("couldn't read {}: {err}", path.display())]
    Read {
        path: PathBuf,
        err: std::io::Error,
    },
    #[error("{}: {err}", path.display())]
    Format { path: PathBuf, err: FormatError },
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Raise log verbosity, repeat for more
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a payload's header and atoms
    Inspect { file: PathBuf },
    /// Print a payload's substructure fingerprint as index terms
    Fingerprint {
        file: PathBuf,
        /// Generate the reduced query fingerprint instead
        #[arg(long)]
        query: bool,
    },
    /// Check whether one payload is contained in another
    Match {
        query: PathBuf,
        target: PathBuf,
        /// Require the whole target to match
        #[arg(long)]
        exact: bool,
        /// Candidate pairs the matcher may try
        #[arg(long)]
        budget: Option<u64>,
    },
    /// Print the Tanimoto similarity of two payloads
    Similarity {
        a: PathBuf,
        b: PathBuf,
        #[arg(long, default_value_t = SimilarityConfig::DEFAULT_RADIUS)]
        radius: usize,
    },
}

fn read(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|err| CliError::Read {
        path: path.to_path_buf(),
        err,
    })
}

fn decode(path: &Path, bytes: &[u8], options: &DecodeOptions) -> Result<BinaryMolecule, CliError> {
    BinaryMolecule::decode(bytes, options).map_err(|err| CliError::Format {
        path: path.to_path_buf(),
        err,
    })
}

fn inspect(file: &Path) -> Result<(), CliError> {
    let bytes = read(file)?;
    let extended = scan::is_extended(&bytes, true, true).map_err(|err| CliError::Format {
        path: file.to_path_buf(),
        err,
    })?;
    let molecule = decode(file, &bytes, &DecodeOptions::full().with_extended(extended))?;
    let Header {
        x_atoms,
        c_atoms,
        h_atoms,
        x_bonds,
        specials,
    } = *molecule.header();
    println!("{x_atoms} explicit, {c_atoms} carbon, {h_atoms} hydrogen, {x_bonds} bonds, {specials} specials");
    for atom in 0..molecule.atom_count() {
        let neighbours = molecule.bonded_atoms(atom);
        print!(
            "{atom:>4} {} H{} {:+}",
            molecule.atom_kind(atom),
            molecule.atom_hydrogen_count(atom),
            molecule.atom_formal_charge(atom)
        );
        if molecule.atom_stereo(atom).is_defined() {
            print!(" @{}", molecule.atom_stereo(atom).0);
        }
        println!(" -> {neighbours:?}");
    }
    Ok(())
}

fn print_fingerprint(file: &Path, query: bool) -> Result<(), CliError> {
    let bytes = read(file)?;
    let molecule = decode(file, &bytes, &DecodeOptions::compact())?;
    let options = if query {
        FingerprintOptions::query()
    } else {
        FingerprintOptions::index()
    };
    let fp = fingerprint::substructure_fingerprint(&molecule, &options);
    for feature in fp.iter() {
        println!("{}", search::bit_as_term(feature));
    }
    Ok(())
}

fn run_match(query: &Path, target: &Path, exact: bool, budget: Option<u64>) -> Result<(), CliError> {
    let search = if exact {
        SearchMode::Exact
    } else {
        SearchMode::Substructure
    };
    let config = SearchConfig::new()
        .with_search(search)
        .with_iteration_limit(budget);
    let query = SubstructureQuery::from_bytes(read(query)?, None, &config)?;
    let bytes = read(target)?;
    let start = Instant::now();
    let score = query.score(&bytes).map_err(|err| CliError::Format {
        path: target.to_path_buf(),
        err,
    })?;
    debug!(time = ?start.elapsed(), "matched");
    match score {
        Score::Match(score) => println!("match {score:.4}"),
        Score::NoMatch => println!("no match"),
        Score::BudgetExceeded => println!("budget exceeded"),
    }
    Ok(())
}

fn similarity(a: &Path, b: &Path, radius: usize) -> Result<(), CliError> {
    let config = SimilarityConfig::new(SimilarityConfig::DEFAULT_THRESHOLD, radius)?;
    let fp = |path: &Path| -> Result<_, CliError> {
        let bytes = read(path)?;
        let molecule = decode(path, &bytes, &DecodeOptions::compact())?;
        Ok(fingerprint::similarity_fingerprint(&molecule, config.radius()))
    };
    println!("{:.4}", search::tanimoto(&fp(a)?, &fp(b)?));
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    let res = match &cli.command {
        Command::Inspect { file } => inspect(file),
        Command::Fingerprint { file, query } => print_fingerprint(file, *query),
        Command::Match {
            query,
            target,
            exact,
            budget,
        } => run_match(query, target, *exact, *budget),
        Command::Similarity { a, b, radius } => similarity(a, b, *radius),
    };
    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
