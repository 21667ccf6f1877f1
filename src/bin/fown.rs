//! fown - field ownership inspection tool
//!
//! Shows which fields a manager owns on a Kubernetes object, projects them
//! out, and reports drift between a manifest and the live object.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgGroup, Parser, Subcommand};
use field_ownership::fieldpath::FieldSet;
use field_ownership::project::{compare_owned_with, FieldProjector, Mismatch};
use field_ownership::schema::ArrayPolicy;
use field_ownership::value::{self, Value};
use field_ownership::OwnershipAccumulator;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// fown - inspect Server-Side Apply field ownership
#[derive(Parser, Debug)]
#[command(name = "fown")]
#[command(version, about, long_about = None)]
struct Cli {
    /// YAML file overriding which lists are keyed or positional
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the paths a manager owns, one per line
    Owned {
        #[arg(short, long)]
        manager: String,
        /// Live object, including metadata.managedFields
        #[arg(short, long)]
        live: PathBuf,
        /// Manifest used when the manager has not written the object yet
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
    /// Print the projection of a path set as JSON
    #[command(group(ArgGroup::new("paths").required(true).args(["path", "manager"])))]
    Project {
        #[arg(short, long)]
        live: PathBuf,
        /// Dotted path such as spec.template.spec.containers[0].image
        #[arg(short, long)]
        path: Vec<String>,
        /// Project everything this manager owns
        #[arg(short, long)]
        manager: Option<String>,
    },
    /// Compare a manifest with the live object on the manager's paths;
    /// exits with 1 when they differ
    Drift {
        #[arg(short, long)]
        manager: String,
        #[arg(short, long)]
        live: PathBuf,
        #[arg(long)]
        manifest: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

/// Runs the command; returns false when drift was found.
fn run(cli: Cli) -> CliResult<bool> {
    let policy = match &cli.policy {
        Some(file) => load_policy(file)?,
        None => ArrayPolicy::default(),
    };

    match cli.command {
        Command::Owned { manager, live, manifest } => {
            let live = read_object(&live)?;
            let manifest = read_optional(manifest.as_deref())?;
            let owned = OwnershipAccumulator::new(manager)
                .with_policy(policy)
                .accumulate_object(&live, &manifest);
            println!("{}", owned);
        }
        Command::Project { live, path, manager } => {
            let live = read_object(&live)?;
            let projector = FieldProjector::new().with_policy(policy.clone());
            let projection = match manager {
                Some(manager) => {
                    let owned = OwnershipAccumulator::new(manager)
                        .with_policy(policy)
                        .accumulate_object(&live, &Value::Null);
                    projector.project(&owned, &live)?
                }
                None => {
                    let paths = FieldSet::parse_all(path.iter().map(String::as_str))?;
                    projector.on_mismatch(Mismatch::Skip).project(&paths, &live)?
                }
            };
            println!("{}", serde_json::to_string_pretty(&serde_json::Value::from(&projection))?);
        }
        Command::Drift { manager, live, manifest } => {
            let live = read_object(&live)?;
            let manifest = read_object(&manifest)?;
            let owned = OwnershipAccumulator::new(manager)
                .with_policy(policy.clone())
                .accumulate_object(&live, &manifest);
            let projector = FieldProjector::new().with_policy(policy);
            let comparison = compare_owned_with(&projector, &manifest, &live, &owned);
            if comparison.is_same() {
                println!("No drift");
            } else {
                println!("{}", comparison);
                return Ok(false);
            }
        }
    }
    Ok(true)
}

fn load_policy(path: &Path) -> CliResult<ArrayPolicy> {
    let content = fs::read_to_string(path).map_err(|e| format!("reading {}: {}", path.display(), e))?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Reads a JSON or YAML object.
fn read_object(path: &Path) -> CliResult<Value> {
    let content = fs::read_to_string(path).map_err(|e| format!("reading {}: {}", path.display(), e))?;
    let object = value::from_yaml(&content).map_err(|e| format!("parsing {}: {}", path.display(), e))?;
    if !object.is_map() {
        return Err(format!("{}: expected an object, found {}", path.display(), object.kind()).into());
    }
    Ok(object)
}

fn read_optional(path: Option<&Path>) -> CliResult<Value> {
    match path {
        Some(path) => read_object(path),
        None => Ok(Value::Null),
    }
}
