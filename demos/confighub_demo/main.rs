//! # confighub demo application
//!
//! A small CLI that pulls from a ConfigHub repository and prints what it got.
//! It exists to exercise the client by hand, not as a real tool.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example confighub_demo -- --token $TOKEN --context "Development;App" list
//! cargo run --example confighub_demo -- --account ConfigHub --repository UnitTest \
//!     --context "Development;UnitTest" --server demo.confighub.com get db.port
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature             | How to exercise it                                          |
//! |---------------------|-------------------------------------------------------------|
//! | Settings file       | Put `confighub.toml` in the platform config dir, run `list` |
//! | Env var override    | `CONFIGHUB_CONTEXT="Production;App" ... list`               |
//! | CLI flags           | `--tag`, `--date`, `--decrypt group=password`               |
//! | Offline snapshot    | `save conf.json`, then `--offline conf.json list`           |
//! | Pulled files        | `file server/conf/tomee.xml out/tomee.xml`                  |
//! | Push                | `push some.key value "Development;App"`                     |

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use confighub::{ConfigHub, ConfigHubError, ConnectionArgs};

#[derive(Parser, Debug)]
#[command(name = "confighub-demo")]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Load a saved snapshot instead of pulling.
    #[arg(long, global = true, value_name = "PATH")]
    offline: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every pulled property.
    List,
    /// Print one property.
    Get { key: String },
    /// Write a pulled file to disk.
    File { path: String, destination: PathBuf },
    /// Save the pulled configuration as a snapshot.
    Save { path: PathBuf },
    /// Push a single value, creating the key if needed.
    Push {
        key: String,
        value: String,
        context: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), ConfigHubError> {
    let mut hub = cli.connection.into_builder()?.build()?;

    if let Commands::Push {
        key,
        value,
        context,
    } = &cli.command
    {
        hub.push_queue().enable_key_creation();
        hub.push_queue().key(key).enable_push().set_value(value, context)?;
        let response = hub.flush();
        println!(
            "{} {}",
            response.status,
            response.message.unwrap_or_default()
        );
        return Ok(());
    }

    match &cli.offline {
        Some(path) => hub.from_file(path)?,
        None => hub.pull()?,
    }

    match cli.command {
        Commands::List => {
            let mut keys: Vec<_> = hub.properties().keys().into_iter().collect();
            keys.sort_unstable();
            for key in keys {
                let value = hub.properties().get(key).unwrap_or_default();
                println!("{key} = {value}");
            }
        }
        Commands::Get { key } => match hub.properties().get(&key) {
            Some(value) => println!("{value}"),
            None => println!("{key} is not set"),
        },
        Commands::File { path, destination } => {
            hub.files().write_to_local(&path, &destination)?;
        }
        Commands::Save { path } => hub.to_file(&path)?,
        Commands::Push { .. } => {}
    }
    Ok(())
}
