mod commands;
mod output;
mod prune;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::inspect::InspectArgs;

#[derive(Parser)]
#[command(name = "ollama-inspect")]
#[command(author, version, about = "Inspect Ollama blobs and model mappings", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    inspect: InspectArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// View or set configuration
    Config {
        /// Config key (e.g., "models.root", "output.size_unit")
        key: Option<String>,

        /// Value to set (if omitted, shows current value)
        value: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.inspect.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match cli.command {
        Some(Commands::Config { key, value }) => {
            commands::config::execute(key.as_deref(), value.as_deref())?;
        }
        None => {
            commands::inspect::execute(&cli.inspect)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["ollama-inspect"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.inspect.output, "-");
        assert!(cli.inspect.columns.is_none());
        assert!(cli.inspect.format.is_none());
        assert!(!cli.inspect.delete_orphans);
    }

    #[test]
    fn test_inspect_flags() {
        let cli = Cli::try_parse_from([
            "ollama-inspect",
            "--models-root",
            "/srv/ollama",
            "--as-csv",
            "-o",
            "blobs.csv",
            "--columns",
            "blob,size_bytes",
            "--sort-by-size",
            "--sort-desc",
            "--format",
            "gb",
            "--only-orphans",
        ])
        .unwrap();
        let args = cli.inspect;
        assert_eq!(args.models_root.as_deref(), Some(std::path::Path::new("/srv/ollama")));
        assert!(args.as_csv);
        assert_eq!(args.output, "blobs.csv");
        assert_eq!(args.columns.as_deref(), Some("blob,size_bytes"));
        assert!(args.sort_by_size && args.sort_desc);
        assert!(args.only_orphans);
    }

    #[test]
    fn test_config_subcommand() {
        let cli = Cli::try_parse_from(["ollama-inspect", "config", "output.size_unit", "gb"]).unwrap();
        match cli.command {
            Some(Commands::Config { key, value }) => {
                assert_eq!(key.as_deref(), Some("output.size_unit"));
                assert_eq!(value.as_deref(), Some("gb"));
            }
            None => panic!("expected config subcommand"),
        }
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["ollama-inspect", "--format", "tb"]).is_err());
    }
}
