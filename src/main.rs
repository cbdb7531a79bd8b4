use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use aitestgen::commands::{
    generate_instrumentation_tests, generate_unit_tests, init_project, merge_files,
    preview_instrumentation, preview_unit, refine_test, GenerateOptions,
};
use aitestgen::core::{find_project_root, FsFileStore};
use aitestgen::models::ProviderKind;
use aitestgen::{AiTestGenError, Result};

/// aitestgen - LLM-backed unit and instrumentation test generator for Android projects
#[derive(Parser)]
#[command(name = "aitestgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Provider flags shared by the generating commands
#[derive(clap::Args, Debug, Clone)]
struct ProviderArgs {
    /// Override the configured provider
    #[arg(long, value_enum)]
    provider: Option<ProviderKind>,

    /// Override the model to use
    #[arg(long)]
    model: Option<String>,

    /// Override the provider base URL
    #[arg(long)]
    url: Option<String>,

    /// Override the timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Disable streaming output (Ollama only)
    #[arg(long)]
    no_stream: bool,

    /// Write files without asking
    #[arg(short, long)]
    yes: bool,
}

impl From<ProviderArgs> for GenerateOptions {
    fn from(args: ProviderArgs) -> Self {
        GenerateOptions {
            provider: args.provider,
            model: args.model,
            url: args.url,
            timeout: args.timeout,
            no_stream: args.no_stream,
            yes: args.yes,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default aitestgen.toml
    Init {
        /// Project directory (defaults to current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Generate unit tests for one Kotlin or Java source file
    Unit {
        /// Source file to test
        source: PathBuf,

        #[command(flatten)]
        provider: ProviderArgs,
    },

    /// Generate Compose instrumentation tests, or Cucumber BDD tests with --bdd
    Instrumentation {
        /// Project files to hand to the model as context
        #[arg(long, short = 'c', value_delimiter = ',')]
        context: Vec<PathBuf>,

        /// Generate a feature file, step definitions and a runner
        #[arg(long)]
        bdd: bool,

        /// Name used for the generated test class (defaults to the directory name)
        #[arg(long)]
        project_name: Option<String>,

        #[command(flatten)]
        provider: ProviderArgs,
    },

    /// Print the prompt a generation would send, without calling the model
    Preview {
        #[command(subcommand)]
        target: PreviewTarget,
    },

    /// Merge a candidate test file into an existing one
    Merge {
        /// Existing test file
        #[arg(long)]
        existing: PathBuf,

        /// Candidate test file or saved model reply
        #[arg(long)]
        candidate: PathBuf,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Change an existing test file from a natural-language request
    Refine {
        /// Test file to refine
        test_file: PathBuf,

        /// What to change; repeat for several rounds
        #[arg(short, long, required = true)]
        message: Vec<String>,

        #[command(flatten)]
        provider: ProviderArgs,
    },
}

#[derive(Subcommand)]
enum PreviewTarget {
    /// Preview a unit test prompt
    Unit {
        source: PathBuf,
    },
    /// Preview an instrumentation prompt
    Instrumentation {
        #[arg(long, short = 'c', value_delimiter = ',')]
        context: Vec<PathBuf>,

        #[arg(long)]
        bdd: bool,

        #[arg(long)]
        project_name: Option<String>,
    },
}

fn current_project_root() -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(find_project_root(&cwd))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .init();

    if let Err(e) = run(cli.command).await {
        eprint!("{}", e.display_with_guidance());
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> std::result::Result<(), AiTestGenError> {
    match command {
        Commands::Init { path } => {
            let project_root = match path {
                Some(path) => path,
                None => std::env::current_dir()?,
            };
            init_project(&project_root).map(|_| ())
        }

        Commands::Unit { source, provider } => {
            let project_root = current_project_root()?;
            generate_unit_tests(&project_root, &absolute(&source)?, provider.into()).await
        }

        Commands::Instrumentation {
            context,
            bdd,
            project_name,
            provider,
        } => {
            let project_root = current_project_root()?;
            let context = context
                .iter()
                .map(absolute)
                .collect::<Result<Vec<_>>>()?;
            generate_instrumentation_tests(&project_root, &context, bdd, project_name, provider.into())
                .await
        }

        Commands::Preview { target } => {
            let project_root = current_project_root()?;
            match target {
                PreviewTarget::Unit { source } => preview_unit(&project_root, &absolute(&source)?),
                PreviewTarget::Instrumentation {
                    context,
                    bdd,
                    project_name,
                } => {
                    let context = context
                        .iter()
                        .map(absolute)
                        .collect::<Result<Vec<_>>>()?;
                    preview_instrumentation(&project_root, &context, bdd, project_name)
                }
            }
        }

        Commands::Merge {
            existing,
            candidate,
            output,
        } => {
            let store = FsFileStore::new(std::env::current_dir()?);
            merge_files(&store, &existing, &candidate, output.as_deref())
        }

        Commands::Refine {
            test_file,
            message,
            provider,
        } => {
            let project_root = current_project_root()?;
            refine_test(&project_root, &absolute(&test_file)?, &message, provider.into()).await
        }
    }
}

/// Paths given relative to the working directory, which may sit below the project root
fn absolute(path: &PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.clone())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
