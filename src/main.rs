use clap::{ArgAction, Parser as ClapParser, Subcommand};
use lineq::{
    AppContext, QueryEngine,
    cli::{self, CliError, RunOptions},
    config::{ConfigStore, default_dir},
    host::{FileLines, StderrNotifier},
    shell::DEFAULT_QUERY,
    tracing_setup,
};
use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
};

#[derive(ClapParser)]
#[command(name = "lineq")]
#[command(about = "lineq - ad-hoc queries over lines of text")]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory holding LineQuery.json
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a query against the input lines
    Run {
        /// The query (defaults to the saved query)
        query: Option<String>,

        /// Helper code
        #[arg(long, conflicts_with = "helpers_file")]
        helpers: Option<String>,

        /// File containing helper code
        #[arg(long)]
        helpers_file: Option<PathBuf>,

        /// Input file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Compile a query without running it
    Check {
        /// The query to compile
        query: String,

        /// Helper code
        helpers: Option<String>,
    },

    /// Print the unit a query compiles as, with line numbers
    Source {
        /// The query to wrap
        query: String,

        /// Helper code
        helpers: Option<String>,
    },

    /// Interactive query panel over an input file
    Shell {
        /// Input file, re-read on every run
        #[arg(short, long)]
        input: PathBuf,
    },

    /// List documentation categories
    Docs,

    /// Show documentation for a specific category
    Doc {
        /// Category name (use 'lineq docs' to list categories)
        category: String,
    },
}

fn main() {
    let cli = Cli::parse();
    tracing_setup::init(cli.verbose);

    let store = cli
        .config_dir
        .or_else(default_dir)
        .map(ConfigStore::new);

    let result = match cli.command {
        Commands::Run {
            query,
            helpers,
            helpers_file,
            input,
        } => run_query(store, query, helpers, helpers_file, input),
        Commands::Check { query, helpers } => {
            cli::execute_check(&query, helpers.as_deref()).map(|()| println!("Query compiles"))
        }
        Commands::Source { query, helpers } => {
            println!("{}", cli::wrapped_source(&query, helpers.as_deref()));
            Ok(())
        }
        Commands::Shell { input } => run_shell(store, input),
        Commands::Docs => {
            print!("{}", cli::get_docs_overview());
            Ok(())
        }
        Commands::Doc { category } => cli::get_doc_category(&category).map(|content| {
            print!("{}", content);
        }),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }
}

fn run_query(
    store: Option<ConfigStore>,
    query: Option<String>,
    helpers: Option<String>,
    helpers_file: Option<PathBuf>,
    input: Option<PathBuf>,
) -> Result<(), CliError> {
    let ctx = AppContext::init(store, StderrNotifier);
    let saved = ctx.saved();

    let query = query
        .or_else(|| saved.map(|s| s.query.clone()).filter(|q| !q.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_QUERY.to_string());
    let helpers = match helpers_file {
        Some(path) => Some(fs::read_to_string(path)?),
        None => helpers.or_else(|| saved.map(|s| s.helpers.clone())),
    };

    let input = match input {
        Some(path) => Some(fs::read_to_string(path)?),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = RunOptions {
        query,
        helpers,
        input,
    };
    for line in cli::execute_run(&options, &QueryEngine::new())? {
        println!("{}", line);
    }
    Ok(())
}

fn run_shell(store: Option<ConfigStore>, input: PathBuf) -> Result<(), CliError> {
    let mut ctx = AppContext::init(store, StderrNotifier);
    let source = FileLines::new(input);
    let stdin = io::stdin();
    cli::run_shell(&mut ctx, &source, stdin.lock(), io::stdout())?;
    ctx.shutdown()?;
    Ok(())
}
