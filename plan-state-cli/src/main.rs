mod commands;
mod logging;
mod options;

use std::path::PathBuf;
use std::process::exit;

use anyhow::Result;
use clap::{CommandFactory as _, Parser, Subcommand};
use commands::AccessorType;
use options::Options;

/// Exit status of `equal` when the documents differ
const EXIT_DIFFERENT: i32 = 1;
/// Exit status for any error, distinct from [`EXIT_DIFFERENT`]
const EXIT_ERROR: i32 = 2;

fn main() {
    let args = Args::parse();
    let logging = logging::set_up(logging::Options {
        verbose: args.options.verbose,
        color: args.options.use_color(),
    });
    let mut logging = match logging {
        Ok(logging) => logging,
        Err(e) => {
            eprintln!("{}", error_message(&e));
            exit(EXIT_ERROR);
        }
    };
    let r = run_args(args);
    if let Err(e) = logging.tear_down() {
        eprintln!("{}", error_message(&e));
    }
    handle_result(r);
}

/// Run a command, returning the process exit status.
fn run_args(args: Args) -> Result<i32> {
    let options = &args.options;
    match args.command {
        Commands::Get { file, path, as_type } => {
            let state = commands::read_state(&file)?;
            let value = commands::get(&state, &path, as_type)?;
            println!("{}", commands::render_json(&value, options.pretty));
            Ok(0)
        }
        Commands::Set {
            file,
            path,
            value,
            string,
            in_place,
        } => {
            let mut state = commands::read_state(&file)?;
            let value = commands::parse_value(&value, string)?;
            commands::set(&mut state, &path, value);
            if in_place {
                commands::write_state(&file, &state, options.pretty)?;
            } else {
                println!("{}", commands::render_state(&state, options.pretty));
            }
            Ok(0)
        }
        Commands::Merge { base, others } => {
            let base = commands::read_state(&base)?;
            let others = others
                .iter()
                .map(|f| commands::read_state(f))
                .collect::<Result<Vec<_>>>()?;
            let merged = commands::merge(base, others);
            println!("{}", commands::render_state(&merged, options.pretty));
            Ok(0)
        }
        Commands::Equal { a, b } => {
            let equal = commands::read_state(&a)? == commands::read_state(&b)?;
            println!("{}", equal);
            Ok(if equal { 0 } else { EXIT_DIFFERENT })
        }
        Commands::Diff { a, b } => {
            let patch = commands::diff(&commands::read_state(&a)?, &commands::read_state(&b)?)?;
            println!("{}", commands::render_json(&patch, options.pretty));
            Ok(0)
        }
        Commands::GenerateMan => {
            let cmd = Args::command();
            let man = clap_mangen::Man::new(cmd);
            let mut buffer: Vec<u8> = Default::default();
            man.render(&mut buffer)?;
            println!("{}", String::from_utf8(buffer)?);
            Ok(0)
        }
        Commands::GenerateMarkdown => {
            let opts = clap_markdown::MarkdownOptions::new().show_footer(false);
            let markdown: String = clap_markdown::help_markdown_custom::<Args>(&opts);
            println!("{}", markdown);
            Ok(0)
        }
        Commands::GenerateCompletion { shell } => {
            let mut cmd = Args::command();
            clap_complete::generate(shell, &mut cmd, "plan-state", &mut std::io::stdout());
            Ok(0)
        }
    }
}

fn handle_result(r: Result<i32>) {
    match r {
        Ok(0) => {}
        Ok(status) => exit(status),
        Err(e) => {
            eprintln!("{}", error_message(&e));
            exit(EXIT_ERROR);
        }
    }
}

fn error_message(e: &anyhow::Error) -> String {
    format!("plan-state error: {}, {}", e.root_cause(), e)
}

/// Inspect and combine plan state documents
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    options: Options,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the value at a dotted path, as JSON
    Get {
        /// State file (a JSON object), or `-` for stdin
        file: PathBuf,

        /// Dotted path, e.g. `cluster.nodes`
        path: String,

        /// Read the value as this type, coercing strings where possible
        #[arg(long("type"), value_enum, default_value_t = AccessorType::Any)]
        as_type: AccessorType,
    },

    /// Assign a value at a dotted path, creating intermediate objects
    Set {
        /// State file (a JSON object), or `-` for stdin
        file: PathBuf,

        /// Dotted path, e.g. `cluster.nodes`
        path: String,

        /// The value, in JSON format
        value: String,

        /// Store VALUE as a raw string instead of parsing it as JSON
        #[arg(long, short('s'))]
        string: bool,

        /// Rewrite FILE instead of printing the result
        #[arg(long, short('i'))]
        in_place: bool,
    },

    /// Deep merge state files, later files winning on conflicting values
    Merge {
        /// The state to merge into
        base: PathBuf,

        /// States to merge, in order
        #[arg(required = true)]
        others: Vec<PathBuf>,
    },

    /// Compare two state files structurally; exits with status 1 if they
    /// differ, and 2 on errors
    Equal { a: PathBuf, b: PathBuf },

    /// Print the JSON Patch (RFC 6902) that turns A into B
    Diff { a: PathBuf, b: PathBuf },

    /// Generate markdown documentation for plan-state
    #[command(hide = true)]
    GenerateMarkdown,

    /// Generate a manpage for plan-state
    #[command(hide = true)]
    GenerateMan,

    /// Generate shell completion for plan-state
    #[command(hide = true)]
    GenerateCompletion {
        /// The shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
