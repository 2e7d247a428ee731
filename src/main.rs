use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::process;
use wasm_inline_slim::cmd;

/// Post-build optimizer for inline WebAssembly glue
///
/// wasm-inline-slim replaces wildcard re-exports of internal modules with
/// explicit export lists and shrinks the base64 WebAssembly embedded in the
/// generated JavaScript with a cached copy of binaryen's wasm-opt.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Disable emoji output (useful for CI/CD or accessibility)
    #[arg(long, global = true)]
    no_emoji: bool,

    /// Config file to use instead of ./.wasm-inline-slim.toml
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the glue, then rewrite exports and optimize the inline module
    Build {
        /// wasm-opt optimization level for the inline module (e.g. -O4, -Oz)
        #[arg(long, allow_hyphen_values = true)]
        opt_level: Option<String>,

        /// Print a JSON report to stdout
        #[arg(long)]
        json: bool,

        /// Extra arguments passed to the generator (after `--`)
        #[arg(last = true, value_name = "GENERATOR_ARGS")]
        generator_args: Vec<String>,
    },

    /// Rewrite exports and optimize the inline module of an existing glue file
    Optimize {
        /// Glue file (defaults to <out-dir>/<module>.js from the config)
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,

        /// wasm-opt optimization level for the inline module (e.g. -O4, -Oz)
        #[arg(long, allow_hyphen_values = true)]
        opt_level: Option<String>,

        /// Print a JSON report to stdout
        #[arg(long)]
        json: bool,
    },

    /// Run the cached wasm-opt over a .wasm file
    WasmOpt {
        /// Input module
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,

        /// Flags passed to wasm-opt
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "FLAGS")]
        flags: Vec<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    // Initialize logger (use RUST_LOG env var to control verbosity)
    env_logger::init();

    let cli = Cli::parse();

    if cli.no_emoji {
        std::env::set_var("NO_EMOJI", "1");
    }

    let config = cli.config.as_deref();
    let result = match &cli.command {
        Some(Commands::Build {
            opt_level,
            json,
            generator_args,
        }) => cmd::cmd_build(generator_args, opt_level.as_deref(), config, *json),
        Some(Commands::Optimize {
            path,
            opt_level,
            json,
        }) => cmd::cmd_optimize(path.as_deref(), opt_level.as_deref(), config, *json),
        Some(Commands::WasmOpt {
            file,
            output,
            flags,
        }) => cmd::cmd_wasm_opt(file, flags, output.as_deref(), config),
        Some(Commands::Completions { shell }) => {
            cmd::cmd_completions(*shell, &mut Cli::command(), &mut std::io::stdout());
            Ok(())
        }
        None => {
            // No subcommand provided, show help
            eprintln!("wasm-inline-slim v{}", env!("CARGO_PKG_VERSION"));
            eprintln!("Post-build optimizer for inline WebAssembly glue\n");
            eprintln!("Usage: wasm-inline-slim <COMMAND>\n");
            eprintln!("Commands:");
            eprintln!("  build        Generate the glue, then rewrite and optimize it");
            eprintln!("  optimize     Rewrite and optimize an existing glue file");
            eprintln!("  wasm-opt     Run the cached wasm-opt over a .wasm file");
            eprintln!("  completions  Generate shell completions");
            eprintln!(
                "\nRun 'wasm-inline-slim <COMMAND> --help' for more information on a command."
            );
            Ok(())
        }
    };

    if let Err(e) = result {
        use wasm_inline_slim::error::ErrorFormatter;
        eprintln!("{}", ErrorFormatter::format(&e));
        let exit_code = ErrorFormatter::exit_code(&e);
        process::exit(exit_code);
    }
}
