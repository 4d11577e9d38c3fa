//! Cryptify CLI - Playfair and textbook RSA text encryption
//!
//! Reads text from a file or stdin and writes the result to a file or
//! stdout. RSA ciphertext is a JSON array of integers.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use cryptify::arith;
use cryptify::commands::{self, Method};
use cryptify::digraph::Direction;
use cryptify::error::Result;
use cryptify::file_ops;
use cryptify::settings::{KeyMaterial, Settings};

#[derive(Parser)]
#[command(name = "cryptify")]
#[command(version)]
#[command(about = "Text encryption with the Playfair cipher and textbook RSA.", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// JSON file providing defaults for the key, p and q
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum MethodArg {
    Playfair,
    Rsa,
}

impl From<MethodArg> for Method {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Playfair => Method::Playfair,
            MethodArg::Rsa => Method::Rsa,
        }
    }
}

#[derive(Args)]
struct PrimeArgs {
    /// First RSA prime
    #[arg(short, value_name = "P")]
    p: Option<String>,

    /// Second RSA prime
    #[arg(short, value_name = "Q")]
    q: Option<String>,
}

#[derive(Args)]
struct TransformArgs {
    /// Cipher to use
    #[arg(short, long, value_enum)]
    method: MethodArg,

    /// Playfair key
    #[arg(short, long)]
    key: Option<String>,

    #[command(flatten)]
    primes: PrimeArgs,

    /// Path to read the input text from (stdin if omitted)
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Path to write the result to (stdout if omitted)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt text
    #[command(alias = "e")]
    Encrypt(TransformArgs),

    /// Decrypt text
    #[command(alias = "d")]
    Decrypt(TransformArgs),

    /// Print the Playfair key matrix
    Matrix {
        /// Playfair key
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Print every value of the RSA keypair derived from p and q
    Keys(PrimeArgs),

    /// Suggest primes for p and q
    Primes {
        /// Primes to leave out of the suggestions
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<u64>,

        /// Pick a random pair instead of listing suggestions
        #[arg(long)]
        random: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e.chain_message());
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = match &cli.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    match cli.command {
        Commands::Encrypt(args) => transform(Direction::Encrypt, args, settings),
        Commands::Decrypt(args) => transform(Direction::Decrypt, args, settings),
        Commands::Matrix { key } => {
            let material = KeyMaterial::resolve(key, None, None, settings);
            file_ops::write_output(None, &commands::matrix(&material)?)
        }
        Commands::Keys(primes) => {
            let material = KeyMaterial::resolve(None, primes.p, primes.q, settings);
            file_ops::write_output(None, &commands::key_report(&material)?)
        }
        Commands::Primes { exclude, random } => {
            let line = if random {
                let (p, q) = arith::random_prime_pair(&mut rand::thread_rng());
                format!("{} {}", p, q)
            } else {
                arith::suggest_primes(&exclude)
                    .iter()
                    .map(u64::to_string)
                    .collect::<Vec<_>>()
                    .join(" ")
            };
            file_ops::write_output(None, &line)
        }
    }
}

fn transform(direction: Direction, args: TransformArgs, settings: Settings) -> Result<()> {
    let material = KeyMaterial::resolve(args.key, args.primes.p, args.primes.q, settings);
    commands::process_file(
        args.method.into(),
        direction,
        &material,
        args.input.as_deref(),
        args.output.as_deref(),
    )
}
