//! Command line front end for the order-key allocator.
//!
//! Settings come from `ORDERKEY_*` environment variables and can be
//! overridden with flags. Logs go to stderr, results to stdout.

use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use orderkey::Alphabet;
use orderkey::Config;

#[derive(Parser, Debug)]
#[command(name = "orderkey", about = "Allocate and rebalance fractional order keys")]
struct Args {
    /// Symbol set keys are spelled with.
    #[arg(long, value_enum)]
    alphabet: Option<AlphabetArg>,

    /// Keys longer than this need a rebalance.
    #[arg(long)]
    threshold: Option<usize>,

    /// Numeral steps left between neighbors after a rebalance.
    #[arg(long)]
    spacing: Option<usize>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AlphabetArg {
    Lowercase,
    Base36,
    Base62,
}

impl From<AlphabetArg> for Alphabet {
    fn from(arg: AlphabetArg) -> Alphabet {
        return match arg {
            AlphabetArg::Lowercase => Alphabet::LOWERCASE,
            AlphabetArg::Base36 => Alphabet::BASE36,
            AlphabetArg::Base62 => Alphabet::BASE62,
        };
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the key for the first item of a new collection.
    Start,
    /// Print the key that sorts after all standard positions.
    End,
    /// Print a key strictly between two neighbors.
    Between {
        /// Lower neighbor; omit for the head of the collection.
        #[arg(long)]
        before: Option<String>,
        /// Upper neighbor; omit for the tail of the collection.
        #[arg(long)]
        after: Option<String>,
    },
    /// Exit with status 0 if KEY is due for a rebalance, 1 otherwise.
    NeedsRebalance { key: String },
    /// Print fresh keys for a sorted collection as JSON.
    Rebalance {
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match std::env::var("LOG_LEVEL").as_deref() {
            Ok("debug") => "debug",
            _ => "info",
        };
        EnvFilter::new(level)
    });
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

fn build_config(args: &Args) -> Config {
    let mut config = Config::from_env();
    if let Some(alphabet) = args.alphabet {
        config.alphabet = alphabet.into();
    }
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    if let Some(spacing) = args.spacing {
        config.spacing = spacing;
    }
    return config.normalized();
}

/// Execute one command. Returns the process exit status.
fn run(args: &Args, out: &mut impl Write) -> anyhow::Result<u8> {
    let config = build_config(args);
    let allocator = config.allocator();
    tracing::debug!(?config, "configured");

    match &args.command {
        Command::Start => writeln!(out, "{}", allocator.start())?,
        Command::End => writeln!(out, "{}", allocator.end())?,
        Command::Between { before, after } => {
            let key = allocator
                .between(before.as_deref(), after.as_deref())
                .context("cannot allocate key")?;
            writeln!(out, "{}", key)?;
        }
        Command::NeedsRebalance { key } => {
            let due = allocator.needs_rebalance(key, config.threshold);
            writeln!(out, "{}", due)?;
            if !due {
                return Ok(1);
            }
        }
        Command::Rebalance { keys } => {
            let mut sorted = keys.clone();
            sorted.sort();
            if sorted != *keys {
                tracing::warn!("input keys are not sorted; new keys follow input order");
            }
            let fresh = allocator.rebalance_keys(keys.len(), config.spacing);
            let pairs: Vec<_> = keys
                .iter()
                .zip(&fresh)
                .map(|(old, new)| json!({ "old": old, "new": new.as_str() }))
                .collect();
            serde_json::to_writer_pretty(&mut *out, &pairs)
                .context("cannot write rebalance result")?;
            writeln!(out)?;
        }
    }
    return Ok(0);
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.json_logs);

    let stdout = std::io::stdout();
    return match run(&args, &mut stdout.lock()) {
        Ok(status) => ExitCode::from(status),
        Err(error) => {
            tracing::error!("{error:#}");
            ExitCode::from(2)
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_with(argv: &[&str]) -> (u8, String) {
        let args = Args::try_parse_from(argv.iter().copied()).unwrap();
        let mut out = Vec::new();
        let code = run(&args, &mut out).unwrap();
        return (code, String::from_utf8(out).unwrap());
    }

    #[test]
    fn start_end_between() {
        assert_eq!(run_with(&["orderkey", "start"]).1, "n\n");
        assert_eq!(run_with(&["orderkey", "end"]).1, "z\n");
        assert_eq!(run_with(&["orderkey", "between", "--before", "m"]).1, "mn\n");
        assert_eq!(run_with(&["orderkey", "between", "--before", "a", "--after", "c"]).1, "b\n");
        assert_eq!(run_with(&["orderkey", "--alphabet", "base62", "start"]).1, "V\n");
    }

    #[test]
    fn between_rejects_reversed_bounds() {
        let argv = ["orderkey", "between", "--before", "b", "--after", "a"];
        let args = Args::try_parse_from(argv).unwrap();
        let error = run(&args, &mut Vec::new()).unwrap_err();
        assert!(format!("{error:#}").contains("invalid order"));
    }

    #[test]
    fn needs_rebalance_exit_status() {
        let (code, out) = run_with(&["orderkey", "--threshold", "3", "needs-rebalance", "abcde"]);
        assert_eq!(code, 0);
        assert_eq!(out, "true\n");
        let (code, _) = run_with(&["orderkey", "needs-rebalance", "abc"]);
        assert_eq!(code, 1);
    }

    #[test]
    fn rebalance_prints_pairs_in_input_order() {
        let (_, out) = run_with(&["orderkey", "rebalance", "a", "aan", "aanm", "b"]);
        let pairs: serde_json::Value = serde_json::from_str(&out).unwrap();
        let new: Vec<&str> = pairs
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["new"].as_str().unwrap())
            .collect();
        assert_eq!(new, vec!["a", "ak", "au", "be"]);
        assert_eq!(pairs[1]["old"], "aan");
    }
}
