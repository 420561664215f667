//! CLI argument structures

use crate::config::Overrides;
use clap::Parser;
use std::path::PathBuf;

/// Sum the Riemann zeta series across parallel workers
#[derive(Parser, Debug)]
#[command(name = "parsum")]
#[command(about = "parsum - partitioned parallel summation of the zeta series", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Exponent n of the series sum(1 / i^n)
    #[arg(short = 'n', value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub exponent: u32,

    /// Upper bound of the iteration space; terms 1..N-1 are summed
    #[arg(short = 'i', long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub iterations: Option<u64>,

    /// Number of parallel workers (defaults to available CPUs)
    #[arg(short = 'w', long, value_parser = clap::value_parser!(u64).range(1..))]
    pub workers: Option<u64>,

    /// Rank that receives the reduced result and prints it
    #[arg(long, value_name = "RANK")]
    pub coordinator: Option<usize>,

    /// Configuration file (defaults to parsum.toml in the user config directory)
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Settings given explicitly on the command line
    pub fn overrides(&self) -> Overrides {
        Overrides {
            iterations: self.iterations,
            workers: self.workers.map(|w| w as usize),
            coordinator: self.coordinator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_parse_minimal() {
        let cli = Cli::try_parse_from(["parsum", "-n", "2"]).unwrap();
        assert_eq!(cli.exponent, 2);
        assert_eq!(cli.overrides(), Overrides::default());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_parse_all_flags() {
        let cli = Cli::try_parse_from([
            "parsum", "-n", "3", "-i", "1000", "-w", "4", "--coordinator", "1", "-c", "p.toml",
            "-vv",
        ])
        .unwrap();

        assert_eq!(
            cli.overrides(),
            Overrides {
                iterations: Some(1000),
                workers: Some(4),
                coordinator: Some(1),
            }
        );
        assert_eq!(cli.config, Some(PathBuf::from("p.toml")));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_exponent_required() {
        let err = Cli::try_parse_from(["parsum"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_exponent_must_be_positive() {
        for bad in ["0", "-1", "two", "1.5"] {
            assert!(Cli::try_parse_from(["parsum", "-n", bad]).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(Cli::try_parse_from(["parsum", "-n", "2", "-w", "0"]).is_err());
    }
}
