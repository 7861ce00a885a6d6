//! Command-line surface.
//!
//! `goenc [OPTIONS] [INPUT] [OUTPUT]` with `-` meaning stdin/stdout. Short
//! flags cluster and glue to their values (`-t8`, `-m64M`); `--` ends option
//! parsing.

use clap::error::ErrorKind;
use clap::Parser;

const AFTER_HELP: &str = "\
Environment Variables:
  PASSWORD              Encryption password
  GOENC_LOG             Log filter (e.g. debug)

Exit Status:
  0  Operation was successful
  1  Tag verification failed (password is wrong or data is corrupted)
  2  Invalid command line
  3  An error occurred";

#[derive(Debug, Parser)]
#[command(
    name = "goenc",
    version,
    disable_version_flag = true,
    about = "A simple file encryption tool",
    after_help = AFTER_HELP
)]
pub struct Options {
    /// Encrypt (default)
    #[arg(short = 'e', long, overrides_with = "decrypt")]
    pub encrypt: bool,

    /// Decrypt
    #[arg(short = 'd', long, overrides_with = "encrypt")]
    pub decrypt: bool,

    /// Do not overwrite an existing file
    #[arg(short = 'n', long)]
    pub no_clobber: bool,

    /// Argon2 time parameter
    #[arg(
        short = 't',
        long,
        value_name = "N",
        default_value_t = 8,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub time: u32,

    /// Argon2 memory parameter in KiB; K, M and G suffixes are accepted
    #[arg(
        short = 'm',
        long,
        value_name = "N[KMG]",
        default_value = "1G",
        value_parser = parse_memory
    )]
    pub memory: u32,

    /// Argon2 parallelism parameter
    #[arg(
        short = 'p',
        long,
        value_name = "N",
        default_value_t = 4,
        value_parser = clap::value_parser!(u8).range(1..)
    )]
    pub parallelism: u8,

    /// Maximum number of attempts to enter the password
    #[arg(
        short = 'r',
        long,
        value_name = "N",
        default_value_t = 3,
        value_parser = clap::value_parser!(u8).range(1..)
    )]
    pub retries: u8,

    /// Read the password from FILE (- for standard input)
    #[arg(long, value_name = "FILE")]
    pub password_from: Option<String>,

    /// Show version information and exit
    #[arg(long, action = clap::ArgAction::Version)]
    version: Option<bool>,

    /// Input file (- for standard input)
    #[arg(default_value = "-")]
    pub input: String,

    /// Output file (- for standard output)
    #[arg(default_value = "-")]
    pub output: String,
}

/// Parse the command line, exiting 0 for help/version and 2 on bad usage.
pub fn parse() -> Options {
    match Options::try_parse() {
        Ok(options) => options,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 2,
            };
            let _ = err.print();
            std::process::exit(code);
        }
    }
}

/// `N[KMG]` in KiB. The result must be positive and fit in a `u32`.
fn parse_memory(value: &str) -> Result<u32, String> {
    let (digits, unit): (&str, u64) = if let Some(d) = value.strip_suffix('K') {
        (d, 1)
    } else if let Some(d) = value.strip_suffix('M') {
        (d, 1024)
    } else if let Some(d) = value.strip_suffix('G') {
        (d, 1024 * 1024)
    } else {
        (value, 1)
    };

    let number: u64 = digits.parse().map_err(|err: std::num::ParseIntError| {
        match err.kind() {
            std::num::IntErrorKind::PosOverflow => "value out of range".to_string(),
            _ => "invalid number".to_string(),
        }
    })?;
    let kib = number.checked_mul(unit).ok_or("value out of range")?;
    if kib == 0 || kib > u64::from(u32::MAX) {
        return Err("value out of range".to_string());
    }
    Ok(kib as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn try_parse(args: &[&str]) -> Result<Options, clap::Error> {
        Options::try_parse_from(std::iter::once("goenc").chain(args.iter().copied()))
    }

    #[test]
    fn defaults() {
        let opts = try_parse(&[]).unwrap();
        assert!(!opts.decrypt);
        assert!(!opts.no_clobber);
        assert_eq!(opts.time, 8);
        assert_eq!(opts.memory, 1024 * 1024);
        assert_eq!(opts.parallelism, 4);
        assert_eq!(opts.retries, 3);
        assert_eq!(opts.input, "-");
        assert_eq!(opts.output, "-");
    }

    #[test]
    fn glued_and_separate_values() {
        let opts = try_parse(&["-t8", "-m64M", "-p2", "in.txt", "out.bin"]).unwrap();
        assert_eq!(opts.time, 8);
        assert_eq!(opts.memory, 64 * 1024);
        assert_eq!(opts.parallelism, 2);
        assert_eq!(opts.input, "in.txt");
        assert_eq!(opts.output, "out.bin");

        let opts = try_parse(&["--memory=2G", "--time", "4"]).unwrap();
        assert_eq!(opts.memory, 2 * 1024 * 1024);
        assert_eq!(opts.time, 4);
    }

    #[test]
    fn clustered_short_flags() {
        let opts = try_parse(&["-dn", "-r5"]).unwrap();
        assert!(opts.decrypt);
        assert!(opts.no_clobber);
        assert_eq!(opts.retries, 5);
    }

    #[test]
    fn last_mode_flag_wins() {
        let opts = try_parse(&["-d", "-e"]).unwrap();
        assert!(!opts.decrypt);
        let opts = try_parse(&["-e", "-d"]).unwrap();
        assert!(opts.decrypt);
    }

    #[test]
    fn double_dash_ends_options() {
        let opts = try_parse(&["--", "-d"]).unwrap();
        assert!(!opts.decrypt);
        assert_eq!(opts.input, "-d");
    }

    #[test]
    fn too_many_positionals_are_rejected() {
        assert!(try_parse(&["a", "b", "c"]).is_err());
    }

    #[test]
    fn zero_values_are_rejected() {
        assert!(try_parse(&["-t0"]).is_err());
        assert!(try_parse(&["-p0"]).is_err());
        assert!(try_parse(&["-r0"]).is_err());
        assert!(try_parse(&["-m0"]).is_err());
    }

    #[test]
    fn memory_suffixes() {
        assert_eq!(parse_memory("1").unwrap(), 1);
        assert_eq!(parse_memory("512K").unwrap(), 512);
        assert_eq!(parse_memory("64M").unwrap(), 64 * 1024);
        assert_eq!(parse_memory("1G").unwrap(), 1024 * 1024);
        assert_eq!(parse_memory("4095G").unwrap(), 4095 * 1024 * 1024);
    }

    #[test]
    fn memory_range_errors() {
        assert_eq!(parse_memory("0").unwrap_err(), "value out of range");
        assert_eq!(parse_memory("4096G").unwrap_err(), "value out of range");
        assert_eq!(parse_memory("99999999999999999999").unwrap_err(), "value out of range");
        assert_eq!(parse_memory("12x").unwrap_err(), "invalid number");
        assert_eq!(parse_memory("").unwrap_err(), "invalid number");
        assert_eq!(parse_memory("G").unwrap_err(), "invalid number");
        assert_eq!(parse_memory("-1").unwrap_err(), "invalid number");
    }
}
