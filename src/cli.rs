use lazy_static::lazy_static;
use structopt::StructOpt;
use std::str::FromStr;

use crate::tables::{MULTIPLIER, ROW_COUNT, YEAR};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

lazy_static! {
    static ref DEFAULT_ROWS: String = ROW_COUNT.to_string();
    static ref DEFAULT_MULTIPLIER: String = MULTIPLIER.to_string();
    static ref DEFAULT_YEAR: String = YEAR.to_string();
}

#[derive(StructOpt, Debug, Clone)]
#[structopt(
global_settings(& [structopt::clap::AppSettings::ColoredHelp, structopt::clap::AppSettings::DeriveDisplayOrder]),
name = "gen_rows",
)]
/// Generate synthetic enrollment csv rows to stdout: id,degree,school,sex,year
///
/// Ids are multiplier * row number.  Degree, school and sex are drawn uniformly at random.
pub struct CliCfg {
    #[structopt(short = "n", long = "rows", parse(try_from_str = from_human_count), default_value(& DEFAULT_ROWS))]
    /// Number of rows to write
    ///
    /// Can use decimal postfix: 100K = 100*1000 rows, 10M = 10*1000*1000 rows
    pub rows: u64,

    #[structopt(short = "k", long = "multiplier", default_value(& DEFAULT_MULTIPLIER))]
    /// Row id multiplier
    pub multiplier: u64,

    #[structopt(short = "y", long = "year", default_value(& DEFAULT_YEAR))]
    /// Year written on every row
    pub year: u32,

    #[structopt(short = "s", long = "seed")]
    /// Seed the random generator for repeatable output
    ///
    /// Without a seed the generator is seeded from the OS and every run differs.
    pub seed: Option<u64>,

    #[structopt(short = "d", long = "delimiter", parse(try_from_str = escape_parser), default_value = ",")]
    /// Output field delimiter
    ///
    /// Note:  \t == <tab>  \0 == <null>  \dVAL where VAL is decimal number for ascii from 0 to 127
    /// Fields that contain the delimiter are quoted.
    pub delimiter: char,

    #[structopt(long = "buffer_size", parse(try_from_str = from_human_size), default_value = "256K")]
    /// Output buffer size
    ///
    /// Can be greek notation: 256K = 256*1024 bytes
    pub buffer_size: usize,

    #[structopt(long = "progress_every", parse(try_from_str = from_human_count), default_value = "1M")]
    /// Rows between progress updates with -v
    pub progress_every: u64,

    #[structopt(long = "stats")]
    /// Write stats to stderr after generating
    ///
    /// Includes the observed distribution of each random column
    pub stats: bool,

    #[structopt(short = "v", parse(from_occurrences))]
    /// Verbosity - use more than one v for greater detail
    pub verbose: usize,

    #[structopt(short = "E", long = "print_examples")]
    /// Print a few usage examples
    pub print_examples: bool,
}

fn print_examples() {
    println!("{}",
             r#"
    Here are a few examples for quick reference

    gen_rows > rows.csv                 # 10M rows with the default layout
    gen_rows -n 5                       # 5 rows: ids 0,3,6,9,12
    gen_rows -n 100K -s 42 > a.csv      # repeatable output for a given seed
    gen_rows -n 1M -d '\t' -y 2020      # tab delimited with a different year
    gen_rows -n 100K --stats > /dev/null
    # check the spread of the random columns without keeping the data

    "#);
}

/// parse a size with binary postfix: 64K = 64*1024
fn from_human_size(s: &str) -> Result<usize> {
    let mut postfix = String::new();
    let mut number = String::new();
    for c in s.chars() {
        if !c.is_digit(10) {
            postfix.push(c.to_ascii_lowercase());
        } else {
            number.push(c);
        }
    }
    if number.len() == 0 {
        Err(format!("Missing numeric portion in size, found only: \"{}\"", s))?
    }
    let num: usize = number.parse()?;
    let mult = match postfix.as_str() {
        "" | "b" => 1usize,
        "k" | "kb" => 1024usize,
        "m" | "mb" => 1024usize * 1024usize,
        "g" | "gb" => 1024usize * 1024usize * 1024usize,
        _ => Err(format!("human size postfix \"{}\" not understood", postfix.as_str()))?
    };
    match num.checked_mul(mult) {
        Some(v) => Ok(v),
        None => Err(format!("size \"{}\" is too large", s))?,
    }
}

/// parse a count with decimal postfix: 10M = 10*1000*1000; underscores are ignored
fn from_human_count(s: &str) -> Result<u64> {
    let mut postfix = String::new();
    let mut number = String::new();
    for c in s.chars() {
        if c == '_' {
            continue;
        } else if !c.is_digit(10) {
            postfix.push(c.to_ascii_lowercase());
        } else {
            number.push(c);
        }
    }
    if number.len() == 0 {
        Err(format!("Missing numeric portion in count, found only: \"{}\"", s))?
    }
    let num: u64 = number.parse()?;
    let mult = match postfix.as_str() {
        "" => 1u64,
        "k" => 1_000u64,
        "m" => 1_000_000u64,
        "g" => 1_000_000_000u64,
        _ => Err(format!("count postfix \"{}\" not understood", postfix.as_str()))?
    };
    match num.checked_mul(mult) {
        Some(v) => Ok(v),
        None => Err(format!("count \"{}\" is too large", s))?,
    }
}

fn escape_parser(s: &str) -> Result<char> {
    if s.starts_with("\\d") {
        match u8::from_str(&s[2..]) {
            Ok(v) if v <= 127 => Ok(v as char),
            _ => Err(format!("Expect delimiter escape decimal to a be a number between 0 and 127 but got: \"{}\"", &s[2..]))?,
        }
    } else {
        match s {
            "\\t" => Ok('\t'),
            "\\0" => Ok('\0'),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii() => Ok(c),
                    _ => Err("Delimiter not understood - must be 1 ascii character OR \\t or \\0 or \\d<dec num>")?,
                }
            }
        }
    }
}

/// Reject settings that cannot produce the documented output.
pub fn check_cfg(cfg: &CliCfg) -> Result<()> {
    if cfg.rows > 0 && cfg.multiplier.checked_mul(cfg.rows - 1).is_none() {
        Err(format!("row id overflow: multiplier {} times last row {} does not fit in 64 bits", cfg.multiplier, cfg.rows - 1))?
    }
    match cfg.delimiter {
        '"' | '\n' | '\r' => Err(format!("delimiter {:?} cannot be used, it is part of csv quoting or line endings", cfg.delimiter))?,
        // ids, degree codes and year are all digits
        d if d.is_ascii_digit() => Err(format!("delimiter {:?} cannot be used, it appears in the numeric fields", d))?,
        _ => {}
    }
    if cfg.buffer_size == 0 {
        Err("buffer_size must be greater than 0")?
    }
    if cfg.progress_every == 0 {
        Err("progress_every must be greater than 0")?
    }
    Ok(())
}

pub fn get_cli() -> Result<CliCfg> {
    let cfg: CliCfg = CliCfg::from_args();
    if cfg.print_examples {
        print_examples();
        std::process::exit(0);
    }
    check_cfg(&cfg)?;
    if cfg.verbose == 1 {
        eprintln!("CLI options: {:?}", cfg);
    } else if cfg.verbose > 1 {
        eprintln!("CLI options: {:#?}", cfg);
    }
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliCfg {
        let mut v = vec!["gen_rows"];
        v.extend_from_slice(args);
        CliCfg::from_iter_safe(v).expect("args should parse")
    }

    #[test]
    fn defaults_match_tables() {
        let cfg = parse(&[]);
        assert_eq!(cfg.rows, 10_000_000);
        assert_eq!(cfg.multiplier, 3);
        assert_eq!(cfg.year, 2010);
        assert_eq!(cfg.delimiter, ',');
        assert_eq!(cfg.seed, None);
        assert_eq!(cfg.buffer_size, 256 * 1024);
        assert!(!cfg.stats);
        assert!(check_cfg(&cfg).is_ok());
    }

    #[test]
    fn human_counts() {
        for (s, v) in &[("0", 0u64), ("5", 5), ("100K", 100_000), ("10m", 10_000_000), ("1_000", 1_000), ("2G", 2_000_000_000)] {
            assert_eq!(from_human_count(s).unwrap(), *v, "parse of {}", s);
        }
        assert!(from_human_count("M").is_err());
        assert!(from_human_count("10Q").is_err());
        assert!(from_human_count("99999999999999999999G").is_err());
    }

    #[test]
    fn human_sizes() {
        assert_eq!(from_human_size("10").unwrap(), 10);
        assert_eq!(from_human_size("10B").unwrap(), 10);
        assert_eq!(from_human_size("256K").unwrap(), 256 * 1024);
        assert_eq!(from_human_size("2mb").unwrap(), 2 * 1024 * 1024);
        assert!(from_human_size("4X").is_err());
    }

    #[test]
    fn delimiter_escapes() {
        assert_eq!(escape_parser("\\t").unwrap(), '\t');
        assert_eq!(escape_parser("\\0").unwrap(), '\0');
        assert_eq!(escape_parser("\\d124").unwrap(), '|');
        assert_eq!(escape_parser(";").unwrap(), ';');
        assert!(escape_parser("\\d200").is_err());
        assert!(escape_parser(",,").is_err());
        assert!(escape_parser("é").is_err());
    }

    #[test]
    fn overflowing_ids_rejected() {
        let cfg = parse(&["-n", "10", "-k", &u64::MAX.to_string()]);
        assert!(check_cfg(&cfg).is_err());
        // one row only ever uses id 0
        let cfg = parse(&["-n", "1", "-k", &u64::MAX.to_string()]);
        assert!(check_cfg(&cfg).is_ok());
    }

    #[test]
    fn bad_delimiters_and_sizes_rejected() {
        assert!(check_cfg(&parse(&["-d", "\""])).is_err());
        assert!(check_cfg(&parse(&["-d", "\\d10"])).is_err());
        assert!(check_cfg(&parse(&["-d", "\\d49"])).is_err());
        assert!(check_cfg(&parse(&["-d", "7"])).is_err());
        assert!(check_cfg(&parse(&["--buffer_size", "0"])).is_err());
        assert!(check_cfg(&parse(&["--progress_every", "0"])).is_err());
        assert!(check_cfg(&parse(&["-d", "|", "-n", "5K", "-s", "7"])).is_ok());
    }
}
