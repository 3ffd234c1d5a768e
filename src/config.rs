use std::env;
use std::path::PathBuf;

use getset::{CopyGetters, Getters};

use crate::energy::columns::NumericFilter;

pub const USAGE: &str = "Usage: energy-mix [--energy-only] <input_file> [column ...]";
pub const OUTPUT_DIR_VAR: &str = "OUTPUT_DIR";

#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct Options {
    #[getset(get = "pub")]
    input: PathBuf,
    #[getset(get = "pub")]
    columns: Vec<String>,
    #[getset(get_copy = "pub")]
    filter: NumericFilter,
    #[getset(get = "pub")]
    output_dir: PathBuf,
}

impl Options {
    /// Parses the arguments after the program name. Returns `None` when no input file is given.
    pub fn from_args(args: &[String]) -> Option<Options> {
        let mut filter = NumericFilter::AllNumeric;
        let mut positional = Vec::new();
        for arg in args {
            match arg.as_str() {
                "--energy-only" => filter = NumericFilter::EnergySources,
                _ => positional.push(arg.clone()),
            }
        }

        let mut positional = positional.into_iter();
        let input = PathBuf::from(positional.next()?);

        Some(Options {
            input,
            columns: positional.collect(),
            filter,
            output_dir: env::var(OUTPUT_DIR_VAR).map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(".")),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn test_input_and_columns() {
        let options = Options::from_args(&args(&["mix.csv", "Solar_MW", "Eolian_MW"])).unwrap();

        assert_eq!(options.input(), &PathBuf::from("mix.csv"));
        assert_eq!(options.columns(), &args(&["Solar_MW", "Eolian_MW"]));
        assert_eq!(options.filter(), NumericFilter::AllNumeric);
    }

    #[test]
    fn test_energy_only_flag() {
        let options = Options::from_args(&args(&["--energy-only", "mix.xlsx"])).unwrap();

        assert_eq!(options.input(), &PathBuf::from("mix.xlsx"));
        assert_eq!(options.columns().is_empty(), true);
        assert_eq!(options.filter(), NumericFilter::EnergySources);
    }

    #[test]
    fn test_missing_input() {
        assert_eq!(Options::from_args(&args(&["--energy-only"])), None);
        assert_eq!(Options::from_args(&[]), None);
    }
}
