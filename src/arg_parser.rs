use std::{io, path::PathBuf};

use argparse::{ArgumentParser, Print, StoreOption, StoreTrue};

// Command line options, unset options fall back
// to the configuration file and then to the defaults
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ArgsOptions {
    pub config_file_path: Option<PathBuf>,

    pub speeds: Option<String>,
    pub device_index: Option<u32>,
    pub dry_run: bool,
    pub log_level: Option<String>,
    pub polling_duration: Option<String>,
}

impl ArgsOptions {
    pub fn parse() -> Self {
        let mut options = ArgsOptions::default();

        {
            let parser = Self::parser(&mut options);
            parser.parse_args_or_exit();
        }

        options
    }

    // Parse the given arguments, the first one being the program name.
    // Return the exit code argparse would have used on failure
    pub fn try_parse_from(args: Vec<String>) -> Result<Self, i32> {
        let mut options = ArgsOptions::default();

        {
            let parser = Self::parser(&mut options);
            parser.parse(args, &mut io::sink(), &mut io::sink())?;
        }

        Ok(options)
    }

    fn parser(options: &mut ArgsOptions) -> ArgumentParser<'_> {
        let mut parser = ArgumentParser::new();
        parser.set_description(
            "Drive the fans of a NVIDIA GPU from a custom temperature curve",
        );

        parser.refer(&mut options.speeds).add_option(
            &["-s", "--speeds"],
            StoreOption,
            "Fan curve as a list of temperature:speed pairs, \
            e.g. \"35:40,40:50,50:60,60:90,80:100\"",
        );

        parser.refer(&mut options.device_index).add_option(
            &["-d", "--device-index"],
            StoreOption,
            "Index of the GPU to control, defaults to the first one",
        );

        parser.refer(&mut options.dry_run).add_option(
            &["--dry-run"],
            StoreTrue,
            "Only log the fan speed changes, never write them to the GPU",
        );

        parser.refer(&mut options.log_level).add_option(
            &["-l", "--log-level"],
            StoreOption,
            "Log level: trace, debug, info, warn, error",
        );

        parser.refer(&mut options.polling_duration).add_option(
            &["-p", "--polling-duration"],
            StoreOption,
            "Time between two fan speed updates, e.g. 500ms, 5s, 1m",
        );

        // Configuration file path
        parser.refer(&mut options.config_file_path).add_option(
            &["-c", "--config"],
            StoreOption,
            "The file path of an optional JSON configuration file",
        );

        // Show version
        parser.add_option(
            &["-V", "--version"],
            Print(env!("CARGO_PKG_VERSION").to_string()),
            "Show the version",
        );

        parser
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("gpu-fan-curve")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn no_arguments_leaves_everything_unset() {
        let options = ArgsOptions::try_parse_from(args(&[])).unwrap();
        assert_eq!(options, ArgsOptions::default());
    }

    #[test]
    fn parse_all_options() {
        let options = ArgsOptions::try_parse_from(args(&[
            "--speeds",
            "30:20,70:100",
            "-d",
            "1",
            "--dry-run",
            "--log-level",
            "debug",
            "-p",
            "2s",
            "-c",
            "/etc/gpu-fan-curve.json",
        ]))
        .unwrap();

        assert_eq!(options.speeds.as_deref(), Some("30:20,70:100"));
        assert_eq!(options.device_index, Some(1));
        assert!(options.dry_run);
        assert_eq!(options.log_level.as_deref(), Some("debug"));
        assert_eq!(options.polling_duration.as_deref(), Some("2s"));
        assert_eq!(
            options.config_file_path,
            Some(PathBuf::from("/etc/gpu-fan-curve.json"))
        );
    }

    #[test]
    fn invalid_device_index_fails() {
        assert!(ArgsOptions::try_parse_from(args(&["-d", "first"])).is_err());
    }
}
