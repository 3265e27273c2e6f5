use clap::Parser;
use clap::error::ErrorKind;
use log::info;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::core::projection::{Conversion, CubemapLayout, Projection};
use crate::error::ConvertError;
use crate::io::config::Config;

/// Command line. Only the two paths are required; everything else falls
/// back to the config file, then to lat-long -> cubemap strip.
#[derive(Parser, Debug)]
#[command(name = "panoconv", version)]
#[command(about = "Convert panoramas between lat-long and cubemap projections")]
pub struct Cli {
    /// Input image (for separate faces: name.ext, read as name_<face>.ext)
    pub input: PathBuf,

    /// Output image (for separate faces: name.ext, written as name_<face>.ext)
    pub output: PathBuf,

    /// Source projection: latlong | cubemap
    #[arg(long, value_name = "PROJECTION")]
    pub from: Option<Projection>,

    /// Target projection: latlong | cubemap
    #[arg(long, value_name = "PROJECTION")]
    pub to: Option<Projection>,

    /// Cubemap storage: strip | separate-faces
    #[arg(long, value_name = "LAYOUT")]
    pub layout: Option<CubemapLayout>,

    /// TOML config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Worker threads (defaults to one per core)
    #[arg(short = 'j', long, value_name = "N")]
    pub threads: Option<usize>,
}

/// Everything one run needs, after merging flags over the config file.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub input: PathBuf,
    pub output: PathBuf,
    pub conversion: Conversion,
    pub threads: Option<usize>,
    pub atomic_write: bool,
}

/// What the command line asked for.
#[derive(Debug)]
pub enum Invocation {
    Run(Settings),
    /// `--help` or `--version`: print this and exit successfully.
    Info(String),
}

impl Cli {
    /// Parses `args` (program name first) and resolves the final settings.
    pub fn process<I, T>(args: I) -> Result<Invocation, ConvertError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = match Cli::try_parse_from(args) {
            Ok(cli) => cli,
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                return Ok(Invocation::Info(e.to_string()));
            }
            Err(e) => return Err(ConvertError::Usage(e.to_string())),
        };
        cli.into_settings().map(Invocation::Run)
    }

    fn into_settings(self) -> Result<Settings, ConvertError> {
        let config = match &self.config {
            Some(path) => {
                info!("Loading config file: {:?}", path);
                Config::load(path)?
            }
            None => Config::default(),
        };

        if self.threads == Some(0) {
            return Err(ConvertError::Usage("--threads must be at least 1".into()));
        }

        let base = config.conversion();
        Ok(Settings {
            input: self.input,
            output: self.output,
            conversion: Conversion {
                from: self.from.unwrap_or(base.from),
                to: self.to.unwrap_or(base.to),
                layout: self.layout.unwrap_or(base.layout),
            },
            threads: self.threads.or(config.render.threads),
            atomic_write: config.output.atomic_write,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn run(args: &[&str]) -> Settings {
        match Cli::process(args.iter().copied()).unwrap() {
            Invocation::Run(settings) => settings,
            Invocation::Info(text) => panic!("unexpected info output: {text}"),
        }
    }

    #[test]
    fn test_two_paths_use_classic_conversion() {
        let settings = run(&["panoconv", "in.jpg", "out.png"]);
        assert_eq!(settings.input, PathBuf::from("in.jpg"));
        assert_eq!(settings.output, PathBuf::from("out.png"));
        assert_eq!(settings.conversion, Conversion::default());
        assert!(settings.atomic_write);
    }

    #[test]
    fn test_wrong_argument_count_is_usage_error() {
        for args in [
            vec!["panoconv"],
            vec!["panoconv", "in.jpg"],
            vec!["panoconv", "a", "b", "c"],
        ] {
            let err = Cli::process(args).unwrap_err();
            assert!(matches!(err, ConvertError::Usage(_)));
            assert_eq!(err.exit_code(), 1);
        }
    }

    #[test]
    fn test_projection_flags() {
        let settings = run(&[
            "panoconv",
            "in.png",
            "out.png",
            "--from",
            "cubemap",
            "--to",
            "latlong",
            "--layout",
            "separate-faces",
        ]);
        assert_eq!(settings.conversion.from, Projection::Cubemap);
        assert_eq!(settings.conversion.to, Projection::LatLong);
        assert_eq!(settings.conversion.layout, CubemapLayout::SeparateFaces);
    }

    #[test]
    fn test_bad_projection_is_usage_error() {
        let err = Cli::process(["panoconv", "a", "b", "--to", "mercator"]).unwrap_err();
        assert!(matches!(err, ConvertError::Usage(_)));
        let err = Cli::process(["panoconv", "a", "b", "-j", "0"]).unwrap_err();
        assert!(matches!(err, ConvertError::Usage(_)));
    }

    #[test]
    fn test_help_is_not_an_error() {
        assert!(matches!(
            Cli::process(["panoconv", "--help"]),
            Ok(Invocation::Info(_))
        ));
        assert!(matches!(
            Cli::process(["panoconv", "--version"]),
            Ok(Invocation::Info(_))
        ));
    }

    #[test]
    fn test_flags_override_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("panoconv.toml");
        std::fs::write(
            &path,
            "[conversion]\nfrom = \"cubemap\"\nto = \"latlong\"\n[render]\nthreads = 3\n[output]\natomic_write = false\n",
        )
        .unwrap();
        let config = path.to_str().unwrap();

        let settings = run(&["panoconv", "a.png", "b.png", "-c", config, "--to", "cubemap"]);
        assert_eq!(settings.conversion.from, Projection::Cubemap);
        assert_eq!(settings.conversion.to, Projection::Cubemap);
        assert_eq!(settings.threads, Some(3));
        assert!(!settings.atomic_write);

        let settings = run(&["panoconv", "a.png", "b.png", "-c", config, "-j", "1"]);
        assert_eq!(settings.threads, Some(1));
    }

    #[test]
    fn test_unreadable_config_is_config_error() {
        let err = Cli::process(["panoconv", "a", "b", "--config", "/no/such/file.toml"]).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
