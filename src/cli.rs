use clap::Parser;
use log::LevelFilter;
use std::path::{Path, PathBuf};

use crate::gma::{DEFAULT_BUFFER_SIZE, ExtractOptions};

#[derive(Parser, Debug)]
#[command(name = "gmadx")]
#[command(version)]
#[command(about = "Extract GMAD (.gma) addon archives", long_about = None)]
#[command(after_help = "Examples:\n  \
  gmadx my_addon.gma                 extract next to the archive\n  \
  gmadx my_addon.gma -d addons       extract into ./addons/<addon name>\n  \
  gmadx -l https://example.com/a.gma list files from a remote archive")]
pub struct Cli {
    /// GMAD file path or HTTP URL
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Extract into DIR (default: the archive's directory, or . for URLs)
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<PathBuf>,

    /// List addon info and files without extracting
    #[arg(short = 'l')]
    pub list: bool,

    /// Verbose logging
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Refuse entries whose path is absolute or contains `..`
    #[arg(long = "safe-paths")]
    pub safe_paths: bool,

    /// Resume a dropped HTTP download up to N times (default: fail at once)
    #[arg(long = "resume-retries", value_name = "N", default_value_t = 0)]
    pub resume_retries: u32,

    /// Copy buffer size in bytes
    #[arg(long = "buffer-size", value_name = "BYTES", default_value_t = DEFAULT_BUFFER_SIZE)]
    pub buffer_size: usize,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.file.starts_with("http://") || self.file.starts_with("https://")
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Default log filter; `RUST_LOG` still takes precedence
    pub fn log_level(&self) -> LevelFilter {
        if self.is_very_quiet() {
            LevelFilter::Off
        } else if self.is_quiet() {
            LevelFilter::Error
        } else if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        }
    }

    pub fn output_root(&self) -> PathBuf {
        match &self.extract_dir {
            Some(dir) => dir.clone(),
            None if self.is_http_url() => PathBuf::from("."),
            None => Path::new(&self.file)
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            buffer_size: self.buffer_size,
            reject_unsafe_paths: self.safe_paths,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_root_defaults() {
        let cli = Cli::parse_from(["gmadx", "addons/thing.gma"]);
        assert_eq!(cli.output_root(), PathBuf::from("addons"));

        let cli = Cli::parse_from(["gmadx", "thing.gma"]);
        assert_eq!(cli.output_root(), PathBuf::from("."));

        let cli = Cli::parse_from(["gmadx", "https://example.com/a.gma"]);
        assert!(cli.is_http_url());
        assert_eq!(cli.output_root(), PathBuf::from("."));

        let cli = Cli::parse_from(["gmadx", "a.gma", "-d", "out"]);
        assert_eq!(cli.output_root(), PathBuf::from("out"));
    }

    #[test]
    fn options_and_log_level() {
        let cli = Cli::parse_from(["gmadx", "a.gma", "--safe-paths", "--buffer-size", "4096", "-qq"]);
        let options = cli.extract_options();
        assert!(options.reject_unsafe_paths);
        assert_eq!(options.buffer_size, 4096);
        assert_eq!(cli.log_level(), LevelFilter::Off);

        let cli = Cli::parse_from(["gmadx", "a.gma", "-v"]);
        assert_eq!(cli.log_level(), LevelFilter::Debug);
        assert_eq!(cli.extract_options().buffer_size, DEFAULT_BUFFER_SIZE);
        assert_eq!(cli.resume_retries, 0);

        let cli = Cli::parse_from(["gmadx", "https://example.com/a.gma", "--resume-retries", "5"]);
        assert_eq!(cli.resume_retries, 5);
    }
}
