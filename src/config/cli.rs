use crate::config::toml_config::TomlConfig;
use crate::config::{BatchConfig, DEFAULT_INPUT_PATH};
use crate::domain::model::RunMode;
use crate::utils::error::Result;
use clap::{ArgGroup, CommandFactory, Parser};
use std::path::PathBuf;
use std::time::Duration;

const HELP_TEXT: &str = "
 Available commands:

  1. -h : display help text
  2. -p : call the geocoding API for every row of the input list
          (cell delimiter = ;, no text delimiter); resets output and log files
  3. -d : same as -p
  4. -c : continue a previous run, skipping ids already logged as OK
";

#[derive(Debug, Clone, Parser)]
#[command(name = "geocode-batch")]
#[command(about = "Resumable batch geocoding of a delimited address list")]
#[command(disable_help_flag = true)]
#[command(group(ArgGroup::new("mode").args(["help", "process", "download", "resume"])))]
pub struct CliConfig {
    #[arg(short = 'h', long, help = "Display help text")]
    pub help: bool,

    #[arg(short = 'p', long, help = "Start a fresh run over every input row")]
    pub process: bool,

    #[arg(short = 'd', long, help = "Alias of -p")]
    pub download: bool,

    #[arg(short = 'c', long = "continue", help = "Resume, skipping ids already logged as OK")]
    pub resume: bool,

    #[arg(long, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub input: Option<PathBuf>,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub log: Option<PathBuf>,

    #[arg(long, help = "Geocoding API base URL")]
    pub endpoint: Option<String>,

    #[arg(long, help = "Region hint appended to every address")]
    pub region: Option<String>,

    #[arg(long)]
    pub batch_size: Option<usize>,

    #[arg(long, help = "Pause after each request, in milliseconds")]
    pub delay_ms: Option<u64>,

    #[arg(long, help = "Requests in flight within one batch (1 = sequential)")]
    pub concurrent_requests: Option<usize>,

    #[arg(long, help = "Text delimiter used around input cells")]
    pub quote: Option<char>,

    #[arg(long, help = "Treat the first input line as data")]
    pub no_header: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl CliConfig {
    /// 無參數或 `-h` 時回傳 `None`
    pub fn run_mode(&self) -> Option<RunMode> {
        if self.process || self.download {
            Some(RunMode::FreshStart)
        } else if self.resume {
            Some(RunMode::Resume)
        } else {
            None
        }
    }

    pub fn usage() -> String {
        format!(
            "{}\n Default input: '{}'\n\n{}",
            HELP_TEXT,
            DEFAULT_INPUT_PATH,
            CliConfig::command().render_help()
        )
    }

    /// 預設值 → 設定檔 → 命令列 → 環境變數中的金鑰
    pub fn resolve(&self) -> Result<BatchConfig> {
        let mut config = BatchConfig::default();

        if let Some(path) = &self.config {
            tracing::info!("📁 Loading configuration from: {}", path.display());
            config.apply_toml(&TomlConfig::from_file(path)?);
        }

        if let Some(input) = &self.input {
            config.input_path = input.clone();
        }
        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }
        if let Some(log) = &self.log {
            config.log_path = log.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            config.api_endpoint = endpoint.clone();
        }
        if let Some(region) = &self.region {
            config.region = region.clone();
        }
        if let Some(size) = self.batch_size {
            config.batch_size = size;
        }
        if let Some(delay) = self.delay_ms {
            config.request_delay = Duration::from_millis(delay);
        }
        if let Some(concurrent) = self.concurrent_requests {
            config.concurrent_requests = concurrent;
        }
        if self.quote.is_some() {
            config.quote = self.quote;
        }
        if self.no_header {
            config.has_header = false;
        }

        config.apply_env();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<CliConfig, clap::Error> {
        CliConfig::try_parse_from(std::iter::once("geocode-batch").chain(args.iter().copied()))
    }

    #[test]
    fn test_mode_flags() {
        assert_eq!(parse(&["-p"]).unwrap().run_mode(), Some(RunMode::FreshStart));
        assert_eq!(parse(&["-d"]).unwrap().run_mode(), Some(RunMode::FreshStart));
        assert_eq!(parse(&["-c"]).unwrap().run_mode(), Some(RunMode::Resume));
        assert_eq!(parse(&["-h"]).unwrap().run_mode(), None);
        assert_eq!(parse(&[]).unwrap().run_mode(), None);
    }

    #[test]
    fn test_unknown_or_conflicting_flags_fail_to_parse() {
        assert!(parse(&["-x"]).is_err());
        assert!(parse(&["-p", "-c"]).is_err());
        assert!(parse(&["extra"]).is_err());
    }

    #[test]
    fn test_resolve_applies_overrides() {
        let cli = parse(&[
            "-c",
            "--input",
            "in.csv",
            "--batch-size",
            "5",
            "--delay-ms",
            "0",
            "--quote",
            "\"",
            "--no-header",
        ])
        .unwrap();

        let config = cli.resolve().unwrap();

        assert_eq!(config.input_path, PathBuf::from("in.csv"));
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.request_delay, Duration::ZERO);
        assert_eq!(config.quote, Some('"'));
        assert!(!config.has_header);
    }

    #[test]
    fn test_usage_lists_commands() {
        let usage = CliConfig::usage();
        assert!(usage.contains("-p"));
        assert!(usage.contains("-c"));
        assert!(usage.contains(DEFAULT_INPUT_PATH));
    }
}
