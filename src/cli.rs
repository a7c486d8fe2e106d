//! Command line arguments for vidsched.

use bridge_traits::time::LogLevel;
use clap::Parser;
use core_runtime::config::{
    DEFAULT_CLIENT_SECRETS_FILE, DEFAULT_CREDENTIAL_CACHE_FILE, DEFAULT_METADATA_FILE,
    DEFAULT_VIDEO_FOLDER,
};
use core_runtime::logging::{LogFormat, LoggingConfig};
use core_runtime::SchedulerConfig;
use core_service::RunOptions;
use std::path::PathBuf;

/// Schedule and upload a folder of videos to YouTube.
///
/// Every video file in the folder gets a row in the metadata CSV with a
/// publish date and time. Fill in title, description and tags, then run
/// again: videos whose date has come are uploaded as private with a
/// scheduled publish time, and marked as uploaded.
#[derive(Parser, Debug)]
#[command(name = "vidsched", version, about, long_about = None)]
pub struct Cli {
    /// Folder containing the videos to schedule
    #[arg(long, env = "VIDSCHED_VIDEO_FOLDER", default_value = DEFAULT_VIDEO_FOLDER)]
    pub video_folder: PathBuf,

    /// Metadata CSV file
    #[arg(long, env = "VIDSCHED_METADATA", default_value = DEFAULT_METADATA_FILE)]
    pub metadata: PathBuf,

    /// OAuth client secrets downloaded from the Google Cloud console
    #[arg(long, env = "VIDSCHED_CLIENT_SECRETS", default_value = DEFAULT_CLIENT_SECRETS_FILE)]
    pub client_secrets: PathBuf,

    /// Where the authorized credential is cached between runs
    #[arg(long, env = "VIDSCHED_TOKEN_CACHE", default_value = DEFAULT_CREDENTIAL_CACHE_FILE)]
    pub token_cache: PathBuf,

    /// Retries per video for transient server errors
    #[arg(long, env = "VIDSCHED_MAX_RETRIES")]
    pub max_retries: Option<u32>,

    /// Upload chunk size in bytes (multiple of 262144)
    #[arg(long, env = "VIDSCHED_CHUNK_SIZE")]
    pub chunk_size: Option<u64>,

    /// Check the schedule and show what would be uploaded, without uploading
    #[arg(long, conflicts_with = "list")]
    pub dry_run: bool,

    /// Print the schedule and exit
    #[arg(long)]
    pub list: bool,

    /// Log level
    #[arg(long, env = "VIDSCHED_LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Log format (pretty, compact, json)
    #[arg(long, env = "VIDSCHED_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    pub fn scheduler_config(&self) -> core_runtime::Result<SchedulerConfig> {
        let mut builder = SchedulerConfig::builder()
            .video_folder(&self.video_folder)
            .metadata_file(&self.metadata)
            .client_secrets_file(&self.client_secrets)
            .credential_cache_file(&self.token_cache);

        if let Some(retries) = self.max_retries {
            builder = builder.max_retries(retries);
        }
        if let Some(bytes) = self.chunk_size {
            builder = builder.chunk_size(bytes);
        }

        builder.build()
    }

    pub fn logging_config(&self) -> LoggingConfig {
        let config = LoggingConfig::default().with_level(self.log_level);
        match self.log_format {
            Some(format) => config.with_format(format),
            None => config,
        }
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            dry_run: self.dry_run,
            list: self.list,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["vidsched"]).unwrap();
        let config = cli.scheduler_config().unwrap();

        assert_eq!(config.video_folder, PathBuf::from("videos"));
        assert_eq!(config.metadata_file, PathBuf::from("video_metadata.csv"));
        assert_eq!(config.credential_cache_file, PathBuf::from("token.json"));
        assert_eq!(config.upload.max_retries, 5);
        assert_eq!(cli.run_options(), RunOptions::default());
        assert_eq!(cli.log_level, LogLevel::Info);
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from([
            "vidsched",
            "--video-folder",
            "/srv/clips",
            "--max-retries",
            "2",
            "--dry-run",
            "--log-level",
            "debug",
            "--log-format",
            "json",
        ])
        .unwrap();
        let config = cli.scheduler_config().unwrap();

        assert_eq!(config.video_folder, PathBuf::from("/srv/clips"));
        assert_eq!(config.upload.max_retries, 2);
        assert!(cli.run_options().dry_run);
        assert_eq!(cli.logging_config().format, LogFormat::Json);
        assert_eq!(cli.logging_config().level, LogLevel::Debug);
    }

    #[test]
    fn test_bad_chunk_size_is_rejected() {
        let cli = Cli::try_parse_from(["vidsched", "--chunk-size", "1000"]).unwrap();
        assert!(cli.scheduler_config().is_err());
    }

    #[test]
    fn test_list_and_dry_run_conflict() {
        assert!(Cli::try_parse_from(["vidsched", "--list", "--dry-run"]).is_err());
    }
}
