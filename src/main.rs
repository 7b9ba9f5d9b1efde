// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use log::{error, warn, info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand, Args};
use clap_complete::{generate, Shell};

use subsplit::app_config::{self, Config};
use subsplit::app_controller::{Controller, SplitOutcome, SplitRequest};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// Options shared by every command that reads configuration
#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Args, Debug, Clone)]
struct SplitOptions {
    /// Minimum clip duration in seconds
    #[arg(short = 't', long = "time")]
    min_duration: Option<f64>,

    /// Padding added around each cut in seconds
    #[arg(short, long)]
    padding: Option<f64>,

    /// Path to the ffmpeg executable (searched on PATH when omitted)
    #[arg(long)]
    ffmpeg: Option<String>,

    /// Number of cuts to run at once
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Cut without asking for confirmation
    #[arg(short, long)]
    yes: bool,

    /// Show the plan and exit
    #[arg(long, conflicts_with = "yes")]
    dry_run: bool,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug, Clone)]
struct SplitArgs {
    /// Subtitle file (SRT or ASS/SSA)
    #[arg(value_name = "SUBTITLE_FILE")]
    subtitle_file: PathBuf,

    /// Media file to cut
    #[arg(value_name = "MEDIA_FILE")]
    media_file: PathBuf,

    #[command(flatten)]
    options: SplitOptions,
}

#[derive(Args, Debug, Clone)]
struct AssignSpeakersArgs {
    /// Subtitle file (SRT or ASS/SSA)
    #[arg(value_name = "SUBTITLE_FILE")]
    subtitle_file: PathBuf,

    /// RTTM file produced by a diarization tool
    #[arg(value_name = "RTTM_FILE")]
    rttm_file: PathBuf,

    /// Output subtitle path (defaults to <name>.diarized.<ext>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split a media file along its subtitles (default command)
    Split(SplitArgs),

    /// Label subtitle lines with speakers from diarization output
    AssignSpeakers(AssignSpeakersArgs),

    /// Generate shell completions for subsplit
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// subsplit - split long recordings along their subtitles
#[derive(Parser, Debug)]
#[command(name = "subsplit")]
#[command(version)]
#[command(about = "Split media files into subtitle-aligned clips")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "subsplit cuts a long recording into clips whose boundaries follow its subtitles.

Each clip lasts at least the minimum duration, gets a little silence padding
around its cuts, and, when the subtitles carry several speakers, is never cut
while the same speaker keeps talking.

EXAMPLES:
    subsplit talk.ass talk.mkv                        # 60s clips with 0.5s padding
    subsplit -t 120 -p 0.3 talk.srt talk.mp4          # Custom duration and padding
    subsplit split --dry-run talk.ass talk.mkv        # Show the plan only
    subsplit split -y -j 4 talk.ass talk.mkv          # No prompt, four cuts at once
    subsplit assign-speakers talk.ass talk.rttm       # Fill speakers from diarization
    subsplit completions bash > subsplit.bash         # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Subtitle file (SRT or ASS/SSA)
    #[arg(value_name = "SUBTITLE_FILE")]
    subtitle_file: Option<PathBuf>,

    /// Media file to cut
    #[arg(value_name = "MEDIA_FILE")]
    media_file: Option<PathBuf>,

    #[command(flatten)]
    options: SplitOptions,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Marker and ANSI color for a log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌", "1;31"),
            Level::Warn => ("🚧", "1;33"),
            Level::Info => ("  ", "1;32"),
            Level::Debug => ("🔍", "1;36"),
            Level::Trace => ("📋", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (marker, color) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", color, now, marker, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the effective level is set through log::set_max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subsplit", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Split(args)) => run_split(args).await,
        Some(Commands::AssignSpeakers(args)) => run_assign_speakers(args),
        None => {
            // Default behavior - bare positional arguments mean split
            let (Some(subtitle_file), Some(media_file)) = (cli.subtitle_file, cli.media_file) else {
                return Err(anyhow!("SUBTITLE_FILE and MEDIA_FILE are required when no subcommand is specified"));
            };
            run_split(SplitArgs { subtitle_file, media_file, options: cli.options }).await
        }
    }
}

/// Load or create configuration, then apply the effective log level
fn load_config(common: &CommonArgs) -> Result<Config> {
    if let Some(level) = &common.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let config_path = Path::new(&common.config_path);
    let mut config = if config_path.exists() {
        Config::from_file(config_path)?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path.display());
        let config = Config::default();
        config.save(config_path)?;
        config
    };

    match &common.log_level {
        Some(level) => config.log_level = level.clone().into(),
        None => log::set_max_level(config.log_level.to_level_filter()),
    }

    Ok(config)
}

async fn run_split(args: SplitArgs) -> Result<()> {
    let options = &args.options;
    let mut config = load_config(&options.common)?;

    // Override config with CLI options if provided
    if let Some(min_duration) = options.min_duration {
        config.min_duration_secs = min_duration;
    }
    if let Some(padding) = options.padding {
        config.padding_secs = padding;
    }
    if let Some(ffmpeg) = &options.ffmpeg {
        config.cutting.ffmpeg_path = Some(ffmpeg.clone());
    }
    if let Some(jobs) = options.jobs {
        config.cutting.concurrent_cuts = jobs;
    }

    let controller = Controller::with_config(config)?;

    let request = SplitRequest {
        subtitle_file: args.subtitle_file,
        media_file: args.media_file,
        assume_yes: options.yes,
        dry_run: options.dry_run,
    };

    match controller.run_split(&request).await? {
        SplitOutcome::Completed { summary, .. } if !summary.all_succeeded() => {
            error!("{} of {} segments failed", summary.failed, summary.failed + summary.succeeded);
            Err(anyhow!("{} segment(s) failed to cut", summary.failed))
        }
        SplitOutcome::Completed { output_dir, .. } => {
            info!("Done: {}", output_dir.display());
            Ok(())
        }
        SplitOutcome::DryRun(plan) => {
            info!("Dry run: {} segments planned", plan.len());
            Ok(())
        }
        SplitOutcome::Cancelled(_) | SplitOutcome::NothingToDo => Ok(()),
    }
}

fn run_assign_speakers(args: AssignSpeakersArgs) -> Result<()> {
    let config = load_config(&args.common)?;
    let controller = Controller::with_config(config)?;

    controller.run_assign_speakers(&args.subtitle_file, &args.rttm_file, args.output.as_deref())?;
    Ok(())
}
