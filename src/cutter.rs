/*!
 * External cutting tool boundary.
 *
 * Locates ffmpeg, turns planned segments into cut jobs and runs them with
 * bounded parallelism. A failing cut is recorded and the remaining jobs
 * still run.
 */

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use log::debug;
use tokio::process::Command;

use crate::errors::CutError;
use crate::file_utils::FileManager;
use crate::segment_planner::Segment;
use crate::time_format::format_ms;

/// One clip to produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutJob {
    /// 1-based segment index
    pub index: usize,
    /// Inclusive start in milliseconds
    pub start_ms: u64,
    /// Exclusive end in milliseconds
    pub end_ms: u64,
    /// Destination file
    pub output_path: PathBuf,
}

impl CutJob {
    pub fn output_name(&self) -> String {
        self.output_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.output_path.display().to_string())
    }
}

/// Builds one job per segment, writing into `output_dir`
pub fn build_jobs<P1: AsRef<Path>, P2: AsRef<Path>>(segments: &[Segment], media_file: P1, output_dir: P2) -> Vec<CutJob> {
    segments
        .iter()
        .enumerate()
        .map(|(i, segment)| CutJob {
            index: i + 1,
            start_ms: segment.start_time(),
            end_ms: segment.end_time(),
            output_path: FileManager::segment_output_path(media_file.as_ref(), output_dir.as_ref(), i + 1),
        })
        .collect()
}

/// Something that can cut a time range out of a media file
#[async_trait]
pub trait MediaCutter: Send + Sync {
    async fn cut(&self, media_file: &Path, job: &CutJob) -> Result<(), CutError>;
}

/// Finds ffmpeg: an explicit path must name an existing file, otherwise PATH is searched
pub fn locate_ffmpeg(explicit: Option<&str>) -> Result<PathBuf, CutError> {
    match explicit {
        Some(path) => {
            if FileManager::file_exists(path) {
                Ok(PathBuf::from(path))
            } else {
                Err(CutError::ToolNotFound(format!("no ffmpeg at specified path: {}", path)))
            }
        }
        None => which::which("ffmpeg").map_err(|_| {
            CutError::ToolNotFound("ffmpeg is not on PATH; pass --ffmpeg to point at it".to_string())
        }),
    }
}

/// Cuts with an ffmpeg executable
#[derive(Debug, Clone)]
pub struct FfmpegCutter {
    ffmpeg: PathBuf,
    extra_args: Vec<String>,
    timeout: Duration,
}

impl FfmpegCutter {
    pub fn new(ffmpeg: PathBuf, extra_args: Vec<String>, timeout: Duration) -> Self {
        Self { ffmpeg, extra_args, timeout }
    }

    pub fn ffmpeg_path(&self) -> &Path {
        &self.ffmpeg
    }

    /// Arguments for one job: `-ss <start> -to <end> -i <media> <extra...> <output>`
    pub fn command_args(&self, media_file: &Path, job: &CutJob) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-ss".into(),
            format_ms(job.start_ms).into(),
            "-to".into(),
            format_ms(job.end_ms).into(),
            "-i".into(),
            media_file.as_os_str().to_os_string(),
        ];
        args.extend(self.extra_args.iter().map(OsString::from));
        args.push(job.output_path.as_os_str().to_os_string());
        args
    }
}

#[async_trait]
impl MediaCutter for FfmpegCutter {
    async fn cut(&self, media_file: &Path, job: &CutJob) -> Result<(), CutError> {
        let args = self.command_args(media_file, job);
        debug!("Running {:?} {:?}", self.ffmpeg, args);

        let output_future = Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, output_future).await {
            Ok(result) => result.map_err(|e| CutError::Spawn {
                tool: self.ffmpeg.display().to_string(),
                message: e.to_string(),
            })?,
            Err(_) => return Err(CutError::Timeout(self.timeout.as_secs())),
        };

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(CutError::Failed {
                status: output.status.code().map_or_else(|| "signal".to_string(), |c| c.to_string()),
                stderr: filter_ffmpeg_stderr(&stderr),
            })
        }
    }
}

/// Filter ffmpeg stderr to only show meaningful error lines, stripping the
/// version banner, build configuration, stream metadata and progress noise.
pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
    let noise_prefixes = [
        "ffmpeg version",
        "built with",
        "configuration:",
        "lib",
        "Input #",
        "Metadata:",
        "Duration:",
        "Chapter",
        "Stream #",
        "Output #",
        "Stream mapping:",
        "Press [q]",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !line.contains("frame="))
        .filter(|line| !noise_prefixes.iter().any(|p| line.starts_with(p)))
        .collect();

    if meaningful.is_empty() {
        "unknown ffmpeg error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}

/// Result of one job
#[derive(Debug)]
pub struct CutOutcome {
    pub job: CutJob,
    pub result: Result<(), CutError>,
}

impl CutOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Aggregate over all jobs, outcomes in segment order
#[derive(Debug, Default)]
pub struct CutSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<CutOutcome>,
}

impl CutSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Runs every job, at most `concurrency` at a time.
///
/// `on_done` sees each outcome as it completes, which may be out of order
/// when `concurrency > 1`.
pub async fn run_cuts<C, F>(
    cutter: &C,
    media_file: &Path,
    jobs: Vec<CutJob>,
    concurrency: usize,
    mut on_done: F,
) -> CutSummary
where
    C: MediaCutter + ?Sized,
    F: FnMut(&CutOutcome),
{
    let mut results = stream::iter(jobs)
        .map(|job| async move {
            let result = cutter.cut(media_file, &job).await;
            CutOutcome { job, result }
        })
        .buffer_unordered(concurrency.max(1));

    let mut summary = CutSummary::default();
    while let Some(outcome) = results.next().await {
        on_done(&outcome);
        if outcome.is_success() {
            summary.succeeded += 1;
        } else {
            summary.failed += 1;
        }
        summary.outcomes.push(outcome);
    }

    summary.outcomes.sort_by_key(|o| o.job.index);
    summary
}
