use anyhow::{anyhow, Context, Result};
use log::{error, warn, info, debug};
use std::path::{Path, PathBuf};
use std::time::Duration;
use indicatif::{ProgressBar, ProgressStyle};
use dialoguer::Confirm;

use crate::app_config::Config;
use crate::cutter::{self, CutSummary, FfmpegCutter, MediaCutter};
use crate::errors::SubtitleError;
use crate::file_utils::FileManager;
use crate::report;
use crate::segment_planner::{SegmentPlan, SegmentPlanner};
use crate::speaker_alignment::{self, AssignmentReport};
use crate::subtitle_processor::SubtitleCollection;

// @module: Application controller driving plan, confirmation and cutting

/// Inputs for one split run
#[derive(Debug, Clone)]
pub struct SplitRequest {
    pub subtitle_file: PathBuf,
    pub media_file: PathBuf,
    /// Skip the confirmation prompt
    pub assume_yes: bool,
    /// Stop after showing the plan
    pub dry_run: bool,
}

/// How a split run ended
#[derive(Debug)]
pub enum SplitOutcome {
    /// The subtitle file held no usable lines, or planning produced nothing
    NothingToDo,
    /// Plan shown, no cutting requested
    DryRun(SegmentPlan),
    /// The user declined at the prompt
    Cancelled(SegmentPlan),
    /// Cutting ran; individual segments may still have failed
    Completed {
        plan: SegmentPlan,
        output_dir: PathBuf,
        summary: CutSummary,
    },
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn planner(&self) -> SegmentPlanner {
        SegmentPlanner::new(self.config.min_duration_secs, self.config.padding_secs)
    }

    /// Load and sort subtitles; `None` when the file has no usable lines
    pub fn load_subtitles(&self, subtitle_file: &Path) -> Result<Option<SubtitleCollection>> {
        match SubtitleCollection::load(subtitle_file) {
            Ok(collection) => Ok(Some(collection)),
            Err(SubtitleError::NoEntries) => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to parse subtitle file: {}", subtitle_file.display())),
        }
    }

    /// Plan segments and log the speaker analysis
    pub fn plan_subtitles(&self, collection: &SubtitleCollection) -> SegmentPlan {
        let planner = self.planner();
        debug!(
            "Planning {} lines: minimum {} ms, padding {} ms",
            collection.entries.len(), planner.min_duration_ms(), planner.padding_ms()
        );
        let plan = planner.plan(&collection.entries);

        if plan.multi_speaker {
            info!("Subtitle analysis: multiple speakers detected");
            info!(
                "Speakers: {}",
                plan.speakers.iter().cloned().collect::<Vec<_>>().join(", ")
            );
        } else {
            info!("Subtitle analysis: no multi-speaker information, splitting on duration only");
        }

        if plan.tail_merged {
            info!("Last segment was too short and has been merged into the previous one");
        }

        plan
    }

    /// Full split run using ffmpeg and an interactive prompt
    pub async fn run_split(&self, request: &SplitRequest) -> Result<SplitOutcome> {
        Self::check_inputs(request)?;

        let ffmpeg = cutter::locate_ffmpeg(self.config.cutting.ffmpeg_path.as_deref())?;
        let cutter = FfmpegCutter::new(
            ffmpeg,
            self.config.cutting.ffmpeg_args.clone(),
            Duration::from_secs(self.config.cutting.cut_timeout_secs),
        );
        info!("FFmpeg: {}", cutter.ffmpeg_path().display());

        self.run_split_with_cutter(request, &cutter, Self::confirm_plan).await
    }

    /// Split run with an injected cutter and confirmation step
    pub async fn run_split_with_cutter<C, F>(
        &self,
        request: &SplitRequest,
        cutter: &C,
        confirm: F,
    ) -> Result<SplitOutcome>
    where
        C: MediaCutter + ?Sized,
        F: FnOnce(&SegmentPlan) -> Result<bool>,
    {
        Self::check_inputs(request)?;

        info!("Subtitle file: {}", request.subtitle_file.display());
        info!("Media file: {}", request.media_file.display());
        info!("Minimum duration: {} s", self.config.min_duration_secs);
        info!("Padding: {} s", self.config.padding_secs);

        let Some(collection) = self.load_subtitles(&request.subtitle_file)? else {
            warn!("Subtitle file is empty or contains no valid events");
            return Ok(SplitOutcome::NothingToDo);
        };
        debug!("{}", collection);

        let plan = self.plan_subtitles(&collection);
        if plan.is_empty() {
            warn!("No segments could be produced with the current settings");
            return Ok(SplitOutcome::NothingToDo);
        }

        println!("{}", report::render_plan_table(&plan.segments));

        if request.dry_run {
            return Ok(SplitOutcome::DryRun(plan));
        }

        if !request.assume_yes && !confirm(&plan)? {
            warn!("Operation cancelled");
            return Ok(SplitOutcome::Cancelled(plan));
        }

        let output_dir = FileManager::segment_output_dir(&request.media_file);
        FileManager::ensure_dir(&output_dir)
            .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;
        info!("Writing segments to: {}", output_dir.display());

        let summary = self.cut_segments(cutter, &request.media_file, &output_dir, &plan).await;

        Ok(SplitOutcome::Completed { plan, output_dir, summary })
    }

    /// Cut every planned segment, reporting progress as each finishes
    pub async fn cut_segments<C>(&self, cutter: &C, media_file: &Path, output_dir: &Path, plan: &SegmentPlan) -> CutSummary
    where
        C: MediaCutter + ?Sized,
    {
        let jobs = cutter::build_jobs(&plan.segments, media_file, output_dir);
        let total = jobs.len();

        let progress_bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} segments ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));

        let summary = cutter::run_cuts(
            cutter,
            media_file,
            jobs,
            self.config.cutting.concurrent_cuts,
            |outcome| {
                match &outcome.result {
                    Ok(()) => progress_bar.println(format!("  ✓ {}", outcome.job.output_name())),
                    Err(e) => {
                        progress_bar.println(format!("  ✗ {} - {}", outcome.job.output_name(), e));
                        error!("Segment {} failed: {}", outcome.job.index, e);
                    }
                }
                progress_bar.inc(1);
            },
        ).await;

        progress_bar.finish_and_clear();

        info!("All segments processed.");
        info!("Succeeded: {}, failed: {}", summary.succeeded, summary.failed);

        summary
    }

    /// Label subtitle lines from an RTTM diarization file and save the result
    pub fn run_assign_speakers(
        &self,
        subtitle_file: &Path,
        rttm_file: &Path,
        output_file: Option<&Path>,
    ) -> Result<(PathBuf, AssignmentReport)> {
        let mut collection = SubtitleCollection::load(subtitle_file)
            .with_context(|| format!("Failed to load subtitle file: {}", subtitle_file.display()))?;

        let rttm = std::fs::read_to_string(rttm_file)
            .with_context(|| format!("Failed to read diarization file: {}", rttm_file.display()))?;
        let turns = speaker_alignment::parse_rttm(&rttm)?;
        if turns.is_empty() {
            warn!("Diarization file contains no speaker turns: {}", rttm_file.display());
        }

        let report = speaker_alignment::assign_speakers(&mut collection, &turns);

        let output_path = output_file
            .map(Path::to_path_buf)
            .unwrap_or_else(|| speaker_alignment::default_output_path(subtitle_file));
        collection.write_to_file(&output_path)
            .with_context(|| format!("Failed to write subtitle file: {}", output_path.display()))?;

        info!(
            "Labelled {} lines ({} kept existing labels, {} without a matching turn)",
            report.labelled, report.preserved, report.unmatched
        );
        info!("Output saved to: {}", output_path.display());

        Ok((output_path, report))
    }

    fn check_inputs(request: &SplitRequest) -> Result<()> {
        if !FileManager::file_exists(&request.subtitle_file) {
            return Err(anyhow!("Subtitle file not found: {}", request.subtitle_file.display()));
        }
        if !FileManager::file_exists(&request.media_file) {
            return Err(anyhow!("Media file not found: {}", request.media_file.display()));
        }
        Ok(())
    }

    fn confirm_plan(plan: &SegmentPlan) -> Result<bool> {
        Confirm::new()
            .with_prompt(format!("Continue with cutting {} segments?", plan.len()))
            .default(true)
            .interact()
            .context("Failed to read confirmation")
    }
}
