/*!
 * End-to-end tests for the split workflow, with the cutting tool mocked out
 */

use anyhow::Result;
use std::path::PathBuf;

use subsplit::app_config::Config;
use subsplit::app_controller::{Controller, SplitOutcome, SplitRequest};
use subsplit::file_utils::FileManager;
use crate::common;
use crate::common::mock_cutter::MockCutter;

fn test_config() -> Config {
    Config {
        min_duration_secs: 5.0,
        padding_secs: 0.5,
        ..Config::default()
    }
}

fn request(subtitle_file: PathBuf, media_file: PathBuf) -> SplitRequest {
    SplitRequest {
        subtitle_file,
        media_file,
        assume_yes: true,
        dry_run: false,
    }
}

/// Two speakers, out-of-order events and a short trailing line
#[tokio::test]
async fn test_run_split_withTwoSpeakerAss_shouldCutPlannedSegments() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let subtitle = common::create_test_ass(temp_dir.path(), "talk.ass")?;
    let media = common::create_fake_media(temp_dir.path(), "talk.mkv")?;
    let controller = Controller::with_config(test_config())?;
    let cutter = MockCutter::new();

    let outcome = controller
        .run_split_with_cutter(&request(subtitle, media), &cutter, |_| Ok(true))
        .await?;

    let SplitOutcome::Completed { plan, output_dir, summary } = outcome else {
        panic!("expected a completed run");
    };

    assert!(plan.multi_speaker);
    assert!(plan.tail_merged);
    assert_eq!(plan.len(), 2);
    assert_eq!((plan.segments[0].start_time(), plan.segments[0].end_time()), (500, 9_500));
    assert_eq!((plan.segments[1].start_time(), plan.segments[1].end_time()), (9_500, 27_500));
    assert_eq!((plan.segments[1].start_line_number, plan.segments[1].end_line_number), (3, 5));

    assert_eq!(output_dir, temp_dir.path().join("talk_segments"));
    assert!(FileManager::dir_exists(&output_dir));

    assert!(summary.all_succeeded());
    assert_eq!(summary.succeeded, 2);

    let calls = cutter.calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].output_path, output_dir.join("talk_segment_001.mkv"));
    assert_eq!(calls[1].output_path, output_dir.join("talk_segment_002.mkv"));
    assert_eq!((calls[1].start_ms, calls[1].end_ms), (9_500, 27_500));
    Ok(())
}

#[tokio::test]
async fn test_run_split_withDryRun_shouldNotCutOrCreateOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let subtitle = common::create_test_srt(temp_dir.path(), "talk.srt")?;
    let media = common::create_fake_media(temp_dir.path(), "talk.mp4")?;
    let controller = Controller::with_config(test_config())?;
    let cutter = MockCutter::new();

    let mut req = request(subtitle, media);
    req.assume_yes = false;
    req.dry_run = true;

    let outcome = controller
        .run_split_with_cutter(&req, &cutter, |_| panic!("dry run must not prompt"))
        .await?;

    assert!(matches!(outcome, SplitOutcome::DryRun(ref plan) if !plan.is_empty()));
    assert_eq!(cutter.call_count(), 0);
    assert!(!FileManager::dir_exists(temp_dir.path().join("talk_segments")));
    Ok(())
}

#[tokio::test]
async fn test_run_split_withDeclinedConfirmation_shouldCancel() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let subtitle = common::create_test_srt(temp_dir.path(), "talk.srt")?;
    let media = common::create_fake_media(temp_dir.path(), "talk.mp4")?;
    let controller = Controller::with_config(test_config())?;
    let cutter = MockCutter::new();

    let mut req = request(subtitle, media);
    req.assume_yes = false;

    let mut prompted_with = None;
    let outcome = controller
        .run_split_with_cutter(&req, &cutter, |plan| {
            prompted_with = Some(plan.len());
            Ok(false)
        })
        .await?;

    assert!(matches!(outcome, SplitOutcome::Cancelled(_)));
    assert!(prompted_with.is_some());
    assert_eq!(cutter.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_run_split_withAcceptedConfirmation_shouldCut() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let subtitle = common::create_test_srt(temp_dir.path(), "talk.srt")?;
    let media = common::create_fake_media(temp_dir.path(), "talk.mp4")?;
    let controller = Controller::with_config(test_config())?;
    let cutter = MockCutter::new();

    let mut req = request(subtitle, media);
    req.assume_yes = false;

    let outcome = controller.run_split_with_cutter(&req, &cutter, |_| Ok(true)).await?;

    assert!(matches!(outcome, SplitOutcome::Completed { .. }));
    assert!(cutter.call_count() > 0);
    Ok(())
}

/// One failing cut does not stop the others
#[tokio::test]
async fn test_run_split_withFailingSegment_shouldReportFailureAndContinue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let subtitle = common::create_test_ass(temp_dir.path(), "talk.ass")?;
    let media = common::create_fake_media(temp_dir.path(), "talk.mkv")?;
    let controller = Controller::with_config(test_config())?;
    let cutter = MockCutter::failing_on(&[1]);

    let outcome = controller
        .run_split_with_cutter(&request(subtitle, media), &cutter, |_| Ok(true))
        .await?;

    let SplitOutcome::Completed { summary, .. } = outcome else {
        panic!("expected a completed run");
    };
    assert!(!summary.all_succeeded());
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(cutter.call_count(), 2);
    assert!(summary.outcomes[0].result.is_err());
    Ok(())
}

#[tokio::test]
async fn test_run_split_withEmptySubtitles_shouldHaveNothingToDo() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let subtitle = common::create_test_file(temp_dir.path(), "empty.srt", "\n\n")?;
    let media = common::create_fake_media(temp_dir.path(), "talk.mp4")?;
    let controller = Controller::with_config(test_config())?;
    let cutter = MockCutter::new();

    let outcome = controller
        .run_split_with_cutter(&request(subtitle, media), &cutter, |_| Ok(true))
        .await?;

    assert!(matches!(outcome, SplitOutcome::NothingToDo));
    assert_eq!(cutter.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_run_split_withMissingMedia_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let subtitle = common::create_test_srt(temp_dir.path(), "talk.srt")?;
    let controller = Controller::with_config(test_config())?;
    let cutter = MockCutter::new();

    let result = controller
        .run_split_with_cutter(&request(subtitle, temp_dir.path().join("missing.mp4")), &cutter, |_| Ok(true))
        .await;

    let err = result.expect_err("missing media must fail");
    assert!(err.to_string().contains("Media file not found"));
    Ok(())
}

#[tokio::test]
async fn test_run_split_withUnsupportedSubtitle_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let subtitle = common::create_test_file(temp_dir.path(), "talk.vtt", "WEBVTT\n")?;
    let media = common::create_fake_media(temp_dir.path(), "talk.mp4")?;
    let controller = Controller::with_config(test_config())?;
    let cutter = MockCutter::new();

    let result = controller
        .run_split_with_cutter(&request(subtitle, media), &cutter, |_| Ok(true))
        .await;

    assert!(result.is_err());
    assert_eq!(cutter.call_count(), 0);
    Ok(())
}

#[test]
fn test_with_config_withInvalidConfig_shouldFail() {
    let config = Config {
        padding_secs: -0.5,
        ..Config::default()
    };
    assert!(Controller::with_config(config).is_err());
}
