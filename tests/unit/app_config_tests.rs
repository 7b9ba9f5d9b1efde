/*!
 * Tests for app configuration functionality
 */

use anyhow::Result;
use subsplit::app_config::{Config, LogLevel, DEFAULT_MIN_DURATION_SECS, DEFAULT_PADDING_SECS, MAX_DURATION_SECS};
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_shouldHaveExpectedValues() {
    let config = Config::default();

    assert_eq!(config.min_duration_secs, DEFAULT_MIN_DURATION_SECS);
    assert_eq!(config.padding_secs, DEFAULT_PADDING_SECS);
    assert_eq!(config.min_duration_secs, 60.0);
    assert_eq!(config.padding_secs, 0.5);
    assert_eq!(config.cutting.ffmpeg_path, None);
    assert_eq!(config.cutting.ffmpeg_args, vec!["-map", "0", "-c", "copy", "-y"]);
    assert_eq!(config.cutting.concurrent_cuts, 1);
    assert_eq!(config.cutting.cut_timeout_secs, 600);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_withNegativeDurations_shouldFail() {
    let mut config = Config::default();
    config.min_duration_secs = -1.0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.padding_secs = f64::NAN;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withZeroValues_shouldAllowDurationsButNotJobs() {
    let mut config = Config::default();
    config.min_duration_secs = 0.0;
    config.padding_secs = 0.0;
    assert!(config.validate().is_ok());

    config.cutting.concurrent_cuts = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.cutting.cut_timeout_secs = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withOversizedDurations_shouldFail() {
    let mut config = Config::default();
    config.padding_secs = 1e16;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.min_duration_secs = 1e16;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.min_duration_secs = MAX_DURATION_SECS;
    config.padding_secs = MAX_DURATION_SECS;
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_withBlankFfmpegPath_shouldFail() {
    let mut config = Config::default();
    config.cutting.ffmpeg_path = Some("  ".to_string());
    assert!(config.validate().is_err());
}

/// Missing keys fall back to their defaults
#[test]
fn test_from_file_withPartialJson_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{ "min_duration_secs": 30, "cutting": { "concurrent_cuts": 4 }, "log_level": "debug" }"#,
    )?;

    let config = Config::from_file(&path)?;

    assert_eq!(config.min_duration_secs, 30.0);
    assert_eq!(config.padding_secs, 0.5);
    assert_eq!(config.cutting.concurrent_cuts, 4);
    assert_eq!(config.cutting.cut_timeout_secs, 600);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.log_level.to_level_filter(), log::LevelFilter::Debug);
    Ok(())
}

#[test]
fn test_from_file_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;

    assert!(Config::from_file(&path).is_err());
    assert!(Config::from_file(temp_dir.path().join("missing.json")).is_err());
    Ok(())
}

/// Test saving and reloading a configuration
#[test]
fn test_save_and_from_file_shouldRoundTrip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let mut config = Config::default();
    config.min_duration_secs = 90.0;
    config.cutting.ffmpeg_path = Some("/opt/ffmpeg/bin/ffmpeg".to_string());
    config.log_level = LogLevel::Trace;
    config.save(&path)?;

    let loaded = Config::from_file(&path)?;
    assert_eq!(loaded, config);
    Ok(())
}
