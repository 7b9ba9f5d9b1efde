/*!
 * Speaker assignment from diarization output.
 *
 * Diarization runs outside this tool; its RTTM output is read here and each
 * subtitle line is labelled with the speaker whose turn overlaps it most.
 */

use std::path::{Path, PathBuf};
use regex::Regex;
use once_cell::sync::Lazy;
use log::debug;

use crate::errors::AlignmentError;
use crate::subtitle_processor::SubtitleCollection;
use crate::time_format::seconds_to_ms;

static SPEAKER_INDEX_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"_(\d+)$").expect("static speaker index regex")
});

/// One diarized speaker turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerTurn {
    pub start_ms: u64,
    pub end_ms: u64,
    pub label: String,
}

impl SpeakerTurn {
    /// Overlap with `[start_ms, end_ms)` in milliseconds, zero when disjoint
    pub fn overlap_ms(&self, start_ms: u64, end_ms: u64) -> u64 {
        let overlap_start = self.start_ms.max(start_ms);
        let overlap_end = self.end_ms.min(end_ms);
        overlap_end.saturating_sub(overlap_start)
    }
}

/// Counts from one assignment pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignmentReport {
    /// Lines that received a speaker label
    pub labelled: usize,
    /// Lines that already had a label and were left alone
    pub preserved: usize,
    /// Lines no diarization turn overlapped
    pub unmatched: usize,
}

/// Parses `SPEAKER` records from RTTM content; other record types are skipped.
pub fn parse_rttm(content: &str) -> Result<Vec<SpeakerTurn>, AlignmentError> {
    let mut turns = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(';') || trimmed.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields[0] != "SPEAKER" {
            continue;
        }
        if fields.len() < 8 {
            return Err(AlignmentError::InvalidRecord {
                line: idx + 1,
                message: format!("expected at least 8 fields, found {}", fields.len()),
            });
        }

        let parse_secs = |value: &str, what: &str| value.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .ok_or_else(|| AlignmentError::InvalidRecord {
                line: idx + 1,
                message: format!("invalid {}: {}", what, value),
            });

        let onset = parse_secs(fields[3], "onset")?;
        let duration = parse_secs(fields[4], "duration")?;

        turns.push(SpeakerTurn {
            start_ms: seconds_to_ms(onset),
            end_ms: seconds_to_ms(onset + duration),
            label: fields[7].to_string(),
        });
    }

    debug!("Parsed {} speaker turns", turns.len());
    Ok(turns)
}

/// Label of the turn with the greatest positive overlap; the earliest turn wins ties.
pub fn find_max_overlap_speaker(start_ms: u64, end_ms: u64, turns: &[SpeakerTurn]) -> Option<&str> {
    let mut best: Option<(&SpeakerTurn, u64)> = None;

    for turn in turns {
        let overlap = turn.overlap_ms(start_ms, end_ms);
        if overlap > best.map_or(0, |(_, o)| o) {
            best = Some((turn, overlap));
        }
    }

    best.map(|(turn, _)| turn.label.as_str())
}

/// Friendly name for a diarization label: `SPEAKER_07` becomes `Speaker 7`.
pub fn speaker_display_name(label: &str) -> String {
    SPEAKER_INDEX_REGEX.captures(label)
        .and_then(|caps| caps[1].parse::<u64>().ok())
        .map(|n| format!("Speaker {}", n))
        .unwrap_or_else(|| label.to_string())
}

/// Labels every unlabelled line in `collection` from `turns`.
///
/// Existing labels are never overwritten.
pub fn assign_speakers(collection: &mut SubtitleCollection, turns: &[SpeakerTurn]) -> AssignmentReport {
    let mut report = AssignmentReport::default();

    for entry in collection.entries.iter_mut() {
        let Some(label) = find_max_overlap_speaker(entry.start_time_ms, entry.end_time_ms, turns) else {
            report.unmatched += 1;
            continue;
        };

        if entry.speaker.is_some() {
            report.preserved += 1;
            continue;
        }

        entry.set_speaker(&speaker_display_name(label));
        report.labelled += 1;
    }

    report
}

/// `<stem>.diarized.<ext>` next to the input
pub fn default_output_path<P: AsRef<Path>>(subtitle_path: P) -> PathBuf {
    let path = subtitle_path.as_ref();
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let file_name = match path.extension() {
        Some(ext) => format!("{}.diarized.{}", stem, ext.to_string_lossy()),
        None => format!("{}.diarized", stem),
    };
    path.with_file_name(file_name)
}
