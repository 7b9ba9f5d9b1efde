/*!
 * Tests for diarization parsing and speaker assignment
 */

use std::path::PathBuf;
use subsplit::errors::AlignmentError;
use subsplit::speaker_alignment::{
    assign_speakers, default_output_path, find_max_overlap_speaker, parse_rttm, SpeakerTurn,
};
use subsplit::subtitle_processor::{SubtitleCollection, SubtitleEntry, SubtitleFormat};

const SAMPLE_RTTM: &str = "\
;; generated by a diarization pipeline
SPEAKER talk 1 0.000 4.500 <NA> <NA> SPEAKER_00 <NA> <NA>
SPKR-INFO talk 1 <NA> <NA> <NA> unknown SPEAKER_00 <NA> <NA>
SPEAKER talk 1 4.500 5.250 <NA> <NA> SPEAKER_01 <NA> <NA>

SPEAKER talk 1 9.750 10.000 <NA> <NA> SPEAKER_00 <NA> <NA>
";

fn turn(start_ms: u64, end_ms: u64, label: &str) -> SpeakerTurn {
    SpeakerTurn { start_ms, end_ms, label: label.to_string() }
}

#[test]
fn test_parse_rttm_withSpeakerRecords_shouldReadTurns() {
    let turns = parse_rttm(SAMPLE_RTTM).unwrap();

    assert_eq!(turns, vec![
        turn(0, 4_500, "SPEAKER_00"),
        turn(4_500, 9_750, "SPEAKER_01"),
        turn(9_750, 19_750, "SPEAKER_00"),
    ]);
}

#[test]
fn test_parse_rttm_withShortRecord_shouldReportLine() {
    let content = "SPEAKER talk 1 0.0 1.0\n";

    let result = parse_rttm(content);

    assert!(matches!(result, Err(AlignmentError::InvalidRecord { line: 1, .. })));
}

#[test]
fn test_parse_rttm_withNegativeDuration_shouldFail() {
    let content = "# header\nSPEAKER talk 1 1.0 -2.0 <NA> <NA> SPEAKER_00 <NA> <NA>\n";

    let result = parse_rttm(content);

    assert!(matches!(result, Err(AlignmentError::InvalidRecord { line: 2, .. })));
}

#[test]
fn test_overlap_ms_withDisjointRanges_shouldBeZero() {
    let t = turn(1_000, 2_000, "A");
    assert_eq!(t.overlap_ms(2_000, 3_000), 0);
    assert_eq!(t.overlap_ms(0, 500), 0);
    assert_eq!(t.overlap_ms(1_500, 5_000), 500);
    assert_eq!(t.overlap_ms(0, 5_000), 1_000);
}

#[test]
fn test_find_max_overlap_speaker_shouldPickLongestOverlap() {
    let turns = vec![turn(0, 2_000, "A"), turn(2_000, 10_000, "B"), turn(10_000, 11_000, "A")];

    assert_eq!(find_max_overlap_speaker(1_000, 4_000, &turns), Some("B"));
    assert_eq!(find_max_overlap_speaker(500, 2_500, &turns), Some("A"));
    assert_eq!(find_max_overlap_speaker(20_000, 21_000, &turns), None);
    assert_eq!(find_max_overlap_speaker(0, 1_000, &[]), None);
}

#[test]
fn test_assign_speakers_shouldLabelOnlyUnlabelledLines() {
    let mut collection = SubtitleCollection::new(PathBuf::from("talk.srt"), SubtitleFormat::Srt);
    collection.entries = vec![
        SubtitleEntry::new(1, 500, 3_000, "hello".to_string()),
        SubtitleEntry::new(2, 5_000, 8_000, "hi".to_string()).with_speaker("Host"),
        SubtitleEntry::new(3, 10_000, 12_000, "again".to_string()),
        SubtitleEntry::new(4, 30_000, 31_000, "late".to_string()),
    ];
    let turns = parse_rttm(SAMPLE_RTTM).unwrap();

    let report = assign_speakers(&mut collection, &turns);

    assert_eq!(report.labelled, 2);
    assert_eq!(report.preserved, 1);
    assert_eq!(report.unmatched, 1);
    assert_eq!(collection.entries[0].speaker(), Some("Speaker 0"));
    assert_eq!(collection.entries[1].speaker(), Some("Host"));
    assert_eq!(collection.entries[2].speaker(), Some("Speaker 0"));
    assert_eq!(collection.entries[3].speaker(), None);
}

#[test]
fn test_default_output_path_withoutExtension_shouldAppendSuffix() {
    assert_eq!(default_output_path("dir/talk.srt"), PathBuf::from("dir/talk.diarized.srt"));
    assert_eq!(default_output_path("dir/talk"), PathBuf::from("dir/talk.diarized"));
}
