/*!
 * Segment planning.
 *
 * Turns a start-sorted sequence of subtitle entries into contiguous clip
 * windows. A window is only closed once it has reached the minimum duration;
 * when more than one speaker is present, a window that has reached the
 * minimum keeps absorbing lines until the speaker changes. Boundaries get
 * silence padding, split evenly when the gap between lines is too narrow to
 * hold a full padding on both sides. A trailing window shorter than the
 * minimum is folded into its predecessor.
 *
 * All arithmetic is done in whole milliseconds.
 */

use std::collections::BTreeSet;
use log::debug;

use crate::subtitle_processor::{SubtitleEntry, collect_speakers};
use crate::time_format::seconds_to_ms;

/// A contiguous time window destined to become one output clip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    start_time: u64,
    end_time: u64,
    /// First subtitle line in this window (1-based, inclusive)
    pub start_line_number: usize,
    /// Last subtitle line in this window (1-based, inclusive)
    pub end_line_number: usize,
    /// Most recent non-empty speaker label absorbed into this window
    pub last_speaker: Option<String>,
}

impl Segment {
    /// Creates a segment covering a single line
    pub fn new(start_time: i64, end_time: i64, line_number: usize, speaker: Option<&str>) -> Self {
        let mut segment = Segment {
            start_time: 0,
            end_time: 0,
            start_line_number: line_number,
            end_line_number: line_number,
            last_speaker: speaker.map(str::to_string),
        };
        segment.set_start_time(start_time);
        segment.set_end_time(end_time);
        segment
    }

    /// Start time in milliseconds
    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    /// End time in milliseconds
    pub fn end_time(&self) -> u64 {
        self.end_time
    }

    /// Sets the start, clamping negative values to zero
    pub fn set_start_time(&mut self, ms: i64) {
        self.start_time = ms.max(0) as u64;
        if self.end_time < self.start_time {
            self.end_time = self.start_time;
        }
    }

    /// Sets the end, clamping so it never precedes the start
    pub fn set_end_time(&mut self, ms: i64) {
        self.end_time = (ms.max(0) as u64).max(self.start_time);
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_time - self.start_time
    }

    pub fn line_count(&self) -> usize {
        self.end_line_number - self.start_line_number + 1
    }

    // @mutates: Extends the window to include one more line
    fn absorb(&mut self, line_number: usize, event: &SubtitleEntry) {
        self.end_time = self.end_time.max(event.end_time_ms);
        self.end_line_number = line_number;
        if let Some(speaker) = event.speaker() {
            self.last_speaker = Some(speaker.to_string());
        }
    }

    // @mutates: Takes over the end of an undersized trailing window
    fn merge_tail(&mut self, tail: Segment) {
        self.end_time = self.end_time.max(tail.end_time);
        self.end_line_number = tail.end_line_number;
        if tail.last_speaker.is_some() {
            self.last_speaker = tail.last_speaker;
        }
    }
}

/// How a gap between two lines is shared out as padding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryPadding {
    /// Added after the end of the line that closes a window
    pub closing: i64,
    /// Taken before the start of the line that opens the next window
    pub opening: i64,
}

/// Classifies the gap between consecutive lines.
///
/// Touching or overlapping lines get no padding. A gap narrower than two
/// paddings is split in half, the odd millisecond going to the closing side
/// so both windows meet at one point. Wider gaps give each side a full
/// padding.
pub fn split_gap(gap_ms: i64, padding_ms: i64) -> BoundaryPadding {
    if gap_ms <= 0 {
        BoundaryPadding { closing: 0, opening: 0 }
    } else if gap_ms < padding_ms.saturating_mul(2) {
        let opening = gap_ms / 2;
        BoundaryPadding { closing: gap_ms - opening, opening }
    } else {
        BoundaryPadding { closing: padding_ms, opening: padding_ms }
    }
}

/// Result of a planning pass
#[derive(Debug, Clone, Default)]
pub struct SegmentPlan {
    /// Ordered, finalized segments
    pub segments: Vec<Segment>,
    /// Distinct non-empty speaker labels in the input
    pub speakers: BTreeSet<String>,
    /// Whether speaker continuity was enforced
    pub multi_speaker: bool,
    /// Whether an undersized trailing window was folded into its predecessor
    pub tail_merged: bool,
}

impl SegmentPlan {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Plans clip windows from subtitle entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentPlanner {
    min_duration_ms: u64,
    padding_ms: u64,
}

impl SegmentPlanner {
    /// Creates a planner from durations in seconds; negative values clamp to zero
    pub fn new(min_duration_secs: f64, padding_secs: f64) -> Self {
        Self::from_millis(seconds_to_ms(min_duration_secs), seconds_to_ms(padding_secs))
    }

    pub fn from_millis(min_duration_ms: u64, padding_ms: u64) -> Self {
        SegmentPlanner { min_duration_ms, padding_ms }
    }

    pub fn min_duration_ms(&self) -> u64 {
        self.min_duration_ms
    }

    pub fn padding_ms(&self) -> u64 {
        self.padding_ms
    }

    /// Plans segments over `events`, which must be sorted by start time.
    ///
    /// Line numbers are positions in `events`, starting at 1. An empty input
    /// yields an empty plan.
    pub fn plan(&self, events: &[SubtitleEntry]) -> SegmentPlan {
        let speakers = collect_speakers(events);
        let multi_speaker = speakers.len() > 1;

        let accumulator = events
            .iter()
            .enumerate()
            .fold(Accumulator::new(*self, multi_speaker), |acc, (idx, event)| {
                acc.step(idx + 1, event)
            });

        let (segments, tail_merged) = accumulator.finish();

        SegmentPlan {
            segments,
            speakers,
            multi_speaker,
            tail_merged,
        }
    }
}

/// Plans segments with durations given in seconds
pub fn plan(events: &[SubtitleEntry], min_duration_secs: f64, padding_secs: f64) -> Vec<Segment> {
    SegmentPlanner::new(min_duration_secs, padding_secs).plan(events).segments
}

// Saturates instead of wrapping for values past i64::MAX
fn to_signed(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}

enum PlannerState {
    NoOpenSegment,
    OpenSegment(Segment),
}

// @struct: Fold state threaded through one planning pass
struct Accumulator {
    planner: SegmentPlanner,
    multi_speaker: bool,
    state: PlannerState,
    previous_event_end: u64,
    closed: Vec<Segment>,
}

impl Accumulator {
    fn new(planner: SegmentPlanner, multi_speaker: bool) -> Self {
        Accumulator {
            planner,
            multi_speaker,
            state: PlannerState::NoOpenSegment,
            previous_event_end: 0,
            closed: Vec::new(),
        }
    }

    fn step(mut self, line_number: usize, event: &SubtitleEntry) -> Self {
        let padding_ms = to_signed(self.planner.padding_ms);
        let min_duration_ms = self.planner.min_duration_ms;
        let previous_end = to_signed(self.previous_event_end);
        let event_start = to_signed(event.start_time_ms);
        let event_end = to_signed(event.end_time_ms);
        let pads = split_gap(event_start - previous_end, padding_ms);

        self.state = match self.state {
            PlannerState::NoOpenSegment => PlannerState::OpenSegment(Segment::new(
                event_start - padding_ms,
                event_end,
                line_number,
                event.speaker(),
            )),
            PlannerState::OpenSegment(mut open) => {
                open.set_end_time(previous_end.saturating_add(pads.closing));

                if open.duration_ms() < min_duration_ms {
                    open.absorb(line_number, event);
                    PlannerState::OpenSegment(open)
                } else if self.multi_speaker && event.speaker() == open.last_speaker.as_deref() {
                    debug!(
                        "Line {} continues speaker {:?}, extending segment past minimum",
                        line_number, open.last_speaker
                    );
                    open.absorb(line_number, event);
                    PlannerState::OpenSegment(open)
                } else {
                    debug!(
                        "Splitting before line {}: segment lines {}-{} ({} ms)",
                        line_number, open.start_line_number, open.end_line_number, open.duration_ms()
                    );
                    self.closed.push(open);
                    PlannerState::OpenSegment(Segment::new(
                        event_start - pads.opening,
                        event_end,
                        line_number,
                        event.speaker(),
                    ))
                }
            }
        };

        // Running maximum so a line nested inside its predecessor never pulls a boundary back
        self.previous_event_end = self.previous_event_end.max(event.end_time_ms);
        self
    }

    fn finish(self) -> (Vec<Segment>, bool) {
        let mut closed = self.closed;

        let PlannerState::OpenSegment(mut open) = self.state else {
            return (closed, false);
        };

        open.set_end_time(to_signed(self.previous_event_end.saturating_add(self.planner.padding_ms)));

        if open.duration_ms() < self.planner.min_duration_ms {
            if let Some(last) = closed.last_mut() {
                debug!(
                    "Trailing segment lines {}-{} is {} ms, merging into previous segment",
                    open.start_line_number, open.end_line_number, open.duration_ms()
                );
                last.merge_tail(open);
                return (closed, true);
            }
        }

        closed.push(open);
        (closed, false)
    }
}
