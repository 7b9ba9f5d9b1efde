// @module: Plan rendering

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

use crate::segment_planner::Segment;
use crate::time_format::{format_ms, ms_to_seconds};

/// One display row of the plan table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRow {
    pub index: String,
    pub start: String,
    pub end: String,
    pub duration: String,
    pub lines: String,
    pub line_count: String,
}

impl PlanRow {
    pub fn from_segment(index: usize, segment: &Segment) -> Self {
        PlanRow {
            index: index.to_string(),
            start: format_ms(segment.start_time()),
            end: format_ms(segment.end_time()),
            duration: format!("{:.2}", ms_to_seconds(segment.duration_ms())),
            lines: format!("{}-{}", segment.start_line_number, segment.end_line_number),
            line_count: segment.line_count().to_string(),
        }
    }
}

/// Rows for every segment, numbered from 1
pub fn plan_rows(segments: &[Segment]) -> Vec<PlanRow> {
    segments
        .iter()
        .enumerate()
        .map(|(i, segment)| PlanRow::from_segment(i + 1, segment))
        .collect()
}

/// Renders the segmentation plan as a table
pub fn render_plan_table(segments: &[Segment]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Segment", "Start", "End", "Duration (s)", "Lines", "Line count"]);

    for row in plan_rows(segments) {
        table.add_row(vec![
            Cell::new(row.index).set_alignment(CellAlignment::Right),
            Cell::new(row.start).set_alignment(CellAlignment::Center),
            Cell::new(row.end).set_alignment(CellAlignment::Center),
            Cell::new(row.duration).set_alignment(CellAlignment::Right),
            Cell::new(row.lines).set_alignment(CellAlignment::Center),
            Cell::new(row.line_count).set_alignment(CellAlignment::Right),
        ]);
    }

    table.to_string()
}
