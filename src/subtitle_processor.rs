use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use regex::Regex;
use once_cell::sync::Lazy;
use log::{warn, debug};
use crate::errors::SubtitleError;

// @module: Subtitle loading, sorting and saving (SRT and ASS/SSA)

// @const: SRT timestamp regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2}:\d{2}:\d{2}[,.]\d{3})\s*-->\s*(\d{1,2}:\d{2}:\d{2}[,.]\d{3})")
        .expect("static SRT timestamp regex")
});

// @const: ASS timestamp regex (H:MM:SS.cc)
static ASS_TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+):(\d{1,2}):(\d{1,2})\.(\d{1,3})$").expect("static ASS timestamp regex")
});

// @const: Speaker prefix written into formats without a speaker field.
// Only the numbered `Speaker N` form is lifted back out; a free-form label
// such as `narrator:` stays part of the text because it cannot be told apart
// from ordinary dialogue.
static SPEAKER_PREFIX_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(Speaker \d+):[ \t]*").expect("static speaker prefix regex")
});

/// Column order written to the `[Events]` section
pub const ASS_EVENT_FORMAT: &str = "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

/// Subtitle file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    /// SubRip
    Srt,
    /// Advanced SubStation Alpha / SubStation Alpha
    Ass,
}

impl SubtitleFormat {
    /// Detect the format from a file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SubtitleError> {
        let ext = path.as_ref()
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "srt" => Ok(Self::Srt),
            "ass" | "ssa" => Ok(Self::Ass),
            other => Err(SubtitleError::UnsupportedFormat(
                if other.is_empty() { "<no extension>".to_string() } else { other.to_string() }
            )),
        }
    }
}

/// ASS-only columns carried through untouched so files can be written back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssFields {
    pub layer: String,
    pub style: String,
    pub margin_l: String,
    pub margin_r: String,
    pub margin_v: String,
    pub effect: String,
}

impl Default for AssFields {
    fn default() -> Self {
        Self {
            layer: "0".to_string(),
            style: "Default".to_string(),
            margin_l: "0".to_string(),
            margin_r: "0".to_string(),
            margin_v: "0".to_string(),
            effect: String::new(),
        }
    }
}

// @struct: Single subtitle entry
#[derive(Debug, Clone)]
pub struct SubtitleEntry {
    // @field: Sequence number
    pub seq_num: usize,

    // @field: Start time in ms
    pub start_time_ms: u64,

    // @field: End time in ms
    pub end_time_ms: u64,

    // @field: Speaker label, None when unknown
    pub speaker: Option<String>,

    // @field: Subtitle text
    pub text: String,

    // @field: ASS columns, None for SRT
    pub ass: Option<AssFields>,
}

impl SubtitleEntry {
    /// Creates a new subtitle entry without a speaker
    pub fn new(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Self {
        SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms,
            speaker: None,
            text,
            ass: None,
        }
    }

    /// Sets the speaker label; empty or whitespace-only labels mean "unknown"
    pub fn with_speaker(mut self, speaker: &str) -> Self {
        self.set_speaker(speaker);
        self
    }

    pub fn set_speaker(&mut self, speaker: &str) {
        let trimmed = speaker.trim();
        self.speaker = if trimmed.is_empty() { None } else { Some(trimmed.to_string()) };
    }

    /// Speaker label as a string slice, if any
    pub fn speaker(&self) -> Option<&str> {
        self.speaker.as_deref()
    }

    // @creates: Validated subtitle entry
    // @validates: Time range and non-empty text
    pub fn new_validated(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Result<Self, String> {
        if end_time_ms <= start_time_ms {
            return Err(format!(
                "Invalid time range: end time {} <= start time {}",
                end_time_ms, start_time_ms
            ));
        }

        let trimmed_text = text.trim();
        if trimmed_text.is_empty() {
            return Err(format!("Empty subtitle text for entry {}", seq_num));
        }

        Ok(SubtitleEntry::new(seq_num, start_time_ms, end_time_ms, trimmed_text.to_string()))
    }

    /// Parse an SRT timestamp (HH:MM:SS,mmm) to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<u64, String> {
        let parts: Vec<&str> = timestamp.trim().split(&[':', ',', '.'][..]).collect();

        if parts.len() != 4 {
            return Err(format!("Invalid timestamp format: {}", timestamp));
        }

        let parse = |s: &str, what: &str| s.parse::<u64>()
            .map_err(|_| format!("Failed to parse {} in timestamp: {}", what, timestamp));

        let hours = parse(parts[0], "hours")?;
        let minutes = parse(parts[1], "minutes")?;
        let seconds = parse(parts[2], "seconds")?;
        let millis = parse(parts[3], "milliseconds")?;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(format!("Invalid time components in timestamp: {}", timestamp));
        }

        Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }

    /// Parse an ASS timestamp (H:MM:SS.cc) to milliseconds
    pub fn parse_ass_timestamp(timestamp: &str) -> Result<u64, String> {
        let caps = ASS_TIMESTAMP_REGEX.captures(timestamp.trim())
            .ok_or_else(|| format!("Invalid ASS timestamp: {}", timestamp))?;

        let field = |i: usize| caps.get(i).map_or("0", |m| m.as_str());
        let hours: u64 = field(1).parse().map_err(|_| format!("Invalid hours: {}", timestamp))?;
        let minutes: u64 = field(2).parse().map_err(|_| format!("Invalid minutes: {}", timestamp))?;
        let seconds: u64 = field(3).parse().map_err(|_| format!("Invalid seconds: {}", timestamp))?;

        // Fraction digits are positional: ".5" is 500ms, ".05" is 50ms
        let frac = field(4);
        let frac_value: u64 = frac.parse().map_err(|_| format!("Invalid fraction: {}", timestamp))?;
        let millis = match frac.len() {
            1 => frac_value * 100,
            2 => frac_value * 10,
            _ => frac_value,
        };

        Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
    }

    /// Format milliseconds as an ASS timestamp (H:MM:SS.cc), rounding to centiseconds
    pub fn format_ass_timestamp(ms: u64) -> String {
        let cs_total = (ms + 5) / 10;
        let hours = cs_total / 360_000;
        let minutes = (cs_total % 360_000) / 6_000;
        let seconds = (cs_total % 6_000) / 100;
        let centis = cs_total % 100;

        format!("{}:{:02}:{:02}.{:02}", hours, minutes, seconds, centis)
    }

    /// Convert start time to formatted SRT timestamp
    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start_time_ms)
    }

    /// Convert end time to formatted SRT timestamp
    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end_time_ms)
    }

    /// Text as written to SRT, with the speaker folded in as a prefix
    fn srt_text(&self) -> String {
        match &self.speaker {
            Some(speaker) if !self.text.starts_with(&format!("{}:", speaker)) => {
                format!("{}: {}", speaker, self.text)
            }
            _ => self.text.clone(),
        }
    }

    fn to_ass_line(&self) -> String {
        let fields = self.ass.clone().unwrap_or_default();
        format!(
            "Dialogue: {},{},{},{},{},{},{},{},{},{}",
            fields.layer,
            Self::format_ass_timestamp(self.start_time_ms),
            Self::format_ass_timestamp(self.end_time_ms),
            fields.style,
            self.speaker.as_deref().unwrap_or(""),
            fields.margin_l,
            fields.margin_r,
            fields.margin_v,
            fields.effect,
            self.text,
        )
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.seq_num)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        writeln!(f, "{}", self.srt_text())?;
        writeln!(f)
    }
}

/// Collection of subtitle entries with metadata
#[derive(Debug)]
pub struct SubtitleCollection {
    /// Source filename
    pub source_file: PathBuf,

    /// List of subtitle entries, sorted by start time
    pub entries: Vec<SubtitleEntry>,

    /// Format the entries were read from
    pub format: SubtitleFormat,

    /// ASS lines outside the `[Events]` section, kept verbatim
    pub header: Vec<String>,
}

impl SubtitleCollection {
    /// Create an empty collection
    pub fn new(source_file: PathBuf, format: SubtitleFormat) -> Self {
        SubtitleCollection {
            source_file,
            entries: Vec::new(),
            format,
            header: Vec::new(),
        }
    }

    /// Load a subtitle file, choosing the parser by extension.
    ///
    /// Entries come back sorted by start time and renumbered from 1.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SubtitleError> {
        let path = path.as_ref();
        let format = SubtitleFormat::from_path(path)?;

        let bytes = fs::read(path)?;
        let content = String::from_utf8_lossy(&bytes);
        let content = content.trim_start_matches('\u{feff}');

        let (header, entries) = match format {
            SubtitleFormat::Srt => (Vec::new(), Self::parse_srt_string(content)?),
            SubtitleFormat::Ass => Self::parse_ass_string(content)?,
        };

        debug!("Loaded {} entries from {:?}", entries.len(), path);

        Ok(SubtitleCollection {
            source_file: path.to_path_buf(),
            entries,
            format,
            header,
        })
    }

    /// Distinct non-empty speaker labels across all entries
    pub fn speakers(&self) -> BTreeSet<String> {
        collect_speakers(&self.entries)
    }

    /// Write the collection in its own format
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SubtitleError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = match self.format {
            SubtitleFormat::Srt => self.to_srt_string(),
            SubtitleFormat::Ass => self.to_ass_string(),
        };

        fs::write(path, content)?;
        Ok(())
    }

    /// Render all entries as SRT
    pub fn to_srt_string(&self) -> String {
        self.entries.iter().map(|e| e.to_string()).collect()
    }

    /// Render the preserved header plus an `[Events]` section
    pub fn to_ass_string(&self) -> String {
        let mut out = String::new();

        if self.header.is_empty() {
            out.push_str("[Script Info]\nScriptType: v4.00+\n\n");
        } else {
            for line in &self.header {
                out.push_str(line);
                out.push('\n');
            }
            if !out.ends_with("\n\n") {
                out.push('\n');
            }
        }

        out.push_str("[Events]\n");
        out.push_str(ASS_EVENT_FORMAT);
        out.push('\n');
        for entry in &self.entries {
            out.push_str(&entry.to_ass_line());
            out.push('\n');
        }

        out
    }

    /// Parse SRT format string into subtitle entries
    pub fn parse_srt_string(content: &str) -> Result<Vec<SubtitleEntry>, SubtitleError> {
        let mut entries = Vec::new();

        // State variables for parsing
        let mut current_seq_num: Option<usize> = None;
        let mut current_times: Option<Result<(u64, u64), String>> = None;
        let mut current_text = String::new();

        let mut add_current_entry = |seq_num: usize, times: &Result<(u64, u64), String>, text: &str| {
            let (start_ms, end_ms) = match times {
                Ok(times) => *times,
                Err(e) => {
                    warn!("Skipping subtitle entry {}: {}", seq_num, e);
                    return;
                }
            };
            match SubtitleEntry::new_validated(seq_num, start_ms, end_ms, text.to_string()) {
                Ok(mut entry) => {
                    let lifted = SPEAKER_PREFIX_REGEX.captures(&entry.text)
                        .map(|caps| (caps[1].to_string(), entry.text[caps[0].len()..].to_string()));
                    if let Some((speaker, rest)) = lifted {
                        entry.text = rest;
                        entry.set_speaker(&speaker);
                    }
                    entries.push(entry);
                }
                Err(e) => warn!("Skipping invalid subtitle entry {}: {}", seq_num, e),
            }
        };

        for (idx, line) in content.lines().enumerate() {
            let line_count = idx + 1;
            let trimmed = line.trim();

            if trimmed.is_empty() {
                if let (Some(seq_num), Some(times)) = (current_seq_num, current_times.as_ref()) {
                    if !current_text.is_empty() {
                        add_current_entry(seq_num, times, &current_text);
                        current_seq_num = None;
                        current_times = None;
                        current_text.clear();
                    }
                }
                continue;
            }

            if current_seq_num.is_none() && current_text.is_empty() {
                if let Ok(num) = trimmed.parse::<usize>() {
                    current_seq_num = Some(num);
                    continue;
                }
            }

            if current_seq_num.is_some() && current_times.is_none() {
                if let Some(caps) = TIMESTAMP_REGEX.captures(trimmed) {
                    let start = SubtitleEntry::parse_timestamp(&caps[1]);
                    let end = SubtitleEntry::parse_timestamp(&caps[2]);
                    current_times = Some(start.and_then(|start| end.map(|end| (start, end)))
                        .map_err(|e| format!("line {}: {}", line_count, e)));
                    continue;
                }
            }

            if current_seq_num.is_some() && current_times.is_some() {
                if !current_text.is_empty() {
                    current_text.push('\n');
                }
                current_text.push_str(trimmed);
            } else {
                warn!("Unexpected text at line {} before sequence number or timestamp: {}", line_count, trimmed);
            }
        }

        if let (Some(seq_num), Some(times)) = (current_seq_num, current_times.as_ref()) {
            if !current_text.is_empty() {
                add_current_entry(seq_num, times, &current_text);
            }
        }

        if entries.is_empty() {
            return Err(SubtitleError::NoEntries);
        }

        sort_and_renumber(&mut entries);
        Ok(entries)
    }

    /// Parse ASS/SSA content into the preserved header and dialogue entries
    pub fn parse_ass_string(content: &str) -> Result<(Vec<String>, Vec<SubtitleEntry>), SubtitleError> {
        let mut header = Vec::new();
        let mut entries = Vec::new();
        let mut in_events = false;
        let mut columns: Vec<String> = ASS_EVENT_FORMAT["Format:".len()..]
            .split(',')
            .map(|c| c.trim().to_lowercase())
            .collect();

        for (idx, raw_line) in content.lines().enumerate() {
            let line_number = idx + 1;
            let line = raw_line.trim_end_matches('\r');
            let trimmed = line.trim();

            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                in_events = trimmed.eq_ignore_ascii_case("[events]");
                if !in_events {
                    header.push(line.to_string());
                }
                continue;
            }

            if !in_events {
                header.push(line.to_string());
                continue;
            }

            if let Some(rest) = strip_prefix_ignore_case(trimmed, "format:") {
                columns = rest.split(',').map(|c| c.trim().to_lowercase()).collect();
                if !columns.iter().any(|c| c == "text") {
                    return Err(SubtitleError::Parse {
                        line: line_number,
                        message: "Format line has no Text column".to_string(),
                    });
                }
                continue;
            }

            let Some(rest) = strip_prefix_ignore_case(trimmed, "dialogue:") else {
                // Comment: lines and anything else in [Events] carry no timing
                continue;
            };

            let values: Vec<&str> = rest.trim_start().splitn(columns.len(), ',').collect();
            if values.len() != columns.len() {
                return Err(SubtitleError::Parse {
                    line: line_number,
                    message: format!("expected {} fields, found {}", columns.len(), values.len()),
                });
            }

            let field = |name: &str| columns.iter()
                .position(|c| c == name)
                .map(|i| values[i])
                .unwrap_or("");

            let start_ms = SubtitleEntry::parse_ass_timestamp(field("start"))
                .map_err(|message| SubtitleError::Parse { line: line_number, message })?;
            let end_ms = SubtitleEntry::parse_ass_timestamp(field("end"))
                .map_err(|message| SubtitleError::Parse { line: line_number, message })?;

            let seq_num = entries.len() + 1;
            match SubtitleEntry::new_validated(seq_num, start_ms, end_ms, field("text").to_string()) {
                Ok(mut entry) => {
                    let name = if columns.iter().any(|c| c == "name") { field("name") } else { field("actor") };
                    entry.set_speaker(name);
                    let layer = if columns.iter().any(|c| c == "layer") { field("layer") } else { "0" };
                    entry.ass = Some(AssFields {
                        layer: layer.trim().to_string(),
                        style: field("style").trim().to_string(),
                        margin_l: field("marginl").trim().to_string(),
                        margin_r: field("marginr").trim().to_string(),
                        margin_v: field("marginv").trim().to_string(),
                        effect: field("effect").trim().to_string(),
                    });
                    entries.push(entry);
                }
                Err(e) => warn!("Skipping dialogue at line {}: {}", line_number, e),
            }
        }

        if entries.is_empty() {
            return Err(SubtitleError::NoEntries);
        }

        // Drop trailing blank lines so the writer controls section spacing
        while header.last().is_some_and(|l| l.trim().is_empty()) {
            header.pop();
        }

        sort_and_renumber(&mut entries);
        Ok((header, entries))
    }
}

impl fmt::Display for SubtitleCollection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Subtitle Collection")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Format: {:?}", self.format)?;
        writeln!(f, "Entries: {}", self.entries.len())?;
        Ok(())
    }
}

/// Distinct non-empty speaker labels, sorted
pub fn collect_speakers(entries: &[SubtitleEntry]) -> BTreeSet<String> {
    entries.iter()
        .filter_map(|e| e.speaker())
        .map(str::to_string)
        .collect()
}

/// Stable sort by start time, then renumber 1..N
pub fn sort_and_renumber(entries: &mut [SubtitleEntry]) {
    entries.sort_by_key(|entry| entry.start_time_ms);

    let overlap_count = entries.windows(2)
        .filter(|w| w[0].end_time_ms > w[1].start_time_ms)
        .count();
    if overlap_count > 0 {
        debug!("Found {} overlapping subtitle entries", overlap_count);
    }

    for (i, entry) in entries.iter_mut().enumerate() {
        entry.seq_num = i + 1;
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len() && s.is_char_boundary(prefix.len()) && s[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}
