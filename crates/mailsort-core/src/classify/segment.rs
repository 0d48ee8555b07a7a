//! Splitting quoted reply/forward chains into dated segments.
//!
//! A chain segment starts at a `From:` line whose header block also carries a
//! `Sent:` line, as Outlook-style clients write when quoting:
//!
//! ```text
//! Thanks, approved.
//!
//! From: Alice
//! Sent: 3/4/2024 10:15 AM
//! Subject: Invoice
//!
//! Please approve the attached invoice.
//! ```
//!
//! Markers are matched case-insensitively after stripping leading whitespace,
//! `>` quote prefixes and Markdown emphasis (HTML bodies converted to text
//! render the labels as `**From:**`).

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};

use super::model::ThreadSegment;

const FROM_MARKER: &str = "from:";
const SENT_MARKER: &str = "sent:";

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Splits email bodies into thread segments, newest first.
#[derive(Debug, Clone, Copy)]
pub struct ThreadSegmenter {
    now: DateTime<Utc>,
}

impl ThreadSegmenter {
    /// Create a segmenter anchored at the run's current time.
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Split `body` into segments ordered newest first.
    ///
    /// Never returns an empty list: a body without chain markers (including
    /// an empty body) is a single segment stamped with the current time.
    /// Text before the first marker is the newest reply and is stamped with
    /// the current time too. Segments whose `Sent:` date is missing or
    /// invalid get a synthetic timestamp one day before the previous
    /// segment's, starting from the current time.
    #[must_use]
    pub fn segment(&self, body: &str) -> Vec<ThreadSegment> {
        let lines = line_offsets(body);
        let starts = chain_starts(&lines);

        if starts.is_empty() {
            return vec![ThreadSegment {
                text: body.to_string(),
                timestamp: self.now,
                inferred: false,
            }];
        }

        let mut segments = Vec::with_capacity(starts.len() + 1);

        let first_offset = lines[starts[0].line].0;
        let preamble = &body[..first_offset];
        if !preamble.trim().is_empty() {
            segments.push(ThreadSegment {
                text: preamble.to_string(),
                timestamp: self.now,
                inferred: false,
            });
        }

        let mut previous = self.now;
        for (i, start) in starts.iter().enumerate() {
            let begin = lines[start.line].0;
            let end = starts
                .get(i + 1)
                .map_or(body.len(), |next| lines[next.line].0);

            let (timestamp, inferred) = match parse_sent_line(lines[start.sent_line].1) {
                Some(ts) => (ts, false),
                None => (
                    previous
                        .checked_sub_signed(TimeDelta::days(1))
                        .unwrap_or(DateTime::<Utc>::MIN_UTC),
                    true,
                ),
            };
            previous = timestamp;

            segments.push(ThreadSegment {
                text: body[begin..end].to_string(),
                timestamp,
                inferred,
            });
        }

        // Stable: exact ties keep discovery order.
        segments.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        segments
    }
}

/// A `From:` line that opens a chain segment.
struct ChainStart {
    line: usize,
    sent_line: usize,
}

/// Byte offset and text (without line terminator) of every line.
fn line_offsets(body: &str) -> Vec<(usize, &str)> {
    let mut offset = 0;
    body.split_inclusive('\n')
        .map(|line| {
            let start = offset;
            offset += line.len();
            (start, line.trim_end_matches(['\r', '\n']))
        })
        .collect()
}

/// Finds `From:` lines whose block (up to the next `From:` line) contains a
/// `Sent:` line.
fn chain_starts(lines: &[(usize, &str)]) -> Vec<ChainStart> {
    let from_lines: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, (_, text))| marker_value(text, FROM_MARKER).is_some())
        .map(|(i, _)| i)
        .collect();

    from_lines
        .iter()
        .enumerate()
        .filter_map(|(k, &line)| {
            let block_end = from_lines.get(k + 1).copied().unwrap_or(lines.len());
            let sent_line = (line + 1..block_end)
                .find(|&i| marker_value(lines[i].1, SENT_MARKER).is_some())?;
            Some(ChainStart { line, sent_line })
        })
        .collect()
}

/// Returns the text after `marker` if the line starts with it.
fn marker_value<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let rest = line.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '>' | '*' | '_'));
    let head = rest.get(..marker.len())?;
    if head.eq_ignore_ascii_case(marker) {
        Some(rest[marker.len()..].trim_start_matches(['*', '_']).trim())
    } else {
        None
    }
}

/// Parses the timestamp on a `Sent:` line.
///
/// The first `M/D/YYYY` or `YYYY-MM-DD` token wins; if neither appears, a
/// long form such as `March 4, 2024` or `4 Mar 2024` is tried. A following
/// `H:MM[:SS] [AM|PM]` refines the time of day; when absent or unreadable
/// the date is taken at midnight UTC. An invalid calendar date yields `None`.
fn parse_sent_line(line: &str) -> Option<DateTime<Utc>> {
    let value = marker_value(line, SENT_MARKER)?;

    let (date, rest) = match find_numeric_date(value) {
        Some(found) => found,
        None => find_long_date(value)?,
    };
    let date = date?;

    let time = parse_time(rest).unwrap_or(NaiveTime::MIN);
    Some(date.and_time(time).and_utc())
}

/// Finds the first numeric date token.
///
/// Returns the parsed date (`None` when the token is not a real calendar
/// date) and the text following the token.
fn find_numeric_date(value: &str) -> Option<(Option<NaiveDate>, &str)> {
    let is_date_char = |c: char| c.is_ascii_digit() || c == '/' || c == '-';

    let mut search_from = 0;
    while let Some(rel) = value[search_from..].find(|c: char| c.is_ascii_digit()) {
        let start = search_from + rel;
        let len = value[start..]
            .find(|c: char| !is_date_char(c))
            .unwrap_or(value.len() - start);
        let end = start + len;
        let token = value[start..end].trim_end_matches(['/', '-']);

        if let Some(date) = numeric_date(token) {
            return Some((date, &value[end..]));
        }
        search_from = end;
    }

    None
}

/// Matches a token against `M/D/YYYY` or `YYYY-MM-DD`.
fn numeric_date(token: &str) -> Option<Option<NaiveDate>> {
    let digits = |s: &str, min: usize, max: usize| {
        (min..=max).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
    };

    let slash: Vec<&str> = token.split('/').collect();
    if let &[m, d, y] = slash.as_slice()
        && digits(m, 1, 2)
        && digits(d, 1, 2)
        && digits(y, 4, 4)
    {
        return Some(ymd(y, m, d));
    }

    let dash: Vec<&str> = token.split('-').collect();
    if let &[y, m, d] = dash.as_slice()
        && digits(y, 4, 4)
        && digits(m, 1, 2)
        && digits(d, 1, 2)
    {
        return Some(ymd(y, m, d));
    }

    None
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// Finds `Month D, YYYY` or `D Month YYYY` among the words of `value`.
fn find_long_date(value: &str) -> Option<(Option<NaiveDate>, &str)> {
    let words: Vec<(usize, &str)> = value
        .split_whitespace()
        .map(|w| {
            let offset = w.as_ptr() as usize - value.as_ptr() as usize;
            (offset, w)
        })
        .collect();

    for window in words.windows(3) {
        let &[(_, a), (_, b), (offset, c)] = window else {
            continue;
        };
        let Some(year) = parse_year(c) else {
            continue;
        };

        let (month, day) = match (month_number(a), month_number(b)) {
            (Some(month), _) => (month, parse_day(b)),
            (None, Some(month)) => (month, parse_day(a)),
            (None, None) => continue,
        };
        let Some(day) = day else {
            continue;
        };

        let rest = &value[offset + c.len()..];
        return Some((NaiveDate::from_ymd_opt(year, month, day), rest));
    }

    None
}

fn month_number(word: &str) -> Option<u32> {
    let word = word.trim_end_matches([',', '.']).to_lowercase();
    if word.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| word.starts_with(m))
        .and_then(|i| u32::try_from(i + 1).ok())
}

fn parse_day(word: &str) -> Option<u32> {
    let word = word.trim_end_matches([',', '.']);
    let word = word
        .strip_suffix("st")
        .or_else(|| word.strip_suffix("nd"))
        .or_else(|| word.strip_suffix("rd"))
        .or_else(|| word.strip_suffix("th"))
        .unwrap_or(word);
    if word.is_empty() || word.len() > 2 {
        return None;
    }
    word.parse().ok()
}

fn parse_year(word: &str) -> Option<i32> {
    let word = word.trim_end_matches([',', '.']);
    if word.len() == 4 && word.bytes().all(|b| b.is_ascii_digit()) {
        word.parse().ok()
    } else {
        None
    }
}

/// Parses the first `H:MM[:SS]` in `text`, with an optional AM/PM suffix.
fn parse_time(text: &str) -> Option<NaiveTime> {
    let colon = text.find(':')?;
    let before = &text[..colon];
    let hour_start = before
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map_or(before.len(), |(i, _)| i);
    let hour: u32 = before[hour_start..].parse().ok()?;

    let after = &text[colon + 1..];
    let minute_str = after.get(..2)?;
    let minute: u32 = minute_str.parse().ok()?;
    let mut rest = &after[2..];

    let mut second = 0;
    if let Some(tail) = rest.strip_prefix(':')
        && let Some(sec) = tail.get(..2).and_then(|s| s.parse::<u32>().ok())
    {
        second = sec;
        rest = &tail[2..];
    }

    let suffix = rest.trim_start().to_lowercase();
    let hour = if suffix.starts_with("pm") && hour < 12 {
        hour + 12
    } else if suffix.starts_with("am") && hour == 12 {
        0
    } else {
        hour
    };

    NaiveTime::from_hms_opt(hour, minute, second)
}
