//! iCalendar feed parsing.
//!
//! Booking channels export occupancy as a flat list of `VEVENT` entries.
//! Only day-level occupancy matters here, so time-of-day and timezone
//! information is dropped and each entry becomes an end-exclusive
//! [`DateRange`] tagged with the channel that produced it.
//!
//! Parsing is lenient: a malformed entry is skipped without affecting its
//! neighbours, and [`parse`] never fails. [`parse_feed`] adds an envelope
//! check for the fetch path so that an HTML error page is reported as such
//! instead of silently yielding zero ranges.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use staysync_core::DateRange;
use tracing::{debug, trace};

use crate::channel::{DEFAULT_CHANNEL_LABEL, channel_for_uid};
use crate::error::{FeedError, FeedResult};

/// Longest stay accepted from a feed entry, in nights.
///
/// Channels export blocks a year or so ahead; anything far longer is a broken
/// export and would otherwise expand into millions of blocked days.
pub const DEFAULT_MAX_ENTRY_NIGHTS: u32 = 731;

/// The result of parsing one feed body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFeed {
    /// Ranges in document order.
    pub ranges: Vec<DateRange>,
    /// Entries dropped for missing, unparsable or out-of-bounds dates.
    pub skipped: usize,
    /// Entries dropped for `STATUS:CANCELLED`.
    pub cancelled: usize,
}

impl ParsedFeed {
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Parses feed text into external ranges labelled "External Calendar"
/// unless the entry `UID` names a known channel.
pub fn parse(text: &str) -> Vec<DateRange> {
    parse_with_label(text, DEFAULT_CHANNEL_LABEL).ranges
}

/// Parses feed text, labelling entries from unknown channels with
/// `default_label`.
pub fn parse_with_label(text: &str, default_label: &str) -> ParsedFeed {
    parse_bounded(text, default_label, DEFAULT_MAX_ENTRY_NIGHTS)
}

/// Like [`parse_with_label`], skipping entries longer than `max_nights`.
pub fn parse_bounded(text: &str, default_label: &str, max_nights: u32) -> ParsedFeed {
    let mut feed = ParsedFeed::default();
    let mut draft: Option<EntryDraft> = None;
    // Depth of components nested inside the current VEVENT (VALARM etc).
    let mut nested = 0usize;

    for line in unfold_lines(text) {
        let Some(content) = ContentLine::split(&line) else {
            continue;
        };

        let Some(entry) = draft.as_mut() else {
            if content.is("BEGIN") && content.value.eq_ignore_ascii_case("VEVENT") {
                draft = Some(EntryDraft::default());
                nested = 0;
            }
            continue;
        };

        let mut finished = false;
        if content.is("BEGIN") {
            nested += 1;
        } else if content.is("END") {
            if nested > 0 {
                nested -= 1;
            } else {
                finished = content.value.eq_ignore_ascii_case("VEVENT");
            }
        } else if nested == 0 {
            entry.absorb(&content);
        }

        if finished && let Some(entry) = draft.take() {
            entry.finish(default_label, max_nights, &mut feed);
        }
    }

    if draft.is_some() {
        debug!("Feed ended inside an unterminated VEVENT, entry dropped");
        feed.skipped += 1;
    }

    trace!(
        ranges = feed.ranges.len(),
        skipped = feed.skipped,
        cancelled = feed.cancelled,
        "Parsed feed"
    );
    feed
}

/// Parses a fetched feed body, rejecting bodies that are not iCalendar
/// documents.
pub fn parse_feed(text: &str, default_label: &str, max_nights: u32) -> FeedResult<ParsedFeed> {
    let has_envelope = unfold_lines(text).iter().any(|line| {
        ContentLine::split(line)
            .is_some_and(|c| c.is("BEGIN") && c.value.eq_ignore_ascii_case("VCALENDAR"))
    });

    if !has_envelope {
        let preview: String = text.trim_start().chars().take(60).collect();
        debug!(preview = %preview, "Feed body has no VCALENDAR envelope");
        return Err(FeedError::invalid_response(
            "response is not an iCalendar document",
        )
        .with_channel(default_label));
    }

    Ok(parse_bounded(text, default_label, max_nights))
}

/// Parses an iCalendar `DATE` or `DATE-TIME` value to its calendar day.
///
/// Accepts `20250601`, `20250601T140000`, `20250601T140000Z` and the
/// minute-precision form. Any timezone is ignored.
pub fn parse_ical_date(value: &str) -> Option<NaiveDate> {
    parse_ical_value(value).map(|dt| dt.date())
}

/// Like [`parse_ical_date`], but a date-time that ends partway through a
/// day still occupies that day, so it rounds up to the next midnight.
pub fn parse_ical_end_date(value: &str) -> Option<NaiveDate> {
    let dt = parse_ical_value(value)?;
    if dt.time() == NaiveTime::MIN {
        Some(dt.date())
    } else {
        dt.date().succ_opt()
    }
}

fn parse_ical_value(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    let value = value.strip_suffix(['Z', 'z']).unwrap_or(value);

    if !value.contains(['T', 't']) {
        return NaiveDate::parse_from_str(value, "%Y%m%d")
            .ok()
            .map(|d| d.and_time(NaiveTime::MIN));
    }

    NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M"))
        .ok()
}

/// Joins RFC 5545 folded lines: a line starting with a space or tab
/// continues the previous one.
fn unfold_lines(text: &str) -> Vec<String> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines: Vec<String> = Vec::new();

    for raw in text.split('\n') {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        if let Some(rest) = raw.strip_prefix([' ', '\t']) {
            if let Some(last) = lines.last_mut() {
                last.push_str(rest);
                continue;
            }
        }
        if !raw.trim().is_empty() {
            lines.push(raw.to_string());
        }
    }

    lines
}

/// One `NAME;PARAMS:VALUE` line.
#[derive(Debug)]
struct ContentLine<'a> {
    name: &'a str,
    value: &'a str,
}

impl<'a> ContentLine<'a> {
    /// Splits on the first colon outside a quoted parameter value, so
    /// `DTSTART;TZID="America/New_York":20250601T150000` keeps its value.
    fn split(line: &'a str) -> Option<Self> {
        let mut in_quotes = false;
        let colon = line.char_indices().find_map(|(i, c)| match c {
            '"' => {
                in_quotes = !in_quotes;
                None
            }
            ':' if !in_quotes => Some(i),
            _ => None,
        })?;

        let head = &line[..colon];
        let name = head.split(';').next().unwrap_or(head).trim();
        if name.is_empty() {
            return None;
        }

        Some(Self {
            name,
            value: line[colon + 1..].trim(),
        })
    }

    fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

#[derive(Debug, Default)]
struct EntryDraft {
    uid: Option<String>,
    start: Option<String>,
    end: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    cancelled: bool,
}

impl EntryDraft {
    fn absorb(&mut self, line: &ContentLine<'_>) {
        let value = line.value.to_string();
        match line.name.to_ascii_uppercase().as_str() {
            "UID" => self.uid = Some(value),
            "DTSTART" => self.start = Some(value),
            "DTEND" => self.end = Some(value),
            "SUMMARY" => self.summary = Some(unescape_text(&value)),
            "DESCRIPTION" => self.description = Some(unescape_text(&value)),
            "STATUS" => self.cancelled = value.eq_ignore_ascii_case("CANCELLED"),
            _ => {}
        }
    }

    fn finish(self, default_label: &str, max_nights: u32, feed: &mut ParsedFeed) {
        if self.cancelled {
            trace!(uid = ?self.uid, "Skipping cancelled entry");
            feed.cancelled += 1;
            return;
        }

        let start = self.start.as_deref().and_then(parse_ical_date);
        let end = self.end.as_deref().and_then(parse_ical_end_date);
        let (Some(start), Some(end)) = (start, end) else {
            debug!(
                uid = ?self.uid,
                start = ?self.start,
                end = ?self.end,
                "Skipping entry with missing or unparsable dates"
            );
            feed.skipped += 1;
            return;
        };

        let nights = (end - start).num_days();
        if nights > i64::from(max_nights) {
            debug!(
                uid = ?self.uid,
                %start,
                %end,
                nights,
                max_nights,
                "Skipping entry spanning too many nights"
            );
            feed.skipped += 1;
            return;
        }

        let label = self
            .uid
            .as_deref()
            .and_then(channel_for_uid)
            .unwrap_or(default_label);

        let Some(mut range) = DateRange::external(start, end, label) else {
            debug!(uid = ?self.uid, %start, %end, "Skipping entry with empty or inverted span");
            feed.skipped += 1;
            return;
        };

        if let Some(summary) = self.summary {
            range = range.with_summary(summary);
        }
        if let Some(description) = self.description {
            range = range.with_description(description);
        }
        feed.ranges.push(range);
    }
}

/// Reverses TEXT value escaping (`\n`, `\,`, `\;`, `\\`).
fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use staysync_core::RangeSource;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn calendar(body: &str) -> String {
        format!("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Test//EN\r\n{body}END:VCALENDAR\r\n")
    }

    fn entry(uid: &str, start: &str, end: &str, summary: &str) -> String {
        format!(
            "BEGIN:VEVENT\r\nUID:{uid}\r\nDTSTART;VALUE=DATE:{start}\r\nDTEND;VALUE=DATE:{end}\r\nSUMMARY:{summary}\r\nEND:VEVENT\r\n"
        )
    }

    #[test]
    fn parses_all_day_entries() {
        let ics = calendar(&entry("a1@airbnb.com", "20250601", "20250603", "Reserved"));
        let ranges = parse(&ics);

        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].start(), date(2025, 6, 1));
        assert_eq!(ranges[0].end(), date(2025, 6, 3));
        assert_eq!(ranges[0].summary(), Some("Reserved"));
        assert_eq!(ranges[0].source(), &RangeSource::external("Airbnb"));
    }

    #[test]
    fn well_formed_and_malformed_entries() {
        let mut body = String::new();
        body.push_str(&entry("1@vrbo.com", "20250701", "20250705", "Blocked"));
        body.push_str(&entry("2@vrbo.com", "2025-07-10", "20250712", "Bad start"));
        body.push_str("BEGIN:VEVENT\r\nUID:3\r\nDTSTART:20250801\r\nEND:VEVENT\r\n");
        body.push_str(&entry("4@vrbo.com", "20250810", "20250810", "Empty"));
        body.push_str(&entry("5@vrbo.com", "20250820", "20250815", "Inverted"));
        body.push_str(&entry("6@booking.com", "20250901", "20250903", "Closed"));

        let feed = parse_with_label(&calendar(&body), "Fallback");
        assert_eq!(feed.len(), 2);
        assert_eq!(feed.skipped, 4);
        assert_eq!(feed.ranges[1].source().label(), Some("Booking.com"));
    }

    #[test]
    fn garbage_yields_nothing() {
        assert!(parse("").is_empty());
        assert!(parse("<html><body>502 Bad Gateway</body></html>").is_empty());
        assert!(parse("BEGIN:VEVENT\nDTSTART:\u{0}\u{1}").is_empty());
        assert!(parse(":::;;;\n\t\n ").is_empty());
    }

    #[test]
    fn date_time_values_drop_time_and_timezone() {
        let body = "BEGIN:VEVENT\r\n\
                    UID:x@example.com\r\n\
                    DTSTART;TZID=\"Europe/Paris\":20250601T150000\r\n\
                    DTEND:20250603T000000Z\r\n\
                    END:VEVENT\r\n";
        let ranges = parse(&calendar(body));
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].start(), date(2025, 6, 1));
        assert_eq!(ranges[0].end(), date(2025, 6, 3));
        assert_eq!(ranges[0].source().label(), Some(DEFAULT_CHANNEL_LABEL));
    }

    #[test]
    fn end_partway_through_a_day_occupies_it() {
        assert_eq!(parse_ical_end_date("20250603T110000"), Some(date(2025, 6, 4)));
        assert_eq!(parse_ical_end_date("20250603"), Some(date(2025, 6, 3)));
        assert_eq!(parse_ical_date("20250603T1100"), Some(date(2025, 6, 3)));
        assert_eq!(parse_ical_date("not-a-date"), None);
    }

    #[test]
    fn cancelled_entries_are_skipped() {
        let body = "BEGIN:VEVENT\r\nUID:c@airbnb.com\r\nSTATUS:CANCELLED\r\n\
                    DTSTART;VALUE=DATE:20250601\r\nDTEND;VALUE=DATE:20250602\r\nEND:VEVENT\r\n";
        let feed = parse_with_label(&calendar(body), DEFAULT_CHANNEL_LABEL);
        assert!(feed.is_empty());
        assert_eq!(feed.cancelled, 1);
        assert_eq!(feed.skipped, 0);
    }

    #[test]
    fn folded_lines_and_escapes() {
        let body = "BEGIN:VEVENT\r\n\
                    UID:f@example.com\r\n\
                    DTSTART;VALUE=DATE:2025\r\n 0601\r\n\
                    DTEND;VALUE=DATE:20250602\r\n\
                    SUMMARY:Owner stay\\, family\r\n\
                    DESCRIPTION:Line one\\nLine\r\n\ttwo\r\n\
                    END:VEVENT\r\n";
        let ranges = parse(&calendar(body));
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].start(), date(2025, 6, 1));
        assert_eq!(ranges[0].summary(), Some("Owner stay, family"));
        assert_eq!(ranges[0].description(), Some("Line one\nLinetwo"));
    }

    #[test]
    fn nested_alarm_does_not_end_entry() {
        let body = "BEGIN:VEVENT\r\n\
                    UID:n@example.com\r\n\
                    DTSTART;VALUE=DATE:20250601\r\n\
                    BEGIN:VALARM\r\n\
                    DESCRIPTION:Reminder\r\n\
                    END:VALARM\r\n\
                    DTEND;VALUE=DATE:20250604\r\n\
                    END:VEVENT\r\n";
        let ranges = parse(&calendar(body));
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].end(), date(2025, 6, 4));
        assert_eq!(ranges[0].description(), None);
    }

    #[test]
    fn unterminated_entry_counts_as_skipped() {
        let text = "BEGIN:VCALENDAR\nBEGIN:VEVENT\nDTSTART:20250601\nDTEND:20250602\n";
        let feed = parse_with_label(text, DEFAULT_CHANNEL_LABEL);
        assert!(feed.is_empty());
        assert_eq!(feed.skipped, 1);
    }

    #[test]
    fn parse_feed_requires_envelope() {
        let err = parse_feed("<!DOCTYPE html><p>Sign in</p>", "Airbnb", DEFAULT_MAX_ENTRY_NIGHTS).unwrap_err();
        assert_eq!(err.code(), crate::FeedErrorCode::InvalidResponse);
        assert_eq!(err.channel(), Some("Airbnb"));

        let feed = parse_feed(&calendar(""), "Airbnb", DEFAULT_MAX_ENTRY_NIGHTS).unwrap();
        assert!(feed.is_empty());
    }

    #[test]
    fn multi_century_entries_are_skipped() {
        let mut body = String::new();
        for i in 0..20 {
            body.push_str(&entry(&format!("{i}@airbnb.com"), "10000101", "99991231", "Forever"));
        }
        body.push_str(&entry("ok@airbnb.com", "20250601", "20250603", "Reserved"));

        let feed = parse_with_label(&calendar(&body), DEFAULT_CHANNEL_LABEL);
        assert_eq!(feed.len(), 1);
        assert_eq!(feed.skipped, 20);
        assert_eq!(feed.ranges[0].start(), date(2025, 6, 1));
    }

    #[test]
    fn night_limit_is_inclusive() {
        let body = format!(
            "{}{}",
            entry("a@vrbo.com", "20250101", "20250111", "Ten nights"),
            entry("b@vrbo.com", "20250101", "20250112", "Eleven nights"),
        );
        let feed = parse_bounded(&calendar(&body), "Fallback", 10);
        assert_eq!(feed.len(), 1);
        assert_eq!(feed.ranges[0].summary(), Some("Ten nights"));
        assert_eq!(feed.skipped, 1);

        let feed = parse_feed(&calendar(&body), "Fallback", 10).unwrap();
        assert_eq!(feed.len(), 1);
    }

    #[test]
    fn parsing_is_deterministic() {
        let ics = calendar(&format!(
            "{}{}",
            entry("1@airbnb.com", "20250601", "20250603", "A"),
            entry("2@airbnb.com", "20250610", "20250612", "B"),
        ));
        assert_eq!(parse(&ics), parse(&ics));
    }
}
