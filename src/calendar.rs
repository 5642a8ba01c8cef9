//! Calendar events from an iCalendar feed.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use log::{debug, warn};
use rrule::RRuleSet;

use crate::config::Config;
use crate::errors::Error;
use crate::runtime;

type Result<T> = std::result::Result<T, Error>;

/// Upper bound on the occurrences one repeating event yields per window.
const MAX_OCCURRENCES: u16 = 1000;

/// A titled interval from the calendar.
///
/// Either bound is `None` when the source record does not carry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub title: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl CalendarEvent {
    pub fn new(title: &str, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        CalendarEvent {
            title: title.to_string(),
            start,
            end,
        }
    }

    /// Check if the event touches `[from, until]`.
    ///
    /// Events with a missing bound always do, so that the caller gets to see
    /// and report them.
    pub fn overlaps(&self, from: DateTime<Utc>, until: DateTime<Utc>) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= until && end >= from,
            _ => true,
        }
    }
}

/// Anything that can list the events around a point in time.
pub trait CalendarSource: Send + Sync {
    /// Events relevant from `anchor` on, in calendar order.
    fn fetch_events(
        &self,
        anchor: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<CalendarEvent>>> + Send;
}

/// An iCalendar feed downloaded over HTTP(S).
#[derive(Debug, Clone)]
pub struct IcsCalendar {
    url: String,
    client: reqwest::Client,
    credentials: Option<(String, Option<String>)>,
    name: Option<String>,
    lookahead: TimeDelta,
    time_zone: Tz,
    timeout: Duration,
}

impl IcsCalendar {
    pub fn new(url: &str, time_zone: Tz, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http("build", e))?;
        Ok(IcsCalendar {
            url: url.to_string(),
            client,
            credentials: None,
            name: None,
            lookahead: TimeDelta::days(1),
            time_zone,
            timeout,
        })
    }

    /// Build the configured calendar.
    pub fn from_config(config: &Config) -> Result<Self> {
        let calendar = &config.calendar;
        if calendar.url.trim().is_empty() {
            return Err(Error::invalid_config("calendar.url", "must not be empty"));
        }

        let mut source = IcsCalendar::new(&calendar.url, config.time_zone()?, config.request_timeout())?
            .with_lookahead(config.lookahead());
        if let Some(username) = &calendar.username {
            source = source.with_basic_auth(username, calendar.password.as_deref());
        }
        if let Some(name) = &calendar.name {
            source = source.with_name(name);
        }
        Ok(source)
    }

    pub fn with_basic_auth(mut self, username: &str, password: Option<&str>) -> Self {
        self.credentials = Some((username.to_string(), password.map(String::from)));
        self
    }

    /// Only accept a feed whose `X-WR-CALNAME` is `name`.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_lookahead(mut self, lookahead: TimeDelta) -> Self {
        self.lookahead = lookahead;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn download(&self) -> Result<String> {
        let mut request = self.client.get(&self.url);
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, password.as_ref());
        }

        let exchange = async {
            request
                .send()
                .await
                .map_err(|e| Error::http("calendar", e))?
                .error_for_status()
                .map_err(|e| Error::http("calendar", e))?
                .text()
                .await
                .map_err(|e| Error::http("calendar", e))
        };
        runtime::timeout(self.timeout, exchange)
            .await
            .map_err(|_| Error::timeout("calendar", self.timeout))?
    }
}

impl CalendarSource for IcsCalendar {
    async fn fetch_events(&self, anchor: DateTime<Utc>) -> Result<Vec<CalendarEvent>> {
        let body = self.download().await?;
        let feed = parse_ics(&body, self.time_zone).map_err(|e| match e {
            Error::Calendar(reason) => Error::Calendar(format!(
                "{reason} in {}; the url must be an iCalendar export, not a CalDAV server root",
                self.url
            )),
            other => other,
        })?;

        if let (Some(expected), Some(actual)) = (&self.name, &feed.name) {
            if expected != actual {
                warn!("calendar '{expected}' not found, feed is named '{actual}'");
                return Ok(Vec::new());
            }
        }

        let until = anchor + self.lookahead;
        let events = feed.events_between(anchor, until);
        debug!("{} calendar events between {anchor} and {until}", events.len());
        Ok(events)
    }
}

/// The parts of an iCalendar document the scheduler cares about.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IcsFeed {
    /// The feed's `X-WR-CALNAME`, if any.
    pub name: Option<String>,
    /// Every event as written; repeating ones at their first occurrence.
    pub events: Vec<CalendarEvent>,
    recurrences: Vec<(usize, Recurrence)>,
}

impl IcsFeed {
    /// Events touching `[from, until]`.
    ///
    /// Repeating events contribute each of their occurrences in the window,
    /// minus excluded and rescheduled ones.
    pub fn events_between(&self, from: DateTime<Utc>, until: DateTime<Utc>) -> Vec<CalendarEvent> {
        let mut events = Vec::new();
        for (index, event) in self.events.iter().enumerate() {
            match self.recurrences.iter().find(|(i, _)| *i == index) {
                Some((_, recurrence)) => events.extend(recurrence.occurrences(event, from, until)),
                None if event.overlaps(from, until) => events.push(event.clone()),
                None => {}
            }
        }
        events
    }
}

/// Parse the `VEVENT`s of an iCalendar document.
///
/// Floating and all-day times are read in `time_zone`. Events without a
/// `SUMMARY` are dropped with a warning; events without times are kept.
///
/// # Examples
///
/// ```
/// use hue_calendar_rs::parse_ics;
///
/// let feed = parse_ics(
///     "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nSUMMARY:Altpapier\r\n\
///      DTSTART:20241015T050000Z\r\nDTEND:20241015T060000Z\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n",
///     chrono_tz::Europe::Berlin,
/// )
/// .unwrap();
/// assert_eq!(feed.events[0].title, "Altpapier");
/// ```
pub fn parse_ics(body: &str, time_zone: Tz) -> Result<IcsFeed> {
    let mut feed = IcsFeed::default();
    let mut components: Vec<String> = Vec::new();
    let mut seen_calendar = false;
    let mut event: Option<EventBuilder> = None;
    let mut rescheduled: Vec<(String, DateTime<Utc>)> = Vec::new();

    for line in unfold(body) {
        let Some(content) = ContentLine::parse(&line) else {
            debug!("skipping malformed calendar line {line:?}");
            continue;
        };

        match content.name.as_str() {
            "BEGIN" => {
                let component = content.value.trim().to_ascii_uppercase();
                match component.as_str() {
                    "VCALENDAR" => seen_calendar = true,
                    "VEVENT" => event = Some(EventBuilder::default()),
                    _ => {}
                }
                components.push(component);
            }
            "END" => {
                let component = content.value.trim().to_ascii_uppercase();
                if components.pop().as_deref() != Some(component.as_str()) {
                    return Err(Error::Calendar(format!("unbalanced END:{component}")));
                }
                if component == "VEVENT" {
                    if let Some(parsed) = event.take().and_then(EventBuilder::finish) {
                        if let Some(recurrence) = parsed.recurrence {
                            feed.recurrences.push((feed.events.len(), recurrence));
                        }
                        rescheduled.extend(parsed.replaces);
                        feed.events.push(parsed.event);
                    }
                }
            }
            _ => match components.last().map(String::as_str) {
                Some("VEVENT") => {
                    if let Some(builder) = event.as_mut() {
                        builder.apply(&content, time_zone);
                    }
                }
                Some("VCALENDAR") if content.name == "X-WR-CALNAME" => {
                    feed.name = Some(unescape(content.value));
                }
                _ => {}
            },
        }
    }

    if !seen_calendar {
        return Err(Error::Calendar("no VCALENDAR component".into()));
    }
    if let Some(open) = components.last() {
        return Err(Error::Calendar(format!("unterminated {open}")));
    }

    for (uid, at) in rescheduled {
        feed.recurrences
            .iter_mut()
            .filter(|(_, recurrence)| recurrence.uid.as_deref() == Some(uid.as_str()))
            .for_each(|(_, recurrence)| recurrence.exdates.push(at));
    }
    Ok(feed)
}

/// Join folded lines back together.
fn unfold(body: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in body.lines() {
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

/// Split `s` at `separator`, ignoring separators between double quotes.
fn split_unquoted(s: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quoted = false;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        if c == '"' {
            quoted = !quoted;
        } else if c == separator && !quoted {
            parts.push(&s[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&s[start..]);
    parts
}

struct ContentLine<'a> {
    name: String,
    params: Vec<(String, String)>,
    value: &'a str,
}

impl<'a> ContentLine<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let mut head_and_value = split_unquoted(line, ':').into_iter();
        let head = head_and_value.next()?;
        let value = line.get(head.len() + 1..)?;

        let mut head = split_unquoted(head, ';').into_iter();
        let name = head.next()?.trim().to_ascii_uppercase();
        if name.is_empty() {
            return None;
        }
        let params = head
            .filter_map(|param| param.split_once('='))
            .map(|(key, value)| (key.trim().to_ascii_uppercase(), value.trim_matches('"').to_string()))
            .collect();
        Some(ContentLine {
            name,
            params,
            value,
        })
    }

    fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A parsed time, the zone its wall clock runs in, and whether it was a whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EventTime {
    at: DateTime<Utc>,
    zone: Tz,
    all_day: bool,
}

#[derive(Debug, Default)]
struct EventBuilder {
    uid: Option<String>,
    summary: Option<String>,
    start: Option<EventTime>,
    end: Option<EventTime>,
    rule: Option<String>,
    exdates: Vec<DateTime<Utc>>,
    replaces: Option<DateTime<Utc>>,
}

struct ParsedEvent {
    event: CalendarEvent,
    recurrence: Option<Recurrence>,
    /// UID and original start of the occurrence this event was moved from.
    replaces: Option<(String, DateTime<Utc>)>,
}

impl EventBuilder {
    fn apply(&mut self, content: &ContentLine<'_>, time_zone: Tz) {
        match content.name.as_str() {
            "UID" => self.uid = Some(content.value.trim().to_string()),
            "SUMMARY" => self.summary = Some(unescape(content.value)),
            "DTSTART" => self.start = parse_time(content, time_zone),
            "DTEND" => self.end = parse_time(content, time_zone),
            "RRULE" => self.rule = Some(content.value.trim().to_string()),
            "EXDATE" => self.exdates.extend(
                content
                    .value
                    .split(',')
                    .filter_map(|value| parse_time_value(content, value.trim(), time_zone))
                    .map(|time| time.at),
            ),
            "RECURRENCE-ID" => self.replaces = parse_time(content, time_zone).map(|time| time.at),
            _ => {}
        }
    }

    fn finish(self) -> Option<ParsedEvent> {
        let Some(title) = self.summary else {
            warn!("skipping calendar event without a title");
            return None;
        };
        // An all-day event without an end lasts that one day.
        let end = match (self.end, self.start) {
            (Some(end), _) => Some(end.at),
            (None, Some(start)) if start.all_day => Some(start.at + TimeDelta::days(1)),
            (None, _) => None,
        };
        let recurrence = match (self.rule, self.start) {
            (Some(rule), Some(start)) => Some(Recurrence {
                uid: self.uid.clone(),
                rule,
                start,
                exdates: self.exdates,
            }),
            (Some(_), None) => {
                warn!("cannot repeat '{title}' without a start time");
                None
            }
            (None, _) => None,
        };
        Some(ParsedEvent {
            event: CalendarEvent {
                title,
                start: self.start.map(|start| start.at),
                end,
            },
            recurrence,
            replaces: self.uid.zip(self.replaces),
        })
    }
}

/// How a repeating event repeats.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Recurrence {
    uid: Option<String>,
    rule: String,
    start: EventTime,
    exdates: Vec<DateTime<Utc>>,
}

impl Recurrence {
    fn rule_set(&self) -> std::result::Result<RRuleSet, rrule::RRuleError> {
        let zone = self.start.zone;
        let local = self.start.at.with_timezone(&zone).format("%Y%m%dT%H%M%S");
        let dtstart = if zone == Tz::UTC {
            format!("DTSTART:{local}Z")
        } else {
            format!("DTSTART;TZID={}:{local}", zone.name())
        };
        format!("{dtstart}\nRRULE:{}", utc_until(&self.rule, zone)).parse()
    }

    /// Occurrences of `first` that touch `[from, until]`.
    ///
    /// A rule that cannot be expanded leaves just the first occurrence.
    fn occurrences(
        &self,
        first: &CalendarEvent,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Vec<CalendarEvent> {
        let set = match self.rule_set() {
            Ok(set) => set,
            Err(e) => {
                warn!("cannot expand repeating event '{}': {e}", first.title);
                return if first.overlaps(from, until) {
                    vec![first.clone()]
                } else {
                    Vec::new()
                };
            }
        };

        let length = match (first.start, first.end) {
            (Some(start), Some(end)) => end - start,
            _ => TimeDelta::zero(),
        };
        let margin = TimeDelta::seconds(1);
        let found = set
            .after((from - length - margin).with_timezone(&rrule::Tz::UTC))
            .before((until + margin).with_timezone(&rrule::Tz::UTC))
            .all(MAX_OCCURRENCES);
        if found.limited {
            warn!(
                "'{}' repeats more than {MAX_OCCURRENCES} times in the window, ignoring the rest",
                first.title
            );
        }

        found
            .dates
            .into_iter()
            .map(|start| start.with_timezone(&Utc))
            .filter(|start| !self.exdates.contains(start))
            .map(|start| CalendarEvent {
                title: first.title.clone(),
                start: Some(start),
                end: first.end.map(|_| start + length),
            })
            .filter(|event| event.overlaps(from, until))
            .collect()
    }
}

/// Rewrite a floating `UNTIL` to UTC, reading it in `zone`.
///
/// A date-only `UNTIL` includes that whole day.
fn utc_until(rule: &str, zone: Tz) -> String {
    rule.split(';')
        .map(|part| match part.split_once('=') {
            Some((key, value)) if key.eq_ignore_ascii_case("UNTIL") && !value.ends_with('Z') => {
                let naive = if value.len() == 8 {
                    NaiveDate::parse_from_str(value, "%Y%m%d")
                        .ok()
                        .and_then(|date| date.and_hms_opt(23, 59, 59))
                } else {
                    NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok()
                };
                match naive.and_then(|naive| localize(naive, zone)) {
                    Some(until) => format!("UNTIL={}", until.format("%Y%m%dT%H%M%SZ")),
                    None => part.to_string(),
                }
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

fn parse_time(content: &ContentLine<'_>, time_zone: Tz) -> Option<EventTime> {
    parse_time_value(content, content.value.trim(), time_zone)
}

/// Read one time value of `content`, which may hold a list.
fn parse_time_value(content: &ContentLine<'_>, value: &str, time_zone: Tz) -> Option<EventTime> {
    let parsed = if content.param("VALUE") == Some("DATE") || value.len() == 8 {
        NaiveDate::parse_from_str(value, "%Y%m%d")
            .ok()
            .and_then(|date| localize(date.and_time(NaiveTime::MIN), time_zone))
            .map(|at| EventTime {
                at,
                zone: time_zone,
                all_day: true,
            })
    } else if let Some(utc) = value.strip_suffix('Z') {
        NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S")
            .ok()
            .map(|naive| EventTime {
                at: Utc.from_utc_datetime(&naive),
                zone: Tz::UTC,
                all_day: false,
            })
    } else {
        let zone = match content.param("TZID") {
            Some(tzid) => tzid.trim_start_matches('/').parse::<Tz>().unwrap_or_else(|_| {
                warn!("unknown time zone '{tzid}', using {time_zone}");
                time_zone
            }),
            None => time_zone,
        };
        NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S")
            .ok()
            .and_then(|naive| localize(naive, zone))
            .map(|at| EventTime {
                at,
                zone,
                all_day: false,
            })
    };

    if parsed.is_none() {
        warn!("ignoring unreadable {} value '{value}'", content.name);
    }
    parsed
}

fn localize(naive: NaiveDateTime, zone: Tz) -> Option<DateTime<Utc>> {
    zone.from_local_datetime(&naive)
        .earliest()
        .map(|time| time.with_timezone(&Utc))
}

/// Undo iCalendar text escaping.
fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Europe::Berlin;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    const FEED: &str = "BEGIN:VCALENDAR\r
VERSION:2.0\r
X-WR-CALNAME:Abfall\r
BEGIN:VTIMEZONE\r
TZID:Europe/Berlin\r
BEGIN:STANDARD\r
DTSTART:19701025T030000\r
END:STANDARD\r
END:VTIMEZONE\r
BEGIN:VEVENT\r
UID:1\r
SUMMARY:Biotonne\r
DTSTART;TZID=Europe/Berlin:20241015T070000\r
DTEND;TZID=Europe/Berlin:20241015T080000\r
BEGIN:VALARM\r
SUMMARY:Reminder\r
ACTION:DISPLAY\r
END:VALARM\r
END:VEVENT\r
BEGIN:VEVENT\r
SUMMARY:Gelbe S\r
 äcke\r
DTSTART;VALUE=DATE:20241016\r
END:VEVENT\r
BEGIN:VEVENT\r
SUMMARY:Termin\\, wichtig\r
DTSTART:20240115T070000\r
DTEND:20240115T073000Z\r
END:VEVENT\r
BEGIN:VEVENT\r
DTSTART:20241015T070000Z\r
END:VEVENT\r
BEGIN:VEVENT\r
SUMMARY:Open end\r
DTSTART:20241017T070000Z\r
END:VEVENT\r
END:VCALENDAR\r
";

    #[test]
    fn test_parse_feed() {
        let feed = parse_ics(FEED, Berlin).unwrap();
        assert_eq!(feed.name.as_deref(), Some("Abfall"));
        assert_eq!(
            feed.events,
            vec![
                CalendarEvent::new(
                    "Biotonne",
                    Some(utc("2024-10-15T05:00:00Z")),
                    Some(utc("2024-10-15T06:00:00Z"))
                ),
                CalendarEvent::new(
                    "Gelbe Säcke",
                    Some(utc("2024-10-15T22:00:00Z")),
                    Some(utc("2024-10-16T22:00:00Z"))
                ),
                CalendarEvent::new(
                    "Termin, wichtig",
                    Some(utc("2024-01-15T06:00:00Z")),
                    Some(utc("2024-01-15T07:30:00Z"))
                ),
                CalendarEvent::new("Open end", Some(utc("2024-10-17T07:00:00Z")), None),
            ]
        );
    }

    #[test]
    fn test_unreadable_time_leaves_bound_missing() {
        let feed = parse_ics(
            "BEGIN:VCALENDAR\nBEGIN:VEVENT\nSUMMARY:Altpapier\nDTSTART:tomorrow\nDTEND:20241015T060000Z\nEND:VEVENT\nEND:VCALENDAR\n",
            Berlin,
        )
        .unwrap();
        assert_eq!(feed.events[0].start, None);
        assert_eq!(feed.events[0].end, Some(utc("2024-10-15T06:00:00Z")));
    }

    #[test]
    fn test_unknown_tzid_falls_back_to_configured_zone() {
        let feed = parse_ics(
            "BEGIN:VCALENDAR\nBEGIN:VEVENT\nSUMMARY:Altpapier\nDTSTART;TZID=\"Mars/Olympus\":20240115T070000\nEND:VEVENT\nEND:VCALENDAR\n",
            Berlin,
        )
        .unwrap();
        assert_eq!(feed.events[0].start, Some(utc("2024-01-15T06:00:00Z")));
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(parse_ics("", Berlin), Err(Error::Calendar(_))));
        assert!(matches!(
            parse_ics("BEGIN:VCALENDAR\nBEGIN:VEVENT\nEND:VCALENDAR\n", Berlin),
            Err(Error::Calendar(_))
        ));
        assert!(matches!(
            parse_ics("BEGIN:VCALENDAR\nBEGIN:VEVENT\n", Berlin),
            Err(Error::Calendar(_))
        ));
    }

    #[test]
    fn test_content_line_with_quoted_colon() {
        let line = "DTSTART;TZID=\"America/New_York:x\";X-A=b:20240115T070000";
        let content = ContentLine::parse(line).unwrap();
        assert_eq!(content.name, "DTSTART");
        assert_eq!(content.param("TZID"), Some("America/New_York:x"));
        assert_eq!(content.param("X-A"), Some("b"));
        assert_eq!(content.value, "20240115T070000");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"a\,b\;c\\d\ne"), "a,b;c\\d\ne");
        assert_eq!(unescape("trailing\\"), "trailing\\");
    }

    #[test]
    fn test_overlaps() {
        let event = CalendarEvent::new(
            "Biotonne",
            Some(utc("2024-10-15T05:00:00Z")),
            Some(utc("2024-10-15T06:00:00Z")),
        );
        let day = |s| (utc(s), utc(s) + TimeDelta::days(1));

        let (from, until) = day("2024-10-14T06:00:00Z");
        assert!(event.overlaps(from, until));
        let (from, until) = day("2024-10-15T06:00:00Z");
        assert!(event.overlaps(from, until));
        let (from, until) = day("2024-10-15T06:00:01Z");
        assert!(!event.overlaps(from, until));
        let (from, until) = day("2024-10-13T00:00:00Z");
        assert!(!event.overlaps(from, until));

        let open = CalendarEvent::new("Open", None, None);
        assert!(open.overlaps(from, until));
    }

    fn feed(events: &str) -> IcsFeed {
        parse_ics(&format!("BEGIN:VCALENDAR\n{events}END:VCALENDAR\n"), Berlin).unwrap()
    }

    #[test]
    fn test_daily_event_started_long_ago() {
        let feed = feed(
            "BEGIN:VEVENT\nUID:daily\nSUMMARY:Biotonne\nDTSTART:20240101T060000Z\n\
             DTEND:20240101T070000Z\nRRULE:FREQ=DAILY\nEND:VEVENT\n",
        );
        assert_eq!(feed.events[0].start, Some(utc("2024-01-01T06:00:00Z")));

        let from = utc("2024-10-15T06:30:00Z");
        assert_eq!(
            feed.events_between(from, from + TimeDelta::days(1)),
            vec![
                CalendarEvent::new(
                    "Biotonne",
                    Some(utc("2024-10-15T06:00:00Z")),
                    Some(utc("2024-10-15T07:00:00Z"))
                ),
                CalendarEvent::new(
                    "Biotonne",
                    Some(utc("2024-10-16T06:00:00Z")),
                    Some(utc("2024-10-16T07:00:00Z"))
                ),
            ]
        );
    }

    #[test]
    fn test_weekly_all_day_event() {
        let feed = feed(
            "BEGIN:VEVENT\nUID:rest\nSUMMARY:Restmülltonne\nDTSTART;VALUE=DATE:20240102\n\
             RRULE:FREQ=WEEKLY;UNTIL=20241231\nEXDATE;VALUE=DATE:20241015\nEND:VEVENT\n",
        );
        let starts = |from: &str, days: i64| -> Vec<Option<DateTime<Utc>>> {
            let from = utc(from);
            feed.events_between(from, from + TimeDelta::days(days))
                .into_iter()
                .map(|event| event.start)
                .collect()
        };

        // The 15th is excluded; local midnight is 22:00 UTC in summer.
        assert_eq!(starts("2024-10-14T12:00:00Z", 8), vec![Some(utc("2024-10-21T22:00:00Z"))]);
        // And 23:00 UTC in winter.
        assert_eq!(starts("2024-11-25T12:00:00Z", 1), vec![Some(utc("2024-11-25T23:00:00Z"))]);
        // The UNTIL day itself is included, nothing after it.
        assert_eq!(starts("2024-12-30T12:00:00Z", 1), vec![Some(utc("2024-12-30T23:00:00Z"))]);
        assert!(starts("2025-01-05T00:00:00Z", 7).is_empty());
    }

    #[test]
    fn test_rescheduled_occurrence() {
        let feed = feed(
            "BEGIN:VEVENT\nUID:bio\nSUMMARY:Biotonne\nDTSTART:20241001T050000Z\n\
             DTEND:20241001T060000Z\nRRULE:FREQ=WEEKLY;COUNT=10\nEND:VEVENT\n\
             BEGIN:VEVENT\nUID:bio\nRECURRENCE-ID:20241015T050000Z\nSUMMARY:Biotonne\n\
             DTSTART:20241016T050000Z\nDTEND:20241016T060000Z\nEND:VEVENT\n",
        );
        let from = utc("2024-10-14T00:00:00Z");
        assert_eq!(
            feed.events_between(from, from + TimeDelta::days(3)),
            vec![CalendarEvent::new(
                "Biotonne",
                Some(utc("2024-10-16T05:00:00Z")),
                Some(utc("2024-10-16T06:00:00Z"))
            )]
        );
    }

    #[test]
    fn test_unreadable_rule_keeps_first_occurrence() {
        let feed = feed(
            "BEGIN:VEVENT\nSUMMARY:Altpapier\nDTSTART:20241015T050000Z\n\
             DTEND:20241015T060000Z\nRRULE:FREQ=SOMETIMES\nEND:VEVENT\n",
        );
        let from = utc("2024-10-15T00:00:00Z");
        assert_eq!(feed.events_between(from, from + TimeDelta::days(1)), feed.events);
        assert!(feed.events_between(from + TimeDelta::days(2), from + TimeDelta::days(3)).is_empty());
    }

    #[test]
    fn test_floating_until_is_read_in_zone() {
        assert_eq!(
            utc_until("FREQ=WEEKLY;UNTIL=20241231;BYDAY=TU", Berlin),
            "FREQ=WEEKLY;UNTIL=20241231T225959Z;BYDAY=TU"
        );
        assert_eq!(
            utc_until("FREQ=DAILY;UNTIL=20240701T080000", Berlin),
            "FREQ=DAILY;UNTIL=20240701T060000Z"
        );
        assert_eq!(utc_until("FREQ=DAILY;COUNT=3", Berlin), "FREQ=DAILY;COUNT=3");
    }
}
