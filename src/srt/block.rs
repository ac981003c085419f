//! Subtitle timestamps and blocks.
//!
//! A [`SubtitleBlock`] is the atomic unit parsed from an `.srt` file:
//! a 1-based ordinal, a start/end [`Timestamp`] pair, and the spoken text.

use std::fmt;
use std::str::FromStr;

/// An `HH:MM:SS,mmm` subtitle timestamp.
///
/// # Examples
///
/// ```
/// use testigo::srt::Timestamp;
///
/// let ts: Timestamp = "00:01:02,500".parse().unwrap();
/// assert!((ts.as_seconds() - 62.5).abs() < 1e-9);
/// assert_eq!(ts.without_millis(), "00:01:02");
/// assert_eq!(ts.to_string(), "00:01:02,500");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp {
    hours: u32,
    minutes: u32,
    seconds: u32,
    millis: u32,
}

impl Timestamp {
    /// Creates a timestamp from components.
    #[must_use]
    pub const fn new(hours: u32, minutes: u32, seconds: u32, millis: u32) -> Self {
        Self {
            hours,
            minutes,
            seconds,
            millis,
        }
    }

    /// Total seconds: `h * 3600 + m * 60 + s + ms / 1000`.
    #[must_use]
    pub fn as_seconds(&self) -> f64 {
        f64::from(self.hours) * 3600.0
            + f64::from(self.minutes) * 60.0
            + f64::from(self.seconds)
            + f64::from(self.millis) / 1000.0
    }

    /// Renders the timestamp without its sub-second part.
    #[must_use]
    pub fn without_millis(&self) -> String {
        format!("{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02},{:03}",
            self.hours, self.minutes, self.seconds, self.millis
        )
    }
}

impl FromStr for Timestamp {
    type Err = String;

    /// Parses `HH:MM:SS,mmm`. Minutes and seconds must stay below 60.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (time_part, ms_part) = s
            .split_once(',')
            .ok_or_else(|| format!("missing millisecond separator in '{s}'"))?;
        let mut fields = time_part.split(':');
        let (h, m, sec) = match (fields.next(), fields.next(), fields.next(), fields.next()) {
            (Some(h), Some(m), Some(sec), None) => (h, m, sec),
            _ => return Err(format!("expected HH:MM:SS,mmm, got '{s}'")),
        };

        let parse_field = |field: &str, name: &str| -> Result<u32, String> {
            if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
                return Err(format!("invalid {name} field '{field}'"));
            }
            field
                .parse::<u32>()
                .map_err(|_| format!("invalid {name} field '{field}'"))
        };

        let hours = parse_field(h, "hours")?;
        let minutes = parse_field(m, "minutes")?;
        let seconds = parse_field(sec, "seconds")?;
        if ms_part.len() != 3 || !ms_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("invalid millisecond field '{ms_part}'"));
        }
        let millis = parse_field(ms_part, "milliseconds")?;

        if minutes >= 60 || seconds >= 60 {
            return Err(format!("out-of-range time component in '{s}'"));
        }

        Ok(Self::new(hours, minutes, seconds, millis))
    }
}

/// One parsed subtitle block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleBlock {
    /// 1-based ordinal within the source file, strictly increasing.
    pub index: u32,
    /// Block start time.
    pub start: Timestamp,
    /// Block end time.
    pub end: Timestamp,
    /// Spoken text, internal newlines collapsed to spaces.
    pub text: String,
}

impl SubtitleBlock {
    /// Creates a new block.
    #[must_use]
    pub const fn new(index: u32, start: Timestamp, end: Timestamp, text: String) -> Self {
        Self {
            index,
            start,
            end,
            text,
        }
    }

    /// Start time in seconds.
    #[must_use]
    pub fn start_seconds(&self) -> f64 {
        self.start.as_seconds()
    }

    /// End time in seconds.
    #[must_use]
    pub fn end_seconds(&self) -> f64 {
        self.end.as_seconds()
    }

    /// True when the time range is non-inverted.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.start_seconds() <= self.end_seconds()
    }

    /// Renders the block as a single content line:
    /// `[HH:MM:SS --> HH:MM:SS] text` with milliseconds stripped.
    #[must_use]
    pub fn render_line(&self) -> String {
        format!(
            "[{} --> {}] {}",
            self.start.without_millis(),
            self.end.without_millis(),
            self.text
        )
    }
}
