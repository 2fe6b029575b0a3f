//! SOA timer values.

use std::{fmt, str::FromStr, time::Duration};

use jiff::{Span, SpanRelativeTo};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{self, Visitor},
};

//----------- Timer ------------------------------------------------------------

/// A refresh, retry, expire or minimum value of a SOA record.
///
/// BIND accepts these either as a plain number of seconds or in a shorthand
/// notation like `3w`, `12h` or `1w2d`.  A [`Timer`] remembers the text it
/// was written as, so that zone files keep the notation their authors chose.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timer {
    secs: u32,
    text: Box<str>,
}

impl Timer {
    /// A timer of the given number of seconds.
    pub fn from_secs(secs: u32) -> Self {
        Self {
            secs,
            text: secs.to_string().into(),
        }
    }

    /// The length of the timer, in seconds.
    pub fn as_secs(&self) -> u32 {
        self.secs
    }

    /// The textual form of the timer, as it appears in a zone file.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

//--- Parsing

impl TryFrom<Span> for Timer {
    type Error = TimerError;

    fn try_from(value: Span) -> Result<Self, Self::Error> {
        let signeddur = value
            .to_duration(SpanRelativeTo::days_are_24_hours())
            .map_err(|_| TimerError::Unconvertible)?;

        let duration = Duration::try_from(signeddur).map_err(|_| TimerError::Negative)?;

        let secs = duration
            .as_secs()
            .try_into()
            .map_err(|_| TimerError::TooLarge)?;

        Ok(Self::from_secs(secs))
    }
}

impl FromStr for Timer {
    type Err = TimerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TimerError::Empty);
        }

        // Plain seconds are the common case in normalized zone files.
        if s.bytes().all(|b| b.is_ascii_digit()) {
            let secs = s.parse().map_err(|_| TimerError::TooLarge)?;
            return Ok(Self::from_secs(secs));
        }

        // jiff knows many more notations than BIND; only hand it ours.
        if !is_shorthand(s) {
            return Err(TimerError::Syntax(s.into()));
        }

        // BIND units are case-insensitive; jiff only accepts lower case.
        let span: Span = s
            .to_ascii_lowercase()
            .parse()
            .map_err(|_| TimerError::Syntax(s.into()))?;

        let secs = Self::try_from(span)?.secs;
        Ok(Self {
            secs,
            text: s.into(),
        })
    }
}

/// Whether `s` is in BIND's shorthand notation.
///
/// That is one or more numbers, each directly followed by one of the units
/// `w`, `d`, `h`, `m` or `s` in either case.
fn is_shorthand(s: &str) -> bool {
    let mut rest = s;
    while !rest.is_empty() {
        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        if digits == 0 {
            return false;
        }
        rest = &rest[digits..];

        match rest.as_bytes().first() {
            Some(unit) if b"wdhmsWDHMS".contains(unit) => rest = &rest[1..],
            _ => return false,
        }
    }
    !s.is_empty()
}

//--- (De)serialization

struct TimerVisitor;

impl Visitor<'_> for TimerVisitor {
    type Value = Timer;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a number of seconds or a duration like '12h'")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        FromStr::from_str(value).map_err(E::custom)
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Timer::from_secs(value.try_into().map_err(|_| {
            E::custom(format!("timer value must be between 0 and {}", u32::MAX))
        })?))
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Timer::from_secs(value.try_into().map_err(|_| {
            E::custom(format!("timer value must be between 0 and {}", u32::MAX))
        })?))
    }
}

impl<'de> Deserialize<'de> for Timer {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(TimerVisitor)
    }
}

impl Serialize for Timer {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // Keep the shorthand so a round trip through a file is lossless.
        match self.text.parse::<u32>() {
            Ok(secs) => secs.serialize(serializer),
            Err(_) => self.text.serialize(serializer),
        }
    }
}

//----------- TimerError -------------------------------------------------------

/// An invalid SOA timer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimerError {
    /// The value was empty.
    Empty,

    /// The value was neither seconds nor a duration.
    Syntax(Box<str>),

    /// The duration uses calendar units that have no fixed length.
    Unconvertible,

    /// The duration was negative.
    Negative,

    /// The duration does not fit in 32 bits of seconds.
    TooLarge,
}

impl std::error::Error for TimerError {}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("the timer is empty"),
            Self::Syntax(s) => write!(f, "'{s}' is not a number of seconds or a duration"),
            Self::Unconvertible => f.write_str("the duration uses units of variable length"),
            Self::Negative => f.write_str("the duration is negative"),
            Self::TooLarge => write!(f, "the duration must be at most {} seconds", u32::MAX),
        }
    }
}

//============ Tests ===========================================================
