//! Entry keys and the clocks that issue them.
//!
//! An entry is named after the second it was written, `DD-MM-YYYY HH-MM-SS`.
//! Several entries can land in the same second, so a key also carries a
//! sequence number rendered as a `.N` suffix when non-zero.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDateTime, TimeDelta, Timelike};

/// `strftime` layout of the timestamp part of an entry name.
pub const KEY_FORMAT: &str = "%d-%m-%Y %H-%M-%S";

/// Name of a log entry, totally ordered by `(at, seq)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryKey {
    at: NaiveDateTime,
    seq: u32,
}

impl EntryKey {
    /// Build a key. Sub-second precision is dropped.
    pub fn new(at: NaiveDateTime, seq: u32) -> Self {
        let at = at.with_nanosecond(0).unwrap_or(at);
        Self { at, seq }
    }

    /// Second the entry was written.
    pub fn at(&self) -> NaiveDateTime {
        self.at
    }

    /// Position among entries written in the same second.
    pub fn seq(&self) -> u32 {
        self.seq
    }

    /// The smallest key strictly greater than `self`.
    pub fn successor(&self) -> Self {
        match self.seq.checked_add(1) {
            Some(seq) => Self { at: self.at, seq },
            None => Self {
                at: self.at + TimeDelta::seconds(1),
                seq: 0,
            },
        }
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.at.format(KEY_FORMAT))?;
        if self.seq > 0 {
            write!(f, ".{}", self.seq)?;
        }
        Ok(())
    }
}

/// Error for names that are not entry keys.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not an entry key: {0:?}")]
pub struct InvalidKey(pub String);

impl FromStr for EntryKey {
    type Err = InvalidKey;

    /// Parse a name exactly: the name must be the canonical rendering of the
    /// key it denotes, so `1-1-2025 ...` or a `.0` suffix are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidKey(s.to_string());

        let (stamp, seq) = match s.split_once('.') {
            Some((stamp, seq)) => {
                if seq.is_empty() || !seq.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid());
                }
                (stamp, seq.parse::<u32>().map_err(|_| invalid())?)
            }
            None => (s, 0),
        };

        let at = NaiveDateTime::parse_from_str(stamp, KEY_FORMAT).map_err(|_| invalid())?;
        let key = Self::new(at, seq);
        if key.to_string() != s {
            return Err(invalid());
        }
        Ok(key)
    }
}

// ---------------------------------------------------------------------------
// Clocks
// ---------------------------------------------------------------------------

/// Source of wall-clock time for entry keys.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, at: NaiveDateTime) {
        *self.now.lock().expect("lock poisoned") = at;
    }

    /// Move the clock by `seconds`, which may be negative.
    pub fn advance(&self, seconds: i64) {
        let mut now = self.now.lock().expect("lock poisoned");
        *now += TimeDelta::seconds(seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().expect("lock poisoned")
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

/// Issues strictly increasing entry keys.
///
/// The next key is `(now, 0)` when `now` is past the last issued key,
/// otherwise the last key's successor. The wall clock stepping backwards
/// therefore never produces a key that sorts before existing entries.
pub struct KeyClock {
    clock: Box<dyn Clock>,
    last: Option<EntryKey>,
}

impl KeyClock {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self { clock, last: None }
    }

    /// Record a key that already exists so later keys sort after it.
    pub fn witness(&mut self, key: EntryKey) {
        if self.last.is_none_or(|last| key > last) {
            self.last = Some(key);
        }
    }

    /// Last key issued or witnessed.
    pub fn last(&self) -> Option<EntryKey> {
        self.last
    }

    /// Issue the next key.
    pub fn tick(&mut self) -> EntryKey {
        let now = EntryKey::new(self.clock.now(), 0);
        let key = match self.last {
            Some(last) if now <= last => last.successor(),
            _ => now,
        };
        self.last = Some(key);
        key
    }
}
