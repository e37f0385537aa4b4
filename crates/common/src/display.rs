//! Timestamp display in a fixed zone and format

use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::error::{Error, Result};

/// Day-first date with 24h time
pub const DISPLAY_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Shown in place of a power-off time for a VM that is still up
pub const STILL_RUNNING: &str = "Still Running";

/// Renders timestamps at one fixed UTC offset
#[derive(Debug, Clone, Copy)]
pub struct TimeDisplay {
    offset: FixedOffset,
}

impl TimeDisplay {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Parse an offset written as `+HH:MM`, `-HH:MM` or `Z`
    pub fn from_offset_str(offset: &str) -> Result<Self> {
        let offset = offset.trim();
        if offset.eq_ignore_ascii_case("z") || offset.eq_ignore_ascii_case("utc") {
            return Ok(Self::utc());
        }
        let (sign, rest) = match offset.as_bytes().first() {
            Some(b'+') => (1, &offset[1..]),
            Some(b'-') => (-1, &offset[1..]),
            _ => return Err(Error::InvalidConfig(format!("invalid UTC offset '{}'", offset))),
        };
        let (hours, minutes) = rest
            .split_once(':')
            .and_then(|(h, m)| Some((offset_part(h)?, offset_part(m)?)))
            .filter(|&(_, minutes)| minutes < 60)
            .ok_or_else(|| Error::InvalidConfig(format!("invalid UTC offset '{}'", offset)))?;
        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(Self::new)
            .ok_or_else(|| Error::InvalidConfig(format!("UTC offset out of range '{}'", offset)))
    }

    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    pub fn format(&self, ts: &DateTime<Utc>) -> String {
        ts.with_timezone(&self.offset).format(DISPLAY_FORMAT).to_string()
    }

    /// Power-off column text
    pub fn format_powered_off(&self, ts: Option<&DateTime<Utc>>) -> String {
        ts.map(|t| self.format(t))
            .unwrap_or_else(|| STILL_RUNNING.to_string())
    }
}

/// One or two plain digits
fn offset_part(part: &str) -> Option<i32> {
    if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

impl Default for TimeDisplay {
    fn default() -> Self {
        Self::utc()
    }
}
