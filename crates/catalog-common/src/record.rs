//! Image filenames and the metadata records listed in monthly index files.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::channel::{Channel, HemisphereScope};
use crate::time::{DateValue, MonthKey};

/// A parsed `<YYYYMMDDHHMM>.<channel>.<scope>.png` image filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFilename {
    timestamp: DateValue,
    channel: Channel,
    scope: HemisphereScope,
}

impl ImageFilename {
    /// Parse a filename, returning `None` if it does not follow the grammar
    /// or its timestamp is not a real date and time.
    pub fn parse(filename: &str) -> Option<Self> {
        let mut parts = filename.split('.');
        let timestamp = DateValue::parse_timestamp(parts.next()?)?;
        let channel = Channel::from_token(parts.next()?)?;
        let scope = HemisphereScope::from_token(parts.next()?)?;
        if parts.next()? != "png" || parts.next().is_some() {
            return None;
        }
        Some(Self {
            timestamp,
            channel,
            scope,
        })
    }

    pub fn timestamp(&self) -> &DateValue {
        &self.timestamp
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn scope(&self) -> HemisphereScope {
        self.scope
    }
}

impl fmt::Display for ImageFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.png", self.timestamp, self.channel, self.scope)
    }
}

/// Pixel bounding box of the image content, kept as the source wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRange {
    pub x1: String,
    pub y1: String,
    pub x2: String,
    pub y2: String,
}

/// Value range used by renderers to map pixel values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueScale {
    pub min: String,
    pub max: String,
}

/// One row of a month's index file.
///
/// Only built from a parsed [`ImageFilename`], so `timestamp` is always a
/// valid 12-digit `YYYYMMDDHHMM`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexRecord {
    filename: String,
    timestamp: String,
    channel: Channel,
    scope: HemisphereScope,
    range: PixelRange,
    scale: ValueScale,
}

impl IndexRecord {
    pub fn new(name: ImageFilename, range: PixelRange, scale: ValueScale) -> Self {
        Self {
            filename: name.to_string(),
            timestamp: name.timestamp.to_string(),
            channel: name.channel,
            scope: name.scope,
            range,
            scale,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// `YYYYMMDDHHMM`
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn scope(&self) -> HemisphereScope {
        self.scope
    }

    pub fn range(&self) -> &PixelRange {
        &self.range
    }

    pub fn scale(&self) -> &ValueScale {
        &self.scale
    }

    /// `YYYYMMDD` part of the timestamp.
    pub fn date(&self) -> &str {
        &self.timestamp[..8]
    }

    /// `YYYYMM` part of the timestamp.
    pub fn month_key_str(&self) -> &str {
        &self.timestamp[..6]
    }

    /// Month the record belongs to.
    pub fn month_key(&self) -> Option<MonthKey> {
        self.month_key_str().parse().ok()
    }

    pub fn covers_north(&self) -> bool {
        self.scope.covers_north()
    }

    pub fn covers_south(&self) -> bool {
        self.scope.covers_south()
    }

    /// `YYYY-MM-DDTHH:MMZ` rendering of the timestamp for list displays.
    pub fn display_timestamp(&self) -> String {
        let t = &self.timestamp;
        format!(
            "{}-{}-{}T{}:{}Z",
            &t[0..4],
            &t[4..6],
            &t[6..8],
            &t[8..10],
            &t[10..12]
        )
    }
}
