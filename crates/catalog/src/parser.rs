//! Parser for monthly `log.txt` index files.
//!
//! Each non-blank line is
//! `filename \t label \t [x1,y1,x2,y2] \t [min,max]`. The label is ignored.
//! A single malformed line rejects the whole month so callers never see a
//! partially loaded index.

use catalog_common::{
    ImageFilename, IndexRecord, MonthKey, ParseError, ParseErrorKind, PixelRange, ValueScale,
};

/// Parse one month's raw index text into records, in file order.
pub fn parse_index(month: MonthKey, raw: &str) -> Result<Vec<IndexRecord>, ParseError> {
    let mut records = Vec::new();

    for (idx, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = parse_line(line, month).map_err(|kind| ParseError {
            month,
            line: idx + 1,
            kind,
        })?;
        records.push(record);
    }

    Ok(records)
}

fn parse_line(line: &str, month: MonthKey) -> Result<IndexRecord, ParseErrorKind> {
    let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
    if fields.len() != 4 {
        return Err(ParseErrorKind::FieldCount(fields.len()));
    }

    let name = ImageFilename::parse(fields[0])
        .ok_or_else(|| ParseErrorKind::Filename(fields[0].to_string()))?;
    if name.timestamp().month_key() != month {
        return Err(ParseErrorKind::WrongMonth {
            filename: fields[0].to_string(),
        });
    }

    let [x1, y1, x2, y2] = bracketed_tuple::<4>(fields[2], "range")?;
    let [min, max] = bracketed_tuple::<2>(fields[3], "scale")?;

    Ok(IndexRecord::new(
        name,
        PixelRange { x1, y1, x2, y2 },
        ValueScale { min, max },
    ))
}

/// Split `[a,b,...]` into exactly `N` trimmed, non-empty parts.
fn bracketed_tuple<const N: usize>(
    value: &str,
    field: &'static str,
) -> Result<[String; N], ParseErrorKind> {
    let invalid = || ParseErrorKind::Tuple {
        field,
        value: value.to_string(),
        expected: N,
    };

    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or_else(invalid)?;
    let parts: Vec<String> = inner.split(',').map(|p| p.trim().to_string()).collect();
    if parts.iter().any(String::is_empty) {
        return Err(invalid());
    }
    parts.try_into().map_err(|_| invalid())
}
