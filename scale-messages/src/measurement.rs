// Copyright (C) 2025 Paul Hampson
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License version 3 as  published by the
// Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <https://www.gnu.org/licenses/>.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// <time_ms>,<weight>,<units>,<temperature>, i.e. four data fields plus the
// terminating separator the board always appends.
const DATA_FIELD_COUNT: usize = 4;
const SPLIT_FIELD_COUNT: usize = DATA_FIELD_COUNT + 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeasurementParseError {
    #[error("measurement line split into {0} fields, expected 5")]
    FieldCount(usize),
    #[error("measurement line is missing the terminating separator")]
    MissingTerminator,
    #[error("timestamp field {0:?} is not a millisecond count")]
    Timestamp(String),
    #[error("units field {0:?} is neither \"lbs\" nor \"kg\"")]
    UnknownUnits(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightUnits {
    Pounds,
    Kilograms,
}

impl WeightUnits {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightUnits::Pounds => "lbs",
            WeightUnits::Kilograms => "kg",
        }
    }
}

impl FromStr for WeightUnits {
    type Err = MeasurementParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lbs" => Ok(WeightUnits::Pounds),
            "kg" => Ok(WeightUnits::Kilograms),
            other => Err(MeasurementParseError::UnknownUnits(other.to_string())),
        }
    }
}

impl fmt::Display for WeightUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reading from the scale controller board.
///
/// Weight and temperature are kept as the exact decimal text the board sent;
/// the relay contract delivers the weight byte-for-byte, so no numeric
/// conversion happens on the way through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    /// Milliseconds since the board powered on
    pub timestamp_ms: u64,
    pub weight: String,
    pub units: WeightUnits,
    pub temperature_celsius: String,
}

impl Measurement {
    /// Parse one measurement line as emitted by the board.
    ///
    /// The line terminator is ignored; the remainder must split on `,` into
    /// exactly four data fields followed by an empty field from the board's
    /// terminating separator.
    pub fn parse_line(line: &str) -> Result<Self, MeasurementParseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let fields: Vec<&str> = line.split(',').collect();

        if fields.len() != SPLIT_FIELD_COUNT {
            return Err(MeasurementParseError::FieldCount(fields.len()));
        }
        if !fields[DATA_FIELD_COUNT].is_empty() {
            return Err(MeasurementParseError::MissingTerminator);
        }

        let timestamp_ms = fields[0]
            .parse()
            .map_err(|_| MeasurementParseError::Timestamp(fields[0].to_string()))?;
        let units = fields[2].parse()?;

        Ok(Self {
            timestamp_ms,
            weight: fields[1].to_string(),
            units,
            temperature_celsius: fields[3].to_string(),
        })
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.weight, self.units)
    }
}
