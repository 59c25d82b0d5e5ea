// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt;

use jiff::Span;
use jiff::Timestamp;
use jiff::Zoned;
use jiff::civil::Date;
use jiff::tz::TimeZone;

/// A UTC calendar month, the unit of rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Period {
    year: i16,
    month: i8,
}

impl Period {
    /// The month `date` falls in, read in the time zone `date` carries.
    pub fn from_zoned(date: &Zoned) -> Period {
        Period {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The UTC month `timestamp` falls in.
    pub fn from_timestamp(timestamp: Timestamp) -> Period {
        Period::from_zoned(&timestamp.to_zoned(TimeZone::UTC))
    }

    /// The calendar year.
    pub fn year(&self) -> i16 {
        self.year
    }

    /// The month, from 1 to 12.
    pub fn month(&self) -> i8 {
        self.month
    }

    /// The first instant of the following UTC month, or `None` past the last representable month.
    pub fn next_boundary(&self) -> Option<Timestamp> {
        let first = Date::new(self.year, self.month, 1).ok()?;
        let next = first.checked_add(Span::new().months(1)).ok()?;
        next.to_zoned(TimeZone::UTC).ok().map(|z| z.timestamp())
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
