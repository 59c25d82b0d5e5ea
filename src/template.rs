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

use std::path::PathBuf;

use jiff::Timestamp;
use jiff::Zoned;
use jiff::fmt::strtime;

use crate::Error;
use crate::ErrorKind;

/// A strftime-style pattern that resolves to a log file path.
///
/// The pattern uses the conversion specifiers of [`jiff::fmt::strtime`], for example
/// `logs/%Y-%m.txt` resolves to `logs/2020-01.txt` in January 2020.
///
/// The pattern must produce a distinct path for every calendar month. This is not checked: a
/// pattern such as `logs/app.txt` keeps appending to the same file across rotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    pattern: String,
}

impl PathTemplate {
    /// Create a new path template.
    ///
    /// # Errors
    ///
    /// Return an error if the pattern is empty or contains a conversion specifier that cannot be
    /// formatted.
    pub fn new(pattern: impl Into<String>) -> Result<PathTemplate, Error> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidTemplate,
                "path template must not be empty",
            ));
        }

        let template = PathTemplate { pattern };
        template.resolve(&Timestamp::UNIX_EPOCH.to_zoned(jiff::tz::TimeZone::UTC))?;
        Ok(template)
    }

    /// The pattern as given.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Format the pattern with `now`.
    pub fn resolve(&self, now: &Zoned) -> Result<PathBuf, Error> {
        strtime::format(&self.pattern, now)
            .map(PathBuf::from)
            .map_err(|err| {
                Error::new(ErrorKind::InvalidTemplate, "failed to format path template")
                    .with_context("pattern", &self.pattern)
                    .with_source(err)
            })
    }
}
