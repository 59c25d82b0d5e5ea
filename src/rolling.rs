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

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use jiff::Timestamp;
use jiff::tz::TimeZone;

use crate::Error;
use crate::ErrorKind;
use crate::PathTemplate;
use crate::Period;
use crate::clock::Clock;
use crate::notify::CloseReason;
use crate::notify::OnClose;

/// Where a write landed.
///
/// Seeking `path` to `offset` and reading `len` bytes returns the written data, as long as the
/// file is not modified by anyone else.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WriteLocation {
    /// The file the data was written to.
    pub path: PathBuf,
    /// The byte offset in `path` the data starts at.
    pub offset: u64,
    /// The number of bytes written.
    pub len: usize,
}

/// The rotation state of a monthly file.
///
/// `period` is `Some` exactly when `file` is `Some`.
#[derive(Debug)]
pub(crate) struct State {
    template: PathTemplate,
    clock: Clock,
    on_close: Option<Box<dyn OnClose>>,
    period: Option<Period>,
    path: PathBuf,
    file: Option<File>,
    last_write_offset: u64,
}

impl State {
    pub(crate) fn new(template: PathTemplate, clock: Clock) -> State {
        State {
            template,
            clock,
            on_close: None,
            period: None,
            path: PathBuf::new(),
            file: None,
            last_write_offset: 0,
        }
    }

    pub(crate) fn set_on_close(&mut self, on_close: Option<Box<dyn OnClose>>) {
        self.on_close = on_close;
    }

    pub(crate) fn period(&self) -> Option<Period> {
        self.period
    }

    pub(crate) fn current_path(&self) -> Option<&Path> {
        self.file.as_ref().map(|_| self.path.as_path())
    }

    pub(crate) fn last_write_offset(&self) -> u64 {
        self.last_write_offset
    }

    pub(crate) fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Open the file for the month `now` falls in, positioned at its end.
    fn open(&mut self, now: Timestamp) -> Result<(), Error> {
        debug_assert!(self.file.is_none());

        let now = now.to_zoned(TimeZone::UTC);
        let path = self.template.resolve(&now)?;
        let period = Period::from_zoned(&now);

        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|err| {
                Error::new(ErrorKind::CreateDir, "failed to create log directory")
                    .with_context("dir", dir.display())
                    .with_source(err)
            })?;
        }

        // opened without append mode so that the stream position reports real offsets
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|err| {
                Error::new(ErrorKind::Open, "failed to open log file")
                    .with_context("path", path.display())
                    .with_source(err)
            })?;

        file.seek(SeekFrom::End(0)).map_err(|err| {
            Error::new(ErrorKind::Seek, "failed to seek to the end of log file")
                .with_context("path", path.display())
                .with_source(err)
        })?;

        self.file = Some(file);
        self.period = Some(period);
        self.path = path;
        Ok(())
    }

    /// Close the open file, if any, and notify the close handler.
    pub(crate) fn close(&mut self, reason: CloseReason) {
        let Some(file) = self.file.take() else {
            return;
        };
        self.period = None;

        // std::fs::File ignores errors from close(2)
        drop(file);

        if let Some(on_close) = &self.on_close {
            on_close.on_close(&self.path, reason);
        }
    }

    /// Make sure the open file belongs to the current UTC month.
    pub(crate) fn reopen_if_needed(&mut self) -> Result<(), Error> {
        let now = self.clock.now();
        let period = Period::from_timestamp(now);
        if self.period == Some(period) {
            return Ok(());
        }

        self.close(CloseReason::Rotation);
        self.open(now)
    }

    pub(crate) fn write_record(&mut self, buf: &[u8], flush: bool) -> Result<WriteLocation, Error> {
        self.reopen_if_needed()?;

        let Some(file) = self.file.as_mut() else {
            return Err(not_open());
        };
        let path = &self.path;

        let offset = file.stream_position().map_err(|err| {
            Error::new(ErrorKind::Seek, "failed to read position of log file")
                .with_context("path", path.display())
                .with_source(err)
        })?;
        self.last_write_offset = offset;

        let mut written = 0;
        while written < buf.len() {
            match file.write(&buf[written..]) {
                Ok(0) => {
                    return Err(Error::new(ErrorKind::Write, "failed to write whole buffer")
                        .with_context("path", path.display())
                        .with_source(io::Error::from(io::ErrorKind::WriteZero))
                        .with_bytes_written(written));
                }
                Ok(n) => written += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => {
                    return Err(Error::new(ErrorKind::Write, "failed to write log file")
                        .with_context("path", path.display())
                        .with_source(err)
                        .with_bytes_written(written));
                }
            }
        }

        if flush {
            file.sync_all().map_err(|err| sync_error(path, err))?;
        }

        Ok(WriteLocation {
            path: path.clone(),
            offset,
            len: written,
        })
    }

    pub(crate) fn sync(&mut self) -> Result<(), Error> {
        let Some(file) = self.file.as_ref() else {
            return Err(not_open());
        };
        file.sync_all().map_err(|err| sync_error(&self.path, err))
    }
}

fn not_open() -> Error {
    Error::new(ErrorKind::NotOpen, "no log file is open")
}

fn sync_error(path: &Path, err: io::Error) -> Error {
    Error::new(ErrorKind::Sync, "failed to sync log file")
        .with_context("path", path.display())
        .with_source(err)
}
