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

use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::Clock;
use crate::Error;
use crate::PathTemplate;
use crate::Period;
use crate::notify::CloseReason;
use crate::notify::OnClose;
use crate::rolling::State;
use crate::rolling::WriteLocation;
use crate::trap::DefaultTrap;
use crate::trap::Trap;

/// A builder to configure and create a [`MonthlyFile`].
#[derive(Debug)]
pub struct MonthlyFileBuilder {
    // required
    template: String,

    // has default
    on_close: Option<Box<dyn OnClose>>,
    clock: Clock,
    trap: Box<dyn Trap>,
}

impl MonthlyFileBuilder {
    /// Create a new builder for files named by the strftime `template`.
    ///
    /// See [`PathTemplate`] for the template syntax.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            on_close: None,
            clock: Clock::DefaultClock,
            trap: Box::new(DefaultTrap::default()),
        }
    }

    /// Set the handler notified after every closed file.
    ///
    /// Default to no handler.
    ///
    /// # Examples
    ///
    /// ```
    /// use monthly_rotate::MonthlyFileBuilder;
    /// use monthly_rotate::notify::CustomOnClose;
    ///
    /// let builder = MonthlyFileBuilder::new("logs/%Y-%m.txt").on_close(CustomOnClose::new(
    ///     |path, reason| println!("closed {} ({reason:?})", path.display()),
    /// ));
    /// ```
    pub fn on_close(mut self, on_close: impl Into<Box<dyn OnClose>>) -> Self {
        self.on_close = Some(on_close.into());
        self
    }

    /// Set the clock that decides which month it is.
    ///
    /// Default to [`Clock::DefaultClock`].
    pub fn clock(mut self, clock: impl Into<Clock>) -> Self {
        self.clock = clock.into();
        self
    }

    /// Set the trap for errors that cannot be returned, such as a failed sync when the
    /// [`MonthlyFile`] is dropped.
    ///
    /// Default to [`DefaultTrap`].
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }

    /// Build the [`MonthlyFile`].
    ///
    /// The file for the current month is opened and closed once, so that a bad template or
    /// missing permissions are reported here rather than on the first write. The close handler is
    /// not notified about this first close.
    ///
    /// # Errors
    ///
    /// Return an error if either:
    ///
    /// * The template is empty or cannot be formatted.
    /// * The log directory cannot be created.
    /// * The log file cannot be opened or seeked.
    pub fn build(self) -> Result<MonthlyFile, Error> {
        let MonthlyFileBuilder {
            template,
            on_close,
            clock,
            trap,
        } = self;

        let template = PathTemplate::new(template)?;
        let mut state = State::new(template, clock);
        state.reopen_if_needed()?;
        state.close(CloseReason::Shutdown);
        state.set_on_close(on_close);

        Ok(MonthlyFile {
            state: Mutex::new(state),
            trap,
        })
    }
}

/// A file that rolls over to a new path whenever a write crosses a UTC month boundary.
///
/// All operations take `&self` and are serialized by one lock, so a `MonthlyFile` can be shared
/// between threads with an [`Arc`](std::sync::Arc). The lock is held while the close handler runs.
///
/// # Examples
///
/// ```
/// use monthly_rotate::MonthlyFile;
///
/// # let dir = tempfile::tempdir().unwrap();
/// # let template = dir.path().join("%Y-%m.log");
/// # let template = template.to_str().unwrap();
/// let file = MonthlyFile::open(template, None).unwrap();
/// let location = file.write_with_location(b"hello\n", true).unwrap();
/// assert_eq!(location.offset, 0);
/// file.close().unwrap();
/// ```
#[derive(Debug)]
pub struct MonthlyFile {
    state: Mutex<State>,
    trap: Box<dyn Trap>,
}

impl MonthlyFile {
    /// Create a new [`MonthlyFileBuilder`].
    #[must_use]
    pub fn builder(template: impl Into<String>) -> MonthlyFileBuilder {
        MonthlyFileBuilder::new(template)
    }

    /// Open a monthly file named by `template`, notifying `on_close` after every closed file.
    ///
    /// This is a shortcut for [`MonthlyFileBuilder::build`] with the default clock.
    pub fn open(
        template: impl Into<String>,
        on_close: Option<Box<dyn OnClose>>,
    ) -> Result<MonthlyFile, Error> {
        let mut builder = MonthlyFileBuilder::new(template);
        builder.on_close = on_close;
        builder.build()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Write `buf`, rotating first if the month has changed, and return the number of bytes
    /// written.
    ///
    /// On failure, [`Error::bytes_written`] tells how much of `buf` reached the file.
    pub fn write(&self, buf: &[u8]) -> Result<usize, Error> {
        self.state().write_record(buf, false).map(|location| location.len)
    }

    /// Write `buf`, optionally syncing it to stable storage, and return where it landed.
    pub fn write_with_location(&self, buf: &[u8], flush: bool) -> Result<WriteLocation, Error> {
        self.state().write_record(buf, flush)
    }

    /// Sync the open file to stable storage.
    ///
    /// # Errors
    ///
    /// Return an [`ErrorKind::NotOpen`](crate::ErrorKind::NotOpen) error if no file is open.
    pub fn flush(&self) -> Result<(), Error> {
        self.state().sync()
    }

    /// Close the open file and notify the close handler.
    ///
    /// Closing a file that is not open does nothing. The next write opens a file again.
    ///
    /// Errors reported by the operating system on close are ignored, as [`std::fs::File`] does;
    /// call [`flush`](MonthlyFile::flush) first to find out whether the data reached the disk.
    pub fn close(&self) -> Result<(), Error> {
        self.state().close(CloseReason::Shutdown);
        Ok(())
    }

    /// The byte offset the most recent write started at.
    pub fn last_write_offset(&self) -> u64 {
        self.state().last_write_offset()
    }

    /// The path of the open file, if any.
    pub fn current_path(&self) -> Option<PathBuf> {
        self.state().current_path().map(|path| path.to_path_buf())
    }

    /// The month of the open file, if any.
    pub fn current_period(&self) -> Option<Period> {
        self.state().period()
    }

    /// Whether a file is open; false after construction and after [`close`](MonthlyFile::close)
    /// until the next write.
    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }
}

impl io::Write for &MonthlyFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        MonthlyFile::write(*self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        MonthlyFile::flush(*self).map_err(io::Error::from)
    }
}

impl io::Write for MonthlyFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write(&mut &*self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::Write::flush(&mut &*self)
    }
}

impl Drop for MonthlyFile {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(|e| e.into_inner());
        if !state.is_open() {
            return;
        }
        if let Err(err) = state.sync() {
            let err = Error::new(err.kind(), "failed to sync log file on dropped").with_source(err);
            self.trap.trap(&err);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::Path;
    use std::str::FromStr;
    use std::sync::Arc;

    use jiff::Timestamp;
    use tempfile::TempDir;

    use super::*;
    use crate::ErrorKind;
    use crate::ManualClock;
    use crate::notify::CustomOnClose;

    #[derive(Debug, Default, Clone)]
    struct CollectingTrap {
        errors: Arc<Mutex<Vec<ErrorKind>>>,
    }

    impl Trap for CollectingTrap {
        fn trap(&self, err: &Error) {
            self.errors.lock().unwrap().push(err.kind());
        }
    }

    fn template(temp_dir: &TempDir) -> String {
        let pattern = temp_dir.path().join("nested").join("dir").join("%Y-%m.txt");
        pattern.to_str().unwrap().to_string()
    }

    #[test]
    fn test_build_opens_once_and_leaves_file_closed() {
        let temp_dir = TempDir::new().unwrap();
        let clock = ManualClock::new(Timestamp::from_str("2020-01-15T00:00:00Z").unwrap());
        let file = MonthlyFile::builder(template(&temp_dir))
            .clock(clock)
            .build()
            .unwrap();

        assert!(!file.is_open());
        assert!(file.current_path().is_none());
        assert!(file.current_period().is_none());
        assert!(temp_dir.path().join("nested/dir").is_dir());
        assert!(temp_dir.path().join("nested/dir/2020-01.txt").is_file());
    }

    #[test]
    fn test_build_rejects_empty_template() {
        let err = MonthlyFile::open("", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTemplate);
    }

    #[test]
    fn test_io_write_impl() {
        let temp_dir = TempDir::new().unwrap();
        let clock = ManualClock::new(Timestamp::from_str("2020-01-15T00:00:00Z").unwrap());
        let mut file = MonthlyFile::builder(template(&temp_dir))
            .clock(clock)
            .build()
            .unwrap();

        writeln!(&file, "first line").unwrap();
        writeln!(file, "second line").unwrap();
        io::Write::flush(&mut file).unwrap();
        assert_eq!(file.last_write_offset(), 11);

        let path = file.current_path().unwrap();
        file.close().unwrap();
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "first line\nsecond line\n"
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_character_device_target() {
        let closed = Arc::new(Mutex::new(Vec::new()));
        let file = MonthlyFile::builder("/dev/null")
            .on_close(CustomOnClose::new({
                let closed = closed.clone();
                move |path, reason| closed.lock().unwrap().push((path.to_path_buf(), reason))
            }))
            .build()
            .unwrap();

        assert_eq!(file.write(b"discarded\n").unwrap(), 10);
        file.close().unwrap();
        assert_eq!(
            *closed.lock().unwrap(),
            vec![(Path::new("/dev/null").to_path_buf(), CloseReason::Shutdown)]
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_write_keeps_file_open() {
        let trap = CollectingTrap::default();
        let file = MonthlyFile::builder("/dev/full")
            .trap(trap.clone())
            .build()
            .unwrap();

        let err = file.write(b"record\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Write);
        assert_eq!(err.bytes_written(), 0);
        assert_eq!(io::Error::from(err).kind(), io::ErrorKind::StorageFull);
        assert!(file.is_open());
        assert_eq!(file.current_path().as_deref(), Some(Path::new("/dev/full")));

        let err = file.write_with_location(b"record\n", true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Write);
        assert!(file.is_open());

        // character devices do not support fsync
        let err = file.flush().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Sync);
        assert!(file.is_open());

        drop(file);
        assert_eq!(*trap.errors.lock().unwrap(), vec![ErrorKind::Sync]);
    }

    #[test]
    fn test_drop_without_open_file_does_not_trap() {
        let temp_dir = TempDir::new().unwrap();
        let trap = CollectingTrap::default();
        let file = MonthlyFile::builder(template(&temp_dir))
            .trap(trap.clone())
            .build()
            .unwrap();
        file.write(b"x").unwrap();
        file.close().unwrap();

        drop(file);
        assert!(trap.errors.lock().unwrap().is_empty());
    }

    #[test]
    fn test_io_flush_without_open_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = MonthlyFile::open(template(&temp_dir), None).unwrap();
        let err = io::Write::flush(&mut &file).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }
}
