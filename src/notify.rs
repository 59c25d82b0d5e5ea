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

//! Notifications fired when a log file is closed.

use std::fmt;
use std::path::Path;

/// Why a log file was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// A write crossed a UTC month boundary.
    Rotation,
    /// [`MonthlyFile::close`](crate::MonthlyFile::close) was called.
    Shutdown,
}

impl CloseReason {
    /// Whether the file was closed because of a rotation.
    pub fn did_rotate(&self) -> bool {
        matches!(self, CloseReason::Rotation)
    }
}

/// A handler that is told about every closed log file.
///
/// The handler runs on the thread that closed the file while the writer's lock is held, so every
/// other operation on the writer waits for it to return. Hand slow work such as uploading the
/// closed file to a background thread.
pub trait OnClose: fmt::Debug + Send + Sync + 'static {
    /// Handle a log file that was just closed successfully.
    fn on_close(&self, path: &Path, reason: CloseReason);
}

impl<T: OnClose> From<T> for Box<dyn OnClose> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// An [`OnClose`] handler backed by a closure.
///
/// ```
/// use monthly_rotate::notify::CustomOnClose;
///
/// let on_close = CustomOnClose::new(|path, reason| {
///     println!("closed {} (rotated: {})", path.display(), reason.did_rotate());
/// });
/// ```
pub struct CustomOnClose {
    f: Box<dyn Fn(&Path, CloseReason) + Send + Sync + 'static>,
}

impl fmt::Debug for CustomOnClose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CustomOnClose {{ ... }}")
    }
}

impl CustomOnClose {
    pub fn new(f: impl Fn(&Path, CloseReason) + Send + Sync + 'static) -> Self {
        CustomOnClose { f: Box::new(f) }
    }
}

impl OnClose for CustomOnClose {
    fn on_close(&self, path: &Path, reason: CloseReason) {
        (self.f)(path, reason)
    }
}
