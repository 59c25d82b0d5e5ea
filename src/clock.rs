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

use std::sync::Arc;
use std::sync::Mutex;

use jiff::Timestamp;

/// The time source a [`MonthlyFile`](crate::MonthlyFile) consults before every write.
#[derive(Debug, Clone, Default)]
pub enum Clock {
    /// Read the system clock.
    #[default]
    DefaultClock,
    /// Read a clock that is set by hand.
    ManualClock(ManualClock),
}

impl Clock {
    /// Return the current instant of this clock.
    pub fn now(&self) -> Timestamp {
        match self {
            Clock::DefaultClock => Timestamp::now(),
            Clock::ManualClock(clock) => clock.now(),
        }
    }
}

impl From<ManualClock> for Clock {
    fn from(clock: ManualClock) -> Self {
        Clock::ManualClock(clock)
    }
}

/// The time could be reset.
///
/// Clones share the same instant, so a test can keep one handle and move time forward after the
/// clock was handed to a writer.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Timestamp>>,
}

impl ManualClock {
    /// Create a clock stopped at `now`.
    pub fn new(now: Timestamp) -> ManualClock {
        ManualClock {
            now: Arc::new(Mutex::new(now)),
        }
    }

    /// Return the instant this clock is stopped at.
    pub fn now(&self) -> Timestamp {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Move this clock, and all its clones, to `now`.
    pub fn set_now(&self, now: Timestamp) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }
}
