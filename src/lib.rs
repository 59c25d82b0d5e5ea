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

//! A file writer that rolls over to a new file whenever the UTC month changes.
//!
//! You provide a strftime-style template for the file path, such as `logs/%Y-%m.txt`. Every write
//! checks the current UTC month; when it differs from the month of the open file, the open file is
//! closed and the file for the new month is opened. An optional handler is notified about every
//! closed file, either rotated or explicitly closed.
//!
//! # Examples
//!
//! ```
//! use monthly_rotate::MonthlyFile;
//! use monthly_rotate::notify::CustomOnClose;
//!
//! # let dir = tempfile::tempdir().unwrap();
//! # let template = dir.path().join("logs").join("%Y-%m.txt");
//! # let template = template.to_str().unwrap();
//! let file = MonthlyFile::builder(template)
//!     .on_close(CustomOnClose::new(|path, reason| {
//!         println!("closed {} (rotated: {})", path.display(), reason.did_rotate());
//!     }))
//!     .build()
//!     .unwrap();
//!
//! file.write(b"first record\n").unwrap();
//! let location = file.write_with_location(b"second record\n", true).unwrap();
//! assert_eq!(location.offset, 13);
//!
//! file.close().unwrap();
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod notify;
pub mod trap;

mod clock;
mod error;
mod file;
mod period;
mod rolling;
mod template;

pub use self::clock::Clock;
pub use self::clock::ManualClock;
pub use self::error::Error;
pub use self::error::ErrorKind;
pub use self::file::MonthlyFile;
pub use self::file::MonthlyFileBuilder;
pub use self::period::Period;
pub use self::rolling::WriteLocation;
pub use self::template::PathTemplate;
