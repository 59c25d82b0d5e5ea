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

//! A `log` backend that writes every record into a monthly file.

use std::fs;
use std::io::Write;
use std::str::FromStr;
use std::sync::OnceLock;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use jiff::Timestamp;
use log::LevelFilter;
use log::Log;
use log::Metadata;
use log::Record;
use monthly_rotate::ErrorKind;
use monthly_rotate::ManualClock;
use monthly_rotate::MonthlyFile;
use tempfile::TempDir;

static FILE: OnceLock<MonthlyFile> = OnceLock::new();

struct MonthlyFileLogger;

impl Log for MonthlyFileLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Some(mut file) = FILE.get() {
            let _ = writeln!(file, "{} {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: MonthlyFileLogger = MonthlyFileLogger;

fn ts(s: &str) -> Timestamp {
    Timestamp::from_str(s).unwrap()
}

#[test]
fn test_logger_backed_by_monthly_file() {
    let temp_dir = TempDir::new().unwrap();
    let clock = ManualClock::new(ts("2020-01-31T00:00:00Z"));
    let template = temp_dir.path().join("logs").join("%Y-%m.txt");
    let file = MonthlyFile::builder(template.to_str().unwrap())
        .clock(clock.clone())
        .build()
        .unwrap();
    FILE.set(file).unwrap();

    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(LevelFilter::Trace);

    log::info!("january");
    let january = temp_dir.path().join("logs").join("2020-01.txt");
    assert_eq!(fs::read_to_string(&january).unwrap(), "INFO january\n");

    // a directory where the file for February should be, so the rotation fails
    let february = temp_dir.path().join("logs").join("2020-02.txt");
    fs::create_dir_all(&february).unwrap();
    clock.set_now(ts("2020-02-01T00:00:00Z"));

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let result = FILE.get().unwrap().write(b"february\n");
        tx.send(result.map_err(|err| err.kind())).unwrap();
    });
    let result = rx
        .recv_timeout(Duration::from_secs(10))
        .expect("write did not return");
    assert_eq!(result, Err(ErrorKind::Open));

    fs::remove_dir(&february).unwrap();
    log::warn!("february");
    assert_eq!(fs::read_to_string(&february).unwrap(), "WARN february\n");
}
