//! Recording observers and a scripted clock.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use strata::{AccessObserver, AccessRecord, Clock, Error, ErrorObserver, Request};

/// Keeps every access record it receives.
#[derive(Clone, Default)]
pub struct AccessRecorder(Arc<Mutex<Vec<AccessRecord>>>);

impl AccessRecorder {
    pub fn observer(&self) -> impl AccessObserver + use<> {
        let sink = Arc::clone(&self.0);
        move |r: &AccessRecord| sink.lock().unwrap().push(r.clone())
    }

    pub fn records(&self) -> Vec<AccessRecord> {
        self.0.lock().unwrap().clone()
    }
}

/// Keeps every (request, error message) pair it receives.
#[derive(Clone, Default)]
pub struct ErrorRecorder(Arc<Mutex<Vec<(Request, String)>>>);

impl ErrorRecorder {
    pub fn observer(&self) -> impl ErrorObserver + use<> {
        let sink = Arc::clone(&self.0);
        move |req: &Request, err: &Error| sink.lock().unwrap().push((req.clone(), err.to_string()))
    }

    pub fn calls(&self) -> Vec<(Request, String)> {
        self.0.lock().unwrap().clone()
    }
}

/// Hands out `offsets_ms` after 2000-01-01T00:00:00Z, in order, then
/// repeats the last one.
pub fn scripted_clock(offsets_ms: &[i64]) -> impl Clock + use<> {
    let base = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
    let times: VecDeque<DateTime<Utc>> = offsets_ms
        .iter()
        .map(|ms| base + chrono::Duration::milliseconds(*ms))
        .collect();
    let times = Mutex::new(times);
    move || {
        let mut times = times.lock().unwrap();
        if times.len() > 1 {
            times.pop_front().unwrap()
        } else {
            *times.front().unwrap()
        }
    }
}
