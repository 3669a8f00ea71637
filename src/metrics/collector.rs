use crate::stores::session_store::SessionStore;
use crate::utils::time::{current_timestamp, elapsed_seconds};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct Metrics {
    pub registrations: AtomicU64,
    pub logins_succeeded: AtomicU64,
    pub logins_failed: AtomicU64,
    pub predictions: AtomicU64,
    pub unrecognized_predictions: AtomicU64,
    pub invalid_images: AtomicU64,
    pub start_time: i64,
}

#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct MetricsSnapshot {
    pub registrations: u64,
    pub logins_succeeded: u64,
    pub logins_failed: u64,
    pub predictions: u64,
    pub unrecognized_predictions: u64,
    pub invalid_images: u64,
    pub active_sessions: usize,
    pub model_loaded: bool,
    pub uptime_seconds: i64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            registrations: AtomicU64::new(0),
            logins_succeeded: AtomicU64::new(0),
            logins_failed: AtomicU64::new(0),
            predictions: AtomicU64::new(0),
            unrecognized_predictions: AtomicU64::new(0),
            invalid_images: AtomicU64::new(0),
            start_time: current_timestamp(),
        }
    }

    pub fn increment_registrations(&self) {
        self.registrations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_login(&self, succeeded: bool) {
        if succeeded {
            self.logins_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.logins_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_prediction(&self, recognized: bool) {
        self.predictions.fetch_add(1, Ordering::Relaxed);
        if !recognized {
            self.unrecognized_predictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn increment_invalid_images(&self) {
        self.invalid_images.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self, sessions: &SessionStore, model_loaded: bool) -> MetricsSnapshot {
        MetricsSnapshot {
            registrations: self.registrations.load(Ordering::Relaxed),
            logins_succeeded: self.logins_succeeded.load(Ordering::Relaxed),
            logins_failed: self.logins_failed.load(Ordering::Relaxed),
            predictions: self.predictions.load(Ordering::Relaxed),
            unrecognized_predictions: self.unrecognized_predictions.load(Ordering::Relaxed),
            invalid_images: self.invalid_images.load(Ordering::Relaxed),
            active_sessions: sessions.len(),
            model_loaded,
            uptime_seconds: elapsed_seconds(self.start_time, current_timestamp()),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
