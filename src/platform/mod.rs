//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall-clock time in milliseconds
//! - Camera permission tracking, and capture (web only)

#[cfg(target_arch = "wasm32")]
pub mod camera;

/// Camera permission as the shell sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraAccess {
    #[default]
    Pending,
    Granted,
    Denied,
}

impl CameraAccess {
    pub fn is_granted(self) -> bool {
        self == CameraAccess::Granted
    }

    pub fn on_stream_attached(&mut self) {
        *self = CameraAccess::Granted;
    }

    /// Record a failed `getUserMedia` request. A stream that is already
    /// running stays in use; returns whether the camera is still usable.
    pub fn on_request_failed(&mut self) -> bool {
        if self.is_granted() {
            return true;
        }
        *self = CameraAccess::Denied;
        false
    }
}

/// Milliseconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Milliseconds since the Unix epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}
