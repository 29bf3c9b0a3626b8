//! Per-session flood control

use crate::error::{RelayError, Result};

/// Counts inbound frames in one-second windows keyed to wall-clock seconds.
///
/// When a frame arrives in a second later than the stored boundary, the
/// boundary moves to `current_second + 1` and the count restarts, so a window
/// opened at second T stays valid through T + 1.
#[derive(Debug, Default, Clone)]
pub struct FloodGuard {
    window_second: u64,
    count: u32,
}

impl FloodGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one inbound frame received at `now_ms`
    pub fn check(&mut self, now_ms: u64, max_per_window: u32) -> Result<()> {
        let current_second = now_ms / 1000;
        if current_second > self.window_second {
            self.window_second = current_second + 1;
            self.count = 0;
        }

        self.count += 1;
        if self.count > max_per_window {
            return Err(RelayError::FloodLimit);
        }
        Ok(())
    }

    /// Forget all counted frames; the next frame opens a fresh window
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Frames counted in the current window
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn window_second(&self) -> u64 {
        self.window_second
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hundred_frames_pass() {
        let mut guard = FloodGuard::new();
        for _ in 0..100 {
            assert!(guard.check(5_000, 100).is_ok());
        }
        assert_eq!(guard.count(), 100);
    }

    #[test]
    fn test_hundred_and_first_frame_blocked() {
        let mut guard = FloodGuard::new();
        for _ in 0..100 {
            guard.check(5_000, 100).unwrap();
        }
        assert!(matches!(guard.check(5_999, 100), Err(RelayError::FloodLimit)));
    }

    #[test]
    fn test_window_boundary_is_one_second_ahead() {
        let mut guard = FloodGuard::new();
        guard.check(5_000, 100).unwrap();
        assert_eq!(guard.window_second(), 6);

        // Second 6 still belongs to the window opened at 5
        guard.check(6_500, 100).unwrap();
        assert_eq!(guard.count(), 2);

        // Second 7 opens a fresh window
        guard.check(7_000, 100).unwrap();
        assert_eq!(guard.count(), 1);
        assert_eq!(guard.window_second(), 8);
    }

    #[test]
    fn test_reset_opens_fresh_window() {
        let mut guard = FloodGuard::new();
        for _ in 0..100 {
            guard.check(5_000, 100).unwrap();
        }
        guard.reset();
        assert_eq!(guard.count(), 0);

        guard.check(5_000, 100).unwrap();
        assert_eq!(guard.count(), 1);
        assert_eq!(guard.window_second(), 6);
    }
}
