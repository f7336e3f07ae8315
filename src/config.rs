//! Tunable parameters (spec §6 "Tunable parameters").

use std::time::Duration;

/// Validated set of build-time tunables for a [`crate::controller::Controller`].
///
/// Construct with [`Config::new`] (validating) or start from
/// [`Config::default`] and override individual fields before calling
/// [`Config::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Maximum `DATA`/`UI` payload length, in bytes.
    pub max_frame_len: usize,
    /// Send window size, `W`.
    pub max_outstanding_frames: u8,
    /// Consecutive retransmits of the head of the TX queue before reset.
    pub retransmit_cnt: u32,
    /// Idle timer ticks before a keep-alive `DATA` frame is sent.
    pub keep_alive_cnt: u32,
    /// Retransmit/keep-alive timer period.
    pub timer_period: Duration,
}

/// A [`Config`] field fell outside its documented range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("max_frame_len must be at least 1")]
    FrameLenTooSmall,
    #[error("max_outstanding_frames must be in 1..=7")]
    WindowOutOfRange,
    #[error("retransmit_cnt must be at least 1")]
    RetransmitCntTooSmall,
    #[error("keep_alive_cnt must be at least 1")]
    KeepAliveCntTooSmall,
    #[error("timer_period must be non-zero")]
    TimerPeriodZero,
}

impl Config {
    /// Build and validate a `Config` from explicit values.
    pub fn new(
        max_frame_len: usize,
        max_outstanding_frames: u8,
        retransmit_cnt: u32,
        keep_alive_cnt: u32,
        timer_period: Duration,
    ) -> Result<Self, ConfigError> {
        let cfg = Config {
            max_frame_len,
            max_outstanding_frames,
            retransmit_cnt,
            keep_alive_cnt,
            timer_period,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_frame_len < 1 {
            return Err(ConfigError::FrameLenTooSmall);
        }
        if !(1..=7).contains(&self.max_outstanding_frames) {
            return Err(ConfigError::WindowOutOfRange);
        }
        if self.retransmit_cnt < 1 {
            return Err(ConfigError::RetransmitCntTooSmall);
        }
        if self.keep_alive_cnt < 1 {
            return Err(ConfigError::KeepAliveCntTooSmall);
        }
        if self.timer_period.is_zero() {
            return Err(ConfigError::TimerPeriodZero);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_frame_len: 2000,
            max_outstanding_frames: 2,
            retransmit_cnt: 20,
            keep_alive_cnt: 30,
            timer_period: Duration::from_millis(200),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn window_out_of_range_is_rejected() {
        let mut cfg = Config::default();
        cfg.max_outstanding_frames = 8;
        assert_eq!(cfg.validate(), Err(ConfigError::WindowOutOfRange));
        cfg.max_outstanding_frames = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::WindowOutOfRange));
    }

    #[test]
    fn zero_timer_period_is_rejected() {
        let mut cfg = Config::default();
        cfg.timer_period = Duration::ZERO;
        assert_eq!(cfg.validate(), Err(ConfigError::TimerPeriodZero));
    }
}
