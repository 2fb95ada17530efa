//! Controller health: Normal, Recovering, Dead.
//!
//! > A touchkey that reports garbage is worse than one that reports
//! > nothing. If recovery fails, go Dead and stay quiet.
//!
//! Counters survive recovery and reinitialization so the history is
//! available for diagnostics.

/// Recovery state of the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Health {
    /// Status reads succeed, keys are processed.
    Normal,
    /// Power-cycling and rereading after a failed read or ESD flag.
    Recovering,
    /// Retries exhausted; powered off until reinitialized.
    Dead,
}

impl Health {
    pub fn as_str(self) -> &'static str {
        match self {
            Health::Normal => "normal",
            Health::Recovering => "recovering",
            Health::Dead => "dead",
        }
    }
}

/// Health record owned by the device.
#[derive(Debug, Clone)]
pub struct HealthState {
    state: Health,
    /// Recovery runs that ended in Normal.
    recoveries: u32,
    /// Power-cycle-and-reread attempts across all runs.
    attempts: u32,
    /// Recovery runs that ended in Dead.
    deaths: u32,
}

impl HealthState {
    pub const fn new() -> Self {
        Self {
            state: Health::Normal,
            recoveries: 0,
            attempts: 0,
            deaths: 0,
        }
    }

    #[inline]
    pub fn get(&self) -> Health {
        self.state
    }

    #[inline]
    pub fn begin_recovery(&mut self) {
        self.state = Health::Recovering;
    }

    #[inline]
    pub fn record_attempt(&mut self) {
        self.attempts = self.attempts.saturating_add(1);
    }

    #[inline]
    pub fn recovered(&mut self) {
        self.recoveries = self.recoveries.saturating_add(1);
        self.state = Health::Normal;
    }

    #[inline]
    pub fn died(&mut self) {
        self.deaths = self.deaths.saturating_add(1);
        self.state = Health::Dead;
    }

    /// Back to Normal after reinitialization. Counters are kept.
    #[inline]
    pub fn revive(&mut self) {
        self.state = Health::Normal;
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            state: self.state,
            recoveries: self.recoveries,
            attempts: self.attempts,
            deaths: self.deaths,
        }
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`HealthState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HealthSnapshot {
    pub state: Health,
    pub recoveries: u32,
    pub attempts: u32,
    pub deaths: u32,
}
