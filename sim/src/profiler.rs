//! Per-phase timing for the simulation step.
//!
//! Every parallel phase and the final commit are timed by name. The
//! statistics are cheap to collect and are kept for the whole session;
//! `log_summary` writes them out at `info!`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Statistics for one named phase.
#[derive(Debug, Default, Clone)]
pub struct PhaseStats {
    pub total_time: Duration,
    pub call_count: u64,
    pub min_time: Option<Duration>,
    pub max_time: Option<Duration>,
}

impl PhaseStats {
    pub fn avg_time(&self) -> Duration {
        if self.call_count == 0 {
            Duration::ZERO
        } else {
            self.total_time / self.call_count as u32
        }
    }

    fn record(&mut self, elapsed: Duration) {
        self.total_time += elapsed;
        self.call_count += 1;
        self.min_time = Some(self.min_time.map_or(elapsed, |m| m.min(elapsed)));
        self.max_time = Some(self.max_time.map_or(elapsed, |m| m.max(elapsed)));
    }
}

/// Accumulates wall-clock time per phase across frames.
#[derive(Debug, Default)]
pub struct PhaseProfiler {
    phases: HashMap<&'static str, PhaseStats>,
    frames: u64,
}

impl PhaseProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` and record its duration under `phase`.
    pub fn time<R>(&mut self, phase: &'static str, f: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let result = f();
        self.record(phase, start.elapsed());
        result
    }

    /// Record an externally measured duration under `phase`.
    pub fn record(&mut self, phase: &'static str, elapsed: Duration) {
        self.phases.entry(phase).or_default().record(elapsed);
    }

    /// Count one completed frame.
    pub fn frame(&mut self) {
        self.frames += 1;
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn get(&self, phase: &str) -> Option<&PhaseStats> {
        self.phases.get(phase)
    }

    /// Phases ordered by total time, most expensive first.
    pub fn by_total_time(&self) -> Vec<(&'static str, &PhaseStats)> {
        let mut phases: Vec<_> = self.phases.iter().map(|(name, stats)| (*name, stats)).collect();
        phases.sort_by(|a, b| b.1.total_time.cmp(&a.1.total_time));
        phases
    }

    pub fn log_summary(&self) {
        log::info!("phase profile over {} frames", self.frames);
        for (name, stats) in self.by_total_time() {
            log::info!(
                "  {:<28} total {:>10.3?}  avg {:>10.3?}  min {:>10.3?}  max {:>10.3?}  calls {}",
                name,
                stats.total_time,
                stats.avg_time(),
                stats.min_time.unwrap_or_default(),
                stats.max_time.unwrap_or_default(),
                stats.call_count
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_records_calls() {
        let mut profiler = PhaseProfiler::new();
        let value = profiler.time("physics", || 41 + 1);
        profiler.time("physics", || ());
        profiler.time("commit", || ());
        profiler.frame();

        assert_eq!(value, 42);
        assert_eq!(profiler.get("physics").unwrap().call_count, 2);
        assert_eq!(profiler.get("commit").unwrap().call_count, 1);
        assert!(profiler.get("missing").is_none());
        assert_eq!(profiler.by_total_time().len(), 2);
        assert_eq!(profiler.frames(), 1);
    }
}
