//! Per-tick CPU budget and global control level, as reported by the host.

use serde::{Deserialize, Serialize};

pub const CPU_BUCKET_MAX: f64 = 10_000.0;
/// Charged for every action the host accepts.
pub const INTENT_CPU_COST: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CpuBudget {
    /// Assigned CPU per tick.
    pub limit:      f64,
    /// Hard ceiling for the current tick (limit plus what the bucket allows).
    pub tick_limit: f64,
    pub bucket:     f64,
    /// CPU spent since the start of the current tick.
    pub used:       f64,
}

impl CpuBudget {
    pub fn new(limit: f64, tick_limit: f64, bucket: f64) -> Self {
        Self { limit, tick_limit, bucket: bucket.clamp(0.0, CPU_BUCKET_MAX), used: 0.0 }
    }

    pub fn get_used(&self) -> f64 {
        self.used
    }

    pub fn remaining(&self) -> f64 {
        (self.tick_limit - self.used).max(0.0)
    }

    pub fn is_exhausted(&self) -> bool {
        self.used >= self.tick_limit
    }

    pub fn charge(&mut self, amount: f64) {
        self.used += amount;
    }

    /// Close the tick: unused CPU flows into the bucket, overuse drains it.
    pub fn settle(&mut self) {
        self.bucket = (self.bucket + self.limit - self.used).clamp(0.0, CPU_BUCKET_MAX);
        self.used = 0.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalControlLevel {
    pub level:          u32,
    pub progress:       u64,
    pub progress_total: u64,
}

impl GlobalControlLevel {
    pub const POW: f64 = 2.4;
    pub const MULTIPLY: f64 = 1_000_000.0;

    /// Levels start at 1.
    pub fn new(level: u32) -> Self {
        let level = level.max(1);
        Self { level, progress: 0, progress_total: Self::total_for(level) }
    }

    fn total_for(level: u32) -> u64 {
        ((level as f64).powf(Self::POW) * Self::MULTIPLY) as u64
    }

    /// Add upgrade progress, rolling over into new levels.
    pub fn add_progress(&mut self, amount: u64) {
        self.progress += amount;
        while self.progress >= self.progress_total {
            self.progress -= self.progress_total;
            self.level += 1;
            self.progress_total = Self::total_for(self.level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_collects_unused_cpu_and_is_capped() {
        let mut cpu = CpuBudget::new(20.0, 500.0, 9_995.0);
        cpu.charge(5.0);
        cpu.settle();
        assert_eq!(cpu.bucket, CPU_BUCKET_MAX);
        assert_eq!(cpu.get_used(), 0.0);

        cpu.charge(30.0);
        cpu.settle();
        assert_eq!(cpu.bucket, CPU_BUCKET_MAX - 10.0);
    }

    #[test]
    fn gcl_rolls_over() {
        let mut gcl = GlobalControlLevel::new(1);
        assert_eq!(gcl.progress_total, 1_000_000);
        gcl.add_progress(1_000_010);
        assert_eq!(gcl.level, 2);
        assert_eq!(gcl.progress, 10);
    }
}
