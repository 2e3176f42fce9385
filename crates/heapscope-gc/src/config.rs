/// Tunables for trend estimation and leak detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendConfig {
    /// Window length (in compactions) of the "recent" base average.
    pub recent_period: u64,
    /// Window length (in compactions) of the "ancient" base average.
    pub ancient_period: u64,
    /// Spin-up damping exponent for the recent average.
    pub recent_spin_up_exponent: f64,
    /// Spin-up damping exponent for the ancient average.
    pub ancient_spin_up_exponent: f64,
    /// Consecutive base-occupancy growths that trigger a leak report.
    pub leak_growth_threshold: u32,
    /// Compactions to observe before min/max extremes are recorded, so
    /// startup churn does not pollute them.
    pub extremes_after: u64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            recent_period: 10,
            ancient_period: 120,
            recent_spin_up_exponent: 2.5,
            ancient_spin_up_exponent: 2.4,
            leak_growth_threshold: 5,
            extremes_after: 3,
        }
    }
}
