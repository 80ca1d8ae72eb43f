use serde::Serialize;

/// A jitter value that beat the previous maximum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NewMaxEver {
    /// Jitter in microseconds
    pub value_us: u64,
    /// Tick timestamp at the start of the offending period
    pub at_ticks: u64,
}

/// Statistics of one filled timestamp buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CycleStats {
    /// Mean trigger period
    pub cycle_us: u64,
    /// Root mean square deviation from the mean period
    pub jitter_mean_us: u64,
    /// Largest deviation from the mean period
    pub jitter_max_us: u64,
    /// Set when the buffer raised the max ever
    pub new_max_ever: Option<NewMaxEver>,
}

/// Analyze a buffer of tick timestamps
///
/// `max_ever` is the max-ever jitter in microseconds before this buffer.
/// The running maximum deviation is compared against it after every period,
/// so the reported time is that of the first period reaching the new value.
/// Buffers shorter than two timestamps yield all-zero statistics.
pub fn analyze(timestamps: &[u64], cps: u64, max_ever: u64) -> CycleStats {
    if timestamps.len() < 2 {
        return CycleStats {
            cycle_us: 0,
            jitter_mean_us: 0,
            jitter_max_us: 0,
            new_max_ever: None,
        };
    }

    let periods: Vec<u64> = timestamps
        .windows(2)
        .map(|pair| pair[1].saturating_sub(pair[0]))
        .collect();
    let count = periods.len() as u64;

    let cycle = periods.iter().map(|&p| u128::from(p)).sum::<u128>() / u128::from(count);
    let cycle = u64::try_from(cycle).unwrap_or(u64::MAX);

    let scale = 1e6 / cps.max(1) as f64;
    let mut max_ever = max_ever;
    let mut new_max_ever = None;
    let mut max_dev = 0u64;
    let mut square_sum = 0u128;

    for (i, &period) in periods.iter().enumerate() {
        let dev = period.abs_diff(cycle);
        max_dev = max_dev.max(dev);

        let max_dev_us = (max_dev as f64 * scale) as u64;
        if max_dev_us > max_ever {
            max_ever = max_dev_us;
            new_max_ever = Some(NewMaxEver {
                value_us: max_dev_us,
                at_ticks: timestamps[i],
            });
        }

        square_sum += u128::from(dev) * u128::from(dev);
    }

    let mean_square = (square_sum / u128::from(count)) as f64;

    CycleStats {
        cycle_us: (cycle as f64 * scale) as u64,
        jitter_mean_us: (mean_square.sqrt() * scale) as u64,
        jitter_max_us: (max_dev as f64 * scale) as u64,
        new_max_ever,
    }
}
