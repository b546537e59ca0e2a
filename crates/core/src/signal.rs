//! Scalar signal smoothing and repetition segmentation.

use serde::{Deserialize, Serialize};

/// Signals shorter than this never yield cycles.
pub const MIN_CYCLE_SIGNAL_LEN: usize = 10;

/// Smallest adaptive smoothing window.
pub const MIN_SMOOTHING_WINDOW: usize = 3;

/// One repetition: indices of two same-phase extrema in the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    pub start: usize,
    pub end: usize,
}

/// Window size used by the analyzers: `max(3, len / 20)`.
pub fn adaptive_window(len: usize) -> usize {
    MIN_SMOOTHING_WINDOW.max(len / 20)
}

/// Trailing moving average.
///
/// Index `i < window` averages `series[0..=i]`; later indices average the
/// last `window` samples. The result lags the input rather than being
/// centred. A window of 1 or less, or a series no longer than the window,
/// is returned unchanged.
pub fn moving_average(series: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 || series.len() <= window {
        return series.to_vec();
    }

    let mut prefix = Vec::with_capacity(series.len() + 1);
    prefix.push(0.0);
    for (i, v) in series.iter().enumerate() {
        prefix.push(prefix[i] + v);
    }

    (0..series.len())
        .map(|i| {
            if i >= window {
                (prefix[i + 1] - prefix[i + 1 - window]) / window as f64
            } else {
                prefix[i + 1] / (i + 1) as f64
            }
        })
        .collect()
}

/// Indices of strict local maxima and minima, in order.
///
/// Plateaus are not extrema: a sample must differ from both neighbours.
pub fn find_extrema(signal: &[f64]) -> Vec<usize> {
    if signal.len() < 3 {
        return Vec::new();
    }
    (1..signal.len() - 1)
        .filter(|&i| {
            let (prev, cur, next) = (signal[i - 1], signal[i], signal[i + 1]);
            (prev < cur && cur > next) || (prev > cur && cur < next)
        })
        .collect()
}

/// Segment a smoothed signal into repetitions.
///
/// Each cycle spans extrema `k` and `k + 2` (one full oscillation), for
/// `k = 0, 2, 4, …`. Returns nothing for signals shorter than
/// [`MIN_CYCLE_SIGNAL_LEN`] or with fewer than three extrema.
pub fn detect_cycles(signal: &[f64]) -> Vec<Cycle> {
    if signal.len() < MIN_CYCLE_SIGNAL_LEN {
        return Vec::new();
    }
    let extrema = find_extrema(signal);
    if extrema.len() < 3 {
        return Vec::new();
    }
    (0..extrema.len() - 2)
        .step_by(2)
        .map(|k| Cycle {
            start: extrema[k],
            end: extrema[k + 2],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-12, "{a:?} != {b:?}");
        }
    }

    // -- moving_average -------------------------------------------------------

    #[test]
    fn window_one_is_identity() {
        let s = [0.3, 0.1, 0.9, 0.4];
        assert_eq!(moving_average(&s, 1), s.to_vec());
    }

    #[test]
    fn short_series_is_identity() {
        let s = [1.0, 2.0, 3.0];
        assert_eq!(moving_average(&s, 3), s.to_vec());
    }

    #[test]
    fn trailing_average_of_ramp() {
        approx(
            &moving_average(&[1.0, 2.0, 3.0, 4.0, 5.0], 3),
            &[1.0, 1.5, 2.0, 3.0, 4.0],
        );
    }

    #[test]
    fn adaptive_window_floor() {
        assert_eq!(adaptive_window(0), 3);
        assert_eq!(adaptive_window(59), 3);
        assert_eq!(adaptive_window(100), 5);
    }

    // -- detect_cycles --------------------------------------------------------

    #[test]
    fn short_signal_has_no_cycles() {
        let s: Vec<f64> = (0..9).map(|i| if i % 2 == 0 { 0.0 } else { 1.0 }).collect();
        assert!(detect_cycles(&s).is_empty());
    }

    #[test]
    fn plateaus_are_not_extrema() {
        assert!(find_extrema(&[0.0, 1.0, 1.0, 0.0]).is_empty());
    }

    #[test]
    fn too_few_extrema() {
        let s = [0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        assert_eq!(find_extrema(&s), vec![1]);
        assert!(detect_cycles(&s).is_empty());
    }

    #[test]
    fn alternating_signal_pairs_same_phase_extrema() {
        // Zig-zag of length 12 has extrema at 1..=10 (10 of them).
        let s: Vec<f64> = (0..12).map(|i| if i % 2 == 0 { 0.0 } else { 1.0 }).collect();
        let extrema = find_extrema(&s);
        assert_eq!(extrema.len(), 10);

        let cycles = detect_cycles(&s);
        assert_eq!(cycles.len(), (extrema.len() - 1) / 2);
        assert_eq!(cycles[0], Cycle { start: 1, end: 3 });
        assert_eq!(cycles[1], Cycle { start: 3, end: 5 });
        for pair in cycles.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn odd_extrema_count() {
        // Three peaks/valleys -> exactly one cycle.
        let s = [0.0, 0.0, 1.0, 0.0, 0.0, -1.0, 0.0, 0.0, 1.0, 0.5, 0.5, 0.5];
        let extrema = find_extrema(&s);
        assert_eq!(extrema, vec![2, 5, 8]);
        assert_eq!(detect_cycles(&s), vec![Cycle { start: 2, end: 8 }]);
    }

    #[test]
    fn sine_wave_cycles() {
        let s: Vec<f64> = (0..100).map(|i| (i as f64 * 0.3).sin()).collect();
        let extrema = find_extrema(&s);
        let cycles = detect_cycles(&s);
        assert!(extrema.len() >= 3);
        assert_eq!(cycles.len(), (extrema.len() - 1) / 2);
    }
}
