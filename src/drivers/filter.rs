use heapless::Deque;

/// Largest window any [`MovingAverage`] can be configured with.
pub const MAX_WINDOW: usize = 32;

/// Sliding-window mean over raw load-cell counts.
///
/// The newest sample sits at the front of the window; once the window holds
/// `capacity` samples, each new sample evicts exactly the oldest one.
pub struct MovingAverage {
    window: Deque<i32, MAX_WINDOW>,
    capacity: usize,
}

impl MovingAverage {
    /// `capacity` is clamped to `1..=MAX_WINDOW`.
    pub fn new(capacity: usize) -> Self {
        Self {
            window: Deque::new(),
            capacity: capacity.clamp(1, MAX_WINDOW),
        }
    }

    /// Fold one raw reading in and return the smoothed value,
    /// `ceil(sum / len)` over the current window.
    pub fn filter(&mut self, input: i32) -> i32 {
        while self.window.len() >= self.capacity {
            self.window.pop_back();
        }
        // Cannot fail: the loop above leaves at least one free slot.
        let _ = self.window.push_front(input);
        self.value()
    }

    /// Current smoothed value; 0 for an empty window.
    pub fn value(&self) -> i32 {
        let len = self.window.len() as i64;
        if len == 0 {
            return 0;
        }
        let sum: i64 = self.window.iter().map(|&s| s as i64).sum();
        ceil_div(sum, len) as i32
    }

    /// Most recent sample first.
    pub fn samples(&self) -> impl Iterator<Item = &i32> {
        self.window.iter()
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }
}

/// Integer ceiling division for a positive divisor.
fn ceil_div(num: i64, den: i64) -> i64 {
    let q = num / den;
    // Truncation already rounds negative quotients up.
    if num % den != 0 && num > 0 {
        q + 1
    } else {
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_window_reads_zero() {
        let avg = MovingAverage::new(10);
        assert_eq!(avg.value(), 0);
        assert!(avg.is_empty());
    }

    #[test]
    fn partial_window_averages_what_it_has() {
        let mut avg = MovingAverage::new(10);
        assert_eq!(avg.filter(4), 4);
        assert_eq!(avg.filter(5), 5); // ceil(4.5)
        assert_eq!(avg.len(), 2);
    }

    #[test]
    fn window_never_exceeds_capacity() {
        let capacity = 15;
        let mut avg = MovingAverage::new(capacity);
        for k in 0..40 {
            avg.filter(k);
            assert_eq!(avg.len(), (k as usize + 1).min(capacity));
        }
    }

    #[test]
    fn output_is_ceiling_mean_of_last_capacity_samples() {
        let capacity = 4;
        let mut avg = MovingAverage::new(capacity);
        let inputs = [100, -3, 7, 12, 9, 10, 11, 2];
        let mut out = 0;
        for &x in &inputs {
            out = avg.filter(x);
        }
        // last four: 9 + 10 + 11 + 2 = 32 → 8
        assert_eq!(out, 8);

        avg.filter(1);
        // 10 + 11 + 2 + 1 = 24 → 6
        assert_eq!(avg.value(), 6);
        avg.filter(0);
        // 11 + 2 + 1 + 0 = 14 → ceil(3.5) = 4
        assert_eq!(avg.value(), 4);
    }

    #[test]
    fn newest_sample_is_first_and_oldest_is_evicted() {
        let mut avg = MovingAverage::new(3);
        for x in [1, 2, 3, 4] {
            avg.filter(x);
        }
        let mut it = avg.samples();
        assert_eq!(it.next(), Some(&4));
        assert_eq!(it.next(), Some(&3));
        assert_eq!(it.next(), Some(&2));
        assert_eq!(it.next(), None);
    }

    #[test]
    fn negative_means_round_towards_positive_infinity() {
        let mut avg = MovingAverage::new(2);
        avg.filter(-4);
        assert_eq!(avg.filter(-3), -3); // ceil(-3.5)
        avg.filter(-3);
        assert_eq!(avg.value(), -3);
    }

    #[test]
    fn large_counts_do_not_overflow() {
        let mut avg = MovingAverage::new(MAX_WINDOW);
        for _ in 0..MAX_WINDOW {
            avg.filter(8_000_000);
        }
        assert_eq!(avg.value(), 8_000_000);
    }

    #[test]
    fn capacity_is_clamped() {
        assert_eq!(MovingAverage::new(0).capacity(), 1);
        assert_eq!(MovingAverage::new(1000).capacity(), MAX_WINDOW);
    }
}
