//! Fixed-step shared timeline.

use contracts::TimestampMs;

/// Ordered timestamps `start, start+step, ..., end`.
///
/// Stored as an arithmetic progression; `len == (end - start) / step + 1`
/// always holds and is at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeline {
    start: TimestampMs,
    step: TimestampMs,
    len: usize,
}

impl Timeline {
    /// Build the timeline spanning `[min_ms, max_ms]`.
    ///
    /// Returns `None` if `step_ms < 1` or `max_ms < min_ms`. The last point is
    /// the largest `start + k*step` not exceeding `max_ms`.
    pub fn new(min_ms: TimestampMs, max_ms: TimestampMs, step_ms: TimestampMs) -> Option<Self> {
        if step_ms < 1 || max_ms < min_ms {
            return None;
        }
        let span = max_ms.checked_sub(min_ms)?;
        let len = usize::try_from(span / step_ms).ok()?.checked_add(1)?;
        Some(Self {
            start: min_ms,
            step: step_ms,
            len,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// A timeline always holds at least one point.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn start(&self) -> TimestampMs {
        self.start
    }

    #[inline]
    pub fn end(&self) -> TimestampMs {
        self.value(self.len - 1)
    }

    #[inline]
    pub fn step_ms(&self) -> TimestampMs {
        self.step
    }

    #[inline]
    pub fn step_seconds(&self) -> f64 {
        self.step as f64 / 1000.0
    }

    /// Timestamp at `index`. Callers must stay below `len()`.
    #[inline]
    pub fn value(&self, index: usize) -> TimestampMs {
        debug_assert!(index < self.len);
        self.start + index as TimestampMs * self.step
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<TimestampMs> {
        (index < self.len).then(|| self.value(index))
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = TimestampMs> + '_ {
        (0..self.len).map(move |i| self.value(i))
    }

    /// First index whose timestamp is `>= t`, or `len()` if none is.
    pub fn first_index_at_or_after(&self, t: TimestampMs) -> usize {
        if t <= self.start {
            return 0;
        }
        let Some(offset) = t.checked_sub(self.start) else {
            return self.len;
        };
        let idx = offset / self.step + i64::from(offset % self.step != 0);
        usize::try_from(idx).map_or(self.len, |i| i.min(self.len))
    }
}
