use serde::{Deserialize, Serialize};

/// Closed value interval used to normalize resistance readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueSpan {
    pub min: f64,
    pub max: f64,
}

impl ValueSpan {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Maps `value` into `[0, 1]`, clipping outside the span. A degenerate span
    /// maps everything to 0.
    pub fn normalize(&self, value: f64) -> f64 {
        let width = self.max - self.min;
        if width > 0.0 {
            ((value - self.min) / width).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn union(self, other: ValueSpan) -> ValueSpan {
        ValueSpan::new(self.min.min(other.min), self.max.max(other.max))
    }
}

pub struct StatsHelper;

impl StatsHelper {
    /// Extremes of the finite values, `None` when there are none.
    pub fn finite_span<I>(values: I) -> Option<ValueSpan>
    where
        I: IntoIterator<Item = f64>,
    {
        values
            .into_iter()
            .filter(|value| value.is_finite())
            .fold(None, |span: Option<ValueSpan>, value| {
                Some(match span {
                    Some(span) => span.union(ValueSpan::new(value, value)),
                    None => ValueSpan::new(value, value),
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_span_skips_gaps() {
        let span = StatsHelper::finite_span([3.0, f64::NAN, -1.0, 7.5, f64::INFINITY]).unwrap();
        assert_eq!(span, ValueSpan::new(-1.0, 7.5));
    }

    #[test]
    fn finite_span_of_only_gaps_is_none() {
        assert!(StatsHelper::finite_span([f64::NAN, f64::NAN]).is_none());
        assert!(StatsHelper::finite_span(Vec::new()).is_none());
    }

    #[test]
    fn normalize_clips_and_handles_degenerate_span() {
        let span = ValueSpan::new(100.0, 200.0);
        assert_eq!(span.normalize(150.0), 0.5);
        assert_eq!(span.normalize(50.0), 0.0);
        assert_eq!(span.normalize(250.0), 1.0);
        assert_eq!(ValueSpan::new(5.0, 5.0).normalize(5.0), 0.0);
    }
}
