use serde::{Deserialize, Serialize};

/// One (depth, resistance) reading. A NaN resistance marks a gap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub depth: f64,
    pub resistance: f64,
}

impl Sample {
    pub fn new(depth: f64, resistance: f64) -> Self {
        Self { depth, resistance }
    }

    pub fn is_gap(&self) -> bool {
        !self.resistance.is_finite()
    }
}

/// A single microdrilling measurement along one direction into the stem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    pub label: String,
    pub angle_deg: f64,
    /// Radial distance of the insertion point from the stem center. `None`
    /// means the drill entered on the stem surface.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insertion_offset: Option<f64>,
    pub samples: Vec<Sample>,
}

impl Scan {
    pub fn new(label: impl Into<String>, angle_deg: f64, samples: Vec<Sample>) -> Self {
        Self {
            label: label.into(),
            angle_deg,
            insertion_offset: None,
            samples,
        }
    }

    /// Builds a scan from parallel depth and resistance columns.
    pub fn from_columns(
        label: impl Into<String>,
        angle_deg: f64,
        depths: &[f64],
        resistances: &[f64],
    ) -> Self {
        let samples = depths
            .iter()
            .zip(resistances)
            .map(|(&depth, &resistance)| Sample::new(depth, resistance))
            .collect();
        Self::new(label, angle_deg, samples)
    }

    pub fn with_insertion_offset(mut self, offset: f64) -> Self {
        self.insertion_offset = Some(offset);
        self
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn max_depth(&self) -> Option<f64> {
        self.samples.last().map(|sample| sample.depth)
    }

    pub fn depths(&self) -> Vec<f64> {
        self.samples.iter().map(|sample| sample.depth).collect()
    }

    pub fn resistances(&self) -> Vec<f64> {
        self.samples.iter().map(|sample| sample.resistance).collect()
    }

    /// Index of the first sample whose depth is lower than its predecessor.
    pub fn first_depth_regression(&self) -> Option<usize> {
        self.samples
            .windows(2)
            .position(|pair| !(pair[1].depth >= pair[0].depth))
            .map(|idx| idx + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_regression_is_located() {
        let scan = Scan::from_columns("s", 0.0, &[0.0, 1.0, 1.0, 0.5], &[1.0; 4]);
        assert_eq!(scan.first_depth_regression(), Some(3));
        let ordered = Scan::from_columns("s", 0.0, &[0.0, 1.0, 2.0], &[1.0; 3]);
        assert_eq!(ordered.first_depth_regression(), None);
    }

    #[test]
    fn gaps_are_non_finite_resistances() {
        assert!(Sample::new(0.0, f64::NAN).is_gap());
        assert!(!Sample::new(0.0, 120.0).is_gap());
    }
}
