use anyhow::Context;
use rand::{rngs::StdRng, Rng, SeedableRng};
use resicore::loader::save_scan;
use resicore::prelude::Scan;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for generating synthetic drill profiles around one stem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub count: usize,
    pub radius: f64,
    pub spacing: f64,
    /// Resistance of sound wood.
    pub baseline: f64,
    /// Size of the resistance drop at the decay pocket.
    pub decay_drop: f64,
    /// Distance of the decay pocket center from the stem center.
    pub decay_offset: f64,
    pub decay_width: f64,
    pub noise: f64,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            count: 6,
            radius: 150.0,
            spacing: 1.0,
            baseline: 150.0,
            decay_drop: 90.0,
            decay_offset: 40.0,
            decay_width: 35.0,
            noise: 6.0,
            seed: 0,
        }
    }
}

impl GeneratorConfig {
    fn normalized_count(&self) -> usize {
        self.count.max(1)
    }

    /// Drilling stops short of the far bark so no sample overflows.
    fn drill_length(&self) -> f64 {
        self.radius * 1.9
    }
}

/// Angle of scan `index`, spread evenly over the full circle.
fn scan_angle(index: usize, count: usize) -> f64 {
    index as f64 * 360.0 / count as f64
}

pub fn build_scans(config: &GeneratorConfig) -> anyhow::Result<Vec<Scan>> {
    if !(config.radius > 0.0) || !(config.spacing > 0.0) {
        anyhow::bail!("generator radius and spacing must be positive");
    }
    let count = config.normalized_count();
    let steps = (config.drill_length() / config.spacing).floor() as usize;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut scans = Vec::with_capacity(count);
    for index in 0..count {
        let angle = scan_angle(index, count).to_radians();
        // Perpendicular distance from the drill line to the pocket, which lies toward 0°.
        let closest = config.decay_offset * angle.sin().abs();
        let mut depths = Vec::with_capacity(steps + 1);
        let mut values = Vec::with_capacity(steps + 1);
        for step in 0..=steps {
            let depth = step as f64 * config.spacing;
            let along = config.radius - depth - config.decay_offset * angle.cos();
            let distance = (along * along + closest * closest).sqrt();
            let pocket = (-(distance * distance) / (2.0 * config.decay_width.powi(2))).exp();
            let jitter = if config.noise > 0.0 {
                rng.gen_range(-config.noise..config.noise)
            } else {
                0.0
            };
            depths.push(depth);
            values.push((config.baseline - config.decay_drop * pocket + jitter).max(0.0));
        }
        scans.push(Scan::from_columns(
            format!("syn-{index}"),
            scan_angle(index, count),
            &depths,
            &values,
        ));
    }
    Ok(scans)
}

/// Writes `syn-<i>@<angle>.dpa` files into `dir`, creating it if needed.
pub fn write_synthetic_scans(dir: &Path, config: &GeneratorConfig) -> anyhow::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let mut paths = Vec::new();
    for scan in build_scans(config)? {
        let path = dir.join(format!("{}@{}.dpa", scan.label, scan.angle_deg));
        save_scan(&scan, &path).with_context(|| format!("writing {}", path.display()))?;
        paths.push(path);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use resicore::loader::read_scan;
    use tempfile::tempdir;

    #[test]
    fn generator_spreads_scans_over_the_circle() {
        let scans = build_scans(&GeneratorConfig::default()).unwrap();
        let angles: Vec<f64> = scans.iter().map(|scan| scan.angle_deg).collect();
        assert_eq!(angles, vec![0.0, 60.0, 120.0, 180.0, 240.0, 300.0]);
        assert!(scans.iter().all(|scan| scan.max_depth().unwrap() < 300.0));
    }

    #[test]
    fn generator_is_seeded() {
        let config = GeneratorConfig {
            seed: 13,
            ..GeneratorConfig::default()
        };
        let a = build_scans(&config).unwrap();
        let b = build_scans(&config).unwrap();
        assert_eq!(a[2].resistances(), b[2].resistances());

        let other = build_scans(&GeneratorConfig { seed: 14, ..config }).unwrap();
        assert_ne!(a[2].resistances(), other[2].resistances());
    }

    #[test]
    fn decay_pocket_lowers_resistance() {
        let config = GeneratorConfig {
            count: 1,
            noise: 0.0,
            ..GeneratorConfig::default()
        };
        let scan = &build_scans(&config).unwrap()[0];
        // The 0° path passes through the pocket at depth radius - offset.
        let at_pocket = scan.samples[110].resistance;
        let at_bark = scan.samples[0].resistance;
        assert!(at_pocket < at_bark - 50.0);
    }

    #[test]
    fn written_files_parse_back() {
        let dir = tempdir().unwrap();
        let paths = write_synthetic_scans(dir.path(), &GeneratorConfig::default()).unwrap();
        assert_eq!(paths.len(), 6);
        let scan = read_scan(&paths[1]).unwrap();
        assert_eq!(scan.label, "syn-1");
        assert_eq!(scan.angle_deg, 60.0);
    }
}
