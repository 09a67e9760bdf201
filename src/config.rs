use std::env;
use std::path::PathBuf;

/// Tunables read from the environment (and `.env` files loaded by the CLI).
#[derive(Debug, Clone, PartialEq)]
pub struct StatsConfig {
    pub kde_grid: usize,
    pub kde_min_points: usize,
    // Below this many points the wider bandwidth is used.
    pub kde_small_sample: usize,
    pub kde_bw_small: f64,
    pub kde_bw_large: f64,
    pub radar_margin: f64,
    pub cache_dir: Option<PathBuf>,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            kde_grid: 300,
            kde_min_points: 3,
            kde_small_sample: 50,
            kde_bw_small: 0.6,
            kde_bw_large: 0.3,
            radar_margin: 5.0,
            cache_dir: None,
        }
    }
}

impl StatsConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            kde_grid: env_parse::<usize>("POLO_KDE_GRID")
                .unwrap_or(d.kde_grid)
                .clamp(10, 1000),
            kde_min_points: env_parse::<usize>("POLO_KDE_MIN_POINTS")
                .unwrap_or(d.kde_min_points)
                .max(3),
            kde_small_sample: env_parse::<usize>("POLO_KDE_SMALL_SAMPLE")
                .unwrap_or(d.kde_small_sample)
                .max(1),
            kde_bw_small: env_parse::<f64>("POLO_KDE_BW_SMALL")
                .filter(|v| v.is_finite())
                .unwrap_or(d.kde_bw_small)
                .clamp(0.05, 2.0),
            kde_bw_large: env_parse::<f64>("POLO_KDE_BW_LARGE")
                .filter(|v| v.is_finite())
                .unwrap_or(d.kde_bw_large)
                .clamp(0.05, 2.0),
            radar_margin: env_parse::<f64>("POLO_RADAR_MARGIN")
                .filter(|v| v.is_finite())
                .unwrap_or(d.radar_margin)
                .clamp(0.0, 50.0),
            cache_dir: env::var("POLO_CACHE_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn bandwidth_for(&self, points: usize) -> f64 {
        if points < self.kde_small_sample {
            self.kde_bw_small
        } else {
            self.kde_bw_large
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|val| val.trim().parse::<T>().ok())
}
