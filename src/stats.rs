//! Summary statistics over generated grids, for reporting.

use serde::Serialize;

use crate::grid::Grid;

/// Basic distribution of a scalar grid.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GridStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl GridStats {
    /// `None` for an empty grid.
    pub fn of(grid: &Grid<f64>) -> Option<Self> {
        let (min, max) = grid.min_max()?;
        let values = grid.as_slice();
        let n = values.len() as f64;

        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        Some(Self {
            min,
            max,
            mean,
            std_dev: variance.sqrt(),
        })
    }
}

/// Equal-width histogram over `[lo, hi]`, with the cells that fell outside it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Histogram {
    pub lo: f64,
    pub hi: f64,
    pub counts: Vec<usize>,
    /// Cells below `lo` (and NaN cells)
    pub below: usize,
    /// Cells above `hi`
    pub above: usize,
}

impl Histogram {
    /// `[start, end)` of bin `i`.
    pub fn bin_range(&self, i: usize) -> (f64, f64) {
        let step = (self.hi - self.lo) / self.counts.len() as f64;
        (self.lo + i as f64 * step, self.lo + (i + 1) as f64 * step)
    }

    /// Cells outside `[lo, hi]`.
    pub fn out_of_range(&self) -> usize {
        self.below + self.above
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum::<usize>() + self.out_of_range()
    }
}

/// Bin `grid` into `bins` equal-width bins over `[lo, hi]`. `hi` itself falls in
/// the last bin. With no bins or an empty range every cell is out of range.
pub fn histogram(grid: &Grid<f64>, bins: usize, lo: f64, hi: f64) -> Histogram {
    let mut result = Histogram {
        lo,
        hi,
        counts: vec![0; bins],
        below: 0,
        above: 0,
    };

    let width = (hi - lo) / bins as f64;
    for &v in grid.as_slice() {
        if v > hi {
            result.above += 1;
        } else if bins == 0 || hi <= lo || v.is_nan() || v < lo {
            result.below += 1;
        } else {
            let bin = (((v - lo) / width) as usize).min(bins - 1);
            result.counts[bin] += 1;
        }
    }
    result
}

/// Pearson correlation of two equally sized grids. `None` if sizes differ or
/// either grid is constant.
pub fn correlation(a: &Grid<f64>, b: &Grid<f64>) -> Option<f64> {
    if a.width() != b.width() || a.height() != b.height() || a.is_empty() {
        return None;
    }
    let sa = GridStats::of(a)?;
    let sb = GridStats::of(b)?;
    if sa.std_dev == 0.0 || sb.std_dev == 0.0 {
        return None;
    }

    let n = a.len() as f64;
    let covariance = a
        .as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(x, y)| (x - sa.mean) * (y - sb.mean))
        .sum::<f64>()
        / n;
    Some(covariance / (sa.std_dev * sb.std_dev))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_of_known_values() {
        let grid = Grid::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let stats = GridStats::of(&grid).unwrap();

        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        assert_eq!(stats.mean, 2.5);
        assert!((stats.std_dev - 1.25f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_empty_grid_has_no_stats() {
        let grid: Grid<f64> = Grid::from_vec(0, 0, vec![]).unwrap();
        assert!(GridStats::of(&grid).is_none());
    }

    #[test]
    fn test_histogram_bins() {
        let grid = Grid::from_vec(5, 1, vec![0.0, 0.24, 0.5, 1.0, 1.5]).unwrap();
        let hist = histogram(&grid, 4, 0.0, 1.0);
        assert_eq!(hist.counts, vec![2, 0, 1, 1]);
        assert_eq!(hist.bin_range(1), (0.25, 0.5));
        assert!(histogram(&grid, 0, 0.0, 1.0).counts.is_empty());
    }

    #[test]
    fn test_histogram_accounts_for_every_cell() {
        let grid = Grid::from_vec(6, 1, vec![-0.2, -0.01, 0.3, 0.7, 1.02, 1.3]).unwrap();
        let hist = histogram(&grid, 2, 0.0, 1.0);

        assert_eq!(hist.counts, vec![1, 1]);
        assert_eq!(hist.below, 2);
        assert_eq!(hist.above, 2);
        assert_eq!(hist.out_of_range(), 4);
        assert_eq!(hist.total(), grid.len());
    }

    #[test]
    fn test_correlation_extremes() {
        let a = Grid::from_vec(4, 1, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let b = Grid::from_vec(4, 1, vec![2.0, 4.0, 6.0, 8.0]).unwrap();
        let c = Grid::from_vec(4, 1, vec![4.0, 3.0, 2.0, 1.0]).unwrap();

        assert!((correlation(&a, &b).unwrap() - 1.0).abs() < 1e-12);
        assert!((correlation(&a, &c).unwrap() + 1.0).abs() < 1e-12);

        let flat = Grid::new_with(4, 1, 0.5);
        assert!(correlation(&a, &flat).is_none());
    }
}
