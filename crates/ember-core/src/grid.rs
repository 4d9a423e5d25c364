use serde::{Deserialize, Serialize};

/// A 2D grid of risk scores, row-major.
/// Row 0 is the southernmost latitude, column 0 the westernmost longitude.
/// Serialized as nested rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct RiskGrid {
    data: Vec<f64>,
    width: usize,
    height: usize,
}

impl RiskGrid {
    /// Create a new grid filled with the given value.
    pub fn new(width: usize, height: usize, fill: f64) -> Self {
        Self {
            data: vec![fill; width * height],
            width,
            height,
        }
    }

    /// Wrap row-major `data`. Returns `None` when the length does not match.
    pub fn from_row_major(width: usize, height: usize, data: Vec<f64>) -> Option<Self> {
        (data.len() == width * height).then_some(Self { data, width, height })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: f64) {
        self.data[row * self.width + col] = val;
    }

    pub fn values(&self) -> &[f64] {
        &self.data
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks(self.width.max(1))
    }

    pub fn max_value(&self) -> f64 {
        self.data.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    }
}

impl From<RiskGrid> for Vec<Vec<f64>> {
    fn from(grid: RiskGrid) -> Self {
        grid.rows().map(|r| r.to_vec()).collect()
    }
}

impl TryFrom<Vec<Vec<f64>>> for RiskGrid {
    type Error = String;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != width) {
            return Err("risk grid rows must all have the same length".into());
        }
        Ok(Self {
            data: rows.into_iter().flatten().collect(),
            width,
            height,
        })
    }
}
