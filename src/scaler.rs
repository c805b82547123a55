use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Per-column standardization: `(x - mean) / std` with population variance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit column statistics. Returns `None` for a matrix with no rows.
    pub fn fit(x: &Array2<f64>) -> Option<Self> {
        let mean = x.mean_axis(Axis(0))?;
        let std = x.std_axis(Axis(0), 0.0);
        // constant columns pass through centered but unscaled
        let scale = std
            .iter()
            .map(|&s| if s == 0.0 || !s.is_finite() { 1.0 } else { s })
            .collect();
        Some(Self {
            mean: mean.to_vec(),
            scale,
        })
    }

    pub fn width(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, x: &mut Array2<f64>) {
        for mut row in x.axis_iter_mut(Axis(0)) {
            for ((v, m), s) in row.iter_mut().zip(&self.mean).zip(&self.scale) {
                *v = (*v - m) / s;
            }
        }
    }

    pub fn transform_row(&self, row: ArrayView1<f64>) -> Vec<f64> {
        row.iter()
            .zip(&self.mean)
            .zip(&self.scale)
            .map(|((v, m), s)| (v - m) / s)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    #[test]
    fn standardizes_to_zero_mean_unit_variance() {
        let mut x = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [6.0, 60.0]];
        let scaler = StandardScaler::fit(&x).unwrap();
        scaler.transform(&mut x);

        let mean = x.mean_axis(Axis(0)).unwrap();
        let std = x.std_axis(Axis(0), 0.0);
        for j in 0..2 {
            assert!(mean[j].abs() < 1e-12);
            assert!((std[j] - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn constant_column_is_only_centered() {
        let mut x = array![[5.0], [5.0], [5.0]];
        let scaler = StandardScaler::fit(&x).unwrap();
        scaler.transform(&mut x);
        assert!(x.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn row_transform_matches_matrix_transform() {
        let mut x = array![[0.0, 4.0], [2.0, 8.0]];
        let scaler = StandardScaler::fit(&x).unwrap();
        let row = Array1::from(vec![2.0, 8.0]);
        let scaled = scaler.transform_row(row.view());
        scaler.transform(&mut x);
        assert_eq!(scaled, x.row(1).to_vec());
    }

    #[test]
    fn empty_matrix_has_no_statistics() {
        let x = Array2::<f64>::zeros((0, 3));
        assert!(StandardScaler::fit(&x).is_none());
    }
}
