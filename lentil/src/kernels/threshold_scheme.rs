use crate::error::{KernelError, Result};
use serde::Serialize;
use serde_json::Value;

/// How a cell's edges to neighbours that lie in its past are treated
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "scheme", rename_all = "lowercase")]
pub enum ThresholdScheme {
    /// Remove edges to past neighbours, except for the
    /// `ceil(frac_to_keep * k)` most strongly connected ones
    Hard { frac_to_keep: f64 },
    /// Down-weight edges to past neighbours by a generalized logistic
    /// function of the pseudotime difference
    Soft { b: f64, nu: f64 },
}

impl Default for ThresholdScheme {
    fn default() -> Self {
        Self::hard()
    }
}

impl ThresholdScheme {
    pub fn hard() -> Self {
        ThresholdScheme::Hard { frac_to_keep: 0.3 }
    }

    pub fn soft() -> Self {
        ThresholdScheme::Soft { b: 10.0, nu: 0.5 }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ThresholdScheme::Hard { .. } => "hard",
            ThresholdScheme::Soft { .. } => "soft",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            ThresholdScheme::Hard { frac_to_keep } => {
                if !(0.0..=1.0).contains(&frac_to_keep) {
                    return Err(KernelError::invalid_value(format!(
                        "expected `frac_to_keep` to be in [0, 1], found `{}`",
                        frac_to_keep
                    )));
                }
            }
            ThresholdScheme::Soft { b, nu } => {
                if !(nu > 0.0) {
                    return Err(KernelError::invalid_value(format!(
                        "expected `nu` to be positive, found `{}`",
                        nu
                    )));
                }
                if !b.is_finite() {
                    return Err(KernelError::invalid_value(format!(
                        "expected `b` to be finite, found `{}`",
                        b
                    )));
                }
            }
        }
        Ok(())
    }

    /// Biased edge weights of one cell.
    ///
    /// * `t_cell` - pseudotime of the cell
    /// * `t_nbrs` - pseudotime of its neighbours
    /// * `conn` - connectivities to its neighbours
    pub fn bias_row(&self, t_cell: f64, t_nbrs: &[f64], conn: &[f64]) -> Vec<f64> {
        debug_assert_eq!(t_nbrs.len(), conn.len());
        match *self {
            ThresholdScheme::Hard { frac_to_keep } => {
                let k = conn.len();
                let n_keep = ((frac_to_keep * k as f64).ceil() as usize).min(k);

                let mut order: Vec<usize> = (0..k).collect();
                order.sort_by(|&a, &b| conn[b].total_cmp(&conn[a]));

                let mut keep: Vec<bool> = t_nbrs.iter().map(|&t| t >= t_cell).collect();
                for &j in order.iter().take(n_keep) {
                    keep[j] = true;
                }

                conn.iter()
                    .zip(keep)
                    .map(|(&c, kept)| if kept { c } else { 0.0 })
                    .collect()
            }
            ThresholdScheme::Soft { b, nu } => conn
                .iter()
                .zip(t_nbrs.iter())
                .map(|(&c, &t)| {
                    if t >= t_cell {
                        c
                    } else {
                        c * 2.0 / (1.0 + (b * (t_cell - t)).exp()).powf(1.0 / nu)
                    }
                })
                .collect(),
        }
    }

    /// `{"scheme": "hard", "frac_to_keep": ...}` or
    /// `{"scheme": "soft", "b": ..., "nu": ...}`
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_hard_keeps_future_and_strongest() {
        let scheme = ThresholdScheme::Hard { frac_to_keep: 0.25 };
        let t_nbrs = [0.1, 0.9, 0.2, 0.3];
        let conn = [0.5, 0.1, 0.9, 0.4];
        // one strongest neighbour is kept: index 2
        let out = scheme.bias_row(0.5, &t_nbrs, &conn);
        assert_eq!(out, vec![0.0, 0.1, 0.9, 0.0]);

        let none_kept = ThresholdScheme::Hard { frac_to_keep: 0.0 }.bias_row(0.5, &t_nbrs, &conn);
        assert_eq!(none_kept, vec![0.0, 0.1, 0.0, 0.0]);
    }

    #[test]
    fn test_soft_weights() {
        let scheme = ThresholdScheme::Soft { b: 10.0, nu: 0.5 };
        let out = scheme.bias_row(0.5, &[0.5, 0.6, 0.4], &[1.0, 1.0, 1.0]);
        assert_eq!(out[0], 1.0);
        assert_eq!(out[1], 1.0);
        let expected = 2.0 / (1.0 + 1f64.exp()).powf(2.0);
        assert_abs_diff_eq!(out[2], expected, epsilon = 1e-12);
        assert!(out[2] < 1.0);
    }

    #[test]
    fn test_validation() {
        assert!(ThresholdScheme::Hard { frac_to_keep: 1.5 }.validate().is_err());
        assert!(ThresholdScheme::Soft { b: 1.0, nu: 0.0 }.validate().is_err());
        assert!(ThresholdScheme::default().validate().is_ok());
        let params = ThresholdScheme::soft().to_json();
        assert_eq!(params["scheme"], "soft");
        assert_eq!(params["nu"], 0.5);
        assert_eq!(ThresholdScheme::hard().to_json()["frac_to_keep"], 0.3);
    }
}
