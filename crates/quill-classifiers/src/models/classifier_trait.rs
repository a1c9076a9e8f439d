use ndarray::Array2;

use crate::error::Result;
use crate::models::utils::argmax_rows;

/// Contract every statistical model behind a prediction strategy satisfies.
///
/// Labels are class indices in `0..n_classes`; the strategy layer owns the
/// mapping to author names. `predict_proba` returns one row per query and one
/// column per class, each row summing to one.
pub trait ClassifierModel: Send {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<()>;

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>>;

    /// Most likely class per row.
    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        Ok(argmax_rows(&self.predict_proba(x)?))
    }

    fn name(&self) -> &str {
        "classifier"
    }
}
