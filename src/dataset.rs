use ndarray::Array1;

/// A labeled sample: a fixed-dimension feature vector paired with a class
/// index. Immutable once built.
#[derive(Debug, Clone)]
pub struct Sample {
    pub features: Array1<f64>,
    pub label: usize,
}

impl Sample {
    pub fn new(features: Array1<f64>, label: usize) -> Self {
        Sample { features, label }
    }
}
