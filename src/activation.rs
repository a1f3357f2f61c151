use ndarray::Array1;

/// Activation functions used by the two-layer classifier
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Activation {
    ReLU,
    Softmax,
}

impl Activation {
    /// Applies the activation function elementwise (ReLU) or over the whole
    /// vector (softmax)
    pub fn apply(&self, u: &Array1<f64>) -> Array1<f64> {
        match self {
            Activation::ReLU => u.mapv(|x| x.max(0.0)),
            Activation::Softmax => {
                // Subtract the max before exponentiating to prevent overflow
                let max = u.fold(f64::NEG_INFINITY, |m, &x| m.max(x));
                let exps = u.mapv(|x| (x - max).exp());
                let sum = exps.sum();
                exps / sum
            }
        }
    }

    /// Derivative with respect to the pre-activation. Only defined for ReLU;
    /// the softmax derivative is folded into the output delta and never
    /// evaluated on its own.
    pub fn derivative(&self, u: &Array1<f64>) -> Array1<f64> {
        match self {
            Activation::ReLU => u.mapv(|x| if x > 0.0 { 1.0 } else { 0.0 }),
            Activation::Softmax => {
                unreachable!("softmax delta is computed directly from the probabilities")
            }
        }
    }
}
