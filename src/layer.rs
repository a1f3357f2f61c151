use ndarray::{Array1, Array2};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::activation::Activation;
use crate::utils::outer_product;

/// Standard deviation of the zero-mean Gaussian used for weight
/// initialization. Biases start at zero.
const WEIGHT_STD_DEV: f64 = 0.1;

/// Everything one forward call through a layer produced. Backward and
/// gradient computation consume the record explicitly, so there is no
/// hidden cache tying a forward call to the next backward call.
#[derive(Debug, Clone)]
pub struct LayerPass {
    /// The vector that actually fed the affine transform: the raw input at
    /// evaluation time, the dropout-transformed input during training
    pub input: Array1<f64>,
    /// The 0/1 mask sampled for this pass, when input dropout was active
    pub mask: Option<Array1<f64>>,
    /// Pre-activation u = W·input + b
    pub preactivation: Array1<f64>,
    /// Post-activation z
    pub activation: Array1<f64>,
}

/// One affine transform: weight matrix (n_out × n_in), bias vector (n_out),
/// momentum accumulators of the same shapes, and an optional input-dropout
/// keep probability.
#[derive(Debug, Clone)]
pub struct Layer {
    pub weights: Array2<f64>,
    pub bias: Array1<f64>,
    prev_step_weights: Array2<f64>,
    prev_step_bias: Array1<f64>,
    keep_prob: Option<f64>,
}

impl Layer {
    /// Fresh layer: Gaussian weights, zero biases, zero momentum state.
    pub fn new<R: Rng + ?Sized>(inputs: usize, neurons: usize, rng: &mut R) -> Self {
        let normal = Normal::new(0.0, WEIGHT_STD_DEV).unwrap();
        let weights: Array2<f64> =
            Array2::from_shape_fn((neurons, inputs), |_| normal.sample(&mut *rng));

        Layer {
            weights,
            bias: Array1::zeros(neurons),
            prev_step_weights: Array2::zeros((neurons, inputs)),
            prev_step_bias: Array1::zeros(neurons),
            keep_prob: None,
        }
    }

    /// Layer restored from persisted parameters. Momentum restarts at zero
    /// and dropout starts disabled.
    pub fn from_params(weights: Array2<f64>, bias: Array1<f64>) -> Self {
        assert_eq!(
            weights.nrows(),
            bias.len(),
            "weight row count must equal bias length"
        );
        let shape = (weights.nrows(), weights.ncols());
        Layer {
            weights,
            prev_step_weights: Array2::zeros(shape),
            prev_step_bias: Array1::zeros(bias.len()),
            bias,
            keep_prob: None,
        }
    }

    pub fn inputs(&self) -> usize {
        self.weights.ncols()
    }

    pub fn neurons(&self) -> usize {
        self.weights.nrows()
    }

    /// Enables input dropout. The caller treats keep_prob == 1 as "dropout
    /// disabled" and never calls this in that case.
    pub fn set_dropout(&mut self, keep_prob: f64) {
        assert!(
            keep_prob > 0.0 && keep_prob < 1.0,
            "keep probability must be in (0, 1), got {}",
            keep_prob
        );
        self.keep_prob = Some(keep_prob);
    }

    pub fn clear_dropout(&mut self) {
        self.keep_prob = None;
    }

    fn affine(&self, input: &Array1<f64>) -> Array1<f64> {
        assert_eq!(
            input.len(),
            self.weights.ncols(),
            "input size does not match layer's input size"
        );
        self.weights.dot(input) + &self.bias
    }

    /// Evaluation-time forward pass. Dropout is never applied, even when
    /// configured.
    pub fn forward(&self, input: &Array1<f64>, activation: Activation) -> LayerPass {
        let u = self.affine(input);
        LayerPass {
            input: input.clone(),
            mask: None,
            activation: activation.apply(&u),
            preactivation: u,
        }
    }

    /// Training-time forward pass. When dropout is configured, samples a
    /// fresh 0/1 mask for this call and applies the inverted-dropout
    /// transform (multiply by the mask, divide by keep_prob) to the input
    /// before the affine transform.
    pub fn forward_train<R: Rng + ?Sized>(
        &self,
        input: &Array1<f64>,
        activation: Activation,
        rng: &mut R,
    ) -> LayerPass {
        let keep = match self.keep_prob {
            None => return self.forward(input, activation),
            Some(keep) => keep,
        };

        let mask: Array1<f64> = Array1::from_shape_fn(input.len(), |_| {
            if rng.random::<f64>() < keep {
                1.0
            } else {
                0.0
            }
        });
        let dropped = (input * &mask) / keep;
        let u = self.affine(&dropped);
        LayerPass {
            input: dropped,
            mask: Some(mask),
            activation: activation.apply(&u),
            preactivation: u,
        }
    }

    /// Propagates a delta through this layer to the layer below:
    /// (Wᵗ · delta) ⊙ activation'(lower preactivation). When this layer's
    /// input had dropout applied, the mask recorded in the matching forward
    /// pass is re-applied with the same scaling.
    pub fn backward(
        &self,
        delta: &Array1<f64>,
        lower_preactivation: &Array1<f64>,
        lower_activation: Activation,
        own_pass: &LayerPass,
    ) -> Array1<f64> {
        assert_eq!(
            delta.len(),
            self.weights.nrows(),
            "delta size does not match layer's output size"
        );
        let propagated =
            self.weights.t().dot(delta) * lower_activation.derivative(lower_preactivation);
        match (&own_pass.mask, self.keep_prob) {
            (Some(mask), Some(keep)) => (propagated * mask) / keep,
            _ => propagated,
        }
    }

    /// Weight and bias gradients for this layer: the outer product of the
    /// delta with the input that fed the affine transform, and the delta
    /// itself.
    pub fn gradient(&self, delta: &Array1<f64>, own_pass: &LayerPass) -> (Array2<f64>, Array1<f64>) {
        (outer_product(delta, &own_pass.input), delta.clone())
    }

    /// One momentum + weight-decay update (classical heavy-ball):
    /// step = momentum·prev_step − lr·(grad + decay·W). Decay never applies
    /// to the bias. The step becomes the new momentum accumulator.
    pub fn update_params(
        &mut self,
        weight_grad: &Array2<f64>,
        bias_grad: &Array1<f64>,
        lr: f64,
        weight_decay: f64,
        momentum: f64,
    ) {
        assert_eq!(weight_grad.shape(), self.weights.shape());
        assert_eq!(bias_grad.len(), self.bias.len());

        let step_weights =
            momentum * &self.prev_step_weights - lr * (weight_decay * &self.weights + weight_grad);
        let step_bias = -lr * bias_grad + momentum * &self.prev_step_bias;

        self.weights += &step_weights;
        self.bias += &step_bias;
        self.prev_step_weights = step_weights;
        self.prev_step_bias = step_bias;
    }
}
