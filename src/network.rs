use std::path::Path;

use log::info;
use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::activation::Activation;
use crate::config::TrainConfig;
use crate::dataset::Sample;
use crate::error::{Error, Result};
use crate::layer::{Layer, LayerPass};
use crate::loss::cross_entropy;
use crate::snapshot::Snapshot;
use crate::utils::argmax;

/// Records from one forward pass through both layers. Produced by
/// `forward_train`, consumed by `backward`; nothing is cached on the
/// network itself.
#[derive(Debug, Clone)]
pub struct ForwardPass {
    pub l1: LayerPass,
    pub l2: LayerPass,
}

impl ForwardPass {
    pub fn probabilities(&self) -> &Array1<f64> {
        &self.l2.activation
    }
}

/// Per-sample (or batch-accumulated) gradients for both layers
#[derive(Debug, Clone)]
pub struct Gradients {
    pub w1: Array2<f64>,
    pub b1: Array1<f64>,
    pub w2: Array2<f64>,
    pub b2: Array1<f64>,
}

/// Result of a finite-difference check of the layer-1 gradients
#[derive(Debug, Clone, Copy)]
pub struct GradientCheck {
    /// Largest relative error over the layer-1 weight gradients
    pub max_weight_error: f64,
    /// Largest relative error over the layer-1 bias gradients
    pub max_bias_error: f64,
    /// Components compared (those where either estimate exceeded eps)
    pub checked: usize,
}

/// Two-layer classifier: input → hidden with ReLU, hidden → output with
/// softmax.
#[derive(Debug, Clone)]
pub struct Network {
    pub l1: Layer,
    pub l2: Layer,
}

impl Network {
    /// Fresh network with Gaussian weights and zero biases.
    pub fn fresh<R: Rng + ?Sized>(inputs: usize, hidden: usize, outputs: usize, rng: &mut R) -> Self {
        Network {
            l1: Layer::new(inputs, hidden, rng),
            l2: Layer::new(hidden, outputs, rng),
        }
    }

    /// Network restored from a snapshot written by `save`. Forward and
    /// backward behavior matches the saved network exactly; momentum and
    /// dropout state restart at zero/disabled.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let (l1, l2) = Snapshot::load(path)?.into_layers()?;
        Ok(Network { l1, l2 })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        Snapshot::capture(&self.l1, &self.l2).save(path)
    }

    pub fn classes(&self) -> usize {
        self.l2.neurons()
    }

    /// Evaluation-time forward pass: output probabilities for a feature
    /// vector. Dropout is never applied here.
    pub fn forward(&self, features: &Array1<f64>) -> Array1<f64> {
        self.eval_pass(features).l2.activation
    }

    fn eval_pass(&self, features: &Array1<f64>) -> ForwardPass {
        let l1 = self.l1.forward(features, Activation::ReLU);
        let l2 = self.l2.forward(&l1.activation, Activation::Softmax);
        ForwardPass { l1, l2 }
    }

    /// Training-time forward pass. Each call resamples any configured
    /// dropout masks, so every sample in a batch gets its own masks.
    pub fn forward_train<R: Rng + ?Sized>(&self, features: &Array1<f64>, rng: &mut R) -> ForwardPass {
        let l1 = self.l1.forward_train(features, Activation::ReLU, rng);
        let l2 = self.l2.forward_train(&l1.activation, Activation::Softmax, rng);
        ForwardPass { l1, l2 }
    }

    /// Gradients for both layers from one forward pass. The output delta is
    /// probabilities − one-hot(label); it propagates back through layer 2's
    /// weights and ReLU's derivative at layer 1's pre-activation.
    pub fn backward(&self, pass: &ForwardPass, label: usize) -> Result<Gradients> {
        let classes = self.classes();
        if label >= classes {
            return Err(Error::InvalidLabel { label, classes });
        }

        let mut target: Array1<f64> = Array1::zeros(classes);
        target[label] = 1.0;

        let delta2 = pass.probabilities() - &target;
        let (w2, b2) = self.l2.gradient(&delta2, &pass.l2);
        let delta1 = self
            .l2
            .backward(&delta2, &pass.l1.preactivation, Activation::ReLU, &pass.l2);
        let (w1, b1) = self.l1.gradient(&delta1, &pass.l1);

        Ok(Gradients { w1, b1, w2, b2 })
    }

    /// Accuracy and mean loss over a dataset, without touching any
    /// parameter or momentum state.
    pub fn evaluate(&self, data: &[Sample]) -> Result<(f64, f64)> {
        if data.is_empty() {
            return Err(Error::InvalidConfig("evaluation set is empty".into()));
        }
        let mut correct = 0usize;
        let mut total_loss = 0.0;
        for sample in data {
            let probs = self.forward(&sample.features);
            total_loss += cross_entropy(&probs, sample.label)?;
            if argmax(&probs) == sample.label {
                correct += 1;
            }
        }
        let n = data.len() as f64;
        Ok((correct as f64 / n, total_loss / n))
    }

    /// Full sorted (probability, class) list for a feature vector,
    /// descending by probability; ties break by ascending class index.
    /// Callers keep the top-k they need.
    pub fn predict(&self, features: &Array1<f64>) -> Vec<(f64, usize)> {
        let probs = self.forward(features);
        let mut results: Vec<(f64, usize)> = probs.iter().cloned().zip(0..probs.len()).collect();
        results.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        results
    }

    /// One mini-batch step: accumulates per-sample gradients, averages them
    /// over the batch, and applies a single momentum update per layer.
    /// Returns the mean loss over the batch.
    pub fn train_batch<R: Rng + ?Sized>(
        &mut self,
        batch: &[Sample],
        lr: f64,
        weight_decay: f64,
        momentum: f64,
        drop_keep_input: f64,
        drop_keep_hidden: f64,
        rng: &mut R,
    ) -> Result<f64> {
        if batch.is_empty() {
            return Err(Error::InvalidConfig("batch is empty".into()));
        }
        self.configure_dropout(drop_keep_input, drop_keep_hidden);

        let mut sum_w1: Array2<f64> = Array2::zeros((self.l1.neurons(), self.l1.inputs()));
        let mut sum_b1: Array1<f64> = Array1::zeros(self.l1.neurons());
        let mut sum_w2: Array2<f64> = Array2::zeros((self.l2.neurons(), self.l2.inputs()));
        let mut sum_b2: Array1<f64> = Array1::zeros(self.l2.neurons());
        let mut total_loss = 0.0;

        for sample in batch {
            let pass = self.forward_train(&sample.features, rng);
            total_loss += cross_entropy(pass.probabilities(), sample.label)?;
            let grads = self.backward(&pass, sample.label)?;
            sum_w1 += &grads.w1;
            sum_b1 += &grads.b1;
            sum_w2 += &grads.w2;
            sum_b2 += &grads.b2;
        }

        let n = batch.len() as f64;
        self.l1
            .update_params(&(sum_w1 / n), &(sum_b1 / n), lr, weight_decay, momentum);
        self.l2
            .update_params(&(sum_w2 / n), &(sum_b2 / n), lr, weight_decay, momentum);

        Ok(total_loss / n)
    }

    /// Mini-batch training loop: shuffles the dataset each epoch, walks it
    /// in consecutive batches (remainder dropped), and logs iteration-tagged
    /// loss, accuracy, and learning-rate records at the configured cadences.
    /// A baseline evaluation runs before the first batch.
    pub fn train<R: Rng + ?Sized>(
        &mut self,
        data: &mut [Sample],
        eval_data: &[Sample],
        cfg: &TrainConfig,
        rng: &mut R,
    ) -> Result<()> {
        cfg.validate(data.len())?;

        info!(
            "net: [{}, {}, {}]",
            self.l1.inputs(),
            self.l1.neurons(),
            self.l2.neurons()
        );
        info!("training {} samples", data.len());
        info!("epochs: {}", cfg.epochs);
        info!("batch size: {}", cfg.batch_size);
        info!("base learning rate: {}", cfg.base_lr);
        info!("lr decay factor: {}", cfg.lr_decay_factor);
        info!("lr decay interval: {}", cfg.lr_decay_interval);
        info!("weight decay: {}", cfg.weight_decay);
        info!("momentum: {}", cfg.momentum);
        info!("dropout keep (input layer): {}", cfg.drop_keep_input);
        info!("dropout keep (hidden layer): {}", cfg.drop_keep_hidden);

        let mut lr = cfg.base_lr;
        let mut iteration = cfg.resume_iteration;

        let (accuracy, test_loss) = self.evaluate(eval_data)?;
        info!("iteration {} accuracy: {:.6}", iteration, accuracy);
        info!("iteration {} test_loss: {:.6}", iteration, test_loss);
        info!("iteration {} lr: {:.6}", iteration, lr);

        for _epoch in 0..cfg.epochs {
            data.shuffle(rng);
            for batch in data.chunks_exact(cfg.batch_size) {
                let loss = self.train_batch(
                    batch,
                    lr,
                    cfg.weight_decay,
                    cfg.momentum,
                    cfg.drop_keep_input,
                    cfg.drop_keep_hidden,
                    rng,
                )?;

                if iteration % cfg.log_interval == 0 {
                    info!("iteration {} loss: {:.6}", iteration, loss);
                }
                if (iteration + 1) % cfg.eval_interval == 0 {
                    let (accuracy, test_loss) = self.evaluate(eval_data)?;
                    info!("iteration {} accuracy: {:.6}", iteration + 1, accuracy);
                    info!("iteration {} test_loss: {:.6}", iteration + 1, test_loss);
                }
                if cfg.lr_decay_interval > 0 && (iteration + 1) % cfg.lr_decay_interval == 0 {
                    lr *= cfg.lr_decay_factor;
                    info!("iteration {} lr: {:.6}", iteration + 1, lr);
                }
                iteration += 1;
            }
        }

        info!("optimization done");
        Ok(())
    }

    /// Compares layer-1 analytic gradients against symmetric finite
    /// differences for a single sample. Dropout is disabled for the check
    /// (the loss must be deterministic) and every perturbed parameter is
    /// restored afterwards. Components where both estimates fall below eps
    /// are skipped.
    pub fn check_gradient(&mut self, sample: &Sample, eps: f64) -> Result<GradientCheck> {
        self.l1.clear_dropout();
        self.l2.clear_dropout();

        let pass = self.eval_pass(&sample.features);
        let grads = self.backward(&pass, sample.label)?;

        let mut max_weight_error = 0.0f64;
        let mut max_bias_error = 0.0f64;
        let mut checked = 0usize;

        for i in 0..self.l1.weights.nrows() {
            for j in 0..self.l1.weights.ncols() {
                let original = self.l1.weights[[i, j]];
                self.l1.weights[[i, j]] = original + eps;
                let loss_plus = self.sample_loss(sample)?;
                self.l1.weights[[i, j]] = original - eps;
                let loss_minus = self.sample_loss(sample)?;
                self.l1.weights[[i, j]] = original;

                let numeric = (loss_plus - loss_minus) / (2.0 * eps);
                let analytic = grads.w1[[i, j]];
                if let Some(error) = relative_error(analytic, numeric, eps) {
                    max_weight_error = max_weight_error.max(error);
                    checked += 1;
                }
            }
        }

        for i in 0..self.l1.bias.len() {
            let original = self.l1.bias[i];
            self.l1.bias[i] = original + eps;
            let loss_plus = self.sample_loss(sample)?;
            self.l1.bias[i] = original - eps;
            let loss_minus = self.sample_loss(sample)?;
            self.l1.bias[i] = original;

            let numeric = (loss_plus - loss_minus) / (2.0 * eps);
            let analytic = grads.b1[i];
            if let Some(error) = relative_error(analytic, numeric, eps) {
                max_bias_error = max_bias_error.max(error);
                checked += 1;
            }
        }

        Ok(GradientCheck {
            max_weight_error,
            max_bias_error,
            checked,
        })
    }

    fn sample_loss(&self, sample: &Sample) -> Result<f64> {
        let probs = self.forward(&sample.features);
        cross_entropy(&probs, sample.label)
    }

    fn configure_dropout(&mut self, drop_keep_input: f64, drop_keep_hidden: f64) {
        if drop_keep_input < 1.0 {
            self.l1.set_dropout(drop_keep_input);
        } else {
            self.l1.clear_dropout();
        }
        if drop_keep_hidden < 1.0 {
            self.l2.set_dropout(drop_keep_hidden);
        } else {
            self.l2.clear_dropout();
        }
    }
}

fn relative_error(analytic: f64, numeric: f64, eps: f64) -> Option<f64> {
    let scale = analytic.abs().max(numeric.abs());
    if scale <= eps {
        return None;
    }
    Some((analytic - numeric).abs() / scale)
}
