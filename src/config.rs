use crate::error::{Error, Result};

/// Hyperparameters for one call to `Network::train`
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Samples per parameter update
    pub batch_size: usize,

    /// Iterations between evaluation passes over the held-out set
    pub eval_interval: usize,

    /// Passes over the shuffled training set
    pub epochs: usize,

    /// Initial learning rate
    pub base_lr: f64,

    /// Iterations between learning-rate decay events; 0 disables decay
    pub lr_decay_interval: usize,

    /// Multiplicative factor applied at each decay event
    pub lr_decay_factor: f64,

    /// L2 penalty on weights (never on biases)
    pub weight_decay: f64,

    /// Classical momentum coefficient
    pub momentum: f64,

    /// Keep probability for input-layer dropout; 1.0 disables it
    pub drop_keep_input: f64,

    /// Keep probability for hidden-layer dropout; 1.0 disables it
    pub drop_keep_hidden: f64,

    /// Iterations between training-loss log lines
    pub log_interval: usize,

    /// Starting iteration counter, for logging continuity when resuming
    pub resume_iteration: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            batch_size: 100,
            eval_interval: 100,
            epochs: 1,
            base_lr: 0.1,
            lr_decay_interval: 0,
            lr_decay_factor: 1.0,
            weight_decay: 0.0005,
            momentum: 0.9,
            drop_keep_input: 1.0,
            drop_keep_hidden: 1.0,
            log_interval: 10,
            resume_iteration: 0,
        }
    }
}

impl TrainConfig {
    /// Validates the configuration against a training set of `n_samples`.
    /// Runs before the first batch; nothing is checked mid-run.
    pub fn validate(&self, n_samples: usize) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be positive".into()));
        }
        if self.batch_size > n_samples {
            return Err(Error::InvalidConfig(format!(
                "batch_size {} exceeds training set size {}",
                self.batch_size, n_samples
            )));
        }
        if self.epochs == 0 {
            return Err(Error::InvalidConfig("epochs must be positive".into()));
        }
        if !(self.base_lr.is_finite() && self.base_lr > 0.0) {
            return Err(Error::InvalidConfig(
                "base_lr must be finite and positive".into(),
            ));
        }
        if self.lr_decay_interval > 0 && !(self.lr_decay_factor > 0.0) {
            return Err(Error::InvalidConfig(
                "lr_decay_factor must be positive when decay is enabled".into(),
            ));
        }
        for (name, p) in [
            ("drop_keep_input", self.drop_keep_input),
            ("drop_keep_hidden", self.drop_keep_hidden),
        ] {
            if !(p > 0.0 && p <= 1.0) {
                return Err(Error::InvalidConfig(format!(
                    "{} must be in (0, 1], got {}",
                    name, p
                )));
            }
        }
        if self.log_interval == 0 || self.eval_interval == 0 {
            return Err(Error::InvalidConfig(
                "log_interval and eval_interval must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = TrainConfig::default();

        assert_eq!(cfg.batch_size, 100);
        assert_eq!(cfg.eval_interval, 100);
        assert_eq!(cfg.epochs, 1);
        assert_eq!(cfg.base_lr, 0.1);
        assert_eq!(cfg.momentum, 0.9);
        assert_eq!(cfg.weight_decay, 0.0005);
        assert_eq!(cfg.drop_keep_input, 1.0);
        assert_eq!(cfg.drop_keep_hidden, 1.0);
        assert!(cfg.validate(1000).is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_keep_probability() {
        let cfg = TrainConfig {
            drop_keep_input: 0.0,
            ..TrainConfig::default()
        };
        assert!(cfg.validate(1000).is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_batch() {
        let cfg = TrainConfig {
            batch_size: 101,
            ..TrainConfig::default()
        };
        assert!(cfg.validate(100).is_err());
    }
}
