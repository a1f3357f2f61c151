mod activation;
mod config;
mod dataset;
mod error;
mod layer;
mod loss;
mod network;
mod snapshot;
mod utils;

pub use activation::Activation;
pub use config::TrainConfig;
pub use dataset::Sample;
pub use error::{Error, Result};
pub use layer::{Layer, LayerPass};
pub use loss::cross_entropy;
pub use network::{ForwardPass, GradientCheck, Gradients, Network};
pub use snapshot::Snapshot;
