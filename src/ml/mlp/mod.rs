//! Feed-forward intent classifier over bag-of-words vectors.

mod model;
mod optim;
mod train;

pub use model::{DenseLayer, MODEL_VERSION, MlpModel, softmax};
pub use optim::Sgd;
pub use train::{TrainOptions, build_mlp, train_mlp};
