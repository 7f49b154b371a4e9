//! Preprocess Module - fitted column encoders
//!
//! Everything here is fitted on training rows and serialized inside the
//! pipeline artifact, so serving applies exactly the training-time encoding.

pub mod onehot;
pub mod frequency;
pub mod scaler;
pub mod transformer;

pub use onehot::OneHotEncoder;
pub use frequency::FrequencyEncoder;
pub use scaler::StandardScaler;
pub use transformer::ColumnTransformer;
