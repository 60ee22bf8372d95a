//! Data preparation stages.
//!
//! Cleaning, categorical encoding, rescaling, and the train/test split.
//! Every stage consumes a frame and returns a new one; nothing here keeps
//! mutable state between calls beyond fitted parameters.

mod cleaner;
mod encoder;
mod scaler;
mod split;

pub use cleaner::{CleanSummary, Cleaner};
pub use encoder::OneHotEncoder;
pub use scaler::{Scaler, ScalerType};
pub use split::{split_frame, take_rows, train_test_split, TrainTestSplit};
