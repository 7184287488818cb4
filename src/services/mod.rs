//! Services separating presentation concerns from the materialization pipeline

pub mod progress;

pub use progress::{
    ConsoleProgressReporter, NoOpProgressReporter, ProgressIndicator, ProgressReporter,
};
