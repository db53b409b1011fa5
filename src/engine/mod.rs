pub mod cache;
pub mod identity;
pub mod merge;
pub mod predictor;

pub use identity::IdentityKey;
pub use merge::{merge, MergeStats};
