pub mod classifier;
pub mod storage;

pub use classifier::*;
pub use storage::*;
