pub mod error;
pub mod kmeans;
pub mod ops;
pub mod providers;

pub use error::*;
pub use kmeans::*;
pub use ops::*;
pub use providers::*;
