pub mod builder;
pub mod centrality;
pub mod edge;
pub mod graph;
pub mod paths;
pub mod persistence;
pub mod relations;

pub use builder::*;
pub use centrality::*;
pub use edge::*;
pub use graph::*;
pub use paths::*;
pub use persistence::*;
pub use relations::*;
