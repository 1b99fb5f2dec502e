// ABOUTME: Tool layer over the leverage engine (schemas, registry, job tracking)
// ABOUTME: Every tool answers with a uniform {status, message, ...} response

pub mod jobs;
pub mod registry;
pub mod response;
pub mod schemas;
pub mod tools;

pub use jobs::*;
pub use registry::*;
pub use response::*;
pub use schemas::*;
pub use tools::*;
