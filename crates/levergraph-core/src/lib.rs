pub mod config_manager;
pub mod error;
pub mod logging;
pub mod scored;
pub mod sources;
pub mod traits;
pub mod types;

pub use config_manager::*;
pub use error::*;
pub use logging::*;
pub use scored::*;
pub use sources::*;
pub use traits::*;
pub use types::*;
