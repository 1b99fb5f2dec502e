pub mod experiment;
pub mod factors;
pub mod interventions;
pub mod rules;
pub mod scorer;
pub mod targeted;

pub use experiment::*;
pub use factors::*;
pub use interventions::*;
pub use rules::*;
pub use scorer::*;
pub use targeted::*;
