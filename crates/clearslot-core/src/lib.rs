pub mod aircraft;
pub mod club;
pub mod error;
pub mod flyability;
pub mod legality;
pub mod pilot;
pub mod policy;
pub mod reasons;
pub mod scoring;
pub mod slots;
pub mod weather;

pub use aircraft::*;
pub use club::*;
pub use error::{PolicyError, ValidationError};
pub use flyability::*;
pub use legality::*;
pub use pilot::*;
pub use policy::*;
pub use reasons::*;
pub use scoring::flyability_score;
pub use slots::*;
pub use weather::*;
