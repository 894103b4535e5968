pub mod error;
pub mod flow;
pub mod models;
pub mod tally;
pub mod validation;

pub use error::{ErrorCode, ErrorResponse};
pub use flow::{transition, Action, Screen, Step, TransitionError};
pub use models::*;
pub use tally::{Tally, TallyError};
pub use validation::*;
