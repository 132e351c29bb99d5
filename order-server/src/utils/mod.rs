pub mod error;
pub mod logger;
pub mod time;
pub mod validation;

pub use error::{AppError, AppResult};
pub use time::{Clock, ManualClock, SystemClock};
