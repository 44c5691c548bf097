#![forbid(unsafe_code)]

pub mod countdown;
pub mod model;
pub mod navigation;
pub mod session;
pub mod time;

pub use countdown::{Countdown, DEFAULT_SESSION_SECS, TickOutcome, format_remaining, is_running_low};
pub use navigation::Navigator;
pub use session::{AnswerPolicy, SessionError, SessionPhase, TestSession};
pub use time::Clock;
