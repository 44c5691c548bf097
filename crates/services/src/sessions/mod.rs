mod driver;
mod snapshot;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionServiceError;
pub use driver::SessionHandle;
pub use snapshot::SessionSnapshot;
pub use workflow::ExamLoopService;
