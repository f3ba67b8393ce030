pub mod error;
pub mod image;
pub mod resolver;
pub mod session;
pub mod write;

pub use error::PlacementError;
pub use session::{
    PendingResult, PendingUpload, PlacementSession, ResultAction, Routed, SessionState,
    UploadAction,
};
pub use write::{Destination, WriteOutcome};
