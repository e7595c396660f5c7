//! # Domain Layer
//!
//! Message model and the pure epoch-routing state machine.

pub mod buffer;
pub mod epoch_router;
pub mod errors;
pub mod messages;

pub use buffer::MessageBuffer;
pub use epoch_router::{Admission, DropReason, EpochRouter, Replay};
pub use errors::NetworkError;
pub use messages::{
    BinaryMessageWithSender, EpochChange, LeaderElectionMessage, MessageWithSender,
    ProtocolMessage, ReportGenerationEvent, ReportGenerationKind, ReportGenerationMessage,
};
