//! Chat services: transcript loading, turn persistence, directory reads.

mod directory;
mod persister;
mod transcript;

pub use directory::{
    ConversationDetail, ConversationDirectory, ConversationPage, ConversationSummary,
    DirectoryError, MAX_PAGE_LIMIT, PageRequest,
};
pub use persister::{PersistTurnError, TurnPersister};
pub use transcript::{TRANSCRIPT_MESSAGE_CAP, Transcript, TranscriptError, TranscriptLoader};
