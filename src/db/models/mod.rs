pub mod reading_session;
pub mod vocabulary;

pub use reading_session::{ReadingSession, SessionRecord, SessionSummary};
pub use vocabulary::{NewVocabularyEntry, VocabularyEntry, VocabularyFilter, VocabularyListing};
