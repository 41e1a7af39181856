use crate::rag::Document;

/// What a chat run produces, in order: zero or more answer deltas, then the
/// captured source documents, then `Done`. An `Error` event replaces the
/// documents-and-done tail and is always the last event on the channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    AnswerDelta(String),
    SourceDocuments(Vec<Document>),
    Error(String),
    Done,
}
