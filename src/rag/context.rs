//! Turns retrieved documents into the grounding-context block.

use super::Document;

const SEPARATOR: &str = "\n\n";

/// Joins page contents with a blank line, in retrieval order.
pub fn combine_documents(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|doc| doc.page_content.as_str())
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}
