//! External collaborators that feed a run: source notes, reference pages and the
//! optional retrieval service. None of them can fail a run; they degrade to empty text.

pub mod notes;
pub mod references;
pub mod retrieval;

pub use notes::{read_notes, resolve_notes_path};
pub use references::{ReferenceDocument, ReferenceFetcher};
pub use retrieval::{format_snippets, RetrievalClient, RetrievedContext};

/// Join URL material and retrieval snippets into one reference block.
pub fn combine_reference_context(url_material: &str, retrieval: Option<&str>) -> String {
    [url_material, retrieval.unwrap_or_default()]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
