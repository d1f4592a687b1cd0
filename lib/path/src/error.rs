/// A structural error in a path description, reported when the path is bound
/// to a store rather than at traversal time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The path rewinds to a tag it never placed.
    #[error("path references unknown tag: {tag}")]
    BadPath { tag: String },
    /// A tag cannot be resolved where it is used, e.g. a rewind inside a
    /// recursive traversal fragment.
    #[error("tag cannot be resolved here: {tag}")]
    UnresolvedTag { tag: String },
}
