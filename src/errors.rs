use thiserror::Error;

/// Contract-violation errors.
///
/// The remediation taxonomy of §"why a finding stayed unfixed" is *data*
/// (see `model::outcome`), never an `Error`. This enum covers only the cases
/// where a collaborator broke its contract: an unparsable unit, or an edit
/// batch that does not fit the source it was planned against.
#[derive(Debug, Error)]
pub enum Error {
    #[error("tree-sitter language error")]
    TreeSitterLanguage,

    #[error("tree-sitter parse error")]
    TreeSitterParse,

    #[error("edit range {start}..{end} is out of bounds or splits a UTF-8 character")]
    InvalidEditRange { start: usize, end: usize },

    #[error("overlapping edits at byte {at}")]
    OverlappingEdits { at: usize },

    #[error("invalid state: {0}")]
    InvalidState(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
