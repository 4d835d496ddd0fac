//! Registration-time errors.
//!
//! Rendering never fails; everything here is raised while tags are compiled or registered.

use thiserror::Error;

/// Which field of a stored tag record an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    TagDefinition,
    HtmlReplacement,
}

/// A tag definition (or format string) that breaks one of the compiler's rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("tag name is missing")]
    MissingName,

    #[error("invalid tag name `{0}`: tag names may only contain ASCII letters and digits")]
    InvalidName(String),

    #[error("tag definition `{0}` is malformed")]
    MalformedDefinition(String),

    #[error("closing tag `[/{closing}]` does not match opening tag `[{opening}]`")]
    MismatchedClosingTag { opening: String, closing: String },

    #[error("standalone tags cannot have content or a closing tag")]
    StandaloneWithContent,

    #[error("tag definition has no content placeholder")]
    MissingContent,

    #[error("tag definition has no closing tag")]
    MissingClosingTag,

    #[error("placeholder `{0}` is malformed")]
    MalformedPlaceholder(String),

    #[error("unknown placeholder type `{0}`")]
    UnknownPlaceholder(String),

    #[error("placeholder `{0}` is used more than once in the tag definition")]
    DuplicatePlaceholder(String),

    #[error("placeholder `{0}` is defined but never used in the HTML replacement")]
    UnusedPlaceholder(String),

    #[error("placeholder `{0}` is used in the HTML replacement but not defined by the tag")]
    UndefinedPlaceholder(String),

    #[error("HTML replacement does not contain any HTML element")]
    MissingHtml,

    #[error("tag name `{0}` is already taken")]
    NameTaken(String),
}

impl DefinitionError {
    /// The record field a storage layer should attach this error to.
    pub fn field(&self) -> RecordField {
        match self {
            DefinitionError::UnusedPlaceholder(_)
            | DefinitionError::UndefinedPlaceholder(_)
            | DefinitionError::MissingHtml => RecordField::HtmlReplacement,
            _ => RecordField::TagDefinition,
        }
    }
}

/// Errors raised by [`Registry`][crate::Registry] mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("tag `{0}` is already registered")]
    AlreadyRegistered(String),

    #[error("tag `{0}` is not registered")]
    NotRegistered(String),

    #[error("tag was registered as `{expected}` but its definition declares `{found}`")]
    NameMismatch { expected: String, found: String },

    #[error(transparent)]
    InvalidDefinition(#[from] DefinitionError),
}
