// ── Tag resolution ──
//
// Decorates a base entity with side-band facts. Required and optional
// tags branch explicitly on the three lookup outcomes.

use thiserror::Error;

use crate::error::StoreError;
use crate::model::TagOwner;
use crate::store::TagRepository;

/// Outcome of a single tag lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagLookup {
    Found(String),
    NotFound,
    Failed(StoreError),
}

/// A required tag could not be produced.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TagError {
    #[error("required tag {name} is missing")]
    Missing { name: String },

    #[error("lookup of tag {name} failed: {source}")]
    Lookup {
        name: String,
        #[source]
        source: StoreError,
    },
}

/// Resolves named tags against a `TagRepository`.
pub struct TagResolver<'a, R: TagRepository + ?Sized> {
    repo: &'a R,
}

impl<'a, R: TagRepository + ?Sized> TagResolver<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    pub fn lookup(&self, owner: &TagOwner, name: &str) -> TagLookup {
        match self.repo.tag(owner, name) {
            Ok(Some(tag)) => TagLookup::Found(tag.value),
            Ok(None) => TagLookup::NotFound,
            Err(e) => TagLookup::Failed(e),
        }
    }

    pub fn required(&self, owner: &TagOwner, name: &str) -> Result<String, TagError> {
        match self.lookup(owner, name) {
            TagLookup::Found(value) => Ok(value),
            TagLookup::NotFound => Err(TagError::Missing { name: name.into() }),
            TagLookup::Failed(source) => Err(TagError::Lookup {
                name: name.into(),
                source,
            }),
        }
    }

    /// `Ok(None)` when the tag is simply absent.
    pub fn optional(&self, owner: &TagOwner, name: &str) -> Result<Option<String>, TagError> {
        match self.lookup(owner, name) {
            TagLookup::Found(value) => Ok(Some(value)),
            TagLookup::NotFound => Ok(None),
            TagLookup::Failed(source) => Err(TagError::Lookup {
                name: name.into(),
                source,
            }),
        }
    }
}
