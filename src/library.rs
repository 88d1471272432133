use crate::error::{Result, VisError};
use crate::part_token::PartToken;
use indexmap::IndexSet;
use std::collections::BTreeMap;

/// One construct of a library: its part slots and the identifier realized for
/// each slot (`None` for an absent slot).
#[derive(Clone, Debug, PartialEq)]
pub struct ConstructDescriptor {
    display_id: String,
    tokens: Vec<PartToken>,
    identifiers: Vec<Option<String>>,
}

impl ConstructDescriptor {
    pub fn new(
        display_id: &str,
        tokens: Vec<PartToken>,
        identifiers: Vec<Option<String>>,
    ) -> Result<Self> {
        if tokens.len() != identifiers.len() {
            return Err(VisError::misaligned(
                display_id,
                format!(
                    "{} part slots but {} identifiers",
                    tokens.len(),
                    identifiers.len()
                ),
            ));
        }
        Ok(Self {
            display_id: display_id.to_string(),
            tokens,
            identifiers,
        })
    }

    pub fn display_id(&self) -> &str {
        &self.display_id
    }

    pub fn tokens(&self) -> &[PartToken] {
        &self.tokens
    }

    pub fn identifiers(&self) -> &[Option<String>] {
        &self.identifiers
    }

    pub fn slots(&self) -> impl Iterator<Item = (&PartToken, Option<&str>)> {
        self.tokens
            .iter()
            .zip(self.identifiers.iter().map(|id| id.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Identifiers in order of first appearance. The position is a stable
/// disambiguation index that does not depend on how many constructs follow.
#[derive(Clone, Debug, Default)]
pub struct PartRegistry {
    ids: IndexSet<String>,
}

impl PartRegistry {
    pub fn register(&mut self, identifier: &str) -> usize {
        self.ids.insert_full(identifier.to_string()).0
    }

    pub fn index_of(&self, identifier: &str) -> Option<usize> {
        self.ids.get_index_of(identifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Clone, Debug, Default)]
pub struct LibraryIndex {
    constructs: BTreeMap<String, ConstructDescriptor>,
    parts: PartRegistry,
}

impl LibraryIndex {
    pub fn insert(&mut self, key: &str, descriptor: ConstructDescriptor) -> Result<()> {
        if self.constructs.contains_key(key) {
            return Err(VisError::DuplicateConstruct(key.to_string()));
        }
        for id in descriptor.identifiers().iter().flatten() {
            self.parts.register(id);
        }
        self.constructs.insert(key.to_string(), descriptor);
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.constructs.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&ConstructDescriptor> {
        self.constructs.get(key)
    }

    /// Constructs in key order, the order in which they are stacked.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConstructDescriptor)> {
        self.constructs.iter().map(|(k, d)| (k.as_str(), d))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.constructs.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.constructs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructs.is_empty()
    }

    pub fn parts(&self) -> &PartRegistry {
        &self.parts
    }

    pub(crate) fn parts_mut(&mut self) -> &mut PartRegistry {
        &mut self.parts
    }
}

/// A construct left out of the library or the drawing, and why.
#[derive(Debug)]
pub struct ConstructFailure {
    pub key: String,
    pub error: VisError,
}

#[derive(Debug, Default)]
pub struct Resolution {
    pub library: LibraryIndex,
    pub failures: Vec<ConstructFailure>,
}

impl Resolution {
    /// Inserts a resolved construct, or records why it could not be resolved.
    pub fn add(&mut self, key: &str, descriptor: Result<ConstructDescriptor>) {
        let outcome = descriptor.and_then(|d| self.library.insert(key, d));
        if let Err(error) = outcome {
            tracing::warn!(construct = key, %error, "construct omitted");
            self.failures.push(ConstructFailure {
                key: key.to_string(),
                error,
            });
        }
    }
}
