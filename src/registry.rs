//! The catalog of active tags.
//!
//! A [`Registry`] is mutated through explicit registration calls only. Renderers never look at the
//! registry itself but at an immutable [`TagSet`] snapshot; mutations copy the set when a snapshot
//! is still alive, so renders in flight keep a consistent view.
use std::sync::Arc;

use crate::{
    config::RenderConfig,
    error::RegistryError,
    html::{builtins, HtmlRenderer},
    tag::{TagOptions, TagSpec},
};

/// Where a registered tag came from. Entries are ordered by source, built-ins first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagSource {
    /// The standard tag library.
    Builtin,
    /// Registered by the host application at run time.
    Dynamic,
    /// Compiled from a stored tag record.
    Storage,
}

/// A smiley code and the HTML that replaces it in free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Smiley {
    pub code: String,
    pub html: String,
}

#[derive(Debug, Clone)]
struct Entry {
    spec: Arc<TagSpec>,
    source: TagSource,
}

/// An immutable view of the registered tags and smilies.
#[derive(Debug, Clone, Default)]
pub struct TagSet {
    entries: Vec<Entry>,
    smilies: Vec<Smiley>,
}

impl TagSet {
    fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().rev().find(|e| e.spec.matches(name))
    }

    /// The active tag called `name` (case-insensitive). Later entries shadow earlier ones.
    pub fn get(&self, name: &str) -> Option<&Arc<TagSpec>> {
        self.entry(name).map(|e| &e.spec)
    }

    pub fn source_of(&self, name: &str) -> Option<TagSource> {
        self.entry(name).map(|e| e.source)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    /// Active tags, built-ins first, then dynamic registrations, then stored tags.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<TagSpec>> + '_ {
        self.entries.iter().enumerate().filter_map(move |(idx, entry)| {
            let shadowed = self.entries[idx + 1..]
                .iter()
                .any(|later| later.spec.matches(entry.spec.name()));
            (!shadowed).then_some(&entry.spec)
        })
    }

    /// Number of active tags.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn smilies(&self) -> &[Smiley] {
        &self.smilies
    }

    /// Whether `spec` may be added from `source`: a name is taken by any entry, except that a
    /// built-in can be shadowed by a non-built-in.
    fn check_available(&self, name: &str, source: TagSource) -> Result<(), RegistryError> {
        let taken = self
            .entries
            .iter()
            .filter(|e| e.spec.matches(name))
            .any(|e| !(e.source == TagSource::Builtin && source != TagSource::Builtin));

        if taken {
            Err(RegistryError::AlreadyRegistered(name.to_owned()))
        } else {
            Ok(())
        }
    }

    fn insert(&mut self, spec: Arc<TagSpec>, source: TagSource) {
        let at = self
            .entries
            .iter()
            .rposition(|e| e.source <= source)
            .map_or(0, |idx| idx + 1);
        self.entries.insert(at, Entry { spec, source });
    }
}

/// Registered tags and smilies, plus the operations that change them.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    tags: Arc<TagSet>,
}

impl Registry {
    /// An empty registry, without even the standard tags.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the standard tag library.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.install_builtins();
        registry
    }

    fn tags_mut(&mut self) -> &mut TagSet {
        Arc::make_mut(&mut self.tags)
    }

    /// Install every standard tag that is not registered as a built-in yet.
    pub fn install_builtins(&mut self) {
        for spec in builtins::standard_tags() {
            let present = self
                .tags
                .entries
                .iter()
                .any(|e| e.source == TagSource::Builtin && e.spec.matches(spec.name()));
            if !present {
                log::debug!("installing built-in tag [{}]", spec.name());
                self.tags_mut().insert(Arc::new(spec), TagSource::Builtin);
            }
        }
    }

    /// Register `spec` as coming from `source`.
    ///
    /// Fails without touching the registry when the name is already registered, unless the
    /// existing entry is a built-in and `source` is not.
    pub fn register(&mut self, spec: TagSpec, source: TagSource) -> Result<(), RegistryError> {
        self.tags.check_available(spec.name(), source)?;
        log::debug!("registering {source:?} tag [{}]", spec.name());
        self.tags_mut().insert(Arc::new(spec), source);
        Ok(())
    }

    /// Register a tag built by the host application, typically one with a custom renderer.
    pub fn register_tag(&mut self, spec: TagSpec) -> Result<(), RegistryError> {
        self.register(spec, TagSource::Dynamic)
    }

    /// Compile `definition` and `format` and register the result under `name`.
    pub fn register_default_tag(
        &mut self,
        name: &str,
        definition: &str,
        format: &str,
        options: TagOptions,
    ) -> Result<(), RegistryError> {
        let spec = TagSpec::compile(definition, format, options)?;
        if !spec.matches(name) {
            return Err(RegistryError::NameMismatch {
                expected: name.to_owned(),
                found: spec.name().to_owned(),
            });
        }
        self.register_tag(spec)
    }

    /// Remove the active tag called `name`. A built-in it was shadowing becomes active again.
    pub fn unregister_tag(&mut self, name: &str) -> Result<Arc<TagSpec>, RegistryError> {
        let idx = self
            .tags
            .entries
            .iter()
            .rposition(|e| e.spec.matches(name))
            .ok_or_else(|| RegistryError::NotRegistered(name.to_owned()))?;

        let entry = self.tags_mut().entries.remove(idx);
        log::debug!("unregistered {:?} tag [{}]", entry.source, entry.spec.name());
        Ok(entry.spec)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.tags.contains(name)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<TagSpec>> {
        self.tags.get(name)
    }

    pub fn source_of(&self, name: &str) -> Option<TagSource> {
        self.tags.source_of(name)
    }

    pub fn tags(&self) -> impl Iterator<Item = &Arc<TagSpec>> + '_ {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Add a smiley, replacing any smiley with the same code. Empty codes are ignored.
    pub fn add_smiley(&mut self, code: impl Into<String>, html: impl Into<String>) {
        let code = code.into();
        if code.is_empty() {
            return;
        }

        let html = html.into();
        log::debug!("registering smiley {code:?}");
        let smilies = &mut self.tags_mut().smilies;
        match smilies.iter_mut().find(|s| s.code == code) {
            Some(smiley) => smiley.html = html,
            None => smilies.push(Smiley { code, html }),
        }
    }

    pub fn smilies(&self) -> &[Smiley] {
        self.tags.smilies()
    }

    /// Drop tags and smilies that came from storage and re-install missing built-ins. Dynamic
    /// registrations stay.
    pub fn reset_to_builtins(&mut self) {
        log::debug!("resetting registry to built-in tags");
        let tags = self.tags_mut();
        tags.entries.retain(|e| e.source != TagSource::Storage);
        tags.smilies.clear();
        self.install_builtins();
    }

    /// The current tags. Later mutations of the registry do not show up in the snapshot.
    pub fn snapshot(&self) -> Arc<TagSet> {
        Arc::clone(&self.tags)
    }

    pub fn renderer(&self) -> HtmlRenderer {
        HtmlRenderer::new(self.snapshot())
    }

    pub fn renderer_with(&self, config: RenderConfig) -> HtmlRenderer {
        HtmlRenderer::with_config(self.snapshot(), config)
    }
}
