//! Loading tags and smilies kept by a storage layer into a [`Registry`].
//!
//! The storage layer itself lives outside this crate; it only has to implement [`TagStore`].
//! Before persisting a record it should run [`validate_record`] and attach any error to the
//! field named by [`DefinitionError::field`].
use static_assertions::assert_obj_safe;

use crate::{
    config::{LoaderConfig, LoaderFeature},
    error::{DefinitionError, RegistryError},
    registry::{Registry, Smiley, TagSource},
    tag::{TagOptions, TagSpec},
};

/// A user-defined tag as a storage layer keeps it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    /// e.g. `[spoiler]{TEXT}[/spoiler]`
    pub tag_definition: String,
    /// e.g. `<div class="spoiler">{TEXT}</div>`
    pub html_replacement: String,
    pub options: TagOptions,
    pub helpline: Option<String>,
}

impl TagRecord {
    pub fn new(tag_definition: impl Into<String>, html_replacement: impl Into<String>) -> Self {
        Self {
            tag_definition: tag_definition.into(),
            html_replacement: html_replacement.into(),
            options: TagOptions::default(),
            helpline: None,
        }
    }

    pub fn with_options(mut self, options: TagOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_helpline(mut self, helpline: impl Into<String>) -> Self {
        self.helpline = Some(helpline.into());
        self
    }
}

/// Source of stored tags and smilies.
pub trait TagStore {
    /// All active tag records.
    fn tags(&self) -> Vec<TagRecord>;

    fn smilies(&self) -> Vec<Smiley> {
        Vec::new()
    }
}

assert_obj_safe!(TagStore);

/// Check a record before it is stored.
///
/// Besides the compiler's own rules, the tag name must not be held by a tag registered by the
/// host application. Built-in tags may be overridden.
pub fn validate_record(record: &TagRecord, registry: &Registry) -> Result<TagSpec, DefinitionError> {
    let spec = TagSpec::compile(&record.tag_definition, &record.html_replacement, record.options)?;

    if registry.source_of(spec.name()) == Some(TagSource::Dynamic) {
        return Err(DefinitionError::NameTaken(spec.name().to_owned()));
    }

    Ok(match &record.helpline {
        Some(helpline) => spec.with_helpline(helpline.clone()),
        None => spec,
    })
}

/// A record that could not be registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub record: TagRecord,
    pub error: RegistryError,
}

/// What a load did to the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Names of the tags registered from storage.
    pub registered: Vec<String>,
    pub skipped: Vec<SkippedRecord>,
    pub smilies: usize,
}

impl LoadReport {
    /// Whether every record made it into the registry.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Compile and register `records` as stored tags. Broken records are skipped and reported.
pub fn load_stored_tags(
    registry: &mut Registry,
    records: impl IntoIterator<Item = TagRecord>,
) -> LoadReport {
    let mut report = LoadReport::default();

    for record in records {
        let result = validate_record(&record, registry)
            .map_err(RegistryError::from)
            .and_then(|spec| {
                let name = spec.name().to_owned();
                registry.register(spec, TagSource::Storage).map(|()| name)
            });

        match result {
            Ok(name) => report.registered.push(name),
            Err(error) => {
                log::warn!("skipping stored tag {:?}: {error}", record.tag_definition);
                report.skipped.push(SkippedRecord { record, error });
            }
        }
    }

    report
}

/// Fills a registry according to a [`LoaderConfig`].
#[derive(Debug, Clone, Default)]
pub struct Loader {
    config: LoaderConfig,
}

impl Loader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn load(&self, registry: &mut Registry, store: &dyn TagStore) -> LoadReport {
        let features = self.config.feature_flags;

        if features.contains(LoaderFeature::BUILTIN_TAGS) {
            registry.install_builtins();
        }

        let mut report = if features.contains(LoaderFeature::CUSTOM_TAGS) {
            load_stored_tags(registry, store.tags())
        } else {
            LoadReport::default()
        };

        if features.contains(LoaderFeature::SMILIES) {
            for Smiley { code, html } in store.smilies() {
                registry.add_smiley(code, html);
                report.smilies += 1;
            }
        }

        log::debug!(
            "loaded {} stored tags ({} skipped) and {} smilies",
            report.registered.len(),
            report.skipped.len(),
            report.smilies
        );
        report
    }
}
