use bitflags::bitflags;

bitflags! {
    /// Global switches applied on top of each tag's own options.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct RenderFeature: u32 {
        /// Escape `&`, `<`, `>` and `"` in literal text.
        const ESCAPE_HTML = 1 << 0;
        /// Turn bare URLs found in text into links.
        const REPLACE_LINKS = 1 << 1;
        /// Replace line breaks with [`RenderConfig::newline`].
        const TRANSFORM_NEWLINES = 1 << 2;
        /// Replace smiley codes with their HTML.
        const SMILIES = 1 << 3;

        /// All current and future feature flags.
        const ALL = u32::MAX;
    }
}

impl Default for RenderFeature {
    fn default() -> Self {
        Self::ESCAPE_HTML | Self::REPLACE_LINKS | Self::TRANSFORM_NEWLINES | Self::SMILIES
    }
}

/// Configuration for an [`HtmlRenderer`][crate::HtmlRenderer].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    pub feature_flags: RenderFeature,
    /// Markup emitted for a line break.
    pub newline: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            feature_flags: RenderFeature::default(),
            newline: "<br />".to_owned(),
        }
    }
}

bitflags! {
    /// What a [`Loader`][crate::loader::Loader] installs into a registry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct LoaderFeature: u32 {
        /// Install the standard tag library.
        const BUILTIN_TAGS = 1 << 0;
        /// Compile and register tags from storage.
        const CUSTOM_TAGS = 1 << 1;
        /// Register smilies from storage.
        const SMILIES = 1 << 2;

        const ALL = u32::MAX;
    }
}

impl Default for LoaderFeature {
    fn default() -> Self {
        Self::BUILTIN_TAGS | Self::CUSTOM_TAGS | Self::SMILIES
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoaderConfig {
    pub feature_flags: LoaderFeature,
}
