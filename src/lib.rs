//! Forgiving BBCode to HTML rendering with user-definable tags.
//!
//! Tags come from a [`Registry`]: the standard library ([`html::builtins`]), tags registered by
//! the host application (compiled from definition strings or backed by a [`TagRenderer`]), and
//! tags kept by a storage layer ([`loader`]). Markup that does not form a valid tag is echoed back
//! as escaped text rather than rejected.
//!
//! ```
//! assert_eq!(
//!     bbrender::render("[b]hello [i]world![/i][/b]"),
//!     "<strong>hello <em>world!</em></strong>"
//! );
//! ```

use once_cell::sync::Lazy;

pub mod config;
pub mod error;
pub mod html;
pub mod loader;
mod parser;
pub mod registry;
pub mod tag;

pub use config::{LoaderConfig, LoaderFeature, RenderConfig, RenderFeature};
pub use error::{DefinitionError, RecordField, RegistryError};
pub use html::HtmlRenderer;
pub use parser::{BBParser, BBTag, Token, TokenKind};
pub use registry::{Registry, Smiley, TagSet, TagSource};
pub use tag::{TagOptions, TagRenderer, TagSpec};

static DEFAULT_RENDERER: Lazy<HtmlRenderer> = Lazy::new(|| Registry::with_builtins().renderer());

/// Render `input` with the standard tag library and the default [`RenderConfig`].
pub fn render(input: &str) -> String {
    DEFAULT_RENDERER.render(input)
}
