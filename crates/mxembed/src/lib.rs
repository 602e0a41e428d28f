#![forbid(unsafe_code)]

//! draw.io (`mxfile`) → embeddable HTML viewer snippet.
//!
//! Design goals:
//! - byte-stable output (fixed template, fixed JSON key order)
//! - the original input text is embedded verbatim; decoding is only a
//!   well-formedness gate
//! - one defaults object shared by every surface

pub mod document;
pub mod error;
pub mod viewer;

pub use document::{DiagramFile, DiagramPage};
pub use error::{Error, Result};
pub use viewer::{
    DEFAULT_TOOLBAR, DEFAULT_VIEWER_JS, EmbedOptions, ViewerConfig, render_embed_html,
};
