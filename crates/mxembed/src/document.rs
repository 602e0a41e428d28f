//! The `mxfile` container model.
//!
//! draw.io stores one `<diagram>` element per page inside a root `<mxfile>`.
//! Page content is either a deflated+base64 payload (the common case) or an
//! inline `<mxGraphModel>` tree; both are kept as the raw inner text. The
//! decoded structure is only consulted as a well-formedness check — embedding
//! always uses the original input text, never a re-serialization of this
//! model.

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct DiagramFile {
    pub pages: Vec<DiagramPage>,
}

/// One page of an [`DiagramFile`]. `id` and `name` mirror the `<diagram>`
/// attributes and are empty when absent.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramPage {
    pub id: String,
    pub name: String,
    pub content: String,
}

impl DiagramFile {
    /// Parses the text as an `mxfile` document.
    ///
    /// Fails when the text is not well-formed XML or the root element is not
    /// `<mxfile>`.
    pub fn parse(text: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(text)?;
        let root = doc.root_element();
        if !root.has_tag_name("mxfile") {
            return Err(Error::UnexpectedRoot {
                found: root.tag_name().name().to_string(),
            });
        }

        let mut pages = Vec::new();
        for node in root.children().filter(|n| n.has_tag_name("diagram")) {
            pages.push(DiagramPage {
                id: node.attribute("id").unwrap_or_default().to_string(),
                name: node.attribute("name").unwrap_or_default().to_string(),
                content: inner_raw(text, node),
            });
        }

        Ok(Self { pages })
    }
}

/// The raw slice of `text` spanned by `node`'s children. This preserves inline
/// `<mxGraphModel>` markup as written instead of flattening it to text.
fn inner_raw(text: &str, node: roxmltree::Node<'_, '_>) -> String {
    let (Some(first), Some(last)) = (node.first_child(), node.last_child()) else {
        return String::new();
    };
    text[first.range().start..last.range().end].to_string()
}
