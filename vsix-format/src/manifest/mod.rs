//! The extension manifest: an XML tree that survives a parse/serialize round
//! trip unchanged, and the mutation that retargets it to another host product.

use std::path::PathBuf;

mod patch;
mod tree;

pub use patch::{SupportedProduct, add_supported_product, patch, remove_references};
pub use tree::{Attribute, Declaration, Document, Element, Node};

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Reading manifest failed. Path: '{}'", .1.display())]
    ReadFailed(#[source] std::io::Error, PathBuf),

    #[error("Writing manifest failed. Path: '{}'", .1.display())]
    WriteFailed(#[source] std::io::Error, PathBuf),

    #[error("Manifest is not valid UTF-8.")]
    NotUtf8(#[source] std::str::Utf8Error),

    #[error("Invalid XML at byte {position}.")]
    Syntax {
        #[source]
        source: quick_xml::Error,
        position: u64,
    },

    #[error("Invalid escape sequence in manifest text.")]
    Escape(#[source] quick_xml::escape::EscapeError),

    #[error("Namespace prefix '{0}' is not declared.")]
    UnboundPrefix(String),

    #[error("Malformed manifest: {0}.")]
    Malformed(&'static str),

    #[error("Element '{name}' not found in namespace '{namespace}'.")]
    MissingElement { name: String, namespace: String },

    #[error("Serializing manifest failed.")]
    Serialize(#[source] std::io::Error),
}
