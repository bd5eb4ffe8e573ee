use std::path::PathBuf;

use quick_xml::events::attributes::AttrError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetError {
    #[error("Couldn't access network file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to read xml: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Malformed xml attribute: {0}")]
    Attribute(#[from] AttrError),
    #[error("<{tag}> at position {position} has no `{attribute}` attribute")]
    MissingAttribute {
        tag: &'static str,
        attribute: &'static str,
        position: u64,
    },
    #[error("Failed to open network file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
}
