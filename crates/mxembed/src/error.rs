pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Malformed diagram XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Unexpected root element <{found}>, expected <mxfile>")]
    UnexpectedRoot { found: String },

    #[error("Viewer config serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl Error {
    /// `true` for errors caused by the input text itself (as opposed to a
    /// failure while producing output). HTTP callers map these to 400.
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, Error::Xml(_) | Error::UnexpectedRoot { .. })
    }
}
