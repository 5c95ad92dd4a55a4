use pokedex_catalog::CatalogError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The requested id is not in the dataset.
    #[error("record {0} not found")]
    NotFound(u32),

    /// The request to the query service did not complete.
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl ClientError {
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        ClientError::Network {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            ClientError::NotFound(_) => true,
            ClientError::Catalog(e) => e.is_not_found(),
            ClientError::Network { .. } => false,
        }
    }
}
