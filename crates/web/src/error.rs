use lattice_tree::InsertError;
use std::io;
use thiserror::Error;

/// Errors raised while building the route table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("path must begin with '/': \"{pattern}\"")]
    MissingLeadingSlash { pattern: String },

    #[error("there must be at least one handler: \"{pattern}\"")]
    NoHandlers { pattern: String },

    #[error("there must be at least one middleware")]
    NoMiddleware,

    #[error("too many handlers: {count}, the limit is {max}")]
    TooManyHandlers { count: usize, max: usize },

    #[error("URL parameters can not be used when serving static files: \"{pattern}\"")]
    StaticWithParams { pattern: String },

    #[error(transparent)]
    Tree(#[from] InsertError),
}

impl RouteError {
    pub fn missing_leading_slash<S: ToString>(pattern: S) -> Self {
        Self::MissingLeadingSlash { pattern: pattern.to_string() }
    }

    pub fn no_handlers<S: ToString>(pattern: S) -> Self {
        Self::NoHandlers { pattern: pattern.to_string() }
    }

    pub fn too_many_handlers(count: usize, max: usize) -> Self {
        Self::TooManyHandlers { count, max }
    }

    pub fn static_with_params<S: ToString>(pattern: S) -> Self {
        Self::StaticWithParams { pattern: pattern.to_string() }
    }
}

/// Errors raised while decoding a request into a typed value.
#[derive(Error, Debug)]
pub enum BindError {
    #[error("invalid json body: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("invalid form body: {source}")]
    Form {
        #[from]
        source: serde_urlencoded::de::Error,
    },

    #[error("invalid query string: {source}")]
    Query {
        #[from]
        source: serde_qs::Error,
    },

    #[error("unsupported content type: {content_type}")]
    UnsupportedContentType { content_type: String },
}

impl BindError {
    pub fn unsupported_content_type<S: ToString>(content_type: S) -> Self {
        Self::UnsupportedContentType { content_type: content_type.to_string() }
    }
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("app must be set")]
    MissingApp,

    #[error("address must be set")]
    MissingAddress,

    #[error("invalid address: {source}")]
    InvalidAddress {
        #[from]
        source: io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("bind server error: {source}")]
    Bind { source: io::Error },
}

impl ServerError {
    pub fn bind<E: Into<io::Error>>(e: E) -> Self {
        Self::Bind { source: e.into() }
    }
}
