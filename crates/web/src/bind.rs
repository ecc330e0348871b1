//! Decoding a request into a typed value.
//!
//! # Example
//! ```
//! use lattice_web::Context;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Login {
//!     user: String,
//!     password: String,
//! }
//!
//! fn login(c: &mut Context) {
//!     match c.bind::<Login>() {
//!         Ok(login) => c.string(format!("welcome {}", login.user)),
//!         Err(e) => {
//!             c.set_status(http::StatusCode::BAD_REQUEST);
//!             c.string(e.to_string());
//!         }
//!     }
//! }
//! ```

use crate::{BindError, Context};
use http::Method;
use serde::de::DeserializeOwned;

const JSON_ESSENCE: &str = "application/json";
const FORM_ESSENCE: &str = "application/x-www-form-urlencoded";

impl Context {
    /// Decodes the request into `T`, choosing the decoder from the method and the content type:
    ///
    /// - `GET` requests decode the query string
    /// - `application/json` bodies are decoded as json
    /// - `application/x-www-form-urlencoded` bodies, or bodies without content type, as a form
    ///
    /// # Errors
    ///
    /// Fails when the payload does not decode into `T` or the content type has no decoder.
    pub fn bind<T: DeserializeOwned>(&self) -> Result<T, BindError> {
        if self.method() == Method::GET {
            return self.bind_query();
        }

        let Some(content_type) = self.content_type() else {
            return self.bind_form();
        };

        match content_type.parse::<mime::Mime>() {
            Ok(mime) if mime.essence_str() == JSON_ESSENCE => self.bind_json(),
            Ok(mime) if mime.essence_str() == FORM_ESSENCE => self.bind_form(),
            _ => Err(BindError::unsupported_content_type(content_type)),
        }
    }

    /// Decodes the body as json, whatever the content type says.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Json`] if the body is not valid json for `T`.
    pub fn bind_json<T: DeserializeOwned>(&self) -> Result<T, BindError> {
        Ok(serde_json::from_slice(self.body())?)
    }

    /// Decodes the body as an urlencoded form.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Form`] if the body does not decode into `T`.
    pub fn bind_form<T: DeserializeOwned>(&self) -> Result<T, BindError> {
        Ok(serde_urlencoded::from_bytes(self.body())?)
    }

    /// Decodes the query string.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Query`] if the query string does not decode into `T`.
    pub fn bind_query<T: DeserializeOwned>(&self) -> Result<T, BindError> {
        Ok(serde_qs::from_str(self.uri().query().unwrap_or_default())?)
    }
}
