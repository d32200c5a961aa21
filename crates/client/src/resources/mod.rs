//! Resource accessors built on [`Client`](crate::client::Client).
//!
//! Each accessor unwraps the response envelope and maps payloads into the
//! view shapes from [`crate::views`].

use api_types::envelope::ApiResponse;

use crate::error::{ApiError, ClientError, Result};

pub mod accounts;
pub mod categories;
pub mod reports;
pub mod transactions;

/// Turns a failed envelope into [`ClientError::Api`], using `fallback` when
/// the envelope carries no error body.
pub(crate) fn into_data<T>(response: ApiResponse<T>, fallback: &str) -> Result<Option<T>> {
    response.into_result().map_err(|error| {
        ClientError::Api(match error {
            Some(body) => ApiError::from_envelope(None, body),
            None => ApiError::with_message(None, fallback),
        })
    })
}
