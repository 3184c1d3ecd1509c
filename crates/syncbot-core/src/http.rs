use crate::error::{Result, SyncError};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Build the blocking client shared by all outbound calls of one invocation.
pub fn client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .user_agent(concat!("syncbot/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// Turn a non-2xx response into [`SyncError::Api`] carrying the response text.
pub fn check(service: &'static str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(SyncError::Api {
        service,
        status: status.as_u16(),
        body,
    })
}

/// [`check`] and decode the JSON body.
pub fn json<T: DeserializeOwned>(service: &'static str, response: Response) -> Result<T> {
    Ok(check(service, response)?.json()?)
}
