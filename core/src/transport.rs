//! Executes `HttpRequest` values with a `ureq` agent.
//!
//! The agent is configured so 4xx/5xx answers come back as responses rather
//! than `Err`, leaving status interpretation to the client.

use ureq::http::Response;
use ureq::{Agent, Body};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Agent used when the caller does not supply one.
pub fn default_agent() -> Agent {
    Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent()
}

/// Send `req` and return the unread response.
pub(crate) fn send(agent: &Agent, req: &HttpRequest) -> Result<Response<Body>, ApiError> {
    tracing::debug!(method = req.method.as_str(), url = %req.url, "sending request");
    let form = req.form.iter().map(|(k, v)| (k.as_str(), v.as_str()));
    let response = match req.method {
        HttpMethod::Get => agent.get(&req.url).call(),
        HttpMethod::Delete => agent.delete(&req.url).call(),
        HttpMethod::Post if req.form.is_empty() => agent.post(&req.url).send_empty(),
        HttpMethod::Post => agent.post(&req.url).send_form(form),
        HttpMethod::Put if req.form.is_empty() => agent.put(&req.url).send_empty(),
        HttpMethod::Put => agent.put(&req.url).send_form(form),
    }?;
    tracing::debug!(status = response.status().as_u16(), url = %req.url, "received response");
    Ok(response)
}

/// Buffer a response into plain data.
pub(crate) fn buffer(mut response: Response<Body>) -> Result<HttpResponse, ApiError> {
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let bytes = response.body_mut().read_to_vec()?;
    Ok(HttpResponse {
        status,
        headers,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

/// Send `req` and buffer the whole response.
pub(crate) fn execute(agent: &Agent, req: &HttpRequest) -> Result<HttpResponse, ApiError> {
    buffer(send(agent, req)?)
}
