//! Image store client: URL construction plus the five store operations.
//!
//! # Design
//! `ImageStore` holds the base address, the chunk size for streamed reads
//! and a `ureq` agent, none of which change after construction. Each
//! operation is split into a `build_*` method that produces an `HttpRequest`
//! without I/O, and an executing method that sends it and interprets the
//! answer. Nothing is retried.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use ureq::{Agent, BodyReader};

use crate::apply::Apply;
use crate::chunks::{Chunks, DEFAULT_CHUNK_SIZE};
use crate::encode::{escape_self, quote};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport;

/// Scheme for URLs that point back into the same store.
const SELF_SCHEME: &str = "self://";

/// Form field carrying JSON-encoded metadata on POST/PUT.
const METADATA_FIELD: &str = "metadata";

/// Client for one image store server.
#[derive(Clone)]
pub struct ImageStore {
    base_url: String,
    chunk_size: usize,
    agent: Agent,
}

impl fmt::Debug for ImageStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageStore")
            .field("base_url", &self.base_url)
            .field("chunk_size", &self.chunk_size)
            .finish_non_exhaustive()
    }
}

impl ImageStore {
    /// `addr` is `http(s)://<host>:<port>`; a trailing `/` is dropped.
    pub fn new(addr: &str) -> Self {
        Self {
            base_url: addr.trim_end_matches('/').to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            agent: transport::default_agent(),
        }
    }

    /// Use `chunk_size` bytes per chunk for `read`. Zero is treated as one.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Send requests through `agent` instead of the default one.
    ///
    /// Configure it with `http_status_as_error(false)`, otherwise error
    /// statuses surface as `ApiError::Transport` instead of `ApiError::Http`.
    pub fn with_agent(mut self, agent: Agent) -> Self {
        self.agent = agent;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    // -----------------------------------------------------------------------
    // URLs
    // -----------------------------------------------------------------------

    pub fn make_url(&self, path: &str, apply: Option<&Apply>) -> String {
        let url = format!("{}{}", self.base_url, quote(path));
        match apply {
            Some(apply) => apply.append(&url),
            None => url,
        }
    }

    /// Reference `path` in this store from inside another request, e.g. as
    /// a path segment or apply parameter. Only `%` and `?` are escaped since
    /// the server resolves these itself.
    pub fn self_url(&self, path: &str, apply: Option<&Apply>) -> String {
        let url = format!("{SELF_SCHEME}{}", escape_self(path));
        match apply {
            Some(apply) => apply.append(&url),
            None => url,
        }
    }

    // -----------------------------------------------------------------------
    // Request builders
    // -----------------------------------------------------------------------

    pub fn build_read(&self, path: &str, apply: Option<&Apply>) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: self.make_url(path, apply),
            form: Vec::new(),
        }
    }

    pub fn build_post<T>(&self, path: &str, metadata: Option<&T>) -> Result<HttpRequest, ApiError>
    where
        T: Serialize + ?Sized,
    {
        self.build_upload(HttpMethod::Post, path, metadata)
    }

    pub fn build_put<T>(&self, path: &str, metadata: Option<&T>) -> Result<HttpRequest, ApiError>
    where
        T: Serialize + ?Sized,
    {
        self.build_upload(HttpMethod::Put, path, metadata)
    }

    pub fn build_delete(&self, path: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            url: self.make_url(path, None),
            form: Vec::new(),
        }
    }

    pub fn build_list(&self, path: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: self.make_url(path, None),
            form: Vec::new(),
        }
    }

    /// Metadata is JSON-encoded here, so encoding failures surface before
    /// anything is sent.
    fn build_upload<T>(
        &self,
        method: HttpMethod,
        path: &str,
        metadata: Option<&T>,
    ) -> Result<HttpRequest, ApiError>
    where
        T: Serialize + ?Sized,
    {
        let form = match metadata {
            Some(metadata) => {
                let json = serde_json::to_string(metadata).map_err(ApiError::Encoding)?;
                vec![(METADATA_FIELD.to_string(), json)]
            }
            None => Vec::new(),
        };
        Ok(HttpRequest {
            method,
            url: self.make_url(path, None),
            form,
        })
    }

    /// Check for a 2xx status and decode the body as JSON.
    pub fn parse_json(&self, response: HttpResponse) -> Result<Value, ApiError> {
        check_status(&response)?;
        serde_json::from_str(&response.body).map_err(|source| ApiError::Decode {
            source,
            body: response.body,
        })
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Stream the content at `path`, optionally transformed by `apply`.
    ///
    /// The status is checked before any chunk is handed out. Body bytes are
    /// pulled from the network as the iterator advances.
    pub fn read(&self, path: &str, apply: Option<&Apply>) -> Result<Chunks<BodyReader<'static>>, ApiError> {
        let req = self.build_read(path, apply);
        let response = transport::send(&self.agent, &req)?;
        if !response.status().is_success() {
            let response = transport::buffer(response)?;
            return Err(ApiError::Http {
                status: response.status,
                body: response.body,
            });
        }
        Ok(Chunks::new(response.into_body().into_reader(), self.chunk_size))
    }

    /// Create (or run a transform into) `path`, attaching `metadata` when given.
    ///
    /// Without metadata the type has to be named: `post::<Value>(path, None)`.
    pub fn post<T>(&self, path: &str, metadata: Option<&T>) -> Result<Value, ApiError>
    where
        T: Serialize + ?Sized,
    {
        let req = self.build_post(path, metadata)?;
        self.parse_json(transport::execute(&self.agent, &req)?)
    }

    /// Create or replace `path`, attaching `metadata` when given.
    pub fn put<T>(&self, path: &str, metadata: Option<&T>) -> Result<Value, ApiError>
    where
        T: Serialize + ?Sized,
    {
        let req = self.build_put(path, metadata)?;
        self.parse_json(transport::execute(&self.agent, &req)?)
    }

    /// Remove `path`. The response is returned whatever its status, since
    /// delete answers may carry no body at all.
    pub fn delete(&self, path: &str) -> Result<HttpResponse, ApiError> {
        transport::execute(&self.agent, &self.build_delete(path))
    }

    /// Directory listing for `path`.
    pub fn list(&self, path: &str) -> Result<Value, ApiError> {
        self.parse_json(transport::execute(&self.agent, &self.build_list(path))?)
    }
}

/// Map non-2xx statuses to `ApiError::Http`.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}
