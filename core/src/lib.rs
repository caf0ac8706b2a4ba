//! Blocking client for the image store HTTP service.
//!
//! # Overview
//! Builds store URLs, reads, writes, lists and deletes images, and composes
//! server-side transforms through the `?apply=<name>&...` query convention.
//!
//! # Design
//! - `ImageStore` holds only its base address, chunk size and HTTP agent.
//! - Each operation has a `build_*` half that produces an `HttpRequest` as
//!   plain data, so URL and body construction are testable offline.
//! - `Apply` describes one transform with insertion-ordered parameters;
//!   `Apply::sub_params` packs structured list elements into one token.
//! - `read` streams the body as fixed-size chunks through `Chunks`.
//!
//! ```no_run
//! use istore_core::{Apply, ImageStore};
//!
//! let store = ImageStore::new("http://localhost:8592");
//! let rect = Apply::sub_params([("x1", 50), ("y1", 50), ("x2", 100), ("y2", 100)]);
//! let draw = Apply::new("drawRect").param("rects", vec![rect]);
//! for chunk in store.read("/pyistore/img/a.jpg", Some(&draw))? {
//!     let _bytes = chunk?;
//! }
//! # Ok::<(), istore_core::ApiError>(())
//! ```

pub mod apply;
pub mod chunks;
pub mod client;
pub mod encode;
pub mod error;
pub mod http;
mod transport;
pub mod types;

pub use apply::Apply;
pub use chunks::{Chunks, DEFAULT_CHUNK_SIZE};
pub use client::ImageStore;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::default_agent;
pub use types::{ParamValue, Scalar};
