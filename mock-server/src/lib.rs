use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{rejection::FormRejection, Form, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{net::TcpListener, sync::RwLock};

/// One stored image: its bytes and the metadata last sent with it.
#[derive(Clone, Debug, Default)]
pub struct Entry {
    pub data: Vec<u8>,
    pub metadata: Value,
}

/// JSON answer to a successful POST or PUT.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Stored {
    pub path: String,
    pub metadata: Value,
}

#[derive(Deserialize)]
pub struct Upload {
    pub metadata: Option<String>,
}

/// Entries keyed by path without the leading `/`.
pub type Db = Arc<RwLock<BTreeMap<String, Entry>>>;

pub fn app() -> Router {
    app_with_images(std::iter::empty::<(String, Vec<u8>)>())
}

/// Router whose store starts out holding `images` (path, bytes).
pub fn app_with_images<I, P>(images: I) -> Router
where
    I: IntoIterator<Item = (P, Vec<u8>)>,
    P: AsRef<str>,
{
    let db: BTreeMap<String, Entry> = images
        .into_iter()
        .map(|(path, data)| {
            let entry = Entry {
                data,
                metadata: Value::Null,
            };
            (path.as_ref().trim_start_matches('/').to_string(), entry)
        })
        .collect();
    Router::new()
        .route("/{*path}", get(read).post(create).put(replace).delete(remove))
        .with_state(Arc::new(RwLock::new(db)))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_app(listener, app()).await
}

pub async fn run_app(listener: TcpListener, app: Router) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "image store listening");
    }
    axum::serve(listener, app).await
}

async fn read(
    State(db): State<Db>,
    Path(path): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    tracing::debug!(%path, ?query, "GET");
    let db = db.read().await;
    if path.ends_with('/') {
        return Json(list_dir(&db, &path)).into_response();
    }
    let Some(entry) = db.get(&path) else {
        return (StatusCode::NOT_FOUND, format!("no such image: /{path}")).into_response();
    };
    let transform = query.iter().find(|(k, _)| k == "apply").map(|(_, v)| v.as_str());
    match transform {
        None => entry.data.clone().into_response(),
        Some("invert") => entry.data.iter().map(|b| !b).collect::<Vec<u8>>().into_response(),
        Some(other) => (StatusCode::BAD_REQUEST, format!("unknown transform: {other}")).into_response(),
    }
}

/// Names directly under `dir`; sub-directories end in `/`.
fn list_dir(db: &BTreeMap<String, Entry>, dir: &str) -> Vec<String> {
    let mut names: Vec<String> = db
        .keys()
        .filter_map(|key| key.strip_prefix(dir))
        .map(|rest| match rest.split_once('/') {
            Some((child, _)) => format!("{child}/"),
            None => rest.to_string(),
        })
        .collect();
    names.dedup();
    names
}

async fn create(
    State(db): State<Db>,
    Path(path): Path<String>,
    form: Result<Form<Upload>, FormRejection>,
) -> Result<(StatusCode, Json<Stored>), (StatusCode, String)> {
    tracing::debug!(%path, "POST");
    let metadata = parse_metadata(form)?;
    let mut db = db.write().await;
    if db.contains_key(&path) {
        return Err((StatusCode::CONFLICT, format!("already exists: /{path}")));
    }
    db.insert(
        path.clone(),
        Entry {
            data: Vec::new(),
            metadata: metadata.clone(),
        },
    );
    Ok((StatusCode::CREATED, Json(Stored { path: format!("/{path}"), metadata })))
}

async fn replace(
    State(db): State<Db>,
    Path(path): Path<String>,
    form: Result<Form<Upload>, FormRejection>,
) -> Result<Json<Stored>, (StatusCode, String)> {
    tracing::debug!(%path, "PUT");
    let metadata = parse_metadata(form)?;
    let mut db = db.write().await;
    db.entry(path.clone()).or_default().metadata = metadata.clone();
    Ok(Json(Stored { path: format!("/{path}"), metadata }))
}

async fn remove(State(db): State<Db>, Path(path): Path<String>) -> StatusCode {
    tracing::debug!(%path, "DELETE");
    let mut db = db.write().await;
    let before = db.len();
    db.retain(|key, _| !covers(&path, key));
    if db.len() == before {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}

/// Whether deleting `path` removes `key`: the entry itself or anything
/// below it when `path` names a directory.
fn covers(path: &str, key: &str) -> bool {
    match key.strip_prefix(path) {
        Some(rest) => rest.is_empty() || path.ends_with('/') || rest.starts_with('/'),
        None => false,
    }
}

/// Metadata from an upload form. A request without a form body carries none.
fn parse_metadata(form: Result<Form<Upload>, FormRejection>) -> Result<Value, (StatusCode, String)> {
    let raw = match form {
        Ok(Form(upload)) => upload.metadata,
        Err(FormRejection::InvalidFormContentType(_)) => None,
        Err(rejection) => return Err((rejection.status(), rejection.body_text())),
    };
    match raw {
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid metadata: {e}"))),
        None => Ok(Value::Null),
    }
}
