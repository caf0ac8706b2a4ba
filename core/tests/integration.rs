//! Full store lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises every client
//! operation over real HTTP. Validates that URL building, form encoding,
//! streaming and response parsing agree with an actual server.

use istore_core::{ApiError, Apply, ImageStore};
use serde_json::json;

/// Serve a store seeded with `images` on a random local port.
fn start_server(images: Vec<(&'static str, Vec<u8>)>) -> ImageStore {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_app(listener, mock_server::app_with_images(images)).await
        })
        .unwrap();
    });

    ImageStore::new(&format!("http://{addr}"))
}

fn pattern(n: usize) -> Vec<u8> {
    (0..n).map(|i| (i * 7 % 256) as u8).collect()
}

#[test]
fn store_lifecycle() {
    let store = start_server(Vec::new());

    // Step 1: list — empty.
    let listing = store.list("/pyistore/img/").unwrap();
    assert_eq!(listing, json!([]));

    // Step 2: post with metadata.
    let path = "/pyistore/img/http://upload.example.org/Example.jpg";
    let stored = store.post(path, Some(&json!({"name": "Expedia"}))).unwrap();
    assert_eq!(stored["path"], path);
    assert_eq!(stored["metadata"], json!({"name": "Expedia"}));

    // Step 3: post again — conflict surfaces as an HTTP error.
    let err = store.post::<serde_json::Value>(path, None).unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 409, .. }));

    // Step 4: put replaces metadata.
    let stored = store.put(path, Some(&json!({"name": "Other"}))).unwrap();
    assert_eq!(stored["metadata"]["name"], "Other");

    // Step 5: put without metadata clears it.
    let stored = store.put::<serde_json::Value>(path, None).unwrap();
    assert!(stored["metadata"].is_null());

    // Step 6: list shows the new sub-directory.
    let listing = store.list("/pyistore/img/").unwrap();
    assert_eq!(listing, json!(["http:/"]));

    // Step 7: read — freshly created entries have no content.
    let chunks: Vec<_> = store.read(path, None).unwrap().collect();
    assert!(chunks.is_empty());

    // Step 8: delete the tree.
    let resp = store.delete("/pyistore/").unwrap();
    assert_eq!(resp.status, 204);
    assert!(resp.body.is_empty());

    // Step 9: delete again — raw 404 response, not an error.
    let resp = store.delete("/pyistore/").unwrap();
    assert_eq!(resp.status, 404);

    // Step 10: read after delete — error before any chunk.
    let err = store.read(path, None).unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, ApiError::Http { ref body, .. } if body.contains("no such image")));
}

#[test]
fn read_streams_chunks() {
    let content = pattern(10_000);
    let store = start_server(vec![("/img/big", content.clone())]).with_chunk_size(4096);

    let chunks: Vec<Vec<u8>> = store
        .read("/img/big", None)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].len(), 4096);
    assert_eq!(chunks[1].len(), 4096);
    assert_eq!(chunks[2].len(), 10_000 - 2 * 4096);
    assert_eq!(chunks.concat(), content);
}

#[test]
fn read_can_be_abandoned_early() {
    let store = start_server(vec![("/img/big", pattern(50_000))]).with_chunk_size(1000);

    let first = store.read("/img/big", None).unwrap().next().unwrap().unwrap();
    assert_eq!(first.len(), 1000);

    // The dropped stream must not wedge the next request.
    let all = store.read("/img/big", None).unwrap().read_all().unwrap();
    assert_eq!(all, pattern(50_000));
}

#[test]
fn read_with_apply_runs_the_transform() {
    let store = start_server(vec![("/img/a", vec![0, 15, 240, 255])]);

    let inverted = store
        .read("/img/a", Some(&Apply::new("invert")))
        .unwrap()
        .read_all()
        .unwrap();
    assert_eq!(inverted, [255, 240, 15, 0]);

    let rect = Apply::sub_params([("x1", 50), ("y1", 50), ("x2", 100), ("y2", 100)]);
    let err = store
        .read("/img/a", Some(&Apply::new("drawRect").param("rects", vec![rect])))
        .unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 400, ref body } if body.contains("drawRect")));
}

#[test]
fn escaped_paths_reach_the_same_entry() {
    let store = start_server(vec![("/img/a b?c%d", b"odd".to_vec())]);
    let data = store.read("/img/a b?c%d", None).unwrap().read_all().unwrap();
    assert_eq!(data, b"odd");
}
