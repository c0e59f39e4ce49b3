//! Integration tests for upload intake validation and static file serving.

mod common;

use common::{file_part, jpeg_part, product_form, TestHarness};

#[tokio::test]
async fn txt_upload_rejected_before_any_row_exists() {
    let (h, addr) = TestHarness::with_server().await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/products"))
        .multipart(
            product_form("Widget", "9.99", "3").part("images", file_part("notes.txt", "text/plain")),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let products: Vec<serde_json::Value> = reqwest::get(format!("http://{addr}/api/products"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(products.is_empty(), "no row may exist after a rejected batch");
    assert_eq!(h.stored_file_count(), 0);
}

#[tokio::test]
async fn mismatched_content_type_rejects_batch() {
    let (h, addr) = TestHarness::with_server().await;

    // Extension is fine, declared type is not in the image family.
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/products"))
        .multipart(
            product_form("Widget", "9.99", "3")
                .part("images", file_part("photo.jpg", "application/octet-stream")),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(h.stored_file_count(), 0);
}

#[tokio::test]
async fn one_bad_file_rejects_whole_batch_and_cleans_up() {
    let (h, addr) = TestHarness::with_server().await;

    // First file is valid and hits disk before the second is seen; the
    // rejection must sweep it away.
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/products"))
        .multipart(
            product_form("Widget", "9.99", "3")
                .part("images", jpeg_part("ok.jpg"))
                .part("images", file_part("bad.txt", "text/plain")),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(h.stored_file_count(), 0);
}

#[tokio::test]
async fn more_than_five_images_rejected() {
    let (h, addr) = TestHarness::with_server().await;

    let mut form = product_form("Widget", "9.99", "3");
    for i in 0..6 {
        form = form.part("images", jpeg_part(&format!("img{i}.jpg")));
    }

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/products"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(h.stored_file_count(), 0);
}

#[tokio::test]
async fn oversized_file_rejected() {
    let (h, addr) = TestHarness::with_server().await;

    let big = vec![0u8; 5 * 1024 * 1024 + 1];
    let part = reqwest::multipart::Part::bytes(big)
        .file_name("big.jpg")
        .mime_str("image/jpeg")
        .unwrap();

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/products"))
        .multipart(product_form("Widget", "9.99", "3").part("images", part))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(h.stored_file_count(), 0);
}

#[tokio::test]
async fn uploaded_file_served_statically() {
    let (_h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/api/products"))
        .multipart(product_form("Widget", "9.99", "3").part("images", jpeg_part("pic.jpg")))
        .send()
        .await
        .unwrap();
    let id = resp.json::<serde_json::Value>().await.unwrap()["id"]
        .as_i64()
        .unwrap();

    let product: serde_json::Value = reqwest::get(format!("http://{addr}/api/products/{id}"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let path = product["images"][0].as_str().unwrap();

    let resp = reqwest::get(format!("http://{addr}{path}")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let bytes = resp.bytes().await.unwrap();
    assert_eq!(&bytes[..4], &[0xFF, 0xD8, 0xFF, 0xE0]);
}

#[tokio::test]
async fn missing_upload_returns_404() {
    let (_h, addr) = TestHarness::with_server().await;

    let resp = reqwest::get(format!("http://{addr}/uploads/never_stored.jpg"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
