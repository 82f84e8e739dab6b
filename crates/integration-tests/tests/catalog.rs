//! Public catalog reads and admin product management.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use bazaar_integration_tests::TestApp;

#[tokio::test]
async fn test_public_catalog_reads() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let kitchen = app.create_category(&admin, "kitchen").await;
    let kettle = app.create_product(&admin, kitchen, "Enamel Kettle", "24.99").await;
    app.create_product(&admin, kitchen, "Cast Iron Skillet", "39.50").await;

    let (status, body) = app.get("/get-products", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, body) = app.get(&format!("/get-product/{kettle}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["name"], "Enamel Kettle");
    assert_eq!(body["product"]["price"], "24.99");

    let (status, body) = app.get("/get-categories", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["categories"][0]["slug"], "kitchen");
}

#[tokio::test]
async fn test_missing_or_malformed_product_ids() {
    let app = TestApp::new();

    let (status, _) = app.get("/get-product/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.get("/get-product/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_search_matches_substrings_ignoring_case() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let kitchen = app.create_category(&admin, "kitchen").await;
    app.create_product(&admin, kitchen, "Enamel Kettle", "24.99").await;
    app.create_product(&admin, kitchen, "Electric KETTLE", "45.00").await;
    app.create_product(&admin, kitchen, "Linen Apron", "18.00").await;

    let (status, body) = app.get("/search-products?product=kettle", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    // Wildcards are matched literally
    let (_, body) = app.get("/search-products?product=%25", None).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, _) = app.get("/search-products?product=", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_manages_products() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let kitchen = app.create_category(&admin, "kitchen").await;
    let kettle = app.create_product(&admin, kitchen, "Enamel Kettle", "24.99").await;

    let (status, body) = app.get("/admin/get-products", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["products"].as_array().unwrap().len(), 1);

    let (status, body) = app
        .put(
            &format!("/admin/update-product/{kettle}"),
            Some(&admin),
            json!({
                "category_id": kitchen,
                "name": "Enamel Kettle XL",
                "price": "29.99",
                "quantity": 5,
                "rating": 5,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Enamel Kettle XL");

    let (status, body) = app
        .get(&format!("/admin/get-product/{kettle}"), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["price"], "29.99");

    let (status, _) = app
        .delete(&format!("/admin/delete-product/{kettle}"), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .delete(&format!("/admin/delete-product/{kettle}"), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_input_is_validated() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let kitchen = app.create_category(&admin, "kitchen").await;

    let (status, _) = app
        .post(
            "/admin/add-products",
            Some(&admin),
            json!({ "category_id": kitchen, "name": "Kettle", "price": "-1" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for price in ["10000000000000000000000000", "10000000000.00", "1.999"] {
        let (status, body) = app
            .post(
                "/admin/add-products",
                Some(&admin),
                json!({ "category_id": kitchen, "name": "Kettle", "price": price }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{price}: {body}");
    }

    let (status, _) = app
        .post(
            "/admin/add-products",
            Some(&admin),
            json!({ "category_id": 4242, "name": "Kettle", "price": "1" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post(
            "/admin/add-category",
            Some(&admin),
            json!({ "name": "Kitchen", "slug": "kitchen" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_health_and_welcome() {
    let app = TestApp::new();

    let (status, body) = app.get("/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    let (status, _) = app.get("/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);
}
