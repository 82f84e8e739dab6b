//! Cart line operations through the HTTP surface.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use bazaar_integration_tests::TestApp;

struct Shop {
    app: TestApp,
    admin: String,
    shopper: String,
    category: i64,
}

async fn shop() -> Shop {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let shopper = app.signup("Ayesha", "ayesha@example.com", "03001234567").await;
    let category = app.create_category(&admin, "kitchen").await;
    Shop {
        app,
        admin,
        shopper,
        category,
    }
}

#[tokio::test]
async fn test_adding_twice_increments_one_line() {
    let s = shop().await;
    let kettle = s.app.create_product(&s.admin, s.category, "Enamel Kettle", "24.99").await;

    for _ in 0..2 {
        let (status, body) = s
            .app
            .get(&format!("/addtocart?id={kettle}"), Some(&s.shopper))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    let (status, body) = s.app.get("/listcart", Some(&s.shopper)).await;
    assert_eq!(status, StatusCode::OK);
    let lines = body["cartItems"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["quantity"], 2);
    assert_eq!(lines[0]["product_name"], "Enamel Kettle");
    assert_eq!(lines[0]["price"], "24.99");
}

#[tokio::test]
async fn test_add_rejects_bad_and_unknown_products() {
    let s = shop().await;

    let (status, _) = s.app.get("/addtocart?id=999", Some(&s.shopper)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = s.app.get("/addtocart?id=0", Some(&s.shopper)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = s.app.get("/addtocart?id=kettle", Some(&s.shopper)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = s.app.get("/addtocart", Some(&s.shopper)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_update_quantity_and_remove() {
    let s = shop().await;
    let kettle = s.app.create_product(&s.admin, s.category, "Enamel Kettle", "24.99").await;
    let apron = s.app.create_product(&s.admin, s.category, "Linen Apron", "18.00").await;
    s.app.get(&format!("/addtocart?id={kettle}"), Some(&s.shopper)).await;

    let (status, body) = s
        .app
        .get(&format!("/updatequantity?id={kettle}&qty=5"), Some(&s.shopper))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["quantity"], 5);

    let (status, _) = s
        .app
        .get(&format!("/updatequantity?id={kettle}&qty=0"), Some(&s.shopper))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = s
        .app
        .get(&format!("/updatequantity?id={apron}&qty=2"), Some(&s.shopper))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = s
        .app
        .get(&format!("/removefromcart?id={kettle}"), Some(&s.shopper))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = s
        .app
        .get(&format!("/removefromcart?id={kettle}"), Some(&s.shopper))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = s.app.get("/listcart", Some(&s.shopper)).await;
    assert!(body["cartItems"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_line_quantity_is_capped() {
    let s = shop().await;
    let kettle = s.app.create_product(&s.admin, s.category, "Enamel Kettle", "24.99").await;
    s.app.get(&format!("/addtocart?id={kettle}"), Some(&s.shopper)).await;

    let (status, _) = s
        .app
        .get(&format!("/updatequantity?id={kettle}&qty={}", i32::MAX), Some(&s.shopper))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = s
        .app
        .get(&format!("/updatequantity?id={kettle}&qty=9999"), Some(&s.shopper))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, body) = s
        .app
        .get(&format!("/addtocart?id={kettle}"), Some(&s.shopper))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (_, body) = s.app.get("/listcart", Some(&s.shopper)).await;
    assert_eq!(body["cartItems"][0]["quantity"], 9999);
}

#[tokio::test]
async fn test_carts_are_per_user_and_clearable() {
    let s = shop().await;
    let other = s.app.signup("Bilal", "bilal@example.com", "03007654321").await;
    let kettle = s.app.create_product(&s.admin, s.category, "Enamel Kettle", "24.99").await;
    let apron = s.app.create_product(&s.admin, s.category, "Linen Apron", "18.00").await;

    s.app.get(&format!("/addtocart?id={kettle}"), Some(&s.shopper)).await;
    s.app.get(&format!("/addtocart?id={apron}"), Some(&s.shopper)).await;
    s.app.get(&format!("/addtocart?id={kettle}"), Some(&other)).await;

    let (status, body) = s.app.get("/clearcart", Some(&s.shopper)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], 2);

    let (_, body) = s.app.get("/listcart", Some(&s.shopper)).await;
    assert!(body["cartItems"].as_array().unwrap().is_empty());
    let (_, body) = s.app.get("/listcart", Some(&other)).await;
    assert_eq!(body["cartItems"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_cart_keeps_price_snapshot_and_follows_product_deletion() {
    let s = shop().await;
    let kettle = s.app.create_product(&s.admin, s.category, "Enamel Kettle", "24.99").await;
    s.app.get(&format!("/addtocart?id={kettle}"), Some(&s.shopper)).await;

    let (status, _) = s
        .app
        .put(
            &format!("/admin/update-product/{kettle}"),
            Some(&s.admin),
            json!({ "category_id": s.category, "name": "Enamel Kettle", "price": "99.00" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = s.app.get("/listcart", Some(&s.shopper)).await;
    assert_eq!(body["cartItems"][0]["price"], "24.99");

    let (status, _) = s
        .app
        .delete(&format!("/admin/delete-product/{kettle}"), Some(&s.admin))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = s.app.get("/listcart", Some(&s.shopper)).await;
    assert!(body["cartItems"].as_array().unwrap().is_empty());
}
