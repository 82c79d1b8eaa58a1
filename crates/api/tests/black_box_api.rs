use std::sync::Arc;

use chrono::{Duration, Utc};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use marketplace_infra::entity_store::InMemoryEntityStore;
use marketplace_infra::FixedClock;

struct TestServer {
    base_url: String,
    clock: Arc<FixedClock>,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over a fresh in-memory store, bound to an ephemeral port.
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let app = marketplace_api::app::app_with_store(
            Arc::new(InMemoryEntityStore::new()),
            clock.clone(),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            clock,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self.client.post(self.url(path)).json(&body).send().await.unwrap();
        read(res).await
    }

    async fn put(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self.client.put(self.url(path)).json(&body).send().await.unwrap();
        read(res).await
    }

    async fn patch(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self.client.patch(self.url(path)).json(&body).send().await.unwrap();
        read(res).await
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).send().await.unwrap();
        read(res).await
    }

    async fn delete(&self, path: &str) -> (StatusCode, Value) {
        let res = self.client.delete(self.url(path)).send().await.unwrap();
        read(res).await
    }

    async fn register(&self, kind: &str, name: &str, email: &str) -> String {
        let (status, body) = self
            .post(&format!("/api/{kind}"), json!({ "name": name, "email": email }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }

    async fn list_item(&self, seller_id: &str, price: &str, quantity: i64) -> String {
        let (status, body) = self
            .post(
                &format!("/api/sellers/{seller_id}/items"),
                json!({ "name": "Desk lamp", "price": price, "quantity": quantity }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }

    async fn buy(&self, buyer_id: &str, item_id: &str, quantity: i64) -> (StatusCode, Value) {
        self.post(
            "/api/purchases",
            json!({ "buyer_id": buyer_id, "item_id": item_id, "quantity": quantity }),
        )
        .await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn read(res: reqwest::Response) -> (StatusCode, Value) {
    let status = res.status();
    let text = res.text().await.unwrap();
    let body = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };
    (status, body)
}

fn decimal(v: &Value) -> Decimal {
    v.as_str()
        .map(|s| s.parse().unwrap())
        .unwrap_or_else(|| v.to_string().parse().unwrap())
}

#[tokio::test]
async fn health_is_ok() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn buy_decrements_stock_and_snapshots_price() {
    let srv = TestServer::spawn().await;
    let seller = srv.register("sellers", "Sam Seller", "sam@example.com").await;
    let buyer = srv.register("buyers", "Bea Buyer", "bea@example.com").await;
    let item = srv.list_item(&seller, "10.0", 5).await;

    let (status, purchase) = srv.buy(&buyer, &item, 3).await;
    assert_eq!(status, StatusCode::CREATED, "{purchase}");
    assert_eq!(decimal(&purchase["unit_price"]), Decimal::new(10, 0));
    assert_eq!(decimal(&purchase["total_price"]), Decimal::new(30, 0));
    assert_eq!(purchase["quantity"], 3);

    let (_, stored) = srv.get(&format!("/api/items/{item}")).await;
    assert_eq!(stored["quantity"], 2);

    // A later price change does not touch the recorded purchase.
    let (status, _) = srv
        .put(
            &format!("/api/items/{item}"),
            json!({ "name": "Desk lamp", "price": "99.99", "quantity": 2 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let purchase_id = purchase["id"].as_str().unwrap();
    let (_, stored) = srv.get(&format!("/api/purchases/{purchase_id}")).await;
    assert_eq!(decimal(&stored["total_price"]), Decimal::new(30, 0));
}

#[tokio::test]
async fn buy_more_than_stock_is_conflict_and_changes_nothing() {
    let srv = TestServer::spawn().await;
    let seller = srv.register("sellers", "Sam Seller", "sam@example.com").await;
    let buyer = srv.register("buyers", "Bea Buyer", "bea@example.com").await;
    let item = srv.list_item(&seller, "10.0", 2).await;

    let (status, body) = srv.buy(&buyer, &item, 5).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "insufficient_stock");

    let (_, stored) = srv.get(&format!("/api/items/{item}")).await;
    assert_eq!(stored["quantity"], 2);
    let (_, count) = srv.get("/api/purchases/stats/count").await;
    assert_eq!(count["count"], 0);
}

#[tokio::test]
async fn buy_rejects_bad_input() {
    let srv = TestServer::spawn().await;
    let seller = srv.register("sellers", "Sam Seller", "sam@example.com").await;
    let buyer = srv.register("buyers", "Bea Buyer", "bea@example.com").await;
    let item = srv.list_item(&seller, "10.0", 2).await;

    let (status, body) = srv.buy(&buyer, &item, 0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = srv.buy("not-an-id", &item, 1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");

    // Unknown buyer: a well-formed id that was never registered.
    let (status, body) = srv.buy(&item, &item, 1).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn cancel_within_window_restocks() {
    let srv = TestServer::spawn().await;
    let seller = srv.register("sellers", "Sam Seller", "sam@example.com").await;
    let buyer = srv.register("buyers", "Bea Buyer", "bea@example.com").await;
    let item = srv.list_item(&seller, "10.0", 5).await;
    let (_, purchase) = srv.buy(&buyer, &item, 3).await;
    let purchase_id = purchase["id"].as_str().unwrap();

    srv.clock.advance(Duration::hours(23));
    let (status, _) = srv.delete(&format!("/api/purchases/{purchase_id}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, stored) = srv.get(&format!("/api/items/{item}")).await;
    assert_eq!(stored["quantity"], 5);
    let (status, _) = srv.get(&format!("/api/purchases/{purchase_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cancel_after_window_is_rejected() {
    let srv = TestServer::spawn().await;
    let seller = srv.register("sellers", "Sam Seller", "sam@example.com").await;
    let buyer = srv.register("buyers", "Bea Buyer", "bea@example.com").await;
    let item = srv.list_item(&seller, "10.0", 5).await;
    let (_, purchase) = srv.buy(&buyer, &item, 3).await;
    let purchase_id = purchase["id"].as_str().unwrap();

    srv.clock.advance(Duration::hours(25));
    let (status, body) = srv.delete(&format!("/api/purchases/{purchase_id}")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "policy_violation");

    let (_, stored) = srv.get(&format!("/api/items/{item}")).await;
    assert_eq!(stored["quantity"], 2);
}

#[tokio::test]
async fn validate_reports_without_buying() {
    let srv = TestServer::spawn().await;
    let seller = srv.register("sellers", "Sam Seller", "sam@example.com").await;
    let buyer = srv.register("buyers", "Bea Buyer", "bea@example.com").await;
    let item = srv.list_item(&seller, "10.0", 2).await;

    let request = |quantity: i64| json!({ "buyer_id": buyer, "item_id": item, "quantity": quantity });

    let (status, body) = srv.post("/api/purchases/validate", request(2)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);

    let (_, body) = srv.post("/api/purchases/validate", request(3)).await;
    assert_eq!(body["valid"], false);

    let (_, body) = srv.post("/api/purchases/validate", request(0)).await;
    assert_eq!(body["valid"], false);

    let (_, stored) = srv.get(&format!("/api/items/{item}")).await;
    assert_eq!(stored["quantity"], 2);
}

#[tokio::test]
async fn item_availability_answers_false_for_unknown_item() {
    let srv = TestServer::spawn().await;
    let seller = srv.register("sellers", "Sam Seller", "sam@example.com").await;
    let item = srv.list_item(&seller, "4.50", 3).await;

    let (status, body) = srv.get(&format!("/api/items/{item}/availability?quantity=3")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], true);
    assert_eq!(body["requested_quantity"], 3);

    let (_, body) = srv.get(&format!("/api/items/{seller}/availability?quantity=1")).await;
    assert_eq!(body["available"], false);
}

#[tokio::test]
async fn duplicate_email_is_conflict_regardless_of_case() {
    let srv = TestServer::spawn().await;
    srv.register("buyers", "Bea Buyer", "bea@example.com").await;

    let (status, body) = srv
        .post("/api/buyers", json!({ "name": "Other", "email": "BEA@Example.com" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, body) = srv.get("/api/buyers/by-email?email=Bea@Example.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Bea Buyer");
}

#[tokio::test]
async fn seller_with_items_cannot_be_deleted_until_items_are_gone() {
    let srv = TestServer::spawn().await;
    let seller = srv.register("sellers", "Sam Seller", "sam@example.com").await;
    let item = srv.list_item(&seller, "10.0", 1).await;

    let (status, body) = srv.delete(&format!("/api/sellers/{seller}")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "policy_violation");

    let (status, _) = srv.delete(&format!("/api/items/{item}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = srv.delete(&format!("/api/sellers/{seller}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = srv.get(&format!("/api/sellers/{seller}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn spending_and_revenue_sum_purchases() {
    let srv = TestServer::spawn().await;
    let seller = srv.register("sellers", "Sam Seller", "sam@example.com").await;
    let buyer = srv.register("buyers", "Bea Buyer", "bea@example.com").await;
    let lamp = srv.list_item(&seller, "10.0", 5).await;
    let chair = srv.list_item(&seller, "2.50", 10).await;

    let (_, spending) = srv.get(&format!("/api/buyers/{buyer}/spending")).await;
    assert_eq!(decimal(&spending["total_spending"]), Decimal::ZERO);

    srv.buy(&buyer, &lamp, 2).await;
    srv.buy(&buyer, &chair, 4).await;

    let (_, spending) = srv.get(&format!("/api/buyers/{buyer}/spending")).await;
    assert_eq!(decimal(&spending["total_spending"]), Decimal::new(30, 0));
    let (_, revenue) = srv.get(&format!("/api/sellers/{seller}/revenue")).await;
    assert_eq!(decimal(&revenue["total_revenue"]), Decimal::new(30, 0));

    let (_, ranking) = srv.get("/api/purchases/stats/most-purchased?limit=1").await;
    let ranking = ranking.as_array().unwrap();
    assert_eq!(ranking.len(), 1);
    assert_eq!(ranking[0]["item_id"], chair.as_str());
    assert_eq!(ranking[0]["total_quantity"], 4);

    let (_, page) = srv.get(&format!("/api/buyers/{buyer}/purchases")).await;
    assert_eq!(page["total"], 2);
    let (_, page) = srv.get(&format!("/api/sellers/{seller}/sales?limit=1")).await;
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
    assert_eq!(page["has_more"], true);
}

#[tokio::test]
async fn recent_purchases_respect_the_day_window() {
    let srv = TestServer::spawn().await;
    let seller = srv.register("sellers", "Sam Seller", "sam@example.com").await;
    let buyer = srv.register("buyers", "Bea Buyer", "bea@example.com").await;
    let item = srv.list_item(&seller, "1.00", 10).await;

    srv.buy(&buyer, &item, 1).await;
    srv.clock.advance(Duration::days(10));
    srv.buy(&buyer, &item, 1).await;

    let (_, page) = srv.get("/api/purchases/recent").await;
    assert_eq!(page["total"], 1);
    let (_, page) = srv.get("/api/purchases/recent?days=30").await;
    assert_eq!(page["total"], 2);
}

#[tokio::test]
async fn item_listing_filters_and_sorts() {
    let srv = TestServer::spawn().await;
    let seller = srv.register("sellers", "Sam Seller", "sam@example.com").await;
    srv.list_item(&seller, "30.00", 0).await;
    srv.list_item(&seller, "10.00", 4).await;
    srv.list_item(&seller, "20.00", 9).await;

    let (status, page) = srv.get("/api/items?available=true&sort=price_asc").await;
    assert_eq!(status, StatusCode::OK);
    let prices: Vec<Decimal> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| decimal(&i["price"]))
        .collect();
    assert_eq!(prices, vec![Decimal::new(10, 0), Decimal::new(20, 0)]);

    let (_, count) = srv.get("/api/items/count?max_quantity=5").await;
    assert_eq!(count["count"], 2);

    let (status, body) = srv.get("/api/items?min_price=50&max_price=10").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn quantity_patch_rejects_negative_stock() {
    let srv = TestServer::spawn().await;
    let seller = srv.register("sellers", "Sam Seller", "sam@example.com").await;
    let item = srv.list_item(&seller, "10.0", 1).await;

    let (status, body) = srv
        .patch(&format!("/api/items/{item}/quantity"), json!({ "quantity": 12 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity"], 12);

    let (status, _) = srv
        .patch(&format!("/api/items/{item}/quantity"), json!({ "quantity": -1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_path_id_is_bad_request() {
    let srv = TestServer::spawn().await;
    let (status, body) = srv.get("/api/buyers/12345").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn recent_purchases_with_huge_day_window_is_bad_request() {
    let srv = TestServer::spawn().await;
    let (status, body) = srv
        .get(&format!("/api/purchases/recent?days={}", u32::MAX))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    // The server keeps serving afterwards.
    let (status, _) = srv.get("/api/purchases/recent?days=1").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn prices_outside_the_stored_range_are_bad_request() {
    let srv = TestServer::spawn().await;
    let seller = srv.register("sellers", "Sam Seller", "sam@example.com").await;
    let buyer = srv.register("buyers", "Bea Buyer", "bea@example.com").await;

    for price in ["0.00004", "1000000000000000"] {
        let (status, body) = srv
            .post(
                &format!("/api/sellers/{seller}/items"),
                json!({ "name": "Desk lamp", "price": price, "quantity": 1 }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{price}");
        assert_eq!(body["error"], "validation_error");
    }

    // Each unit is storable; three of them are not.
    let item = srv.list_item(&seller, "400000000000000", 5).await;
    let request = json!({ "buyer_id": buyer, "item_id": item, "quantity": 3 });
    let (_, body) = srv.post("/api/purchases/validate", request).await;
    assert_eq!(body["valid"], false);
    let (status, body) = srv.buy(&buyer, &item, 3).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn unreadable_input_gets_the_json_error_shape() {
    let srv = TestServer::spawn().await;

    let res = srv
        .client
        .post(srv.url("/api/buyers"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    let (status, body) = read(res).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
    assert!(body["message"].is_string());

    let (status, body) = srv.post("/api/buyers", json!({ "name": "No Email" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");

    let (status, body) = srv.get("/api/items?limit=lots").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
}
