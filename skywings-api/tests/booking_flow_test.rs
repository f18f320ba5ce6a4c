mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use common::{fill_funnel, guest_token, harness, seed_aircraft, seed_bookable_flight, seed_flight};

#[tokio::test]
async fn test_funnel_requires_session() {
    let h = harness();
    let response = h.server.get("/booking/context").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_and_taken_seats_are_left_unset() {
    let h = harness();
    let flight = seed_bookable_flight(&h.store).await;
    let token = guest_token(&h.server).await;

    h.server
        .post("/booking/start")
        .authorization_bearer(&token)
        .json(&json!({ "flight_id": flight.id, "passengers": 3 }))
        .await
        .assert_status_ok();

    let response = h
        .server
        .post("/booking/seats")
        .authorization_bearer(&token)
        .json(&json!({ "seats": ["2b", "99Z", "2B"] }))
        .await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    assert_eq!(body["seats"], json!(["2B", null, null]));
    assert_eq!(body["rejected"], json!(["99Z", "2B"]));
    assert_eq!(body["context"]["stage"], "PASSENGER_CAPTURE");
}

#[tokio::test]
async fn test_seats_need_a_selected_flight() {
    let h = harness();
    let token = guest_token(&h.server).await;
    let response = h
        .server
        .post("/booking/seats")
        .authorization_bearer(&token)
        .json(&json!({ "seats": ["1A"] }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_passenger_capture_requires_lead_email() {
    let h = harness();
    let flight = seed_bookable_flight(&h.store).await;
    let token = guest_token(&h.server).await;
    h.server
        .post("/booking/start")
        .authorization_bearer(&token)
        .json(&json!({ "flight_id": flight.id }))
        .await
        .assert_status_ok();

    let response = h
        .server
        .post("/booking/passengers")
        .authorization_bearer(&token)
        .json(&json!({
            "lead": { "first_name": "Ada", "last_name": "Lovelace", "email": "not-an-email" }
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_quote_matches_pricing_rules() {
    let h = harness();
    let flight = seed_bookable_flight(&h.store).await;
    let token = guest_token(&h.server).await;
    fill_funnel(&h.server, &token, &flight).await;

    let response = h
        .server
        .get("/booking/quote")
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    assert_eq!(body["pricing"]["fare_total_cents"], 44000);
    assert_eq!(body["pricing"]["upgrade_cents"], 45000);
    assert_eq!(body["pricing"]["bag_fees_cents"], 5000);
    assert_eq!(body["pricing"]["tax_cents"], 12220);
    assert_eq!(body["pricing"]["total_cents"], 106220);
    assert_eq!(body["formatted_total"], "$1,062.20");
}

#[tokio::test]
async fn test_mock_payment_books_and_clears_context() {
    let h = harness();
    let flight = seed_bookable_flight(&h.store).await;
    let token = guest_token(&h.server).await;
    fill_funnel(&h.server, &token, &flight).await;

    let response = h
        .server
        .post("/payments/mock")
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let receipt = response.json::<Value>();
    let booking_ref = receipt["booking_ref"].as_str().expect("booking_ref");
    assert!(booking_ref.starts_with(&format!("SW{:04}", flight.id)));
    assert_eq!(booking_ref.len(), 12);
    assert_eq!(receipt["total_cents"], 106220);
    assert_eq!(receipt["payment"]["status"], "SUCCEEDED");
    assert!(receipt["booking_id"].is_null());

    let ctx = h
        .server
        .get("/booking/context")
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert!(ctx["flight_id"].is_null());

    let seat_map = h
        .server
        .get(&format!("/api/flights/{}/seats", flight.id))
        .await
        .json::<Value>();
    assert_eq!(seat_map["occupied"], json!(["1A", "3C"]));

    let trips = h.server.get("/trips").authorization_bearer(&token).await.json::<Value>();
    let upcoming = trips["upcoming"].as_array().expect("upcoming");
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0]["booking_ref"], booking_ref);
    assert_eq!(upcoming[0]["baggage"]["total"], 3);
    assert_eq!(upcoming[0]["pax"][1]["name"], "Charles Babbage");
}

#[tokio::test]
async fn test_payment_without_flight_is_rejected() {
    let h = harness();
    let token = guest_token(&h.server).await;
    let response = h
        .server
        .post("/payments/mock")
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_declined_card_returns_provider_message() {
    let h = harness();
    let flight = seed_bookable_flight(&h.store).await;
    let token = guest_token(&h.server).await;
    fill_funnel(&h.server, &token, &flight).await;

    let next_year = Utc::now().date_naive().format("%Y").to_string().parse::<i32>().expect("year") + 1;
    let response = h
        .server
        .post("/payments/card")
        .authorization_bearer(&token)
        .json(&json!({
            "number": common::DECLINED_CARD,
            "exp_month": 12,
            "exp_year": next_year,
            "cvc": "123"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "Your card was declined.");

    // the context survives a failed charge
    let ctx = h
        .server
        .get("/booking/context")
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(ctx["flight_id"], flight.id);
}

#[tokio::test]
async fn test_card_and_paypal_payments_succeed() {
    let h = harness();
    let flight = seed_bookable_flight(&h.store).await;

    let token = guest_token(&h.server).await;
    fill_funnel(&h.server, &token, &flight).await;
    let next_year = Utc::now().date_naive().format("%Y").to_string().parse::<i32>().expect("year") + 1;
    let response = h
        .server
        .post("/payments/card")
        .authorization_bearer(&token)
        .json(&json!({
            "number": "4242 4242 4242 4242",
            "exp_month": 1,
            "exp_year": next_year,
            "cvc": "123",
            "holder_name": "Ada Lovelace"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["payment"]["method"], "card");

    let other = guest_token(&h.server).await;
    h.server
        .post("/booking/start")
        .authorization_bearer(&other)
        .json(&json!({ "flight_id": flight.id }))
        .await
        .assert_status_ok();
    let bad = h
        .server
        .post("/payments/paypal")
        .authorization_bearer(&other)
        .json(&json!({ "payer_email": "nobody" }))
        .await;
    assert_eq!(bad.status_code(), StatusCode::BAD_REQUEST);

    let response = h
        .server
        .post("/payments/paypal")
        .authorization_bearer(&other)
        .json(&json!({ "payer_email": "payer@example.com" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["payment"]["method"], "paypal");
}

#[tokio::test]
async fn test_trip_cancel_and_rebook() {
    let h = harness();
    let flight = seed_bookable_flight(&h.store).await;
    let token = guest_token(&h.server).await;
    fill_funnel(&h.server, &token, &flight).await;
    let receipt = h
        .server
        .post("/payments/mock")
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    let booking_ref = receipt["booking_ref"].as_str().expect("booking_ref").to_string();

    let missing = h
        .server
        .post("/trips/cancel")
        .authorization_bearer(&token)
        .json(&json!({}))
        .await;
    assert_eq!(missing.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(missing.json::<Value>()["error"], "Missing booking_ref");

    let stranger = guest_token(&h.server).await;
    let not_mine = h
        .server
        .post("/trips/cancel")
        .authorization_bearer(&stranger)
        .json(&json!({ "booking_ref": booking_ref }))
        .await;
    assert_eq!(not_mine.status_code(), StatusCode::NOT_FOUND);

    let cancel = h
        .server
        .post("/trips/cancel")
        .authorization_bearer(&token)
        .json(&json!({ "booking_ref": booking_ref, "reason": "Plans changed" }))
        .await;
    cancel.assert_status_ok();
    assert_eq!(cancel.json::<Value>()["status"], "Cancelled");

    let trips = h.server.get("/trips").authorization_bearer(&token).await.json::<Value>();
    assert_eq!(trips["cancelled"].as_array().expect("cancelled").len(), 1);
    let seat_map = h
        .server
        .get(&format!("/api/flights/{}/seats", flight.id))
        .await
        .json::<Value>();
    assert!(seat_map["occupied"].as_array().expect("occupied").is_empty());

    let rebook = h
        .server
        .post("/trips/rebook")
        .authorization_bearer(&token)
        .json(&json!({ "booking_ref": booking_ref }))
        .await;
    rebook.assert_status_ok();
    let body = rebook.json::<Value>();
    assert_eq!(body["status"], "On time");
    assert_eq!(body["price_cents"], 22000);
    assert_eq!(body["origin"], "YYZ");
}

#[tokio::test]
async fn test_trip_rebook_inside_cutoff_is_rejected() {
    let h = harness();
    let aircraft = seed_aircraft(&h.store).await;
    let flight = seed_flight(
        &h.store,
        "YYZ",
        "YUL",
        Utc::now() + Duration::minutes(90),
        12000,
        Some(&aircraft),
    )
    .await;
    let token = guest_token(&h.server).await;
    fill_funnel(&h.server, &token, &flight).await;
    let receipt = h
        .server
        .post("/payments/mock")
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    let booking_ref = receipt["booking_ref"].as_str().expect("booking_ref").to_string();

    h.server
        .post("/trips/cancel")
        .authorization_bearer(&token)
        .json(&json!({ "booking_ref": booking_ref }))
        .await
        .assert_status_ok();

    let rebook = h
        .server
        .post("/trips/rebook")
        .authorization_bearer(&token)
        .json(&json!({ "booking_ref": booking_ref }))
        .await;
    assert_eq!(rebook.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(rebook.json::<Value>()["error"], "Flight no longer available");
}

#[tokio::test]
async fn test_extra_bags_above_limit_are_rejected() {
    let h = harness();
    let flight = seed_bookable_flight(&h.store).await;
    let token = guest_token(&h.server).await;
    h.server
        .post("/booking/start")
        .authorization_bearer(&token)
        .json(&json!({ "flight_id": flight.id, "passengers": 1 }))
        .await
        .assert_status_ok();

    let response = h
        .server
        .post("/booking/passengers")
        .authorization_bearer(&token)
        .json(&json!({
            "lead": { "first_name": "Ada", "last_name": "Lovelace", "email": "ada@example.com" },
            "passengers": [{ "cabin": "Economy", "extra_bags": 11 }]
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let quote = h.server.get("/booking/quote").authorization_bearer(&token).await;
    quote.assert_status_ok();
    assert_eq!(quote.json::<Value>()["pricing"]["extra_bags"], 0);
}

#[tokio::test]
async fn test_trip_cancel_after_departure_is_rejected() {
    let h = harness();
    let aircraft = seed_aircraft(&h.store).await;
    let flight = seed_flight(
        &h.store,
        "YYZ",
        "YUL",
        Utc::now() + Duration::seconds(3),
        12000,
        Some(&aircraft),
    )
    .await;
    let token = guest_token(&h.server).await;
    fill_funnel(&h.server, &token, &flight).await;
    let receipt = h
        .server
        .post("/payments/mock")
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    let booking_ref = receipt["booking_ref"].as_str().expect("booking_ref").to_string();

    tokio::time::sleep(std::time::Duration::from_millis(3500)).await;

    let cancel = h
        .server
        .post("/trips/cancel")
        .authorization_bearer(&token)
        .json(&json!({ "booking_ref": booking_ref }))
        .await;
    assert_eq!(cancel.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        cancel.json::<Value>()["error"],
        "This flight can no longer be canceled online."
    );

    let trips = h.server.get("/trips").authorization_bearer(&token).await.json::<Value>();
    assert!(trips["cancelled"].as_array().expect("cancelled").is_empty());
    assert_eq!(trips["past"].as_array().expect("past").len(), 1);
}

#[tokio::test]
async fn test_trip_cancel_twice_or_with_malformed_reference() {
    let h = harness();
    let flight = seed_bookable_flight(&h.store).await;
    let token = guest_token(&h.server).await;
    fill_funnel(&h.server, &token, &flight).await;
    let receipt = h
        .server
        .post("/payments/mock")
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    let booking_ref = receipt["booking_ref"].as_str().expect("booking_ref").to_string();

    let malformed = h
        .server
        .post("/trips/cancel")
        .authorization_bearer(&token)
        .json(&json!({ "booking_ref": "DROP TABLE" }))
        .await;
    assert_eq!(malformed.status_code(), StatusCode::NOT_FOUND);

    h.server
        .post("/trips/cancel")
        .authorization_bearer(&token)
        .json(&json!({ "booking_ref": booking_ref.to_ascii_lowercase() }))
        .await
        .assert_status_ok();

    let again = h
        .server
        .post("/trips/cancel")
        .authorization_bearer(&token)
        .json(&json!({ "booking_ref": booking_ref }))
        .await;
    assert_eq!(again.status_code(), StatusCode::BAD_REQUEST);
}
