mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use skywings_catalog::CabinClass;
use skywings_order::{BookingRepository, NewBooking};

use common::{fill_funnel, guest_token, harness, login, register, seed_bookable_flight};

#[tokio::test]
async fn test_register_login_and_duplicate_email() {
    let h = harness();
    register(&h.server, "Ada@Example.com").await;

    let duplicate = h
        .server
        .post("/auth/register")
        .json(&json!({
            "email": "ada@example.com",
            "password": "another-pass",
            "confirm_password": "another-pass"
        }))
        .await;
    assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);

    login(&h.server, "ada@example.com", "s3cure-pass").await;

    let wrong = h
        .server
        .post("/auth/login")
        .json(&json!({ "email": "ada@example.com", "password": "nope-nope" }))
        .await;
    assert_eq!(wrong.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_rejects_short_or_mismatched_password() {
    let h = harness();
    for (password, confirm) in [("short", "short"), ("long-enough", "different")] {
        let response = h
            .server
            .post("/auth/register")
            .json(&json!({
                "email": "grace@example.com",
                "password": password,
                "confirm_password": confirm
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_guest_cannot_open_customer_pages() {
    let h = harness();
    let token = guest_token(&h.server).await;
    let response = h.server.get("/bookings/my").authorization_bearer(&token).await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_profile_and_travelers() {
    let h = harness();
    let (token, _) = register(&h.server, "ada@example.com").await;

    let profile = h
        .server
        .put("/account/profile")
        .authorization_bearer(&token)
        .json(&json!({ "first_name": " Augusta ", "last_name": "King", "phone": "" }))
        .await;
    profile.assert_status_ok();
    let body = profile.json::<Value>();
    assert_eq!(body["first_name"], "Augusta");
    assert!(body["phone"].is_null());
    assert!(body.get("password_hash").is_none());

    let blank = h
        .server
        .post("/account/travelers")
        .authorization_bearer(&token)
        .json(&json!({ "full_name": "  " }))
        .await;
    assert_eq!(blank.status_code(), StatusCode::BAD_REQUEST);

    let created = h
        .server
        .post("/account/travelers")
        .authorization_bearer(&token)
        .json(&json!({ "full_name": "Byron King", "passport_number": "ab123456" }))
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    let traveler = created.json::<Value>();
    assert_eq!(traveler["passport_number"], "AB123456");
    let traveler_id = traveler["id"].as_i64().expect("id");

    let list = h
        .server
        .get("/account/travelers")
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(list.as_array().expect("travelers").len(), 1);

    let (other, _) = register(&h.server, "grace@example.com").await;
    let foreign = h
        .server
        .delete(&format!("/account/travelers/{}", traveler_id))
        .authorization_bearer(&other)
        .await;
    assert_eq!(foreign.status_code(), StatusCode::NOT_FOUND);

    let deleted = h
        .server
        .delete(&format!("/account/travelers/{}", traveler_id))
        .authorization_bearer(&token)
        .await;
    assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_customer_checkout_cancel_and_rebook() {
    let h = harness();
    let flight = seed_bookable_flight(&h.store).await;
    let (token, _) = register(&h.server, "ada@example.com").await;
    fill_funnel(&h.server, &token, &flight).await;

    let receipt = h
        .server
        .post("/payments/mock")
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    let booking_id = receipt["booking_id"].as_i64().expect("booking id");

    let mine = h.server.get("/bookings/my").authorization_bearer(&token).await.json::<Value>();
    assert_eq!(mine["upcoming"].as_array().expect("upcoming").len(), 1);
    assert_eq!(mine["upcoming"][0]["ticket_class"], "Business");
    assert_eq!(mine["show_cancel_banner"], false);

    let unacknowledged = h
        .server
        .post(&format!("/bookings/{}/cancel", booking_id))
        .authorization_bearer(&token)
        .json(&json!({ "reason": "Changed plans" }))
        .await;
    assert_eq!(unacknowledged.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        unacknowledged.json::<Value>()["error"],
        "You must acknowledge the cancellation policy."
    );

    let canceled = h
        .server
        .post(&format!("/bookings/{}/cancel", booking_id))
        .authorization_bearer(&token)
        .json(&json!({ "acknowledged": true, "reason": "  Changed plans " }))
        .await;
    canceled.assert_status_ok();
    let body = canceled.json::<Value>();
    assert_eq!(body["status"], "CANCELED");
    assert_eq!(body["cancellation_reason"], "Changed plans");

    let mine = h.server.get("/bookings/my").authorization_bearer(&token).await.json::<Value>();
    assert_eq!(mine["canceled"].as_array().expect("canceled").len(), 1);
    assert_eq!(mine["show_cancel_banner"], true);

    let rebooked = h
        .server
        .post(&format!("/bookings/{}/rebook", booking_id))
        .authorization_bearer(&token)
        .await;
    rebooked.assert_status_ok();
    let body = rebooked.json::<Value>();
    assert_eq!(body["status"], "UPCOMING");
    assert!(body["canceled_at"].is_null());

    let again = h
        .server
        .post(&format!("/bookings/{}/rebook", booking_id))
        .authorization_bearer(&token)
        .await;
    assert_eq!(again.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancel_after_departure_is_rejected() {
    let h = harness();
    let (token, user_id) = register(&h.server, "ada@example.com").await;
    let departed = Utc::now() - Duration::hours(5);

    let booking = BookingRepository::create(
        h.store.as_ref(),
        &NewBooking {
            user_id,
            flight_id: 1,
            airline: "SkyWings".to_string(),
            flight_number: "SW0001".to_string(),
            origin: "YYZ".to_string(),
            destination: "LHR".to_string(),
            departure_time: departed,
            arrival_time: departed + Duration::hours(3),
            ticket_class: CabinClass::Economy,
            booking_reference: "SW0001123456".to_string(),
            total_paid_cents: 22600,
            extras: json!({}),
        },
    )
    .await
    .expect("seed booking");

    let response = h
        .server
        .post(&format!("/bookings/{}/cancel", booking.id))
        .authorization_bearer(&token)
        .json(&json!({ "acknowledged": true }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"],
        "This flight can no longer be canceled online."
    );

    let mine = h.server.get("/bookings/my").authorization_bearer(&token).await.json::<Value>();
    assert_eq!(mine["past"].as_array().expect("past").len(), 1);
}

#[tokio::test]
async fn test_other_customers_bookings_are_hidden() {
    let h = harness();
    let flight = seed_bookable_flight(&h.store).await;
    let (owner, _) = register(&h.server, "ada@example.com").await;
    fill_funnel(&h.server, &owner, &flight).await;
    let receipt = h
        .server
        .post("/payments/mock")
        .authorization_bearer(&owner)
        .await
        .json::<Value>();
    let booking_id = receipt["booking_id"].as_i64().expect("booking id");

    let (intruder, _) = register(&h.server, "eve@example.com").await;
    let response = h
        .server
        .post(&format!("/bookings/{}/cancel", booking_id))
        .authorization_bearer(&intruder)
        .json(&json!({ "acknowledged": true }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_booking_and_trip_views_stay_in_step() {
    let h = harness();
    let flight = seed_bookable_flight(&h.store).await;
    let (token, _) = register(&h.server, "ada@example.com").await;
    fill_funnel(&h.server, &token, &flight).await;
    let receipt = h
        .server
        .post("/payments/mock")
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    let booking_id = receipt["booking_id"].as_i64().expect("booking id");
    let booking_ref = receipt["booking_ref"].as_str().expect("booking_ref").to_string();

    h.server
        .post(&format!("/bookings/{}/cancel", booking_id))
        .authorization_bearer(&token)
        .json(&json!({ "acknowledged": true }))
        .await
        .assert_status_ok();
    let trips = h.server.get("/trips").authorization_bearer(&token).await.json::<Value>();
    assert_eq!(trips["cancelled"].as_array().expect("cancelled").len(), 1);

    h.server
        .post("/trips/rebook")
        .authorization_bearer(&token)
        .json(&json!({ "booking_ref": booking_ref }))
        .await
        .assert_status_ok();
    let mine = h.server.get("/bookings/my").authorization_bearer(&token).await.json::<Value>();
    assert_eq!(mine["upcoming"].as_array().expect("upcoming").len(), 1);
    assert!(mine["canceled"].as_array().expect("canceled").is_empty());

    h.server
        .post("/trips/cancel")
        .authorization_bearer(&token)
        .json(&json!({ "booking_ref": booking_ref, "reason": " Sick " }))
        .await
        .assert_status_ok();
    let mine = h.server.get("/bookings/my").authorization_bearer(&token).await.json::<Value>();
    let canceled = mine["canceled"].as_array().expect("canceled");
    assert_eq!(canceled.len(), 1);
    assert_eq!(canceled[0]["cancellation_reason"], "Sick");
    assert_eq!(mine["show_cancel_banner"], true);

    h.server
        .post(&format!("/bookings/{}/rebook", booking_id))
        .authorization_bearer(&token)
        .await
        .assert_status_ok();
    let trips = h.server.get("/trips").authorization_bearer(&token).await.json::<Value>();
    assert_eq!(trips["upcoming"].as_array().expect("upcoming").len(), 1);
    assert!(trips["cancelled"].as_array().expect("cancelled").is_empty());
}

#[tokio::test]
async fn test_concurrent_logins_all_verify() {
    let h = harness();
    register(&h.server, "ada@example.com").await;

    let good = h
        .server
        .post("/auth/login")
        .json(&json!({ "email": "ada@example.com", "password": "s3cure-pass" }));
    let also_good = h
        .server
        .post("/auth/login")
        .json(&json!({ "email": "ADA@example.com", "password": "s3cure-pass" }));
    let bad = h
        .server
        .post("/auth/login")
        .json(&json!({ "email": "ada@example.com", "password": "wrong-pass" }));

    let (good, also_good, bad) = tokio::join!(
        std::future::IntoFuture::into_future(good),
        std::future::IntoFuture::into_future(also_good),
        std::future::IntoFuture::into_future(bad),
    );
    good.assert_status_ok();
    also_good.assert_status_ok();
    assert_eq!(bad.status_code(), StatusCode::UNAUTHORIZED);
}
