//! Tests for the server-sent dashboard event stream.

mod common;

use std::time::Duration;

use axum::http::{header::CONTENT_TYPE, StatusCode};
use http_body_util::BodyExt;
use tskr_events::DashboardEvent;

use common::{build_test_app, DOER, OUTSIDER};

#[tokio::test]
async fn stream_delivers_household_events() {
    let app = build_test_app().await;
    let response = app.get(&app.households_path("/events"), DOER).await;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/event-stream"));
    assert_eq!(app.bus.subscriber_count(), 1);

    // Another household's event is filtered out before this one arrives.
    app.bus.publish(&DashboardEvent::AssignmentsChanged {
        household_id: app.household_id + 1,
        assigned_to_id: DOER,
    });
    app.bus.publish(&DashboardEvent::RewardClaimed {
        household_id: app.household_id,
        user_id: DOER,
        entry_id: 1,
        remaining: 5,
    });

    let mut body = response.into_body();
    let frame = tokio::time::timeout(Duration::from_secs(2), body.frame())
        .await
        .expect("event frame in time")
        .expect("stream still open")
        .unwrap();
    let bytes = frame.into_data().unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(text.contains("event: reward_claimed"), "got: {text}");
    assert!(text.contains("\"remaining\":5"), "got: {text}");
}

#[tokio::test]
async fn dropping_stream_unsubscribes() {
    let app = build_test_app().await;
    let response = app.get(&app.households_path("/events"), DOER).await;
    assert_eq!(app.bus.subscriber_count(), 1);

    drop(response);

    assert_eq!(app.bus.subscriber_count(), 0);
}

#[tokio::test]
async fn non_member_cannot_subscribe() {
    let app = build_test_app().await;
    let response = app.get(&app.households_path("/events"), OUTSIDER).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.bus.subscriber_count(), 0);
}

#[tokio::test]
async fn unread_client_does_not_hold_back_others() {
    let app = build_test_app().await;
    let idle = app.get(&app.households_path("/events"), DOER).await;
    let active = app.get(&app.households_path("/events"), DOER).await;
    assert_eq!(app.bus.subscriber_count(), 2);

    // Far more events than one client buffers; the idle stream is never read.
    for entry_id in 0..100 {
        let reached = app.bus.publish(&DashboardEvent::RewardClaimed {
            household_id: app.household_id,
            user_id: DOER,
            entry_id,
            remaining: entry_id,
        });
        assert_eq!(reached, 2);
    }

    let mut body = active.into_body();
    let frame = tokio::time::timeout(Duration::from_secs(2), body.frame())
        .await
        .expect("event frame in time")
        .expect("stream still open")
        .unwrap();
    let text = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();
    assert!(text.contains("\"entry_id\":0"), "got: {text}");

    // A lagging client stays subscribed and only loses the overflow.
    assert_eq!(app.bus.subscriber_count(), 2);
    drop(idle);
    assert_eq!(app.bus.subscriber_count(), 1);
}
