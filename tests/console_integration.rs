//! End-to-end console flows against a scripted inventory API

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use conch_api::test_utils::FakeTransport;
use conch_api::{ApiClient, FetchError};
use conch_app::{ActionKind, AppContext, DetailBody, ListBody, Panel, Route, RouteName};
use conch_console::{for_each_view, render_paths, HeadlessEvent};
use conch_i18n::{CatalogSet, FixedLocale, Translator};
use url::Url;

fn fixture(source: &str) -> serde_json::Value {
    serde_json::from_str(source).expect("fixture should be valid JSON")
}

fn inventory() -> Arc<FakeTransport> {
    let fake = FakeTransport::new();
    fake.respond("/rack", fixture(include_str!("fixtures/inventory/racks.json")));
    fake.respond("/device", fixture(include_str!("fixtures/inventory/devices.json")));
    fake.respond(
        "/device/HX-101",
        fixture(include_str!("fixtures/inventory/device_hx101.json")),
    );
    fake.respond(
        "/problem",
        fixture(include_str!("fixtures/inventory/problems.json")),
    );
    fake.respond("/relay", fixture(include_str!("fixtures/inventory/relays.json")));
    fake.respond(
        "/relay/RL-1",
        fixture(include_str!("fixtures/inventory/relay_rl1.json")),
    );
    fake.respond(
        "/device/HX-101/location",
        fixture(include_str!("fixtures/inventory/location_hx101.json")),
    );
    fake
}

fn context(fake: &Arc<FakeTransport>, locale: &str) -> Arc<AppContext> {
    let api = Arc::new(ApiClient::new(
        fake.clone(),
        Url::parse("http://inventory.test/").unwrap(),
    ));
    let translator =
        Translator::detect(&CatalogSet::builtin().unwrap(), &FixedLocale::new(locale)).unwrap();
    Arc::new(AppContext::new(api, translator))
}

#[tokio::test]
async fn test_browse_rack_list_then_detail() {
    let fake = inventory();
    let ctx = context(&fake, "en");

    ctx.navigate("/").await;
    let view = ctx.compose();
    assert_eq!(view.route, RouteName::RackList);
    assert_eq!(view.path, "/rack");
    assert_eq!(view.title, "Racks");
    assert!(view.nav[0].active);

    let ListBody::Items { items } = &view.list_panel().unwrap().body else {
        panic!("expected rack items");
    };
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].href, "/rack/42");

    let state = ctx.navigate("/rack/42?device=HX-101").await;
    assert_eq!(state.route.id(), Some("42"));
    assert_eq!(fake.request_count("/rack"), 1);
    assert_eq!(fake.request_count("/rack/42"), 0);

    let view = ctx.compose();
    let DetailBody::Content { sections } = &view.detail_panel().unwrap().body else {
        panic!("expected rack content");
    };
    let highlighted: Vec<&str> = sections[1]
        .rows
        .iter()
        .filter(|row| row.highlighted)
        .map(|row| row.cells[0].as_str())
        .collect();
    assert_eq!(highlighted, vec!["3"]);
}

#[tokio::test]
async fn test_problem_detail_for_failing_device() {
    let fake = inventory();
    let ctx = context(&fake, "en");

    ctx.navigate("/problem/HX-101").await;
    let view = ctx.compose_at(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());

    assert_eq!(view.route, RouteName::ProblemDetail);
    assert!(view.nav[1].active);
    assert_eq!(
        view.list_panel().unwrap().header.as_deref(),
        Some("4 problems found")
    );

    let DetailBody::Content { sections } = &view.detail_panel().unwrap().body else {
        panic!("expected problem content");
    };
    assert_eq!(sections[0].rows.len(), 2);
    // Device report section: last seen three hours before `now`
    assert_eq!(sections[1].rows[0].cells[2], "3 hours ago");
}

#[tokio::test]
async fn test_relay_find_device_in_rack_flow() {
    let fake = inventory();
    let ctx = context(&fake, "en");

    ctx.navigate("/relay/RL-1").await;
    let view = ctx.compose();
    let device_id = view
        .actions()
        .into_iter()
        .find_map(|action| match &action.kind {
            ActionKind::FindDeviceInRack { device_id } if device_id == "HX-101" => {
                Some(device_id.clone())
            }
            _ => None,
        })
        .expect("relay rows should offer find-in-rack");

    let state = ctx
        .find_device_in_rack(&device_id)
        .unwrap()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        state.route,
        Route::RackDetail {
            id: "42".into(),
            device: Some("HX-101".into())
        }
    );
    assert_eq!(ctx.compose().route, RouteName::RackDetail);
}

#[tokio::test]
async fn test_failed_list_load_keeps_rows_and_shows_banner() {
    let fake = inventory();
    let ctx = context(&fake, "en");
    ctx.navigate("/device").await;

    fake.fail("/device", FetchError::Network("connection reset".into()));
    let _ = ctx.stores().devices.load_all().await;

    let view = ctx.compose();
    assert!(view
        .banner
        .as_deref()
        .unwrap()
        .starts_with("Could not load device"));
    let ListBody::Items { items } = &view.list_panel().unwrap().body else {
        panic!("previous rows should survive a failed reload");
    };
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn test_korean_locale_with_english_fallback() {
    let fake = inventory();
    let ctx = context(&fake, "ko-KR");
    assert_eq!(ctx.translator().locale(), "ko-KR");

    ctx.navigate("/rack").await;
    let view = ctx.compose();
    assert_ne!(view.title, "Racks");

    // Missing from the Korean catalog, served from English
    assert_eq!(ctx.translator().t("No Problems"), "No problems reported for this device");
}

#[tokio::test]
async fn test_headless_events_are_ndjson_lines() {
    let fake = inventory();
    let ctx = context(&fake, "en");

    let events = render_paths(&ctx, &["/relay".to_string(), "/nope".to_string()]).await;
    assert_eq!(events.len(), 2);

    let lines: Vec<serde_json::Value> = events
        .iter()
        .map(|event| serde_json::from_str(&event.to_json().unwrap()).unwrap())
        .collect();
    assert_eq!(lines[0]["event"], "view");
    assert_eq!(lines[0]["view"]["route"], "relay-list");
    assert_eq!(lines[1]["requested"], "/nope");
    assert_eq!(lines[1]["view"]["route"], "not-found");

    let HeadlessEvent::View { view, .. } = &events[1] else {
        panic!("expected view event");
    };
    assert!(matches!(view.panels[0], Panel::Detail(_)));
}

#[tokio::test]
async fn test_no_paths_renders_root() {
    let fake = inventory();
    let ctx = context(&fake, "en");

    let events = render_paths(&ctx, &[]).await;
    let HeadlessEvent::View { requested, view, .. } = &events[0] else {
        panic!("expected view event");
    };
    assert_eq!(requested, "/");
    assert_eq!(view.route, RouteName::RackList);
}

#[tokio::test]
async fn test_each_view_is_handed_over_before_next_navigation() {
    let fake = inventory();
    let ctx = context(&fake, "en");

    let mut seen = Vec::new();
    let paths = ["/rack".to_string(), "/relay".to_string()];
    for_each_view(&ctx, &paths, |event| {
        if let HeadlessEvent::View { requested, .. } = event {
            seen.push((requested.clone(), ctx.history().len()));
        }
    })
    .await;

    assert_eq!(
        seen,
        vec![("/rack".to_string(), 1), ("/relay".to_string(), 2)]
    );
}

#[tokio::test]
async fn test_abandoned_reload_does_not_leave_list_loading() {
    let fake = inventory();
    let ctx = context(&fake, "en");
    ctx.navigate("/rack").await;

    let gate = fake.hold("/rack");
    let abandoned = tokio::time::timeout(
        std::time::Duration::from_millis(20),
        ctx.stores().racks.load_all(),
    )
    .await;
    assert!(abandoned.is_err());
    gate.open();

    for _ in 0..100 {
        if !ctx.stores().racks.is_loading() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    ctx.navigate("/rack").await;
    let view = ctx.compose();
    assert!(matches!(
        view.list_panel().unwrap().body,
        ListBody::Items { .. }
    ));
}
