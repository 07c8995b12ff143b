mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FakeMarket, RecordingNotifier, test_state};
use cryptoverse::models::{AlertInterval, AlertKey, Destination};
use cryptoverse::services::notifier::SendOptions;
use tokio::time::sleep;

const CHAT: Destination = Destination(1001);
const OTHER_CHAT: Destination = Destination(2002);

fn key(token: &str) -> AlertKey {
    AlertKey::new(CHAT, token)
}

fn fixtures(market: FakeMarket) -> (Arc<FakeMarket>, Arc<RecordingNotifier>, cryptoverse::AppState) {
    let market = Arc::new(market);
    let notifier = Arc::new(RecordingNotifier::default());
    let state = test_state(market.clone(), notifier.clone());
    (market, notifier, state)
}

#[tokio::test(start_paused = true)]
async fn creating_same_key_twice_replaces_the_job() {
    let (_market, _notifier, state) = fixtures(FakeMarket::with_prices(&[("ETH", 3000.0)]));

    let first = state.alerts.create(key("ETH"), AlertInterval::ThirtySeconds);
    let second = state.alerts.create(key("ETH"), AlertInterval::OneHour);

    assert_eq!(first.replaced, None);
    assert_eq!(second.replaced, Some(AlertInterval::ThirtySeconds));
    assert_ne!(first.id, second.id);
    assert_eq!(state.alerts.len(), 1);
    assert_eq!(state.alerts.interval_of(&key("ETH")), Some(AlertInterval::OneHour));
    assert_eq!(state.alerts.get(&key("ETH")).map(|h| h.id), Some(second.id));

    assert!(state.alerts.cancel_one(&key("ETH")));
    assert!(state.alerts.is_empty());
    assert!(!state.alerts.cancel_one(&key("ETH")));
}

#[tokio::test(start_paused = true)]
async fn replaced_job_never_fires_again() {
    let (market, notifier, state) = fixtures(FakeMarket::with_prices(&[("ETH", 3000.0)]));

    state.alerts.create(key("ETH"), AlertInterval::ThirtySeconds);
    state.alerts.create(key("ETH"), AlertInterval::OneHour);

    sleep(Duration::from_secs(65)).await;
    assert_eq!(market.calls(), 0);
    assert!(notifier.sent().is_empty());

    sleep(Duration::from_secs(3600)).await;
    assert_eq!(market.calls(), 1);
    assert_eq!(notifier.sent_to(CHAT), 1);
}

#[tokio::test(start_paused = true)]
async fn ticks_fire_at_the_configured_period() {
    let (market, notifier, state) = fixtures(FakeMarket::with_prices(&[("ETH", 3000.0)]));

    state.alerts.create(key("ETH"), AlertInterval::ThirtySeconds);

    // first tick is one full period after creation
    sleep(Duration::from_secs(29)).await;
    assert_eq!(market.calls(), 0);

    sleep(Duration::from_secs(2)).await;
    assert_eq!(market.calls(), 1);

    sleep(Duration::from_secs(60)).await;
    assert_eq!(market.calls(), 3);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 3);
    assert!(sent.iter().all(|s| s.destination == CHAT));
    assert!(sent.iter().all(|s| s.options == SendOptions::html_report()));
    assert!(sent[0].text.contains("ETH Token (ETH)"));
}

#[tokio::test(start_paused = true)]
async fn cancelled_job_stops_firing() {
    let (market, notifier, state) = fixtures(FakeMarket::with_prices(&[("ETH", 3000.0)]));

    state.alerts.create(key("ETH"), AlertInterval::ThirtySeconds);
    sleep(Duration::from_secs(31)).await;
    assert_eq!(market.calls(), 1);

    assert!(state.alerts.cancel_one(&key("ETH")));
    sleep(Duration::from_secs(300)).await;

    assert_eq!(market.calls(), 1);
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_one_on_absent_key_leaves_others_alone() {
    let (market, _notifier, state) = fixtures(FakeMarket::with_prices(&[("ETH", 3000.0)]));

    state.alerts.create(key("ETH"), AlertInterval::ThirtySeconds);

    assert!(!state.alerts.cancel_one(&key("BTC")));
    // same token, different case
    assert!(!state.alerts.cancel_one(&key("eth")));
    // same token, different chat
    assert!(!state.alerts.cancel_one(&AlertKey::new(OTHER_CHAT, "ETH")));

    assert_eq!(state.alerts.len(), 1);
    sleep(Duration::from_secs(31)).await;
    assert_eq!(market.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_all_cancels_every_job_once() {
    let (market, _notifier, state) = fixtures(FakeMarket::with_prices(&[("ETH", 3000.0)]));

    state.alerts.create(key("ETH"), AlertInterval::ThirtySeconds);
    state.alerts.create(key("BTC"), AlertInterval::OneMinute);
    state.alerts.create(AlertKey::new(OTHER_CHAT, "ETH"), AlertInterval::FiveMinutes);

    assert_eq!(state.alerts.cancel_all(), 3);
    assert!(state.alerts.is_empty());
    assert_eq!(state.alerts.cancel_all(), 0);

    sleep(Duration::from_secs(600)).await;
    assert_eq!(market.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn provider_failure_does_not_cancel_the_job() {
    let (market, notifier, state) =
        fixtures(FakeMarket::with_prices(&[("ETH", 3000.0)]).failing_first(1));

    state.alerts.create(key("ETH"), AlertInterval::ThirtySeconds);

    sleep(Duration::from_secs(31)).await;
    assert_eq!(market.calls(), 1);
    assert!(notifier.sent().is_empty());
    assert!(state.alerts.contains(&key("ETH")));

    sleep(Duration::from_secs(30)).await;
    assert_eq!(market.calls(), 2);
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn panicking_tick_does_not_stop_the_job() {
    let (market, notifier, state) =
        fixtures(FakeMarket::with_prices(&[("ETH", 3000.0)]).panicking_first(1));

    state.alerts.create(key("ETH"), AlertInterval::ThirtySeconds);
    sleep(Duration::from_secs(61)).await;

    assert_eq!(market.calls(), 2);
    assert_eq!(notifier.sent().len(), 1);
    assert!(state.alerts.contains(&key("ETH")));
}

#[tokio::test(start_paused = true)]
async fn slow_tick_suppresses_overlapping_firings() {
    let (market, notifier, state) = fixtures(
        FakeMarket::with_prices(&[("ETH", 3000.0)]).slow(Duration::from_secs(45)),
    );

    state.alerts.create(key("ETH"), AlertInterval::ThirtySeconds);
    // first lookup runs 30s..75s; the 60s firing is folded into one late tick
    sleep(Duration::from_secs(100)).await;

    assert_eq!(market.calls(), 2);
    assert_eq!(notifier.sent().len(), 1);
    assert_eq!(market.max_in_flight(), 1);
}

#[tokio::test(start_paused = true)]
async fn unknown_token_keeps_polling() {
    let (market, notifier, state) = fixtures(FakeMarket::default());

    state.alerts.create(key("NOPE"), AlertInterval::ThirtySeconds);
    sleep(Duration::from_secs(95)).await;

    assert_eq!(market.calls(), 3);
    assert!(notifier.sent().is_empty());
    assert!(state.alerts.contains(&key("NOPE")));
}

#[tokio::test(start_paused = true)]
async fn delivery_failure_does_not_cancel_the_job() {
    let market = Arc::new(FakeMarket::with_prices(&[("ETH", 3000.0)]));
    let notifier = Arc::new(RecordingNotifier::failing());
    let state = test_state(market.clone(), notifier.clone());

    state.alerts.create(key("ETH"), AlertInterval::ThirtySeconds);
    sleep(Duration::from_secs(61)).await;

    assert_eq!(market.calls(), 2);
    assert!(state.alerts.contains(&key("ETH")));
}

#[tokio::test(start_paused = true)]
async fn alerts_are_scoped_per_chat() {
    let (_market, notifier, state) = fixtures(FakeMarket::with_prices(&[("ETH", 3000.0)]));

    state.alerts.create(key("ETH"), AlertInterval::ThirtySeconds);
    state.alerts.create(AlertKey::new(OTHER_CHAT, "ETH"), AlertInterval::ThirtySeconds);
    assert_eq!(state.alerts.len(), 2);

    assert!(state.alerts.cancel_one(&key("ETH")));
    sleep(Duration::from_secs(31)).await;

    assert_eq!(notifier.sent_to(CHAT), 0);
    assert_eq!(notifier.sent_to(OTHER_CHAT), 1);
}

#[tokio::test(start_paused = true)]
async fn list_returns_chat_alerts_sorted() {
    let (_market, _notifier, state) = fixtures(FakeMarket::default());

    state.alerts.create(key("PEPE"), AlertInterval::OneHour);
    state.alerts.create(key("BTC"), AlertInterval::OneMinute);
    state.alerts.create(AlertKey::new(OTHER_CHAT, "ETH"), AlertInterval::ThirtySeconds);

    assert_eq!(
        state.alerts.list(CHAT),
        vec![
            ("BTC".to_string(), AlertInterval::OneMinute),
            ("PEPE".to_string(), AlertInterval::OneHour),
        ]
    );
    assert!(state.alerts.list(Destination(9)).is_empty());
}
