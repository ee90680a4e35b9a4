use std::sync::Arc;
use std::time::Duration;

use photoshelf_core::backend::LibraryBackend;
use photoshelf_core::index::IndexLimits;
use photoshelf_core::query::{debounce, DEFAULT_DEBOUNCE};
use photoshelf_core::settings::Settings;
use photoshelf_core::Shelf;
use tokio::time::{sleep, Instant};

const WINDOW: Duration = Duration::from_millis(300);

#[tokio::test(start_paused = true)]
async fn test_burst_settles_once_after_quiet_period() {
    let start = Instant::now();
    let (input, mut settled) = debounce(WINDOW);

    input.set("b");
    input.set("be");
    input.set("bea");

    assert_eq!(settled.changed().await.as_deref(), Some("bea"));
    assert!(start.elapsed() >= WINDOW);
    assert_eq!(settled.current(), "bea");
}

#[tokio::test(start_paused = true)]
async fn test_each_keystroke_restarts_the_timer() {
    let start = Instant::now();
    let (input, mut settled) = debounce(WINDOW);

    input.set("a");
    sleep(Duration::from_millis(200)).await;
    input.set("ab");
    sleep(Duration::from_millis(200)).await;

    // 400ms since the first keystroke, but only 200ms since the last one
    assert_eq!(settled.current(), "");

    assert_eq!(settled.changed().await.as_deref(), Some("ab"));
    assert!(start.elapsed() >= Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn test_selection_publishes_immediately_and_drops_pending_text() {
    let start = Instant::now();
    let (input, mut settled) = debounce(WINDOW);

    input.set("sun");
    input.select("Shanghai, China");

    assert_eq!(settled.changed().await.as_deref(), Some("Shanghai, China"));
    assert!(start.elapsed() < WINDOW);

    // the typed text never settles
    sleep(WINDOW * 2).await;
    assert_eq!(settled.current(), "Shanghai, China");
}

#[tokio::test(start_paused = true)]
async fn test_settling_on_same_value_does_not_notify() {
    let (input, mut settled) = debounce(WINDOW);

    input.set("beach");
    assert_eq!(settled.changed().await.as_deref(), Some("beach"));

    input.set("beac");
    input.set("beach");
    sleep(WINDOW * 2).await;
    drop(input);

    // the sender closes without another change
    assert_eq!(settled.changed().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_input_flushes_pending_value() {
    let start = Instant::now();
    let (input, mut settled) = debounce(WINDOW);

    input.set("tokyo");
    drop(input);

    assert_eq!(settled.changed().await.as_deref(), Some("tokyo"));
    assert!(start.elapsed() < WINDOW);
    assert_eq!(settled.changed().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_clones_share_one_channel() {
    let (input, mut settled) = debounce(DEFAULT_DEBOUNCE);
    let other = input.clone();

    input.set("a");
    other.set("ab");
    drop(input);

    // still open while a clone is alive, so "ab" settles on the timer
    assert_eq!(settled.changed().await.as_deref(), Some("ab"));

    drop(other);
    assert_eq!(settled.changed().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_shelf_channel_uses_configured_quiet_period() {
    let settings = Settings {
        debounce_ms: 50,
        ..Settings::default()
    };
    let shelf = Shelf::open(&settings);
    assert_eq!(shelf.debounce_window(), Duration::from_millis(50));

    let start = Instant::now();
    let (input, mut settled) = shelf.query_channel();
    input.set("beach");

    assert_eq!(settled.changed().await.as_deref(), Some("beach"));
    let waited = start.elapsed();
    assert!(waited >= Duration::from_millis(50));
    assert!(waited < DEFAULT_DEBOUNCE);
}

#[tokio::test(start_paused = true)]
async fn test_shelf_channel_defaults_to_standard_quiet_period() {
    let backend = Arc::new(LibraryBackend::new("unused-library"));
    let shelf = Shelf::new(backend, IndexLimits::default());
    assert_eq!(shelf.debounce_window(), DEFAULT_DEBOUNCE);

    let start = Instant::now();
    let (input, mut settled) = shelf.query_channel();
    input.set("2024-10");
    assert_eq!(settled.changed().await.as_deref(), Some("2024-10"));
    assert!(start.elapsed() >= DEFAULT_DEBOUNCE);
}
