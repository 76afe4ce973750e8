//! Timing tests for the search debouncer, run on a paused clock.

use std::time::Duration;

use campus_client::debounce::Debouncer;

const DELAY: Duration = Duration::from_millis(300);

// ---------------------------------------------------------------------------
// Test: only the last value of a burst is delivered
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn burst_delivers_only_last_value() {
    let (mut debouncer, mut rx) = Debouncer::new(DELAY);

    for text in ["r", "ru", "rus", "rust"] {
        debouncer.push(text.to_string());
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(rx.try_recv().is_err());

    tokio::time::sleep(DELAY).await;
    assert_eq!(rx.recv().await.as_deref(), Some("rust"));
    assert!(rx.try_recv().is_err());
    assert!(!debouncer.is_pending());
}

#[tokio::test(start_paused = true)]
async fn separated_pushes_each_deliver() {
    let (mut debouncer, mut rx) = Debouncer::new(DELAY);

    debouncer.push(1);
    tokio::time::sleep(DELAY * 2).await;
    debouncer.push(2);
    tokio::time::sleep(DELAY * 2).await;

    assert_eq!(rx.recv().await, Some(1));
    assert_eq!(rx.recv().await, Some(2));
}

#[tokio::test(start_paused = true)]
async fn cancel_drops_pending_value() {
    let (mut debouncer, mut rx) = Debouncer::new(DELAY);

    debouncer.push("draft");
    assert!(debouncer.is_pending());
    debouncer.cancel();
    tokio::time::sleep(DELAY * 2).await;

    assert!(rx.try_recv().is_err());
    assert!(!debouncer.is_pending());
}

#[tokio::test(start_paused = true)]
async fn dropping_the_debouncer_closes_the_channel() {
    let (mut debouncer, mut rx) = Debouncer::new(DELAY);

    debouncer.push("late");
    drop(debouncer);

    assert_eq!(rx.recv().await, None);
}
