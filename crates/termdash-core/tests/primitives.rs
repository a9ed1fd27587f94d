//! Integration tests combining the core primitives the way a dispatch loop
//! uses them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use termdash_core::format::{format_binary_unit, format_duration};
use termdash_core::{EventQueue, PeriodicTimer, ProgressData, TimerId};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn test_timers_feed_one_queue() {
    init_logging();
    let queue: EventQueue<TimerId> = EventQueue::new(256);

    let timers: Vec<_> = [10u64, 25]
        .into_iter()
        .map(|ms| {
            let producer = queue.clone();
            let timer = Arc::new(PeriodicTimer::new(Duration::from_millis(ms), || {}));
            let id = timer.id();
            timer.set_function(move || {
                let _ = producer.try_push(id);
            });
            timer
        })
        .collect();

    for timer in &timers {
        timer.start().unwrap();
    }
    thread::sleep(Duration::from_millis(100));
    for timer in &timers {
        timer.stop();
    }

    let mut fast = 0;
    let mut slow = 0;
    while let Ok(id) = queue.try_pop() {
        if id == timers[0].id() {
            fast += 1;
        } else if id == timers[1].id() {
            slow += 1;
        }
    }
    assert!(fast > slow, "fast = {fast}, slow = {slow}");
    assert!(slow >= 3);
}

#[test]
fn test_timer_callback_sees_no_lock_contention() {
    // Control calls from inside the callback must not deadlock.
    let count = Arc::new(AtomicUsize::new(0));
    let timer = Arc::new(PeriodicTimer::new(Duration::from_millis(5), || {}));
    let weak = Arc::downgrade(&timer);
    let counter = count.clone();
    timer.set_function(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        if let Some(timer) = weak.upgrade() {
            timer.set_interval(Duration::from_millis(5));
            let _ = timer.is_running();
        }
    });
    timer.start().unwrap();
    thread::sleep(Duration::from_millis(40));
    timer.stop();
    assert!(count.load(Ordering::SeqCst) >= 2);
}

#[test]
fn test_progress_estimates_steady_transfer() {
    init_logging();
    let progress = ProgressData::new();
    progress.set_range(0.0, 1000.0);

    // 10 units every 100 ms = 100 units/s.
    let t0 = Instant::now();
    for step in 0..=30u64 {
        progress.update_at(step as f64 * 10.0, t0 + Duration::from_millis(step * 100));
    }

    let snapshot = progress.snapshot();
    assert_eq!(snapshot.value, 300.0);
    assert!((snapshot.percentage - 30.0).abs() < 1e-9);
    assert!((snapshot.rate - 100.0).abs() < 2.0, "rate = {}", snapshot.rate);

    let eta = snapshot.eta.expect("eta determined after burn-in").as_secs_f64();
    assert!((eta - 7.0).abs() < 1.0, "eta = {eta}");
    assert_eq!(format_binary_unit(snapshot.rate.round(), "B/s", 4), " 100   B/s");
    assert_eq!(format_duration(Some(Duration::from_secs_f64(eta.round()))), "0:00:07");
}

#[test]
fn test_progress_from_another_thread() {
    let progress = Arc::new(ProgressData::new());
    progress.set_range(0.0, 50.0);

    let producer = {
        let progress = progress.clone();
        thread::spawn(move || {
            for i in 0..=60 {
                progress.update(i as f64);
                thread::sleep(Duration::from_millis(2));
            }
        })
    };

    while !producer.is_finished() {
        assert!(progress.value() <= progress.max_value());
        thread::sleep(Duration::from_millis(1));
    }
    producer.join().unwrap();
    assert_eq!(progress.value(), 50.0);
    assert_eq!(progress.percentage(), 100.0);
    assert!(progress.time_stopped().is_some());
}
