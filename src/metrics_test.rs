use super::*;

#[test]
fn accumulates_counters() {
    let sink = InMemorySink::new();
    sink.counter("index.by_age.reads", 1);
    sink.counter("index.by_age.reads", 4);
    assert_eq!(sink.counter_value("index.by_age.reads"), 5);
}

#[test]
fn tracks_latest_gauge_and_timer() {
    let sink = InMemorySink::new();
    sink.gauge("index.by_age.size_bytes", 10.0);
    sink.gauge("index.by_age.size_bytes", 20.0);
    assert_eq!(sink.gauge_value("index.by_age.size_bytes"), Some(20.0));

    sink.timer_ms("index.by_age.latency_ms", 1.5);
    assert_eq!(sink.timer_value("index.by_age.latency_ms"), Some(1.5));
}

#[test]
fn noop_sink_accepts_everything() {
    let sink = NoopSink;
    sink.counter("x", 1);
    sink.gauge("y", 1.0);
    sink.timer_ms("z", 1.0);
}
