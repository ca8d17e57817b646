use super::*;

#[test]
fn defaults_match_spec() {
    let cfg = IndexManagerConfig::default();
    assert_eq!(cfg.max_workers, 4);
    assert_eq!(cfg.maintenance_interval_seconds, 300);
    assert_eq!(cfg.operation_timeout_seconds, 10);

    let trig = TriggerConfig::default();
    assert_eq!(trig.cooldown_minutes, 60);
    assert_eq!(trig.min_sample_size, 100);

    let stats = StatisticsConfig::default();
    assert_eq!(stats.retention_days, 30);
    assert_eq!(stats.snapshot_interval_seconds, 3600);
}

#[test]
fn round_trips_through_toml() {
    let cfg = EngineConfig::default();
    let text = toml::to_string(&cfg).unwrap();
    let back: EngineConfig = EngineConfig::from_toml_str(&text).unwrap();
    assert_eq!(cfg, back);
}
