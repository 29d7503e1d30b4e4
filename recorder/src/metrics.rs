use lazy_static::lazy_static;
use prometheus::{Counter, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref FRAMES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "recorder_frames_total",
        "Total frames received from the sensor"
    ))
    .unwrap();
    pub static ref VALID_FRAMES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "recorder_valid_frames_total",
        "Total frames that parsed into readings"
    ))
    .unwrap();
    pub static ref INVALID_FRAMES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "recorder_invalid_frames_total",
        "Total frames discarded as malformed or checksum-failed"
    ))
    .unwrap();
    pub static ref READ_TIMEOUTS_TOTAL: Counter = Counter::with_opts(Opts::new(
        "recorder_read_timeouts_total",
        "Total read attempts that yielded no frame"
    ))
    .unwrap();
    pub static ref RECORDS_WRITTEN_TOTAL: Counter = Counter::with_opts(Opts::new(
        "recorder_records_written_total",
        "Total aggregated records written to storage"
    ))
    .unwrap();
    pub static ref CYCLE_READINGS: Gauge = Gauge::with_opts(Opts::new(
        "recorder_cycle_readings",
        "Valid readings collected in the last completed cycle"
    ))
    .unwrap();
    pub static ref WRITE_LATENCY_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "recorder_write_latency_seconds",
            "Time taken to write one aggregated record"
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0])
    )
    .unwrap();
}

pub fn init_metrics() {
    REGISTRY.register(Box::new(FRAMES_TOTAL.clone())).unwrap();
    REGISTRY
        .register(Box::new(VALID_FRAMES_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(INVALID_FRAMES_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(READ_TIMEOUTS_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(RECORDS_WRITTEN_TOTAL.clone()))
        .unwrap();
    REGISTRY.register(Box::new(CYCLE_READINGS.clone())).unwrap();
    REGISTRY
        .register(Box::new(WRITE_LATENCY_SECONDS.clone()))
        .unwrap();
}

pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}
