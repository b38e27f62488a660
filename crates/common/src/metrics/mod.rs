//! Metrics and observability utilities
//!
//! Prometheus metrics with standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, Unit};

/// Metrics prefix for all Foodgram metrics
pub const METRICS_PREFIX: &str = "foodgram";

/// Histogram buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.075, 0.100, 0.150, 0.250, 0.500, 1.000, 2.500,
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    describe_counter!(
        format!("{}_relation_toggles_total", METRICS_PREFIX),
        Unit::Count,
        "Favorite and shopping-cart relation toggles"
    );

    describe_counter!(
        format!("{}_subscription_toggles_total", METRICS_PREFIX),
        Unit::Count,
        "Subscribe and unsubscribe operations"
    );

    describe_counter!(
        format!("{}_recipes_created_total", METRICS_PREFIX),
        Unit::Count,
        "Recipes created"
    );

    describe_counter!(
        format!("{}_shopping_list_downloads_total", METRICS_PREFIX),
        Unit::Count,
        "Shopping-list report downloads"
    );
}

/// Record one favorite / shopping-cart toggle
pub fn record_relation_toggle(kind: &'static str, action: &'static str) {
    counter!(
        format!("{}_relation_toggles_total", METRICS_PREFIX),
        "kind" => kind,
        "action" => action
    )
    .increment(1);
}

/// Record one subscribe / unsubscribe
pub fn record_subscription_toggle(action: &'static str) {
    counter!(
        format!("{}_subscription_toggles_total", METRICS_PREFIX),
        "action" => action
    )
    .increment(1);
}

/// Record one created recipe
pub fn record_recipe_created() {
    counter!(format!("{}_recipes_created_total", METRICS_PREFIX)).increment(1);
}

/// Record one shopping-list download
pub fn record_shopping_list_download() {
    counter!(format!("{}_shopping_list_downloads_total", METRICS_PREFIX)).increment(1);
}
