//! Metrics collection.
//!
//! # Metrics
//! - `vite_dev_server_probes_total` (counter): probes by outcome (up/down)
//! - `vite_dev_server_up` (gauge): 1=up, 0=down, as of the last probe
//! - `vite_instance_reloads_total` (counter): instances published by reload

use metrics::{counter, gauge};

pub fn record_probe(up: bool) {
    let outcome = if up { "up" } else { "down" };
    counter!("vite_dev_server_probes_total", "outcome" => outcome).increment(1);
    gauge!("vite_dev_server_up").set(if up { 1.0 } else { 0.0 });
}

pub fn record_reload() {
    counter!("vite_instance_reloads_total").increment(1);
}
