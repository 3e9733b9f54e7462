//! Real User Monitoring sampling
//!
//! The first checkpoint of a page view draws the sample: weight, session id
//! and a random number. When `random * weight < 1` every checkpoint is sent
//! to the collection endpoint as a JSON beacon. Nothing here ever reports an
//! error to the caller.

use serde_json::{Map, Value};

use crate::context::PageContext;
use crate::host::Host;

/// Sample drawn once per page view
#[derive(Clone, Debug, PartialEq)]
pub struct RumState {
    pub weight: u32,
    pub id: String,
    pub random: f64,
    pub is_selected: bool,
}

impl RumState {
    fn draw(ctx: &PageContext, host: &dyn Host) -> Self {
        let weight = if ctx.query_param("rum").as_deref() == Some("on") {
            1
        } else {
            ctx.config().rum_weight
        };
        let suffix: String = format!("{:014x}", (host.random() * (1u64 << 56) as f64) as u64)
            .chars()
            .take(14)
            .collect();
        let id = format!(
            "{}-{}-{}",
            hash_code(ctx.location().as_str()),
            host.now_millis(),
            suffix
        );
        let random = host.random();
        let is_selected = random * f64::from(weight) < 1.0;
        log::debug!("rum sample {} (weight {}, selected {})", id, weight, is_selected);

        Self {
            weight,
            id,
            random,
            is_selected,
        }
    }
}

/// Java-style string hash over UTF-16 code units with 32-bit wrap-around
pub fn hash_code(s: &str) -> i32 {
    s.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}

/// The page's RUM sample, drawn on first use
pub fn rum_state<'c>(ctx: &'c PageContext, host: &dyn Host) -> &'c RumState {
    ctx.rum.get_or_init(|| RumState::draw(ctx, host))
}

/// Send `checkpoint` with extra `data` if this page view is sampled
///
/// Keys in `data` replace the base fields of the same name.
pub fn sample_rum(ctx: &PageContext, host: &dyn Host, checkpoint: &str, data: Map<String, Value>) {
    let state = rum_state(ctx, host);
    if state.random == 0.0 || !state.is_selected {
        return;
    }

    let mut ping = Map::new();
    ping.insert("weight".to_string(), Value::from(state.weight));
    ping.insert("id".to_string(), Value::from(state.id.as_str()));
    ping.insert("referer".to_string(), Value::from(ctx.location().as_str()));
    ping.insert("generation".to_string(), Value::from(ctx.config().rum_generation.as_str()));
    ping.insert("checkpoint".to_string(), Value::from(checkpoint));
    ping.extend(data);

    let body = match serde_json::to_string(&Value::Object(ping)) {
        Ok(body) => body,
        Err(err) => {
            log::debug!("rum ping for {} dropped: {}", checkpoint, err);
            return;
        }
    };
    let url = format!("{}/{}", ctx.config().rum_endpoint, state.weight);
    if !host.send_beacon(&url, &body) {
        log::debug!("rum beacon for {} was not queued", checkpoint);
    }
}

/// Report a Core Web Vitals measurement under the `cwv` checkpoint
pub fn record_web_vital(ctx: &PageContext, host: &dyn Host, name: &str, value: f64) {
    let mut measurement = Map::new();
    measurement.insert(name.to_string(), Value::from(value));
    let mut data = Map::new();
    data.insert("cwv".to_string(), Value::Object(measurement));
    sample_rum(ctx, host, "cwv", data);
}
