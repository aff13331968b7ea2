//! HTTP client for OSRM's `table` service, used to materialize a
//! travel-time matrix when `OSRM_BASE_URL` is configured instead of a
//! `<base>.dmatrix-time.txt` file.

use std::env;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error, info, trace, warn};

/// Fetches the full directed duration matrix for `coords` (lat, lon pairs,
/// in catalog id order) and returns it in minutes. `None` on any failure —
/// callers treat that as "no OSRM oracle available".
pub async fn fetch_duration_matrix(base_url: &str, coords: &[(f64, f64)]) -> Option<Vec<Vec<f64>>> {
    if coords.len() < 2 {
        error!("fetch_duration_matrix: need at least 2 coordinates, got {}", coords.len());
        return None;
    }

    let is_public_osrm = base_url.contains("router.project-osrm.org");
    let coord_str = coords
        .iter()
        .map(|(lat, lon)| format!("{},{}", lon, lat))
        .collect::<Vec<String>>()
        .join(";");
    let url = format!("{base_url}/{coord_str}?annotations=duration");
    if url.len() > 8000 {
        warn!("OSRM URL too long ({} chars), consider self-hosted OSRM or batching", url.len());
        return None;
    }
    trace!("formatted coordinate string: {coord_str}");
    debug!("built OSRM URL: {url} ({} chars)", url.len());

    let client = Client::new();
    info!("sending GET request to OSRM ({} locations)", coords.len());
    let mut request_builder = client.get(&url);
    if is_public_osrm {
        let contact = env::var("OSRM_CONTACT_EMAIL")
            .unwrap_or_else(|_| "no-email-configured@example.com".to_string());
        let user_agent = format!("trash-vrp/1.0 ({})", contact.trim());
        request_builder = request_builder.header("User-Agent", &user_agent);
        info!("using public OSRM — added User-Agent: {user_agent}");
    } else {
        info!("using local/self-hosted OSRM — no User-Agent header required");
    }

    let response = match request_builder.timeout(std::time::Duration::from_secs(30)).send().await {
        Ok(resp) => {
            let status = resp.status();
            debug!("received response: HTTP {status} ({} bytes)", resp.content_length().unwrap_or(0));
            if !status.is_success() {
                error!("OSRM returned HTTP {status}: {}", status.canonical_reason().unwrap_or("Unknown"));
                return None;
            }
            resp
        }
        Err(e) => {
            error!("OSRM request failed: {e} (coords: {})", coords.len());
            if e.to_string().contains("handshake") || e.to_string().contains("TLS") {
                warn!("TLS/handshake failure — likely blocked by public OSRM. Switch to self-hosted.");
            }
            return None;
        }
    };

    let text = match response.text().await {
        Ok(t) => {
            trace!("response size: {} bytes", t.len());
            if t.contains("too many locations") || t.contains("request too large") {
                warn!("OSRM rejected request due to too many locations ({})", coords.len());
                return None;
            }
            t
        }
        Err(e) => {
            error!("failed to read OSRM response body: {e}");
            return None;
        }
    };

    let json: Value = match serde_json::from_str::<Value>(&text) {
        Ok(js) => {
            debug!("successfully parsed JSON ({} objects)", js.as_object().map_or(0, |o| o.len()));
            js
        }
        Err(e) => {
            error!("failed to parse OSRM JSON: {e} (first 200 chars: {})", &text[..text.len().min(200)]);
            return None;
        }
    };

    let durations = match json["durations"].as_array() {
        Some(arr) => {
            info!(
                "extracted {}x{} durations array from OSRM",
                arr.len(),
                arr.first().and_then(|r| r.as_array()).map_or(0, |r| r.len())
            );
            arr
        }
        None => {
            error!(
                "no 'durations' array in OSRM response. keys: {:?}",
                json.as_object().map(|o| o.keys().collect::<Vec<_>>())
            );
            return None;
        }
    };

    let matrix = durations
        .iter()
        .enumerate()
        .map(|(row_idx, row)| {
            let row_len = row.as_array().map_or(0, |r| r.len());
            debug!("processing row {row_idx} ({row_len} cols)");
            row.as_array()
                .unwrap_or(&vec![])
                .iter()
                .map(|val| val.as_f64().map(|secs| secs / 60.0).unwrap_or(f64::INFINITY))
                .collect::<Vec<f64>>()
        })
        .collect::<Vec<Vec<f64>>>();

    info!(
        "successfully built {}x{} travel-time matrix ({} locations)",
        matrix.len(),
        matrix.first().map_or(0, |r| r.len()),
        coords.len()
    );
    Some(matrix)
}
