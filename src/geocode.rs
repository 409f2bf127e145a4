//! Nominatim geocoding for the interactive front end.
//!
//! Turns a free-text place name into coordinates via the OpenStreetMap
//! Nominatim search API. The base URL can be overridden with
//! `STORMCAST_NOMINATIM_URL` (read from the environment or a `.env` file),
//! which keeps tests and air-gapped setups off the public endpoint.
//!
//! Transient failures are retried a few times with a short jittered pause,
//! which is also what Nominatim's usage policy expects from clients.

use std::thread;
use std::time::Duration;

use rand::Rng;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::error::AppError;

const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org/search";
const USER_AGENT: &str = concat!("stormcast/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const ATTEMPTS: u32 = 3;

/// How many comma-separated components of the display name to keep.
const DISPLAY_COMPONENTS: usize = 3;

/// A resolved place.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedPlace {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

pub struct GeocodeClient {
    client: Client,
    base_url: String,
}

impl GeocodeClient {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let base_url =
            std::env::var("STORMCAST_NOMINATIM_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Resolve a place name. `Ok(None)` means the query produced no match;
    /// the caller decides whether to re-prompt.
    pub fn lookup(&self, place: &str) -> Result<Option<GeocodedPlace>, AppError> {
        let place = place.trim();
        // Bare numbers are never useful search queries against Nominatim and
        // usually mean the user typed coordinates or a zip into the wrong
        // prompt.
        if place.is_empty() || is_numeric_place(place) {
            return Ok(None);
        }

        let mut last_error = None;
        for attempt in 1..=ATTEMPTS {
            match self.try_lookup(place) {
                Ok(result) => return Ok(result),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < ATTEMPTS {
                        let pause = rand::thread_rng().gen_range(1000..2000);
                        thread::sleep(Duration::from_millis(pause));
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| AppError::new(4, "Geocoding failed with no recorded error.")))
    }

    fn try_lookup(&self, place: &str) -> Result<Option<GeocodedPlace>, AppError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("q", place), ("format", "json"), ("limit", "1")])
            .send()
            .map_err(|e| AppError::new(4, format!("Geocoding request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                4,
                format!("Geocoding request failed with status {}.", resp.status()),
            ));
        }

        let body: Vec<NominatimPlace> = resp
            .json()
            .map_err(|e| AppError::new(4, format!("Failed to parse geocoder response: {e}")))?;

        match body.into_iter().next() {
            Some(hit) => resolve_place(hit).map(Some),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

fn resolve_place(hit: NominatimPlace) -> Result<GeocodedPlace, AppError> {
    let lat = parse_coordinate_str(&hit.lat)
        .ok_or_else(|| AppError::new(4, format!("Invalid latitude from geocoder: '{}'", hit.lat)))?;
    let lon = parse_coordinate_str(&hit.lon)
        .ok_or_else(|| AppError::new(4, format!("Invalid longitude from geocoder: '{}'", hit.lon)))?;

    Ok(GeocodedPlace {
        name: short_display_name(&hit.display_name),
        lat,
        lon,
    })
}

fn parse_coordinate_str(raw: &str) -> Option<f64> {
    let v = raw.trim().parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

fn is_numeric_place(place: &str) -> bool {
    !place.is_empty()
        && place
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_whitespace() || matches!(c, '.' | ',' | '-' | '+'))
}

/// Nominatim display names run to the full admin hierarchy; keep the leading
/// components only so prompts stay on one line.
fn short_display_name(full: &str) -> String {
    let parts: Vec<&str> = full
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .take(DISPLAY_COMPONENTS)
        .collect();
    if parts.is_empty() {
        full.trim().to_string()
    } else {
        parts.join(", ")
    }
}
