// Local bridge HTTP client
//
// Wraps `reqwest::Client` with bridge-specific URL construction and the
// dual-shape listing normalization. Control writes are single-shot, no
// automatic retry: callers decide what a failed write means.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{DeviceListing, DeviceRecord, HotWaterDetail, RawId, ZoneListing, ZoneRecord};
use crate::transport::TransportConfig;

/// Raw HTTP client for the local bridge API.
///
/// All listing methods return the normalized sequence form regardless of
/// which of the two accepted response shapes the bridge used.
pub struct LocalClient {
    http: reqwest::Client,
    base_url: Url,
    probe_timeout: Duration,
}

impl LocalClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the bridge root, e.g. `http://192.168.1.50:4407`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            probe_timeout: transport.probe_timeout,
        })
    }

    /// The bridge base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Listings ─────────────────────────────────────────────────────

    /// Fetch the full zone listing.
    pub async fn list_zones(&self) -> Result<Vec<ZoneRecord>, Error> {
        let listing: ZoneListing = self.get_json("/zones").await?;
        Ok(listing.into_zones())
    }

    /// Fetch the full device listing.
    pub async fn list_devices(&self) -> Result<Vec<DeviceRecord>, Error> {
        let listing: DeviceListing = self.get_json("/devices").await?;
        Ok(listing.into_devices())
    }

    /// Fetch the hot-water detail for one zone.
    pub async fn hot_water_detail(&self, id: &RawId) -> Result<HotWaterDetail, Error> {
        self.get_json(&format!("/hot_water/{id}")).await
    }

    // ── Control writes ───────────────────────────────────────────────

    /// Set a standard zone. The bridge encodes intent in a single
    /// temperature parameter: 0 switches off, -1 resumes the schedule,
    /// anything else is the target in °C.
    pub async fn set_zone(&self, id: &RawId, temperature: f64) -> Result<(), Error> {
        let path = format!("/zones/{id}/set");
        let url = self.endpoint_url(&path)?;
        debug!("POST {url}");

        let resp = self
            .http
            .post(url)
            .query(&[("temperature", temperature_param(temperature))])
            .send()
            .await
            .map_err(Error::Transport)?;

        check_status(resp.status(), &path)
    }

    /// Set a hot-water zone's mode and/or target temperature.
    pub async fn set_hot_water(
        &self,
        id: &RawId,
        mode: Option<&str>,
        temperature: Option<f64>,
    ) -> Result<(), Error> {
        let path = format!("/hot_water/{id}/set");
        let url = self.endpoint_url(&path)?;
        debug!("POST {url}");

        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(mode) = mode {
            params.push(("mode", mode.to_owned()));
        }
        if let Some(temperature) = temperature {
            params.push(("temperature", temperature_param(temperature)));
        }

        let resp = self
            .http
            .post(url)
            .query(&params)
            .send()
            .await
            .map_err(Error::Transport)?;

        check_status(resp.status(), &path)
    }

    // ── Probe ────────────────────────────────────────────────────────

    /// Lightweight reachability check used at setup time.
    ///
    /// Rides a shorter request ceiling than the poll cycle; success is
    /// any 2xx answer on the zone listing.
    pub async fn probe(&self) -> Result<(), Error> {
        let url = self.endpoint_url("/zones")?;
        debug!("GET {url} (probe)");

        let resp = self
            .http
            .get(url)
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(Error::Transport)?;

        check_status(resp.status(), "/zones")
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn endpoint_url(&self, path: &str) -> Result<Url, Error> {
        self.base_url.join(path).map_err(Error::InvalidUrl)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.endpoint_url(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                endpoint: path.to_owned(),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}

fn check_status(status: reqwest::StatusCode, endpoint: &str) -> Result<(), Error> {
    if status.is_success() {
        Ok(())
    } else {
        Err(Error::Status {
            status: status.as_u16(),
            endpoint: endpoint.to_owned(),
        })
    }
}

/// Format a temperature query parameter: integral values are sent
/// without a fractional part (`21`, `0`, `-1`), others as-is (`21.5`).
fn temperature_param(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}
