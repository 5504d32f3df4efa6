//! Carrier integration: coverage catalogs and shipping quotes.
//!
//! The backend brokers requests to the carrier, so the client only sees
//! one quote endpoint plus the region/county coverage catalogs used to
//! populate address pickers. Quote requests work for both authenticated
//! and anonymous shoppers; the token is attached when available.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use autonorte_core::Pesos;

use crate::error::{Result, StoreError};
use crate::session::SessionCoordinator;

/// Delivery destination in carrier terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Destination {
    /// Carrier region id (e.g. `R13`).
    pub region: String,
    /// Carrier county (comuna) code (e.g. `13101`).
    pub comuna: String,
    /// Street address line.
    pub address: String,
}

/// Package summary the carrier prices against.
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub weight_kg: f64,
    pub length_cm: f64,
    pub width_cm: f64,
    pub height_cm: f64,
}

/// One carrier-priced delivery option.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ShippingQuote {
    /// Carrier service name (e.g. overnight, standard).
    pub name: String,
    pub cost: Pesos,
    /// Human-readable transit estimate.
    pub eta: String,
}

/// A carrier coverage region.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub region_id: String,
    pub region_name: String,
}

/// A carrier coverage county within a region.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct County {
    pub county_code: String,
    pub coverage_name: String,
}

#[derive(Debug, Serialize)]
struct QuoteRequest<'a> {
    destination: &'a Destination,
    manifest: &'a Manifest,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    success: bool,
    #[serde(default)]
    options: Vec<ShippingQuote>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RegionsResponse {
    success: bool,
    #[serde(default)]
    regions: Vec<Region>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CountiesResponse {
    success: bool,
    #[serde(default)]
    counties: Vec<County>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for the carrier-facing endpoints.
#[derive(Clone)]
pub struct ShippingClient {
    inner: Arc<ShippingInner>,
}

struct ShippingInner {
    http: reqwest::Client,
    api_base: String,
    session: SessionCoordinator,
}

impl ShippingClient {
    /// Create a new shipping client.
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        api_base: impl Into<String>,
        session: SessionCoordinator,
    ) -> Self {
        Self {
            inner: Arc::new(ShippingInner {
                http,
                api_base: api_base.into(),
                session,
            }),
        }
    }

    /// Request carrier quotes for a destination and package manifest.
    ///
    /// Returns the ordered option list as the carrier priced it.
    ///
    /// # Errors
    ///
    /// `NoCoverage` when the carrier has no options for the destination,
    /// `Network`/`ServerRejected` on transport or backend failure.
    #[instrument(skip(self, manifest), fields(comuna = %destination.comuna))]
    pub async fn request_quotes(
        &self,
        destination: &Destination,
        manifest: &Manifest,
    ) -> Result<Vec<ShippingQuote>> {
        let url = format!("{}/api/shipping/quote/", self.inner.api_base);
        let mut request = self.inner.http.post(&url).json(&QuoteRequest {
            destination,
            manifest,
        });
        // Quotes work for guests too; attach the token only when one is
        // already valid so this never triggers an exchange.
        if let Some(token) = self.inner.session.token_if_available().await {
            request = request.header("Authorization", format!("Token {token}"));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(super::rejection(response).await);
        }

        let body: QuoteResponse = super::parse_json(response).await?;
        if !body.success || body.options.is_empty() {
            return Err(StoreError::NoCoverage(body.error.unwrap_or_else(|| {
                format!("no shipping options for comuna {}", destination.comuna)
            })));
        }
        Ok(body.options)
    }

    /// List the carrier's coverage regions.
    ///
    /// # Errors
    ///
    /// `NoCoverage` when the carrier reports a failure, `Network`/
    /// `ServerRejected` otherwise.
    pub async fn regions(&self) -> Result<Vec<Region>> {
        let url = format!("{}/api/shipping/regions/", self.inner.api_base);
        let response = self.inner.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(super::rejection(response).await);
        }
        let body: RegionsResponse = super::parse_json(response).await?;
        if !body.success {
            return Err(StoreError::NoCoverage(
                body.error.unwrap_or_else(|| "region catalog unavailable".to_string()),
            ));
        }
        Ok(body.regions)
    }

    /// List the carrier's coverage counties for a region.
    ///
    /// # Errors
    ///
    /// `NoCoverage` when the carrier reports a failure, `Network`/
    /// `ServerRejected` otherwise.
    pub async fn counties(&self, region_id: &str) -> Result<Vec<County>> {
        let url = format!("{}/api/shipping/counties/{region_id}/", self.inner.api_base);
        let response = self.inner.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(super::rejection(response).await);
        }
        let body: CountiesResponse = super::parse_json(response).await?;
        if !body.success {
            return Err(StoreError::NoCoverage(
                body.error.unwrap_or_else(|| "county catalog unavailable".to_string()),
            ));
        }
        Ok(body.counties)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::storage::MemoryStore;

    fn anonymous_client(server: &MockServer) -> ShippingClient {
        let session = SessionCoordinator::new(
            reqwest::Client::new(),
            server.uri(),
            Arc::new(MemoryStore::new()),
            None,
        );
        ShippingClient::new(reqwest::Client::new(), server.uri(), session)
    }

    fn sample_destination() -> Destination {
        Destination {
            region: "R13".to_string(),
            comuna: "13101".to_string(),
            address: "Av. Matta 845".to_string(),
        }
    }

    fn sample_manifest() -> Manifest {
        Manifest {
            weight_kg: 2.0,
            length_cm: 30.0,
            width_cm: 10.0,
            height_cm: 10.0,
        }
    }

    #[tokio::test]
    async fn test_quotes_preserve_carrier_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/shipping/quote/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "options": [
                    {"name": "Día Hábil Siguiente", "cost": 5200, "eta": "1 día hábil"},
                    {"name": "Económico", "cost": 3000, "eta": "3 a 5 días hábiles"},
                ]
            })))
            .mount(&server)
            .await;

        let client = anonymous_client(&server);
        let quotes = client
            .request_quotes(&sample_destination(), &sample_manifest())
            .await
            .unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].name, "Día Hábil Siguiente");
        assert_eq!(quotes[1].cost, Pesos::new(3000));
    }

    #[tokio::test]
    async fn test_no_options_is_no_coverage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/shipping/quote/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "error": "Comuna sin cobertura"
            })))
            .mount(&server)
            .await;

        let client = anonymous_client(&server);
        let err = client
            .request_quotes(&sample_destination(), &sample_manifest())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NoCoverage(msg) if msg == "Comuna sin cobertura"));
    }

    #[tokio::test]
    async fn test_region_catalog_wire_names() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/shipping/regions/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "regions": [{"regionId": "R13", "regionName": "Región Metropolitana"}]
            })))
            .mount(&server)
            .await;

        let client = anonymous_client(&server);
        let regions = client.regions().await.unwrap();
        assert_eq!(regions[0].region_id, "R13");
        assert_eq!(regions[0].region_name, "Región Metropolitana");
    }
}
