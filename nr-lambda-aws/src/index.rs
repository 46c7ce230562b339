use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{Architecture, AwsError, LayerCandidate, LayerIndex};

/// Response returned by the hosted layer index.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LayerIndexResponse {
    #[serde(default)]
    layers: Vec<LayerCandidate>,
    next_marker: Option<String>,
}

/// Client for New Relic's hosted layer index.
///
/// The index serves, per region, the catalog of published instrumentation layers together with
/// the latest version compatible with a given runtime. Responses are paginated through an opaque
/// marker and are drained fully before use.
#[derive(Clone, Debug)]
pub struct HostedLayerIndex {
    client: Client,
    base_url: String,
}

impl HostedLayerIndex {
    /// Creates an index client for the given AWS region.
    pub fn new(region: &str) -> Self {
        Self::with_base_url(format!(
            "https://{region}.layers.newrelic-external.com/get-layers"
        ))
    }

    /// Creates an index client against an explicit endpoint, used in tests.
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl LayerIndex for HostedLayerIndex {
    async fn list_layers(
        &self,
        runtime: &str,
        architecture: Architecture,
    ) -> Result<Vec<LayerCandidate>, AwsError> {
        let mut layers = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let mut request = self.client.get(&self.base_url).query(&[
                ("CompatibleRuntime", runtime),
                ("CompatibleArchitecture", architecture.as_str()),
            ]);
            if let Some(marker) = &marker {
                request = request.query(&[("Marker", marker.as_str())]);
            }

            let response = request
                .send()
                .await
                .and_then(|response| response.error_for_status())
                .map_err(AwsError::LayerIndex)?;

            let page: LayerIndexResponse =
                response.json().await.map_err(AwsError::LayerIndex)?;

            nr_lambda_log::debug!(
                "layer index returned {} layers for runtime {runtime}",
                page.layers.len()
            );

            layers.extend(page.layers);
            match page.next_marker {
                Some(next) => marker = Some(next),
                None => return Ok(layers),
            }
        }
    }
}
