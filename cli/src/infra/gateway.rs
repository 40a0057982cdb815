//! `reqwest` implementation of the `ComputeGateway` port.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::application::ports::ComputeGateway;
use crate::domain::error::GatewayError;
use crate::domain::launch::{DiskSpec, LaunchSpec, Placement};
use crate::domain::operation::{Instance, Operation};
use crate::infra::wire::{DiskBody, ErrorEnvelope, ImageResponse, InstanceBody};

/// Default REST endpoint of the compute API.
pub const DEFAULT_API_URL: &str = "https://compute.googleapis.com/compute/v1";

/// Request timeout for commands that do not create instances.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Compute API client authenticated with a bearer token.
pub struct HttpComputeGateway {
    client: Client,
    base_url: String,
    access_token: Option<String>,
}

impl HttpComputeGateway {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, access_token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("nodefleet/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building compute API client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    fn zonal_url(&self, placement: &Placement, path: &str) -> String {
        format!(
            "{}/projects/{}/zones/{}/{path}",
            self.base_url, placement.project, placement.zone
        )
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        tracing::trace!(%method, url, "compute API request");
        let builder = self.client.request(method, url);
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, GatewayError> {
        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        decode(response).await
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        self.send(self.request(method, url).json(body)).await
    }

    async fn instance_action(
        &self,
        placement: &Placement,
        name: &str,
        action: &str,
    ) -> Result<Operation, GatewayError> {
        let url = self.zonal_url(placement, &format!("instances/{name}/{action}"));
        self.send(self.request(Method::POST, &url)).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| GatewayError::Transport(e.to_string()))?;

    if !status.is_success() {
        let message = serde_json::from_slice::<ErrorEnvelope>(&body).map_or_else(
            |_| String::from_utf8_lossy(&body).into_owned(),
            |envelope| envelope.error.message,
        );
        return Err(GatewayError::Status {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_slice(&body).map_err(|e| GatewayError::Decode(e.to_string()))
}

impl ComputeGateway for HttpComputeGateway {
    async fn create_instance(
        &self,
        placement: &Placement,
        spec: &LaunchSpec,
    ) -> Result<Operation, GatewayError> {
        let url = self.zonal_url(placement, "instances");
        self.send_json(Method::POST, &url, &InstanceBody::from(spec)).await
    }

    async fn create_disk(
        &self,
        placement: &Placement,
        disk: &DiskSpec,
        disk_type: &str,
    ) -> Result<Operation, GatewayError> {
        let url = self.zonal_url(placement, "disks");
        self.send_json(Method::POST, &url, &DiskBody::new(disk, disk_type)).await
    }

    async fn delete_disk(
        &self,
        placement: &Placement,
        name: &str,
    ) -> Result<Operation, GatewayError> {
        let url = self.zonal_url(placement, &format!("disks/{name}"));
        self.send(self.request(Method::DELETE, &url)).await
    }

    async fn get_operation(
        &self,
        project: &str,
        name: &str,
        zone: Option<&str>,
    ) -> Result<Operation, GatewayError> {
        let url = match zone {
            Some(zone) => format!(
                "{}/projects/{project}/zones/{zone}/operations/{name}",
                self.base_url
            ),
            None => format!("{}/projects/{project}/global/operations/{name}", self.base_url),
        };
        self.send(self.request(Method::GET, &url)).await
    }

    async fn get_instance(
        &self,
        placement: &Placement,
        name: &str,
    ) -> Result<Instance, GatewayError> {
        let url = self.zonal_url(placement, &format!("instances/{name}"));
        self.send(self.request(Method::GET, &url)).await
    }

    async fn delete_instance(
        &self,
        placement: &Placement,
        name: &str,
    ) -> Result<Operation, GatewayError> {
        let url = self.zonal_url(placement, &format!("instances/{name}"));
        self.send(self.request(Method::DELETE, &url)).await
    }

    async fn reset_instance(
        &self,
        placement: &Placement,
        name: &str,
    ) -> Result<Operation, GatewayError> {
        self.instance_action(placement, name, "reset").await
    }

    async fn stop_instance(
        &self,
        placement: &Placement,
        name: &str,
    ) -> Result<Operation, GatewayError> {
        self.instance_action(placement, name, "stop").await
    }

    async fn start_instance(
        &self,
        placement: &Placement,
        name: &str,
    ) -> Result<Operation, GatewayError> {
        self.instance_action(placement, name, "start").await
    }

    async fn image_by_name(&self, project: &str, name: &str) -> Result<String, GatewayError> {
        let url = format!("{}/projects/{project}/global/images/{name}", self.base_url);
        let image: ImageResponse = self.send(self.request(Method::GET, &url)).await?;
        Ok(image.self_link)
    }

    async fn image_from_family(
        &self,
        project: &str,
        family: &str,
    ) -> Result<String, GatewayError> {
        let url = format!(
            "{}/projects/{project}/global/images/family/{family}",
            self.base_url
        );
        let image: ImageResponse = self.send(self.request(Method::GET, &url)).await?;
        Ok(image.self_link)
    }
}
