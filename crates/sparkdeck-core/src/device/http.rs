//! HTTP implementation of the device API

use async_trait::async_trait;
use reqwest::Response;

use super::error::DeviceError;
use super::types::{
    CalibrationCapture, CalibrationStatus, CrudResponse, EmergencyStatus, MapDetail,
    MapListResponse, MapSummary, TelemetrySnapshot,
};
use super::DeviceApi;

/// HTTP client for the device's REST API
pub struct HttpDevice {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDevice {
    /// Create a client for a device base URL, e.g. `http://192.168.4.1`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("SparkDeck/0.1")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        HttpDevice {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn check(response: Response) -> Result<Response, DeviceError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(DeviceError::Status(response.status().as_u16()))
        }
    }

    /// Shared handling for the CRUD endpoints' `{success, error}` envelope
    fn crud_ok(response: CrudResponse) -> Result<CrudResponse, DeviceError> {
        if response.success {
            Ok(response)
        } else {
            Err(DeviceError::Rejected(
                response.error.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }
}

#[async_trait]
impl DeviceApi for HttpDevice {
    async fn list_maps(&self) -> Result<Vec<MapSummary>, DeviceError> {
        let response = Self::check(self.client.get(self.url("/api/maps")).send().await?)?;
        let list: MapListResponse = response.json().await?;
        Ok(list.maps)
    }

    async fn map_detail(&self, index: usize) -> Result<MapDetail, DeviceError> {
        let url = self.url(&format!("/api/maps/{index}"));
        let response = Self::check(self.client.get(url).send().await?)?;
        Ok(response.json().await?)
    }

    async fn update_map(
        &self,
        index: usize,
        patch: serde_json::Value,
    ) -> Result<(), DeviceError> {
        let url = self.url(&format!("/api/maps/{index}"));
        Self::check(self.client.put(url).json(&patch).send().await?)?;
        Ok(())
    }

    async fn select_map(&self, index: usize) -> Result<(), DeviceError> {
        let form = [("index", index.to_string())];
        Self::check(
            self.client
                .post(self.url("/api/selectMap"))
                .form(&form)
                .send()
                .await?,
        )?;
        Ok(())
    }

    async fn create_map(&self, name: &str) -> Result<u32, DeviceError> {
        let response = Self::check(
            self.client
                .post(self.url("/api/maps/create"))
                .json(&serde_json::json!({ "name": name }))
                .send()
                .await?,
        )?;
        let crud = Self::crud_ok(response.json().await?)?;
        crud.map_id
            .ok_or_else(|| DeviceError::Decode("create reply missing mapId".to_string()))
    }

    async fn delete_map(&self, map_id: u32) -> Result<(), DeviceError> {
        let response = Self::check(
            self.client
                .post(self.url("/api/maps/delete"))
                .json(&serde_json::json!({ "mapId": map_id }))
                .send()
                .await?,
        )?;
        Self::crud_ok(response.json().await?)?;
        Ok(())
    }

    async fn duplicate_map(&self, source_map_id: u32) -> Result<u32, DeviceError> {
        let response = Self::check(
            self.client
                .post(self.url("/api/maps/duplicate"))
                .json(&serde_json::json!({ "sourceMapId": source_map_id }))
                .send()
                .await?,
        )?;
        let crud = Self::crud_ok(response.json().await?)?;
        crud.new_map_id
            .ok_or_else(|| DeviceError::Decode("duplicate reply missing newMapId".to_string()))
    }

    async fn status(&self) -> Result<TelemetrySnapshot, DeviceError> {
        let response = Self::check(self.client.get(self.url("/api/status")).send().await?)?;
        Ok(response.json().await?)
    }

    async fn emergency_status(&self) -> Result<EmergencyStatus, DeviceError> {
        let response = Self::check(
            self.client
                .post(self.url("/api/emergency"))
                .query(&[("action", "status")])
                .send()
                .await?,
        )?;
        Ok(response.json().await?)
    }

    async fn emergency_reset(&self) -> Result<(), DeviceError> {
        Self::check(
            self.client
                .post(self.url("/api/emergency"))
                .query(&[("action", "reset")])
                .send()
                .await?,
        )?;
        Ok(())
    }

    async fn calibration_start(&self) -> Result<(), DeviceError> {
        Self::check(
            self.client
                .post(self.url("/api/calibrateQS/start"))
                .send()
                .await?,
        )?;
        Ok(())
    }

    async fn calibration_capture(&self) -> Result<CalibrationCapture, DeviceError> {
        let response = Self::check(
            self.client
                .post(self.url("/api/calibrateQS/capture"))
                .send()
                .await?,
        )?;
        let capture: CalibrationCapture = response.json().await?;
        if capture.success {
            Ok(capture)
        } else {
            Err(DeviceError::Rejected("capture refused".to_string()))
        }
    }

    async fn calibration_cancel(&self) -> Result<(), DeviceError> {
        Self::check(
            self.client
                .post(self.url("/api/calibrateQS/cancel"))
                .send()
                .await?,
        )?;
        Ok(())
    }

    async fn calibration_status(&self) -> Result<CalibrationStatus, DeviceError> {
        let response = Self::check(
            self.client
                .get(self.url("/api/calibrateQS/status"))
                .send()
                .await?,
        )?;
        Ok(response.json().await?)
    }

    async fn restart(&self) -> Result<(), DeviceError> {
        Self::check(self.client.post(self.url("/api/restart")).send().await?)?;
        Ok(())
    }
}
