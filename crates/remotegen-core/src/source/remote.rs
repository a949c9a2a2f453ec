// Remote configuration source backed by the configuration service.

use async_trait::async_trait;
use remotegen_api::ConfigServiceClient;
use tracing::debug;

use super::ConfigSource;
use crate::error::CoreError;
use crate::groups;
use crate::model::{DeviceConfig, DeviceGroups};

pub struct RemoteSource {
    client: ConfigServiceClient,
}

impl RemoteSource {
    pub fn new(client: ConfigServiceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ConfigSource for RemoteSource {
    fn describe(&self) -> String {
        self.client.base_url().to_string()
    }

    async fn list_device_ids(&self) -> Result<Vec<String>, CoreError> {
        let mut ids: Vec<String> = self
            .client
            .list_devices()
            .await?
            .into_iter()
            .map(|d| d.device_id)
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    async fn fetch_device_config(&self, device_id: &str) -> Result<DeviceConfig, CoreError> {
        debug!(device_id, "fetching device config");
        Ok(self.client.get_device_config(device_id).await?.into())
    }

    async fn fetch_device_groups(&self, device_id: &str) -> Result<DeviceGroups, CoreError> {
        let groups: DeviceGroups = self.client.get_device_groups(device_id).await?.into();
        Ok(groups::with_default_group(groups))
    }

    async fn check_reachable(&self) -> Result<(), CoreError> {
        let health = self.client.health().await?;
        if health.is_healthy() {
            Ok(())
        } else {
            Err(CoreError::ConnectionFailed {
                source_name: self.describe(),
                reason: format!("service reports status {:?}", health.status),
            })
        }
    }
}
