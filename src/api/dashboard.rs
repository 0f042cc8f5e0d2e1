use serde::{Deserialize, Serialize};

use super::widget::Widget;
use super::{Client, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dashboard {
    pub id: i32,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_draft: bool,
    #[serde(default)]
    pub dashboard_filters_enabled: bool,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default)]
    pub can_edit: bool,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub widgets: Option<Vec<Widget>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardCreatePayload {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardUpdatePayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Client {
    pub async fn get_dashboard(&self, slug: &str) -> Result<Dashboard> {
        self.get(&format!("api/dashboards/{slug}")).await
    }

    pub async fn create_dashboard(&self, payload: &DashboardCreatePayload) -> Result<Dashboard> {
        self.post("api/dashboards", payload).await
    }

    pub async fn update_dashboard(
        &self,
        id: i32,
        payload: &DashboardUpdatePayload,
    ) -> Result<Dashboard> {
        self.post(&format!("api/dashboards/{id}"), payload).await
    }

    /// Dashboards are soft-deletable: Redash archives on DELETE.
    pub async fn archive_dashboard(&self, slug: &str) -> Result<()> {
        self.delete(&format!("api/dashboards/{slug}")).await
    }
}
