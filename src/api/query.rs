use serde::{Deserialize, Serialize};

use super::visualization::Visualization;
use super::{Client, Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Query {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub data_source_id: i32,
    pub query: String,
    #[serde(default)]
    pub query_hash: Option<String>,
    #[serde(default)]
    pub options: QueryOptions,
    #[serde(default)]
    pub is_draft: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_safe: bool,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub latest_query_data_id: Option<i64>,
    #[serde(default)]
    pub schedule: Option<QuerySchedule>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub can_edit: bool,
    #[serde(default)]
    pub visualizations: Option<Vec<Visualization>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    #[serde(default)]
    pub parameters: Vec<QueryParameter>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryParameter {
    pub name: String,
    pub title: String,
    #[serde(rename = "parentQueryId", skip_serializing_if = "Option::is_none")]
    pub parent_query_id: Option<i32>,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: ParameterValue,
    #[serde(rename = "enumOptions", skip_serializing_if = "Option::is_none")]
    pub enum_options: Option<String>,
    pub global: bool,
}

/// Parameter values are either a plain string or a date range,
/// depending on the parameter type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Text(String),
    Range(ValueRange),
}

impl Default for ParameterValue {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuerySchedule {
    pub interval: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryCreatePayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub data_source_id: i32,
    pub query: String,
    pub options: QueryOptions,
    pub is_draft: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub schedule: Option<QuerySchedule>,
}

pub type QueryUpdatePayload = QueryCreatePayload;

impl Client {
    pub async fn get_query(&self, id: i32) -> Result<Query> {
        self.get(&format!("api/queries/{id}")).await
    }

    pub async fn create_query(&self, payload: &QueryCreatePayload) -> Result<Query> {
        self.post("api/queries", payload).await
    }

    pub async fn update_query(&self, id: i32, payload: &QueryUpdatePayload) -> Result<Query> {
        self.post(&format!("api/queries/{id}"), payload).await
    }

    /// Queries are soft-deletable: Redash archives on DELETE.
    pub async fn archive_query(&self, id: i32) -> Result<()> {
        self.delete(&format!("api/queries/{id}")).await
    }

    /// Redash has no endpoint for a single visualization: it is looked
    /// up through the query that owns it.
    pub async fn get_visualization(
        &self,
        query_id: i32,
        visualization_id: i32,
    ) -> Result<Visualization> {
        let query = self.get_query(query_id).await?;
        query
            .visualizations
            .into_iter()
            .flatten()
            .find(|v| v.id == visualization_id)
            .ok_or(Error::NotFound {
                kind: "visualization",
                id: format!("{query_id}/{visualization_id}"),
            })
    }
}
