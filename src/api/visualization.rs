use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Client, Result};

pub const TYPE_TABLE: &str = "TABLE";
pub const TYPE_CHART: &str = "CHART";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Visualization {
    pub id: i32,
    pub name: String,
    /// Nullable on the wire.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    /// Raw options payload; its shape depends on `kind` and is decoded
    /// by the options mapper.
    #[serde(default)]
    pub options: serde_json::Value,
}

/// Type-specific visualization options. The discriminator does not
/// travel inside the payload: it is the `type` field of the enclosing
/// visualization, so the payload itself serializes untagged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum VisualizationOptions {
    Table(TableOptions),
    Chart(ChartOptions),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableOptions {
    pub items_per_page: i64,
    pub columns: Vec<ColumnOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnOptions {
    pub visible: bool,
    pub name: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub display_as: String,
    pub align_content: String,
    pub allow_search: bool,
    pub order: i64,
    // Text
    #[serde(rename = "allowHTML", skip_serializing_if = "Option::is_none")]
    pub allow_html: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight_links: Option<bool>,
    // Number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
    // Date/Time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time_format: Option<String>,
    // Boolean
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boolean_values: Option<Vec<String>>,
    // Link
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_url_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_text_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_open_in_new_tab: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_title_template: Option<String>,
    // Image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_width: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_height: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_title_template: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartOptions {
    pub global_series_type: String,
    /// Keyed by axis name; built by folding the configured
    /// {column, axis} pairs, last write wins.
    pub column_mapping: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<ChartLegend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<ChartSeries>,
    pub missing_values_as_zero: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<ChartXAxis>,
    pub sort_x: bool,
    pub y_axis: Vec<ChartYAxis>,
    /// Keyed by series name, last write wins.
    pub series_options: BTreeMap<String, ChartSeriesOptions>,
    pub show_data_labels: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_format: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartLegend {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSeries {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stacking: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartXAxis {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<ChartXAxisLabels>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartXAxisLabels {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartYAxis {
    #[serde(rename = "type")]
    pub kind: String,
    pub opposite: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartSeriesOptions {
    pub z_index: i64,
    pub index: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub y_axis: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct VisualizationCreatePayload {
    pub query_id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub options: VisualizationOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct VisualizationUpdatePayload {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub options: VisualizationOptions,
}

impl Client {
    pub async fn create_visualization(
        &self,
        payload: &VisualizationCreatePayload,
    ) -> Result<Visualization> {
        self.post("api/visualizations", payload).await
    }

    pub async fn update_visualization(
        &self,
        id: i32,
        payload: &VisualizationUpdatePayload,
    ) -> Result<Visualization> {
        self.post(&format!("api/visualizations/{id}"), payload)
            .await
    }

    /// Visualizations are not archivable: DELETE is a hard delete.
    pub async fn delete_visualization(&self, id: i32) -> Result<()> {
        self.delete(&format!("api/visualizations/{id}")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Redash serializes an unset description as an explicit null, not
    // by omitting the field.
    #[test]
    fn it_decodes_a_visualization_with_a_null_description() {
        let visualization: Visualization = serde_json::from_value(serde_json::json!({
            "id": 3,
            "name": "counts",
            "description": null,
            "type": "CHART",
            "options": {}
        }))
        .unwrap();
        assert_eq!(visualization.description, None);
    }
}
