use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::visualization::Visualization;
use super::{Client, Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Widget {
    pub id: i32,
    #[serde(default)]
    pub dashboard_id: i32,
    #[serde(default)]
    pub visualization: Option<Visualization>,
    /// Nullable on the wire, absent only for visualization widgets.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub width: i64,
    #[serde(default)]
    pub options: WidgetOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetOptions {
    #[serde(rename = "isHidden")]
    pub is_hidden: bool,
    /// Keyed by the dashboard-level parameter key, last write wins.
    #[serde(
        rename = "parameterMappings",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub parameter_mappings: BTreeMap<String, ParameterMapping>,
    #[serde(default)]
    pub position: WidgetPosition,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParameterMapping {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub map_to: String,
    pub value: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WidgetPosition {
    pub auto_height: bool,
    pub size_x: i64,
    pub size_y: i64,
    pub max_size_x: i64,
    pub max_size_y: i64,
    pub min_size_x: i64,
    pub min_size_y: i64,
    pub col: i64,
    pub row: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WidgetCreatePayload {
    pub dashboard_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visualization_id: Option<i32>,
    pub options: WidgetOptions,
    pub text: String,
    pub width: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WidgetUpdatePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visualization_id: Option<i32>,
    pub options: WidgetOptions,
    pub text: String,
    pub width: i64,
}

impl Client {
    /// Redash has no endpoint for a single widget: it is looked up
    /// through the dashboard that owns it.
    pub async fn get_widget(&self, dashboard_slug: &str, widget_id: i32) -> Result<Widget> {
        let dashboard = self.get_dashboard(dashboard_slug).await?;
        dashboard
            .widgets
            .into_iter()
            .flatten()
            .find(|w| w.id == widget_id)
            .ok_or(Error::NotFound {
                kind: "widget",
                id: format!("{dashboard_slug}/{widget_id}"),
            })
    }

    pub async fn create_widget(&self, payload: &WidgetCreatePayload) -> Result<Widget> {
        self.post("api/widgets", payload).await
    }

    pub async fn update_widget(&self, id: i32, payload: &WidgetUpdatePayload) -> Result<Widget> {
        self.post(&format!("api/widgets/{id}"), payload).await
    }

    /// Widgets are not archivable: DELETE is a hard delete.
    pub async fn delete_widget(&self, id: i32) -> Result<()> {
        self.delete(&format!("api/widgets/{id}")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Text widgets carry a null visualization, visualization widgets a
    // null text. Both shapes must decode.
    #[test]
    fn it_decodes_widgets_with_null_text_or_visualization() {
        let widget: Widget = serde_json::from_value(serde_json::json!({
            "id": 5,
            "dashboard_id": 1,
            "visualization": null,
            "text": "note",
            "width": 1,
            "options": {}
        }))
        .unwrap();
        assert_eq!(widget.text.as_deref(), Some("note"));
        assert!(widget.visualization.is_none());

        let widget: Widget = serde_json::from_value(serde_json::json!({
            "id": 6,
            "dashboard_id": 1,
            "visualization": {"id": 2, "name": "counts", "type": "TABLE", "options": {}},
            "text": null,
            "width": 1,
            "options": {"isHidden": false, "position": {"col": 0, "row": 0}}
        }))
        .unwrap();
        assert_eq!(widget.text, None);
        assert_eq!(widget.visualization.map(|v| v.id), Some(2));
    }
}
