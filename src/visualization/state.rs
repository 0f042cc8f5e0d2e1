use serde::{Deserialize, Serialize};

use tf_provider::{
    map,
    value::{self, ValueBool},
    Attribute, AttributeConstraint, AttributeType, Block, Description, Diagnostics, NestedBlock,
    Schema, Value, ValueList, ValueNumber, ValueString,
};

use crate::api;
use crate::utils;

use super::options;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct VisualizationState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub visualization_id: ValueNumber,
    pub query_id: ValueNumber,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    #[serde(rename = "type")]
    pub kind: ValueString<'a>,
    #[serde(with = "value::serde_as_vec")]
    pub table_options: Value<TableOptionsBlock<'a>>,
    #[serde(with = "value::serde_as_vec")]
    pub chart_options: Value<ChartOptionsBlock<'a>>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableOptionsBlock<'a> {
    pub items_per_page: ValueNumber,
    #[serde(borrow = "'a")]
    pub columns: ValueList<Value<ColumnBlock<'a>>>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnBlock<'a> {
    pub visible: ValueBool,
    #[serde(borrow = "'a")]
    pub name: ValueString<'a>,
    pub title: ValueString<'a>,
    #[serde(rename = "type")]
    pub kind: ValueString<'a>,
    pub display_as: ValueString<'a>,
    pub align_content: ValueString<'a>,
    pub allow_search: ValueBool,
    pub order: ValueNumber,
    pub allow_html: ValueBool,
    pub highlight_links: ValueBool,
    pub number_format: ValueString<'a>,
    pub date_time_format: ValueString<'a>,
    pub boolean_values: ValueList<ValueString<'a>>,
    pub link_url_template: ValueString<'a>,
    pub link_text_template: ValueString<'a>,
    pub link_open_in_new_tab: ValueBool,
    pub link_title_template: ValueString<'a>,
    pub image_url_template: ValueString<'a>,
    pub image_width: ValueString<'a>,
    pub image_height: ValueString<'a>,
    pub image_title_template: ValueString<'a>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartOptionsBlock<'a> {
    #[serde(borrow = "'a")]
    pub global_series_type: ValueString<'a>,
    pub column_mapping: ValueList<Value<ColumnMappingBlock<'a>>>,
    #[serde(with = "value::serde_as_vec")]
    pub legend: Value<ChartLegendBlock>,
    #[serde(with = "value::serde_as_vec")]
    pub series: Value<ChartSeriesBlock<'a>>,
    pub missing_values_as_zero: ValueBool,
    #[serde(with = "value::serde_as_vec")]
    pub x_axis: Value<ChartXAxisBlock<'a>>,
    pub sort_x: ValueBool,
    pub y_axis: ValueList<Value<ChartYAxisBlock<'a>>>,
    pub series_options: ValueList<Value<ChartSeriesOptionsBlock<'a>>>,
    pub show_data_labels: ValueBool,
    pub number_format: ValueString<'a>,
    pub percent_format: ValueString<'a>,
    pub date_time_format: ValueString<'a>,
    pub text_format: ValueString<'a>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMappingBlock<'a> {
    #[serde(borrow = "'a")]
    pub column: ValueString<'a>,
    pub axis: ValueString<'a>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartLegendBlock {
    pub enabled: ValueBool,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeriesBlock<'a> {
    #[serde(borrow = "'a")]
    pub stacking: ValueString<'a>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartXAxisBlock<'a> {
    #[serde(rename = "type", borrow = "'a")]
    pub kind: ValueString<'a>,
    #[serde(with = "value::serde_as_vec")]
    pub labels: Value<ChartXAxisLabelsBlock>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartXAxisLabelsBlock {
    pub enabled: ValueBool,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartYAxisBlock<'a> {
    #[serde(rename = "type", borrow = "'a")]
    pub kind: ValueString<'a>,
    pub opposite: ValueBool,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeriesOptionsBlock<'a> {
    #[serde(borrow = "'a")]
    pub name: ValueString<'a>,
    pub z_index: ValueNumber,
    pub index: ValueNumber,
    #[serde(rename = "type")]
    pub kind: ValueString<'a>,
    pub y_axis: ValueNumber,
}

fn string_attribute(description: &'static str, constraint: AttributeConstraint) -> Attribute {
    Attribute {
        attr_type: AttributeType::String,
        description: Description::plain(description),
        constraint,
        ..Default::default()
    }
}

fn bool_attribute(description: &'static str, constraint: AttributeConstraint) -> Attribute {
    Attribute {
        attr_type: AttributeType::Bool,
        description: Description::plain(description),
        constraint,
        ..Default::default()
    }
}

fn number_attribute(description: &'static str, constraint: AttributeConstraint) -> Attribute {
    Attribute {
        attr_type: AttributeType::Number,
        description: Description::plain(description),
        constraint,
        ..Default::default()
    }
}

fn table_options_block() -> NestedBlock {
    use AttributeConstraint::{Optional, Required};
    NestedBlock::Optional(Block {
        attributes: map! {
            "items_per_page" => number_attribute("Rows shown per page", Required),
        },
        blocks: map! {
            "columns" => NestedBlock::List(Block {
                attributes: map! {
                    "visible" => bool_attribute("Whether the column is shown", Required),
                    "name" => string_attribute("Name of the result column", Required),
                    "title" => string_attribute("Label shown in the header", Required),
                    "type" => string_attribute("Column type, e.g. `string`, `number`, `datetime`, `boolean`, `link`, or `image`", Required),
                    "display_as" => string_attribute("Renderer used for the column", Required),
                    "align_content" => string_attribute("Horizontal alignment, `left`, `center`, or `right`", Required),
                    "allow_search" => bool_attribute("Whether the column participates in table search", Required),
                    "order" => number_attribute("Position of the column, lower is further left", Required),
                    "allow_html" => bool_attribute("Whether HTML in a string column is rendered", Optional),
                    "highlight_links" => bool_attribute("Whether links in a string column are highlighted", Optional),
                    "number_format" => string_attribute("Format of a number column", Optional),
                    "date_time_format" => string_attribute("Format of a datetime column", Optional),
                    "boolean_values" => Attribute {
                        attr_type: AttributeType::List(AttributeType::String.into()),
                        description: Description::plain("Labels of a boolean column, `[false, true]`"),
                        constraint: Optional,
                        ..Default::default()
                    },
                    "link_url_template" => string_attribute("URL template of a link column", Optional),
                    "link_text_template" => string_attribute("Text template of a link column", Optional),
                    "link_open_in_new_tab" => bool_attribute("Whether links open in a new tab", Optional),
                    "link_title_template" => string_attribute("Title template of a link column", Optional),
                    "image_url_template" => string_attribute("URL template of an image column", Optional),
                    "image_width" => string_attribute("Width of an image column", Optional),
                    "image_height" => string_attribute("Height of an image column", Optional),
                    "image_title_template" => string_attribute("Title template of an image column", Optional),
                },
                description: Description::plain("A table column"),
                ..Default::default()
            }),
        },
        description: Description::plain("Options of a `TABLE` visualization"),
        ..Default::default()
    })
}

fn chart_options_block() -> NestedBlock {
    use AttributeConstraint::{Optional, Required};
    NestedBlock::Optional(Block {
        attributes: map! {
            "global_series_type" => string_attribute("Default series type, e.g. `line`, `column`, or `pie`", Required),
            "missing_values_as_zero" => bool_attribute("Whether missing values are charted as zero", Required),
            "sort_x" => bool_attribute("Whether the x values are sorted", Required),
            "show_data_labels" => bool_attribute("Whether point labels are shown", Required),
            "number_format" => string_attribute("Format of numeric labels", Optional),
            "percent_format" => string_attribute("Format of percentage labels", Optional),
            "date_time_format" => string_attribute("Format of datetime labels", Optional),
            "text_format" => string_attribute("Template of point labels", Optional),
        },
        blocks: map! {
            "column_mapping" => NestedBlock::List(Block {
                attributes: map! {
                    "column" => string_attribute("Name of the result column", Required),
                    "axis" => string_attribute("Axis the column is mapped to, e.g. `x`, `y`, or `series`", Required),
                },
                description: Description::plain("Mapping of a result column onto an axis; a later entry for the same axis wins"),
                ..Default::default()
            }),
            "legend" => NestedBlock::Optional(Block {
                attributes: map! {
                    "enabled" => bool_attribute("Whether the legend is shown", Required),
                },
                description: Description::plain("Chart legend"),
                ..Default::default()
            }),
            "series" => NestedBlock::Optional(Block {
                attributes: map! {
                    "stacking" => string_attribute("Stacking mode, e.g. `stack`", Optional),
                },
                description: Description::plain("Series-wide settings"),
                ..Default::default()
            }),
            "x_axis" => NestedBlock::Optional(Block {
                attributes: map! {
                    "type" => string_attribute("Scale of the x axis, e.g. `category` or `datetime`", Required),
                },
                blocks: map! {
                    "labels" => NestedBlock::Optional(Block {
                        attributes: map! {
                            "enabled" => bool_attribute("Whether x axis labels are shown", Required),
                        },
                        description: Description::plain("X axis labels"),
                        ..Default::default()
                    }),
                },
                description: Description::plain("X axis"),
                ..Default::default()
            }),
            "y_axis" => NestedBlock::List(Block {
                attributes: map! {
                    "type" => string_attribute("Scale of the y axis, e.g. `linear` or `logarithmic`", Required),
                    "opposite" => bool_attribute("Whether the axis is drawn on the right-hand side", Optional),
                },
                description: Description::plain("A y axis; declaration order is preserved"),
                ..Default::default()
            }),
            "series_options" => NestedBlock::List(Block {
                attributes: map! {
                    "name" => string_attribute("Name of the series", Required),
                    "z_index" => number_attribute("Stacking order of the series", Required),
                    "index" => number_attribute("Index of the series", Required),
                    "type" => string_attribute("Series type, overrides `global_series_type`", Required),
                    "y_axis" => number_attribute("Index of the y axis the series is plotted on", Required),
                },
                description: Description::plain("Per-series settings; a later entry for the same name wins"),
                ..Default::default()
            }),
        },
        description: Description::plain("Options of a `CHART` visualization"),
        ..Default::default()
    })
}

impl VisualizationState<'_> {
    pub fn schema() -> Schema {
        use AttributeConstraint::{Computed, Optional, Required};
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => string_attribute("Resource identity, the numeric Redash visualization id", Computed),
                    "visualization_id" => number_attribute("Numeric Redash visualization id", Computed),
                    "query_id" => number_attribute("Id of the query the visualization renders", Required),
                    "name" => string_attribute("Display name of the visualization", Required),
                    "description" => string_attribute("Free-form description", Optional),
                    "type" => string_attribute("Either `TABLE` or `CHART`", Required),
                },
                blocks: map! {
                    "table_options" => table_options_block(),
                    "chart_options" => chart_options_block(),
                },
                description: Description::plain("A visualization of a Redash query"),
                ..Default::default()
            },
        }
    }

    /// Copy the server representation back into the state. The identity
    /// and `query_id` are managed by the caller.
    pub fn fill(&mut self, diags: &mut Diagnostics, visualization: &api::Visualization) {
        self.visualization_id = Value::Value(visualization.id as i64);
        self.name = utils::string(&visualization.name);
        self.description = match visualization.description.as_deref() {
            Some(description) if !description.is_empty() => utils::string(description),
            _ => Value::Null,
        };
        self.kind = utils::string(&visualization.kind);
        let (table, chart) = options::decode(&visualization.kind, &visualization.options);
        if table.is_null() && chart.is_null() {
            diags.root_warning(
                "Unrecognized visualization options",
                format!(
                    "The options of visualization {} (type `{}`) are not tracked; \
                     they were either created outside of this provider or malformed",
                    visualization.id, visualization.kind,
                ),
            );
        }
        self.table_options = table;
        self.chart_options = chart;
    }
}
