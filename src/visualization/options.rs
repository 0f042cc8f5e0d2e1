//! Bidirectional mapping between the configured `table_options` /
//! `chart_options` blocks and the options payload Redash stores for a
//! visualization.
//!
//! Encoding dispatches strictly on the visualization type and fails
//! closed: a type without its matching block, or an unrecognized type,
//! is an error. Decoding never fails; a payload that cannot be
//! understood simply leaves both blocks empty.

use std::collections::BTreeMap;

use thiserror::Error;
use tf_provider::{value::ValueBool, AttributePath, Value, ValueString};

use crate::api;
use crate::utils;

use super::state::{
    ChartLegendBlock, ChartOptionsBlock, ChartSeriesBlock, ChartSeriesOptionsBlock,
    ChartXAxisBlock, ChartXAxisLabelsBlock, ChartYAxisBlock, ColumnBlock, ColumnMappingBlock,
    TableOptionsBlock,
};

#[derive(Debug, Error, PartialEq)]
pub enum OptionsError {
    #[error("`{0}` is not a valid visualization type")]
    InvalidVisualizationType(String),
    #[error("`{0}` block is required and missing")]
    MissingRequiredBlock(&'static str),
}

impl OptionsError {
    pub fn path(&self) -> AttributePath {
        match self {
            Self::InvalidVisualizationType(_) => AttributePath::new("type"),
            Self::MissingRequiredBlock(name) => AttributePath::new(*name),
        }
    }
}

pub fn encode(
    kind: &str,
    table: &Value<TableOptionsBlock>,
    chart: &Value<ChartOptionsBlock>,
) -> Result<api::VisualizationOptions, OptionsError> {
    match kind {
        api::TYPE_TABLE => {
            let block = table
                .as_ref_option()
                .ok_or(OptionsError::MissingRequiredBlock("table_options"))?;
            Ok(api::VisualizationOptions::Table(encode_table(block)))
        }
        api::TYPE_CHART => {
            let block = chart
                .as_ref_option()
                .ok_or(OptionsError::MissingRequiredBlock("chart_options"))?;
            Ok(api::VisualizationOptions::Chart(encode_chart(block)))
        }
        other => Err(OptionsError::InvalidVisualizationType(other.to_owned())),
    }
}

/// Decode a stored payload back into configuration blocks. Exactly one
/// slot is populated for a known type; both stay empty when the type
/// or the payload is not understood.
pub fn decode(
    kind: &str,
    options: &serde_json::Value,
) -> (
    Value<TableOptionsBlock<'static>>,
    Value<ChartOptionsBlock<'static>>,
) {
    match kind {
        api::TYPE_TABLE => match serde_json::from_value::<api::TableOptions>(options.clone()) {
            Ok(table) => (Value::Value(decode_table(&table)), Value::Null),
            Err(_) => (Value::Null, Value::Null),
        },
        api::TYPE_CHART => match serde_json::from_value::<api::ChartOptions>(options.clone()) {
            Ok(chart) => (Value::Null, Value::Value(decode_chart(&chart))),
            Err(_) => (Value::Null, Value::Null),
        },
        _ => (Value::Null, Value::Null),
    }
}

fn opt_str(value: &ValueString) -> Option<String> {
    value.as_ref_option().map(|s| s.to_string())
}

fn opt_str_value(value: &Option<String>) -> ValueString<'static> {
    match value {
        Some(s) => utils::string(s),
        None => Value::Null,
    }
}

fn opt_bool(value: &ValueBool) -> Option<bool> {
    value.as_ref_option().copied()
}

fn opt_bool_value(value: &Option<bool>) -> ValueBool {
    match value {
        Some(b) => Value::Value(*b),
        None => Value::Null,
    }
}

fn encode_table(block: &TableOptionsBlock) -> api::TableOptions {
    api::TableOptions {
        items_per_page: block.items_per_page.unwrap_or_default(),
        columns: block
            .columns
            .iter()
            .flatten()
            .filter_map(Value::as_ref_option)
            .map(encode_column)
            .collect(),
    }
}

fn encode_column(column: &ColumnBlock) -> api::ColumnOptions {
    api::ColumnOptions {
        visible: column.visible.unwrap_or_default(),
        name: column.name.as_str().to_owned(),
        title: column.title.as_str().to_owned(),
        kind: column.kind.as_str().to_owned(),
        display_as: column.display_as.as_str().to_owned(),
        align_content: column.align_content.as_str().to_owned(),
        allow_search: column.allow_search.unwrap_or_default(),
        order: column.order.unwrap_or_default(),
        allow_html: opt_bool(&column.allow_html),
        highlight_links: opt_bool(&column.highlight_links),
        number_format: opt_str(&column.number_format),
        date_time_format: opt_str(&column.date_time_format),
        boolean_values: column
            .boolean_values
            .as_ref_option()
            .map(|values| values.iter().map(|v| v.as_str().to_owned()).collect()),
        link_url_template: opt_str(&column.link_url_template),
        link_text_template: opt_str(&column.link_text_template),
        link_open_in_new_tab: opt_bool(&column.link_open_in_new_tab),
        link_title_template: opt_str(&column.link_title_template),
        image_url_template: opt_str(&column.image_url_template),
        image_width: opt_str(&column.image_width),
        image_height: opt_str(&column.image_height),
        image_title_template: opt_str(&column.image_title_template),
    }
}

fn decode_table(options: &api::TableOptions) -> TableOptionsBlock<'static> {
    TableOptionsBlock {
        items_per_page: Value::Value(options.items_per_page),
        columns: Value::Value(
            options
                .columns
                .iter()
                .map(|column| Value::Value(decode_column(column)))
                .collect(),
        ),
    }
}

fn decode_column(column: &api::ColumnOptions) -> ColumnBlock<'static> {
    ColumnBlock {
        visible: Value::Value(column.visible),
        name: utils::string(&column.name),
        title: utils::string(&column.title),
        kind: utils::string(&column.kind),
        display_as: utils::string(&column.display_as),
        align_content: utils::string(&column.align_content),
        allow_search: Value::Value(column.allow_search),
        order: Value::Value(column.order),
        allow_html: opt_bool_value(&column.allow_html),
        highlight_links: opt_bool_value(&column.highlight_links),
        number_format: opt_str_value(&column.number_format),
        date_time_format: opt_str_value(&column.date_time_format),
        boolean_values: match &column.boolean_values {
            Some(values) => Value::Value(values.iter().map(|v| utils::string(v)).collect()),
            None => Value::Null,
        },
        link_url_template: opt_str_value(&column.link_url_template),
        link_text_template: opt_str_value(&column.link_text_template),
        link_open_in_new_tab: opt_bool_value(&column.link_open_in_new_tab),
        link_title_template: opt_str_value(&column.link_title_template),
        image_url_template: opt_str_value(&column.image_url_template),
        image_width: opt_str_value(&column.image_width),
        image_height: opt_str_value(&column.image_height),
        image_title_template: opt_str_value(&column.image_title_template),
    }
}

fn encode_chart(block: &ChartOptionsBlock) -> api::ChartOptions {
    let column_mapping = block
        .column_mapping
        .iter()
        .flatten()
        .filter_map(Value::as_ref_option)
        .fold(BTreeMap::new(), |mut mapping, pair| {
            mapping.insert(
                pair.axis.as_str().to_owned(),
                pair.column.as_str().to_owned(),
            );
            mapping
        });
    let series_options = block
        .series_options
        .iter()
        .flatten()
        .filter_map(Value::as_ref_option)
        .fold(BTreeMap::new(), |mut options, series| {
            options.insert(
                series.name.as_str().to_owned(),
                api::ChartSeriesOptions {
                    z_index: series.z_index.unwrap_or_default(),
                    index: series.index.unwrap_or_default(),
                    kind: series.kind.as_str().to_owned(),
                    y_axis: series.y_axis.unwrap_or_default(),
                },
            );
            options
        });
    api::ChartOptions {
        global_series_type: block.global_series_type.as_str().to_owned(),
        column_mapping,
        legend: block.legend.as_ref_option().map(|legend| api::ChartLegend {
            enabled: legend.enabled.unwrap_or_default(),
        }),
        series: block.series.as_ref_option().map(|series| api::ChartSeries {
            stacking: opt_str(&series.stacking),
        }),
        missing_values_as_zero: block.missing_values_as_zero.unwrap_or_default(),
        x_axis: block.x_axis.as_ref_option().map(|axis| api::ChartXAxis {
            kind: axis.kind.as_str().to_owned(),
            labels: axis
                .labels
                .as_ref_option()
                .map(|labels| api::ChartXAxisLabels {
                    enabled: labels.enabled.unwrap_or_default(),
                }),
        }),
        sort_x: block.sort_x.unwrap_or_default(),
        y_axis: block
            .y_axis
            .iter()
            .flatten()
            .filter_map(Value::as_ref_option)
            .map(|axis| api::ChartYAxis {
                kind: axis.kind.as_str().to_owned(),
                opposite: axis.opposite.unwrap_or_default(),
            })
            .collect(),
        series_options,
        show_data_labels: block.show_data_labels.unwrap_or_default(),
        number_format: opt_str(&block.number_format),
        percent_format: opt_str(&block.percent_format),
        date_time_format: opt_str(&block.date_time_format),
        text_format: opt_str(&block.text_format),
    }
}

fn decode_chart(options: &api::ChartOptions) -> ChartOptionsBlock<'static> {
    ChartOptionsBlock {
        global_series_type: utils::string(&options.global_series_type),
        column_mapping: if options.column_mapping.is_empty() {
            Value::Null
        } else {
            Value::Value(
                options
                    .column_mapping
                    .iter()
                    .map(|(axis, column)| {
                        Value::Value(ColumnMappingBlock {
                            column: utils::string(column),
                            axis: utils::string(axis),
                        })
                    })
                    .collect(),
            )
        },
        legend: match &options.legend {
            Some(legend) => Value::Value(ChartLegendBlock {
                enabled: Value::Value(legend.enabled),
            }),
            None => Value::Null,
        },
        series: match &options.series {
            Some(series) => Value::Value(ChartSeriesBlock {
                stacking: opt_str_value(&series.stacking),
            }),
            None => Value::Null,
        },
        missing_values_as_zero: Value::Value(options.missing_values_as_zero),
        x_axis: match &options.x_axis {
            Some(axis) => Value::Value(ChartXAxisBlock {
                kind: utils::string(&axis.kind),
                labels: match &axis.labels {
                    Some(labels) => Value::Value(ChartXAxisLabelsBlock {
                        enabled: Value::Value(labels.enabled),
                    }),
                    None => Value::Null,
                },
            }),
            None => Value::Null,
        },
        sort_x: Value::Value(options.sort_x),
        y_axis: if options.y_axis.is_empty() {
            Value::Null
        } else {
            Value::Value(
                options
                    .y_axis
                    .iter()
                    .map(|axis| {
                        Value::Value(ChartYAxisBlock {
                            kind: utils::string(&axis.kind),
                            opposite: Value::Value(axis.opposite),
                        })
                    })
                    .collect(),
            )
        },
        series_options: if options.series_options.is_empty() {
            Value::Null
        } else {
            Value::Value(
                options
                    .series_options
                    .iter()
                    .map(|(name, series)| {
                        Value::Value(ChartSeriesOptionsBlock {
                            name: utils::string(name),
                            z_index: Value::Value(series.z_index),
                            index: Value::Value(series.index),
                            kind: utils::string(&series.kind),
                            y_axis: Value::Value(series.y_axis),
                        })
                    })
                    .collect(),
            )
        },
        show_data_labels: Value::Value(options.show_data_labels),
        number_format: opt_str_value(&options.number_format),
        percent_format: opt_str_value(&options.percent_format),
        date_time_format: opt_str_value(&options.date_time_format),
        text_format: opt_str_value(&options.text_format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &'static str, order: i64) -> Value<ColumnBlock<'static>> {
        Value::Value(ColumnBlock {
            visible: Value::Value(true),
            name: utils::string(name),
            title: utils::string(name),
            kind: utils::string("string"),
            display_as: utils::string("string"),
            align_content: utils::string("left"),
            allow_search: Value::Value(false),
            order: Value::Value(order),
            allow_html: Value::Value(false),
            ..Default::default()
        })
    }

    fn table_block() -> TableOptionsBlock<'static> {
        TableOptionsBlock {
            items_per_page: Value::Value(25),
            columns: Value::Value(vec![column("country", 0), column("amount", 1)]),
        }
    }

    fn mapping(column: &'static str, axis: &'static str) -> Value<ColumnMappingBlock<'static>> {
        Value::Value(ColumnMappingBlock {
            column: utils::string(column),
            axis: utils::string(axis),
        })
    }

    fn chart_block() -> ChartOptionsBlock<'static> {
        ChartOptionsBlock {
            global_series_type: utils::string("column"),
            column_mapping: Value::Value(vec![mapping("day", "x"), mapping("amount", "y")]),
            legend: Value::Value(ChartLegendBlock {
                enabled: Value::Value(true),
            }),
            missing_values_as_zero: Value::Value(true),
            sort_x: Value::Value(true),
            y_axis: Value::Value(vec![
                Value::Value(ChartYAxisBlock {
                    kind: utils::string("linear"),
                    opposite: Value::Value(false),
                }),
                Value::Value(ChartYAxisBlock {
                    kind: utils::string("logarithmic"),
                    opposite: Value::Value(true),
                }),
            ]),
            series_options: Value::Value(vec![Value::Value(ChartSeriesOptionsBlock {
                name: utils::string("amount"),
                z_index: Value::Value(0),
                index: Value::Value(0),
                kind: utils::string("column"),
                y_axis: Value::Value(1),
            })]),
            show_data_labels: Value::Value(false),
            ..Default::default()
        }
    }

    #[test]
    fn it_encodes_table_options_for_a_table_visualization() {
        let encoded = encode(
            api::TYPE_TABLE,
            &Value::Value(table_block()),
            &Value::Null,
        )
        .unwrap();
        let api::VisualizationOptions::Table(table) = encoded else {
            panic!("expected table options");
        };
        assert_eq!(table.items_per_page, 25);
        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.columns[1].name, "amount");
    }

    #[test]
    fn it_fails_closed_on_a_missing_block() {
        assert_eq!(
            encode(api::TYPE_TABLE, &Value::Null, &Value::Value(chart_block())),
            Err(OptionsError::MissingRequiredBlock("table_options"))
        );
        assert_eq!(
            encode(api::TYPE_CHART, &Value::Value(table_block()), &Value::Null),
            Err(OptionsError::MissingRequiredBlock("chart_options"))
        );
    }

    #[test]
    fn it_rejects_unrecognized_types_even_with_blocks_present() {
        assert_eq!(
            encode(
                "PIE",
                &Value::Value(table_block()),
                &Value::Value(chart_block()),
            ),
            Err(OptionsError::InvalidVisualizationType("PIE".into()))
        );
    }

    #[test]
    fn it_decodes_unrecognized_types_to_empty_blocks() {
        // Asymmetric on purpose: encoding a PIE fails, but a PIE found
        // on the server must not break refresh.
        let payload = serde_json::json!({"sliceValues": true});
        let (table, chart) = decode("PIE", &payload);
        assert!(table.is_null());
        assert!(chart.is_null());
    }

    #[test]
    fn it_round_trips_table_options() {
        let encoded = encode_table(&table_block());
        let decoded = decode_table(&encoded);
        assert_eq!(encode_table(&decoded), encoded);
    }

    #[test]
    fn it_round_trips_chart_options_through_the_wire_shape() {
        let encoded = encode_chart(&chart_block());
        let payload = serde_json::to_value(&encoded).unwrap();
        let (table, chart) = decode(api::TYPE_CHART, &payload);
        assert!(table.is_null());
        let chart = chart.as_ref_option().expect("chart block");
        assert_eq!(encode_chart(chart), encoded);
    }

    #[test]
    fn it_preserves_y_axis_order() {
        let encoded = encode_chart(&chart_block());
        assert_eq!(encoded.y_axis[0].kind, "linear");
        assert_eq!(encoded.y_axis[1].kind, "logarithmic");
        let decoded = decode_chart(&encoded);
        let y_axis = decoded.y_axis.as_ref_option().expect("y_axis");
        assert_eq!(y_axis[0].as_ref_option().unwrap().kind.as_str(), "linear");
        assert_eq!(
            y_axis[1].as_ref_option().unwrap().kind.as_str(),
            "logarithmic"
        );
    }

    #[test]
    fn it_keeps_the_last_mapping_for_a_duplicated_axis() {
        let mut block = chart_block();
        block.column_mapping = Value::Value(vec![
            mapping("day", "x"),
            mapping("amount", "y"),
            mapping("week", "x"),
        ]);
        let encoded = encode_chart(&block);
        assert_eq!(encoded.column_mapping.len(), 2);
        assert_eq!(encoded.column_mapping["x"], "week");
    }

    #[test]
    fn it_serializes_chart_options_with_wire_field_names() {
        let payload = serde_json::to_value(encode_chart(&chart_block())).unwrap();
        assert!(payload.get("globalSeriesType").is_some());
        assert!(payload.get("columnMapping").is_some());
        assert!(payload.get("seriesOptions").is_some());
        assert!(payload.get("missingValuesAsZero").is_some());
    }
}
