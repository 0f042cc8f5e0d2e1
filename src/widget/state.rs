use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tf_provider::{
    map,
    value::{self, ValueBool},
    Attribute, AttributeConstraint, AttributeType, Block, Description, NestedBlock, Schema, Value,
    ValueList, ValueNumber, ValueString,
};

use crate::api;
use crate::utils;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct WidgetState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub widget_id: ValueNumber,
    pub dashboard_slug: ValueString<'a>,
    pub dashboard_id: ValueNumber,
    pub visualization_id: ValueNumber,
    pub text: ValueString<'a>,
    pub width: ValueNumber,
    #[serde(with = "value::serde_as_vec")]
    pub options: Value<WidgetOptionsBlock<'a>>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct WidgetOptionsBlock<'a> {
    pub is_hidden: ValueBool,
    #[serde(borrow = "'a")]
    pub parameter_mappings: ValueList<Value<ParameterMappingBlock<'a>>>,
    #[serde(with = "value::serde_as_vec")]
    pub position: Value<WidgetPositionBlock>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ParameterMappingBlock<'a> {
    /// Dashboard-level parameter key this mapping is registered under.
    #[serde(borrow = "'a")]
    pub key: ValueString<'a>,
    pub name: ValueString<'a>,
    #[serde(rename = "type")]
    pub kind: ValueString<'a>,
    pub map_to: ValueString<'a>,
    pub value: ValueString<'a>,
    pub title: ValueString<'a>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct WidgetPositionBlock {
    pub auto_height: ValueBool,
    pub size_x: ValueNumber,
    pub size_y: ValueNumber,
    pub max_size_x: ValueNumber,
    pub max_size_y: ValueNumber,
    pub min_size_x: ValueNumber,
    pub min_size_y: ValueNumber,
    pub col: ValueNumber,
    pub row: ValueNumber,
}

#[derive(Debug, Error, PartialEq)]
pub enum WidgetOptionsError {
    #[error("`{0}` block is required and missing")]
    MissingRequiredBlock(&'static str),
}

pub fn encode_options(
    options: &Value<WidgetOptionsBlock>,
) -> Result<api::WidgetOptions, WidgetOptionsError> {
    let options = options
        .as_ref_option()
        .ok_or(WidgetOptionsError::MissingRequiredBlock("options"))?;
    let position = options
        .position
        .as_ref_option()
        .ok_or(WidgetOptionsError::MissingRequiredBlock("options.position"))?;
    let parameter_mappings = options
        .parameter_mappings
        .iter()
        .flatten()
        .filter_map(Value::as_ref_option)
        .fold(BTreeMap::new(), |mut mappings, mapping| {
            mappings.insert(
                mapping.key.as_str().to_owned(),
                api::ParameterMapping {
                    name: mapping.name.as_str().to_owned(),
                    kind: mapping.kind.as_str().to_owned(),
                    map_to: mapping.map_to.as_str().to_owned(),
                    value: mapping.value.as_str().to_owned(),
                    title: mapping.title.as_str().to_owned(),
                },
            );
            mappings
        });
    Ok(api::WidgetOptions {
        is_hidden: options.is_hidden.unwrap_or_default(),
        parameter_mappings,
        position: api::WidgetPosition {
            auto_height: position.auto_height.unwrap_or_default(),
            size_x: position.size_x.unwrap_or_default(),
            size_y: position.size_y.unwrap_or_default(),
            max_size_x: position.max_size_x.unwrap_or_default(),
            max_size_y: position.max_size_y.unwrap_or_default(),
            min_size_x: position.min_size_x.unwrap_or_default(),
            min_size_y: position.min_size_y.unwrap_or_default(),
            col: position.col.unwrap_or_default(),
            row: position.row.unwrap_or_default(),
        },
    })
}

pub fn decode_options(options: &api::WidgetOptions) -> Value<WidgetOptionsBlock<'static>> {
    Value::Value(WidgetOptionsBlock {
        is_hidden: Value::Value(options.is_hidden),
        parameter_mappings: if options.parameter_mappings.is_empty() {
            Value::Null
        } else {
            Value::Value(
                options
                    .parameter_mappings
                    .iter()
                    .map(|(key, mapping)| {
                        Value::Value(ParameterMappingBlock {
                            key: utils::string(key),
                            name: utils::string(&mapping.name),
                            kind: utils::string(&mapping.kind),
                            map_to: utils::string(&mapping.map_to),
                            value: utils::string(&mapping.value),
                            title: utils::string(&mapping.title),
                        })
                    })
                    .collect(),
            )
        },
        position: Value::Value(WidgetPositionBlock {
            auto_height: Value::Value(options.position.auto_height),
            size_x: Value::Value(options.position.size_x),
            size_y: Value::Value(options.position.size_y),
            max_size_x: Value::Value(options.position.max_size_x),
            max_size_y: Value::Value(options.position.max_size_y),
            min_size_x: Value::Value(options.position.min_size_x),
            min_size_y: Value::Value(options.position.min_size_y),
            col: Value::Value(options.position.col),
            row: Value::Value(options.position.row),
        }),
    })
}

impl WidgetState<'_> {
    pub fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Resource identity, the numeric Redash widget id"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "widget_id" => Attribute {
                        attr_type: AttributeType::Number,
                        description: Description::plain("Numeric Redash widget id"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "dashboard_slug" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Slug of the dashboard the widget belongs to; changing it replaces the widget"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "dashboard_id" => Attribute {
                        attr_type: AttributeType::Number,
                        description: Description::plain("Numeric id of the owning dashboard"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "visualization_id" => Attribute {
                        attr_type: AttributeType::Number,
                        description: Description::plain("Visualization shown by the widget; omit for a text-only widget"),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "text" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Markdown body of a text widget"),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "width" => Attribute {
                        attr_type: AttributeType::Number,
                        description: Description::plain("Widget width"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                },
                blocks: map! {
                    "options" => NestedBlock::Optional(Block {
                        attributes: map! {
                            "is_hidden" => Attribute {
                                attr_type: AttributeType::Bool,
                                description: Description::plain("Whether the widget is hidden"),
                                constraint: AttributeConstraint::Optional,
                                ..Default::default()
                            },
                        },
                        blocks: map! {
                            "parameter_mappings" => NestedBlock::List(Block {
                                attributes: map! {
                                    "key" => Attribute {
                                        attr_type: AttributeType::String,
                                        description: Description::plain("Dashboard-level parameter key"),
                                        constraint: AttributeConstraint::Required,
                                        ..Default::default()
                                    },
                                    "name" => Attribute {
                                        attr_type: AttributeType::String,
                                        description: Description::plain("Name of the query parameter being mapped"),
                                        constraint: AttributeConstraint::Required,
                                        ..Default::default()
                                    },
                                    "type" => Attribute {
                                        attr_type: AttributeType::String,
                                        description: Description::plain("Mapping type, e.g. `dashboard-level`"),
                                        constraint: AttributeConstraint::Required,
                                        ..Default::default()
                                    },
                                    "map_to" => Attribute {
                                        attr_type: AttributeType::String,
                                        description: Description::plain("Parameter the mapping resolves to"),
                                        constraint: AttributeConstraint::Optional,
                                        ..Default::default()
                                    },
                                    "value" => Attribute {
                                        attr_type: AttributeType::String,
                                        description: Description::plain("Static value of a `static-value` mapping"),
                                        constraint: AttributeConstraint::Optional,
                                        ..Default::default()
                                    },
                                    "title" => Attribute {
                                        attr_type: AttributeType::String,
                                        description: Description::plain("Label shown in the UI"),
                                        constraint: AttributeConstraint::Optional,
                                        ..Default::default()
                                    },
                                },
                                description: Description::plain("A widget parameter mapping"),
                                ..Default::default()
                            }),
                            "position" => NestedBlock::Optional(Block {
                                attributes: map! {
                                    "auto_height" => Attribute {
                                        attr_type: AttributeType::Bool,
                                        description: Description::plain("Whether the widget grows with its content"),
                                        constraint: AttributeConstraint::Optional,
                                        ..Default::default()
                                    },
                                    "size_x" => Attribute {
                                        attr_type: AttributeType::Number,
                                        description: Description::plain("Width in grid columns"),
                                        constraint: AttributeConstraint::Required,
                                        ..Default::default()
                                    },
                                    "size_y" => Attribute {
                                        attr_type: AttributeType::Number,
                                        description: Description::plain("Height in grid rows"),
                                        constraint: AttributeConstraint::Required,
                                        ..Default::default()
                                    },
                                    "max_size_x" => Attribute {
                                        attr_type: AttributeType::Number,
                                        description: Description::plain("Maximum width in grid columns"),
                                        constraint: AttributeConstraint::Optional,
                                        ..Default::default()
                                    },
                                    "max_size_y" => Attribute {
                                        attr_type: AttributeType::Number,
                                        description: Description::plain("Maximum height in grid rows"),
                                        constraint: AttributeConstraint::Optional,
                                        ..Default::default()
                                    },
                                    "min_size_x" => Attribute {
                                        attr_type: AttributeType::Number,
                                        description: Description::plain("Minimum width in grid columns"),
                                        constraint: AttributeConstraint::Optional,
                                        ..Default::default()
                                    },
                                    "min_size_y" => Attribute {
                                        attr_type: AttributeType::Number,
                                        description: Description::plain("Minimum height in grid rows"),
                                        constraint: AttributeConstraint::Optional,
                                        ..Default::default()
                                    },
                                    "col" => Attribute {
                                        attr_type: AttributeType::Number,
                                        description: Description::plain("Grid column of the top-left corner"),
                                        constraint: AttributeConstraint::Required,
                                        ..Default::default()
                                    },
                                    "row" => Attribute {
                                        attr_type: AttributeType::Number,
                                        description: Description::plain("Grid row of the top-left corner"),
                                        constraint: AttributeConstraint::Required,
                                        ..Default::default()
                                    },
                                },
                                description: Description::plain("Placement of the widget on the dashboard grid"),
                                ..Default::default()
                            }),
                        },
                        description: Description::plain("Widget options"),
                        ..Default::default()
                    }),
                },
                description: Description::plain("A widget on a Redash dashboard"),
                ..Default::default()
            },
        }
    }

    /// Copy the server representation back into the state. The identity
    /// and the dashboard slug are managed by the caller.
    pub fn fill(&mut self, widget: &api::Widget) {
        self.widget_id = Value::Value(widget.id as i64);
        self.dashboard_id = Value::Value(widget.dashboard_id as i64);
        self.visualization_id = match &widget.visualization {
            Some(visualization) => Value::Value(visualization.id as i64),
            None => Value::Null,
        };
        self.text = match widget.text.as_deref() {
            Some(text) if !text.is_empty() => utils::string(text),
            _ => Value::Null,
        };
        self.width = Value::Value(widget.width);
        self.options = decode_options(&widget.options);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(key: &'static str, name: &'static str) -> Value<ParameterMappingBlock<'static>> {
        Value::Value(ParameterMappingBlock {
            key: utils::string(key),
            name: utils::string(name),
            kind: utils::string("dashboard-level"),
            map_to: utils::string(name),
            value: Value::Null,
            title: Value::Null,
        })
    }

    fn options_with_position() -> WidgetOptionsBlock<'static> {
        WidgetOptionsBlock {
            is_hidden: Value::Value(false),
            parameter_mappings: Value::Null,
            position: Value::Value(WidgetPositionBlock {
                size_x: Value::Value(3),
                size_y: Value::Value(8),
                col: Value::Value(0),
                row: Value::Value(2),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn it_requires_the_options_block() {
        assert_eq!(
            encode_options(&Value::Null),
            Err(WidgetOptionsError::MissingRequiredBlock("options"))
        );
    }

    #[test]
    fn it_requires_the_position_block() {
        let mut options = options_with_position();
        options.position = Value::Null;
        assert_eq!(
            encode_options(&Value::Value(options)),
            Err(WidgetOptionsError::MissingRequiredBlock("options.position"))
        );
    }

    #[test]
    fn it_keys_parameter_mappings_and_keeps_the_last_write() {
        let mut options = options_with_position();
        options.parameter_mappings = Value::Value(vec![
            mapping("region", "region"),
            mapping("country", "country"),
            mapping("region", "region_override"),
        ]);
        let encoded = encode_options(&Value::Value(options)).unwrap();
        assert_eq!(encoded.parameter_mappings.len(), 2);
        assert_eq!(encoded.parameter_mappings["region"].name, "region_override");
    }

    #[test]
    fn it_fills_a_missing_text_as_unset() {
        let mut state = WidgetState::default();
        state.fill(&api::Widget {
            id: 7,
            dashboard_id: 2,
            width: 1,
            ..Default::default()
        });
        assert_eq!(state.text, Value::Null);
        assert_eq!(state.widget_id, Value::Value(7));
        assert_eq!(state.visualization_id, Value::Null);
    }

    #[test]
    fn it_round_trips_options() {
        let mut options = options_with_position();
        options.parameter_mappings = Value::Value(vec![mapping("country", "country")]);
        let encoded = encode_options(&Value::Value(options)).unwrap();
        let reencoded = encode_options(&decode_options(&encoded)).unwrap();
        assert_eq!(encoded, reencoded);
    }
}
