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
pub struct QueryState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub query_id: ValueNumber,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub data_source_id: ValueNumber,
    pub query: ValueString<'a>,
    pub query_hash: ValueString<'a>,
    #[serde(with = "value::serde_as_vec")]
    pub options: Value<QueryOptionsBlock<'a>>,
    pub is_draft: ValueBool,
    pub is_archived: ValueBool,
    pub is_safe: ValueBool,
    pub version: ValueNumber,
    pub api_key: ValueString<'a>,
    pub tags: ValueList<ValueString<'a>>,
    pub latest_query_data_id: ValueNumber,
    #[serde(with = "value::serde_as_vec")]
    pub schedule: Value<QueryScheduleBlock<'a>>,
    pub is_favorite: ValueBool,
    pub can_edit: ValueBool,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct QueryOptionsBlock<'a> {
    #[serde(borrow = "'a")]
    pub parameters: ValueList<Value<QueryParameterBlock<'a>>>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct QueryParameterBlock<'a> {
    #[serde(borrow = "'a")]
    pub name: ValueString<'a>,
    pub title: ValueString<'a>,
    pub parent_query_id: ValueNumber,
    #[serde(rename = "type")]
    pub kind: ValueString<'a>,
    #[serde(with = "value::serde_as_vec")]
    pub value: Value<ParameterValueBlock<'a>>,
    pub enum_options: ValueString<'a>,
    pub global: ValueBool,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ParameterValueBlock<'a> {
    #[serde(borrow = "'a")]
    pub string: ValueString<'a>,
    #[serde(with = "value::serde_as_vec")]
    pub range: Value<ValueRangeBlock<'a>>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ValueRangeBlock<'a> {
    #[serde(borrow = "'a")]
    pub start: ValueString<'a>,
    pub end: ValueString<'a>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct QueryScheduleBlock<'a> {
    pub interval: ValueNumber,
    #[serde(borrow = "'a")]
    pub time: ValueString<'a>,
    pub day_of_week: ValueString<'a>,
}

/// Failure to turn configured parameters into their wire shape.
#[derive(Debug, Error, PartialEq)]
pub enum ParameterError {
    #[error("`{0}` is not a supported parameter type")]
    InvalidParameterType(String),
    #[error("parameter `{name}` is missing its `{block}` block")]
    MissingValue { name: String, block: &'static str },
}

/// Parameter types carrying a plain string value. Every other known
/// type (`date-range`) carries a {start, end} range.
pub const TEXT_KINDS: &[&str] = &["text", "number", "enum", "datetime-local"];
pub const RANGE_KIND: &str = "date-range";

pub fn encode_options(
    options: &Value<QueryOptionsBlock>,
) -> Result<api::QueryOptions, ParameterError> {
    let Some(options) = options.as_ref_option() else {
        return Ok(api::QueryOptions::default());
    };
    let parameters = options
        .parameters
        .iter()
        .flatten()
        .filter_map(Value::as_ref_option)
        .map(encode_parameter)
        .collect::<Result<_, _>>()?;
    Ok(api::QueryOptions { parameters })
}

fn encode_parameter(
    parameter: &QueryParameterBlock,
) -> Result<api::QueryParameter, ParameterError> {
    let name = parameter.name.as_str().to_owned();
    let kind = parameter.kind.as_str();
    let value_block = parameter.value.as_ref_option();
    let value = if TEXT_KINDS.contains(&kind) {
        let block = value_block.ok_or_else(|| ParameterError::MissingValue {
            name: name.clone(),
            block: "value",
        })?;
        api::ParameterValue::Text(block.string.as_str().to_owned())
    } else if kind == RANGE_KIND {
        let block = value_block.ok_or_else(|| ParameterError::MissingValue {
            name: name.clone(),
            block: "value",
        })?;
        let range = block
            .range
            .as_ref_option()
            .ok_or_else(|| ParameterError::MissingValue {
                name: name.clone(),
                block: "value.range",
            })?;
        api::ParameterValue::Range(api::ValueRange {
            start: range.start.as_str().to_owned(),
            end: range.end.as_str().to_owned(),
        })
    } else {
        return Err(ParameterError::InvalidParameterType(kind.to_owned()));
    };
    Ok(api::QueryParameter {
        name,
        title: parameter.title.as_str().to_owned(),
        parent_query_id: parameter.parent_query_id.as_ref_option().map(|id| *id as i32),
        kind: kind.to_owned(),
        value,
        enum_options: parameter.enum_options.as_ref_option().map(|s| s.to_string()),
        global: parameter.global.unwrap_or_default(),
    })
}

pub fn decode_options(options: &api::QueryOptions) -> Value<QueryOptionsBlock<'static>> {
    if options.parameters.is_empty() {
        return Value::Null;
    }
    Value::Value(QueryOptionsBlock {
        parameters: Value::Value(
            options
                .parameters
                .iter()
                .map(|parameter| Value::Value(decode_parameter(parameter)))
                .collect(),
        ),
    })
}

fn decode_parameter(parameter: &api::QueryParameter) -> QueryParameterBlock<'static> {
    let value = match &parameter.value {
        api::ParameterValue::Text(text) => ParameterValueBlock {
            string: utils::string(text),
            range: Value::Null,
        },
        api::ParameterValue::Range(range) => ParameterValueBlock {
            string: Value::Null,
            range: Value::Value(ValueRangeBlock {
                start: utils::string(&range.start),
                end: utils::string(&range.end),
            }),
        },
    };
    QueryParameterBlock {
        name: utils::string(&parameter.name),
        title: utils::string(&parameter.title),
        parent_query_id: match parameter.parent_query_id {
            Some(id) => Value::Value(id as i64),
            None => Value::Null,
        },
        kind: utils::string(&parameter.kind),
        value: Value::Value(value),
        enum_options: match &parameter.enum_options {
            Some(options) => utils::string(options),
            None => Value::Null,
        },
        global: Value::Value(parameter.global),
    }
}

pub fn encode_schedule(schedule: &Value<QueryScheduleBlock>) -> Option<api::QuerySchedule> {
    schedule.as_ref_option().map(|schedule| api::QuerySchedule {
        interval: schedule.interval.unwrap_or_default(),
        time: schedule.time.as_ref_option().map(|time| time.to_string()),
        day_of_week: schedule.day_of_week.as_ref_option().map(|day| day.to_string()),
    })
}

pub fn decode_schedule(
    schedule: &Option<api::QuerySchedule>,
) -> Value<QueryScheduleBlock<'static>> {
    match schedule {
        Some(schedule) => Value::Value(QueryScheduleBlock {
            interval: Value::Value(schedule.interval),
            time: match &schedule.time {
                Some(time) => utils::string(time),
                None => Value::Null,
            },
            day_of_week: match &schedule.day_of_week {
                Some(day) => utils::string(day),
                None => Value::Null,
            },
        }),
        None => Value::Null,
    }
}

impl QueryState<'_> {
    pub fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Resource identity, the numeric Redash query id"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "query_id" => Attribute {
                        attr_type: AttributeType::Number,
                        description: Description::plain("Numeric Redash query id"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "name" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Display name of the query"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "description" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Free-form description"),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "data_source_id" => Attribute {
                        attr_type: AttributeType::Number,
                        description: Description::plain("Id of the data source the query runs against"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "query" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Query text"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "query_hash" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Server-side hash of the query text"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "is_draft" => Attribute {
                        attr_type: AttributeType::Bool,
                        description: Description::plain("Whether the query is still a draft"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "is_archived" => Attribute {
                        attr_type: AttributeType::Bool,
                        description: Description::plain("Whether the query has been archived"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "is_safe" => Attribute {
                        attr_type: AttributeType::Bool,
                        description: Description::plain("Whether Redash considers the query safe"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "version" => Attribute {
                        attr_type: AttributeType::Number,
                        description: Description::plain("Server-side revision counter"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "api_key" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("API key of the query"),
                        constraint: AttributeConstraint::Computed,
                        sensitive: true,
                        ..Default::default()
                    },
                    "tags" => Attribute {
                        attr_type: AttributeType::List(AttributeType::String.into()),
                        description: Description::plain("Tags attached to the query"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "latest_query_data_id" => Attribute {
                        attr_type: AttributeType::Number,
                        description: Description::plain("Id of the most recent result set"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "is_favorite" => Attribute {
                        attr_type: AttributeType::Bool,
                        description: Description::plain("Whether the query is a favorite of the calling user"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "can_edit" => Attribute {
                        attr_type: AttributeType::Bool,
                        description: Description::plain("Whether the calling user may edit the query"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                },
                blocks: map! {
                    "options" => NestedBlock::Optional(Block {
                        blocks: map! {
                            "parameters" => NestedBlock::List(Block {
                                attributes: map! {
                                    "name" => Attribute {
                                        attr_type: AttributeType::String,
                                        description: Description::plain("Name referenced from the query text"),
                                        constraint: AttributeConstraint::Required,
                                        ..Default::default()
                                    },
                                    "title" => Attribute {
                                        attr_type: AttributeType::String,
                                        description: Description::plain("Label shown in the UI"),
                                        constraint: AttributeConstraint::Optional,
                                        ..Default::default()
                                    },
                                    "parent_query_id" => Attribute {
                                        attr_type: AttributeType::Number,
                                        description: Description::plain("Query providing the values of a query-based dropdown"),
                                        constraint: AttributeConstraint::Optional,
                                        ..Default::default()
                                    },
                                    "type" => Attribute {
                                        attr_type: AttributeType::String,
                                        description: Description::plain("One of `text`, `number`, `enum`, `datetime-local`, or `date-range`"),
                                        constraint: AttributeConstraint::Required,
                                        ..Default::default()
                                    },
                                    "enum_options" => Attribute {
                                        attr_type: AttributeType::String,
                                        description: Description::plain("Newline-separated choices of an `enum` parameter"),
                                        constraint: AttributeConstraint::Optional,
                                        ..Default::default()
                                    },
                                    "global" => Attribute {
                                        attr_type: AttributeType::Bool,
                                        description: Description::plain("Whether the parameter is shared dashboard-wide"),
                                        constraint: AttributeConstraint::Optional,
                                        ..Default::default()
                                    },
                                },
                                blocks: map! {
                                    "value" => NestedBlock::Optional(Block {
                                        attributes: map! {
                                            "string" => Attribute {
                                                attr_type: AttributeType::String,
                                                description: Description::plain("Default value of a string-valued parameter"),
                                                constraint: AttributeConstraint::Optional,
                                                ..Default::default()
                                            },
                                        },
                                        blocks: map! {
                                            "range" => NestedBlock::Optional(Block {
                                                attributes: map! {
                                                    "start" => Attribute {
                                                        attr_type: AttributeType::String,
                                                        description: Description::plain("Start of the default range"),
                                                        constraint: AttributeConstraint::Required,
                                                        ..Default::default()
                                                    },
                                                    "end" => Attribute {
                                                        attr_type: AttributeType::String,
                                                        description: Description::plain("End of the default range"),
                                                        constraint: AttributeConstraint::Required,
                                                        ..Default::default()
                                                    },
                                                },
                                                description: Description::plain("Default value of a `date-range` parameter"),
                                                ..Default::default()
                                            }),
                                        },
                                        description: Description::plain("Default value of the parameter"),
                                        ..Default::default()
                                    }),
                                },
                                description: Description::plain("A query parameter"),
                                ..Default::default()
                            }),
                        },
                        description: Description::plain("Query options"),
                        ..Default::default()
                    }),
                    "schedule" => NestedBlock::Optional(Block {
                        attributes: map! {
                            "interval" => Attribute {
                                attr_type: AttributeType::Number,
                                description: Description::plain("Refresh interval in seconds"),
                                constraint: AttributeConstraint::Required,
                                ..Default::default()
                            },
                            "time" => Attribute {
                                attr_type: AttributeType::String,
                                description: Description::plain("Time of day for daily schedules, `HH:MM`"),
                                constraint: AttributeConstraint::Optional,
                                ..Default::default()
                            },
                            "day_of_week" => Attribute {
                                attr_type: AttributeType::String,
                                description: Description::plain("Day of week for weekly schedules"),
                                constraint: AttributeConstraint::Optional,
                                ..Default::default()
                            },
                        },
                        description: Description::plain("Automatic refresh schedule"),
                        ..Default::default()
                    }),
                },
                description: Description::plain("A Redash query"),
                ..Default::default()
            },
        }
    }

    /// Copy the server representation back into the state. The identity
    /// is managed by the caller and is deliberately left alone.
    pub fn fill(&mut self, query: &api::Query) {
        self.query_id = Value::Value(query.id as i64);
        self.name = utils::string(&query.name);
        if let Some(description) = &query.description {
            self.description = utils::string(description);
        } else if !self.description.is_value() {
            self.description = Value::Null;
        }
        self.data_source_id = Value::Value(query.data_source_id as i64);
        self.query = utils::string(&query.query);
        if let Some(hash) = &query.query_hash {
            self.query_hash = utils::string(hash);
        } else if !self.query_hash.is_value() {
            self.query_hash = Value::Null;
        }
        self.options = decode_options(&query.options);
        self.is_draft = Value::Value(query.is_draft);
        self.is_archived = Value::Value(query.is_archived);
        self.is_safe = Value::Value(query.is_safe);
        self.version = Value::Value(query.version);
        if let Some(key) = &query.api_key {
            self.api_key = utils::string(key);
        } else if !self.api_key.is_value() {
            self.api_key = Value::Null;
        }
        self.tags = Value::Value(query.tags.iter().map(|tag| utils::string(tag)).collect());
        self.latest_query_data_id = match query.latest_query_data_id {
            Some(id) => Value::Value(id),
            None => Value::Null,
        };
        self.schedule = decode_schedule(&query.schedule);
        self.is_favorite = Value::Value(query.is_favorite);
        self.can_edit = Value::Value(query.can_edit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_parameter(kind: &'static str) -> QueryParameterBlock<'static> {
        QueryParameterBlock {
            name: utils::string("country"),
            title: utils::string("Country"),
            kind: utils::string(kind),
            value: Value::Value(ParameterValueBlock {
                string: utils::string("FR"),
                range: Value::Null,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn it_encodes_string_valued_parameters() {
        for kind in ["text", "number", "enum", "datetime-local"] {
            let encoded = encode_parameter(&text_parameter(kind)).unwrap();
            assert_eq!(encoded.kind, kind);
            assert_eq!(encoded.value, api::ParameterValue::Text("FR".into()));
        }
    }

    #[test]
    fn it_encodes_date_range_parameters() {
        let parameter = QueryParameterBlock {
            name: utils::string("period"),
            kind: utils::string("date-range"),
            value: Value::Value(ParameterValueBlock {
                string: Value::Null,
                range: Value::Value(ValueRangeBlock {
                    start: utils::string("2024-01-01"),
                    end: utils::string("2024-12-31"),
                }),
            }),
            ..Default::default()
        };
        let encoded = encode_parameter(&parameter).unwrap();
        assert_eq!(
            encoded.value,
            api::ParameterValue::Range(api::ValueRange {
                start: "2024-01-01".into(),
                end: "2024-12-31".into(),
            })
        );
    }

    #[test]
    fn it_rejects_unknown_parameter_types() {
        let mut parameter = text_parameter("text");
        parameter.kind = utils::string("geo-point");
        assert_eq!(
            encode_parameter(&parameter),
            Err(ParameterError::InvalidParameterType("geo-point".into()))
        );
    }

    #[test]
    fn it_requires_the_value_block() {
        let mut parameter = text_parameter("text");
        parameter.value = Value::Null;
        assert_eq!(
            encode_parameter(&parameter),
            Err(ParameterError::MissingValue {
                name: "country".into(),
                block: "value",
            })
        );
    }

    #[test]
    fn it_requires_the_range_block_for_date_ranges() {
        let mut parameter = text_parameter("date-range");
        assert_eq!(
            encode_parameter(&parameter),
            Err(ParameterError::MissingValue {
                name: "country".into(),
                block: "value.range",
            })
        );
        parameter.value = Value::Null;
        assert_eq!(
            encode_parameter(&parameter),
            Err(ParameterError::MissingValue {
                name: "country".into(),
                block: "value",
            })
        );
    }

    #[test]
    fn it_round_trips_parameters() {
        let options = Value::Value(QueryOptionsBlock {
            parameters: Value::Value(vec![Value::Value(text_parameter("text"))]),
        });
        let encoded = encode_options(&options).unwrap();
        let decoded = decode_options(&encoded);
        let reencoded = encode_options(&decoded).unwrap();
        assert_eq!(encoded, reencoded);
    }

    #[test]
    fn it_round_trips_schedules() {
        let schedule = Value::Value(QueryScheduleBlock {
            interval: Value::Value(86400),
            time: utils::string("06:00"),
            day_of_week: Value::Null,
        });
        let encoded = encode_schedule(&schedule);
        assert_eq!(
            encoded,
            Some(api::QuerySchedule {
                interval: 86400,
                time: Some("06:00".into()),
                day_of_week: None,
            })
        );
        let reencoded = encode_schedule(&decode_schedule(&encoded));
        assert_eq!(encoded, reencoded);
    }
}
