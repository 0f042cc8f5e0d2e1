use serde::{Deserialize, Serialize};

use tf_provider::{
    map, value::ValueBool, Attribute, AttributeConstraint, AttributeType, Block, Description,
    Schema, Value, ValueList, ValueNumber, ValueString,
};

use crate::api;
use crate::utils;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct DashboardState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub dashboard_id: ValueNumber,
    pub name: ValueString<'a>,
    pub slug: ValueString<'a>,
    pub is_favorite: ValueBool,
    pub is_archived: ValueBool,
    pub is_draft: ValueBool,
    pub dashboard_filters_enabled: ValueBool,
    pub version: ValueNumber,
    pub tags: ValueList<ValueString<'a>>,
    pub public_url: ValueString<'a>,
    pub can_edit: ValueBool,
    pub api_key: ValueString<'a>,
}

impl DashboardState<'_> {
    pub fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Resource identity, the numeric Redash dashboard id"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "dashboard_id" => Attribute {
                        attr_type: AttributeType::Number,
                        description: Description::plain("Numeric Redash dashboard id"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "name" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Display name of the dashboard"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "slug" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("URL slug derived by Redash from the name"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "is_favorite" => Attribute {
                        attr_type: AttributeType::Bool,
                        description: Description::plain("Whether the dashboard is a favorite of the calling user"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "is_archived" => Attribute {
                        attr_type: AttributeType::Bool,
                        description: Description::plain("Whether the dashboard has been archived"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "is_draft" => Attribute {
                        attr_type: AttributeType::Bool,
                        description: Description::plain("Whether the dashboard is still a draft"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "dashboard_filters_enabled" => Attribute {
                        attr_type: AttributeType::Bool,
                        description: Description::plain("Whether dashboard-level filters are enabled"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "version" => Attribute {
                        attr_type: AttributeType::Number,
                        description: Description::plain("Server-side revision counter"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "tags" => Attribute {
                        attr_type: AttributeType::List(AttributeType::String.into()),
                        description: Description::plain("Tags attached to the dashboard"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "public_url" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Public sharing URL, when sharing is enabled"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "can_edit" => Attribute {
                        attr_type: AttributeType::Bool,
                        description: Description::plain("Whether the calling user may edit the dashboard"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "api_key" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("API key of the dashboard, when sharing is enabled"),
                        constraint: AttributeConstraint::Computed,
                        sensitive: true,
                        ..Default::default()
                    },
                },
                description: Description::plain("A Redash dashboard"),
                ..Default::default()
            },
        }
    }

    /// Copy the server representation back into the state. The identity
    /// is managed by the caller and is deliberately left alone.
    pub fn fill(&mut self, dashboard: &api::Dashboard) {
        self.dashboard_id = Value::Value(dashboard.id as i64);
        self.name = utils::string(&dashboard.name);
        self.slug = utils::string(&dashboard.slug);
        self.is_favorite = Value::Value(dashboard.is_favorite);
        self.is_archived = Value::Value(dashboard.is_archived);
        self.is_draft = Value::Value(dashboard.is_draft);
        self.dashboard_filters_enabled = Value::Value(dashboard.dashboard_filters_enabled);
        self.version = Value::Value(dashboard.version);
        self.tags = Value::Value(dashboard.tags.iter().map(|tag| utils::string(tag)).collect());
        // Redash omits these unless sharing is enabled; a known prior
        // value is kept rather than erased.
        if let Some(url) = &dashboard.public_url {
            self.public_url = utils::string(url);
        } else if !self.public_url.is_value() {
            self.public_url = Value::Null;
        }
        self.can_edit = Value::Value(dashboard.can_edit);
        if let Some(key) = &dashboard.api_key {
            self.api_key = utils::string(key);
        } else if !self.api_key.is_value() {
            self.api_key = Value::Null;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_fills_state_from_a_server_dashboard() {
        let dashboard = api::Dashboard {
            id: 7,
            name: "Ops".into(),
            slug: "ops".into(),
            version: 3,
            tags: vec!["team".into()],
            can_edit: true,
            ..Default::default()
        };
        let mut state = DashboardState::default();
        state.fill(&dashboard);
        assert_eq!(state.dashboard_id, Value::Value(7));
        assert_eq!(state.slug.as_str(), "ops");
        assert_eq!(state.public_url, Value::Null);
        assert_eq!(state.can_edit, Value::Value(true));
        assert!(state.id.is_null());
    }
}
