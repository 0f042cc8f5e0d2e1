use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use tf_provider::{
    map, Attribute, AttributeConstraint, AttributePath, AttributeType, Block, DataSource,
    Description, Diagnostics, Schema, Value, ValueEmpty, ValueNumber, ValueString,
};

use crate::utils::{self, ClientHandle};

/// Looks up an existing visualization through the query that owns it,
/// typically to wire it into a widget.
#[derive(Debug, Default, Clone)]
pub struct VisualizationDataSource {
    client: ClientHandle,
}

impl VisualizationDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct VisualizationDataSourceState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub query_id: ValueNumber,
    pub visualization_id: ValueNumber,
    pub name: ValueString<'a>,
}

#[async_trait]
impl DataSource for VisualizationDataSource {
    type State<'a> = VisualizationDataSourceState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Numeric Redash visualization id"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "query_id" => Attribute {
                        attr_type: AttributeType::Number,
                        description: Description::plain("Id of the query that owns the visualization"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "visualization_id" => Attribute {
                        attr_type: AttributeType::Number,
                        description: Description::plain("Id of the visualization to look up"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "name" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Display name of the visualization"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                },
                description: Description::plain("An existing visualization of a Redash query"),
                ..Default::default()
            },
        })
    }

    async fn validate<'a>(&self, _diags: &mut Diagnostics, _config: Self::State<'a>) -> Option<()> {
        Some(())
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let client = utils::client(&self.client, diags)?;
        let Value::Value(query_id) = config.query_id else {
            diags.error_short("Query id must be known", AttributePath::new("query_id"));
            return None;
        };
        let Value::Value(visualization_id) = config.visualization_id else {
            diags.error_short(
                "Visualization id must be known",
                AttributePath::new("visualization_id"),
            );
            return None;
        };
        match client
            .get_visualization(query_id as i32, visualization_id as i32)
            .await
        {
            Ok(visualization) => {
                let mut state = config.clone();
                state.id = utils::id_string(visualization.id);
                state.name = utils::string(&visualization.name);
                Some(state)
            }
            Err(err) => {
                diags.root_error("Could not read visualization", err.to_string());
                None
            }
        }
    }
}
