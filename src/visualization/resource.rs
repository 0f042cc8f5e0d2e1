use async_trait::async_trait;

use tf_provider::{AttributePath, Diagnostics, Resource, Schema, Value, ValueEmpty, ValueString};

use crate::api;
use crate::utils::{self, ClientHandle};

use super::options;
use super::state::VisualizationState;

#[derive(Debug, Default, Clone)]
pub struct VisualizationResource {
    client: ClientHandle,
}

impl VisualizationResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for VisualizationResource {
    type State<'a> = VisualizationState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(VisualizationState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        let Value::Value(kind) = &config.kind else {
            return Some(());
        };
        match kind.as_ref() {
            api::TYPE_TABLE => {
                if config.table_options.is_null() {
                    diags.error_short(
                        "`table_options` block is required for a `TABLE` visualization",
                        AttributePath::new("table_options"),
                    );
                    return None;
                }
            }
            api::TYPE_CHART => {
                if config.chart_options.is_null() {
                    diags.error_short(
                        "`chart_options` block is required for a `CHART` visualization",
                        AttributePath::new("chart_options"),
                    );
                    return None;
                }
            }
            other => {
                diags.error(
                    "Invalid visualization type",
                    format!("`{other}` is not one of `TABLE` or `CHART`"),
                    AttributePath::new("type"),
                );
                return None;
            }
        }
        Some(())
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = utils::client(&self.client, diags)?;
        let id = utils::parse_id(diags, &state.id)?;
        let Value::Value(query_id) = state.query_id else {
            diags.error_short(
                "Query id is missing from the state",
                AttributePath::new("query_id"),
            );
            return None;
        };
        match client.get_visualization(query_id as i32, id).await {
            Ok(visualization) => {
                let mut state = state.clone();
                state.fill(diags, &visualization);
                Some((state, private_state))
            }
            Err(err) => {
                diags.root_error("Could not read visualization", err.to_string());
                None
            }
        }
    }

    async fn plan_create<'a>(
        &self,
        _diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = proposed_state.clone();
        state.id = ValueString::Unknown;
        state.visualization_id = Value::Unknown;
        Some((state, Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>, Vec<AttributePath>)> {
        Some((proposed_state.clone(), prior_private_state, vec![]))
    }

    async fn plan_destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        _prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        Some(())
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = utils::client(&self.client, diags)?;
        let mut state = planned_state.clone();
        let Value::Value(query_id) = state.query_id else {
            diags.error_short("Query id must be known", AttributePath::new("query_id"));
            return None;
        };
        let options = match options::encode(
            state.kind.as_str(),
            &state.table_options,
            &state.chart_options,
        ) {
            Ok(options) => options,
            Err(err) => {
                diags.error_short(err.to_string(), err.path());
                return None;
            }
        };
        let payload = api::VisualizationCreatePayload {
            query_id: query_id as i32,
            name: state.name.as_str().to_owned(),
            kind: state.kind.as_str().to_owned(),
            description: state.description.as_str().to_owned(),
            options,
        };
        let visualization = match client.create_visualization(&payload).await {
            Ok(visualization) => visualization,
            Err(err) => {
                diags.root_error("Could not create visualization", err.to_string());
                return None;
            }
        };
        state.id = utils::id_string(visualization.id);
        state.visualization_id = Value::Value(visualization.id as i64);
        Some((state, planned_private_state))
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = utils::client(&self.client, diags)?;
        let mut state = planned_state.clone();
        let id = utils::parse_id(diags, &state.id)?;
        let options = match options::encode(
            state.kind.as_str(),
            &state.table_options,
            &state.chart_options,
        ) {
            Ok(options) => options,
            Err(err) => {
                diags.error_short(err.to_string(), err.path());
                return None;
            }
        };
        let payload = api::VisualizationUpdatePayload {
            name: state.name.as_str().to_owned(),
            kind: state.kind.as_str().to_owned(),
            description: state.description.as_str().to_owned(),
            options,
        };
        match client.update_visualization(id, &payload).await {
            Ok(visualization) => {
                state.visualization_id = Value::Value(visualization.id as i64);
                Some((state, planned_private_state))
            }
            Err(err) => {
                diags.root_error("Could not update visualization", err.to_string());
                None
            }
        }
    }

    async fn destroy<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        let client = utils::client(&self.client, diags)?;
        let id = utils::parse_id(diags, &state.id)?;
        match client.delete_visualization(id).await {
            Ok(()) => Some(()),
            Err(err) => {
                diags.root_error("Could not delete visualization", err.to_string());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, OnceLock};

    use super::super::state::TableOptionsBlock;
    use super::*;

    fn resource_for(server: &mockito::ServerGuard) -> VisualizationResource {
        let handle: ClientHandle = Arc::new(OnceLock::new());
        handle
            .set(api::Client::new(&server.url(), "key").unwrap())
            .unwrap();
        VisualizationResource::new(handle)
    }

    fn planned() -> VisualizationState<'static> {
        VisualizationState {
            query_id: Value::Value(7),
            name: utils::string("by-day"),
            kind: utils::string(api::TYPE_TABLE),
            table_options: Value::Value(TableOptionsBlock {
                items_per_page: Value::Value(25),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn it_adopts_the_server_id_after_a_create() {
        let mut server = mockito::Server::new_async().await;
        let _create = server
            .mock("POST", "/api/visualizations")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 9, "name": "by-day", "type": "TABLE", "options": {}}"#)
            .create_async()
            .await;
        let resource = resource_for(&server);
        let mut diags = Diagnostics::default();
        let (state, _) = resource
            .create(
                &mut diags,
                planned(),
                VisualizationState::default(),
                Default::default(),
                Default::default(),
            )
            .await
            .expect("create should succeed");
        assert!(diags.errors.is_empty());
        assert_eq!(state.id.as_str(), "9");
        assert_eq!(state.visualization_id, Value::Value(9));
    }

    #[tokio::test]
    async fn it_adopts_no_identity_when_the_create_fails() {
        let mut server = mockito::Server::new_async().await;
        let _create = server
            .mock("POST", "/api/visualizations")
            .with_status(500)
            .with_body("internal error")
            .create_async()
            .await;
        let resource = resource_for(&server);
        let mut diags = Diagnostics::default();
        let created = resource
            .create(
                &mut diags,
                planned(),
                VisualizationState::default(),
                Default::default(),
                Default::default(),
            )
            .await;
        assert!(created.is_none());
        assert!(!diags.errors.is_empty());
    }

    #[tokio::test]
    async fn it_rejects_a_bad_type_before_calling_the_api() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/api/visualizations")
            .expect(0)
            .create_async()
            .await;
        let resource = resource_for(&server);
        let mut diags = Diagnostics::default();
        let mut state = planned();
        state.kind = utils::string("PIE");
        let created = resource
            .create(
                &mut diags,
                state,
                VisualizationState::default(),
                Default::default(),
                Default::default(),
            )
            .await;
        assert!(created.is_none());
        create.assert_async().await;
    }
}
