use async_trait::async_trait;

use tf_provider::{AttributePath, Diagnostics, Resource, Schema, Value, ValueEmpty, ValueString};

use crate::api;
use crate::utils::{self, ClientHandle};

use super::state::{encode_options, encode_schedule, QueryState, RANGE_KIND, TEXT_KINDS};

#[derive(Debug, Default, Clone)]
pub struct QueryResource {
    client: ClientHandle,
}

impl QueryResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }

    fn payload<'a>(
        &self,
        diags: &mut Diagnostics,
        state: &QueryState<'a>,
    ) -> Option<api::QueryCreatePayload> {
        let Value::Value(data_source_id) = state.data_source_id else {
            diags.error_short(
                "`data_source_id` must be known",
                AttributePath::new("data_source_id"),
            );
            return None;
        };
        let options = match encode_options(&state.options) {
            Ok(options) => options,
            Err(err) => {
                diags.error_short(err.to_string(), AttributePath::new("options"));
                return None;
            }
        };
        Some(api::QueryCreatePayload {
            name: state.name.as_str().to_owned(),
            description: state
                .description
                .as_ref_option()
                .map(|description| description.to_string()),
            data_source_id: data_source_id as i32,
            query: state.query.as_str().to_owned(),
            options,
            is_draft: state.is_draft.unwrap_or_default(),
            tags: state.tags.as_ref_option().map(|tags| {
                tags.iter()
                    .map(|tag| tag.as_str().to_owned())
                    .collect()
            }),
            schedule: encode_schedule(&state.schedule),
        })
    }

    /// Configured attributes keep their planned value after an apply;
    /// only server-assigned fields come from the response.
    fn keep_planned<'a>(state: &mut QueryState<'a>, planned: &QueryState<'a>) {
        state.name = planned.name.clone();
        state.description = planned.description.clone();
        state.data_source_id = planned.data_source_id;
        state.query = planned.query.clone();
        state.options = planned.options.clone();
        state.schedule = planned.schedule.clone();
        if planned.is_draft.is_value() {
            state.is_draft = planned.is_draft;
        }
        if planned.tags.is_value() {
            state.tags = planned.tags.clone();
        }
    }
}

#[async_trait]
impl Resource for QueryResource {
    type State<'a> = QueryState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(QueryState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        // Parameter types are checked early; values may still be unknown
        // at this point, so they are only checked at apply time.
        if let Some(options) = config.options.as_ref_option() {
            for parameter in options
                .parameters
                .iter()
                .flatten()
                .filter_map(Value::as_ref_option)
            {
                if let Value::Value(kind) = &parameter.kind {
                    if !TEXT_KINDS.contains(&kind.as_ref()) && kind.as_ref() != RANGE_KIND {
                        diags.error(
                            "Invalid parameter type",
                            format!("`{kind}` is not a supported parameter type"),
                            AttributePath::new("options"),
                        );
                        return None;
                    }
                }
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
        match client.get_query(id).await {
            Ok(query) => {
                let mut state = state.clone();
                state.fill(&query);
                Some((state, private_state))
            }
            Err(err) => {
                diags.root_error("Could not read query", err.to_string());
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
        state.query_id = Value::Unknown;
        state.query_hash = ValueString::Unknown;
        if state.is_draft.is_null() {
            state.is_draft = Value::Unknown;
        }
        state.is_archived = Value::Unknown;
        state.is_safe = Value::Unknown;
        state.version = Value::Unknown;
        state.api_key = ValueString::Unknown;
        if state.tags.is_null() {
            state.tags = Value::Unknown;
        }
        state.latest_query_data_id = Value::Unknown;
        state.is_favorite = Value::Unknown;
        state.can_edit = Value::Unknown;
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
        let mut state = proposed_state.clone();
        state.query_hash = ValueString::Unknown;
        state.version = Value::Unknown;
        state.latest_query_data_id = Value::Unknown;
        Some((state, prior_private_state, vec![]))
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
        let payload = self.payload(diags, &state)?;
        let query = match client.create_query(&payload).await {
            Ok(query) => query,
            Err(err) => {
                diags.root_error("Could not create query", err.to_string());
                return None;
            }
        };
        state.id = utils::id_string(query.id);
        state.fill(&query);
        Self::keep_planned(&mut state, &planned_state);
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
        let payload = self.payload(diags, &state)?;
        match client.update_query(id, &payload).await {
            Ok(query) => {
                state.fill(&query);
                Self::keep_planned(&mut state, &planned_state);
                Some((state, planned_private_state))
            }
            Err(err) => {
                diags.root_error("Could not update query", err.to_string());
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
        match client.archive_query(id).await {
            Ok(()) => Some(()),
            Err(err) => {
                diags.root_error("Could not archive query", err.to_string());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, OnceLock};

    use super::*;

    fn resource_for(server: &mockito::ServerGuard) -> QueryResource {
        let handle: ClientHandle = Arc::new(OnceLock::new());
        handle
            .set(api::Client::new(&server.url(), "key").unwrap())
            .unwrap();
        QueryResource::new(handle)
    }

    fn planned() -> QueryState<'static> {
        QueryState {
            name: utils::string("orders"),
            data_source_id: Value::Value(1),
            query: utils::string("select 1"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn it_adopts_the_server_id_after_a_create() {
        let mut server = mockito::Server::new_async().await;
        let _create = server
            .mock("POST", "/api/queries")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 42, "name": "orders", "data_source_id": 1, "query": "select 1"}"#)
            .create_async()
            .await;
        let resource = resource_for(&server);
        let mut diags = Diagnostics::default();
        let (state, _) = resource
            .create(
                &mut diags,
                planned(),
                QueryState::default(),
                Default::default(),
                Default::default(),
            )
            .await
            .expect("create should succeed");
        assert!(diags.errors.is_empty());
        assert_eq!(state.id.as_str(), "42");
        assert_eq!(state.query_id, Value::Value(42));
        assert_eq!(state.name, planned().name);
    }

    #[tokio::test]
    async fn it_adopts_no_identity_when_the_create_fails() {
        let mut server = mockito::Server::new_async().await;
        let _create = server
            .mock("POST", "/api/queries")
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
                QueryState::default(),
                Default::default(),
                Default::default(),
            )
            .await;
        assert!(created.is_none());
        assert!(!diags.errors.is_empty());
    }

    #[tokio::test]
    async fn it_archives_the_query_on_destroy() {
        let mut server = mockito::Server::new_async().await;
        let archive = server
            .mock("DELETE", "/api/queries/42")
            .with_status(200)
            .create_async()
            .await;
        let resource = resource_for(&server);
        let mut diags = Diagnostics::default();
        let state = QueryState {
            id: utils::id_string(42),
            ..Default::default()
        };
        let destroyed = resource.destroy(&mut diags, state, Default::default()).await;
        assert_eq!(destroyed, Some(()));
        archive.assert_async().await;
    }
}
