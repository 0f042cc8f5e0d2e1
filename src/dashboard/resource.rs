use async_trait::async_trait;

use tf_provider::{AttributePath, Diagnostics, Resource, Schema, Value, ValueEmpty, ValueString};

use crate::api;
use crate::utils::{self, ClientHandle};

use super::state::DashboardState;

/// Manages a Redash dashboard. Dashboards are addressed by slug on the
/// wire but identified by their numeric id in state.
#[derive(Debug, Default, Clone)]
pub struct DashboardResource {
    client: ClientHandle,
}

impl DashboardResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for DashboardResource {
    type State<'a> = DashboardState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(DashboardState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        if let Value::Value(name) = &config.name {
            if name.is_empty() {
                diags.error_short("Dashboard name must not be empty", AttributePath::new("name"));
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
        let Value::Value(slug) = &state.slug else {
            diags.error_short(
                "Dashboard slug is missing from the state",
                AttributePath::new("slug"),
            );
            return None;
        };
        match client.get_dashboard(slug).await {
            Ok(dashboard) => {
                let mut state = state.clone();
                state.fill(&dashboard);
                Some((state, private_state))
            }
            Err(err) => {
                diags.root_error("Could not read dashboard", err.to_string());
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
        state.dashboard_id = Value::Unknown;
        state.slug = ValueString::Unknown;
        state.is_favorite = Value::Unknown;
        state.is_archived = Value::Unknown;
        state.is_draft = Value::Unknown;
        state.dashboard_filters_enabled = Value::Unknown;
        state.version = Value::Unknown;
        if state.tags.is_null() {
            state.tags = Value::Unknown;
        }
        state.public_url = ValueString::Unknown;
        state.can_edit = Value::Unknown;
        state.api_key = ValueString::Unknown;
        Some((state, Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        _diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>, Vec<AttributePath>)> {
        let mut state = proposed_state.clone();
        // Renaming regenerates the slug (and the public URL built from it).
        if state.name != prior_state.name {
            state.slug = ValueString::Unknown;
            state.public_url = ValueString::Unknown;
        }
        state.version = Value::Unknown;
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
        let payload = api::DashboardCreatePayload {
            name: state.name.as_str().to_owned(),
        };
        let dashboard = match client.create_dashboard(&payload).await {
            Ok(dashboard) => dashboard,
            Err(err) => {
                diags.root_error("Could not create dashboard", err.to_string());
                return None;
            }
        };
        state.id = utils::id_string(dashboard.id);
        state.fill(&dashboard);
        // Configured attributes keep their planned value.
        state.name = planned_state.name.clone();
        if planned_state.tags.is_value() {
            state.tags = planned_state.tags.clone();
        }
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
        let payload = api::DashboardUpdatePayload {
            name: state.name.as_str().to_owned(),
            tags: state.tags.as_ref_option().map(|tags| {
                tags.iter()
                    .map(|tag| tag.as_str().to_owned())
                    .collect()
            }),
        };
        match client.update_dashboard(id, &payload).await {
            Ok(dashboard) => {
                state.fill(&dashboard);
                state.name = planned_state.name.clone();
                if planned_state.tags.is_value() {
                    state.tags = planned_state.tags.clone();
                }
                Some((state, planned_private_state))
            }
            Err(err) => {
                diags.root_error("Could not update dashboard", err.to_string());
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
        let Value::Value(slug) = &state.slug else {
            diags.error_short(
                "Dashboard slug is missing from the state",
                AttributePath::new("slug"),
            );
            return None;
        };
        match client.archive_dashboard(slug).await {
            Ok(()) => Some(()),
            Err(err) => {
                diags.root_error("Could not archive dashboard", err.to_string());
                None
            }
        }
    }
}
