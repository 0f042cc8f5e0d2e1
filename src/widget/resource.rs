use async_trait::async_trait;

use tf_provider::{AttributePath, Diagnostics, Resource, Schema, Value, ValueEmpty, ValueString};

use crate::api;
use crate::utils::{self, ClientHandle};

use super::state::{encode_options, WidgetState};

#[derive(Debug, Default, Clone)]
pub struct WidgetResource {
    client: ClientHandle,
}

impl WidgetResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for WidgetResource {
    type State<'a> = WidgetState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(WidgetState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        if config.options.is_null() {
            diags.error_short(
                "`options` block is required and missing",
                AttributePath::new("options"),
            );
            return None;
        }
        if let Some(options) = config.options.as_ref_option() {
            if options.position.is_null() {
                diags.error_short(
                    "`options.position` block is required and missing",
                    AttributePath::new("options").index(0).attribute("position"),
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
        let Value::Value(slug) = &state.dashboard_slug else {
            diags.error_short(
                "Dashboard slug is missing from the state",
                AttributePath::new("dashboard_slug"),
            );
            return None;
        };
        match client.get_widget(slug, id).await {
            Ok(widget) => {
                let mut state = state.clone();
                state.fill(&widget);
                Some((state, private_state))
            }
            Err(err) => {
                diags.root_error("Could not read widget", err.to_string());
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
        state.widget_id = Value::Unknown;
        state.dashboard_id = Value::Unknown;
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
        let state = proposed_state.clone();
        // Widgets cannot move between dashboards: changing the slug
        // replaces the widget.
        let mut triggers = vec![];
        if state.dashboard_slug != prior_state.dashboard_slug {
            triggers.push(AttributePath::new("dashboard_slug"));
        }
        Some((state, prior_private_state, triggers))
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
        let options = match encode_options(&state.options) {
            Ok(options) => options,
            Err(err) => {
                diags.error_short(err.to_string(), AttributePath::new("options"));
                return None;
            }
        };
        let Value::Value(slug) = &state.dashboard_slug else {
            diags.error_short(
                "Dashboard slug must be known",
                AttributePath::new("dashboard_slug"),
            );
            return None;
        };
        // The create payload wants the dashboard id, which only the
        // slug-addressed endpoint can provide.
        let dashboard = match client.get_dashboard(slug).await {
            Ok(dashboard) => dashboard,
            Err(err) => {
                diags.root_error("Could not resolve dashboard", err.to_string());
                return None;
            }
        };
        let payload = api::WidgetCreatePayload {
            dashboard_id: dashboard.id,
            visualization_id: state.visualization_id.as_ref_option().map(|id| *id as i32),
            options,
            text: state.text.as_str().to_owned(),
            width: state.width.unwrap_or_default(),
        };
        let widget = match client.create_widget(&payload).await {
            Ok(widget) => widget,
            Err(err) => {
                diags.root_error("Could not create widget", err.to_string());
                return None;
            }
        };
        state.id = utils::id_string(widget.id);
        state.widget_id = Value::Value(widget.id as i64);
        state.dashboard_id = Value::Value(dashboard.id as i64);
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
        let state = planned_state.clone();
        let id = utils::parse_id(diags, &state.id)?;
        let options = match encode_options(&state.options) {
            Ok(options) => options,
            Err(err) => {
                diags.error_short(err.to_string(), AttributePath::new("options"));
                return None;
            }
        };
        let payload = api::WidgetUpdatePayload {
            visualization_id: state.visualization_id.as_ref_option().map(|id| *id as i32),
            options,
            text: state.text.as_str().to_owned(),
            width: state.width.unwrap_or_default(),
        };
        match client.update_widget(id, &payload).await {
            Ok(_) => Some((state, planned_private_state)),
            Err(err) => {
                diags.root_error("Could not update widget", err.to_string());
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
        match client.delete_widget(id).await {
            Ok(()) => Some(()),
            Err(err) => {
                diags.root_error("Could not delete widget", err.to_string());
                None
            }
        }
    }
}
