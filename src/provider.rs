use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tf_provider::{
    map, Attribute, AttributeConstraint, AttributePath, AttributeType, Block, Description,
    Diagnostics, Provider, Schema, Value, ValueEmpty, ValueString,
};

use crate::api;
use crate::dashboard::DashboardResource;
use crate::query::QueryResource;
use crate::utils::ClientHandle;
use crate::visualization::{VisualizationDataSource, VisualizationResource};
use crate::widget::WidgetResource;

#[derive(Debug, Default, Clone)]
pub struct RedashProvider {
    client: ClientHandle,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RedashProviderConfig<'a> {
    #[serde(borrow = "'a")]
    pub endpoint: ValueString<'a>,
    pub api_key: ValueString<'a>,
}

#[async_trait]
impl Provider for RedashProvider {
    type Config<'a> = RedashProviderConfig<'a>;
    type MetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "endpoint" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Base URL of the Redash deployment"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "api_key" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain(
                            "User API key used to authenticate against the Redash API",
                        ),
                        constraint: AttributeConstraint::Required,
                        sensitive: true,
                        ..Default::default()
                    },
                },
                description: Description::plain(
                    "Manage Redash dashboards, queries, visualizations, and widgets",
                ),
                ..Default::default()
            },
        })
    }

    async fn validate<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::Config<'a>,
    ) -> Option<()> {
        if let Value::Value(endpoint) = &config.endpoint {
            if reqwest::Url::parse(endpoint).is_err() {
                diags.error(
                    "Invalid Redash endpoint",
                    format!("`{endpoint}` is not a valid URL"),
                    AttributePath::new("endpoint"),
                );
                return None;
            }
        }
        Some(())
    }

    async fn configure<'a>(
        &self,
        diags: &mut Diagnostics,
        _terraform_version: String,
        config: Self::Config<'a>,
    ) -> Option<()> {
        let Value::Value(endpoint) = &config.endpoint else {
            diags.error_short(
                "Redash endpoint is not known during configure",
                AttributePath::new("endpoint"),
            );
            return None;
        };
        let Value::Value(api_key) = &config.api_key else {
            diags.error_short(
                "Redash API key is not known during configure",
                AttributePath::new("api_key"),
            );
            return None;
        };
        match api::Client::new(endpoint, api_key) {
            Ok(client) => {
                if self.client.set(client).is_err() {
                    debug!("provider configured more than once, keeping the first client");
                }
                Some(())
            }
            Err(err) => {
                diags.root_error("Could not configure the Redash client", err.to_string());
                None
            }
        }
    }

    fn get_resources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<std::collections::HashMap<String, Box<dyn tf_provider::resource::DynamicResource>>>
    {
        Some(map! {
            "dashboard"     => DashboardResource::new(self.client.clone()),
            "query"         => QueryResource::new(self.client.clone()),
            "visualization" => VisualizationResource::new(self.client.clone()),
            "widget"        => WidgetResource::new(self.client.clone()),
        })
    }

    fn get_data_sources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<
        std::collections::HashMap<String, Box<dyn tf_provider::data_source::DynamicDataSource>>,
    > {
        Some(map! {
            "visualization" => VisualizationDataSource::new(self.client.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(endpoint: &'static str) -> RedashProviderConfig<'static> {
        RedashProviderConfig {
            endpoint: Value::Value(endpoint.into()),
            api_key: Value::Value("key".into()),
        }
    }

    #[tokio::test]
    async fn it_keeps_the_first_client_across_reconfigures() {
        let provider = RedashProvider::default();
        let mut diags = Diagnostics::default();
        provider
            .configure(&mut diags, "1.9.0".into(), config("https://one.example.com"))
            .await
            .unwrap();
        provider
            .configure(&mut diags, "1.9.0".into(), config("https://two.example.com"))
            .await
            .unwrap();
        assert!(diags.errors.is_empty());
        assert_eq!(
            provider.client.get().unwrap().endpoint(),
            "https://one.example.com/"
        );
    }
}
