use anyhow::Result;

use tf_provider::serve;

use crate::provider::RedashProvider;

mod api;
mod dashboard;
mod provider;
mod query;
mod utils;
mod visualization;
mod widget;

#[tokio::main]
async fn main() -> Result<()> {
    serve("redash", RedashProvider::default()).await
}
