mod data_source;
mod options;
mod resource;
mod state;

pub use data_source::VisualizationDataSource;
pub use resource::VisualizationResource;
