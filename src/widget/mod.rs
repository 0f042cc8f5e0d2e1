mod resource;
mod state;

pub use resource::WidgetResource;
