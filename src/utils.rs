use std::borrow::Cow;
use std::sync::{Arc, OnceLock};

use tf_provider::{AttributePath, Diagnostics, Value, ValueString};

use crate::api;

/// Shared handle to the API client, populated once by the provider's
/// `configure` and read-only afterwards.
pub type ClientHandle = Arc<OnceLock<api::Client>>;

pub fn client<'h>(handle: &'h ClientHandle, diags: &mut Diagnostics) -> Option<&'h api::Client> {
    match handle.get() {
        Some(client) => Some(client),
        None => {
            diags.root_error_short("The Redash provider has not been configured");
            None
        }
    }
}

/// Parse the opaque resource identity as a numeric Redash id.
pub fn parse_id(diags: &mut Diagnostics, id: &ValueString) -> Option<i32> {
    match id.as_str().parse() {
        Ok(id) => Some(id),
        Err(_) => {
            diags.error(
                "Malformed resource identity",
                format!("`{}` is not a numeric Redash id", id.as_str()),
                AttributePath::new("id"),
            );
            None
        }
    }
}

pub fn id_string(id: i32) -> ValueString<'static> {
    Value::Value(Cow::Owned(id.to_string()))
}

pub fn string<'a>(s: &str) -> ValueString<'a> {
    Value::Value(Cow::Owned(s.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_round_trips_numeric_identities() {
        let mut diags = Diagnostics::default();
        assert_eq!(parse_id(&mut diags, &id_string(42)), Some(42));
        assert!(diags.errors.is_empty());
    }

    #[test]
    fn it_rejects_malformed_identities() {
        let mut diags = Diagnostics::default();
        assert_eq!(parse_id(&mut diags, &string("not-a-number")), None);
        assert_eq!(diags.errors.len(), 1);

        let mut diags = Diagnostics::default();
        assert_eq!(parse_id(&mut diags, &Value::Null), None);
        assert_eq!(diags.errors.len(), 1);
    }
}
