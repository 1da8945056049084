//! Route groups derived from the registered configs.
//!
//! Mapping composes every config's form first; only when all of them
//! compose does anything reach the [`RouteRegistrar`].

use std::sync::Arc;

use form::{BaseForm, BlockField, FormContext, FormField, RelationField};
use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};
use tracing::{debug, info};

use crate::error::Result;
use crate::store::{ConfigEntry, ConfigStore};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Display, AsRefStr, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Route {
    pub method: Method,
    /// Relative to the group prefix, always starting with `/`.
    pub uri: String,
    pub name: String,
}

/// Every route of one config, mounted below `prefix`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RouteGroup {
    pub prefix: String,
    pub config_key: String,
    pub routes: Vec<Route>,
}

impl RouteGroup {
    pub fn find(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.name == name)
    }
}

/// Receives the mapped groups, e.g. an http router.
pub trait RouteRegistrar {
    fn register_group(&mut self, group: RouteGroup);
}

impl RouteRegistrar for Vec<RouteGroup> {
    fn register_group(&mut self, group: RouteGroup) {
        self.push(group);
    }
}

/// Compose every config in `store` and register one group per config.
/// Returns the number of routes registered.
pub fn map_routes(
    store: &ConfigStore,
    context: &Arc<FormContext>,
    registrar: &mut dyn RouteRegistrar,
) -> Result<usize> {
    let mut groups = Vec::with_capacity(store.len());
    for entry in store.entries() {
        let form = entry.compose(context)?;
        groups.push(group_for(entry, &form, context.url_prefix()));
    }

    let mut count = 0;
    for group in groups {
        info!(
            "mapped {} routes for {} at {}",
            group.routes.len(),
            group.config_key,
            group.prefix
        );
        count += group.routes.len();
        registrar.register_group(group);
    }
    Ok(count)
}

fn group_for(entry: &ConfigEntry, form: &BaseForm, url_prefix: &str) -> RouteGroup {
    let mut routes = Routes {
        key: entry.key(),
        routes: Vec::new(),
    };

    let record = if entry.is_crud() {
        routes.add(Method::Get, "/", "index");
        routes.add(Method::Get, "/create", "create");
        routes.add(Method::Post, "/", "store");
        routes.add(Method::Get, "/{id}", "show");
        routes.add(Method::Put, "/{id}", "update");
        routes.add(Method::Delete, "/{id}", "destroy");
        "/{id}"
    } else {
        routes.add(Method::Get, "/", "show");
        routes.add(Method::Put, "/", "update");
        ""
    };
    routes.form(form, record, "");

    let prefix = match url_prefix.trim_matches('/') {
        "" => entry.route_prefix().to_string(),
        url => format!("{url}/{}", entry.route_prefix()),
    };
    RouteGroup {
        prefix,
        config_key: entry.key().to_string(),
        routes: routes.routes,
    }
}

struct Routes<'a> {
    key: &'a str,
    routes: Vec<Route>,
}

impl Routes<'_> {
    fn add(&mut self, method: Method, uri: impl Into<String>, action: &str) {
        self.routes.push(Route {
            method,
            uri: uri.into(),
            name: format!("{}.{}", self.key, action),
        });
    }

    /// Relation and block routes of every field in `form`, nested forms
    /// included. `scope` namespaces route names of nested forms.
    fn form(&mut self, form: &BaseForm, base: &str, scope: &str) {
        for field in form.registered_fields() {
            if field.is_component() {
                continue;
            }
            let name = format!("{scope}{}", field.id());
            let any = field.as_any();

            if let Some(relation) = any.downcast_ref::<RelationField>() {
                let uri = format!("{base}/relation/{}", relation.id());
                debug!("relation routes for {} at {}", name, uri);
                self.add(Method::Get, uri.as_str(), &format!("{name}.index"));
                self.add(Method::Post, uri.as_str(), &format!("{name}.store"));
                self.add(Method::Delete, format!("{uri}/{{related_id}}"), &format!("{name}.destroy"));
            } else if let Some(block) = any.downcast_ref::<BlockField>() {
                let uri = format!("{base}/block/{}", block.id());
                self.add(Method::Get, uri.as_str(), &format!("{name}.index"));
                self.add(Method::Post, uri.as_str(), &format!("{name}.store"));
                self.add(Method::Put, format!("{uri}/{{block_id}}"), &format!("{name}.update"));
                self.add(Method::Delete, format!("{uri}/{{block_id}}"), &format!("{name}.destroy"));
                for (repeatable, nested) in block.repeatables() {
                    self.form(
                        nested,
                        &format!("{uri}/{{block_id}}"),
                        &format!("{name}.{repeatable}."),
                    );
                }
            } else if let Some(nested) = field.nested_form() {
                self.form(nested, base, &format!("{name}."));
            }
        }
    }
}
