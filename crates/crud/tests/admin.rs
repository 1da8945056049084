//! Integration tests for the admin layer:
//! - identities derived from config paths
//! - config store lookups feeding relation fields
//! - route mapping (and its all-or-nothing failure mode)
//! - settings loaded from a RON file

use crud::{
    map_routes, Admin, ConfigIdentity, ConfigStore, CrudConfig, CrudError, CrudSettings,
    FormConfig, Method, Operation, Permissions, RouteGroup,
};
use form::prelude::*;
use form::{FormError, ModelRef, RelationDescriptor, RelationKind, RuleContext, StaticModel};
use pretty_assertions::assert_eq;

struct Home;

impl FormConfig for Home {
    fn logical_path(&self) -> &str {
        "App::Config::Form::Pages::HomeConfig"
    }

    fn show(&self, form: &mut BaseForm) -> form::Result<()> {
        form.input("headline")?.title("Headline");
        form.block("sections")?
            .title("Sections")
            .repeatable("text", |rep| {
                rep.textarea("body")?;
                Ok(())
            })?;
        form.one_relation("featured")?.use_config("crud.post")?;
        Ok(())
    }
}

struct Posts;

impl CrudConfig for Posts {
    fn logical_path(&self) -> &str {
        "App::Config::Crud::PostConfig"
    }

    fn model(&self) -> ModelRef {
        StaticModel::new("App::Models::Post")
            .relation(
                "tags",
                RelationDescriptor::new(RelationKind::BelongsToMany, "App::Models::Tag")
                    .key("pivot_table", "post_tag"),
            )
            .relation(
                "author",
                RelationDescriptor::new(RelationKind::BelongsTo, "App::Models::User")
                    .key("foreign_key", "user_id"),
            )
            .into_ref()
    }

    fn index(&self, table: &mut Table) {
        table.col("Title").value("{title}").sort_by("title");
    }

    fn show(&self, form: &mut BaseForm) -> form::Result<()> {
        form.input("title")?.rules(["required"]);
        form.wysiwyg("body")?.creation_rules(["required"]);
        form.relation("tags")?.preview(|table| {
            table.col("Name").value("{name}");
        })?;
        form.relation("author")?;
        Ok(())
    }
}

struct Users;

impl CrudConfig for Users {
    fn logical_path(&self) -> &str {
        "App::Config::Crud::UserConfig"
    }

    fn model(&self) -> ModelRef {
        StaticModel::new("App::Models::User").into_ref()
    }

    fn index(&self, table: &mut Table) {
        table.col("Name").value("{name}");
    }

    fn show(&self, form: &mut BaseForm) -> form::Result<()> {
        form.input("name")?;
        Ok(())
    }
}

struct Broken;

impl FormConfig for Broken {
    fn logical_path(&self) -> &str {
        "App::Config::Form::Pages::BrokenConfig"
    }

    fn show(&self, form: &mut BaseForm) -> form::Result<()> {
        form.select("state")?;
        Ok(())
    }
}

fn store() -> ConfigStore {
    ConfigStore::builder()
        .with_form(Home)
        .with_crud(Posts)
        .with_crud(Users)
        .build()
        .expect("valid configs")
}

fn route<'a>(group: &'a RouteGroup, name: &str) -> (Method, &'a str) {
    let route = group
        .find(name)
        .unwrap_or_else(|| panic!("route {name} missing"));
    (route.method, route.uri.as_str())
}

#[test]
fn identity_of_a_nested_form_config() {
    let identity = ConfigIdentity::parse(r"Ignite\Crud\Config\Form\BlogPosts\CommentConfig").unwrap();
    assert_eq!(identity.collection(), "blogposts");
    assert_eq!(identity.form_name(), "comment");
    assert_eq!(identity.route_prefix(), "form/blogposts/comment");
    assert_eq!(identity.title(), "Comment");
    assert_eq!(identity.config_key(), "form.blog_posts.comment");
}

#[test]
fn store_keys_follow_the_logical_paths() {
    let store = store();
    let keys: Vec<&str> = store.keys().collect();
    assert_eq!(keys, ["form.pages.home", "crud.post", "crud.user"]);

    let posts = store.get("crud.post").unwrap();
    assert!(posts.is_crud());
    assert_eq!(posts.route_prefix(), "crud/posts");
    assert_eq!(posts.names().get("plural").map(String::as_str), Some("Posts"));
    assert_eq!(posts.index().map(|t| t.columns.len()), Some(1));
}

#[test]
fn crud_relation_inherits_the_sibling_config() -> anyhow::Result<()> {
    let admin = Admin::new(CrudSettings::default(), store())?;
    let form = admin.form("crud.post")?;

    let author = form
        .find_field("author")
        .and_then(|field| field.as_any().downcast_ref::<form::RelationField>())
        .expect("author relation");
    assert_eq!(author.related_config(), Some("crud.user"));
    assert_eq!(
        author.field().attribute("related_route_prefix"),
        Some(&serde_json::json!("crud/users"))
    );

    let tags = form.find_field("tags").unwrap();
    assert_eq!(tags.kind(), "belongsToMany");
    Ok(())
}

#[test]
fn form_relation_takes_model_and_preview_from_the_crud_config() -> anyhow::Result<()> {
    let admin = Admin::new(CrudSettings::default(), store())?;
    let form = admin.form("form.pages.home")?;

    let rendered = form.view();
    let featured = &rendered.fields[2];
    assert_eq!(featured["model"], "App::Models::Post");
    assert_eq!(featured["preview"]["columns"][0]["value"], "{title}");
    assert_eq!(featured["related_route_prefix"], "crud/posts");
    Ok(())
}

#[test]
fn rules_expand_per_configured_locale() -> anyhow::Result<()> {
    let settings = CrudSettings {
        locales: vec!["en".into(), "de".into()],
        ..CrudSettings::default()
    };
    let admin = Admin::new(settings, store())?;
    let form = admin.form("crud.post")?;

    let create = form.get_rules(RuleContext::Create);
    assert_eq!(create.get("title"), Some(&vec!["required".to_string()]));
    assert_eq!(create.get("en.body"), Some(&vec!["required".to_string()]));
    assert_eq!(create.get("de.body"), Some(&vec!["required".to_string()]));

    let update = form.get_rules(RuleContext::Update);
    assert_eq!(update.get("en.body"), Some(&Vec::new()));
    Ok(())
}

#[test]
fn routes_cover_forms_cruds_relations_and_blocks() -> anyhow::Result<()> {
    let admin = Admin::new(CrudSettings::default(), store())?;
    let mut groups: Vec<RouteGroup> = Vec::new();
    let count = admin.routes(&mut groups)?;

    assert_eq!(groups.len(), 3);
    assert_eq!(count, groups.iter().map(|g| g.routes.len()).sum::<usize>());

    let home = &groups[0];
    assert_eq!(home.prefix, "admin/form/pages/home");
    assert_eq!(route(home, "form.pages.home.show"), (Method::Get, "/"));
    assert_eq!(route(home, "form.pages.home.update"), (Method::Put, "/"));
    assert_eq!(
        route(home, "form.pages.home.sections.update"),
        (Method::Put, "/block/sections/{block_id}")
    );
    assert_eq!(
        route(home, "form.pages.home.featured.destroy"),
        (Method::Delete, "/relation/featured/{related_id}")
    );
    assert_eq!(home.routes.len(), 9);

    let posts = &groups[1];
    assert_eq!(posts.prefix, "admin/crud/posts");
    assert_eq!(route(posts, "crud.post.destroy"), (Method::Delete, "/{id}"));
    assert_eq!(
        route(posts, "crud.post.tags.index"),
        (Method::Get, "/{id}/relation/tags")
    );
    assert_eq!(posts.routes.len(), 12);

    assert_eq!(groups[2].routes.len(), 6);
    Ok(())
}

#[test]
fn one_failing_config_maps_no_routes() {
    let store = ConfigStore::builder()
        .with_crud(Users)
        .with_form(Broken)
        .build()
        .unwrap();
    let context = CrudSettings::default().form_context(std::sync::Arc::new(store.clone()));

    let mut groups: Vec<RouteGroup> = Vec::new();
    match map_routes(&store, &context, &mut groups) {
        Err(CrudError::Composition { key, source }) => {
            assert_eq!(key, "form.pages.broken");
            assert!(matches!(source, FormError::IncompleteField { .. }));
        }
        other => panic!("expected a composition error, got {other:?}"),
    }
    assert!(groups.is_empty());
}

#[test]
fn unknown_config_key_is_reported() {
    let admin = Admin::new(CrudSettings::default(), store()).unwrap();
    assert!(matches!(
        admin.form("crud.comment"),
        Err(CrudError::UnknownConfig(key)) if key == "crud.comment"
    ));
}

#[test]
fn permissions_go_through_the_authorizer() -> anyhow::Result<()> {
    let admin = Admin::new(CrudSettings::default(), store())?;
    let editor = |role: &str, operation: Operation, subject: &str| match operation {
        Operation::Read => true,
        _ => role == "editor" && subject == "pages",
    };

    assert_eq!(
        admin.permissions("form.pages.home", &editor, "editor")?,
        Permissions { read: true, update: true }
    );
    assert_eq!(
        admin.permissions("crud.post", &editor, "editor")?,
        Permissions { read: true, update: false }
    );
    Ok(())
}

#[test]
fn settings_file_drives_the_form_context() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("crud.ron");
    std::fs::write(&path, r#"(url_prefix: "cms", locales: ["en", "de"])"#)?;

    let admin = Admin::load(&path, store())?;
    assert_eq!(admin.context().locales(), ["en", "de"]);

    let mut groups: Vec<RouteGroup> = Vec::new();
    admin.routes(&mut groups)?;
    assert_eq!(groups[0].prefix, "cms/form/pages/home");
    Ok(())
}

#[test]
fn settings_round_trip_through_save() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested").join("crud.ron");
    let settings = CrudSettings {
        default_locale: "de".into(),
        locales: vec!["de".into()],
        ..CrudSettings::default()
    };
    settings.save(&path)?;
    assert_eq!(CrudSettings::load(&path)?, settings);

    let missing = CrudSettings::load(dir.path().join("absent.ron"))?;
    assert_eq!(missing, CrudSettings::default());
    Ok(())
}
