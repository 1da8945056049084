//! Integration tests for form composition:
//! - registration protocol (pending field validated by the next call)
//! - wrapper nesting and restoration
//! - rendering, lookups and rule collection

use std::sync::Arc;

use form::prelude::*;
use form::{
    BlockField, FieldRegistry, FormContext, ModalField, ModelRef, RuleContext, StaticModel,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn post() -> ModelRef {
    StaticModel::new("App::Models::Post").into_ref()
}

fn new_form() -> BaseForm {
    BaseForm::new(FormContext::standard(), post(), "crud/posts")
}

#[test]
fn render_returns_one_entry_per_top_level_call() {
    let mut form = new_form();
    form.input("title").unwrap().title("Title");
    form.select("state")
        .unwrap()
        .options([("draft", "Draft"), ("live", "Live")]);
    form.component("info-card").unwrap().prop("text", "Hello");
    form.boolean("featured").unwrap();

    let rendered = form.render().expect("complete form renders");
    assert_eq!(rendered.fields.len(), 4);

    let ids: Vec<&Value> = rendered.fields.iter().map(|f| &f["id"]).collect();
    assert_eq!(ids[0], &json!("title"));
    assert_eq!(ids[1], &json!("state"));
    assert_eq!(rendered.fields[2]["component"], json!("info-card"));
    assert_eq!(rendered.fields[2]["props"]["text"], json!("Hello"));
    assert_eq!(rendered.fields[3]["default"], json!(false));
}

#[test]
fn missing_required_attribute_fails_the_next_registration() {
    let mut form = new_form();
    form.select("state").unwrap();

    match form.input("title") {
        Err(FormError::IncompleteField {
            kind,
            field,
            attribute,
        }) => {
            assert_eq!(kind, "select");
            assert_eq!(field, "state");
            assert_eq!(attribute, "options");
        }
        other => panic!("expected IncompleteField, got {other:?}"),
    }
}

#[test]
fn missing_required_attribute_fails_render() {
    let mut form = new_form();
    form.input("title").unwrap();
    form.checkboxes("tags").unwrap();

    let err = form.render().unwrap_err();
    assert!(matches!(
        err,
        FormError::IncompleteField { ref attribute, .. } if attribute == "options"
    ));
    assert!(!form.is_sealed());
}

#[test]
fn nested_wrappers_restore_the_previous_state() {
    let mut form = new_form();
    assert_eq!(form.wrapper_depth(), 0);

    form.group(|form| {
        assert_eq!(form.wrapper_depth(), 1);
        form.col(6, |form| {
            // col opens a column and a row layer
            assert_eq!(form.wrapper_depth(), 3);
            form.input("first_name")?;
            Ok(())
        })?;
        assert_eq!(form.wrapper_depth(), 1);
        form.input("last_name")?;
        Ok(())
    })
    .unwrap();

    assert_eq!(form.wrapper_depth(), 0);
    form.input("email").unwrap();

    let rendered = form.render().unwrap();
    assert_eq!(rendered.fields.len(), 2);
    assert_eq!(rendered.fields[1]["id"], json!("email"));

    let group = &rendered.fields[0];
    let children = group["children"].as_array().unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0]["wrapper_component"]["props"]["cols"], json!(6));
    assert_eq!(children[1]["props"]["field"]["id"], json!("last_name"));
}

#[test]
fn discarded_wrapper_leaves_siblings_unaffected() {
    let mut with_wrapper = new_form();
    with_wrapper.input("title").unwrap();
    let _ = with_wrapper.group(|_| Err(FormError::InvalidArgument("discard".into())));
    with_wrapper.input("slug").unwrap();

    assert_eq!(with_wrapper.wrapper_depth(), 0);
    assert!(!with_wrapper.in_wrapper());
    let slug = with_wrapper.find_field("slug").expect("slug registered");
    assert_eq!(slug.id(), "slug");
    let rendered = with_wrapper.render().unwrap();
    assert_eq!(rendered.fields.last().unwrap()["id"], json!("slug"));
}

#[test]
fn wrapper_returns_the_wrapped_component() {
    let mut form = new_form();
    form.wrapper("card", |form| form.input("title").map(|_| ()))
        .unwrap()
        .prop("class", "mb-4");

    let rendered = form.render().unwrap();
    assert_eq!(
        rendered.fields[0]["wrapper_component"],
        json!({ "component": "card", "props": { "class": "mb-4" }, "children": [] })
    );
}

#[test]
fn unknown_method_lists_relation_and_field_kinds() {
    let mut form = new_form();
    match form.call("colorpicker", &[json!("color")]) {
        Err(FormError::MethodNotFound { method, supported }) => {
            assert_eq!(method, "colorpicker");
            assert_eq!(supported[0], "relation");
            assert!(supported.iter().any(|name| name == "input"));
            assert!(supported.iter().any(|name| name == "manyRelation"));
        }
        other => panic!("expected MethodNotFound, got {other:?}"),
    }
}

#[test]
fn call_dispatches_kinds_and_macros() {
    let mut fields = FieldRegistry::standard();
    fields.register_macro("seo", |form, _args| {
        form.input("meta_title")?.title("Meta title");
        form.textarea("meta_description")?;
        Ok(())
    });
    let context = FormContext::builder().with_fields(fields).build();
    let mut form = BaseForm::new(context, post(), "crud/posts");

    let title = form.call("input", &[json!("title")]).unwrap();
    assert_eq!(title.map(|field| field.id().to_string()), Some("title".into()));
    assert!(form.call("seo", &[]).unwrap().is_none());

    assert!(form.has_field("meta_title"));
    assert!(form.has_field("meta_description"));
    assert_eq!(form.render().unwrap().fields.len(), 3);
}

#[test]
fn translatable_rules_expand_per_locale() {
    let context = FormContext::builder().with_locales(["en", "de"]).build();
    let mut form = BaseForm::new(context, post(), "crud/posts");
    form.textarea("body")
        .unwrap()
        .translatable(true)
        .rules(["required", "min:10"]);
    form.input("slug").unwrap().rules(["required"]);

    let rules = form.get_rules(RuleContext::Update);
    let keys: Vec<&str> = rules.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["en.body", "de.body", "slug"]);
    assert_eq!(rules["en.body"], rules["de.body"]);
    assert_eq!(rules["en.body"], vec!["required", "min:10"]);
    assert!(!rules.contains_key("body"));
}

#[test]
fn creation_and_update_rules_follow_the_request() {
    let mut form = new_form();
    form.input("password")
        .unwrap()
        .stored_as("password_hash")
        .creation_rules(["required"])
        .update_rules(["nullable"]);

    assert_eq!(
        form.get_rules(RuleContext::Create)["password_hash"],
        vec!["required"]
    );
    assert_eq!(
        form.get_rules(RuleContext::Update)["password_hash"],
        vec!["nullable"]
    );
}

#[test]
fn block_repeatables_are_nested_forms() {
    let mut form = new_form();
    let block: &mut BlockField = form.block("content").unwrap();
    block
        .title("Content")
        .repeatable("text", |form| {
            form.wysiwyg("text")?;
            Ok(())
        })
        .unwrap()
        .repeatable("image", |form| {
            form.input("caption")?;
            Ok(())
        })
        .unwrap();

    assert!(form.has_form("content", Some("text")));
    assert!(!form.has_form("content", None));
    assert!(!form.has_form("content", Some("video")));

    let text = form.get_form("content", Some("text")).expect("repeatable");
    assert!(text.has_field("text"));
    assert_eq!(text.route_prefix(), "crud/posts/block/content/text");

    let rendered = form.render().unwrap();
    assert_eq!(
        rendered.fields[0]["repeatables"]["image"]["fields"][0]["id"],
        json!("caption")
    );
}

#[test]
fn block_without_repeatables_is_incomplete() {
    let mut form = new_form();
    form.block("content").unwrap();
    assert!(matches!(
        form.render(),
        Err(FormError::IncompleteField { ref attribute, .. }) if attribute == "repeatables"
    ));
}

#[test]
fn incomplete_repeatable_fails_when_its_body_returns() {
    let mut form = new_form();
    let block = form.block("content").unwrap();
    let err = block
        .repeatable("quote", |form| form.select("style").map(|_| ()))
        .unwrap_err();
    assert!(matches!(err, FormError::IncompleteField { .. }));
}

#[test]
fn modal_owns_a_form_on_the_parent_model() {
    let mut form = new_form();
    let modal: &mut ModalField = form.modal("change_password").unwrap();
    modal
        .title("Change password")
        .form(|form| {
            form.input("password")?.attribute("type", "password");
            Ok(())
        })
        .unwrap();

    assert!(form.has_form("change_password", None));
    let nested = form.get_form("change_password", None).unwrap();
    assert_eq!(nested.model().type_name(), "App::Models::Post");

    let rendered = form.render().unwrap();
    assert_eq!(
        rendered.fields[0]["form"]["fields"][0]["type"],
        json!("password")
    );
}

#[test]
fn find_field_skips_components() {
    let mut form = new_form();
    form.component("title").unwrap();
    assert!(!form.has_field("title"));
    form.input("title").unwrap();
    assert!(form.has_field("title"));
    assert_eq!(form.find_field("title").unwrap().kind(), "input");
}

#[test]
fn context_is_shared_between_forms() {
    let context = FormContext::standard();
    let mut first = BaseForm::new(Arc::clone(&context), post(), "crud/posts");
    let mut second = BaseForm::new(Arc::clone(&context), post(), "crud/pages");
    first.input("title").unwrap();
    second.select("state").unwrap();

    // the pending field of one form never leaks into another
    assert!(first.render().is_ok());
    assert!(second.render().is_err());
}
