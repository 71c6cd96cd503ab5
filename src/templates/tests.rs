//! Tests for the template engine

use super::*;
use crate::models::{Author, Commentary};
use chrono::TimeZone;
use std::fs;
use tempfile::TempDir;

fn sample_snippet() -> Snippet {
    let created_at = Utc.with_ymd_and_hms(2024, 1, 2, 15, 4, 5).unwrap();
    Snippet {
        id: 7,
        title: "An old silent pond".to_string(),
        content: "A frog jumps into the pond,\nsplash! Silence again.".to_string(),
        tag: "haiku".to_string(),
        author: Author {
            id: 3,
            name: "Basho".to_string(),
        },
        created_at,
        favourited: 2,
        commentaries: vec![Commentary {
            author: Author {
                id: 4,
                name: "Issa".to_string(),
            },
            content: "<b>lovely</b>".to_string(),
            created_at,
        }],
    }
}

#[test]
fn test_embedded_templates_load() {
    let engine = TemplateEngine::new(None).unwrap();

    for page in [
        "home.html",
        "view.html",
        "create.html",
        "signup.html",
        "login.html",
        "account.html",
        "other_account.html",
    ] {
        assert!(
            engine.tera.get_template_names().any(|n| n == format!("pages/{}", page)),
            "missing embedded page {}",
            page
        );
    }
}

#[test]
fn test_render_home_lists_snippets() {
    let engine = TemplateEngine::new(None).unwrap();
    let mut data = TemplateData::new();
    data.snippets = vec![sample_snippet()];
    data.flash = Some("Snippet successfully created!".to_string());

    let html = engine.render_data("home.html", &data).unwrap();

    assert!(html.contains("An old silent pond"));
    assert!(html.contains("/snippet/view/7"));
    assert!(html.contains("02 Jan 2024 at 15:04"));
    assert!(html.contains("Snippet successfully created!"));
    assert!(html.contains(&format!("&copy; {}", data.current_year)));
    // Anonymous navigation
    assert!(html.contains("/user/login"));
    assert!(!html.contains("/user/logout"));
}

#[test]
fn test_render_home_without_snippets() {
    let engine = TemplateEngine::new(None).unwrap();
    let html = engine.render_data("home.html", &TemplateData::new()).unwrap();
    assert!(html.contains("There's nothing to see here"));
}

#[test]
fn test_render_view_escapes_user_content() {
    let engine = TemplateEngine::new(None).unwrap();
    let mut data = TemplateData::new();
    data.snippet = Some(sample_snippet());
    data.is_authenticated = true;
    data.user_name = Some("Issa".to_string());
    data.form = Some(serde_json::json!({
        "content": "",
        "validator": { "field_errors": { "content": "This field cannot be blank" }, "non_field_errors": [] }
    }));

    let html = engine.render_data("view.html", &data).unwrap();

    assert!(html.contains("&lt;b&gt;lovely&lt;&#x2F;b&gt;"));
    assert!(!html.contains("<b>lovely</b>"));
    assert!(html.contains("This field cannot be blank"));
    assert!(html.contains("/favourites/add/7"));
    assert!(html.contains("/user/logout"));
}

#[test]
fn test_unknown_page_is_not_found() {
    let engine = TemplateEngine::new(None).unwrap();
    let result = engine.render_data("missing.html", &TemplateData::new());
    assert!(matches!(result, Err(TemplateError::NotFound(page)) if page == "missing.html"));
}

#[test]
fn test_disk_override_replaces_embedded_page() {
    let temp_dir = TempDir::new().unwrap();
    let pages = temp_dir.path().join("pages");
    fs::create_dir_all(&pages).unwrap();
    fs::write(
        pages.join("home.html"),
        r#"{% extends "base.html" %}{% block main %}<p>custom home</p>{% endblock main %}"#,
    )
    .unwrap();

    let engine = TemplateEngine::new(Some(temp_dir.path())).unwrap();
    let html = engine.render_data("home.html", &TemplateData::new()).unwrap();

    assert!(html.contains("custom home"));
    // Still wrapped in the embedded base layout
    assert!(html.contains("Snippetbox"));
}

#[test]
fn test_missing_override_dir_falls_back_to_embedded() {
    let temp_dir = TempDir::new().unwrap();
    let engine = TemplateEngine::new(Some(&temp_dir.path().join("nope"))).unwrap();
    let mut data = TemplateData::new();
    data.form = Some(serde_json::json!({
        "email": "alice@example.com",
        "validator": { "field_errors": {}, "non_field_errors": ["Email or password is incorrect"] }
    }));

    let html = engine.render_data("login.html", &data).unwrap();
    assert!(html.contains("Email or password is incorrect"));
    assert!(html.contains("value='alice@example.com'"));
}

#[test]
fn test_broken_template_fails_to_load() {
    let result = TemplateEngine::from_sources([("pages/broken.html", "{% if %}")]);
    assert!(matches!(result, Err(TemplateError::Load(_))));
}

#[test]
fn test_render_error_is_reported() {
    let engine = TemplateEngine::from_sources([(
        "pages/strict.html",
        "{{ user.name | human_date }}",
    )])
    .unwrap();

    let mut context = TeraContext::new();
    context.insert("user", &serde_json::json!({ "name": "not a date" }));
    let result = engine.render("strict.html", &context);
    assert!(matches!(result, Err(TemplateError::Render(_))));
}

#[test]
fn test_human_date() {
    let t = Utc.with_ymd_and_hms(2021, 12, 17, 10, 15, 0).unwrap();
    assert_eq!(human_date(&t), "17 Dec 2021 at 10:15");
}

#[test]
fn test_human_date_filter_handles_empty_values() {
    let args = HashMap::new();
    assert_eq!(
        human_date_filter(&Value::Null, &args).unwrap(),
        Value::String(String::new())
    );
    assert_eq!(
        human_date_filter(&Value::String(String::new()), &args).unwrap(),
        Value::String(String::new())
    );
}

#[test]
fn test_human_date_filter_converts_to_utc() {
    let args = HashMap::new();
    let value = Value::String("2024-03-10T08:30:00+02:00".to_string());
    assert_eq!(
        human_date_filter(&value, &args).unwrap(),
        Value::String("10 Mar 2024 at 06:30".to_string())
    );
    assert!(human_date_filter(&Value::from(5), &args).is_err());
}
