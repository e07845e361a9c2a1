use std::fs;
use std::process::Command;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

const CONFIG: &str = r#"
[links.patterns]
article = "/articles/{url_slug}"

[types.article.fields]
title = "text"
body = { kind = "text", element = "body_copy" }
related = { kind = "linked_items", element = "related_articles" }
"#;

fn article(codename: &str, related: &[&str]) -> Value {
    json!({
        "system": { "codename": codename, "type": "article" },
        "elements": {
            "title": { "type": "text", "value": codename.to_uppercase() },
            "body_copy": {
                "type": "rich_text",
                "value": "<p><a data-item-id=\"l1\">Next</a></p>",
                "images": {},
                "links": { "l1": { "codename": "b", "type": "article", "url_slug": "second" } },
                "modular_content": []
            },
            "related_articles": { "type": "modular_content", "value": related }
        }
    })
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_contentgraph"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
}

#[test]
fn test_cli_renders_cyclic_graph() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = dir.path().join("contentgraph.toml");
    let input = dir.path().join("item.json");
    fs::write(&config, CONFIG).expect("write config");
    let response = json!({
        "item": article("a", &["b"]),
        "modular_content": { "b": article("b", &["a"]) }
    });
    fs::write(&input, response.to_string()).expect("write input");

    let output = Command::new(env!("CARGO_BIN_EXE_contentgraph"))
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .arg("--compact")
        .output()
        .expect("Failed to execute command");

    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let rendered: Value = serde_json::from_slice(&output.stdout).expect("JSON output");
    assert_eq!(rendered["root"], json!("a"));
    assert_eq!(rendered["items"]["a"]["fields"]["title"], json!("A"));
    assert_eq!(
        rendered["items"]["a"]["fields"]["related"],
        json!([{ "$ref": "b" }])
    );
    assert_eq!(
        rendered["items"]["b"]["fields"]["related"],
        json!([{ "$ref": "a" }])
    );
    assert_eq!(
        rendered["items"]["b"]["fields"]["body"],
        json!("<p><a href=\"/articles/second\" data-item-id=\"l1\">Next</a></p>")
    );
}

#[test]
fn test_cli_writes_listing_to_output_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = dir.path().join("contentgraph.toml");
    let input = dir.path().join("items.json");
    let output_path = dir.path().join("graph.json");
    fs::write(&config, CONFIG).expect("write config");
    let response = json!({
        "items": [article("a", &[]), article("b", &[])],
        "modular_content": {}
    });
    fs::write(&input, response.to_string()).expect("write input");

    let output = Command::new(env!("CARGO_BIN_EXE_contentgraph"))
        .arg(&input)
        .arg(&output_path)
        .arg("--config")
        .arg(&config)
        .arg("--listing")
        .output()
        .expect("Failed to execute command");

    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let written = fs::read_to_string(&output_path).expect("output written");
    let rendered: Value = serde_json::from_str(&written).expect("JSON output");
    let roots: Vec<&Value> = rendered
        .as_array()
        .expect("array of graphs")
        .iter()
        .map(|graph| &graph["root"])
        .collect();
    assert_eq!(roots, vec![&json!("a"), &json!("b")]);
}

#[test]
fn test_cli_fails_for_unconfigured_type() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = dir.path().join("contentgraph.toml");
    let input = dir.path().join("item.json");
    fs::write(&config, "[types.product.fields]\nname = \"text\"\n").expect("write config");
    fs::write(&input, json!({ "item": article("a", &[]) }).to_string()).expect("write input");

    let output = Command::new(env!("CARGO_BIN_EXE_contentgraph"))
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unresolvable item"));
}
