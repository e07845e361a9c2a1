use contentgraph::{
    ContentModel, ContentResolver, DescribeModel, DynamicItem, FieldKind, FieldSpec, FieldValue,
    ItemHandle, ItemResponse, ItemSystem, ListingResponse, ResolveOptions, RichTextBlock,
    TypeRegistry,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value};

#[derive(Debug, Default)]
struct Article {
    system: Option<ItemSystem>,
    title: String,
    related: Vec<ItemHandle>,
    body: Vec<RichTextBlock>,
    related_when_body_assigned: Option<usize>,
}

impl ContentModel for Article {
    fn assign(&mut self, field: &str, value: FieldValue) {
        match (field, value) {
            ("system", FieldValue::System(system)) => self.system = Some(system),
            ("title", FieldValue::Text(title)) => self.title = title,
            ("related", FieldValue::Items(items)) => self.related = items,
            ("body", FieldValue::RichText(blocks)) => {
                self.related_when_body_assigned = Some(self.related.len());
                self.body = blocks;
            }
            _ => {}
        }
    }
}

impl DescribeModel for Article {
    const TYPE_NAME: &'static str = "article";

    fn fields() -> Vec<FieldSpec> {
        // Rich text is declared first on purpose.
        vec![
            FieldSpec::new("body", FieldKind::RichText).element("body_copy"),
            FieldSpec::new("system", FieldKind::System),
            FieldSpec::new("title", FieldKind::Text),
            FieldSpec::new("related", FieldKind::LinkedItems).element("related_articles"),
        ]
    }
}

fn article(codename: &str, related: &[&str]) -> Value {
    json!({
        "system": { "codename": codename, "type": "article", "name": codename },
        "elements": {
            "title": { "type": "text", "value": format!("Title of {codename}") },
            "body_copy": {
                "type": "rich_text",
                "value": "<p>Body</p>",
                "images": {},
                "links": {},
                "modular_content": []
            },
            "related_articles": { "type": "modular_content", "value": related }
        }
    })
}

fn response(item: Value, linked: Vec<Value>) -> ItemResponse {
    let mut pool = Map::new();
    for linked_item in linked {
        let codename = linked_item["system"]["codename"]
            .as_str()
            .expect("fixture codename")
            .to_string();
        pool.insert(codename, linked_item);
    }
    ItemResponse::from_value(&json!({ "item": item, "modular_content": pool }))
        .expect("valid response")
}

fn article_resolver() -> ContentResolver {
    let mut types = TypeRegistry::new();
    types.register::<Article>();
    ContentResolver::with_defaults(types)
}

#[test]
fn test_shared_reference_resolves_to_one_instance() {
    let response = response(
        article("a", &["b", "c"]),
        vec![article("b", &["c"]), article("c", &[])],
    );

    let graph = article_resolver()
        .resolve_response(&response)
        .expect("root resolves");

    assert_eq!(graph.len(), 3);
    let a = graph.root_as::<Article>().expect("article root");
    let b = graph.get::<Article>(a.related[0]).expect("article b");
    assert_eq!(a.related[1], b.related[0]);
    assert_eq!(graph.codename(b.related[0]), Some("c"));
    assert_eq!(a.title, "Title of a");
    assert_eq!(
        a.system.as_ref().map(|s| s.codename.as_str()),
        Some("a")
    );
}

#[test]
fn test_self_reference_terminates() {
    let response = response(article("a", &["a"]), Vec::new());

    let graph = article_resolver()
        .resolve_response(&response)
        .expect("root resolves");

    assert_eq!(graph.len(), 1);
    let a = graph.root_as::<Article>().expect("article root");
    assert_eq!(a.related, vec![graph.root()]);
}

#[test]
fn test_mutual_reference_terminates() {
    let response = response(article("a", &["b"]), vec![article("b", &["a"])]);

    let graph = article_resolver()
        .resolve_response(&response)
        .expect("root resolves");

    assert_eq!(graph.len(), 2);
    let a = graph.root_as::<Article>().expect("article root");
    let b = graph.get::<Article>(a.related[0]).expect("article b");
    assert_eq!(b.related, vec![graph.root()]);
}

#[test]
fn test_linked_items_assigned_before_rich_text() {
    let response = response(article("a", &["b"]), vec![article("b", &[])]);

    let graph = article_resolver()
        .resolve_response(&response)
        .expect("root resolves");

    let a = graph.root_as::<Article>().expect("article root");
    assert_eq!(a.related_when_body_assigned, Some(1));
    assert_eq!(a.body, vec![RichTextBlock::Html("<p>Body</p>".to_string())]);
}

#[test]
fn test_unknown_and_missing_linked_items_are_dropped() {
    let video = json!({
        "system": { "codename": "intro_video", "type": "video" },
        "elements": {}
    });
    let response = response(
        article("a", &["intro_video", "not_in_pool", "b"]),
        vec![video, article("b", &[])],
    );

    let graph = article_resolver()
        .resolve_response(&response)
        .expect("root resolves");

    let a = graph.root_as::<Article>().expect("article root");
    assert_eq!(a.related.len(), 1);
    assert_eq!(graph.codename(a.related[0]), Some("b"));
    assert_eq!(graph.handle("intro_video"), None);
}

#[test]
fn test_unregistered_root_type_is_not_resolved() {
    let response = response(
        json!({ "system": { "codename": "v", "type": "video" }, "elements": {} }),
        Vec::new(),
    );

    assert!(article_resolver().resolve_response(&response).is_none());
}

#[test]
fn test_root_without_system_is_not_resolved() {
    let response = response(json!({ "elements": {} }), Vec::new());

    assert!(article_resolver().resolve_response(&response).is_none());
}

#[test]
fn test_invalid_optional_system_attributes_keep_root() {
    let mut root = article("a", &[]);
    root["system"]["last_modified"] = json!("not-a-date");
    root["system"]["sitemap_locations"] = Value::Null;
    let response = response(root, Vec::new());

    let graph = article_resolver()
        .resolve_response(&response)
        .expect("root resolves");

    let a = graph.root_as::<Article>().expect("article root");
    let system = a.system.as_ref().expect("system assigned");
    assert_eq!(system.codename, "a");
    assert_eq!(system.last_modified, None);
    assert_eq!(a.title, "Title of a");
}

#[test]
fn test_invalid_optional_system_attribute_keeps_linked_item() {
    let mut b = article("b", &[]);
    b["system"]["last_modified"] = json!("2019-03-27");
    let response = response(article("a", &["b"]), vec![b]);

    let graph = article_resolver()
        .resolve_response(&response)
        .expect("root resolves");

    let a = graph.root_as::<Article>().expect("article root");
    assert_eq!(a.related.len(), 1);
    assert_eq!(graph.codename(a.related[0]), Some("b"));
}

#[test]
fn test_resolve_as_ignores_declared_type() {
    let item = json!({
        "system": { "codename": "landing", "type": "landing_page" },
        "elements": { "title": { "type": "text", "value": "Welcome" } }
    });
    let response = response(item, Vec::new());

    let resolver = article_resolver();
    assert!(resolver.resolve_response(&response).is_none());

    let graph = resolver
        .resolve_as::<Article>(&response.item, &response.linked_items)
        .expect("concrete type");
    let landing = graph.root_as::<Article>().expect("article model");
    assert_eq!(landing.title, "Welcome");
    assert_eq!(graph.item_type(graph.root()), Some("landing_page"));
}

#[test]
fn test_malformed_element_keeps_field_default() {
    let mut types = TypeRegistry::new();
    types.register_dynamic(
        "product",
        vec![
            FieldSpec::new("price", FieldKind::Number),
            FieldSpec::new("name", FieldKind::Text),
            FieldSpec::new("launched", FieldKind::DateTime),
        ],
    );
    let resolver = ContentResolver::with_defaults(types);
    let response = response(
        json!({
            "system": { "codename": "brewer", "type": "product" },
            "elements": {
                "price": { "type": "number", "value": "cheap" },
                "name": { "type": "text", "value": "Brewer" },
                "launched": { "type": "date_time", "value": null }
            }
        }),
        Vec::new(),
    );

    let graph = resolver.resolve_response(&response).expect("root resolves");

    let product = graph.root_as::<DynamicItem>().expect("dynamic item");
    assert_eq!(product.get("price"), None);
    assert_eq!(product.get("launched"), None);
    assert_eq!(
        product.get("name"),
        Some(&FieldValue::Text("Brewer".to_string()))
    );
}

#[test]
fn test_element_kind_mismatch_is_skipped() {
    let mut types = TypeRegistry::new();
    types.register_dynamic("product", vec![FieldSpec::new("name", FieldKind::Number)]);
    let resolver = ContentResolver::with_defaults(types);
    let response = response(
        json!({
            "system": { "codename": "brewer", "type": "product" },
            "elements": { "name": { "type": "text", "value": "Brewer" } }
        }),
        Vec::new(),
    );

    let graph = resolver.resolve_response(&response).expect("root resolves");

    let product = graph.root_as::<DynamicItem>().expect("dynamic item");
    assert_eq!(product.get("name"), None);
}

#[test]
fn test_asset_urls_are_rewritten() {
    let mut types = TypeRegistry::new();
    types.register_dynamic("product", vec![FieldSpec::new("images", FieldKind::Assets)]);
    let options = ResolveOptions {
        asset_url_replacement: Some("https://cdn.example.org".to_string()),
        ..Default::default()
    };
    let resolver = ContentResolver::new(types, options);
    let response = response(
        json!({
            "system": { "codename": "brewer", "type": "product" },
            "elements": {
                "images": {
                    "type": "asset",
                    "value": [{
                        "name": "brewer.jpg",
                        "type": "image/jpeg",
                        "size": 1024,
                        "url": "https://assets.example.com/975bf280/brewer.jpg"
                    }]
                }
            }
        }),
        Vec::new(),
    );

    let graph = resolver.resolve_response(&response).expect("root resolves");

    let product = graph.root_as::<DynamicItem>().expect("dynamic item");
    let Some(FieldValue::Assets(assets)) = product.get("images") else {
        panic!("expected assets");
    };
    assert_eq!(assets[0].url, "https://cdn.example.org/975bf280/brewer.jpg");
    assert_eq!(assets[0].content_type.as_deref(), Some("image/jpeg"));
}

#[test]
fn test_listing_items_resolve_independently() {
    let listing = ListingResponse::from_value(&json!({
        "items": [
            article("a", &["shared"]),
            article("b", &["shared"]),
            { "system": { "codename": "v", "type": "video" }, "elements": {} }
        ],
        "modular_content": { "shared": article("shared", &[]) },
        "pagination": { "skip": 0, "limit": 10, "count": 3 }
    }))
    .expect("valid listing");

    let graphs = article_resolver().resolve_listing(&listing);

    assert_eq!(graphs.len(), 2);
    assert_eq!(graphs[0].codename(graphs[0].root()), Some("a"));
    assert_eq!(graphs[1].codename(graphs[1].root()), Some("b"));
    assert!(graphs.iter().all(|graph| graph.len() == 2));
}
