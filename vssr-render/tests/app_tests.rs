use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use serde_json::json;
use vssr_dom::{DomError, h, text};
use vssr_render::{App, Map, Methods, RenderError, RenderOptions, Template, Value};

fn data(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(map) => map,
        _ => panic!("fixture must be an object"),
    }
}

#[test]
fn rendered_twice_with_independent_data() {
    let mut app = App::new(Methods::new());
    app.register_template("root", "<p>{{ text }}</p>");

    let first = app.render_component("root", data(json!({"text": "text 1"}))).unwrap();
    assert_eq!(first, "<p>text 1</p>");
    let second = app.render_component("root", data(json!({"text": "text 2"}))).unwrap();
    assert_eq!(second, "<p>text 2</p>");
}

#[test]
fn lazy_templates_load_on_first_render_only() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut app = App::new(Methods::new());
    app.register_template(
        "root",
        Template::lazy(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            "<p>{{ text }}</p>".to_string()
        }),
    );

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    let result = app.render_component("root", data(json!({"text": "TEXT"}))).unwrap();
    assert_eq!(result, "<p>TEXT</p>");
    app.render_component("root", data(json!({"text": "again"}))).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn failed_lazy_load_is_retried() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut app = App::new(Methods::new());
    app.register_template(
        "root",
        Template::try_lazy(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err("not yet")
            } else {
                Ok("<p>ok</p>".to_string())
            }
        }),
    );

    let err = app.render_component("root", Map::new()).unwrap_err();
    assert_eq!(
        err,
        RenderError::TemplateLoad {
            name: "root".into(),
            message: "not yet".into()
        }
    );
    assert_eq!(app.render_component("root", Map::new()).unwrap(), "<p>ok</p>");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn nested_components() {
    let mut app = App::new(Methods::new());
    app.register_template("root", "<div><x-a :a=\"rootVar\"></x-a></div>");
    app.register_template("x-a", "<p><x-b :b=\"a\"></x-b></p>");
    app.register_template("x-b", "<span>{{ b }}</span>");

    let result = app.render_component("root", data(json!({"rootVar": "text"}))).unwrap();
    assert_eq!(result, "<div><p><span>text</span></p></div>");
}

#[test]
fn object_props() {
    let mut app = App::new(Methods::new());
    app.register_template("root", "<div><x-a :obj=\"rootObj\"></x-a></div>");
    app.register_template("x-a", "<p>obj = { a: {{ obj.a }}, b: {{ obj.b }} }</p>");

    let result = app
        .render_component("root", data(json!({"rootObj": {"a": "A", "b": "B"}})))
        .unwrap();
    assert_eq!(result, "<div><p>obj = { a: A, b: B }</p></div>");
}

#[test]
fn component_substitution_preserves_order() {
    let mut app = App::new(Methods::new());
    app.register_template("root", "<div><x-a></x-a><div><p>Following Text</p></div>");
    app.register_template("x-a", "<p>obj = { a: 1, b: 2 }</p>");

    let result = app.render_component("root", Map::new()).unwrap();
    assert_eq!(
        result,
        "<div><p>obj = { a: 1, b: 2 }</p><div><p>Following Text</p></div></div>"
    );
}

#[test]
fn kebab_case_props_become_camel_case() {
    let mut app = App::new(Methods::new());
    app.register_template(
        "root",
        "<div><x-a some-long-prop=\"A B C\"></x-a><x-a :some-long-prop=\"someLongVar\"></x-a></div>",
    );
    app.register_template("x-a", "<p>{{ someLongProp }}</p>");

    let result = app.render_component("root", data(json!({"someLongVar": "X Y Z"}))).unwrap();
    assert_eq!(result, "<div><p>A B C</p><p>X Y Z</p></div>");
}

#[test]
fn components_in_loops_and_conditionals() {
    let mut app = App::new(Methods::new());
    app.register_template(
        "root",
        "<ul><x-item v-for=\"entry in entries\" :label=\"entry\"></x-item><x-empty v-if=\"!entries.length\"></x-empty></ul>",
    );
    app.register_template("x-item", "<li>{{ label }}</li>");
    app.register_template("x-empty", "<li>none</li>");

    assert_eq!(
        app.render_component("root", data(json!({"entries": ["a", "b"]}))).unwrap(),
        "<ul><li>a</li><li>b</li></ul>"
    );
    assert_eq!(
        app.render_component("root", data(json!({"entries": []}))).unwrap(),
        "<ul><li>none</li></ul>"
    );
}

#[test]
fn setup_derives_props() {
    let mut app = App::new(Methods::new());
    let root = "<template>
\t<div>
\t\t<x-property :property-id=\"propertyId\"></x-property>
\t</div>
</template>
<script>
module.exports = exports = defineComponent( {
\tcomputed: {
\t\tpropertyId() {
\t\t\treturn statement.mainsnak.property;
\t\t}
\t}
} );
</script>";
    app.register_template_with_setup("root", root, |mut data: Map<String, Value>| {
        let property = data
            .get("statement")
            .and_then(|s| s.pointer("/mainsnak/property"))
            .cloned()
            .unwrap_or(Value::Null);
        data.insert("propertyId".into(), property);
        data
    });

    let property = "<template>
\t<a :href=\"propertyUrl\">{{ propertyLabel }}</a>
</template>
<script>
module.exports = exports = defineComponent( {} );
</script>";
    app.register_template_with_setup("x-property", property, |mut data: Map<String, Value>| {
        let id = data
            .get("propertyId")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        data.insert(
            "propertyUrl".into(),
            json!(format!("https://wiki.example/wiki/Property:{id}")),
        );
        data.insert("propertyLabel".into(), json!(format!("property {id}")));
        data
    });

    let result = app
        .render_component(
            "root",
            data(json!({"statement": {"mainsnak": {"property": "P123"}}})),
        )
        .unwrap();
    assert_eq!(
        result,
        "<div>\n\t\t<a href=\"https://wiki.example/wiki/Property:P123\">property P123</a>\n\t</div>"
    );
}

#[test]
fn setup_runs_once_per_render() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut app = App::new(Methods::new());
    app.register_template_with_setup("root", "<p>{{ n }}</p>", move |mut data: Map<String, Value>| {
        counter.fetch_add(1, Ordering::SeqCst);
        data.insert("n".into(), json!(1));
        data
    });

    app.render_component("root", Map::new()).unwrap();
    app.render_component("root", Map::new()).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn unknown_component() {
    let app = App::new(Methods::new());
    assert_eq!(
        app.render_component("nope", Map::new()),
        Err(RenderError::UnknownComponent { name: "nope".into() })
    );

    let mut app = App::new(Methods::new());
    app.register_template("root", "<div><x-missing></x-missing></div>");
    assert_eq!(
        app.render_component("root", Map::new()),
        Err(RenderError::UnknownComponent {
            name: "x-missing".into()
        })
    );
}

#[test]
fn self_recursive_component_hits_the_depth_limit() {
    let mut app = App::new(Methods::new()).with_options(RenderOptions {
        max_component_depth: 5,
    });
    app.register_template("x-loop", "<div><x-loop></x-loop></div>");

    assert_eq!(
        app.render_component("x-loop", Map::new()),
        Err(RenderError::RecursionLimit {
            component: "x-loop".into(),
            limit: 5
        })
    );
}

#[test]
fn render_to_node() {
    let mut app = App::new(Methods::new());
    app.register_template("root", "<p class=\"c\">{{ v }}</p>");
    let node = app
        .render_component_to_node("root", data(json!({"v": "x"})))
        .unwrap();
    assert_eq!(node, h("p", vec![("class", "c")], vec![text("x")]));
}

#[test]
fn render_to_node_needs_a_single_node() {
    let mut app = App::new(Methods::new());
    app.register_template("root", "<p v-if=\"show\"></p>");
    assert_eq!(
        app.render_component_to_node("root", data(json!({"show": false}))),
        Err(RenderError::MalformedTemplate(DomError::NoRootNode))
    );
}

#[test]
fn malformed_templates() {
    let mut app = App::new(Methods::new());
    app.register_template("two", "<p></p><p></p>");
    app.register_template("empty", "   ");
    assert_eq!(
        app.render_component("two", Map::new()),
        Err(RenderError::MalformedTemplate(DomError::MultipleRootNodes {
            count: 2
        }))
    );
    assert_eq!(
        app.render_component("empty", Map::new()),
        Err(RenderError::MalformedTemplate(DomError::EmptyDocument))
    );
}

#[test]
fn evaluate_expression_uses_app_methods() {
    let methods = Methods::new().with("double", |args: &[Value]| {
        json!(args.first().and_then(Value::as_i64).unwrap_or(0) * 2)
    });
    let app = App::new(methods);
    assert_eq!(
        app.evaluate_expression("double(n)", data(json!({"n": 21}))),
        Ok(json!(42))
    );
    assert!(matches!(
        app.evaluate_expression("missing", Map::new()),
        Err(RenderError::Eval { .. })
    ));
    assert!(matches!(
        app.evaluate_expression("a ===", Map::new()),
        Err(RenderError::Parse(_))
    ));
}

#[test]
fn concurrent_renders_share_one_app() {
    let mut app = App::new(Methods::new());
    app.register_template("root", "<p><x-a :n=\"n\"></x-a></p>");
    app.register_template("x-a", Template::lazy(|| "<b>{{ n }}</b>".to_string()));
    let app = Arc::new(app);

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let app = Arc::clone(&app);
            thread::spawn(move || app.render_component("root", data(json!({"n": n}))).unwrap())
        })
        .collect();
    for (n, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), format!("<p><b>{n}</b></p>"));
    }
}
