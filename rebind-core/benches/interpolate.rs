use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rebind_core::{List, Object, ReactiveOptions, Template, Value, View};
use serde_json::json;

fn template_benchmarks(c: &mut Criterion) {
    let source = "Hello {user.name}, you have {count} new {pluralize(count, 'message')}";
    let model = Object::new()
        .with("user", Object::new().with("name", "Ann"))
        .with("count", 3)
        .with_accessor("pluralize", |args| {
            let singular = args.get(1).map(Value::to_string).unwrap_or_default();
            match args.first().and_then(Value::as_number) {
                Some(n) if n == 1.0 => Value::from(singular),
                _ => Value::from(format!("{singular}s")),
            }
        });

    c.bench_function("template_compile", |b| {
        b.iter(|| Template::compile(black_box(source)))
    });

    let template = Template::compile(source).unwrap();
    c.bench_function("template_render", |b| {
        b.iter(|| template.render(black_box(&model)))
    });
}

fn view_benchmarks(c: &mut Criterion) {
    c.bench_function("view_set", |b| {
        let view = View::from_html(
            r#"<p title="{name}">Hello {name}!</p>"#,
            Object::new().with("name", "Ann"),
            ReactiveOptions::new(),
        )
        .unwrap();
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            view.set("name", i.to_string()).unwrap();
        })
    });

    c.bench_function("each_push_100", |b| {
        b.iter(|| {
            let items = List::new();
            let _view = View::from_html(
                r#"<ul><li each="items">{n}</li></ul>"#,
                Object::new().with("items", items.clone()),
                ReactiveOptions::new(),
            )
            .unwrap();
            for n in 0..100 {
                items.push(Value::from(json!({ "n": n }))).unwrap();
            }
        })
    });
}

criterion_group!(benches, template_benchmarks, view_benchmarks);
criterion_main!(benches);
