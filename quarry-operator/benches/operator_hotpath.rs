use criterion::{criterion_group, criterion_main, Criterion};
use quarry_operator::{OperatorRegistry, Value};
use std::hint::black_box;

const BENCH_DAO: &str = r#"
name = "UserDao"

[db]
data_source = "users_db"
table = "users"

[cache]
prefix = "user:"
expire = { unit = "minute", amount = 5 }

[[methods]]
name = "get_by_profile"
parameters = [{ rename = "profile", cache_by = "account.id" }, { rename = "limit", type = "int" }]

[[methods]]
name = "get_users"
parameters = [{ rename = "uids", cache_by = "", type = { list = "int" } }]
"#;

fn bench_single_key(c: &mut Criterion) {
    let registry = OperatorRegistry::from_toml_str(BENCH_DAO).expect("assemble registry");
    let op = registry.get("get_by_profile").expect("operator present");
    let profile = Value::record([(
        "account",
        Value::record([("id", Value::Int(42)), ("name", Value::from("ada"))]),
    )]);

    c.bench_function("operator/single_key", |b| {
        b.iter(|| {
            let ctx = op.build_runtime_context(vec![profile.clone(), Value::Int(10)]);
            black_box(op.single_key(&ctx).expect("derive key"));
        });
    });
}

fn bench_multiple_keys(c: &mut Criterion) {
    let registry = OperatorRegistry::from_toml_str(BENCH_DAO).expect("assemble registry");
    let op = registry.get("get_users").expect("operator present");
    let ids = Value::from((0..256).collect::<Vec<i64>>());

    c.bench_function("operator/multiple_keys_256", |b| {
        b.iter(|| {
            let ctx = op.build_runtime_context(vec![black_box(ids.clone())]);
            black_box(op.multiple_keys(&ctx).expect("derive keys"));
        });
    });
}

fn bench_type_context(c: &mut Criterion) {
    let registry = OperatorRegistry::from_toml_str(BENCH_DAO).expect("assemble registry");
    let op = registry.get("get_by_profile").expect("operator present");

    c.bench_function("operator/type_context", |b| {
        b.iter(|| black_box(op.type_context()));
    });
}

criterion_group!(
    benches,
    bench_single_key,
    bench_multiple_keys,
    bench_type_context
);
criterion_main!(benches);
