use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use trace_graph::{
    Bootstrap, BuildConfig, Error, OpCategory, ProjectGraph, ProjectScope, RefUri, TypeCategory,
    classify_op_category,
};

const ENTITY: &str = "acme";
const PROJECT: &str = "mnist";

fn uri(name: &str, version: &str) -> String {
    RefUri::new(ENTITY, PROJECT, name, version).encode()
}

fn object(name: &str, hash: &str, type_version: Value) -> Value {
    json!({
        "collection_name": name,
        "hash": hash,
        "created_at_ms": 1_700_000_000_000i64,
        "aliases": ["latest"],
        "description": null,
        "version_index": 0,
        "type_version": type_version,
    })
}

fn op_def(name: &str, hash: &str) -> Value {
    object(name, hash, json!({"type_name": "OpDef", "type_version": "opdef"}))
}

fn call(span: &str, trace: &str, parent: Option<&str>, name: &str) -> Value {
    json!({
        "span_id": span,
        "trace_id": trace,
        "parent_id": parent,
        "name": name,
        "inputs": {},
        "output": null,
        "status_code": "SUCCESS",
        "timestamp": "2024-01-01T00:00:00Z",
    })
}

fn build(objects: &[Value], calls: &[Value], feedback: &[Value]) -> ProjectGraph {
    let bootstrap = Bootstrap::from_values(objects, calls, feedback).unwrap();
    ProjectGraph::build(ProjectScope::new(ENTITY, PROJECT), bootstrap).unwrap()
}

/// A small but complete batch: two ops calling each other, two objects and a
/// type hierarchy.
fn sample_graph() -> ProjectGraph {
    let objects = vec![
        op_def("train_fn", "tr1"),
        op_def("score_fn", "sc1"),
        op_def("load", "ld1"),
        object(
            "mnist",
            "ds1",
            json!({
                "type_name": "ImageDataset", "type_version": "t-img",
                "parent_type": {"type_name": "Dataset", "type_version": "t-ds"}
            }),
        ),
        object(
            "clf",
            "m1",
            json!({"type_name": "LinearModel", "type_version": "t-lin"}),
        ),
        object(
            "events",
            "st1",
            json!({"type_name": "stream_table", "type_version": "t-st"}),
        ),
    ];
    let mut root = call("c1", "trace-a", None, &uri("train_fn", "tr1"));
    root["inputs"] = json!({"data": uri("mnist", "ds1"), "lr": 0.1});
    root["output"] = json!({"model": uri("clf", "m1")});
    let mut child = call("c2", "trace-a", Some("c1"), &uri("score_fn", "sc1"));
    child["inputs"] = json!({"model": uri("clf", "m1"), "data": uri("mnist", "ds1")});
    let grandchild = call("c3", "trace-a", Some("c2"), &uri("load", "ld1"));
    let other_root = call("c9", "trace-b", None, "some-plain-function");

    build(
        &objects,
        &[root, child, grandchild, other_root],
        &[json!({"run_id": "c2", "feedback_id": "fb1", "feedback": {"score": 1}})],
    )
}

#[test]
fn scenario_single_dataset_without_calls() {
    let g = build(
        &[object(
            "Dataset",
            "abc123",
            json!({"type_name": "Dataset", "type_version": "t-ds"}),
        )],
        &[],
        &[],
    );

    let versions = g.object("Dataset").unwrap().object_versions();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].version(), "abc123");
    assert!(g.object_version("abc123").unwrap().input_to().is_empty());
}

#[test]
fn scenario_invokes_and_invoked_by() {
    let g = build(
        &[op_def("predict_fn", "v1"), op_def("score_fn", "v2")],
        &[
            call("s1", "t", None, &uri("predict_fn", "v1")),
            call("s2", "t", Some("s1"), &uri("score_fn", "v2")),
        ],
        &[],
    );

    let v1 = g.op_version("v1").unwrap();
    let v2 = g.op_version("v2").unwrap();
    assert_eq!(v1.invokes(), vec![v2]);
    assert_eq!(v2.invoked_by(), vec![v1]);
    assert!(v1.invoked_by().is_empty());
    assert!(v2.invokes().is_empty());
}

#[test]
fn scenario_plain_name_call_has_no_op_version() {
    let g = build(&[], &[call("s1", "t", None, "some-plain-function")], &[]);

    let c = g.call("s1").unwrap();
    assert!(c.op_version().is_none());
    assert_eq!(g.calls().len(), 1);
}

#[test]
fn scenario_type_version_parent_and_children() {
    let g = build(
        &[object(
            "thing",
            "o1",
            json!({
                "type_name": "Child", "type_version": "t2",
                "parent_type": {"type_name": "Base", "type_version": "t1"}
            }),
        )],
        &[],
        &[],
    );

    let t1 = g.type_version("t1").unwrap();
    let t2 = g.type_version("t2").unwrap();
    assert_eq!(t1.child_type_versions(), vec![t2]);
    assert_eq!(t2.parent_type_version().map(|p| p.version()), Some("t1"));
    assert!(t1.parent_type_version().is_none());
}

#[test]
fn scenario_classify_train_model() {
    assert_eq!(classify_op_category("TrainModel"), Some(OpCategory::Train));
    assert_eq!(OpCategory::Train.as_str(), "train");
}

#[test]
fn object_versions_close_over_their_objects() {
    let g = sample_graph();
    for ov in g.object_versions() {
        assert!(ov.object().object_versions().contains(&ov));
    }
    for obj in g.objects() {
        for ov in obj.object_versions() {
            assert_eq!(ov.object(), obj);
        }
    }
    for ty in g.types() {
        for tv in ty.type_versions() {
            assert_eq!(tv.type_name(), ty.name());
        }
    }
}

#[test]
fn invokes_and_invoked_by_are_symmetric() {
    let g = sample_graph();
    let all = g.op_versions();
    for a in &all {
        for b in &all {
            assert_eq!(
                a.invoked_by().contains(b),
                b.invokes().contains(a),
                "{:?} / {:?}",
                a,
                b
            );
        }
    }
}

#[test]
fn parent_and_child_calls_are_symmetric() {
    let g = sample_graph();
    let all = g.calls();
    for p in &all {
        for c in &all {
            assert_eq!(p.child_calls().contains(c), c.parent_call() == Some(*p));
        }
    }
}

#[test]
fn unresolved_input_reference_is_dropped_not_fatal() {
    let mut c = call("s1", "t", None, "f");
    c["inputs"] = json!({
        "ok": uri("ds", "d1"),
        "gone": uri("ds", "does-not-exist"),
        "garbage": "wandb-artifact:///nope",
    });
    let g = build(
        &[object("ds", "d1", json!({"type_name": "Dataset", "type_version": "t"}))],
        &[c],
        &[],
    );

    let inputs = g.call("s1").unwrap().inputs();
    assert_eq!(inputs.iter().map(|o| o.version()).collect::<Vec<_>>(), vec!["d1"]);
}

#[test]
fn sample_graph_navigation() {
    let g = sample_graph();

    // Reserved object types never become objects.
    assert!(g.object("events").is_none());
    assert_eq!(
        g.objects().iter().map(|o| o.name()).collect::<Vec<_>>(),
        vec!["clf", "mnist"]
    );

    let train = g.op_version("tr1").unwrap();
    assert_eq!(train.op().name(), "train_fn");
    assert_eq!(train.op().category(), Some(OpCategory::Train));
    assert_eq!(
        train.invokes().iter().map(|o| o.version()).collect::<Vec<_>>(),
        vec!["sc1"]
    );
    assert_eq!(
        train.input_type_versions().iter().map(|t| t.version()).collect::<Vec<_>>(),
        vec!["t-img"]
    );
    assert_eq!(
        train.output_type_versions().iter().map(|t| t.version()).collect::<Vec<_>>(),
        vec!["t-lin"]
    );
    assert_eq!(train.example_call().map(|c| c.id()), Some("c1"));
    assert_eq!(train.ref_uri().encode(), uri("train_fn", "tr1"));

    let ds = g.object_version("ds1").unwrap();
    assert_eq!(
        ds.input_to().iter().map(|c| c.id()).collect::<Vec<_>>(),
        vec!["c1", "c2"]
    );
    assert!(ds.output_from().is_empty());
    assert_eq!(
        g.object_version("m1").unwrap().output_from().iter().map(|c| c.id()).collect::<Vec<_>>(),
        vec!["c1"]
    );

    let img = ds.type_version().unwrap();
    assert_eq!(img.category(), Some(TypeCategory::Dataset));
    assert_eq!(
        img.ancestors().iter().map(|t| t.version()).collect::<Vec<_>>(),
        vec!["t-ds"]
    );
    assert_eq!(img.input_to(), vec![g.op_version("sc1").unwrap(), train]);
    assert_eq!(g.type_("LinearModel").unwrap().category(), Some(TypeCategory::Model));
}

#[test]
fn trace_roots_and_feedback() {
    let g = sample_graph();

    let roots = g.trace_roots("trace-a");
    assert_eq!(roots.iter().map(|c| c.id()).collect::<Vec<_>>(), vec!["c1"]);
    assert_eq!(g.trace_calls("trace-a").len(), 3);
    assert_eq!(g.trace_ids(), vec!["trace-a", "trace-b"]);
    assert!(g.trace_roots("missing").is_empty());

    let scored = g.call("c2").unwrap();
    assert_eq!(scored.feedback().len(), 1);
    assert_eq!(scored.feedback()[0].feedback_id, "fb1");
    assert!(g.call("c1").unwrap().feedback().is_empty());
}

#[test]
fn orphan_call_is_a_trace_root() {
    let g = build(&[], &[call("s1", "t", Some("not-in-batch"), "f")], &[]);

    let c = g.call("s1").unwrap();
    assert_eq!(c.parent_id(), Some("not-in-batch"));
    assert!(c.parent_call().is_none());
    assert!(c.is_trace_root());
    assert_eq!(g.trace_roots("t"), vec![c]);
}

#[test]
fn lookups_of_absent_ids_are_none() {
    let g = sample_graph();
    assert!(g.type_("nope").is_none());
    assert!(g.op("nope").is_none());
    assert!(g.object("nope").is_none());
    assert!(g.type_version("nope").is_none());
    assert!(g.op_version("nope").is_none());
    assert!(g.object_version("nope").is_none());
    assert!(g.call("nope").is_none());
}

#[test]
fn category_catalogs_are_static() {
    let g = build(&[], &[], &[]);
    assert_eq!(g.op_categories(), &OpCategory::ALL[..]);
    assert_eq!(g.type_categories(), &[TypeCategory::Model, TypeCategory::Dataset][..]);
}

#[test]
fn repaired_type_version_keeps_its_encoding() {
    let encoded = r#"{"type_name":"Dataset","type_version":"t-ds","rows":"list"}"#;
    let g = build(
        &[object(
            "mnist",
            "ds1",
            json!({
                "type_name": "unknown", "type_version": "unknown",
                "type_version_json_string": encoded
            }),
        )],
        &[],
        &[],
    );
    let tv = g.object_version("ds1").unwrap().type_version().unwrap();
    assert_eq!(tv.version(), "t-ds");
    assert_eq!(tv.type_name(), "Dataset");
    assert!(!tv.is_unknown());
    assert_eq!(tv.encoded(), Some(encoded));
    assert!(g.type_version("unknown").is_none());
}

#[test]
fn unparseable_type_description_stays_unknown() {
    let g = build(
        &[
            object(
                "a",
                "o1",
                json!({
                    "type_name": "unknown", "type_version": "unknown",
                    "type_version_json_string": "{not json"
                }),
            ),
            object(
                "b",
                "o2",
                json!({"type_name": "unknown", "type_version": "unknown"}),
            ),
        ],
        &[],
        &[],
    );
    let tv = g.type_version("unknown").unwrap();
    assert!(tv.is_unknown());
    assert_eq!(g.type_versions().len(), 1);
    assert_eq!(
        tv.object_versions(),
        vec![g.object_version("o1").unwrap(), g.object_version("o2").unwrap()]
    );
}

#[test]
fn type_hierarchy_is_the_same_in_any_record_order() {
    let parentless = object("a", "o1", json!({"type_name": "Mid", "type_version": "t2"}));
    let chained = object(
        "b",
        "o2",
        json!({
            "type_name": "Child", "type_version": "t3",
            "parent_type": {
                "type_name": "Mid", "type_version": "t2",
                "parent_type": {"type_name": "Base", "type_version": "t1"}
            }
        }),
    );
    for objects in [
        [parentless.clone(), chained.clone()],
        [chained.clone(), parentless.clone()],
    ] {
        let g = build(&objects, &[], &[]);
        let mid = g.type_version("t2").unwrap();
        assert_eq!(mid.parent_type_version(), g.type_version("t1"));
        let chain: Vec<&str> = g
            .type_version("t3")
            .unwrap()
            .ancestors()
            .iter()
            .map(|t| t.version())
            .collect();
        assert_eq!(chain, vec!["t2", "t1"]);
    }
}

#[test]
fn missing_identity_aborts_build() {
    let err = Bootstrap::from_values(&[json!({"collection_name": "x"})], &[], &[]).unwrap_err();
    assert!(matches!(err, Error::Record { index: 0, .. }));

    let bootstrap =
        Bootstrap::from_values(&[], &[json!({"span_id": " ", "trace_id": "t"})], &[]).unwrap();
    let err = ProjectGraph::build(ProjectScope::new(ENTITY, PROJECT), bootstrap).unwrap_err();
    assert!(err.to_string().contains("span_id is empty"));
}

#[test]
fn custom_config_changes_partitioning() {
    let config = BuildConfig {
        op_def_type: "Function".to_string(),
        reserved_types: ["Function".to_string()].into_iter().collect(),
        ..BuildConfig::default()
    };
    let bootstrap = Bootstrap::from_values(
        &[
            object("f", "f1", json!({"type_name": "Function", "type_version": "tf"})),
            object("g", "g1", json!({"type_name": "OpDef", "type_version": "to"})),
        ],
        &[],
        &[],
    )
    .unwrap();
    let g = ProjectGraph::build_with(&config, ProjectScope::new(ENTITY, PROJECT), bootstrap).unwrap();
    assert!(g.op_version("f1").is_some());
    // No longer reserved under this config.
    assert!(g.object_version("g1").is_some());
}

#[test]
fn graph_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ProjectGraph>();

    let g = sample_graph();
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| assert_eq!(g.calls().len(), 4));
        }
    });
}
