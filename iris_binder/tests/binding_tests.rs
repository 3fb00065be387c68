//! End-to-end binder scenarios: signatures with synthetic parameters,
//! defaults, and variadic tails bound against concrete argument lists.

use iris_binder::{
    bind, ArgShape, BindEnv, BindError, ParamSpec, Signature, StorageCell, StorageRegistry,
    StorageTypeId,
};
use iris_core::{intern, TypeTag, Value};

#[derive(Default)]
struct ReduceScratch {
    best: Option<i64>,
}

fn make_registry() -> (StorageRegistry, StorageTypeId) {
    let registry = StorageRegistry::new();
    let ty = registry.register::<ReduceScratch>("ReduceScratch");
    (registry, ty)
}

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().map(|&v| Value::Int(v)).collect()
}

#[test]
fn test_full_synthetic_signature_plan() {
    let (registry, ty) = make_registry();
    let env = BindEnv::new(&registry).with_context();
    let sig = Signature::new(vec![
        ParamSpec::context("ctx"),
        ParamSpec::storage("scratch", ty),
        ParamSpec::positional("func"),
        ParamSpec::positional("seq"),
    ])
    .unwrap();

    let bound = bind(&sig, &ints(&[10, 20]), &env).unwrap();
    assert_eq!(
        bound.exprs().to_string(),
        "(<context>, <storage:0>, arg[0], arg[1])"
    );
    // Two caller-supplied args, four formal parameters.
    assert_eq!(bound.exprs().len(), 4);
    assert_eq!(bound.shape().len(), 2);
}

#[test]
fn test_each_bind_constructs_its_own_storage() {
    let (registry, ty) = make_registry();
    let env = BindEnv::new(&registry);
    let sig = Signature::new(vec![
        ParamSpec::storage("scratch", ty),
        ParamSpec::positional("a"),
    ])
    .unwrap();

    let first = bind(&sig, &ints(&[1]), &env).unwrap();
    let second = bind(&sig, &ints(&[1]), &env).unwrap();

    first.storage()[0].with(|s: &mut ReduceScratch| s.best = Some(7));
    assert_eq!(
        second.storage()[0].with(|s: &mut ReduceScratch| s.best),
        Some(None)
    );
    assert!(!StorageCell::same_cell(
        &first.storage()[0],
        &second.storage()[0]
    ));
}

#[test]
fn test_defaults_and_variadic_combine() {
    let registry = StorageRegistry::new();
    let env = BindEnv::new(&registry);
    let sig = Signature::new(vec![
        ParamSpec::positional("a"),
        ParamSpec::positional("b").with_default(2i64),
        ParamSpec::variadic("rest"),
    ])
    .unwrap();

    let bound = bind(&sig, &ints(&[1]), &env).unwrap();
    assert_eq!(bound.exprs().to_string(), "(arg[0], 2, arg[1..])");

    let bound = bind(&sig, &ints(&[1, 5]), &env).unwrap();
    assert_eq!(bound.exprs().to_string(), "(arg[0], arg[1], arg[2..])");

    let bound = bind(&sig, &ints(&[1, 5, 6, 7]), &env).unwrap();
    assert_eq!(bound.exprs().to_string(), "(arg[0], arg[1], arg[2..])");
}

#[test]
fn test_fixed_params_claim_before_variadic_collects() {
    let registry = StorageRegistry::new();
    let env = BindEnv::new(&registry);
    let sig = Signature::new(vec![
        ParamSpec::positional("a"),
        ParamSpec::positional("b"),
        ParamSpec::variadic("rest"),
    ])
    .unwrap();

    // Five supplied: the two fixed parameters claim positions 0 and 1,
    // the tail collects the remaining three.
    let bound = bind(&sig, &ints(&[1, 2, 3, 4, 5]), &env).unwrap();
    assert_eq!(bound.exprs().to_string(), "(arg[0], arg[1], arg[2..])");
    assert_eq!(bound.shape().len(), 5);
}

#[test]
fn test_variadic_minimum_still_enforced() {
    let registry = StorageRegistry::new();
    let env = BindEnv::new(&registry);
    let sig = Signature::new(vec![
        ParamSpec::positional("a"),
        ParamSpec::positional("b"),
        ParamSpec::variadic("rest"),
    ])
    .unwrap();

    let err = bind(&sig, &ints(&[1]), &env).unwrap_err();
    match err {
        BindError::ArityMismatch { expected, supplied } => {
            assert_eq!(expected.min, 2);
            assert_eq!(expected.max, None);
            assert_eq!(supplied, 1);
        }
        other => panic!("expected arity mismatch, got {other:?}"),
    }
}

#[test]
fn test_plan_is_positional_not_value_based() {
    let registry = StorageRegistry::new();
    let env = BindEnv::new(&registry);
    let sig = Signature::new(vec![
        ParamSpec::positional("a"),
        ParamSpec::positional("b"),
    ])
    .unwrap();

    let bound_a = bind(&sig, &ints(&[1, 2]), &env).unwrap();
    let bound_b = bind(&sig, &ints(&[300, 400]), &env).unwrap();
    // Same shape, same plan, regardless of payloads.
    assert_eq!(bound_a.exprs(), bound_b.exprs());
    assert_eq!(bound_a.shape(), bound_b.shape());
}

#[test]
fn test_shape_guard_controls_reuse() {
    let registry = StorageRegistry::new();
    let env = BindEnv::new(&registry);
    let sig = Signature::new(vec![
        ParamSpec::positional("a"),
        ParamSpec::positional("b"),
    ])
    .unwrap();

    let bound = bind(&sig, &ints(&[1, 2]), &env).unwrap();
    let shape = bound.shape();

    assert!(shape.matches(&ints(&[9, 9])));
    assert!(!shape.matches(&[Value::Int(1), Value::Float(2.0)]));
    assert!(!shape.matches(&ints(&[1, 2, 3])));
}

#[test]
fn test_distinct_shapes_have_distinct_fingerprints() {
    let int_int = ArgShape::of(&ints(&[1, 2]));
    let int_str = ArgShape::of(&[Value::Int(1), Value::Str(intern("s"))]);
    let int_only = ArgShape::of(&ints(&[1]));

    assert_ne!(int_int, int_str);
    assert_ne!(int_int.packed(), int_str.packed());
    assert_ne!(int_int.packed(), int_only.packed());
}

#[test]
fn test_context_leads_storage_floats() {
    let (registry, ty) = make_registry();
    let env = BindEnv::new(&registry).with_context();

    // Storage after the positionals is legal and still consumes nothing.
    let sig = Signature::new(vec![
        ParamSpec::context("ctx"),
        ParamSpec::positional("a"),
        ParamSpec::storage("scratch", ty),
    ])
    .unwrap();

    let bound = bind(&sig, &ints(&[5]), &env).unwrap();
    assert_eq!(bound.exprs().to_string(), "(<context>, arg[0], <storage:0>)");
    assert_eq!(bound.shape().tags(), &[TypeTag::Int]);
}

#[test]
fn test_rejection_reports_candidate_arity() {
    let registry = StorageRegistry::new();
    let env = BindEnv::new(&registry);
    let sig = Signature::new(vec![
        ParamSpec::positional("a"),
        ParamSpec::positional("b").with_default(0i64),
    ])
    .unwrap();

    let err = bind(&sig, &ints(&[1, 2, 3]), &env).unwrap_err();
    assert_eq!(
        err.to_string(),
        "takes between 1 and 2 arguments but 3 were given"
    );
}
