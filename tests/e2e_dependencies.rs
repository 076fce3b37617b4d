//! Dependency ordering, cycle detection, and distribution values.

use pretty_assertions::assert_eq;
use specifier::{
    ClassRegistry, Distribution, Entity, EntityId, Error, Priority, Resolved, Resolver, Specifier,
    SpecifierSet, Value, ValueExpr,
};

fn reads(name: &str, prop: &str, from: &'static str) -> Specifier {
    Specifier::builder(name)
        .property(
            prop,
            Priority::INSTANCE,
            ValueExpr::delayed([from], move |ctx| {
                Ok(ValueExpr::concrete(ctx.value(from)?.as_int().unwrap_or_default() + 1))
            }),
        )
        .build()
        .unwrap()
}

fn fixed(prop: &str, v: impl Into<ValueExpr>) -> Specifier {
    Specifier::builder(format!("with {prop}"))
        .property(prop, Priority::INSTANCE, v)
        .build()
        .unwrap()
}

fn run(specs: Vec<Specifier>) -> (Entity, specifier::Result<specifier::Resolution>) {
    let resolver = Resolver::new(ClassRegistry::new());
    let mut entity = Entity::new(EntityId(7), "Thing");
    let result = resolver.resolve(&mut entity, SpecifierSet::new(specs));
    (entity, result)
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn test_dependency_committed_before_dependent() {
    // "p" sorts before "q" but must wait for it.
    let (entity, result) = run(vec![reads("p from q", "p", "q"), fixed("q", Value::from(41))]);
    let resolution = result.unwrap();
    assert_eq!(resolution.order, vec!["q", "p"]);
    assert_eq!(entity.value("p"), Some(&Value::Int(42)));
}

#[test]
fn test_chain_of_dependencies() {
    let (entity, result) = run(vec![
        reads("a from b", "a", "b"),
        reads("b from c", "b", "c"),
        fixed("c", Value::from(0)),
    ]);
    assert_eq!(result.unwrap().order, vec!["c", "b", "a"]);
    assert_eq!(entity.value("a"), Some(&Value::Int(2)));
}

#[test]
fn test_explicit_dependency_orders_without_reading() {
    let spec = Specifier::builder("after q")
        .property("p", Priority::INSTANCE, Value::from(1))
        .depends_on("q")
        .build()
        .unwrap();
    let (_, result) = run(vec![spec, fixed("q", Value::from(2))]);
    assert_eq!(result.unwrap().order, vec!["q", "p"]);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_circular_dependency() {
    let (entity, result) = run(vec![reads("p from q", "p", "q"), reads("q from p", "q", "p")]);
    let err = result.unwrap_err();
    assert!(matches!(err, Error::CircularDependency { ref cycle } if cycle == &["p", "q", "p"]));
    assert_eq!(err.to_string(), "Circular dependency: p -> q -> p");
    assert!(entity.properties().is_empty());
}

#[test]
fn test_self_dependency() {
    let err = Specifier::builder("p from p")
        .property("p", Priority::INSTANCE, Value::from(1))
        .depends_on("p")
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::SelfDependency { ref property, .. } if property == "p"));
}

#[test]
fn test_missing_dependency() {
    let (_, result) = run(vec![reads("p from ghost", "p", "ghost")]);
    assert!(matches!(
        result,
        Err(Error::MissingDependency { ref property, ref dependency }) if property == "p" && dependency == "ghost"
    ));
}

#[test]
fn test_undeclared_read_fails() {
    let sneaky = Specifier::builder("sneaky")
        .property(
            "p",
            Priority::INSTANCE,
            ValueExpr::delayed(Vec::<String>::new(), |ctx| {
                ctx.value("q").map(|v| ValueExpr::Concrete(v.clone()))
            }),
        )
        .build()
        .unwrap();
    let (entity, result) = run(vec![fixed("q", Value::from(1)), sneaky]);
    assert!(matches!(result, Err(Error::UndeclaredDependency(ref p)) if p == "q"));
    assert!(!entity.is_resolved());
}

// ============================================================================
// Distributions
// ============================================================================

#[test]
fn test_distribution_committed_as_random() {
    let (entity, result) = run(vec![fixed("speed", Distribution::range(1.0, 5.0))]);
    result.unwrap();
    assert_eq!(entity.get("speed"), Some(&Resolved::Random(Distribution::range(1.0, 5.0))));
    assert_eq!(entity.value("speed"), None);
}

#[test]
fn test_degenerate_distribution_collapses() {
    let (entity, result) = run(vec![fixed("speed", Distribution::range(3.0, 3.0))]);
    result.unwrap();
    assert_eq!(entity.value("speed"), Some(&Value::Float(3.0)));
}

#[test]
fn test_invalid_distribution_rejected() {
    let (_, result) = run(vec![fixed("speed", Distribution::range(5.0, 1.0))]);
    assert!(matches!(result, Err(Error::InvalidDistribution(_))));
}

#[test]
fn test_reading_random_dependency_is_type_error() {
    let (_, result) = run(vec![
        fixed("speed", Distribution::normal(0.0, 1.0)),
        reads("boost", "boost", "speed"),
    ]);
    assert!(matches!(result, Err(Error::TypeError { .. })));
}

#[test]
fn test_delayed_value_may_yield_distribution() {
    let spec = Specifier::builder("spread")
        .property(
            "offset",
            Priority::INSTANCE,
            ValueExpr::delayed(["width"], |ctx| {
                let w = ctx.value("width")?.as_float().unwrap_or_default();
                Ok(Distribution::range(-w, w).into())
            }),
        )
        .build()
        .unwrap();
    let (entity, result) = run(vec![spec, fixed("width", Value::from(2.0))]);
    result.unwrap();
    assert!(entity.get("offset").is_some_and(Resolved::is_random));
}
