//! End-to-end tests for property defaults across a class hierarchy.
//!
//! Every test builds a registry, instantiates a class through a `Resolver`,
//! and checks the committed property map.

use pretty_assertions::assert_eq;
use specifier::{
    ClassDef, ClassRegistry, Distribution, Error, Priority, PropertyDefault, Resolved, Resolver,
    Specifier, Value, ValueExpr,
};

fn int(v: i64) -> PropertyDefault {
    PropertyDefault::for_value(Value::from(v))
}

fn with_attrs(v: i64, attrs: &[&str]) -> PropertyDefault {
    int(v).with_attributes(attrs).unwrap()
}

/// Foo defaults flubber to -12; Bar extends Foo with `bar_default`.
fn flubber_registry(bar_default: PropertyDefault) -> ClassRegistry {
    let registry = ClassRegistry::new();
    registry
        .define(ClassDef::new("Foo").with_default("flubber", int(-12)))
        .unwrap();
    registry
        .define(ClassDef::new("Bar").extends("Foo").with_default("flubber", bar_default))
        .unwrap();
    registry
}

// ============================================================================
// Replacing and additive defaults
// ============================================================================

#[test]
fn test_base_class_default() {
    let resolver = Resolver::new(flubber_registry(int(7)));
    let foo = resolver.instantiate("Foo", Vec::new()).unwrap();
    assert_eq!(foo.value("flubber"), Some(&Value::Int(-12)));
}

#[test]
fn test_subclass_default_replaces_parent() {
    let resolver = Resolver::new(flubber_registry(int(7)));
    let bar = resolver.instantiate("Bar", Vec::new()).unwrap();
    assert_eq!(bar.value("flubber"), Some(&Value::Int(7)));
}

#[test]
fn test_additive_default_accumulates_parent() {
    let resolver = Resolver::new(flubber_registry(with_attrs(7, &["additive"])));
    let bar = resolver.instantiate("Bar", Vec::new()).unwrap();
    assert_eq!(
        bar.value("flubber"),
        Some(&Value::List(vec![Value::Int(7), Value::Int(-12)]))
    );
    assert_eq!(bar.value("flubber").unwrap().to_string(), "(7, -12)");
}

#[test]
fn test_additive_on_both_levels() {
    let registry = ClassRegistry::new();
    registry
        .define(ClassDef::new("Parent").with_default("foo", with_attrs(1, &["additive"])))
        .unwrap();
    registry
        .define(ClassDef::new("Child").extends("Parent").with_default("foo", with_attrs(2, &["additive"])))
        .unwrap();

    let child = Resolver::new(registry).instantiate("Child", Vec::new()).unwrap();
    assert_eq!(child.value("foo"), Some(&Value::List(vec![Value::Int(2), Value::Int(1)])));
}

#[test]
fn test_additive_default_with_random_part() {
    let registry = ClassRegistry::new();
    registry
        .define(ClassDef::new("A").with_default("p", with_attrs(1, &["additive"])))
        .unwrap();
    registry
        .define(
            ClassDef::new("B").extends("A").with_default(
                "p",
                PropertyDefault::for_value(Distribution::range(0.0, 1.0))
                    .with_attributes(["additive"])
                    .unwrap(),
            ),
        )
        .unwrap();
    let resolver = Resolver::new(registry);

    let b = resolver.instantiate("B", Vec::new()).unwrap();
    assert_eq!(
        b.get("p"),
        Some(&Resolved::Random(Distribution::Tuple(vec![
            Resolved::Random(Distribution::range(0.0, 1.0)),
            Resolved::Concrete(Value::Int(1)),
        ])))
    );
    assert_eq!(b.get("p").map(ToString::to_string).as_deref(), Some("Tuple(Range(0, 1), 1)"));

    let a = resolver.instantiate("A", Vec::new()).unwrap();
    assert_eq!(a.value("p"), Some(&Value::List(vec![Value::Int(1)])));
}

#[test]
fn test_default_reads_other_property() {
    let registry = ClassRegistry::new();
    let length = PropertyDefault::new(["width"], Vec::<String>::new(), |ctx| {
        Ok(ValueExpr::concrete(ctx.value("width")?.as_int().unwrap_or_default() * 3))
    })
    .unwrap();
    registry
        .define(ClassDef::new("Car").with_default("width", int(2)).with_default("length", length))
        .unwrap();

    let car = Resolver::new(registry).instantiate("Car", Vec::new()).unwrap();
    assert_eq!(car.value("length"), Some(&Value::Int(6)));
}

#[test]
fn test_instance_specifier_feeds_default() {
    let registry = ClassRegistry::new();
    let length = PropertyDefault::new(["width"], Vec::<String>::new(), |ctx| {
        Ok(ValueExpr::concrete(ctx.value("width")?.as_int().unwrap_or_default() * 3))
    })
    .unwrap();
    registry
        .define(ClassDef::new("Car").with_default("width", int(2)).with_default("length", length))
        .unwrap();

    let with_width = Specifier::builder("with width")
        .property("width", Priority::INSTANCE, Value::from(5))
        .build()
        .unwrap();
    let car = Resolver::new(registry).instantiate("Car", vec![with_width]).unwrap();
    assert_eq!(car.value("width"), Some(&Value::Int(5)));
    assert_eq!(car.value("length"), Some(&Value::Int(15)));
}

// ============================================================================
// Final defaults
// ============================================================================

fn final_registry() -> ClassRegistry {
    let registry = ClassRegistry::new();
    registry
        .define(ClassDef::new("A").with_default("one", with_attrs(1, &["final"])))
        .unwrap();
    registry
}

#[test]
fn test_final_default_applies() {
    let a = Resolver::new(final_registry()).instantiate("A", Vec::new()).unwrap();
    assert_eq!(a.value("one"), Some(&Value::Int(1)));
}

#[test]
fn test_final_default_cannot_be_overridden() {
    let registry = final_registry();
    registry
        .define(ClassDef::new("B").extends("A").with_default("one", int(2)))
        .unwrap();
    assert!(matches!(registry.validate("B"), Err(Error::FinalOverride { .. })));

    let err = Resolver::new(registry).instantiate("B", Vec::new()).unwrap_err();
    assert!(matches!(err, Error::FinalOverride { ref property } if property == "one"));
    assert_eq!(err.to_string(), "Final override: \"one\" property cannot be overridden");
}

#[test]
fn test_final_property_cannot_be_specified() {
    let resolver = Resolver::new(final_registry());
    let with_one = Specifier::builder("with one")
        .property("one", Priority::INSTANCE, Value::from(2))
        .build()
        .unwrap();
    let err = resolver.instantiate("A", vec![with_one]).unwrap_err();
    assert!(matches!(err, Error::FinalSpecification { ref property, .. } if property == "one"));
    assert!(err.to_string().contains("cannot be directly specified"));
}

#[test]
fn test_final_is_inherited_by_grandchildren() {
    let registry = final_registry();
    registry.define(ClassDef::new("B").extends("A")).unwrap();
    registry
        .define(ClassDef::new("C").extends("B").with_default("one", int(3)))
        .unwrap();
    assert!(matches!(
        Resolver::new(registry).instantiate("C", Vec::new()),
        Err(Error::FinalOverride { .. })
    ));
}

// ============================================================================
// Attributes
// ============================================================================

#[test]
fn test_unknown_attribute() {
    let err = PropertyDefault::new(Vec::<String>::new(), ["additive", "baloney_attr"], |_| {
        Ok(ValueExpr::concrete(0))
    })
    .unwrap_err();
    assert!(matches!(err, Error::UnknownAttributeTag(ref tag) if tag == "baloney_attr"));
}

#[test]
fn test_dynamic_properties_recorded() {
    let registry = ClassRegistry::new();
    registry
        .define(
            ClassDef::new("Mover")
                .with_default("speed", with_attrs(10, &["dynamic"]))
                .with_default("mass", int(3)),
        )
        .unwrap();

    let mover = Resolver::new(registry).instantiate("Mover", Vec::new()).unwrap();
    assert!(mover.is_dynamic("speed"));
    assert!(!mover.is_dynamic("mass"));
    assert_eq!(mover.value("speed"), Some(&Value::Int(10)));
}

#[test]
fn test_unknown_class() {
    let resolver = Resolver::new(ClassRegistry::new());
    assert!(matches!(resolver.instantiate("Ghost", Vec::new()), Err(Error::UnknownClass(_))));
}
