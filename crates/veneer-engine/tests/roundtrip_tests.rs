//! Integration tests for capture and reconstitution of projections

use std::sync::Arc;

use veneer_engine::{
    ContextSpec, ProjectionError, ProjectionOptions, ProjectionPayload, Projector, TargetSnapshot,
};
use veneer_types::{Object, PropertyAccess, TypeBuilder, TypeHandle, Value, NO_PARAMS};

struct Model {
    class: TypeHandle,
    a: TypeHandle,
    b: TypeHandle,
}

/// Declare and register the same model; each call yields fresh type ids
fn model(projector: &Projector) -> Model {
    let class = TypeBuilder::class("acme.X")
        .field("Name")
        .field("Next")
        .method("Shout", NO_PARAMS, |this, _| {
            let name = this.object()?.get("Name").unwrap_or_default();
            Ok(Value::from(format!("{}!", name)))
        })
        .static_method("Version", NO_PARAMS, |_, _| Ok(Value::from(3)))
        .build()
        .unwrap();
    let a = TypeBuilder::interface("acme.IA")
        .property_sig("Name", PropertyAccess::ReadWrite)
        .build()
        .unwrap();
    let b = TypeBuilder::interface("acme.IB")
        .method_sig("Shout", NO_PARAMS)
        .build()
        .unwrap();
    for ty in [&class, &a, &b] {
        projector.registry().register(ty).unwrap();
    }
    Model { class, a, b }
}

fn instance(model: &Model, name: &str) -> Value {
    let value = Object::alloc(&model.class);
    value.as_object().unwrap().set("Name", name);
    value
}

#[test]
fn test_round_trip_in_process() {
    let projector = Projector::new(ProjectionOptions::isolated());
    let m = model(&projector);

    let original = projector
        .create_projection_in(
            instance(&m, "foo"),
            ContextSpec::Type(m.class.clone()),
            &[m.a.clone(), m.b.clone()],
        )
        .unwrap();
    let json = projector.to_json(&original).unwrap();
    let restored = projector.from_json(&json).unwrap();

    assert!(Arc::ptr_eq(original.proxy_type(), restored.proxy_type()));
    assert_eq!(restored.get("Name").unwrap(), Value::from("foo"));
    assert_eq!(restored.invoke("Shout", &[]).unwrap(), Value::from("foo!"));
    assert!(restored.implements(&m.a) && restored.implements(&m.b));
    assert_eq!(
        restored.interfaces().iter().map(|i| i.id()).collect::<Vec<_>>(),
        vec![m.a.id(), m.b.id()]
    );
}

#[test]
fn test_round_trip_across_registries() {
    let writer = Projector::new(ProjectionOptions::isolated());
    let written = model(&writer);
    let json = writer
        .to_json(
            &writer
                .create_projection(instance(&written, "foo"), &[written.a.clone(), written.b.clone()])
                .unwrap(),
        )
        .unwrap();

    // A second registry holds equally named types under different ids
    let reader = Projector::new(ProjectionOptions::isolated());
    let read = model(&reader);
    assert_ne!(read.class.id(), written.class.id());

    let restored = reader.from_json(&json).unwrap();
    assert_eq!(restored.get("Name").unwrap(), Value::from("foo"));
    assert_eq!(
        restored.proxy_type().context().map(|c| c.id()),
        Some(read.class.id())
    );
    assert!(restored.implements(&read.a));
}

#[test]
fn test_shared_references_survive() {
    let projector = Projector::new(ProjectionOptions::isolated());
    let m = model(&projector);

    let head = instance(&m, "head");
    let tail = instance(&m, "tail");
    head.as_object().unwrap().set("Next", tail.clone());
    tail.as_object().unwrap().set("Next", head.clone());

    let projection = projector.create_projection(head, &[m.a.clone()]).unwrap();
    let restored = projector.reconstitute(&projector.capture(&projection).unwrap()).unwrap();

    let payload = restored.capture().unwrap();
    let TargetSnapshot::Instance(snapshot) = payload.target else {
        panic!("expected an instance snapshot");
    };
    let root = snapshot.restore(projector.registry()).unwrap();
    let next = root.as_object().unwrap().get("Next").unwrap();
    let back = next.as_object().unwrap().get("Next").unwrap();
    assert!(back.same(&root));
}

#[test]
fn test_lazy_target_is_captured_forced() {
    let projector = Projector::new(ProjectionOptions::isolated());
    let m = model(&projector);
    let value = instance(&m, "deferred");

    let interceptor = projector.create_lazy_projection(move || Ok(value));
    let projection = projector.act_like(interceptor, &[m.a.clone()]).unwrap();
    let payload = projection.capture().unwrap();
    assert!(matches!(payload.target, TargetSnapshot::Lazy(_)));

    let restored = projector.reconstitute(&payload).unwrap();
    assert_eq!(restored.get("Name").unwrap(), Value::from("deferred"));
    assert!(Arc::ptr_eq(projection.proxy_type(), restored.proxy_type()));
}

#[test]
fn test_type_level_targets_round_trip() {
    let projector = Projector::new(ProjectionOptions::isolated());
    let m = model(&projector);
    let versioned = TypeBuilder::interface("acme.IVersioned")
        .method_sig("Version", NO_PARAMS)
        .build()
        .unwrap();
    projector.registry().register(&versioned).unwrap();

    let statics = projector
        .act_like(projector.create_static_projection(&m.class), &[versioned.clone()])
        .unwrap();
    let restored = projector.from_json(&projector.to_json(&statics).unwrap()).unwrap();
    assert_eq!(restored.invoke("Version", &[]).unwrap(), Value::from(3));

    let ghost = projector
        .act_like(projector.create_late_bound_projection("acme.Ghost"), &[versioned])
        .unwrap();
    let payload = ghost.capture().unwrap();
    assert_eq!(
        payload.target,
        TargetSnapshot::LateBound {
            type_name: "acme.Ghost".to_string()
        }
    );
    let restored = projector.reconstitute(&payload).unwrap();
    assert!(!restored.is_available());
    assert!(matches!(
        restored.require_available(),
        Err(ProjectionError::TargetUnavailable { name }) if name == "acme.Ghost"
    ));
}

#[test]
fn test_unresolvable_interface_fails() {
    let writer = Projector::new(ProjectionOptions::isolated());
    let m = model(&writer);
    let json = writer
        .to_json(&writer.create_projection(instance(&m, "foo"), &[m.a.clone()]).unwrap())
        .unwrap();

    let mut payload = ProjectionPayload::from_json(&json).unwrap();
    payload.interfaces[0].name = "acme.IMissing".to_string();
    payload.interfaces[0].id = veneer_types::TypeId::from_raw(u32::MAX);
    assert!(matches!(
        writer.reconstitute(&payload),
        Err(ProjectionError::InvalidInterfaceSet { .. })
    ));

    assert!(matches!(
        writer.from_json("not json"),
        Err(ProjectionError::Serialization(_))
    ));
}

#[test]
fn test_round_trip_requires_registered_types() {
    let projector = Projector::new(ProjectionOptions::isolated());
    let m = model(&projector);
    let titled = TypeBuilder::interface("acme.ITitled")
        .property_sig("Name", PropertyAccess::ReadOnly)
        .build()
        .unwrap();

    let projection = projector
        .create_projection(instance(&m, "foo"), &[titled.clone()])
        .unwrap();
    let json = projector.to_json(&projection).unwrap();
    assert!(matches!(
        projector.from_json(&json),
        Err(ProjectionError::InvalidInterfaceSet { .. })
    ));

    projector.registry().register(&titled).unwrap();
    let restored = projector.from_json(&json).unwrap();
    assert!(Arc::ptr_eq(projection.proxy_type(), restored.proxy_type()));
    assert_eq!(restored.get("Name").unwrap(), Value::from("foo"));
}
