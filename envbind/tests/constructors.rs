use envbind::{
    Bindable, Binder, ConstructorDescriptor, MapSource, MemberDescriptor, ParamDescriptor,
    TypeHandle, TypeSchema,
};

#[derive(Debug, PartialEq)]
pub struct Endpoint {
    host: String,
    port: u16,
    path: String,
}

impl Endpoint {
    fn path(&self) -> String {
        self.path.clone()
    }

    fn set_path(&mut self, path: String) {
        self.path = path;
    }
}

/// Declares the full constructor first; the parameterless one still wins.
#[derive(Debug)]
pub struct PreferParameterless;

impl Bindable for PreferParameterless {
    fn schema() -> TypeSchema {
        TypeSchema::builder::<Endpoint>()
            .constructor(host_and_port())
            .constructor(ConstructorDescriptor::parameterless(|| Endpoint {
                host: "localhost".to_owned(),
                port: 80,
                path: "/".to_owned(),
            }))
            .member(MemberDescriptor::property("path", Endpoint::path, Endpoint::set_path))
            .build()
    }
}

/// The first constructor needs a type nothing can parse, so the second one
/// is selected.
#[derive(Debug)]
pub struct FirstQualifying;

impl Bindable for FirstQualifying {
    fn schema() -> TypeSchema {
        TypeSchema::builder::<Endpoint>()
            .constructor(ConstructorDescriptor::new(
                vec![ParamDescriptor::new::<Vec<u8>>("raw")],
                |args| {
                    let raw: Vec<u8> = args.take(0)?;
                    Ok(Endpoint {
                        host: String::from_utf8_lossy(&raw).into_owned(),
                        port: 0,
                        path: String::new(),
                    })
                },
            ))
            .constructor(host_and_port())
            .member(MemberDescriptor::property("path", Endpoint::path, Endpoint::set_path))
            .build()
    }
}

fn host_and_port() -> ConstructorDescriptor {
    ConstructorDescriptor::new(
        vec![
            ParamDescriptor::new::<String>("host"),
            ParamDescriptor::new::<u16>("port").default_raw("443"),
        ],
        |args| {
            Ok(Endpoint {
                host: args.take(0)?,
                port: args.take(1)?,
                path: "/".to_owned(),
            })
        },
    )
}

fn source() -> MapSource {
    MapSource::from_iter([
        ("API_HOST", "example.com"),
        ("API_PATH", "/v1"),
        ("API_RAW", "ignored"),
    ])
}

#[test]
fn parameterless_constructor_is_preferred() {
    let binder = Binder::builder().source(source()).build();

    let handle = TypeHandle::of::<PreferParameterless>();
    let instance = binder.bind_type(&handle, Some("api")).unwrap();
    let actual = instance.downcast::<Endpoint>().unwrap();

    assert_eq!(
        *actual,
        Endpoint {
            host: "localhost".to_owned(),
            port: 80,
            path: "/v1".to_owned(),
        }
    );
}

#[test]
fn first_qualifying_constructor_is_selected() {
    let binder = Binder::builder().source(source()).build();

    let handle = TypeHandle::of::<FirstQualifying>();
    let instance = binder.bind_type(&handle, Some("api")).unwrap();
    let actual = instance.downcast::<Endpoint>().unwrap();

    assert_eq!(
        *actual,
        Endpoint {
            host: "example.com".to_owned(),
            port: 443,
            path: "/v1".to_owned(),
        }
    );
}

#[test]
fn bind_reports_a_type_mismatch_for_foreign_schemas() {
    let binder = Binder::builder().source(source()).build();

    let err = binder.bind::<FirstQualifying>(Some("api")).unwrap_err();

    assert!(matches!(
        err,
        envbind::BindError::TypeMismatch { ref key, .. } if key == "api"
    ));
}

#[test]
fn plans_are_keyed_by_handle() {
    let binder = Binder::builder().source(source()).build();

    let first = TypeHandle::of::<FirstQualifying>();
    binder.bind_type(&first, Some("api")).unwrap();
    binder.bind_type(&first, Some("api")).unwrap();
    assert_eq!(binder.plans().len(), 1);

    let plan = binder.plans().get(&first.ty()).unwrap();
    assert_eq!(plan.constructor().params().len(), 2);
    assert_eq!(plan.members().len(), 1);
}
