use std::str;

use envbind::{Bind, Binder, MapSource, ParseResult};

#[test]
fn with_into_parser() {
    use secrecy::{ExposeSecret, SecretString};

    #[derive(Bind, Debug)]
    pub struct Config {
        #[bind(with = into)]
        api_key: SecretString,
    }

    let actual = temp_env::with_var("API_KEY", Some("definitely-not-an-api-key"), || {
        Binder::new().bind::<Config>(None)
    })
    .unwrap();

    assert_eq!(actual.api_key.expose_secret(), "definitely-not-an-api-key");
}

#[test]
fn with_custom_parser_function() {
    fn frobnicate(s: &str) -> ParseResult<u16> {
        let mut v = s.as_bytes().to_vec();
        v.rotate_left(2);
        let s = str::from_utf8(&v)?;
        s.strip_prefix("0o")
            .ok_or("not an octal".into())
            .and_then(|s| u16::from_str_radix(s, 8).map_err(|e| e.into()))
    }

    #[derive(Bind, Debug, PartialEq)]
    pub struct Config {
        #[bind(with = frobnicate)]
        port: u16,
    }

    let binder = Binder::builder()
        .source(MapSource::from_iter([("SERVER_PORT", "300o")]))
        .build();

    let actual = binder.bind::<Config>(Some("server")).unwrap();

    assert_eq!(Config { port: 24 }, actual);
}

#[test]
fn explicit_parser_overrides_registry() {
    fn hex(s: &str) -> ParseResult<u32> {
        let digits = s.trim_start_matches("0x");
        Ok(u32::from_str_radix(digits, 16)?)
    }

    #[derive(Bind, Debug, Default, PartialEq)]
    #[bind(default)]
    pub struct Colors {
        #[bind(with = hex)]
        background: u32,
        foreground: u32,
    }

    let binder = Binder::builder()
        .source(MapSource::from_iter([
            ("BACKGROUND", "0xff"),
            ("FOREGROUND", "255"),
        ]))
        .build();

    let expected = Colors {
        background: 255,
        foreground: 255,
    };
    let actual = binder.bind::<Colors>(None).unwrap();

    assert_eq!(expected, actual);
}

#[test]
fn collection_types() {
    use foo::baz::Config;
    // simulate module structure
    mod foo {
        pub mod bar {
            use envbind::ParseResult;

            pub fn comma_separated(s: &str) -> ParseResult<Vec<String>> {
                Ok(s.split(',').map(ToOwned::to_owned).collect())
            }
        }

        pub mod baz {
            use envbind::Bind;

            #[derive(Bind, Debug, Default, PartialEq)]
            #[bind(default)]
            pub struct Config {
                #[bind(with = super::bar::comma_separated)]
                pub topics: Vec<String>,
            }
        }
    }

    let binder = Binder::builder()
        .source(MapSource::from_iter([("KAFKA_TOPICS", "a,b,c")]))
        .build();

    let expected = Config {
        topics: vec!["a".to_owned(), "b".to_owned(), "c".to_owned()],
    };
    let actual = binder.bind::<Config>(Some("kafka")).unwrap();

    assert_eq!(expected, actual);

    // The member's parser now serves every type bound by this binder.
    assert!(binder.can_parse(&envbind::TypeInfo::of::<Vec<String>>()));
}

#[test]
fn registered_parsers_apply_to_every_member() {
    use std::net::SocketAddr;

    #[derive(Bind, Debug, PartialEq)]
    pub struct Listener {
        addr: SocketAddr,
        #[bind(default = "127.0.0.1:9090")]
        metrics_addr: SocketAddr,
    }

    let binder = Binder::builder()
        .source(MapSource::from_iter([("LISTENER_ADDR", "0.0.0.0:3000")]))
        .build();
    assert!(!binder.can_parse(&envbind::TypeInfo::of::<SocketAddr>()));
    assert!(binder.register_fn(envbind::from_str::<SocketAddr>));

    let expected = Listener {
        addr: "0.0.0.0:3000".parse().unwrap(),
        metrics_addr: "127.0.0.1:9090".parse().unwrap(),
    };
    let actual = binder.bind::<Listener>(Some("listener")).unwrap();

    assert_eq!(expected, actual);
}
