use amf_remoting::amf0::read::AMF0Decoder;
use amf_remoting::amf0::write::AMF0Encoder;
use amf_remoting::amf3::read::AMF3Decoder;
use amf_remoting::amf3::write::AMF3Encoder;
use amf_remoting::contract::{binder, AmfContract, AmfEnum, PropertyBag, Registry};
use amf_remoting::errors::{EncodeError, Error, RefTable};
use amf_remoting::packet::{self, Header, Message, Packet};
use amf_remoting::types::{AMFVersion, ClassDefinition, Element, Value};
use amf_remoting::{Codec, CodecOptions};
use enumset::EnumSet;
use nom::Err;
use pretty_assertions::assert_eq;
use std::rc::Rc;

fn amf3_bytes(value: &Rc<Value>) -> Vec<u8> {
    let mut out = vec![];
    AMF3Encoder::default()
        .write_value_element(&mut out, value)
        .expect("Unable to encode value");
    out
}

fn amf3_value(bytes: &[u8]) -> Rc<Value> {
    let (rest, value) = AMF3Decoder::default()
        .parse_single_element(bytes)
        .expect("Unable to decode value");
    assert!(rest.is_empty(), "undecoded bytes: {rest:?}");
    value
}

fn amf0_bytes(value: &Rc<Value>) -> Vec<u8> {
    let mut out = vec![];
    AMF0Encoder::default()
        .write_value(&mut out, value)
        .expect("Unable to encode value");
    out
}

fn amf0_value(bytes: &[u8]) -> Rc<Value> {
    let (rest, value) = AMF0Decoder::default()
        .parse_single_element(bytes)
        .expect("Unable to decode value");
    assert!(rest.is_empty(), "undecoded bytes: {rest:?}");
    value
}

#[test]
fn amf3_integer_one_byte() {
    let bytes = amf3_bytes(&Rc::new(Value::Integer(127)));
    assert_eq!(bytes, [0x04, 0x7F]);
    assert_eq!(*amf3_value(&bytes), Value::Integer(127));
}

#[test]
fn amf3_integer_two_bytes() {
    let bytes = amf3_bytes(&Rc::new(Value::Integer(128)));
    assert_eq!(bytes, [0x04, 0x81, 0x00]);
    assert_eq!(*amf3_value(&bytes), Value::Integer(128));
}

#[test]
fn amf3_integer_boundaries() {
    // (value, encoded length incl. marker)
    let cases: [(i32, usize); 8] = [
        (0, 2),
        (127, 2),
        (128, 3),
        (16383, 3),
        (16384, 4),
        (2097151, 4),
        (2097152, 5),
        (268435455, 5),
    ];
    for (value, len) in cases {
        let bytes = amf3_bytes(&Rc::new(Value::Integer(value)));
        assert_eq!(bytes.len(), len, "length of {value}");
        assert_eq!(*amf3_value(&bytes), Value::Integer(value));
    }

    let bytes = amf3_bytes(&Rc::new(Value::Integer(-268435456)));
    assert_eq!(*amf3_value(&bytes), Value::Integer(-268435456));
}

#[test]
fn amf3_integer_promotes_to_double() {
    let bytes = amf3_bytes(&Rc::new(Value::Integer(268435456)));
    assert_eq!(bytes[0], 0x05);
    assert_eq!(*amf3_value(&bytes), Value::Number(268435456.0));

    let bytes = amf3_bytes(&Rc::new(Value::Integer(-268435457)));
    assert_eq!(bytes[0], 0x05);
    assert_eq!(*amf3_value(&bytes), Value::Number(-268435457.0));
}

#[test]
fn amf3_string_interning() {
    let array = Rc::new(Value::StrictArray(vec![
        Rc::new(Value::String("hi".to_string())),
        Rc::new(Value::String("hi".to_string())),
    ]));

    let bytes = amf3_bytes(&array);
    assert_eq!(bytes, [0x09, 0x05, 0x01, 0x06, 0x05, 0x68, 0x69, 0x06, 0x00]);
    assert_eq!(*amf3_value(&bytes), *array);
}

#[test]
fn amf3_empty_string_never_interned() {
    let array = Rc::new(Value::StrictArray(vec![
        Rc::new(Value::String(String::new())),
        Rc::new(Value::String(String::new())),
    ]));

    let bytes = amf3_bytes(&array);
    // Both empty strings are inline, neither takes a table slot
    assert_eq!(bytes, [0x09, 0x05, 0x01, 0x06, 0x01, 0x06, 0x01]);
    assert_eq!(*amf3_value(&bytes), *array);
}

#[test]
fn amf3_cycle_through_object() {
    let def = ClassDefinition {
        name: "X".to_string(),
        attributes: EnumSet::empty(),
        static_properties: vec!["self".to_string()],
    };
    let root = Rc::new(Value::Object(
        vec![Element::new("self", Value::Reference(0))],
        Some(def),
    ));

    let bytes = amf3_bytes(&root);
    assert_eq!(
        bytes,
        [0x0A, 0x13, 0x03, b'X', 0x09, b's', b'e', b'l', b'f', 0x0A, 0x00]
    );

    let decoded = amf3_value(&bytes);
    assert_eq!(*decoded, *root);
}

#[test]
fn amf3_sharing_is_preserved() {
    let shared = Rc::new(Value::Object(
        vec![Element::new("n", Value::Integer(1))],
        Some(ClassDefinition::default()),
    ));
    let array = Rc::new(Value::StrictArray(vec![
        Rc::clone(&shared),
        Rc::clone(&shared),
    ]));

    let decoded = amf3_value(&amf3_bytes(&array));
    match &*decoded {
        Value::StrictArray(children) => {
            assert_eq!(children.len(), 2);
            assert!(
                Rc::ptr_eq(&children[0], &children[1]),
                "aliased sub-values must stay aliased"
            );
        }
        other => panic!("expected an array, found {other:?}"),
    }
}

#[test]
fn amf3_equal_dates_share_a_slot() {
    let array = Rc::new(Value::StrictArray(vec![
        Rc::new(Value::Date(1e12)),
        Rc::new(Value::Date(1e12)),
    ]));

    let decoded = amf3_value(&amf3_bytes(&array));
    match &*decoded {
        Value::StrictArray(children) => {
            assert!(Rc::ptr_eq(&children[0], &children[1]));
        }
        other => panic!("expected an array, found {other:?}"),
    }
}

#[test]
fn amf3_trait_reuse() {
    let def = ClassDefinition {
        name: "P".to_string(),
        attributes: EnumSet::empty(),
        static_properties: vec!["v".to_string()],
    };
    let array = Rc::new(Value::StrictArray(vec![
        Rc::new(Value::Object(
            vec![Element::new("v", Value::Integer(1))],
            Some(def.clone()),
        )),
        Rc::new(Value::Object(
            vec![Element::new("v", Value::Integer(2))],
            Some(def),
        )),
    ]));

    let bytes = amf3_bytes(&array);
    assert_eq!(
        bytes,
        [
            0x09, 0x05, 0x01, // array, 2 dense, no assoc
            0x0A, 0x13, 0x03, b'P', 0x03, b'v', 0x04, 0x01, // first: inline trait
            0x0A, 0x01, 0x04, 0x02, // second: trait by reference 0
        ]
    );
    assert_eq!(*amf3_value(&bytes), *array);
}

#[test]
fn amf3_trait_reuse_after_many_traits() {
    let mut children = Vec::new();
    for n in 0..130 {
        let def = ClassDefinition {
            name: format!("C{n}"),
            attributes: EnumSet::empty(),
            static_properties: vec!["v".to_string()],
        };
        children.push(Rc::new(Value::Object(
            vec![Element::new("v", Value::Integer(n))],
            Some(def),
        )));
    }
    // Repeat the first class with a fresh object: its trait index needs a
    // multi-byte u29 by now on neither side, only table agreement matters
    children.push(Rc::new(Value::Object(
        vec![Element::new("v", Value::Integer(999))],
        Some(ClassDefinition {
            name: "C0".to_string(),
            attributes: EnumSet::empty(),
            static_properties: vec!["v".to_string()],
        }),
    )));

    let array = Rc::new(Value::StrictArray(children));
    assert_eq!(*amf3_value(&amf3_bytes(&array)), *array);
}

#[test]
fn amf3_ecma_array_round_trip() {
    let array = Rc::new(Value::ECMAArray(
        vec![Rc::new(Value::Integer(1))],
        vec![Element::new("k", Value::String("v".to_string()))],
        1,
    ));
    assert_eq!(*amf3_value(&amf3_bytes(&array)), *array);
}

#[test]
fn amf3_empty_and_singleton_arrays() {
    let empty = Rc::new(Value::StrictArray(vec![]));
    let bytes = amf3_bytes(&empty);
    assert_eq!(bytes, [0x09, 0x01, 0x01]);
    assert_eq!(*amf3_value(&bytes), *empty);

    let single = Rc::new(Value::StrictArray(vec![Rc::new(Value::Bool(true))]));
    let bytes = amf3_bytes(&single);
    assert_eq!(bytes, [0x09, 0x03, 0x01, 0x03]);
    assert_eq!(*amf3_value(&bytes), *single);
}

#[test]
fn amf3_zero_member_sealed_object() {
    let value = Rc::new(Value::Object(
        vec![],
        Some(ClassDefinition::default_with_name("E".to_string())),
    ));
    let bytes = amf3_bytes(&value);
    assert_eq!(bytes, [0x0A, 0x03, 0x03, b'E']);
    assert_eq!(*amf3_value(&bytes), *value);
}

#[test]
fn amf3_xml_markers() {
    let legacy = Rc::new(Value::XML("<a/>".to_string(), true));
    let bytes = amf3_bytes(&legacy);
    assert_eq!(bytes[0], 0x07);
    assert_eq!(*amf3_value(&bytes), *legacy);

    let modern = Rc::new(Value::XML("<a/>".to_string(), false));
    let bytes = amf3_bytes(&modern);
    assert_eq!(bytes[0], 0x0B);
    assert_eq!(*amf3_value(&bytes), *modern);
}

#[test]
fn amf3_byte_array_round_trip() {
    let value = Rc::new(Value::ByteArray(vec![0, 1, 2, 255]));
    let bytes = amf3_bytes(&value);
    assert_eq!(bytes, [0x0C, 0x09, 0x00, 0x01, 0x02, 0xFF]);
    assert_eq!(*amf3_value(&bytes), *value);
}

#[test]
fn amf3_unknown_marker() {
    let result = AMF3Decoder::default().parse_single_element(&[0x0D, 0x01]);
    assert_eq!(result, Err(Err::Error(Error::UnknownMarker(0x0D))));
}

#[test]
fn amf3_truncated_input() {
    let result = AMF3Decoder::default().parse_single_element(&[0x04]);
    assert_eq!(result, Err(Err::Error(Error::UnexpectedEof)));
}

#[test]
fn amf3_invalid_utf8() {
    let result = AMF3Decoder::default().parse_single_element(&[0x06, 0x03, 0xFF]);
    assert_eq!(result, Err(Err::Error(Error::InvalidUtf8)));
}

#[test]
fn amf3_reference_out_of_range() {
    let result = AMF3Decoder::default().parse_single_element(&[0x0A, 0x02]);
    assert_eq!(
        result,
        Err(Err::Error(Error::ReferenceOutOfRange(RefTable::Object, 1)))
    );
}

#[test]
fn amf3_externalizable_is_unsupported() {
    // Inline object, inline trait, external bit set, anonymous class
    let result = AMF3Decoder::default().parse_single_element(&[0x0A, 0x07, 0x01]);
    assert_eq!(
        result,
        Err(Err::Error(Error::Unsupported("externalizable traits")))
    );
}

#[test]
fn amf3_depth_limit() {
    // Arrays of one element nested past the depth bound
    let mut bytes = Vec::new();
    for _ in 0..70 {
        bytes.extend([0x09, 0x03, 0x01]);
    }
    bytes.push(0x01);

    let result = AMF3Decoder::default().parse_single_element(&bytes);
    assert_eq!(result, Err(Err::Error(Error::DepthExceeded)));
}

#[test]
fn amf0_object_sentinel() {
    let value = Rc::new(Value::Object(vec![], None));
    let bytes = amf0_bytes(&value);
    assert_eq!(bytes, [0x03, 0x00, 0x00, 0x09]);
    assert_eq!(*amf0_value(&bytes), *value);
}

#[test]
fn amf0_typed_object_round_trip() {
    let value = Rc::new(Value::Object(
        vec![Element::new("answer", Value::Number(42.0))],
        Some(ClassDefinition::default_with_name("com.Thing".to_string())),
    ));
    assert_eq!(*amf0_value(&amf0_bytes(&value)), *value);
}

#[test]
fn amf0_date_timezone_is_zero() {
    let value = Rc::new(Value::Date(1e12));
    let bytes = amf0_bytes(&value);
    assert_eq!(bytes.len(), 11);
    assert_eq!(&bytes[9..], [0x00, 0x00]);
    assert_eq!(*amf0_value(&bytes), *value);
}

#[test]
fn amf0_long_string_round_trip() {
    let long = "a".repeat(70000);
    let value = Rc::new(Value::String(long));
    let bytes = amf0_bytes(&value);
    assert_eq!(bytes[0], 0x0C);
    assert_eq!(*amf0_value(&bytes), *value);
}

#[test]
fn amf0_ecma_array_round_trip() {
    let value = Rc::new(Value::ECMAArray(
        vec![],
        vec![Element::new("k", Value::Number(1.0))],
        1,
    ));
    assert_eq!(*amf0_value(&amf0_bytes(&value)), *value);
}

#[test]
fn amf0_sharing_is_preserved() {
    let shared = Rc::new(Value::Object(
        vec![Element::new("n", Value::Number(1.0))],
        None,
    ));
    let array = Rc::new(Value::StrictArray(vec![
        Rc::clone(&shared),
        Rc::clone(&shared),
    ]));

    let bytes = amf0_bytes(&array);
    // The second occurrence is a reference to table index 1
    assert_eq!(&bytes[bytes.len() - 3..], [0x07, 0x00, 0x01]);

    let decoded = amf0_value(&bytes);
    match &*decoded {
        Value::StrictArray(children) => {
            assert!(Rc::ptr_eq(&children[0], &children[1]));
        }
        other => panic!("expected an array, found {other:?}"),
    }
}

#[test]
fn amf0_cycle_through_object() {
    let root = Rc::new(Value::Object(
        vec![Element::new("self", Value::Reference(0))],
        None,
    ));

    let bytes = amf0_bytes(&root);
    assert_eq!(*amf0_value(&bytes), *root);
}

#[test]
fn amf0_unknown_marker() {
    let result = AMF0Decoder::default().parse_single_element(&[0x04]);
    assert_eq!(result, Err(Err::Error(Error::UnknownMarker(0x04))));
}

#[test]
fn amf0_bridge_to_amf3() {
    let (rest, value) = AMF0Decoder::default()
        .parse_single_element(&[0x11, 0x01])
        .expect("Unable to decode value");
    assert!(rest.is_empty());
    assert_eq!(*value, Value::Null);
}

#[test]
fn amf0_bridge_disabled() {
    let result = AMF0Decoder::new(None, 64, false).parse_single_element(&[0x11, 0x01]);
    assert_eq!(result, Err(Err::Error(Error::Unsupported("avmplus marker"))));
}

#[test]
fn amf0_bridges_amf3_only_values() {
    let value = Rc::new(Value::ByteArray(vec![1, 2, 3]));
    let mut out = vec![];
    AMF0Encoder::default()
        .write_payload(&mut out, &value, false, true)
        .expect("Unable to encode value");

    assert_eq!(out[0], 0x11);
    assert_eq!(*amf0_value(&out), *value);
}

#[test]
fn amf0_rejects_nested_amf3_only_values() {
    let value = Rc::new(Value::Object(
        vec![Element::new("blob", Value::ByteArray(vec![1]))],
        None,
    ));
    let mut out = vec![];
    let result = AMF0Encoder::default().write_payload(&mut out, &value, false, true);
    assert!(matches!(result, Err(EncodeError::Unsupported(_))));
}

#[test]
fn packet_envelope_bytes() {
    let packet = Packet {
        version: AMFVersion::AMF3,
        headers: vec![],
        messages: vec![Message {
            target_uri: "svc.m".to_string(),
            response_uri: "/1".to_string(),
            contents: Rc::new(Value::Null),
        }],
    };

    let bytes = packet::write::write_to_bytes(&packet, false).expect("Unable to encode packet");
    assert_eq!(
        bytes,
        [
            0x00, 0x03, 0x00, 0x00, 0x00, 0x01, 0x00, 0x05, 0x73, 0x76, 0x63, 0x2E, 0x6D, 0x00,
            0x02, 0x2F, 0x31, 0xFF, 0xFF, 0xFF, 0xFF, 0x01
        ]
    );

    let decoded = packet::read::parse(&bytes).expect("Unable to decode packet");
    assert_eq!(decoded, packet);
}

#[test]
fn packet_exact_lengths_are_honest() {
    let packet = Packet {
        version: AMFVersion::AMF3,
        headers: vec![Header {
            name: "Credentials".to_string(),
            must_understand: true,
            value: Rc::new(Value::String("tok".to_string())),
        }],
        messages: vec![Message {
            target_uri: "svc.m".to_string(),
            response_uri: "/2".to_string(),
            contents: Rc::new(Value::StrictArray(vec![Rc::new(Value::Integer(7))])),
        }],
    };

    let bytes = packet::write::write_to_bytes(&packet, true).expect("Unable to encode packet");
    let decoded = packet::read::parse(&bytes).expect("explicit lengths must verify");
    assert_eq!(decoded, packet);
}

#[test]
fn packet_length_mismatch() {
    let bytes = [
        0x00, 0x03, // version
        0x00, 0x00, // no headers
        0x00, 0x01, // one message
        0x00, 0x01, b'a', // target
        0x00, 0x00, // response
        0x00, 0x00, 0x00, 0x02, // declared length 2
        0x01, // null takes one byte
    ];
    let result = packet::read::parse(&bytes);
    assert_eq!(
        result,
        Err(Err::Error(Error::LengthMismatch {
            declared: 2,
            consumed: 1
        }))
    );
}

#[test]
fn packet_reference_tables_reset_between_bodies() {
    let bytes = [
        0x00, 0x03, // version
        0x00, 0x00, // no headers
        0x00, 0x02, // two messages
        0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, // message 1 envelope
        0x06, 0x05, 0x68, 0x69, // "hi", interned in session 1
        0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, // message 2 envelope
        0x06, 0x00, // string reference 0: must not leak across sessions
    ];
    let result = packet::read::parse(&bytes);
    assert_eq!(
        result,
        Err(Err::Error(Error::ReferenceOutOfRange(RefTable::String, 0)))
    );
}

#[test]
fn packet_amf0_version_round_trip() {
    let packet = Packet {
        version: AMFVersion::AMF0,
        headers: vec![],
        messages: vec![Message {
            target_uri: "svc.echo".to_string(),
            response_uri: "/1".to_string(),
            contents: Rc::new(Value::StrictArray(vec![
                Rc::new(Value::Number(1.0)),
                Rc::new(Value::String("two".to_string())),
            ])),
        }],
    };

    let bytes = packet::write::write_to_bytes(&packet, false).expect("Unable to encode packet");
    let decoded = packet::read::parse(&bytes).expect("Unable to decode packet");
    assert_eq!(decoded, packet);
}

#[test]
fn packet_header_later_same_name_wins() {
    let packet = Packet {
        version: AMFVersion::AMF3,
        headers: vec![
            Header {
                name: "Credentials".to_string(),
                must_understand: false,
                value: Rc::new(Value::String("old".to_string())),
            },
            Header {
                name: "Credentials".to_string(),
                must_understand: false,
                value: Rc::new(Value::String("new".to_string())),
            },
        ],
        messages: vec![],
    };

    let header = packet.header("Credentials").expect("header must resolve");
    assert_eq!(*header.value, Value::String("new".to_string()));
    assert!(packet.header("Nope").is_none());
}

#[test]
fn packet_start_marker_peek() {
    assert!(Codec::is_start_marker(&[0x00, 0x03, 0x00]));
    assert!(Codec::is_start_marker(&[0x00, 0x00]));
    assert!(!Codec::is_start_marker(&[0x03, 0x00]));
    assert!(!Codec::is_start_marker(&[0x00]));
    assert!(!Codec::is_start_marker(&[]));
}

#[test]
fn packet_unknown_version() {
    let result = packet::read::parse(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x00]);
    assert_eq!(result, Err(Err::Error(Error::Unsupported("packet version"))));
}

// --- contract layer -------------------------------------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Role {
    Guest,
    Member,
    Admin,
}

impl AmfEnum for Role {
    fn alias() -> &'static str {
        "auth.Role"
    }

    fn variants() -> &'static [(&'static str, i32)] {
        &[("Guest", 0), ("Member", 1), ("Admin", 10)]
    }

    fn to_wire(self) -> i32 {
        match self {
            Role::Guest => 0,
            Role::Member => 1,
            Role::Admin => 10,
        }
    }

    fn from_wire(value: i32) -> Option<Self> {
        match value {
            0 => Some(Role::Guest),
            1 => Some(Role::Member),
            10 => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct LoginRequest {
    user_id: i32,
    name: String,
    role: Role,
}

impl AmfContract for LoginRequest {
    fn alias() -> &'static str {
        "auth.LoginRequest"
    }

    fn members() -> &'static [&'static str] {
        &["user_id", "name", "role"]
    }

    fn to_bag(&self, _registry: &Registry) -> Result<Vec<Element>, EncodeError> {
        Ok(vec![
            Element::new("user_id", Value::Integer(self.user_id)),
            Element::new("name", Value::String(self.name.clone())),
            Element::new("role", binder::project_enum(self.role)),
        ])
    }

    fn from_bag(bag: &PropertyBag<'_>, _registry: &Registry) -> Result<Self, Error<'static>> {
        Ok(Self {
            user_id: bag.required("user_id")?,
            name: bag.required("name")?,
            role: bag.enum_value("role")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Session {
    id: i32,
    owner: LoginRequest,
}

impl AmfContract for Session {
    fn alias() -> &'static str {
        "auth.Session"
    }

    fn members() -> &'static [&'static str] {
        &["id", "owner"]
    }

    fn to_bag(&self, registry: &Registry) -> Result<Vec<Element>, EncodeError> {
        Ok(vec![
            Element::new("id", Value::Integer(self.id)),
            Element::new("owner", binder::project(&self.owner, registry)?),
        ])
    }

    fn from_bag(bag: &PropertyBag<'_>, registry: &Registry) -> Result<Self, Error<'static>> {
        Ok(Self {
            id: bag.required("id")?,
            owner: bag.record("owner", registry)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Preferences {
    theme: String,
    extras: Vec<Element>,
}

impl AmfContract for Preferences {
    fn alias() -> &'static str {
        "user.Preferences"
    }

    fn members() -> &'static [&'static str] {
        &["theme"]
    }

    fn dynamic() -> bool {
        true
    }

    fn to_bag(&self, _registry: &Registry) -> Result<Vec<Element>, EncodeError> {
        let mut bag = vec![Element::new("theme", Value::String(self.theme.clone()))];
        bag.extend(self.extras.iter().cloned());
        Ok(bag)
    }

    fn from_bag(bag: &PropertyBag<'_>, _registry: &Registry) -> Result<Self, Error<'static>> {
        Ok(Self {
            theme: bag.required("theme")?,
            extras: bag.extras(Self::members()),
        })
    }
}

fn test_registry() -> Registry {
    let mut registry = Registry::new();
    registry.register::<LoginRequest>().unwrap();
    registry.register::<Session>().unwrap();
    registry.register::<Preferences>().unwrap();
    registry.register_enum::<Role>().unwrap();
    registry
}

fn test_codec() -> Codec {
    Codec::new(test_registry(), CodecOptions::default())
}

#[test]
fn record_round_trip() {
    let codec = test_codec();
    let login = LoginRequest {
        user_id: 17,
        name: "amy".to_string(),
        role: Role::Admin,
    };

    let mut out = vec![];
    codec.encode_record(&login, &mut out).expect("Unable to encode record");
    let back: LoginRequest = codec.decode_record(&out).expect("Unable to decode record");
    assert_eq!(back, login);
}

#[test]
fn nested_record_round_trip() {
    let codec = test_codec();
    let session = Session {
        id: 3,
        owner: LoginRequest {
            user_id: 17,
            name: "amy".to_string(),
            role: Role::Member,
        },
    };

    let mut out = vec![];
    codec.encode_record(&session, &mut out).expect("Unable to encode record");
    let back: Session = codec.decode_record(&out).expect("Unable to decode record");
    assert_eq!(back, session);
}

#[test]
fn dynamic_extras_are_retained() {
    let codec = test_codec();
    let prefs = Preferences {
        theme: "dark".to_string(),
        extras: vec![Element::new("beta", Value::Bool(true))],
    };

    let mut out = vec![];
    codec.encode_record(&prefs, &mut out).expect("Unable to encode record");
    let back: Preferences = codec.decode_record(&out).expect("Unable to decode record");
    assert_eq!(back, prefs);
}

#[test]
fn unknown_members_are_dropped() {
    let registry = test_registry();
    let value = Value::Object(
        vec![
            Element::new("user_id", Value::Integer(1)),
            Element::new("name", Value::String("bob".to_string())),
            Element::new("role", Value::Integer(0)),
            Element::new("added_in_v2", Value::String("ignored".to_string())),
        ],
        Some(ClassDefinition::default_with_name("auth.LoginRequest".to_string())),
    );

    let back: LoginRequest = binder::bind(&value, &registry).expect("Unable to bind value");
    assert_eq!(back.name, "bob");
}

#[test]
fn missing_required_member_is_a_contract_violation() {
    let registry = test_registry();
    let value = Value::Object(
        vec![Element::new("user_id", Value::Integer(1))],
        Some(ClassDefinition::default_with_name("auth.LoginRequest".to_string())),
    );

    let result = binder::bind::<LoginRequest>(&value, &registry);
    assert!(matches!(
        result,
        Err(Error::ContractViolation { field, .. }) if field == "name"
    ));
}

#[test]
fn null_into_non_nullable_is_a_contract_violation() {
    let registry = test_registry();
    let value = Value::Object(
        vec![
            Element::new("user_id", Value::Null),
            Element::new("name", Value::String("bob".to_string())),
            Element::new("role", Value::Integer(0)),
        ],
        None,
    );

    let result = binder::bind::<LoginRequest>(&value, &registry);
    assert!(matches!(
        result,
        Err(Error::ContractViolation { field, .. }) if field == "user_id"
    ));
}

#[test]
fn unmapped_enum_value_is_a_contract_violation() {
    assert!(matches!(
        binder::bind_enum::<Role>(&Value::Integer(99)),
        Err(Error::ContractViolation { .. })
    ));
    // Symbolic and numeric forms both bind
    assert_eq!(binder::bind_enum::<Role>(&Value::Integer(10)), Ok(Role::Admin));
    assert_eq!(binder::bind_enum::<Role>(&Value::Number(1.0)), Ok(Role::Member));
    assert_eq!(
        binder::bind_enum::<Role>(&Value::String("Guest".to_string())),
        Ok(Role::Guest)
    );
}

#[test]
fn numeric_narrowing_overflow_is_a_contract_violation() {
    let bag_elements = vec![Element::new("n", Value::Number(1e12))];
    let bag = PropertyBag::new(&bag_elements);
    assert!(matches!(
        bag.required::<i32>("n"),
        Err(Error::ContractViolation { .. })
    ));

    let bag_elements = vec![Element::new("n", Value::Number(1.5))];
    let bag = PropertyBag::new(&bag_elements);
    assert!(matches!(
        bag.required::<i32>("n"),
        Err(Error::ContractViolation { .. })
    ));

    // Widening is fine
    let bag_elements = vec![Element::new("n", Value::Integer(7))];
    let bag = PropertyBag::new(&bag_elements);
    assert_eq!(bag.required::<f64>("n"), Ok(7.0));
}

#[test]
fn unknown_type_alias_fails_decode() {
    // Encoded without a registry, so the alias goes out unchecked
    let value = Rc::new(Value::Object(
        vec![],
        Some(ClassDefinition::default_with_name("nope.Missing".to_string())),
    ));
    let bytes = amf3_bytes(&value);

    let codec = test_codec();
    let result = codec.decode_value(&bytes);
    assert_eq!(
        result,
        Err(Err::Error(Error::UnknownTypeAlias("nope.Missing".to_string())))
    );
}

#[test]
fn unregistered_type_fails_encode() {
    let codec = test_codec();
    let value = Rc::new(Value::Object(
        vec![],
        Some(ClassDefinition::default_with_name("nope.Missing".to_string())),
    ));

    let mut out = vec![];
    let result = codec.encode_value(&value, &mut out);
    assert!(matches!(
        result,
        Err(EncodeError::UnregisteredType(name)) if name == "nope.Missing"
    ));

    struct NotRegistered;
    impl AmfContract for NotRegistered {
        fn members() -> &'static [&'static str] {
            &[]
        }
        fn to_bag(&self, _registry: &Registry) -> Result<Vec<Element>, EncodeError> {
            Ok(vec![])
        }
        fn from_bag(_bag: &PropertyBag<'_>, _registry: &Registry) -> Result<Self, Error<'static>> {
            Ok(Self)
        }
    }

    let mut out = vec![];
    let result = codec.encode_record(&NotRegistered, &mut out);
    assert!(matches!(result, Err(EncodeError::UnregisteredType(_))));
}

#[test]
fn anonymous_bags_bind_without_a_registry_entry() {
    let registry = test_registry();
    let value = Value::Object(
        vec![
            Element::new("user_id", Value::Integer(4)),
            Element::new("name", Value::String("eve".to_string())),
            Element::new("role", Value::Integer(1)),
        ],
        None,
    );

    let back: LoginRequest = binder::bind(&value, &registry).expect("Unable to bind value");
    assert_eq!(back.role, Role::Member);
}

#[test]
fn codec_rejects_trailing_bytes() {
    let codec = test_codec();
    let result = codec.decode_value(&[0x01, 0x01]);
    assert_eq!(
        result,
        Err(Err::Error(Error::LengthMismatch {
            declared: 2,
            consumed: 1
        }))
    );
}

#[test]
fn typed_records_cross_the_packet_envelope() {
    let codec = test_codec();
    let login = LoginRequest {
        user_id: 9,
        name: "zoe".to_string(),
        role: Role::Guest,
    };

    let packet = Packet {
        version: AMFVersion::AMF3,
        headers: vec![],
        messages: vec![Message {
            target_uri: "auth.login".to_string(),
            response_uri: "/1".to_string(),
            contents: binder::project(&login, codec.registry()).expect("Unable to project record"),
        }],
    };

    let bytes = codec.encode_packet(&packet).expect("Unable to encode packet");
    let decoded = codec.decode_packet(&bytes).expect("Unable to decode packet");
    let back: LoginRequest =
        binder::bind(&decoded.messages[0].contents, codec.registry()).expect("Unable to bind value");
    assert_eq!(back, login);
}
