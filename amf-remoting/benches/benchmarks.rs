use amf_remoting::packet::{self, Header, Message, Packet};
use amf_remoting::types::{AMFVersion, ClassDefinition, Element, Value};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::rc::Rc;

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

fn sample_packet() -> Packet {
    let def = ClassDefinition::default_with_name("bench.Row".to_string());

    let rows: Vec<Rc<Value>> = (0..100)
        .map(|n| {
            Rc::new(Value::Object(
                vec![
                    Element::new("id", Value::Integer(n)),
                    Element::new("label", Value::String(format!("row-{n}"))),
                    Element::new("weight", Value::Number(n as f64 * 0.5)),
                ],
                Some(def.clone()),
            ))
        })
        .collect();

    Packet {
        version: AMFVersion::AMF3,
        headers: vec![Header {
            name: "Credentials".to_string(),
            must_understand: false,
            value: Rc::new(Value::String("secret".to_string())),
        }],
        messages: vec![Message {
            target_uri: "bench.fetch".to_string(),
            response_uri: "/1".to_string(),
            contents: Rc::new(Value::StrictArray(rows)),
        }],
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    let packet = sample_packet();
    let bytes = packet::write::write_to_bytes(&packet, false).unwrap();

    c.bench_function("encode_packet", |b| {
        b.iter(|| {
            black_box(packet::write::write_to_bytes(black_box(&packet), false).unwrap());
        })
    });

    c.bench_function("decode_packet", |b| {
        b.iter(|| {
            black_box(packet::read::parse(black_box(&bytes)).unwrap());
        })
    });
}
