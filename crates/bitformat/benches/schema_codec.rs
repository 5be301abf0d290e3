use bitformat::{Record, Schema, SchemaBuilder};
use criterion::{Criterion, criterion_group, criterion_main};

fn gen_schema(field_count: usize) -> Schema {
    let mut builder = SchemaBuilder::new();

    for i in 0..field_count {
        builder = match i % 3 {
            0 => builder.uint16(&format!("f{}", i)),
            1 => builder
                .bits(&format!("f{}_hi", i), 3)
                .and_then(|b| b.bits(&format!("f{}_lo", i), 5)),
            _ => builder.uint32(&format!("f{}", i)),
        }
        .unwrap();
    }

    builder.compile().unwrap()
}

fn gen_packet(schema: &Schema, total_bytes: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(total_bytes);

    // Deterministic but non-trivial pattern
    for i in 0..total_bytes {
        data.push((i * 31 % 256) as u8);
    }

    // Trim to exactly what the schema consumes.
    let record = schema.decode(&data).unwrap();
    schema.encode(&record).unwrap()
}

fn bench_schema_codec(c: &mut Criterion) {
    for &field_count in &[1usize, 10, 50, 100] {
        let schema = gen_schema(field_count);
        let packet = gen_packet(&schema, field_count * 4);
        let record: Record = schema.decode(&packet).unwrap();

        c.bench_function(&format!("decode_{}_fields", field_count), |b| {
            b.iter(|| {
                let _ = schema.decode(&packet).unwrap();
            })
        });

        c.bench_function(&format!("encode_{}_fields", field_count), |b| {
            b.iter(|| {
                let _ = schema.encode(&record).unwrap();
            })
        });
    }
}

criterion_group!(benches, bench_schema_codec);
criterion_main!(benches);
