//! Benchmarks for reference assembly generation.
//!
//! Measures a full generation (load, prune, write) over a synthetic module with
//! a few hundred types, each mixing public and hidden members.

extern crate refasm;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use refasm::{
    metadata::method::{Instruction, OpCode},
    prelude::*,
};
use std::hint::black_box;

fn synthetic_module(types: usize) -> Module {
    let mut module = Module::new("Bench.dll");
    module.assembly = Some(AssemblyDef::new("Bench"));

    for i in 0..types {
        let hidden = TypeBuilder::class("Bench.Internal", format!("Detail{i}"))
            .visibility(TypeVisibility::NotPublic)
            .build(&mut module);
        let api = TypeBuilder::class("Bench", format!("Api{i}")).build(&mut module);
        FieldBuilder::new("_detail", TypeSig::Def(hidden))
            .access(MemberAccess::Private)
            .build(&mut module, api);
        for m in 0..8 {
            MethodBuilder::new(format!("Method{m}"))
                .param("value", TypeSig::I4)
                .returns(TypeSig::I4)
                .body(vec![
                    Instruction::simple(OpCode::Ldarg1),
                    Instruction::simple(OpCode::Ret),
                ])
                .build(&mut module, api);
        }

        let value = TypeBuilder::value_type("Bench", format!("Value{i}")).build(&mut module);
        FieldBuilder::new("Public", TypeSig::I8).build(&mut module, value);
        FieldBuilder::new("_hidden", TypeSig::String)
            .access(MemberAccess::Assembly)
            .build(&mut module, value);
    }
    module
}

/// Benchmark generation with the default configuration.
fn bench_generate(c: &mut Criterion) {
    let codec = ImageCodec::new();
    let bytes = codec.to_image(&synthetic_module(200)).unwrap();
    let generator = ReferenceAssemblyGenerator::new(codec, GeneratorConfig::default());

    let mut group = c.benchmark_group("generate");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("default", |b| {
        b.iter(|| {
            let generated = generator.generate(black_box(&bytes)).unwrap();
            black_box(generated)
        });
    });
    group.bench_function("runtime", |b| {
        let runtime = ReferenceAssemblyGenerator::new(codec, GeneratorConfig::runtime());
        b.iter(|| {
            let generated = runtime.generate(black_box(&bytes)).unwrap();
            black_box(generated)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_generate);
criterion_main!(benches);
