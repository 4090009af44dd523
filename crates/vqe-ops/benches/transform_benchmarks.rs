//! Benchmarks for fermion-to-qubit transformations.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use vqe_ops::{Encoding, FermionHamiltonian, FermionTerm, FermionToQubit, Transformation, molecules};

/// All number-conserving hopping terms a†ᵢ aⱼ plus their pair interactions on `n` sites.
fn synthetic_hamiltonian(n: u32) -> FermionHamiltonian {
    let mut h = FermionHamiltonian::default();
    for i in 0..n {
        for j in 0..n {
            h.push(FermionTerm::from_pairs(0.1, [(i, true), (j, false)]));
            if i != j {
                h.push(FermionTerm::from_pairs(
                    0.01,
                    [(i, true), (j, true), (j, false), (i, false)],
                ));
            }
        }
    }
    h
}

fn bench_h2(c: &mut Criterion) {
    let h2 = molecules::h2_sto3g().expect("reference Hamiltonian parses");
    let mut group = c.benchmark_group("h2_sto3g");
    for encoding in [Encoding::JordanWigner, Encoding::BravyiKitaev] {
        let t = Transformation::new(encoding);
        group.bench_function(encoding.to_string(), |b| {
            b.iter(|| t.transform(black_box(&h2), 4).expect("transform"));
        });
    }
    group.finish();
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform_scaling");
    for n in [4_u32, 8, 12] {
        let h = synthetic_hamiltonian(n);
        for encoding in [Encoding::JordanWigner, Encoding::BravyiKitaev] {
            let t = Transformation::new(encoding);
            group.bench_with_input(BenchmarkId::new(encoding.to_string(), n), &h, |b, h| {
                b.iter(|| t.transform(black_box(h), n).expect("transform"));
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_h2, bench_scaling);
criterion_main!(benches);
