use bastion_crypto::prelude::*;
use bastion_logger::TracingLogger;
use bastion_storage::{MemoryStorage, Metadata, SecureStorage};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use getrandom::fill;
use std::hint::black_box;
use std::sync::Arc;

fn provider(kind: ProviderKind) -> CryptoProvider<MemoryStorage> {
    let config = ProviderConfig::builder().kind(kind).build();
    CryptoProvider::new(config, MemoryStorage::new(), Arc::new(TracingLogger::new()))
}

fn bench_encrypt_decrypt(c: &mut Criterion) {
    let mut group = c.benchmark_group("encrypt_decrypt");
    let rt = tokio::runtime::Runtime::new().unwrap();

    let sizes = [("256B", 256usize), ("4KB", 4 * 1024), ("64KB", 64 * 1024)];
    let ciphers =
        [("aes", CipherAlgorithm::Aes256Gcm), ("chacha", CipherAlgorithm::ChaCha20Poly1305)];

    let engine = provider(ProviderKind::Native);
    let defaults = EncryptionOptions::default();
    rt.block_on(engine.generate_key(32, "bench", KeyPurpose::Encryption, &defaults)).unwrap();

    for (label, size) in sizes {
        let mut data = vec![0u8; size];
        fill(&mut data).expect("System RNG unavailable for benchmark data");
        let data_id = format!("data-{label}");
        rt.block_on(engine.storage().store(&data_id, &data, Metadata::new())).unwrap();

        group.throughput(Throughput::Bytes(size as u64));

        for (name, cipher) in ciphers {
            let options =
                EncryptionOptions::builder().algorithm(cipher).output_id("bench-out").build();

            let encrypt_id = BenchmarkId::new(format!("encrypt_{name}"), label);
            group.bench_with_input(encrypt_id, &data_id, |b, id| {
                b.to_async(&rt).iter(|| async {
                    black_box(engine.encrypt(id, "bench", &options).await.unwrap())
                });
            });

            let sealed = rt.block_on(engine.encrypt(&data_id, "bench", &options)).unwrap();
            let out = EncryptionOptions::builder().output_id("bench-plain").build();
            let decrypt_id = BenchmarkId::new(format!("decrypt_{name}"), label);
            group.bench_with_input(decrypt_id, &sealed, |b, id| {
                b.to_async(&rt).iter(|| async {
                    black_box(engine.decrypt(id, None, &out).await.unwrap())
                });
            });
        }
    }

    group.finish();
}

fn bench_signatures(c: &mut Criterion) {
    let mut group = c.benchmark_group("signatures");
    let rt = tokio::runtime::Runtime::new().unwrap();
    let engine = provider(ProviderKind::Portable);
    let options = EncryptionOptions::builder().output_id("bench-sig").build();

    rt.block_on(engine.storage().store("doc", b"benchmark document", Metadata::new())).unwrap();

    let families =
        [SignatureAlgorithm::EcdsaP256, SignatureAlgorithm::EcdsaP384, SignatureAlgorithm::Ed25519];
    for algorithm in families {
        let defaults = EncryptionOptions::default();
        let pair =
            rt.block_on(engine.generate_signature_key_pair(algorithm, false, &defaults)).unwrap();

        group.bench_function(BenchmarkId::new("sign", algorithm), |b| {
            b.to_async(&rt).iter(|| async {
                black_box(engine.sign_data("doc", &pair.private_id, &options).await.unwrap())
            });
        });

        let sig = rt.block_on(engine.sign_data("doc", &pair.private_id, &options)).unwrap();
        group.bench_function(BenchmarkId::new("verify", algorithm), |b| {
            b.to_async(&rt).iter(|| async {
                let public_id = &pair.public_id;
                black_box(engine.verify_signature(&sig, "doc", public_id, &options).await.unwrap())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encrypt_decrypt, bench_signatures);
criterion_main!(benches);
