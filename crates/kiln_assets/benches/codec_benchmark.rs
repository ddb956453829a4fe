//! Benchmark for the texture and mesh codecs.
//!
//! TARGET: a 1024x1024 RGBA8 texture packs with LZ4 well under 10ms
//!
//! Run with: cargo bench --package kiln_assets --bench codec_benchmark

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use kiln_assets::{
    build_mesh, pack_texture, read_texture_info, unpack_texture_to_vec, CompressionMode, NormalMode,
    TextureInfo, VertexPncvF32,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const SIZE: u32 = 1024;

fn create_test_pixels() -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut pixels = Vec::with_capacity((SIZE * SIZE * 4) as usize);
    for y in 0..SIZE {
        let row: [u8; 4] = [(y % 256) as u8, 64, 128, 255];
        for x in 0..SIZE {
            // Mostly gradient, occasional noise.
            if rng.gen_ratio(1, 16) {
                pixels.extend_from_slice(&rng.gen::<[u8; 4]>());
            } else {
                pixels.extend_from_slice(&[row[0], (x % 256) as u8, row[2], row[3]]);
            }
        }
    }
    pixels
}

fn create_grid_mesh(cells: u32) -> (Vec<VertexPncvF32>, Vec<u32>) {
    let side = cells + 1;
    let vertices = (0..side * side)
        .map(|i| {
            let (x, z) = ((i % side) as f32, (i / side) as f32);
            VertexPncvF32::new(
                [x, (x * 0.3).sin() + (z * 0.2).cos(), z],
                [0.0; 3],
                [1.0; 3],
                [x / cells as f32, z / cells as f32],
            )
        })
        .collect();

    let mut indices = Vec::with_capacity((cells * cells * 6) as usize);
    for z in 0..cells {
        for x in 0..cells {
            let i = z * side + x;
            indices.extend_from_slice(&[i, i + side, i + 1, i + 1, i + side, i + side + 1]);
        }
    }
    (vertices, indices)
}

fn benchmark_texture_pack(c: &mut Criterion) {
    let pixels = create_test_pixels();
    let mut group = c.benchmark_group("texture_pack");
    group.throughput(Throughput::Bytes(pixels.len() as u64));

    for compression in [CompressionMode::None, CompressionMode::Lz4] {
        let info = TextureInfo::rgba8(SIZE, SIZE, "bench.png", compression);
        group.bench_function(compression.name(), |b| {
            b.iter(|| pack_texture(black_box(&info), black_box(&pixels)))
        });
    }

    group.finish();
}

fn benchmark_texture_unpack(c: &mut Criterion) {
    let pixels = create_test_pixels();
    let info = TextureInfo::rgba8(SIZE, SIZE, "bench.png", CompressionMode::Lz4);
    let Ok(file) = pack_texture(&info, &pixels) else {
        return;
    };

    let mut group = c.benchmark_group("texture_unpack");
    group.throughput(Throughput::Bytes(pixels.len() as u64));
    group.bench_function("LZ4", |b| {
        b.iter(|| {
            let info = read_texture_info(black_box(&file));
            info.and_then(|info| unpack_texture_to_vec(&info, file.payload()))
        })
    });
    group.finish();
}

fn benchmark_build_mesh(c: &mut Criterion) {
    let (vertices, indices) = create_grid_mesh(128);
    let mut group = c.benchmark_group("build_mesh");
    group.throughput(Throughput::Elements((indices.len() / 3) as u64));

    for mode in [NormalMode::Flat, NormalMode::Smooth] {
        group.bench_function(format!("{mode:?}"), |b| {
            b.iter(|| {
                let mut vertices = vertices.clone();
                build_mesh(&mut vertices, black_box(&indices), "grid.obj", mode)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_texture_pack, benchmark_texture_unpack, benchmark_build_mesh);
criterion_main!(benches);
