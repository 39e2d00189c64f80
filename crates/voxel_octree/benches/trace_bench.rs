//! Benchmarks for octree building, ray traversal and full frame rendering.

use std::io::Cursor;
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{DVec3, Vec3};
use voxel_octree::trace::Ray;
use voxel_octree::{
  build, BuildConfig, Camera, DAabb3, FlatOctree, OctreeFormat, Raytracer, RenderConfig,
  SphereWorker,
};

/// Sphere filling most of a unit cube at `vpa` voxels per axis.
fn sphere_tree(vpa: u32, workers: usize) -> FlatOctree {
  let config = BuildConfig::new(DAabb3::cube(DVec3::ZERO, 1.0), vpa, OctreeFormat::Rgba8);
  let pool = (0..workers)
    .map(|_| SphereWorker::new(DVec3::splat(0.5), 0.45, config.voxel_size()).with_max_samples(64))
    .collect();

  let mut out = Cursor::new(Vec::new());
  if let Err(err) = build(pool, &config, &mut out) {
    panic!("bench build failed: {}", err);
  }
  out.set_position(0);
  match FlatOctree::load(&mut out) {
    Ok(tree) => tree,
    Err(err) => panic!("bench load failed: {}", err),
  }
}

fn camera() -> Camera {
  Camera::new(Vec3::new(0.5, 0.5, -1.5), Vec3::splat(0.5), Vec3::Y)
}

/// Build throughput across worker counts.
fn bench_build(c: &mut Criterion) {
  let mut group = c.benchmark_group("build (sphere, vpa 32)");
  for workers in [1usize, 4, 8] {
    group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, &w| {
      b.iter(|| black_box(sphere_tree(32, w)))
    });
  }
  group.finish();
}

/// Single primary ray through the center of the tree.
fn bench_intersect(c: &mut Criterion) {
  let tree = sphere_tree(64, 8);
  let ray = Ray::toward(Vec3::new(0.5, 0.5, -1.5), Vec3::splat(0.5));

  c.bench_function("intersect (sphere vpa 64, center ray)", |b| {
    b.iter(|| black_box(tree.intersect(black_box(&ray), Vec3::ZERO, 1.0, f32::MAX)))
  });
}

/// Full frame, with and without jitter.
fn bench_frame(c: &mut Criterion) {
  let tree = Arc::new(sphere_tree(64, 8));
  let camera = camera();

  let mut group = c.benchmark_group("frame 320x240");
  for jitter in [false, true] {
    let config = RenderConfig {
      jitter,
      ..RenderConfig::default()
    };
    let mut tracer = Raytracer::new(config, Arc::clone(&tree));
    group.bench_function(BenchmarkId::new("jitter", jitter), |b| {
      b.iter(|| {
        tracer.trace(black_box(&camera));
        black_box(tracer.wait())
      })
    });
  }
  group.finish();
}

criterion_group!(benches, bench_build, bench_intersect, bench_frame);
criterion_main!(benches);
