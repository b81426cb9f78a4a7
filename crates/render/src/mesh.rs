//! Unit meshes the GPU renderer instances, and the grouping of a frame's
//! instances by mesh.
//!
//! Meshes are unit sized: the box spans `[-0.5, 0.5]` on every axis, the
//! cylinder has radius 1 and spans `[-0.5, 0.5]` on Y. The vertex shader
//! scales them by each instance's `dimensions`, tapering cylinders between
//! their bottom and top radii.

use std::f32::consts::TAU;
use std::ops::Range;

use bytemuck::{Pod, Zeroable};

use crate::gpu_types::{InstanceRaw, SHAPE_BOX};

/// Cylinders with more radial segments than this are drawn with this many.
pub const MAX_SEGMENTS: u32 = 256;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    const fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MeshKey {
    Box,
    Cylinder { segments: u32 },
}

impl MeshKey {
    #[must_use]
    pub fn of(instance: &InstanceRaw) -> Self {
        if instance.shape == SHAPE_BOX {
            MeshKey::Box
        } else {
            MeshKey::Cylinder {
                segments: instance.radial_segments.clamp(3, MAX_SEGMENTS),
            }
        }
    }

    #[must_use]
    pub fn vertices(self) -> Vec<Vertex> {
        match self {
            MeshKey::Box => box_vertices(),
            MeshKey::Cylinder { segments } => cylinder_vertices(segments),
        }
    }
}

/// Instances sharing one mesh, as a range into the sorted instance list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Batch {
    pub key: MeshKey,
    pub instances: Range<u32>,
}

/// Sorts `instances` by mesh, keeping scene order within a mesh, and
/// returns the sorted list with one batch per mesh.
#[must_use]
pub fn batch_instances(instances: &[InstanceRaw]) -> (Vec<InstanceRaw>, Vec<Batch>) {
    let mut sorted = instances.to_vec();
    sorted.sort_by_key(MeshKey::of);

    let mut batches: Vec<Batch> = Vec::new();
    for (i, instance) in sorted.iter().enumerate() {
        let key = MeshKey::of(instance);
        let index = i as u32;
        match batches.last_mut() {
            Some(batch) if batch.key == key => batch.instances.end = index + 1,
            _ => batches.push(Batch {
                key,
                instances: index..index + 1,
            }),
        }
    }
    (sorted, batches)
}

/// 36 vertices, flat normals.
#[must_use]
pub fn box_vertices() -> Vec<Vertex> {
    const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];
    let mut vertices = Vec::with_capacity(36);
    for (normal, u, v) in FACES {
        let corner = |su: f32, sv: f32| {
            let p: [f32; 3] =
                std::array::from_fn(|k| 0.5 * (normal[k] + su * u[k] + sv * v[k]));
            Vertex::new(p, normal)
        };
        let (a, b, c, d) = (
            corner(-1.0, -1.0),
            corner(1.0, -1.0),
            corner(1.0, 1.0),
            corner(-1.0, 1.0),
        );
        vertices.extend_from_slice(&[a, b, c, a, c, d]);
    }
    vertices
}

/// 12 vertices per segment: a side quad and one triangle of each cap. Side
/// normals are horizontal, cap normals vertical; the shader relies on this
/// to tilt side normals of tapered cylinders.
#[must_use]
pub fn cylinder_vertices(segments: u32) -> Vec<Vertex> {
    let segments = segments.clamp(3, MAX_SEGMENTS);
    let ring = |i: u32| {
        let theta = TAU * i as f32 / segments as f32;
        (theta.cos(), theta.sin())
    };
    const UP: [f32; 3] = [0.0, 1.0, 0.0];
    const DOWN: [f32; 3] = [0.0, -1.0, 0.0];

    let mut vertices = Vec::with_capacity(segments as usize * 12);
    for i in 0..segments {
        let (c0, s0) = ring(i);
        let (c1, s1) = ring(i + 1);
        let side = |c: f32, s: f32, y: f32| Vertex::new([c, y, s], [c, 0.0, s]);
        let (b0, b1, t1, t0) = (
            side(c0, s0, -0.5),
            side(c1, s1, -0.5),
            side(c1, s1, 0.5),
            side(c0, s0, 0.5),
        );
        vertices.extend_from_slice(&[b0, b1, t1, b0, t1, t0]);

        vertices.extend_from_slice(&[
            Vertex::new([0.0, 0.5, 0.0], UP),
            Vertex::new([c1, 0.5, s1], UP),
            Vertex::new([c0, 0.5, s0], UP),
            Vertex::new([0.0, -0.5, 0.0], DOWN),
            Vertex::new([c0, -0.5, s0], DOWN),
            Vertex::new([c1, -0.5, s1], DOWN),
        ]);
    }
    vertices
}
