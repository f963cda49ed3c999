//! Boolean clipping of cells against the source volume

use crate::error::Result;
use crate::mesh::Mesh;

/// Volume intersection of two closed meshes
pub trait MeshIntersector {
    /// Intersect `cell` with `source`
    ///
    /// Faces of the result lying on the source surface should keep the
    /// source face material and carry the source UV layers; all other faces
    /// keep the cell's material and get zeroed UVs.
    /// An empty intersection is reported as an error.
    fn intersect(&self, cell: &Mesh, source: &Mesh) -> Result<Mesh>;
}

/// Intersector backed by parry's triangle mesh intersection
#[cfg(feature = "boolean")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ParryIntersector;

/// Intersector that always fails, leaving every cell unclipped
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIntersector;

impl MeshIntersector for NoIntersector {
    fn intersect(&self, _cell: &Mesh, _source: &Mesh) -> Result<Mesh> {
        Err(crate::error::FractureError::BooleanFailed(
            "no boolean backend available".into(),
        ))
    }
}

/// Best available intersector for the enabled features
pub fn default_intersector() -> Box<dyn MeshIntersector> {
    #[cfg(feature = "boolean")]
    {
        Box::new(ParryIntersector)
    }
    #[cfg(not(feature = "boolean"))]
    {
        Box::new(NoIntersector)
    }
}

#[cfg(feature = "boolean")]
mod parry {
    use std::panic::{self, AssertUnwindSafe};

    use glam::{Vec2, Vec3};
    use parry3d::math::{Isometry, Point, Real};
    use parry3d::shape::{TriMesh, TriMeshFlags};
    use parry3d::transformation::intersect_meshes;

    use super::{MeshIntersector, ParryIntersector};
    use crate::error::{FractureError, Result};
    use crate::mesh::{Face, Mesh};

    const PLANE_EPSILON: f32 = 1.0e-4;

    fn to_trimesh(mesh: &Mesh) -> Result<TriMesh> {
        let (indices, _) = mesh.triangles();
        let vertices = mesh
            .positions
            .iter()
            .map(|p| Point::new(p.x as Real, p.y as Real, p.z as Real))
            .collect();
        // intersect_meshes needs the half-edge topology and pseudo-normals
        TriMesh::with_flags(
            vertices,
            indices,
            TriMeshFlags::HALF_EDGE_TOPOLOGY
                | TriMeshFlags::ORIENTED
                | TriMeshFlags::MERGE_DUPLICATE_VERTICES,
        )
        .map_err(|e| FractureError::BooleanFailed(format!("{:?}", e)))
    }

    /// Corner triples of a face's triangles, matching [`Mesh::triangles`]
    fn corner_triangles(face: &Face) -> &'static [[usize; 3]] {
        if face.quad {
            &[[0, 1, 2], [0, 2, 3]]
        } else {
            &[[0, 1, 2]]
        }
    }

    /// Whether `p` lies on triangle `(a, b, c)`
    fn on_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> bool {
        let normal = (b - a).cross(c - a);
        let area2 = normal.length();
        if area2 <= f32::EPSILON {
            return false;
        }
        let n = normal / area2;
        if n.dot(p - a).abs() > PLANE_EPSILON {
            return false;
        }
        // same-side tests against each edge
        [(a, b), (b, c), (c, a)]
            .iter()
            .all(|&(u, v)| (v - u).cross(p - u).dot(n) >= -PLANE_EPSILON)
    }

    /// Barycentric weights of `p` in the plane of `(a, b, c)`
    fn barycentric(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
        let (ab, ac, ap) = (b - a, c - a, p - a);
        let (d00, d01, d11) = (ab.dot(ab), ab.dot(ac), ac.dot(ac));
        let (d20, d21) = (ap.dot(ab), ap.dot(ac));
        let denom = d00 * d11 - d01 * d01;
        if denom.abs() <= f32::EPSILON {
            return Vec3::X;
        }
        let v = (d11 * d20 - d01 * d21) / denom;
        let w = (d00 * d21 - d01 * d20) / denom;
        Vec3::new(1.0 - v - w, v, w)
    }

    /// Source triangle a point lies on
    #[derive(Debug, Clone, Copy, PartialEq)]
    struct SurfaceHit {
        face: usize,
        corners: [usize; 3],
    }

    fn surface_hit(source: &Mesh, p: Vec3) -> Option<SurfaceHit> {
        source.faces.iter().enumerate().find_map(|(face, f)| {
            corner_triangles(f)
                .iter()
                .find(|tri| {
                    let [a, b, c] = tri.map(|k| source.positions[f.verts[k] as usize]);
                    on_triangle(p, a, b, c)
                })
                .map(|&corners| SurfaceHit { face, corners })
        })
    }

    /// UVs at `points` interpolated over the hit source triangle, per layer
    fn surface_uvs(source: &Mesh, hit: SurfaceHit, points: [Vec3; 3], layer: usize) -> [Vec2; 4] {
        let f = &source.faces[hit.face];
        let [a, b, c] = hit.corners.map(|k| source.positions[f.verts[k] as usize]);
        let [ua, ub, uc] = hit.corners.map(|k| source.uv_layers[layer].uvs[hit.face][k]);
        let mut uv = [Vec2::ZERO; 4];
        for (slot, p) in uv.iter_mut().zip(points) {
            let w = barycentric(p, a, b, c);
            *slot = ua * w.x + ub * w.y + uc * w.z;
        }
        uv
    }

    impl MeshIntersector for ParryIntersector {
        fn intersect(&self, cell: &Mesh, source: &Mesh) -> Result<Mesh> {
            let cell_tris = to_trimesh(cell)?;
            let source_tris = to_trimesh(source)?;

            // parry asserts on invalid half-edge topology
            let identity = Isometry::identity();
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                intersect_meshes(&identity, &cell_tris, false, &identity, &source_tris, false)
            }))
            .map_err(|_| FractureError::BooleanFailed("intersection panicked".into()))?
            .map_err(|e| FractureError::BooleanFailed(format!("{:?}", e)))?
            .ok_or_else(|| FractureError::BooleanFailed("empty intersection".into()))?;

            let inner = cell.faces.first().map_or(0, |f| f.material);

            let mut out = source.template();
            for p in result.vertices() {
                out.add_vertex(Vec3::new(p.x as f32, p.y as f32, p.z as f32));
            }
            for &[a, b, c] in result.indices() {
                let points = [a, b, c].map(|v| out.positions[v as usize]);
                let center = (points[0] + points[1] + points[2]) / 3.0;
                let hit = surface_hit(source, center);

                let material = hit.map_or(inner, |h| source.faces[h.face].material);
                let index = out.add_face(Face::tri(a, b, c).with_material(material));
                if let Some(hit) = hit {
                    for layer in 0..out.uv_layers.len() {
                        out.uv_layers[layer].uvs[index] = surface_uvs(source, hit, points, layer);
                    }
                }
            }
            Ok(out)
        }
    }

}
