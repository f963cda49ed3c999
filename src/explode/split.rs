//! Edge split engine
//!
//! Subdivides faces along particle boundaries so that, once exploded, no
//! face spans the fragments of two particles. Each face gets a 5-bit
//! [`EdgeSplitCase`]; the case selects one of six subdivision patterns.

use std::collections::HashMap;

use glam::Vec2;
use tracing::debug;

use super::assign::FaceAssignment;
use crate::mesh::{Face, Mesh};

/// Additional faces produced by each edge split code
pub const EXTRA_FACES: [usize; 24] = [
    0, //
    0, 0, 2, 0, 1, 2, 2, 0, 2, 1, //
    2, 2, 2, 2, 3, 0, 0, 0, 1, 0, //
    1, 1, 2,
];

/// Per-face split code
///
/// Bits 1, 2, 4, 8 mark the quad edges v1-v2, v2-v3, v3-v4 and v4-v1 whose
/// endpoints belong to different particles. Triangles set bit 16 and use
/// bit 4 for their closing edge v3-v1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeSplitCase(pub u8);

impl EdgeSplitCase {
    /// Code of a face given per-vertex particle labels
    pub fn classify(face: &Face, vertex_labels: &[usize]) -> Self {
        let label = |k: usize| vertex_labels[face.verts[k] as usize];
        let mut code = 0u8;
        if label(0) != label(1) {
            code |= 1;
        }
        if label(1) != label(2) {
            code |= 2;
        }
        if face.quad {
            if label(2) != label(3) {
                code |= 4;
            }
            if label(0) != label(3) {
                code |= 8;
            }
        } else {
            code |= 16;
            if label(0) != label(2) {
                code |= 4;
            }
        }
        Self(code)
    }

    /// Whether the face is a triangle
    #[inline]
    pub fn is_triangle(self) -> bool {
        self.0 & 16 != 0
    }

    /// Number of faces added on top of the source face
    #[inline]
    pub fn extra_faces(self) -> usize {
        EXTRA_FACES[self.0 as usize]
    }

    /// Whether the face is emitted unchanged
    #[inline]
    pub fn is_whole(self) -> bool {
        self.pattern().is_none()
    }

    /// Face-local edges that must be split, as corner index pairs
    ///
    /// Code 15 also lists the v1-v3 diagonal, whose midpoint becomes the
    /// center vertex of the four-way split.
    pub fn split_edges(self) -> impl Iterator<Item = (usize, usize)> {
        let code = self.0;
        let closing = if self.is_triangle() { (0, 2) } else { (2, 3) };
        let candidates = [
            (1u8, (0, 1)),
            (2, (1, 2)),
            (4, closing),
            (8, (0, 3)),
        ];
        let quad_center = (code == 15).then_some((0, 2));
        candidates
            .into_iter()
            .filter(move |(bit, _)| code & bit != 0)
            .map(|(_, edge)| edge)
            .chain(quad_center)
    }

    /// Corner order that maps the case onto its canonical pattern
    fn rotation(self) -> [usize; 4] {
        match self.0 {
            5..=7 => [1, 2, 3, 0],
            9 | 13 => [3, 0, 1, 2],
            12 | 14 => [2, 3, 0, 1],
            19 => [1, 2, 0, 3],
            22 => [2, 0, 1, 3],
            _ => [0, 1, 2, 3],
        }
    }

    fn pattern(self) -> Option<&'static [Fragment]> {
        match self.0 {
            3 | 6 | 9 | 12 => Some(&SPLIT_CORNER),
            5 | 10 => Some(&SPLIT_OPPOSITE),
            15 => Some(&SPLIT_CENTER),
            7 | 11 | 13 | 14 => Some(&SPLIT_THREE_EDGES),
            19 | 21 | 22 => Some(&SPLIT_TRI_CORNER),
            23 => Some(&SPLIT_TRI_CENTER),
            _ => None,
        }
    }
}

/// Corner of a fragment, in rotated face-local indices
#[derive(Debug, Clone, Copy)]
enum Corner {
    /// Original corner
    Vert(usize),
    /// Midpoint vertex of the edge between two corners
    Mid(usize, usize),
}

use Corner::{Mid, Vert};

/// One output face of a subdivision pattern
#[derive(Debug)]
struct Fragment {
    corners: &'static [Corner],
    /// Corner whose particle label the fragment inherits
    owner: usize,
}

static SPLIT_CORNER: [Fragment; 3] = [
    Fragment { corners: &[Vert(0), Mid(0, 1), Mid(1, 2), Vert(2)], owner: 0 },
    Fragment { corners: &[Mid(0, 1), Vert(1), Mid(1, 2)], owner: 1 },
    Fragment { corners: &[Vert(0), Vert(2), Vert(3)], owner: 0 },
];

static SPLIT_OPPOSITE: [Fragment; 2] = [
    Fragment { corners: &[Vert(0), Vert(1), Mid(1, 2), Mid(0, 3)], owner: 0 },
    Fragment { corners: &[Mid(0, 3), Mid(1, 2), Vert(2), Vert(3)], owner: 2 },
];

static SPLIT_CENTER: [Fragment; 4] = [
    Fragment { corners: &[Vert(0), Mid(0, 1), Mid(0, 2), Mid(0, 3)], owner: 0 },
    Fragment { corners: &[Mid(0, 1), Vert(1), Mid(1, 2), Mid(0, 2)], owner: 1 },
    Fragment { corners: &[Mid(0, 2), Mid(1, 2), Vert(2), Mid(2, 3)], owner: 2 },
    Fragment { corners: &[Mid(0, 3), Mid(0, 2), Mid(2, 3), Vert(3)], owner: 3 },
];

static SPLIT_THREE_EDGES: [Fragment; 3] = [
    Fragment { corners: &[Vert(0), Mid(0, 1), Mid(1, 2), Mid(0, 3)], owner: 0 },
    Fragment { corners: &[Mid(0, 1), Vert(1), Mid(1, 2)], owner: 1 },
    Fragment { corners: &[Mid(0, 3), Mid(1, 2), Vert(2), Vert(3)], owner: 3 },
];

static SPLIT_TRI_CORNER: [Fragment; 2] = [
    Fragment { corners: &[Vert(0), Mid(0, 1), Mid(0, 2)], owner: 0 },
    Fragment { corners: &[Mid(0, 1), Vert(1), Vert(2), Mid(0, 2)], owner: 1 },
];

static SPLIT_TRI_CENTER: [Fragment; 3] = [
    Fragment { corners: &[Vert(0), Mid(0, 1), Mid(1, 2), Mid(0, 2)], owner: 0 },
    Fragment { corners: &[Mid(0, 1), Vert(1), Mid(1, 2)], owner: 1 },
    Fragment { corners: &[Mid(0, 2), Mid(1, 2), Vert(2)], owner: 2 },
];

#[inline]
fn edge_key(a: u32, b: u32) -> [u32; 2] {
    [a.min(b), a.max(b)]
}

/// Output of [`split_edges`]
#[derive(Debug, Clone)]
pub struct SplitMesh {
    /// Subdivided mesh
    pub mesh: Mesh,
    /// Particle label of every output face
    pub assignment: FaceAssignment,
    /// Number of distinct edges that received a midpoint vertex
    pub split_edges: usize,
    /// Faces added on top of the input face count
    pub extra_faces: usize,
}

/// Per-vertex labels, written face by face (last writer wins)
///
/// Vertices referenced by no face keep label 0.
pub fn vertex_labels(mesh: &Mesh, assignment: &FaceAssignment) -> Vec<usize> {
    let mut labels = vec![0; mesh.vertex_count()];
    for (face, &label) in mesh.faces.iter().zip(assignment.labels()) {
        for &v in face.corners() {
            labels[v as usize] = label;
        }
    }
    labels
}

/// Subdivide every face whose corners belong to different particles
///
/// Original vertices keep their indices. One midpoint vertex per split edge
/// follows, numbered in first-seen order (face order, then edge order within
/// a face). Faces are emitted in source order, each followed directly by its
/// extra fragments.
pub fn split_edges(mesh: &Mesh, assignment: &FaceAssignment) -> SplitMesh {
    let labels = vertex_labels(mesh, assignment);
    let cases: Vec<EdgeSplitCase> = mesh
        .faces
        .iter()
        .map(|f| EdgeSplitCase::classify(f, &labels))
        .collect();

    // first pass: number the midpoint vertices
    let base = mesh.vertex_count() as u32;
    let mut midpoints: HashMap<[u32; 2], u32> = HashMap::new();
    let mut order: Vec<[u32; 2]> = Vec::new();
    for (face, case) in mesh.faces.iter().zip(&cases).filter(|(_, c)| !c.is_whole()) {
        for (a, b) in case.split_edges() {
            let key = edge_key(face.verts[a], face.verts[b]);
            midpoints.entry(key).or_insert_with(|| {
                order.push(key);
                base + order.len() as u32 - 1
            });
        }
    }

    let extra_faces: usize = cases.iter().map(|c| c.extra_faces()).sum();

    let mut out = mesh.template();
    for v in 0..mesh.vertex_count() {
        out.copy_vertex(mesh, v);
    }
    for &[a, b] in &order {
        let (a, b) = (a as usize, b as usize);
        let index = out.add_vertex(mesh.positions[a].lerp(mesh.positions[b], 0.5)) as usize;
        for (dst, src) in out.vertex_groups.iter_mut().zip(&mesh.vertex_groups) {
            dst.weights[index] = 0.5 * (src.weight(a) + src.weight(b));
        }
    }

    let mut face_labels = Vec::with_capacity(mesh.face_count() + extra_faces);
    for (i, (face, case)) in mesh.faces.iter().zip(&cases).enumerate() {
        let Some(fragments) = case.pattern() else {
            out.copy_face(mesh, i, *face);
            face_labels.push(labels[face.verts[0] as usize]);
            continue;
        };

        let rotation = case.rotation();
        let vert = |k: usize| face.verts[rotation[k]];
        for fragment in fragments {
            let mut verts = [0u32; 4];
            for (slot, corner) in verts.iter_mut().zip(fragment.corners) {
                *slot = match *corner {
                    Vert(k) => vert(k),
                    Mid(a, b) => midpoints[&edge_key(vert(a), vert(b))],
                };
            }
            let piece = if fragment.corners.len() == 4 {
                Face::quad(verts[0], verts[1], verts[2], verts[3])
            } else {
                Face::tri(verts[0], verts[1], verts[2])
            };
            let index = out.copy_face(mesh, i, piece);

            for (dst, src) in out.uv_layers.iter_mut().zip(&mesh.uv_layers) {
                let mut uv = [Vec2::ZERO; 4];
                for (slot, corner) in uv.iter_mut().zip(fragment.corners) {
                    *slot = match *corner {
                        Vert(k) => src.uvs[i][rotation[k]],
                        Mid(a, b) => src.corner_midpoint(i, rotation[a], rotation[b]),
                    };
                }
                dst.uvs[index] = uv;
            }

            face_labels.push(labels[vert(fragment.owner) as usize]);
        }
    }

    debug!(
        "Split {} edges, {} faces -> {} faces",
        order.len(),
        mesh.face_count(),
        out.face_count()
    );

    SplitMesh {
        mesh: out,
        assignment: FaceAssignment::from_labels(face_labels, assignment.particle_count()),
        split_edges: order.len(),
        extra_faces,
    }
}
