use bytemuck::{Pod, Zeroable};

/// Vertex for field meshes. `bend` is the sway weight: 0 at the root, 1 at the tip.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FieldVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub bend: f32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

const BLADE_SEGMENTS: u16 = 4;
const BLADE_HEIGHT: f32 = 0.6;
const BLADE_HALF_WIDTH: f32 = 0.03;

/// Tapered grass blade standing on the origin, facing +Z.
pub fn blade_mesh() -> (Vec<FieldVertex>, Vec<u16>) {
    let normal = [0.0, 0.0, 1.0];
    let mut vertices = Vec::with_capacity(BLADE_SEGMENTS as usize * 2 + 1);

    for i in 0..BLADE_SEGMENTS {
        let t = f32::from(i) / f32::from(BLADE_SEGMENTS);
        let half = BLADE_HALF_WIDTH * (1.0 - t);
        let y = BLADE_HEIGHT * t;
        vertices.push(FieldVertex {
            position: [-half, y, 0.0],
            normal,
            bend: t,
        });
        vertices.push(FieldVertex {
            position: [half, y, 0.0],
            normal,
            bend: t,
        });
    }
    let tip = vertices.len() as u16;
    vertices.push(FieldVertex {
        position: [0.0, BLADE_HEIGHT, 0.0],
        normal,
        bend: 1.0,
    });

    let mut indices = Vec::new();
    for i in 0..BLADE_SEGMENTS - 1 {
        let l0 = i * 2;
        let r0 = l0 + 1;
        let l1 = l0 + 2;
        let r1 = l0 + 3;
        indices.extend_from_slice(&[l0, r0, r1, r1, l1, l0]);
    }
    let last = (BLADE_SEGMENTS - 1) * 2;
    indices.extend_from_slice(&[last, last + 1, tip]);

    (vertices, indices)
}

/// Upright unit-ish quad standing on the origin, facing +Z. The top edge sways.
pub fn plane_mesh() -> (Vec<FieldVertex>, Vec<u16>) {
    let h = 0.25;
    let normal = [0.0, 0.0, 1.0];
    #[rustfmt::skip]
    let vertices = vec![
        FieldVertex { position: [-h, 0.0,   0.0], normal, bend: 0.0 },
        FieldVertex { position: [ h, 0.0,   0.0], normal, bend: 0.0 },
        FieldVertex { position: [ h, 2.0*h, 0.0], normal, bend: 1.0 },
        FieldVertex { position: [-h, 2.0*h, 0.0], normal, bend: 1.0 },
    ];
    (vertices, vec![0, 1, 2, 2, 3, 0])
}

/// Flat ground rectangle on y = 0 centred at the origin.
pub fn ground_mesh(width: f32, depth: f32) -> (Vec<FieldVertex>, Vec<u16>) {
    let (x, z) = (width * 0.5, depth * 0.5);
    let normal = [0.0, 1.0, 0.0];
    #[rustfmt::skip]
    let vertices = vec![
        FieldVertex { position: [-x, 0.0,  z], normal, bend: 0.0 },
        FieldVertex { position: [ x, 0.0,  z], normal, bend: 0.0 },
        FieldVertex { position: [ x, 0.0, -z], normal, bend: 0.0 },
        FieldVertex { position: [-x, 0.0, -z], normal, bend: 0.0 },
    ];
    (vertices, vec![0, 1, 2, 2, 3, 0])
}

/// Unit cube centred at the origin.
pub fn cube_mesh() -> (Vec<Vertex>, Vec<u16>) {
    let p = 0.5_f32;
    #[rustfmt::skip]
    let vertices = vec![
        // +Z face
        Vertex { position: [-p, -p,  p], normal: [0.0, 0.0, 1.0] },
        Vertex { position: [ p, -p,  p], normal: [0.0, 0.0, 1.0] },
        Vertex { position: [ p,  p,  p], normal: [0.0, 0.0, 1.0] },
        Vertex { position: [-p,  p,  p], normal: [0.0, 0.0, 1.0] },
        // -Z face
        Vertex { position: [ p, -p, -p], normal: [0.0, 0.0, -1.0] },
        Vertex { position: [-p, -p, -p], normal: [0.0, 0.0, -1.0] },
        Vertex { position: [-p,  p, -p], normal: [0.0, 0.0, -1.0] },
        Vertex { position: [ p,  p, -p], normal: [0.0, 0.0, -1.0] },
        // +X face
        Vertex { position: [ p, -p,  p], normal: [1.0, 0.0, 0.0] },
        Vertex { position: [ p, -p, -p], normal: [1.0, 0.0, 0.0] },
        Vertex { position: [ p,  p, -p], normal: [1.0, 0.0, 0.0] },
        Vertex { position: [ p,  p,  p], normal: [1.0, 0.0, 0.0] },
        // -X face
        Vertex { position: [-p, -p, -p], normal: [-1.0, 0.0, 0.0] },
        Vertex { position: [-p, -p,  p], normal: [-1.0, 0.0, 0.0] },
        Vertex { position: [-p,  p,  p], normal: [-1.0, 0.0, 0.0] },
        Vertex { position: [-p,  p, -p], normal: [-1.0, 0.0, 0.0] },
        // +Y face
        Vertex { position: [-p,  p,  p], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [ p,  p,  p], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [ p,  p, -p], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [-p,  p, -p], normal: [0.0, 1.0, 0.0] },
        // -Y face
        Vertex { position: [-p, -p, -p], normal: [0.0, -1.0, 0.0] },
        Vertex { position: [ p, -p, -p], normal: [0.0, -1.0, 0.0] },
        Vertex { position: [ p, -p,  p], normal: [0.0, -1.0, 0.0] },
        Vertex { position: [-p, -p,  p], normal: [0.0, -1.0, 0.0] },
    ];
    #[rustfmt::skip]
    let indices: Vec<u16> = vec![
        0,1,2, 2,3,0,       // +Z
        4,5,6, 6,7,4,       // -Z
        8,9,10, 10,11,8,    // +X
        12,13,14, 14,15,12, // -X
        16,17,18, 18,19,16, // +Y
        20,21,22, 22,23,20, // -Y
    ];
    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices_in_range(vertex_count: usize, indices: &[u16]) -> bool {
        indices.len() % 3 == 0 && indices.iter().all(|&i| (i as usize) < vertex_count)
    }

    #[test]
    fn blade_tapers_to_a_tip() {
        let (verts, indices) = blade_mesh();
        assert_eq!(verts.len(), BLADE_SEGMENTS as usize * 2 + 1);
        assert!(indices_in_range(verts.len(), &indices));
        // Root pinned, tip fully bent
        assert_eq!(verts[0].bend, 0.0);
        assert_eq!(verts[0].position[1], 0.0);
        let tip = verts.last().unwrap();
        assert_eq!(tip.bend, 1.0);
        assert_eq!(tip.position, [0.0, BLADE_HEIGHT, 0.0]);
        // Width shrinks with height
        assert!(verts[2].position[0].abs() < verts[0].position[0].abs());
    }

    #[test]
    fn plane_and_ground_are_quads() {
        let (verts, indices) = plane_mesh();
        assert_eq!(verts.len(), 4);
        assert!(indices_in_range(verts.len(), &indices));

        let (verts, indices) = ground_mesh(10.0, 4.0);
        assert!(indices_in_range(verts.len(), &indices));
        assert!(verts.iter().all(|v| v.position[1] == 0.0 && v.bend == 0.0));
        assert!(verts.iter().all(|v| v.position[0].abs() == 5.0 && v.position[2].abs() == 2.0));
    }

    #[test]
    fn cube_has_six_faces() {
        let (verts, indices) = cube_mesh();
        assert_eq!(verts.len(), 24);
        assert_eq!(indices.len(), 36);
        assert!(indices_in_range(verts.len(), &indices));
    }

    #[test]
    fn vertex_layouts_are_tightly_packed() {
        assert_eq!(std::mem::size_of::<FieldVertex>(), 28);
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
    }
}
