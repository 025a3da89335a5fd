use strata_blocks::FaceRole;
use strata_geom::Vec3;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Face {
    PosY = 0,
    NegY = 1,
    PosX = 2,
    NegX = 3,
    PosZ = 4,
    NegZ = 5,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::PosY,
        Face::NegY,
        Face::PosX,
        Face::NegX,
        Face::PosZ,
        Face::NegZ,
    ];

    /// Returns the `[0..6)` index of this face.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the unit-normal vector for this face.
    #[inline]
    pub fn normal(self) -> Vec3 {
        let (dx, dy, dz) = self.delta();
        Vec3::new(dx as f32, dy as f32, dz as f32)
    }

    /// Returns the integer grid delta `(dx,dy,dz)` when stepping out of this face.
    #[inline]
    pub fn delta(self) -> (i32, i32, i32) {
        match self {
            Face::PosY => (0, 1, 0),
            Face::NegY => (0, -1, 0),
            Face::PosX => (1, 0, 0),
            Face::NegX => (-1, 0, 0),
            Face::PosZ => (0, 0, 1),
            Face::NegZ => (0, 0, -1),
        }
    }

    /// Classifies the face into top/bottom/side role for texture lookup.
    #[inline]
    pub fn role(self) -> FaceRole {
        match self {
            Face::PosY => FaceRole::Top,
            Face::NegY => FaceRole::Bottom,
            _ => FaceRole::Side,
        }
    }

    /// Quad corners of this face on the unit block at `(x,y,z)`, ordered
    /// bottom-left, bottom-right, top-right, top-left as seen from outside
    /// (counter-clockwise, so `(b-a)x(c-a)` points along the normal).
    pub fn corners(self, x: f32, y: f32, z: f32) -> [Vec3; 4] {
        let (x1, y1, z1) = (x + 1.0, y + 1.0, z + 1.0);
        match self {
            Face::PosY => [
                Vec3::new(x, y1, z),
                Vec3::new(x, y1, z1),
                Vec3::new(x1, y1, z1),
                Vec3::new(x1, y1, z),
            ],
            Face::NegY => [
                Vec3::new(x, y, z),
                Vec3::new(x1, y, z),
                Vec3::new(x1, y, z1),
                Vec3::new(x, y, z1),
            ],
            Face::PosX => [
                Vec3::new(x1, y, z1),
                Vec3::new(x1, y, z),
                Vec3::new(x1, y1, z),
                Vec3::new(x1, y1, z1),
            ],
            Face::NegX => [
                Vec3::new(x, y, z),
                Vec3::new(x, y, z1),
                Vec3::new(x, y1, z1),
                Vec3::new(x, y1, z),
            ],
            Face::PosZ => [
                Vec3::new(x, y, z1),
                Vec3::new(x1, y, z1),
                Vec3::new(x1, y1, z1),
                Vec3::new(x, y1, z1),
            ],
            Face::NegZ => [
                Vec3::new(x1, y, z),
                Vec3::new(x, y, z),
                Vec3::new(x, y1, z),
                Vec3::new(x1, y1, z),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_wind_toward_normal() {
        for f in Face::ALL {
            let [a, b, c, _] = f.corners(2.0, 3.0, 4.0);
            let n = (b - a).cross(c - a);
            assert!(n.dot(f.normal()) > 0.0, "{f:?} winds inward");
        }
    }

    #[test]
    fn corners_lie_on_face_plane() {
        for f in Face::ALL {
            let (dx, dy, dz) = f.delta();
            let plane = |v: Vec3| match (dx, dy, dz) {
                (1, _, _) => v.x == 1.0,
                (-1, _, _) => v.x == 0.0,
                (_, 1, _) => v.y == 1.0,
                (_, -1, _) => v.y == 0.0,
                (_, _, 1) => v.z == 1.0,
                _ => v.z == 0.0,
            };
            assert!(f.corners(0.0, 0.0, 0.0).into_iter().all(plane), "{f:?}");
        }
    }
}
