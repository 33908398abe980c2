use glam::{Mat4, Vec3};

/// Composes `scale · rotation · translation`.
///
/// `rotation` holds three independent axis angles in degrees and is applied
/// as `Rz · Ry · Rx`.
pub fn compose_transform(scale: Vec3, rotation: Vec3, translate: Vec3) -> Mat4 {
    Mat4::from_scale(scale) * rotation_matrix(rotation) * Mat4::from_translation(translate)
}

/// Rotation matrix for a vector of per-axis angles in degrees.
pub fn rotation_matrix(rotation: Vec3) -> Mat4 {
    Mat4::from_rotation_z(rotation.z.to_radians())
        * Mat4::from_rotation_y(rotation.y.to_radians())
        * Mat4::from_rotation_x(rotation.x.to_radians())
}
