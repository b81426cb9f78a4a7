//! Conversions between the glam types of the public API and the nalgebra
//! types rapier works with.

use rapier3d::na::{Quaternion, Translation3, UnitQuaternion};
use rapier3d::prelude::{Isometry, Point, Real, Vector};

use crate::types::{Quat, Transform, Vec3};

pub fn to_vector(v: Vec3) -> Vector<Real> {
    Vector::new(v.x, v.y, v.z)
}

pub fn to_point(v: Vec3) -> Point<Real> {
    Point::new(v.x, v.y, v.z)
}

pub fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub fn to_rotation(q: Quat) -> UnitQuaternion<Real> {
    UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z))
}

pub fn from_rotation(r: &UnitQuaternion<Real>) -> Quat {
    Quat::from_xyzw(r.i, r.j, r.k, r.w)
}

pub fn to_isometry(t: &Transform) -> Isometry<Real> {
    let p = t.position;
    Isometry::from_parts(Translation3::new(p.x, p.y, p.z), to_rotation(t.rotation))
}

pub fn from_isometry(iso: &Isometry<Real>) -> Transform {
    Transform::new(
        from_vector(&iso.translation.vector),
        from_rotation(&iso.rotation),
    )
}
