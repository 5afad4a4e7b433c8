//! Static colliders (read-only after level load)
//!
//! All tests run in the ground plane (x, z); obstacles are treated as
//! infinitely tall.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObstacleShape {
    Sphere { radius: f32 },
    /// Oriented box: half extents along local x/z, rotated by `yaw`
    Box { half_extents: Vec2, yaw: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub center: Vec3,
    pub shape: ObstacleShape,
}

impl Obstacle {
    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Self { center, shape: ObstacleShape::Sphere { radius } }
    }

    pub fn oriented_box(center: Vec3, half_extents: Vec2, yaw: f32) -> Self {
        Self { center, shape: ObstacleShape::Box { half_extents, yaw } }
    }

    /// Radius of the planar circle enclosing the collider
    pub fn bounding_radius(&self) -> f32 {
        match self.shape {
            ObstacleShape::Sphere { radius } => radius,
            ObstacleShape::Box { half_extents, .. } => half_extents.length(),
        }
    }

    /// Push a circle of `radius` at `point` out of the collider.
    ///
    /// Returns the corrected position (y untouched) or `None` when not overlapping.
    pub fn push_out(&self, point: Vec3, radius: f32) -> Option<Vec3> {
        match self.shape {
            ObstacleShape::Sphere { radius: own } => {
                let delta = Vec2::new(point.x - self.center.x, point.z - self.center.z);
                let reach = own + radius;
                let dist_sq = delta.length_squared();
                if dist_sq >= reach * reach {
                    return None;
                }
                let dist = dist_sq.sqrt();
                let normal = if dist > 1e-5 { delta / dist } else { Vec2::X };
                let out = Vec2::new(self.center.x, self.center.z) + normal * reach;
                Some(Vec3::new(out.x, point.y, out.y))
            }
            ObstacleShape::Box { half_extents, yaw } => {
                let local = self.to_local(point, yaw);
                let closest = local.clamp(-half_extents, half_extents);
                let diff = local - closest;
                let dist_sq = diff.length_squared();
                if dist_sq >= radius * radius {
                    return None;
                }

                let resolved = if dist_sq > 1e-10 {
                    closest + diff / dist_sq.sqrt() * radius
                } else {
                    // Center inside the box: leave along the shallowest axis
                    let pen_x = half_extents.x - local.x.abs();
                    let pen_z = half_extents.y - local.y.abs();
                    if pen_x < pen_z {
                        Vec2::new(sign(local.x) * (half_extents.x + radius), local.y)
                    } else {
                        Vec2::new(local.x, sign(local.y) * (half_extents.y + radius))
                    }
                };
                Some(self.to_world(resolved, yaw, point.y))
            }
        }
    }

    /// First contact along the planar segment `from → to` as a fraction in [0, 1].
    pub fn segment_hit(&self, from: Vec3, to: Vec3) -> Option<f32> {
        match self.shape {
            ObstacleShape::Sphere { radius } => {
                let center = Vec2::new(self.center.x, self.center.z);
                segment_circle(
                    Vec2::new(from.x, from.z),
                    Vec2::new(to.x, to.z),
                    center,
                    radius,
                )
            }
            ObstacleShape::Box { half_extents, yaw } => {
                let a = self.to_local(from, yaw);
                let b = self.to_local(to, yaw);
                segment_aabb(a, b, half_extents)
            }
        }
    }

    fn to_local(&self, point: Vec3, yaw: f32) -> Vec2 {
        let (sin, cos) = yaw.sin_cos();
        let x = point.x - self.center.x;
        let z = point.z - self.center.z;
        Vec2::new(x * cos - z * sin, x * sin + z * cos)
    }

    fn to_world(&self, local: Vec2, yaw: f32, y: f32) -> Vec3 {
        let (sin, cos) = yaw.sin_cos();
        Vec3::new(
            self.center.x + local.x * cos + local.y * sin,
            y,
            self.center.z - local.x * sin + local.y * cos,
        )
    }
}

fn sign(value: f32) -> f32 {
    if value < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Entry parameter of segment `a → b` into a circle; 0 when `a` starts inside.
pub fn segment_circle(a: Vec2, b: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let offset = a - center;
    let c = offset.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }

    let d = b - a;
    let qa = d.length_squared();
    if qa < 1e-12 {
        return None;
    }
    let qb = 2.0 * offset.dot(d);
    let disc = qb * qb - 4.0 * qa * c;
    if disc < 0.0 {
        return None;
    }

    let t = (-qb - disc.sqrt()) / (2.0 * qa);
    (0.0..=1.0).contains(&t).then_some(t)
}

/// Slab test of segment `a → b` against an origin-centered box.
fn segment_aabb(a: Vec2, b: Vec2, half: Vec2) -> Option<f32> {
    let d = b - a;
    let mut t_min = 0.0_f32;
    let mut t_max = 1.0_f32;

    for (start, delta, extent) in [(a.x, d.x, half.x), (a.y, d.y, half.y)] {
        if delta.abs() < 1e-8 {
            if start < -extent || start > extent {
                return None;
            }
            continue;
        }
        let inv = 1.0 / delta;
        let mut t0 = (-extent - start) * inv;
        let mut t1 = (extent - start) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return None;
        }
    }

    Some(t_min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_push_out() {
        let rock = Obstacle::sphere(Vec3::ZERO, 1.0);
        let pushed = rock.push_out(Vec3::new(1.2, 0.0, 0.0), 0.5).expect("overlapping");
        assert!((pushed.x - 1.5).abs() < 1e-5);
        assert!(rock.push_out(Vec3::new(2.0, 0.0, 0.0), 0.5).is_none());
    }

    #[test]
    fn test_box_push_out_respects_rotation() {
        // 4x1 wall rotated 90°: its long side now runs along world x
        let wall = Obstacle::oriented_box(Vec3::ZERO, Vec2::new(0.5, 2.0), std::f32::consts::FRAC_PI_2);
        let pushed = wall.push_out(Vec3::new(1.5, 0.0, 0.7), 0.5).expect("overlapping");
        assert!((pushed.z - 1.0).abs() < 1e-4, "pushed = {:?}", pushed);
        assert!((pushed.x - 1.5).abs() < 1e-4);
        assert!(wall.push_out(Vec3::new(0.0, 0.0, 1.2), 0.5).is_none());
    }

    #[test]
    fn test_center_inside_box_leaves_shallow_side() {
        let crate_box = Obstacle::oriented_box(Vec3::ZERO, Vec2::new(2.0, 1.0), 0.0);
        let pushed = crate_box.push_out(Vec3::new(0.3, 0.0, 0.8), 0.25).expect("inside");
        assert!((pushed.z - 1.25).abs() < 1e-5);
        assert!((pushed.x - 0.3).abs() < 1e-5);
    }

    #[test]
    fn test_segment_hits() {
        let rock = Obstacle::sphere(Vec3::new(5.0, 0.0, 0.0), 1.0);
        let t = rock
            .segment_hit(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0))
            .expect("crosses the rock");
        assert!((t - 0.4).abs() < 1e-5);
        assert!(rock.segment_hit(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0)).is_none());

        let wall = Obstacle::oriented_box(Vec3::new(5.0, 0.0, 0.0), Vec2::new(0.5, 3.0), 0.0);
        let t = wall
            .segment_hit(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0))
            .expect("crosses the wall");
        assert!((t - 0.45).abs() < 1e-5);
        assert!(wall.segment_hit(Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0)).is_none());
    }
}
