//! Collision - Pairwise car-to-car contact resolution
//!
//! Cars are circles. Overlapping pairs are pushed apart evenly and, when
//! closing, exchange a restitution impulse along the contact normal.

use crate::race_sim::config::SimConfig;
use crate::race_sim::vehicle::VehicleState;

/// Below this squared distance two centres give no usable normal
const MIN_DISTANCE_SQ: f32 = 1e-6;

fn inverse_mass(mass: f32) -> f32 {
    if mass > 0.0 {
        1.0 / mass
    } else {
        0.0
    }
}

/// Resolve one pair. Returns whether they were in contact.
pub fn resolve_pair(a: &mut VehicleState, b: &mut VehicleState, restitution: f32) -> bool {
    let delta = a.position - b.position;
    let dist_sq = delta.norm_squared();
    let min_dist = a.tuning.collision_radius + b.tuning.collision_radius;

    if dist_sq >= min_dist * min_dist || dist_sq <= MIN_DISTANCE_SQ {
        return false;
    }

    let dist = dist_sq.sqrt();
    let normal = delta / dist;
    let correction = normal * ((min_dist - dist) * 0.5);
    a.position += correction;
    b.position -= correction;

    let closing = (a.velocity - b.velocity).dot(&normal);
    if closing > 0.0 {
        return true;
    }

    let (inv_a, inv_b) = (inverse_mass(a.tuning.mass), inverse_mass(b.tuning.mass));
    let inv_sum = inv_a + inv_b;
    if inv_sum <= 0.0 {
        return true;
    }

    let impulse = -(1.0 + restitution) * closing / inv_sum;
    a.velocity += normal * (impulse * inv_a);
    b.velocity -= normal * (impulse * inv_b);
    a.sync_speed();
    b.sync_speed();

    log::debug!("cars {} and {} collided, impulse {:.1}", a.id, b.id, impulse);
    true
}

/// Resolve every overlapping pair once, in index order.
///
/// Returns the number of contacts.
pub fn resolve_collisions(vehicles: &mut [VehicleState], cfg: &SimConfig) -> usize {
    let mut contacts = 0;
    for i in 0..vehicles.len() {
        let (head, tail) = vehicles.split_at_mut(i + 1);
        let a = &mut head[i];
        for b in tail.iter_mut() {
            if resolve_pair(a, b, cfg.restitution) {
                contacts += 1;
            }
        }
    }
    contacts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race_sim::config::VehicleSetup;
    use crate::race_sim::geometry::{vec2, Vec2};
    use crate::race_sim::vehicle::PhysicsTuning;

    fn car(id: u32, position: Vec2, velocity: Vec2) -> VehicleState {
        let cfg = SimConfig::default();
        let tuning = PhysicsTuning::from_setup(VehicleSetup::default(), &cfg);
        let mut state = VehicleState::new(id, format!("Car {id}"), tuning, None, &cfg);
        state.position = position;
        state.velocity = velocity;
        state.sync_speed();
        state
    }

    #[test]
    fn head_on_equal_masses_bounce() {
        let cfg = SimConfig::default();
        let mut cars = vec![
            car(0, vec2(-10.0, 0.0), vec2(100.0, 0.0)),
            car(1, vec2(10.0, 0.0), vec2(-100.0, 0.0)),
        ];

        assert_eq!(resolve_collisions(&mut cars, &cfg), 1);
        assert!((cars[0].velocity.x + 60.0).abs() < 1e-3);
        assert!((cars[1].velocity.x - 60.0).abs() < 1e-3);
        assert!((cars[0].speed - 60.0).abs() < 1e-3);
        // Pushed apart to exactly touching
        assert!(((cars[1].position - cars[0].position).norm() - 36.0).abs() < 1e-3);
    }

    #[test]
    fn separating_pair_only_gets_pushed_apart() {
        let cfg = SimConfig::default();
        let mut cars = vec![
            car(0, vec2(-10.0, 0.0), vec2(-50.0, 0.0)),
            car(1, vec2(10.0, 0.0), vec2(50.0, 0.0)),
        ];

        assert_eq!(resolve_collisions(&mut cars, &cfg), 1);
        assert_eq!(cars[0].velocity, vec2(-50.0, 0.0));
        assert_eq!(cars[1].velocity, vec2(50.0, 0.0));
        assert!(cars[0].position.x < -10.0);
    }

    #[test]
    fn distant_and_coincident_cars_are_ignored() {
        let cfg = SimConfig::default();
        let mut apart = vec![car(0, vec2(0.0, 0.0), Vec2::zeros()), car(1, vec2(40.0, 0.0), Vec2::zeros())];
        assert_eq!(resolve_collisions(&mut apart, &cfg), 0);

        let mut stacked = vec![
            car(0, vec2(5.0, 5.0), vec2(10.0, 0.0)),
            car(1, vec2(5.0, 5.0), vec2(-10.0, 0.0)),
        ];
        assert_eq!(resolve_collisions(&mut stacked, &cfg), 0);
        assert_eq!(stacked[0].position, vec2(5.0, 5.0));
        assert_eq!(stacked[0].velocity, vec2(10.0, 0.0));
    }

    #[test]
    fn massless_car_is_immovable() {
        let cfg = SimConfig::default();
        let mut wall = car(0, vec2(0.0, 0.0), Vec2::zeros());
        wall.tuning.mass = 0.0;
        let mut cars = vec![wall, car(1, vec2(30.0, 0.0), vec2(-100.0, 0.0))];

        assert_eq!(resolve_collisions(&mut cars, &cfg), 1);
        assert_eq!(cars[0].velocity, Vec2::zeros());
        assert!((cars[1].velocity.x - 60.0).abs() < 1e-3);
    }

    #[test]
    fn no_mass_at_all_skips_impulse() {
        let cfg = SimConfig::default();
        let mut a = car(0, vec2(0.0, 0.0), vec2(10.0, 0.0));
        let mut b = car(1, vec2(20.0, 0.0), vec2(-10.0, 0.0));
        a.tuning.mass = 0.0;
        b.tuning.mass = -1.0;

        assert!(resolve_pair(&mut a, &mut b, cfg.restitution));
        assert_eq!(a.velocity, vec2(10.0, 0.0));
        assert_eq!(b.velocity, vec2(-10.0, 0.0));
    }

    #[test]
    fn every_pair_is_visited() {
        let cfg = SimConfig::default();
        let mut cars = vec![
            car(0, vec2(0.0, 0.0), Vec2::zeros()),
            car(1, vec2(20.0, 0.0), Vec2::zeros()),
            car(2, vec2(10.0, 15.0), Vec2::zeros()),
        ];
        assert_eq!(resolve_collisions(&mut cars, &cfg), 3);
    }
}
