use glam::Vec2;
use pixbonk::*;
use proptest::prelude::*;

// Half-integer coordinates keep the interval arithmetic exact.
fn coord() -> impl Strategy<Value = f32> {
    (-20i32..=20).prop_map(|v| v as f32 * 0.5)
}

fn extent() -> impl Strategy<Value = f32> {
    (1i32..=8).prop_map(|v| v as f32 * 0.5)
}

fn aabb() -> impl Strategy<Value = Aabb> {
    (coord(), coord(), extent(), extent()).prop_map(|(x, y, hx, hy)| Aabb::new(Vec2::new(x, y), Vec2::new(hx, hy)))
}

fn triangle() -> impl Strategy<Value = Triangle> {
    prop::array::uniform6(-10i32..=10).prop_map(|v| {
        Triangle::new(
            Vec2::new(v[0] as f32, v[1] as f32),
            Vec2::new(v[2] as f32, v[3] as f32),
            Vec2::new(v[4] as f32, v[5] as f32),
        )
    })
}

fn displacement() -> impl Strategy<Value = Vec2> {
    (-40i32..=40, -40i32..=40).prop_map(|(x, y)| Vec2::new(x as f32, y as f32) * 0.25)
}

fn shape() -> impl Strategy<Value = Shape> {
    prop_oneof![aabb().prop_map(Shape::Box), triangle().prop_map(Shape::Triangle)]
}

proptest! {
    #[test]
    fn overlap_is_symmetric_for_boxes(a in aabb(), b in aabb()) {
        let ab = overlap(&a, &Shape::Box(b));
        let ba = overlap(&b, &Shape::Box(a));
        prop_assert_eq!(ab.is_some(), ba.is_some());
        if let (Some(ab), Some(ba)) = (ab, ba) {
            prop_assert!((ab.depth - ba.depth).abs() < 1e-5);
            // Centres level on the chosen axis leave both orders on the low side
            if ab.axis.dot(b.center - a.center) != 0.0 {
                prop_assert_eq!(ab.axis, -ba.axis);
            } else {
                prop_assert_eq!(ab.axis, ba.axis);
            }
        }
    }

    #[test]
    fn zero_displacement_sweep_matches_overlap(a in aabb(), other in shape()) {
        prop_assume!(other.is_well_formed());
        prop_assert_eq!(sweep(&a, &other, Vec2::ZERO), overlap(&a, &other));
    }

    #[test]
    fn minkowski_matches_interval(a in aabb(), b in aabb()) {
        let interval = Narrowphase::overlap_box_box(&a, &b);
        let minkowski = Narrowphase::overlap_box_box_minkowski(&a, &b);
        prop_assert_eq!(interval.is_some(), minkowski.is_some());
        if let (Some(i), Some(m)) = (interval, minkowski) {
            prop_assert!((i.depth - m.depth).abs() < 1e-5);
            prop_assert_eq!(i.axis, m.axis);
        }
    }

    #[test]
    fn sweep_outcome_is_in_range(a in aabb(), other in shape(), d in displacement()) {
        prop_assume!(other.is_well_formed());
        if let Some(hit) = sweep(&a, &other, d) {
            prop_assert!((0.0..=1.0).contains(&hit.time_to_contact));
            prop_assert!(hit.depth >= 0.0);
            prop_assert!((hit.axis.length() - 1.0).abs() < 1e-4);
            if hit.time_to_contact > 0.0 {
                prop_assert_eq!(hit.depth, 0.0);
            }
        }
    }

    #[test]
    fn contact_time_shrinks_as_displacement_grows(
        a in aabb(),
        b in aabb(),
        near in 1i32..=8,
        extra in 1i32..=8,
    ) {
        prop_assume!(a.center != b.center);
        let other = Shape::Box(b);
        let toward = (b.center - a.center) * 0.25;
        let short = sweep(&a, &other, toward * near as f32);
        let long = sweep(&a, &other, toward * (near + extra) as f32);
        if let Some(short) = short {
            prop_assert!(short.time_to_contact <= 1.0);
            prop_assert!(long.is_some());
            let long = long.unwrap();
            prop_assert!(long.time_to_contact <= short.time_to_contact);
            prop_assert!(long.time_to_contact <= 1.0);
        }
    }

    #[test]
    fn resolver_terminates_collision_free(
        walls in prop::collection::vec(prop::bool::weighted(0.25), 120),
        start in (4i32..92, 4i32..76),
        delta in (-24i32..=24, -24i32..=24),
        frac in (0i32..4, 0i32..4),
    ) {
        let rows: Vec<String> = walls
            .chunks(12)
            .map(|row| row.iter().map(|w| if *w { '#' } else { '.' }).collect())
            .collect();
        let grid = TileGrid::from_rows(&rows, 8.0).unwrap();
        let collider = Collider::new(Vec2::ZERO, Vec2::splat(3.0));
        let start = Vec2::new(start.0 as f32, start.1 as f32);
        prop_assume!(!grid.collides(&collider.aabb_at(start)));

        let dest = start
            + Vec2::new(delta.0 as f32, delta.1 as f32)
            + Vec2::new(frac.0 as f32, frac.1 as f32) * 0.25;
        let tentative = KinematicState { position: dest, ..Default::default() };
        let r = resolve_move(start, tentative, &collider, &grid);

        let d = dest.floor().as_ivec2() - start.as_ivec2();
        let manhattan = (d.x.abs() + d.y.abs()) as u32;
        prop_assert!(r.iterations <= manhattan + 1);
        prop_assert!(!grid.collides(&collider.aabb_at(r.state.position)));
        prop_assert!(r.state.position_error.abs().max_element() < 1.0);
        prop_assert_eq!(r.pixel, r.state.position.floor().as_ivec2());
    }
}
