//! Gene Keys overlays: fixed picks of (body, side) from the two snapshots.

use crate::domain::model::{
    Body, BodySnapshots, GeneKeysProfile, Overlay, Side, Snapshot, SphereRecord,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereSource {
    pub overlay: Overlay,
    pub sphere: &'static str,
    pub planet: Body,
    pub mode: Side,
}

const fn sphere(overlay: Overlay, sphere: &'static str, planet: Body, mode: Side) -> SphereSource {
    SphereSource {
        overlay,
        sphere,
        planet,
        mode,
    }
}

// Vocation 與 Core、Brand 與 LifesWork 取同一個位置
pub const SPHERE_MAPPING: [SphereSource; 13] = [
    sphere(Overlay::Activation, "LifesWork", Body::Sun, Side::Natal),
    sphere(Overlay::Activation, "Evolution", Body::Earth, Side::Natal),
    sphere(Overlay::Activation, "Radiance", Body::Sun, Side::Design),
    sphere(Overlay::Activation, "Purpose", Body::Earth, Side::Design),
    sphere(Overlay::Venus, "Attraction", Body::Moon, Side::Design),
    sphere(Overlay::Venus, "IQ", Body::Venus, Side::Natal),
    sphere(Overlay::Venus, "EQ", Body::Mars, Side::Natal),
    sphere(Overlay::Venus, "SQ", Body::Venus, Side::Design),
    sphere(Overlay::Venus, "Core", Body::Mars, Side::Design),
    sphere(Overlay::Pearl, "Culture", Body::Jupiter, Side::Design),
    sphere(Overlay::Pearl, "Pearl", Body::Jupiter, Side::Natal),
    sphere(Overlay::Pearl, "Vocation", Body::Mars, Side::Design),
    sphere(Overlay::Pearl, "Brand", Body::Sun, Side::Natal),
];

pub fn build_spheres(natal: &Snapshot, design: &Snapshot) -> GeneKeysProfile {
    let snapshots = BodySnapshots {
        natal: natal.clone(),
        design: design.clone(),
    };
    build_spheres_from(&snapshots)
}

pub fn build_spheres_from(snapshots: &BodySnapshots) -> GeneKeysProfile {
    let mut profile = GeneKeysProfile::default();
    for source in &SPHERE_MAPPING {
        let position = snapshots.side(source.mode).position(source.planet);
        profile.overlay_mut(source.overlay).push(SphereRecord {
            sphere: source.sphere.to_string(),
            planet: source.planet,
            mode: source.mode,
            gate: position.gate,
            line: position.line,
            sign: position.sign,
            longitude: position.longitude,
        });
    }
    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::snapshot::position_for;
    use crate::core::gates::STANDARD_GATE_TABLE;
    use crate::domain::model::{BodyPosition, TRACKED_BODIES};

    fn snapshot(offset: f64) -> Snapshot {
        let positions: Vec<BodyPosition> = TRACKED_BODIES
            .iter()
            .map(|body| position_for(&STANDARD_GATE_TABLE, offset + body.index() as f64 * 31.0).unwrap())
            .collect();
        Snapshot::from_tracked(positions.try_into().unwrap())
    }

    #[test]
    fn test_overlay_sizes_and_order() {
        let profile = build_spheres(&snapshot(3.0), &snapshot(200.0));

        let names = |overlay| {
            profile
                .overlay(overlay)
                .iter()
                .map(|r| r.sphere.as_str())
                .collect::<Vec<_>>()
        };
        assert_eq!(names(Overlay::Activation), ["LifesWork", "Evolution", "Radiance", "Purpose"]);
        assert_eq!(names(Overlay::Venus), ["Attraction", "IQ", "EQ", "SQ", "Core"]);
        assert_eq!(names(Overlay::Pearl), ["Culture", "Pearl", "Vocation", "Brand"]);
    }

    #[test]
    fn test_records_follow_the_source_snapshot() {
        let natal = snapshot(3.0);
        let design = snapshot(200.0);
        let profile = build_spheres(&natal, &design);

        let radiance = profile.sphere(Overlay::Activation, "Radiance").unwrap();
        let sun = design.position(Body::Sun);
        assert_eq!(radiance.planet, Body::Sun);
        assert_eq!(radiance.mode, Side::Design);
        assert_eq!((radiance.gate, radiance.line), (sun.gate, sun.line));
        assert_eq!(radiance.longitude, sun.longitude);

        let attraction = profile.sphere(Overlay::Venus, "Attraction").unwrap();
        assert_eq!(attraction.gate, design.position(Body::Moon).gate);
    }

    #[test]
    fn test_aliased_spheres_share_positions() {
        let profile = build_spheres(&snapshot(17.0), &snapshot(101.0));

        let vocation = profile.sphere(Overlay::Pearl, "Vocation").unwrap();
        let core = profile.sphere(Overlay::Venus, "Core").unwrap();
        assert_eq!(vocation.code(), core.code());
        assert_eq!(vocation.longitude, core.longitude);

        let brand = profile.sphere(Overlay::Pearl, "Brand").unwrap();
        let lifes_work = profile.sphere(Overlay::Activation, "LifesWork").unwrap();
        assert_eq!(brand.code(), lifes_work.code());
    }

    #[test]
    fn test_activation_draws_from_sun_and_earth() {
        let profile = build_spheres(&snapshot(3.0), &snapshot(200.0));
        let lifes_work = profile.sphere(Overlay::Activation, "LifesWork").unwrap();
        let evolution = profile.sphere(Overlay::Activation, "Evolution").unwrap();
        assert_eq!(lifes_work.planet, Body::Sun);
        assert_eq!(evolution.planet, Body::Earth);
        assert_eq!(evolution.mode, Side::Natal);
    }
}
