use crate::core::bodygraph::classify_bodygraph;
use crate::core::gates::STANDARD_GATE_TABLE;
use crate::core::snapshot::{earth_longitude, position_for};
use crate::core::spheres::build_spheres_from;
use crate::domain::model::{
    BirthRequest, BodyPosition, BodySnapshots, GeocodeInfo, Profile, ProfileMeta, Snapshot,
    UtcInstants,
};
use chrono::{TimeZone, Utc};

fn snapshot(longitudes: [f64; 10]) -> Snapshot {
    let mut positions: Vec<BodyPosition> = longitudes
        .iter()
        .map(|lon| position_for(&STANDARD_GATE_TABLE, *lon).unwrap())
        .collect();
    positions.push(position_for(&STANDARD_GATE_TABLE, earth_longitude(longitudes[0])).unwrap());
    Snapshot::from_tracked(positions.try_into().unwrap())
}

/// 固定黃經組成的假設檔，不依賴星曆
pub fn sample_profile() -> Profile {
    let bodies = BodySnapshots {
        natal: snapshot([
            199.908942, 133.16585, 210.2, 313.0815, 5.5, 100.1, 290.4, 272.9, 286.7, 230.0,
        ]),
        design: snapshot([
            111.9, 24.3, 95.0, 140.6, 60.2, 81.3, 287.8, 271.5, 285.9, 228.8,
        ]),
    };
    let gene_keys = build_spheres_from(&bodies);
    let human_design = Some(classify_bodygraph(&bodies.natal, &bodies.design));

    Profile {
        meta: ProfileMeta {
            input: BirthRequest {
                name: "Sample".to_string(),
                birth_date: Some("1992-10-13".to_string()),
                birth_time: "00:00".to_string(),
                latitude: Some(0.0),
                longitude: Some(0.0),
                timezone: Some("UTC".to_string()),
                ..BirthRequest::default()
            },
            geocode: GeocodeInfo {
                lat: Some(0.0),
                lon: Some(0.0),
                timezone: "UTC".to_string(),
            },
            utc: UtcInstants {
                birth: Utc.with_ymd_and_hms(1992, 10, 13, 0, 0, 0).unwrap(),
                design: Utc.with_ymd_and_hms(1992, 7, 17, 0, 0, 0).unwrap(),
            },
            ephemeris: "fixture".to_string(),
        },
        bodies,
        gene_keys,
        human_design,
    }
}
