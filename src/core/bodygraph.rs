//! Channel activation and the type / authority rule tables.

use crate::domain::model::Center::{
    Ajna, Head, Heart, Root, Sacral, SolarPlexus, Spleen, Throat, G,
};
use crate::domain::model::{
    Authority, BodygraphReport, Center, GateDetail, HdType, Side, Snapshot,
};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Channel {
    pub id: &'static str,
    pub gates: (u8, u8),
    pub centers: (Center, Center),
}

const fn channel(id: &'static str, a: u8, b: u8, c1: Center, c2: Center) -> Channel {
    Channel {
        id,
        gates: (a, b),
        centers: (c1, c2),
    }
}

impl Channel {
    pub fn touches(&self, center: Center) -> bool {
        self.centers.0 == center || self.centers.1 == center
    }

    /// Connects the throat directly to a motor center.
    pub fn is_throat_motor(&self) -> bool {
        self.touches(Throat) && (self.centers.0.is_motor() || self.centers.1.is_motor())
    }
}

pub static CHANNELS: [Channel; 36] = [
    channel("1-8", 1, 8, G, Throat),
    channel("2-14", 2, 14, G, Sacral),
    channel("3-60", 3, 60, Sacral, Root),
    channel("4-63", 4, 63, Ajna, Head),
    channel("5-15", 5, 15, Sacral, G),
    channel("6-59", 6, 59, SolarPlexus, Sacral),
    channel("7-31", 7, 31, G, Throat),
    channel("9-52", 9, 52, Sacral, Root),
    channel("10-20", 10, 20, G, Throat),
    channel("10-34", 10, 34, G, Sacral),
    channel("10-57", 10, 57, G, Spleen),
    channel("11-56", 11, 56, Ajna, Throat),
    channel("12-22", 12, 22, Throat, SolarPlexus),
    channel("13-33", 13, 33, G, Throat),
    channel("16-48", 16, 48, Throat, Spleen),
    channel("17-62", 17, 62, Ajna, Throat),
    channel("18-58", 18, 58, Spleen, Root),
    channel("19-49", 19, 49, Root, SolarPlexus),
    channel("20-34", 20, 34, Throat, Sacral),
    channel("20-57", 20, 57, Throat, Spleen),
    channel("21-45", 21, 45, Heart, Throat),
    channel("23-43", 23, 43, Ajna, Throat),
    channel("24-61", 24, 61, Ajna, Head),
    channel("25-51", 25, 51, G, Heart),
    channel("26-44", 26, 44, Heart, Spleen),
    channel("27-50", 27, 50, Sacral, Spleen),
    channel("28-38", 28, 38, Spleen, Root),
    channel("29-46", 29, 46, Sacral, G),
    channel("30-41", 30, 41, SolarPlexus, Root),
    channel("32-54", 32, 54, Spleen, Root),
    channel("34-57", 34, 57, Sacral, Spleen),
    channel("35-36", 35, 36, Throat, SolarPlexus),
    channel("37-40", 37, 40, SolarPlexus, Heart),
    channel("39-55", 39, 55, Root, SolarPlexus),
    channel("42-53", 42, 53, Sacral, Root),
    channel("47-64", 47, 64, Ajna, Head),
];

/// What the type and authority rules look at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Definition {
    pub channels: Vec<&'static Channel>,
    pub centers: BTreeSet<Center>,
}

impl Definition {
    pub fn has(&self, center: Center) -> bool {
        self.centers.contains(&center)
    }

    pub fn throat_has_motor(&self) -> bool {
        self.channels.iter().any(|c| c.is_throat_motor())
    }

    /// Defined centers ordered by display name.
    pub fn sorted_centers(&self) -> Vec<Center> {
        let mut centers: Vec<Center> = self.centers.iter().copied().collect();
        centers.sort_by_key(|c| c.name());
        centers
    }
}

type Rule<T> = (fn(&Definition) -> bool, T);

// 依序比對，第一條成立者勝出
const TYPE_RULES: [Rule<HdType>; 5] = [
    (|d| d.centers.is_empty(), HdType::Reflector),
    (
        |d| d.has(Sacral) && d.throat_has_motor(),
        HdType::ManifestingGenerator,
    ),
    (|d| d.has(Sacral), HdType::Generator),
    (|d| d.throat_has_motor(), HdType::Manifestor),
    (|_| true, HdType::Projector),
];

const AUTHORITY_RULES: [Rule<Authority>; 6] = [
    (|d| d.has(SolarPlexus), Authority::Emotional),
    (|d| d.has(Sacral), Authority::Sacral),
    (|d| d.has(Spleen), Authority::Splenic),
    (|d| d.has(Heart), Authority::Ego),
    (|d| d.has(G) && d.has(Throat), Authority::SelfProjected),
    (|_| true, Authority::Environmental),
];

fn first_match<T: Copy>(rules: &[Rule<T>], definition: &Definition, fallback: T) -> T {
    rules
        .iter()
        .find(|(applies, _)| applies(definition))
        .map(|(_, value)| *value)
        .unwrap_or(fallback)
}

/// Gates present on any body of either snapshot.
pub fn active_gates(natal: &Snapshot, design: &Snapshot) -> BTreeSet<u8> {
    natal
        .iter()
        .chain(design.iter())
        .map(|(_, position)| position.gate)
        .collect()
}

pub fn define(active: &BTreeSet<u8>) -> Definition {
    let mut definition = Definition::default();
    for channel in &CHANNELS {
        if active.contains(&channel.gates.0) && active.contains(&channel.gates.1) {
            definition.centers.insert(channel.centers.0);
            definition.centers.insert(channel.centers.1);
            definition.channels.push(channel);
        }
    }
    definition
}

pub fn hd_type(definition: &Definition) -> HdType {
    first_match(&TYPE_RULES, definition, HdType::Projector)
}

pub fn authority(definition: &Definition) -> Authority {
    first_match(&AUTHORITY_RULES, definition, Authority::Environmental)
}

fn gate_details(natal: &Snapshot, design: &Snapshot) -> Vec<GateDetail> {
    [(Side::Natal, natal), (Side::Design, design)]
        .into_iter()
        .flat_map(|(side, snapshot)| {
            snapshot.iter().map(move |(planet, position)| GateDetail {
                side,
                planet,
                gate: position.gate,
                line: position.line,
                sign: position.sign,
                longitude: position.longitude,
            })
        })
        .collect()
}

pub fn classify_bodygraph(natal: &Snapshot, design: &Snapshot) -> BodygraphReport {
    let definition = define(&active_gates(natal, design));
    let hd_type = hd_type(&definition);
    let authority = authority(&definition);

    tracing::debug!(
        channels = definition.channels.len(),
        centers = definition.centers.len(),
        hd_type = hd_type.name(),
        "bodygraph classified"
    );

    BodygraphReport {
        gates: gate_details(natal, design),
        channels: definition.channels.iter().map(|c| c.id.to_string()).collect(),
        defined_centers: definition.sorted_centers(),
        hd_type,
        strategy: hd_type.strategy().to_string(),
        authority,
    }
}
