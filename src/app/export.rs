use crate::config::toml_config::OutputConfig;
use crate::domain::model::{Body, Profile, Side, Sign};
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use serde::Serialize;

/// One CSV row per tracked body and side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateRow {
    pub side: Side,
    pub planet: Body,
    pub gate: u8,
    pub line: u8,
    pub sign: Sign,
    pub degree_in_sign: f64,
    pub longitude: f64,
}

pub fn gate_rows(profile: &Profile) -> Vec<GateRow> {
    [Side::Natal, Side::Design]
        .into_iter()
        .flat_map(|side| {
            profile
                .bodies
                .side(side)
                .iter()
                .map(move |(planet, pos)| GateRow {
                    side,
                    planet,
                    gate: pos.gate,
                    line: pos.line,
                    sign: pos.sign,
                    degree_in_sign: pos.degree_in_sign,
                    longitude: pos.longitude,
                })
        })
        .collect()
}

pub fn profile_to_json(profile: &Profile) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(profile)?)
}

pub fn profile_to_csv(profile: &Profile) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in gate_rows(profile) {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| crate::utils::error::GeneGraphError::IoError(e.into_error()))
}

/// Writes a profile through a [`Storage`] in every configured format.
pub struct ProfileExporter<S: Storage> {
    storage: S,
    output: OutputConfig,
}

impl<S: Storage> ProfileExporter<S> {
    pub fn new(storage: S, output: OutputConfig) -> Self {
        Self { storage, output }
    }

    /// Returns the file names written, relative to the storage root.
    pub async fn export(&self, profile: &Profile) -> Result<Vec<String>> {
        let mut written = Vec::new();

        if self.output.wants("json") {
            let data = profile_to_json(profile)?;
            self.storage
                .write_file(&self.output.json_filename, &data)
                .await?;
            tracing::info!("💾 Wrote {} ({} bytes)", self.output.json_filename, data.len());
            written.push(self.output.json_filename.clone());
        }

        if self.output.wants("csv") {
            let data = profile_to_csv(profile)?;
            self.storage
                .write_file(&self.output.csv_filename, &data)
                .await?;
            tracing::info!("💾 Wrote {} ({} bytes)", self.output.csv_filename, data.len());
            written.push(self.output.csv_filename.clone());
        }

        Ok(written)
    }
}
