use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use serde::Deserialize;
use typed_builder::TypedBuilder;

use veer_core::edge::{EdgeId, LaneId};

use crate::error::NetError;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DetectorSettings {
    /// Distance from the lane start; negative values count back from the lane end.
    pub position: i32,
    pub frequency: u32,
    pub output_file: String,
    pub edge_marker: String,
    pub detector_marker: String,
    pub friendly_position: bool,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            position: -10,
            frequency: 30,
            output_file: "cross.out".to_string(),
            edge_marker: "E".to_string(),
            detector_marker: "D".to_string(),
            friendly_position: true,
        }
    }
}

/// One induction loop (`e1Detector`) definition.
#[derive(Clone, Debug, PartialEq, Eq, TypedBuilder)]
pub struct Detector {
    pub id: String,
    pub lane: LaneId,
    pub position: i32,
    pub frequency: u32,
    pub output_file: String,
    pub friendly_position: bool,
}

impl Detector {
    fn to_tag(&self) -> BytesStart<'_> {
        let position = self.position.to_string();
        let frequency = self.frequency.to_string();
        BytesStart::new("e1Detector").with_attributes([
            ("id", self.id.as_str()),
            ("lane", self.lane.as_str()),
            ("pos", position.as_str()),
            ("freq", frequency.as_str()),
            ("file", self.output_file.as_str()),
            ("friendlyPos", if self.friendly_position { "true" } else { "false" }),
        ])
    }
}

pub struct DetectorWriter {
    settings: DetectorSettings,
}

impl DetectorWriter {
    pub fn new(settings: &DetectorSettings) -> Self {
        Self {
            settings: settings.clone(),
        }
    }

    pub fn detector_id(&self, edge: &EdgeId) -> String {
        edge.as_str()
            .replace(&self.settings.edge_marker, &self.settings.detector_marker)
    }

    pub fn detectors_for(&self, edges: &[EdgeId]) -> Vec<Detector> {
        edges
            .iter()
            .filter(|edge| !edge.is_internal())
            .map(|edge| {
                Detector::builder()
                    .id(self.detector_id(edge))
                    .lane(LaneId::primary(edge))
                    .position(self.settings.position)
                    .frequency(self.settings.frequency)
                    .output_file(self.settings.output_file.clone())
                    .friendly_position(self.settings.friendly_position)
                    .build()
            })
            .collect()
    }

    /// Writes one detector per edge into `output` and returns the detector ids.
    pub fn write<W: Write>(&self, edges: &[EdgeId], output: W) -> Result<Vec<String>, NetError> {
        let detectors = self.detectors_for(edges);
        let mut writer = Writer::new_with_indent(output, b' ', 1);
        writer.write_event(Event::Start(BytesStart::new("additional")))?;
        for detector in detectors.iter() {
            writer.write_event(Event::Empty(detector.to_tag()))?;
        }
        writer.write_event(Event::End(BytesEnd::new("additional")))?;
        writer.get_mut().write_all(b"\n")?;
        writer.get_mut().flush()?;
        Ok(detectors.into_iter().map(|detector| detector.id).collect())
    }

    /// Overwrites `det_file` with the detectors for `edges`.
    pub fn write_file(&self, edges: &[EdgeId], det_file: &Path) -> Result<Vec<String>, NetError> {
        if let Some(parent) = det_file.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(det_file)?;
        let detector_ids = self.write(edges, BufWriter::new(file))?;
        info!("Wrote {} detectors to {}", detector_ids.len(), det_file.display());
        Ok(detector_ids)
    }
}
