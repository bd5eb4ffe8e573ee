use veer_core::edge::EdgeId;
use veer_net::detector::{DetectorSettings, DetectorWriter};

fn edges(ids: &[&str]) -> Vec<EdgeId> {
    ids.iter().map(|id| EdgeId::from(*id)).collect()
}

#[test]
fn test_detector_ids_replace_edge_marker() {
    let writer = DetectorWriter::new(&DetectorSettings::default());
    let mut output = Vec::new();
    let ids = writer
        .write(&edges(&["E0", "E1"]), &mut output)
        .expect("write to memory");
    assert_eq!(ids, vec!["D0".to_string(), "D1".to_string()]);
    assert_eq!(writer.detector_id(&EdgeId::from("-E0")), "-D0");
}

#[test]
fn test_detectors_sit_on_primary_lane() {
    let writer = DetectorWriter::new(&DetectorSettings::default());
    let detectors = writer.detectors_for(&edges(&["E0", "E1", ":J1_0"]));
    assert_eq!(detectors.len(), 2);
    for detector in detectors.iter() {
        assert_eq!(detector.position, -10);
        assert_eq!(detector.frequency, 30);
    }
    assert_eq!(detectors[0].lane.as_str(), "E0_0");
    assert_eq!(detectors[1].lane.as_str(), "E1_0");
}

#[test]
fn test_detector_file_layout() {
    let writer = DetectorWriter::new(&DetectorSettings::default());
    let mut output = Vec::new();
    writer
        .write(&edges(&["E0"]), &mut output)
        .expect("write to memory");
    let written = String::from_utf8(output).expect("utf8 output");
    assert!(written.starts_with("<additional>"));
    assert!(written.contains(
        r#"<e1Detector id="D0" lane="E0_0" pos="-10" freq="30" file="cross.out" friendlyPos="true"/>"#
    ));
    assert!(written.trim_end().ends_with("</additional>"));
}

#[test]
fn test_detector_file_is_overwritten() {
    let det_file = std::env::temp_dir()
        .join(format!("veer-det-{}", std::process::id()))
        .join("random.det.xml");
    let writer = DetectorWriter::new(&DetectorSettings::default());
    writer
        .write_file(&edges(&["E0", "E1", "E2"]), &det_file)
        .expect("first write");
    let ids = writer
        .write_file(&edges(&["E5"]), &det_file)
        .expect("second write");
    let written = std::fs::read_to_string(&det_file).expect("read back");
    let _ = std::fs::remove_dir_all(det_file.parent().expect("temp dir"));
    assert_eq!(ids, vec!["D5".to_string()]);
    assert!(!written.contains("D0"));
}
