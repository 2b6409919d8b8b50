//! Seam to the file-reading collaborator.
//!
//! The underlying generic ROOT reader owns file opening, tree discovery
//! and ranged column materialization. Assembly only needs the small
//! surface below, kept behind a trait so tests can drive it with an
//! in-memory fixture.

use arrow::array::StructArray;

use crate::error::Result;
use crate::refs::SmartRefEntry;

/// Navigation path that is permanently unsupported: its payload is the
/// untyped generic-event leaf the adapter cannot decode. Skipped
/// silently, without a warning.
pub const GEN_PATH: &str = "/Event/Gen";

/// File-reading collaborator contract.
pub trait EventStore {
    /// Ordered navigation-path list from the file metadata
    /// (`m_NavPath`). Defines the slot order of reference rows.
    fn nav_paths(&self) -> Result<Vec<String>>;

    /// Whether the file actually contains `nav_path`.
    fn contains(&self, nav_path: &str) -> bool;

    /// Per-event reference rows of the navigator branch, one slot per
    /// navigation path.
    fn navigator_refs(&self) -> Result<Vec<Vec<SmartRefEntry>>>;

    /// Materialize the event table of `nav_path` over the contiguous
    /// row range `[row_start, row_stop)` as typed columns.
    fn read_rows(&self, nav_path: &str, row_start: usize, row_stop: usize) -> Result<StructArray>;
}

/// Static navigation-path → event-table-name lookup.
///
/// Paths absent from this table are skipped at assembly time with a
/// warning; decoding them may still be possible once a mapping is added.
pub fn event_table_name(nav_path: &str) -> Option<&'static str> {
    match nav_path {
        "/Event/Gen" => Some("GenEvt"),
        "/Event/Sim" => Some("SimEvt"),
        "/Event/CdLpmtElec" => Some("CdLpmtElecEvt"),
        "/Event/CdSpmtElec" => Some("CdSpmtElecEvt"),
        "/Event/WpElec" => Some("WpElecEvt"),
        "/Event/TtElec" => Some("TtElecEvt"),
        "/Event/CdLpmtCalib" => Some("CdLpmtCalibEvt"),
        "/Event/CdSpmtCalib" => Some("CdSpmtCalibEvt"),
        "/Event/WpCalib" => Some("WpCalibEvt"),
        "/Event/TtCalib" => Some("TtCalibEvt"),
        "/Event/CdLpmtTruth" => Some("CdLpmtTruthEvt"),
        "/Event/CdSpmtTruth" => Some("CdSpmtTruthEvt"),
        "/Event/WpTruth" => Some("WpTruthEvt"),
        "/Event/TtTruth" => Some("TtTruthEvt"),
        "/Event/CdTrigger" => Some("CdTriggerEvt"),
        "/Event/WpTrigger" => Some("WpTriggerEvt"),
        "/Event/TtTrigger" => Some("TtTriggerEvt"),
        "/Event/CdVertexRec" => Some("CdVertexRecEvt"),
        "/Event/CdTrackRec" => Some("CdTrackRecEvt"),
        "/Event/WpRec" => Some("WpRecEvt"),
        _ => None,
    }
}
