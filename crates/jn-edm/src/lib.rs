//! # jn-edm
//!
//! Schema adapter for the JUNO experiment's event data model: teaches a
//! generic ROOT reader how to decode the `JM::`/`CLHEP::` class family
//! into arrow columnar arrays, and reassembles per-event records from
//! the `EvtNavigator` reference table.
//!
//! Two cooperating pieces:
//!
//! - the [`factory`] registry dispatches a streamer description to a
//!   descriptor tree via priority-ordered first-match rules; one tree
//!   drives both the decoder ([`reader`]) and the arrow shape, so the
//!   two cannot drift apart;
//! - the [`assemble`] module joins independently-stored sub-detector
//!   tables back into per-event records using presence counts derived
//!   from the navigator's reference rows, preserving empty events.
//!
//! ## Example
//!
//! ```
//! use jn_edm::{FactoryRegistry, StreamerDb, StreamerField};
//!
//! let mut db = StreamerDb::new();
//! db.insert("JM::SimEvt", vec![
//!     StreamerField::new("m_energy", "double"),
//!     StreamerField::new("m_ref", "JM::SmartRef"),
//! ]);
//!
//! let registry = FactoryRegistry::with_defaults();
//! let node = registry.build("JM::SimEvt", "SimEvt", &db, "/Event/Sim").unwrap();
//! println!("decodes to {}", node.data_type());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assemble;
pub mod error;
pub mod factory;
pub mod filter;
pub mod meta;
pub mod reader;
pub mod refs;
pub mod store;
pub mod streamer;
pub mod wire;

pub use assemble::assemble;
pub use error::{EdmError, Result};
pub use factory::{
    FactoryKind, FactoryNode, FactoryRegistry, FactoryRule, GroupNs, PrimType,
    NAV_REFS_ITEM_PATH,
};
pub use filter::PathFilter;
pub use meta::{decode_file_meta_data, decode_unique_id_table, FileMetaData, UniqueIdTable};
pub use reader::{make_reader, read_rows, Reader};
pub use refs::{presence_counts, SmartRefEntry, NO_REFERENCE};
pub use store::{event_table_name, EventStore, GEN_PATH};
pub use streamer::{StreamerDb, StreamerField};
pub use wire::WireCursor;
