//! End-to-end decoding: streamer info → factory dispatch → byte decode →
//! typed arrow columns, including the navigator reference block.

mod common;

use arrow::array::{Array, Float64Array, Int64Array, ListArray, StringArray, StructArray};
use arrow::datatypes::DataType;
use jn_edm::{make_reader, read_rows, FactoryRegistry, StreamerDb, StreamerField, NAV_REFS_ITEM_PATH};

use common::{put_record, put_smart_ref, put_string};

fn detsim_db() -> StreamerDb {
    let mut db = StreamerDb::new();
    db.insert(
        "JM::SimEvt",
        vec![
            StreamerField::new("m_label", "string"),
            StreamerField::new("m_energy", "double"),
            StreamerField::new("m_hit_times", "vector<double>"),
            StreamerField::new("m_vertex", "CLHEP::Hep3Vector"),
            StreamerField::new("m_truth_ref", "JM::SmartRef"),
        ],
    );
    db.insert(
        "CLHEP::Hep3Vector",
        vec![
            StreamerField::new("dx", "double"),
            StreamerField::new("dy", "double"),
            StreamerField::new("dz", "double"),
        ],
    );
    db
}

struct SimRow {
    label: &'static str,
    energy: f64,
    hit_times: Vec<f64>,
    vertex: [f64; 3],
    truth_entry: i64,
}

fn encode_sim_row(out: &mut Vec<u8>, row: &SimRow) {
    let mut body = Vec::new();
    put_string(&mut body, row.label);
    body.extend_from_slice(&row.energy.to_be_bytes());

    let mut times = Vec::new();
    times.extend_from_slice(&(row.hit_times.len() as i32).to_be_bytes());
    for t in &row.hit_times {
        times.extend_from_slice(&t.to_be_bytes());
    }
    put_record(&mut body, 6, &times);

    let mut vertex = Vec::new();
    for c in row.vertex {
        vertex.extend_from_slice(&c.to_be_bytes());
    }
    put_record(&mut body, 1, &vertex);

    put_smart_ref(&mut body, 1, row.truth_entry);
    put_record(out, 4, &body);
}

#[test]
fn sim_event_decodes_through_all_rule_kinds() {
    let rows = [
        SimRow {
            label: "mu-",
            energy: 2.5,
            hit_times: vec![10.0, 11.5],
            vertex: [1.0, -2.0, 3.0],
            truth_entry: 0,
        },
        SimRow {
            label: "e+",
            energy: 0.8,
            hit_times: vec![],
            vertex: [0.0, 0.0, 0.5],
            truth_entry: -1,
        },
    ];
    let mut data = Vec::new();
    let mut spans = vec![0usize];
    for row in &rows {
        encode_sim_row(&mut data, row);
        spans.push(data.len());
    }

    let db = detsim_db();
    let registry = FactoryRegistry::with_defaults();
    let node = registry.build("JM::SimEvt", "SimEvt", &db, "/Event/Sim").unwrap();
    let (field, array) = read_rows(&data, &spans, make_reader(&node)).unwrap();

    let record = array.as_any().downcast_ref::<StructArray>().unwrap();
    assert_eq!(record.len(), 2);
    assert_eq!(record.column_names(), ["m_label", "m_energy", "m_hit_times", "m_vertex", "m_truth_ref"]);

    let labels = record.column(0).as_any().downcast_ref::<StringArray>().unwrap();
    assert_eq!(labels.value(0), "mu-");
    assert_eq!(labels.value(1), "e+");

    let energy = record.column(1).as_any().downcast_ref::<Float64Array>().unwrap();
    assert_eq!(energy.values(), &[2.5, 0.8]);

    let times = record.column(2).as_any().downcast_ref::<ListArray>().unwrap();
    assert_eq!(times.value_length(0), 2);
    assert_eq!(times.value_length(1), 0);

    let vertex = record.column(3).as_any().downcast_ref::<StructArray>().unwrap();
    let dz = vertex.column(2).as_any().downcast_ref::<Float64Array>().unwrap();
    assert_eq!(dz.values(), &[3.0, 0.5]);

    let refs = record.column(4).as_any().downcast_ref::<StructArray>().unwrap();
    let entries = refs.column(1).as_any().downcast_ref::<Int64Array>().unwrap();
    assert_eq!(entries.values(), &[0, -1]);

    // decoder emission and declared shape come from the same descriptor
    assert_eq!(field.as_ref(), node.arrow_field().as_ref());
    assert_eq!(array.data_type(), &node.data_type());
}

#[test]
fn shape_is_isomorphic_for_every_composite_node() {
    let db = detsim_db();
    let registry = FactoryRegistry::with_defaults();
    let node = registry.build("JM::SimEvt", "SimEvt", &db, "/Event/Sim").unwrap();

    fn check(node: &jn_edm::FactoryNode) {
        if let jn_edm::FactoryKind::Group { children, .. } = &node.kind {
            let DataType::Struct(fields) = node.data_type() else {
                panic!("group must declare a struct shape");
            };
            assert_eq!(fields.len(), children.len());
            for (field, child) in fields.iter().zip(children) {
                assert_eq!(field.name(), &child.name);
                assert_eq!(field.data_type(), &child.data_type());
                check(child);
            }
        }
    }
    check(&node);
}

#[test]
fn navigator_branch_decodes_as_reference_groups() {
    // one row = object header + u32 slot count + that many SmartRefs
    let slots_per_event = [
        vec![0i64, -1, 3],
        vec![1, 2, -1],
    ];
    let mut data = Vec::new();
    let mut spans = vec![0usize];
    for slots in &slots_per_event {
        let mut body = Vec::new();
        body.extend_from_slice(&(slots.len() as u32).to_be_bytes());
        for (i, &entry) in slots.iter().enumerate() {
            put_smart_ref(&mut body, i as u16, entry);
        }
        put_record(&mut data, 1, &body);
        spans.push(data.len());
    }

    let registry = FactoryRegistry::with_defaults();
    let node = registry
        .build("JM::SmartRef", "m_refs", &StreamerDb::new(), NAV_REFS_ITEM_PATH)
        .unwrap();
    let (_field, array) = read_rows(&data, &spans, make_reader(&node)).unwrap();

    let groups = array.as_any().downcast_ref::<ListArray>().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups.value_length(0), 3);
    assert_eq!(groups.value_length(1), 3);

    let first = groups.value(0);
    let first = first.as_any().downcast_ref::<StructArray>().unwrap();
    let entries = first.column(1).as_any().downcast_ref::<Int64Array>().unwrap();
    assert_eq!(entries.values(), &[0, -1, 3]);
}
