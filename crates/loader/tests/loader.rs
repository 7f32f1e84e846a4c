// Dragonfly 8b9m - Gate-Level CPU Simulator
// Copyright (C) 2026 Dragonfly Project
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use dragonfly_loader::{assemble, bind_tables, load, load_modules, load_tables, LoaderError};
use dragonfly_loader::netlist::parse;
use dragonfly_core::parts::Part;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Interface module: the external connector plus a bus connector.
const INTERFACE_MODULE: &str = r#"
.ADD_COM     PAD2     "Conn_02x19_Counter_Clockwise"     "Conn:PinHeader_2x19"
.ADD_COM     BC1     "BusConnector"     "Bus:EdgeConnector"
.ADD_COM     TP1     "74LS00"     "TestPoint:TestPoint_Pad_D1.0mm"
.ADD_COM     C1     "C"     "C_0805"
.ADD_TER     PAD2   2     "/NCLK"
.TER     BC1   A20
.ADD_TER     PAD2   14     "/NHALT"
.TER     BC1   A21
.ADD_TER     C1   1     "/DECOUPLE"
"#;

/// Core module: the eight microcode EEPROMs.
fn tables_module() -> String {
    let mut text = String::new();
    for i in 1..=8 {
        text.push_str(&format!(
            ".ADD_COM     TABLE{i}     \"28C256\"     \"DIP-28\"\n"
        ));
    }
    text.push_str(".ADD_TER     TABLE1   20     \"/NCS\"\n");
    for i in 2..=8 {
        text.push_str(&format!(".TER     TABLE{i}   20\n"));
    }
    text
}

fn temp_dir(prefix: &str) -> PathBuf {
    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("dragonfly-{prefix}-{nonce}"));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_tables(dir: &PathBuf, count: usize) {
    for i in 0..count {
        let mut image = vec![0u8; 32 * 1024];
        image[0] = i as u8;
        std::fs::write(dir.join(format!("table{i}.bin")), image).unwrap();
    }
}

#[test]
fn full_load_namespaces_and_binds_tables() {
    let dir = temp_dir("full-load");
    std::fs::write(dir.join("interface.frp"), INTERFACE_MODULE).unwrap();
    std::fs::write(dir.join("core.frp"), tables_module()).unwrap();
    write_tables(&dir, 8);

    let modules = vec![
        (dir.join("interface.frp"), "I".to_string()),
        (dir.join("core.frp"), "C1".to_string()),
    ];
    let machine = load(&modules, &dir).unwrap();

    // Namespaced names, test point and capacitor dropped.
    assert!(machine.component_index("I:PAD2").is_some());
    assert!(machine.component_index("I:BC1").is_some());
    assert!(machine.component_index("I:TP1").is_none());
    assert!(machine.component_index("I:C1").is_none());
    assert!(machine.component_index("C1:TABLE3").is_some());
    assert_eq!(machine.interface_name(), Some("I:PAD2"));

    // Networks carry the module prefix and the resolved-net marker.
    assert!(machine.nets.lookup("I:/NCLK!").is_some());
    assert!(machine.nets.lookup("C1:/NCS!").is_some());

    // Each TABLE EEPROM got its slot image.
    let idx = machine.component_index("C1:TABLE5").unwrap();
    match &machine.components[idx].part {
        Part::Eeprom(rom) => assert_eq!(rom.byte(0), 4),
        _ => panic!("TABLE5 is not an EEPROM"),
    }

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_table_file_names_the_slot() {
    let dir = temp_dir("missing-table");
    write_tables(&dir, 7); // table7.bin absent

    let err = load_tables(&dir).unwrap_err();
    match err {
        LoaderError::TableIo { index, .. } => assert_eq!(index, 7),
        other => panic!("unexpected error: {other}"),
    }

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn truncated_table_file_is_rejected() {
    let dir = temp_dir("short-table");
    write_tables(&dir, 8);
    std::fs::write(dir.join("table3.bin"), vec![0u8; 1024]).unwrap();

    let err = load_tables(&dir).unwrap_err();
    match err {
        LoaderError::TableSize { size, .. } => assert_eq!(size, 1024),
        other => panic!("unexpected error: {other}"),
    }

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn netlist_missing_a_table_eeprom_reports_the_gap() {
    // Only TABLE1..TABLE7 present in the netlist.
    let mut text = String::new();
    for i in 1..=7 {
        text.push_str(&format!(
            ".ADD_COM     TABLE{i}     \"28C256\"     \"DIP-28\"\n"
        ));
    }
    text.push_str(
        ".ADD_COM     PAD2     \"Conn_02x19_Counter_Clockwise\"     \"Conn:PinHeader\"\n",
    );

    let doc = parse(&text).unwrap();
    let mut machine = assemble(vec![("C1".to_string(), doc)]).unwrap();

    let tables: Vec<Vec<u8>> = (0..8).map(|_| vec![0u8; 32 * 1024]).collect();
    let err = bind_tables(&mut machine, &tables).unwrap_err();
    match err {
        LoaderError::MissingTables(missing) => assert_eq!(missing, vec![7]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn reserved_backplane_prefix_is_rejected() {
    let doc = parse(INTERFACE_MODULE).unwrap();
    let err = assemble(vec![("BP".to_string(), doc)]).unwrap_err();
    assert!(matches!(err, LoaderError::ReservedPrefix));
}

#[test]
fn colon_in_raw_names_is_rejected() {
    let doc = parse(".ADD_COM     a:b     \"74LS00\"     \"DIP\"").unwrap();
    let err = assemble(vec![("M".to_string(), doc)]).unwrap_err();
    assert!(matches!(err, LoaderError::ColonInName(_)));

    let doc = parse(
        ".ADD_COM     u1     \"74LS00\"     \"DIP\"\n.ADD_TER     u1   1     \"/a:b\"",
    )
    .unwrap();
    let err = assemble(vec![("M".to_string(), doc)]).unwrap_err();
    assert!(matches!(err, LoaderError::ColonInNet(_)));
}

#[test]
fn interface_must_exist_exactly_once() {
    let doc = parse(".ADD_COM     u1     \"74LS00\"     \"DIP\"").unwrap();
    let err = assemble(vec![("M".to_string(), doc)]).unwrap_err();
    assert!(matches!(err, LoaderError::NoInterface));

    let two = "\
.ADD_COM     PAD1     \"Conn_02x19_Counter_Clockwise\"     \"Conn:A\"
.ADD_COM     PAD2     \"Conn_02x19_Counter_Clockwise\"     \"Conn:B\"
";
    let doc = parse(two).unwrap();
    let err = assemble(vec![("M".to_string(), doc)]).unwrap_err();
    assert!(matches!(err, LoaderError::MultipleInterfaces));
}

#[test]
fn unknown_part_type_is_rejected() {
    let doc = parse(".ADD_COM     u1     \"NE555\"     \"DIP-8\"").unwrap();
    let err = assemble(vec![("M".to_string(), doc)]).unwrap_err();
    match err {
        LoaderError::UnknownType(name) => assert_eq!(name, "NE555"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn bus_connector_must_sit_on_backplane_positions() {
    let text = "\
.ADD_COM     BC1     \"BusConnector\"     \"Bus:Edge\"
.ADD_COM     PAD2     \"Conn_02x19_Counter_Clockwise\"     \"Conn:A\"
.ADD_TER     BC1   Q7     \"/X\"
";
    let doc = parse(text).unwrap();
    let err = assemble(vec![("M".to_string(), doc)]).unwrap_err();
    match err {
        LoaderError::UnknownBackplanePin(pin) => assert_eq!(pin, "Q7"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn load_modules_reports_unreadable_files() {
    let missing = PathBuf::from("/nonexistent/dragonfly/netlist.frp");
    let err = load_modules(&[(missing, "M".to_string())]).unwrap_err();
    assert!(err.to_string().contains("Failed to read netlist"));
}
