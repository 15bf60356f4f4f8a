mod common;

use common::ssmt2_file;
use netcdf::AttributeValue;
use ssmt2_netcdf::formats::netcdf::{ANCILLARY_DIM, SSMT2_SCHEMA};
use ssmt2_netcdf::{Error, NetcdfWriter, NetcdfWriterBuilder, T2Reader};
use tempfile::tempdir;

fn string_attribute(file: &netcdf::File, name: &str) -> String {
    match file.attribute(name).expect(name).value().unwrap() {
        AttributeValue::Str(s) => s,
        other => panic!("attribute {} is not a string: {:?}", name, other),
    }
}

#[test]
fn test_roundtrip_is_lossless() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("orbit.nc");

    let (data, _) = ssmt2_file(4);
    let (fields, header) = T2Reader::from_bytes(data).unwrap().read_all_with_header().unwrap();

    let stats = NetcdfWriter::new(&output)
        .write_with_stats(&header, &fields)
        .unwrap();
    assert_eq!(stats.num_records, 4);
    assert_eq!(stats.num_variables, 12);
    assert!(output.exists());

    let file = netcdf::open(&output).unwrap();
    assert_eq!(file.dimension("time_step").unwrap().len(), 4);
    assert_eq!(file.dimension("scan_position").unwrap().len(), 28);
    assert_eq!(file.dimension("channel").unwrap().len(), 5);
    assert_eq!(file.dimension("housekeeping").unwrap().len(), 18);
    assert_eq!(file.dimension("calib_number").unwrap().len(), 4);
    assert_eq!(file.dimension(ANCILLARY_DIM).unwrap().len(), 10);

    for variable in SSMT2_SCHEMA.variables {
        let var = file.variable(variable.name).expect(variable.name);
        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        assert_eq!(dims[0], "time_step");
        assert_eq!(&dims[1..], variable.dims);

        let array = fields.get(variable.name).unwrap();
        if let Some(expected) = array.as_f64() {
            let values: Vec<f64> = var.get_values(..).unwrap();
            let bits: Vec<u64> = values.iter().map(|v| v.to_bits()).collect();
            let expected_bits: Vec<u64> = expected.iter().map(|v| v.to_bits()).collect();
            assert_eq!(bits, expected_bits, "{}", variable.name);
        } else if let Some(expected) = array.as_f32() {
            let values: Vec<f32> = var.get_values(..).unwrap();
            let bits: Vec<u32> = values.iter().map(|v| v.to_bits()).collect();
            let expected_bits: Vec<u32> = expected.iter().map(|v| v.to_bits()).collect();
            assert_eq!(bits, expected_bits, "{}", variable.name);
        } else {
            let values: Vec<u32> = var.get_values(..).unwrap();
            assert_eq!(values.as_slice(), array.as_u32().unwrap(), "{}", variable.name);
        }
    }
}

#[test]
fn test_header_becomes_global_attributes() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("orbit.nc");

    let (data, _) = ssmt2_file(1);
    let (fields, header) = T2Reader::from_bytes(data).unwrap().read_all_with_header().unwrap();
    NetcdfWriter::new(&output).write(&header, &fields).unwrap();

    let file = netcdf::open(&output).unwrap();
    assert_eq!(string_attribute(&file, "number_of_header_records"), "4");
    assert_eq!(string_attribute(&file, "record_bytes"), "1688");
    assert_eq!(string_attribute(&file, "SSM_T-2_satellite"), "F14");
    assert_eq!(string_attribute(&file, "start_time"), "1999-04-10 01:00:00");
}

#[test]
fn test_existing_output_is_replaced() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("orbit.nc");
    std::fs::write(&output, b"not a netcdf file").unwrap();

    let (data, _) = ssmt2_file(2);
    let (fields, header) = T2Reader::from_bytes(data).unwrap().read_all_with_header().unwrap();
    NetcdfWriterBuilder::new()
        .output_path(&output)
        .compression(4)
        .build()
        .unwrap()
        .write(&header, &fields)
        .unwrap();

    let file = netcdf::open(&output).unwrap();
    assert_eq!(file.dimension("time_step").unwrap().len(), 2);
}

#[test]
fn test_invalid_compression_level() {
    let dir = tempdir().unwrap();
    let (data, _) = ssmt2_file(1);
    let (fields, header) = T2Reader::from_bytes(data).unwrap().read_all_with_header().unwrap();

    let err = NetcdfWriter::new(dir.path().join("orbit.nc"))
        .compression(12)
        .write(&header, &fields)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn test_builder_requires_output_path() {
    assert!(NetcdfWriterBuilder::new().build().is_err());
}
