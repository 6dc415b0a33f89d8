//! ESRI Shapefile export and ZIP packaging
//!
//! The analysis platform ingests zipped shapefiles, so each export writes
//! the `.shp/.shx/.dbf` set (plus a WGS84 `.prj`) and then packages the
//! sidecar files into `<name>.zip`.

use crate::error::{Error, Result};
use crate::sample::{Sample, SampleSet};
use shapefile::dbase::{FieldName, FieldValue, Record as DbfRecord, TableWriterBuilder};
use shapefile::{Point, Polygon, PolygonRing, Writer};
use std::fs::{self, File};
use std::io::Write as _;
use std::path::{Path, PathBuf};

/// WGS84 WKT written to the `.prj` sidecar
const WGS84_PRJ: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

/// Sidecar extensions included in the upload package
const PACKAGED_EXTENSIONS: [&str; 4] = ["shp", "shx", "dbf", "prj"];

fn field_name(name: &'static str) -> Result<FieldName> {
    FieldName::try_from(name)
        .map_err(|_| Error::Shapefile(format!("invalid DBF field name: {name}")))
}

fn attribute_table() -> Result<TableWriterBuilder> {
    Ok(TableWriterBuilder::new()
        .add_character_field(field_name("WIND_ID")?, 32)
        .add_numeric_field(field_name("CENTER_X")?, 19, 9)
        .add_numeric_field(field_name("CENTER_Y")?, 19, 9)
        .add_numeric_field(field_name("XMIN")?, 19, 9)
        .add_numeric_field(field_name("YMIN")?, 19, 9)
        .add_numeric_field(field_name("XMAX")?, 19, 9)
        .add_numeric_field(field_name("YMAX")?, 19, 9)
        .add_numeric_field(field_name("CLASS")?, 3, 0)
        .add_character_field(field_name("LABEL")?, 16)
        .add_character_field(field_name("REGION")?, 20)
        .add_character_field(field_name("DATE_START")?, 10)
        .add_character_field(field_name("DATE_END")?, 10)
        .add_numeric_field(field_name("TURBINES")?, 10, 0))
}

/// Outer ring of the sample bbox, clockwise per the shapefile spec
fn bbox_ring(sample: &Sample) -> PolygonRing<Point> {
    let b = &sample.bbox;
    PolygonRing::Outer(vec![
        Point::new(b.min_x, b.min_y),
        Point::new(b.min_x, b.max_y),
        Point::new(b.max_x, b.max_y),
        Point::new(b.max_x, b.min_y),
        Point::new(b.min_x, b.min_y),
    ])
}

fn attribute_record(sample: &Sample) -> DbfRecord {
    let mut record = DbfRecord::default();
    let chr = |s: String| FieldValue::Character(Some(s));
    let num = |v: f64| FieldValue::Numeric(Some(v));
    record.insert("WIND_ID".to_string(), chr(sample.id.clone()));
    record.insert("CENTER_X".to_string(), num(sample.center_x));
    record.insert("CENTER_Y".to_string(), num(sample.center_y));
    record.insert("XMIN".to_string(), num(sample.bbox.min_x));
    record.insert("YMIN".to_string(), num(sample.bbox.min_y));
    record.insert("XMAX".to_string(), num(sample.bbox.max_x));
    record.insert("YMAX".to_string(), num(sample.bbox.max_y));
    record.insert("CLASS".to_string(), num(f64::from(sample.class.code())));
    record.insert("LABEL".to_string(), chr(sample.class.label().to_string()));
    record.insert("REGION".to_string(), chr(sample.region.name().to_string()));
    record.insert("DATE_START".to_string(), chr(sample.window.start_str()));
    record.insert("DATE_END".to_string(), chr(sample.window.end_str()));
    record.insert("TURBINES".to_string(), num(f64::from(sample.turbines)));
    record
}

/// Write a sample set as a polygon shapefile (`.shp/.shx/.dbf` + `.prj`).
pub fn write_shapefile(path: impl AsRef<Path>, set: &SampleSet) -> Result<()> {
    let path = path.as_ref();
    let mut writer = Writer::from_path(path, attribute_table()?)?;
    for sample in set.iter() {
        let polygon = Polygon::with_rings(vec![bbox_ring(sample)]);
        writer.write_shape_and_record(&polygon, &attribute_record(sample))?;
    }
    drop(writer);

    fs::write(path.with_extension("prj"), WGS84_PRJ)?;
    Ok(())
}

/// Package a shapefile's sidecar files into `<name>.zip` for upload.
///
/// Returns the path of the created archive. Missing sidecars are skipped.
pub fn zip_shapefile(shp_path: impl AsRef<Path>) -> Result<PathBuf> {
    let shp_path = shp_path.as_ref();
    let zip_path = shp_path.with_extension("zip");

    let file = File::create(&zip_path)?;
    let mut archive = zip::ZipWriter::new(file);
    let options = zip::write::FileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for ext in PACKAGED_EXTENSIONS {
        let part = shp_path.with_extension(ext);
        if !part.exists() {
            continue;
        }
        let name = part
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::Zip(format!("unrepresentable file name: {}", part.display())))?;
        archive.start_file(name, options)?;
        archive.write_all(&fs::read(&part)?)?;
    }
    archive.finish()?;
    Ok(zip_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{Sample, DEFAULT_BUFFER_DEG};

    fn test_set() -> SampleSet {
        let mut set = SampleSet::new();
        set.push(Sample::positive("w_1", 116.4074, 39.9042, 4, DEFAULT_BUFFER_DEG));
        set.push(Sample::negative(0, 96.2, 27.8, DEFAULT_BUFFER_DEG));
        set
    }

    fn temp_shp(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("windprep_{}_{name}.shp", std::process::id()))
    }

    fn cleanup(shp: &Path) {
        for ext in ["shp", "shx", "dbf", "prj", "zip"] {
            fs::remove_file(shp.with_extension(ext)).ok();
        }
    }

    #[test]
    fn writes_all_sidecars() {
        let shp = temp_shp("sidecars");
        write_shapefile(&shp, &test_set()).unwrap();
        for ext in ["shp", "shx", "dbf", "prj"] {
            assert!(shp.with_extension(ext).exists(), "missing .{ext}");
        }
        cleanup(&shp);
    }

    #[test]
    fn shapes_and_attributes_read_back() {
        let shp = temp_shp("readback");
        let set = test_set();
        write_shapefile(&shp, &set).unwrap();

        let contents = shapefile::read(&shp).unwrap();
        assert_eq!(contents.len(), 2);
        let (shape, record) = &contents[0];
        match shape {
            shapefile::Shape::Polygon(p) => assert_eq!(p.rings().len(), 1),
            other => panic!("expected polygon, got {other}"),
        }
        match record.get("WIND_ID") {
            Some(FieldValue::Character(Some(id))) => assert_eq!(id, "w_1"),
            other => panic!("unexpected WIND_ID: {other:?}"),
        }
        match record.get("CLASS") {
            Some(FieldValue::Numeric(Some(c))) => assert!((c - 1.0).abs() < 1e-9),
            other => panic!("unexpected CLASS: {other:?}"),
        }
        cleanup(&shp);
    }

    #[test]
    fn zip_contains_sidecars() {
        let shp = temp_shp("zipped");
        write_shapefile(&shp, &test_set()).unwrap();
        let zip_path = zip_shapefile(&shp).unwrap();

        let file = File::open(&zip_path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        for ext in ["shp", "shx", "dbf", "prj"] {
            assert!(
                names.iter().any(|n| n.ends_with(&format!(".{ext}"))),
                "archive missing .{ext}: {names:?}"
            );
        }
        cleanup(&shp);
    }
}
