//! GeoJSON export/import
//!
//! Each sample becomes a Feature whose geometry is the bbox polygon and
//! whose properties carry the same fixed column set as the CSV export, so
//! either format can be uploaded to the analysis platform or read back.

use crate::error::{Error, Result};
use crate::io::samples::SampleRow;
use crate::sample::{Sample, SampleSet};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};
use std::fs;
use std::path::Path;

fn bbox_ring(sample: &Sample) -> Vec<Vec<f64>> {
    let b = &sample.bbox;
    vec![
        vec![b.min_x, b.min_y],
        vec![b.max_x, b.min_y],
        vec![b.max_x, b.max_y],
        vec![b.min_x, b.max_y],
        vec![b.min_x, b.min_y],
    ]
}

fn to_feature(sample: &Sample) -> Result<Feature> {
    let row = SampleRow::from(sample);
    let properties = match serde_json::to_value(&row) {
        Ok(serde_json::Value::Object(map)) => map,
        Ok(_) => return Err(Error::GeoJson("sample row did not serialize to an object".into())),
        Err(e) => return Err(Error::GeoJson(e.to_string())),
    };
    Ok(Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Polygon(vec![bbox_ring(sample)]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    })
}

fn from_feature(feature: Feature) -> Result<Sample> {
    let properties: JsonObject = feature
        .properties
        .ok_or_else(|| Error::GeoJson("feature has no properties".into()))?;
    let row: SampleRow = serde_json::from_value(serde_json::Value::Object(properties))
        .map_err(|e| Error::GeoJson(format!("invalid sample properties: {e}")))?;
    row.into_sample()
}

/// Write a sample set as a GeoJSON FeatureCollection.
pub fn write_geojson(path: impl AsRef<Path>, set: &SampleSet) -> Result<()> {
    let features = set
        .iter()
        .map(to_feature)
        .collect::<Result<Vec<Feature>>>()?;
    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    fs::write(path.as_ref(), GeoJson::from(collection).to_string())?;
    Ok(())
}

/// Read a GeoJSON file written by [`write_geojson`].
///
/// Properties are authoritative; the polygon geometry is derived from the
/// bbox columns and is not re-parsed.
pub fn read_geojson(path: impl AsRef<Path>) -> Result<SampleSet> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }
    let geojson: GeoJson = fs::read_to_string(path)?.parse()?;
    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(Error::GeoJson("expected a FeatureCollection".into())),
    };
    let samples = collection
        .features
        .into_iter()
        .map(from_feature)
        .collect::<Result<Vec<Sample>>>()?;
    Ok(SampleSet::from_samples(samples))
}
