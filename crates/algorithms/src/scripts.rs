//! Earth Engine prediction script generation
//!
//! The heavy lifting (compositing, feature extraction, random-forest
//! training) runs on the cloud platform; this module only emits the
//! per-region JavaScript from a fixed template, wired to the uploaded
//! sample assets.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use windprep_core::{Error, Region, Result};

/// Parameters shared by all generated scripts
#[derive(Debug, Clone)]
pub struct ScriptParams {
    /// Platform user that owns the uploaded sample assets
    pub username: String,
    /// Maximum cloudy-pixel percentage for Sentinel-2 scenes
    pub cloud_threshold: u8,
    /// Random-forest tree count
    pub tree_count: u32,
    /// Fraction of extracted rows used for training (rest validates)
    pub train_fraction: f64,
    /// Sampling scale in metres
    pub scale: u32,
}

impl Default for ScriptParams {
    fn default() -> Self {
        Self {
            username: "windprep".to_string(),
            cloud_threshold: 20,
            tree_count: 50,
            train_fraction: 0.7,
            scale: 20,
        }
    }
}

/// Asset identifier of a region's uploaded samples
pub fn asset_id(username: &str, region: Region) -> String {
    format!("users/{username}/{}_wind_samples", region.name())
}

/// Render the prediction script for one named region.
///
/// Fails for [`Region::Other`], which has no fixed bounds or acquisition
/// window.
pub fn prediction_script(region: Region, params: &ScriptParams) -> Result<String> {
    let bbox = region.bbox().ok_or_else(|| Error::InvalidParameter {
        name: "region",
        value: region.name().into(),
        reason: "script generation needs a named region with fixed bounds".into(),
    })?;
    // A named region always has a window when it has a bbox.
    let window = region.prediction_window().ok_or_else(|| Error::InvalidParameter {
        name: "region",
        value: region.name().into(),
        reason: "region has no acquisition window".into(),
    })?;

    let title = region.title();
    let region_upper = region.name().to_uppercase();
    let asset = asset_id(&params.username, region);
    let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    let (xmin, ymin, xmax, ymax) = (bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y);
    let (date_start, date_end) = (window.start_str(), window.end_str());
    let cloud = params.cloud_threshold;
    let trees = params.tree_count;
    let train_fraction = params.train_fraction;
    let scale = params.scale;

    Ok(format!(
        r#"// Wind turbine detection - {title} prediction script
// Generated: {generated}

// Region bounds
var region_bbox = ee.Geometry.Rectangle([{xmin}, {ymin}, {xmax}, {ymax}]);

// Uploaded training samples
var samples = ee.FeatureCollection('{asset}');

// Sentinel-2 surface reflectance, cloud-filtered
var sentinel2 = ee.ImageCollection('COPERNICUS/S2_SR')
  .filterDate('{date_start}', '{date_end}')
  .filterBounds(region_bbox)
  .filter(ee.Filter.lt('CLOUDY_PIXEL_PERCENTAGE', {cloud}))
  .map(function(image) {{
    var cloudProb = image.select('MSK_CLDPRB');
    var mask = cloudProb.lt({cloud});
    return image.updateMask(mask).select(['B2','B3','B4','B8','B11','B12']);
  }});

// Median composite
var composite = sentinel2.median().clip(region_bbox);

// Spectral indices
var ndvi = composite.normalizedDifference(['B8', 'B4']).rename('NDVI');
var ndwi = composite.normalizedDifference(['B3', 'B8']).rename('NDWI');
var ndbi = composite.normalizedDifference(['B11', 'B8']).rename('NDBI');

// Stack features
var allFeatures = ee.Image.cat([composite, ndvi, ndwi, ndbi]);

// Extract training rows
var training = allFeatures.sampleRegions({{
  collection: samples,
  properties: ['class'],
  scale: {scale},
  tileScale: 4
}});

// Train/validation split
var withRandom = training.randomColumn('random');
var trainingSet = withRandom.filter(ee.Filter.lt('random', {train_fraction}));
var validationSet = withRandom.filter(ee.Filter.gte('random', {train_fraction}));

// Train the classifier
var classifier = ee.Classifier.smileRandomForest({trees}).train({{
  features: trainingSet,
  classProperty: 'class',
  inputProperties: allFeatures.bandNames()
}});

// Evaluate
var validation = validationSet.classify(classifier);
var confusionMatrix = validation.errorMatrix('class', 'classification');
print('=== {region_upper} EVALUATION ===');
print('Overall Accuracy:', confusionMatrix.accuracy());
print('Kappa:', confusionMatrix.kappa());

// Predict and display
var classified = allFeatures.classify(classifier);
Map.centerObject(region_bbox, 6);
Map.addLayer(composite, {{bands: ['B4','B3','B2'], min: 0, max: 3000}}, 'Composite');
Map.addLayer(classified, {{min: 0, max: 1, palette: ['white','green']}}, 'Wind Turbine Prediction');
Map.addLayer(samples.filter(ee.Filter.eq('class', 1)), {{color: 'yellow'}}, 'Positive Samples');
"#
    ))
}

/// Generate `<region>_prediction.js` for every named region.
///
/// Returns the written paths.
pub fn write_all_scripts(dir: impl AsRef<Path>, params: &ScriptParams) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(Region::NAMED.len());
    for region in Region::NAMED {
        let script = prediction_script(region, params)?;
        let path = dir.join(format!("{}_prediction.js", region.name()));
        fs::write(&path, script)?;
        info!("generated {}", path.display());
        written.push(path);
    }
    Ok(written)
}
