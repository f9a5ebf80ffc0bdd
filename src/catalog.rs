use std::{collections::HashMap, fs::File, io::BufReader, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::error::{FrameshotError, FrameshotResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
    Front,
    Left,
    Right,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
            Orientation::Front => "front",
            Orientation::Left => "left",
            Orientation::Right => "right",
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Screen region as stored in the geometry database.
///
/// This is the wire form; resolved bounds are always recomputed from it
/// (or from the polygon, or from the frame's alpha channel).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// One device frame: catalog naming merged with its screen geometry.
///
/// Immutable once merged. At most one of `screen_polygon`/`screen_rect` is
/// meaningful (polygon wins); with neither, bounds come from scanning the
/// frame image's alpha channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceFrame {
    pub filename: String,
    pub brand: String,
    pub model: String,
    pub orientation: Orientation,
    #[serde(default)]
    pub aspect_ratio: Option<f64>,
    #[serde(default)]
    pub screen_polygon: Option<Vec<[f64; 2]>>,
    #[serde(default)]
    pub screen_rect: Option<ScreenRect>,
}

impl DeviceFrame {
    /// `{brand}-{model}-{orientation}`, lowercased with whitespace collapsed
    /// to `-` so it is safe as a filename stem.
    pub fn file_stem(&self) -> String {
        fn slug(s: &str) -> String {
            s.trim()
                .to_lowercase()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join("-")
        }
        format!(
            "{}-{}-{}",
            slug(&self.brand),
            slug(&self.model),
            self.orientation.as_str()
        )
    }
}

/// Device list as the UI layer publishes it: groups of frames that share
/// brand/model naming.
#[derive(Clone, Debug, Deserialize)]
pub struct CatalogFeed {
    pub groups: Vec<DeviceGroup>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DeviceGroup {
    pub key: String,
    pub brand: String,
    pub model: String,
    pub items: Vec<GroupItem>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GroupItem {
    pub filename: String,
    pub orientation: Orientation,
    #[serde(default)]
    pub aspect_ratio: Option<f64>,
}

/// Geometry database keyed by `(device_id, orientation)`, cross-referenced
/// against the feed by filename (with a legacy-filename alias).
#[derive(Clone, Debug, Deserialize)]
pub struct GeometryDb {
    pub devices: Vec<GeometryDevice>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GeometryDevice {
    pub device_id: String,
    pub orientations: Vec<GeometryRecord>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GeometryRecord {
    pub name: Orientation,
    pub filename: String,
    #[serde(default)]
    pub legacy_filename: Option<String>,
    #[serde(default)]
    pub screen_polygon: Option<Vec<[f64; 2]>>,
    #[serde(default)]
    pub screen_rect: Option<ScreenRect>,
}

/// Merged, lookup-ready device catalog.
#[derive(Clone, Debug, Default)]
pub struct DeviceCatalog {
    frames: Vec<DeviceFrame>,
    index: HashMap<(String, String, Orientation), usize>,
}

impl DeviceCatalog {
    pub fn load(catalog_path: &Path, geometry_path: &Path) -> FrameshotResult<Self> {
        let feed: CatalogFeed = read_json(catalog_path)?;
        let db: GeometryDb = read_json(geometry_path)?;
        Self::from_parts(feed, &db)
    }

    pub fn from_parts(feed: CatalogFeed, db: &GeometryDb) -> FrameshotResult<Self> {
        let mut by_filename: HashMap<&str, (&str, &GeometryRecord)> = HashMap::new();
        for device in &db.devices {
            for rec in &device.orientations {
                if rec.filename.trim().is_empty() {
                    return Err(FrameshotError::catalog(format!(
                        "geometry record for device '{}' has an empty filename",
                        device.device_id
                    )));
                }
                if by_filename
                    .insert(rec.filename.as_str(), (device.device_id.as_str(), rec))
                    .is_some()
                {
                    return Err(FrameshotError::catalog(format!(
                        "geometry filename '{}' is defined twice",
                        rec.filename
                    )));
                }
                if let Some(alias) = &rec.legacy_filename {
                    by_filename.insert(alias.as_str(), (device.device_id.as_str(), rec));
                }
            }
        }

        let mut frames = Vec::new();
        let mut index = HashMap::new();
        for group in &feed.groups {
            if group.brand.trim().is_empty() || group.model.trim().is_empty() {
                return Err(FrameshotError::catalog(format!(
                    "group '{}' is missing brand or model",
                    group.key
                )));
            }
            for item in &group.items {
                if item.filename.trim().is_empty() {
                    return Err(FrameshotError::catalog(format!(
                        "group '{}' has an item with an empty filename",
                        group.key
                    )));
                }
                let rec = by_filename.get(item.filename.as_str());
                if let Some(&(device_id, rec)) = rec
                    && rec.name != item.orientation
                {
                    tracing::warn!(
                        filename = %item.filename,
                        device_id,
                        feed = item.orientation.as_str(),
                        geometry = rec.name.as_str(),
                        "orientation mismatch between catalog feed and geometry record"
                    );
                }

                let frame = DeviceFrame {
                    filename: item.filename.clone(),
                    brand: group.brand.clone(),
                    model: group.model.clone(),
                    orientation: item.orientation,
                    aspect_ratio: item.aspect_ratio,
                    screen_polygon: rec.and_then(|(_, r)| r.screen_polygon.clone()),
                    screen_rect: rec.and_then(|(_, r)| r.screen_rect),
                };
                let key = lookup_key(&frame.brand, &frame.model, frame.orientation);
                if index.insert(key, frames.len()).is_some() {
                    return Err(FrameshotError::catalog(format!(
                        "duplicate device entry for {} {} ({})",
                        frame.brand, frame.model, frame.orientation
                    )));
                }
                frames.push(frame);
            }
        }

        Ok(Self { frames, index })
    }

    pub fn lookup(
        &self,
        brand: &str,
        model: &str,
        orientation: Orientation,
    ) -> Option<&DeviceFrame> {
        self.index
            .get(&lookup_key(brand, model, orientation))
            .map(|&i| &self.frames[i])
    }

    pub fn frames(&self) -> &[DeviceFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

fn lookup_key(brand: &str, model: &str, orientation: Orientation) -> (String, String, Orientation) {
    (
        brand.trim().to_lowercase(),
        model.trim().to_lowercase(),
        orientation,
    )
}

fn read_json<T: DeserializeOwned>(path: &Path) -> FrameshotResult<T> {
    let f = File::open(path).with_context(|| format!("open '{}'", path.display()))?;
    let value =
        serde_json::from_reader(BufReader::new(f)).with_context(|| format!("parse '{}'", path.display()))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic_feed() -> CatalogFeed {
        CatalogFeed {
            groups: vec![DeviceGroup {
                key: "apple-iphone-15".into(),
                brand: "Apple".into(),
                model: "iPhone 15".into(),
                items: vec![
                    GroupItem {
                        filename: "apple-iphone15-portrait.png".into(),
                        orientation: Orientation::Portrait,
                        aspect_ratio: Some(0.49),
                    },
                    GroupItem {
                        filename: "iphone15-land-old.png".into(),
                        orientation: Orientation::Landscape,
                        aspect_ratio: None,
                    },
                ],
            }],
        }
    }

    fn basic_db() -> GeometryDb {
        GeometryDb {
            devices: vec![GeometryDevice {
                device_id: "iphone-15".into(),
                orientations: vec![
                    GeometryRecord {
                        name: Orientation::Portrait,
                        filename: "apple-iphone15-portrait.png".into(),
                        legacy_filename: None,
                        screen_polygon: Some(vec![
                            [40.0, 40.0],
                            [360.0, 40.0],
                            [360.0, 760.0],
                            [40.0, 760.0],
                        ]),
                        screen_rect: None,
                    },
                    GeometryRecord {
                        name: Orientation::Landscape,
                        filename: "apple-iphone15-landscape.png".into(),
                        legacy_filename: Some("iphone15-land-old.png".into()),
                        screen_polygon: None,
                        screen_rect: Some(ScreenRect {
                            x: 40.0,
                            y: 40.0,
                            w: 720.0,
                            h: 320.0,
                        }),
                    },
                ],
            }],
        }
    }

    #[test]
    fn merge_joins_geometry_by_filename() {
        let catalog = DeviceCatalog::from_parts(basic_feed(), &basic_db()).unwrap();
        assert_eq!(catalog.len(), 2);

        let portrait = catalog
            .lookup("Apple", "iPhone 15", Orientation::Portrait)
            .unwrap();
        assert!(portrait.screen_polygon.is_some());
        assert!(portrait.screen_rect.is_none());
        assert_eq!(portrait.aspect_ratio, Some(0.49));
    }

    #[test]
    fn merge_resolves_legacy_filename_alias() {
        let catalog = DeviceCatalog::from_parts(basic_feed(), &basic_db()).unwrap();
        let landscape = catalog
            .lookup("apple", "iphone 15", Orientation::Landscape)
            .unwrap();
        assert_eq!(landscape.filename, "iphone15-land-old.png");
        assert_eq!(
            landscape.screen_rect,
            Some(ScreenRect {
                x: 40.0,
                y: 40.0,
                w: 720.0,
                h: 320.0,
            })
        );
    }

    #[test]
    fn lookup_is_case_insensitive_and_misses_cleanly() {
        let catalog = DeviceCatalog::from_parts(basic_feed(), &basic_db()).unwrap();
        assert!(
            catalog
                .lookup("APPLE", "IPHONE 15", Orientation::Portrait)
                .is_some()
        );
        assert!(
            catalog
                .lookup("Apple", "iPhone 15", Orientation::Front)
                .is_none()
        );
        assert!(
            catalog
                .lookup("Nokia", "3310", Orientation::Portrait)
                .is_none()
        );
    }

    #[test]
    fn frame_without_geometry_record_keeps_no_geometry() {
        let mut feed = basic_feed();
        feed.groups[0].items.push(GroupItem {
            filename: "unknown.png".into(),
            orientation: Orientation::Front,
            aspect_ratio: None,
        });
        let catalog = DeviceCatalog::from_parts(feed, &basic_db()).unwrap();
        let frame = catalog
            .lookup("Apple", "iPhone 15", Orientation::Front)
            .unwrap();
        assert!(frame.screen_polygon.is_none());
        assert!(frame.screen_rect.is_none());
    }

    #[test]
    fn duplicate_device_entries_are_rejected() {
        let mut feed = basic_feed();
        feed.groups[0].items.push(GroupItem {
            filename: "another.png".into(),
            orientation: Orientation::Portrait,
            aspect_ratio: None,
        });
        let err = DeviceCatalog::from_parts(feed, &basic_db()).unwrap_err();
        assert!(err.to_string().contains("duplicate device entry"));
    }

    #[test]
    fn duplicate_geometry_filename_is_rejected() {
        let mut db = basic_db();
        let dup = db.devices[0].orientations[0].clone();
        db.devices[0].orientations.push(dup);
        let err = DeviceCatalog::from_parts(basic_feed(), &db).unwrap_err();
        assert!(err.to_string().contains("defined twice"));
    }

    #[test]
    fn orientation_serde_uses_lowercase_names() {
        let o: Orientation = serde_json::from_str("\"landscape\"").unwrap();
        assert_eq!(o, Orientation::Landscape);
        assert_eq!(serde_json::to_string(&o).unwrap(), "\"landscape\"");
        assert!(serde_json::from_str::<Orientation>("\"sideways\"").is_err());
    }

    #[test]
    fn file_stem_slugs_brand_and_model() {
        let catalog = DeviceCatalog::from_parts(basic_feed(), &basic_db()).unwrap();
        let frame = catalog
            .lookup("Apple", "iPhone 15", Orientation::Portrait)
            .unwrap();
        assert_eq!(frame.file_stem(), "apple-iphone-15-portrait");
    }
}
