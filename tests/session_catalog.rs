use frameshot::catalog::{CatalogFeed, GeometryDb};
use frameshot::{
    AppearanceConfig, Bounds, DeviceCatalog, Orientation, Present, Raster, RenderSession,
};

const FEED_JSON: &str = r#"{
    "groups": [
        {
            "key": "acme-one",
            "brand": "Acme",
            "model": "One",
            "items": [
                { "filename": "acme-one-portrait.png", "orientation": "portrait", "aspect_ratio": 0.5 },
                { "filename": "one-land-legacy.png", "orientation": "landscape" }
            ]
        }
    ]
}"#;

const GEOMETRY_JSON: &str = r#"{
    "devices": [
        {
            "device_id": "acme-one",
            "orientations": [
                {
                    "name": "portrait",
                    "filename": "acme-one-portrait.png",
                    "screen_polygon": [[8.0, 8.0], [56.0, 8.0], [56.0, 120.0], [8.0, 120.0]]
                },
                {
                    "name": "landscape",
                    "filename": "acme-one-landscape.png",
                    "legacy_filename": "one-land-legacy.png",
                    "screen_rect": { "x": 8.0, "y": 8.0, "w": 112.0, "h": 48.0 }
                }
            ]
        }
    ]
}"#;

fn parse_catalog() -> DeviceCatalog {
    let feed: CatalogFeed = serde_json::from_str(FEED_JSON).unwrap();
    let db: GeometryDb = serde_json::from_str(GEOMETRY_JSON).unwrap();
    DeviceCatalog::from_parts(feed, &db).unwrap()
}

fn solid(w: u32, h: u32, rgba: [u8; 4]) -> Raster {
    let mut data = Vec::with_capacity((w * h * 4) as usize);
    for _ in 0..w * h {
        data.extend_from_slice(&rgba);
    }
    Raster::from_premul_bytes(w, h, data).unwrap()
}

fn bezel_frame(w: u32, h: u32, cutout: [u32; 4]) -> Raster {
    let [cx, cy, cw, ch] = cutout;
    let mut data = vec![0u8; (w * h * 4) as usize];
    for y in 0..h {
        for x in 0..w {
            let inside = (cx..cx + cw).contains(&x) && (cy..cy + ch).contains(&y);
            if !inside {
                let i = ((y * w + x) * 4) as usize;
                data[i..i + 4].copy_from_slice(&[40, 40, 40, 255]);
            }
        }
    }
    Raster::from_premul_bytes(w, h, data).unwrap()
}

#[test]
fn wire_json_flows_into_a_framed_render() {
    let catalog = parse_catalog();
    let meta = catalog
        .lookup("acme", "one", Orientation::Portrait)
        .unwrap()
        .clone();
    assert_eq!(meta.aspect_ratio, Some(0.5));

    let mut session = RenderSession::new();
    session.load_frame(meta, bezel_frame(64, 128, [8, 8, 48, 112]));
    session.set_screenshot(Some(solid(24, 24, [200, 40, 40, 255])));

    let frame = session.frame().unwrap();
    assert_eq!(frame.bounds, Bounds::new(8.0, 8.0, 48.0, 112.0));

    let surface = session.render().unwrap();
    assert_eq!((surface.width(), surface.height()), (64, 128));
    assert_eq!(surface.alpha_at(32, 64), 255);
}

#[test]
fn legacy_filename_alias_keeps_geometry_attached() {
    let catalog = parse_catalog();
    let meta = catalog
        .lookup("Acme", "One", Orientation::Landscape)
        .unwrap();
    assert_eq!(meta.filename, "one-land-legacy.png");
    let rect = meta.screen_rect.unwrap();
    assert_eq!((rect.x, rect.y, rect.w, rect.h), (8.0, 8.0, 112.0, 48.0));
}

#[test]
fn stale_rebuild_is_discarded_in_favor_of_newer_input() {
    let mut session = RenderSession::new();
    session
        .set_appearance(AppearanceConfig {
            frameless: true,
            padding_px: 4,
            ..AppearanceConfig::default()
        })
        .unwrap();
    session.set_screenshot(Some(solid(16, 16, [40, 40, 220, 255])));

    let ticket = session.begin();
    let stale = session.compose().unwrap();
    session.set_screenshot(Some(solid(16, 16, [220, 220, 40, 255])));
    assert_eq!(session.present(ticket, stale), Present::Stale);
    assert!(session.current().is_none());

    let ticket = session.begin();
    let fresh = session.compose().unwrap();
    assert_eq!(session.present(ticket, fresh), Present::Presented);

    let shown = session.current().unwrap();
    assert_eq!((shown.width(), shown.height()), (24, 24));
    let i = ((12 * shown.width() + 12) * 4) as usize;
    assert_eq!(&shown.data()[i..i + 4], &[220, 220, 40, 255]);
}

#[test]
fn duplicate_wire_entries_are_rejected() {
    let feed: CatalogFeed = serde_json::from_str(
        r#"{
            "groups": [
                {
                    "key": "acme-one",
                    "brand": "Acme",
                    "model": "One",
                    "items": [
                        { "filename": "a.png", "orientation": "portrait" },
                        { "filename": "b.png", "orientation": "portrait" }
                    ]
                }
            ]
        }"#,
    )
    .unwrap();
    let db: GeometryDb = serde_json::from_str(r#"{ "devices": [] }"#).unwrap();
    let err = DeviceCatalog::from_parts(feed, &db).unwrap_err();
    assert!(err.to_string().contains("duplicate device entry"));
}
