//! End to end conversions through the public API.

use rosbag_geojson::{
    assembler::{assemble, decompose},
    geojson::{FeatureCollection, Geometry},
    parser::{parse, parse_topic},
    topics, Datum, LocalPoint, Projector, ZoneKind,
};

const TOLERANCE_M: f64 = 0.01;

fn stockholm() -> Projector {
    Projector::new(Datum::new(59.3293, 18.0686)).unwrap()
}

fn polygon_ring(geometry: &Geometry) -> &Vec<Vec<f64>> {
    match geometry {
        Geometry::Polygon { coordinates } => &coordinates[0],
        other => panic!("expected a polygon, got {:?}", other),
    }
}

#[test]
fn docking_point_at_the_datum() {
    let dump = "\
position:
  x: 0.0
  y: 0.0
  z: 0.0
orientation:
  x: 0.0
  y: 0.0
  z: 0.0
  w: 1.0
";
    let parsed = parse_topic(topics::DOCKING_POINT, dump);
    let assembly = assemble(&parsed.blocks, &stockholm()).unwrap();

    assert_eq!(assembly.collection.features.len(), 1);
    let feature = &assembly.collection.features[0];
    assert_eq!(feature.properties.kind, Some(ZoneKind::DockingPoint));
    assert_eq!(
        feature.geometry,
        Geometry::Point {
            coordinates: vec![18.0686, 59.3293]
        }
    );
}

#[test]
fn working_area_ring_is_closed() {
    let dump = "\
points:
  -
    x: 0.0
    y: 0.0
    z: 0.0
  -
    x: 10.0
    y: 0.0
    z: 0.0
  -
    x: 10.0
    y: 10.0
    z: 0.0
  -
    x: 0.0
    y: 10.0
    z: 0.0
";
    let parsed = parse_topic(topics::MOWING_AREAS, dump);
    let assembly = assemble(&parsed.blocks, &stockholm()).unwrap();

    let feature = &assembly.collection.features[0];
    assert_eq!(feature.id(), "working_area_1");
    assert_eq!(feature.properties.kind, Some(ZoneKind::WorkingArea));
    let ring = polygon_ring(&feature.geometry);
    assert_eq!(ring.len(), 5);
    assert_eq!(ring.first(), ring.last());
}

#[test]
fn exclusion_zones_keep_discovery_order() {
    let dump = "\
/mowing_areas
areas:
  - name: \"Exclusion Zone 1\"
    area:
      points:
        - {x: 1.0, y: 1.0}
        - {x: 2.0, y: 1.0}
        - {x: 2.0, y: 2.0}
        - {x: 1.0, y: 2.0}
  - name: \"Exclusion Zone 2\"
    area:
      points:
        - {x: 5.0, y: 5.0}
        - {x: 6.0, y: 5.0}
        - {x: 6.0, y: 6.0}
        - {x: 5.0, y: 6.0}
";
    let parsed = parse(dump.lines());
    let assembly = assemble(&parsed.blocks, &stockholm()).unwrap();

    let ids: Vec<_> = assembly.collection.features.iter().map(|f| f.id()).collect();
    assert_eq!(ids, vec!["exclusion_zone_1", "exclusion_zone_2"]);
    for feature in &assembly.collection.features {
        assert_eq!(feature.properties.kind, Some(ZoneKind::ExclusionZone));
        assert_eq!(polygon_ring(&feature.geometry).len(), 5);
    }
}

#[test]
fn malformed_field_does_not_spoil_the_rest() {
    let dump = "\
name: Mowing Area
points:
  - x: N/A
    y: 0.0
  - x: 10.0
    y: 0.0
  - x: 10.0
    y: 10.0
";
    let parsed = parse(dump.lines());
    assert_eq!(parsed.diagnostics.len(), 1);
    assert_eq!(
        parsed.points("Mowing Area").unwrap(),
        &[
            LocalPoint::new(0.0, 0.0),
            LocalPoint::new(10.0, 0.0),
            LocalPoint::new(10.0, 10.0)
        ]
    );
    let assembly = assemble(&parsed.blocks, &stockholm()).unwrap();
    assert_eq!(assembly.collection.features.len(), 1);
}

#[test]
fn nothing_recovered_is_still_a_collection() {
    let parsed = parse("just some text\nwithout points\n".lines());
    let assembly = assemble(&parsed.blocks, &stockholm()).unwrap();
    let json = serde_json::to_value(&assembly.collection).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"type": "FeatureCollection", "features": []})
    );
}

#[test]
fn export_then_import_reproduces_local_points() {
    let projector = stockholm();
    let dump = "\
/docking_point
position:
  x: -2.5
  y: 1.75
orientation:
  w: 1.0
/mowing_areas
areas:
  - name: \"Front lawn\"
    area:
      points:
        - {x: 0.0, y: 0.0}
        - {x: 42.125, y: -3.5}
        - {x: 40.0, y: 30.0}
        - {x: -5.25, y: 28.0}
  - name: \"Navigation to back yard\"
    area:
      points:
        - {x: -5.0, y: 0.0}
        - {x: -150.0, y: 0.0}
        - {x: -150.0, y: 2.0}
";
    let original = parse(dump.lines());
    let assembly = assemble(&original.blocks, &projector).unwrap();
    assert_eq!(assembly.collection.features.len(), 3);

    // through a file on disk and back, the way the editor sees it
    let json = serde_json::to_string_pretty(&assembly.collection).unwrap();
    let loaded: FeatureCollection = serde_json::from_str(&json).unwrap();
    let decomposed = decompose(&loaded, &projector).unwrap();
    assert!(decomposed.diagnostics.is_empty());

    let mut reimported = parse_topic(
        topics::DOCKING_POINT,
        &decomposed.message(topics::DOCKING_POINT).unwrap().body(),
    );
    reimported.extend(parse_topic(
        topics::MOWING_AREAS,
        &decomposed.message(topics::MOWING_AREAS).unwrap().body(),
    ));

    assert_eq!(reimported.blocks.len(), original.blocks.len());
    for (before, after) in original.blocks.iter().zip(&reimported.blocks) {
        assert_eq!(before.kind, after.kind);
        assert_eq!(before.points.len(), after.points.len());
        for (a, b) in before.points.iter().zip(&after.points) {
            assert!(
                a.distance(b) < TOLERANCE_M,
                "{:?} came back as {:?}",
                a,
                b
            );
        }
    }
}
