/*!
Turns recovered point lists into GeoJSON features and back.

Both directions are pure: they take the parsed or loaded data plus a
[`Projector`] and return new structures together with the diagnostics for
whatever had to be dropped. Ids come from a [`ZoneCounters`] owned by the
single call, so two conversions never share numbering.
 */
use std::collections::HashSet;

use crate::error::{Diagnostic, Error, Result};
use crate::export::{FieldBlock, TopicMessage};
use crate::geojson::{Feature, FeatureCollection, Geometry};
use crate::parser::PointBlock;
use crate::projection::{GeoPoint, LocalPoint, Projector};
use crate::topics;
use crate::zone::{ZoneCounters, ZoneKind};

const MIN_RING_POINTS: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct Assembly {
    pub collection: FeatureCollection,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Default)]
pub struct Decomposed {
    pub messages: Vec<TopicMessage>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Decomposed {
    pub fn message(&self, topic: topics::Topic) -> Option<&TopicMessage> {
        self.messages.iter().find(|message| message.topic == topic)
    }
}

/// Appends the first point when the ring is not closed yet.
///
/// Closure is structural, so the comparison is exact.
pub fn close_ring<T: PartialEq + Copy>(mut ring: Vec<T>) -> Vec<T> {
    let open = match (ring.first(), ring.last()) {
        (Some(first), Some(last)) => first != last,
        _ => false,
    };
    if open {
        let first = ring[0];
        ring.push(first);
    }
    ring
}

fn distinct_points(points: &[LocalPoint]) -> usize {
    // adding 0.0 folds -0.0 into 0.0
    points
        .iter()
        .map(|p| ((p.x + 0.0).to_bits(), (p.y + 0.0).to_bits()))
        .collect::<HashSet<_>>()
        .len()
}

/// Builds the feature collection for the blocks of one or more dumps.
///
/// Shapes with too few points are dropped with a diagnostic; a projection
/// failure aborts the whole conversion.
pub fn assemble(blocks: &[PointBlock], projector: &Projector) -> Result<Assembly> {
    let mut counters = ZoneCounters::new();
    let mut assembly = Assembly::default();

    for block in blocks {
        match block.kind {
            ZoneKind::DockingPoint => {
                let [point] = block.points.as_slice() else {
                    assembly.diagnostics.push(insufficient(block).report());
                    continue;
                };
                let geo = project(projector, *point)?;
                let id = counters.next_id(ZoneKind::DockingPoint);
                log::debug!("{} at lon {:.8} lat {:.8}", id, geo.longitude, geo.latitude);
                assembly.collection.features.push(Feature::new(
                    id,
                    ZoneKind::DockingPoint,
                    Geometry::Point {
                        coordinates: geo.to_position().to_vec(),
                    },
                ));
            }
            kind => {
                if distinct_points(&block.points) < MIN_RING_POINTS {
                    assembly.diagnostics.push(insufficient(block).report());
                    continue;
                }
                let ring = block
                    .points
                    .iter()
                    .map(|point| project(projector, *point))
                    .collect::<Result<Vec<_>>>()?;
                let ring = close_ring(ring);
                let id = counters.next_id(kind);
                log::debug!("{} from `{}` with {} coordinates", id, block.name, ring.len());
                assembly.collection.features.push(Feature::new(
                    id,
                    kind,
                    Geometry::Polygon {
                        coordinates: vec![ring.into_iter().map(|geo| geo.to_position().to_vec()).collect()],
                    },
                ));
            }
        }
    }

    if assembly.collection.features.is_empty() {
        log::warn!("no features recovered, writing an empty collection");
    }
    Ok(assembly)
}

fn insufficient(block: &PointBlock) -> Diagnostic {
    Diagnostic::InsufficientGeometry {
        name: block.name.clone(),
        kind: block.kind,
        points: block.points.len(),
    }
}

fn project(projector: &Projector, local: LocalPoint) -> Result<GeoPoint> {
    let geo = projector.to_wgs84(local)?;
    if log::log_enabled!(log::Level::Debug) {
        if let Ok(error) = projector.round_trip_error(local) {
            log::debug!(
                "({:.3}, {:.3}) -> lon {:.8} lat {:.8}, round trip error {:.6} m",
                local.x,
                local.y,
                geo.longitude,
                geo.latitude,
                error
            );
        }
    }
    Ok(geo)
}

fn position(id: &str, coordinates: &[f64]) -> Result<GeoPoint> {
    match coordinates {
        [longitude, latitude, ..] => Ok(GeoPoint::new(*longitude, *latitude)),
        _ => Err(Error::InvalidGeometry {
            id: id.to_string(),
            reason: format!("position {:?} needs longitude and latitude", coordinates),
        }),
    }
}

/// Appends `block` to the message of the topic `kind` is published on.
fn add_block(messages: &mut Vec<TopicMessage>, kind: ZoneKind, block: FieldBlock) {
    let topic = topics::for_kind(kind);
    match messages.iter_mut().find(|message| message.topic == topic) {
        Some(message) => message.blocks.push(block),
        None => messages.push(TopicMessage::new(topic, vec![block])),
    }
}

/// Splits a feature collection into the field blocks of each topic.
///
/// Only the first docking point and the outer ring of each polygon are
/// kept; everything else is reported.
pub fn decompose(collection: &FeatureCollection, projector: &Projector) -> Result<Decomposed> {
    let mut counters = ZoneCounters::new();
    let mut docked = false;
    let mut messages = Vec::new();
    let mut diagnostics = Vec::new();

    for feature in &collection.features {
        let id = feature.id();
        let Some(kind) = feature.properties.kind else {
            diagnostics.push(
                Diagnostic::UnsupportedFeature {
                    id: id.to_string(),
                    reason: "no known zone type".to_string(),
                }
                .report(),
            );
            continue;
        };

        match (kind, &feature.geometry) {
            (ZoneKind::DockingPoint, Geometry::Point { coordinates }) => {
                if docked {
                    diagnostics.push(
                        Diagnostic::UnsupportedFeature {
                            id: id.to_string(),
                            reason: "a docking point was already exported".to_string(),
                        }
                        .report(),
                    );
                    continue;
                }
                let local = projector.to_local(position(id, coordinates)?)?;
                docked = true;
                add_block(
                    &mut messages,
                    kind,
                    FieldBlock::Pose {
                        x: local.x,
                        y: local.y,
                    },
                );
            }
            (kind, Geometry::Polygon { coordinates }) if kind.is_polygon() => {
                let label = counters.next_id(kind);
                let Some(outer) = coordinates.first() else {
                    diagnostics.push(
                        Diagnostic::InsufficientGeometry {
                            name: id.to_string(),
                            kind,
                            points: 0,
                        }
                        .report(),
                    );
                    continue;
                };
                if coordinates.len() > 1 {
                    diagnostics.push(
                        Diagnostic::DiscardedRings {
                            id: id.to_string(),
                            rings: coordinates.len() - 1,
                        }
                        .report(),
                    );
                }

                let mut ring = outer
                    .iter()
                    .map(|coordinate| position(id, coordinate))
                    .collect::<Result<Vec<_>>>()?;
                if ring.len() > 1 && ring.first() == ring.last() {
                    ring.pop();
                }
                let points = ring
                    .into_iter()
                    .map(|geo| projector.to_local(geo))
                    .collect::<Result<Vec<_>>>()?;
                if distinct_points(&points) < MIN_RING_POINTS {
                    diagnostics.push(
                        Diagnostic::InsufficientGeometry {
                            name: id.to_string(),
                            kind,
                            points: points.len(),
                        }
                        .report(),
                    );
                    continue;
                }

                // the name is all the kind survives on once published
                let name = if !id.is_empty() && ZoneKind::classify(id) == kind {
                    id.to_string()
                } else {
                    label
                };
                add_block(&mut messages, kind, FieldBlock::Area { name, points });
            }
            (kind, geometry) => diagnostics.push(
                Diagnostic::UnsupportedFeature {
                    id: id.to_string(),
                    reason: format!("{} geometry cannot carry a {}", geometry.type_name(), kind),
                }
                .report(),
            ),
        }
    }

    Ok(Decomposed {
        messages,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::Datum;

    fn projector() -> Projector {
        Projector::new(Datum::new(59.3293, 18.0686)).unwrap()
    }

    fn block(name: &str, kind: ZoneKind, points: &[(f64, f64)]) -> PointBlock {
        PointBlock {
            name: name.to_string(),
            topic: None,
            kind,
            points: points.iter().map(|&(x, y)| LocalPoint::new(x, y)).collect(),
        }
    }

    const SQUARE: [(f64, f64); 4] = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];

    #[test]
    fn test_close_ring() {
        assert_eq!(close_ring(vec![1, 2, 3]), vec![1, 2, 3, 1]);
        assert_eq!(close_ring(vec![1, 2, 3, 1]), vec![1, 2, 3, 1]);
        assert_eq!(close_ring(Vec::<i32>::new()), Vec::<i32>::new());
        let once = close_ring(vec![0.5, 1.5, 2.5]);
        assert_eq!(close_ring(once.clone()), once);
    }

    #[test]
    fn test_docking_point_at_datum() {
        let assembly = assemble(&[block("/docking_point", ZoneKind::DockingPoint, &[(0.0, 0.0)])], &projector()).unwrap();
        let feature = &assembly.collection.features[0];
        assert_eq!(feature.id(), "docking_point");
        assert_eq!(
            feature.geometry,
            Geometry::Point {
                coordinates: vec![18.0686, 59.3293]
            }
        );
    }

    #[test]
    fn test_docking_point_needs_exactly_one_point() {
        let blocks = [
            block("/docking_point", ZoneKind::DockingPoint, &[]),
            block("/docking_point", ZoneKind::DockingPoint, &[(1.0, 1.0), (2.0, 2.0)]),
        ];
        let assembly = assemble(&blocks, &projector()).unwrap();
        assert!(assembly.collection.features.is_empty());
        assert_eq!(assembly.diagnostics.len(), 2);
    }

    #[test]
    fn test_polygon_is_closed_and_numbered() {
        let blocks = [
            block("lawn", ZoneKind::WorkingArea, &SQUARE),
            block("back lawn", ZoneKind::WorkingArea, &SQUARE),
        ];
        let assembly = assemble(&blocks, &projector()).unwrap();
        let features = &assembly.collection.features;
        assert_eq!(features[0].id(), "working_area_1");
        assert_eq!(features[1].id(), "working_area_2");
        let Geometry::Polygon { coordinates } = &features[0].geometry else {
            panic!("expected a polygon");
        };
        assert_eq!(coordinates.len(), 1);
        assert_eq!(coordinates[0].len(), 5);
        assert_eq!(coordinates[0][0], coordinates[0][4]);
    }

    #[test]
    fn test_already_closed_ring_is_not_closed_twice() {
        let closed = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 0.0)];
        let assembly = assemble(&[block("lawn", ZoneKind::WorkingArea, &closed)], &projector()).unwrap();
        let Geometry::Polygon { coordinates } = &assembly.collection.features[0].geometry else {
            panic!("expected a polygon");
        };
        assert_eq!(coordinates[0].len(), 4);
    }

    #[test]
    fn test_too_few_distinct_points_are_dropped() {
        let blocks = [
            block("a", ZoneKind::WorkingArea, &[(0.0, 0.0), (1.0, 0.0)]),
            block("b", ZoneKind::ExclusionZone, &[(0.0, 0.0), (1.0, 0.0), (-0.0, 0.0)]),
            block("c", ZoneKind::ExclusionZone, &SQUARE),
        ];
        let assembly = assemble(&blocks, &projector()).unwrap();
        assert_eq!(assembly.collection.features.len(), 1);
        assert_eq!(assembly.collection.features[0].id(), "exclusion_zone_1");
        assert_eq!(
            assembly.diagnostics[0],
            Diagnostic::InsufficientGeometry {
                name: "a".to_string(),
                kind: ZoneKind::WorkingArea,
                points: 2,
            }
        );
    }

    #[test]
    fn test_empty_input_gives_empty_collection() {
        let assembly = assemble(&[], &projector()).unwrap();
        assert!(assembly.collection.features.is_empty());
        assert_eq!(assembly.collection.typ, "FeatureCollection");
    }

    #[test]
    fn test_projection_failure_propagates() {
        let far = 4.0e7;
        let result = assemble(&[block("lawn", ZoneKind::WorkingArea, &[(0.0, 0.0), (far, 0.0), (0.0, 1.0)])], &projector());
        assert!(matches!(result, Err(Error::DegenerateProjection(_))));
    }

    #[test]
    fn test_decompose_round_trip() {
        let projector = projector();
        let blocks = [
            block("/docking_point", ZoneKind::DockingPoint, &[(3.0, -4.0)]),
            block("Exclusion Zone 1", ZoneKind::ExclusionZone, &SQUARE),
        ];
        let assembly = assemble(&blocks, &projector).unwrap();
        let decomposed = decompose(&assembly.collection, &projector).unwrap();
        assert!(decomposed.diagnostics.is_empty());

        let dock = decomposed.message(topics::DOCKING_POINT).unwrap();
        let FieldBlock::Pose { x, y } = dock.blocks[0] else {
            panic!("expected a pose");
        };
        assert!((x - 3.0).abs() < 0.01 && (y + 4.0).abs() < 0.01);

        let areas = decomposed.message(topics::MOWING_AREAS).unwrap();
        let FieldBlock::Area { name, points } = &areas.blocks[0] else {
            panic!("expected an area");
        };
        assert_eq!(name, "exclusion_zone_1");
        assert_eq!(points.len(), 4);
        for (point, &(x, y)) in points.iter().zip(SQUARE.iter()) {
            assert!(point.distance(&LocalPoint::new(x, y)) < 0.01);
        }
    }

    #[test]
    fn test_decompose_reports_dropped_parts() {
        let projector = projector();
        let ring = |offset: f64| {
            vec![
                vec![18.0686 + offset, 59.3293],
                vec![18.0687 + offset, 59.3293],
                vec![18.0687 + offset, 59.3294],
                vec![18.0686 + offset, 59.3293],
            ]
        };
        let mut unknown = Feature::new("flowers".to_string(), ZoneKind::WorkingArea, Geometry::Unsupported);
        unknown.properties.kind = None;
        let collection = FeatureCollection::new(vec![
            Feature::new(
                "garden".to_string(),
                ZoneKind::ExclusionZone,
                Geometry::Polygon {
                    coordinates: vec![ring(0.0), ring(0.00001)],
                },
            ),
            Feature::new(
                "dock".to_string(),
                ZoneKind::DockingPoint,
                Geometry::Polygon {
                    coordinates: vec![ring(0.0)],
                },
            ),
            unknown,
            Feature::new(
                "sliver".to_string(),
                ZoneKind::WorkingArea,
                Geometry::Polygon {
                    coordinates: vec![vec![vec![18.0, 59.0], vec![18.1, 59.0], vec![18.0, 59.0]]],
                },
            ),
        ]);
        let decomposed = decompose(&collection, &projector).unwrap();

        let areas = decomposed.message(topics::MOWING_AREAS).unwrap();
        assert_eq!(areas.blocks.len(), 1);
        let FieldBlock::Area { name, points } = &areas.blocks[0] else {
            panic!("expected an area");
        };
        // `garden` would come back as a working area, so the generated label is used
        assert_eq!(name, "exclusion_zone_1");
        assert_eq!(points.len(), 3);
        assert!(decomposed.message(topics::DOCKING_POINT).is_none());

        assert_eq!(
            decomposed.diagnostics[0],
            Diagnostic::DiscardedRings {
                id: "garden".to_string(),
                rings: 1
            }
        );
        assert!(matches!(&decomposed.diagnostics[1], Diagnostic::UnsupportedFeature { id, .. } if id == "dock"));
        assert!(matches!(&decomposed.diagnostics[2], Diagnostic::UnsupportedFeature { id, .. } if id == "flowers"));
        assert!(matches!(
            &decomposed.diagnostics[3],
            Diagnostic::InsufficientGeometry { points: 2, .. }
        ));
    }

    #[test]
    fn test_decompose_needs_distinct_points() {
        let (a, b) = (vec![18.0686, 59.3293], vec![18.0687, 59.3293]);
        let collection = FeatureCollection::new(vec![Feature::new(
            "working_area_1".to_string(),
            ZoneKind::WorkingArea,
            Geometry::Polygon {
                coordinates: vec![vec![a.clone(), a.clone(), b, a]],
            },
        )]);
        let decomposed = decompose(&collection, &projector()).unwrap();
        assert!(decomposed.messages.is_empty());
        assert_eq!(
            decomposed.diagnostics,
            vec![Diagnostic::InsufficientGeometry {
                name: "working_area_1".to_string(),
                kind: ZoneKind::WorkingArea,
                points: 3,
            }]
        );
    }

    #[test]
    fn test_decompose_groups_blocks_by_topic() {
        let projector = projector();
        let blocks = [
            block("lawn", ZoneKind::WorkingArea, &SQUARE),
            block("/docking_point", ZoneKind::DockingPoint, &[(1.0, 1.0)]),
            block("Exclusion Zone 1", ZoneKind::ExclusionZone, &SQUARE),
        ];
        let assembly = assemble(&blocks, &projector).unwrap();
        let decomposed = decompose(&assembly.collection, &projector).unwrap();
        let layout: Vec<_> = decomposed.messages.iter().map(|m| (m.topic, m.blocks.len())).collect();
        assert_eq!(layout, vec![(topics::MOWING_AREAS, 2), (topics::DOCKING_POINT, 1)]);
    }

    #[test]
    fn test_decompose_rejects_short_position() {
        let collection = FeatureCollection::new(vec![Feature::new(
            "docking_point".to_string(),
            ZoneKind::DockingPoint,
            Geometry::Point {
                coordinates: vec![18.0],
            },
        )]);
        assert!(matches!(
            decompose(&collection, &projector()),
            Err(Error::InvalidGeometry { .. })
        ));
    }
}
