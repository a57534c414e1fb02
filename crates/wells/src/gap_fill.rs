use crate::record::{Layer, WellRecord};

/// Gaps (and slivers) thinner than this are closed by snapping.
pub const DEPTH_EPSILON: f64 = 1e-6;

/// Build a contiguous layer sequence covering `[well.start_depth, well.end_depth]`.
///
/// Works on relative depths (the `unadjusted_*` pair), so it belongs before
/// terrain adjustment. Layers are walked in depth order with a cursor:
/// - a gap before the next layer becomes a synthetic `NA` layer
/// - a layer overlapping the cursor is clipped, one fully covered is dropped
/// - layers are clipped to the well span
/// - a trailing `NA` layer closes any remainder
///
/// The well itself is untouched; a new sequence is returned. Running it again
/// on its own output inserts nothing.
pub fn gap_fill(well: &WellRecord, layers: &[Layer]) -> Vec<Layer> {
    let span_start = well.start_depth.min(well.end_depth);
    let span_end = well.start_depth.max(well.end_depth);

    let mut sorted: Vec<&Layer> = layers.iter().collect();
    sorted.sort_by(|a, b| {
        a.unadjusted_start_depth
            .total_cmp(&b.unadjusted_start_depth)
            .then_with(|| a.unadjusted_end_depth.total_cmp(&b.unadjusted_end_depth))
    });

    let mut out: Vec<Layer> = Vec::with_capacity(sorted.len() + 1);
    let mut cursor = span_start;

    for layer in sorted {
        let end = layer.unadjusted_end_depth.min(span_end);
        let mut start = layer.unadjusted_start_depth.max(cursor);
        if end - start <= DEPTH_EPSILON {
            continue;
        }
        if start - cursor > DEPTH_EPSILON {
            out.push(Layer::no_data(cursor, start));
        } else {
            start = cursor;
        }

        let unchanged = start == layer.unadjusted_start_depth && end == layer.unadjusted_end_depth;
        out.push(if unchanged {
            layer.clone()
        } else {
            layer.with_relative_span(start, end)
        });
        cursor = end;
    }

    let remainder = span_end - cursor;
    if remainder > DEPTH_EPSILON {
        out.push(Layer::no_data(cursor, span_end));
    } else if remainder > 0.0 {
        if let Some(last) = out.pop() {
            let start = last.unadjusted_start_depth;
            out.push(last.with_relative_span(start, span_end));
        }
    }

    out
}

/// Gap-fill a record's own layers.
pub fn gap_fill_well(well: &WellRecord) -> Vec<Layer> {
    gap_fill(well, &well.layers)
}

/// Sum of uncovered depth inside the well span (relative depths).
pub fn total_gap(well: &WellRecord) -> f64 {
    let mut cursor = well.start_depth;
    let mut gap = 0.0;
    for layer in &well.layers {
        gap += (layer.unadjusted_start_depth - cursor).max(0.0);
        cursor = cursor.max(layer.unadjusted_end_depth);
    }
    gap + (well.end_depth - cursor).max(0.0)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{gap_fill, gap_fill_well, total_gap};
    use crate::material::{MaterialSet, MaterialType};
    use crate::record::{Layer, WellRecord};

    fn layer(start: f64, end: f64, m: MaterialType) -> Layer {
        Layer::new(MaterialSet::from([m]), start, end, None)
    }

    fn well(start: f64, end: f64, layers: Vec<Layer>) -> WellRecord {
        WellRecord {
            longitude: 0.0,
            latitude: 0.0,
            start_depth: start,
            end_depth: end,
            id: None,
            report_link: None,
            layers,
            surface_elevation: None,
        }
    }

    fn spans(layers: &[Layer]) -> Vec<(f64, f64, MaterialType)> {
        layers
            .iter()
            .map(|l| {
                (
                    l.start_depth,
                    l.end_depth,
                    *l.material_types.iter().next().unwrap(),
                )
            })
            .collect()
    }

    fn filled(w: &WellRecord) -> WellRecord {
        WellRecord {
            layers: gap_fill_well(w),
            ..w.clone()
        }
    }

    #[test]
    fn inserts_interior_gap() {
        let w = well(
            0.0,
            20.0,
            vec![
                layer(0.0, 10.0, MaterialType::Sand),
                layer(15.0, 20.0, MaterialType::Clay),
            ],
        );
        assert_eq!(
            spans(&gap_fill_well(&w)),
            vec![
                (0.0, 10.0, MaterialType::Sand),
                (10.0, 15.0, MaterialType::Na),
                (15.0, 20.0, MaterialType::Clay),
            ]
        );
    }

    #[test]
    fn fills_leading_and_trailing_gaps() {
        let w = well(0.0, 30.0, vec![layer(5.0, 12.0, MaterialType::Gravel)]);
        assert_eq!(
            spans(&gap_fill_well(&w)),
            vec![
                (0.0, 5.0, MaterialType::Na),
                (5.0, 12.0, MaterialType::Gravel),
                (12.0, 30.0, MaterialType::Na),
            ]
        );
    }

    #[test]
    fn empty_layers_become_one_na_layer() {
        let w = well(2.0, 8.0, vec![]);
        assert_eq!(spans(&gap_fill_well(&w)), vec![(2.0, 8.0, MaterialType::Na)]);
    }

    #[test]
    fn sorts_clips_overlaps_and_span() {
        let w = well(
            0.0,
            10.0,
            vec![
                layer(6.0, 14.0, MaterialType::Shale),
                layer(0.0, 4.0, MaterialType::Sand),
                layer(3.0, 7.0, MaterialType::Clay),
                layer(4.5, 5.0, MaterialType::Silt),
            ],
        );
        assert_eq!(
            spans(&gap_fill_well(&w)),
            vec![
                (0.0, 4.0, MaterialType::Sand),
                (4.0, 7.0, MaterialType::Clay),
                (7.0, 10.0, MaterialType::Shale),
            ]
        );
    }

    #[test]
    fn slivers_snap_instead_of_inserting() {
        let w = well(
            0.0,
            10.0,
            vec![
                layer(0.0, 4.0, MaterialType::Sand),
                layer(4.000_000_1, 9.999_999_9, MaterialType::Clay),
            ],
        );
        assert_eq!(
            spans(&gap_fill_well(&w)),
            vec![(0.0, 4.0, MaterialType::Sand), (4.0, 10.0, MaterialType::Clay)]
        );
    }

    #[test]
    fn is_idempotent() {
        let cases = vec![
            well(0.0, 20.0, vec![layer(15.0, 20.0, MaterialType::Clay), layer(0.0, 10.0, MaterialType::Sand)]),
            well(0.0, 30.0, vec![layer(5.0, 12.0, MaterialType::Gravel), layer(8.0, 9.0, MaterialType::Loam)]),
            well(1.5, 3.25, vec![]),
            well(0.0, 10.0, vec![layer(0.0, 4.0, MaterialType::Sand), layer(4.000_000_1, 9.999_999_9, MaterialType::Clay)]),
            well(0.0, 5.0, vec![layer(-3.0, 50.0, MaterialType::Bedrock)]),
        ];
        for w in cases {
            let once = filled(&w);
            let twice = filled(&once);
            assert_eq!(once.layers, twice.layers);
            assert_eq!(total_gap(&once), 0.0);
            assert!(
                once.layers
                    .windows(2)
                    .all(|p| p[0].start_depth <= p[1].start_depth && p[0].end_depth == p[1].start_depth)
            );
        }
    }

    #[test]
    fn leaves_well_span_untouched() {
        let w = well(0.0, 20.0, vec![layer(3.0, 4.0, MaterialType::Sand)]);
        let before = w.clone();
        let _ = gap_fill(&w, &w.layers);
        assert_eq!(w, before);
    }
}
