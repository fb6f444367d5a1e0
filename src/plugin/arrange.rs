use crate::model::node::NodeId;
use crate::model::scene::{Document, SceneError};
use crate::plugin::timestamp::parse_timestamp;

/// A frame created during one run, paired with the name and origin of the
/// image it wraps.
#[derive(Debug, Clone)]
pub struct FramedRecord {
    pub frame: NodeId,
    pub original_name: String,
    pub x: f64,
    pub y: f64,
}

/// Sort key: timestamped names first, oldest to newest; then the rest by name.
/// Equal timestamps keep their relative order.
fn sort_key(name: &str) -> (bool, Option<i64>, String) {
    match parse_timestamp(name) {
        Some(ts) => (false, Some(ts), String::new()),
        None => (true, None, name.to_string()),
    }
}

/// Stable sort of `records`; each name is parsed once.
pub fn sort_records(records: &mut [FramedRecord]) {
    records.sort_by_cached_key(|record| sort_key(&record.original_name));
}

/// Lays the frames out left to right starting at the first record's origin,
/// `gap` units apart.
pub fn layout_row(
    doc: &mut Document,
    records: &[FramedRecord],
    gap: f64,
) -> Result<(), SceneError> {
    let Some(first) = records.first() else {
        return Ok(());
    };

    let y = first.y;
    let mut x = first.x;
    for record in records {
        doc.set_position(record.frame, x, y)?;
        x += doc.node(record.frame)?.width + gap;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(frame: NodeId, name: &str, x: f64, y: f64) -> FramedRecord {
        FramedRecord {
            frame,
            original_name: name.to_string(),
            x,
            y,
        }
    }

    #[test]
    fn timestamped_before_plain_and_plain_by_name() {
        let names = [
            "zebra.png",
            "Screenshot 2024-02-03 at 10.15.30.png",
            "apple.png",
            "Screenshot_20240101-080000.png",
        ];

        let mut sorted = names.to_vec();
        sorted.sort_by_key(|name| sort_key(name));
        assert_eq!(
            sorted,
            vec![
                "Screenshot_20240101-080000.png",
                "Screenshot 2024-02-03 at 10.15.30.png",
                "apple.png",
                "zebra.png",
            ]
        );
    }

    #[test]
    fn sorts_records_oldest_first_then_untimed() {
        let mut doc = Document::new();
        let a = doc.create_frame();
        let b = doc.create_frame();
        let c = doc.create_frame();

        let mut records = vec![
            record(a, "A.png", 0.0, 0.0),
            record(b, "2024-02-03-10-15-30.png", 0.0, 0.0),
            record(c, "2024-01-03-10-15-30.png", 0.0, 0.0),
        ];
        sort_records(&mut records);

        let order: Vec<NodeId> = records.iter().map(|r| r.frame).collect();
        assert_eq!(order, vec![c, b, a]);
    }

    #[test]
    fn equal_timestamps_keep_processing_order() {
        let mut doc = Document::new();
        let first = doc.create_frame();
        let second = doc.create_frame();
        let untimed = doc.create_frame();

        let mut records = vec![
            record(untimed, "b.png", 0.0, 0.0),
            record(first, "Screenshot_20240203-101530 copy.png", 0.0, 0.0),
            record(second, "2024-02-03-10-15-30.png", 0.0, 0.0),
        ];
        sort_records(&mut records);

        let order: Vec<NodeId> = records.iter().map(|r| r.frame).collect();
        assert_eq!(order, vec![first, second, untimed]);
        assert_eq!(
            sort_key("Screenshot_20240203-101530 copy.png"),
            sort_key("2024-02-03-10-15-30.png")
        );
    }

    #[test]
    fn layout_advances_by_width_plus_gap() {
        let mut doc = Document::new();
        let mut records = Vec::new();
        for (i, width) in [100.0, 150.0, 200.0].into_iter().enumerate() {
            let frame = doc.create_frame();
            doc.resize(frame, width, 80.0).unwrap();
            doc.set_position(frame, 999.0, 40.0 * i as f64).unwrap();
            records.push(record(frame, "x", 0.0, 25.0));
        }

        layout_row(&mut doc, &records, 200.0).unwrap();

        let placed: Vec<(f64, f64)> = records
            .iter()
            .map(|r| {
                let node = doc.node(r.frame).unwrap();
                (node.x, node.y)
            })
            .collect();
        assert_eq!(placed, vec![(0.0, 25.0), (300.0, 25.0), (650.0, 25.0)]);
    }

    #[test]
    fn empty_layout_is_a_noop() {
        let mut doc = Document::new();
        let revision = doc.revision();
        layout_row(&mut doc, &[], 200.0).unwrap();
        assert_eq!(doc.revision(), revision);
    }
}
