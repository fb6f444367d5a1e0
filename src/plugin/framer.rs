use crate::model::config::FramingConfig;
use crate::model::node::{Constraints, Fills, NodeId};
use crate::model::scene::{Document, SceneError};
use crate::plugin::arrange::{FramedRecord, layout_row, sort_records};
use crate::plugin::selection::filter_image_nodes;

pub const NO_IMAGES_MESSAGE: &str = "Please select at least one image";
pub const FAILED_MESSAGE: &str = "Failed to frame images. Check console for details.";

/// Options carried by a `frame-images` command.
#[derive(Debug, Clone, Default)]
pub struct FrameRequest {
    pub custom_name: Option<String>,
    pub arrange_horizontally: bool,
}

/// Per-run counts. `succeeded + skipped + failed` equals the number of image
/// nodes that were selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FramingReport {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Created frames, in processing order.
    pub frames: Vec<NodeId>,
}

impl FramingReport {
    pub fn total(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }

    /// User-facing completion notice.
    pub fn summary(&self) -> String {
        if self.succeeded == 0 {
            return FAILED_MESSAGE.to_string();
        }

        let mut message = format!("Framed {} image(s)", self.succeeded);
        let mut details = Vec::new();
        if self.skipped > 0 {
            details.push(format!("{} locked", self.skipped));
        }
        if self.failed > 0 {
            details.push(format!("{} failed", self.failed));
        }

        if details.is_empty() {
            message.push_str(" - ready to resize!");
        } else {
            message.push_str(&format!(" ({})", details.join(", ")));
        }
        message
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramingOutcome {
    /// Nothing eligible was selected; the document was not touched.
    NoImages,
    Completed(FramingReport),
}

/// Wraps every selected image node in a frame of the same size and place.
///
/// All mutations land in a single undo step. A failure on one node is logged
/// and counted; the remaining nodes are still processed.
pub fn frame_images(
    doc: &mut Document,
    request: &FrameRequest,
    config: &FramingConfig,
) -> FramingOutcome {
    let targets: Vec<NodeId> = filter_image_nodes(doc, doc.selection())
        .iter()
        .map(|image| {
            tracing::debug!("queued image {}", image.node.name);
            image.id
        })
        .collect();

    if targets.is_empty() {
        tracing::info!("frame-images requested with no image nodes selected");
        return FramingOutcome::NoImages;
    }

    let report = doc.transaction(&config.undo_label, |doc| {
        let mut report = FramingReport::default();
        let mut records = Vec::with_capacity(targets.len());

        for (i, id) in targets.iter().enumerate() {
            if let Some(node) = doc.get(*id).filter(|node| node.locked) {
                tracing::warn!("skipping locked node: {}", node.name);
                report.skipped += 1;
                continue;
            }

            match frame_one(doc, *id, request, config) {
                Ok(record) => {
                    report.frames.push(record.frame);
                    records.push(record);
                    report.succeeded += 1;
                }
                Err(err) => {
                    tracing::error!("error processing image {}: {err}", i + 1);
                    report.failed += 1;
                }
            }
        }

        if request.arrange_horizontally && !records.is_empty() {
            sort_records(&mut records);
            if let Err(err) = layout_row(doc, &records, config.gap) {
                tracing::error!("failed to arrange frames: {err}");
            }
        }

        if !report.frames.is_empty() {
            doc.set_selection(report.frames.iter().copied());
        }
        report
    });

    tracing::info!(
        succeeded = report.succeeded,
        skipped = report.skipped,
        failed = report.failed,
        total = report.total(),
        "frame-images finished"
    );
    FramingOutcome::Completed(report)
}

fn frame_name(custom: Option<&str>, original: &str, config: &FramingConfig) -> String {
    match custom.filter(|name| !name.is_empty()) {
        Some(name) => name.to_string(),
        None => format!("{}{original}", config.name_prefix),
    }
}

/// Geometry and placement of an image node before it is wrapped.
struct Origin {
    name: String,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    slot: Option<(NodeId, usize)>,
}

fn frame_one(
    doc: &mut Document,
    image: NodeId,
    request: &FrameRequest,
    config: &FramingConfig,
) -> Result<FramedRecord, SceneError> {
    let node = doc.node(image)?;
    let origin = Origin {
        name: node.name.clone(),
        x: node.x,
        y: node.y,
        width: node.width,
        height: node.height,
        slot: doc.position_in_parent(image),
    };

    let frame = doc.create_frame();
    if let Err(err) = wrap(doc, frame, image, &origin, request, config) {
        roll_back(doc, frame, image, &origin);
        return Err(err);
    }

    Ok(FramedRecord {
        frame,
        original_name: origin.name,
        x: origin.x,
        y: origin.y,
    })
}

fn wrap(
    doc: &mut Document,
    frame: NodeId,
    image: NodeId,
    origin: &Origin,
    request: &FrameRequest,
    config: &FramingConfig,
) -> Result<(), SceneError> {
    doc.set_name(
        frame,
        frame_name(request.custom_name.as_deref(), &origin.name, config),
    )?;
    doc.resize(frame, origin.width, origin.height)?;
    doc.set_fills(frame, Fills::new())?;
    doc.set_position(frame, origin.x, origin.y)?;
    if config.lock_aspect_ratio {
        doc.set_constrain_proportions(frame, true)?;
    }

    if let Some((parent, index)) = origin.slot
        && doc.node(parent)?.kind.supports_children()
    {
        doc.insert_child(parent, index, frame)?;
    }

    doc.append_child(frame, image)?;
    doc.set_position(image, 0.0, 0.0)?;
    doc.set_constraints(image, Constraints::STRETCH)?;
    Ok(())
}

// Leaves the image where it was and drops the half-built frame.
fn roll_back(doc: &mut Document, frame: NodeId, image: NodeId, origin: &Origin) {
    let image_moved = doc.get(image).and_then(|node| node.parent) == Some(frame);
    if image_moved
        && let Some((parent, index)) = origin.slot
        && let Err(err) = doc
            .insert_child(parent, index, image)
            .and_then(|()| doc.set_position(image, origin.x, origin.y))
    {
        tracing::warn!("could not restore image after failure: {err}");
        return;
    }

    if let Err(err) = doc.remove(frame) {
        tracing::warn!("could not remove partial frame: {err}");
    }
}
