//! Directional role probing around reaction arrows.
//!
//! [`RoleProbe`] walks outward from each arrow along the arrow's own
//! direction, probing with short perpendicular cross-sections to collect
//! the diagrams on either side. The group nearer the arrow's reference
//! point becomes the products of the step, the other group the reactants.
//! When one side comes up empty the probe assumes the layout wraps across
//! print lines and re-anchors the scan on a neighbouring line recovered by
//! density clustering.

mod cluster;

use nalgebra::Vector2;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::core::{ProbeConfig, SchemeError, SchemeResult};
use crate::geometry::{Line, Point, Rect};
use crate::model::{Arrow, ArrowId, Diagram, DiagramId, ReactionStep, StepId};
use crate::surface::Surface;

use cluster::dbscan_1d;

/// Which neighbouring print line to search during the multi-line fallback.
///
/// An arrow stranded near the left page edge continues a reaction that
/// started at the right end of the line above; one near the right edge
/// continues onto the left end of the line below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineSearch {
    AboveRight,
    BelowLeft,
}

/// Directional scanning engine assigning reactant/product roles.
///
/// The probe owns the scheme's arrows and diagrams for the duration of the
/// scan so it can maintain the diagrams' step back-references, and yields
/// them back through [`RoleProbe::into_parts`].
#[derive(Debug)]
pub struct RoleProbe<'f> {
    fig: &'f Surface,
    arrows: Vec<Arrow>,
    diagrams: Vec<Diagram>,
    steps: Vec<ReactionStep>,
    step_size: f32,
    segment_length: f32,
    config: ProbeConfig,
}

impl<'f> RoleProbe<'f> {
    /// Creates a probe over the scheme's arrows and candidate diagrams.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error when `diagrams` is empty; the scan
    /// parameters are derived from the diagram dimensions.
    pub fn new(fig: &'f Surface, arrows: Vec<Arrow>, diagrams: Vec<Diagram>) -> SchemeResult<Self> {
        Self::with_config(fig, arrows, diagrams, ProbeConfig::default())
    }

    /// Creates a probe with an explicit configuration.
    pub fn with_config(
        fig: &'f Surface,
        arrows: Vec<Arrow>,
        diagrams: Vec<Diagram>,
        config: ProbeConfig,
    ) -> SchemeResult<Self> {
        config.validate()?;
        if diagrams.is_empty() {
            return Err(SchemeError::invalid_input(
                "role probing requires at least one candidate diagram",
            ));
        }

        // The walk must never stride past a diagram without sampling it.
        let step_size = diagrams
            .iter()
            .flat_map(|d| [d.rect().width(), d.rect().height()])
            .min()
            .unwrap_or(1) as f32;
        let segment_length = diagrams
            .iter()
            .map(|d| (d.rect().width() + d.rect().height()) as f32 / 2.0)
            .sum::<f32>()
            / diagrams.len() as f32;

        Ok(Self {
            fig,
            arrows,
            diagrams,
            steps: Vec::new(),
            step_size,
            segment_length,
            config,
        })
    }

    /// Distance between consecutive sample points.
    #[inline]
    pub fn step_size(&self) -> f32 {
        self.step_size
    }

    /// Length of each probing cross-section.
    #[inline]
    pub fn segment_length(&self) -> f32 {
        self.segment_length
    }

    /// The arrows being probed.
    #[inline]
    pub fn arrows(&self) -> &[Arrow] {
        &self.arrows
    }

    /// The candidate diagrams, with their step back-references.
    #[inline]
    pub fn diagrams(&self) -> &[Diagram] {
        &self.diagrams
    }

    /// The reaction steps produced so far, in probing order.
    #[inline]
    pub fn steps(&self) -> &[ReactionStep] {
        &self.steps
    }

    /// Consumes the probe, yielding arrows, diagrams and steps.
    pub fn into_parts(self) -> (Vec<Arrow>, Vec<Diagram>, Vec<ReactionStep>) {
        (self.arrows, self.diagrams, self.steps)
    }

    /// Probes every arrow in order.
    pub fn probe_all(&mut self) -> SchemeResult<()> {
        for idx in 0..self.arrows.len() {
            self.probe_arrow(ArrowId(idx))?;
        }
        Ok(())
    }

    /// Probes around one arrow and records the resulting reaction step.
    ///
    /// An incomplete step (one side empty even after the multi-line
    /// fallback) is recorded and logged rather than dropped, so callers
    /// can surface it for review.
    pub fn probe_arrow(&mut self, arrow_id: ArrowId) -> SchemeResult<()> {
        let arrow = self
            .arrows
            .get(arrow_id.0)
            .ok_or_else(|| SchemeError::invalid_input(format!("unknown arrow id {}", arrow_id.0)))?;
        let (direction, normal) = scan_directions(arrow);
        let center = arrow.center();

        let mut side_a = self.line_scan(arrow_id, center, direction, normal, -1.0)?;
        let mut side_b = self.line_scan(arrow_id, center, direction, normal, 1.0)?;

        let mut single_line = true;
        if side_a.is_empty() || side_b.is_empty() {
            // Assume the reaction wraps onto another print line; pick the
            // line from the arrow's proximity to the page edges.
            single_line = false;
            let width = self.fig.width() as f32;
            let search = if center.x <= width - center.x {
                LineSearch::AboveRight
            } else {
                LineSearch::BelowLeft
            };
            debug!(arrow = arrow_id.0, ?search, "probe side empty, searching another line");
            if side_a.is_empty() {
                side_a = self
                    .search_other_line(arrow_id, search, direction, normal, -1.0)?
                    .unwrap_or_default();
            }
            if side_b.is_empty() {
                side_b = self
                    .search_other_line(arrow_id, search, direction, normal, 1.0)?
                    .unwrap_or_default();
            }
        }

        // A diagram straddling the arrow can be hit from both directions;
        // keep it on the side scanned first.
        side_b.retain(|id| !side_a.contains(id));

        let (reactants, products) = self.assign_roles(side_a, side_b, arrow_id);
        let step = ReactionStep::new(arrow_id, reactants, products, single_line)?;
        if !step.is_complete() {
            warn!(
                arrow = arrow_id.0,
                "recording incomplete reaction step for review"
            );
        }

        let step_id = StepId(self.steps.len());
        let members: Vec<DiagramId> = step.species().collect();
        for id in members {
            self.diagrams[id.0].steps_mut().push(step_id);
        }
        self.steps.push(step);
        Ok(())
    }

    /// Prunes diagrams that sit too far from the rest of their group.
    ///
    /// Only single-line steps are examined; cross-line layouts have
    /// inherently larger gaps. A pruned diagram loses both its group
    /// membership and its back-reference to the step.
    pub fn resolve_nodes(&mut self) {
        for diagram_idx in 0..self.diagrams.len() {
            let diagram_rect = self.diagrams[diagram_idx].rect();
            let step_ids: Vec<StepId> = self.diagrams[diagram_idx].steps().to_vec();
            for step_id in step_ids {
                let (group, arrow_rect, single_line) = {
                    let step = &self.steps[step_id.0];
                    let id = DiagramId(diagram_idx);
                    let group = if step.reactants().contains(&id) {
                        step.reactants().to_vec()
                    } else {
                        step.products().to_vec()
                    };
                    (group, self.arrows[step.arrow().0].rect(), step.single_line())
                };
                if !single_line {
                    continue;
                }

                let mut nearest = diagram_rect.edge_separation(&arrow_rect);
                for other in &group {
                    if other.0 != diagram_idx {
                        nearest =
                            nearest.min(diagram_rect.edge_separation(&self.diagrams[other.0].rect()));
                    }
                }

                if nearest > self.config.max_group_distance {
                    debug!(
                        diagram = diagram_idx,
                        step = step_id.0,
                        distance = nearest,
                        "pruning distant diagram from step"
                    );
                    self.steps[step_id.0].remove_diagram(DiagramId(diagram_idx));
                    self.diagrams[diagram_idx]
                        .steps_mut()
                        .retain(|s| *s != step_id);
                }
            }
        }
    }

    /// Walks from `start` in the signed scan direction, probing with
    /// perpendicular segments, and returns the hit diagrams in first-hit
    /// order.
    fn line_scan(
        &self,
        arrow_id: ArrowId,
        start: Point,
        direction: Vector2<f32>,
        normal: Vector2<f32>,
        sign: f32,
    ) -> SchemeResult<Vec<DiagramId>> {
        let mut segments = Vec::new();
        for center in self.sample_centers(start, direction, sign) {
            segments.push(self.probing_segment(center, normal)?);
        }

        // Stop at the first segment that crosses another arrow, unless the
        // crossing lies within the leading tolerance window: neighbouring
        // arrows may sit close together without ending the scan.
        let crossing = segments.iter().position(|segment| {
            self.arrows.iter().enumerate().any(|(idx, other)| {
                idx != arrow_id.0 && segment_rect_overlap(segment, other.rect()) > 0.0
            })
        });
        if let Some(index) = crossing {
            if index >= self.config.arrow_overlap_tolerance {
                debug!(arrow = arrow_id.0, index, "scan truncated at another arrow");
                segments.truncate(index);
            }
        }

        let mut hits: Vec<DiagramId> = Vec::new();
        for segment in &segments {
            for (idx, diagram) in self.diagrams.iter().enumerate() {
                let id = DiagramId(idx);
                if !hits.contains(&id) && self.sufficient_overlap(segment, diagram.rect()) {
                    hits.push(id);
                }
            }
        }
        Ok(hits)
    }

    /// Sample points along the signed scan direction, bounded by whichever
    /// image axis runs out of room first.
    fn sample_centers(&self, start: Point, direction: Vector2<f32>, sign: f32) -> Vec<Point> {
        let step = direction * (self.step_size * sign);
        let count_x = steps_to_extent(start.x, step.x, self.fig.width() as f32);
        let count_y = steps_to_extent(start.y, step.y, self.fig.height() as f32);
        let count = count_x.min(count_y);
        let count = if count.is_finite() {
            count.max(0.0).floor() as usize
        } else {
            0
        };
        (1..=count)
            .map(|n| Point::new(start.x + step.x * n as f32, start.y + step.y * n as f32))
            .collect()
    }

    /// A probing cross-section of the configured length, centered at
    /// `center` and oriented along the scan normal.
    fn probing_segment(&self, center: Point, normal: Vector2<f32>) -> SchemeResult<Line> {
        let offset = normal * (self.segment_length / 2.0);
        Line::new(
            Point::new(center.x - offset.x, center.y - offset.y),
            Point::new(center.x + offset.x, center.y + offset.y),
        )
    }

    /// A diagram counts as hit when the overlap diagonal exceeds the
    /// configured fraction of the smaller of segment length and diagram
    /// diagonal.
    fn sufficient_overlap(&self, segment: &Line, rect: Rect) -> bool {
        let overlap = segment_rect_overlap(segment, rect);
        let threshold =
            self.config.min_overlap_factor * segment.length().min(rect.diagonal_length());
        overlap > threshold
    }

    /// Re-anchors a failed scan on a neighbouring print line.
    ///
    /// Clusters the y-centers of every diagram plus the arrow, discards
    /// the arrow's own line, and anchors the new scan at the mean y of the
    /// qualifying neighbour. Returns `Ok(None)` when no qualifying cluster
    /// exists; that outcome is surfaced rather than guessed around.
    fn search_other_line(
        &self,
        arrow_id: ArrowId,
        search: LineSearch,
        direction: Vector2<f32>,
        normal: Vector2<f32>,
        sign: f32,
    ) -> SchemeResult<Option<Vec<DiagramId>>> {
        let arrow_y = self.arrows[arrow_id.0].center().y;

        let mut ys: Vec<f32> = self.diagrams.iter().map(|d| d.rect().center().y).collect();
        ys.push(arrow_y);
        let eps = self
            .diagrams
            .iter()
            .map(|d| d.rect().height() as f32)
            .sum::<f32>()
            / self.diagrams.len() as f32;

        let labels = dbscan_1d(&ys, eps, 2);
        let arrow_label = labels[labels.len() - 1];

        // Mean y per label, the arrow's own line excluded. Points labeled
        // as noise pool together so sparse lines stay findable.
        let mut sums: BTreeMap<i32, (f32, u32)> = BTreeMap::new();
        for (&y, &label) in ys.iter().zip(labels.iter()) {
            if label == arrow_label {
                continue;
            }
            let entry = sums.entry(label).or_insert((0.0, 0));
            entry.0 += y;
            entry.1 += 1;
        }
        let mut centres: Vec<f32> = sums
            .into_values()
            .map(|(sum, count)| sum / count as f32)
            .collect();
        centres.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let anchor_y = match search {
            LineSearch::AboveRight => centres.iter().copied().filter(|c| *c < arrow_y).last(),
            LineSearch::BelowLeft => centres.iter().copied().find(|c| *c > arrow_y),
        };
        let Some(anchor_y) = anchor_y else {
            warn!(
                arrow = arrow_id.0,
                "multi-line fallback found no qualifying line cluster"
            );
            return Ok(None);
        };

        let anchor_x = match search {
            LineSearch::AboveRight => self.fig.width() as f32,
            LineSearch::BelowLeft => 0.0,
        };
        let start = Point::new(anchor_x, anchor_y);
        debug!(
            arrow = arrow_id.0,
            x = anchor_x,
            y = anchor_y,
            "re-anchoring scan on neighbouring line"
        );
        Ok(Some(self.line_scan(arrow_id, start, direction, normal, sign)?))
    }

    /// Splits the two scanned groups into reactants and products: the
    /// group with the smaller minimum edge separation to the arrow's
    /// reference point is the products.
    fn assign_roles(
        &self,
        side_a: Vec<DiagramId>,
        side_b: Vec<DiagramId>,
        arrow_id: ArrowId,
    ) -> (Vec<DiagramId>, Vec<DiagramId>) {
        let reference = self.arrows[arrow_id.0].reference_point();
        let min_distance = |group: &[DiagramId]| -> f32 {
            group
                .iter()
                .map(|id| self.diagrams[id.0].rect().separation_to_point(reference))
                .fold(f32::INFINITY, f32::min)
        };
        if min_distance(&side_a) <= min_distance(&side_b) {
            (side_b, side_a)
        } else {
            (side_a, side_b)
        }
    }
}

/// Unit scan direction and normal from the arrow's fitted major axis.
fn scan_directions(arrow: &Arrow) -> (Vector2<f32>, Vector2<f32>) {
    let angle = arrow.fitted_angle();
    let rounded = (angle / 10.0).round() * 10.0;

    // The tangent parametrization is discontinuous at the vertical; force
    // the axis explicitly there instead of trusting the computation.
    let direction = if rounded.abs() == 90.0 || rounded.abs() == 270.0 {
        Vector2::new(0.0, 1.0)
    } else {
        Vector2::new(1.0, angle.to_radians().tan()).normalize()
    };
    let normal = if rounded.abs() == 90.0 || rounded.abs() == 270.0 {
        Vector2::new(1.0, 0.0)
    } else if rounded == 0.0 || rounded.abs() == 180.0 {
        Vector2::new(0.0, 1.0)
    } else {
        Vector2::new(1.0, (angle + 90.0).to_radians().tan()).normalize()
    };
    (direction, normal)
}

/// Overlap between a probing segment and a rectangle, measured as the
/// diagonal of the intersection of the segment's envelope with the box.
/// Non-overlapping pairs yield 0.
fn segment_rect_overlap(segment: &Line, rect: Rect) -> f32 {
    let (seg_top, seg_left, seg_bottom, seg_right) = segment.envelope();
    let top = (rect.top as f32).max(seg_top);
    let left = (rect.left as f32).max(seg_left);
    let bottom = (rect.bottom as f32).min(seg_bottom);
    let right = (rect.right as f32).min(seg_right);
    let height = bottom - top;
    let width = right - left;
    if height < 0.0 || width < 0.0 {
        0.0
    } else {
        width.hypot(height)
    }
}

fn steps_to_extent(position: f32, delta: f32, extent: f32) -> f32 {
    if delta.abs() < 1e-6 {
        f32::INFINITY
    } else if delta > 0.0 {
        (extent - position) / delta
    } else {
        position / -delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ArrowKind;
    use crate::surface::Panel;
    use image::GrayImage;

    fn blank_surface(width: u32, height: u32) -> Surface {
        let img = GrayImage::new(width, height);
        Surface::new(img.clone(), img).unwrap()
    }

    fn rect(top: i32, left: i32, bottom: i32, right: i32) -> Rect {
        Rect::new(top, left, bottom, right).unwrap()
    }

    fn corner_contour(r: Rect) -> Vec<Point> {
        vec![
            Point::new(r.left as f32, r.top as f32),
            Point::new(r.right as f32, r.top as f32),
            Point::new(r.right as f32, r.bottom as f32),
            Point::new(r.left as f32, r.bottom as f32),
        ]
    }

    fn arrow_at(r: Rect, reference: Point) -> Arrow {
        Arrow::from_parts(
            Panel::new(r),
            ArrowKind::Solid,
            None,
            corner_contour(r),
            reference,
        )
        .unwrap()
    }

    fn diagram_at(r: Rect) -> Diagram {
        Diagram::new(Panel::new(r), None, None)
    }

    #[test]
    fn test_probe_requires_diagrams() {
        let fig = blank_surface(100, 100);
        assert!(RoleProbe::new(&fig, vec![], vec![]).is_err());
    }

    #[test]
    fn test_scan_parameters() {
        let fig = blank_surface(260, 100);
        let diagrams = vec![
            diagram_at(rect(40, 0, 60, 40)),
            diagram_at(rect(40, 100, 60, 140)),
        ];
        let probe = RoleProbe::new(&fig, vec![], diagrams).unwrap();
        assert_eq!(probe.step_size(), 20.0);
        assert_eq!(probe.segment_length(), 30.0);
    }

    #[test]
    fn test_directional_scan_hits_near_diagram_first() {
        // Three 40x20 diagrams at x = 0, 100, 200 with the arrow at x = 50:
        // the forward scan must reach x = 100 before x = 200 and must not
        // pick up the diagram at x = 0.
        let fig = blank_surface(260, 100);
        let diagrams = vec![
            diagram_at(rect(40, 0, 60, 40)),
            diagram_at(rect(40, 100, 60, 140)),
            diagram_at(rect(40, 200, 60, 240)),
        ];
        let arrow = arrow_at(rect(48, 44, 52, 56), Point::new(95.0, 50.0));
        let mut probe = RoleProbe::new(&fig, vec![arrow], diagrams).unwrap();
        probe.probe_arrow(ArrowId(0)).unwrap();

        let step = &probe.steps()[0];
        assert!(step.single_line());
        // The reference point sits on the forward side, so the forward
        // group is labeled products, in first-hit order.
        assert_eq!(step.products(), &[DiagramId(1), DiagramId(2)]);
        assert_eq!(step.reactants(), &[DiagramId(0)]);
        // Back-references recorded on every member.
        assert_eq!(probe.diagrams()[0].steps(), &[StepId(0)]);
        assert_eq!(probe.diagrams()[2].steps(), &[StepId(0)]);
    }

    #[test]
    fn test_scan_truncates_at_another_arrow() {
        let fig = blank_surface(300, 100);
        let diagrams = vec![diagram_at(rect(40, 200, 60, 240))];
        let first = arrow_at(rect(48, 44, 52, 56), Point::new(60.0, 50.0));
        let second = arrow_at(rect(48, 144, 52, 156), Point::new(160.0, 50.0));
        let mut probe = RoleProbe::new(&fig, vec![first, second], diagrams).unwrap();
        probe.probe_arrow(ArrowId(0)).unwrap();

        // The diagram behind the second arrow must not be reachable from
        // the first arrow's scan.
        let step = &probe.steps()[0];
        assert!(!step.contains_diagram(DiagramId(0)));
    }

    #[test]
    fn test_multiline_fallback_searches_line_below() {
        // Line one holds a reactant and an arrow ending at the right page
        // edge; line two holds the products.
        let fig = blank_surface(260, 160);
        let diagrams = vec![
            diagram_at(rect(30, 0, 50, 40)),
            diagram_at(rect(100, 60, 120, 100)),
            diagram_at(rect(100, 120, 120, 160)),
        ];
        let arrow = arrow_at(rect(38, 200, 42, 230), Point::new(228.0, 40.0));
        let mut probe = RoleProbe::new(&fig, vec![arrow], diagrams).unwrap();
        probe.probe_arrow(ArrowId(0)).unwrap();

        let step = &probe.steps()[0];
        assert!(!step.single_line());
        assert_eq!(step.reactants(), &[DiagramId(0)]);
        assert!(step.products().contains(&DiagramId(1)));
        assert!(step.products().contains(&DiagramId(2)));
    }

    #[test]
    fn test_fallback_without_qualifying_cluster_yields_incomplete_step() {
        // A single-line scheme with nothing on the arrow's forward side:
        // the fallback finds no other line and the step stays incomplete.
        let fig = blank_surface(300, 100);
        let diagrams = vec![diagram_at(rect(40, 0, 60, 40))];
        let arrow = arrow_at(rect(48, 54, 52, 66), Point::new(64.0, 50.0));
        let mut probe = RoleProbe::new(&fig, vec![arrow], diagrams).unwrap();
        probe.probe_arrow(ArrowId(0)).unwrap();

        let step = &probe.steps()[0];
        assert!(!step.is_complete());
        assert!(!step.single_line());
        assert_eq!(step.species().count(), 1);
    }

    #[test]
    fn test_resolve_nodes_prunes_distant_diagram() {
        let fig = blank_surface(260, 100);
        let diagrams = vec![
            diagram_at(rect(40, 0, 60, 40)),
            diagram_at(rect(40, 100, 60, 140)),
            diagram_at(rect(40, 200, 60, 240)),
        ];
        let arrow = arrow_at(rect(48, 44, 52, 56), Point::new(95.0, 50.0));
        let config = ProbeConfig {
            max_group_distance: 50.0,
            ..Default::default()
        };
        let mut probe = RoleProbe::with_config(&fig, vec![arrow], diagrams, config).unwrap();
        probe.probe_arrow(ArrowId(0)).unwrap();
        assert!(probe.steps()[0].contains_diagram(DiagramId(2)));

        probe.resolve_nodes();

        // The diagram at x = 200 sits 60px from its nearest group member,
        // beyond the 50px limit: dropped from the step and unlinked.
        let step = &probe.steps()[0];
        assert_eq!(step.products(), &[DiagramId(1)]);
        assert!(probe.diagrams()[2].steps().is_empty());
        // Closer members are untouched.
        assert_eq!(probe.diagrams()[1].steps(), &[StepId(0)]);
    }

    #[test]
    fn test_vertical_arrow_scans_vertically() {
        // A vertical arrow between two vertically stacked diagrams.
        let fig = blank_surface(200, 300);
        let diagrams = vec![
            diagram_at(rect(0, 80, 20, 120)),
            diagram_at(rect(120, 80, 140, 120)),
        ];
        let arrow = arrow_at(rect(40, 98, 100, 102), Point::new(100.0, 95.0));
        let mut probe = RoleProbe::new(&fig, vec![arrow], diagrams).unwrap();
        probe.probe_arrow(ArrowId(0)).unwrap();

        let step = &probe.steps()[0];
        assert!(step.is_complete());
        assert!(step.single_line());
        // The reference point sits near the arrow's lower end.
        assert_eq!(step.products(), &[DiagramId(1)]);
        assert_eq!(step.reactants(), &[DiagramId(0)]);
    }
}
