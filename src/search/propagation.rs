//! Propagation pass.
//!
//! Good matches spread to neighbors: if a neighbor at offset `d` from the
//! pixel matches region `R`, the pixel is offered `R` shifted by `-d`. Scan
//! order matters because a pixel sees matches updated earlier in the same
//! pass.

use crate::field::NnField;
use crate::image::{PatchRegion, Pixel, ScanDirection};
use crate::kernel::PatchDistance;
use crate::neighbors::NeighborFunctor;
use crate::search::pass::{in_scan_order, PassContext, PassStats};
use crate::trace::{trace_event, trace_span};
use rand::RngCore;

/// Runs one propagation pass over `pixels` in `direction`.
///
/// `pixels` are the target pixels in forward raster order; pixels already
/// holding an exact match are skipped.
pub(crate) fn propagate<D: PatchDistance + ?Sized>(
    ctx: &PassContext<'_, D>,
    rng: &mut dyn RngCore,
    field: &mut NnField,
    pixels: &[Pixel],
    direction: ScanDirection,
    neighbors: &dyn NeighborFunctor,
) -> PassStats {
    let _span = trace_span!("propagate", pixels = pixels.len()).entered();
    let width = field.width();
    let height = field.height();
    let mut stats = PassStats::default();
    let mut around = Vec::with_capacity(8);
    let mut offered: Vec<PatchRegion> = Vec::with_capacity(8 * field.max_matches());

    for p in in_scan_order(pixels, direction) {
        stats.visited += 1;
        if field[p].has_exact_match() {
            stats.skipped_exact += 1;
            continue;
        }
        around.clear();
        neighbors.neighbors(p, width, height, &mut around);
        for &n in &around {
            if !n.is_inside(width, height) || !ctx.may_propagate_from(n) {
                continue;
            }
            let (dx, dy) = p.delta_from(n);
            offered.clear();
            for m in &field[n] {
                match m.region.translated(dx, dy) {
                    Some(shifted) => {
                        offered.push(PatchRegion::new(shifted.center(), ctx.patch_radius))
                    }
                    None => stats.discarded += 1,
                }
            }
            for &region in &offered {
                ctx.offer(&mut *rng, field, p, region, &mut stats);
            }
        }
    }

    trace_event!(
        "propagate_done",
        accepted = stats.accepted,
        rejected = stats.rejected,
        skipped_exact = stats.skipped_exact
    );
    stats
}
