use crate::braille::BrailleCanvas;
use crate::coordinator::DrawInstruction;
use crate::heatmap::DensityTier;
use crate::map::geometry::{draw_marker, fill_circle};
use crate::map::projection::ScreenPoint;

/// Rendered braille layers, one per density tier plus the position marker
pub struct HeatLayers {
    /// Indexed by `DensityTier::index`
    pub tiers: [BrailleCanvas; 3],
    pub marker: BrailleCanvas,
}

impl HeatLayers {
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            tiers: [
                BrailleCanvas::new(width, height),
                BrailleCanvas::new(width, height),
                BrailleCanvas::new(width, height),
            ],
            marker: BrailleCanvas::new(width, height),
        }
    }

    pub fn tier(&self, tier: DensityTier) -> &BrailleCanvas {
        &self.tiers[tier.index()]
    }
}

/// Rasterize draw instructions onto a `width` x `height` character grid.
///
/// Instructions are in braille dot space (2 dots per column, 4 per row).
/// Each blob lands on its tier's layer; the widget stacks layers Low to
/// High so dense spots paint over sparse ones.
pub fn rasterize(
    instructions: &[DrawInstruction],
    marker: Option<ScreenPoint>,
    width: usize,
    height: usize,
) -> HeatLayers {
    let mut layers = HeatLayers::empty(width, height);

    for instr in instructions {
        let canvas = &mut layers.tiers[instr.tier.index()];
        fill_circle(canvas, instr.point.x, instr.point.y, instr.radius);
    }

    if let Some(p) = marker {
        draw_marker(&mut layers.marker, p.x, p.y, 3);
    }

    layers
}
