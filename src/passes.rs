use crate::canvas::{BlendMode, Painter, PixelCanvas};
use crate::geom::Affine;
use crate::scene::Scene;

/// Entity groups in back-to-front order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RenderPass {
    Backdrop,
    Mosaic,
    Atmosphere,
    Coral,
    Seaweed,
    SeaweedClusters,
    ClockMarkers,
    Snails,
    Starbursts,
    FloatingPatterns,
    Fish,
    Bubbles,
    Celestial,
    Ripples,
    Ground,
}

pub(crate) const RENDER_ORDER: [RenderPass; 15] = [
    RenderPass::Backdrop,
    RenderPass::Mosaic,
    RenderPass::Atmosphere,
    RenderPass::Coral,
    RenderPass::Seaweed,
    RenderPass::SeaweedClusters,
    RenderPass::ClockMarkers,
    RenderPass::Snails,
    RenderPass::Starbursts,
    RenderPass::FloatingPatterns,
    RenderPass::Fish,
    RenderPass::Bubbles,
    RenderPass::Celestial,
    RenderPass::Ripples,
    RenderPass::Ground,
];

impl RenderPass {
    /// Compositing mode the group is drawn with. Entities may switch modes
    /// for individual strokes inside a push/pop.
    pub(crate) fn blend(self) -> BlendMode {
        match self {
            RenderPass::Backdrop | RenderPass::ClockMarkers | RenderPass::Fish => BlendMode::Normal,
            RenderPass::Mosaic | RenderPass::Ground => BlendMode::Multiply,
            RenderPass::Starbursts => BlendMode::Add,
            RenderPass::Atmosphere
            | RenderPass::Coral
            | RenderPass::Seaweed
            | RenderPass::SeaweedClusters
            | RenderPass::Snails
            | RenderPass::FloatingPatterns
            | RenderPass::Bubbles
            | RenderPass::Celestial
            | RenderPass::Ripples => BlendMode::Screen,
        }
    }
}

/// Draw one frame of `scene` onto `canvas`, `world_scale` world units per pixel.
pub(crate) fn render_scene(scene: &Scene, canvas: &mut PixelCanvas, world_scale: f32) {
    let k = 1.0 / world_scale.max(1e-3);
    let ctx = scene.render_ctx();
    let mut painter = Painter::new(canvas, Affine::scaling(k, k));

    for pass in RENDER_ORDER {
        painter.push();
        painter.set_blend(pass.blend());
        for e in scene.layer(pass) {
            e.render(&mut painter, &ctx);
        }
        painter.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::WallTime;
    use crate::entities::Bounds;
    use crate::scene::Population;
    use rstest::rstest;

    #[test]
    fn order_runs_backdrop_to_ground() {
        assert_eq!(RENDER_ORDER[0], RenderPass::Backdrop);
        assert_eq!(RENDER_ORDER[1], RenderPass::Mosaic);
        assert_eq!(RENDER_ORDER[10], RenderPass::Fish);
        assert_eq!(RENDER_ORDER[14], RenderPass::Ground);
        let fish = RENDER_ORDER.iter().position(|p| *p == RenderPass::Fish);
        let bubbles = RENDER_ORDER.iter().position(|p| *p == RenderPass::Bubbles);
        assert!(fish < bubbles);
    }

    #[rstest]
    #[case(RenderPass::Backdrop, BlendMode::Normal)]
    #[case(RenderPass::Mosaic, BlendMode::Multiply)]
    #[case(RenderPass::Atmosphere, BlendMode::Screen)]
    #[case(RenderPass::Coral, BlendMode::Screen)]
    #[case(RenderPass::Seaweed, BlendMode::Screen)]
    #[case(RenderPass::SeaweedClusters, BlendMode::Screen)]
    #[case(RenderPass::ClockMarkers, BlendMode::Normal)]
    #[case(RenderPass::Snails, BlendMode::Screen)]
    #[case(RenderPass::Starbursts, BlendMode::Add)]
    #[case(RenderPass::FloatingPatterns, BlendMode::Screen)]
    #[case(RenderPass::Fish, BlendMode::Normal)]
    #[case(RenderPass::Bubbles, BlendMode::Screen)]
    #[case(RenderPass::Celestial, BlendMode::Screen)]
    #[case(RenderPass::Ripples, BlendMode::Screen)]
    #[case(RenderPass::Ground, BlendMode::Multiply)]
    fn pass_blend_modes(#[case] pass: RenderPass, #[case] want: BlendMode) {
        assert_eq!(pass.blend(), want);
    }

    #[test]
    fn full_frame_paints_water() {
        let scale = 8.0;
        let mut canvas = PixelCanvas::new(80, 48);
        let bounds = Bounds::new(80.0 * scale, 48.0 * scale);
        let scene = Scene::new(Population::default(), 4.5, bounds, 9, WallTime::new(8, 0, 0));
        render_scene(&scene, &mut canvas, scale);
        // Blue water dominates somewhere mid-frame.
        let lit = canvas.px.iter().filter(|p| p[2] > 0.0).count();
        assert!(lit > canvas.px.len() / 2);
        assert!(canvas.px.iter().flatten().all(|v| (0.0..=1.0).contains(v)));
    }
}
