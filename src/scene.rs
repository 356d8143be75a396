//! The whole aquarium: every entity collection plus the shared RNG, noise
//! field and frame counter they are advanced with.

use crate::clock::{Hand, WallTime};
use crate::entities::{
    track_x, Backdrop, Bounds, Bubble, CelestialBody, CoralFormation, Entity, Fish,
    FloatingPattern, FrameCtx, LightRay, MosaicTile, Particle, RenderCtx, Ripple, SandBed,
    Seaweed, Snail, Starburst, Vignette, LIGHT_RAY_COUNT, MARKER_COUNT, PARTICLE_COUNT,
    RIPPLE_SPAWN_CHANCE,
};
use crate::geom::Vec2;
use crate::noise::Noise;
use crate::params::{ParamTable, BACKGROUND_VISIBILITY, NUM_BUBBLES, NUM_FISH};
use crate::passes::RenderPass;
use rand::{rngs::StdRng, Rng, SeedableRng};

pub(crate) const STARBURST_COUNT: usize = 12;
pub(crate) const FLOATING_PATTERN_COUNT: usize = 15;
pub(crate) const SEAWEED_CLUSTER_COUNT: usize = 23;
pub(crate) const MAX_VISIBILITY: u8 = 9;

/// How many of each stochastic entity to create.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Population {
    pub(crate) fish: usize,
    pub(crate) bubbles: usize,
    pub(crate) starbursts: usize,
    pub(crate) floating_patterns: usize,
    pub(crate) seaweed_clusters: usize,
    pub(crate) loose_seaweed: usize,
}

impl Default for Population {
    fn default() -> Self {
        Self {
            fish: 13,
            bubbles: 18,
            starbursts: STARBURST_COUNT,
            floating_patterns: FLOATING_PATTERN_COUNT,
            seaweed_clusters: SEAWEED_CLUSTER_COUNT,
            loose_seaweed: 0,
        }
    }
}

impl Population {
    pub(crate) fn from_params(params: &ParamTable, loose_seaweed: usize) -> Self {
        let d = Population::default();
        Self {
            fish: params.count(NUM_FISH).unwrap_or(d.fish),
            bubbles: params.count(NUM_BUBBLES).unwrap_or(d.bubbles),
            loose_seaweed,
            ..d
        }
    }
}

/// Starting visibility from the parameter table, 4.5 when undeclared.
pub(crate) fn initial_visibility(params: &ParamTable) -> f32 {
    params
        .get(BACKGROUND_VISIBILITY)
        .map(|v| v as f32)
        .unwrap_or(MAX_VISIBILITY as f32 / 2.0)
        .clamp(0.0, MAX_VISIBILITY as f32)
}

pub(crate) struct Scene {
    rng: StdRng,
    noise: Noise,
    render_seed: u32,
    frame: f32,
    bounds: Bounds,
    clock: WallTime,
    visibility: f32,
    school: Vec<Vec2>,

    backdrop: Backdrop,
    tiles: Vec<MosaicTile>,
    light_rays: Vec<LightRay>,
    particles: Vec<Particle>,
    vignette: Vignette,
    corals: Vec<CoralFormation>,
    seaweeds: Vec<Seaweed>,
    clusters: Vec<Vec<Seaweed>>,
    markers: Vec<Seaweed>,
    snails: Vec<Snail>,
    starbursts: Vec<Starburst>,
    patterns: Vec<FloatingPattern>,
    fish: Vec<Fish>,
    bubbles: Vec<Bubble>,
    sun: CelestialBody,
    moon: CelestialBody,
    ripples: Vec<Ripple>,
    sand: SandBed,
}

impl Scene {
    pub(crate) fn new(
        pop: Population,
        visibility: f32,
        bounds: Bounds,
        seed: u64,
        clock: WallTime,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Noise::new(seed);
        let render_seed = (seed as u32) ^ ((seed >> 32) as u32);

        let mut tiles = MosaicTile::grid(&mut rng, bounds);
        for t in &mut tiles {
            t.recolor(&mut rng, visibility);
        }
        let light_rays = (0..LIGHT_RAY_COUNT)
            .map(|_| LightRay::new(&mut rng, bounds))
            .collect();
        let particles = (0..PARTICLE_COUNT)
            .map(|_| Particle::new(&mut rng, bounds))
            .collect();
        let fish = Fish::school(pop.fish, &mut rng, bounds);
        let bubbles = (0..pop.bubbles).map(|_| Bubble::new(&mut rng, bounds)).collect();
        let starbursts = (0..pop.starbursts)
            .map(|_| Starburst::new(&mut rng, bounds))
            .collect();
        let patterns = (0..pop.floating_patterns)
            .map(|_| FloatingPattern::new(&mut rng, bounds))
            .collect();
        let corals = CoralFormation::reef(&mut rng, bounds);
        let seaweeds = (0..pop.loose_seaweed)
            .map(|_| Seaweed::loose(&mut rng, bounds))
            .collect();
        let clusters = (0..pop.seaweed_clusters)
            .map(|_| Seaweed::cluster(&mut rng, bounds))
            .collect();
        let snails = [Hand::Hour, Hand::Minute, Hand::Second]
            .into_iter()
            .map(|hand| {
                let mut snail = Snail::new(&mut rng, hand, bounds);
                snail.follow(clock, bounds);
                snail
            })
            .collect();
        let markers = (0..MARKER_COUNT)
            .map(|i| {
                let at = i as f32 / (MARKER_COUNT - 1) as f32;
                Seaweed::marker(&mut rng, Vec2::new(track_x(at, bounds.w), bounds.h))
            })
            .collect();
        let sun = CelestialBody::new(&mut rng, true);
        let moon = CelestialBody::new(&mut rng, false);

        log::debug!(
            "scene seeded {seed:#x}: {} fish, {} bubbles, {} tiles, {} clusters",
            pop.fish,
            pop.bubbles,
            tiles.len(),
            pop.seaweed_clusters
        );

        Self {
            rng,
            noise,
            render_seed,
            frame: 0.0,
            bounds,
            clock,
            visibility,
            school: Vec::with_capacity(pop.fish),
            backdrop: Backdrop::new(visibility),
            tiles,
            light_rays,
            particles,
            vignette: Vignette,
            corals,
            seaweeds,
            clusters,
            markers,
            snails,
            starbursts,
            patterns,
            fish,
            bubbles,
            sun,
            moon,
            ripples: Vec::new(),
            sand: SandBed,
        }
    }

    pub(crate) fn frame(&self) -> f32 {
        self.frame
    }

    #[cfg(test)]
    pub(crate) fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub(crate) fn visibility(&self) -> f32 {
        self.visibility
    }

    pub(crate) fn clock(&self) -> WallTime {
        self.clock
    }

    pub(crate) fn fish_count(&self) -> usize {
        self.fish.len()
    }

    pub(crate) fn ripple_count(&self) -> usize {
        self.ripples.len()
    }

    /// Advance every entity by `dt` nominal frames.
    pub(crate) fn advance(&mut self, dt: f32, clock: WallTime) {
        self.frame += dt;
        self.clock = clock;
        self.school.clear();
        self.school.extend(self.fish.iter().map(|f| f.pos));

        let mut ctx = FrameCtx {
            frame: self.frame,
            dt,
            bounds: self.bounds,
            noise: &self.noise,
            rng: &mut self.rng,
            clock,
            school: &self.school,
        };

        for p in &mut self.particles {
            p.advance(&mut ctx);
        }
        for s in self
            .seaweeds
            .iter_mut()
            .chain(self.clusters.iter_mut().flatten())
            .chain(self.markers.iter_mut())
        {
            s.advance(&mut ctx);
        }
        for s in &mut self.snails {
            s.advance(&mut ctx);
        }
        for s in &mut self.starbursts {
            s.advance(&mut ctx);
        }
        for p in &mut self.patterns {
            p.advance(&mut ctx);
        }
        for f in &mut self.fish {
            f.advance(&mut ctx);
        }
        for b in &mut self.bubbles {
            b.advance(&mut ctx);
        }
        self.sun.advance(&mut ctx);
        self.moon.advance(&mut ctx);

        for f in &self.fish {
            if ctx.rng.gen::<f32>() < RIPPLE_SPAWN_CHANCE {
                self.ripples.push(Ripple::new(&mut *ctx.rng, f.pos));
            }
        }
        self.ripples.retain_mut(|r| r.grow(dt));
    }

    /// Set the backdrop level (0..=9) and recolour every mosaic tile once.
    pub(crate) fn set_background_visibility(&mut self, level: u8) {
        let level = level.min(MAX_VISIBILITY) as f32;
        self.visibility = level;
        self.backdrop.visibility = level;
        for t in &mut self.tiles {
            t.recolor(&mut self.rng, level);
        }
        log::info!("background visibility set to {level}");
    }

    /// Entities keep their state; only the world rectangle changes.
    pub(crate) fn resize(&mut self, bounds: Bounds) {
        if bounds != self.bounds {
            log::debug!(
                "world resized {}x{} -> {}x{}",
                self.bounds.w,
                self.bounds.h,
                bounds.w,
                bounds.h
            );
            self.bounds = bounds;
        }
    }

    pub(crate) fn render_ctx(&self) -> RenderCtx<'_> {
        RenderCtx {
            frame: self.frame,
            bounds: self.bounds,
            noise: &self.noise,
            seed: self.render_seed,
        }
    }

    /// Entities drawn by `pass`, back to front.
    pub(crate) fn layer(&self, pass: RenderPass) -> Vec<&dyn Entity> {
        fn each<T: Entity>(items: &[T]) -> impl Iterator<Item = &dyn Entity> {
            items.iter().map(|e| e as &dyn Entity)
        }
        let clusters = || self.clusters.iter().flat_map(|c| each(c));

        match pass {
            RenderPass::Backdrop => vec![&self.backdrop as &dyn Entity],
            RenderPass::Mosaic => each(&self.tiles).collect(),
            RenderPass::Atmosphere => each(&self.light_rays)
                .chain(each(&self.particles))
                .chain(std::iter::once(&self.vignette as &dyn Entity))
                .collect(),
            RenderPass::Coral => each(&self.corals).collect(),
            RenderPass::Seaweed => each(&self.seaweeds).collect(),
            RenderPass::SeaweedClusters => clusters().collect(),
            RenderPass::ClockMarkers => each(&self.markers).collect(),
            RenderPass::Snails => each(&self.snails).collect(),
            RenderPass::Starbursts => each(&self.starbursts).collect(),
            RenderPass::FloatingPatterns => each(&self.patterns).collect(),
            RenderPass::Fish => each(&self.fish).collect(),
            RenderPass::Bubbles => each(&self.bubbles).collect(),
            RenderPass::Celestial => {
                if self.clock.is_am() {
                    vec![&self.sun as &dyn Entity]
                } else {
                    vec![&self.moon as &dyn Entity]
                }
            }
            RenderPass::Ripples => each(&self.ripples).collect(),
            RenderPass::Ground => std::iter::once(&self.sand as &dyn Entity)
                .chain(each(&self.corals))
                .chain(clusters())
                .collect(),
        }
    }
}
