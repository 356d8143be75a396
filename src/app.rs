use crate::clock::WallTime;
use crate::config::{init_logging, load_settings, project_paths, save_settings_atomic, Cli, Settings};
use crate::entities::Bounds;
use crate::input::{wait_for_actions, Action};
use crate::params::{default_definitions, load_definitions, ParamTable};
use crate::passes::render_scene;
use crate::scene::{initial_visibility, Population, Scene};
use crate::term::{canvas_to_cells, draw_text, Cell, Terminal};
use anyhow::Context;
use clap::Parser;
use crossterm::style::Color;
use std::time::{Duration, Instant};

/// One nominal animation frame; entity speeds are tuned per step.
const SIM_STEP: Duration = Duration::from_micros(16_667);
const MAX_CATCHUP_STEPS: u32 = 4;

/// Real-time bookkeeping for the loop: simulation steps owed, when the next
/// frame is due and a rolling frame-rate estimate.
struct FrameClock {
    frame_dt: Duration,
    last: Instant,
    next_frame: Instant,
    backlog: Duration,
    fps_window: Duration,
    fps_frames: u32,
    fps: f32,
}

impl FrameClock {
    fn new(fps_cap: u32, now: Instant) -> Self {
        let frame_dt = Duration::from_secs_f32(1.0 / fps_cap.max(1) as f32);
        Self {
            frame_dt,
            last: now,
            next_frame: now + frame_dt,
            backlog: Duration::ZERO,
            fps_window: Duration::ZERO,
            fps_frames: 0,
            fps: 0.0,
        }
    }

    /// Simulation steps to run for the time since the previous call. A
    /// paused clock owes nothing and forgets its backlog.
    fn steps(&mut self, now: Instant, paused: bool) -> u32 {
        let real = now.saturating_duration_since(self.last);
        self.last = now;

        self.fps_window += real;
        self.fps_frames += 1;
        if self.fps_window >= Duration::from_millis(500) {
            self.fps = self.fps_frames as f32 / self.fps_window.as_secs_f32();
            self.fps_window = Duration::ZERO;
            self.fps_frames = 0;
        }

        if paused {
            self.backlog = Duration::ZERO;
            return 0;
        }
        let (steps, left) = drain_steps(self.backlog.saturating_add(real), SIM_STEP, MAX_CATCHUP_STEPS);
        self.backlog = left;
        steps
    }

    /// When the current frame ends. A late frame ends immediately and the
    /// cadence restarts from `now` instead of bunching up.
    fn deadline(&mut self, now: Instant) -> Instant {
        let due = self.next_frame.max(now);
        self.next_frame = due + self.frame_dt;
        due
    }
}

const HUD_FG: Color = Color::AnsiValue(222);
const HUD_BG: Color = Color::Black;

pub(crate) struct App {
    settings: Settings,
    settings_path: std::path::PathBuf,
    save_config: bool,
    seed: u64,
    scene: Scene,
    term: Terminal,
    paused: bool,
    should_quit: bool,
}

/// World rectangle covered by a canvas of `w`×`h` sub-pixels.
fn world_bounds(w: u32, h: u32, scale: f32) -> Bounds {
    Bounds::new(w as f32 * scale, h as f32 * scale)
}

fn resolve_params(cli: &Cli, overrides: &[String]) -> anyhow::Result<ParamTable> {
    let defs = match &cli.params {
        Some(path) => load_definitions(path)
            .with_context(|| format!("loading parameter definitions from {}", path.display()))?,
        None => default_definitions(),
    };
    let mut params = ParamTable::resolve(defs);
    for o in overrides {
        match params.apply_override(o) {
            Ok(v) => log::info!("override {o} -> {v}"),
            Err(e) => log::warn!("ignoring override: {e}"),
        }
    }
    for (id, v) in params.iter() {
        log::debug!("param {id} = {v}");
    }
    Ok(params)
}

/// Whole steps to simulate for `accum` of elapsed time, and the backlog
/// left afterwards. Backlog beyond the catch-up cap is dropped.
fn drain_steps(accum: Duration, step: Duration, max_steps: u32) -> (u32, Duration) {
    let mut steps = 0;
    let mut left = accum;
    while left >= step && steps < max_steps {
        left -= step;
        steps += 1;
    }
    if left >= step {
        left = Duration::ZERO;
    }
    (steps, left)
}

fn hud_line(scene: &Scene, seed: u64, fps: f32, paused: bool) -> String {
    let t = scene.clock();
    format!(
        "  Gilded Reef  | {:02}:{:02}:{:02} {}  | fish: {}  | ripples: {}  | visibility: {:.1}  | seed: {seed}  | {}  | {:.0} fps  ",
        t.hour,
        t.minute,
        t.second,
        if t.is_am() { "sun" } else { "moon" },
        scene.fish_count(),
        scene.ripple_count(),
        scene.visibility(),
        if paused { "paused" } else { "running" },
        fps
    )
}

const HINT: &str = "  keys: Q quit  0-9 visibility  P pause  H hud  Ctrl-L redraw  ";

impl App {
    fn init(cli: &Cli) -> anyhow::Result<Self> {
        let paths = project_paths(cli)?;
        let settings = load_settings(&paths.settings_path).merge_cli(cli);

        let params = resolve_params(cli, &settings.overrides)?;
        let seed = settings
            .seed
            .unwrap_or_else(|| chrono::Utc::now().timestamp_micros() as u64 ^ 0x9E37_79B9_7F4A_7C15);
        log::info!("starting with seed {seed}, {} fps cap", settings.fps_cap);

        let term = Terminal::begin()?;
        let bounds = world_bounds(term.canvas.w, term.canvas.h, settings.world_scale);
        let scene = Scene::new(
            Population::from_params(&params, settings.loose_seaweed),
            initial_visibility(&params),
            bounds,
            seed,
            WallTime::now(),
        );

        Ok(Self {
            settings,
            settings_path: paths.settings_path,
            save_config: cli.save_config,
            seed,
            scene,
            term,
            paused: false,
            should_quit: false,
        })
    }

    fn apply(&mut self, action: Action) -> anyhow::Result<()> {
        match action {
            Action::Quit => self.should_quit = true,
            Action::SetVisibility(level) => self.scene.set_background_visibility(level),
            Action::ToggleHud => {
                self.settings.show_hud = !self.settings.show_hud;
                self.term.force_redraw();
            }
            Action::TogglePause => self.paused = !self.paused,
            Action::Redraw => self.term.force_redraw(),
            Action::Resize => {
                if self.term.resize_if_needed()? {
                    let b = world_bounds(self.term.canvas.w, self.term.canvas.h, self.settings.world_scale);
                    self.scene.resize(b);
                }
            }
        }
        Ok(())
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let mut clock = FrameClock::new(self.settings.fps_cap, Instant::now());

        while !self.should_quit {
            let steps = clock.steps(Instant::now(), self.paused);
            if steps > 0 {
                let now = WallTime::now();
                for _ in 0..steps {
                    self.scene.advance(1.0, now);
                }
            }

            self.render_frame(clock.fps)?;

            for action in wait_for_actions(clock.deadline(Instant::now()))? {
                self.apply(action)?;
            }
        }

        self.term.end()?;
        if self.save_config {
            save_settings_atomic(&self.settings_path, &self.settings)?;
        }
        log::info!("exiting after {:.0} frames", self.scene.frame());
        Ok(())
    }

    fn render_frame(&mut self, fps_est: f32) -> anyhow::Result<()> {
        render_scene(&self.scene, &mut self.term.canvas, self.settings.world_scale);
        canvas_to_cells(&self.term.canvas, &mut self.term.cur, self.settings.enable_color);

        if self.settings.show_hud && self.term.rows >= 2 {
            self.draw_hud(fps_est);
        }

        self.term.present()
    }

    fn draw_hud(&mut self, fps_est: f32) {
        let line = hud_line(&self.scene, self.seed, fps_est, self.paused);
        let cur = &mut self.term.cur;
        for x in 0..cur.w {
            cur.set(
                x,
                0,
                Cell {
                    ch: ' ',
                    fg: HUD_FG,
                    bg: HUD_BG,
                },
            );
        }
        draw_text(cur, 0, 0, &line, HUD_FG, HUD_BG);
        if self.term.rows > 8 {
            draw_text(cur, 0, self.term.rows - 1, HINT, HUD_FG, HUD_BG);
        }
    }
}

pub(crate) fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;
    let mut app = App::init(&cli)?;
    app.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Duration::ZERO, 0, Duration::ZERO)]
    #[case(SIM_STEP / 2, 0, SIM_STEP / 2)]
    #[case(SIM_STEP * 3 + SIM_STEP / 4, 3, SIM_STEP / 4)]
    #[case(SIM_STEP * 4, 4, Duration::ZERO)]
    #[case(Duration::from_secs(2), 4, Duration::ZERO)]
    fn catch_up_is_capped(#[case] accum: Duration, #[case] steps: u32, #[case] left: Duration) {
        assert_eq!(drain_steps(accum, SIM_STEP, MAX_CATCHUP_STEPS), (steps, left));
    }

    #[test]
    fn clock_owes_steps_for_elapsed_time() {
        let t0 = Instant::now();
        let mut c = FrameClock::new(30, t0);
        assert_eq!(c.steps(t0 + SIM_STEP * 2 + SIM_STEP / 2, false), 2);
        assert_eq!(c.steps(t0 + SIM_STEP * 3, false), 1);
        assert_eq!(c.steps(t0 + Duration::from_secs(5), false), MAX_CATCHUP_STEPS);
        assert_eq!(c.backlog, Duration::ZERO);
    }

    #[test]
    fn paused_clock_drops_backlog() {
        let t0 = Instant::now();
        let mut c = FrameClock::new(30, t0);
        assert_eq!(c.steps(t0 + SIM_STEP / 2, false), 0);
        assert_eq!(c.steps(t0 + SIM_STEP * 3, true), 0);
        assert_eq!(c.backlog, Duration::ZERO);
        assert_eq!(c.steps(t0 + SIM_STEP * 3 + SIM_STEP / 2, false), 0);
    }

    #[test]
    fn deadlines_keep_cadence_and_skip_missed_frames() {
        let t0 = Instant::now();
        let mut c = FrameClock::new(20, t0);
        let frame = c.frame_dt;
        assert_eq!(c.deadline(t0 + Duration::from_millis(10)), t0 + frame);
        let late = t0 + frame * 3;
        assert_eq!(c.deadline(late), late);
        assert_eq!(c.deadline(late + Duration::from_millis(1)), late + frame);
    }

    #[test]
    fn world_scales_with_canvas() {
        let b = world_bounds(160, 96, 4.0);
        assert_eq!((b.w, b.h), (640.0, 384.0));
    }

    #[test]
    fn overrides_feed_the_population() {
        let cli = Cli::default();
        let params = resolve_params(
            &cli,
            &["num_fish=7".to_string(), "bogus=1".to_string(), "num_bubbles".to_string()],
        )
        .unwrap();
        let pop = Population::from_params(&params, 2);
        assert_eq!(pop.fish, 7);
        assert_eq!(pop.bubbles, 18);
        assert_eq!(pop.loose_seaweed, 2);
    }

    #[test]
    fn hud_reports_scene_state() {
        let scene = Scene::new(
            Population::default(),
            4.5,
            Bounds::new(400.0, 300.0),
            3,
            WallTime::new(14, 5, 9),
        );
        let line = hud_line(&scene, 3, 29.6, true);
        assert!(line.contains("14:05:09 moon"));
        assert!(line.contains("fish: 13"));
        assert!(line.contains("paused"));
        assert!(line.contains("30 fps"));
    }
}
