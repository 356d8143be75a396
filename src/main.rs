mod app;
mod canvas;
mod clock;
mod config;
mod entities;
mod geom;
mod input;
mod noise;
mod palette;
mod params;
mod passes;
mod scene;
mod term;

use anyhow::Result;

fn main() -> Result<()> {
    app::run()
}
