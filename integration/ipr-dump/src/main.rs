use clap::{Parser, ValueEnum};
use ipr_regions::{
    BoundsWord, DepthPlane, ObjectWord, ParamBuffer, Polarity, RegionConfig, RegionContext,
    SortPolicy, TileWord,
};

#[derive(Parser)]
#[command(name = "ipr-dump")]
#[command(about = "Dump object-pointer streams from canned region binning scenes", long_about = None)]
struct Cli {
    /// Canned scene to bin
    #[arg(long, value_enum, default_value_t = Scene::Basic)]
    scene: Scene,

    /// Screen width in pixels
    #[arg(long, default_value = "640")]
    width: u32,

    /// Screen height in pixels
    #[arg(long, default_value = "480")]
    height: u32,

    /// Use double-wide (64 px) tiles
    #[arg(long)]
    double_wide: bool,

    /// Emit empty tiles too
    #[arg(long)]
    render_all: bool,

    /// Disable the cache-boundary padding of the opaque pass
    #[arg(long)]
    no_vignette: bool,

    /// Translucency pass ordering
    #[arg(long, value_enum, default_value_t = Sort::Sorted)]
    sort: Sort,

    /// Destination buffer capacity in words
    #[arg(long, default_value = "65536")]
    buffer: usize,

    /// Frames to run (later frames show the adaptive strip layout)
    #[arg(long, default_value = "1")]
    frames: u32,

    /// Suppress the word dump, print stats only
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Scene {
    /// A few opaque objects spread across the screen
    Basic,
    /// Opaque backdrop plus layered translucent sets
    Translucent,
    /// Dense load that exercises budgets and trimming
    Stress,
}

#[derive(Clone, Copy, ValueEnum)]
enum Sort {
    Sorted,
    Forward,
    Reverse,
}

impl From<Sort> for SortPolicy {
    fn from(s: Sort) -> Self {
        match s {
            Sort::Sorted => SortPolicy::Sorted,
            Sort::Forward => SortPolicy::ForwardOrder,
            Sort::Reverse => SortPolicy::ReverseOrder,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = RegionConfig {
        screen_width: cli.width,
        screen_height: cli.height,
        double_wide: cli.double_wide,
        sort: cli.sort.into(),
        vignette_fix: !cli.no_vignette,
        ..RegionConfig::default()
    };
    anyhow::ensure!(cli.width > 0 && cli.height > 0, "screen must be non-empty");

    let mut ctx = RegionContext::new(config);
    let mut out = ParamBuffer::new(cli.buffer);
    for frame in 0..cli.frames {
        ctx.reset_frame(frame == 0);
        out.clear();
        build_scene(&mut ctx, cli.scene);
        let stats = ctx.generate_object_ptrs(ctx.screen_bounds(), cli.render_all, &mut out);

        println!("frame {frame}: {stats:?}");
        if !cli.quiet {
            dump(out.words());
        }
    }
    Ok(())
}

fn build_scene(ctx: &mut RegionContext, scene: Scene) {
    let (cols, rows) = {
        let b = ctx.screen_bounds();
        (b.x1() + 1, b.y1() + 1)
    };
    match scene {
        Scene::Basic => {
            ctx.add_region_solid(BoundsWord::new(0, 0, cols - 1, rows - 1), 4, 16);
            ctx.add_region_solid(BoundsWord::new(0, 0, cols / 2, rows / 2), 12, 28);
            ctx.add_region_solid(BoundsWord::new(cols / 2, rows / 2, cols - 1, rows - 1), 9, 64);
        }
        Scene::Translucent => {
            ctx.add_region_solid(BoundsWord::new(0, 0, cols - 1, rows - 1), 4, 16);
            let near = ctx.alloc_set_id(Polarity::Front);
            let far = ctx.alloc_set_id(Polarity::Front);
            let mid = BoundsWord::new(cols / 4, rows / 4, 3 * cols / 4, 3 * rows / 4);
            ctx.add_region_see_thru(mid, far, 6, 128, DepthPlane::flat(0.25));
            ctx.add_region_see_thru(mid, near, 6, 146, DepthPlane::flat(0.75));
            ctx.add_region_atmos(BoundsWord::new(0, 0, cols - 1, rows / 4), 3, 200);
        }
        Scene::Stress => {
            let mut addr = 16;
            for i in 0..64 {
                let x = i % cols;
                let y = i % rows;
                let bounds = BoundsWord::new(
                    x.saturating_sub(1),
                    y.saturating_sub(1),
                    (x + 1).min(cols - 1),
                    (y + 1).min(rows - 1),
                );
                ctx.add_region_solid(bounds, 60, addr);
                addr += 60 * 3;
            }
        }
    }
}

fn dump(words: &[u32]) {
    for (i, &raw) in words.iter().enumerate() {
        if ipr_regions::words::is_tile_word(raw) {
            let w = TileWord::from_raw(raw);
            if w.is_sentinel() {
                println!("{i:6}: {raw:08x}  tile sentinel");
            } else {
                println!(
                    "{i:6}: {raw:08x}  tile x={}{} y={} h={}",
                    w.x_pos(),
                    if w.x_double() { " (double)" } else { "" },
                    w.y_pos(),
                    w.y_size()
                );
            }
        } else {
            let w = ObjectWord::from_raw(raw);
            let mut marks = String::new();
            if w.begin() {
                marks.push_str(" begin");
            }
            if w.flush() {
                marks.push_str(" flush");
            }
            if w.last() {
                marks.push_str(" last");
            }
            println!(
                "{i:6}: {raw:08x}  obj addr={} planes={}{marks}",
                w.addr(),
                w.planes()
            );
        }
    }
}
