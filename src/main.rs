use std::fs;
use std::io;
use std::panic;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use crossbeam_channel::unbounded;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use ratatui::{backend::CrosstermBackend, Terminal};

use binary_pivot::core::configuration::Configuration;
use binary_pivot::core::domain::{MovePolicy, SimulationParams};
use binary_pivot::interface::state::AppState;
use binary_pivot::interface::ui;
use binary_pivot::io::results::ResultsWriter;
use binary_pivot::solvers::pivot::PivotSampler;

// --- CLI Definitions ---

#[derive(Parser, Debug)]
#[command(author, version, about = "Pivot cluster Monte-Carlo for binary hard-disk mixtures", long_about = None)]
struct Args {
    /// JSON parameter file; flags given on the command line override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of large disks (R = 1)
    #[arg(short = 'N', long)]
    large: Option<usize>,

    /// Number of small disks
    #[arg(short = 'n', long)]
    small: Option<usize>,

    /// Radius of the small disks, in (0, 1]
    #[arg(short, long)]
    radius: Option<f64>,

    /// Target packing fraction used to size the box
    #[arg(short, long)]
    density: Option<f64>,

    /// Explicit box side L (overrides --density)
    #[arg(short = 'L', long)]
    domain_size: Option<f64>,

    /// Seed selection policy (random, large)
    #[arg(short, long)]
    policy: Option<String>,

    /// RNG seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Moves before the first measurement
    #[arg(long)]
    warmup: Option<usize>,

    /// Moves between two measurements
    #[arg(long)]
    moves_per_measurement: Option<usize>,

    /// Number of measurements
    #[arg(short, long)]
    measurements: Option<usize>,

    /// Extra cells scanned around a disk's own cell
    #[arg(long)]
    ring_margin: Option<usize>,

    /// Directory for CSV/JSON results
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Write a snapshot every k-th measurement (0 disables)
    #[arg(long)]
    snapshot_every: Option<usize>,

    /// Worker threads for metric computation (0 = rayon default)
    #[arg(short, long, default_value_t = 0)]
    threads: usize,

    /// Run without the terminal UI, logging to stderr
    #[arg(long)]
    headless: bool,

    /// Print the effective parameters as JSON and exit
    #[arg(long)]
    dump_config: bool,
}

// --- Terminal Guard (RAII) ---

struct TuiContext {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TuiContext {
    fn new() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
            .context("Failed to setup terminal alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend).context("Failed to create terminal backend")?;
        Ok(Self { terminal })
    }
}

impl Drop for TuiContext {
    fn drop(&mut self) {
        // Best-effort restoration of terminal state
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        );
        let _ = self.terminal.show_cursor();
    }
}

// --- Initialization Helpers ---

fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Forcefully restore terminal before printing panic
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));
}

/// Defaults, then the JSON file, then command-line flags.
fn resolve_params(args: &Args) -> Result<SimulationParams> {
    let mut params = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        }
        None => SimulationParams::default(),
    };

    if let Some(v) = args.large { params.large_count = v; }
    if let Some(v) = args.small { params.small_count = v; }
    if let Some(v) = args.radius { params.small_radius = v; }
    if let Some(v) = args.density {
        params.density = v;
        // An explicit density on the command line beats a box size from the file
        params.domain_size = None;
    }
    if let Some(v) = args.domain_size { params.domain_size = Some(v); }
    if let Some(p) = &args.policy { params.policy = MovePolicy::try_from(p.as_str())?; }
    if let Some(v) = args.seed { params.seed = v; }
    if let Some(v) = args.warmup { params.warmup_moves = v; }
    if let Some(v) = args.moves_per_measurement { params.moves_per_measurement = v; }
    if let Some(v) = args.measurements { params.measurements = v; }
    if let Some(v) = args.ring_margin { params.ring_margin = v; }
    if let Some(v) = &args.output_dir { params.output_dir = Some(v.clone()); }
    if let Some(v) = args.snapshot_every { params.snapshot_every = v; }

    params.validate().context("Invalid simulation parameters")?;
    Ok(params)
}

fn open_writer(params: &SimulationParams) -> Result<Option<ResultsWriter>> {
    params
        .output_dir
        .as_ref()
        .map(|dir| ResultsWriter::create(dir, params))
        .transpose()
}

fn init_thread_pool(threads: usize) {
    if threads > 0 {
        let _ = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global();
    }
}

// --- Headless ---

fn run_headless(params: SimulationParams, threads: usize) -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    init_thread_pool(threads);

    let mut cfg = Configuration::from_params(&params).context("Failed to build initial packing")?;
    info!(
        "packing {} large + {} small disks in L = {} (density {:.4})",
        cfg.large_count(),
        cfg.small_count(),
        cfg.domain_size(),
        cfg.density()
    );

    let mut writer = open_writer(&params)?;
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);

    // Nobody listens for events; progress goes through the log facade
    let (tx, rx) = unbounded();
    drop(rx);

    let sampler = PivotSampler::new(params);
    let outcome = sampler
        .run(&mut cfg, &mut rng, &tx, None, writer.as_mut())
        .context("Sampler failed")?;

    match outcome.summary {
        Some(s) => println!(
            "Mean distance {:.6} with std {:.6} over {} measurements (min {:.6}, max {:.6})",
            s.mean, s.std_dev, s.count, s.min, s.max
        ),
        None => println!("No distance measurements (fewer than two large disks or zero measurements)"),
    }
    println!(
        "{} moves, mean cluster size {:.3}, largest cluster {}",
        outcome.tally.moves,
        outcome.tally.mean_cluster_size(),
        outcome.tally.largest_cluster
    );
    if let Some(w) = &writer {
        println!("Results written to {}", w.dir().display());
    }
    Ok(())
}

// --- Main ---

fn main() -> Result<()> {
    // 1. Parsing & configuration
    let args = Args::parse();
    let params = resolve_params(&args)?;

    if args.dump_config {
        let json = serde_json::to_string_pretty(&params).context("Failed to serialise parameters")?;
        println!("{json}");
        return Ok(());
    }

    if args.headless {
        return run_headless(params, args.threads);
    }

    // 2. Build everything that can fail before the terminal is taken over
    let cfg = Configuration::from_params(&params).context("Failed to build initial packing")?;
    let writer = open_writer(&params)?;

    // 3. Setup TUI & App State
    setup_panic_hook();
    let mut tui = TuiContext::new().context("Failed to initialize TUI")?;
    let mut app = AppState::new(params.clone());

    // 4. Spawn Sampler Thread
    let (tx, rx) = unbounded();
    let (ctl_tx, ctl_rx) = unbounded();
    app.set_channel(rx, ctl_tx);

    let threads = args.threads;
    let worker = thread::Builder::new()
        .name("Sampler-Worker".to_string())
        .spawn(move || {
            init_thread_pool(threads);

            let mut cfg = cfg;
            let mut writer = writer;
            let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
            let sampler = PivotSampler::new(params);
            // Failures are already reported as SolverEvent::Failed
            let _ = sampler.run(&mut cfg, &mut rng, &tx, Some(&ctl_rx), writer.as_mut());
        })
        .context("Failed to spawn sampler thread")?;

    // 5. Event Loop
    let tick_rate = Duration::from_millis(50); // 20 FPS
    let mut last_tick = Instant::now();

    while !app.should_quit {
        // Draw
        tui.terminal.draw(|f| ui::draw(f, &mut app))?;

        // Handle Input
        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == event::KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char(c) => app.on_key(c),
                        KeyCode::Esc => app.quit(),
                        _ => {}
                    }
                }
            }
        }

        // Logic Tick
        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }
    }

    drop(tui);
    worker
        .join()
        .map_err(|_| anyhow!("Sampler thread panicked"))?;
    Ok(())
}
