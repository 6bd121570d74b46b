use clap::Parser;
use dom::{MemoryDom, OutputSnapshot};
use reconciler::{FrameHost, IdleHost, ReconcileError, Reconciler};
use std::process::ExitCode;
use std::time::Duration;
use vdom::{Element, EventHandler};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "fiberdom")]
#[command(about = "Render a changing list through the incremental reconciler")]
struct Cli {
    /// Length of each idle period handed to the work loop.
    #[arg(long, default_value = "4")]
    frame_budget_ms: u64,

    /// Rows in the first generation.
    #[arg(long, default_value = "50")]
    rows: usize,

    /// Number of generations to render.
    #[arg(long, default_value = "5")]
    generations: usize,

    /// Log filter, e.g. `debug` or `reconciler.commit=trace`.
    #[arg(long, default_value = "info")]
    log: String,

    /// Print the output tree after every commit, not only the last.
    #[arg(long)]
    snapshots: bool,
}

/// Generation `tick` of the demo list: rows are added and removed, labels
/// change, and every third row swaps its element type.
fn list_view(rows: usize, tick: usize, on_select: &EventHandler) -> Element {
    let visible = rows + (tick * 7) % (rows / 2 + 1) - tick.min(rows / 4);
    Element::new("section")
        .prop("id", "demo")
        .child(Element::new("h1").child(format!("generation {tick}")))
        .child(
            Element::new("ul").children(
                (0..visible)
                    .map(|i| {
                        let tag = if (i + tick) % 3 == 0 { "li" } else { "div" };
                        Element::new(tag)
                            .prop("data-index", i as i64)
                            .prop("selected", i == tick)
                            .on("click", on_select.clone())
                            .child(format!("item {}", i * (tick + 1)))
                    })
                    .collect::<Vec<_>>(),
            ),
        )
}

fn run(cli: &Cli) -> Result<(), ReconcileError> {
    let mut dom = MemoryDom::new();
    let container = dom.create_root()?;
    let mut reconciler = Reconciler::new(dom);
    let on_select = EventHandler::new(|event| log::info!("selected: {:?}", event.value));
    let budget = Duration::from_millis(cli.frame_budget_ms);

    for tick in 0..cli.generations {
        let before = reconciler.stats();
        reconciler.render(list_view(cli.rows, tick, &on_select), container);

        let mut host = FrameHost::new(budget);
        let mut frames = 0u64;
        while reconciler.is_rendering() {
            let Some(deadline) = host.next_idle_period() else {
                break;
            };
            reconciler.work_loop(&deadline)?;
            frames += 1;
        }

        let after = reconciler.stats();
        if let Some(commit) = reconciler.last_commit() {
            println!(
                "generation {}: {frames} frames, {} units, +{} ~{} -{}, {} mutations, {} attached nodes",
                commit.generation.0,
                after.units_performed - before.units_performed,
                commit.placements,
                commit.updates,
                commit.deletions,
                commit.mutations.len(),
                reconciler.adapter().attached_count()
            );
        }
        if cli.snapshots {
            println!("{}", OutputSnapshot::from_container(reconciler.adapter(), container));
        }
    }

    if !cli.snapshots {
        println!("{}", OutputSnapshot::from_container(reconciler.adapter(), container));
    }
    let stats = reconciler.stats();
    println!(
        "total: {} renders, {} commits, {} slices, {} yields, {} mutations applied",
        stats.renders_requested, stats.commits, stats.slices, stats.yields, stats.mutations_applied
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log.as_str()))
        .format_timestamp(None)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
