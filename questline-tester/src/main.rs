mod logic;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use questline_game::{Attributes, ContentLoader, GameEngine};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::{
    FileContent, GameTester, GameplayStrategy, LogicTester, ScenarioResult, SimulationPlan,
    resolve_seed_inputs, split_csv,
};

#[derive(Debug, Parser)]
#[command(name = "questline-tester", version)]
#[command(
    about = "Automated seeded playthroughs for the Questline engine with per-step invariant checks"
)]
struct Args {
    /// Seeds to run (comma-separated, decimal or 0x-hex)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per seed and strategy
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Strategies to run (comma-separated, or `all`)
    #[arg(long, default_value = "balanced")]
    strategy: String,

    /// List all available strategies and exit
    #[arg(long)]
    list_strategies: bool,

    /// Event catalog JSON to load instead of the bundled content
    #[arg(long)]
    content: Option<PathBuf>,

    /// Engine configuration JSON (missing keys keep their defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fixed starting attributes as a JSON mapping, e.g. '{"luck": 8}'
    #[arg(long)]
    attributes: Option<String>,

    /// Events to play per iteration
    #[arg(long, default_value_t = 200)]
    max_events: u32,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_strategies(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let strategies = resolve_strategies(&args.strategy)?;
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let attributes = parse_attributes(args.attributes.as_deref())?;
    let loader = FileContent::from_paths(args.content.as_deref(), args.config.as_deref())?;
    if let Err(err) = loader.load_catalog() {
        eprintln!("⚠️  Content rejected, playing the fallback catalog: {}", err.to_string().yellow());
    }
    let engine = GameEngine::new(loader);
    let tester = GameTester::from_engine(&engine, args.verbose);

    let results = run_strategies(&args, &strategies, &seeds, attributes, tester);

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_strategies(args: &Args) -> Result<bool> {
    if !args.list_strategies {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available strategies:")?;
    for strategy in GameplayStrategy::ALL {
        writeln!(
            output_target.writer(),
            "  {:12} - {}",
            strategy.key(),
            strategy.description()
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🎮 Questline Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn resolve_strategies(raw: &str) -> Result<Vec<GameplayStrategy>> {
    let mut strategies = Vec::new();
    for token in split_csv(raw) {
        if token.eq_ignore_ascii_case("all") {
            strategies.extend(GameplayStrategy::ALL);
            continue;
        }
        match token.parse::<GameplayStrategy>() {
            Ok(strategy) => strategies.push(strategy),
            Err(err) => bail!("{err} (try --list-strategies)"),
        }
    }
    let mut seen = std::collections::HashSet::new();
    strategies.retain(|strategy| seen.insert(*strategy));
    if strategies.is_empty() {
        strategies.push(GameplayStrategy::Balanced);
    }
    Ok(strategies)
}

fn parse_attributes(raw: Option<&str>) -> Result<Option<Attributes>> {
    raw.map(|input| {
        Attributes::parse_onto(Attributes::default(), input)
            .with_context(|| format!("invalid --attributes value: {input}"))
    })
    .transpose()
}

fn run_strategies(
    args: &Args,
    strategies: &[GameplayStrategy],
    seeds: &[u64],
    attributes: Option<Attributes>,
    tester: GameTester,
) -> Vec<ScenarioResult> {
    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let logic_tester = LogicTester::new(tester);
    let mut results = Vec::new();
    for &strategy in strategies {
        let mut plan = SimulationPlan::new(strategy).with_max_events(args.max_events);
        if let Some(attributes) = attributes {
            plan = plan.with_attributes(attributes);
        }
        results.extend(logic_tester.run_plan(&plan, seeds, args.iterations));
    }
    results
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            if results.is_empty() {
                writeln!(&mut output_target, "[]")?;
            } else {
                logic::reports::generate_json_report(&mut output_target, results)?;
            }
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Questline Logic Test Results\n\n_No runs executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            let duration = start_time.elapsed();
            if results.is_empty() {
                writeln!(&mut output_target, "No logic runs executed.")?;
            } else {
                logic::reports::generate_console_report(&mut output_target, results, duration)?;
            }
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
