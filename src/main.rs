use chrono::Local;
use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use morpho::brush::BrushConstraint;
use morpho::ingest::{self, Source};
use morpho::report::{self, Summary};
use morpho::{Condition, Config, FilterSpec, FilterStatus, Item, Session};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "morpho")]
#[command(author, version, about = "Explore parametric design datasets with their rendered views")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    input: InputArgs,

    /// Launch GUI pickers for missing inputs (auto-enabled without a CSV)
    #[arg(long)]
    gui: bool,

    /// Filter condition, repeatable (e.g. "mass<=12.5")
    #[arg(short = 'w', long = "where", value_name = "COND")]
    conditions: Vec<String>,

    /// Sort displayed designs ascending by this parameter
    #[arg(short, long, value_name = "PARAM")]
    sort: Option<String>,

    /// Brush ranges, repeatable (e.g. "span=2:8;10:12")
    #[arg(short, long, value_name = "BRUSH")]
    brush: Vec<String>,

    /// Parameter shown under each design, repeatable
    #[arg(short, long, value_name = "PARAM")]
    caption: Vec<String>,

    /// View whose image is listed for each design
    #[arg(long, value_name = "KEY")]
    view_shown: Option<String>,

    /// Output report file (.json, .csv, .html) or directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Don't open the report after writing it
    #[arg(long)]
    no_open: bool,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only show summary
    #[arg(short, long)]
    quiet: bool,
}

#[derive(ClapArgs, Debug, Clone, Default)]
struct InputArgs {
    /// CSV file with one design per row
    csv: Option<PathBuf>,

    /// Image folder for a view, repeatable (e.g. front=renders/front)
    #[arg(long = "view", value_name = "KEY=DIR")]
    views: Vec<String>,

    /// Prebuilt data.json instead of CSV + folders
    #[arg(long, value_name = "DATA.json", conflicts_with = "csv")]
    json: Option<PathBuf>,

    /// JSON configuration file (views, extensions, id column)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of parallel workers for folder scans (default: number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start interactive web UI
    Serve {
        #[command(flatten)]
        input: InputArgs,

        /// Port to listen on
        #[arg(short, long, default_value = "3001")]
        port: u16,

        /// Don't open the browser
        #[arg(long)]
        no_open: bool,
    },
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    if let Some(Command::Serve { input, port, no_open }) = &args.command {
        let session = match prepare(input, false, false) {
            Ok(session) => session,
            Err(e) => fail(e),
        };
        if let Err(e) = morpho::serve::start(*port, session, !*no_open) {
            eprintln!("Server error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    // With GUI feature: pick inputs if --gui flag OR nothing provided
    #[cfg(feature = "gui")]
    let use_gui = args.gui || (args.input.csv.is_none() && args.input.json.is_none());

    #[cfg(not(feature = "gui"))]
    let use_gui = false;

    if let Err(e) = run(&args, use_gui) {
        fail(e);
    }
}

fn fail(e: morpho::Error) -> ! {
    eprintln!("\x1b[31mError:\x1b[0m {}", e);
    std::process::exit(1);
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => log::Level::Error,
        (false, 0) => log::Level::Warn,
        (false, 1) => log::Level::Info,
        _ => log::Level::Debug,
    };
    if let Err(e) = simple_logger::init_with_level(level) {
        eprintln!("Failed to initialise logging: {}", e);
    }
}

/// Build a session from the input arguments. Without any dataset argument
/// the session stays empty (the web UI loads one later).
fn prepare(input: &InputArgs, use_gui: bool, quiet: bool) -> morpho::Result<Session> {
    if let Some(jobs) = input.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    let config = match &input.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let mut session = Session::new(config);

    let source = match source_from_args(input)? {
        Some(source) => Some(source),
        None if use_gui => pick_source_gui(session.config()),
        None => None,
    };

    if let Some(source) = source {
        let spinner = (!quiet).then(|| {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
                pb.set_style(style);
            }
            pb.set_message("Indexing image folders...");
            pb.enable_steady_tick(std::time::Duration::from_millis(100));
            pb
        });
        let loaded = ingest::load(&mut session, &source);
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }
        loaded?;
    }
    Ok(session)
}

fn source_from_args(input: &InputArgs) -> morpho::Result<Option<Source>> {
    if let Some(json) = &input.json {
        return Ok(Some(Source::Prebuilt(json.clone())));
    }
    let views = input
        .views
        .iter()
        .map(|arg| ingest::parse_view_arg(arg))
        .collect::<morpho::Result<Vec<_>>>()?;

    Ok(input.csv.clone().map(|path| Source::Csv { path, views }))
}

#[cfg(feature = "gui")]
fn pick_source_gui(config: &Config) -> Option<Source> {
    let path = rfd::FileDialog::new()
        .set_title("Select the design CSV (or Cancel for a data.json)")
        .add_filter("CSV files", &["csv"])
        .pick_file();

    let Some(path) = path else {
        return rfd::FileDialog::new()
            .set_title("Select a prebuilt data.json")
            .add_filter("JSON files", &["json"])
            .pick_file()
            .map(Source::Prebuilt);
    };

    let views = config
        .views
        .iter()
        .filter_map(|view| {
            rfd::FileDialog::new()
                .set_title(format!("Select the folder for {} (Cancel to skip)", view.label))
                .pick_folder()
                .map(|dir| (view.key.clone(), dir))
        })
        .collect();

    Some(Source::Csv { path, views })
}

#[cfg(not(feature = "gui"))]
fn pick_source_gui(_config: &Config) -> Option<Source> {
    None
}

fn run(args: &Args, use_gui: bool) -> morpho::Result<()> {
    let mut session = prepare(&args.input, use_gui, args.quiet)?;

    let Some(dataset) = session.dataset() else {
        eprintln!("No dataset selected.");
        eprintln!("Usage: morpho <CSV> --view front=DIR [--view top=DIR ...]");
        eprintln!("Run 'morpho --help' for more options.");
        std::process::exit(if use_gui { 0 } else { 1 });
    };

    if !args.quiet {
        eprintln!("\x1b[1mMorpho - Design Explorer\x1b[0m");
        eprintln!("{}", "─".repeat(70));
        eprintln!(
            "Loaded {} design(s), {} parameter(s), {} view(s)",
            dataset.len(),
            dataset.meta.parameters.len(),
            dataset.meta.views.len()
        );
        for view in &dataset.meta.views {
            eprintln!(
                "  {:<14} {:>5} file(s)  {:>5} paired  ({})",
                view.key, view.files, view.resolved, view.label
            );
        }
        eprintln!();
    }

    // Query
    let mut spec = FilterSpec::new();
    for text in &args.conditions {
        spec.push(text.parse::<Condition>()?);
    }
    match session.apply_filter(spec) {
        FilterStatus::NoResults => {
            eprintln!("\x1b[33mNo results for this filter; showing all designs.\x1b[0m")
        }
        FilterStatus::Matched(n) => log::info!("filter matched {} design(s)", n),
        FilterStatus::Inactive => {}
    }
    if let Some(sort) = &args.sort {
        if !session.parameters().contains(sort) {
            log::warn!("unknown sort parameter '{}'", sort);
        }
        session.apply_sort(sort);
    }
    if let Some(view) = &args.view_shown {
        session.set_view(view)?;
    }
    session.set_captions(args.caption.clone());

    if !args.quiet {
        print_table(&session);
    }

    // Brush
    if !args.brush.is_empty() {
        let constraints = args
            .brush
            .iter()
            .map(|b| b.parse::<BrushConstraint>())
            .collect::<morpho::Result<Vec<_>>>()?;
        let selection = session.brush(&constraints);
        eprintln!("\nBrushed: {} design(s)", selection.len());
        if let Some(item) = session.brushed(&selection) {
            print_detail(item, &session);
        }
    }

    // Summary
    let meta = match session.dataset() {
        Some(dataset) => dataset.meta.clone(),
        None => return Ok(()),
    };
    let summary = Summary::from_items(session.displayed(), &meta);
    if !args.quiet {
        eprintln!("\n{}", "─".repeat(70));
        eprintln!("\x1b[1mSummary:\x1b[0m {}", session.count());
        eprintln!("  \x1b[32m✓ All views:\x1b[0m {}", summary.complete);
        if summary.no_image > 0 {
            eprintln!("  \x1b[90m∅ No image:\x1b[0m  {}", summary.no_image);
        }
    }

    // Report
    if let Some(output) = &args.output {
        let path = report_path(output);
        report::generate(&path, session.displayed(), &meta, session.captions())?;
        if !args.quiet {
            eprintln!("\n\x1b[32mReport saved: {}\x1b[0m", path.display());
        }
        if use_gui && !args.no_open {
            if let Err(e) = open::that(&path) {
                eprintln!("Failed to open report: {}", e);
            }
        }
    }

    Ok(())
}

/// A directory gets a timestamped HTML report inside it.
fn report_path(output: &Path) -> PathBuf {
    if output.is_dir() {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        output.join(format!("morpho_report_{}.html", timestamp))
    } else {
        output.to_path_buf()
    }
}

fn print_table(session: &Session) {
    let view = session.view().unwrap_or("");
    let params = session.parameters();
    let shown: Vec<&String> = params.iter().take(6).collect();

    let mut header = format!("{:<8}", "ID");
    for p in &shown {
        header.push_str(&format!(" {:>10}", truncate(p, 10)));
    }
    header.push_str(&format!("  {}", view));
    println!("\x1b[1m{}\x1b[0m", header);

    for item in session.displayed() {
        let mut line = format!("{:<8}", item.id);
        for p in &shown {
            let value = item.param(p).map(|v| format!("{}", v)).unwrap_or_else(|| "-".into());
            line.push_str(&format!(" {:>10}", truncate(&value, 10)));
        }
        let file = item.file_for(view).map(file_name).unwrap_or("\x1b[90m(none)\x1b[0m");
        line.push_str(&format!("  {}", file));
        println!("{}", line);

        let caption = item.caption(session.captions());
        if !caption.is_empty() {
            println!("        \x1b[90m{}\x1b[0m", caption.join("  "));
        }
    }
}

fn print_detail(item: &Item, session: &Session) {
    eprintln!("\n\x1b[1mSelected {}\x1b[0m ({})", item.label(), item.key);
    for (name, value) in &item.params {
        eprintln!("  {:<20} {}", name, value);
    }
    if let Some(dataset) = session.dataset() {
        for view in &dataset.meta.views {
            let file = item.files.get(&view.key).map(String::as_str).unwrap_or("-");
            eprintln!("  {:<20} {}", view.label, file);
        }
    }
}

fn file_name(location: &str) -> &str {
    location.rsplit(&['/', '\\'][..]).next().unwrap_or(location)
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
