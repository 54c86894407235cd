//! Learns a rule list from a CSV file of 0/1 values.
//!
//! The first line names the columns. Every column but the last is a feature;
//! the last one is the label. Use `--n-iter` to bound the search.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{bail, eyre};

use corels_rs::classifier::Classifier;
use corels_rs::config::{Ablation, Config, MapType, Policy, Verbosity};
use corels_rs::data::BinaryMatrix;

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Input CSV file.
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Regularization: objective penalty per rule.
    #[clap(short, long, value_name = "FLOAT", default_value = "0.01")]
    c: f64,

    /// Maximum number of search steps.
    #[clap(long, value_name = "INT", default_value = "10000")]
    n_iter: usize,

    /// Search policy: bfs, curious, lower_bound, objective, dfs.
    #[clap(long, value_name = "NAME", default_value = "lower_bound")]
    policy: Policy,

    /// Prefix cache: none, prefix, captured.
    #[clap(long, value_name = "NAME", default_value = "prefix")]
    map_type: MapType,

    /// Comma-separated verbosity flags: rule, label, samples, progress, log, loud.
    #[clap(long, value_name = "FLAGS", default_value = "progress")]
    verbosity: Verbosity,

    /// 0: all bounds, 1: no antecedent support bound, 2: no lookahead bound.
    #[clap(long, value_name = "INT", default_value = "0")]
    ablation: i64,

    /// Maximum number of literals per antecedent.
    #[clap(long, value_name = "INT", default_value = "2")]
    max_card: usize,

    /// Minimum fraction of samples a mined rule must capture.
    #[clap(long, value_name = "FLOAT", default_value = "0.01")]
    min_support: f64,

    /// Report the size of the remaining search space.
    #[clap(long)]
    calculate_size: bool,

    /// Save the learned rule list as JSON.
    #[clap(long, value_name = "FILE")]
    save: Option<PathBuf>,
}

fn read_csv(path: &PathBuf) -> color_eyre::Result<(Vec<String>, String, BinaryMatrix, Vec<bool>)> {
    let text = fs::read_to_string(path)?;
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header = lines.next().ok_or_else(|| eyre!("{} is empty", path.display()))?;
    let mut names: Vec<String> = header.split(',').map(|s| s.trim().to_string()).collect();
    if names.len() < 2 {
        bail!("Expected at least one feature column and a label column");
    }
    let label_name = names.pop().unwrap_or_default();

    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for (i, line) in lines.enumerate() {
        let mut values = line
            .split(',')
            .map(|v| match v.trim() {
                "0" => Ok(false),
                "1" => Ok(true),
                other => Err(eyre!("Line {}: expected 0 or 1, got {:?}", i + 2, other)),
            })
            .collect::<color_eyre::Result<Vec<bool>>>()?;
        if values.len() != names.len() + 1 {
            bail!("Line {}: expected {} values, got {}", i + 2, names.len() + 1, values.len());
        }
        labels.extend(values.pop());
        rows.push(values);
    }
    Ok((names, label_name, BinaryMatrix::from_rows(rows)?, labels))
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    let (features, label_name, x, y) = read_csv(&args.input)?;
    println!("samples = {}, features = {}", x.n_rows(), x.n_cols());

    let config = Config::default()
        .with_c(args.c)
        .with_n_iter(args.n_iter)
        .with_policy(args.policy)
        .with_map_type(args.map_type)
        .with_verbosity(args.verbosity)
        .with_ablation(Ablation::from_id(args.ablation)?)
        .with_max_card(args.max_card)
        .with_min_support(args.min_support)
        .with_calculate_size(args.calculate_size);

    let mut clf = Classifier::new(config);
    let rl = clf.fit(&x, &y, &features, &label_name)?;
    println!("{}", rl);
    println!("certified optimal: {}", rl.is_certified());
    println!("training accuracy: {:.4}", clf.score(&x, &y)?);
    if let Some(stats) = clf.stats() {
        println!("stats: {}", stats);
    }

    if let Some(path) = &args.save {
        clf.save(path)?;
        println!("Saved rule list to {}", path.display());
    }

    println!("Total time: {:.3} s", time_total.elapsed().as_secs_f64());
    Ok(())
}
