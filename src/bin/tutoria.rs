//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Tutoria.
//! The Tutoria project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! Tutoria command-line entry point.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use tutoria::ingest::reader::{write_json_array, write_jsonl};
use tutoria::ingest::TuReaderConfig;
use tutoria::prepare::{
    replace_part2, write_assignments, TuAssignConfig, TuAssigner, TuCorpusMerger,
    TuLatexRepairPass, TuLlmLatexRepairer, TuPart1Collator, TuPart2Builder, TuPart3Collator,
    TuRepairScope,
};
use tutoria::{
    TuConfig, TuConfigBuilder, TuConsole, TuLegacyImporter, TuPerModel, TuStreamReader,
    TuWorkbench,
};

#[derive(Parser, Debug)]
#[command(name = "tutoria")]
#[command(about = "Blind three-model tutoring dialogue annotation")]
#[command(version)]
struct Cli {
    /// YAML or JSON configuration file
    #[arg(short, long, global = true, env = "TUTORIA_CONFIG")]
    config: Option<PathBuf>,

    /// Fail on the first malformed JSONL line instead of skipping it
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive annotation console on stdin/stdout
    Annotate(SessionArgs),
    /// Export a legacy score dump of one teacher as a CSV table
    Export(ExportArgs),
    /// Join per-model multi-turn dialogues into Part1 candidates (JSONL)
    CollatePart1(CollatePart1Args),
    /// Cut Part2 blocks out of the Part1 candidates' own dialogues (JSONL)
    CollatePart2(CollatePart2Args),
    /// Join per-model single-turn replies into Part3 items (JSONL)
    CollatePart3(CollatePart3Args),
    /// Assemble Part1, Part2 and Part3 into corpus samples
    Merge(MergeArgs),
    /// Replace the Part2 blocks of an existing corpus
    ReplacePart2(ReplacePart2Args),
    /// Distribute a corpus over teachers
    Assign(AssignArgs),
    /// Normalize math delimiters through the completion service
    RepairLatex(RepairLatexArgs),
}

#[derive(Args, Debug)]
struct SessionArgs {
    /// Directory holding data_<teacher>.json corpora
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Directory for exported tables
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Seed for the blind assignment
    #[arg(long)]
    seed: Option<u64>,
    /// Only export Part2/Part3 of samples with a completed ranking
    #[arg(long)]
    require_ranking: bool,
    /// Add an `index / total` column to the export
    #[arg(long)]
    annotate_position: bool,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    session: SessionArgs,
    /// Teacher id as typed at sign-in
    #[arg(long)]
    teacher: String,
    /// Legacy score dump ({part1_scores, part2_scores, part3_scores})
    #[arg(long)]
    scores: PathBuf,
}

#[derive(Args, Debug)]
struct CollatePart1Args {
    /// Dialogue JSONL of models A, B and C, in that order
    #[arg(long, num_args = 3, required = true)]
    models: Vec<PathBuf>,
    /// File with one question id per line to keep
    #[arg(long)]
    keep: Option<PathBuf>,
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct CollatePart2Args {
    /// Part1 candidates (JSONL with question_id) written by collate-part1
    #[arg(long)]
    part1: PathBuf,
    /// Tagged dialogue JSONL (messages, template_index) of models A, B and C
    #[arg(long, num_args = 3, required = true)]
    models: Vec<PathBuf>,
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct CollatePart3Args {
    /// Source questions (JSON array with dialog_id, messages, GT)
    #[arg(long)]
    questions: PathBuf,
    /// Single-dialog JSON of models A, B and C, in that order
    #[arg(long, num_args = 3, required = true)]
    models: Vec<PathBuf>,
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct MergeArgs {
    #[arg(long)]
    part1: PathBuf,
    #[arg(long)]
    part2: PathBuf,
    #[arg(long)]
    part3: PathBuf,
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct ReplacePart2Args {
    #[arg(long)]
    corpus: PathBuf,
    #[arg(long)]
    part2: PathBuf,
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct AssignArgs {
    #[arg(long)]
    input: PathBuf,
    #[arg(long, default_value_t = 6)]
    teachers: usize,
    /// Teachers per sample
    #[arg(long, default_value_t = 3)]
    redundancy: usize,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ScopeArg {
    ModelResponses,
    StudentAndReference,
}

impl From<ScopeArg> for TuRepairScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::ModelResponses => TuRepairScope::ModelResponses,
            ScopeArg::StudentAndReference => TuRepairScope::StudentAndReference,
        }
    }
}

#[derive(Args, Debug)]
struct RepairLatexArgs {
    /// Corpus JSON; output goes to <name>_fixed.json
    #[arg(long)]
    file: PathBuf,
    #[arg(long, value_enum, num_args = 1.., default_values_t = [ScopeArg::ModelResponses, ScopeArg::StudentAndReference])]
    scope: Vec<ScopeArg>,
    /// Send every field, not only those with non-standard delimiters
    #[arg(long)]
    all: bool,
}

fn load_config(path: Option<&Path>) -> Result<TuConfig> {
    match path {
        Some(path) => TuConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(TuConfig::default()),
    }
}

fn session_config(base: TuConfig, args: &SessionArgs) -> TuConfig {
    let mut builder = TuConfigBuilder::new();
    if let Some(dir) = &args.data_dir {
        builder = builder.data_dir(dir);
    }
    if let Some(dir) = &args.output_dir {
        builder = builder.output_dir(dir);
    }
    if let Some(seed) = args.seed {
        builder = builder.blind_seed(seed);
    }
    if args.require_ranking {
        builder = builder.require_ranking_before_export(true);
    }
    if args.annotate_position {
        builder = builder.annotate_sample_position(true);
    }
    builder.apply(base)
}

fn per_model(paths: &[PathBuf], read: impl Fn(&Path) -> tutoria::Result<Vec<serde_json::Value>>) -> Result<TuPerModel<Vec<serde_json::Value>>> {
    let [a, b, c] = paths else {
        bail!("exactly three model files are required, got {}", paths.len());
    };
    Ok(TuPerModel::new(
        read(a).with_context(|| format!("failed to read {}", a.display()))?,
        read(b).with_context(|| format!("failed to read {}", b.display()))?,
        read(c).with_context(|| format!("failed to read {}", c.display()))?,
    ))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let reader = TuStreamReader::new().with_config(TuReaderConfig {
        skip_errors: !cli.strict,
        ..TuReaderConfig::default()
    });

    match cli.command {
        Command::Annotate(args) => {
            let config = session_config(config, &args);
            let workbench = TuWorkbench::new(config)?;
            let stdin = std::io::stdin();
            let mut console = TuConsole::new(workbench, stdin.lock(), std::io::stdout());
            console.run()?;
        }
        Command::Export(args) => {
            let config = session_config(config, &args.session);
            let output_dir = config.output_dir.clone();
            let mut workbench = TuWorkbench::new(config)?;
            let roster = workbench.config().roster()?;
            let (store, stats) = TuLegacyImporter::new(roster)?
                .import_path(&args.scores)
                .with_context(|| format!("failed to import {}", args.scores.display()))?;
            let session = workbench.sign_in(&args.teacher)?;
            session.replace_store(store);
            let (path, written) = session.export_to(&output_dir)?;
            println!(
                "{} entries imported, {} rows written to {}",
                stats.entries,
                written.rows_written,
                path.display()
            );
        }
        Command::CollatePart1(args) => {
            let keep = match &args.keep {
                Some(path) => Some(
                    std::fs::read_to_string(path)
                        .with_context(|| format!("failed to read {}", path.display()))?
                        .lines()
                        .map(str::trim)
                        .filter(|l| !l.is_empty())
                        .map(str::to_string)
                        .collect::<HashSet<String>>(),
                ),
                None => None,
            };
            let dumps = per_model(&args.models, |p| reader.read_jsonl(p))?;
            let records = TuPart1Collator::new(config.roster()?).collate(dumps, keep.as_ref());
            write_jsonl(&args.output, &records)?;
            println!("{} part1 candidates written to {}", records.len(), args.output.display());
        }
        Command::CollatePart2(args) => {
            let candidates: Vec<String> = reader
                .read_jsonl(&args.part1)?
                .iter()
                .filter_map(|record| match record.get("question_id")? {
                    serde_json::Value::String(s) => Some(s.clone()),
                    serde_json::Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect();
            let dumps = per_model(&args.models, |p| reader.read_jsonl(p))?;
            let blocks = TuPart2Builder::new(config.roster()?).build(&candidates, dumps);
            write_jsonl(&args.output, &blocks)?;
            println!("{} part2 blocks written to {}", blocks.len(), args.output.display());
        }
        Command::CollatePart3(args) => {
            let questions = reader.read_json_array(&args.questions)?;
            let dumps = per_model(&args.models, |p| reader.read_json_array(p))?;
            let items = TuPart3Collator::new(config.roster()?).collate(questions, dumps);
            write_jsonl(&args.output, &items)?;
            println!("{} part3 items written to {}", items.len(), args.output.display());
        }
        Command::Merge(args) => {
            let (samples, report) = TuCorpusMerger::new(config.roster()?).merge(
                reader.read_jsonl(&args.part1)?,
                reader.read_jsonl(&args.part2)?,
                reader.read_jsonl(&args.part3)?,
            );
            write_json_array(&args.output, &samples)?;
            println!("{} samples written to {}", report.samples, args.output.display());
            if report.part3_exhausted {
                println!("warning: part3 items ran out after {} samples", report.part3_used);
            }
        }
        Command::ReplacePart2(args) => {
            let mut corpus = reader.read_json_array(&args.corpus)?;
            let updated = replace_part2(&mut corpus, reader.read_jsonl(&args.part2)?);
            write_json_array(&args.output, &corpus)?;
            println!("{} samples updated, written to {}", updated, args.output.display());
        }
        Command::Assign(args) => {
            let assigner = TuAssigner::new(TuAssignConfig {
                teachers: args.teachers,
                redundancy: args.redundancy,
                seed: args.seed,
            })?;
            let assignments = assigner.assign(reader.read_json_array(&args.input)?);
            let paths = write_assignments(&args.output_dir, &assignments)?;
            println!("{} teacher files written to {}", paths.len(), args.output_dir.display());
        }
        Command::RepairLatex(args) => {
            let only_when_needed = config.latex.only_when_needed && !args.all;
            let repairer = TuLlmLatexRepairer::from_config(config.latex.clone())?;
            let scopes = args.scope.into_iter().map(TuRepairScope::from).collect();
            let pass = TuLatexRepairPass::new(&repairer, config.roster()?, scopes)?
                .with_only_when_needed(only_when_needed);
            let (output, stats) = pass.repair_file(&args.file)?;
            println!(
                "{} fields repaired, {} failed, written to {}",
                stats.fields_repaired,
                stats.fields_failed,
                output.display()
            );
        }
    }

    Ok(())
}
