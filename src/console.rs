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

//! # Annotation Console
//!
//! Line-oriented front end over a [`TuWorkbench`]. The first line names the
//! teacher; after that each line is one command. Numbers in commands are
//! 1-based, model slots are written `1`, `m1` or `模型1`.
//!
//! ```text
//! show | next | prev | jump <n>
//! rank <slot> <slot> <slot>
//! p1 <dimension#> <slot> <value>
//! p2 <block#> <slot> <value>
//! p3 <item#> <score#> <slot> <value>
//! status | export | signout | help | quit
//! ```

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

use crate::dimensions::{TuControl, TuPart1Dimension};
use crate::errors::{Result, TuError};
use crate::model::{TuSlot, TuTurn};
use crate::present::{present, TuSampleView, TuScoreLine, TuSlotted};
use crate::session::{TuRankOutcome, TuSession, TuWorkbench};

#[derive(Clone, Debug, PartialEq)]
pub enum TuCommand {
    Show,
    Next,
    Prev,
    /// 1-based sample number.
    Jump(usize),
    Rank(Vec<TuSlot>),
    Part1 {
        dimension: TuPart1Dimension,
        slot: TuSlot,
        value: f64,
    },
    /// 0-based block index.
    Part2 {
        block: usize,
        slot: TuSlot,
        value: f64,
    },
    /// 0-based item and score indices.
    Part3 {
        item: usize,
        score: usize,
        slot: TuSlot,
        value: f64,
    },
    /// Ranking progress over the whole corpus.
    Status,
    Export,
    SignOut,
    Help,
    Quit,
}

fn ordinal(token: Option<&str>, what: &str) -> Result<usize> {
    let token = token.ok_or_else(|| TuError::validation(format!("missing {}", what)))?;
    match token.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(TuError::validation(format!("{} must be a number from 1, got '{}'", what, token))),
    }
}

fn slot(token: Option<&str>) -> Result<TuSlot> {
    token
        .ok_or_else(|| TuError::validation("missing model slot"))?
        .parse()
}

fn value(token: Option<&str>) -> Result<f64> {
    let token = token.ok_or_else(|| TuError::validation("missing score value"))?;
    token
        .parse::<f64>()
        .map_err(|_| TuError::validation(format!("score '{}' is not a number", token)))
}

impl FromStr for TuCommand {
    type Err = TuError;

    fn from_str(line: &str) -> Result<Self> {
        let mut tokens = line.split_whitespace();
        let Some(head) = tokens.next() else {
            return Err(TuError::validation("empty command"));
        };
        let command = match head.to_ascii_lowercase().as_str() {
            "show" => TuCommand::Show,
            "next" | "n" => TuCommand::Next,
            "prev" | "p" => TuCommand::Prev,
            "jump" | "j" => TuCommand::Jump(ordinal(tokens.next(), "sample number")?),
            "rank" => TuCommand::Rank(
                tokens
                    .by_ref()
                    .map(|t| t.parse::<TuSlot>())
                    .collect::<Result<Vec<_>>>()?,
            ),
            "p1" => TuCommand::Part1 {
                dimension: TuPart1Dimension::from_number(ordinal(tokens.next(), "dimension number")?)?,
                slot: slot(tokens.next())?,
                value: value(tokens.next())?,
            },
            "p2" => TuCommand::Part2 {
                block: ordinal(tokens.next(), "block number")? - 1,
                slot: slot(tokens.next())?,
                value: value(tokens.next())?,
            },
            "p3" => TuCommand::Part3 {
                item: ordinal(tokens.next(), "item number")? - 1,
                score: ordinal(tokens.next(), "score number")? - 1,
                slot: slot(tokens.next())?,
                value: value(tokens.next())?,
            },
            "status" => TuCommand::Status,
            "export" => TuCommand::Export,
            "signout" | "logout" => TuCommand::SignOut,
            "help" | "?" => TuCommand::Help,
            "quit" | "exit" | "q" => TuCommand::Quit,
            other => return Err(TuError::validation(format!("unknown command '{}'", other))),
        };
        if let Some(extra) = tokens.next() {
            return Err(TuError::validation(format!("unexpected argument '{}'", extra)));
        }
        Ok(command)
    }
}

const HELP: &str = "commands: show | next | prev | jump <n> | rank <s> <s> <s> | \
p1 <dim#> <slot> <value> | p2 <block#> <slot> <value> | p3 <item#> <score#> <slot> <value> | \
status | export | signout | quit";

/// Read-eval loop over any line source and sink.
pub struct TuConsole<R: BufRead, W: Write> {
    workbench: TuWorkbench,
    input: R,
    output: W,
    export_dir: PathBuf,
}

impl<R: BufRead, W: Write> TuConsole<R, W> {
    pub fn new(workbench: TuWorkbench, input: R, output: W) -> Self {
        let export_dir = workbench.config().output_dir.clone();
        Self {
            workbench,
            input,
            output,
            export_dir,
        }
    }

    pub fn workbench(&self) -> &TuWorkbench {
        &self.workbench
    }

    /// Runs until `quit` or end of input. Command errors are reported and the
    /// loop goes on; only I/O failures on the console itself end it early.
    pub fn run(&mut self) -> Result<()> {
        loop {
            let signed_in = self.workbench.active().is_some();
            write!(self.output, "{}", if signed_in { "> " } else { "教师ID> " })?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if !signed_in {
                if line.eq_ignore_ascii_case("quit") {
                    break;
                }
                match self.workbench.sign_in(line) {
                    Ok(session) => {
                        let text = show_current(session);
                        writeln!(self.output, "{}", text)?;
                    }
                    Err(e) => writeln!(self.output, "登录失败: {}", e)?,
                }
                continue;
            }

            let command = match line.parse::<TuCommand>() {
                Ok(command) => command,
                Err(e) => {
                    writeln!(self.output, "{}\n{}", e, HELP)?;
                    continue;
                }
            };
            if command == TuCommand::Quit {
                break;
            }
            let reply = self.execute(command);
            writeln!(self.output, "{}", reply)?;
        }
        Ok(())
    }

    fn execute(&mut self, command: TuCommand) -> String {
        if command == TuCommand::SignOut {
            self.workbench.sign_out();
            return "已退出".to_string();
        }
        if command == TuCommand::Help {
            return HELP.to_string();
        }
        let export_dir = self.export_dir.clone();
        let Some(session) = self.workbench.active_mut() else {
            return "请先登录".to_string();
        };
        let current = session.navigator().current();

        let outcome: Result<String> = match command {
            TuCommand::Show => Ok(show_current(session)),
            TuCommand::Next => {
                if session.navigator_mut().next() {
                    Ok(show_current(session))
                } else {
                    Ok("已经是最后一条".to_string())
                }
            }
            TuCommand::Prev => {
                if session.navigator_mut().prev() {
                    Ok(show_current(session))
                } else {
                    Ok("已经是第一条".to_string())
                }
            }
            TuCommand::Jump(number) => session
                .navigator_mut()
                .jump(number)
                .map(|_| show_current(session)),
            TuCommand::Rank(slots) => session.rank(current, &slots).map(|outcome| match outcome {
                TuRankOutcome::Complete => "排序已记录".to_string(),
                TuRankOutcome::Incomplete => "排序需包含全部三个模型，本题排序记为 0".to_string(),
            }),
            TuCommand::Part1 {
                dimension,
                slot,
                value,
            } => session
                .score_part1(current, dimension, slot, value)
                .map(|_| format!("{} {} = {}", dimension.label(), slot, value)),
            TuCommand::Part2 { block, slot, value } => session
                .score_part2(current, block, slot, value)
                .map(|_| format!("part2 block {} {} = {}", block + 1, slot, value)),
            TuCommand::Part3 {
                item,
                score,
                slot,
                value,
            } => session
                .score_part3(current, item, score, slot, value)
                .map(|_| format!("part3 item {} score {} {} = {}", item + 1, score + 1, slot, value)),
            TuCommand::Status => Ok(ranking_status(session)),
            TuCommand::Export => session
                .export_to(&export_dir)
                .map(|(path, stats)| format!("导出 {} 行到 {}", stats.rows_written, path.display())),
            TuCommand::SignOut | TuCommand::Help | TuCommand::Quit => Ok(String::new()),
        };

        outcome.unwrap_or_else(|e| format!("错误: {}", e))
    }
}

/// Count of ranked samples and the 1-based numbers still waiting for a ranking.
fn ranking_status(session: &TuSession) -> String {
    let corpus = session.corpus();
    let ranked: BTreeSet<usize> = session
        .store()
        .ranked_poids()
        .filter_map(|poid| corpus.index_of(poid))
        .collect();
    let pending: Vec<String> = (0..corpus.len())
        .filter(|idx| !ranked.contains(idx))
        .map(|idx| (idx + 1).to_string())
        .collect();

    let mut text = format!("已排序 {} / {}", ranked.len(), corpus.len());
    if !pending.is_empty() {
        let _ = write!(text, "  未排序: {}", pending.join(", "));
    }
    text
}

/// Opens the current sample and renders its blinded view.
fn show_current(session: &mut TuSession) -> String {
    let position = session.navigator().label();
    match session.open_current() {
        Ok((sample, bijection)) => render(&present(&sample, &bijection, session.store(), position)),
        Err(e) => format!("第 {} 条样本无法显示: {}", position, e),
    }
}

fn render_turns(out: &mut String, dialogues: &TuSlotted<Vec<TuTurn>>) {
    for (slot, turns) in dialogues.iter() {
        let _ = writeln!(out, "  [{}]", slot);
        for turn in turns {
            if let Some(user) = &turn.user {
                let _ = writeln!(out, "    学生: {}", user);
            }
            if let Some(reply) = &turn.model_respond {
                let _ = writeln!(out, "    模型: {}", reply);
            }
        }
    }
}

fn render_scores(out: &mut String, lines: &[TuScoreLine]) {
    for line in lines {
        let values: Vec<String> = line
            .values
            .iter()
            .map(|(slot, v)| {
                let shown = if line.control == TuControl::Rank {
                    format!("{}", *v as i64)
                } else {
                    line.control.format(*v)
                };
                format!("{}={}", slot, shown)
            })
            .collect();
        let _ = writeln!(out, "  ({}) {}: {}", line.number, line.label, values.join("  "));
    }
}

/// Plain-text rendering of a sample view.
pub fn render(view: &TuSampleView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "第 {} 条样本  ID: {}", view.position, view.poid);

    let _ = writeln!(out, "== Part1 ==\n题目: {}", view.part1.question);
    if let Some(answer) = &view.part1.answer {
        let _ = writeln!(out, "答案: {}", answer);
    }
    render_turns(&mut out, &view.part1.dialogues);
    render_scores(&mut out, &view.part1.scores);

    for (idx, block) in view.part2.iter().enumerate() {
        let _ = writeln!(out, "== Part2 block {} [{}] ==", idx + 1, block.tag);
        if let Some(question) = block.questions.0.iter().flatten().next() {
            let _ = writeln!(out, "题目: {}", question);
        }
        render_turns(&mut out, &block.dialogues);
        render_scores(&mut out, std::slice::from_ref(&block.score));
    }

    for (idx, item) in view.part3.iter().enumerate() {
        let _ = writeln!(out, "== Part3 item {} [{}] ==", idx + 1, item.feedback_type.as_str());
        let _ = writeln!(out, "题目: {}", item.question);
        if let Some(reply) = &item.last_model_reply {
            let _ = writeln!(out, "上一轮: {}", reply);
        }
        let _ = writeln!(out, "学生: {}", item.student);
        for (slot, response) in item.responses.iter() {
            let _ = writeln!(out, "  [{}] {}", slot, response);
        }
        let _ = writeln!(out, "参考: {}", item.reference);
        render_scores(&mut out, &item.scores);
    }
    out
}
