//! `issuesum report` subcommand

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{Local, NaiveDate};
use clap::{Args, ValueEnum};
use tokio_util::sync::CancellationToken;

use crate::services::{JiraClient, ReportService};
use crate::types::{
    Bucket, Granularity, IssueSumError, Report, ReportRequest, Result, TargetType, TermPreset,
};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum GranularityArg {
    Daily,
    Weekly,
    Monthly,
    Sprint,
    /// Distinct values of --group-field
    Custom,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetArg {
    IssueType,
    Assignee,
    /// Parent epic key, `No epic` when there is none
    Epic,
    /// Distinct values of --target-field
    Custom,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TermArg {
    PastYear,
    PastMonth,
    #[value(name = "past-3-months")]
    Past3Months,
    #[value(name = "past-6-months")]
    Past6Months,
    /// Explicit --from/--to
    Range,
}

/// Aggregate issues into a term × target report
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Project key
    #[arg(long)]
    pub project: String,

    /// Restrict to an issue type (repeatable)
    #[arg(long = "issue-type", value_name = "TYPE")]
    pub issue_types: Vec<String>,

    /// Numeric field summed per bucket (count only when omitted)
    #[arg(long, value_name = "FIELD_ID")]
    pub number_field: Option<String>,

    /// Date field the range and date terms apply to
    #[arg(long, value_name = "FIELD_ID")]
    pub date_field: Option<String>,

    #[arg(long, value_enum, default_value_t = GranularityArg::Monthly)]
    pub granularity: GranularityArg,

    /// Field grouped by with --granularity custom
    #[arg(long, value_name = "FIELD_ID")]
    pub group_field: Option<String>,

    #[arg(long, value_enum, default_value_t = TargetArg::IssueType)]
    pub target: TargetArg,

    /// Field split by with --target custom
    #[arg(long, value_name = "FIELD_ID")]
    pub target_field: Option<String>,

    /// Date window; defaults to range when --from/--to are given, else past-year
    #[arg(long, value_enum)]
    pub term: Option<TermArg>,

    /// First day of the range (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day of the range, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Cumulative flow: DONE vs TODO / DOING at each period start
    #[arg(long)]
    pub cumulative: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ReportArgs {
    pub fn run(self, client: JiraClient) -> Result<()> {
        let request = self.to_request(Local::now().date_naive())?;
        let service = ReportService::new(client);
        let report = service.run(&request, &CancellationToken::new())?;

        if self.json {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| IssueSumError::Parse(e.to_string()))?;
            println!("{}", json);
        } else {
            print!("{}", render_table(&report, &request));
        }
        Ok(())
    }

    /// Build the request, resolving the term preset against `today`
    pub fn to_request(&self, today: NaiveDate) -> Result<ReportRequest> {
        let granularity = match self.granularity {
            GranularityArg::Daily => Granularity::Daily,
            GranularityArg::Weekly => Granularity::Weekly,
            GranularityArg::Monthly => Granularity::Monthly,
            GranularityArg::Sprint => Granularity::Sprint,
            GranularityArg::Custom => Granularity::Custom(required(
                &self.group_field,
                "--group-field is required with --granularity custom",
            )?),
        };
        let target = match self.target {
            TargetArg::IssueType => TargetType::IssueType,
            TargetArg::Assignee => TargetType::Assignee,
            TargetArg::Epic => TargetType::Epic,
            TargetArg::Custom => TargetType::Custom(required(
                &self.target_field,
                "--target-field is required with --target custom",
            )?),
        };

        let term = match (self.term, self.from, self.to) {
            (None | Some(TermArg::Range), Some(from), Some(to)) => TermPreset::Range { from, to },
            (Some(TermArg::Range), _, _) => {
                return Err(IssueSumError::Config(
                    "--term range needs both --from and --to".into(),
                ))
            }
            (None, _, _) | (Some(TermArg::PastYear), _, _) => TermPreset::PastYear,
            (Some(TermArg::PastMonth), _, _) => TermPreset::PastMonth,
            (Some(TermArg::Past3Months), _, _) => TermPreset::Past3Months,
            (Some(TermArg::Past6Months), _, _) => TermPreset::Past6Months,
        };

        Ok(ReportRequest {
            project: self.project.clone(),
            issue_types: self.issue_types.clone(),
            number_field: self.number_field.clone(),
            date_field: self.date_field.clone().unwrap_or_default(),
            granularity,
            target,
            range: term.resolve(today),
            cumulative: self.cumulative,
        })
    }
}

fn required(value: &Option<String>, message: &str) -> Result<String> {
    value
        .clone()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| IssueSumError::Config(message.into()))
}

/// Pivot the ordered buckets into a term-per-row, target-per-column table.
///
/// Cells show the sum when a number field was requested, otherwise the count.
pub fn render_table(report: &Report, request: &ReportRequest) -> String {
    let show_sum = request.number_field.is_some() && !request.cumulative;

    // rows keep bucket order; cells are indexed once by (term, target)
    let mut terms: Vec<&str> = Vec::new();
    let mut seen_terms: HashSet<&str> = HashSet::new();
    let mut targets: BTreeSet<&str> = BTreeSet::new();
    let mut cells: HashMap<(&str, &str), &Bucket> = HashMap::with_capacity(report.buckets.len());
    for bucket in &report.buckets {
        let (term, target) = (bucket.term.as_str(), bucket.target.as_str());
        if seen_terms.insert(term) {
            terms.push(term);
        }
        targets.insert(target);
        cells.insert((term, target), bucket);
    }

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(terms.len() + 1);
    let mut header = vec![request.granularity.label().to_string()];
    header.extend(targets.iter().map(|t| t.to_string()));
    rows.push(header);

    for term in &terms {
        let mut row = vec![term.to_string()];
        for target in &targets {
            let cell = cells
                .get(&(*term, *target))
                .map(|b| {
                    if show_sum {
                        b.sum.to_string()
                    } else {
                        b.count.to_string()
                    }
                })
                .unwrap_or_default();
            row.push(cell);
        }
        rows.push(row);
    }

    let columns = rows[0].len();
    let widths: Vec<usize> = (0..columns)
        .map(|c| rows.iter().map(|r| r[c].chars().count()).max().unwrap_or(0))
        .collect();

    let mut out = format!("{}  ({} issues)\n", report.summary, report.issue_count);
    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(c, cell)| {
                if c == 0 {
                    format!("{:<w$}", cell, w = widths[c])
                } else {
                    format!("{:>w$}", cell, w = widths[c])
                }
            })
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}
