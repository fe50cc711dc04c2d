//! Metadata listing subcommands: `fields`, `projects`, `issue-types`

use clap::{Args, ValueEnum};
use serde::Serialize;

use crate::services::{IssueSource, JiraClient};
use crate::types::{FieldKind, FieldMeta, IssueSumError, Result};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKindArg {
    Number,
    Datetime,
    Option,
    All,
}

impl FieldKindArg {
    fn kind(self) -> Option<FieldKind> {
        match self {
            Self::Number => Some(FieldKind::Number),
            Self::Datetime => Some(FieldKind::Date),
            Self::Option => Some(FieldKind::Option),
            Self::All => None,
        }
    }
}

/// List fields usable as number, date or grouping fields
#[derive(Args, Debug)]
pub struct FieldsArgs {
    #[arg(long, value_enum, default_value_t = FieldKindArg::All)]
    pub kind: FieldKindArg,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl FieldsArgs {
    pub fn run(self, client: &JiraClient) -> Result<()> {
        let mut fields = match self.kind.kind() {
            Some(kind) => client.fields_of_kind(kind)?,
            None => client.fields()?,
        };
        fields.sort_by(|a, b| a.name.cmp(&b.name));

        if self.json {
            print_json(&fields)
        } else {
            print!("{}", render_fields(&fields));
            Ok(())
        }
    }
}

/// List recently viewed projects
#[derive(Args, Debug)]
pub struct ProjectsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ProjectsArgs {
    pub fn run(self, client: &JiraClient) -> Result<()> {
        let projects = client.recent_projects()?;
        if self.json {
            return print_json(&projects);
        }
        let rows: Vec<[&str; 3]> = projects
            .iter()
            .map(|p| [p.key.as_str(), p.id.as_str(), p.name.as_str()])
            .collect();
        print!("{}", render_rows(["KEY", "ID", "NAME"], &rows));
        Ok(())
    }
}

/// List the issue types of a project
#[derive(Args, Debug)]
pub struct IssueTypesArgs {
    /// Numeric project id (see `issuesum projects`)
    #[arg(long)]
    pub project_id: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IssueTypesArgs {
    pub fn run(self, client: &JiraClient) -> Result<()> {
        let types = client.project_issue_types(&self.project_id)?;
        if self.json {
            return print_json(&types);
        }
        let rows: Vec<[&str; 3]> = types
            .iter()
            .map(|t| {
                let subtask = if t.subtask { "subtask" } else { "" };
                [t.name.as_str(), t.id.as_str(), subtask]
            })
            .collect();
        print!("{}", render_rows(["NAME", "ID", ""], &rows));
        Ok(())
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json =
        serde_json::to_string_pretty(value).map_err(|e| IssueSumError::Parse(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

fn render_fields(fields: &[FieldMeta]) -> String {
    let rows: Vec<[&str; 3]> = fields
        .iter()
        .map(|f| [f.id.as_str(), f.schema_type().unwrap_or("-"), f.name.as_str()])
        .collect();
    render_rows(["ID", "TYPE", "NAME"], &rows)
}

/// Left-aligned three-column table
fn render_rows(header: [&str; 3], rows: &[[&str; 3]]) -> String {
    let mut widths = header.map(|h| h.chars().count());
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in std::iter::once(&header).chain(rows) {
        let line = format!(
            "{:<w0$}  {:<w1$}  {}",
            row[0],
            row[1],
            row[2],
            w0 = widths[0],
            w1 = widths[1]
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}
