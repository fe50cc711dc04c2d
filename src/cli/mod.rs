mod metadata;
mod report;

use clap::{Args, Parser, Subcommand};

pub use metadata::{FieldKindArg, FieldsArgs, IssueTypesArgs, ProjectsArgs};
pub use report::{GranularityArg, ReportArgs, TargetArg, TermArg};

use crate::services::{JiraClient, Settings, SettingsLayer};
use crate::types::Result;

/// Count & sum Jira issue fields per day, week, month, sprint or field value
#[derive(Parser, Debug)]
#[command(name = "issuesum")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Connection flags; each overrides the config file and environment
#[derive(Args, Debug, Default, Clone)]
pub struct ConnectionArgs {
    /// Jira site root, e.g. https://example.atlassian.net
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Account e-mail used for basic auth
    #[arg(long, global = true)]
    pub email: Option<String>,

    /// Jira API token
    #[arg(long, global = true)]
    pub api_token: Option<String>,
}

impl ConnectionArgs {
    fn client(&self) -> Result<JiraClient> {
        let settings = Settings::load(SettingsLayer {
            base_url: self.base_url.clone(),
            email: self.email.clone(),
            api_token: self.api_token.clone(),
        })?;
        JiraClient::new(&settings)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Aggregate issues into a term × target report
    Report(ReportArgs),

    /// List fields usable as number, date or grouping fields
    Fields(FieldsArgs),

    /// List recently viewed projects
    Projects(ProjectsArgs),

    /// List the issue types of a project
    IssueTypes(IssueTypesArgs),
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let client = self.connection.client()?;
        match self.command {
            Commands::Report(args) => args.run(client)?,
            Commands::Fields(args) => args.run(&client)?,
            Commands::Projects(args) => args.run(&client)?,
            Commands::IssueTypes(args) => args.run(&client)?,
        }
        Ok(())
    }
}
