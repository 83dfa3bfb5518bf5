//! CLI commands

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use jobtrack_http::salary::format_salary;
use jobtrack_http::types::{
    AccountType, Application, ApplicationUpdate, EmploymentMeans, EmploymentType, JobPosting,
    JobPostingDraft,
};
use jobtrack_http::{Access, Session};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the session tokens
    Login {
        #[arg(long, short)]
        username: String,

        /// Password (prefer the environment variable over the flag)
        #[arg(long, env = "JOBTRACK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Log out and forget the stored tokens
    Logout,

    /// Create an account
    Register {
        #[arg(long, short)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "JOBTRACK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Show the logged-in user
    Whoami,

    /// Job postings
    Jobs {
        #[command(subcommand)]
        command: JobCommands,
    },

    /// Applications
    Applications {
        #[command(subcommand)]
        command: ApplicationCommands,
    },

    /// Answer a job question for one of your applications
    Answer {
        /// Application id
        #[arg(long)]
        application: u64,

        /// Question id
        #[arg(long)]
        question: u64,

        /// Answer text
        value: String,
    },
}

#[derive(Subcommand)]
pub enum JobCommands {
    /// List postings
    List,

    /// Show one posting
    Show { id: u64 },

    /// Create a posting (employers)
    Create(PostingArgs),

    /// Update a posting (employers)
    Update {
        id: u64,

        #[command(flatten)]
        fields: PostingArgs,
    },

    /// Delete a posting (employers)
    Delete { id: u64 },

    /// Start an application and list the job's questions (applicants)
    Apply { id: u64 },
}

#[derive(Args, Default)]
pub struct PostingArgs {
    #[arg(long)]
    title: Option<String>,

    /// Company id
    #[arg(long)]
    company: Option<u64>,

    #[arg(long)]
    location: Option<String>,

    /// RE, ON or HY
    #[arg(long, value_parser = parse_means)]
    means: Option<EmploymentMeans>,

    /// FT, PT, CT or IN
    #[arg(long = "type", value_parser = parse_type)]
    employment_type: Option<EmploymentType>,

    #[arg(long)]
    salary: Option<String>,

    #[arg(long)]
    currency: Option<String>,

    #[arg(long)]
    description: Option<String>,
}

impl From<PostingArgs> for JobPostingDraft {
    fn from(args: PostingArgs) -> Self {
        Self {
            title: args.title,
            company: args.company,
            location: args.location,
            employment_means: args.means,
            employment_type: args.employment_type,
            salary_range: args.salary,
            currency_code: args.currency,
            description: args.description,
        }
    }
}

fn parse_means(value: &str) -> Result<EmploymentMeans, String> {
    serde_json::from_value(serde_json::Value::String(value.to_ascii_uppercase()))
        .map_err(|_| format!("expected RE, ON or HY, got {value}"))
}

fn parse_type(value: &str) -> Result<EmploymentType, String> {
    serde_json::from_value(serde_json::Value::String(value.to_ascii_uppercase()))
        .map_err(|_| format!("expected FT, PT, CT or IN, got {value}"))
}

#[derive(Subcommand)]
pub enum ApplicationCommands {
    /// List your applications (or applicants to your postings)
    List,

    /// Show one application
    Show { id: u64 },

    /// Replace the notes of an application
    Notes { id: u64, notes: String },

    /// Delete an application
    Delete { id: u64 },

    /// Attach a resume file (applicants)
    Resume { id: u64, file: PathBuf },

    /// Attach a cover letter file (applicants)
    CoverLetter { id: u64, file: PathBuf },

    /// Submit a draft (applicants)
    Submit { id: u64 },

    /// Withdraw a submitted application back to draft (applicants)
    Withdraw { id: u64 },

    /// Move to the interview stage (employers)
    Promote { id: u64 },

    /// Extend an offer (employers)
    Offer { id: u64 },

    /// Reject (employers)
    Reject { id: u64 },
}

impl Commands {
    pub async fn execute(self, session: &Session) -> Result<()> {
        match self {
            Commands::Login { username, password } => {
                let me = session.login(&username, &password).await?;
                println!(
                    "Logged in as {} ({})",
                    me.username,
                    role_name(me.account_type)
                );
                Ok(())
            }
            Commands::Logout => {
                // Local tokens are gone even if the server call failed
                if let Err(err) = session.logout().await {
                    info!(error = %err, "Server-side logout failed");
                }
                println!("Logged out");
                Ok(())
            }
            Commands::Register {
                username,
                email,
                password,
            } => {
                session
                    .client()
                    .register(&username, &password, &email)
                    .await?;
                println!("Account {username} created, you can now log in");
                Ok(())
            }
            Commands::Whoami => {
                guard(session.require_auth())?;
                match session.me() {
                    Some(me) => print_json(&me),
                    None => bail!("Not logged in, run `jobtrack login`"),
                }
            }
            Commands::Jobs { command } => command.execute(session).await,
            Commands::Applications { command } => command.execute(session).await,
            Commands::Answer {
                application,
                question,
                value,
            } => {
                guard(session.require_role(AccountType::Applicant))?;
                let client = session.client();
                let current = client.get_application(application).await?;
                let questions = client.apply_to_job(current.job.id()).await?.questions;
                let Some(entry) = questions.iter().find(|q| q.question.id == question) else {
                    bail!("Question {question} does not belong to application {application}");
                };
                let saved = client
                    .save_answer(application, question, entry.answer.as_ref(), &value)
                    .await?;
                print_json(&saved)
            }
        }
    }
}

impl JobCommands {
    pub async fn execute(self, session: &Session) -> Result<()> {
        let client = session.client();
        match self {
            JobCommands::List => {
                guard(session.require_auth())?;
                for job in client.list_job_postings().await? {
                    println!("{}", posting_line(&job));
                }
                Ok(())
            }
            JobCommands::Show { id } => {
                guard(session.require_auth())?;
                print_json(&client.get_job_posting(id).await?)
            }
            JobCommands::Create(fields) => {
                guard(session.require_role(AccountType::Employer))?;
                let draft = JobPostingDraft::from(fields);
                if draft.title.is_none() || draft.location.is_none() {
                    bail!("--title and --location are required to create a posting");
                }
                print_json(&client.create_job_posting(&draft).await?)
            }
            JobCommands::Update { id, fields } => {
                guard(session.require_role(AccountType::Employer))?;
                let draft = JobPostingDraft::from(fields);
                if draft == JobPostingDraft::default() {
                    bail!("Nothing to update");
                }
                print_json(&client.update_job_posting(id, &draft).await?)
            }
            JobCommands::Delete { id } => {
                guard(session.require_role(AccountType::Employer))?;
                client.delete_job_posting(id).await?;
                println!("Deleted posting {id}");
                Ok(())
            }
            JobCommands::Apply { id } => {
                guard(session.require_role(AccountType::Applicant))?;
                let applied = client.apply_to_job(id).await?;
                if let Some(application) = &applied.application {
                    println!("Draft application {}", application.id);
                }
                for entry in &applied.questions {
                    let answer = entry
                        .answer
                        .as_ref()
                        .and_then(|a| a.answer_value.as_deref())
                        .unwrap_or("");
                    let marker = if entry.question.required { "*" } else { " " };
                    println!(
                        "[{}]{marker} {}: {answer}",
                        entry.question.id, entry.question.question_prompt
                    );
                }
                Ok(())
            }
        }
    }
}

impl ApplicationCommands {
    pub async fn execute(self, session: &Session) -> Result<()> {
        let client = session.client();
        match self {
            ApplicationCommands::List => {
                guard(session.require_auth())?;
                for application in client.list_applications().await? {
                    println!("{}", application_line(&application));
                }
                Ok(())
            }
            ApplicationCommands::Show { id } => {
                guard(session.require_auth())?;
                print_json(&client.get_application(id).await?)
            }
            ApplicationCommands::Notes { id, notes } => {
                guard(session.require_role(AccountType::Applicant))?;
                let update = ApplicationUpdate { notes: Some(notes) };
                print_json(&client.update_application(id, &update).await?)
            }
            ApplicationCommands::Delete { id } => {
                guard(session.require_role(AccountType::Applicant))?;
                client.delete_application(id).await?;
                println!("Deleted application {id}");
                Ok(())
            }
            ApplicationCommands::Resume { id, file } => {
                guard(session.require_role(AccountType::Applicant))?;
                let (name, bytes) = read_upload(&file).await?;
                print_json(&client.upload_resume(id, &name, bytes).await?)
            }
            ApplicationCommands::CoverLetter { id, file } => {
                guard(session.require_role(AccountType::Applicant))?;
                let (name, bytes) = read_upload(&file).await?;
                print_json(&client.upload_cover_letter(id, &name, bytes).await?)
            }
            ApplicationCommands::Submit { id } => {
                guard(session.require_role(AccountType::Applicant))?;
                print_json(&client.submit_application(id).await?)
            }
            ApplicationCommands::Withdraw { id } => {
                guard(session.require_role(AccountType::Applicant))?;
                print_json(&client.withdraw_application(id).await?)
            }
            ApplicationCommands::Promote { id } => {
                guard(session.require_role(AccountType::Employer))?;
                print_json(&client.promote_to_interview(id).await?)
            }
            ApplicationCommands::Offer { id } => {
                guard(session.require_role(AccountType::Employer))?;
                print_json(&client.offer_application(id).await?)
            }
            ApplicationCommands::Reject { id } => {
                guard(session.require_role(AccountType::Employer))?;
                print_json(&client.reject_application(id).await?)
            }
        }
    }
}

async fn read_upload(path: &Path) -> Result<(String, Vec<u8>)> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("{} is not a file name", path.display()))?
        .to_string();
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok((name, bytes))
}

/// Turn a guard decision into an error the user can act on
fn guard(access: Access) -> Result<()> {
    match access {
        Access::Allow => Ok(()),
        Access::Pending | Access::RedirectToLogin => {
            bail!("Not logged in, run `jobtrack login`")
        }
        Access::RedirectTo(home) => {
            let role = if home.starts_with("/employer") {
                AccountType::Employer
            } else {
                AccountType::Applicant
            };
            bail!(
                "This command is not available to {} accounts",
                role_name(role)
            )
        }
    }
}

fn role_name(role: AccountType) -> &'static str {
    match role {
        AccountType::Applicant => "applicant",
        AccountType::Employer => "employer",
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn posting_line(job: &JobPosting) -> String {
    let company = job
        .company
        .name()
        .map_or_else(|| format!("company #{}", job.company.id()), str::to_string);
    let salary = format_salary(job.salary_range.as_deref(), &job.currency_code);
    format!(
        "{:>5}  {}  {}  {}  {}",
        job.id, job.title, company, job.location, salary
    )
    .trim_end()
    .to_string()
}

fn application_line(application: &Application) -> String {
    format!(
        "{:>5}  job #{}  {}  {:?}",
        application.id,
        application.job.id(),
        application.applicant.display_name(),
        application.status
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobtrack_http::types::{CompanyRef, CompanySummary};

    #[test]
    fn parses_employment_codes_case_insensitively() {
        assert_eq!(parse_means("hy"), Ok(EmploymentMeans::Hybrid));
        assert_eq!(parse_type("CT"), Ok(EmploymentType::Contract));
        assert!(parse_means("office").is_err());
    }

    #[tokio::test]
    async fn upload_uses_the_file_name_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.pdf");
        std::fs::write(&path, b"resume content").unwrap();

        let (name, bytes) = read_upload(&path).await.unwrap();
        assert_eq!(name, "resume.pdf");
        assert_eq!(bytes, b"resume content");
        assert!(read_upload(&dir.path().join("missing.pdf")).await.is_err());
    }

    #[test]
    fn guard_explains_wrong_role() {
        let err = guard(Access::RedirectTo("/employer/jobs")).unwrap_err();
        assert!(err.to_string().contains("employer"));
        assert!(guard(Access::Allow).is_ok());
    }

    #[test]
    fn posting_line_includes_salary_symbol() {
        let job = JobPosting {
            id: 3,
            title: "Engineer".into(),
            company: CompanyRef::Summary(CompanySummary {
                id: 1,
                name: "Acme".into(),
            }),
            location: "Berlin".into(),
            employment_means: EmploymentMeans::OnSite,
            employment_type: EmploymentType::FullTime,
            salary_range: Some("70k-90k".into()),
            currency_code: "EUR".into(),
            description: String::new(),
            posted_date: None,
        };
        assert_eq!(posting_line(&job), "    3  Engineer  Acme  Berlin  €70k-90k");
    }
}
