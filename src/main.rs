use bitlet::areas::repository::Repository;
use bitlet::artifacts::checkout::target::CheckoutTarget;
use bitlet::artifacts::core::PagerWriter;
use bitlet::errors::BitletError;
use bitlet::telemetry;
use clap::{Parser, Subcommand};
use is_terminal::IsTerminal;
use minus::Pager;
use std::io::Write;

const NO_PAGER_ENV: &str = "NO_PAGER";

#[derive(Parser)]
#[command(
    name = "bitlet",
    version = "0.1.0",
    author = "Sami Barbut-Dica",
    about = "A tiny local version-control system",
    long_about = "bitlet snapshots whole files into a content-addressed store, \
    keeps a commit history with branches and merges branches with a three-way merge. \
    Everything lives in the .bitlet directory of the current working directory.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Initialize a new repository",
        long_about = "This command creates the .bitlet directory, the initial commit and the master branch."
    )]
    Init,
    #[command(name = "add", about = "Stage a file for the next commit")]
    Add {
        #[arg(index = 1, help = "The file to stage")]
        file: String,
    },
    #[command(
        name = "commit",
        about = "Record the staged changes",
        long_about = "This command snapshots the current commit's files with the staged additions and removals applied."
    )]
    Commit {
        #[arg(index = 1, help = "The commit message")]
        message: Option<String>,
    },
    #[command(
        name = "rm",
        about = "Unstage a file, or stage a tracked file for removal"
    )]
    Rm {
        #[arg(index = 1, help = "The file to remove")]
        file: String,
    },
    #[command(name = "log", about = "Show the history of the current branch")]
    Log,
    #[command(name = "global-log", about = "Show every commit ever made")]
    GlobalLog,
    #[command(name = "find", about = "Print the ids of the commits with the given message")]
    Find {
        #[arg(index = 1, help = "The exact commit message")]
        message: String,
    },
    #[command(name = "status", about = "Show branches, staged files and working tree changes")]
    Status,
    #[command(
        name = "checkout",
        about = "Restore a file or switch branches",
        long_about = "checkout -- <file> restores a file from the current commit, \
        checkout <commit> -- <file> restores it from the given commit and \
        checkout <branch> switches to the given branch."
    )]
    Checkout {
        #[arg(index = 1, help = "The branch to switch to, or the commit to restore from")]
        target: Option<String>,
        #[arg(index = 2, last = true, help = "The file to restore")]
        file: Option<String>,
    },
    #[command(name = "branch", about = "Create a branch at the current commit")]
    Branch {
        #[arg(index = 1, help = "The branch name")]
        name: String,
    },
    #[command(name = "rm-branch", about = "Delete a branch pointer")]
    RmBranch {
        #[arg(index = 1, help = "The branch name")]
        name: String,
    },
    #[command(name = "reset", about = "Check out a commit and move the current branch to it")]
    Reset {
        #[arg(index = 1, help = "The commit id or prefix")]
        commit: String,
    },
    #[command(name = "merge", about = "Merge a branch into the current branch")]
    Merge {
        #[arg(index = 1, help = "The branch to merge")]
        branch: String,
    },
}

impl Commands {
    fn is_paged(&self) -> bool {
        matches!(self, Commands::Log | Commands::GlobalLog)
    }
}

#[tokio::main]
async fn main() {
    telemetry::init();
    let cli = Cli::parse();

    if let Err(error) = run(cli).await {
        match error.downcast_ref::<BitletError>() {
            Some(bitlet_error) => {
                eprintln!("{bitlet_error}");
                std::process::exit(1);
            }
            None => {
                eprintln!("fatal: {error:#}");
                std::process::exit(128);
            }
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let is_terminal = std::io::stdout().is_terminal();
    if !is_terminal {
        colored::control::set_override(false);
    }

    let pager = Pager::new();
    let paged = cli.command.is_paged() && is_terminal && std::env::var_os(NO_PAGER_ENV).is_none();
    let writer: Box<dyn Write> = if paged {
        Box::new(PagerWriter::new(pager.clone()))
    } else {
        Box::new(std::io::stdout())
    };

    let pwd = std::env::current_dir()?;
    let mut repository = Repository::new(&pwd.to_string_lossy(), writer)?;

    match cli.command {
        Commands::Init => repository.init().await?,
        command => {
            repository.ensure_initialized()?;
            let _lock = repository.lock()?;
            dispatch(&mut repository, command).await?;
        }
    }

    repository.writer().flush()?;
    if paged {
        minus::page_all(pager)?;
    }

    Ok(())
}

async fn dispatch(repository: &mut Repository, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Init => repository.init().await,
        Commands::Add { file } => repository.add(&file).await,
        Commands::Commit { message } => repository.commit(message.as_deref().unwrap_or("")).await,
        Commands::Rm { file } => repository.rm(&file).await,
        Commands::Log => repository.log(),
        Commands::GlobalLog => repository.global_log(),
        Commands::Find { message } => repository.find(&message),
        Commands::Status => repository.status().await,
        Commands::Checkout { target, file } => {
            let target = CheckoutTarget::try_from_args(target, file)?;
            repository.checkout(target).await
        }
        Commands::Branch { name } => repository.branch(&name),
        Commands::RmBranch { name } => repository.rm_branch(&name),
        Commands::Reset { commit } => repository.reset(&commit).await,
        Commands::Merge { branch } => repository.merge(&branch).await,
    }
}
