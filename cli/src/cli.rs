use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use libcloudac::{
    download_course, download_learning_path, CdlError, CourseReport, CourseRequest,
    LearningPathReport, Session, SiteConfig, Update,
};
use owo_colors::OwoColorize;
use tokio::sync::mpsc::channel;
use url::Url;

const MAX_BUFFER_SIZE: usize = 100;

#[derive(Parser, Debug)]
#[command(
    name = "cloudac-dl",
    author,
    version,
    about = "Downloads the video lectures for the given Cloud Academy course.",
    long_about = "Downloads the video lectures of a Cloud Academy course, or of every course \
    in a learning path, at the requested resolution."
)]
pub struct Cli {
    #[arg(short, long, env = "CLOUDAC_USER", help = "The login email address for your account.")]
    pub user: String,
    #[arg(
        short,
        long,
        env = "CLOUDAC_PASSWORD",
        hide_env_values = true,
        help = "The password for your account. Asked for interactively when omitted."
    )]
    pub pass: Option<String>,
    #[arg(short, long, default_value = ".", help = "The directory where the videos are saved.")]
    pub out: PathBuf,
    #[arg(
        short,
        long,
        default_value = "720p",
        help = "The required video resolution, as labelled on the site (360p, 720p, 1080p)."
    )]
    pub res: String,
    #[arg(short, long, help = "Download the urls listed in FILE, one per line.")]
    pub file: Option<PathBuf>,
    #[arg(long, hide = true)]
    pub base_url: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Download a course.
    Course { url: Option<Url> },
    /// Download all courses in a learning path.
    #[command(alias = "learning-path")]
    Path { url: Option<Url> },
}

impl Command {
    fn url(&self) -> Option<&Url> {
        match self {
            Command::Course { url } | Command::Path { url } => url.as_ref(),
        }
    }
}

/// Keeps every non blank line that isn't a `#` comment.
pub fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Uses the password given on the command line, or asks for it.
pub fn password_or_prompt<F>(pass: Option<String>, prompt: F) -> Result<String, String>
where
    F: FnOnce() -> std::io::Result<String>,
{
    match pass {
        Some(pass) => Ok(pass),
        None => prompt().map_err(|e| {
            tracing::error!("Failed to read password\nError : {}", e);
            format!("unable to read password : {e}")
        }),
    }
}

/// Urls from `--file` first, then the one given on the command line.
pub async fn collect_urls(file: Option<&Path>, url: Option<&Url>) -> Result<Vec<String>, String> {
    let mut links = match file {
        Some(file) => match tokio::fs::read_to_string(file).await {
            Ok(content) => parse_url_list(&content),
            Err(e) => {
                tracing::error!("Failed to read url list {}\nError : {}", file.display(), e);
                return Err(format!("unable to read {} : {}", file.display(), e));
            }
        },
        None => Vec::new(),
    };
    if let Some(url) = url {
        links.push(url.to_string());
    }
    if links.is_empty() {
        return Err(
            "Please provide a URL to download or specify a URL list with --file flag.".to_string(),
        );
    }
    Ok(links)
}

fn render_course(report: &CourseReport) {
    println!(
        "{} {} lecture(s) into {}",
        "[Done]".green(),
        report.downloaded.len(),
        report.directory.display()
    );
    for failure in report.failures.iter() {
        println!(
            "  {} {:02} {} : {}",
            "[Failed]".red(),
            failure.index,
            failure.title,
            failure.error
        );
    }
}

fn render_learning_path(report: &LearningPathReport) {
    for outcome in report.courses.iter() {
        println!("{} {}", "Course".bold(), outcome.course.title);
        match &outcome.result {
            Ok(course) => render_course(course),
            Err(e) => println!("  {} {}", "[Failed]".red(), e),
        }
    }
}

impl Cli {
    fn site_config(&self) -> Result<SiteConfig, CdlError> {
        match &self.base_url {
            Some(base_url) => SiteConfig::for_base_url(base_url),
            None => SiteConfig::production(),
        }
    }

    /// Signs in once, then processes every url in turn. Returns an error
    /// only when nothing could be attempted; per url failures are printed.
    pub async fn download(self) -> Result<(), String> {
        let links = collect_urls(self.file.as_deref(), self.command.url()).await?;

        let password = password_or_prompt(self.pass.clone(), || {
            rpassword::prompt_password("Please enter password: ")
        })?;

        let config = self.site_config().map_err(|e| e.to_string())?;
        let mut session = Session::new(config).map_err(|e| e.to_string())?;
        println!("Signing in as {}....", self.user);
        if let Err(e) = session.authenticate(&self.user, &password).await {
            tracing::error!("Failed to login\nError : {}", e);
            return Err(format!("Failed to Login. {e}"));
        }

        let (tx, mut rx) = channel::<Update>(MAX_BUFFER_SIZE);
        let printer = tokio::spawn(async move {
            while let Some(update) = rx.recv().await {
                match update {
                    Update::MessageUpdate(msg) if msg.is_error => {
                        println!("{} | {}", msg.content.red(), msg.resource_name);
                    }
                    Update::MessageUpdate(msg) => {
                        println!("{} | {}", msg.content, msg.resource_name);
                    }
                    Update::ProgressUpdate(progress) => {
                        if progress.bytes_written >= progress.file_size {
                            println!(
                                "[Downloaded] {} {} bytes",
                                progress.resource_name, progress.file_size
                            )
                        }
                    }
                };
            }
        });

        for link in links {
            let request = CourseRequest {
                course_url: link.clone(),
                output_directory: self.out.clone(),
                resolution: self.res.clone(),
            };
            match &self.command {
                Command::Course { .. } => {
                    println!("Downloading course: {}", link);
                    match download_course(&session, &request, &tx).await {
                        Ok(report) => render_course(&report),
                        Err(e) => {
                            tracing::error!("Course {} failed\nError : {}", link, e);
                            println!("{} {} : {}", "[Failed]".red(), link, e);
                        }
                    }
                }
                Command::Path { .. } => {
                    println!("Downloading learning path: {}", link);
                    match download_learning_path(&session, &request, &tx).await {
                        Ok(report) => render_learning_path(&report),
                        Err(e) => {
                            tracing::error!("Learning path {} failed\nError : {}", link, e);
                            println!("{} {} : {}", "[Failed]".red(), link, e);
                        }
                    }
                }
            }
        }

        drop(tx);
        if let Err(e) = printer.await {
            tracing::error!("Update printer panicked\nError : {}", e);
        }
        Ok(())
    }
}
