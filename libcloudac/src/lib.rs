use std::path::PathBuf;

use tokio::sync::mpsc::Sender;
use tracing::instrument;

pub mod config;
pub mod download;
pub mod errors;
pub mod link;
pub mod page;
pub mod session;
pub mod video;

pub use crate::config::{Markup, SiteConfig};
pub use crate::download::{course_directory, lecture_file_name, slugify};
pub use crate::errors::{CdlError, ErrorKind};
pub use crate::link::{list_courses, list_lectures, Link};
pub use crate::session::{Session, Transport};
pub use crate::video::resolve_video;

use crate::download::{create_course_directory, download_file};
use crate::Update::MessageUpdate;

/// What to download and where. `course_url` is a course page for
/// `download_course` and a learning path page for `download_learning_path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseRequest {
    pub course_url: String,
    pub output_directory: PathBuf,
    /// Matched verbatim against the page, e.g. `720p`.
    pub resolution: String,
}

#[derive(Debug)]
pub enum Update {
    MessageUpdate(Message),
    ProgressUpdate(Progress),
}

#[derive(Debug)]
pub struct Message {
    pub content: String,
    pub resource_name: String,
    pub is_error: bool,
}

#[derive(Debug)]
pub struct Progress {
    pub bytes_written: u64,
    /// Zero while the size is unknown.
    pub file_size: u64,
    pub resource_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LectureFailure {
    /// 1-based position of the lecture in the course.
    pub index: usize,
    pub title: String,
    pub error: CdlError,
}

/// Outcome of a course whose lectures could be listed. Lecture failures are
/// collected here instead of failing the course.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CourseReport {
    pub course_url: String,
    pub directory: PathBuf,
    pub downloaded: Vec<PathBuf>,
    pub failures: Vec<LectureFailure>,
}

impl CourseReport {
    pub fn attempted(&self) -> usize {
        self.downloaded.len() + self.failures.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CourseOutcome {
    pub course: Link,
    pub result: Result<CourseReport, CdlError>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LearningPathReport {
    pub path_url: String,
    pub courses: Vec<CourseOutcome>,
}

impl LearningPathReport {
    pub fn failed_courses(&self) -> impl Iterator<Item = &CourseOutcome> {
        self.courses.iter().filter(|c| c.result.is_err())
    }
}

async fn send_message(
    update_tx: &Sender<Update>,
    content: String,
    resource_name: &str,
    is_error: bool,
) {
    if (update_tx
        .send(MessageUpdate(Message {
            content,
            resource_name: resource_name.to_string(),
            is_error,
        }))
        .await)
        .is_err()
    {
        tracing::debug!("Update receiver closed, dropping message for {}", resource_name);
    };
}

/// Downloads every lecture of a course into
/// `{output_directory}/{course url path}/NN-title.mp4`.
///
/// Fails only when the directory can't be created or the course lists no
/// lectures. A lecture whose video can't be resolved or fetched is reported
/// and skipped.
#[instrument(skip(session, update_tx))]
pub async fn download_course(
    session: &Session,
    request: &CourseRequest,
    update_tx: &Sender<Update>,
) -> Result<CourseReport, CdlError> {
    if !session.is_authenticated() {
        tracing::error!("Refusing to download {} without signing in", request.course_url);
        return Err(CdlError::NotSignedIn);
    }

    let directory = course_directory(&request.output_directory, &request.course_url)?;
    create_course_directory(&directory).await?;

    let lectures = list_lectures(session, &request.course_url).await?;
    if lectures.is_empty() {
        tracing::error!("No lectures found on {}", request.course_url);
        return Err(CdlError::NotFound("no videos found".to_string()));
    }

    let mut report = CourseReport {
        course_url: request.course_url.clone(),
        directory: directory.clone(),
        ..Default::default()
    };

    for (index, lecture) in (1..).zip(lectures.into_iter()) {
        let file_path = directory.join(lecture_file_name(index, &lecture.title));

        let result = match resolve_video(session, &lecture.url, &request.resolution).await {
            Ok(video_url) => {
                download_file(session.transport(), &video_url, &file_path, update_tx)
                    .await
                    .map(|_| ())
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                send_message(
                    update_tx,
                    format!("Downloaded {}", lecture.title),
                    &file_path.to_string_lossy(),
                    false,
                )
                .await;
                report.downloaded.push(file_path);
            }
            Err(e) => {
                tracing::warn!(
                    "Skipping lecture {} ({}) of {}\nError : {}",
                    index,
                    lecture.title,
                    request.course_url,
                    e
                );
                send_message(
                    update_tx,
                    format!("Unable to download {} : {}", lecture.title, e),
                    &lecture.url,
                    true,
                )
                .await;
                report.failures.push(LectureFailure {
                    index,
                    title: lecture.title,
                    error: e,
                });
            }
        }
    }

    tracing::debug!(
        "Course {} done, {} downloaded, {} failed",
        request.course_url,
        report.downloaded.len(),
        report.failures.len()
    );
    Ok(report)
}

/// Downloads every course of a learning path, one after the other. A course
/// that fails is reported in the result and the next one is still tried.
#[instrument(skip(session, update_tx))]
pub async fn download_learning_path(
    session: &Session,
    request: &CourseRequest,
    update_tx: &Sender<Update>,
) -> Result<LearningPathReport, CdlError> {
    if !session.is_authenticated() {
        tracing::error!("Refusing to download {} without signing in", request.course_url);
        return Err(CdlError::NotSignedIn);
    }

    let courses = list_courses(session, &request.course_url).await?;
    let mut report = LearningPathReport {
        path_url: request.course_url.clone(),
        courses: Vec::with_capacity(courses.len()),
    };

    for course in courses {
        let course_request = CourseRequest {
            course_url: course.url.clone(),
            ..request.clone()
        };
        let result = download_course(session, &course_request, update_tx).await;
        if let Err(e) = &result {
            tracing::warn!("Course {} failed, moving on\nError : {}", course.url, e);
            send_message(
                update_tx,
                format!("Unable to download course {} : {}", course.title, e),
                &course.url,
                true,
            )
            .await;
        }
        report.courses.push(CourseOutcome { course, result });
    }

    Ok(report)
}
