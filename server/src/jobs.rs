use image_processing::{process_file, ProcessOptions};
use serde::Serialize;
use std::{
    collections::HashMap,
    path::PathBuf,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    pub start_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Job {
    fn started(id: String) -> Self {
        let start_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self {
            id,
            status: JobStatus::Processing,
            start_time,
            result: None,
            error: None,
        }
    }
}

/// Work item for the processing worker.
#[derive(Debug)]
pub struct JobRequest {
    pub id: String,
    pub image_path: PathBuf,
    pub options: ProcessOptions,
}

#[derive(Clone, Default)]
pub struct JobTable {
    jobs: Arc<Mutex<HashMap<String, Job>>>,
}

impl JobTable {
    /// Record a new job in the `processing` state.
    pub async fn start(&self, id: &str) -> Job {
        let job = Job::started(id.to_string());
        self.jobs.lock().await.insert(job.id.clone(), job.clone());
        job
    }

    pub async fn get(&self, id: &str) -> Option<Job> {
        self.jobs.lock().await.get(id).cloned()
    }

    /// All jobs, oldest first.
    pub async fn list(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.jobs.lock().await.values().cloned().collect();
        jobs.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
        jobs
    }

    pub async fn complete(&self, id: &str, result: String) {
        if let Some(job) = self.jobs.lock().await.get_mut(id) {
            job.status = JobStatus::Completed;
            job.result = Some(result);
        }
    }

    pub async fn fail(&self, id: &str, error: String) {
        if let Some(job) = self.jobs.lock().await.get_mut(id) {
            job.status = JobStatus::Failed;
            job.error = Some(error);
        }
    }
}

/// Runs queued jobs one at a time until every sender is dropped.
pub fn spawn_worker(
    jobs: JobTable,
    mut queue: mpsc::UnboundedReceiver<JobRequest>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(request) = queue.recv().await {
            let id = request.id.clone();
            log::info!("job {id}: processing {}", request.image_path.display());
            let started = std::time::Instant::now();

            let outcome = tokio::task::spawn_blocking(move || {
                process_file(&request.image_path, &request.options)
            })
            .await;

            match outcome {
                Ok(Ok(out_path)) => {
                    let name = out_path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    log::info!("job {id}: done (ok) in {:?} -> {name}", started.elapsed());
                    jobs.complete(&id, name).await;
                }
                Ok(Err(e)) => {
                    log::warn!("job {id}: done (error) in {:?}: {e:#}", started.elapsed());
                    jobs.fail(&id, format!("{e:#}")).await;
                }
                Err(e) => {
                    log::error!("job {id}: worker task failed: {e}");
                    jobs.fail(&id, format!("Processing failed: {e}")).await;
                }
            }
        }
    })
}
