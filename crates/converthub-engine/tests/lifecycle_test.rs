//! Integration tests for job lifecycle through the orchestrator.

mod helpers;

use std::sync::{Arc, Mutex};

use serde_json::json;

use converthub_engine::{EngineError, Job, JobStatus, JobStep, Orchestrator, StepFn};
use converthub_module::ModuleError;

use helpers::{options, upload};

#[tokio::test]
async fn test_duplicate_label_is_configuration_error() {
    let orch = helpers::orchestrator();
    orch.register_module(helpers::png_to_jpeg()).await.unwrap();

    let err = orch.register_module(helpers::png_to_jpeg()).await.unwrap_err();
    match err {
        EngineError::Module(inner) => assert!(inner.is_configuration()),
        other => panic!("expected a module error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_progress_is_monotonic_and_bounded() {
    let orch = helpers::orchestrator();
    orch.register_module(helpers::png_to_jpeg()).await.unwrap();

    let files = (0..8)
        .map(|i| upload(&format!("img{i}.png"), "image/png", 40 - i * 5))
        .collect();
    let job = orch
        .submit_job(files, "PNGToJPEG", &options(json!({})))
        .await
        .unwrap();
    assert_eq!(job.status().step, JobStep::Pending);

    let seen: Mutex<Vec<JobStatus>> = Mutex::new(Vec::new());
    let final_status = {
        let on_progress: &StepFn<'_> = &|status: &JobStatus| seen.lock().unwrap().push(status.clone());
        orch.start_job(job.id(), Some(on_progress)).await.unwrap()
    };
    assert_eq!(final_status.step, JobStep::Done);
    assert_eq!(final_status.files_converted, 8);

    let seen = seen.into_inner().unwrap();
    assert_eq!(seen.len(), 8);
    let mut last = 0;
    for status in &seen {
        assert_eq!(status.step, JobStep::Running);
        assert!(status.files_converted > last);
        assert!(status.files_converted <= status.total_files);
        last = status.files_converted;
    }
}

#[tokio::test]
async fn test_mutate_conversion_renames_and_retags() {
    let orch = helpers::orchestrator();
    orch.register_module(helpers::png_to_jpeg()).await.unwrap();

    let job = orch
        .submit_job(
            vec![upload("a.png", "image/png", 3), upload("b.png", "image/png", 1)],
            "PNGToJPEG",
            &options(json!({})),
        )
        .await
        .unwrap();
    orch.start_job(job.id(), None).await.unwrap();

    let files = orch.take_results(job.id()).await.unwrap();
    let names: Vec<_> = files.iter().map(|f| f.original_name.as_str()).collect();
    assert_eq!(names, ["a.jpg", "b.jpg"]);
    assert!(files.iter().all(|f| f.mime_type == "image/jpeg"));
}

#[tokio::test]
async fn test_option_defaults_and_overrides() {
    let orch = helpers::orchestrator();
    orch.register_module(helpers::png_to_jpeg()).await.unwrap();
    let files = || vec![upload("a.png", "image/png", 1)];

    let job = orch
        .submit_job(files(), "PNGToJPEG", &options(json!({})))
        .await
        .unwrap();
    assert_eq!(job.options().get_f64("size"), Some(10.0));

    let job = orch
        .submit_job(files(), "PNGToJPEG", &options(json!({ "size": 5 })))
        .await
        .unwrap();
    assert_eq!(job.options().get_f64("size"), Some(5.0));
    assert_eq!(job.options().get_f64("width"), Some(1024.0));
}

#[tokio::test]
async fn test_unknown_option_creates_no_job() {
    let orch = helpers::orchestrator();
    orch.register_module(helpers::png_to_jpeg()).await.unwrap();

    let err = orch
        .submit_job(
            vec![upload("a.png", "image/png", 1)],
            "PNGToJPEG",
            &options(json!({ "resize_xyz": 2 })),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownOption { ref label, .. } if label == "resize_xyz"));
    assert!(orch.list_jobs().await.is_empty());
}

#[tokio::test]
async fn test_replace_missing_mimetype_fails_job() {
    let orch = helpers::orchestrator();
    orch.register_module(helpers::broken_replace()).await.unwrap();

    let job = orch
        .submit_job(
            vec![upload("a.png", "image/png", 1)],
            "BrokenReplace",
            &options(json!({})),
        )
        .await
        .unwrap();

    let err = orch.start_job(job.id(), None).await.unwrap_err();
    match &err {
        EngineError::Module(ModuleError::ContractViolation { reason, .. }) => {
            assert_eq!(reason, "mimetype is missing or empty");
        }
        other => panic!("expected a contract violation, got {other:?}"),
    }

    let status = job.status();
    assert_eq!(status.step, JobStep::Failed);
    assert!(status.error.is_some());
    assert!(matches!(
        orch.take_results(job.id()).await.unwrap_err(),
        EngineError::JobFailed { .. }
    ));
}

#[tokio::test]
async fn test_failed_job_is_deletable() {
    let orch = helpers::orchestrator();
    orch.register_module(helpers::picky()).await.unwrap();

    let job = orch
        .submit_job(
            vec![upload("good.txt", "text/plain", 1), upload("bad.txt", "text/plain", 1)],
            "Picky",
            &options(json!({})),
        )
        .await
        .unwrap();

    let err = orch.start_job(job.id(), None).await.unwrap_err();
    assert!(err.to_string().contains("cannot decode bad.txt"));
    assert_eq!(job.step(), JobStep::Failed);

    orch.delete_job(job.id()).await.unwrap();
    assert!(orch.list_jobs().await.is_empty());
}

#[tokio::test]
async fn test_delete_only_after_done() {
    let orch = helpers::orchestrator();
    orch.register_module(helpers::png_to_jpeg()).await.unwrap();

    let job = orch
        .submit_job(
            vec![upload("a.png", "image/png", 1)],
            "PNGToJPEG",
            &options(json!({})),
        )
        .await
        .unwrap();

    let err = orch.delete_job(job.id()).await.unwrap_err();
    assert!(matches!(err, EngineError::JobNotTerminal { .. }));
    assert_eq!(orch.list_jobs().await.len(), 1);

    orch.start_job(job.id(), None).await.unwrap();
    let err = orch.start_job(job.id(), None).await.unwrap_err();
    assert!(matches!(err, EngineError::JobAlreadyStarted { .. }));

    orch.delete_job(job.id()).await.unwrap();
    assert!(orch.list_jobs().await.iter().all(|j| j.id != job.id()));
}

async fn submit_one(orch: &Orchestrator) -> Arc<Job> {
    orch.submit_job(
        vec![upload("a.png", "image/png", 1)],
        "PNGToJPEG",
        &options(json!({})),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_delete_terminal_jobs_skips_pending() {
    let orch = helpers::orchestrator();
    orch.register_module(helpers::png_to_jpeg()).await.unwrap();

    let finished = submit_one(&orch).await;
    let waiting = submit_one(&orch).await;
    orch.start_job(finished.id(), None).await.unwrap();

    assert_eq!(orch.delete_terminal_jobs().await, 1);
    let remaining: Vec<_> = orch.list_jobs().await.into_iter().map(|j| j.id).collect();
    assert_eq!(remaining, vec![waiting.id()]);
}

#[tokio::test]
async fn test_statistics_delta_per_run() {
    let orch = helpers::orchestrator();
    orch.register_module(helpers::png_to_jpeg()).await.unwrap();

    for round in 1..=2u64 {
        let job = orch
            .submit_job(
                vec![
                    upload("a.png", "image/png", 1_500_000),
                    upload("b.png", "image/png", 500_000),
                ],
                "PNGToJPEG",
                &options(json!({})),
            )
            .await
            .unwrap();
        orch.start_job(job.id(), None).await.unwrap();

        let stats = orch.statistics();
        assert_eq!(stats.files_converted, 2 * round);
        assert!((stats.data_converted_mb - 2.0 * round as f64).abs() < 1e-9);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_jobs_share_statistics() {
    let orch = Arc::new(helpers::orchestrator());
    orch.register_module(helpers::png_to_jpeg()).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..6 {
        let orch = Arc::clone(&orch);
        handles.push(tokio::spawn(async move {
            let files = (0..5)
                .map(|j| upload(&format!("j{i}_{j}.png"), "image/png", 100))
                .collect();
            let job = orch
                .submit_job(files, "PNGToJPEG", &serde_json::Map::new())
                .await
                .unwrap();
            orch.start_job(job.id(), None).await.unwrap()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().step, JobStep::Done);
    }

    assert_eq!(orch.statistics().files_converted, 30);
    assert_eq!(orch.list_jobs().await.len(), 6);
}

#[tokio::test]
async fn test_summary_hides_storage_paths() {
    let orch = helpers::orchestrator();
    orch.register_module(helpers::png_to_jpeg()).await.unwrap();
    let job = orch
        .submit_job(
            vec![upload("a.png", "image/png", 1)],
            "PNGToJPEG",
            &options(json!({ "width": 64 })),
        )
        .await
        .unwrap();

    let summary = orch.job_summary(job.id()).await.unwrap();
    let text = serde_json::to_string(&summary).unwrap();
    assert!(!text.contains("/var/uploads"));
    assert_eq!(summary.module, "PNGToJPEG");
    assert_eq!(summary.status.total_files, 1);
    assert!(!summary.unlimited_downloads);
}
