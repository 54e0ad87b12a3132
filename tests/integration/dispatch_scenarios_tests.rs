/*!
 * End-to-end behaviour of the dispatch engine: batch outcomes, failure
 * isolation, cancellation, concurrency bound and request spacing.
 */

use std::sync::Arc;
use std::time::{Duration, Instant};

use sheetglot::errors::SetupError;
use sheetglot::providers::{MockTranslator, Translator};
use sheetglot::translation::engine::CANCELLED_MESSAGE;
use sheetglot::translation::{
    CancellationFlag, CellKey, DispatchEngine, EngineOptions, EngineState, ProgressTracker,
    ProgressEvent, RateLimiter, ResultStore, TaskDescriptor, TaskOutcome, TaskRunner, TranslationJob,
};
use tokio::sync::Semaphore;

use crate::common::{
    CancellingTranslator, MemoryBatch, RecordingSink, TimestampingTranslator, fast_options, rows,
    targets,
};

#[tokio::test]
async fn test_allCallsSucceed_shouldFillStoreAndSignalSuccess() {
    let translator = Arc::new(MockTranslator::working());
    let engine = DispatchEngine::new(translator.clone(), fast_options(4));
    let sink = RecordingSink::new();
    let mut io = MemoryBatch::with_rows(rows(2));

    let report = engine
        .run(&mut io, "zh", &targets(&["EN", "FR"]), sink.clone(), &CancellationFlag::new())
        .await;

    assert_eq!(report.state, EngineState::Completed);
    assert!(report.success);
    assert_eq!(report.output.as_deref(), Some("memory://output"));
    assert_eq!(report.translated, 4);

    let store = io.materialized.expect("results should be materialized");
    assert_eq!(store.len(), 4);
    assert_eq!(store.counts(), (4, 0));
    assert_eq!(
        store.get(1, "FR"),
        Some(TaskOutcome::Translated("[FR] text 1".to_string()))
    );
    assert_eq!(sink.finished_events(), vec![(true, "memory://output".to_string())]);
    assert_eq!(translator.call_count(), 4);
}

#[tokio::test]
async fn test_secondCallTimesOut_shouldRecordFailureAndStillSucceed() {
    let translator = Arc::new(MockTranslator::slow_for(&["DE"], 1_000));
    let options = EngineOptions {
        request_timeout: Duration::from_millis(50),
        ..fast_options(3)
    };
    let engine = DispatchEngine::new(translator, options);
    let sink = RecordingSink::new();
    let mut io = MemoryBatch::with_rows(rows(1));

    let report = engine
        .run(&mut io, "zh", &targets(&["EN", "DE", "FR"]), sink.clone(), &CancellationFlag::new())
        .await;

    assert_eq!(report.state, EngineState::Completed);
    assert!(report.success);
    assert_eq!((report.translated, report.failed), (2, 1));

    let store = io.materialized.unwrap();
    assert_eq!(store.counts(), (2, 1));
    assert!(matches!(store.get(0, "DE"), Some(TaskOutcome::Failed(ref msg)) if msg.contains("timed out")));
    assert!(sink.messages().iter().any(|m| m.starts_with("Error: row 1 German")));
}

#[tokio::test]
async fn test_inputUnreadable_shouldLaunchNothingAndSignalSetupError() {
    let translator = Arc::new(MockTranslator::working());
    let engine = DispatchEngine::new(translator.clone(), fast_options(2));
    let sink = RecordingSink::new();
    let mut io = MemoryBatch {
        input_error: Some(SetupError::InputUnreadable {
            path: "missing.csv".into(),
            reason: "No such file or directory".to_string(),
        }),
        ..MemoryBatch::with_rows(rows(3))
    };

    let report = engine
        .run(&mut io, "zh", &targets(&["EN"]), sink.clone(), &CancellationFlag::new())
        .await;

    assert_eq!(report.state, EngineState::FatallyFailed);
    assert!(!report.success);
    assert!(report.message.contains("Cannot read input file"));
    assert_eq!(translator.call_count(), 0);
    assert!(io.materialized.is_none());

    let finished = sink.finished_events();
    assert_eq!(finished.len(), 1);
    assert!(!finished[0].0);
}

#[tokio::test]
async fn test_outputUnwritable_shouldFailBeforeAnyCall() {
    let translator = Arc::new(MockTranslator::working());
    let engine = DispatchEngine::new(translator.clone(), fast_options(2));
    let sink = RecordingSink::new();
    let mut io = MemoryBatch {
        output_error: Some(SetupError::OutputUnwritable {
            path: "/readonly/out.csv".into(),
            reason: "Permission denied".to_string(),
        }),
        ..MemoryBatch::with_rows(rows(2))
    };

    let report = engine
        .run(&mut io, "zh", &targets(&["EN", "FR"]), sink.clone(), &CancellationFlag::new())
        .await;

    assert_eq!(report.state, EngineState::FatallyFailed);
    assert!(report.message.contains("Cannot open output file"));
    assert_eq!(translator.call_count(), 0);
    assert_eq!(sink.finished_events().len(), 1);
}

#[tokio::test]
async fn test_cancelAfterFirstLaunch_shouldKeepOnlyThatResult() {
    let cancel = CancellationFlag::new();
    let translator = Arc::new(CancellingTranslator::new(cancel.clone(), 1));
    let engine = DispatchEngine::new(translator.clone(), fast_options(1));
    let sink = RecordingSink::new();
    let mut io = MemoryBatch::with_rows(rows(2));

    let report = engine
        .run(&mut io, "zh", &targets(&["EN", "FR"]), sink.clone(), &cancel)
        .await;

    assert_eq!(report.state, EngineState::Cancelled);
    assert!(!report.success);
    assert_eq!(report.message, CANCELLED_MESSAGE);
    assert_eq!(report.total_tasks, 4);
    assert_eq!(report.translated, 1);
    assert_eq!(report.not_launched, 3);
    assert_eq!(translator.inner.call_count(), 1);
    // Cancelled batches are not materialized
    assert!(io.materialized.is_none());
    assert_eq!(sink.finished_events(), vec![(false, CANCELLED_MESSAGE.to_string())]);
}

#[tokio::test]
async fn test_cancelledDispatch_shouldContainOnlyLaunchedKeys() {
    let cancel = CancellationFlag::new();
    let translator = Arc::new(CancellingTranslator::new(cancel.clone(), 1));
    let engine = DispatchEngine::new(translator, fast_options(1));
    let job = TranslationJob::new(rows(2), "zh", targets(&["EN", "FR"])).unwrap();

    let summary = engine.dispatch(&job, RecordingSink::new(), &cancel).await;

    assert!(summary.cancelled);
    assert_eq!(summary.launched, 1);
    assert_eq!(summary.results.len(), 1);
    assert!(summary.results.get(0, "EN").is_some());
    assert!(summary.results.get(0, "FR").is_none());
    assert!(summary.results.get(1, "EN").is_none());
}

#[tokio::test]
async fn test_singleWorker_shouldNeverOverlapCalls() {
    let translator = Arc::new(MockTranslator::slow(20));
    let engine = DispatchEngine::new(translator.clone(), fast_options(1));
    let mut io = MemoryBatch::with_rows(rows(3));

    let report = engine
        .run(&mut io, "zh", &targets(&["EN"]), RecordingSink::new(), &CancellationFlag::new())
        .await;

    assert!(report.success);
    assert_eq!(translator.call_count(), 3);
    assert_eq!(translator.peak_in_flight(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_workerLimit_shouldBoundInFlightCalls() {
    let translator = Arc::new(MockTranslator::slow(15));
    let engine = DispatchEngine::new(translator.clone(), fast_options(3));
    let mut io = MemoryBatch::with_rows(rows(6));

    let report = engine
        .run(&mut io, "zh", &targets(&["EN", "FR"]), RecordingSink::new(), &CancellationFlag::new())
        .await;

    assert!(report.success);
    assert_eq!(translator.call_count(), 12);
    assert!(translator.peak_in_flight() <= 3);
    assert!(translator.peak_in_flight() >= 2);
}

#[tokio::test]
async fn test_failingTranslator_shouldNotFailTheBatch() {
    let engine = DispatchEngine::new(Arc::new(MockTranslator::failing()), fast_options(2));
    let mut io = MemoryBatch::with_rows(rows(2));
    let sink = RecordingSink::new();

    let report = engine
        .run(&mut io, "zh", &targets(&["EN", "JA"]), sink.clone(), &CancellationFlag::new())
        .await;

    assert_eq!(report.state, EngineState::Completed);
    assert!(report.success);
    assert_eq!(report.failed, 4);
    assert_eq!(io.materialized.unwrap().counts(), (0, 4));
    assert_eq!(sink.messages().iter().filter(|m| m.starts_with("Error:")).count(), 4);
}

#[tokio::test]
async fn test_progress_shouldBeMonotonicAndEndWithSingleTerminalEvent() {
    let engine = DispatchEngine::new(Arc::new(MockTranslator::failing_for(&["FR"])), fast_options(4));
    let sink = RecordingSink::new();
    let mut io = MemoryBatch::with_rows(rows(5));

    engine
        .run(&mut io, "zh", &targets(&["EN", "FR"]), sink.clone(), &CancellationFlag::new())
        .await;

    let events = sink.events();
    let task_percents: Vec<u8> = sink.percents().into_iter().skip(1).collect();
    assert!(task_percents.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(sink.finished_events().len(), 1);
    assert!(matches!(
        events.last(),
        Some(ProgressEvent::Finished { success: true, .. })
    ));
    // loaded (5%) + one per task (10) + saved (100%)
    assert_eq!(sink.percents().len(), 12);
}

#[tokio::test]
async fn test_requestSpacing_shouldHoldAcrossTheWholeBatch() {
    let interval = Duration::from_millis(30);
    let translator = Arc::new(TimestampingTranslator::default());
    let options = EngineOptions {
        min_request_interval: interval,
        ..fast_options(4)
    };
    let engine = DispatchEngine::new(translator.clone(), options);
    let mut io = MemoryBatch::with_rows(rows(3));

    let start = Instant::now();
    engine
        .run(&mut io, "zh", &targets(&["EN", "FR"]), RecordingSink::new(), &CancellationFlag::new())
        .await;

    let mut calls = translator.calls.lock().clone();
    calls.sort();
    assert_eq!(calls.len(), 6);
    // Grants are reserved from the batch start, so the sixth call cannot come earlier
    assert!(*calls.last().unwrap() - start >= interval * 5);
}

#[tokio::test]
async fn test_resubmittingFailedDescriptor_shouldOnlyTouchItsOwnKey() {
    let store = ResultStore::new();
    let sink = RecordingSink::new();
    let make_runner = |translator: Arc<dyn Translator>| {
        TaskRunner::new(
            translator,
            Arc::new(Semaphore::new(1)),
            Arc::new(RateLimiter::new(Duration::ZERO)),
            store.clone(),
            Arc::new(ProgressTracker::new(2)),
            sink.clone(),
            "zh",
            1,
            Duration::from_secs(5),
        )
    };
    store.record(CellKey::new(0, "EN"), TaskOutcome::Translated("hello".to_string()));

    let descriptor = TaskDescriptor {
        row_id: 0,
        text: Arc::from("你好"),
        target_language: "FR".to_string(),
    };

    let first = make_runner(Arc::new(MockTranslator::failing()))
        .execute(descriptor.clone())
        .await;
    assert!(matches!(first, TaskOutcome::Failed(_)));

    let second = make_runner(Arc::new(MockTranslator::working()))
        .execute(descriptor)
        .await;
    assert_eq!(second, TaskOutcome::Translated("[FR] 你好".to_string()));

    assert_eq!(store.len(), 2);
    assert_eq!(store.get(0, "FR"), Some(second));
    assert_eq!(store.get(0, "EN"), Some(TaskOutcome::Translated("hello".to_string())));
}

#[tokio::test]
async fn test_emptyInput_shouldCompleteWithoutCalls() {
    let translator = Arc::new(MockTranslator::working());
    let engine = DispatchEngine::new(translator.clone(), fast_options(2));
    let mut io = MemoryBatch::with_rows(Vec::new());

    let report = engine
        .run(&mut io, "zh", &targets(&["EN"]), RecordingSink::new(), &CancellationFlag::new())
        .await;

    assert_eq!(report.state, EngineState::Completed);
    assert_eq!(report.total_tasks, 0);
    assert_eq!(translator.call_count(), 0);
}
