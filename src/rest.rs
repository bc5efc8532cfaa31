//! Judge REST api

use anyhow::Context;
use futures::{stream, Stream, StreamExt};
use judge_apis::{
    language::LANGUAGES,
    live::LiveJudgeStatus,
    rest::{
        EngineStatusView, ErrorBody, LanguageView, PageQuery, SampleRunRequest, SampleRunView,
        SubmissionView, SubmitQuery, SubmitRequest,
    },
};
use judge_store::{model::Submission, StoreError};
use processor::{Orchestrator, SubmitError};
use std::{convert::Infallible, pin::Pin};
use uuid::Uuid;
use warp::{http::StatusCode, sse::Event, Filter, Rejection, Reply};

pub struct RestConfig {
    pub port: u16,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl warp::reject::Reject for ApiError {}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Rejection {
        warp::reject::custom(ApiError {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        })
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let status = match err {
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError {
            status,
            message: err.to_string(),
        }
    }
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Store(e) => e.into(),
            other => ApiError {
                status: StatusCode::NOT_FOUND,
                message: other.to_string(),
            },
        }
    }
}

fn reject(err: impl Into<ApiError>) -> Rejection {
    let err = err.into();
    if err.status.is_server_error() {
        tracing::error!(error = %err.message, "request failed");
    }
    warp::reject::custom(err)
}

async fn recover(rejection: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if let Some(err) = rejection.find::<ApiError>() {
        (err.status, err.message.clone())
    } else if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else if let Some(err) = rejection.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, err.to_string())
    } else if let Some(err) = rejection.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, err.to_string())
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
    } else {
        tracing::warn!(?rejection, "unhandled rejection");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
    };
    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorBody { error: message }),
        status,
    ))
}

fn views(submissions: Vec<Submission>) -> Vec<SubmissionView> {
    submissions.iter().map(Submission::view).collect()
}

async fn create_submission(
    orch: Orchestrator,
    query: SubmitQuery,
    req: SubmitRequest,
) -> Result<impl Reply, Rejection> {
    let view = if query.wait {
        orch.submit(req.user_id, req.problem_id, &req.language, &req.source_code)
            .await
            .map_err(reject)?
            .submission
            .view()
    } else {
        orch.submit_in_background(req.user_id, req.problem_id, &req.language, &req.source_code)
            .await
            .map_err(reject)?
            .view()
    };
    Ok(warp::reply::with_status(
        warp::reply::json(&view),
        StatusCode::CREATED,
    ))
}

async fn get_submission(orch: Orchestrator, id: Uuid) -> Result<impl Reply, Rejection> {
    let submission = orch
        .get_submission(id)
        .await
        .map_err(reject)?
        .ok_or_else(|| ApiError::not_found(format!("submission {} not found", id)))?;
    Ok(warp::reply::json(&submission.view()))
}

async fn list_recent(orch: Orchestrator, page: PageQuery) -> Result<impl Reply, Rejection> {
    let submissions = orch
        .recent_submissions(page.page, page.size)
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&views(submissions)))
}

async fn list_by_user(orch: Orchestrator, user_id: u64) -> Result<impl Reply, Rejection> {
    let submissions = orch.submissions_by_user(user_id).await.map_err(reject)?;
    Ok(warp::reply::json(&views(submissions)))
}

async fn list_by_problem(orch: Orchestrator, problem_id: u64) -> Result<impl Reply, Rejection> {
    let submissions = orch
        .submissions_by_problem(problem_id)
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&views(submissions)))
}

async fn run_samples(
    orch: Orchestrator,
    problem_id: u64,
    req: SampleRunRequest,
) -> Result<impl Reply, Rejection> {
    let results = orch
        .run_sample_only(problem_id, &req.source_code, &req.language)
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&SampleRunView {
        problem_id,
        results,
    }))
}

async fn engine_status(orch: Orchestrator) -> Result<impl Reply, Infallible> {
    let available = orch.engine_available().await;
    Ok(warp::reply::json(&EngineStatusView { available }))
}

fn list_languages() -> impl Reply {
    let languages: Vec<LanguageView> = LANGUAGES
        .iter()
        .map(|l| LanguageView {
            name: l.name.to_string(),
            id: l.id,
            description: l.description.to_string(),
        })
        .collect();
    warp::reply::json(&languages)
}

type EventStream = Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>;

fn status_event(status: &LiveJudgeStatus) -> Result<Event, Infallible> {
    let event = match Event::default().event("status").json_data(status) {
        Ok(ev) => ev,
        Err(err) => Event::default().event("error").data(err.to_string()),
    };
    Ok(event)
}

/// Streams live status of a submission until it reaches a final verdict.
async fn submission_events(orch: Orchestrator, id: Uuid) -> Result<impl Reply, Rejection> {
    // Subscribe before reading the record so no final event can be missed.
    let mut rx = orch.notifier().subscribe(id).await;
    let found = orch.get_submission(id).await;
    let submission = match found {
        Ok(Some(s)) => s,
        Ok(None) => {
            drop(rx);
            orch.notifier().prune(id).await;
            return Err(ApiError::not_found(format!("submission {} not found", id)));
        }
        Err(err) => {
            drop(rx);
            orch.notifier().prune(id).await;
            return Err(reject(err));
        }
    };

    let connect = stream::once(async { Ok(Event::default().event("connect").data("connected")) });
    let updates: EventStream = if submission.verdict.is_final() {
        rx.close();
        drop(rx);
        orch.notifier().prune(id).await;
        let status = submission.live_status();
        stream::once(async move { status_event(&status) }).boxed()
    } else {
        stream::unfold(rx, |mut rx| async move {
            let status = rx.recv().await?;
            Some((status_event(&status), rx))
        })
        .boxed()
    };
    Ok(warp::sse::reply(
        warp::sse::keep_alive().stream(connect.chain(updates)),
    ))
}

/// All routes of the API, with errors already turned into JSON replies.
pub fn routes(
    orch: Orchestrator,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let state = warp::any().map(move || orch.clone());

    let route_create = warp::post()
        .and(warp::path("submissions"))
        .and(warp::path::end())
        .and(state.clone())
        .and(warp::query::<SubmitQuery>())
        .and(warp::body::json())
        .and_then(create_submission);

    let route_get = warp::get()
        .and(warp::path!("submissions" / Uuid))
        .and(state.clone())
        .and_then(|id, orch| get_submission(orch, id));

    let route_events = warp::get()
        .and(warp::path!("submissions" / Uuid / "events"))
        .and(state.clone())
        .and_then(|id, orch| submission_events(orch, id));

    let route_recent = warp::get()
        .and(warp::path("submissions"))
        .and(warp::path::end())
        .and(state.clone())
        .and(warp::query::<PageQuery>())
        .and_then(list_recent);

    let route_by_user = warp::get()
        .and(warp::path!("users" / u64 / "submissions"))
        .and(state.clone())
        .and_then(|user_id, orch| list_by_user(orch, user_id));

    let route_by_problem = warp::get()
        .and(warp::path!("problems" / u64 / "submissions"))
        .and(state.clone())
        .and_then(|problem_id, orch| list_by_problem(orch, problem_id));

    let route_samples = warp::post()
        .and(warp::path!("problems" / u64 / "sample-runs"))
        .and(state.clone())
        .and(warp::body::json())
        .and_then(|problem_id, orch, req| run_samples(orch, problem_id, req));

    let route_languages = warp::get()
        .and(warp::path!("languages"))
        .map(list_languages);

    let route_engine = warp::get()
        .and(warp::path!("engine" / "status"))
        .and(state)
        .and_then(engine_status);

    route_create
        .or(route_get)
        .or(route_events)
        .or(route_recent)
        .or(route_by_user)
        .or(route_by_problem)
        .or(route_samples)
        .or(route_languages)
        .or(route_engine)
        .recover(recover)
}

/// Serves api until ctrl-c is received
#[tracing::instrument(skip(cfg, orch))]
pub async fn serve(cfg: RestConfig, orch: Orchestrator) -> anyhow::Result<()> {
    let server = warp::serve(routes(orch).with(warp::filters::trace::request()));
    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("shutting down");
    };
    let (addr, srv) = server
        .try_bind_with_graceful_shutdown(([0, 0, 0, 0], cfg.port), shutdown)
        .context("failed to bind")?;
    tracing::info!(%addr, "listening");
    srv.await;
    Ok(())
}
