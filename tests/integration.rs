
use fixtures::*;
use prw::app::AppState;
use prw::countdown::CountdownStatus;
use prw::dagit::client::{self, RunsReply};
use prw::dagit::dispatch::FetchDispatcher;
use prw::dagit::parser;
use prw::events::AppEvent;
use prw::filter::{FilterToken, RunFilterTokenType};
use prw::input::{self, Action, InputContext};
use prw::pagination::Direction;
use prw::persist::{FileFilterStore, FilterStore, MemoryFilterStore};
use prw::view::ViewStatus;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn press(code: KeyCode) -> KeyEvent {
    KeyEvent {
        code,
        modifiers: KeyModifiers::NONE,
        kind: KeyEventKind::Press,
        state: KeyEventState::NONE,
    }
}

fn ctx(state: &AppState) -> InputContext {
    InputContext {
        has_notice: state.notice.is_some(),
        is_loading: state.view.is_loading(),
        editing: state.is_editing(),
    }
}

fn resolve_body(state: &mut AppState, body: &str) {
    let ticket = state.view.take_pending_fetch().unwrap();
    let outcome = client::classify_reply(&RunsReply::ok(body));
    state.apply_fetch(ticket.id, Ok(outcome));
}

// ========== Data flow tests ==========

#[test]
fn full_flow_json_to_view_with_overflow_page() {
    let mut v = view("foo");
    let ticket = v.take_pending_fetch().unwrap();
    assert_eq!(ticket.request.limit, 26);
    assert_eq!(ticket.request.cursor, None);

    let result = parser::parse_runs_response(&page_body(26)).unwrap();
    assert!(v.complete(ticket.id, Ok(result)));

    assert_eq!(v.displayed_runs().len(), 25);
    assert_eq!(v.displayed_runs()[0].run_id, "run-0001-0000-0000");
    assert!(v.has_next_page());
    assert!(!v.has_prev_page());
    assert!(v.show_pagination_controls());

    assert!(v.advance_page(Direction::Next));
    let next = v.take_pending_fetch().unwrap();
    assert_eq!(next.request.cursor.as_deref(), Some("run-0026-0000-0000"));
    assert_eq!(v.page_number(), 2);
}

#[test]
fn short_page_hides_pagination() {
    let mut state = AppState::new(view("foo"), "http://localhost:3000/graphql".to_string());
    resolve_body(&mut state, &page_body(3));
    assert_eq!(state.view.displayed_runs().len(), 3);
    assert!(!state.view.has_next_page());
    assert!(!state.view.show_pagination_controls());
}

#[test]
fn filter_error_is_query_error_not_server_error() {
    let mut v = view("foo");
    let ticket = v.take_pending_fetch().unwrap();
    let result =
        parser::parse_runs_response(&filter_error_body("Invalid status: NOPE")).unwrap();
    v.complete(ticket.id, Ok(result));
    assert_eq!(
        v.status(),
        &ViewStatus::QueryError("Invalid status: NOPE".to_string())
    );
    assert!(v.displayed_runs().is_empty());
    assert!(!v.has_next_page());
}

#[test]
fn python_error_is_backend_error() {
    let mut v = view("foo");
    let ticket = v.take_pending_fetch().unwrap();
    let result = parser::parse_runs_response(&python_error_body("boom")).unwrap();
    v.complete(ticket.id, Ok(result));
    assert_eq!(v.status(), &ViewStatus::BackendError("boom".to_string()));
}

#[test]
fn status_filter_produces_request_variables() {
    let mut v = view("foo");
    v.take_pending_fetch();
    v.set_filters(vec![FilterToken::new(RunFilterTokenType::Status, "FAILURE")]);
    let ticket = v.take_pending_fetch().unwrap();
    assert_eq!(
        serde_json::to_value(&ticket.request).unwrap(),
        json!({
            "limit": 26,
            "cursor": null,
            "filter": {"pipelineName": "foo", "snapshotId": null, "status": "FAILURE"}
        })
    );
}

#[test]
fn path_snapshot_shows_as_token_and_filter() {
    let mut v = view("foo@abc123");
    let ticket = v.take_pending_fetch().unwrap();
    assert_eq!(ticket.request.filter.snapshot_id.as_deref(), Some("abc123"));
    let shown: Vec<String> = v.display_tokens().iter().map(ToString::to_string).collect();
    assert_eq!(shown, vec!["pipeline:foo", "snapshotId:abc123"]);
    assert_eq!(v.title(), "Pipeline: foo");
}

#[test]
fn tag_filter_accumulates_in_request() {
    let mut v = view("foo");
    v.take_pending_fetch();
    v.set_filters(vec![
        FilterToken::new(RunFilterTokenType::Tag, "team=data"),
        FilterToken::new(RunFilterTokenType::Tag, "env=prod"),
    ]);
    let ticket = v.take_pending_fetch().unwrap();
    assert_eq!(
        serde_json::to_value(&ticket.request.filter).unwrap(),
        json!({
            "pipelineName": "foo",
            "snapshotId": null,
            "tags": [
                {"key": "team", "value": "data"},
                {"key": "env", "value": "prod"}
            ]
        })
    );
}

#[test]
fn changing_filters_while_paged_resets_to_first_page() {
    let mut v = view("foo");
    let ticket = v.take_pending_fetch().unwrap();
    v.complete(ticket.id, Ok(parser::parse_runs_response(&page_body(26)).unwrap()));
    v.advance_page(Direction::Next);
    v.take_pending_fetch();

    v.add_filter(FilterToken::new(RunFilterTokenType::Status, "SUCCESS"));
    let ticket = v.take_pending_fetch().unwrap();
    assert_eq!(ticket.request.cursor, None);
    assert_eq!(v.page_number(), 1);
}

#[test]
fn network_failure_surfaces_as_network_error() {
    let mut v = view("foo");
    let ticket = v.take_pending_fetch().unwrap();
    v.complete(ticket.id, Err("Cannot reach Dagit".to_string()));
    assert_eq!(
        v.status(),
        &ViewStatus::NetworkError("Cannot reach Dagit".to_string())
    );
}

#[test]
fn countdown_refetches_same_page_once() {
    let mut v = view("foo");
    let ticket = v.take_pending_fetch().unwrap();
    v.complete(ticket.id, Ok(parser::parse_runs_response(&page_body(2)).unwrap()));
    assert_eq!(v.countdown_state().status, CountdownStatus::Counting);

    v.tick(Duration::from_secs(14));
    assert!(v.take_pending_fetch().is_none());
    let state = v.tick(Duration::from_secs(1));
    assert!(state.refreshing());
    let refetch = v.take_pending_fetch().unwrap();
    assert_eq!(refetch.request, v.request());

    // No duplicate while the refetch is in flight
    v.tick(Duration::from_secs(30));
    assert!(v.take_pending_fetch().is_none());
}

#[test]
fn superseded_result_is_discarded() {
    let mut v = view("foo");
    let first = v.take_pending_fetch().unwrap();
    v.set_filters(vec![FilterToken::new(RunFilterTokenType::Status, "FAILURE")]);
    let second = v.take_pending_fetch().unwrap();

    assert!(!v.complete(first.id, Ok(parser::parse_runs_response(&page_body(5)).unwrap())));
    assert_eq!(v.status(), &ViewStatus::Loading);
    assert!(v.complete(second.id, Ok(parser::parse_runs_response(&page_body(1)).unwrap())));
    assert_eq!(v.displayed_runs().len(), 1);
}

#[test]
fn teardown_freezes_view() {
    let mut v = view("foo");
    let ticket = v.take_pending_fetch().unwrap();
    v.teardown();
    assert!(!v.complete(ticket.id, Ok(parser::parse_runs_response(&page_body(5)).unwrap())));
    v.tick(Duration::from_secs(60));
    assert!(v.take_pending_fetch().is_none());
    assert!(!v.is_mounted());
}

// ========== Persistence ==========

#[test]
fn filters_survive_remount_via_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("filters");

    let mut v = view_with_store("foo", Box::new(FileFilterStore::new(&path)));
    v.set_filters(vec![
        FilterToken::new(RunFilterTokenType::Status, "FAILURE"),
        FilterToken::new(RunFilterTokenType::Tag, "team=data"),
    ]);
    v.teardown();

    let remounted = view_with_store("foo", Box::new(FileFilterStore::new(&path)));
    assert_eq!(
        remounted.tokens(),
        &[
            FilterToken::new(RunFilterTokenType::Status, "FAILURE"),
            FilterToken::new(RunFilterTokenType::Tag, "team=data"),
        ]
    );
}

#[test]
fn restored_disabled_tokens_are_dropped() {
    let store = MemoryFilterStore::with_query("q=pipeline%3Abar&q=status%3AFAILURE");
    let v = view_with_store("foo", Box::new(store));
    assert_eq!(
        v.tokens(),
        &[FilterToken::new(RunFilterTokenType::Status, "FAILURE")]
    );
    assert_eq!(v.request().filter.pipeline_name.as_deref(), Some("foo"));
}

#[test]
fn memory_store_round_trips_through_view() {
    let store = MemoryFilterStore::new();
    store
        .save(&[FilterToken::new(RunFilterTokenType::Id, "abc")])
        .unwrap();
    let v = view_with_store("foo", Box::new(store));
    assert_eq!(v.request().filter.run_id.as_deref(), Some("abc"));
}

// ========== Key flows ==========

#[test]
fn editor_flow_applies_filters() {
    let mut state = AppState::new(view("foo"), String::new());
    resolve_body(&mut state, &page_body(3));

    assert_eq!(input::map_key(press(KeyCode::Char('/')), &ctx(&state)), Action::EditFilters);
    state.begin_filter_edit();
    for c in "status:failure".chars() {
        match input::map_key(press(KeyCode::Char(c)), &ctx(&state)) {
            Action::InputChar(c) => state.edit_push(c),
            other => panic!("unexpected action {other:?}"),
        }
    }
    assert_eq!(input::map_key(press(KeyCode::Enter), &ctx(&state)), Action::SubmitFilters);
    state.submit_filter_edit();

    assert!(!state.is_editing());
    assert_eq!(
        state.view.tokens(),
        &[FilterToken::new(RunFilterTokenType::Status, "FAILURE")]
    );
    assert!(state.view.take_pending_fetch().is_some());
}

#[test]
fn editor_rejects_disabled_token_and_stays_open() {
    let mut state = AppState::new(view("foo"), String::new());
    state.begin_filter_edit();
    for c in "pipeline:bar".chars() {
        state.edit_push(c);
    }
    state.submit_filter_edit();
    assert!(state.is_editing());
    assert!(state.notice.as_ref().is_some_and(|n| n.is_error));
    assert!(state.view.tokens().is_empty());
}

#[test]
fn filter_by_selected_status_and_tag() {
    let mut state = AppState::new(view("foo"), String::new());
    resolve_body(&mut state, &page_body(3));
    state.move_down();

    state.filter_by_selected_status();
    resolve_body(&mut state, &page_body(1));
    state.filter_by_selected_tag();

    assert_eq!(
        state.view.tokens(),
        &[
            FilterToken::new(RunFilterTokenType::Status, "SUCCESS"),
            FilterToken::new(RunFilterTokenType::Tag, "team=data"),
        ]
    );
    assert_eq!(state.selected, 0);
}

#[test]
fn refresh_key_blocked_while_loading() {
    let mut state = AppState::new(view("foo"), String::new());
    assert!(state.view.is_loading());
    assert_eq!(input::map_key(press(KeyCode::Char('r')), &ctx(&state)), Action::None);

    resolve_body(&mut state, &page_body(1));
    assert_eq!(input::map_key(press(KeyCode::Char('r')), &ctx(&state)), Action::Refresh);
    assert!(state.view.refetch());
}

// ========== Dispatcher ==========

#[tokio::test]
async fn fetch_page_parses_executor_body() {
    let executor = FakeExecutor::replying(page_body(2));
    let v = view("foo");
    let result = client::fetch_page(&executor, &v.request()).await.unwrap();
    assert_eq!(
        result,
        prw::dagit::model::RunsQueryResult::RunsPage(runs(2))
    );
    assert_eq!(executor.seen(), vec![v.request()]);
}

#[tokio::test]
async fn dispatcher_delivers_result_for_ticket() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let executor = Arc::new(FakeExecutor::replying(page_body(26)));
    let mut dispatcher = FetchDispatcher::new(executor.clone(), tx);

    let mut state = AppState::new(view("foo"), String::new());
    let ticket = state.view.take_pending_fetch().unwrap();
    let id = ticket.id;
    dispatcher.dispatch(ticket);

    match rx.recv().await {
        Some(AppEvent::RunsResult { ticket, outcome }) => {
            assert_eq!(ticket, id);
            state.apply_fetch(ticket, outcome);
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(state.view.displayed_runs().len(), 25);
    assert!(state.view.has_next_page());
    assert_eq!(executor.seen().len(), 1);
}

#[tokio::test]
async fn dispatcher_reports_executor_failure() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut dispatcher =
        FetchDispatcher::new(Arc::new(FakeExecutor::failing("connection refused")), tx);

    let mut v = view("foo");
    dispatcher.dispatch(v.take_pending_fetch().unwrap());

    match rx.recv().await {
        Some(AppEvent::RunsResult { ticket, outcome }) => {
            assert!(v.complete(ticket, outcome));
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(
        v.status(),
        &ViewStatus::NetworkError("connection refused".to_string())
    );
}

#[tokio::test]
async fn server_error_page_is_backend_error_not_connection_error() {
    let executor = FakeExecutor::with_status(
        StatusCode::INTERNAL_SERVER_ERROR,
        "<html><h1>Internal Server Error</h1></html>",
    );
    let mut v = view("foo");
    let ticket = v.take_pending_fetch().unwrap();
    let outcome = client::fetch_page(&executor, &ticket.request)
        .await
        .map_err(|e| e.to_string());
    assert!(v.complete(ticket.id, outcome));
    let expected = "Dagit returned HTTP 500 Internal Server Error";
    assert_eq!(v.status(), &ViewStatus::BackendError(expected.to_string()));
}

#[tokio::test]
async fn dispatcher_shutdown_aborts_pending_fetch() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let executor = Arc::new(StalledExecutor::new());
    let mut dispatcher = FetchDispatcher::new(executor.clone(), tx);

    let mut v = view("foo");
    dispatcher.dispatch(v.take_pending_fetch().unwrap());
    settle().await;
    assert_eq!(executor.started(), 1);
    assert_eq!(executor.dropped(), 0);
    assert!(dispatcher.is_busy());

    dispatcher.shutdown();
    settle().await;
    assert_eq!(executor.dropped(), 1);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn dispatching_again_aborts_previous_fetch() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let executor = Arc::new(StalledExecutor::new());
    let mut dispatcher = FetchDispatcher::new(executor.clone(), tx);

    let mut v = view("foo");
    dispatcher.dispatch(v.take_pending_fetch().unwrap());
    settle().await;

    v.set_filters(vec![FilterToken::new(RunFilterTokenType::Id, "abc")]);
    dispatcher.dispatch(v.take_pending_fetch().unwrap());
    settle().await;
    assert_eq!(executor.started(), 2);
    assert_eq!(executor.dropped(), 1);
    assert!(dispatcher.is_busy());
}

#[tokio::test]
async fn latest_ticket_wins_over_stalled_fetch() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let executor = Arc::new(StalledExecutor::answering_filtered(page_body(1)));
    let mut dispatcher = FetchDispatcher::new(executor.clone(), tx);

    let mut v = view("foo");
    dispatcher.dispatch(v.take_pending_fetch().unwrap());
    settle().await;

    v.set_filters(vec![FilterToken::new(RunFilterTokenType::Status, "FAILURE")]);
    let latest = v.take_pending_fetch().unwrap();
    let latest_id = latest.id;
    dispatcher.dispatch(latest);

    match rx.recv().await {
        Some(AppEvent::RunsResult { ticket, outcome }) => {
            assert_eq!(ticket, latest_id);
            assert!(v.complete(ticket, outcome));
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(v.displayed_runs().len(), 1);
    settle().await;
    assert_eq!(executor.started(), 1);
    assert_eq!(executor.dropped(), 1);
}
