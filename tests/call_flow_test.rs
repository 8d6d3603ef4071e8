//! Call editing, execution, result folding, and reset through the public API

mod common;

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::KeyCode;

use chop::app::{commands, App};
use chop::clipboard::MemoryClipboard;
use chop::core::{ListCursor, Message, Screen};
use chop::domain::{CallField, CallParams, CallType};
use chop::store::{CallStore, PersistedCall};
use common::{
    accounts, app_with, ch, ctrl, key, local_app, stub_factory, ChannelStore, StubBackend,
};

fn select_field(app: &mut App, field: CallField) {
    app.screen = Screen::CallParameterList;
    app.cursors.params = ListCursor::at(field as usize);
}

#[tokio::test]
async fn execute_folds_result_and_persists_once() {
    let backend = Arc::new(StubBackend::succeeding());
    let accounts = accounts();
    let mut app = app_with(stub_factory(backend.clone()), accounts);
    let (store, mut appended) = ChannelStore::new();
    let store = Arc::new(store);
    app.services.store = Some(store.clone() as Arc<dyn CallStore>);

    app.screen = Screen::CallParameterList;
    let command = app.handle_key(ch('e')).expect("execute command");
    assert_eq!(app.screen, Screen::CallExecuting);
    assert!(app.handle_key(ch('e')).is_none());

    let message = command.run().await.expect("completion message");
    assert!(app.update(message).is_none());
    assert_eq!(app.screen, Screen::CallResult);
    assert_eq!(backend.executed.lock().len(), 1);

    let history = app.services.history.get_all_calls();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].params, app.params);
    assert!(history[0].result.success);

    let persisted = tokio::time::timeout(Duration::from_secs(5), appended.recv())
        .await
        .expect("append in time")
        .expect("one record");
    assert_eq!(persisted, PersistedCall::new(&app.params, history[0].timestamp));
    assert_eq!(store.load_calls().await.map(|calls| calls.len()).ok(), Some(1));
    assert_eq!(app.services.chain.get_stats().total_transactions, 1);
}

#[tokio::test]
async fn backend_failure_becomes_failed_result() {
    let backend = Arc::new(StubBackend::failing());
    let mut app = app_with(stub_factory(backend), accounts());
    app.screen = Screen::CallParameterList;
    let command = app.handle_key(ch('e')).expect("execute command");
    match command.run().await {
        Some(message @ Message::CallFinished { .. }) => {
            app.update(message);
        }
        other => panic!("unexpected message: {other:?}"),
    }
    assert_eq!(app.screen, Screen::CallResult);
    let result = app.last_result.clone().expect("result");
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("backend is closed"));
    assert_eq!(app.services.history.len(), 1);
}

#[test]
fn invalid_params_never_reach_the_backend() {
    let backend = Arc::new(StubBackend::succeeding());
    let mut app = app_with(stub_factory(backend.clone()), accounts());
    app.params.call_type = CallType::Create2;
    app.params.salt = String::new();
    app.screen = Screen::CallParameterList;
    assert!(app.handle_key(ch('e')).is_none());
    assert_eq!(app.screen, Screen::CallParameterList);
    assert!(!app.validation_error.is_empty());
    assert!(backend.executed.lock().is_empty());
}

#[test]
fn edit_save_and_cancel() {
    let mut app = local_app();
    select_field(&mut app, CallField::Value);
    app.handle_key(key(KeyCode::Enter));
    assert_eq!(app.screen, Screen::CallParameterEdit);
    app.handle_key(key(KeyCode::Backspace));
    for c in "42".chars() {
        app.handle_key(ch(c));
    }
    app.handle_key(key(KeyCode::Enter));
    assert_eq!(app.screen, Screen::CallParameterList);
    assert_eq!(app.params.value, "42");

    app.handle_key(key(KeyCode::Enter));
    app.handle_key(ch('7'));
    app.handle_key(key(KeyCode::Esc));
    assert_eq!(app.params.value, "42");
    assert!(app.edit.is_none());
}

#[test]
fn failed_save_keeps_editor_open() {
    let mut app = local_app();
    select_field(&mut app, CallField::GasLimit);
    app.handle_key(key(KeyCode::Enter));
    app.handle_key(ch('x'));
    app.handle_key(key(KeyCode::Enter));
    assert_eq!(app.screen, Screen::CallParameterEdit);
    assert!(!app.validation_error.is_empty());
    assert_eq!(app.params.gas_limit, CallParams::default().gas_limit);

    app.handle_key(ctrl('r'));
    assert_eq!(
        app.edit.as_ref().map(|edit| edit.input.value().to_string()),
        Some(CallParams::default().gas_limit)
    );
    assert!(app.validation_error.is_empty());
}

#[test]
fn reset_all_restores_configured_defaults() {
    let mut app = local_app();
    app.defaults.value = "5".into();
    app.params.value = "9".into();
    app.params.input_data = "0xdead".into();
    app.params.call_type = CallType::StaticCall;
    app.screen = Screen::CallParameterList;
    app.handle_key(ch('R'));
    assert_eq!(app.params, app.defaults);
    assert_eq!(app.screen, Screen::CallParameterList);
}

#[test]
fn single_field_reset() {
    let mut app = local_app();
    app.params.caller = "0x00000000000000000000000000000000000000aa".into();
    app.params.target = "0x00000000000000000000000000000000000000bb".into();
    select_field(&mut app, CallField::Caller);
    app.handle_key(ch('r'));
    assert_eq!(app.params.caller, CallParams::default().caller);
    assert_eq!(app.params.target, "0x00000000000000000000000000000000000000bb");
}

#[test]
fn call_type_edit_is_bounded() {
    let mut app = local_app();
    select_field(&mut app, CallField::CallType);
    app.handle_key(key(KeyCode::Enter));
    assert_eq!(app.screen, Screen::CallTypeEdit);
    for _ in 0..20 {
        app.handle_key(key(KeyCode::Down));
    }
    app.handle_key(key(KeyCode::Enter));
    assert_eq!(app.params.call_type, CallType::ALL[CallType::ALL.len() - 1]);
}

#[test]
fn paste_is_normalized_into_one_line() {
    let mut app = local_app();
    app.services.clipboard = Arc::new(MemoryClipboard::with_text("0x60 01\n\n  60\r\n02"));
    select_field(&mut app, CallField::InputData);
    app.handle_key(key(KeyCode::Enter));
    app.handle_key(ctrl('v'));
    assert_eq!(
        app.edit.as_ref().map(|edit| edit.input.value().to_string()),
        Some("0x60 01 60 02".to_string())
    );
}

#[test]
fn copy_uses_clipboard_with_feedback() {
    let clipboard = Arc::new(MemoryClipboard::new());
    let mut app = local_app();
    app.services.clipboard = clipboard.clone();
    let address = app.accounts()[0].address;
    app.selection.account = Some(address);
    app.screen = Screen::AccountDetail;
    app.handle_key(ctrl('y'));
    assert_eq!(clipboard.contents(), Some(address.to_string()));
    assert!(app
        .status_text()
        .is_some_and(|(text, _)| text.starts_with("Copied: ")));
}

#[test]
fn history_entry_loads_into_editor() {
    let mut app = local_app();
    let params = CallParams {
        input_data: "0xabcd".into(),
        ..CallParams::default()
    };
    commands::replay_calls(
        &app.services,
        vec![PersistedCall::new(&params, chrono::Utc::now())],
    );
    app.screen = Screen::CallHistory;
    app.handle_key(key(KeyCode::Enter));
    assert_eq!(app.screen, Screen::CallHistoryDetail);
    app.handle_key(ch('e'));
    assert_eq!(app.screen, Screen::CallParameterList);
    assert_eq!(app.params.input_data, "0xabcd");
}

#[tokio::test]
async fn reset_clears_state_and_returns_to_origin() {
    let backend = Arc::new(StubBackend::succeeding());
    let mut app = app_with(stub_factory(backend.clone()), accounts());
    let (store, _appended) = ChannelStore::new();
    let store = Arc::new(store);
    store
        .append_call(PersistedCall::new(&CallParams::default(), chrono::Utc::now()))
        .await
        .expect("append");
    app.services.store = Some(store.clone() as Arc<dyn CallStore>);

    app.screen = Screen::CallParameterList;
    let command = app.handle_key(ch('e')).expect("execute");
    if let Some(message) = command.run().await {
        app.update(message);
    }
    assert_eq!(app.services.history.len(), 1);

    app.screen = Screen::Settings;
    app.handle_key(ch('r'));
    assert_eq!(app.screen, Screen::ConfirmReset);
    let command = app.handle_key(ch('y')).expect("reset command");
    assert!(app.handle_key(key(KeyCode::Enter)).is_none());

    let message = command.run().await.expect("reset message");
    app.update(message);
    assert_eq!(app.screen, Screen::Settings);
    assert!(app.nav.is_empty());
    assert!(!app.reset_pending);
    assert!(app.services.history.is_empty());
    assert!(app.last_result.is_none());
    assert_eq!(app.services.chain.get_stats().total_transactions, 0);
    assert_eq!(store.load_calls().await.map(|calls| calls.len()).ok(), Some(0));
}
