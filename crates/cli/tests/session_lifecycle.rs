//! Session lifecycle across the services, against a fake backend

mod support;

use serde_json::json;
use test_case::test_case;

use biocloud_cli::auth::{LoginOutcome, LoginState, LOGIN_REJECTED};
use biocloud_cli::guard::{GuardPolicy, GuardState};
use biocloud_cli::vm::HistoryFilter;
use biocloud_cli::HttpMethod;
use biocloud_common::{Error, Route, VmTier};

use support::{expired, Harness};

fn vm_list(powered_off_at: Option<&str>) -> serde_json::Value {
    json!({
        "vm_list": [{
            "id": 7,
            "name": "blast-7.westeurope.cloudapp.azure.com",
            "created_at": "2024-05-10T08:15:00Z",
            "powered_off_at": powered_off_at,
            "cost": 1.0
        }]
    })
}

#[tokio::test]
async fn login_stores_session_and_lands_on_dashboard() {
    let harness = Harness::logged_in(GuardPolicy::TokenPresence, 5).await;

    let stored = harness.session.read().expect("session stored");
    assert_eq!(stored.token, "tok-123");
    assert_eq!(stored.profile.credits, 5);
    assert_eq!(harness.app.auth.login_state(), LoginState::Authenticated);
    assert_eq!(harness.app.auth.landing_route(), Route::Dashboard);

    let sent = harness.backend.seen();
    assert_eq!(sent[0].method, HttpMethod::Post);
    assert_eq!(sent[0].path, "/user/login");
    assert!(sent[0].bearer.is_none());
}

#[tokio::test]
async fn rejected_login_stores_nothing() {
    let harness = Harness::new(GuardPolicy::TokenPresence);
    harness
        .backend
        .queue(401, json!({"message": "Bad username or password"}));

    let outcome = harness
        .app
        .auth
        .login("ana@example.com", "wrong-password")
        .await
        .unwrap();

    assert_eq!(outcome, LoginOutcome::Rejected(LOGIN_REJECTED.to_string()));
    assert!(harness.session.read().is_none());
    assert_eq!(harness.app.auth.landing_route(), Route::Login);
}

#[derive(Debug, Clone, Copy)]
enum Endpoint {
    Profile,
    History,
    Create,
    PowerOff,
    Checkout,
}

#[test_case(Endpoint::Profile ; "token validation")]
#[test_case(Endpoint::History ; "vm history")]
#[test_case(Endpoint::Create ; "vm launch")]
#[test_case(Endpoint::PowerOff ; "vm power off")]
#[test_case(Endpoint::Checkout ; "credits checkout")]
#[tokio::test]
async fn expired_token_clears_session_on_any_endpoint(endpoint: Endpoint) {
    let harness = Harness::logged_in(GuardPolicy::ServerValidation, 5).await;
    let (status, body) = expired();
    harness.backend.queue(status, body);

    let app = &harness.app;
    match endpoint {
        Endpoint::Profile => {
            let state = app.guard.evaluate(Route::Profile).await;
            assert_eq!(state, GuardState::Unauthorized { redirect: Route::Login });
        }
        Endpoint::History => {
            assert!(matches!(app.vms.list_history().await, Err(Error::SessionExpired)));
        }
        Endpoint::Create => {
            assert!(matches!(app.vms.create(VmTier::Small).await, Err(Error::SessionExpired)));
        }
        Endpoint::PowerOff => {
            assert!(matches!(app.vms.power_off(7).await, Err(Error::SessionExpired)));
        }
        Endpoint::Checkout => {
            let err = app.credits.checkout("price_1", "10.00 €").await.unwrap_err();
            assert_eq!(err.redirect(), Some(Route::Login));
        }
    }

    assert!(harness.session.read().is_none());
    assert_eq!(app.auth.landing_route(), Route::Login);
}

#[tokio::test]
async fn protected_view_without_session_redirects_to_login() {
    let harness = Harness::new(GuardPolicy::ServerValidation);

    let state = harness.app.guard.evaluate(Route::Dashboard).await;
    assert_eq!(state, GuardState::Unauthorized { redirect: Route::Login });
    assert!(harness.backend.seen().is_empty());
}

#[tokio::test]
async fn launch_beyond_balance_sends_no_request() {
    let harness = Harness::logged_in(GuardPolicy::TokenPresence, 2).await;
    let before = harness.backend.seen().len();

    let err = harness.app.vms.create(VmTier::Large).await.unwrap_err();
    assert!(matches!(err, Error::InsufficientCredits { balance: 2, cost: 3 }));
    assert_eq!(harness.backend.seen().len(), before);
}

#[tokio::test]
async fn launch_then_wait_until_running() {
    let harness = Harness::logged_in(GuardPolicy::TokenPresence, 3).await;
    harness.backend.queue(
        200,
        json!({"dns": "blast-7.westeurope.cloudapp.azure.com", "ip": "20.1.2.3", "price": 0.096}),
    );
    harness.backend.queue(200, vm_list(None));

    let vm = harness.app.vms.create(VmTier::Medium).await.unwrap();
    let entry = harness.app.vms.wait_until_listed(&vm.dns).await.unwrap();

    assert!(entry.running);
    assert_eq!(entry.powered_off_at, "Still Running");
    assert_eq!(
        harness.backend.paths()[1..],
        ["/api/azurevm/setup", "/api/azurevm/history"]
    );
}

#[tokio::test]
async fn power_off_updates_display_only_after_confirmation() {
    let harness = Harness::logged_in(GuardPolicy::TokenPresence, 1).await;
    harness.backend.queue(200, vm_list(None));

    let mut history = harness.app.vms.list_history().await.unwrap();
    history.set_filter(HistoryFilter::Running);
    assert_eq!(history.page_items()[0].powered_off_at, "Still Running");

    harness
        .backend
        .queue(500, json!({"message": "Error trying to power off a VM, please try again."}));
    let err = harness.app.vms.power_off(7).await.unwrap_err();
    assert_eq!(err.user_message(), "Error trying to power off a VM, please try again.");
    assert_eq!(history.page_items()[0].powered_off_at, "Still Running");

    harness.backend.queue(200, json!({"message": "VM Removed"}));
    harness.backend.queue(200, vm_list(Some("2024-05-10T09:00:00Z")));
    let (message, refreshed) = harness.app.vms.power_off(7).await.unwrap();

    assert_eq!(message, "VM Removed");
    let refreshed = refreshed.expect("history refreshed");
    assert_eq!(refreshed.find(7).unwrap().powered_off_at, "10/05/2024 09:00:00");
    assert!(harness.session.read().is_some());
}

#[tokio::test]
async fn logout_forgets_session() {
    let harness = Harness::logged_in(GuardPolicy::TokenPresence, 1).await;
    harness.app.auth.logout().unwrap();

    assert!(harness.session.read().is_none());
    let state = harness.app.guard.evaluate(Route::Blast).await;
    assert_eq!(state, GuardState::Unauthorized { redirect: Route::Login });
}
