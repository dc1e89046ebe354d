//! Router tests against the in-memory store.

use std::{sync::Arc, time::Duration};

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use moderation_core::{
  caller::{Caller, Role},
  gateway::ModerationGateway,
  memory::MemoryStore,
  store::SubmissionStore,
  submission::{
    BusinessPayload, NewSubmission, ReviewStatus, Submission, SubmissionKind,
    SubmissionPayload,
  },
};
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{
  api_router,
  caller::{CALLER_ID_HEADER, CALLER_ROLE_HEADER},
};

struct Harness {
  store:  Arc<MemoryStore>,
  router: Router,
  admin:  Caller,
}

fn harness() -> Harness {
  let store = Arc::new(MemoryStore::new());
  let gateway = Arc::new(ModerationGateway::new(
    store.clone(),
    Duration::from_secs(60),
  ));
  Harness {
    store,
    router: api_router(gateway),
    admin: Caller::admin(Uuid::new_v4()),
  }
}

fn business_payload(name: &str) -> SubmissionPayload {
  SubmissionPayload::Business(BusinessPayload {
    name:        name.into(),
    description: "Bakery and cafe".into(),
    category:    "food".into(),
    city:        "Ballarat".into(),
    state:       "VIC".into(),
    phone:       None,
    website:     Some("https://bakery.example".into()),
    image_url:   None,
  })
}

impl Harness {
  async fn seed(&self, name: &str) -> Submission {
    self
      .store
      .create(NewSubmission::new(Uuid::new_v4(), business_payload(name)))
      .await
      .unwrap()
  }

  async fn send(
    &self,
    method: &str,
    uri: &str,
    caller: Option<Caller>,
    body: Option<Value>,
  ) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
      builder = builder
        .header(CALLER_ID_HEADER, caller.id.to_string())
        .header(CALLER_ROLE_HEADER, caller.role.as_str());
    }
    let body = match body {
      Some(json) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(json.to_string())
      }
      None => Body::empty(),
    };
    self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
  }
}

async fn json_body(resp: Response) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

// ─── Caller headers ───────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_caller_headers_is_401() {
  let h = harness();
  let resp = h.send("GET", "/admin/stats", None, None).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert_eq!(json_body(resp).await["error"], "unauthorized");
}

#[tokio::test]
async fn non_admin_is_forbidden_everywhere_under_admin() {
  let h = harness();
  let sub = h.seed("Crumbs").await;
  let user = Some(Caller::user(Uuid::new_v4()));

  let uris = [
    ("GET", "/admin/stats".to_string()),
    ("GET", "/admin/pending".to_string()),
    ("GET", "/admin/pending/businesses".to_string()),
    ("POST", format!("/admin/approve/business/{}", sub.id)),
  ];
  for (method, uri) in uris {
    let resp = h.send(method, &uri, user, None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{method} {uri}");
    assert_eq!(json_body(resp).await["error"], "forbidden");
  }

  let stored = h.store.get(sub.kind, sub.id).await.unwrap().unwrap();
  assert_eq!(stored.status, ReviewStatus::Pending);
}

// ─── Pending queues ───────────────────────────────────────────────────────────

#[tokio::test]
async fn pending_lists_accept_plural_and_singular_kinds() {
  let h = harness();
  let first = h.seed("First").await;
  let second = h.seed("Second").await;

  for uri in ["/admin/pending/businesses", "/admin/pending/business"] {
    let resp = h.send("GET", uri, Some(h.admin), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let list = json_body(resp).await;
    let ids: Vec<&str> =
      list.as_array().unwrap().iter().map(|s| s["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec![first.id.to_string(), second.id.to_string()]);
  }

  let resp = h.send("GET", "/admin/pending", Some(h.admin), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let all = json_body(resp).await;
  assert_eq!(all["businesses"].as_array().unwrap().len(), 2);
  assert_eq!(all["organisations"].as_array().unwrap().len(), 0);
  assert_eq!(all["artists"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn unknown_kind_is_400() {
  let h = harness();
  let resp = h.send("GET", "/admin/pending/venues", Some(h.admin), None).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert_eq!(json_body(resp).await["error"], "bad_request");
}

// ─── Decide ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reject_removes_from_queue_and_updates_stats() {
  let h = harness();
  let sub = h.seed("Doomed").await;
  let kept = h.seed("Kept").await;

  // Warm the stats cache so a stale read would be visible.
  let resp = h.send("GET", "/admin/stats", Some(h.admin), None).await;
  assert_eq!(json_body(resp).await["pending_businesses"], 2);

  let uri = format!("/admin/reject/business/{}", sub.id);
  let resp = h.send("POST", &uri, Some(h.admin), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let decision = json_body(resp).await;
  assert_eq!(decision["replayed"], false);
  assert_eq!(decision["submission"]["status"], "rejected");
  assert_eq!(
    decision["submission"]["status_history"][0]["actor_id"],
    h.admin.id.to_string()
  );

  let resp = h.send("GET", "/admin/pending/businesses", Some(h.admin), None).await;
  let list = json_body(resp).await;
  let ids: Vec<&str> =
    list.as_array().unwrap().iter().map(|s| s["id"].as_str().unwrap()).collect();
  assert_eq!(ids, vec![kept.id.to_string()]);

  let resp = h.send("GET", "/admin/stats", Some(h.admin), None).await;
  let stats = json_body(resp).await;
  assert_eq!(stats["pending_businesses"], 1);
  assert_eq!(stats["total_pending"], 1);
  assert_eq!(stats["businesses"], 2);
}

#[tokio::test]
async fn replay_is_200_and_opposite_verb_is_409() {
  let h = harness();
  let sub = h.seed("Twice").await;
  let approve = format!("/admin/approve/business/{}", sub.id);

  let resp = h.send("POST", &approve, Some(h.admin), None).await;
  assert_eq!(resp.status(), StatusCode::OK);

  let resp = h.send("POST", &approve, Some(h.admin), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let replay = json_body(resp).await;
  assert_eq!(replay["replayed"], true);
  assert_eq!(replay["submission"]["status_history"].as_array().unwrap().len(), 1);

  let reject = format!("/admin/reject/business/{}", sub.id);
  let resp = h.send("POST", &reject, Some(h.admin), None).await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);
  assert_eq!(json_body(resp).await["error"], "already_reviewed");
}

#[tokio::test]
async fn decide_unknown_id_is_404() {
  let h = harness();
  let uri = format!("/admin/approve/artist/{}", Uuid::new_v4());
  let resp = h.send("POST", &uri, Some(h.admin), None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  assert_eq!(json_body(resp).await["error"], "not_found");
}

#[tokio::test]
async fn decide_with_wrong_kind_is_404() {
  let h = harness();
  let sub = h.seed("Misfiled").await;
  let uri = format!("/admin/approve/artist/{}", sub.id);
  let resp = h.send("POST", &uri, Some(h.admin), None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_verb_is_400() {
  let h = harness();
  let sub = h.seed("Maybe").await;
  let uri = format!("/admin/archive/business/{}", sub.id);
  let resp = h.send("POST", &uri, Some(h.admin), None).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ─── Intake ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_then_owner_and_admin_can_read() {
  let h = harness();
  let owner = Caller::user(Uuid::new_v4());
  let body = serde_json::to_value(business_payload("Fresh")).unwrap();

  // Warm the stats cache before the intake write.
  let resp = h.send("GET", "/admin/stats", Some(h.admin), None).await;
  assert_eq!(json_body(resp).await["pending_businesses"], 0);

  let resp = h.send("POST", "/submissions", Some(owner), Some(body)).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let created = json_body(resp).await;
  assert_eq!(created["status"], "pending");
  assert_eq!(created["owner_id"], owner.id.to_string());
  let id = created["id"].as_str().unwrap().to_string();

  let uri = format!("/submissions/business/{id}");
  let resp = h.send("GET", &uri, Some(owner), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let resp = h.send("GET", &uri, Some(h.admin), None).await;
  assert_eq!(resp.status(), StatusCode::OK);

  let stranger = Caller { id: Uuid::new_v4(), role: Role::User };
  let resp = h.send("GET", &uri, Some(stranger), None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let resp = h.send("GET", "/admin/stats", Some(h.admin), None).await;
  assert_eq!(json_body(resp).await["pending_businesses"], 1);

  let stored = h
    .store
    .get(SubmissionKind::Business, id.parse().unwrap())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(stored.owner_id, owner.id);
}

#[tokio::test]
async fn create_with_malformed_body_is_400() {
  let h = harness();
  let owner = Caller::user(Uuid::new_v4());
  let body = json!({ "kind": "venue", "data": {} });
  let resp = h.send("POST", "/submissions", Some(owner), Some(body)).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert_eq!(json_body(resp).await["error"], "bad_request");
}
