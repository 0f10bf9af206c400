//! Router-level tests against an in-memory SQLite store.

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use classbook_core::{
  account::{NewAccount, Role},
  store::SchoolStore,
};
use classbook_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{
  AppState, PhotoStore, api_router,
  auth::{hash_password, token_digest},
  photo_router,
};

const TEACHER_EMAIL: &str = "teacher@school.edu";
const TEACHER_PASSWORD: &str = "secret";

struct Harness {
  state: AppState<SqliteStore>,
  dir:   PathBuf,
}

impl Drop for Harness {
  fn drop(&mut self) { let _ = std::fs::remove_dir_all(&self.dir); }
}

impl Harness {
  async fn new() -> Self { Self::with_session_ttl(chrono::Duration::hours(24)).await }

  async fn with_session_ttl(session_ttl: chrono::Duration) -> Self {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store
      .add_account(NewAccount {
        email:         TEACHER_EMAIL.into(),
        password_hash: hash_password(TEACHER_PASSWORD).unwrap(),
        role:          Role::Teacher,
        student_id:    None,
      })
      .await
      .unwrap();

    let dir = std::env::temp_dir().join(format!("classbook-api-{}", uuid::Uuid::new_v4()));
    Harness {
      state: AppState {
        store:       Arc::new(store),
        photos:      Arc::new(PhotoStore::new(&dir, "")),
        session_ttl,
      },
      dir,
    }
  }

  fn router(&self) -> Router {
    Router::new()
      .nest("/api", api_router(self.state.clone()))
      .merge(photo_router(self.state.photos.clone()))
  }

  async fn send(&self, req: Request<Body>) -> Response { self.router().oneshot(req).await.unwrap() }

  /// JSON request; returns the status and the parsed body (`Null` if empty).
  async fn json(
    &self,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    let resp = self.send(builder.body(body).unwrap()).await;
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  async fn login(&self, email: &str, password: &str) -> String {
    let (status, body) = self
      .json(
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
      )
      .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["token"].as_str().unwrap().to_owned()
  }

  async fn teacher(&self) -> String { self.login(TEACHER_EMAIL, TEACHER_PASSWORD).await }

  async fn create_subject(&self, token: &str, code: &str) -> String {
    let (status, body) = self
      .json(
        "POST",
        "/api/subjects",
        Some(token),
        Some(json!({ "code": code, "name": "Intro to Computing" })),
      )
      .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["subject_id"].as_str().unwrap().to_owned()
  }

  /// Returns the student id and the generated login email.
  async fn create_student(&self, token: &str, number: &str, subjects: &[&str]) -> (String, String) {
    let email = format!("{number}@school.edu");
    let (status, body) = self
      .json(
        "POST",
        "/api/students",
        Some(token),
        Some(json!({
          "student_number": number,
          "full_name": "Ana Reyes",
          "email": email,
          "subjects": subjects,
        })),
      )
      .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    (body["student"]["student_id"].as_str().unwrap().to_owned(), email)
  }
}

// ─── Auth ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn requests_without_token_are_unauthorized() {
  let h = Harness::new().await;
  let req = Request::get("/api/subjects").body(Body::empty()).unwrap();
  let resp = h.send(req).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert_eq!(resp.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");

  let (status, _) = h.json("GET", "/api/subjects", Some("bogus"), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_reports_role_and_landing_page() {
  let h = Harness::new().await;
  let (status, body) = h
    .json(
      "POST",
      "/api/auth/login",
      None,
      Some(json!({ "email": " Teacher@School.edu ", "password": TEACHER_PASSWORD })),
    )
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["role"], "teacher");
  assert_eq!(body["redirect"], "/teacher/dashboard");
  assert_eq!(body["user"]["username"], "teacher");

  let (status, body) = h
    .json(
      "POST",
      "/api/auth/login",
      None,
      Some(json!({ "email": TEACHER_EMAIL, "password": "wrong" })),
    )
    .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["error"], "invalid email or password");
}

#[tokio::test]
async fn register_checks_passwords_and_duplicates() {
  let h = Harness::new().await;
  let (status, _) = h
    .json(
      "POST",
      "/api/auth/register",
      None,
      Some(json!({ "email": "new@school.edu", "password": "a", "confirm_password": "b" })),
    )
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = h
    .json(
      "POST",
      "/api/auth/register",
      None,
      Some(json!({ "email": "new@school.edu", "password": "pw", "confirm_password": "pw" })),
    )
    .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["role"], "teacher");
  assert!(body.get("password_hash").is_none());

  let (status, _) = h
    .json(
      "POST",
      "/api/auth/register",
      None,
      Some(json!({ "email": TEACHER_EMAIL, "password": "pw", "confirm_password": "pw" })),
    )
    .await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn logout_closes_the_session() {
  let h = Harness::new().await;
  let token = h.teacher().await;

  let (status, body) = h.json("GET", "/api/auth/me", Some(token.as_str()), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["email"], TEACHER_EMAIL);

  let (status, _) = h.json("POST", "/api/auth/logout", Some(token.as_str()), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = h.json("GET", "/api/auth/me", Some(token.as_str()), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_session_is_rejected() {
  let h = Harness::with_session_ttl(chrono::Duration::zero()).await;
  let token = h.teacher().await;
  tokio::time::sleep(std::time::Duration::from_millis(5)).await;

  let (status, body) = h.json("GET", "/api/auth/me", Some(token.as_str()), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED, "{body}");

  // Logging in again sweeps the stale row.
  h.teacher().await;
  let stale = h
    .state
    .store
    .resolve_session(&token_digest(&token), chrono::Utc::now() - chrono::Duration::days(365))
    .await
    .unwrap();
  assert!(stale.is_none());
}

// ─── Teacher routes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn subject_crud() {
  let h = Harness::new().await;
  let token = h.teacher().await;
  let id = h.create_subject(&token, "CS101").await;

  let (status, body) = h.json("GET", &format!("/api/subjects/{id}"), Some(token.as_str()), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["code"], "CS101");

  let (status, body) = h
    .json(
      "PUT",
      &format!("/api/subjects/{id}"),
      Some(token.as_str()),
      Some(json!({ "code": "CS102", "name": "Programming", "semester": "2nd" })),
    )
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["code"], "CS102");
  assert_eq!(body["semester"], "2nd");

  let (_, body) = h.json("GET", "/api/teacher/dashboard", Some(token.as_str()), None).await;
  assert_eq!(body["subjects"], 1);

  let (status, _) = h.json("DELETE", &format!("/api/subjects/{id}"), Some(token.as_str()), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = h.json("GET", &format!("/api/subjects/{id}"), Some(token.as_str()), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_subject_rejects_blank_fields() {
  let h = Harness::new().await;
  let token = h.teacher().await;
  let (status, _) = h
    .json("POST", "/api/subjects", Some(token.as_str()), Some(json!({ "code": "", "name": "x" })))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn created_student_can_sign_in_but_not_reach_teacher_routes() {
  let h = Harness::new().await;
  let teacher = h.teacher().await;
  let subject = h.create_subject(&teacher, "CS101").await;

  let (status, body) = h
    .json(
      "POST",
      "/api/students",
      Some(teacher.as_str()),
      Some(json!({
        "student_number": "2024-0001",
        "full_name": "Ana Reyes",
        "email": "Ana@School.edu",
        "subjects": [subject],
      })),
    )
    .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["credentials"]["email"], "ana@school.edu");
  assert_eq!(body["credentials"]["password"], "password");

  let (status, login) = h
    .json(
      "POST",
      "/api/auth/login",
      None,
      Some(json!({ "email": "ana@school.edu", "password": "password" })),
    )
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(login["role"], "student");
  assert_eq!(login["redirect"], "/student/dashboard");
  let student = login["token"].as_str().unwrap();

  let (status, _) = h.json("GET", "/api/subjects", Some(student), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, _) = h.json("GET", "/api/student/profile", Some(teacher.as_str()), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, profile) = h.json("GET", "/api/student/profile", Some(student), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(profile["initials"], "AR");
  assert_eq!(profile["photo"], Value::Null);
}

#[tokio::test]
async fn duplicate_student_number_conflicts() {
  let h = Harness::new().await;
  let token = h.teacher().await;
  h.create_student(&token, "2024-0001", &[]).await;

  let (status, _) = h
    .json(
      "POST",
      "/api/students",
      Some(token.as_str()),
      Some(json!({
        "student_number": "2024-0001",
        "full_name": "Someone Else",
        "email": "other@school.edu",
      })),
    )
    .await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn updating_student_email_moves_the_login() {
  let h = Harness::new().await;
  let token = h.teacher().await;
  let (id, _) = h.create_student(&token, "2024-0001", &[]).await;

  let (status, body) = h
    .json(
      "PUT",
      &format!("/api/students/{id}"),
      Some(token.as_str()),
      Some(json!({ "full_name": "Ana R. Reyes", "email": "ana.reyes@school.edu" })),
    )
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["full_name"], "Ana R. Reyes");

  h.login("ana.reyes@school.edu", "password").await;
}

#[tokio::test]
async fn student_email_taken_by_teacher_is_rejected_without_side_effects() {
  let h = Harness::new().await;
  let token = h.teacher().await;

  let (status, body) = h
    .json(
      "POST",
      "/api/students",
      Some(token.as_str()),
      Some(json!({
        "student_number": "2024-0001",
        "full_name": "Ana Reyes",
        "email": TEACHER_EMAIL,
      })),
    )
    .await;
  assert_eq!(status, StatusCode::CONFLICT, "{body}");

  let (_, students) = h.json("GET", "/api/students", Some(token.as_str()), None).await;
  assert_eq!(students, json!([]));
}

#[tokio::test]
async fn failed_email_change_leaves_student_and_login_unchanged() {
  let h = Harness::new().await;
  let token = h.teacher().await;
  let subject = h.create_subject(&token, "CS101").await;
  let (id, email) = h.create_student(&token, "2024-0001", &[subject.as_str()]).await;

  let (status, body) = h
    .json(
      "PUT",
      &format!("/api/students/{id}"),
      Some(token.as_str()),
      Some(json!({
        "full_name": "Renamed",
        "email": TEACHER_EMAIL,
        "subjects": [],
        "photo": "data:image/png;base64,iVBORw0KGgo=",
      })),
    )
    .await;
  assert_eq!(status, StatusCode::CONFLICT, "{body}");

  let (_, student) = h.json("GET", &format!("/api/students/{id}"), Some(token.as_str()), None).await;
  assert_eq!(student["full_name"], "Ana Reyes");
  assert_eq!(student["email"], email.as_str());
  assert_eq!(student["subjects"], json!([subject]));
  assert!(student["photo"].is_null());

  // The stored upload was discarded along with the update.
  let leftover = std::fs::read_dir(&h.dir).map(|d| d.count()).unwrap_or(0);
  assert_eq!(leftover, 0);

  h.login(&email, "password").await;
  h.teacher().await;
}

#[tokio::test]
async fn update_without_subjects_keeps_enrollment() {
  let h = Harness::new().await;
  let token = h.teacher().await;
  let subject = h.create_subject(&token, "CS101").await;
  let (id, email) = h.create_student(&token, "2024-0001", &[subject.as_str()]).await;

  let (status, body) = h
    .json(
      "PUT",
      &format!("/api/students/{id}"),
      Some(token.as_str()),
      Some(json!({ "full_name": "Ana R. Reyes", "email": email })),
    )
    .await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["subjects"], json!([subject]));

  let (status, body) = h
    .json(
      "PUT",
      &format!("/api/students/{id}"),
      Some(token.as_str()),
      Some(json!({ "full_name": "Ana R. Reyes", "email": email, "subjects": [] })),
    )
    .await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["subjects"], json!([]));
}

#[tokio::test]
async fn deleting_student_revokes_their_session() {
  let h = Harness::new().await;
  let teacher = h.teacher().await;
  let (id, email) = h.create_student(&teacher, "2024-0001", &[]).await;
  let student = h.login(&email, "password").await;

  let (status, _) = h.json("DELETE", &format!("/api/students/{id}"), Some(teacher.as_str()), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, _) = h.json("GET", "/api/student/profile", Some(student.as_str()), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn grade_sheet_shows_cascade_and_status() {
  let h = Harness::new().await;
  let token = h.teacher().await;
  let subject = h.create_subject(&token, "CS101").await;
  let (student, _) = h.create_student(&token, "2024-0001", &[subject.as_str()]).await;

  let (status, body) = h
    .json(
      "PUT",
      "/api/grades",
      Some(token.as_str()),
      Some(json!({
        "subject_id": subject,
        "grades": [
          { "student_id": student, "term": "prelim", "grade": 2.0 },
          { "student_id": student, "term": "midterm", "grade": 3.0 },
        ],
      })),
    )
    .await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["saved"], 2);

  let (status, sheet) = h
    .json("GET", &format!("/api/grades/sheet?subject_id={subject}"), Some(token.as_str()), None)
    .await;
  assert_eq!(status, StatusCode::OK);
  let row = &sheet["rows"][0];
  assert_eq!(row["raw"]["midterm"], 3.0);
  assert_eq!(row["cumulative"]["midterm"], 2.5);
  // Ungraded semifinal and final pull the cascade to 0.625.
  assert_eq!(row["cumulative"]["final"], 0.625);
  assert_eq!(row["status"], "passed");
}

#[tokio::test]
async fn out_of_range_grade_is_rejected() {
  let h = Harness::new().await;
  let token = h.teacher().await;
  let subject = h.create_subject(&token, "CS101").await;
  let (student, _) = h.create_student(&token, "2024-0001", &[subject.as_str()]).await;

  let (status, _) = h
    .json(
      "PUT",
      "/api/grades",
      Some(token.as_str()),
      Some(json!({
        "subject_id": subject,
        "grades": [{ "student_id": student, "term": "final", "grade": 6.0 }],
      })),
    )
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn attendance_sheet_defaults_to_absent() {
  let h = Harness::new().await;
  let token = h.teacher().await;
  let subject = h.create_subject(&token, "CS101").await;
  let (student, _) = h.create_student(&token, "2024-0001", &[subject.as_str()]).await;
  let uri = format!("/api/attendance/sheet?subject_id={subject}&date=2024-08-01");

  let (status, sheet) = h.json("GET", &uri, Some(token.as_str()), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(sheet["rows"][0]["status"], "absent");
  assert_eq!(sheet["rows"][0]["recorded"], false);
  assert_eq!(sheet["tally"]["absent"], 1);

  let (status, _) = h
    .json(
      "PUT",
      "/api/attendance",
      Some(token.as_str()),
      Some(json!({
        "subject_id": subject,
        "date": "2024-08-01",
        "records": [{ "student_id": student, "status": "late" }],
      })),
    )
    .await;
  assert_eq!(status, StatusCode::OK);

  let (_, sheet) = h.json("GET", &uri, Some(token.as_str()), None).await;
  assert_eq!(sheet["rows"][0]["status"], "late");
  assert_eq!(sheet["rows"][0]["display"]["label"], "Late");
  assert_eq!(sheet["rows"][0]["display"]["color"], "yellow");
  assert_eq!(sheet["rows"][0]["recorded"], true);
}

#[tokio::test]
async fn csv_report_is_an_attachment() {
  let h = Harness::new().await;
  let token = h.teacher().await;
  let subject = h.create_subject(&token, "CS101").await;
  h.create_student(&token, "2024-0001", &[subject.as_str()]).await;

  let req = Request::get(format!("/api/reports/{subject}/grades.csv"))
    .header(header::AUTHORIZATION, format!("Bearer {token}"))
    .body(Body::empty())
    .unwrap();
  let resp = h.send(req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(
    resp.headers().get(header::CONTENT_DISPOSITION).unwrap(),
    "attachment; filename=\"CS101_grades.csv\""
  );
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let csv = std::str::from_utf8(&bytes).unwrap();
  assert!(csv.starts_with("Student ID,Student Name,"), "{csv}");
  assert!(csv.contains("2024-0001,\"Ana Reyes\""), "{csv}");
  assert!(csv.trim_end().ends_with(",Pending"), "{csv}");
}

#[tokio::test]
async fn html_report_is_served_inline() {
  let h = Harness::new().await;
  let token = h.teacher().await;
  let subject = h.create_subject(&token, "CS101").await;

  let req = Request::get(format!("/api/reports/{subject}/attendance.html"))
    .header(header::AUTHORIZATION, format!("Bearer {token}"))
    .body(Body::empty())
    .unwrap();
  let resp = h.send(req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert!(
    resp.headers()[header::CONTENT_TYPE]
      .to_str()
      .unwrap()
      .starts_with("text/html")
  );
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  assert!(std::str::from_utf8(&bytes).unwrap().contains("CS101"));
}

#[tokio::test]
async fn report_for_missing_subject_is_404() {
  let h = Harness::new().await;
  let token = h.teacher().await;
  let uri = format!("/api/reports/{}/attendance.csv", uuid::Uuid::new_v4());
  let (status, _) = h.json("GET", &uri, Some(token.as_str()), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Student routes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn student_sees_only_enrolled_subjects() {
  let h = Harness::new().await;
  let teacher = h.teacher().await;
  let enrolled = h.create_subject(&teacher, "CS101").await;
  let other = h.create_subject(&teacher, "MATH1").await;
  let (id, email) = h.create_student(&teacher, "2024-0001", &[enrolled.as_str()]).await;

  h.json(
    "PUT",
    "/api/attendance",
    Some(teacher.as_str()),
    Some(json!({
      "subject_id": enrolled,
      "date": "2024-08-02",
      "records": [{ "student_id": id, "status": "present" }],
    })),
  )
  .await;
  h.json(
    "PUT",
    "/api/attendance",
    Some(teacher.as_str()),
    Some(json!({
      "subject_id": enrolled,
      "date": "2024-08-01",
      "records": [{ "student_id": id, "status": "excused" }],
    })),
  )
  .await;

  let student = h.login(&email, "password").await;

  let (_, subjects) = h.json("GET", "/api/student/subjects", Some(student.as_str()), None).await;
  assert_eq!(subjects.as_array().unwrap().len(), 1);
  assert_eq!(subjects[0]["code"], "CS101");

  let (status, _) = h
    .json("GET", &format!("/api/student/grades?subject_id={other}"), Some(student.as_str()), None)
    .await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, grades) = h.json("GET", "/api/student/grades", Some(student.as_str()), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(grades[0]["status"], "pending");

  let (_, history) = h.json("GET", "/api/student/attendance", Some(student.as_str()), None).await;
  assert_eq!(history["records"][0]["date"], "2024-08-01");
  assert_eq!(history["records"][0]["display"]["label"], "Excused");
  assert_eq!(history["records"][1]["status"], "present");
  assert_eq!(history["tally"]["present"], 1);
  assert_eq!(history["tally"]["excused"], 1);

  let (_, dashboard) = h.json("GET", "/api/student/dashboard", Some(student.as_str()), None).await;
  assert_eq!(dashboard["enrolled_subjects"], 1);
  assert_eq!(dashboard["attendance_records"], 2);
}

#[tokio::test]
async fn photo_upload_is_stored_and_served() {
  let h = Harness::new().await;
  let teacher = h.teacher().await;
  let (_, email) = h.create_student(&teacher, "2024-0001", &[]).await;
  let student = h.login(&email, "password").await;

  let upload = |content_type: &str, body: Vec<u8>| {
    Request::put("/api/student/profile/photo")
      .header(header::AUTHORIZATION, format!("Bearer {student}"))
      .header(header::CONTENT_TYPE, content_type)
      .body(Body::from(body))
      .unwrap()
  };

  let resp = h.send(upload("text/plain", b"hello".to_vec())).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let resp = h
    .send(upload("image/png", vec![0u8; crate::photos::MAX_PHOTO_BYTES + 1]))
    .await;
  assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

  let resp = h.send(upload("image/png", b"\x89PNG fake".to_vec())).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let profile: Value = serde_json::from_slice(&bytes).unwrap();
  let url = profile["photo"].as_str().unwrap().to_owned();
  assert!(url.starts_with("/photos/2024-0001-"), "{url}");

  let resp = h.send(Request::get(url.as_str()).body(Body::empty()).unwrap()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");
}
