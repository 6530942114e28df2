//! In-memory stand-in for the Monica REST API.
//!
//! Serves the resources the client knows about under `/api/`, guarded by a
//! static bearer token and a fixed-window rate limit. Timestamps are encoded
//! the way different Monica versions send them: RFC 3339 strings for tags,
//! contacts and contact field types, Unix seconds for genders and Unix
//! milliseconds for contact fields.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Path, Query, Request, State},
    http::{
        header::{AUTHORIZATION, RETRY_AFTER},
        HeaderValue, StatusCode,
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{
    net::TcpListener,
    sync::{Mutex, RwLock},
};
use tracing::debug;
use uuid::Uuid;

/// Token accepted by `app()`.
pub const ACCESS_TOKEN: &str = "test-token";
pub const ACCOUNT_ID: u64 = 1;

pub const DEFAULT_PER_PAGE: u32 = 15;
pub const MAX_PER_PAGE: u32 = 100;
pub const DEFAULT_RATE_LIMIT: u64 = 60;
const RATE_WINDOW: Duration = Duration::from_secs(60);

const ACCOUNT: Account = Account { id: ACCOUNT_ID };

#[derive(Clone, Debug)]
pub struct MockConfig {
    pub access_token: String,
    /// Requests allowed per minute.
    pub rate_limit: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            access_token: ACCESS_TOKEN.to_string(),
            rate_limit: DEFAULT_RATE_LIMIT,
        }
    }
}

mod ts {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::Serializer;

    pub fn rfc3339<S: Serializer>(t: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn unix_seconds<S: Serializer>(t: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(t.timestamp())
    }

    pub fn unix_seconds_opt<S: Serializer>(t: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match t {
            Some(t) => s.serialize_i64(t.timestamp()),
            None => s.serialize_none(),
        }
    }

    pub fn unix_millis<S: Serializer>(t: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(t.timestamp_millis())
    }
}

// --- records ---

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: u64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Tag {
    pub id: u64,
    pub object: &'static str,
    pub name: String,
    pub name_slug: String,
    pub account: Account,
    #[serde(serialize_with = "ts::rfc3339")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "ts::rfc3339")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Gender {
    pub id: u64,
    pub object: &'static str,
    pub name: String,
    pub account: Account,
    #[serde(serialize_with = "ts::unix_seconds")]
    pub created_at: DateTime<Utc>,
    /// `None` until the gender is renamed.
    #[serde(serialize_with = "ts::unix_seconds_opt")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Country {
    pub id: String,
    pub object: &'static str,
    pub name: String,
    pub iso: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ContactFieldType {
    pub id: u64,
    pub object: &'static str,
    pub name: String,
    pub fontawesome_icon: Option<String>,
    pub protocol: Option<String>,
    pub delible: bool,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub account: Account,
    #[serde(serialize_with = "ts::rfc3339")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "ts::rfc3339")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Career {
    pub job: Option<String>,
    pub company: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Information {
    pub career: Career,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Contact {
    pub id: u64,
    pub object: &'static str,
    pub hash_id: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub nickname: Option<String>,
    pub gender: Option<String>,
    #[serde(skip)]
    pub gender_id: u64,
    pub description: Option<String>,
    pub is_birthdate_known: bool,
    pub birthdate_day: Option<u32>,
    pub birthdate_month: Option<u32>,
    pub birthdate_year: Option<i32>,
    pub birthdate_is_age_based: bool,
    pub birthdate_age: Option<u32>,
    pub is_partial: bool,
    pub is_deceased: bool,
    pub is_deceased_date_known: bool,
    pub deceased_date_day: Option<u32>,
    pub deceased_date_month: Option<u32>,
    pub deceased_date_year: Option<i32>,
    pub deceased_date_is_age_based: bool,
    pub information: Information,
    pub tags: Vec<Tag>,
    pub account: Account,
    #[serde(serialize_with = "ts::rfc3339")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "ts::rfc3339")]
    pub updated_at: DateTime<Utc>,
}

/// Stored contact field; rendered through `ContactFieldView`.
#[derive(Clone, Debug)]
pub struct ContactField {
    pub id: u64,
    pub contact_id: u64,
    pub contact_field_type_id: u64,
    pub data: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct ContactFieldView<'a> {
    id: u64,
    object: &'static str,
    data: &'a str,
    contact_field_type: &'a ContactFieldType,
    account: Account,
    contact: &'a Contact,
    #[serde(serialize_with = "ts::unix_millis")]
    created_at: DateTime<Utc>,
    #[serde(serialize_with = "ts::unix_millis")]
    updated_at: DateTime<Utc>,
}

// --- inputs ---

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NameInput {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContactInput {
    pub first_name: String,
    pub last_name: Option<String>,
    pub nickname: Option<String>,
    pub gender_id: u64,
    pub description: Option<String>,
    pub is_birthdate_known: bool,
    pub birthdate_day: Option<u32>,
    pub birthdate_month: Option<u32>,
    pub birthdate_year: Option<i32>,
    pub birthdate_is_age_based: bool,
    pub birthdate_age: Option<u32>,
    pub is_partial: bool,
    pub is_deceased: bool,
    pub is_deceased_date_known: bool,
    pub deceased_date_day: Option<u32>,
    pub deceased_date_month: Option<u32>,
    pub deceased_date_year: Option<i32>,
    pub deceased_date_is_age_based: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CareerInput {
    pub job: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SetTagsInput {
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContactFieldInput {
    pub contact_field_type_id: u64,
    pub contact_id: u64,
    pub data: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub query: Option<String>,
}

// --- errors ---

#[derive(Debug, PartialEq, Eq)]
pub enum MockError {
    Unauthenticated,
    NotFound,
    Invalid(String),
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            MockError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                json!({"error": {"message": "Unauthenticated.", "error_code": 42}}),
            ),
            MockError::NotFound => (
                StatusCode::NOT_FOUND,
                json!({"error": {"message": "The resource has not been found", "error_code": 31}}),
            ),
            MockError::Invalid(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({"error": {"message": [message], "error_code": 32}}),
            ),
        };
        (status, Json(body)).into_response()
    }
}

// --- store ---

#[derive(Debug)]
pub struct Table<T> {
    rows: BTreeMap<u64, T>,
    next_id: u64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T> Table<T> {
    fn insert(&mut self, build: impl FnOnce(u64) -> T) -> &T {
        let id = self.next_id;
        self.next_id += 1;
        self.rows.entry(id).or_insert(build(id))
    }

    pub fn get(&self, id: u64) -> Option<&T> {
        self.rows.get(&id)
    }

    fn get_mut(&mut self, id: u64) -> Option<&mut T> {
        self.rows.get_mut(&id)
    }

    fn remove(&mut self, id: u64) -> Option<T> {
        self.rows.remove(&id)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct Store {
    pub tags: Table<Tag>,
    pub genders: Table<Gender>,
    pub contacts: Table<Contact>,
    pub field_types: Table<ContactFieldType>,
    pub fields: Table<ContactField>,
    pub countries: BTreeMap<String, Country>,
}

pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

impl Store {
    /// Store with the reference data a fresh Monica account starts with.
    pub fn seeded() -> Self {
        let mut store = Self::default();
        let now = Utc::now();
        for name in ["Man", "Woman", "Rather not say"] {
            store.genders.insert(|id| Gender {
                id,
                object: "gender",
                name: name.to_string(),
                account: ACCOUNT,
                created_at: now,
                updated_at: None,
            });
        }
        let field_types = [
            ("Email", "fa fa-envelope-open-o", Some("mailto:"), false, Some("email")),
            ("Phone", "fa fa-volume-control-phone", Some("tel:"), false, Some("phone")),
            ("Facebook", "fa fa-facebook-official", None, true, None),
            ("Twitter", "fa fa-twitter-square", None, true, None),
        ];
        for (name, icon, protocol, delible, kind) in field_types {
            store.field_types.insert(|id| ContactFieldType {
                id,
                object: "contactfieldtype",
                name: name.to_string(),
                fontawesome_icon: Some(icon.to_string()),
                protocol: protocol.map(str::to_string),
                delible,
                kind: kind.map(str::to_string),
                account: ACCOUNT,
                created_at: now,
                updated_at: now,
            });
        }
        for (code, name) in [
            ("CA", "Canada"),
            ("DE", "Germany"),
            ("FR", "France"),
            ("GB", "United Kingdom"),
            ("US", "United States"),
        ] {
            store.countries.insert(
                code.to_string(),
                Country {
                    id: code.to_string(),
                    object: "country",
                    name: name.to_string(),
                    iso: code.to_lowercase(),
                },
            );
        }
        store
    }

    pub fn create_tag(&mut self, name: &str) -> Tag {
        let now = Utc::now();
        self.tags
            .insert(|id| Tag {
                id,
                object: "tag",
                name: name.to_string(),
                name_slug: slugify(name),
                account: ACCOUNT,
                created_at: now,
                updated_at: now,
            })
            .clone()
    }

    /// Rename a tag and refresh the copies embedded in contacts.
    pub fn rename_tag(&mut self, id: u64, name: &str) -> Option<Tag> {
        let tag = self.tags.get_mut(id)?;
        tag.name = name.to_string();
        tag.name_slug = slugify(name);
        tag.updated_at = Utc::now();
        let tag = tag.clone();
        for contact in self.contacts.rows.values_mut() {
            for embedded in contact.tags.iter_mut().filter(|t| t.id == id) {
                *embedded = tag.clone();
            }
        }
        Some(tag)
    }

    pub fn delete_tag(&mut self, id: u64) -> bool {
        if self.tags.remove(id).is_none() {
            return false;
        }
        for contact in self.contacts.rows.values_mut() {
            contact.tags.retain(|t| t.id != id);
        }
        true
    }

    fn find_or_create_tag(&mut self, name: &str) -> Tag {
        if let Some(tag) = self.tags.values().find(|t| t.name == name).cloned() {
            return tag;
        }
        self.create_tag(name)
    }

    pub fn create_gender(&mut self, name: &str) -> Gender {
        let now = Utc::now();
        self.genders
            .insert(|id| Gender {
                id,
                object: "gender",
                name: name.to_string(),
                account: ACCOUNT,
                created_at: now,
                updated_at: None,
            })
            .clone()
    }

    pub fn rename_gender(&mut self, id: u64, name: &str) -> Option<Gender> {
        let gender = self.genders.get_mut(id)?;
        gender.name = name.to_string();
        gender.updated_at = Some(Utc::now());
        Some(gender.clone())
    }

    fn validate_contact(&self, input: &ContactInput) -> Result<String, MockError> {
        if input.first_name.trim().is_empty() {
            return Err(MockError::Invalid("The first name field is required.".into()));
        }
        self.genders
            .get(input.gender_id)
            .map(|g| g.name.clone())
            .ok_or_else(|| MockError::Invalid("The selected gender id is invalid.".into()))
    }

    pub fn create_contact(&mut self, input: ContactInput) -> Result<Contact, MockError> {
        let gender = self.validate_contact(&input)?;
        let now = Utc::now();
        let hash = Uuid::new_v4().simple().to_string();
        let contact = self.contacts.insert(|id| {
            let mut contact = Contact {
                id,
                object: "contact",
                hash_id: format!("h:{}", &hash[..18]),
                account: ACCOUNT,
                created_at: now,
                ..Contact::default()
            };
            apply_contact_input(&mut contact, input, gender, now);
            contact
        });
        Ok(contact.clone())
    }

    pub fn update_contact(&mut self, id: u64, input: ContactInput) -> Result<Contact, MockError> {
        if self.contacts.get(id).is_none() {
            return Err(MockError::NotFound);
        }
        let gender = self.validate_contact(&input)?;
        let contact = self.contacts.get_mut(id).ok_or(MockError::NotFound)?;
        apply_contact_input(contact, input, gender, Utc::now());
        Ok(contact.clone())
    }

    pub fn update_career(&mut self, id: u64, input: CareerInput) -> Option<Contact> {
        let contact = self.contacts.get_mut(id)?;
        let career = &mut contact.information.career;
        if input.job.is_some() {
            career.job = input.job;
        }
        if input.company.is_some() {
            career.company = input.company;
        }
        contact.updated_at = Utc::now();
        Some(contact.clone())
    }

    /// Attach tags by name, creating missing ones.
    pub fn set_tags(&mut self, id: u64, names: &[String]) -> Option<Contact> {
        self.contacts.get(id)?;
        let tags: Vec<Tag> = names
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .map(|n| self.find_or_create_tag(n))
            .collect();
        let contact = self.contacts.get_mut(id)?;
        for tag in tags {
            if !contact.tags.iter().any(|t| t.id == tag.id) {
                contact.tags.push(tag);
            }
        }
        contact.updated_at = Utc::now();
        Some(contact.clone())
    }

    pub fn delete_contact(&mut self, id: u64) -> bool {
        if self.contacts.remove(id).is_none() {
            return false;
        }
        self.fields.rows.retain(|_, f| f.contact_id != id);
        true
    }

    fn validate_field(&self, input: &ContactFieldInput) -> Result<(), MockError> {
        if self.field_types.get(input.contact_field_type_id).is_none() {
            return Err(MockError::Invalid("The selected contact field type id is invalid.".into()));
        }
        if self.contacts.get(input.contact_id).is_none() {
            return Err(MockError::Invalid("The selected contact id is invalid.".into()));
        }
        if input.data.is_empty() || input.data.chars().count() > 255 {
            return Err(MockError::Invalid("The data must be between 1 and 255 characters.".into()));
        }
        Ok(())
    }

    pub fn create_field(&mut self, input: ContactFieldInput) -> Result<u64, MockError> {
        self.validate_field(&input)?;
        let now = Utc::now();
        let field = self.fields.insert(|id| ContactField {
            id,
            contact_id: input.contact_id,
            contact_field_type_id: input.contact_field_type_id,
            data: input.data,
            created_at: now,
            updated_at: now,
        });
        Ok(field.id)
    }

    pub fn update_field(&mut self, id: u64, input: ContactFieldInput) -> Result<(), MockError> {
        if self.fields.get(id).is_none() {
            return Err(MockError::NotFound);
        }
        self.validate_field(&input)?;
        let field = self.fields.get_mut(id).ok_or(MockError::NotFound)?;
        field.contact_id = input.contact_id;
        field.contact_field_type_id = input.contact_field_type_id;
        field.data = input.data;
        field.updated_at = Utc::now();
        Ok(())
    }

    fn field_view<'a>(&'a self, field: &'a ContactField) -> Option<ContactFieldView<'a>> {
        Some(ContactFieldView {
            id: field.id,
            object: "contactfield",
            data: &field.data,
            contact_field_type: self.field_types.get(field.contact_field_type_id)?,
            account: ACCOUNT,
            contact: self.contacts.get(field.contact_id)?,
            created_at: field.created_at,
            updated_at: field.updated_at,
        })
    }
}

fn apply_contact_input(contact: &mut Contact, input: ContactInput, gender: String, now: DateTime<Utc>) {
    contact.first_name = input.first_name;
    contact.last_name = input.last_name;
    contact.nickname = input.nickname;
    contact.gender = Some(gender);
    contact.gender_id = input.gender_id;
    contact.description = input.description;
    contact.is_birthdate_known = input.is_birthdate_known;
    contact.birthdate_day = input.birthdate_day;
    contact.birthdate_month = input.birthdate_month;
    contact.birthdate_year = input.birthdate_year;
    contact.birthdate_is_age_based = input.birthdate_is_age_based;
    contact.birthdate_age = input.birthdate_age;
    contact.is_partial = input.is_partial;
    contact.is_deceased = input.is_deceased;
    contact.is_deceased_date_known = input.is_deceased_date_known;
    contact.deceased_date_day = input.deceased_date_day;
    contact.deceased_date_month = input.deceased_date_month;
    contact.deceased_date_year = input.deceased_date_year;
    contact.deceased_date_is_age_based = input.deceased_date_is_age_based;
    contact.updated_at = now;
}

// --- router ---

struct RateWindow {
    started: Instant,
    used: u64,
}

#[derive(Clone)]
pub struct AppState {
    db: Arc<RwLock<Store>>,
    config: Arc<MockConfig>,
    window: Arc<Mutex<RateWindow>>,
}

impl AppState {
    pub fn new(config: MockConfig) -> Self {
        Self {
            db: Arc::new(RwLock::new(Store::seeded())),
            config: Arc::new(config),
            window: Arc::new(Mutex::new(RateWindow {
                started: Instant::now(),
                used: 0,
            })),
        }
    }
}

pub fn app() -> Router {
    app_with(MockConfig::default())
}

pub fn app_with(config: MockConfig) -> Router {
    let state = AppState::new(config);
    let api = Router::new()
        .route("/tags", get(list_tags).post(create_tag))
        .route("/tags/{id}", get(get_tag).put(update_tag).delete(delete_tag))
        .route("/genders", get(list_genders).post(create_gender))
        .route("/genders/{id}", get(get_gender).put(update_gender).delete(delete_gender))
        .route("/countries", get(list_countries))
        .route("/contactfieldtypes", get(list_field_types))
        .route("/contactfieldtypes/{id}", get(get_field_type))
        .route("/contacts", get(list_contacts).post(create_contact))
        .route("/contacts/{id}", get(get_contact).put(update_contact).delete(delete_contact))
        .route("/contacts/{id}/work", put(update_career))
        .route("/contacts/{id}/setTags", post(set_tags))
        .route("/contacts/{id}/contactfields", get(list_contact_fields))
        .route("/contactfields", post(create_field))
        .route("/contactfields/{id}", get(get_field).put(update_field).delete(delete_field))
        .route_layer(middleware::from_fn_with_state(state.clone(), guard));
    Router::new().nest("/api", api).with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, MockConfig::default()).await
}

pub async fn run_with(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

/// Bearer check followed by the per-minute rate limit. Every authenticated
/// response carries the rate headers.
async fn guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let expected = format!("Bearer {}", state.config.access_token);
    let presented = req.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    if presented != Some(expected.as_str()) {
        debug!(uri = %req.uri(), "rejecting unauthenticated request");
        return MockError::Unauthenticated.into_response();
    }

    let limit = state.config.rate_limit;
    let (remaining, retry_after) = {
        let mut window = state.window.lock().await;
        let now = Instant::now();
        if now.duration_since(window.started) >= RATE_WINDOW {
            window.started = now;
            window.used = 0;
        }
        window.used += 1;
        let wait = RATE_WINDOW.saturating_sub(now.duration_since(window.started));
        (limit.saturating_sub(window.used), (window.used > limit).then_some(wait))
    };

    let mut resp = match retry_after {
        Some(wait) => {
            debug!(uri = %req.uri(), "rate limit exhausted");
            let mut resp = (StatusCode::TOO_MANY_REQUESTS, "Too Many Attempts.").into_response();
            resp.headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(wait.as_secs().max(1)));
            resp
        }
        None => next.run(req).await,
    };
    let headers = resp.headers_mut();
    headers.insert("x-ratelimit-limit", HeaderValue::from(limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));
    resp
}

fn data<T: Serialize + ?Sized>(value: &T) -> Json<Value> {
    Json(json!({ "data": value }))
}

fn created<T: Serialize + ?Sized>(value: &T) -> (StatusCode, Json<Value>) {
    (StatusCode::CREATED, data(value))
}

fn deleted(id: u64) -> Json<Value> {
    Json(json!({ "deleted": true, "id": id }))
}

fn required_name(input: NameInput) -> Result<String, MockError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(MockError::Invalid("The name field is required.".into()));
    }
    Ok(name.to_string())
}

/// Slice `items` into the requested page and wrap it with Laravel-style
/// pagination meta.
pub fn paginate<T: Serialize>(items: Vec<T>, params: &ListParams, path: &str) -> Result<Json<Value>, MockError> {
    let per_page = params.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_PER_PAGE);
    if per_page > MAX_PER_PAGE {
        return Err(MockError::Invalid("The limit parameter is too big".into()));
    }
    let current_page = params.page.filter(|p| *p > 0).unwrap_or(1);
    let total = items.len();
    let per = per_page as usize;
    let last_page = total.div_ceil(per).max(1);
    let start = (current_page as usize - 1).saturating_mul(per);
    let page: Vec<T> = items.into_iter().skip(start).take(per).collect();
    let (from, to) = match page.len() {
        0 => (None, None),
        n => (Some(start + 1), Some(start + n)),
    };
    Ok(Json(json!({
        "data": page,
        "meta": {
            "current_page": current_page,
            "from": from,
            "last_page": last_page,
            "path": path,
            "per_page": per_page,
            "to": to,
            "total": total,
        }
    })))
}

// --- tags ---

async fn list_tags(State(state): State<AppState>, Query(params): Query<ListParams>) -> Result<Json<Value>, MockError> {
    let db = state.db.read().await;
    paginate(db.tags.values().cloned().collect(), &params, "/api/tags")
}

async fn get_tag(State(state): State<AppState>, Path(id): Path<u64>) -> Result<Json<Value>, MockError> {
    let db = state.db.read().await;
    db.tags.get(id).map(data).ok_or(MockError::NotFound)
}

async fn create_tag(
    State(state): State<AppState>,
    Json(input): Json<NameInput>,
) -> Result<(StatusCode, Json<Value>), MockError> {
    let name = required_name(input)?;
    let tag = state.db.write().await.create_tag(&name);
    Ok(created(&tag))
}

async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<NameInput>,
) -> Result<Json<Value>, MockError> {
    let name = required_name(input)?;
    let tag = state.db.write().await.rename_tag(id, &name);
    tag.as_ref().map(data).ok_or(MockError::NotFound)
}

async fn delete_tag(State(state): State<AppState>, Path(id): Path<u64>) -> Result<Json<Value>, MockError> {
    match state.db.write().await.delete_tag(id) {
        true => Ok(deleted(id)),
        false => Err(MockError::NotFound),
    }
}

// --- genders ---

async fn list_genders(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, MockError> {
    let db = state.db.read().await;
    paginate(db.genders.values().cloned().collect(), &params, "/api/genders")
}

async fn get_gender(State(state): State<AppState>, Path(id): Path<u64>) -> Result<Json<Value>, MockError> {
    let db = state.db.read().await;
    db.genders.get(id).map(data).ok_or(MockError::NotFound)
}

async fn create_gender(
    State(state): State<AppState>,
    Json(input): Json<NameInput>,
) -> Result<(StatusCode, Json<Value>), MockError> {
    let name = required_name(input)?;
    let gender = state.db.write().await.create_gender(&name);
    Ok(created(&gender))
}

async fn update_gender(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<NameInput>,
) -> Result<Json<Value>, MockError> {
    let name = required_name(input)?;
    let gender = state.db.write().await.rename_gender(id, &name);
    gender.as_ref().map(data).ok_or(MockError::NotFound)
}

async fn delete_gender(State(state): State<AppState>, Path(id): Path<u64>) -> Result<Json<Value>, MockError> {
    match state.db.write().await.genders.remove(id) {
        Some(_) => Ok(deleted(id)),
        None => Err(MockError::NotFound),
    }
}

// --- reference data ---

async fn list_countries(State(state): State<AppState>) -> Json<Value> {
    let db = state.db.read().await;
    data(&db.countries)
}

async fn list_field_types(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, MockError> {
    let db = state.db.read().await;
    paginate(db.field_types.values().cloned().collect(), &params, "/api/contactfieldtypes")
}

async fn get_field_type(State(state): State<AppState>, Path(id): Path<u64>) -> Result<Json<Value>, MockError> {
    let db = state.db.read().await;
    db.field_types.get(id).map(data).ok_or(MockError::NotFound)
}

// --- contacts ---

async fn list_contacts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, MockError> {
    let db = state.db.read().await;
    let needle = params.query.as_deref().unwrap_or("").to_lowercase();
    let matches = |c: &&Contact| {
        needle.is_empty()
            || [Some(&c.first_name), c.last_name.as_ref(), c.nickname.as_ref()]
                .into_iter()
                .flatten()
                .any(|s| s.to_lowercase().contains(&needle))
    };
    paginate(db.contacts.values().filter(matches).cloned().collect(), &params, "/api/contacts")
}

async fn get_contact(State(state): State<AppState>, Path(id): Path<u64>) -> Result<Json<Value>, MockError> {
    let db = state.db.read().await;
    db.contacts.get(id).map(data).ok_or(MockError::NotFound)
}

async fn create_contact(
    State(state): State<AppState>,
    Json(input): Json<ContactInput>,
) -> Result<(StatusCode, Json<Value>), MockError> {
    let contact = state.db.write().await.create_contact(input)?;
    Ok(created(&contact))
}

async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<ContactInput>,
) -> Result<Json<Value>, MockError> {
    let contact = state.db.write().await.update_contact(id, input)?;
    Ok(data(&contact))
}

async fn delete_contact(State(state): State<AppState>, Path(id): Path<u64>) -> Result<Json<Value>, MockError> {
    match state.db.write().await.delete_contact(id) {
        true => Ok(deleted(id)),
        false => Err(MockError::NotFound),
    }
}

async fn update_career(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<CareerInput>,
) -> Result<Json<Value>, MockError> {
    let contact = state.db.write().await.update_career(id, input);
    contact.as_ref().map(data).ok_or(MockError::NotFound)
}

async fn set_tags(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<SetTagsInput>,
) -> Result<Json<Value>, MockError> {
    let contact = state.db.write().await.set_tags(id, &input.tags);
    contact.as_ref().map(data).ok_or(MockError::NotFound)
}

// --- contact fields ---

async fn list_contact_fields(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, MockError> {
    let db = state.db.read().await;
    db.contacts.get(id).ok_or(MockError::NotFound)?;
    let views: Vec<ContactFieldView<'_>> = db
        .fields
        .values()
        .filter(|f| f.contact_id == id)
        .filter_map(|f| db.field_view(f))
        .collect();
    paginate(views, &params, &format!("/api/contacts/{id}/contactfields"))
}

async fn get_field(State(state): State<AppState>, Path(id): Path<u64>) -> Result<Json<Value>, MockError> {
    let db = state.db.read().await;
    let field = db.fields.get(id).ok_or(MockError::NotFound)?;
    let view = db.field_view(field).ok_or(MockError::NotFound)?;
    Ok(data(&view))
}

async fn create_field(
    State(state): State<AppState>,
    Json(input): Json<ContactFieldInput>,
) -> Result<(StatusCode, Json<Value>), MockError> {
    let mut db = state.db.write().await;
    let id = db.create_field(input)?;
    let field = db.fields.get(id).ok_or(MockError::NotFound)?;
    let view = db.field_view(field).ok_or(MockError::NotFound)?;
    Ok(created(&view))
}

async fn update_field(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<ContactFieldInput>,
) -> Result<Json<Value>, MockError> {
    let mut db = state.db.write().await;
    db.update_field(id, input)?;
    let field = db.fields.get(id).ok_or(MockError::NotFound)?;
    let view = db.field_view(field).ok_or(MockError::NotFound)?;
    Ok(data(&view))
}

async fn delete_field(State(state): State<AppState>, Path(id): Path<u64>) -> Result<Json<Value>, MockError> {
    match state.db.write().await.fields.remove(id) {
        Some(_) => Ok(deleted(id)),
        None => Err(MockError::NotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact_input(first_name: &str, gender_id: u64) -> ContactInput {
        ContactInput {
            first_name: first_name.to_string(),
            gender_id,
            ..ContactInput::default()
        }
    }

    #[test]
    fn slugify_lowercases_and_joins_words() {
        assert_eq!(slugify("  Old  Friends "), "old-friends");
        assert_eq!(slugify("work"), "work");
    }

    #[test]
    fn seeded_store_has_reference_data() {
        let store = Store::seeded();
        assert_eq!(store.genders.len(), 3);
        assert_eq!(store.field_types.len(), 4);
        assert_eq!(store.countries["FR"].iso, "fr");
        assert!(store.contacts.is_empty());
    }

    #[test]
    fn timestamps_use_per_resource_encodings() {
        let mut store = Store::seeded();
        let tag = serde_json::to_value(store.create_tag("work")).unwrap();
        assert!(tag["created_at"].as_str().unwrap().ends_with('Z'));

        let gender = serde_json::to_value(store.genders.get(1).unwrap()).unwrap();
        assert!(gender["created_at"].is_i64());
        assert!(gender["updated_at"].is_null());

        let contact = store.create_contact(contact_input("Ada", 2)).unwrap();
        let id = store
            .create_field(ContactFieldInput {
                contact_field_type_id: 1,
                contact_id: contact.id,
                data: "ada@example.com".into(),
            })
            .unwrap();
        let field = store.fields.get(id).unwrap();
        let view = serde_json::to_value(store.field_view(field).unwrap()).unwrap();
        let millis = view["created_at"].as_i64().unwrap();
        assert_eq!(millis, field.created_at.timestamp_millis());
        assert_eq!(view["contact_field_type"]["type"], "email");
    }

    #[test]
    fn contact_validation() {
        let mut store = Store::seeded();
        assert!(matches!(store.create_contact(contact_input("", 1)), Err(MockError::Invalid(_))));
        assert!(matches!(store.create_contact(contact_input("Ada", 99)), Err(MockError::Invalid(_))));
        assert_eq!(store.update_contact(7, contact_input("Ada", 1)).unwrap_err(), MockError::NotFound);

        let contact = store.create_contact(contact_input("Ada", 2)).unwrap();
        assert_eq!(contact.gender.as_deref(), Some("Woman"));
        assert!(contact.hash_id.starts_with("h:"));
    }

    #[test]
    fn set_tags_reuses_and_creates() {
        let mut store = Store::seeded();
        let existing = store.create_tag("family");
        let contact = store.create_contact(contact_input("Ada", 1)).unwrap();
        let names = ["family".to_string(), "math".to_string(), " ".to_string(), "family".to_string()];
        let contact = store.set_tags(contact.id, &names).unwrap();
        assert_eq!(contact.tags.len(), 2);
        assert_eq!(contact.tags[0].id, existing.id);
        assert_eq!(store.tags.len(), 2);

        store.rename_tag(existing.id, "Close Family").unwrap();
        assert_eq!(store.contacts.get(contact.id).unwrap().tags[0].name_slug, "close-family");
        assert!(store.delete_tag(existing.id));
        assert_eq!(store.contacts.get(contact.id).unwrap().tags.len(), 1);
    }

    #[test]
    fn deleting_a_contact_removes_its_fields() {
        let mut store = Store::seeded();
        let contact = store.create_contact(contact_input("Ada", 1)).unwrap();
        store
            .create_field(ContactFieldInput {
                contact_field_type_id: 2,
                contact_id: contact.id,
                data: "555-0100".into(),
            })
            .unwrap();
        assert!(store.delete_contact(contact.id));
        assert!(store.fields.is_empty());
    }

    #[test]
    fn field_data_length_is_bounded() {
        let mut store = Store::seeded();
        let contact = store.create_contact(contact_input("Ada", 1)).unwrap();
        let input = ContactFieldInput {
            contact_field_type_id: 1,
            contact_id: contact.id,
            data: "x".repeat(256),
        };
        assert!(matches!(store.create_field(input), Err(MockError::Invalid(_))));
    }

    #[test]
    fn paginate_computes_meta() {
        let params = ListParams {
            page: Some(2),
            limit: Some(2),
            query: None,
        };
        let Json(body) = paginate((1..=5).collect::<Vec<u32>>(), &params, "/api/tags").unwrap();
        assert_eq!(body["data"], json!([3, 4]));
        assert_eq!(body["meta"]["from"], 3);
        assert_eq!(body["meta"]["to"], 4);
        assert_eq!(body["meta"]["last_page"], 3);
        assert_eq!(body["meta"]["total"], 5);

        let past_end = ListParams {
            page: Some(9),
            ..ListParams::default()
        };
        let Json(body) = paginate(vec![1u32], &past_end, "/api/tags").unwrap();
        assert_eq!(body["data"], json!([]));
        assert!(body["meta"]["from"].is_null());

        let too_big = ListParams {
            limit: Some(MAX_PER_PAGE + 1),
            ..ListParams::default()
        };
        assert!(paginate(Vec::<u32>::new(), &too_big, "/api/tags").is_err());
    }
}
