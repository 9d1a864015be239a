//! Single binary web server: HTML from templates/, static from /static, API via REST.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default so the app is reachable via DNS on a VPS.
//! Override with env: HOST, PORT, DATA_DIR, SESSION_TTL_HOURS, PUBLIC_BASE_URL, PXL_API_KEY.

use actix_files::Files;
use actix_session::{storage::CookieSessionStore, Session as CookieSession, SessionMiddleware};
use actix_web::{
    cookie::Key,
    delete, get, post, put,
    web::{self, Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use court_rotation_web::{
    config::ServerConfig,
    court_fee_split, decrease_point, end_match, fill_teams_from_queue, history_rows, leaderboard,
    move_player, present_player_ids, reorder_queue, reset_match, rotate_queue, score_point,
    shorten::Shortener,
    start_match,
    store::{FileStore, KeyValueStore, MemoryStore},
    total_matches, write_leaderboard_csv, Location, MatchPhase, PlayerId, Session, SessionError,
    SessionService, Team,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Identifier of one hosted session (one court / group).
type SessionId = Uuid;

type BoxedStore = Box<dyn KeyValueStore + Send + Sync>;

/// Per-session entry: the owning service + last activity time (for auto-cleanup).
struct SessionEntry {
    service: SessionService<BoxedStore>,
    last_activity: Instant,
}

/// In-memory state: many sessions by ID. Entries are dropped after the configured inactivity.
type AppState = Data<RwLock<HashMap<SessionId, SessionEntry>>>;

/// Cookie key remembering the caller's current session.
const COOKIE_SESSION_ID: &str = "session_id";

fn store_key(id: SessionId) -> String {
    format!("session-{}", id)
}

/// Store for one session: a file in DATA_DIR when configured, memory otherwise.
fn open_store(config: &ServerConfig) -> BoxedStore {
    if let Some(dir) = &config.data_dir {
        match FileStore::open(dir) {
            Ok(store) => return Box::new(store),
            Err(e) => log::warn!("DATA_DIR {:?} unusable, keeping sessions in memory: {}", dir, e),
        }
    }
    Box::new(MemoryStore::new())
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

/// Session as the client sees it: full state plus the derived match view.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionView<'a> {
    id: SessionId,
    #[serde(flatten)]
    session: &'a Session,
    phase: MatchPhase,
    /// Winner under the current score; the client ends the match when set.
    winner: Option<Team>,
}

fn view_response(id: SessionId, session: &Session) -> HttpResponse {
    HttpResponse::Ok().json(SessionView {
        id,
        session,
        phase: session.match_state.phase(),
        winner: session.match_state.winner(),
    })
}

fn error_response(e: SessionError) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() }))
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": "No session" }))
}

#[derive(Deserialize)]
struct PlayerNameBody {
    name: String,
}

#[derive(Deserialize)]
struct TeamBody {
    team: Team,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MovePlayerBody {
    source: Location,
    target: Location,
    player_id: PlayerId,
}

#[derive(Deserialize)]
struct QueueOrderBody {
    order: Vec<PlayerId>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsBody {
    pix_key: Option<String>,
    court_value: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeeSplitBody {
    /// Defaults to every present player.
    player_ids: Option<Vec<PlayerId>>,
}

#[derive(Deserialize)]
struct ImportBody {
    /// Share link, hash fragment or bare token.
    link: String,
}

#[derive(Deserialize)]
struct ShortenBody {
    url: String,
}

/// Path segment: session id (e.g. /api/sessions/{id})
#[derive(Deserialize)]
struct SessionPath {
    id: SessionId,
}

/// Path segments: session id and player id (e.g. /api/sessions/{id}/players/{player_id})
#[derive(Deserialize)]
struct SessionPlayerPath {
    id: SessionId,
    player_id: PlayerId,
}

/// Find a session (loading it from the file store after a restart), refresh its activity
/// and run `f` on it.
fn with_entry<F>(state: &AppState, config: &ServerConfig, id: SessionId, f: F) -> HttpResponse
where
    F: FnOnce(&mut SessionEntry) -> HttpResponse,
{
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    if !g.contains_key(&id) {
        let store = open_store(config);
        match store.get(&store_key(id)) {
            Ok(Some(_)) => {
                log::info!("Restored session {} from storage", id);
                g.insert(
                    id,
                    SessionEntry {
                        service: SessionService::open(store, store_key(id)),
                        last_activity: Instant::now(),
                    },
                );
            }
            _ => return not_found(),
        }
    }
    match g.get_mut(&id) {
        Some(entry) => {
            entry.last_activity = Instant::now();
            f(entry)
        }
        None => not_found(),
    }
}

/// Run one session transition and answer with the resulting state.
fn transition<F>(state: &AppState, config: &ServerConfig, id: SessionId, op: F) -> HttpResponse
where
    F: FnOnce(&mut SessionService<BoxedStore>) -> Result<(), SessionError>,
{
    with_entry(state, config, id, |entry| match op(&mut entry.service) {
        Ok(()) => view_response(id, entry.service.session()),
        Err(e) => error_response(e),
    })
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "court-rotation-web",
    })
}

/// Avoid 404 in browser tab: favicon not required for app logic.
#[get("/favicon.ico")]
async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// Create a new session and remember it in the caller's cookie.
#[post("/api/sessions")]
async fn api_create_session(
    state: AppState,
    config: Data<ServerConfig>,
    cookie: CookieSession,
) -> HttpResponse {
    let id = Uuid::new_v4();
    let service = SessionService::open(open_store(&config), store_key(id));
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    if let Err(e) = cookie.insert(COOKIE_SESSION_ID, id) {
        log::warn!("could not set session cookie: {}", e);
    }
    let response = view_response(id, service.session());
    g.insert(
        id,
        SessionEntry {
            service,
            last_activity: Instant::now(),
        },
    );
    log::info!("Created session {}", id);
    response
}

/// The session remembered in the caller's cookie (404 if none).
#[get("/api/sessions/current")]
async fn api_current_session(
    state: AppState,
    config: Data<ServerConfig>,
    cookie: CookieSession,
) -> HttpResponse {
    match cookie.get::<SessionId>(COOKIE_SESSION_ID) {
        Ok(Some(id)) => with_entry(&state, &config, id, |entry| {
            view_response(id, entry.service.session())
        }),
        _ => not_found(),
    }
}

/// Get a session by id (404 if not found). Touching it refreshes last_activity.
#[get("/api/sessions/{id}")]
async fn api_get_session(
    state: AppState,
    config: Data<ServerConfig>,
    path: Path<SessionPath>,
    cookie: CookieSession,
) -> HttpResponse {
    let id = path.id;
    let response = with_entry(&state, &config, id, |entry| {
        view_response(id, entry.service.session())
    });
    if response.status().is_success() {
        if let Err(e) = cookie.insert(COOKIE_SESSION_ID, id) {
            log::warn!("could not set session cookie: {}", e);
        }
    }
    response
}

/// Drop a session from memory and storage.
#[delete("/api/sessions/{id}")]
async fn api_delete_session(
    state: AppState,
    config: Data<ServerConfig>,
    path: Path<SessionPath>,
    cookie: CookieSession,
) -> HttpResponse {
    let id = path.id;
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let removed = match g.remove(&id) {
        Some(mut entry) => entry.service.delete_saved(),
        None => {
            let mut store = open_store(&config);
            store.remove(&store_key(id))
        }
    };
    if let Err(e) = removed {
        log::warn!("could not delete stored session {}: {}", id, e);
    }
    if let Ok(Some(current)) = cookie.get::<SessionId>(COOKIE_SESSION_ID) {
        if current == id {
            cookie.remove(COOKIE_SESSION_ID);
        }
    }
    log::info!("Deleted session {}", id);
    HttpResponse::NoContent().finish()
}

/// Add a player (joins the back of the queue).
#[post("/api/sessions/{id}/players")]
async fn api_add_player(
    state: AppState,
    config: Data<ServerConfig>,
    path: Path<SessionPath>,
    body: Json<PlayerNameBody>,
) -> HttpResponse {
    transition(&state, &config, path.id, |svc| {
        svc.apply(|s| s.add_player(body.name.as_str())).map(|_| ())
    })
}

/// Rename a player.
#[put("/api/sessions/{id}/players/{player_id}")]
async fn api_edit_player(
    state: AppState,
    config: Data<ServerConfig>,
    path: Path<SessionPlayerPath>,
    body: Json<PlayerNameBody>,
) -> HttpResponse {
    let player_id = path.player_id;
    transition(&state, &config, path.id, |svc| {
        svc.apply(|s| s.edit_player_name(player_id, body.name.as_str()))
    })
}

/// Remove a player from the roster, queue and teams.
#[delete("/api/sessions/{id}/players/{player_id}")]
async fn api_delete_player(
    state: AppState,
    config: Data<ServerConfig>,
    path: Path<SessionPlayerPath>,
) -> HttpResponse {
    let player_id = path.player_id;
    transition(&state, &config, path.id, |svc| {
        svc.apply(|s| s.delete_player(player_id))
    })
}

/// Toggle whether a player is at the court.
#[post("/api/sessions/{id}/players/{player_id}/presence")]
async fn api_toggle_presence(
    state: AppState,
    config: Data<ServerConfig>,
    path: Path<SessionPlayerPath>,
) -> HttpResponse {
    let player_id = path.player_id;
    transition(&state, &config, path.id, |svc| {
        svc.apply(|s| s.toggle_presence(player_id))
    })
}

/// Seat the front 8 of the queue.
#[post("/api/sessions/{id}/teams/fill")]
async fn api_fill_teams(
    state: AppState,
    config: Data<ServerConfig>,
    path: Path<SessionPath>,
) -> HttpResponse {
    transition(&state, &config, path.id, |svc| svc.apply(fill_teams_from_queue))
}

/// Randomly redraw both teams.
#[post("/api/sessions/{id}/teams/shuffle")]
async fn api_shuffle_teams(
    state: AppState,
    config: Data<ServerConfig>,
    path: Path<SessionPath>,
) -> HttpResponse {
    transition(&state, &config, path.id, |svc| svc.shuffle_teams())
}

/// Team A stays, next 4 from the queue replace team B.
#[post("/api/sessions/{id}/teams/rotate")]
async fn api_rotate_queue(
    state: AppState,
    config: Data<ServerConfig>,
    path: Path<SessionPath>,
) -> HttpResponse {
    transition(&state, &config, path.id, |svc| svc.apply(rotate_queue))
}

/// Drag a player between queue and teams.
#[post("/api/sessions/{id}/teams/move")]
async fn api_move_player(
    state: AppState,
    config: Data<ServerConfig>,
    path: Path<SessionPath>,
    body: Json<MovePlayerBody>,
) -> HttpResponse {
    transition(&state, &config, path.id, |svc| {
        svc.apply(|s| move_player(s, body.source, body.target, body.player_id))
    })
}

/// Reorder the waiting queue.
#[put("/api/sessions/{id}/queue")]
async fn api_reorder_queue(
    state: AppState,
    config: Data<ServerConfig>,
    path: Path<SessionPath>,
    body: Json<QueueOrderBody>,
) -> HttpResponse {
    let order = body.into_inner().order;
    transition(&state, &config, path.id, |svc| {
        svc.apply(|s| reorder_queue(s, order))
    })
}

/// Start a match (fills teams from the queue if they are not already full).
#[post("/api/sessions/{id}/match/start")]
async fn api_start_match(
    state: AppState,
    config: Data<ServerConfig>,
    path: Path<SessionPath>,
) -> HttpResponse {
    transition(&state, &config, path.id, |svc| svc.apply(start_match))
}

#[post("/api/sessions/{id}/match/score")]
async fn api_score_point(
    state: AppState,
    config: Data<ServerConfig>,
    path: Path<SessionPath>,
    body: Json<TeamBody>,
) -> HttpResponse {
    let team = body.team;
    transition(&state, &config, path.id, |svc| {
        svc.apply(|s| score_point(s, team))
    })
}

#[post("/api/sessions/{id}/match/decrease")]
async fn api_decrease_point(
    state: AppState,
    config: Data<ServerConfig>,
    path: Path<SessionPath>,
    body: Json<TeamBody>,
) -> HttpResponse {
    let team = body.team;
    transition(&state, &config, path.id, |svc| {
        svc.apply(|s| decrease_point(s, team))
    })
}

/// End the match with the given winner: stats, history, rotation.
#[post("/api/sessions/{id}/match/end")]
async fn api_end_match(
    state: AppState,
    config: Data<ServerConfig>,
    path: Path<SessionPath>,
    body: Json<TeamBody>,
) -> HttpResponse {
    let team = body.team;
    transition(&state, &config, path.id, |svc| {
        svc.apply(|s| end_match(s, team))
    })
}

/// Abandon the running match without recording it.
#[post("/api/sessions/{id}/match/reset")]
async fn api_reset_match(
    state: AppState,
    config: Data<ServerConfig>,
    path: Path<SessionPath>,
) -> HttpResponse {
    transition(&state, &config, path.id, |svc| svc.apply(reset_match))
}

/// Leaderboard and named history.
#[get("/api/sessions/{id}/stats")]
async fn api_stats(
    state: AppState,
    config: Data<ServerConfig>,
    path: Path<SessionPath>,
) -> HttpResponse {
    with_entry(&state, &config, path.id, |entry| {
        let s = entry.service.session();
        HttpResponse::Ok().json(serde_json::json!({
            "leaderboard": leaderboard(s),
            "history": history_rows(s),
            "totalMatches": total_matches(s),
        }))
    })
}

/// Leaderboard as CSV download.
#[get("/api/sessions/{id}/stats.csv")]
async fn api_stats_csv(
    state: AppState,
    config: Data<ServerConfig>,
    path: Path<SessionPath>,
) -> HttpResponse {
    with_entry(&state, &config, path.id, |entry| {
        let mut buf = Vec::new();
        match write_leaderboard_csv(entry.service.session(), &mut buf) {
            Ok(()) => HttpResponse::Ok()
                .content_type("text/csv; charset=utf-8")
                .body(buf),
            Err(e) => {
                log::warn!("leaderboard CSV failed: {}", e);
                HttpResponse::InternalServerError().body("csv error")
            }
        }
    })
}

/// Update the pix key and/or court value.
#[put("/api/sessions/{id}/settings")]
async fn api_set_settings(
    state: AppState,
    config: Data<ServerConfig>,
    path: Path<SessionPath>,
    body: Json<SettingsBody>,
) -> HttpResponse {
    let body = body.into_inner();
    transition(&state, &config, path.id, |svc| {
        svc.apply(|s| {
            if let Some(value) = body.court_value {
                s.set_court_value(value)?;
            }
            if let Some(key) = body.pix_key {
                s.set_pix_key(key);
            }
            Ok(())
        })
    })
}

/// Split the court value between the selected (default: present) players.
#[post("/api/sessions/{id}/fee-split")]
async fn api_fee_split(
    state: AppState,
    config: Data<ServerConfig>,
    path: Path<SessionPath>,
    body: Option<Json<FeeSplitBody>>,
) -> HttpResponse {
    let selected = body.and_then(|b| b.into_inner().player_ids);
    with_entry(&state, &config, path.id, |entry| {
        let s = entry.service.session();
        let selected = selected.unwrap_or_else(|| present_player_ids(s));
        match court_fee_split(s, &selected) {
            Some(split) => HttpResponse::Ok().json(split),
            None => HttpResponse::BadRequest()
                .json(serde_json::json!({ "error": "Set a court value and select players" })),
        }
    })
}

/// Share link carrying the whole session state.
#[get("/api/sessions/{id}/share")]
async fn api_share_link(
    state: AppState,
    config: Data<ServerConfig>,
    path: Path<SessionPath>,
) -> HttpResponse {
    let base = config.public_base_url.clone();
    with_entry(&state, &config, path.id, |entry| {
        match entry.service.share_link(&base) {
            Some(link) => HttpResponse::Ok().json(serde_json::json!({ "link": link })),
            None => HttpResponse::InternalServerError().body("share error"),
        }
    })
}

/// Stage shared state for import and return a preview. Nothing changes until confirmed.
#[post("/api/sessions/{id}/import")]
async fn api_stage_import(
    state: AppState,
    config: Data<ServerConfig>,
    path: Path<SessionPath>,
    body: Json<ImportBody>,
) -> HttpResponse {
    with_entry(&state, &config, path.id, |entry| {
        match entry.service.stage_import(&body.link) {
            Some(preview) => HttpResponse::Ok().json(serde_json::json!({
                "players": preview.players.len(),
                "matches": preview.history.len(),
                "state": preview,
            })),
            None => HttpResponse::BadRequest()
                .json(serde_json::json!({ "error": "Nothing to import from this link" })),
        }
    })
}

/// Replace this session with the staged shared state.
#[post("/api/sessions/{id}/import/confirm")]
async fn api_confirm_import(
    state: AppState,
    config: Data<ServerConfig>,
    path: Path<SessionPath>,
) -> HttpResponse {
    transition(&state, &config, path.id, |svc| svc.confirm_import())
}

/// Drop the staged shared state.
#[post("/api/sessions/{id}/import/cancel")]
async fn api_cancel_import(
    state: AppState,
    config: Data<ServerConfig>,
    path: Path<SessionPath>,
) -> HttpResponse {
    let id = path.id;
    with_entry(&state, &config, id, |entry| {
        entry.service.cancel_import();
        view_response(id, entry.service.session())
    })
}

/// Shorten a (share) URL; answers with the long URL when no service works.
#[post("/api/shorten")]
async fn api_shorten(shortener: Data<Shortener>, body: Json<ShortenBody>) -> HttpResponse {
    let url = body.url.trim();
    if url.is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({ "error": "URL is required" }));
    }
    let short_url = shortener.shorten(url).await;
    HttpResponse::Ok().json(serde_json::json!({ "shortUrl": short_url }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ServerConfig::from_env();
    let bind = (config.host.clone(), config.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);
    match &config.data_dir {
        Some(dir) => log::info!("Persisting sessions to {:?}", dir),
        None => log::info!("No DATA_DIR set, sessions live in memory only"),
    }

    let state = Data::new(RwLock::new(HashMap::<SessionId, SessionEntry>::new()));
    let shortener = Data::new(Shortener::with_defaults(config.pxl_api_key.clone()));
    let session_ttl = config.session_ttl;
    let config = Data::new(config);
    let cookie_key = Key::generate();

    // Background task: every 30 minutes, drop sessions inactive for longer than the TTL
    let state_cleanup = state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(30 * 60));
        loop {
            interval.tick().await;
            let mut g = match state_cleanup.write() {
                Ok(guard) => guard,
                Err(_) => continue,
            };
            let before = g.len();
            g.retain(|_, entry| entry.last_activity.elapsed() < session_ttl);
            let removed = before - g.len();
            if removed > 0 {
                log::info!("Cleaned up {} inactive session(s)", removed);
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), cookie_key.clone())
                    .cookie_secure(false)
                    .build(),
            )
            .app_data(state.clone())
            .app_data(config.clone())
            .app_data(shortener.clone())
            .route("/", web::get().to(serve_index_async))
            .service(api_health)
            .service(favicon)
            .service(api_shorten)
            .service(api_create_session)
            .service(api_current_session)
            .service(api_get_session)
            .service(api_delete_session)
            .service(api_add_player)
            .service(api_edit_player)
            .service(api_delete_player)
            .service(api_toggle_presence)
            .service(api_fill_teams)
            .service(api_shuffle_teams)
            .service(api_rotate_queue)
            .service(api_move_player)
            .service(api_reorder_queue)
            .service(api_start_match)
            .service(api_score_point)
            .service(api_decrease_point)
            .service(api_end_match)
            .service(api_reset_match)
            .service(api_stats)
            .service(api_stats_csv)
            .service(api_set_settings)
            .service(api_fee_split)
            .service(api_share_link)
            .service(api_stage_import)
            .service(api_confirm_import)
            .service(api_cancel_import)
            .service(Files::new("/static", "static").show_files_listing())
    })
    .bind(bind)?
    .run()
    .await
}

async fn serve_index_async() -> HttpResponse {
    let html = include_str!("../../templates/index.html");
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html)
}
