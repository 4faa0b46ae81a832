use axum::body::Bytes;
use axum::http::StatusCode;
use axum_test::TestServer;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;

use league_server::auth::ensure_super_admin;
use league_server::config::AppConfig;
use league_server::store::MemoryStore;
use league_server::web::{router, AppState};

struct TestApp {
    server: TestServer,
    admin_token: String,
}

async fn spawn_app_with(config: AppConfig) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    ensure_super_admin(store.as_ref(), &config.super_admin)
        .await
        .unwrap();
    let state = AppState::new(store, &config);
    let server = TestServer::new(router(state, &[])).unwrap();
    let admin_token = login(&server, &config.super_admin.name, &config.super_admin.password).await;
    TestApp {
        server,
        admin_token,
    }
}

async fn spawn_app() -> TestApp {
    spawn_app_with(AppConfig::default()).await
}

async fn login(server: &TestServer, username: &str, password: &str) -> String {
    let response = server
        .post("/api/auth/login")
        .json(&json!({ "username": username, "password": password }))
        .await;
    response.assert_status_ok();
    response.json::<Value>()["token"]
        .as_str()
        .unwrap()
        .to_string()
}

fn id_of(body: &Value) -> i64 {
    body["id"].as_i64().unwrap()
}

impl TestApp {
    async fn create(&self, path: &str, body: Value) -> Value {
        let response = self
            .server
            .post(path)
            .authorization_bearer(&self.admin_token)
            .json(&body)
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()
    }

    async fn league(&self, name: &str) -> i64 {
        id_of(&self.create("/api/ligas", json!({ "nombre": name, "tipo": "futbol7" })).await)
    }

    async fn season(&self, league_id: i64) -> i64 {
        id_of(
            &self
                .create(
                    "/api/temporadas",
                    json!({ "ligaId": league_id, "nombre": "Apertura", "anio": 2025 }),
                )
                .await,
        )
    }

    async fn team(&self, season_id: i64, name: &str) -> i64 {
        id_of(
            &self
                .create("/api/equipos", json!({ "temporadaId": season_id, "nombre": name }))
                .await,
        )
    }

    async fn player(&self, team_id: i64, name: &str) -> i64 {
        id_of(
            &self
                .create("/api/jugadoras", json!({ "equipoId": team_id, "nombre": name }))
                .await,
        )
    }

    async fn game(&self, season_id: i64, home: i64, away: i64) -> i64 {
        id_of(
            &self
                .create(
                    "/api/partidos",
                    json!({
                        "temporadaId": season_id,
                        "equipoLocalId": home,
                        "equipoVisitaId": away,
                        "jornada": 1,
                        "fecha": "2025-03-01T16:00:00Z",
                    }),
                )
                .await,
        )
    }

    async fn user(&self, role: &str, league_id: i64, name: &str) -> String {
        self.create(
            "/api/auth/users",
            json!({
                "email": format!("{}@liga.local", name),
                "nombre": name,
                "password": "secreto-123",
                "role": role,
                "ligaId": league_id,
            }),
        )
        .await;
        login(&self.server, name, "secreto-123").await
    }

    async fn table(&self, path: &str, season_id: i64) -> Vec<Value> {
        let response = self
            .server
            .get(path)
            .add_query_param("temporadaId", season_id)
            .await;
        response.assert_status_ok();
        response.json::<Vec<Value>>()
    }
}

#[tokio::test]
async fn test_season_flow_produces_standings_and_scorers() {
    let app = spawn_app().await;
    let league = app.league("Liga Femenil").await;
    let season = app.season(league).await;
    let a = app.team(season, "A").await;
    let b = app.team(season, "B").await;
    app.team(season, "D").await;
    app.team(season, "C").await;
    let p1 = app.player(a, "P1").await;
    let p2 = app.player(b, "P2").await;

    let table = app.table("/api/estadisticas/tabla", season).await;
    let names: Vec<&str> = table.iter().map(|r| r["equipo"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["A", "B", "C", "D"]);
    assert!(table.iter().all(|r| r["pj"] == 0 && r["pts"] == 0));

    let game = app.game(season, a, b).await;
    let response = app
        .server
        .post(&format!("/api/partidos/{}/resultado", game))
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "goles": [
            { "jugadoraId": p1, "minuto": 5 },
            { "jugadoraId": p1, "minuto": 40 },
            { "jugadoraId": p2 },
        ] }))
        .await;
    response.assert_status_ok();
    let played = response.json::<Value>();
    assert_eq!(played["golesLocal"], 2);
    assert_eq!(played["golesVisita"], 1);
    assert_eq!(played["status"], "JUGADO");
    assert_eq!(played["goles"].as_array().unwrap().len(), 3);
    assert_eq!(played["goles"][0]["jugadora"]["nombre"], "P1");

    let table = app.table("/api/estadisticas/tabla", season).await;
    assert_eq!(
        table[0],
        json!({
            "equipoId": a, "equipo": "A", "pj": 1, "pg": 1, "pe": 0, "pp": 0,
            "gf": 2, "gc": 1, "dg": 1, "pts": 3, "posicion": 1,
        })
    );
    assert_eq!(table[3]["equipo"], "B");
    assert_eq!(table[3]["dg"], -1);

    let scorers = app.table("/api/estadisticas/goleo", season).await;
    assert_eq!(
        scorers,
        vec![
            json!({ "jugadoraId": p1, "jugadora": "P1", "equipoId": a, "equipo": "A", "goles": 2, "posicion": 1 }),
            json!({ "jugadoraId": p2, "jugadora": "P2", "equipoId": b, "equipo": "B", "goles": 1, "posicion": 2 }),
        ]
    );

    app.server
        .delete(&format!("/api/jugadoras/{}", p1))
        .authorization_bearer(&app.admin_token)
        .await
        .assert_status_ok();
    let response = app
        .server
        .get("/api/scorers")
        .add_query_param("seasonId", season)
        .await;
    response.assert_status_ok();
    let scorers = response.json::<Vec<Value>>();
    assert_eq!(scorers.len(), 1);
    assert_eq!(scorers[0]["jugadoraId"], p2);
    assert_eq!(scorers[0]["posicion"], 1);

    // Standings keep the frozen score after the scorer is deactivated.
    let response = app
        .server
        .get("/api/standings")
        .add_query_param("seasonId", season)
        .await;
    assert_eq!(response.json::<Vec<Value>>()[0]["equipo"], "A");
}

#[tokio::test]
async fn test_stats_require_season_id() {
    let app = spawn_app().await;

    let response = app.server.get("/api/estadisticas/tabla").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["message"], "temporadaId is required");

    app.server
        .get("/api/estadisticas/goleo")
        .add_query_param("temporadaId", 0)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let response = app
        .server
        .get("/api/estadisticas/tabla")
        .add_query_param("temporadaId", 4242)
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Vec<Value>>(), Vec::<Value>::new());
}

#[tokio::test]
async fn test_write_endpoints_require_authentication() {
    let app = spawn_app().await;

    let response = app
        .server
        .post("/api/ligas")
        .json(&json!({ "nombre": "Liga", "tipo": "futbol" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    app.server
        .post("/api/ligas")
        .authorization_bearer("not-a-token")
        .json(&json!({ "nombre": "Liga", "tipo": "futbol" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let visitor = app.server.post("/api/auth/visitor-token").await;
    visitor.assert_status_ok();
    let body = visitor.json::<Value>();
    assert_eq!(body["user"]["role"], "VISITOR");
    let token = body["token"].as_str().unwrap().to_string();

    app.server
        .post("/api/ligas")
        .authorization_bearer(&token)
        .json(&json!({ "nombre": "Liga", "tipo": "futbol" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    // Reads stay public.
    app.server.get("/api/ligas").await.assert_status_ok();
}

#[tokio::test]
async fn test_league_admin_is_scoped_to_own_league() {
    let app = spawn_app().await;
    let own = app.league("Liga Norte").await;
    let other = app.league("Liga Sur").await;
    let token = app.user("LEAGUE_ADMIN", own, "norte").await;

    let me = app.server.get("/api/auth/me").authorization_bearer(&token).await;
    me.assert_status_ok();
    let me = me.json::<Value>();
    assert_eq!(me["role"], "LEAGUE_ADMIN");
    assert_eq!(me["ligaId"], own);
    assert!(me.get("password_hash").is_none());

    app.server
        .post("/api/temporadas")
        .authorization_bearer(&token)
        .json(&json!({ "ligaId": own, "nombre": "Clausura", "anio": 2025 }))
        .await
        .assert_status(StatusCode::CREATED);
    app.server
        .post("/api/temporadas")
        .authorization_bearer(&token)
        .json(&json!({ "ligaId": other, "nombre": "Clausura", "anio": 2025 }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    app.server
        .post("/api/ligas")
        .authorization_bearer(&token)
        .json(&json!({ "nombre": "Liga Propia", "tipo": "futbol" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    app.server
        .get("/api/auth/users")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_scorekeeper_records_results_only() {
    let app = spawn_app().await;
    let league = app.league("Liga").await;
    let season = app.season(league).await;
    let home = app.team(season, "Local").await;
    let away = app.team(season, "Visita").await;
    let game = app.game(season, home, away).await;
    let token = app.user("SCOREKEEPER", league, "anotadora").await;

    app.server
        .post("/api/equipos")
        .authorization_bearer(&token)
        .json(&json!({ "temporadaId": season, "nombre": "Nuevo" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = app
        .server
        .post(&format!("/api/partidos/{}/resultado", game))
        .authorization_bearer(&token)
        .json(&json!({ "goles": [] }))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!((body["golesLocal"].clone(), body["golesVisita"].clone()), (json!(0), json!(0)));
    assert_eq!(body["status"], "JUGADO");

    let table = app.table("/api/estadisticas/tabla", season).await;
    assert!(table.iter().all(|r| r["pe"] == 1 && r["pts"] == 1));
}

#[tokio::test]
async fn test_match_validation() {
    let app = spawn_app().await;
    let league = app.league("Liga").await;
    let season = app.season(league).await;
    let other_season = id_of(
        &app.create(
            "/api/temporadas",
            json!({ "ligaId": league, "nombre": "Clausura", "anio": 2026 }),
        )
        .await,
    );
    let a = app.team(season, "A").await;
    let b = app.team(season, "B").await;
    let stranger = app.team(other_season, "Z").await;
    let outsider = app.player(stranger, "Zoe").await;

    let schedule = |home: i64, away: i64| {
        json!({
            "temporadaId": season,
            "equipoLocalId": home,
            "equipoVisitaId": away,
            "jornada": 2,
            "fecha": "2025-03-08",
        })
    };

    app.server
        .post("/api/partidos")
        .authorization_bearer(&app.admin_token)
        .json(&schedule(a, a))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    app.server
        .post("/api/partidos")
        .authorization_bearer(&app.admin_token)
        .json(&schedule(a, stranger))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    app.server
        .post("/api/partidos")
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "temporadaId": season, "equipoLocalId": a }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let response = app
        .server
        .post("/api/partidos")
        .authorization_bearer(&app.admin_token)
        .json(&schedule(a, b))
        .await;
    response.assert_status(StatusCode::CREATED);
    let game = response.json::<Value>();
    assert_eq!(game["equipoLocal"]["nombre"], "A");
    assert_eq!(game["status"], "PROGRAMADO");
    assert_eq!(game["fecha"], "2025-03-08T00:00:00Z");

    let response = app
        .server
        .post(&format!("/api/partidos/{}/resultado", id_of(&game)))
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "goles": [{ "jugadoraId": outsider }] }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["message"],
        "Player Zoe does not belong to either team of the match"
    );

    app.server
        .post(&format!("/api/partidos/{}/resultado", id_of(&game)))
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "goles": [{ "jugadoraId": 9999 }] }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let listed = app
        .server
        .get("/api/partidos")
        .add_query_param("temporadaId", season)
        .add_query_param("jornada", 2)
        .await;
    listed.assert_status_ok();
    let listed = listed.json::<Vec<Value>>();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["status"], "PROGRAMADO");
}

#[tokio::test]
async fn test_conflicts_are_reported() {
    let app = spawn_app().await;
    let league = app.league("Liga").await;
    let season = app.season(league).await;
    app.team(season, "Tigres").await;

    let response = app
        .server
        .post("/api/equipos")
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "temporadaId": season, "nombre": "Tigres" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    app.server
        .delete(&format!("/api/temporadas/{}", season))
        .authorization_bearer(&app.admin_token)
        .await
        .assert_status(StatusCode::CONFLICT);

    let teams = app
        .server
        .get("/api/equipos")
        .add_query_param("temporadaId", season)
        .await
        .json::<Vec<Value>>();
    assert_eq!(teams.len(), 1);
    assert_eq!(teams[0]["totalJugadoras"], 0);
}

#[tokio::test]
async fn test_login_failures_and_rate_limit() {
    let mut config = AppConfig::default();
    config.session.login_attempts_per_minute = 3;
    let app = spawn_app_with(config).await;

    app.server
        .post("/api/auth/login")
        .json(&json!({ "username": "superadmin", "password": "wrong" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    app.server
        .post("/api/auth/login")
        .json(&json!({ "username": "nadie", "password": "x" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    app.server
        .post("/api/auth/login")
        .json(&json!({ "password": "x" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    // Setup's login plus two failures use up the three attempts.
    app.server
        .post("/api/auth/login")
        .json(&json!({ "username": "superadmin", "password": "wrong" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    app.server
        .post("/api/auth/login")
        .json(&json!({ "username": "superadmin", "password": "wrong" }))
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_health_reports_request_metrics() {
    let app = spawn_app().await;
    app.server.get("/api/ligas").await.assert_status_ok();

    let response = app.server.get("/api/health").await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["status"], "ok");
    assert!(body["metrics"]["total_requests"].as_u64().unwrap() >= 2);
}

#[tokio::test]
async fn test_malformed_requests_get_message_body() {
    let app = spawn_app().await;
    let league = app.league("Liga").await;
    let season = app.season(league).await;

    let response = app
        .server
        .post("/api/partidos")
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "temporadaId": season, "jornada": "uno" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.content_type(), "application/json");
    assert!(response.json::<Value>()["message"]
        .as_str()
        .unwrap()
        .contains("jornada"));

    let response = app
        .server
        .post("/api/ligas")
        .authorization_bearer(&app.admin_token)
        .bytes(Bytes::from_static(b"{\"nombre\": "))
        .content_type("application/json")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["message"].is_string());

    let response = app.server.get("/api/equipos/abc").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.content_type(), "application/json");
    assert!(response.json::<Value>()["message"].is_string());
}
