use cookie::Cookie;
use http::StatusCode;
use lattice_web::{chain, Context, Engine, Server};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug)]
pub struct User {
    name: String,
    zip: String,
}

// curl -v http://127.0.0.1:8080/users/zava?verbose=true
fn show_user(c: &mut Context) {
    let verbose = c.default_query("verbose", "false");
    let greeting = format!("user: {}, verbose: {verbose}\r\n", c.param("name"));
    c.string(greeting);
}

// curl -v -d "name=hello&zip=world" http://127.0.0.1:8080/users
// curl -v -H 'Content-Type: application/json' -d '{"name":"hello","zip":"world"}' http://127.0.0.1:8080/users
fn create_user(c: &mut Context) {
    match c.bind::<User>() {
        Ok(user) => {
            c.set_status(StatusCode::CREATED);
            c.json(&user);
        }
        Err(e) => {
            c.set_status(StatusCode::BAD_REQUEST);
            c.error(e.to_string());
            c.string(format!("{e}\r\n"));
        }
    }
}

// curl -v http://127.0.0.1:8080/files/docs/readme.md
fn show_file(c: &mut Context) {
    let path = format!("file: {}\r\n", c.param("path"));
    c.string(path);
}

// curl -v -H "Authorization: secret" http://127.0.0.1:8080/admin/stats
fn require_token(c: &mut Context) {
    if c.header("Authorization") != Some("secret") {
        c.abort_with_status(StatusCode::UNAUTHORIZED);
    }
}

fn stats(c: &mut Context) {
    c.set_cookie(&Cookie::new("seen", "true"));
    c.json(&serde_json::json!({ "visits": 42 }));
}

fn timing(c: &mut Context) {
    c.next();
    c.set_header("X-Powered-By", "lattice");
}

#[tokio::main]
async fn main() {
    let mut engine = Engine::with_default_middlewares();
    engine.use_middleware(timing);

    engine.get("/users/:name", show_user);
    engine.post("/users", create_user);
    engine.get("/files/*path", show_file);

    engine.group("/admin").use_middleware(require_token).get("/stats", stats);
    engine.get("/health", chain![timing, |c: &mut Context| c.string("ok")]);

    engine.no_route(|c: &mut Context| {
        c.set_status(StatusCode::NOT_FOUND);
        c.json(&serde_json::json!({ "error": "not found" }));
    });

    Server::builder().app(engine.build()).address("127.0.0.1:8080").build().unwrap().start().await.unwrap();
}
