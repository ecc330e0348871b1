use lattice_web::{Context, Engine, Server};

fn hello_world(c: &mut Context) {
    c.string("hello world");
}

#[tokio::main]
async fn main() {
    let mut engine = Engine::with_default_middlewares();
    engine.get("/", hello_world);

    Server::builder().app(engine.build()).address("127.0.0.1:3000").build().unwrap().start().await.unwrap();
}
