use actix_web::web::Query;
use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};
use serde::Deserialize;
use tera::{Context, Tera};

use crate::node::state::Node;
use crate::utils::constants::KEYSPACE;
use crate::utils::crypto::hash;

#[derive(Deserialize)]
struct QueryParams {
    lookup_key: Option<String>,
}

#[get("/")]
async fn index(
    node: web::Data<Node>,
    query_params_option: Option<Query<QueryParams>>,
) -> impl Responder {
    let tera = Tera::new("static/html/**/*").unwrap();
    let mut context = Context::new();

    context.insert("title", "Chord Node");
    context.insert("address", &node.address().to_string());
    context.insert("key", &node.key());
    context.insert("max_pos", &(KEYSPACE - 1));
    context.insert("lookup_file", "");
    context.insert("lookup_pos", "");
    context.insert("lookup_node", "");

    if let Some(query_params) = query_params_option {
        if let Some(ref filename) = query_params.lookup_key {
            if !filename.is_empty() {
                let key = hash(filename.as_bytes());
                let responsible = node.find_successor(key).await;
                context.insert("lookup_file", filename);
                context.insert("lookup_pos", &key);
                context.insert("lookup_node", &responsible.to_string());
            }
        }
    }

    context.insert("predecessor", &node.predecessor_address().to_string());
    context.insert("fingers", &node.finger_entries());
    context.insert(
        "successors",
        &node
            .successor_entries()
            .iter()
            .map(|address| address.to_string())
            .collect::<Vec<_>>(),
    );
    context.insert("files", &node.files());

    let rendered_html = tera.render("index.html", &context).unwrap();
    HttpResponse::Ok()
        .content_type("text/html")
        .body(rendered_html)
}

/// Serves the inspection dashboard on its own actix system thread so
/// the node runtime is undisturbed.
pub fn spawn_web_interface(node: Node, bind_address: String) {
    std::thread::spawn(move || {
        actix_web::rt::System::new().block_on(async move {
            HttpServer::new(move || {
                App::new()
                    .app_data(web::Data::new(node.clone()))
                    .service(index)
            })
            .bind(bind_address.as_str())
            .expect("web interface bind failed")
            .run()
            .await
        })
    });
}
