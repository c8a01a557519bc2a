use std::error::Error;

use clap::Parser;
use log::{info, LevelFilter};
use tokio::net::TcpListener;

use chord_ring::kv;
use chord_ring::node::state::Node;
use chord_ring::threads::{fix_fingers, join, listener, shell, stabilize, successors, web};
use chord_ring::utils::cli::Cli;
use chord_ring::utils::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();
    simple_logger::SimpleLogger::new().env().with_level(LevelFilter::Info).init().unwrap();

    let config = Config::load(&args.config)?;
    let address = config
        .address_of(args.id)
        .ok_or_else(|| format!("no port mapping for node id {}", args.id))?;

    // an unbindable listener is fatal, nothing to repair here
    let tcp_listener = TcpListener::bind(address.socket_addr()).await?;
    let node = Node::new(address);
    info!("node {} occupies ring position {}", node.address(), node.key());

    match args.peer {
        None => {
            info!("bootstrapping a new ring");
            node.seed_data(kv::synthesize_files(args.files));
            tokio::spawn(listener::serve(node.clone(), tcp_listener));
        }
        Some(peer_id) => {
            let helper = config
                .address_of(peer_id)
                .ok_or_else(|| format!("no port mapping for peer id {}", peer_id))?;
            join::join_ring(&node, &helper).await?;
            // the handler must serve before the ring starts probing us
            tokio::spawn(listener::serve(node.clone(), tcp_listener));
            join::refine_fingers(&node, &helper).await;
            join::announce(&node).await;
            join::migrate_keys(&node).await;
        }
    }

    successors::init_successor_list(&node).await;
    tokio::spawn(stabilize::run(node.clone()));
    tokio::spawn(fix_fingers::run(node.clone()));
    tokio::spawn(successors::run(node.clone()));

    if let Some(bind_address) = args.web {
        web::spawn_web_interface(node.clone(), bind_address);
    }

    shell::run(node).await;
    Ok(())
}
